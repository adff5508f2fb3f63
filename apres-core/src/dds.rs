//! Декодер DDS регистров (AD9914)
//!
//! Инструмент копирует config.ini в заголовок burst-а, включая сырые
//! hex-дампы регистров синтезатора: `Reg0B="6666666633333333"`. Параметры
//! развёртки (частоты, шаги, темп) существуют только в этих битовых полях.
//! Раскладка каждого регистра описана декларативной таблицей, которую
//! потребляет один общий декодер — контракт проверяется изолированно.

use apres_types::{ApresError, ApresResult};

use crate::header::HeaderBlock;

/// Системная частота DDS (Гц)
pub const FSYSCLK: f64 = 1.0e9;

/// Масштаб битового поля регистра
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scale {
    /// Частотное слово: код × fsysclk / 2³²
    FreqWord,
    /// Темп развёртки: код × 4 / fsysclk
    RateWord,
    /// Однобитовый флаг
    Flag,
}

/// Битовое поле регистра: LSB-first смещение, ширина, масштаб
#[derive(Debug, Clone, Copy)]
struct BitField {
    lo: u32,
    width: u32,
    scale: Scale,
}

/// Раскладка одного регистра фиксированной hex-ширины
#[derive(Debug, Clone, Copy)]
struct RegisterLayout {
    /// Ключ в заголовке, включая `=`
    key: &'static str,
    /// Имя регистра для диагностики
    name: &'static str,
    /// Точная ширина значения в hex-символах (8 или 16)
    hex_digits: usize,
    fields: &'static [BitField],
}

/// CFR2: бит 18 — no-dwell high, бит 17 — no-dwell low
const REG01: RegisterLayout = RegisterLayout {
    key: "Reg01=",
    name: "Reg01",
    hex_digits: 8,
    fields: &[
        BitField { lo: 18, width: 1, scale: Scale::Flag },
        BitField { lo: 17, width: 1, scale: Scale::Flag },
    ],
};

/// Digital Ramp Limit: биты 0–31 — нижний предел (startFreq),
/// биты 32–63 — верхний (stopFreq)
const REG0B: RegisterLayout = RegisterLayout {
    key: "Reg0B=",
    name: "Reg0B",
    hex_digits: 16,
    fields: &[
        BitField { lo: 0, width: 32, scale: Scale::FreqWord },
        BitField { lo: 32, width: 32, scale: Scale::FreqWord },
    ],
};

/// Digital Ramp Step Size: биты 0–31 — приращение, 32–63 — убывание
const REG0C: RegisterLayout = RegisterLayout {
    key: "Reg0C=",
    name: "Reg0C",
    hex_digits: 16,
    fields: &[
        BitField { lo: 0, width: 32, scale: Scale::FreqWord },
        BitField { lo: 32, width: 32, scale: Scale::FreqWord },
    ],
};

/// Digital Ramp Rate: биты 0–15 — положительный темп, 16–31 — отрицательный
const REG0D: RegisterLayout = RegisterLayout {
    key: "Reg0D=",
    name: "Reg0D",
    hex_digits: 8,
    fields: &[
        BitField { lo: 0, width: 16, scale: Scale::RateWord },
        BitField { lo: 16, width: 16, scale: Scale::RateWord },
    ],
};

/// Физические параметры развёртки, извлечённые из регистров.
#[derive(Debug, Clone, PartialEq)]
pub struct DdsParameters {
    pub no_dwell_high: bool,
    pub no_dwell_low: bool,
    /// Начальная частота развёртки (Гц)
    pub start_freq: f64,
    /// Конечная частота развёртки (Гц)
    pub stop_freq: f64,
    /// Шаг приращения частоты (Гц)
    pub ramp_up_step: f64,
    /// Шаг убывания частоты (Гц)
    pub ramp_down_step: f64,
    /// Интервал между приращениями (с)
    pub tstep_up: f64,
    /// Интервал между убываниями (с)
    pub tstep_down: f64,
}

/// Снимает обрамляющие кавычки значения `Reg..="..."`
fn strip_quotes(v: &str) -> &str {
    v.trim_matches('"')
}

/// Разбирает hex-значение регистра, проверяя ширину и алфавит.
///
/// Неверная ширина или не-hex символ — жёсткий отказ разбора этого
/// burst-а, не молчаливый ноль.
fn parse_register(layout: &RegisterLayout, raw: &str) -> ApresResult<u64> {
    let hex = strip_quotes(raw);
    if hex.len() != layout.hex_digits {
        return Err(ApresError::MalformedRegister {
            register: layout.name,
            value: raw.to_string(),
            reason: format!("expected {} hex digits, got {}", layout.hex_digits, hex.len()),
        });
    }
    u64::from_str_radix(hex, 16).map_err(|_| ApresError::MalformedRegister {
        register: layout.name,
        value: raw.to_string(),
        reason: "non-hex digit".to_string(),
    })
}

/// Общий декодер: читает регистр из заголовка и раскладывает его
/// по таблице битовых полей в физические величины.
fn decode_fields(layout: &RegisterLayout, header: &HeaderBlock<'_>) -> ApresResult<Vec<f64>> {
    let raw = header
        .raw_value(layout.key)
        .ok_or_else(|| ApresError::missing_field(layout.key))?;
    let value = parse_register(layout, &raw)?;

    let decoded = layout
        .fields
        .iter()
        .map(|f| {
            let mask = if f.width == 64 {
                u64::MAX
            } else {
                (1u64 << f.width) - 1
            };
            let code = (value >> f.lo) & mask;
            match f.scale {
                Scale::FreqWord => code as f64 * FSYSCLK / 2f64.powi(32),
                Scale::RateWord => code as f64 * 4.0 / FSYSCLK,
                Scale::Flag => code as f64,
            }
        })
        .collect();
    Ok(decoded)
}

/// Декодирует все четыре регистра развёртки из окна заголовка.
pub fn decode_registers(header: &HeaderBlock<'_>) -> ApresResult<DdsParameters> {
    let cfr2 = decode_fields(&REG01, header)?;
    let limits = decode_fields(&REG0B, header)?;
    let steps = decode_fields(&REG0C, header)?;
    let rates = decode_fields(&REG0D, header)?;

    Ok(DdsParameters {
        no_dwell_high: cfr2[0] != 0.0,
        no_dwell_low: cfr2[1] != 0.0,
        start_freq: limits[0],
        stop_freq: limits[1],
        ramp_up_step: steps[0],
        ramp_down_step: steps[1],
        tstep_up: rates[0],
        tstep_down: rates[1],
    })
}

/// Обратное преобразование частоты в 32-битный fixed-point код DDS.
///
/// Используется тестами свойств round-trip.
pub fn freq_to_code(freq_hz: f64) -> u32 {
    (freq_hz * 2f64.powi(32) / FSYSCLK).round() as u32
}
