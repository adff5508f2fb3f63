//! Вывод физических параметров чирпа
//!
//! Форматы 4/5 несут параметры развёртки в DDS регистрах префикса файла
//! (копия config.ini в первом заголовке); форматы 2/3 — ранние приборы с
//! фиксированными параметрами, для них используются принятые константы.

use std::f64::consts::PI;

use apres_types::{ApresResult, ChirpParameters, FileFormat, RampDir, ICE_PERMITTIVITY};

use crate::{dds, header::HeaderBlock};

/// Номинальная частота дискретизации, когда метаданные её не несут (Гц)
pub const DEFAULT_FS_HINT: f64 = 4.0e4;

/// Принятая начальная частота ранних форматов (Гц)
const ASSUMED_F0: f64 = 2.0e8;

/// Принятый градиент чирпа ранних форматов: 2π·200 МГц/с (рад/с²)
const ASSUMED_K: f64 = 2.0 * PI * 2.0e8;

/// Конечная частота выше этого порога означает развёртку вниз (Гц)
const RAMP_DOWN_THRESHOLD: f64 = 4.0e8;

/// Выводит параметры чирпа из префикса файла.
///
/// `samples_per_chirp` — N_ADC_SAMPLES целевого burst-а (реально снятые
/// выборки), `fs_hint` — подсказка вызывающей стороны, используемая лишь
/// когда формат не сообщает частоту сам.
pub fn derive_parameters(
    format: FileFormat,
    prefix: &HeaderBlock<'_>,
    fs_hint: f64,
    samples_per_chirp: usize,
) -> ApresResult<ChirpParameters> {
    if format.has_dds_registers() {
        derive_from_registers(prefix, fs_hint, samples_per_chirp)
    } else {
        Ok(derive_assumed(fs_hint, samples_per_chirp))
    }
}

/// Форматы 4/5: SamplingFreqMode + битовые поля регистров.
fn derive_from_registers(
    prefix: &HeaderBlock<'_>,
    fs_hint: f64,
    samples_per_chirp: usize,
) -> ApresResult<ChirpParameters> {
    // SamplingFreqMode=1 — 80 кГц, иначе 40 кГц; отсутствие ключа —
    // единственный случай, когда работает подсказка вызывающего
    let fs = match prefix.int("SamplingFreqMode=")? {
        Some(1) => 8.0e4,
        Some(_) => 4.0e4,
        None => fs_hint,
    };

    let regs = dds::decode_registers(prefix)?;

    let nsteps_dds = ((regs.stop_freq - regs.start_freq).abs() / regs.ramp_up_step).round();
    let mut chirp_length = nsteps_dds * regs.tstep_up;

    // Если АЦП снял меньше выборок, чем покрывает развёртка, чирп
    // обрезан съёмом: длина ограничивается реальной серией
    if (chirp_length * fs).round() as usize > samples_per_chirp {
        chirp_length = samples_per_chirp as f64 / fs;
    }
    let nchirp_samples = (chirp_length * fs).round() as usize;

    let chirp_gradient = 2.0 * PI * (regs.ramp_up_step / regs.tstep_up);
    let bandwidth = chirp_length * chirp_gradient / (2.0 * PI);
    let f0 = regs.start_freq;
    let f1 = f0 + bandwidth;

    let (ramp_dir, chirps_per_period) = if regs.no_dwell_high && regs.no_dwell_low {
        // Непрерывная развёртка: количество чирпов за период не определено
        (RampDir::UpDown, None)
    } else if regs.stop_freq > RAMP_DOWN_THRESHOLD {
        (RampDir::Down, Some(1.0))
    } else {
        (RampDir::Up, Some(1.0))
    };

    Ok(ChirpParameters {
        fs,
        f0,
        f1,
        ramp_up_step: regs.ramp_up_step,
        ramp_down_step: regs.ramp_down_step,
        tstep_up: regs.tstep_up,
        tstep_down: regs.tstep_down,
        chirp_length,
        nchirp_samples,
        chirp_gradient,
        ramp_dir,
        chirps_per_period,
        bandwidth,
        fc: f0 + bandwidth / 2.0,
        er: ICE_PERMITTIVITY,
    })
}

/// Форматы 2/3: f0 = 200 МГц, K = 2π·200 МГц/с, fs из подсказки.
///
/// DDS-эквиваленты выбраны пошагово (tstep_up = 1/fs), чтобы инвариант
/// K = 2π·ramp_up_step/tstep_up держался и для константного пути.
fn derive_assumed(fs: f64, samples_per_chirp: usize) -> ChirpParameters {
    let n = samples_per_chirp as f64;
    let chirp_length = (n - 1.0) / fs;
    let k_hz = ASSUMED_K / (2.0 * PI);
    let f1 = ASSUMED_F0 + chirp_length * k_hz;
    let bandwidth = (n / fs) * k_hz;

    ChirpParameters {
        fs,
        f0: ASSUMED_F0,
        f1,
        ramp_up_step: k_hz / fs,
        ramp_down_step: 0.0,
        tstep_up: 1.0 / fs,
        tstep_down: 0.0,
        chirp_length,
        nchirp_samples: samples_per_chirp,
        chirp_gradient: ASSUMED_K,
        ramp_dir: RampDir::Up,
        chirps_per_period: Some(1.0),
        bandwidth,
        fc: (ASSUMED_F0 + f1) / 2.0,
        er: ICE_PERMITTIVITY,
    }
}
