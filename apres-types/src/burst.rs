use chrono::{Duration, NaiveDateTime};

use crate::chirp::ChirpParameters;

/// Фиксированный интервал между чирпами внутри burst-а (с)
pub const CHIRP_INTERVAL_SECS: f64 = 1.6384;

/// Показания термометра выше этого порога — признак заворота
/// счётчика; из них вычитается 512
pub const TEMPERATURE_WRAP_THRESHOLD: f64 = 300.0;

/// Режим усреднения чирпов, заявленный полем `Average` заголовка.
///
/// Определяет ширину слова данных и калибровку.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Averaging {
    /// Average=0: каждый чирп записан отдельно, u16 слова
    None = 0,
    /// Average=1: усреднённый чирп, f32 слова
    Averaged = 1,
    /// Average=2: суммированный (stacked) чирп, u32 слова
    Stacked = 2,
}

impl Averaging {
    pub fn from_field(v: i64) -> Self {
        match v {
            1 => Averaging::Averaged,
            2 => Averaging::Stacked,
            _ => Averaging::None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Размер одного слова данных в байтах
    pub fn bytes_per_word(&self) -> usize {
        match self {
            Averaging::None => 2,
            Averaging::Averaged | Averaging::Stacked => 4,
        }
    }
}

/// Код настройки одного аттенюатора.
///
/// Пара (RF аттенюатор, AF усиление) — аналог комплексного кода
/// `Attenuator_1 + i·Attenuator_2` исходного инструмента.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttenuatorCode {
    /// Настройка RF аттенюатора (дБ)
    pub attenuator: f64,
    /// Настройка AF усиления (дБ)
    pub af_gain: f64,
}

/// Метаданные одного burst-а, собранные при разборе его заголовка.
///
/// Создаётся заново при каждом поиске burst-а и после этого не меняется.
#[derive(Debug, Clone)]
pub struct BurstDescriptor {
    /// 1-based индекс burst-а в файле
    pub burst: usize,
    /// Смещение начала заголовка (байты от начала файла)
    pub header_offset: u64,
    /// Смещение начала блока данных (сразу за `*** End Header ***`)
    pub data_offset: u64,
    /// Выборок АЦП на цикл чирпа (N_ADC_SAMPLES)
    pub samples_per_chirp: usize,
    /// Суб-burst-ов в burst-е (NSubBursts)
    pub sub_bursts: usize,
    /// Чирпов в burst-е (1 при любом усреднении)
    pub chirps_in_burst: usize,
    /// Режим усреднения
    pub averaging: Averaging,
    /// Количество настроек аттенюатора (nAttenuators)
    pub n_attenuators: usize,
    /// Коды аттенюаторов, по одному на настройку
    pub attenuators: Vec<AttenuatorCode>,
    /// Активных передающих антенн (записи TxAnt, равные 1)
    pub active_tx: usize,
    /// Активных приёмных антенн (записи RxAnt, равные 1)
    pub active_rx: usize,
    /// Метка времени начала burst-а
    pub time_stamp: NaiveDateTime,
    /// Температурные каналы; `None` когда ключ отсутствует в заголовке
    pub temperature_1: Option<f64>,
    pub temperature_2: Option<f64>,
    /// Напряжение батареи (В); `None` когда ключ отсутствует
    pub battery_voltage: Option<f64>,
}

impl BurstDescriptor {
    /// Ожидаемое количество слов в блоке данных
    pub fn words_per_burst(&self) -> usize {
        self.chirps_in_burst * self.samples_per_chirp
    }

    /// Код аттенюатора для 1-based номера чирпа: коды циклически
    /// чередуются по модулю длины списка
    pub fn attenuator_for_chirp(&self, chirp: usize) -> AttenuatorCode {
        self.attenuators[(chirp - 1) % self.attenuators.len()]
    }

    /// Абсолютная метка времени 1-based чирпа: старт burst-а плюс
    /// фиксированный интервал 1.6384 с между чирпами
    pub fn chirp_time(&self, chirp: usize) -> NaiveDateTime {
        let offset_us = ((chirp - 1) as f64 * CHIRP_INTERVAL_SECS * 1e6).round() as i64;
        self.time_stamp + Duration::microseconds(offset_us)
    }
}

/// Вычищает заворот счётчика термометра: показания выше 300
/// условных единиц уменьшаются на 512, каналы независимы.
pub fn clean_temperature(reading: f64) -> f64 {
    if reading > TEMPERATURE_WRAP_THRESHOLD {
        reading - 512.0
    } else {
        reading
    }
}

/// Матрица калиброванных выборок: строка — чирп, столбец — выборка.
///
/// Хранение row-major в порядке съёма.
#[derive(Debug, Clone)]
pub struct SampleMatrix {
    rows: usize,
    cols: usize,
    samples: Vec<f32>,
}

impl SampleMatrix {
    /// Собирает матрицу из плоского потока выборок.
    ///
    /// Паника при `samples.len() != rows * cols` — вызывающая сторона
    /// обязана проверить усечение до сборки.
    pub fn from_flat(rows: usize, cols: usize, samples: Vec<f32>) -> Self {
        assert_eq!(samples.len(), rows * cols, "flat sample count mismatch");
        SampleMatrix {
            rows,
            cols,
            samples,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Строка одного чирпа (0-based)
    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.cols;
        &self.samples[start..start + self.cols]
    }

    /// Плоский срез всех выборок в порядке съёма
    pub fn as_flat(&self) -> &[f32] {
        &self.samples
    }
}

/// Итог декодирования одного burst-а — единица, передаваемая
/// внешнему контейнеру радарных данных.
#[derive(Debug, Clone)]
pub struct BurstRecord {
    /// Метаданные burst-а
    pub descriptor: BurstDescriptor,
    /// Физические параметры чирпа
    pub chirp_params: ChirpParameters,
    /// Калиброванные выборки, чирп на строку
    pub data: SampleMatrix,
    /// 1-based номера чирпов
    pub chirp_num: Vec<usize>,
    /// Код аттенюатора каждого чирпа
    pub chirp_att: Vec<AttenuatorCode>,
    /// Абсолютная метка времени каждого чирпа
    pub chirp_time: Vec<NaiveDateTime>,
}
