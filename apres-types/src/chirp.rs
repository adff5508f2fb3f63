/// Относительная диэлектрическая проницаемость льда
pub const ICE_PERMITTIVITY: f64 = 3.18;

/// Скорость света в вакууме (м/с)
pub const C_VACUUM: f64 = 3.0e8;

/// Направление частотной развёртки DDS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampDir {
    /// Развёртка вверх
    Up,
    /// Развёртка вниз
    Down,
    /// Непрерывная развёртка в обе стороны (оба no-dwell флага)
    UpDown,
}

impl std::fmt::Display for RampDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RampDir::Up => write!(f, "up"),
            RampDir::Down => write!(f, "down"),
            RampDir::UpDown => write!(f, "upDown"),
        }
    }
}

/// Физические параметры чирпа, выведенные из заголовка burst-а.
///
/// Для форматов 4/5 источник — DDS регистры; для форматов 2/3 —
/// фиксированные константы инструмента (f0 = 200 МГц, K = 2π·200 МГц/с).
#[derive(Debug, Clone)]
pub struct ChirpParameters {
    /// Частота дискретизации АЦП (Гц)
    pub fs: f64,
    /// Начальная частота развёртки (Гц)
    pub f0: f64,
    /// Конечная частота развёртки (Гц)
    pub f1: f64,
    /// Шаг приращения частоты DDS (Гц)
    pub ramp_up_step: f64,
    /// Шаг убывания частоты DDS (Гц)
    pub ramp_down_step: f64,
    /// Интервал между приращениями (с)
    pub tstep_up: f64,
    /// Интервал между убываниями (с)
    pub tstep_down: f64,
    /// Длительность чирпа (с)
    pub chirp_length: f64,
    /// Количество выборок АЦП, покрывающих один чирп
    pub nchirp_samples: usize,
    /// Градиент чирпа K = 2π·ramp_up_step/tstep_up (рад/с²)
    pub chirp_gradient: f64,
    /// Направление развёртки
    pub ramp_dir: RampDir,
    /// Чирпов за период развёртки; `None` при непрерывной
    /// развёртке (upDown) — величина не определена
    pub chirps_per_period: Option<f64>,
    /// Полоса (Гц)
    pub bandwidth: f64,
    /// Центральная частота (Гц)
    pub fc: f64,
    /// Относительная диэлектрическая проницаемость среды
    pub er: f64,
}

impl ChirpParameters {
    /// Интервал между выборками (с)
    pub fn dt(&self) -> f64 {
        1.0 / self.fs
    }

    /// Скорость распространения в среде (м/с)
    pub fn ci(&self) -> f64 {
        C_VACUUM / self.er.sqrt()
    }

    /// Центральная длина волны λc = ci/fc (м)
    pub fn lambdac(&self) -> f64 {
        self.ci() / self.fc
    }

    /// Временная ось выборок: t[i] = i/fs, i ∈ [0, n)
    pub fn sample_times(&self, n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 / self.fs).collect()
    }

    /// Частотная ось выборок: f[i] = f0 + t[i]·K/2π
    pub fn freq_axis(&self, n: usize) -> Vec<f64> {
        let k_hz = self.chirp_gradient / (2.0 * std::f64::consts::PI);
        (0..n)
            .map(|i| self.f0 + (i as f64 / self.fs) * k_hz)
            .collect()
    }
}
