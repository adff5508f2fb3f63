//! Библиотека декодирования burst-файлов ApRES
//!
//! Эталонная реализация разбора сырых файлов фазочувствительного
//! FMCW радара ApRES: версия формата, ASCII заголовки, DDS регистры,
//! калиброванные выборки.
//!
//! # Быстрый старт
//!
//! ```no_run
//! use apres_core::BurstReader;
//!
//! let mut reader = BurstReader::open("survey.dat")?;
//! let record = reader.burst(1)?;
//! println!(
//!     "{} chirps x {} samples, f0 = {} Hz",
//!     record.data.rows(),
//!     record.data.cols(),
//!     record.chirp_params.f0,
//! );
//! # Ok::<(), apres_types::ApresError>(())
//! ```

pub mod burst;
pub mod dds;
pub mod format;
pub mod header;
pub mod params;

pub use burst::*;
pub use dds::*;
pub use format::*;
pub use header::*;
pub use params::*;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
