/// Версия формата burst-файла ApRES
///
/// Набор ключей заголовка полностью зависит от версии, поэтому
/// классификация выполняется до любого разбора полей.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FileFormat {
    /// Прототип FMCW радара (ноябрь 2012)
    Format2 = 2,
    /// Данные с января 2013
    Format3 = 3,
    /// Данные после октября 2013 (RMB1b)
    Format4 = 4,
    /// Данные после октября 2014 (RMB2b + VAB Iss C, SW Issue >= 101)
    Format5 = 5,
}

impl FileFormat {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Параметры чирпа закодированы в hex-дампах DDS регистров
    /// только начиная с RMB1b; ранние форматы используют константы.
    pub fn has_dds_registers(&self) -> bool {
        matches!(self, FileFormat::Format4 | FileFormat::Format5)
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "format {}", self.as_u8())
    }
}
