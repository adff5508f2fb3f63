use thiserror::Error;

/// Результат для операций декодера ApRES
pub type ApresResult<T> = std::result::Result<T, ApresError>;

/// Типы ошибок декодирования burst-файлов.
#[derive(Debug, Error)]
pub enum ApresError {
    /// Ни один из известных маркеров формата не найден в префиксе файла
    #[error("Unknown file format: no burst header marker in first {prefix_len} bytes")]
    UnknownFormat { prefix_len: usize },

    /// Обязательное поле заголовка отсутствует или не парсится
    #[error("Malformed header: field `{field}`: {reason}")]
    MalformedHeader { field: String, reason: String },

    /// Запрошенный burst выходит за количество burst-ов в файле
    #[error("Burst not found: requested {requested}, file contains {found}")]
    BurstNotFound { requested: usize, found: usize },

    /// Блок данных короче заявленного заголовком (expected/got в словах)
    #[error("Truncated burst: expected {expected} words, got {got}")]
    TruncatedBurst { expected: usize, got: usize },

    /// Hex-значение DDS регистра неверной ширины или с не-hex символами
    #[error("Malformed DDS register {register}: `{value}`: {reason}")]
    MalformedRegister {
        register: &'static str,
        value: String,
        reason: String,
    },

    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApresError {
    /// Удобные конструкторы
    pub fn missing_field(field: &str) -> Self {
        Self::MalformedHeader {
            field: field.to_string(),
            reason: "field absent".to_string(),
        }
    }

    pub fn malformed_field<S: Into<String>>(field: &str, reason: S) -> Self {
        Self::MalformedHeader {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
