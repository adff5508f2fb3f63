//! Определение версии формата burst-файла
//!
//! Версия выводится из присутствия маркерных подстрок в префиксе файла.
//! Маркеры взаимно исключающие по смыслу, но проверяются в фиксированном
//! порядке приоритета — первый совпавший выигрывает.

use apres_types::{ApresError, ApresResult, FileFormat};

/// Размер префикса файла, достаточный для классификации (байт)
pub const FORMAT_DETECT_LEN: usize = 2000;

/// Таблица маркеров в порядке приоритета
const FORMAT_MARKERS: [(&[u8], FileFormat); 4] = [
    (b"SW_Issue=", FileFormat::Format5),
    (b"SubBursts in burst:", FileFormat::Format4),
    (b"*** Burst Header ***", FileFormat::Format3),
    (b"RADAR TIME", FileFormat::Format2),
];

/// Ищет первое вхождение `needle` в `haystack`.
pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Классифицирует файл по первым [`FORMAT_DETECT_LEN`] байтам.
///
/// Отсутствие всех маркеров фатально для файла целиком: имена полей
/// заголовка зависят от версии, частичное восстановление невозможно.
pub fn detect_format(prefix: &[u8]) -> ApresResult<FileFormat> {
    for (marker, format) in FORMAT_MARKERS {
        if find_bytes(prefix, marker).is_some() {
            return Ok(format);
        }
    }
    Err(ApresError::UnknownFormat {
        prefix_len: prefix.len(),
    })
}
