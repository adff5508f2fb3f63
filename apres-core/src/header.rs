//! Сканер полей ASCII заголовка
//!
//! Заголовок burst-а — строки `KEY=VALUE`, завершённые CRLF (отдельные
//! исторические поля — голым LF). Сканер — чистая функция от байтового
//! окна к типизированным значениям: отсутствие ключа и непарсящееся
//! значение — два разных исхода, никогда не склеиваемых в ноль.

use chrono::NaiveDateTime;

use apres_types::{ApresError, ApresResult};

use crate::format::find_bytes;

/// Формат поля `Time stamp=` в заголовке
const TIME_STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Окно сырых байт заголовка одного burst-а.
///
/// Живёт только на время разбора; наружу уходят типизированные значения.
#[derive(Debug, Clone, Copy)]
pub struct HeaderBlock<'a> {
    raw: &'a [u8],
}

impl<'a> HeaderBlock<'a> {
    pub fn new(raw: &'a [u8]) -> Self {
        HeaderBlock { raw }
    }

    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// Сырое значение поля: подстрока между `key=` и ближайшим CR или LF.
    ///
    /// Граница по терминатору строки, а не по следующему `=`, поэтому
    /// значения, сами содержащие `=` или кавычки (hex-дампы регистров),
    /// не ломают поиск. `None` — ключ отсутствует в окне.
    pub fn raw_value(&self, key: &str) -> Option<String> {
        let pos = find_bytes(self.raw, key.as_bytes())?;
        let start = pos + key.len();
        let rest = &self.raw[start..];
        let end = rest
            .iter()
            .position(|&b| b == b'\r' || b == b'\n')
            .unwrap_or(rest.len());
        Some(String::from_utf8_lossy(&rest[..end]).trim().to_string())
    }

    /// Целое поле; `Ok(None)` — отсутствует, `Err` — есть, но не парсится
    pub fn int(&self, key: &str) -> ApresResult<Option<i64>> {
        match self.raw_value(key) {
            None => Ok(None),
            Some(v) => v
                .parse::<i64>()
                .map(Some)
                .map_err(|_| ApresError::malformed_field(key, format!("not an integer: `{v}`"))),
        }
    }

    /// Обязательное целое поле
    pub fn require_int(&self, key: &str) -> ApresResult<i64> {
        self.int(key)?.ok_or_else(|| ApresError::missing_field(key))
    }

    /// Вещественное поле; различает отсутствие и мусор так же, как [`int`]
    ///
    /// [`int`]: HeaderBlock::int
    pub fn float(&self, key: &str) -> ApresResult<Option<f64>> {
        match self.raw_value(key) {
            None => Ok(None),
            Some(v) => v
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ApresError::malformed_field(key, format!("not a number: `{v}`"))),
        }
    }

    /// Список вещественных значений, разделённых запятыми или пробелами.
    ///
    /// Семантика sscanf: разбор идёт до первого токена, не являющегося
    /// числом, но не более `max` значений; пустой список — ошибка.
    pub fn float_list(&self, key: &str, max: usize) -> ApresResult<Option<Vec<f64>>> {
        let Some(v) = self.raw_value(key) else {
            return Ok(None);
        };
        let mut out = Vec::new();
        for token in v.split([',', ' ', '\t']).filter(|t| !t.is_empty()) {
            match token.parse::<f64>() {
                Ok(x) => out.push(x),
                Err(_) => break,
            }
            if out.len() == max {
                break;
            }
        }
        if out.is_empty() {
            return Err(ApresError::malformed_field(
                key,
                format!("no numeric values in `{v}`"),
            ));
        }
        Ok(Some(out))
    }

    /// Список целых значений; правила как у [`float_list`]
    ///
    /// [`float_list`]: HeaderBlock::float_list
    pub fn int_list(&self, key: &str, max: usize) -> ApresResult<Option<Vec<i64>>> {
        let Some(v) = self.raw_value(key) else {
            return Ok(None);
        };
        let mut out = Vec::new();
        for token in v.split([',', ' ', '\t']).filter(|t| !t.is_empty()) {
            match token.parse::<i64>() {
                Ok(x) => out.push(x),
                Err(_) => break,
            }
            if out.len() == max {
                break;
            }
        }
        if out.is_empty() {
            return Err(ApresError::malformed_field(
                key,
                format!("no numeric values in `{v}`"),
            ));
        }
        Ok(Some(out))
    }

    /// Метка времени `Y-M-D H:M:S`
    pub fn timestamp(&self, key: &str) -> ApresResult<Option<NaiveDateTime>> {
        match self.raw_value(key) {
            None => Ok(None),
            Some(v) => NaiveDateTime::parse_from_str(&v, TIME_STAMP_FORMAT)
                .map(Some)
                .map_err(|_| ApresError::malformed_field(key, format!("not a timestamp: `{v}`"))),
        }
    }

    /// Смещение первого байта за маркером в пределах окна
    pub fn offset_past(&self, marker: &[u8]) -> Option<usize> {
        find_bytes(self.raw, marker).map(|pos| pos + marker.len())
    }
}
