//! Поиск и извлечение burst-ов
//!
//! Длина заголовка непредсказуема, а размер блока данных зависит от
//! полей этого же заголовка, поэтому до целевого burst-а приходится
//! последовательно разбирать заголовки всех предыдущих — это свойство
//! формата, а не реализации.

use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, warn};

use apres_types::{
    clean_temperature, ApresError, ApresResult, AttenuatorCode, Averaging, BurstDescriptor,
    BurstRecord, FileFormat, SampleMatrix,
};

use crate::{
    format::{detect_format, FORMAT_DETECT_LEN},
    header::HeaderBlock,
    params::{derive_parameters, DEFAULT_FS_HINT},
};

/// Окно поиска заголовка одного burst-а (байт)
pub const MAX_HEADER_LEN: usize = 1500;

/// Маркер конца заголовка; данные начинаются сразу за ним
pub const END_HEADER_MARKER: &[u8] = b"*** End Header ***";

/// Калибровка АЦП: вольт на единицу кода (2.5 В / 2¹⁶)
const VOLTS_PER_COUNT: f32 = 2.5 / 65536.0;

/// Чтение режима Average=1 начинается на байт дальше вычисленного
/// смещения данных — причуда съёма, сохранённая байт-в-байт
const AVERAGED_READ_SKEW: u64 = 1;

/// Максимум записей в списках антенн TxAnt/RxAnt
const MAX_ANTENNAS: usize = 8;

/// Читатель burst-файла ApRES.
///
/// Владеет источником на время своих вызовов; между вызовами никакого
/// per-burst состояния нет — повторный поиск того же burst-а всегда
/// возвращает те же смещения.
#[derive(Debug)]
pub struct BurstReader<R> {
    src: R,
    file_len: u64,
    /// Префикс файла: классификация формата + копия config.ini
    prefix: Vec<u8>,
    format: FileFormat,
    fs_hint: f64,
}

impl BurstReader<File> {
    /// Открывает файл по пути и классифицирует его формат.
    pub fn open<P: AsRef<Path>>(path: P) -> ApresResult<Self> {
        Self::new(File::open(path)?)
    }
}

impl<R: Read + Seek> BurstReader<R> {
    /// Создаёт читатель, немедленно читая префикс и определяя формат.
    ///
    /// Неизвестный формат — отказ уже здесь: имена полей заголовка
    /// зависят от версии, разбор вслепую невозможен.
    pub fn new(mut src: R) -> ApresResult<Self> {
        let file_len = src.seek(SeekFrom::End(0))?;
        src.seek(SeekFrom::Start(0))?;

        let mut prefix = vec![0u8; FORMAT_DETECT_LEN.min(file_len as usize)];
        src.read_exact(&mut prefix)?;
        let format = detect_format(&prefix)?;
        debug!("classified burst file as {format}, {file_len} bytes");

        Ok(Self {
            src,
            file_len,
            prefix,
            format,
            fs_hint: DEFAULT_FS_HINT,
        })
    }

    /// Подсказка частоты дискретизации для форматов без метаданных о ней.
    pub fn fs_hint(mut self, fs: f64) -> Self {
        self.fs_hint = fs;
        self
    }

    /// Версия формата, определённая при открытии.
    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Длина файла в байтах.
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Находит заголовок 1-based burst-а, идя от начала файла.
    ///
    /// Стоимость O(burst): заголовок каждого предыдущего burst-а
    /// разбирается, чтобы узнать размер его блока данных.
    pub fn descriptor(&mut self, burst: usize) -> ApresResult<BurstDescriptor> {
        if burst == 0 {
            return Err(ApresError::BurstNotFound {
                requested: 0,
                found: 0,
            });
        }

        let mut pointer: u64 = 0;
        let mut count: usize = 1;
        loop {
            if pointer + MAX_HEADER_LEN as u64 > self.file_len {
                return Err(ApresError::BurstNotFound {
                    requested: burst,
                    found: count - 1,
                });
            }

            let window = self.read_window(pointer, MAX_HEADER_LEN)?;
            let desc = self.parse_burst_header(count, pointer, &window)?;
            if count == burst {
                debug!(
                    "burst {burst}: header at {}, data at {}, {} chirps x {} samples",
                    desc.header_offset, desc.data_offset, desc.chirps_in_burst,
                    desc.samples_per_chirp
                );
                return Ok(desc);
            }

            let block_len = (desc.words_per_burst() * desc.averaging.bytes_per_word()) as u64;
            pointer = desc.data_offset + block_len;
            count += 1;
        }
    }

    /// Декодирует один burst целиком: поиск, извлечение, калибровка,
    /// вывод параметров чирпа.
    ///
    /// Строгий путь: усечённый блок данных — ошибка с фактическим
    /// количеством слов, никакого дополнения нулями.
    pub fn burst(&mut self, burst: usize) -> ApresResult<BurstRecord> {
        let descriptor = self.descriptor(burst)?;

        let prefix = HeaderBlock::new(&self.prefix);
        let chirp_params = derive_parameters(
            self.format,
            &prefix,
            self.fs_hint,
            descriptor.samples_per_chirp,
        )?;

        let expected = descriptor.words_per_burst();
        let flat = self.read_burst_words(&descriptor)?;
        if flat.len() < expected {
            return Err(ApresError::TruncatedBurst {
                expected,
                got: flat.len(),
            });
        }

        let data = SampleMatrix::from_flat(
            descriptor.chirps_in_burst,
            descriptor.samples_per_chirp,
            flat,
        );
        let chirps = 1..=descriptor.chirps_in_burst;
        let chirp_num: Vec<usize> = chirps.clone().collect();
        let chirp_att: Vec<AttenuatorCode> = chirps
            .clone()
            .map(|c| descriptor.attenuator_for_chirp(c))
            .collect();
        let chirp_time = chirps.map(|c| descriptor.chirp_time(c)).collect();

        Ok(BurstRecord {
            descriptor,
            chirp_params,
            data,
            chirp_num,
            chirp_att,
            chirp_time,
        })
    }

    /// Читает и калибрует доступные слова блока данных burst-а.
    ///
    /// Нижний уровень для [`burst`]: возвращает столько слов, сколько
    /// есть в файле (не больше заявленного), позволяя вызывающему
    /// осознанно принять короткую матрицу.
    ///
    /// [`burst`]: BurstReader::burst
    pub fn read_burst_words(&mut self, desc: &BurstDescriptor) -> ApresResult<Vec<f32>> {
        let expected = desc.words_per_burst();
        let mut start = desc.data_offset;
        if desc.averaging == Averaging::Averaged {
            start += AVERAGED_READ_SKEW;
        }

        let avail_bytes = self.file_len.saturating_sub(start) as usize;
        let avail = (avail_bytes / desc.averaging.bytes_per_word()).min(expected);
        self.src.seek(SeekFrom::Start(start))?;

        let volts = match desc.averaging {
            Averaging::Stacked => {
                let mut raw = vec![0u32; avail];
                self.src.read_u32_into::<LittleEndian>(&mut raw)?;
                // после калибровки сумма нормируется на количество
                // сложенных чирпов
                let norm = (desc.sub_bursts * desc.n_attenuators) as f32;
                raw.iter()
                    .map(|&w| w as f32 * VOLTS_PER_COUNT / norm)
                    .collect()
            }
            Averaging::Averaged => {
                let mut raw = vec![0f32; avail];
                self.src.read_f32_into::<LittleEndian>(&mut raw)?;
                raw.iter().map(|&v| v * VOLTS_PER_COUNT).collect()
            }
            Averaging::None => {
                let mut raw = vec![0u16; avail];
                self.src.read_u16_into::<LittleEndian>(&mut raw)?;
                raw.iter().map(|&w| wrap_u16(w) * VOLTS_PER_COUNT).collect()
            }
        };
        Ok(volts)
    }

    /// Разбирает обязательные поля заголовка одного burst-а.
    fn parse_burst_header(
        &self,
        burst: usize,
        header_offset: u64,
        window: &[u8],
    ) -> ApresResult<BurstDescriptor> {
        let h = HeaderBlock::new(window);

        let samples_per_chirp = h.require_int("N_ADC_SAMPLES=")? as usize;
        let sub_bursts = h.require_int("NSubBursts=")? as usize;

        // Единственное поле с законным умолчанием: ранние прошивки
        // не писали Average вовсе
        let averaging = match h.int("Average=")? {
            Some(v) => Averaging::from_field(v),
            None => {
                if self.format == FileFormat::Format5 {
                    warn!("burst {burst}: `Average=` absent in a format 5 header, assuming 0");
                }
                Averaging::None
            }
        };

        let n_attenuators = h.require_int("nAttenuators=")? as usize;
        if n_attenuators == 0 {
            return Err(ApresError::malformed_field("nAttenuators=", "must be >= 1"));
        }
        let att1 = h
            .float_list("Attenuator1=", n_attenuators)?
            .ok_or_else(|| ApresError::missing_field("Attenuator1="))?;
        let att2 = h
            .float_list("AFGain=", n_attenuators)?
            .ok_or_else(|| ApresError::missing_field("AFGain="))?;
        let attenuators: Vec<AttenuatorCode> = att1
            .iter()
            .zip(att2.iter())
            .map(|(&attenuator, &af_gain)| AttenuatorCode {
                attenuator,
                af_gain,
            })
            .collect();

        // Активны только записи, равные 1
        let tx = h
            .int_list("TxAnt=", MAX_ANTENNAS)?
            .ok_or_else(|| ApresError::missing_field("TxAnt="))?;
        let rx = h
            .int_list("RxAnt=", MAX_ANTENNAS)?
            .ok_or_else(|| ApresError::missing_field("RxAnt="))?;
        let active_tx = tx.iter().filter(|&&v| v == 1).count();
        let active_rx = rx.iter().filter(|&&v| v == 1).count();

        let chirps_in_burst = if averaging == Averaging::None {
            sub_bursts * active_tx * active_rx * n_attenuators
        } else {
            1
        };

        let rel_data = h
            .offset_past(END_HEADER_MARKER)
            .ok_or_else(|| ApresError::missing_field("*** End Header ***"))?;

        let time_stamp = h
            .timestamp("Time stamp=")?
            .ok_or_else(|| ApresError::missing_field("Time stamp="))?;
        let temperature_1 = h.float("Temp1=")?.map(clean_temperature);
        let temperature_2 = h.float("Temp2=")?.map(clean_temperature);
        let battery_voltage = h.float("BatteryVoltage=")?;

        Ok(BurstDescriptor {
            burst,
            header_offset,
            data_offset: header_offset + rel_data as u64,
            samples_per_chirp,
            sub_bursts,
            chirps_in_burst,
            averaging,
            n_attenuators,
            attenuators,
            active_tx,
            active_rx,
            time_stamp,
            temperature_1,
            temperature_2,
            battery_voltage,
        })
    }

    fn read_window(&mut self, offset: u64, len: usize) -> ApresResult<Vec<u8>> {
        let len = len.min((self.file_len - offset) as usize);
        self.src.seek(SeekFrom::Start(offset))?;
        let mut window = vec![0u8; len];
        self.src.read_exact(&mut window)?;
        Ok(window)
    }
}

/// Заворот 16-битного слова: после знаковой переинтерпретации
/// отрицательные значения сдвигаются на 2¹⁶ обратно в беззнаковый
/// диапазон. Для слов, прочитанных как u16, ветвь не срабатывает.
fn wrap_u16(word: u16) -> f32 {
    let signed = word as i16 as f32;
    if signed < 0.0 {
        signed + 65536.0
    } else {
        signed
    }
}
