use std::io::{Cursor, Write};

use apres_core::BurstReader;
use apres_types::{ApresError, Averaging, FileFormat, RampDir};
use tempfile::NamedTempFile;

// ===========================================================================
// Helpers — детерминированные синтетические burst-файлы
// ===========================================================================

/// Заголовок format 5 в стиле реального RMB2: config.ini скопирован
/// в каждый burst, данные начинаются сразу за `*** End Header ***`.
fn header_string(minute: usize, n_adc: usize, average: Option<i64>) -> String {
    let mut s = String::new();
    s.push_str("SW_Issue=101\r\n");
    s.push_str(&format!("Time stamp=2014-10-22 13:{minute:02}:00\r\n"));
    s.push_str(&format!("N_ADC_SAMPLES={n_adc}\r\n"));
    s.push_str("NSubBursts=2\r\n");
    if let Some(a) = average {
        s.push_str(&format!("Average={a}\r\n"));
    }
    s.push_str("nAttenuators=2\r\n");
    s.push_str("Attenuator1=30,20,0,0\r\n");
    s.push_str("AFGain=-4,-14,0,0\r\n");
    s.push_str("TxAnt=1,0,0,0,0,0,0,0\r\n");
    s.push_str("RxAnt=1,0,0,0,0,0,0,0\r\n");
    s.push_str("Temp1=305\r\n");
    s.push_str("Temp2=21.5\r\n");
    s.push_str("BatteryVoltage=12.6\r\n");
    s.push_str("SamplingFreqMode=0\n");
    s.push_str("Reg01=\"00D22820\"\r\n");
    s.push_str("Reg0B=\"6666666633333333\"\r\n");
    s.push_str("Reg0C=\"0001000000014F8B\"\r\n");
    s.push_str("Reg0D=\"000061A8\"\r\n");
    s.push_str("*** End Header ***");
    s
}

/// Ожидаемое количество чирпов тестового заголовка без усреднения:
/// NSubBursts(2) × активные Tx(1) × Rx(1) × nAttenuators(2)
const CHIRPS: usize = 4;

/// Детерминированное 16-битное слово выборки
fn word_pattern(burst: usize, word: usize) -> u16 {
    ((burst * 9973 + word) % 65536) as u16
}

/// Файл из `bursts` burst-ов без усреднения, u16 данные.
fn build_plain_file(bursts: usize, n_adc: usize) -> Vec<u8> {
    let mut raw = Vec::new();
    for b in 1..=bursts {
        raw.extend_from_slice(header_string(b, n_adc, Some(0)).as_bytes());
        for w in 0..CHIRPS * n_adc {
            raw.extend_from_slice(&word_pattern(b, w).to_le_bytes());
        }
    }
    raw
}

fn reader_for(raw: Vec<u8>) -> BurstReader<Cursor<Vec<u8>>> {
    BurstReader::new(Cursor::new(raw)).unwrap()
}

const VOLTS_PER_COUNT: f32 = 2.5 / 65536.0;

// ===========================================================================
// Формат и поиск burst-ов
// ===========================================================================

#[test]
fn test_classified_as_format5() {
    let reader = reader_for(build_plain_file(1, 1000));
    assert_eq!(reader.format(), FileFormat::Format5);
}

#[test]
fn test_unknown_format_fails_at_open() {
    let result = BurstReader::new(Cursor::new(vec![0u8; 3000]));
    assert!(matches!(
        result.unwrap_err(),
        ApresError::UnknownFormat { .. }
    ));
}

#[test]
fn test_locator_is_idempotent_across_call_order() {
    let mut reader = reader_for(build_plain_file(5, 500));

    let first = reader.descriptor(3).unwrap();
    let high = reader.descriptor(5).unwrap();
    let again = reader.descriptor(3).unwrap();

    assert_eq!(first.header_offset, again.header_offset);
    assert_eq!(first.data_offset, again.data_offset);
    assert!(high.header_offset > first.header_offset);
}

#[test]
fn test_sequential_offsets_follow_block_sizes() {
    let mut reader = reader_for(build_plain_file(3, 500));

    let d1 = reader.descriptor(1).unwrap();
    let d2 = reader.descriptor(2).unwrap();
    assert_eq!(d1.header_offset, 0);
    // следующий заголовок сразу за блоком данных предыдущего
    assert_eq!(
        d2.header_offset,
        d1.data_offset + (d1.words_per_burst() * 2) as u64
    );
    assert_eq!(d1.chirps_in_burst, CHIRPS);
    assert_eq!(d1.samples_per_chirp, 500);
}

#[test]
fn test_burst_not_found_reports_count() {
    let mut reader = reader_for(build_plain_file(3, 500));
    match reader.burst(10) {
        Err(ApresError::BurstNotFound { requested, found }) => {
            assert_eq!(requested, 10);
            assert_eq!(found, 3);
        }
        other => panic!("expected BurstNotFound, got {other:?}"),
    }
}

#[test]
fn test_missing_required_field_is_malformed_header() {
    let mut raw = header_string(1, 500, Some(0))
        .replace("NSubBursts=2\r\n", "")
        .into_bytes();
    raw.extend(std::iter::repeat(0u8).take(4000));

    let mut reader = reader_for(raw);
    match reader.descriptor(1) {
        Err(ApresError::MalformedHeader { field, .. }) => {
            assert_eq!(field, "NSubBursts=");
        }
        other => panic!("expected MalformedHeader, got {other:?}"),
    }
}

// ===========================================================================
// Извлечение и калибровка
// ===========================================================================

#[test]
fn test_word_count_matches_header_fields() {
    let mut reader = reader_for(build_plain_file(3, 500));
    let record = reader.burst(2).unwrap();

    assert_eq!(record.data.rows(), CHIRPS);
    assert_eq!(record.data.cols(), 500);
    assert_eq!(
        record.data.as_flat().len(),
        record.descriptor.words_per_burst()
    );
}

#[test]
fn test_u16_calibration_and_row_order() {
    let mut reader = reader_for(build_plain_file(2, 500));
    let record = reader.burst(2).unwrap();

    // row-major порядок съёма: строка c, столбец i — слово c*500+i
    for (c, i) in [(0, 0), (1, 17), (3, 499)] {
        let expected = word_pattern(2, c * 500 + i) as f32 * VOLTS_PER_COUNT;
        assert!((record.data.row(c)[i] - expected).abs() < 1e-7);
    }
}

#[test]
fn test_u16_full_scale_word() {
    // Слово 0xFFFF — беззнаковый максимум, ветвь заворота не срабатывает
    let n_adc = 800;
    let mut raw = header_string(1, n_adc, Some(0)).into_bytes();
    for _ in 0..CHIRPS * n_adc {
        raw.extend_from_slice(&0xFFFFu16.to_le_bytes());
    }

    let mut reader = reader_for(raw);
    let record = reader.burst(1).unwrap();
    let volts = record.data.row(0)[0];
    assert!((volts - 65535.0 * 2.5 / 65536.0).abs() < 1e-6);
    assert!(volts > 2.499 && volts < 2.5);
}

#[test]
fn test_attenuator_codes_cycle() {
    let mut reader = reader_for(build_plain_file(1, 500));
    let record = reader.burst(1).unwrap();

    // 2 кода на 4 чирпа: [0,1,0,1]
    let picked: Vec<f64> = record.chirp_att.iter().map(|a| a.attenuator).collect();
    assert_eq!(picked, vec![30.0, 20.0, 30.0, 20.0]);
    let gains: Vec<f64> = record.chirp_att.iter().map(|a| a.af_gain).collect();
    assert_eq!(gains, vec![-4.0, -14.0, -4.0, -14.0]);
}

#[test]
fn test_chirp_numbers_and_times() {
    let mut reader = reader_for(build_plain_file(1, 500));
    let record = reader.burst(1).unwrap();

    assert_eq!(record.chirp_num, vec![1, 2, 3, 4]);
    assert_eq!(record.chirp_time[0], record.descriptor.time_stamp);
    let spacing = record.chirp_time[1] - record.chirp_time[0];
    assert_eq!(spacing.num_microseconds().unwrap(), 1_638_400);
}

#[test]
fn test_temperature_wraparound_cleaned() {
    let mut reader = reader_for(build_plain_file(1, 500));
    let d = reader.descriptor(1).unwrap();

    // Temp1=305 > 300 → −512; Temp2=21.5 без изменений
    assert_eq!(d.temperature_1, Some(305.0 - 512.0));
    assert_eq!(d.temperature_2, Some(21.5));
    assert_eq!(d.battery_voltage, Some(12.6));
}

#[test]
fn test_stacked_mode_u32_and_normalization() {
    let n_adc = 2000usize;
    let mut raw = header_string(1, n_adc, Some(2)).into_bytes();
    for w in 0..n_adc {
        raw.extend_from_slice(&(1000 + w as u32).to_le_bytes());
    }

    let mut reader = reader_for(raw);
    let record = reader.burst(1).unwrap();
    assert_eq!(record.descriptor.averaging, Averaging::Stacked);
    assert_eq!(record.data.rows(), 1);

    // нормировка на NSubBursts × nAttenuators = 4
    let expected = 1000.0f32 * 2.5 / 65536.0 / 4.0;
    assert!((record.data.row(0)[0] - expected).abs() < 1e-7);
}

#[test]
fn test_averaged_mode_reads_one_byte_past_data_offset() {
    let n_adc = 2000usize;
    let mut raw = header_string(1, n_adc, Some(1)).into_bytes();
    raw.push(0xAA); // байт, который пропускает сдвинутое чтение
    for w in 0..n_adc {
        raw.extend_from_slice(&(w as f32).to_le_bytes());
    }

    let mut reader = reader_for(raw);
    let record = reader.burst(1).unwrap();
    assert_eq!(record.descriptor.averaging, Averaging::Averaged);
    assert_eq!(record.data.rows(), 1);

    for i in [0usize, 1, 1999] {
        let expected = i as f32 * VOLTS_PER_COUNT;
        assert!((record.data.row(0)[i] - expected).abs() < 1e-6);
    }
}

#[test]
fn test_truncated_burst_reports_partial_count() {
    let n_adc = 2000usize;
    let mut raw = header_string(1, n_adc, Some(0)).into_bytes();
    let header_len = raw.len();
    for w in 0..CHIRPS * n_adc {
        raw.extend_from_slice(&word_pattern(1, w).to_le_bytes());
    }
    // обрезаем половину блока данных
    raw.truncate(header_len + CHIRPS * n_adc);

    let mut reader = reader_for(raw);
    match reader.burst(1) {
        Err(ApresError::TruncatedBurst { expected, got }) => {
            assert_eq!(expected, CHIRPS * n_adc);
            assert_eq!(got, CHIRPS * n_adc / 2);
        }
        other => panic!("expected TruncatedBurst, got {other:?}"),
    }

    // нижний уровень отдаёт доступные слова — короткую матрицу
    // вызывающий принимает осознанно
    let d = reader.descriptor(1).unwrap();
    let words = reader.read_burst_words(&d).unwrap();
    assert_eq!(words.len(), CHIRPS * n_adc / 2);
}

#[test]
fn test_random_words_survive_calibration() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let n_adc = 500usize;
    let mut rng = StdRng::seed_from_u64(7);
    let words: Vec<u16> = (0..CHIRPS * n_adc).map(|_| rng.gen()).collect();

    let mut raw = header_string(1, n_adc, Some(0)).into_bytes();
    for w in &words {
        raw.extend_from_slice(&w.to_le_bytes());
    }

    let mut reader = reader_for(raw);
    let record = reader.burst(1).unwrap();
    for (i, &w) in words.iter().enumerate() {
        let expected = w as f32 * VOLTS_PER_COUNT;
        assert!((record.data.as_flat()[i] - expected).abs() < 1e-7);
    }
}

// ===========================================================================
// Параметры чирпа и файловый путь
// ===========================================================================

#[test]
fn test_chirp_parameters_derived_from_prefix() {
    let mut reader = reader_for(build_plain_file(2, 500));
    let record = reader.burst(2).unwrap();
    let p = &record.chirp_params;

    assert_eq!(p.fs, 4.0e4);
    assert!((p.f0 - 2.0e8).abs() < 1.0);
    assert_eq!(p.ramp_dir, RampDir::Up);
    // развёртка покрывает 1 с, но снято лишь 500 выборок — чирп обрезан
    assert!((p.chirp_length - 500.0 / 4.0e4).abs() < 1e-12);
    assert_eq!(p.nchirp_samples, 500);
    assert!((p.lambdac() - p.ci() / p.fc).abs() < 1e-12);
}

#[test]
fn test_open_from_disk() {
    let raw = build_plain_file(2, 500);
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&raw).unwrap();
    file.flush().unwrap();

    let mut reader = BurstReader::open(file.path()).unwrap();
    assert_eq!(reader.format(), FileFormat::Format5);
    let record = reader.burst(2).unwrap();
    assert_eq!(record.data.rows(), CHIRPS);
    assert_eq!(record.data.cols(), 500);
}

#[test]
fn test_average_absent_defaults_to_zero() {
    // единственное законное умолчание: Average отсутствует → 0
    let mut raw = header_string(1, 500, None).into_bytes();
    for w in 0..CHIRPS * 500 {
        raw.extend_from_slice(&word_pattern(1, w).to_le_bytes());
    }

    let mut reader = reader_for(raw);
    let d = reader.descriptor(1).unwrap();
    assert_eq!(d.averaging, Averaging::None);
    assert_eq!(d.chirps_in_burst, CHIRPS);
}
