use std::{hint::black_box, io::Cursor};

use criterion::{criterion_group, criterion_main, Criterion};

use apres_core::BurstReader;

/// Синтетический format 5 файл: `bursts` burst-ов по 4 чирпа × `n_adc`
/// 16-битных выборок.
fn build_file(bursts: usize, n_adc: usize) -> Vec<u8> {
    let mut raw = Vec::new();
    for b in 1..=bursts {
        raw.extend_from_slice(
            format!(
                "SW_Issue=101\r\nTime stamp=2014-10-22 13:{b:02}:00\r\n\
                 N_ADC_SAMPLES={n_adc}\r\nNSubBursts=2\r\nAverage=0\r\n\
                 nAttenuators=2\r\nAttenuator1=30,20\r\nAFGain=-4,-14\r\n\
                 TxAnt=1,0,0,0,0,0,0,0\r\nRxAnt=1,0,0,0,0,0,0,0\r\n\
                 Temp1=21.0\r\nTemp2=21.5\r\nBatteryVoltage=12.6\r\n\
                 SamplingFreqMode=0\nReg01=\"00D22820\"\r\n\
                 Reg0B=\"6666666633333333\"\r\nReg0C=\"0001000000014F8B\"\r\n\
                 Reg0D=\"000061A8\"\r\n*** End Header ***"
            )
            .as_bytes(),
        );
        for w in 0..4 * n_adc {
            raw.extend_from_slice(&(((b * 9973 + w) % 65536) as u16).to_le_bytes());
        }
    }
    raw
}

fn bench_burst_decode(c: &mut Criterion) {
    let raw = build_file(8, 40_000);

    c.bench_function("decode_first_burst", |b| {
        b.iter(|| {
            let mut reader = BurstReader::new(Cursor::new(raw.clone())).unwrap();
            black_box(reader.burst(1).unwrap())
        })
    });

    c.bench_function("locate_eighth_burst", |b| {
        b.iter(|| {
            let mut reader = BurstReader::new(Cursor::new(raw.clone())).unwrap();
            black_box(reader.descriptor(8).unwrap())
        })
    });
}

criterion_group!(benches, bench_burst_decode);
criterion_main!(benches);
