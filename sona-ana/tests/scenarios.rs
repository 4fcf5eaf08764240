//! End-to-end scenarios: synthesize audio, write it through a format
//! driver, analyze the file and check the results.

use sona_ana::{
    compute_diff, compute_rms, compute_zcr, set_diff_defaults, set_rms_defaults,
    set_zcr_defaults, AnaOptions,
};
use sona_sdo::{
    CloseAction, DataCoding, DataDescriptor, DataFormat, DataObject, DataType, FileFormat,
    OpenMode,
};
use std::f64::consts::PI;
use std::path::Path;

fn write_wave(path: &Path, samples: &[i16], rate: f64) {
    let mut dop = DataObject::new();
    dop.file_format = FileFormat::Wave;
    dop.samp_freq = rate;
    dop.frame_dur = 1;
    let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Int16);
    dd.coding = DataCoding::Linear;
    dd.num_bits = 16;
    dd.num_fields = 1;
    dop.descriptors.push(dd);
    dop.set_record_size().unwrap();
    dop.check_rates().unwrap();
    dop.create(path).unwrap();
    dop.alloc_data_buffer(samples.len() as i64).unwrap();
    for (i, s) in samples.iter().enumerate() {
        dop.record_bytes_mut(i as i64)
            .copy_from_slice(&s.to_ne_bytes());
    }
    dop.buffer.buf_num_recs = samples.len() as i64;
    dop.buffer.needs_save = true;
    dop.close(CloseAction::Free).unwrap();
}

#[test]
fn wave_to_rms_pipeline() {
    // 1 second of a 1 kHz sine at 16 kHz, full scale
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("tone.wav");
    let samples: Vec<i16> = (0..16000)
        .map(|n| (32767.0 * (2.0 * PI * 1000.0 * n as f64 / 16000.0).sin()).round() as i16)
        .collect();
    write_wave(&wav, &samples, 16000.0);

    let mut smp = DataObject::open(&wav, OpenMode::Read).unwrap();
    let mut opts = AnaOptions::default();
    set_rms_defaults(&mut opts);
    opts.effective = false; // 20 ms true window length
    let rms = dir.path().join("tone.rms");
    let mut out = sona_ana::create_rms(&smp, &mut opts).unwrap();
    out.create(&rms).unwrap();
    sona_ana::compute_rms_into(&mut smp, Some(&opts), &mut out).unwrap();
    out.close(CloseAction::Free).unwrap();

    let mut back = DataObject::open(&rms, OpenMode::Read).unwrap();
    assert_eq!(back.file_format, FileFormat::Ssff);
    assert_eq!(back.num_records, 197);
    assert_eq!(back.data_rate, 200.0);
    assert_eq!(back.descriptors[0].dtype, DataType::Rms);

    // the sine sits at 20*log10(1/sqrt(2)) dBFS, i.e. 3 dB below peak
    let expect = 20.0 * (32767.0 / 2.0f64.sqrt()).log10();
    let mut rec = vec![0u8; back.record_size];
    for nr in 20..180 {
        back.read_records(nr, 1, &mut rec).unwrap();
        let db = f32::from_ne_bytes(rec[0..4].try_into().unwrap()) as f64;
        assert!((db - expect).abs() < 0.05, "record {nr}: {db} vs {expect}");
    }
}

#[test]
fn square_wave_zcr_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("square.wav");
    let samples: Vec<i16> = (0..10000)
        .map(|n| if (n / 5) % 2 == 0 { 8000 } else { -8000 })
        .collect();
    write_wave(&wav, &samples, 10000.0);

    let mut smp = DataObject::open(&wav, OpenMode::Read).unwrap();
    let mut opts = AnaOptions::default();
    set_zcr_defaults(&mut opts);
    opts.ms_size = 10.0; // 100 samples
    let out = compute_zcr(&mut smp, &mut opts).unwrap();
    assert!(out.buffer.buf_num_recs > 20);
    for i in 5..20 {
        let rate = f32::from_ne_bytes(out.record_bytes(i)[0..4].try_into().unwrap());
        assert!((rate - 2000.0).abs() <= 20.0, "frame {i}: {rate}");
    }
}

#[test]
fn forward_difference_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("ramp.wav");
    let samples: Vec<i16> = (0..2000).map(|n| ((n % 400) * 10) as i16).collect();
    write_wave(&wav, &samples, 16000.0);

    let mut smp = DataObject::open(&wav, OpenMode::Read).unwrap();
    let mut opts = AnaOptions::default();
    set_diff_defaults(&mut opts);
    let mut out = sona_ana::create_diff(&smp, &mut opts).unwrap();
    let dff = dir.path().join("ramp.dff.wav");
    out.create(&dff).unwrap();
    sona_ana::compute_diff_into(&mut smp, &opts, &mut out).unwrap();
    out.close(CloseAction::Free).unwrap();

    let mut back = DataObject::open(&dff, OpenMode::Read).unwrap();
    assert_eq!(back.num_records, 2000);
    let mut rec = vec![0u8; back.record_size];
    back.read_records(0, 1, &mut rec).unwrap();
    let first = i16::from_ne_bytes(rec[0..2].try_into().unwrap());
    assert_eq!(first as i32, samples[1] as i32 - samples[0] as i32);
}

#[test]
fn rms_in_memory_equals_rms_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("mix.wav");
    let samples: Vec<i16> = (0..8000)
        .map(|n| {
            let t = n as f64 / 16000.0;
            ((6000.0 * (2.0 * PI * 400.0 * t).sin()) + 2000.0 * (2.0 * PI * 2500.0 * t).sin())
                .round() as i16
        })
        .collect();
    write_wave(&wav, &samples, 16000.0);

    // memory-bound input
    let mut mem = DataObject::new();
    mem.samp_freq = 16000.0;
    mem.frame_dur = 1;
    let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Int16);
    dd.coding = DataCoding::Linear;
    dd.num_fields = 1;
    mem.descriptors.push(dd);
    mem.set_record_size().unwrap();
    mem.check_rates().unwrap();
    mem.alloc_data_buffer(samples.len() as i64).unwrap();
    for (i, s) in samples.iter().enumerate() {
        mem.record_bytes_mut(i as i64).copy_from_slice(&s.to_ne_bytes());
    }
    mem.buffer.buf_num_recs = samples.len() as i64;

    let mut opts = AnaOptions::default();
    set_rms_defaults(&mut opts);
    let from_mem = compute_rms(&mut mem, &mut opts).unwrap();

    let mut file_smp = DataObject::open(&wav, OpenMode::Read).unwrap();
    let mut opts2 = AnaOptions::default();
    set_rms_defaults(&mut opts2);
    let from_file = compute_rms(&mut file_smp, &mut opts2).unwrap();

    assert_eq!(from_mem.buffer.buf_num_recs, from_file.buffer.buf_num_recs);
    for i in 0..from_mem.buffer.buf_num_recs {
        let a = f32::from_ne_bytes(from_mem.record_bytes(i)[0..4].try_into().unwrap());
        let b = f32::from_ne_bytes(from_file.record_bytes(i)[0..4].try_into().unwrap());
        assert_eq!(a, b, "record {i}");
    }
}

#[test]
fn event_analysis_yields_one_record() {
    let mut mem = DataObject::new();
    mem.samp_freq = 16000.0;
    mem.frame_dur = 1;
    let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Int16);
    dd.coding = DataCoding::Linear;
    dd.num_fields = 1;
    mem.descriptors.push(dd);
    mem.set_record_size().unwrap();
    mem.check_rates().unwrap();
    mem.alloc_data_buffer(16000).unwrap();
    for n in 0..16000i64 {
        let v = (1000.0 * (2.0 * PI * 500.0 * n as f64 / 16000.0).sin()).round() as i16;
        mem.record_bytes_mut(n).copy_from_slice(&v.to_ne_bytes());
    }
    mem.buffer.buf_num_recs = 16000;

    let mut opts = AnaOptions::default();
    set_rms_defaults(&mut opts);
    opts.use_ctime = true;
    opts.centre_time = 0.5;
    let out = compute_rms(&mut mem, &mut opts).unwrap();
    assert_eq!(out.buffer.buf_num_recs, 1);
    assert_eq!(out.start_record, (0.5f64 * 16000.0).round() as i64);
    assert_eq!(out.frame_dur, 1);
}
