//! File round-trip tests: what a driver writes, the probing reader must
//! reproduce bit-exactly where the format can represent the data.

use sona_sdo::{
    CloseAction, DataCoding, DataDescriptor, DataFormat, DataObject, DataType, Endian, FileFormat,
    Label, LabelPosition, OpenMode,
};
use std::f64::consts::PI;
use std::path::Path;

fn sine_i16(num: usize, freq: f64, rate: f64, amp: f64) -> Vec<i16> {
    (0..num)
        .map(|n| (amp * (2.0 * PI * freq * n as f64 / rate).sin()).round() as i16)
        .collect()
}

fn audio_object(format: FileFormat, rate: f64, channels: usize) -> DataObject {
    let mut dop = DataObject::new();
    dop.file_format = format;
    dop.samp_freq = rate;
    dop.frame_dur = 1;
    let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Int16);
    dd.coding = DataCoding::Linear;
    dd.num_bits = 16;
    dd.num_fields = channels;
    dd.ident = Some(String::from("audio"));
    dop.descriptors.push(dd);
    dop.set_record_size().unwrap();
    dop.check_rates().unwrap();
    dop
}

fn write_audio(path: &Path, format: FileFormat, samples: &[i16], rate: f64) {
    let mut dop = audio_object(format, rate, 1);
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

fn read_audio(path: &Path) -> (DataObject, Vec<i16>) {
    let mut dop = DataObject::open(path, OpenMode::Read).unwrap();
    let n = dop.num_records;
    let mut bytes = vec![0u8; (n as usize) * dop.record_size];
    let got = dop.read_records(dop.start_record, n, &mut bytes).unwrap();
    assert_eq!(got, n);
    let samples = bytes
        .chunks_exact(2)
        .map(|b| i16::from_ne_bytes([b[0], b[1]]))
        .collect();
    (dop, samples)
}

#[test]
fn wave_round_trip_is_bit_exact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    let samples = sine_i16(16000, 1000.0, 16000.0, 30000.0);
    write_audio(&path, FileFormat::Wave, &samples, 16000.0);

    let (dop, read) = read_audio(&path);
    assert_eq!(dop.file_format, FileFormat::Wave);
    assert_eq!(dop.samp_freq, 16000.0);
    assert_eq!(dop.num_records, 16000);
    assert_eq!(dop.descriptors[0].num_fields, 1);
    assert_eq!(dop.descriptors[0].num_bits, 16);
    assert_eq!(dop.file_endian, Endian::Little);
    assert_eq!(read, samples);
}

#[test]
fn wave_float_uses_format_code_3_and_fact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("float.wav");
    let mut dop = DataObject::new();
    dop.file_format = FileFormat::Wave;
    dop.samp_freq = 8000.0;
    dop.frame_dur = 1;
    let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Real32);
    dd.coding = DataCoding::Linear;
    dd.num_fields = 1;
    dop.descriptors.push(dd);
    dop.set_record_size().unwrap();
    dop.create(&path).unwrap();
    dop.alloc_data_buffer(4).unwrap();
    for (i, v) in [0.5f32, -0.5, 0.25, -1.0].iter().enumerate() {
        dop.record_bytes_mut(i as i64)
            .copy_from_slice(&v.to_ne_bytes());
    }
    dop.buffer.buf_num_recs = 4;
    dop.buffer.needs_save = true;
    dop.close(CloseAction::Free).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    // plain fmt chunk with IEEE float code and a fact chunk
    assert_eq!(u16::from_le_bytes([bytes[20], bytes[21]]), 3);
    assert!(bytes.windows(4).any(|w| w == b"fact"));

    let back = DataObject::open(&path, OpenMode::Read).unwrap();
    assert_eq!(back.descriptors[0].format, DataFormat::Real32);
    assert_eq!(back.num_records, 4);
}

#[test]
fn wave_24_bit_stereo_goes_extensible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deep.wav");
    let mut dop = DataObject::new();
    dop.file_format = FileFormat::Wave;
    dop.samp_freq = 48000.0;
    dop.frame_dur = 1;
    let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Int24);
    dd.coding = DataCoding::Linear;
    dd.num_bits = 24;
    dd.num_fields = 2;
    dop.descriptors.push(dd);
    dop.set_record_size().unwrap();
    dop.create(&path).unwrap();
    dop.close(CloseAction::Free).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(u16::from_le_bytes([bytes[20], bytes[21]]), 0xFFFE);

    let back = DataObject::open(&path, OpenMode::Read).unwrap();
    assert_eq!(back.file_format, FileFormat::WaveX);
    assert_eq!(back.descriptors[0].format, DataFormat::Int24);
    assert_eq!(back.descriptors[0].num_fields, 2);
    assert_eq!(back.descriptors[0].num_bits, 24);
}

#[test]
fn aiff_round_trip_big_endian() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.aif");
    let samples = sine_i16(400, 440.0, 8000.0, 12000.0);
    write_audio(&path, FileFormat::Aiff, &samples, 8000.0);

    let (dop, read) = read_audio(&path);
    assert_eq!(dop.file_format, FileFormat::Aiff);
    assert_eq!(dop.file_endian, Endian::Big);
    assert_eq!(dop.samp_freq, 8000.0);
    assert_eq!(read, samples);
}

#[test]
fn aifc_carries_fver_and_lowercase_compression() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("float.afc");
    let mut dop = DataObject::new();
    dop.file_format = FileFormat::Aifc;
    dop.samp_freq = 16000.0;
    dop.frame_dur = 1;
    let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Real32);
    dd.coding = DataCoding::Linear;
    dd.num_fields = 1;
    dop.descriptors.push(dd);
    dop.set_record_size().unwrap();
    dop.create(&path).unwrap();
    dop.close(CloseAction::Free).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[8..12], b"AIFC");
    assert!(bytes.windows(4).any(|w| w == b"FVER"));
    assert!(bytes.windows(4).any(|w| w == b"fl32"));

    let back = DataObject::open(&path, OpenMode::Read).unwrap();
    assert_eq!(back.file_format, FileFormat::Aifc);
    assert_eq!(back.descriptors[0].format, DataFormat::Real32);
}

#[test]
fn snd_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.au");
    let samples = sine_i16(300, 300.0, 8000.0, 10000.0);
    write_audio(&path, FileFormat::Snd, &samples, 8000.0);
    let (dop, read) = read_audio(&path);
    assert_eq!(dop.file_format, FileFormat::Snd);
    assert_eq!(dop.header_size, 28);
    assert_eq!(read, samples);
}

#[test]
fn nist_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.nist");
    let samples = sine_i16(500, 100.0, 16000.0, 8000.0);
    write_audio(&path, FileFormat::Nist, &samples, 16000.0);
    let (dop, read) = read_audio(&path);
    assert_eq!(dop.file_format, FileFormat::Nist);
    assert_eq!(dop.header_size, 1024);
    assert_eq!(dop.num_records, 500);
    assert_eq!(read, samples);
}

#[test]
fn csl_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.nsp");
    let samples = sine_i16(256, 500.0, 11025.0, 5000.0);
    write_audio(&path, FileFormat::Csl, &samples, 11025.0);
    let (dop, read) = read_audio(&path);
    assert_eq!(dop.file_format, FileFormat::Csl);
    assert_eq!(read, samples);
}

#[test]
fn kth_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.smp");
    let samples = sine_i16(128, 1000.0, 16000.0, 20000.0);
    write_audio(&path, FileFormat::Kth, &samples, 16000.0);
    let (dop, read) = read_audio(&path);
    assert_eq!(dop.file_format, FileFormat::Kth);
    assert_eq!(dop.header_size, 1024);
    assert_eq!(read, samples);
}

#[test]
fn ssff_start_time_defines_start_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("track.ssff");
    let mut dop = DataObject::new();
    dop.file_format = FileFormat::Ssff;
    dop.data_rate = 200.0;
    dop.samp_freq = 200.0;
    dop.frame_dur = 1;
    dop.start_record = 250;
    let mut dd = DataDescriptor::new(DataType::Undefined, DataFormat::Real32);
    dd.ident = Some(String::from("pos"));
    dd.num_fields = 1;
    dop.descriptors.push(dd);
    dop.set_record_size().unwrap();
    dop.create(&path).unwrap();
    dop.alloc_data_buffer(1000).unwrap();
    dop.buffer.buf_start_rec = 250;
    for i in 0..1000i64 {
        let v = i as f32 / 10.0;
        dop.record_bytes_mut(i).copy_from_slice(&v.to_ne_bytes());
    }
    dop.buffer.buf_num_recs = 1000;
    dop.buffer.needs_save = true;
    dop.close(CloseAction::Free).unwrap();

    let mut back = DataObject::open(&path, OpenMode::Read).unwrap();
    assert_eq!(back.file_format, FileFormat::Ssff);
    assert_eq!(back.start_record, 250);
    assert_eq!(back.num_records, 1000);
    assert_eq!(back.data_rate, 200.0);
    assert!((back.start_time - 1.25).abs() < 1e-12);

    let mut rec = vec![0u8; 4];
    back.read_records(700, 1, &mut rec).unwrap();
    let val = f32::from_ne_bytes(rec[..4].try_into().unwrap());
    assert_eq!(val, 45.0);
}

#[test]
fn ssff_preserves_unknown_keys_and_ref_rate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meta.ssff");
    let mut dop = DataObject::new();
    dop.file_format = FileFormat::Ssff;
    dop.data_rate = 100.0;
    dop.samp_freq = 16000.0;
    dop.frame_dur = 160;
    dop.meta.push(sona_sdo::MetaVar {
        ident: String::from("Comment"),
        value: String::from("analysis output"),
    });
    dop.meta.push(sona_sdo::MetaVar {
        ident: String::from("Cherry"),
        value: String::from("pie"),
    });
    dop.meta.push(sona_sdo::MetaVar {
        ident: String::from("Original_Freq"),
        value: String::from("16000.0"),
    });
    let mut dd = DataDescriptor::new(DataType::Rms, DataFormat::Real32);
    dd.ident = Some(String::from("rms"));
    dd.num_fields = 1;
    dop.descriptors.push(dd);
    dop.set_record_size().unwrap();
    dop.create(&path).unwrap();
    dop.close(CloseAction::Free).unwrap();

    let back = DataObject::open(&path, OpenMode::Read).unwrap();
    assert_eq!(back.samp_freq, 16000.0);
    assert_eq!(back.frame_dur, 160);
    assert!(back.meta.iter().any(|m| m.ident == "Cherry" && m.value == "pie"));
    assert!(back.meta.iter().any(|m| m.ident == "Original_Freq"));
    assert_eq!(back.descriptors[0].dtype, DataType::Rms);
}

#[test]
fn xlabel_round_trip_keeps_order_quirk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marks.lab");
    let mut dop = DataObject::new();
    dop.file_format = FileFormat::Xlabel;
    sona_sdo::add_label(&mut dop.labels, Label::new("a", -1, 0.5), LabelPosition::AtTimeAsLast)
        .unwrap();
    sona_sdo::add_label(&mut dop.labels, Label::new("b", -1, 0.5), LabelPosition::AtTimeAsLast)
        .unwrap();
    sona_sdo::add_label(&mut dop.labels, Label::new("c", -1, 1.0), LabelPosition::AtTimeAsLast)
        .unwrap();
    dop.create(&path).unwrap();
    dop.close(CloseAction::Keep).unwrap();

    let back = DataObject::open(&path, OpenMode::Read).unwrap();
    assert_eq!(back.file_format, FileFormat::Xlabel);
    let names: Vec<&str> = back.labels.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["a", "b", "c"]);
    assert!((back.labels[0].time - 0.5).abs() < 1e-9);
    assert_eq!(back.num_records, 3);
}

#[test]
fn mix_round_trip_sample_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marks.mix");
    let mut dop = DataObject::new();
    dop.file_format = FileFormat::IpdsMix;
    dop.samp_freq = 16000.0;
    sona_sdo::add_label(&mut dop.labels, Label::new("V", 1599, 0.1), LabelPosition::AsLast)
        .unwrap();
    sona_sdo::add_label(&mut dop.labels, Label::new("C", 3199, 0.2), LabelPosition::AsLast)
        .unwrap();
    dop.create(&path).unwrap();
    dop.close(CloseAction::Keep).unwrap();

    let back = DataObject::open(&path, OpenMode::Read).unwrap();
    assert_eq!(back.file_format, FileFormat::IpdsMix);
    assert_eq!(back.labels.len(), 2);
    // sample count starts at 1 on disk, at 0 in memory
    assert_eq!(back.labels[0].smp_nr, 1599);
    assert_eq!(back.labels[0].name, "V");
    assert!((back.labels[1].time - 0.2).abs() < 1e-6);
}

#[test]
fn raw_fallback_with_default_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.pcm");
    let samples = sine_i16(100, 1000.0, 16000.0, 1000.0);
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    std::fs::write(&path, bytes).unwrap();

    let (dop, read) = read_audio(&path);
    assert_eq!(dop.file_format, FileFormat::Raw);
    assert_eq!(dop.samp_freq, 16000.0);
    assert_eq!(dop.num_records, 100);
    if cfg!(target_endian = "little") {
        assert_eq!(read, samples);
    }
}

#[test]
fn alaw_wave_decodes_through_g711() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alaw.wav");
    let mut dop = DataObject::new();
    dop.file_format = FileFormat::Wave;
    dop.samp_freq = 8000.0;
    dop.frame_dur = 1;
    let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::UInt8);
    dd.coding = DataCoding::Alaw;
    dd.num_fields = 1;
    dop.descriptors.push(dd);
    dop.set_record_size().unwrap();
    dop.create(&path).unwrap();
    dop.alloc_data_buffer(4).unwrap();
    let pcm: [i16; 4] = [1000, -1000, 8000, -8000];
    for (i, v) in pcm.iter().enumerate() {
        dop.record_bytes_mut(i as i64)[0] = sona_codec::i16_to_alaw(*v);
    }
    dop.buffer.buf_num_recs = 4;
    dop.buffer.needs_save = true;
    dop.close(CloseAction::Free).unwrap();

    let mut back = DataObject::open(&path, OpenMode::Read).unwrap();
    assert_eq!(back.descriptors[0].coding, DataCoding::Alaw);
    let mut frame = vec![0.0f64; 4];
    back.get_sample_frame(0, 4, 4, 0, 0, 1, &mut frame).unwrap();
    for (v, want) in frame.iter().zip(pcm.iter()) {
        assert!((v - *want as f64).abs() <= 256.0);
    }
}
