//! NIST SPHERE format driver: a fixed 1024-byte ASCII header of
//! `name -type value` lines, then binary data.

use crate::dataobj::{
    DataCoding, DataDescriptor, DataFormat, DataObject, DataType, FileData,
};
use crate::error::{Result, SonaError};
use sona_codec::Endian;
use std::io::{Read, Seek, SeekFrom, Write};

pub const NIST_HDR_SIZE: u64 = 1024;
const NIST_MAGIC: &[u8] = b"NIST_1A\x0A   1024\x0A";

pub(crate) fn read_header(dop: &mut DataObject) -> Result<()> {
    let path = dop.path_string();
    let bad = |detail: String| SonaError::BadHeader {
        path: path.clone(),
        detail,
    };
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("read_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    let mut header = vec![0u8; NIST_HDR_SIZE as usize];
    fp.read_exact(&mut header)?;
    if !header.starts_with(NIST_MAGIC) {
        return Err(bad(String::from("missing NIST_1A magic")));
    }

    let mut samp_rate = 0.0f64;
    let mut channels = 1usize;
    let mut sample_bytes = 2usize;
    let mut sample_count = 0i64;
    let mut coding = DataCoding::Linear;
    let mut endian = Endian::native();
    let mut sig_bits = 0u16;
    let text = String::from_utf8_lossy(&header[NIST_MAGIC.len()..]);
    for line in text.lines() {
        let line = line.trim_end_matches('\0').trim();
        if line.is_empty() {
            continue;
        }
        if line == "end_head" {
            break;
        }
        let mut parts = line.splitn(3, ' ');
        let (Some(key), Some(_typ), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        match key {
            "sample_rate" => samp_rate = value.parse().unwrap_or(0.0),
            "channel_count" => channels = value.parse().unwrap_or(1),
            "sample_n_bytes" => sample_bytes = value.parse().unwrap_or(2),
            "sample_count" => sample_count = value.parse().unwrap_or(0),
            "sample_sig_bits" => sig_bits = value.parse().unwrap_or(0),
            "sample_byte_format" => {
                endian = match value {
                    "10" => Endian::Big,
                    "01" => Endian::Little,
                    _ => Endian::native(), // single-byte data
                };
            }
            "sample_coding" => {
                coding = if value.starts_with("ulaw") || value.starts_with("mu-law") {
                    DataCoding::Ulaw
                } else if value.starts_with("pcm") {
                    DataCoding::Linear
                } else {
                    return Err(SonaError::NoHandle(format!(
                        "NIST sample coding '{value}' in {path}"
                    )));
                };
            }
            _ => log::debug!("ignoring NIST header item '{key}'"),
        }
    }
    if samp_rate <= 0.0 {
        return Err(bad(String::from("sample_rate missing")));
    }
    let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Undefined);
    dd.coding = coding;
    dd.num_fields = channels;
    dd.num_bits = sig_bits;
    dd.format = match (coding, sample_bytes) {
        (DataCoding::Ulaw, _) => DataFormat::UInt8,
        (_, 1) => DataFormat::Int8,
        (_, 2) => DataFormat::Int16,
        (_, 3) => DataFormat::Int24,
        (_, 4) => DataFormat::Int32,
        _ => return Err(bad(format!("unsupported sample size {sample_bytes}"))),
    };
    dop.file_data = FileData::Binary;
    dop.file_endian = endian;
    dop.samp_freq = samp_rate;
    dop.frame_dur = 1;
    dop.start_record = 0;
    dop.time_zero = 0.0;
    dop.header_size = NIST_HDR_SIZE;
    dop.num_records = sample_count;
    dop.descriptors.clear();
    dop.descriptors.push(dd);
    dop.set_record_size()?;
    crate::aucheck::check_au_bits(dop);
    if dop.num_records == 0 {
        let bytes = crate::formats::data_bytes_in_file(dop)?;
        dop.num_records = (bytes / dop.record_size.max(1) as u64) as i64;
    }
    dop.check_rates()?;
    dop.set_start_time();
    Ok(())
}

pub(crate) fn write_header(dop: &mut DataObject) -> Result<()> {
    if dop.descriptors.len() != 1 || dop.descriptors[0].dtype != DataType::Sample {
        return Err(SonaError::WrongDataType(String::from("(NIST writer)")));
    }
    dop.set_record_size()?;
    crate::aucheck::check_au_bits(dop);
    let dd = &dop.descriptors[0];
    let coding = match dd.coding {
        DataCoding::Linear | DataCoding::BinaryOffset => "pcm",
        DataCoding::Ulaw => "ulaw",
        other => {
            return Err(SonaError::NoHandle(format!("{other:?} in NIST output")));
        }
    };
    let sample_bytes = dd.format.size();
    let byte_format = match (sample_bytes, dop.file_endian) {
        (1, _) => "1",
        (_, Endian::Big) => "10",
        _ => "01",
    };
    if dop.file_endian == Endian::Undefined {
        dop.file_endian = Endian::native();
    }
    let mut text = String::new();
    text.push_str(std::str::from_utf8(NIST_MAGIC).unwrap());
    text.push_str(&format!("sample_rate -i {}\n", dop.samp_freq as i64));
    text.push_str(&format!("channel_count -i {}\n", dd.num_fields));
    text.push_str(&format!("sample_n_bytes -i {sample_bytes}\n"));
    text.push_str(&format!("sample_count -i {}\n", dop.num_records.max(0)));
    text.push_str(&format!("sample_sig_bits -i {}\n", dd.num_bits));
    text.push_str(&format!(
        "sample_byte_format -s{} {byte_format}\n",
        byte_format.len()
    ));
    text.push_str(&format!("sample_coding -s{} {coding}\n", coding.len()));
    text.push_str("end_head\n");
    let mut header = text.into_bytes();
    if header.len() > NIST_HDR_SIZE as usize {
        return Err(SonaError::Bug(String::from("NIST header overflow")));
    }
    header.resize(NIST_HDR_SIZE as usize, 0);

    dop.file_data = FileData::Binary;
    dop.frame_dur = 1;
    dop.check_rates()?;
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("write_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    fp.write_all(&header)?;
    dop.header_size = NIST_HDR_SIZE;
    Ok(())
}
