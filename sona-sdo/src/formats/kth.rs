//! KTH/snack format driver: an ASCII `key=value` header terminated by
//! ^D^Z, padded to 1024 bytes, then binary 16-bit data.

use crate::dataobj::{
    DataCoding, DataDescriptor, DataFormat, DataObject, DataType, FileData,
};
use crate::error::{Result, SonaError};
use sona_codec::Endian;
use std::io::{Read, Seek, SeekFrom, Write};

pub const KTH_DEF_HDR: u64 = 1024;
pub const KTH_DEF_SFR: f64 = 16000.0;
const KTH_EOH: &[u8] = b"\x04\x1A";
const KTH_EOL: &str = "\x0D\x0A";

pub(crate) fn read_header(dop: &mut DataObject) -> Result<()> {
    let path = dop.path_string();
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("read_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    let mut header = vec![0u8; KTH_DEF_HDR as usize];
    let got = fp.read(&mut header)?;
    header.truncate(got);
    let eoh = match header.windows(2).position(|w| w == KTH_EOH) {
        Some(p) => p,
        None => {
            return Err(SonaError::BadHeader {
                path,
                detail: String::from("end-of-header mark (^D^Z) not found"),
            })
        }
    };

    let mut samp_freq = KTH_DEF_SFR;
    let mut channels = 1usize;
    let mut endian = Endian::native();
    let text = String::from_utf8_lossy(&header[..eoh]).into_owned();
    for line in text.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key.trim() {
            "head" | "header" | "file" => {} // identification items
            "sf" | "sample_rate" => samp_freq = value.trim().parse().unwrap_or(KTH_DEF_SFR),
            "nchans" | "channels" => channels = value.trim().parse().unwrap_or(1),
            "msb" => {
                endian = if value.trim().eq_ignore_ascii_case("first") {
                    Endian::Big
                } else {
                    Endian::Little
                };
            }
            other => log::debug!("ignoring KTH header item '{other}'"),
        }
    }

    let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Int16);
    dd.coding = DataCoding::Linear;
    dd.num_fields = channels.max(1);
    dd.num_bits = 16;
    dop.file_data = FileData::Binary;
    dop.file_endian = endian;
    dop.samp_freq = samp_freq;
    dop.frame_dur = 1;
    dop.start_record = 0;
    dop.time_zero = 0.0;
    dop.header_size = KTH_DEF_HDR.min(got as u64);
    dop.descriptors.clear();
    dop.descriptors.push(dd);
    dop.set_record_size()?;
    let bytes = crate::formats::data_bytes_in_file(dop)?;
    dop.num_records = (bytes / dop.record_size.max(1) as u64) as i64;
    dop.check_rates()?;
    dop.set_start_time();
    Ok(())
}

pub(crate) fn write_header(dop: &mut DataObject) -> Result<()> {
    if dop.descriptors.len() != 1 || dop.descriptors[0].dtype != DataType::Sample {
        return Err(SonaError::WrongDataType(String::from("(KTH writer)")));
    }
    let dd = &dop.descriptors[0];
    if dd.format != DataFormat::Int16 {
        return Err(SonaError::NoHandle(String::from("KTH output is 16-bit PCM")));
    }
    dop.set_record_size()?;
    dop.file_data = FileData::Binary;
    if dop.file_endian == Endian::Undefined {
        dop.file_endian = Endian::native();
    }
    dop.frame_dur = 1;
    dop.check_rates()?;

    let mut text = String::new();
    text.push_str("head=DAT");
    text.push_str(KTH_EOL);
    text.push_str("file=samp");
    text.push_str(KTH_EOL);
    text.push_str(&format!("sf={}", dop.samp_freq as i64));
    text.push_str(KTH_EOL);
    text.push_str(&format!(
        "msb={}",
        if dop.file_endian == Endian::Big {
            "first"
        } else {
            "last"
        }
    ));
    text.push_str(KTH_EOL);
    text.push_str(&format!("nchans={}", dop.descriptors[0].num_fields));
    text.push_str(KTH_EOL);
    let mut header = text.into_bytes();
    header.extend_from_slice(KTH_EOH);
    if header.len() > KTH_DEF_HDR as usize {
        return Err(SonaError::Bug(String::from("KTH header overflow")));
    }
    header.resize(KTH_DEF_HDR as usize, 0);

    let fp = dop.file_handle().ok_or(SonaError::BadArgs("write_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    fp.write_all(&header)?;
    dop.header_size = KTH_DEF_HDR;
    Ok(())
}
