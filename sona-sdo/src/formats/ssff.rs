//! Simple Signal File Format driver: an ASCII key-value header closed
//! by a marker line, then fixed-size binary records.
//!
//! Unknown header keys are preserved round-trip through the object's
//! meta list. The reference sample rate may appear as `Original_Freq`
//! or as the ESPS-derived `src_sf`; the first occurrence defines the
//! value and both survive a rewrite.

use crate::dataobj::{
    DataCoding, DataDescriptor, DataFormat, DataObject, DataType, FileData, MetaVar,
};
use crate::error::{Result, SonaError};
use crate::keywords::{keyword_to_entry, KDT_SSFF};
use sona_codec::Endian;
use std::io::{Read, Seek, SeekFrom, Write};

pub const SSFF_MAGIC: &str = "SSFF -- (c) SHLRC";
pub const SSFF_EOH: &str = "-----------------";
const SSFF_EOL: &str = "\n";
/// Largest header this driver accepts.
const MAX_HEADER: usize = 65536;

fn ssff_type_for(format: DataFormat) -> Option<&'static str> {
    Some(match format {
        DataFormat::Char => "CHAR",
        DataFormat::UInt8 | DataFormat::Int8 => "BYTE",
        DataFormat::Int16 => "SHORT",
        DataFormat::Int32 => "LONG",
        DataFormat::Real32 => "FLOAT",
        DataFormat::Real64 => "DOUBLE",
        _ => return None,
    })
}

fn format_for_ssff_type(name: &str) -> Option<DataFormat> {
    Some(match name {
        "CHAR" => DataFormat::Char,
        "BYTE" => DataFormat::UInt8,
        "SHORT" => DataFormat::Int16,
        "LONG" => DataFormat::Int32,
        "FLOAT" => DataFormat::Real32,
        "DOUBLE" => DataFormat::Real64,
        _ => return None,
    })
}

pub(crate) fn read_header(dop: &mut DataObject) -> Result<()> {
    let path = dop.path_string();
    let bad = |detail: String| SonaError::BadHeader {
        path: path.clone(),
        detail,
    };
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("read_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    let mut head = vec![0u8; MAX_HEADER];
    let got = fp.read(&mut head)?;
    head.truncate(got);

    let marker = format!("{SSFF_EOH}{SSFF_EOL}");
    let mut header_end = None;
    let mut line_start = 0usize;
    while line_start < head.len() {
        if head[line_start..].starts_with(marker.as_bytes()) {
            header_end = Some(line_start + marker.len());
            break;
        }
        match head[line_start..].iter().position(|&b| b == b'\n') {
            Some(p) => line_start += p + 1,
            None => break,
        }
    }
    let header_end = header_end.ok_or_else(|| bad(String::from("data marker not found")))?;
    let text = String::from_utf8_lossy(&head[..header_end]).into_owned();

    let mut endian = Endian::Undefined;
    let mut record_freq = 0.0f64;
    let mut start_time = 0.0f64;
    let mut ref_rate: Option<f64> = None;
    let mut descriptors = Vec::new();
    let mut meta = Vec::new();
    for (nr, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if nr == 0 {
            if line != SSFF_MAGIC {
                return Err(bad(String::from("bad magic line")));
            }
            continue;
        }
        if line == SSFF_EOH {
            break;
        }
        let mut parts = line.splitn(2, char::is_whitespace);
        let Some(key) = parts.next() else { continue };
        let value = parts.next().unwrap_or("").trim();
        match key {
            "Machine" => {
                endian = match value {
                    "SPARC" => Endian::Big,
                    "IBM-PC" | "VAX" => Endian::Little,
                    other => {
                        log::warn!("unknown SSFF machine '{other}' in {path}");
                        Endian::native()
                    }
                };
            }
            "Record_Freq" => {
                record_freq = value
                    .parse()
                    .map_err(|_| bad(format!("bad Record_Freq '{value}'")))?;
            }
            "Start_Time" => {
                start_time = value
                    .parse()
                    .map_err(|_| bad(format!("bad Start_Time '{value}'")))?;
            }
            "Original_Freq" | "src_sf" => {
                if ref_rate.is_none() {
                    ref_rate = value.parse().ok();
                }
                meta.push(MetaVar {
                    ident: key.to_string(),
                    value: value.to_string(),
                });
            }
            "Column" => {
                let fields: Vec<&str> = value.split_whitespace().collect();
                if fields.len() != 3 {
                    return Err(bad(format!("bad Column line '{line}'")));
                }
                let format = format_for_ssff_type(fields[1])
                    .ok_or_else(|| bad(format!("unknown column type '{}'", fields[1])))?;
                let mut dd = DataDescriptor::new(DataType::Undefined, format);
                dd.ident = Some(fields[0].to_string());
                dd.coding = DataCoding::Linear;
                dd.num_fields = fields[2]
                    .parse()
                    .map_err(|_| bad(format!("bad column dimension '{}'", fields[2])))?;
                if let Some(entry) = keyword_to_entry(fields[0], KDT_SSFF) {
                    dd.dtype = entry.dtype;
                    dd.unit = entry.unit.to_string();
                    dd.factor = entry.factor.to_string();
                }
                descriptors.push(dd);
            }
            _ => {
                meta.push(MetaVar {
                    ident: key.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }
    if record_freq <= 0.0 {
        return Err(bad(String::from("Record_Freq missing")));
    }
    if descriptors.is_empty() {
        return Err(bad(String::from("no Column definitions")));
    }

    dop.file_data = FileData::Binary;
    dop.file_endian = if endian == Endian::Undefined {
        Endian::native()
    } else {
        endian
    };
    dop.eol = SSFF_EOL.to_string();
    dop.data_rate = record_freq;
    dop.samp_freq = ref_rate.unwrap_or(record_freq);
    let ratio = dop.samp_freq / record_freq;
    dop.frame_dur = if (ratio - ratio.round()).abs() < 1.0e-9 && ratio >= 1.0 {
        ratio.round() as i64
    } else {
        -1
    };
    dop.time_zero = 0.0;
    dop.start_time = start_time;
    dop.start_record = (start_time * record_freq + 0.5).floor() as i64;
    dop.header_size = header_end as u64;
    dop.descriptors = descriptors;
    dop.meta = meta;
    dop.set_record_size()?;
    crate::aucheck::check_au_bits(dop);
    let bytes = crate::formats::data_bytes_in_file(dop)?;
    dop.num_records = (bytes / dop.record_size.max(1) as u64) as i64;
    Ok(())
}

pub(crate) fn write_header(dop: &mut DataObject) -> Result<()> {
    if dop.descriptors.is_empty() {
        return Err(SonaError::NoData(String::from("(SSFF writer)")));
    }
    dop.set_record_size()?;
    if dop.file_endian == Endian::Undefined {
        dop.file_endian = Endian::native();
    }
    if dop.data_rate <= 0.0 {
        if dop.frame_dur > 0 && dop.samp_freq > 0.0 {
            dop.data_rate = dop.samp_freq / dop.frame_dur as f64;
        } else {
            return Err(SonaError::WrongDataRate(String::from("(SSFF writer)")));
        }
    }
    dop.set_start_time();
    dop.file_data = FileData::Binary;
    dop.eol = SSFF_EOL.to_string();

    let mut text = String::new();
    text.push_str(SSFF_MAGIC);
    text.push_str(SSFF_EOL);
    text.push_str(&format!(
        "Machine {}",
        if dop.file_endian == Endian::Big {
            "SPARC"
        } else {
            "IBM-PC"
        }
    ));
    text.push_str(SSFF_EOL);
    text.push_str(&format!("Record_Freq {}", fmt_rate(dop.data_rate)));
    text.push_str(SSFF_EOL);
    text.push_str(&format!("Start_Time {}", dop.start_time));
    text.push_str(SSFF_EOL);
    let has_ref = dop
        .meta
        .iter()
        .any(|m| m.ident == "Original_Freq" || m.ident == "src_sf");
    if !has_ref && dop.samp_freq > 0.0 && dop.samp_freq != dop.data_rate {
        text.push_str(&format!("Original_Freq {}", fmt_rate(dop.samp_freq)));
        text.push_str(SSFF_EOL);
    }
    for meta in &dop.meta {
        text.push_str(&format!("{} {}", meta.ident, meta.value));
        text.push_str(SSFF_EOL);
    }
    for dd in &dop.descriptors {
        let ident = dd.ident.as_deref().ok_or(SonaError::NoTrackName("(SSFF writer)"))?;
        let type_name = ssff_type_for(dd.format).ok_or_else(|| {
            SonaError::NoHandle(format!("{:?} in SSFF output", dd.format))
        })?;
        text.push_str(&format!("Column {ident} {type_name} {}", dd.num_fields));
        text.push_str(SSFF_EOL);
    }
    text.push_str(SSFF_EOH);
    text.push_str(SSFF_EOL);

    let bytes = text.into_bytes();
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("write_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    fp.write_all(&bytes)?;
    dop.header_size = bytes.len() as u64;
    Ok(())
}

fn fmt_rate(rate: f64) -> String {
    if rate == rate.floor() {
        format!("{rate:.1}")
    } else {
        format!("{rate}")
    }
}
