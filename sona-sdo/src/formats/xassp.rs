//! XASSP ASCII format driver: a one-line header, then one record per
//! line with a leading time column.

use crate::dataobj::{
    AscFormat, DataCoding, DataDescriptor, DataFormat, DataObject, DataType, FileData,
};
use crate::error::{Result, SonaError};
use crate::fio::read_line_any;
use crate::keywords::{dtype_to_entry, keyword_to_entry, KDT_XASSP};
use sona_codec::Endian;
use std::io::{BufReader, Seek, SeekFrom, Write};

pub const XASSP_MAGIC: &str = "XASSP";
pub const XASSP_SEP: &str = "\t";

pub(crate) fn read_header(dop: &mut DataObject) -> Result<()> {
    let path = dop.path_string();
    let bad = |detail: String| SonaError::BadHeader {
        path: path.clone(),
        detail,
    };
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("read_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    let mut reader = BufReader::new(fp);
    let first = read_line_any(&mut reader)?
        .ok_or_else(|| bad(String::from("empty file")))?;
    let fields: Vec<&str> = first.split_whitespace().collect();
    if fields.is_empty() || fields[0] != XASSP_MAGIC {
        return Err(bad(String::from("bad magic line")));
    }
    let (dtype, keyword) = match fields.get(1) {
        Some(&name) => match keyword_to_entry(name, KDT_XASSP) {
            Some(entry) => (entry.dtype, entry.keyword.to_string()),
            None => (DataType::Undefined, name.to_string()),
        },
        None => return Err(bad(String::from("data type missing"))),
    };
    // either "XASSP type dataRate" or "XASSP type sampFreq frameDur"
    let (samp_freq, data_rate, frame_dur): (f64, f64, i64) =
        match (fields.get(2), fields.get(3)) {
            (Some(rate), None) => {
                let rate: f64 = rate
                    .parse()
                    .map_err(|_| bad(format!("bad data rate '{rate}'")))?;
                (rate, rate, 1)
            }
            (Some(sfr), Some(dur)) => {
                let sfr: f64 = sfr
                    .parse()
                    .map_err(|_| bad(format!("bad sample rate '{sfr}'")))?;
                let dur: i64 = dur
                    .parse()
                    .map_err(|_| bad(format!("bad frame duration '{dur}'")))?;
                (sfr, sfr / dur as f64, dur)
            }
            _ => return Err(bad(String::from("rate missing"))),
        };

    // load the numeric rows; the first column is the record time
    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut first_time: Option<f64> = None;
    while let Some(line) = read_line_any(&mut reader)? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut vals = Vec::new();
        for field in line.split_whitespace() {
            vals.push(
                field
                    .parse::<f64>()
                    .map_err(|_| bad(format!("bad value '{field}'")))?,
            );
        }
        if vals.len() < 2 {
            return Err(bad(String::from("row without data column")));
        }
        if first_time.is_none() {
            first_time = Some(vals[0]);
        }
        rows.push(vals[1..].to_vec());
    }
    let num_fields = rows.first().map(|r| r.len()).unwrap_or(1);

    let mut dd = DataDescriptor::new(dtype, DataFormat::Real64);
    dd.ident = Some(keyword);
    dd.coding = DataCoding::Linear;
    dd.num_fields = num_fields;
    dd.sep_chars = String::from(" ");
    dop.file_data = FileData::Ascii;
    dop.file_endian = Endian::native();
    dop.sep_chars = XASSP_SEP.to_string();
    dop.samp_freq = samp_freq;
    dop.data_rate = data_rate;
    dop.frame_dur = frame_dur;
    dop.time_zero = 0.0;
    dop.start_time = first_time.unwrap_or(0.0);
    dop.start_record = (dop.start_time * dop.data_rate + 0.5).floor() as i64;
    dop.num_records = rows.len() as i64;
    dop.header_size = 0; // text data cannot be seeked by record
    dop.descriptors.clear();
    dop.descriptors.push(dd);
    dop.set_record_size()?;
    dop.set_start_time();

    // text data is loaded completely at open
    if !rows.is_empty() {
        dop.alloc_data_buffer(rows.len() as i64)?;
        for (i, row) in rows.iter().enumerate() {
            let rec = dop.record_bytes_mut(i as i64);
            for (f, v) in row.iter().enumerate() {
                rec[f * 8..f * 8 + 8].copy_from_slice(&v.to_ne_bytes());
            }
        }
        dop.buffer.buf_start_rec = dop.start_record;
        dop.buffer.buf_num_recs = rows.len() as i64;
    }
    Ok(())
}

pub(crate) fn write_header(dop: &mut DataObject) -> Result<()> {
    if dop.descriptors.is_empty() {
        return Err(SonaError::NoData(String::from("(XASSP writer)")));
    }
    if dop.data_rate <= 0.0 {
        if dop.frame_dur > 0 && dop.samp_freq > 0.0 {
            dop.data_rate = dop.samp_freq / dop.frame_dur as f64;
        } else {
            return Err(SonaError::WrongDataRate(String::from("(XASSP writer)")));
        }
    }
    let keyword = match dop.descriptors[0].ident.as_deref() {
        Some(name) => name.to_string(),
        None => dtype_to_entry(dop.descriptors[0].dtype, KDT_XASSP)
            .ok_or(SonaError::NoTrackName("(XASSP writer)"))?
            .keyword
            .to_string(),
    };
    for dd in dop.descriptors.iter_mut() {
        if dd.asc_format == AscFormat::Undefined {
            dd.asc_format = AscFormat::Fixed { precision: 4 };
        }
        if dd.sep_chars.is_empty() {
            dd.sep_chars = String::from(" ");
        }
    }
    dop.file_data = FileData::Ascii;
    dop.sep_chars = XASSP_SEP.to_string();
    if dop.eol.is_empty() {
        dop.eol = String::from("\n");
    }
    let line = if dop.frame_dur > 1 {
        format!(
            "{XASSP_MAGIC} {keyword} {} {}{}",
            dop.samp_freq, dop.frame_dur, dop.eol
        )
    } else {
        format!("{XASSP_MAGIC} {keyword} {}{}", dop.data_rate, dop.eol)
    };
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("write_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    fp.write_all(line.as_bytes())?;
    dop.header_size = line.len() as u64;
    Ok(())
}
