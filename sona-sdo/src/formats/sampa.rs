//! IPdS SAMPA label format driver.
//!
//! The first file line carries the signal file name; the header part up
//! to the `hend` line is preserved verbatim. Label lines are
//! `<sample> <name> [<time>]` rows with sample counting starting at 1.

use crate::dataobj::{
    DataCoding, DataDescriptor, DataFormat, DataObject, DataType, FileData,
};
use crate::error::{Result, SonaError};
use crate::fio::read_line_any;
use crate::label::{add_label, Label, LabelHeader, LabelPosition, LBL_TIME_UNDEF};
use std::io::{BufReader, Seek, SeekFrom, Write};

const SAM_EOH_ID: &str = "hend";
const SAM_SFR_ID: &str = "sample_rate";
const SAM_EOL: &str = "\x0A";

pub(crate) fn read_header(dop: &mut DataObject) -> Result<()> {
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("read_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    let mut reader = BufReader::new(fp);

    let mut head_copy = Vec::new();
    let mut samp_freq = 0.0f64;
    let mut labels: Vec<Label> = Vec::new();
    let mut in_header = true;
    while let Some(line) = read_line_any(&mut reader)? {
        if in_header {
            if line.trim_start().starts_with(SAM_SFR_ID) {
                let rest = line.trim_start()[SAM_SFR_ID.len()..].trim();
                if let Some(rate) = rest.split_whitespace().next() {
                    samp_freq = rate.parse().unwrap_or(0.0);
                }
            }
            let is_end = line.trim_end() == SAM_EOH_ID;
            head_copy.push(line);
            if is_end {
                in_header = false;
            }
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 || !fields[0].starts_with(|c: char| c.is_ascii_digit()) {
            continue; // not a label line
        }
        // sample count starts at 1
        let smp_nr = fields[0].parse::<i64>().unwrap_or(0) - 1;
        let name = fields[1];
        let time = if fields.len() > 2 {
            fields[2].parse().unwrap_or(LBL_TIME_UNDEF)
        } else {
            LBL_TIME_UNDEF
        };
        labels.push(Label::new(name, smp_nr, time));
    }

    let mut store = Vec::new();
    for label in labels {
        add_label(&mut store, label, LabelPosition::AsLast)?;
    }
    dop.file_data = FileData::Ascii;
    dop.samp_freq = samp_freq;
    dop.data_rate = samp_freq;
    dop.frame_dur = -1;
    dop.start_record = 0;
    dop.num_records = store.len() as i64;
    dop.time_zero = 0.0;
    dop.start_time = 0.0;
    dop.eol = SAM_EOL.to_string();
    dop.header_size = 0;
    let mut dd = DataDescriptor::new(DataType::Label, DataFormat::Str);
    dd.coding = DataCoding::Sampa;
    dop.descriptors.clear();
    dop.descriptors.push(dd);
    dop.record_size = 0;
    dop.generic = Some(Box::new(LabelHeader { head_copy }));
    dop.labels = store;
    dop.buffer.buf_num_recs = dop.num_records;
    Ok(())
}

pub(crate) fn write_header(dop: &mut DataObject) -> Result<()> {
    let mut text = String::new();
    let head_copy = dop
        .generic
        .as_ref()
        .and_then(|g| g.as_any().downcast_ref::<LabelHeader>())
        .map(|h| h.head_copy.clone());
    match head_copy {
        Some(lines) if !lines.is_empty() => {
            for line in lines {
                text.push_str(&line);
                text.push_str(SAM_EOL);
            }
        }
        _ => {
            // minimal header: signal name, empty sections, end mark
            let name = dop
                .file_path
                .as_ref()
                .and_then(|p| p.file_stem())
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            text.push_str(&name);
            text.push_str(SAM_EOL);
            text.push_str("oend");
            text.push_str(SAM_EOL);
            text.push_str("kend");
            text.push_str(SAM_EOL);
            if dop.samp_freq > 0.0 {
                text.push_str(&format!("sample_rate {:.1} Hz", dop.samp_freq));
                text.push_str(SAM_EOL);
            }
            text.push_str(SAM_EOH_ID);
            text.push_str(SAM_EOL);
        }
    }
    let header_size = text.len() as u64;
    for label in &dop.labels {
        let time = if label.has_time() {
            label.time
        } else if dop.samp_freq > 0.0 && label.has_smp_nr() {
            label.smp_nr as f64 / dop.samp_freq
        } else {
            0.0
        };
        text.push_str(&format!(
            "{:>9} {:<10} {:>12.7}",
            label.smp_nr + 1,
            label.name,
            time
        ));
        text.push_str(SAM_EOL);
    }
    dop.file_data = FileData::Ascii;
    dop.eol = SAM_EOL.to_string();
    dop.num_records = dop.labels.len() as i64;
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("write_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    fp.write_all(text.as_bytes())?;
    dop.header_size = header_size;
    Ok(())
}
