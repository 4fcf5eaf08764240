//! ESPS xlabel format driver: a header of `key value` lines closed by a
//! `#` line, then `<time> <color> <name>` rows. Label lines need not be
//! in chronological order.

use crate::dataobj::{
    DataCoding, DataDescriptor, DataFormat, DataObject, DataType, FileData,
};
use crate::error::{Result, SonaError};
use crate::fio::read_line_any;
use crate::label::{add_label, Label, LabelPosition, XlabelHeader, LBL_SMP_UNDEF};
use std::io::{BufReader, Seek, SeekFrom, Write};

const XLBL_EOH: &str = "#";
const XLBL_EOL: &str = "\x0A";

pub(crate) fn read_header(dop: &mut DataObject) -> Result<()> {
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("read_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    let mut reader = BufReader::new(fp);

    let mut gd = XlabelHeader::default();
    let mut color = -1i32;
    let mut store: Vec<Label> = Vec::new();
    let mut in_header = true;
    while let Some(line) = read_line_any(&mut reader)? {
        let trimmed = line.trim();
        if in_header {
            if trimmed == XLBL_EOH {
                in_header = false;
                continue;
            }
            let mut parts = trimmed.splitn(2, char::is_whitespace);
            let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };
            let value = value.trim();
            match key {
                "signal" => gd.signal = Some(value.to_string()),
                "font" => gd.font = Some(value.to_string()),
                "color" => gd.color = value.parse().unwrap_or(gd.color),
                "separator" => gd.separator = Some(value.to_string()),
                "nfields" => gd.tiers = value.parse().unwrap_or(1),
                "type" | "comment" => {}
                other => log::debug!("ignoring xlabel header item '{other}'"),
            }
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < 3
            || !fields[0].starts_with(|c: char| c.is_ascii_digit() || c == '.')
        {
            continue; // not a label line
        }
        let Ok(time) = fields[0].parse::<f64>() else {
            continue;
        };
        color = fields[1].parse().unwrap_or(color);
        let name = fields[2..].join(" ");
        add_label(
            &mut store,
            Label::new(name, LBL_SMP_UNDEF, time),
            LabelPosition::AtTimeAsLast,
        )?;
    }
    if color >= 0 {
        gd.color = color;
    }

    dop.file_data = FileData::Ascii;
    dop.frame_dur = -1;
    dop.start_record = 0;
    dop.num_records = store.len() as i64;
    dop.time_zero = 0.0;
    dop.start_time = 0.0;
    dop.eol = XLBL_EOL.to_string();
    dop.header_size = 0;
    let mut dd = DataDescriptor::new(DataType::Label, DataFormat::Str);
    dd.coding = DataCoding::Xlbl;
    dop.descriptors.clear();
    dop.descriptors.push(dd);
    dop.record_size = 0;
    dop.generic = Some(Box::new(gd));
    dop.labels = store;
    dop.buffer.buf_num_recs = dop.num_records;
    Ok(())
}

pub(crate) fn write_header(dop: &mut DataObject) -> Result<()> {
    let default_gd = XlabelHeader::default();
    let gd_ref = dop
        .generic
        .as_ref()
        .and_then(|g| g.as_any().downcast_ref::<XlabelHeader>())
        .unwrap_or(&default_gd);
    let mut text = String::new();
    if let Some(signal) = &gd_ref.signal {
        text.push_str(&format!("signal {signal}"));
        text.push_str(XLBL_EOL);
    }
    text.push_str("type 0");
    text.push_str(XLBL_EOL);
    text.push_str(&format!("color {}", gd_ref.color));
    text.push_str(XLBL_EOL);
    if let Some(font) = &gd_ref.font {
        text.push_str(&format!("font {font}"));
        text.push_str(XLBL_EOL);
    }
    if let Some(sep) = &gd_ref.separator {
        text.push_str(&format!("separator {sep}"));
        text.push_str(XLBL_EOL);
    }
    text.push_str(&format!("nfields {}", gd_ref.tiers));
    text.push_str(XLBL_EOL);
    text.push_str(XLBL_EOH);
    text.push_str(XLBL_EOL);
    let color = gd_ref.color;

    let header_size = text.len() as u64;
    for label in &dop.labels {
        let time = if label.has_time() {
            label.time
        } else if dop.samp_freq > 0.0 && label.has_smp_nr() {
            label.smp_nr as f64 / dop.samp_freq
        } else {
            0.0
        };
        text.push_str(&format!("{time:.9}  {color}  {}", label.name));
        text.push_str(XLBL_EOL);
    }
    dop.file_data = FileData::Ascii;
    dop.eol = XLBL_EOL.to_string();
    dop.num_records = dop.labels.len() as i64;
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("write_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    fp.write_all(text.as_bytes())?;
    dop.header_size = header_size;
    Ok(())
}
