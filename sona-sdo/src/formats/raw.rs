//! Headerless files: no header to parse, sensible defaults assumed.

use crate::dataobj::{DataCoding, DataDescriptor, DataFormat, DataObject, DataType, FileData};
use crate::error::Result;
use crate::formats::data_bytes_in_file;
use sona_codec::Endian;

/// Default settings for unrecognized audio: 16-bit signed little-endian
/// mono at 16 kHz. The caller may adjust rate and layout after opening
/// and re-derive the record count with [`recount_records`].
pub const RAW_DEF_SFR: f64 = 16000.0;

pub(crate) fn read_header(dop: &mut DataObject) -> Result<()> {
    dop.header_size = 0;
    dop.file_endian = Endian::Little;
    dop.samp_freq = RAW_DEF_SFR;
    dop.frame_dur = 1;
    dop.start_record = 0;
    dop.time_zero = 0.0;
    dop.descriptors.clear();
    let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Int16);
    dd.coding = DataCoding::Linear;
    dd.num_bits = 16;
    dd.num_fields = 1;
    dop.descriptors.push(dd);
    dop.set_record_size()?;
    dop.check_rates()?;
    recount_records(dop)?;
    dop.set_start_time();
    Ok(())
}

/// Re-derives the record count from the file size, e.g. after the
/// caller changed the assumed layout of a headerless file.
pub fn recount_records(dop: &mut DataObject) -> Result<i64> {
    let bytes = data_bytes_in_file(dop)?;
    dop.num_records = if dop.record_size > 0 {
        (bytes / dop.record_size as u64) as i64
    } else {
        0
    };
    Ok(dop.num_records)
}

pub(crate) fn write_header(dop: &mut DataObject) -> Result<()> {
    // nothing to emit; data starts at offset 0
    dop.header_size = 0;
    if dop.file_data == FileData::Undefined {
        dop.file_data = FileData::Binary;
    }
    Ok(())
}
