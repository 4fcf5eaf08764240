//! Sun/NeXT audio format driver ('.snd'). Header and data have MSB
//! first; the data offset is at least 24 bytes.

use crate::dataobj::{
    DataCoding, DataDescriptor, DataFormat, DataObject, DataType, FileData,
};
use crate::error::{Result, SonaError};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;
use sona_codec::Endian;
use std::io::{Seek, SeekFrom, Write};

pub const SND_MIN_HDR: u64 = 24;
pub const SND_STD_HDR: u64 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum SndDataFormat {
    Unspecified = 0,
    Mulaw8 = 1,
    Linear8 = 2,
    Linear16 = 3,
    Linear24 = 4,
    Linear32 = 5,
    Float = 6,
    Double = 7,
    G721 = 23,
    G722 = 24,
    G723_3 = 25,
    G723_5 = 26,
    Alaw8 = 27,
}

pub(crate) fn read_header(dop: &mut DataObject) -> Result<()> {
    let path = dop.path_string();
    let bad = |detail: &str| SonaError::BadHeader {
        path: path.clone(),
        detail: detail.to_string(),
    };
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("read_header"))?;
    fp.seek(SeekFrom::Start(4))?; // behind the magic
    let data_offset = fp.read_i32::<BigEndian>()?;
    let data_length = fp.read_i32::<BigEndian>()?;
    let data_format = fp.read_i32::<BigEndian>()?;
    let samp_rate = fp.read_i32::<BigEndian>()?;
    let num_tracks = fp.read_i32::<BigEndian>()?;
    if data_offset < SND_MIN_HDR as i32 || samp_rate <= 0 || num_tracks < 1 {
        return Err(bad("degenerate header"));
    }
    let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Undefined);
    dd.num_fields = num_tracks as usize;
    match SndDataFormat::from_i32(data_format) {
        Some(SndDataFormat::Mulaw8) => {
            dd.coding = DataCoding::Ulaw;
            dd.format = DataFormat::UInt8;
        }
        Some(SndDataFormat::Alaw8) => {
            dd.coding = DataCoding::Alaw;
            dd.format = DataFormat::UInt8;
        }
        Some(SndDataFormat::Linear8) => {
            dd.coding = DataCoding::Linear;
            dd.format = DataFormat::Int8;
        }
        Some(SndDataFormat::Linear16) => {
            dd.coding = DataCoding::Linear;
            dd.format = DataFormat::Int16;
        }
        Some(SndDataFormat::Linear24) => {
            dd.coding = DataCoding::Linear;
            dd.format = DataFormat::Int24;
        }
        Some(SndDataFormat::Linear32) => {
            dd.coding = DataCoding::Linear;
            dd.format = DataFormat::Int32;
        }
        Some(SndDataFormat::Float) => {
            dd.coding = DataCoding::Linear;
            dd.format = DataFormat::Real32;
        }
        Some(SndDataFormat::Double) => {
            dd.coding = DataCoding::Linear;
            dd.format = DataFormat::Real64;
        }
        _ => {
            return Err(SonaError::NoHandle(format!(
                "SND data format {data_format} in {path}"
            )))
        }
    }
    dop.file_data = FileData::Binary;
    dop.file_endian = Endian::Big;
    dop.samp_freq = samp_rate as f64;
    dop.frame_dur = 1;
    dop.start_record = 0;
    dop.time_zero = 0.0;
    dop.header_size = data_offset as u64;
    dop.descriptors.clear();
    dop.descriptors.push(dd);
    dop.set_record_size()?;
    crate::aucheck::check_au_bits(dop);
    let bytes = if data_length > 0 {
        data_length as u64
    } else {
        crate::formats::data_bytes_in_file(dop)?
    };
    dop.num_records = (bytes / dop.record_size.max(1) as u64) as i64;
    dop.check_rates()?;
    dop.set_start_time();
    Ok(())
}

fn data_format_for(dd: &DataDescriptor) -> Result<SndDataFormat> {
    Ok(match (dd.coding, dd.format) {
        (DataCoding::Ulaw, _) => SndDataFormat::Mulaw8,
        (DataCoding::Alaw, _) => SndDataFormat::Alaw8,
        (DataCoding::Linear, DataFormat::Int8) => SndDataFormat::Linear8,
        (DataCoding::Linear, DataFormat::Int16) => SndDataFormat::Linear16,
        (DataCoding::Linear, DataFormat::Int24) => SndDataFormat::Linear24,
        (DataCoding::Linear, DataFormat::Int32) => SndDataFormat::Linear32,
        (DataCoding::Linear, DataFormat::Real32) => SndDataFormat::Float,
        (DataCoding::Linear, DataFormat::Real64) => SndDataFormat::Double,
        _ => {
            return Err(SonaError::NoHandle(format!(
                "{:?}/{:?} in SND output",
                dd.coding, dd.format
            )))
        }
    })
}

pub(crate) fn write_header(dop: &mut DataObject) -> Result<()> {
    if dop.descriptors.len() != 1 || dop.descriptors[0].dtype != DataType::Sample {
        return Err(SonaError::WrongDataType(String::from("(SND writer)")));
    }
    dop.set_record_size()?;
    crate::aucheck::check_au_bits(dop);
    let format = data_format_for(&dop.descriptors[0])?;
    dop.file_data = FileData::Binary;
    dop.file_endian = Endian::Big;
    dop.frame_dur = 1;
    dop.check_rates()?;
    let data_length = (dop.num_records.max(0) as u64 * dop.record_size as u64) as i32;
    let samp_rate = dop.samp_freq as i32;
    let num_tracks = dop.descriptors[0].num_fields as i32;

    let fp = dop.file_handle().ok_or(SonaError::BadArgs("write_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    fp.write_all(b".snd")?;
    fp.write_i32::<BigEndian>(SND_STD_HDR as i32)?;
    fp.write_i32::<BigEndian>(data_length)?;
    fp.write_i32::<BigEndian>(format as i32)?;
    fp.write_i32::<BigEndian>(samp_rate)?;
    fp.write_i32::<BigEndian>(num_tracks)?;
    fp.write_all(&[0u8; 4])?; // empty info string
    dop.header_size = SND_STD_HDR;
    Ok(())
}
