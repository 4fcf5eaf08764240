//! AIFF and AIFF-C format driver. Header and data have MSB first.

use crate::dataobj::{
    DataCoding, DataDescriptor, DataFormat, DataObject, DataType, FileData, FileFormat,
};
use crate::error::{Result, SonaError};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use sona_codec::{read_ieee_extended, write_ieee_extended, Endian, XFP_SIZE};
use std::io::{Read, Seek, SeekFrom, Write};

/// Version number/timestamp carried by the mandatory FVER chunk.
pub const AIFC_VERSION: u32 = 0xA280_5140;

pub(crate) fn read_header(dop: &mut DataObject) -> Result<()> {
    let path = dop.path_string();
    let is_aifc = dop.file_format == FileFormat::Aifc;
    let bad = |detail: &str| SonaError::BadHeader {
        path: path.clone(),
        detail: detail.to_string(),
    };
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("read_header"))?;
    fp.seek(SeekFrom::Start(12))?; // behind FORM size and form type

    let mut num_tracks = 0i16;
    let mut num_samples = 0u32;
    let mut num_bits = 0i16;
    let mut samp_rate = 0.0f64;
    let mut compression = *b"NONE";
    let mut got_comm = false;
    let mut got_fver = !is_aifc;
    let mut data_offset = 0u64;

    loop {
        let mut ck_id = [0u8; 4];
        match fp.read_exact(&mut ck_id) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let ck_size = fp.read_i32::<BigEndian>()?;
        if ck_size < 0 {
            return Err(bad("negative chunk size"));
        }
        // chunks are always aligned at an even address
        let skip = ck_size as u64 + (ck_size as u64 & 1);
        match &ck_id {
            b"FVER" => {
                let version = fp.read_u32::<BigEndian>()?;
                if version != AIFC_VERSION {
                    log::warn!("unexpected AIFC version {version:#010x} in {path}");
                }
                got_fver = true;
                if skip > 4 {
                    fp.seek(SeekFrom::Current(skip as i64 - 4))?;
                }
            }
            b"COMM" => {
                num_tracks = fp.read_i16::<BigEndian>()?;
                num_samples = fp.read_u32::<BigEndian>()?;
                num_bits = fp.read_i16::<BigEndian>()?;
                let mut xfp = [0u8; XFP_SIZE];
                fp.read_exact(&mut xfp)?;
                samp_rate = read_ieee_extended(&xfp);
                let mut consumed = 8 + XFP_SIZE as u64;
                if is_aifc {
                    fp.read_exact(&mut compression)?;
                    consumed += 4;
                }
                got_comm = true;
                log::debug!(
                    "COMM: tracks {num_tracks}, samples {num_samples}, bits {num_bits}, rate {samp_rate}"
                );
                if skip > consumed {
                    fp.seek(SeekFrom::Current((skip - consumed) as i64))?;
                }
            }
            b"SSND" => {
                let offset = fp.read_u32::<BigEndian>()?;
                let _block_size = fp.read_u32::<BigEndian>()?;
                data_offset = fp.stream_position()? + offset as u64;
                if skip > 8 {
                    fp.seek(SeekFrom::Current(skip as i64 - 8))?;
                }
            }
            _ => {
                fp.seek(SeekFrom::Current(skip as i64))?;
            }
        }
    }
    if !got_comm {
        return Err(bad("missing COMM chunk"));
    }
    if !got_fver {
        return Err(bad("missing FVER chunk"));
    }
    if data_offset == 0 {
        return Err(bad("missing SSND chunk"));
    }
    if num_tracks < 1 || samp_rate <= 0.0 || !samp_rate.is_finite() {
        return Err(bad("degenerate COMM chunk"));
    }

    let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Undefined);
    dd.num_fields = num_tracks as usize;
    dd.num_bits = num_bits as u16;
    // producers disagree on the case of the compression IDs; accept both
    match compression.to_ascii_uppercase().as_slice() {
        b"NONE" => {
            dd.coding = DataCoding::Linear;
            dd.format = match num_bits {
                1..=8 => DataFormat::Int8,
                9..=16 => DataFormat::Int16,
                17..=24 => DataFormat::Int24,
                25..=32 => DataFormat::Int32,
                _ => return Err(bad("unsupported sample size")),
            };
        }
        b"ALAW" => {
            dd.coding = DataCoding::Alaw;
            dd.format = DataFormat::UInt8;
        }
        b"ULAW" => {
            dd.coding = DataCoding::Ulaw;
            dd.format = DataFormat::UInt8;
        }
        b"FL32" => {
            dd.coding = DataCoding::Linear;
            dd.format = DataFormat::Real32;
        }
        b"FL64" => {
            dd.coding = DataCoding::Linear;
            dd.format = DataFormat::Real64;
        }
        other => {
            return Err(SonaError::NoHandle(format!(
                "AIFC compression '{}' in {path}",
                String::from_utf8_lossy(other)
            )))
        }
    }
    dop.file_data = FileData::Binary;
    dop.file_endian = Endian::Big;
    dop.samp_freq = samp_rate;
    dop.frame_dur = 1;
    dop.start_record = 0;
    dop.time_zero = 0.0;
    dop.header_size = data_offset;
    dop.num_records = num_samples as i64;
    dop.descriptors.clear();
    dop.descriptors.push(dd);
    dop.set_record_size()?;
    crate::aucheck::check_au_bits(dop);
    dop.check_rates()?;
    dop.set_start_time();
    Ok(())
}

/// Lower-case compression ID and name for the data coding; writers
/// SHOULD emit lower-case (only `NONE` is universally upper-case).
fn compression_for(dd: &DataDescriptor) -> Result<(&'static [u8; 4], &'static str)> {
    Ok(match (dd.coding, dd.format) {
        (DataCoding::Linear | DataCoding::BinaryOffset, f) if f.is_integer() => {
            (b"NONE", "not compressed")
        }
        (DataCoding::Linear, DataFormat::Real32) => (b"fl32", "32-bit floating point"),
        (DataCoding::Linear, DataFormat::Real64) => (b"fl64", "64-bit floating point"),
        (DataCoding::Alaw, _) => (b"alaw", "ALaw 2-to-1"),
        (DataCoding::Ulaw, _) => (b"ulaw", "uLaw 2-to-1"),
        _ => {
            return Err(SonaError::NoHandle(format!(
                "{:?}/{:?} in AIFF output",
                dd.coding, dd.format
            )))
        }
    })
}

pub(crate) fn write_header(dop: &mut DataObject) -> Result<()> {
    if dop.descriptors.len() != 1 || dop.descriptors[0].dtype != DataType::Sample {
        return Err(SonaError::WrongDataType(String::from("(AIFF writer)")));
    }
    dop.set_record_size()?;
    crate::aucheck::check_au_bits(dop);
    let dd = dop.descriptors[0].clone();
    let (cmpr_id, cmpr_name) = compression_for(&dd)?;
    // plain integer PCM keeps the plain AIFF form
    let is_aifc = cmpr_id != b"NONE" || dop.file_format == FileFormat::Aifc;
    dop.file_format = if is_aifc {
        FileFormat::Aifc
    } else {
        FileFormat::Aiff
    };
    dop.file_data = FileData::Binary;
    dop.file_endian = Endian::Big;
    dop.frame_dur = 1;
    dop.check_rates()?;

    // pascal string, padded to even total length
    let mut name = Vec::with_capacity(cmpr_name.len() + 2);
    name.push(cmpr_name.len() as u8);
    name.extend_from_slice(cmpr_name.as_bytes());
    if name.len() & 1 == 1 {
        name.push(0);
    }
    let comm_size: i32 = if is_aifc {
        18 + 4 + name.len() as i32
    } else {
        18
    };
    let num_records = dop.num_records.max(0) as u32;
    let data_size = num_records * dop.record_size as u32;
    let ssnd_size: i32 = 8 + data_size as i32;
    let mut form_size: i32 = 4 + 8 + comm_size + 8 + ssnd_size + (data_size & 1) as i32;
    if is_aifc {
        form_size += 12; // FVER
    }
    let samp_freq = dop.samp_freq;
    let num_fields = dop.descriptors[0].num_fields as i16;
    let num_bits = dop.descriptors[0].num_bits as i16;

    let fp = dop.file_handle().ok_or(SonaError::BadArgs("write_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    fp.write_all(b"FORM")?;
    fp.write_i32::<BigEndian>(form_size)?;
    fp.write_all(if is_aifc { b"AIFC" } else { b"AIFF" })?;
    if is_aifc {
        fp.write_all(b"FVER")?;
        fp.write_i32::<BigEndian>(4)?;
        fp.write_u32::<BigEndian>(AIFC_VERSION)?;
    }
    fp.write_all(b"COMM")?;
    fp.write_i32::<BigEndian>(comm_size)?;
    fp.write_i16::<BigEndian>(num_fields)?;
    fp.write_u32::<BigEndian>(num_records)?;
    fp.write_i16::<BigEndian>(num_bits)?;
    fp.write_all(&write_ieee_extended(samp_freq))?;
    if is_aifc {
        fp.write_all(cmpr_id)?;
        fp.write_all(&name)?;
    }
    fp.write_all(b"SSND")?;
    fp.write_i32::<BigEndian>(ssnd_size)?;
    fp.write_u32::<BigEndian>(0)?; // offset
    fp.write_u32::<BigEndian>(0)?; // block size
    let header_size = fp.stream_position()?;
    dop.header_size = header_size;

    if data_size & 1 == 1 {
        let end = dop.header_size + data_size as u64;
        let fp = dop.file_handle().unwrap();
        if fp.metadata()?.len() == end {
            fp.seek(SeekFrom::Start(end))?;
            fp.write_all(&[0u8])?;
        }
    }
    Ok(())
}
