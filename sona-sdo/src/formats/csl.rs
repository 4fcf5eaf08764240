//! Kay Elemetrics CSL format driver. Little-endian throughout; only
//! 16-bit PCM in one or two tracks.

use crate::dataobj::{
    DataCoding, DataDescriptor, DataFormat, DataObject, DataType, FileData,
};
use crate::error::{Result, SonaError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use sona_codec::Endian;
use std::io::{Read, Seek, SeekFrom, Write};

pub const CSL_MIN_HDR: u64 = 60;
const CSL_DATE_SIZE: usize = 20;

pub(crate) fn read_header(dop: &mut DataObject) -> Result<()> {
    let path = dop.path_string();
    let bad = |detail: &str| SonaError::BadHeader {
        path: path.clone(),
        detail: detail.to_string(),
    };
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("read_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    let mut id = [0u8; 8];
    fp.read_exact(&mut id)?;
    if &id != b"FORMDS16" {
        return Err(bad("missing FORMDS16 magic"));
    }
    let _block_size = fp.read_u32::<LittleEndian>()?;

    let mut samp_rate = 0u32;
    let mut num_samples = 0u32;
    let mut num_tracks = 0usize;
    let mut data_offset = 0u64;
    let mut data_size = 0u32;
    loop {
        let mut ck_id = [0u8; 4];
        match fp.read_exact(&mut ck_id) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let ck_size = fp.read_u32::<LittleEndian>()?;
        let skip = ck_size as u64 + (ck_size as u64 & 1);
        match &ck_id {
            b"HEDR" | b"HDR8" => {
                let mut date = [0u8; CSL_DATE_SIZE];
                fp.read_exact(&mut date)?;
                samp_rate = fp.read_u32::<LittleEndian>()?;
                num_samples = fp.read_u32::<LittleEndian>()?;
                let _peak_a = fp.read_i16::<LittleEndian>()?;
                let _peak_b = fp.read_i16::<LittleEndian>()?;
                let consumed = CSL_DATE_SIZE as u64 + 12;
                if skip > consumed {
                    fp.seek(SeekFrom::Current((skip - consumed) as i64))?;
                }
            }
            b"SDA_" | b"SD_B" => {
                num_tracks = 1;
                data_offset = fp.stream_position()?;
                data_size = ck_size;
                fp.seek(SeekFrom::Current(skip as i64))?;
            }
            b"SDAB" => {
                num_tracks = 2;
                data_offset = fp.stream_position()?;
                data_size = ck_size;
                fp.seek(SeekFrom::Current(skip as i64))?;
            }
            _ => {
                log::debug!("skipping CSL chunk {}", String::from_utf8_lossy(&ck_id));
                fp.seek(SeekFrom::Current(skip as i64))?;
            }
        }
    }
    if samp_rate == 0 {
        return Err(bad("missing HEDR chunk"));
    }
    if data_offset == 0 {
        return Err(bad("missing data chunk"));
    }
    let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Int16);
    dd.coding = DataCoding::Linear;
    dd.num_fields = num_tracks;
    dd.num_bits = 16;
    dop.file_data = FileData::Binary;
    dop.file_endian = Endian::Little;
    dop.samp_freq = samp_rate as f64;
    dop.frame_dur = 1;
    dop.start_record = 0;
    dop.time_zero = 0.0;
    dop.header_size = data_offset;
    dop.descriptors.clear();
    dop.descriptors.push(dd);
    dop.set_record_size()?;
    let by_size = (data_size as usize / dop.record_size.max(1)) as i64;
    dop.num_records = if num_samples > 0 {
        (num_samples as i64).min(by_size)
    } else {
        by_size
    };
    dop.check_rates()?;
    dop.set_start_time();
    Ok(())
}

pub(crate) fn write_header(dop: &mut DataObject) -> Result<()> {
    if dop.descriptors.len() != 1 || dop.descriptors[0].dtype != DataType::Sample {
        return Err(SonaError::WrongDataType(String::from("(CSL writer)")));
    }
    let dd = &dop.descriptors[0];
    if dd.format != DataFormat::Int16
        || !matches!(dd.coding, DataCoding::Linear)
        || dd.num_fields > 2
    {
        return Err(SonaError::NoHandle(String::from(
            "CSL output is 16-bit PCM in at most 2 tracks",
        )));
    }
    dop.set_record_size()?;
    dop.file_data = FileData::Binary;
    dop.file_endian = Endian::Little;
    dop.frame_dur = 1;
    dop.check_rates()?;
    let num_samples = dop.num_records.max(0) as u32;
    let data_size = num_samples * dop.record_size as u32;
    let track_id: &[u8; 4] = if dop.descriptors[0].num_fields == 2 {
        b"SDAB"
    } else {
        b"SDA_"
    };
    // FORM block size covers everything behind the first 12 bytes
    let block_size = 8 + 32 + 8 + data_size + (data_size & 1);
    let samp_rate = dop.samp_freq as u32;

    let fp = dop.file_handle().ok_or(SonaError::BadArgs("write_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    fp.write_all(b"FORMDS16")?;
    fp.write_u32::<LittleEndian>(block_size)?;
    fp.write_all(b"HEDR")?;
    fp.write_u32::<LittleEndian>(32)?;
    fp.write_all(&[b' '; CSL_DATE_SIZE])?; // creation date left blank
    fp.write_u32::<LittleEndian>(samp_rate)?;
    fp.write_u32::<LittleEndian>(num_samples)?;
    fp.write_i16::<LittleEndian>(-1)?; // peak magnitudes not tracked
    fp.write_i16::<LittleEndian>(-1)?;
    fp.write_all(track_id)?;
    fp.write_u32::<LittleEndian>(data_size)?;
    let header_size = fp.stream_position()?;
    dop.header_size = header_size;
    Ok(())
}
