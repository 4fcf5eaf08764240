//! RIFF-WAVE format driver. Header and data have MSB last.

use crate::dataobj::{
    DataCoding, DataDescriptor, DataFormat, DataObject, DataType, FileData, FileFormat,
};
use crate::error::{Result, SonaError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;
use sona_codec::Endian;
use std::io::{Read, Seek, SeekFrom, Write};

pub const WAVE_MIN_HDR: u64 = 44;

/// Some of the zillion format codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum WaveFormatCode {
    Pcm = 0x0001,
    Adpcm = 0x0002,
    Float = 0x0003,
    Alaw = 0x0006,
    Mulaw = 0x0007,
    OkiAdpcm = 0x0010,
    IdviAdpcm = 0x0011,
    IsoMp3 = 0x0055,
    Extensible = 0xFFFE,
}

/// Initial part of the media-identification GUID behind the sub-format
/// code in an extensible fmt chunk.
const WAVE_GUID_TAIL: [u8; 14] = [
    0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
];

pub(crate) fn read_header(dop: &mut DataObject) -> Result<()> {
    let path = dop.path_string();
    let bad = |detail: &str| SonaError::BadHeader {
        path: path.clone(),
        detail: detail.to_string(),
    };
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("read_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    let mut id = [0u8; 4];
    fp.read_exact(&mut id)?;
    if &id != b"RIFF" {
        return Err(bad("missing RIFF chunk"));
    }
    let _file_size = fp.read_u32::<LittleEndian>()?;
    fp.read_exact(&mut id)?;
    if &id != b"WAVE" {
        return Err(bad("missing WAVE form type"));
    }

    let mut format_code: Option<u16> = None;
    let mut num_tracks = 0u16;
    let mut samp_rate = 0u32;
    let mut block_size = 0u16;
    let mut num_bits = 0u16;
    let mut valid_bits = 0u16;
    let mut fact_records: Option<u32> = None;
    let mut data_offset = 0u64;
    let mut data_size = 0u32;
    let mut extensible = false;

    loop {
        let mut ck_id = [0u8; 4];
        match fp.read_exact(&mut ck_id) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let ck_size = fp.read_u32::<LittleEndian>()?;
        // chunks are always aligned at an even address
        let skip = ck_size as u64 + (ck_size as u64 & 1);
        match &ck_id {
            b"fmt " => {
                let code = fp.read_u16::<LittleEndian>()?;
                num_tracks = fp.read_u16::<LittleEndian>()?;
                samp_rate = fp.read_u32::<LittleEndian>()?;
                let _byte_rate = fp.read_u32::<LittleEndian>()?;
                block_size = fp.read_u16::<LittleEndian>()?;
                num_bits = fp.read_u16::<LittleEndian>()?;
                log::debug!("fmt: code {code:#06x}, tracks {num_tracks}, rate {samp_rate}");
                let mut consumed = 16u64;
                if code == WaveFormatCode::Extensible as u16 {
                    extensible = true;
                    let ext_size = fp.read_u16::<LittleEndian>()?;
                    if ext_size < 22 {
                        return Err(bad("truncated extensible fmt chunk"));
                    }
                    valid_bits = fp.read_u16::<LittleEndian>()?;
                    let _lsp_map = fp.read_u32::<LittleEndian>()?;
                    let sub_format = fp.read_u16::<LittleEndian>()?;
                    let mut guid = [0u8; 14];
                    fp.read_exact(&mut guid)?;
                    format_code = Some(sub_format);
                    consumed += 2 + 22;
                } else {
                    format_code = Some(code);
                }
                if skip > consumed {
                    fp.seek(SeekFrom::Current((skip - consumed) as i64))?;
                }
            }
            b"fact" => {
                fact_records = Some(fp.read_u32::<LittleEndian>()?);
                if skip > 4 {
                    fp.seek(SeekFrom::Current(skip as i64 - 4))?;
                }
            }
            b"data" => {
                data_offset = fp.stream_position()?;
                data_size = ck_size;
                fp.seek(SeekFrom::Current(skip as i64))?;
            }
            _ => {
                // junk, pad, LIST, ...
                log::debug!(
                    "skipping chunk {} ({ck_size} bytes)",
                    String::from_utf8_lossy(&ck_id)
                );
                fp.seek(SeekFrom::Current(skip as i64))?;
            }
        }
    }

    let code = format_code.ok_or_else(|| bad("missing fmt chunk"))?;
    if data_offset == 0 {
        return Err(bad("missing data chunk"));
    }
    if num_tracks == 0 || samp_rate == 0 || block_size == 0 {
        return Err(bad("degenerate fmt chunk"));
    }
    let bytes_per_sample = (block_size / num_tracks) as usize;
    let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Undefined);
    dd.num_fields = num_tracks as usize;
    match WaveFormatCode::from_u16(code) {
        Some(WaveFormatCode::Pcm) => {
            dd.coding = DataCoding::Linear;
            dd.format = match bytes_per_sample {
                1 => {
                    dd.coding = DataCoding::BinaryOffset; // 8-bit WAVE is unsigned
                    DataFormat::UInt8
                }
                2 => DataFormat::Int16,
                3 => DataFormat::Int24,
                4 => DataFormat::Int32,
                _ => return Err(bad("unsupported PCM sample size")),
            };
        }
        Some(WaveFormatCode::Float) => {
            dd.coding = DataCoding::Linear;
            dd.format = match bytes_per_sample {
                4 => DataFormat::Real32,
                8 => DataFormat::Real64,
                _ => return Err(bad("unsupported float sample size")),
            };
        }
        Some(WaveFormatCode::Alaw) => {
            dd.coding = DataCoding::Alaw;
            dd.format = DataFormat::UInt8;
        }
        Some(WaveFormatCode::Mulaw) => {
            dd.coding = DataCoding::Ulaw;
            dd.format = DataFormat::UInt8;
        }
        _ => {
            return Err(SonaError::NoHandle(format!(
                "WAVE format code {code:#06x} in {path}"
            )))
        }
    }
    dd.num_bits = if extensible && valid_bits > 0 {
        valid_bits
    } else {
        num_bits
    };
    dop.file_format = if extensible {
        FileFormat::WaveX
    } else {
        FileFormat::Wave
    };
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
    crate::aucheck::check_au_bits(dop);
    dop.num_records = (data_size as usize / dop.record_size.max(1)) as i64;
    if let Some(fact) = fact_records {
        if (fact as i64) < dop.num_records {
            dop.num_records = fact as i64;
        }
    }
    dop.check_rates()?;
    dop.set_start_time();
    Ok(())
}

/// Whether the data needs the extensible header variant: linear PCM
/// with more than 2 channels or more than 16 bits per sample.
pub fn needs_wave_x(dop: &DataObject) -> bool {
    let dd = &dop.descriptors[0];
    matches!(dd.coding, DataCoding::Linear | DataCoding::BinaryOffset)
        && (dd.num_fields > 2 || dd.format.size() > 2)
}

pub(crate) fn write_header(dop: &mut DataObject) -> Result<()> {
    if dop.descriptors.len() != 1 || dop.descriptors[0].dtype != DataType::Sample {
        return Err(SonaError::WrongDataType(String::from("(WAVE writer)")));
    }
    dop.set_record_size()?;
    crate::aucheck::check_au_bits(dop);
    let dd = dop.descriptors[0].clone();
    let (code, fact) = match dd.coding {
        DataCoding::Linear | DataCoding::BinaryOffset => (WaveFormatCode::Pcm, false),
        DataCoding::Alaw => (WaveFormatCode::Alaw, true),
        DataCoding::Ulaw => (WaveFormatCode::Mulaw, true),
        _ => {
            return Err(SonaError::NoHandle(format!(
                "{:?} in WAVE output",
                dd.coding
            )))
        }
    };
    let (code, fact) = if dd.format == DataFormat::Real32 || dd.format == DataFormat::Real64 {
        (WaveFormatCode::Float, true)
    } else {
        (code, fact)
    };
    let extensible = code == WaveFormatCode::Pcm && needs_wave_x(dop);

    let block_size = dop.record_size as u16;
    let byte_rate = (dop.samp_freq as u32) * block_size as u32;
    let data_size = (dop.num_records.max(0) as u32) * block_size as u32;
    let fmt_size: u32 = if extensible { 40 } else { 16 };
    let mut riff_size = 4 + 8 + fmt_size + 8 + data_size + (data_size & 1);
    if fact {
        riff_size += 12;
    }

    dop.file_format = if extensible {
        FileFormat::WaveX
    } else {
        FileFormat::Wave
    };
    dop.file_data = FileData::Binary;
    dop.file_endian = Endian::Little;
    dop.frame_dur = 1;
    dop.check_rates()?;

    let samp_rate = dop.samp_freq as u32;
    let num_records = dop.num_records.max(0) as u32;
    let num_fields = dd.num_fields as u16;
    let container_bits = (dd.format.size() * 8) as u16;
    let fp = dop.file_handle().ok_or(SonaError::BadArgs("write_header"))?;
    fp.seek(SeekFrom::Start(0))?;
    fp.write_all(b"RIFF")?;
    fp.write_u32::<LittleEndian>(riff_size)?;
    fp.write_all(b"WAVE")?;
    fp.write_all(b"fmt ")?;
    fp.write_u32::<LittleEndian>(fmt_size)?;
    if extensible {
        fp.write_u16::<LittleEndian>(WaveFormatCode::Extensible as u16)?;
    } else {
        fp.write_u16::<LittleEndian>(code as u16)?;
    }
    fp.write_u16::<LittleEndian>(num_fields)?;
    fp.write_u32::<LittleEndian>(samp_rate)?;
    fp.write_u32::<LittleEndian>(byte_rate)?;
    fp.write_u16::<LittleEndian>(block_size)?;
    fp.write_u16::<LittleEndian>(container_bits)?;
    if extensible {
        fp.write_u16::<LittleEndian>(22)?; // size of the extension
        fp.write_u16::<LittleEndian>(dd.num_bits)?;
        fp.write_u32::<LittleEndian>(0)?; // no loudspeaker mapping
        fp.write_u16::<LittleEndian>(code as u16)?;
        fp.write_all(&WAVE_GUID_TAIL)?;
    }
    if fact {
        fp.write_all(b"fact")?;
        fp.write_u32::<LittleEndian>(4)?;
        fp.write_u32::<LittleEndian>(num_records)?;
    }
    fp.write_all(b"data")?;
    fp.write_u32::<LittleEndian>(data_size)?;
    let header_size = fp.stream_position()?;
    dop.header_size = header_size;

    // IFF even alignment: pad an odd data chunk that has already been
    // written out completely
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
