//! Audio property summaries and capability verification.
//!
//! Audio codings are summarized as a set of flags: the lowest byte
//! carries the channel count, the next bytes the format/coding and the
//! byte order the data can appear in.

use crate::dataobj::{DataCoding, DataFormat, DataObject, DataType, FileFormat};
use crate::error::{Result, SonaError};

pub type AuProps = u32;

pub const AUC_NONE: AuProps = 0;
/// lowest byte contains the number of channels (255 should be ample)
pub const AUC_CHAN_MASK: AuProps = 0x0000_00FF;
pub const AUC_ALAW: AuProps = 0x0000_0100;
pub const AUC_ULAW: AuProps = 0x0000_0200;
pub const AUC_U8: AuProps = 0x0000_0400;
pub const AUC_I8: AuProps = 0x0000_0800;
pub const AUC_U16: AuProps = 0x0000_1000;
pub const AUC_I16: AuProps = 0x0000_2000;
pub const AUC_U24: AuProps = 0x0000_4000;
pub const AUC_I24: AuProps = 0x0000_8000;
pub const AUC_U32: AuProps = 0x0001_0000;
pub const AUC_I32: AuProps = 0x0002_0000;
pub const AUC_F32: AuProps = 0x0004_0000;
pub const AUC_F64: AuProps = 0x0008_0000;
/// mask for the multi-byte formats (byte order matters)
pub const AUC_SWAP_MASK: AuProps = 0x000F_F000;
/// mask for all format/coding bits
pub const AUC_FORM_MASK: AuProps = 0x000F_FF00;
/// flag: the object is file-bound
pub const AUC_FILE: AuProps = 0x0200_0000;
/// flag: capabilities of a file header (rather than a function)
pub const AUC_HEAD: AuProps = 0x0800_0000;
pub const AUC_MSB_L: AuProps = 0x1000_0000;
pub const AUC_MSB_F: AuProps = 0x2000_0000;
/// can handle either byte order
pub const AUC_MSB_X: AuProps = AUC_MSB_F | AUC_MSB_L;
pub const AUC_MSB_MASK: AuProps = AUC_MSB_X;

/// Properties of the audio coding of a descriptor list. `Ok(AUC_NONE)`
/// when the object does not describe plain audio.
pub fn au_props_descriptors(dop: &DataObject) -> Result<AuProps> {
    if dop.descriptors.len() != 1 {
        return Ok(AUC_NONE);
    }
    let dd = &dop.descriptors[0];
    if dd.dtype != DataType::Sample {
        return Ok(AUC_NONE);
    }
    let format = match dd.format {
        DataFormat::UInt8 => match dd.coding {
            DataCoding::Linear | DataCoding::BinaryOffset => AUC_U8,
            DataCoding::Alaw => AUC_ALAW,
            DataCoding::Ulaw => AUC_ULAW,
            _ => return Err(SonaError::NoHandle(format!("{:?}", dd.coding))),
        },
        DataFormat::Int8 => match dd.coding {
            DataCoding::Linear => AUC_I8,
            DataCoding::Alaw => AUC_ALAW,
            DataCoding::Ulaw => AUC_ULAW,
            _ => return Err(SonaError::NoHandle(format!("{:?}", dd.coding))),
        },
        _ => {
            if dd.coding != DataCoding::Linear && dd.coding != DataCoding::BinaryOffset {
                return Err(SonaError::NoHandle(format!("{:?}", dd.coding)));
            }
            match dd.format {
                DataFormat::UInt16 => AUC_U16,
                DataFormat::Int16 => AUC_I16,
                DataFormat::UInt24 => AUC_U24,
                DataFormat::Int24 => AUC_I24,
                DataFormat::UInt32 => AUC_U32,
                DataFormat::Int32 => AUC_I32,
                DataFormat::Real32 => AUC_F32,
                DataFormat::Real64 => AUC_F64,
                _ => return Err(SonaError::NoHandle(format!("{:?}", dd.format))),
            }
        }
    };
    let channels = (dd.num_fields as AuProps).min(AUC_CHAN_MASK);
    Ok(format | channels)
}

/// Properties of the audio coding of a data object, including byte
/// order and file binding.
pub fn au_props(dop: &DataObject) -> Result<AuProps> {
    let mut props = au_props_descriptors(dop)?;
    if props > 0 {
        if dop.file_endian.is_msb_first() {
            props |= AUC_MSB_F;
        }
        if dop.file_endian.is_msb_last() {
            props |= AUC_MSB_L;
        }
        if dop.file_path.is_some() {
            props |= AUC_FILE;
        }
    }
    Ok(props)
}

/// The audio capabilities of a file format. `AUC_NONE` when the format
/// does not support audio.
pub fn au_caps_of_format(format: FileFormat) -> AuProps {
    let mut caps = match format {
        FileFormat::Raw => {
            AUC_ALAW | AUC_ULAW | AUC_U8 | AUC_I8 | AUC_U16 | AUC_I16 | AUC_U24 | AUC_I24
                | AUC_U32 | AUC_I32 | AUC_F32 | AUC_F64 | AUC_MSB_X | AUC_CHAN_MASK
        }
        FileFormat::Aiff => AUC_I8 | AUC_I16 | AUC_I24 | AUC_I32 | AUC_MSB_F | AUC_CHAN_MASK,
        FileFormat::Aifc => {
            AUC_I8 | AUC_I16 | AUC_I24 | AUC_I32 | AUC_ALAW | AUC_ULAW | AUC_F32 | AUC_F64
                | AUC_MSB_F | AUC_CHAN_MASK
        }
        FileFormat::Csl => AUC_I16 | AUC_MSB_L | 0x02,
        FileFormat::Kth => AUC_I16 | AUC_MSB_X | AUC_CHAN_MASK,
        FileFormat::Snd => {
            AUC_ALAW | AUC_ULAW | AUC_I8 | AUC_I16 | AUC_I24 | AUC_I32 | AUC_F32 | AUC_F64
                | AUC_MSB_F | AUC_CHAN_MASK
        }
        FileFormat::Nist => {
            AUC_ULAW | AUC_I8 | AUC_I16 | AUC_I24 | AUC_I32 | AUC_MSB_X | AUC_CHAN_MASK
        }
        FileFormat::Ssff => AUC_I16 | AUC_MSB_X | AUC_CHAN_MASK,
        FileFormat::Wave | FileFormat::WaveX => {
            AUC_ALAW | AUC_ULAW | AUC_U8 | AUC_I16 | AUC_I24 | AUC_I32 | AUC_F32 | AUC_F64
                | AUC_MSB_L | AUC_CHAN_MASK
        }
        _ => AUC_NONE,
    };
    if caps > 0 {
        caps |= AUC_HEAD;
    }
    caps
}

/// The capabilities of an analysis with the given processing format:
/// anything the sample conversion can turn into that format.
pub fn au_caps_for_processing(processing: DataFormat) -> Result<AuProps> {
    match processing {
        DataFormat::Real64 | DataFormat::Int32 => Ok(AUC_ALAW
            | AUC_ULAW
            | AUC_U8
            | AUC_I8
            | AUC_U16
            | AUC_I16
            | AUC_U24
            | AUC_I24
            | AUC_U32
            | AUC_I32
            | AUC_F32
            | AUC_F64
            | AUC_MSB_X),
        _ => Err(SonaError::Bug(format!(
            "no sample conversion into {processing:?}"
        ))),
    }
}

/// Verifies that the object refers to an audio signal whose properties
/// the caller can handle, per the capability set `au_caps`. When
/// `channel` is greater than 0 the signal must contain that channel
/// (counting starts at 1). Returns the signal's properties.
pub fn check_sound(dop: &DataObject, au_caps: AuProps, channel: usize) -> Result<AuProps> {
    let in_file = || match &dop.file_path {
        Some(p) => format!("in file {}", p.display()),
        None => String::new(),
    };
    let props = au_props(dop)?;
    if props == AUC_NONE {
        return Err(SonaError::NoAudio(in_file()));
    }
    let format = props & AUC_FORM_MASK;
    if au_caps & format == 0 {
        return Err(SonaError::NoHandle(in_file()));
    }
    if format & AUC_SWAP_MASK != 0 {
        // no endian check for single-byte data
        let endian = props & AUC_MSB_MASK;
        if endian != 0 && au_caps & endian == 0 {
            return Err(SonaError::NoHandle(in_file()));
        }
    }
    let num_tracks = props & AUC_CHAN_MASK;
    if num_tracks == 0 || dop.frame_dur != 1 {
        return Err(SonaError::WrongDataFormat(in_file()));
    }
    let max_tracks = au_caps & AUC_CHAN_MASK;
    if max_tracks > 0 && num_tracks > max_tracks {
        return Err(SonaError::NoHandle(format!(
            "can't handle {num_tracks}-channel data {}",
            in_file()
        )));
    }
    if channel > 0 && channel as AuProps > num_tracks {
        return Err(SonaError::BadValue(format!(
            "channel {channel} not available {}",
            in_file()
        )));
    }
    if dop.samp_freq <= 0.0 {
        return Err(SonaError::WrongDataRate(format!(
            "sampling frequency undefined {}",
            in_file()
        )));
    }
    Ok(props)
}

/// Verifies/corrects `num_bits` in the descriptors for audio data,
/// assuming a more or less sensible packing.
pub fn check_au_bits(dop: &mut DataObject) {
    for dd in dop.descriptors.iter_mut() {
        if dd.dtype != DataType::Sample {
            continue;
        }
        match dd.coding {
            DataCoding::Linear | DataCoding::BinaryOffset => match dd.format {
                DataFormat::UInt8 | DataFormat::Int8 => dd.num_bits = 8,
                DataFormat::UInt16 | DataFormat::Int16 => {
                    if dd.num_bits <= 8 || dd.num_bits > 16 {
                        dd.num_bits = 16;
                    }
                }
                DataFormat::UInt24 | DataFormat::Int24 => {
                    if dd.num_bits <= 16 || dd.num_bits > 24 {
                        dd.num_bits = 24;
                    }
                }
                DataFormat::UInt32 | DataFormat::Int32 => {
                    // might have put 24-bit data in 4 bytes
                    if dd.num_bits < 24 || dd.num_bits > 32 {
                        dd.num_bits = 32;
                    }
                }
                DataFormat::Real32 => dd.num_bits = 32,
                DataFormat::Real64 => dd.num_bits = 64,
                _ => {}
            },
            DataCoding::Alaw | DataCoding::Ulaw => dd.num_bits = 8,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataobj::DataDescriptor;
    use sona_codec::Endian;

    fn audio(format: DataFormat, coding: DataCoding, channels: usize) -> DataObject {
        let mut dop = DataObject::new();
        dop.samp_freq = 16000.0;
        dop.frame_dur = 1;
        dop.file_endian = Endian::Little;
        let mut dd = DataDescriptor::new(DataType::Sample, format);
        dd.coding = coding;
        dd.num_fields = channels;
        dop.descriptors.push(dd);
        dop
    }

    #[test]
    fn props_of_pcm16_stereo() {
        let dop = audio(DataFormat::Int16, DataCoding::Linear, 2);
        let props = au_props(&dop).unwrap();
        assert_eq!(props & AUC_FORM_MASK, AUC_I16);
        assert_eq!(props & AUC_CHAN_MASK, 2);
        assert_eq!(props & AUC_MSB_MASK, AUC_MSB_L);
    }

    #[test]
    fn non_audio_yields_none() {
        let mut dop = DataObject::new();
        dop.descriptors
            .push(DataDescriptor::new(DataType::Rms, DataFormat::Real32));
        assert_eq!(au_props_descriptors(&dop).unwrap(), AUC_NONE);
    }

    #[test]
    fn check_sound_rejects_missing_channel() {
        let dop = audio(DataFormat::Int16, DataCoding::Linear, 1);
        let caps = au_caps_for_processing(DataFormat::Real64).unwrap() | 8;
        assert!(check_sound(&dop, caps, 1).is_ok());
        assert!(check_sound(&dop, caps, 2).is_err());
    }

    #[test]
    fn check_sound_rejects_undefined_rate() {
        let mut dop = audio(DataFormat::Int16, DataCoding::Linear, 1);
        dop.samp_freq = 0.0;
        let caps = au_caps_for_processing(DataFormat::Real64).unwrap() | 8;
        assert!(check_sound(&dop, caps, 0).is_err());
    }

    #[test]
    fn format_capabilities() {
        assert_eq!(au_caps_of_format(FileFormat::Aiff) & AUC_F32, 0);
        assert_ne!(au_caps_of_format(FileFormat::Aifc) & AUC_F32, 0);
        assert_ne!(au_caps_of_format(FileFormat::Wave) & AUC_ULAW, 0);
        assert_eq!(au_caps_of_format(FileFormat::Xlabel), AUC_NONE);
        assert_ne!(au_caps_of_format(FileFormat::Raw) & AUC_HEAD, 0);
    }

    #[test]
    fn bit_normalization() {
        let mut dop = audio(DataFormat::Int16, DataCoding::Linear, 1);
        check_au_bits(&mut dop);
        assert_eq!(dop.descriptors[0].num_bits, 16);
        let mut dop = audio(DataFormat::UInt8, DataCoding::Ulaw, 1);
        dop.descriptors[0].num_bits = 12;
        check_au_bits(&mut dop);
        assert_eq!(dop.descriptors[0].num_bits, 8);
    }
}
