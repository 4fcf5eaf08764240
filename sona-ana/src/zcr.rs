//! Analysis of the zero-crossing rates of a signal.

use crate::options::AnaOptions;
use crate::timing::{ana_timing, check_data_bufs};
use crate::{has_committed_data, init_output_format, store_record, write_opts_for, ANA_I_CHANS};
use sona_dsp::zero_crossing_rate;
use sona_sdo::aucheck::{au_caps_for_processing, check_sound};
use sona_sdo::keywords::{dtype_to_entry, KDT_SSFF, KDT_XASSP};
use sona_sdo::{
    AscFormat, DataDescriptor, DataFormat, DataObject, DataType, FileFormat, GenericData, Result,
    SonaError,
};
use std::any::Any;

/// default analysis parameters
pub const ZCR_DEF_SIZE: f64 = 25.0;
pub const ZCR_DEF_SHIFT: f64 = 5.0;
pub const ZCR_DEF_CHANNEL: usize = 0; // multi-channel output
pub const ZCR_DEF_DIGITS: usize = 1;
pub const ZCR_DEF_SUFFIX: &str = ".zcr";
pub const ZCR_DEF_FORMAT: &str = "SSFF";

/// one leading sample from the previous frame, for the crossing at the
/// frame boundary
const ZCR_HEAD: i64 = 1;
const ZCR_TAIL: i64 = 0;

const ZCR_DFORMAT: DataFormat = DataFormat::Real32;
const ZCR_PFORMAT: DataFormat = DataFormat::Real64;

/// Converted analysis parameters, attached to the output object.
#[derive(Debug)]
pub struct ZcrParams {
    pub frame_size: i64,
    pub beg_frame_nr: i64,
    pub end_frame_nr: i64,
    /// 0 for multi-channel output, otherwise the selected channel
    pub channel: usize,
    pub precision: usize,
}

impl GenericData for ZcrParams {
    fn ident(&self) -> &str {
        "ZCR_generics"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Fills the options with the ZCR analysis defaults.
pub fn set_zcr_defaults(opts: &mut AnaOptions) {
    *opts = AnaOptions::default();
    opts.ms_size = ZCR_DEF_SIZE;
    opts.ms_shift = ZCR_DEF_SHIFT;
    opts.channel = ZCR_DEF_CHANNEL;
    opts.precision = ZCR_DEF_DIGITS;
    opts.format = String::from(ZCR_DEF_FORMAT);
}

fn checked_params(
    smp_dop: &DataObject,
    opts: &mut AnaOptions,
) -> Result<(ZcrParams, crate::AnaTiming)> {
    let au_caps = au_caps_for_processing(ZCR_PFORMAT)? | ANA_I_CHANS;
    check_sound(smp_dop, au_caps, opts.channel)?;
    let (timing, _) = ana_timing(smp_dop, opts)?;
    let gd = ZcrParams {
        frame_size: timing.frame_size,
        beg_frame_nr: timing.beg_frame_nr,
        end_frame_nr: timing.end_frame_nr,
        channel: opts.channel,
        precision: opts.precision,
    };
    Ok((gd, timing))
}

/// Initializes a data object to hold zero-crossing rate data; one
/// output field per channel unless a single channel is selected.
pub fn create_zcr(smp_dop: &DataObject, opts: &mut AnaOptions) -> Result<DataObject> {
    let (gd, timing) = checked_params(smp_dop, opts)?;

    let mut dop = DataObject::new();
    init_output_format(&mut dop, &opts.format);
    dop.samp_freq = timing.samp_freq;
    dop.frame_dur = timing.frame_shift;
    dop.start_record = gd.beg_frame_nr;
    dop.num_records = 0;
    let mut dd = DataDescriptor::new(DataType::Zcr, ZCR_DFORMAT);
    dd.num_fields = if gd.channel < 1 {
        smp_dop.descriptors[0].num_fields
    } else {
        1
    };
    match dop.file_format {
        FileFormat::Ssff => {
            let entry = dtype_to_entry(dd.dtype, KDT_SSFF)
                .ok_or(SonaError::NoTrackName("(create_zcr)"))?;
            dd.ident = Some(entry.keyword.to_string());
            dd.unit = entry.unit.to_string();
        }
        FileFormat::Xassp => {
            let entry = dtype_to_entry(dd.dtype, KDT_XASSP)
                .ok_or(SonaError::NoTrackName("(create_zcr)"))?;
            dd.ident = Some(entry.keyword.to_string());
            dd.unit = entry.unit.to_string();
            dd.sep_chars = String::from(" ");
            dd.asc_format = AscFormat::Fixed {
                precision: gd.precision,
            };
        }
        _ => {
            dd.ident = Some(String::from("ZCR"));
            dd.sep_chars = String::from(" ");
            dd.asc_format = AscFormat::Fixed {
                precision: gd.precision,
            };
        }
    }
    dop.descriptors.push(dd);
    dop.generic = Some(Box::new(gd));
    dop.set_record_size()?;
    dop.check_rates()?;
    dop.set_start_time();
    Ok(dop)
}

/// Runs the zero-crossing analysis, creating the output object.
pub fn compute_zcr(smp_dop: &mut DataObject, opts: &mut AnaOptions) -> Result<DataObject> {
    let mut zcr_dop = create_zcr(smp_dop, opts)?;
    compute_zcr_into(smp_dop, Some(opts), &mut zcr_dop)?;
    Ok(zcr_dop)
}

/// Runs the zero-crossing analysis into an existing output object.
pub fn compute_zcr_into(
    smp_dop: &mut DataObject,
    opts: Option<&AnaOptions>,
    zcr_dop: &mut DataObject,
) -> Result<()> {
    if smp_dop.is_file_bound() {
        if smp_dop.num_records <= 0 {
            return Err(SonaError::FileEmpty(smp_dop.path_string()));
        }
    } else if smp_dop.buffer.buf_num_recs <= 0 {
        return Err(SonaError::NoData(String::from("(compute_zcr)")));
    }
    let (frame_size, beg, end, channel) = {
        let gd = zcr_dop
            .generic
            .as_ref()
            .and_then(|g| g.as_any().downcast_ref::<ZcrParams>())
            .ok_or_else(|| SonaError::Bug(String::from("ZCR generic data missing")))?;
        (gd.frame_size, gd.beg_frame_nr, gd.end_frame_nr, gd.channel)
    };
    let frame_shift = zcr_dop.frame_dur;
    if opts.is_some() {
        check_data_bufs(smp_dop, zcr_dop, ZCR_HEAD + frame_size + ZCR_TAIL, beg, end)?;
    }
    let write_opts = write_opts_for(zcr_dop);

    let samp_freq = smp_dop.samp_freq;
    let num_chans = zcr_dop.descriptors[0].num_fields;
    let mut frame = vec![0.0f64; (ZCR_HEAD + frame_size + ZCR_TAIL) as usize];
    let mut rec = vec![0u8; zcr_dop.record_size];
    for frame_nr in beg..end {
        for cn in 0..num_chans {
            let want = if channel > 0 { channel } else { cn + 1 };
            smp_dop.get_sample_frame(
                frame_nr,
                frame_size,
                frame_shift,
                ZCR_HEAD,
                ZCR_TAIL,
                want,
                &mut frame,
            )?;
            let rate = zero_crossing_rate(&frame, samp_freq) as f32;
            rec[cn * 4..cn * 4 + 4].copy_from_slice(&rate.to_ne_bytes());
        }
        store_record(zcr_dop, frame_nr, &rec)?;
    }
    if zcr_dop.is_file_bound() {
        zcr_dop.flush_buffer(write_opts)?;
    }
    Ok(())
}

/// Checks whether changed options are compatible with an existing ZCR
/// object and updates its parameters.
pub fn verify_zcr(
    zcr_dop: &mut DataObject,
    smp_dop: &DataObject,
    opts: &mut AnaOptions,
) -> Result<()> {
    if zcr_dop.descriptors.len() != 1
        || zcr_dop.descriptors[0].dtype != DataType::Zcr
        || zcr_dop.descriptors[0].format != ZCR_DFORMAT
    {
        return Err(SonaError::Bug(String::from("not a regular ZCR object")));
    }
    let (gd, timing) = checked_params(smp_dop, opts)?;
    if zcr_dop.samp_freq != timing.samp_freq || zcr_dop.frame_dur != timing.frame_shift {
        let frame_rate = timing.samp_freq / timing.frame_shift as f64;
        if zcr_dop.data_rate != frame_rate {
            if has_committed_data(zcr_dop) {
                return Err(SonaError::WrongDataRate(zcr_dop.path_string()));
            }
            zcr_dop.clear_data_buffer();
        }
        zcr_dop.samp_freq = timing.samp_freq;
        zcr_dop.frame_dur = timing.frame_shift;
        zcr_dop.data_rate = frame_rate;
        zcr_dop.start_record = timing.beg_frame_nr;
        zcr_dop.num_records = 0;
        zcr_dop.set_start_time();
    }
    let want_fields = if gd.channel < 1 {
        smp_dop.descriptors[0].num_fields
    } else {
        1
    };
    if zcr_dop.descriptors[0].num_fields != want_fields {
        if has_committed_data(zcr_dop) {
            return Err(SonaError::Incompatible(String::from(
                "can't change channels in existing data",
            )));
        }
        zcr_dop.free_data_buffer();
        zcr_dop.descriptors[0].num_fields = want_fields;
        zcr_dop.set_record_size()?;
    }
    zcr_dop.generic = Some(Box::new(gd));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sona_sdo::DataCoding;

    fn square_audio(num: usize, rate: f64, freq: f64) -> DataObject {
        let mut dop = DataObject::new();
        dop.samp_freq = rate;
        dop.frame_dur = 1;
        let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Int16);
        dd.coding = DataCoding::Linear;
        dd.num_fields = 1;
        dop.descriptors.push(dd);
        dop.set_record_size().unwrap();
        dop.check_rates().unwrap();
        dop.alloc_data_buffer(num as i64).unwrap();
        let half_period = (rate / (2.0 * freq)).round() as usize;
        for n in 0..num {
            let v: i16 = if (n / half_period) % 2 == 0 { 8000 } else { -8000 };
            dop.record_bytes_mut(n as i64).copy_from_slice(&v.to_ne_bytes());
        }
        dop.buffer.buf_num_recs = num as i64;
        dop
    }

    #[test]
    fn square_wave_rate() {
        // 1 kHz square wave at 10 kHz: 2000 crossings per second
        let mut smp = square_audio(10000, 10000.0, 1000.0);
        let mut opts = AnaOptions::default();
        set_zcr_defaults(&mut opts);
        opts.ms_size = 10.0; // 100 samples
        let out = compute_zcr(&mut smp, &mut opts).unwrap();
        assert!(out.buffer.buf_num_recs > 10);
        for i in 2..10 {
            let rec = out.record_bytes(i);
            let rate = f32::from_ne_bytes(rec[0..4].try_into().unwrap());
            assert!((rate - 2000.0).abs() <= 20.0, "frame {i}: {rate}");
        }
    }

    #[test]
    fn constant_signal_yields_zero() {
        let mut dop = DataObject::new();
        dop.samp_freq = 8000.0;
        dop.frame_dur = 1;
        let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Int16);
        dd.coding = DataCoding::Linear;
        dd.num_fields = 1;
        dop.descriptors.push(dd);
        dop.set_record_size().unwrap();
        dop.check_rates().unwrap();
        dop.alloc_data_buffer(2000).unwrap();
        for n in 0..2000i64 {
            dop.record_bytes_mut(n).copy_from_slice(&100i16.to_ne_bytes());
        }
        dop.buffer.buf_num_recs = 2000;

        let mut opts = AnaOptions::default();
        set_zcr_defaults(&mut opts);
        let out = compute_zcr(&mut dop, &mut opts).unwrap();
        let rec = out.record_bytes(0);
        assert_eq!(f32::from_ne_bytes(rec[0..4].try_into().unwrap()), 0.0);
    }
}
