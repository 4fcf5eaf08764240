//! Short-term autocorrelation analysis.

use crate::options::{default_order, AnaOptions};
use crate::timing::{ana_timing, check_data_bufs};
use crate::{
    has_committed_data, init_output_format, store_record, window_flags, write_opts_for,
    ANA_I_CHANS,
};
use sona_dsp::{
    acf as get_acf, mean_acf, mul_sig_wf, wf_inc_gain, window_by_name, window_coefficients,
    WindowFunction,
};
use sona_sdo::aucheck::{au_caps_for_processing, check_sound};
use sona_sdo::{
    AscFormat, DataDescriptor, DataFormat, DataObject, DataType, FileFormat, GenericData, Result,
    SonaError,
};
use std::any::Any;

/// default analysis parameters
pub const ACF_DEF_SIZE: f64 = 20.0;
pub const ACF_DEF_SHIFT: f64 = 5.0;
pub const ACF_DEF_CHANNEL: usize = 1;
pub const ACF_DEF_WINDOW: &str = "BLACKMAN";
pub const ACF_DEF_SUFFIX: &str = ".acf";
pub const ACF_DEF_FORMAT: &str = "SSFF";
pub const ACF_DEF_DIGITS: usize = 14;

/// option bits
pub const ACF_OPT_MEAN: u32 = 0x0001; // length-normalized coefficients
pub const ACF_OPT_NORM: u32 = 0x0002; // energy-normalized coefficients

const ACF_DFORMAT: DataFormat = DataFormat::Real64;
const ACF_PFORMAT: DataFormat = DataFormat::Real64;

/// Converted analysis parameters, attached to the output object.
#[derive(Debug)]
pub struct AcfParams {
    pub bits: u32,
    pub frame_size: i64,
    pub beg_frame_nr: i64,
    pub end_frame_nr: i64,
    pub order: usize,
    pub win_func: WindowFunction,
    pub channel: usize,
    pub accuracy: usize,
}

impl GenericData for AcfParams {
    fn ident(&self) -> &str {
        "ACF_generics"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Fills the options with the ACF analysis defaults; all other items
/// are cleared.
pub fn set_acf_defaults(opts: &mut AnaOptions) {
    *opts = AnaOptions::default();
    opts.ms_size = ACF_DEF_SIZE;
    opts.effective = true;
    opts.ms_shift = ACF_DEF_SHIFT;
    opts.channel = ACF_DEF_CHANNEL;
    opts.accuracy = ACF_DEF_DIGITS;
    opts.format = String::from(ACF_DEF_FORMAT);
    opts.win_func = String::from(ACF_DEF_WINDOW);
}

fn checked_params(
    smp_dop: &DataObject,
    opts: &mut AnaOptions,
) -> Result<(AcfParams, crate::AnaTiming)> {
    let au_caps = au_caps_for_processing(ACF_PFORMAT)? | ANA_I_CHANS;
    if opts.channel < 1 {
        opts.channel = ACF_DEF_CHANNEL;
    }
    check_sound(smp_dop, au_caps, opts.channel)?;
    let (timing, _) = ana_timing(smp_dop, opts)?;
    let order = if opts.order < 1 {
        default_order(timing.samp_freq)
    } else {
        opts.order
    };
    if order as i64 + 1 >= timing.frame_size {
        return Err(SonaError::BadSize("(create_acf)"));
    }
    let win_func = window_by_name(&opts.win_func)
        .filter(|wf| *wf != WindowFunction::None)
        .ok_or_else(|| SonaError::BadWindow(opts.win_func.clone()))?;
    let gd = AcfParams {
        bits: opts.bits,
        frame_size: timing.frame_size,
        beg_frame_nr: timing.beg_frame_nr,
        end_frame_nr: timing.end_frame_nr,
        order,
        win_func,
        channel: opts.channel,
        accuracy: opts.accuracy,
    };
    Ok((gd, timing))
}

/// Initializes a data object to hold autocorrelation data for the given
/// audio object and options. The data buffer is not allocated here.
pub fn create_acf(smp_dop: &DataObject, opts: &mut AnaOptions) -> Result<DataObject> {
    let (gd, timing) = checked_params(smp_dop, opts)?;

    let mut dop = DataObject::new();
    init_output_format(&mut dop, &opts.format);
    dop.samp_freq = timing.samp_freq;
    dop.frame_dur = timing.frame_shift;
    dop.start_record = gd.beg_frame_nr;
    dop.num_records = 0; // nothing written yet
    let mut dd = DataDescriptor::new(DataType::Acf, ACF_DFORMAT);
    dd.num_fields = gd.order + 1;
    if dop.file_format == FileFormat::Ssff {
        let entry = sona_sdo::keywords::dtype_to_entry(dd.dtype, sona_sdo::keywords::KDT_SSFF)
            .ok_or(SonaError::NoTrackName("(create_acf)"))?;
        dd.ident = Some(entry.keyword.to_string());
    } else {
        dd.ident = Some(String::from("ACF"));
        dd.sep_chars = String::from(" ");
        dd.asc_format = AscFormat::Scientific {
            accuracy: gd.accuracy,
        };
    }
    dop.descriptors.push(dd);
    dop.generic = Some(Box::new(gd));
    dop.set_record_size()?;
    dop.check_rates()?;
    dop.set_start_time();
    Ok(dop)
}

/// Runs the autocorrelation analysis, creating the output object.
pub fn compute_acf(smp_dop: &mut DataObject, opts: &mut AnaOptions) -> Result<DataObject> {
    let mut acf_dop = create_acf(smp_dop, opts)?;
    compute_acf_into(smp_dop, Some(opts), &mut acf_dop)?;
    Ok(acf_dop)
}

/// Runs the autocorrelation analysis into an existing output object.
/// With `opts` present the data buffers are verified/allocated first;
/// passing `None` skips that overhead for on-the-fly use.
pub fn compute_acf_into(
    smp_dop: &mut DataObject,
    opts: Option<&AnaOptions>,
    acf_dop: &mut DataObject,
) -> Result<()> {
    if smp_dop.is_file_bound() {
        if smp_dop.num_records <= 0 {
            return Err(SonaError::FileEmpty(smp_dop.path_string()));
        }
    } else if smp_dop.buffer.buf_num_recs <= 0 {
        return Err(SonaError::NoData(String::from("(compute_acf)")));
    }
    let (bits, frame_size, beg, end, order, win_func, channel) = {
        let gd = acf_dop
            .generic
            .as_ref()
            .and_then(|g| g.as_any().downcast_ref::<AcfParams>())
            .ok_or_else(|| SonaError::Bug(String::from("ACF generic data missing")))?;
        (
            gd.bits,
            gd.frame_size,
            gd.beg_frame_nr,
            gd.end_frame_nr,
            gd.order,
            gd.win_func,
            gd.channel,
        )
    };
    let frame_shift = acf_dop.frame_dur;
    if opts.is_some() {
        check_data_bufs(smp_dop, acf_dop, frame_size, beg, end)?;
    }
    let write_opts = write_opts_for(acf_dop);

    let wfc = if win_func > WindowFunction::Rectangle {
        window_coefficients(win_func, frame_size as usize, window_flags(frame_size, frame_shift))
    } else {
        Vec::new()
    };
    let gain_corr = if wfc.is_empty() {
        1.0
    } else {
        let g = wf_inc_gain(&wfc);
        g * g
    };
    let mut frame = vec![0.0f64; frame_size as usize];
    let mut coeffs = vec![0.0f64; order + 1];
    let mut rec = vec![0u8; acf_dop.record_size];
    for frame_nr in beg..end {
        smp_dop.get_sample_frame(frame_nr, frame_size, frame_shift, 0, 0, channel, &mut frame)?;
        if !wfc.is_empty() {
            mul_sig_wf(&mut frame, &wfc);
        }
        if bits & ACF_OPT_MEAN != 0 {
            mean_acf(&frame, &mut coeffs, order);
        } else {
            get_acf(&frame, &mut coeffs, order);
        }
        if bits & ACF_OPT_NORM != 0 {
            let r0 = coeffs[0];
            coeffs[0] = 1.0;
            if r0 <= 0.0 {
                for c in coeffs[1..].iter_mut() {
                    *c = 0.0;
                }
            } else {
                for c in coeffs[1..].iter_mut() {
                    *c /= r0;
                }
            }
        } else if !wfc.is_empty() {
            // correct for the gain of the window function
            for c in coeffs.iter_mut() {
                *c /= gain_corr;
            }
        }
        for (i, c) in coeffs.iter().enumerate() {
            rec[i * 8..i * 8 + 8].copy_from_slice(&c.to_ne_bytes());
        }
        store_record(acf_dop, frame_nr, &rec)?;
    }
    if acf_dop.is_file_bound() {
        acf_dop.flush_buffer(write_opts)?;
    }
    Ok(())
}

/// Checks whether changed options are compatible with an existing ACF
/// object and updates its parameters; incompatible with already written
/// data is an error.
pub fn verify_acf(
    acf_dop: &mut DataObject,
    smp_dop: &DataObject,
    opts: &mut AnaOptions,
) -> Result<()> {
    if acf_dop.descriptors.len() != 1
        || acf_dop.descriptors[0].dtype != DataType::Acf
        || acf_dop.descriptors[0].format != ACF_DFORMAT
    {
        return Err(SonaError::Bug(String::from("not a regular ACF object")));
    }
    let (gd, timing) = checked_params(smp_dop, opts)?;
    if acf_dop.samp_freq != timing.samp_freq || acf_dop.frame_dur != timing.frame_shift {
        let frame_rate = timing.samp_freq / timing.frame_shift as f64;
        if acf_dop.data_rate != frame_rate {
            if has_committed_data(acf_dop) {
                return Err(SonaError::WrongDataRate(acf_dop.path_string()));
            }
            acf_dop.clear_data_buffer();
        }
        acf_dop.samp_freq = timing.samp_freq;
        acf_dop.frame_dur = timing.frame_shift;
        acf_dop.data_rate = frame_rate;
        acf_dop.start_record = timing.beg_frame_nr;
        acf_dop.num_records = 0;
        acf_dop.set_start_time();
    }
    if gd.order + 1 != acf_dop.descriptors[0].num_fields {
        if has_committed_data(acf_dop) {
            return Err(SonaError::Incompatible(String::from(
                "can't change analysis order in existing data",
            )));
        }
        acf_dop.free_data_buffer(); // re-allocated in check_data_bufs
        acf_dop.descriptors[0].num_fields = gd.order + 1;
        acf_dop.set_record_size()?;
    }
    let old_channel = acf_dop
        .generic
        .as_ref()
        .and_then(|g| g.as_any().downcast_ref::<AcfParams>())
        .map(|g| g.channel);
    if old_channel != Some(gd.channel) {
        acf_dop.clear_data_buffer(); // contents invalid
    }
    acf_dop.generic = Some(Box::new(gd));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sona_sdo::DataCoding;
    use std::f64::consts::PI;

    fn cosine_audio(num: usize, rate: f64, period: f64) -> DataObject {
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
        for n in 0..num {
            let v = (2.0 * PI * n as f64 / period).cos();
            let v = (v * 16384.0).round() as i16;
            dop.record_bytes_mut(n as i64).copy_from_slice(&v.to_ne_bytes());
        }
        dop.buffer.buf_num_recs = num as i64;
        dop
    }

    #[test]
    fn defaults() {
        let mut opts = AnaOptions::default();
        set_acf_defaults(&mut opts);
        assert_eq!(opts.ms_size, 20.0);
        assert!(opts.effective);
        assert_eq!(opts.win_func, "BLACKMAN");
        assert_eq!(opts.format, "SSFF");
    }

    #[test]
    fn energy_normalized_coefficients() {
        let mut smp = cosine_audio(4096, 16000.0, 8.0);
        let mut opts = AnaOptions::default();
        set_acf_defaults(&mut opts);
        opts.order = 8;
        opts.win_func = String::from("RECTANGLE");
        opts.effective = false;
        opts.bits = ACF_OPT_NORM;
        let out = compute_acf(&mut smp, &mut opts).unwrap();
        assert!(out.buffer.buf_num_recs > 0);
        let rec = out.record_bytes(0);
        let r0 = f64::from_ne_bytes(rec[0..8].try_into().unwrap());
        let r8 = f64::from_ne_bytes(rec[64..72].try_into().unwrap());
        assert_eq!(r0, 1.0);
        // at lag 8 the cosine has full period correlation
        assert!(r8 > 0.9, "r8 = {r8}");
        assert_eq!(out.descriptors[0].num_fields, 9);
        assert_eq!(out.generic.as_ref().unwrap().ident(), "ACF_generics");
    }

    #[test]
    fn order_must_fit_frame() {
        let smp = cosine_audio(4096, 16000.0, 8.0);
        let mut opts = AnaOptions::default();
        set_acf_defaults(&mut opts);
        opts.ms_size = 1.0; // 16 samples
        opts.effective = false;
        opts.order = 20;
        assert!(create_acf(&smp, &mut opts).is_err());
    }
}
