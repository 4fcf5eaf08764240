//! Analysis of the Root Mean Square amplitude course of a signal.

use crate::options::AnaOptions;
use crate::timing::{ana_timing, check_data_bufs};
use crate::{
    has_committed_data, init_output_format, store_record, window_flags, write_opts_for,
    ANA_I_CHANS,
};
use sona_dsp::{
    lin_to_db, mul_sig_wf, rms as get_rms, wf_inc_gain, window_by_name, window_coefficients,
    WindowFunction, RMS_MIN_AMP, RMS_MIN_DB,
};
use sona_sdo::aucheck::{au_caps_for_processing, check_sound};
use sona_sdo::keywords::{dtype_to_entry, KDT_SSFF, KDT_XASSP};
use sona_sdo::{
    AscFormat, DataDescriptor, DataFormat, DataObject, DataType, FileFormat, GenericData, Result,
    SonaError,
};
use std::any::Any;

/// default analysis parameters
pub const RMS_DEF_SIZE: f64 = 20.0;
pub const RMS_DEF_SHIFT: f64 = 5.0;
pub const RMS_DEF_CHANNEL: usize = 0; // multi-channel output
pub const RMS_DEF_WINDOW: &str = "HAMMING";
pub const RMS_DEF_SUFFIX: &str = ".rms";
pub const RMS_DEF_FORMAT: &str = "SSFF";
pub const RMS_DEF_DIGITS: usize = 2;

/// option bits
pub const RMS_OPT_LINEAR: u32 = 0x0001; // linear amplitude instead of dB

const RMS_DFORMAT: DataFormat = DataFormat::Real32;
const RMS_PFORMAT: DataFormat = DataFormat::Real64;

/// Converted analysis parameters, attached to the output object.
#[derive(Debug)]
pub struct RmsParams {
    pub bits: u32,
    pub frame_size: i64,
    pub beg_frame_nr: i64,
    pub end_frame_nr: i64,
    pub win_func: WindowFunction,
    /// 0 for multi-channel output, otherwise the selected channel
    pub channel: usize,
    pub precision: usize,
}

impl GenericData for RmsParams {
    fn ident(&self) -> &str {
        "RMS_generics"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Fills the options with the RMS analysis defaults.
pub fn set_rms_defaults(opts: &mut AnaOptions) {
    *opts = AnaOptions::default();
    opts.ms_size = RMS_DEF_SIZE;
    opts.effective = true;
    opts.ms_shift = RMS_DEF_SHIFT;
    opts.channel = RMS_DEF_CHANNEL;
    opts.precision = RMS_DEF_DIGITS;
    opts.format = String::from(RMS_DEF_FORMAT);
    opts.win_func = String::from(RMS_DEF_WINDOW);
}

fn checked_params(
    smp_dop: &DataObject,
    opts: &mut AnaOptions,
) -> Result<(RmsParams, crate::AnaTiming)> {
    let au_caps = au_caps_for_processing(RMS_PFORMAT)? | ANA_I_CHANS;
    check_sound(smp_dop, au_caps, opts.channel)?;
    let (timing, _) = ana_timing(smp_dop, opts)?;
    let win_func = window_by_name(&opts.win_func)
        .filter(|wf| *wf != WindowFunction::None)
        .ok_or_else(|| SonaError::BadWindow(opts.win_func.clone()))?;
    let gd = RmsParams {
        bits: opts.bits,
        frame_size: timing.frame_size,
        beg_frame_nr: timing.beg_frame_nr,
        end_frame_nr: timing.end_frame_nr,
        win_func,
        channel: opts.channel,
        precision: opts.precision,
    };
    Ok((gd, timing))
}

/// Initializes a data object to hold RMS amplitude data; one output
/// field per channel unless a single channel is selected.
pub fn create_rms(smp_dop: &DataObject, opts: &mut AnaOptions) -> Result<DataObject> {
    let (gd, timing) = checked_params(smp_dop, opts)?;
    let linear = gd.bits & RMS_OPT_LINEAR != 0;

    let mut dop = DataObject::new();
    init_output_format(&mut dop, &opts.format);
    dop.samp_freq = timing.samp_freq;
    dop.frame_dur = timing.frame_shift;
    dop.start_record = gd.beg_frame_nr;
    dop.num_records = 0;
    let mut dd = DataDescriptor::new(DataType::Rms, RMS_DFORMAT);
    dd.num_fields = if gd.channel < 1 {
        smp_dop.descriptors[0].num_fields // possibly multi-channel
    } else {
        1 // only the selected channel
    };
    match dop.file_format {
        FileFormat::Ssff => {
            let entry = dtype_to_entry(dd.dtype, KDT_SSFF)
                .ok_or(SonaError::NoTrackName("(create_rms)"))?;
            dd.ident = Some(entry.keyword.to_string());
            if !linear {
                dd.unit = entry.unit.to_string();
                dd.factor = entry.factor.to_string();
            }
        }
        FileFormat::Xassp => {
            let entry = dtype_to_entry(dd.dtype, KDT_XASSP)
                .ok_or(SonaError::NoTrackName("(create_rms)"))?;
            dd.ident = Some(entry.keyword.to_string());
            if !linear {
                dd.unit = entry.unit.to_string();
            }
            dd.sep_chars = String::from(" ");
            dd.asc_format = AscFormat::Fixed {
                precision: gd.precision,
            };
        }
        _ => {
            dd.ident = Some(String::from("RMS"));
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

/// Runs the RMS analysis, creating the output object.
pub fn compute_rms(smp_dop: &mut DataObject, opts: &mut AnaOptions) -> Result<DataObject> {
    let mut rms_dop = create_rms(smp_dop, opts)?;
    compute_rms_into(smp_dop, Some(opts), &mut rms_dop)?;
    Ok(rms_dop)
}

/// Runs the RMS analysis into an existing output object.
pub fn compute_rms_into(
    smp_dop: &mut DataObject,
    opts: Option<&AnaOptions>,
    rms_dop: &mut DataObject,
) -> Result<()> {
    if smp_dop.is_file_bound() {
        if smp_dop.num_records <= 0 {
            return Err(SonaError::FileEmpty(smp_dop.path_string()));
        }
    } else if smp_dop.buffer.buf_num_recs <= 0 {
        return Err(SonaError::NoData(String::from("(compute_rms)")));
    }
    let (bits, frame_size, beg, end, win_func, channel) = {
        let gd = rms_dop
            .generic
            .as_ref()
            .and_then(|g| g.as_any().downcast_ref::<RmsParams>())
            .ok_or_else(|| SonaError::Bug(String::from("RMS generic data missing")))?;
        (
            gd.bits,
            gd.frame_size,
            gd.beg_frame_nr,
            gd.end_frame_nr,
            gd.win_func,
            gd.channel,
        )
    };
    let frame_shift = rms_dop.frame_dur;
    if opts.is_some() {
        check_data_bufs(smp_dop, rms_dop, frame_size, beg, end)?;
    }
    let write_opts = write_opts_for(rms_dop);

    let wfc = if win_func > WindowFunction::Rectangle {
        window_coefficients(win_func, frame_size as usize, window_flags(frame_size, frame_shift))
    } else {
        Vec::new()
    };
    // the incoherent gain corrects the energy estimate of the window
    let wf_gain = if wfc.is_empty() { 1.0 } else { wf_inc_gain(&wfc) };
    let num_chans = rms_dop.descriptors[0].num_fields;
    let mut frame = vec![0.0f64; frame_size as usize];
    let mut rec = vec![0u8; rms_dop.record_size];
    log::debug!(
        "RMS analysis: {frame_size} samples window, {frame_shift} shift, frames {beg}..{end}"
    );
    for frame_nr in beg..end {
        for cn in 0..num_chans {
            let want = if channel > 0 { channel } else { cn + 1 };
            smp_dop.get_sample_frame(frame_nr, frame_size, frame_shift, 0, 0, want, &mut frame)?;
            if !wfc.is_empty() {
                mul_sig_wf(&mut frame, &wfc);
            }
            let mut amp = get_rms(&frame);
            if !wfc.is_empty() {
                amp /= wf_gain;
            }
            if bits & RMS_OPT_LINEAR == 0 {
                // convert to dB with a bottom clip
                amp = if amp <= RMS_MIN_AMP {
                    RMS_MIN_DB
                } else {
                    lin_to_db(amp)
                };
            }
            let val = amp as f32;
            rec[cn * 4..cn * 4 + 4].copy_from_slice(&val.to_ne_bytes());
        }
        store_record(rms_dop, frame_nr, &rec)?;
    }
    if rms_dop.is_file_bound() {
        rms_dop.flush_buffer(write_opts)?;
    }
    Ok(())
}

/// Checks whether changed options are compatible with an existing RMS
/// object and updates its parameters.
pub fn verify_rms(
    rms_dop: &mut DataObject,
    smp_dop: &DataObject,
    opts: &mut AnaOptions,
) -> Result<()> {
    if rms_dop.descriptors.len() != 1
        || rms_dop.descriptors[0].dtype != DataType::Rms
        || rms_dop.descriptors[0].format != RMS_DFORMAT
    {
        return Err(SonaError::Bug(String::from("not a regular RMS object")));
    }
    let (gd, timing) = checked_params(smp_dop, opts)?;
    if rms_dop.samp_freq != timing.samp_freq || rms_dop.frame_dur != timing.frame_shift {
        let frame_rate = timing.samp_freq / timing.frame_shift as f64;
        if rms_dop.data_rate != frame_rate {
            if has_committed_data(rms_dop) {
                return Err(SonaError::WrongDataRate(rms_dop.path_string()));
            }
            rms_dop.clear_data_buffer(); // contents invalid, size may do
        }
        rms_dop.samp_freq = timing.samp_freq;
        rms_dop.frame_dur = timing.frame_shift;
        rms_dop.data_rate = frame_rate;
        rms_dop.start_record = timing.beg_frame_nr;
        rms_dop.num_records = 0;
        rms_dop.set_start_time();
    }
    let want_fields = if gd.channel < 1 {
        smp_dop.descriptors[0].num_fields
    } else {
        1
    };
    let old_channel = rms_dop
        .generic
        .as_ref()
        .and_then(|g| g.as_any().downcast_ref::<RmsParams>())
        .map(|g| g.channel);
    if rms_dop.descriptors[0].num_fields != want_fields || old_channel != Some(gd.channel) {
        if has_committed_data(rms_dop) {
            return Err(SonaError::Incompatible(String::from(
                "can't change channels in existing data",
            )));
        }
        if rms_dop.descriptors[0].num_fields != want_fields {
            rms_dop.free_data_buffer(); // re-allocated in check_data_bufs
            rms_dop.descriptors[0].num_fields = want_fields;
            rms_dop.set_record_size()?;
        } else {
            rms_dop.clear_data_buffer();
        }
    }
    if timing.beg_frame_nr < rms_dop.start_record {
        if has_committed_data(rms_dop) {
            return Err(SonaError::Incompatible(String::from(
                "can't change start time in existing data",
            )));
        }
        rms_dop.start_record = timing.beg_frame_nr;
        rms_dop.num_records = 0;
        rms_dop.set_start_time();
    }
    rms_dop.generic = Some(Box::new(gd));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sona_sdo::DataCoding;
    use std::f64::consts::PI;

    fn sine_audio(num: usize, rate: f64, freq: f64, amp: f64) -> DataObject {
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
            let v = (amp * (2.0 * PI * freq * n as f64 / rate).sin()).round() as i16;
            dop.record_bytes_mut(n as i64).copy_from_slice(&v.to_ne_bytes());
        }
        dop.buffer.buf_num_recs = num as i64;
        dop
    }

    #[test]
    fn full_scale_sine_level() {
        // amplitude-1 sine at full scale: 20*log10(32767/sqrt(2)) dB
        let mut smp = sine_audio(16000, 16000.0, 1000.0, 32767.0);
        let mut opts = AnaOptions::default();
        set_rms_defaults(&mut opts);
        opts.effective = false;
        let out = compute_rms(&mut smp, &mut opts).unwrap();
        assert_eq!(out.frame_dur, 80);
        assert_eq!(out.buffer.buf_num_recs, 197);
        let expect = 20.0 * (32767.0 / 2.0f64.sqrt()).log10();
        // skip the edge frames
        for i in 5..190 {
            let rec = out.record_bytes(i);
            let db = f32::from_ne_bytes(rec[0..4].try_into().unwrap()) as f64;
            assert!((db - expect).abs() < 0.05, "frame {i}: {db} vs {expect}");
        }
    }

    #[test]
    fn silence_clips_to_floor() {
        let mut smp = sine_audio(4000, 16000.0, 1000.0, 0.0);
        let mut opts = AnaOptions::default();
        set_rms_defaults(&mut opts);
        let out = compute_rms(&mut smp, &mut opts).unwrap();
        let rec = out.record_bytes(0);
        let db = f32::from_ne_bytes(rec[0..4].try_into().unwrap());
        assert_eq!(db, RMS_MIN_DB as f32);
    }

    #[test]
    fn linear_output_option() {
        let mut smp = sine_audio(4000, 16000.0, 1000.0, 1000.0);
        let mut opts = AnaOptions::default();
        set_rms_defaults(&mut opts);
        opts.bits = RMS_OPT_LINEAR;
        opts.effective = false;
        opts.win_func = String::from("RECTANGLE");
        let out = compute_rms(&mut smp, &mut opts).unwrap();
        let rec = out.record_bytes(5);
        let lin = f32::from_ne_bytes(rec[0..4].try_into().unwrap()) as f64;
        assert!((lin - 1000.0 / 2.0f64.sqrt()).abs() < 10.0, "lin = {lin}");
    }

    #[test]
    fn verify_detects_rate_change() {
        let mut smp = sine_audio(4000, 16000.0, 1000.0, 1000.0);
        let mut opts = AnaOptions::default();
        set_rms_defaults(&mut opts);
        let mut out = compute_rms(&mut smp, &mut opts).unwrap();
        // memory output: a shift change resizes/clears, no error
        opts.ms_shift = 10.0;
        verify_rms(&mut out, &smp, &mut opts).unwrap();
        assert_eq!(out.frame_dur, 160);
    }
}
