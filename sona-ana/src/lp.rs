//! Linear prediction analysis: Durbin recursion on the pre-emphasized,
//! windowed signal, with the parameter set selectable as LP filter
//! coefficients, reflection coefficients, the area function or log
//! area ratios. Every output record carries three tracks: RMS (dB),
//! gain (dB) and the coefficients.

use crate::options::{default_order, AnaOptions};
use crate::timing::{ana_timing, check_data_bufs};
use crate::{
    has_committed_data, init_output_format, store_record, window_flags, write_opts_for,
    ANA_I_CHANS,
};
use sona_dsp::{
    durbin, lin_to_db, mul_sig_wf, pre_emphasis, rfc_to_arf, rfc_to_lar, rms as get_rms,
    sqr_to_db, wf_coh_gain, window_by_name, window_coefficients, LpcError, WindowFunction,
    GAIN_MIN_DB, GAIN_MIN_SQR, RMS_MIN_AMP, RMS_MIN_DB,
};
use sona_dsp::acf as get_acf;
use sona_sdo::aucheck::{au_caps_for_processing, check_sound};
use sona_sdo::keywords::{dtype_to_entry, KDT_SSFF};
use sona_sdo::time::frm_nr_to_time;
use sona_sdo::{
    AscFormat, DataDescriptor, DataFormat, DataObject, DataType, FileFormat, GenericData, Result,
    SonaError,
};
use std::any::Any;

/// default analysis parameters
pub const LP_DEF_SHIFT: f64 = 5.0;
pub const LP_DEF_SIZE: f64 = 20.0;
pub const LP_DEF_PREEMPH: f64 = -0.95;
pub const LP_DEF_CHANNEL: usize = 1;
pub const LP_DEF_WINDOW: &str = "BLACKMAN";
pub const LP_DEF_TYPE: &str = "RFC";
pub const LP_DEF_FORMAT: &str = "SSFF";
pub const LP_DEF_DIGITS_A: usize = 14;
pub const LP_DEF_DIGITS_P: usize = 2;

const LP_RFORMAT: DataFormat = DataFormat::Real32; // RMS & gain (dB)
const LP_CFORMAT: DataFormat = DataFormat::Real64; // coefficients
const LP_PFORMAT: DataFormat = DataFormat::Real64;

/// The selectable parameter codings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpType {
    Arf,
    Lar,
    Lpc,
    Rfc,
}

impl LpType {
    pub fn from_name(name: &str) -> Option<LpType> {
        // two significant characters, as in the option parser
        let upper = name.trim().to_ascii_uppercase();
        match upper.get(..2) {
            Some("AR") => Some(LpType::Arf),
            Some("LA") => Some(LpType::Lar),
            Some("LP") => Some(LpType::Lpc),
            Some("RF") => Some(LpType::Rfc),
            _ => None,
        }
    }

    pub fn data_type(self) -> DataType {
        match self {
            LpType::Arf => DataType::Arf,
            LpType::Lar => DataType::Lar,
            LpType::Lpc => DataType::Lpc,
            LpType::Rfc => DataType::Rfc,
        }
    }

    pub fn ident(self) -> &'static str {
        match self {
            LpType::Arf => "ARF",
            LpType::Lar => "LAR",
            LpType::Lpc => "LPC",
            LpType::Rfc => "RFC",
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            LpType::Arf => ".arf",
            LpType::Lar => ".lar",
            LpType::Lpc => ".lpc",
            LpType::Rfc => ".rfc",
        }
    }

    /// Number of coefficient fields for prediction order `m`.
    pub fn num_fields(self, m: usize) -> usize {
        match self {
            LpType::Lpc | LpType::Arf => m + 1,
            LpType::Rfc | LpType::Lar => m,
        }
    }
}

/// Converted analysis parameters, attached to the output object.
#[derive(Debug)]
pub struct LpParams {
    pub frame_size: i64,
    pub beg_frame_nr: i64,
    pub end_frame_nr: i64,
    pub pre_emph: f64,
    pub order: usize,
    pub lp_type: LpType,
    pub win_func: WindowFunction,
    pub channel: usize,
    pub accuracy: usize,
    pub precision: usize,
}

impl GenericData for LpParams {
    fn ident(&self) -> &str {
        "LP_generics"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Fills the options with the LP analysis defaults.
pub fn set_lp_defaults(opts: &mut AnaOptions) {
    *opts = AnaOptions::default();
    opts.ms_size = LP_DEF_SIZE;
    opts.effective = true;
    opts.ms_shift = LP_DEF_SHIFT;
    opts.pre_emph = LP_DEF_PREEMPH;
    opts.channel = LP_DEF_CHANNEL;
    opts.accuracy = LP_DEF_DIGITS_A;
    opts.precision = LP_DEF_DIGITS_P;
    opts.dtype = String::from(LP_DEF_TYPE);
    opts.format = String::from(LP_DEF_FORMAT);
    opts.win_func = String::from(LP_DEF_WINDOW);
}

fn checked_params(
    smp_dop: &DataObject,
    opts: &mut AnaOptions,
) -> Result<(LpParams, crate::AnaTiming)> {
    let au_caps = au_caps_for_processing(LP_PFORMAT)? | ANA_I_CHANS;
    if opts.channel < 1 {
        opts.channel = LP_DEF_CHANNEL;
    }
    check_sound(smp_dop, au_caps, opts.channel)?;
    let (timing, _) = ana_timing(smp_dop, opts)?;
    if opts.pre_emph < -1.0 || opts.pre_emph > 1.0 {
        return Err(SonaError::BadEmphasis(opts.pre_emph));
    }
    let order = if opts.order < 1 {
        default_order(timing.samp_freq)
    } else {
        opts.order
    };
    if order as i64 + 1 >= timing.frame_size {
        return Err(SonaError::BadSize("(create_lp)"));
    }
    let lp_type = LpType::from_name(&opts.dtype)
        .ok_or_else(|| SonaError::WrongDataType(opts.dtype.clone()))?;
    let win_func = window_by_name(&opts.win_func)
        .filter(|wf| *wf != WindowFunction::None)
        .ok_or_else(|| SonaError::BadWindow(opts.win_func.clone()))?;
    let gd = LpParams {
        frame_size: timing.frame_size,
        beg_frame_nr: timing.beg_frame_nr,
        end_frame_nr: timing.end_frame_nr,
        pre_emph: opts.pre_emph,
        order,
        lp_type,
        win_func,
        channel: opts.channel,
        accuracy: opts.accuracy,
        precision: opts.precision,
    };
    Ok((gd, timing))
}

/// Initializes a data object to hold linear prediction data: RMS and
/// gain tracks plus the coefficient track.
pub fn create_lp(smp_dop: &DataObject, opts: &mut AnaOptions) -> Result<DataObject> {
    let (gd, timing) = checked_params(smp_dop, opts)?;

    let mut dop = DataObject::new();
    init_output_format(&mut dop, &opts.format);
    dop.samp_freq = timing.samp_freq;
    dop.frame_dur = timing.frame_shift;
    dop.start_record = gd.beg_frame_nr;
    dop.num_records = 0;
    let ssff = dop.file_format == FileFormat::Ssff;

    let mut dd = DataDescriptor::new(DataType::Rms, LP_RFORMAT);
    dd.num_fields = 1;
    if ssff {
        let entry = dtype_to_entry(dd.dtype, KDT_SSFF)
            .ok_or(SonaError::NoTrackName("(create_lp)"))?;
        dd.ident = Some(entry.keyword.to_string());
        dd.unit = entry.unit.to_string();
    } else {
        dd.ident = Some(String::from("RMS"));
        dd.unit = String::from("dB");
        dd.sep_chars = String::from(" ");
        dd.asc_format = AscFormat::Fixed {
            precision: gd.precision,
        };
    }
    dop.descriptors.push(dd);

    let mut dd = DataDescriptor::new(DataType::Gain, LP_RFORMAT);
    dd.num_fields = 1;
    if ssff {
        let entry = dtype_to_entry(dd.dtype, KDT_SSFF)
            .ok_or(SonaError::NoTrackName("(create_lp)"))?;
        dd.ident = Some(entry.keyword.to_string());
        dd.unit = entry.unit.to_string();
    } else {
        dd.ident = Some(String::from("GAIN"));
        dd.unit = String::from("dB");
        dd.sep_chars = String::from(" ");
        dd.asc_format = AscFormat::Fixed {
            precision: gd.precision,
        };
    }
    dop.descriptors.push(dd);

    let mut dd = DataDescriptor::new(gd.lp_type.data_type(), LP_CFORMAT);
    dd.num_fields = gd.lp_type.num_fields(gd.order);
    if ssff {
        let entry = dtype_to_entry(dd.dtype, KDT_SSFF)
            .ok_or(SonaError::NoTrackName("(create_lp)"))?;
        dd.ident = Some(entry.keyword.to_string());
    } else {
        dd.ident = Some(gd.lp_type.ident().to_string());
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

/// Runs the LP analysis, creating the output object.
pub fn compute_lp(smp_dop: &mut DataObject, opts: &mut AnaOptions) -> Result<DataObject> {
    let mut lp_dop = create_lp(smp_dop, opts)?;
    compute_lp_into(smp_dop, Some(opts), &mut lp_dop)?;
    Ok(lp_dop)
}

/// Runs the LP analysis into an existing output object.
///
/// An unstable frame is not fatal: the identity filter is written for
/// it and a warning is logged.
pub fn compute_lp_into(
    smp_dop: &mut DataObject,
    opts: Option<&AnaOptions>,
    lp_dop: &mut DataObject,
) -> Result<()> {
    if smp_dop.is_file_bound() {
        if smp_dop.num_records <= 0 {
            return Err(SonaError::FileEmpty(smp_dop.path_string()));
        }
    } else if smp_dop.buffer.buf_num_recs <= 0 {
        return Err(SonaError::NoData(String::from("(compute_lp)")));
    }
    let (frame_size, beg, end, pre_emph, order, lp_type, win_func, channel) = {
        let gd = lp_dop
            .generic
            .as_ref()
            .and_then(|g| g.as_any().downcast_ref::<LpParams>())
            .ok_or_else(|| SonaError::Bug(String::from("LP generic data missing")))?;
        (
            gd.frame_size,
            gd.beg_frame_nr,
            gd.end_frame_nr,
            gd.pre_emph,
            gd.order,
            gd.lp_type,
            gd.win_func,
            gd.channel,
        )
    };
    let frame_shift = lp_dop.frame_dur;
    let head = 1i64; // for the pre-emphasis tap
    let tail = 0i64;
    if opts.is_some() {
        check_data_bufs(smp_dop, lp_dop, head + frame_size + tail, beg, end)?;
    }
    let write_opts = write_opts_for(lp_dop);

    let wfc = if win_func > WindowFunction::Rectangle {
        window_coefficients(win_func, frame_size as usize, window_flags(frame_size, frame_shift))
    } else {
        Vec::new()
    };
    let wf_gain = if wfc.is_empty() { 1.0 } else { wf_coh_gain(&wfc) };
    let samp_freq = smp_dop.samp_freq;
    let num_coef = lp_dop.descriptors[2].num_fields;
    let mut frame = vec![0.0f64; (head + frame_size + tail) as usize];
    let mut rms_buf = vec![0.0f64; frame_size as usize];
    let mut acf = vec![0.0f64; order + 1];
    let mut lpc = vec![0.0f64; order + 1];
    let mut rfc = vec![0.0f64; order];
    let mut coef = vec![0.0f64; num_coef];
    let mut rec = vec![0u8; lp_dop.record_size];
    for frame_nr in beg..end {
        smp_dop.get_sample_frame(
            frame_nr, frame_size, frame_shift, head, tail, channel, &mut frame,
        )?;
        rms_buf.copy_from_slice(&frame[head as usize..]);
        if !wfc.is_empty() {
            mul_sig_wf(&mut rms_buf, &wfc);
        }
        let mut rms_amp = get_rms(&rms_buf) / wf_gain;
        rms_amp = if rms_amp <= RMS_MIN_AMP {
            RMS_MIN_DB
        } else {
            lin_to_db(rms_amp)
        };

        let tap = frame[0];
        let work = &mut frame[head as usize..];
        pre_emphasis(work, pre_emph, tap);
        if !wfc.is_empty() {
            mul_sig_wf(work, &wfc);
        }
        get_acf(work, &mut acf, order);
        let mut gain = match durbin(&acf, &mut lpc, Some(&mut rfc), order) {
            Ok(sqerr) => {
                // mean squared error, corrected for the window gain
                (sqerr / frame_size as f64) / (wf_gain * wf_gain)
            }
            Err(LpcError::Rounding) => {
                log::warn!(
                    "rounding error in LP recursion at T = {:.4}",
                    frm_nr_to_time(frame_nr, samp_freq, frame_shift)
                );
                0.0
            }
            Err(e) => return Err(SonaError::Bug(e.to_string())),
        };
        gain = if gain <= GAIN_MIN_SQR {
            GAIN_MIN_DB
        } else {
            sqr_to_db(gain)
        };

        let coef_src: &[f64] = match lp_type {
            LpType::Lpc => &lpc,
            LpType::Rfc => &rfc,
            LpType::Arf => {
                if rfc_to_arf(&rfc, &mut coef, order).is_err() {
                    log::warn!(
                        "unstable filter at T = {:.4}",
                        frm_nr_to_time(frame_nr, samp_freq, frame_shift)
                    );
                    coef.iter_mut().for_each(|c| *c = 0.0);
                    coef[order] = 1.0;
                }
                &coef
            }
            LpType::Lar => {
                if rfc_to_lar(&rfc, &mut coef, order).is_err() {
                    log::warn!(
                        "unstable filter at T = {:.4}",
                        frm_nr_to_time(frame_nr, samp_freq, frame_shift)
                    );
                    coef.iter_mut().for_each(|c| *c = 0.0);
                }
                &coef
            }
        };

        rec[0..4].copy_from_slice(&(rms_amp as f32).to_ne_bytes());
        rec[4..8].copy_from_slice(&(gain as f32).to_ne_bytes());
        for (i, c) in coef_src.iter().enumerate() {
            rec[8 + i * 8..16 + i * 8].copy_from_slice(&c.to_ne_bytes());
        }
        store_record(lp_dop, frame_nr, &rec)?;
    }
    if lp_dop.is_file_bound() {
        lp_dop.flush_buffer(write_opts)?;
    }
    Ok(())
}

/// Checks whether changed options are compatible with an existing LP
/// object and updates its parameters.
pub fn verify_lp(
    lp_dop: &mut DataObject,
    smp_dop: &DataObject,
    opts: &mut AnaOptions,
) -> Result<()> {
    if lp_dop.descriptors.len() != 3
        || lp_dop.descriptors[0].dtype != DataType::Rms
        || lp_dop.descriptors[1].dtype != DataType::Gain
    {
        return Err(SonaError::Bug(String::from("not a regular LP object")));
    }
    let (gd, timing) = checked_params(smp_dop, opts)?;
    if lp_dop.samp_freq != timing.samp_freq || lp_dop.frame_dur != timing.frame_shift {
        let frame_rate = timing.samp_freq / timing.frame_shift as f64;
        if lp_dop.data_rate != frame_rate {
            if has_committed_data(lp_dop) {
                return Err(SonaError::WrongDataRate(lp_dop.path_string()));
            }
            lp_dop.clear_data_buffer();
        }
        lp_dop.samp_freq = timing.samp_freq;
        lp_dop.frame_dur = timing.frame_shift;
        lp_dop.data_rate = frame_rate;
        lp_dop.start_record = timing.beg_frame_nr;
        lp_dop.num_records = 0;
        lp_dop.set_start_time();
    }
    let want_type = gd.lp_type.data_type();
    let want_fields = gd.lp_type.num_fields(gd.order);
    if lp_dop.descriptors[2].dtype != want_type
        || lp_dop.descriptors[2].num_fields != want_fields
    {
        if has_committed_data(lp_dop) {
            return Err(SonaError::Incompatible(String::from(
                "can't change parameter type or order in existing data",
            )));
        }
        lp_dop.free_data_buffer();
        lp_dop.descriptors[2].dtype = want_type;
        lp_dop.descriptors[2].num_fields = want_fields;
        lp_dop.set_record_size()?;
    }
    lp_dop.generic = Some(Box::new(gd));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sona_sdo::DataCoding;
    use std::f64::consts::PI;

    fn speechish_audio(num: usize, rate: f64) -> DataObject {
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
            let t = n as f64 / rate;
            let v = 8000.0 * (2.0 * PI * 700.0 * t).sin()
                + 4000.0 * (2.0 * PI * 1220.0 * t).sin()
                + 2000.0 * (2.0 * PI * 2600.0 * t).sin();
            let v = v.round() as i16;
            dop.record_bytes_mut(n as i64).copy_from_slice(&v.to_ne_bytes());
        }
        dop.buffer.buf_num_recs = num as i64;
        dop
    }

    #[test]
    fn type_names() {
        assert_eq!(LpType::from_name("RFC"), Some(LpType::Rfc));
        assert_eq!(LpType::from_name("lpc"), Some(LpType::Lpc));
        assert_eq!(LpType::from_name("ARea"), Some(LpType::Arf));
        assert_eq!(LpType::from_name("X"), None);
        assert_eq!(LpType::Rfc.num_fields(18), 18);
        assert_eq!(LpType::Lpc.num_fields(18), 19);
    }

    #[test]
    fn record_layout_has_three_tracks() {
        let smp = speechish_audio(16000, 16000.0);
        let mut opts = AnaOptions::default();
        set_lp_defaults(&mut opts);
        opts.order = 18;
        let dop = create_lp(&smp, &mut opts).unwrap();
        assert_eq!(dop.descriptors.len(), 3);
        assert_eq!(dop.descriptors[0].offset, 0);
        assert_eq!(dop.descriptors[1].offset, 4);
        assert_eq!(dop.descriptors[2].offset, 8);
        assert_eq!(dop.record_size, 8 + 18 * 8);
    }

    #[test]
    fn rfc_frames_are_stable() {
        let mut smp = speechish_audio(16000, 16000.0);
        let mut opts = AnaOptions::default();
        set_lp_defaults(&mut opts);
        opts.order = 18;
        let out = compute_lp(&mut smp, &mut opts).unwrap();
        assert!(out.buffer.buf_num_recs > 100);
        let rec = out.record_bytes(out.buffer.buf_num_recs / 2);
        for i in 0..18 {
            let k = f64::from_ne_bytes(rec[8 + i * 8..16 + i * 8].try_into().unwrap());
            assert!(k.abs() < 1.0, "k[{i}] = {k}");
        }
        let rms = f32::from_ne_bytes(rec[0..4].try_into().unwrap());
        assert!(rms > 40.0, "rms = {rms} dB");
    }

    #[test]
    fn zero_signal_writes_identity_filter() {
        let mut dop = DataObject::new();
        dop.samp_freq = 16000.0;
        dop.frame_dur = 1;
        let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Int16);
        dd.coding = DataCoding::Linear;
        dd.num_fields = 1;
        dop.descriptors.push(dd);
        dop.set_record_size().unwrap();
        dop.check_rates().unwrap();
        dop.alloc_data_buffer(4000).unwrap();
        dop.buffer.buf_num_recs = 4000;

        let mut opts = AnaOptions::default();
        set_lp_defaults(&mut opts);
        opts.order = 10;
        opts.dtype = String::from("LPC");
        let out = compute_lp(&mut dop, &mut opts).unwrap();
        let rec = out.record_bytes(0);
        let gain = f32::from_ne_bytes(rec[4..8].try_into().unwrap());
        assert_eq!(gain, GAIN_MIN_DB as f32);
        let a0 = f64::from_ne_bytes(rec[8..16].try_into().unwrap());
        assert_eq!(a0, 1.0);
        for i in 1..11 {
            let a = f64::from_ne_bytes(rec[8 + i * 8..16 + i * 8].try_into().unwrap());
            assert_eq!(a, 0.0);
        }
    }
}
