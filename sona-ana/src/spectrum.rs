//! Short-term spectral analysis: DFT magnitude/power/phase spectra,
//! LP-smoothed and cepstrally smoothed spectra and the cepstrum itself.
//!
//! The FFT length is the smallest power of two covering both the frame
//! and the requested spectral resolution.

use crate::options::{default_order, AnaOptions};
use crate::timing::{ana_timing, check_data_bufs};
use crate::{init_output_format, store_record, window_flags, write_opts_for, ANA_I_CHANS};
use sona_dsp::acf as get_acf;
use sona_dsp::{
    durbin, mul_sig_wf, pre_emphasis, rfft, rfft_lin_amp, rfft_lin_pow, rfft_phase,
    rfft_power_db, sqr_to_db, wf_coh_gain, window_by_name, window_coefficients, FftDirection,
    WindowFunction, GAIN_MIN_SQR, MIN_NFFT, TINY_P_DB, TINY_SQR,
};
use sona_sdo::aucheck::{au_caps_for_processing, check_sound};
use sona_sdo::keywords::{dtype_to_entry, KDT_SSFF};
use sona_sdo::{
    AscFormat, DataDescriptor, DataFormat, DataObject, DataType, FileFormat, GenericData, Result,
    SonaError,
};
use std::any::Any;

/// default analysis parameters
pub const SPECT_DEF_SHIFT: f64 = 5.0;
/// worst spectral resolution in Hz
pub const SPECT_DEF_RES: f64 = 40.0;
pub const SPECT_DEF_CHANNEL: usize = 1;
pub const SPECT_DEF_WINDOW: &str = "BLACKMAN";
pub const SPECT_DEF_FORMAT: &str = "SSFF";
pub const SPECT_DEF_DIGITS_A: usize = 8;
pub const SPECT_DEF_DIGITS_P: usize = 2;

pub const LPS_DEF_SIZE: f64 = 20.0;
pub const LPS_DEF_PREEMPH: f64 = -0.95;

/// default number of cepstral lags: sample rate divided by 800
pub fn css_default_lags(samp_freq: f64) -> usize {
    (samp_freq / 800.0).floor() as usize
}

/// option bits
pub const SPECT_OPT_LIN_AMP: u32 = 0x0001; // linear amplitude (default dB)
pub const SPECT_OPT_LIN_POW: u32 = 0x0002; // linear power
pub const SPECT_OPT_DOUBLE: u32 = 0x0004; // keep output in double precision

const SPECT_PFORMAT: DataFormat = DataFormat::Real64;

/// The supported spectrum types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectrumType {
    /// DFT spectrum (power in dB, or linear via the option bits)
    Dft,
    /// phase spectrum in radians
    Phase,
    /// LP smoothed spectrum
    Lps,
    /// cepstrally smoothed spectrum
    Css,
    /// cepstrum
    Cep,
}

impl SpectrumType {
    pub fn from_name(name: &str) -> Option<SpectrumType> {
        match name.trim().to_ascii_uppercase().as_str() {
            "DFT" | "FT" => Some(SpectrumType::Dft),
            "PHASE" | "PHI" => Some(SpectrumType::Phase),
            "LPS" => Some(SpectrumType::Lps),
            "CSS" => Some(SpectrumType::Css),
            "CEP" | "CEPSTRUM" => Some(SpectrumType::Cep),
            _ => None,
        }
    }

    pub fn data_type(self, bits: u32) -> DataType {
        match self {
            SpectrumType::Dft => {
                if bits & SPECT_OPT_LIN_AMP != 0 {
                    DataType::FtAmplitude
                } else if bits & SPECT_OPT_LIN_POW != 0 {
                    DataType::FtSquare
                } else {
                    DataType::FtPower
                }
            }
            SpectrumType::Phase => DataType::FtPhase,
            SpectrumType::Lps => DataType::FtLpSmoothed,
            SpectrumType::Css => DataType::FtCepSmoothed,
            SpectrumType::Cep => DataType::FtCepstrum,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            SpectrumType::Dft => ".dft",
            SpectrumType::Phase => ".phi",
            SpectrumType::Lps => ".lps",
            SpectrumType::Css => ".css",
            SpectrumType::Cep => ".cep",
        }
    }
}

/// Converted analysis parameters, attached to the output object.
#[derive(Debug)]
pub struct SpectrumParams {
    pub bits: u32,
    pub frame_size: i64,
    pub beg_frame_nr: i64,
    pub end_frame_nr: i64,
    pub num_fft: usize,
    pub sp_type: SpectrumType,
    pub win_func: WindowFunction,
    /// spectral resolution in Hz
    pub bin_width: f64,
    pub pre_emph: f64,
    /// LP order or number of cepstral lags
    pub order: usize,
    pub channel: usize,
    pub accuracy: usize,
}

impl GenericData for SpectrumParams {
    fn ident(&self) -> &str {
        "SPECT_generics"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Fills the options with the general spectral analysis defaults
/// (DFT type).
pub fn set_spectrum_defaults(opts: &mut AnaOptions) {
    *opts = AnaOptions::default();
    opts.ms_shift = SPECT_DEF_SHIFT;
    opts.resolution = SPECT_DEF_RES;
    opts.channel = SPECT_DEF_CHANNEL;
    opts.accuracy = SPECT_DEF_DIGITS_A;
    opts.precision = SPECT_DEF_DIGITS_P;
    opts.dtype = String::from("DFT");
    opts.format = String::from(SPECT_DEF_FORMAT);
    opts.win_func = String::from(SPECT_DEF_WINDOW);
}

/// DFT-specific defaults: window size defined by the FFT length.
pub fn set_dft_defaults(opts: &mut AnaOptions) {
    set_spectrum_defaults(opts);
    opts.ms_size = 0.0;
    opts.pre_emph = 0.0;
}

/// LP-smoothed spectrum defaults.
pub fn set_lps_defaults(opts: &mut AnaOptions) {
    set_spectrum_defaults(opts);
    opts.dtype = String::from("LPS");
    opts.ms_size = LPS_DEF_SIZE;
    opts.effective = true;
    opts.order = 0; // automatic
    opts.pre_emph = LPS_DEF_PREEMPH;
}

/// Cepstrally smoothed spectrum defaults.
pub fn set_css_defaults(opts: &mut AnaOptions) {
    set_spectrum_defaults(opts);
    opts.dtype = String::from("CSS");
    opts.ms_size = 0.0;
    opts.order = 0; // automatic
    opts.pre_emph = 0.0;
}

fn checked_params(
    smp_dop: &DataObject,
    opts: &mut AnaOptions,
) -> Result<(SpectrumParams, crate::AnaTiming)> {
    let au_caps = au_caps_for_processing(SPECT_PFORMAT)? | ANA_I_CHANS;
    if opts.channel < 1 {
        opts.channel = SPECT_DEF_CHANNEL;
    }
    check_sound(smp_dop, au_caps, opts.channel)?;
    let sp_type = SpectrumType::from_name(&opts.dtype)
        .ok_or_else(|| SonaError::WrongDataType(opts.dtype.clone()))?;
    let (mut timing, _) = ana_timing(smp_dop, opts)?;
    if opts.pre_emph < -1.0 || opts.pre_emph > 1.0 {
        return Err(SonaError::BadEmphasis(opts.pre_emph));
    }
    // FFT length from the resolution and the frame
    let mut num_fft = if opts.resolution > 0.0 {
        (timing.samp_freq / opts.resolution).ceil() as usize
    } else {
        MIN_NFFT
    };
    if opts.fft_len > num_fft {
        num_fft = opts.fft_len;
    }
    if timing.frame_size > 0 {
        num_fft = num_fft.max(timing.frame_size as usize);
    }
    let num_fft = num_fft.next_power_of_two().max(MIN_NFFT);
    if timing.frame_size == 0 {
        // window size defined by the FFT length; re-derive the frame
        // range with the final size
        let mut sized = opts.clone();
        sized.ms_size = num_fft as f64 * 1000.0 / timing.samp_freq;
        sized.effective = false;
        let (new_timing, _) = ana_timing(smp_dop, &sized)?;
        timing = new_timing;
    }
    let order = match sp_type {
        SpectrumType::Lps => {
            if opts.order < 1 {
                default_order(timing.samp_freq)
            } else {
                opts.order
            }
        }
        SpectrumType::Css => {
            if opts.order < 1 {
                css_default_lags(timing.samp_freq).max(1)
            } else {
                opts.order
            }
        }
        _ => opts.order,
    };
    let win_func = window_by_name(&opts.win_func)
        .filter(|wf| *wf != WindowFunction::None)
        .ok_or_else(|| SonaError::BadWindow(opts.win_func.clone()))?;
    let gd = SpectrumParams {
        bits: opts.bits,
        frame_size: timing.frame_size,
        beg_frame_nr: timing.beg_frame_nr,
        end_frame_nr: timing.end_frame_nr,
        num_fft,
        sp_type,
        win_func,
        bin_width: timing.samp_freq / num_fft as f64,
        pre_emph: opts.pre_emph,
        order,
        channel: opts.channel,
        accuracy: opts.accuracy,
    };
    Ok((gd, timing))
}

/// Initializes a data object to hold spectral data: one record per
/// frame with `numFFT/2 + 1` bins.
pub fn create_spectrum(smp_dop: &DataObject, opts: &mut AnaOptions) -> Result<DataObject> {
    let (gd, timing) = checked_params(smp_dop, opts)?;

    let mut dop = DataObject::new();
    init_output_format(&mut dop, &opts.format);
    dop.samp_freq = timing.samp_freq;
    dop.frame_dur = timing.frame_shift;
    dop.start_record = gd.beg_frame_nr;
    dop.num_records = 0;
    let format = if gd.bits & SPECT_OPT_DOUBLE != 0 {
        DataFormat::Real64
    } else {
        DataFormat::Real32
    };
    let mut dd = DataDescriptor::new(gd.sp_type.data_type(gd.bits), format);
    dd.num_fields = gd.num_fft / 2 + 1;
    if dop.file_format == FileFormat::Ssff {
        let ident = dtype_to_entry(dd.dtype, KDT_SSFF)
            .map(|e| e.keyword.to_string())
            .unwrap_or_else(|| gd.sp_type.suffix()[1..].to_string());
        dd.ident = Some(ident);
    } else {
        dd.ident = Some(gd.sp_type.suffix()[1..].to_uppercase());
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

/// Runs the spectral analysis, creating the output object.
pub fn compute_spectrum(smp_dop: &mut DataObject, opts: &mut AnaOptions) -> Result<DataObject> {
    let mut sp_dop = create_spectrum(smp_dop, opts)?;
    compute_spectrum_into(smp_dop, Some(opts), &mut sp_dop)?;
    Ok(sp_dop)
}

/// Runs the spectral analysis into an existing output object.
pub fn compute_spectrum_into(
    smp_dop: &mut DataObject,
    opts: Option<&AnaOptions>,
    sp_dop: &mut DataObject,
) -> Result<()> {
    if smp_dop.is_file_bound() {
        if smp_dop.num_records <= 0 {
            return Err(SonaError::FileEmpty(smp_dop.path_string()));
        }
    } else if smp_dop.buffer.buf_num_recs <= 0 {
        return Err(SonaError::NoData(String::from("(compute_spectrum)")));
    }
    let (bits, frame_size, beg, end, num_fft, sp_type, win_func, pre_emph, order, channel) = {
        let gd = sp_dop
            .generic
            .as_ref()
            .and_then(|g| g.as_any().downcast_ref::<SpectrumParams>())
            .ok_or_else(|| SonaError::Bug(String::from("spectrum generic data missing")))?;
        (
            gd.bits,
            gd.frame_size,
            gd.beg_frame_nr,
            gd.end_frame_nr,
            gd.num_fft,
            gd.sp_type,
            gd.win_func,
            gd.pre_emph,
            gd.order,
            gd.channel,
        )
    };
    let frame_shift = sp_dop.frame_dur;
    let head = 1i64; // pre-emphasis tap
    if opts.is_some() {
        check_data_bufs(smp_dop, sp_dop, head + frame_size, beg, end)?;
    }
    let write_opts = write_opts_for(sp_dop);

    let wfc = if win_func > WindowFunction::Rectangle {
        window_coefficients(win_func, frame_size as usize, window_flags(frame_size, frame_shift))
    } else {
        Vec::new()
    };
    let wf_gain = if wfc.is_empty() { 1.0 } else { wf_coh_gain(&wfc) };
    let num_bins = num_fft / 2 + 1;
    let double = bits & SPECT_OPT_DOUBLE != 0;
    let mut frame = vec![0.0f64; (head + frame_size) as usize];
    let mut fft_buf = vec![0.0f64; num_fft];
    let mut bins = vec![0.0f64; num_bins];
    let mut acf = vec![0.0f64; order + 1];
    let mut lpc = vec![0.0f64; order + 1];
    let mut rec = vec![0u8; sp_dop.record_size];
    for frame_nr in beg..end {
        smp_dop.get_sample_frame(frame_nr, frame_size, frame_shift, head, 0, channel, &mut frame)?;
        let tap = frame[0];
        let work = &mut frame[head as usize..];
        pre_emphasis(work, pre_emph, tap);
        if !wfc.is_empty() {
            mul_sig_wf(work, &wfc);
            // correct the spectral levels for the window attenuation
            for v in work.iter_mut() {
                *v /= wf_gain;
            }
        }
        match sp_type {
            SpectrumType::Dft | SpectrumType::Phase | SpectrumType::Css | SpectrumType::Cep => {
                fft_buf.iter_mut().for_each(|v| *v = 0.0);
                fft_buf[..work.len()].copy_from_slice(work);
                rfft(&mut fft_buf, num_fft, FftDirection::Forward)
                    .map_err(|e| SonaError::Bug(e.to_string()))?;
                match sp_type {
                    SpectrumType::Phase => rfft_phase(&fft_buf, &mut bins, num_fft),
                    SpectrumType::Dft => {
                        if bits & SPECT_OPT_LIN_AMP != 0 {
                            rfft_lin_amp(&fft_buf, &mut bins, num_fft);
                        } else if bits & SPECT_OPT_LIN_POW != 0 {
                            rfft_lin_pow(&fft_buf, &mut bins, num_fft);
                        } else {
                            rfft_power_db(&fft_buf, &mut bins, num_fft);
                        }
                    }
                    SpectrumType::Css => {
                        cepstral_smooth(&mut fft_buf, &mut bins, num_fft, order)?;
                    }
                    SpectrumType::Cep => {
                        cepstrum(&mut fft_buf, &mut bins, num_fft)?;
                    }
                    _ => unreachable!(),
                }
            }
            SpectrumType::Lps => {
                get_acf(work, &mut acf, order);
                let sqerr = durbin(&acf, &mut lpc, None, order)
                    .unwrap_or(0.0);
                lp_smooth(&lpc, sqerr, frame_size, &mut fft_buf, &mut bins, num_fft)?;
            }
        }
        if double {
            for (i, b) in bins.iter().enumerate() {
                rec[i * 8..i * 8 + 8].copy_from_slice(&b.to_ne_bytes());
            }
        } else {
            for (i, b) in bins.iter().enumerate() {
                rec[i * 4..i * 4 + 4].copy_from_slice(&(*b as f32).to_ne_bytes());
            }
        }
        store_record(sp_dop, frame_nr, &rec)?;
    }
    if sp_dop.is_file_bound() {
        sp_dop.flush_buffer(write_opts)?;
    }
    Ok(())
}

/// LP smoothed spectrum: the filter gain derives from the Durbin
/// residual and `|1 / A(z)|` is evaluated on the unit circle via an FFT
/// of the LP coefficients.
fn lp_smooth(
    lpc: &[f64],
    sqerr: f64,
    frame_size: i64,
    fft_buf: &mut [f64],
    bins: &mut [f64],
    num_fft: usize,
) -> Result<()> {
    let gain = sqerr / frame_size as f64;
    let gain_db = if gain <= GAIN_MIN_SQR {
        sona_dsp::GAIN_MIN_DB
    } else {
        sqr_to_db(gain)
    };
    fft_buf.iter_mut().for_each(|v| *v = 0.0);
    fft_buf[..lpc.len()].copy_from_slice(lpc);
    rfft(fft_buf, num_fft, FftDirection::Forward).map_err(|e| SonaError::Bug(e.to_string()))?;
    // undo the forward length normalization of the packed coefficients
    let scale = num_fft as f64 / 2.0;
    let hn = num_fft / 2;
    let a_pow = |re: f64, im: f64| {
        let re = re * scale;
        let im = im * scale;
        re * re + im * im
    };
    // the packed DC coefficient is a0/2
    bins[0] = spectrum_level(gain_db, a_pow(2.0 * fft_buf[0], 0.0));
    for k in 1..hn {
        bins[k] = spectrum_level(gain_db, a_pow(fft_buf[2 * k - 1], fft_buf[2 * k]));
    }
    bins[hn] = spectrum_level(gain_db, a_pow(fft_buf[num_fft - 1], 0.0));
    Ok(())
}

fn spectrum_level(gain_db: f64, a_pow: f64) -> f64 {
    if a_pow <= TINY_SQR {
        -TINY_P_DB // |1/A| explodes; clip high
    } else {
        gain_db - 10.0 * a_pow.log10()
    }
}

/// Real cepstrum: inverse transform of the log power spectrum. `bins`
/// receives the first `numFFT/2 + 1` cepstral coefficients.
fn cepstrum(fft_buf: &mut [f64], bins: &mut [f64], num_fft: usize) -> Result<()> {
    let hn = num_fft / 2;
    let mut logpow = vec![0.0f64; hn + 1];
    sona_dsp::rfft_log_pow(fft_buf, &mut logpow, num_fft);
    // pack the (real, even) log spectrum for the inverse transform
    fft_buf[0] = logpow[0];
    for k in 1..hn {
        fft_buf[2 * k - 1] = logpow[k];
        fft_buf[2 * k] = 0.0;
    }
    fft_buf[num_fft - 1] = logpow[hn];
    rfft(fft_buf, num_fft, FftDirection::Inverse).map_err(|e| SonaError::Bug(e.to_string()))?;
    bins[..hn + 1].copy_from_slice(&fft_buf[..hn + 1]);
    Ok(())
}

/// Cepstrally smoothed spectrum: the cepstrum is liftered to the first
/// `lags` coefficients and transformed back; output in dB.
fn cepstral_smooth(
    fft_buf: &mut [f64],
    bins: &mut [f64],
    num_fft: usize,
    lags: usize,
) -> Result<()> {
    let hn = num_fft / 2;
    let mut cep = vec![0.0f64; hn + 1];
    cepstrum(fft_buf, &mut cep, num_fft)?;
    // lifter: keep the low quefrencies, symmetrically
    for (n, value) in fft_buf.iter_mut().enumerate() {
        let lag = n.min(num_fft - n);
        if lag > lags {
            *value = 0.0;
        }
    }
    rfft(fft_buf, num_fft, FftDirection::Forward).map_err(|e| SonaError::Bug(e.to_string()))?;
    // the packed forward output holds the smoothed log10 power spectrum
    bins[0] = 10.0 * fft_buf[0];
    for k in 1..hn {
        bins[k] = 10.0 * fft_buf[2 * k - 1];
    }
    bins[hn] = 10.0 * fft_buf[num_fft - 1];
    Ok(())
}

/// Checks whether changed options are compatible with an existing
/// spectrum object and updates its parameters.
pub fn verify_spectrum(
    sp_dop: &mut DataObject,
    smp_dop: &DataObject,
    opts: &mut AnaOptions,
) -> Result<()> {
    if sp_dop.descriptors.len() != 1 {
        return Err(SonaError::Bug(String::from("not a regular spectrum object")));
    }
    let (gd, timing) = checked_params(smp_dop, opts)?;
    if sp_dop.samp_freq != timing.samp_freq || sp_dop.frame_dur != timing.frame_shift {
        let frame_rate = timing.samp_freq / timing.frame_shift as f64;
        if sp_dop.data_rate != frame_rate {
            if crate::has_committed_data(sp_dop) {
                return Err(SonaError::WrongDataRate(sp_dop.path_string()));
            }
            sp_dop.clear_data_buffer();
        }
        sp_dop.samp_freq = timing.samp_freq;
        sp_dop.frame_dur = timing.frame_shift;
        sp_dop.data_rate = frame_rate;
        sp_dop.start_record = timing.beg_frame_nr;
        sp_dop.num_records = 0;
        sp_dop.set_start_time();
    }
    let want_type = gd.sp_type.data_type(gd.bits);
    let want_fields = gd.num_fft / 2 + 1;
    if sp_dop.descriptors[0].dtype != want_type
        || sp_dop.descriptors[0].num_fields != want_fields
    {
        if crate::has_committed_data(sp_dop) {
            return Err(SonaError::Incompatible(String::from(
                "can't change spectrum type or FFT length in existing data",
            )));
        }
        sp_dop.free_data_buffer();
        sp_dop.descriptors[0].dtype = want_type;
        sp_dop.descriptors[0].num_fields = want_fields;
        sp_dop.set_record_size()?;
    }
    sp_dop.generic = Some(Box::new(gd));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sona_sdo::DataCoding;
    use std::f64::consts::PI;

    fn sine_audio(num: usize, rate: f64, freq: f64) -> DataObject {
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
            let v = (10000.0 * (2.0 * PI * freq * n as f64 / rate).sin()).round() as i16;
            dop.record_bytes_mut(n as i64).copy_from_slice(&v.to_ne_bytes());
        }
        dop.buffer.buf_num_recs = num as i64;
        dop
    }

    fn bins_of(dop: &DataObject, rec_ndx: i64) -> Vec<f64> {
        let rec = dop.record_bytes(rec_ndx);
        rec.chunks_exact(4)
            .map(|b| f32::from_ne_bytes(b.try_into().unwrap()) as f64)
            .collect()
    }

    #[test]
    fn fft_length_from_resolution() {
        let smp = sine_audio(16000, 16000.0, 1000.0);
        let mut opts = AnaOptions::default();
        set_dft_defaults(&mut opts);
        // 16000 / 40 = 400 -> 512
        let dop = create_spectrum(&smp, &mut opts).unwrap();
        let gd = dop
            .generic
            .as_ref()
            .unwrap()
            .as_any()
            .downcast_ref::<SpectrumParams>()
            .unwrap();
        assert_eq!(gd.num_fft, 512);
        assert_eq!(dop.descriptors[0].num_fields, 257);
    }

    #[test]
    fn dft_peak_at_signal_frequency() {
        let mut smp = sine_audio(16000, 16000.0, 1000.0);
        let mut opts = AnaOptions::default();
        set_dft_defaults(&mut opts);
        let out = compute_spectrum(&mut smp, &mut opts).unwrap();
        let bins = bins_of(&out, out.buffer.buf_num_recs / 2);
        // 1 kHz at 512-point FFT of 16 kHz: bin 32
        let peak_bin = bins
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        assert_eq!(peak_bin, 32);
        // dB floor respected everywhere
        assert!(bins.iter().all(|v| *v >= TINY_P_DB));
    }

    fn noisy_sine_audio(num: usize, rate: f64, freq: f64) -> DataObject {
        let mut dop = sine_audio(num, rate, freq);
        // deterministic dither keeps the LP recursion well conditioned
        let mut seed = 1276543u32;
        for n in 0..num as i64 {
            let mut v = i16::from_ne_bytes(dop.record_bytes(n)[..2].try_into().unwrap());
            seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
            v = v.saturating_add(((seed >> 24) as i16) - 128);
            dop.record_bytes_mut(n).copy_from_slice(&v.to_ne_bytes());
        }
        dop
    }

    #[test]
    fn lps_peak_near_resonance() {
        let mut smp = noisy_sine_audio(16000, 16000.0, 1000.0);
        let mut opts = AnaOptions::default();
        set_lps_defaults(&mut opts);
        opts.order = 8;
        let out = compute_spectrum(&mut smp, &mut opts).unwrap();
        let bins = bins_of(&out, out.buffer.buf_num_recs / 2);
        let peak_bin = bins
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        let peak_freq = peak_bin as f64 * 16000.0 / 512.0;
        assert!((peak_freq - 1000.0).abs() < 100.0, "peak at {peak_freq} Hz");
    }

    #[test]
    fn css_smooths_the_spectrum() {
        let mut smp = sine_audio(16000, 16000.0, 1000.0);
        let mut opts = AnaOptions::default();
        set_css_defaults(&mut opts);
        let out = compute_spectrum(&mut smp, &mut opts).unwrap();
        let bins = bins_of(&out, out.buffer.buf_num_recs / 2);
        assert_eq!(bins.len(), 257);
        assert!(bins.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn cepstrum_round_trip_identity() {
        // smoothing with all lags kept reproduces the log power spectrum
        let n = 64usize;
        let mut x: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * i as f64 / 8.0).cos() + 0.3 * (2.0 * PI * i as f64 / 5.1).sin())
            .collect();
        rfft(&mut x, n, FftDirection::Forward).unwrap();
        let mut reference = vec![0.0; n / 2 + 1];
        sona_dsp::rfft_log_pow(&x, &mut reference, n);

        let mut y: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * i as f64 / 8.0).cos() + 0.3 * (2.0 * PI * i as f64 / 5.1).sin())
            .collect();
        rfft(&mut y, n, FftDirection::Forward).unwrap();
        let mut bins = vec![0.0; n / 2 + 1];
        cepstral_smooth(&mut y, &mut bins, n, n).unwrap();
        for (b, r) in bins.iter().zip(reference.iter()) {
            assert!((b - 10.0 * r).abs() < 1e-9, "{b} vs {}", 10.0 * r);
        }
    }

    #[test]
    fn phase_type_selected_by_name() {
        assert_eq!(SpectrumType::from_name("phase"), Some(SpectrumType::Phase));
        assert_eq!(SpectrumType::from_name("DFT"), Some(SpectrumType::Dft));
        assert_eq!(SpectrumType::from_name("nope"), None);
    }
}
