//! Signal processing and numerical mathematics kernels: FFTs, window
//! functions, linear prediction and the frame utilities shared by the
//! analysis pipelines.

mod fft;
mod frame;
mod lpc;
mod math;
mod window;

pub use fft::{
    bin_to_freq, fft, freq_to_bin, rfft, rfft_im, rfft_lin_amp, rfft_lin_pow, rfft_log_pow,
    rfft_phase, rfft_power_db, rfft_re, FftDirection, FftError, MIN_NFFT,
};
pub use frame::{
    acf, max_magnitude, mean_acf, mul_sig_wf, norm_acf, pre_emphasis, remove_dc, rms,
    zero_crossing_rate,
};
pub use lpc::{
    arf_to_rfc, durbin, ffb_to_pqp, lar_to_rfc, lpc_to_cep, lpc_to_pqp, lpc_to_rfc, pqp_to_rfb,
    rfc_to_arf, rfc_to_lar, rfc_to_lpc, LpcError,
};
pub use math::{
    bairstow, bessel_i0, bessel_i0_approx, gcd, has_ccr, lcm, linterpol, parabola, Bairstow,
};
pub use window::{
    window_by_name, window_coefficients, window_coefficients_param, window_enbw, window_specs,
    wf_coh_gain, wf_enbw, wf_inc_gain, ParamWindow, WindowFlags, WindowFunction, WindowSpecs,
    WF_MIN_SIZE,
};

/// Clip values for log conversion of small values in double precision.
pub const TINY_LIN: f64 = 1.0e-150;
pub const TINY_SQR: f64 = 1.0e-300;
pub const TINY_PLG: f64 = -300.0;
pub const TINY_P_DB: f64 = -3000.0;

/// Clip values for conversion of RMS amplitudes to dB; the linear floor
/// is generally well below the quantization noise.
pub const RMS_MIN_AMP: f64 = 0.1;
pub const RMS_MIN_DB: f64 = -20.0;
/// Same for LP filter gain (a squared quantity).
pub const GAIN_MIN_SQR: f64 = 0.0001;
pub const GAIN_MIN_DB: f64 = -40.0;

/// Percent full scale used when rescaling clipped output.
pub const DEF_GAIN_PERCENT: f64 = 95.0;

#[inline]
pub fn lin_to_db(x: f64) -> f64 {
    20.0 * x.log10()
}

#[inline]
pub fn sqr_to_db(x: f64) -> f64 {
    10.0 * x.log10()
}

#[inline]
pub fn db_to_lin(x: f64) -> f64 {
    10.0f64.powf(x / 20.0)
}

/// Pre-emphasis coefficient corresponding to a -3 dB frequency.
#[inline]
pub fn freq_to_emph(f: f64, samp_freq: f64) -> f64 {
    (-2.0 * std::f64::consts::PI * f / samp_freq).exp()
}
