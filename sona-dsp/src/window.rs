//! Window function generation and properties.
//!
//! The fixed set of window functions carries a metadata table with the
//! published spectral figures (highest side lobe level, side lobe
//! roll-off, coherent and incoherent gain, -3 dB/-6 dB bandwidth,
//! equivalent noise bandwidth and main lobe bandwidth, bandwidths in
//! bins). Parametric variants (cos^a, generalized Hamming, Gauss(a),
//! Kaiser(a|b), Kaiser-Bessel-derived) are generated on demand without
//! tabulated metadata.

use crate::math::bessel_i0;
use std::f64::consts::PI;

const TWO_PI: f64 = 2.0 * PI;

/// Minimum length of a window.
pub const WF_MIN_SIZE: usize = 3;

/// Generation variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowFlags {
    /// Full length and symmetric (denominator N-1).
    FullSize,
    /// Periodic (true length) and symmetric (denominator N). Preferred
    /// for spectral work because of the relationship between the
    /// autocorrelation and the power spectrum.
    #[default]
    Periodic,
    /// Periodic with a half-sample shift, to align the window centre
    /// with the frame centre when size and shift have opposite parity.
    Asymmetric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WindowFunction {
    /// Not the same as a rectangular window: no windowing at all.
    None,
    Rectangle,
    Triangle,
    Parabola,
    Cosine,
    Hann,
    Cos3,
    Cos4,
    Hamming,
    Blackman,
    BlackmanExact,
    BlackmanHarris3,
    BlackmanNuttall3Min,
    BlackmanHarris4,
    BlackmanHarris4Min,
    Nuttall3,
    Nuttall4,
    Gauss2_5,
    Gauss3_0,
    Gauss3_5,
    Kaiser2_0,
    Kaiser2_5,
    Kaiser3_0,
    Kaiser3_5,
    Kaiser4_0,
}

/// Spectral properties of a fixed window function.
#[derive(Debug, Clone)]
pub struct WindowSpecs {
    /// code name
    pub code: &'static str,
    /// brief description
    pub desc: &'static str,
    /// highest side lobe level in dB
    pub hsll: f64,
    /// side lobe roll-off in dB/oct
    pub roff: f64,
    /// coherent gain (mean of coefficients; linear)
    pub gain: f64,
    /// incoherent gain (mean of squares; linear)
    pub msqr: f64,
    /// -3 dB bandwidth in bins
    pub db_3: f64,
    /// equivalent noise bandwidth in bins
    pub enbw: f64,
    /// -6 dB bandwidth in bins
    pub db_6: f64,
    /// main lobe bandwidth in bins
    pub mlbw: f64,
}

macro_rules! specs {
    ($code:literal, $desc:literal, $hsll:expr, $roff:expr, $gain:expr, $msqr:expr,
     $db3:expr, $enbw:expr, $db6:expr, $mlbw:expr) => {
        WindowSpecs {
            code: $code,
            desc: $desc,
            hsll: $hsll,
            roff: $roff,
            gain: $gain,
            msqr: $msqr,
            db_3: $db3,
            enbw: $enbw,
            db_6: $db6,
            mlbw: $mlbw,
        }
    };
}

static SPECS: &[(WindowFunction, WindowSpecs)] = &[
    (WindowFunction::None,
     specs!("NONE", "no windowing", -13.3, -6.0, 1.0, 1.0, 0.89, 1.0, 1.21, 2.0)),
    (WindowFunction::Rectangle,
     specs!("RECTANGLE", "rectangular window", -13.3, -6.0, 1.0, 1.0, 0.89, 1.0, 1.21, 2.0)),
    (WindowFunction::Triangle,
     specs!("TRIANGLE", "triangular (Bartlett/Fejer) window", -26.5, -12.0, 0.5, 0.3333, 1.28, 1.33, 1.78, 4.0)),
    (WindowFunction::Parabola,
     specs!("PARABOLA", "parabolic (Riesz/Welch) window", -21.3, -12.0, 0.6667, 0.5333, 1.16, 1.20, 1.59, 2.86)),
    (WindowFunction::Cosine,
     specs!("COSINE", "cosine window", -23.0, -12.0, 0.6366, 0.5, 1.19, 1.23, 1.65, 3.0)),
    (WindowFunction::Hann,
     specs!("HANN", "cos^2 (Hann/hanning) window", -31.5, -18.0, 0.5, 0.375, 1.44, 1.50, 2.00, 4.0)),
    (WindowFunction::Cos3,
     specs!("COS_3", "cos^3 window", -39.3, -24.0, 0.4244, 0.3125, 1.66, 1.73, 2.32, 5.0)),
    (WindowFunction::Cos4,
     specs!("COS_4", "cos^4 window", -46.7, -30.0, 0.375, 0.2734, 1.82, 1.94, 2.59, 6.0)),
    (WindowFunction::Hamming,
     specs!("HAMMING", "standard Hamming window", -42.7, -6.0, 0.54, 0.3974, 1.30, 1.36, 1.81, 4.0)),
    (WindowFunction::Blackman,
     specs!("BLACKMAN", "standard Blackman window", -58.1, -18.0, 0.42, 0.3046, 1.64, 1.73, 2.30, 6.0)),
    (WindowFunction::BlackmanExact,
     specs!("BLACK_X", "exact Blackman window", -68.2, -6.0, 0.4266, 0.3096, 1.61, 1.69, 2.25, 6.0)),
    (WindowFunction::BlackmanHarris3,
     specs!("BLACK_3", "3-term Blackman-Harris window", -67.0, -6.0, 0.4232, 0.3057, 1.62, 1.71, 2.27, 6.0)),
    (WindowFunction::BlackmanNuttall3Min,
     specs!("BLACK_M3", "minimum 3-term Blackman-Nuttall window", -71.5, -6.0, 0.4244, 0.3131, 1.66, 1.77, 2.32, 6.0)),
    (WindowFunction::BlackmanHarris4,
     specs!("BLACK_4", "4-term Blackman-Harris window", -74.4, -6.0, 0.4022, 0.2880, 1.74, 1.79, 2.44, 8.0)),
    (WindowFunction::BlackmanHarris4Min,
     specs!("BLACK_M4", "minimum 4-term Blackman-Harris window", -92.0, -6.0, 0.3588, 0.2580, 1.90, 2.00, 2.72, 8.0)),
    (WindowFunction::Nuttall3,
     specs!("NUTTAL_3", "3-term Nuttall window", -64.2, -18.0, 0.4090, 0.2964, 1.68, 1.77, 2.36, 6.0)),
    (WindowFunction::Nuttall4,
     specs!("NUTTAL_4", "4-term Nuttall window", -93.3, -18.0, 0.3558, 0.2493, 1.87, 1.98, 2.65, 8.0)),
    (WindowFunction::Gauss2_5,
     specs!("GAUSS2_5", "Gaussian window, alpha = 2.5", -42.0, -6.0, 0.5094, 0.3600, 1.33, 1.39, 1.86, 6.2)),
    (WindowFunction::Gauss3_0,
     specs!("GAUSS3_0", "Gaussian window, alpha = 3.0", -55.0, -6.0, 0.4260, 0.2946, 1.55, 1.64, 2.18, 7.4)),
    (WindowFunction::Gauss3_5,
     specs!("GAUSS3_5", "Gaussian window, alpha = 3.5", -69.0, -6.0, 0.3662, 0.2518, 1.79, 1.90, 2.52, 8.6)),
    (WindowFunction::Kaiser2_0,
     specs!("KAISER2_0", "Kaiser-Bessel window, alpha = 2.0", -45.9, -6.0, 0.4902, 0.3459, 1.43, 1.50, 1.99, 5.2)),
    (WindowFunction::Kaiser2_5,
     specs!("KAISER2_5", "Kaiser-Bessel window, alpha = 2.5", -57.0, -6.0, 0.4441, 0.3074, 1.57, 1.65, 2.20, 6.1)),
    (WindowFunction::Kaiser3_0,
     specs!("KAISER3_0", "Kaiser-Bessel window, alpha = 3.0", -69.0, -6.0, 0.4050, 0.2780, 1.71, 1.80, 2.39, 7.0)),
    (WindowFunction::Kaiser3_5,
     specs!("KAISER3_5", "Kaiser-Bessel window, alpha = 3.5", -81.9, -6.0, 0.3745, 0.2553, 1.83, 1.93, 2.57, 7.9)),
    (WindowFunction::Kaiser4_0,
     specs!("KAISER4_0", "Kaiser-Bessel window, alpha = 4.0", -94.4, -6.0, 0.3479, 0.2365, 1.95, 2.05, 2.73, 8.9)),
];

/// Looks a window function up by its code name. Accepts the common
/// aliases (BARTLETT, FEJER, WELCH, RIESZ, HANNING, COS).
pub fn window_by_name(name: &str) -> Option<WindowFunction> {
    let upper = name.trim().to_ascii_uppercase();
    let wf = match upper.as_str() {
        "NONE" => WindowFunction::None,
        "RECTANGLE" | "RECT" => WindowFunction::Rectangle,
        "TRIANGLE" | "BARTLETT" | "FEJER" => WindowFunction::Triangle,
        "PARABOLA" | "RIESZ" | "WELCH" => WindowFunction::Parabola,
        "COSINE" | "COS" => WindowFunction::Cosine,
        "HANN" | "HANNING" | "COS_2" => WindowFunction::Hann,
        "COS_3" => WindowFunction::Cos3,
        "COS_4" => WindowFunction::Cos4,
        "HAMMING" => WindowFunction::Hamming,
        "BLACKMAN" => WindowFunction::Blackman,
        "BLACK_X" => WindowFunction::BlackmanExact,
        "BLACK_3" => WindowFunction::BlackmanHarris3,
        "BLACK_M3" => WindowFunction::BlackmanNuttall3Min,
        "BLACK_4" => WindowFunction::BlackmanHarris4,
        "BLACK_M4" => WindowFunction::BlackmanHarris4Min,
        "NUTTAL_3" | "NUTTALL_3" => WindowFunction::Nuttall3,
        "NUTTAL_4" | "NUTTALL_4" => WindowFunction::Nuttall4,
        "GAUSS2_5" => WindowFunction::Gauss2_5,
        "GAUSS3_0" => WindowFunction::Gauss3_0,
        "GAUSS3_5" => WindowFunction::Gauss3_5,
        "KAISER2_0" => WindowFunction::Kaiser2_0,
        "KAISER2_5" => WindowFunction::Kaiser2_5,
        "KAISER3_0" => WindowFunction::Kaiser3_0,
        "KAISER3_5" => WindowFunction::Kaiser3_5,
        "KAISER4_0" => WindowFunction::Kaiser4_0,
        _ => return None,
    };
    Some(wf)
}

/// Returns the tabulated properties of a fixed window function.
pub fn window_specs(wf: WindowFunction) -> &'static WindowSpecs {
    &SPECS.iter().find(|(f, _)| *f == wf).unwrap().1
}

/// Tabulated equivalent noise bandwidth in bins.
pub fn window_enbw(wf: WindowFunction) -> f64 {
    window_specs(wf).enbw
}

fn cosine_sum(a: &[f64], n: usize, flags: WindowFlags) -> Vec<f64> {
    let (den, shift) = denominator(n, flags);
    (0..n)
        .map(|i| {
            let x = TWO_PI * (i as f64 + shift) / den;
            a.iter()
                .enumerate()
                .map(|(j, &aj)| {
                    let sign = if j % 2 == 0 { 1.0 } else { -1.0 };
                    sign * aj * (j as f64 * x).cos()
                })
                .sum()
        })
        .collect()
}

fn denominator(n: usize, flags: WindowFlags) -> (f64, f64) {
    match flags {
        WindowFlags::FullSize => ((n - 1) as f64, 0.0),
        WindowFlags::Periodic => (n as f64, 0.0),
        WindowFlags::Asymmetric => (n as f64, 0.5),
    }
}

fn shaped<F: Fn(f64) -> f64>(n: usize, flags: WindowFlags, f: F) -> Vec<f64> {
    // f takes the position relative to the centre, normalized to [-1, 1]
    let (den, shift) = denominator(n, flags);
    let half = den / 2.0;
    (0..n)
        .map(|i| f((i as f64 + shift - half) / half))
        .collect()
}

fn kaiser(n: usize, beta: f64, flags: WindowFlags) -> Vec<f64> {
    let norm = bessel_i0(beta, 1e-12);
    shaped(n, flags, |r| {
        let arg = 1.0 - r * r;
        if arg <= 0.0 {
            1.0 / norm
        } else {
            bessel_i0(beta * arg.sqrt(), 1e-12) / norm
        }
    })
}

/// Kaiser-Bessel-derived window (even lengths; used for lapped
/// transforms). The squares of the coefficients of each half sum to a
/// running share of the total.
fn kbd(n: usize, alpha: f64) -> Vec<f64> {
    let half = n / 2;
    let base = kaiser(half + 1, PI * alpha, WindowFlags::FullSize);
    let total: f64 = base.iter().sum();
    let mut w = vec![0.0; n];
    let mut cum = 0.0;
    for i in 0..half {
        cum += base[i];
        w[i] = (cum / total).sqrt();
        w[n - 1 - i] = w[i];
    }
    w
}

/// Generates the coefficients of a window function.
///
/// Returns an empty vector when `n` is below [`WF_MIN_SIZE`].
pub fn window_coefficients(wf: WindowFunction, n: usize, flags: WindowFlags) -> Vec<f64> {
    use WindowFunction::*;
    if n < WF_MIN_SIZE {
        return Vec::new();
    }
    match wf {
        None | Rectangle => vec![1.0; n],
        Triangle => shaped(n, flags, |r| 1.0 - r.abs()),
        Parabola => shaped(n, flags, |r| 1.0 - r * r),
        Cosine => shaped(n, flags, |r| (PI * r / 2.0).cos()),
        Hann => cosine_sum(&[0.5, 0.5], n, flags),
        Cos3 => shaped(n, flags, |r| (PI * r / 2.0).cos().powi(3)),
        Cos4 => shaped(n, flags, |r| (PI * r / 2.0).cos().powi(4)),
        Hamming => cosine_sum(&[0.54, 0.46], n, flags),
        Blackman => cosine_sum(&[0.42, 0.5, 0.08], n, flags),
        BlackmanExact => cosine_sum(
            &[7938.0 / 18608.0, 9240.0 / 18608.0, 1430.0 / 18608.0],
            n,
            flags,
        ),
        BlackmanHarris3 => cosine_sum(&[0.42323, 0.49755, 0.07922], n, flags),
        BlackmanNuttall3Min => cosine_sum(&[0.4243801, 0.4973406, 0.0782793], n, flags),
        BlackmanHarris4 => cosine_sum(&[0.40217, 0.49703, 0.09392, 0.00183], n, flags),
        BlackmanHarris4Min => cosine_sum(&[0.35875, 0.48829, 0.14128, 0.01168], n, flags),
        Nuttall3 => cosine_sum(&[0.40897, 0.5, 0.09103], n, flags),
        Nuttall4 => cosine_sum(&[0.355768, 0.487396, 0.144232, 0.012604], n, flags),
        Gauss2_5 => gauss_window(n, 2.5, flags),
        Gauss3_0 => gauss_window(n, 3.0, flags),
        Gauss3_5 => gauss_window(n, 3.5, flags),
        Kaiser2_0 => kaiser(n, PI * 2.0, flags),
        Kaiser2_5 => kaiser(n, PI * 2.5, flags),
        Kaiser3_0 => kaiser(n, PI * 3.0, flags),
        Kaiser3_5 => kaiser(n, PI * 3.5, flags),
        Kaiser4_0 => kaiser(n, PI * 4.0, flags),
    }
}

fn gauss_window(n: usize, alpha: f64, flags: WindowFlags) -> Vec<f64> {
    shaped(n, flags, |r| (-0.5 * (alpha * r) * (alpha * r)).exp())
}

/// Parametric window variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamWindow {
    /// cos^alpha
    CosAlpha(f64),
    /// generalized Hamming: a - (1-a)cos
    GenHamming(f64),
    /// Gaussian with free alpha
    GaussAlpha(f64),
    /// Kaiser-Bessel with alpha (beta = pi * alpha)
    KaiserAlpha(f64),
    /// Kaiser-Bessel with beta given directly
    KaiserBeta(f64),
    /// Kaiser-Bessel-derived with alpha
    KbdAlpha(f64),
}

/// Generates the coefficients of a parametric window function.
pub fn window_coefficients_param(pw: ParamWindow, n: usize, flags: WindowFlags) -> Vec<f64> {
    if n < WF_MIN_SIZE {
        return Vec::new();
    }
    match pw {
        ParamWindow::CosAlpha(a) => shaped(n, flags, |r| (PI * r / 2.0).cos().powf(a)),
        ParamWindow::GenHamming(a) => cosine_sum(&[a, 1.0 - a], n, flags),
        ParamWindow::GaussAlpha(a) => gauss_window(n, a, flags),
        ParamWindow::KaiserAlpha(a) => kaiser(n, PI * a, flags),
        ParamWindow::KaiserBeta(b) => kaiser(n, b, flags),
        ParamWindow::KbdAlpha(a) => kbd(n, a),
    }
}

/// Coherent gain: the mean of the window coefficients.
pub fn wf_coh_gain(w: &[f64]) -> f64 {
    if w.is_empty() {
        return 0.0;
    }
    w.iter().sum::<f64>() / w.len() as f64
}

/// Incoherent gain: the root of the mean of the squared coefficients.
pub fn wf_inc_gain(w: &[f64]) -> f64 {
    if w.is_empty() {
        return 0.0;
    }
    (w.iter().map(|v| v * v).sum::<f64>() / w.len() as f64).sqrt()
}

/// Equivalent noise bandwidth in bins, measured from the coefficients:
/// `N * sum(w^2) / sum(w)^2`.
pub fn wf_enbw(w: &[f64]) -> f64 {
    let sum: f64 = w.iter().sum();
    if sum == 0.0 {
        return 0.0;
    }
    let sqr: f64 = w.iter().map(|v| v * v).sum();
    w.len() as f64 * sqr / (sum * sum)
}
