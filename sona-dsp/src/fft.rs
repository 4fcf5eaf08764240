//! Fast Fourier Transforms for complex and real signals and conversion
//! of the transform output into the various spectra.

use crate::{TINY_LIN, TINY_PLG, TINY_P_DB, TINY_SQR};
use std::f64::consts::PI;
use thiserror::Error;

/// Minimum number of FFT points.
pub const MIN_NFFT: usize = 4;

const TWO_PI: f64 = 2.0 * PI;
const HLF_PI: f64 = PI / 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftDirection {
    Forward,
    Inverse,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FftError {
    #[error("FFT length {0} is less than {MIN_NFFT} or not a power of two")]
    BadLength(usize),
    #[error("buffer too short for FFT length {0}")]
    ShortBuffer(usize),
}

fn check_length(n: usize) -> Result<u32, FftError> {
    if n < MIN_NFFT || !n.is_power_of_two() {
        return Err(FftError::BadLength(n));
    }
    Ok(n.trailing_zeros())
}

/// The classical Cooley-Tukey FFT, in-place.
///
/// `x` holds `n` complex values with the real part at the even, the
/// imaginary part at the odd cells. The forward transform has the
/// negative exponential. No length normalization is applied; the de
/// facto standard would be to divide the inverse transform by `n`.
pub fn fft(x: &mut [f64], n: usize, direction: FftDirection) -> Result<(), FftError> {
    check_length(n)?;
    if x.len() < 2 * n {
        return Err(FftError::ShortBuffer(n));
    }
    let nn = n << 1;
    // bit reversal
    let mut j = 1usize;
    let mut i = 1usize;
    while i < nn {
        if j > i {
            x.swap(i - 1, j - 1);
            x.swap(i, j);
        }
        let mut m = n;
        while m >= 2 && j > m {
            j -= m;
            m >>= 1;
        }
        j += m;
        i += 2;
    }
    // Danielson-Lanczos
    let mut mmax = 2usize;
    while nn > mmax {
        let incr = mmax << 1;
        let arg = TWO_PI / mmax as f64;
        let ur = arg.cos();
        let ui = if direction == FftDirection::Inverse {
            arg.sin()
        } else {
            -arg.sin()
        };
        let mut cosf = 1.0;
        let mut sinf = 0.0;
        let mut m = 1usize;
        while m < mmax {
            let mut i = m;
            while i <= nn {
                let j = i + mmax;
                let vr = cosf * x[j - 1] - sinf * x[j];
                let vi = sinf * x[j - 1] + cosf * x[j];
                x[j - 1] = x[i - 1] - vr;
                x[j] = x[i] - vi;
                x[i - 1] += vr;
                x[i] += vi;
                i += incr;
            }
            let temp = cosf * ur - sinf * ui;
            sinf = sinf * ur + cosf * ui;
            cosf = temp;
            m += 2;
        }
        mmax = incr;
    }
    Ok(())
}

/// In-place FFT for real signals.
///
/// In the forward direction `x[..n]` holds signal values on input and
/// the packed Fourier coefficients on output:
///
/// ```text
/// x[0]     = a0
/// x[2k-1]  = a_k   for k = 1 .. n/2
/// x[2k]    = b_k   for k = 1 .. n/2 - 1
/// ```
///
/// The inverse direction reverses this. Length normalization by `2/n`
/// is performed in the forward direction, whereby `x[0]` then contains
/// a0/2 (the DC component).
pub fn rfft(x: &mut [f64], n: usize, direction: FftDirection) -> Result<(), FftError> {
    let m = check_length(n)? as usize;
    if x.len() < n {
        return Err(FftError::ShortBuffer(n));
    }
    let factor = 2.0 / n as f64;
    let arg_n = PI * factor;
    let arg_hn = TWO_PI * factor;
    let hn = n >> 1;
    let qn = hn >> 1;

    if direction == FftDirection::Inverse {
        // use symmetry properties to get the coefficients for a complex
        // IFFT of half the length
        let mut keep = x[1];
        x[1] = x[0] - x[n - 1];
        x[0] += x[n - 1];
        let ur = arg_n.cos();
        let ui = arg_n.sin();
        let mut cosf = 1.0;
        let mut sinf = 0.0;
        for i in 1..qn {
            let j = i << 1;
            let k = n - j;
            let save = cosf;
            cosf = save * ur - sinf * ui;
            sinf = sinf * ur + save * ui;
            let vr = 0.5 * (sinf * (keep - x[k - 1]) - cosf * (x[j] + x[k]));
            let vi = 0.5 * (cosf * (keep - x[k - 1]) + sinf * (x[j] + x[k]));
            let wr = 0.5 * (keep + x[k - 1]);
            let wi = 0.5 * (x[j] - x[k]);
            keep = x[j + 1];
            x[j] = wr - vr;
            x[j + 1] = vi - wi;
            x[k] = vr + wr;
            x[k + 1] = vi + wi;
        }
        x[hn + 1] = x[hn];
        x[hn] = keep;
    }

    // n/2-point complex FFT
    for i in 0..hn {
        let mut j = i;
        let mut l = 0usize;
        for _ in 1..m {
            l = (l << 1) + (j & 1);
            j >>= 1;
        }
        if i <= l {
            let j = i << 1;
            let k = l << 1;
            let vr = x[j];
            let vi = x[j + 1];
            if direction == FftDirection::Forward {
                // length normalization in the forward transform
                x[j] = x[k] * factor;
                x[j + 1] = x[k + 1] * factor;
                x[k] = vr * factor;
                x[k + 1] = vi * factor;
            } else {
                x[j] = x[k];
                x[j + 1] = x[k + 1];
                x[k] = vr;
                x[k + 1] = vi;
            }
        }
    }
    let mut p_m_1_m = hn; // 2^(M-1-m)
    let mut pm_1 = 1usize; // 2^(m-1)
    for _ in 1..m {
        p_m_1_m >>= 1;
        let pm = pm_1 << 1;
        let arg = arg_hn * p_m_1_m as f64;
        let ur = arg.cos();
        let ui = if direction == FftDirection::Inverse {
            arg.sin()
        } else {
            -arg.sin()
        };
        let mut cosf = 1.0;
        let mut sinf = 0.0;
        let mut i = 0usize;
        while i < hn {
            // j = 0 case outside the loop
            let k = i << 1;
            let l = k + pm;
            let vr = x[l];
            let vi = x[l + 1];
            x[l] = x[k] - vr;
            x[l + 1] = x[k + 1] - vi;
            x[k] += vr;
            x[k + 1] += vi;
            i += pm;
        }
        for j in 1..pm_1 {
            let save = cosf;
            cosf = save * ur - sinf * ui;
            sinf = sinf * ur + save * ui;
            let mut i = 0usize;
            while i < hn {
                let k = (i + j) << 1;
                let l = k + pm;
                let vr = x[l] * cosf - x[l + 1] * sinf;
                let vi = x[l] * sinf + x[l + 1] * cosf;
                x[l] = x[k] - vr;
                x[l + 1] = x[k + 1] - vi;
                x[k] += vr;
                x[k + 1] += vi;
                i += pm;
            }
        }
        pm_1 = pm;
    }

    if direction == FftDirection::Forward {
        // use symmetry properties to double the number of coefficients
        let mut keep = x[n - 1];
        x[n - 1] = 0.5 * (x[0] - x[1]);
        x[0] = 0.5 * (x[0] + x[1]);
        let ur = arg_n.cos();
        let ui = -arg_n.sin();
        let mut cosf = 1.0;
        let mut sinf = 0.0;
        for i in 1..qn {
            let j = i << 1;
            let k = n - j;
            let save = cosf;
            cosf = save * ur - sinf * ui;
            sinf = sinf * ur + save * ui;
            let vr = 0.5 * (sinf * (x[j] - x[k]) + cosf * (x[j + 1] + keep));
            let vi = 0.5 * (cosf * (x[j] - x[k]) - sinf * (x[j + 1] + keep));
            let wr = 0.5 * (x[j] + x[k]);
            let wi = 0.5 * (x[j + 1] - keep);
            keep = x[k - 1];
            x[j - 1] = vr + wr;
            x[j] = vi - wi;
            x[k - 1] = wr - vr;
            x[k] = vi + wi;
        }
        x[hn - 1] = x[hn];
        x[hn] = keep;
    }
    Ok(())
}

/// Extracts the real part of a forward [`rfft`] output into `r[..n/2+1]`.
pub fn rfft_re(c: &[f64], r: &mut [f64], n: usize) {
    r[0] = c[0]; // DC component; Im(0) = 0
    let mut o = 1;
    let mut i = 1;
    while i < n {
        r[o] = c[i];
        o += 1;
        i += 2;
    }
}

/// Extracts the imaginary part of a forward [`rfft`] output.
pub fn rfft_im(c: &[f64], r: &mut [f64], n: usize) {
    r[0] = 0.0; // DC component; Im(0) = 0
    let mut o = 1;
    let mut i = 2;
    while i < n {
        r[o] = c[i];
        o += 1;
        i += 2;
    }
    r[o] = 0.0; // Fs/2 component; Im(n/2) = 0
}

/// Linear amplitude spectrum of a forward [`rfft`] output.
pub fn rfft_lin_amp(c: &[f64], a: &mut [f64], n: usize) {
    let hn = n >> 1;
    a[0] = c[0].abs();
    for i in 1..hn {
        a[i] = c[2 * i - 1].hypot(c[2 * i]);
    }
    a[hn] = c[n - 1].abs();
}

/// Linear power spectrum of a forward [`rfft`] output.
pub fn rfft_lin_pow(c: &[f64], p: &mut [f64], n: usize) {
    let hn = n >> 1;
    p[0] = c[0] * c[0];
    for i in 1..hn {
        let re = c[2 * i - 1];
        let im = c[2 * i];
        p[i] = re * re + im * im;
    }
    p[hn] = c[n - 1] * c[n - 1];
}

/// Log (base 10) power spectrum of a forward [`rfft`] output; underflow
/// clips to `TINY_PLG`.
pub fn rfft_log_pow(c: &[f64], p: &mut [f64], n: usize) {
    let hn = n >> 1;
    let dc = c[0].abs();
    p[0] = if dc <= TINY_LIN { TINY_PLG } else { 2.0 * dc.log10() };
    for i in 1..hn {
        let power = c[2 * i - 1] * c[2 * i - 1] + c[2 * i] * c[2 * i];
        p[i] = if power <= TINY_SQR { TINY_PLG } else { power.log10() };
    }
    let ny = c[n - 1].abs();
    p[hn] = if ny <= TINY_LIN { TINY_PLG } else { 2.0 * ny.log10() };
}

/// Power spectrum in dB of a forward [`rfft`] output; underflow clips
/// to `TINY_P_DB`.
pub fn rfft_power_db(c: &[f64], p: &mut [f64], n: usize) {
    let hn = n >> 1;
    let dc = c[0].abs();
    p[0] = if dc <= TINY_LIN { TINY_P_DB } else { 20.0 * dc.log10() };
    for i in 1..hn {
        let power = c[2 * i - 1] * c[2 * i - 1] + c[2 * i] * c[2 * i];
        p[i] = if power <= TINY_SQR {
            TINY_P_DB
        } else {
            10.0 * power.log10()
        };
    }
    let ny = c[n - 1].abs();
    p[hn] = if ny <= TINY_LIN { TINY_P_DB } else { 20.0 * ny.log10() };
}

/// Phase spectrum in radians with `-PI < phi <= PI`.
pub fn rfft_phase(c: &[f64], p: &mut [f64], n: usize) {
    let hn = n >> 1;
    p[0] = if c[0] >= 0.0 { 0.0 } else { PI };
    for i in 1..hn {
        let re = c[2 * i - 1];
        let im = c[2 * i];
        p[i] = if re == 0.0 {
            if im > 0.0 {
                HLF_PI
            } else if im < 0.0 {
                -HLF_PI
            } else {
                0.0
            }
        } else if im == 0.0 {
            // result otherwise compiler-dependent
            0.0
        } else {
            im.atan2(re)
        };
    }
    p[hn] = if c[n - 1] >= 0.0 { 0.0 } else { PI };
}

/// Rounds a frequency in Hz to the nearest DFT bin number.
pub fn freq_to_bin(freq: f64, samp_freq: f64, n_dft: usize) -> usize {
    if freq <= 0.0 {
        return 0;
    }
    if freq >= samp_freq / 2.0 {
        return n_dft / 2;
    }
    (n_dft as f64 * freq / samp_freq + 0.5) as usize
}

/// Converts a DFT bin number to a frequency in Hz.
pub fn bin_to_freq(bin: usize, samp_freq: f64, n_dft: usize) -> f64 {
    let bin = bin.min(n_dft / 2);
    bin as f64 * samp_freq / n_dft as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_lengths() {
        let mut x = vec![0.0; 16];
        assert_eq!(fft(&mut x, 3, FftDirection::Forward), Err(FftError::BadLength(3)));
        assert_eq!(rfft(&mut x, 6, FftDirection::Forward), Err(FftError::BadLength(6)));
    }

    #[test]
    fn fft_inverse_recovers_signal() {
        let n = 16;
        let mut x = vec![0.0; 2 * n];
        for i in 0..n {
            x[2 * i] = (i as f64 * 0.3).sin() + 0.25;
        }
        let orig = x.clone();
        fft(&mut x, n, FftDirection::Forward).unwrap();
        fft(&mut x, n, FftDirection::Inverse).unwrap();
        for i in 0..2 * n {
            assert!((x[i] / n as f64 - orig[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn rfft_round_trip() {
        for n in [4usize, 8, 64, 512] {
            let mut x: Vec<f64> = (0..n)
                .map(|i| (TWO_PI * i as f64 / 8.0).cos() + 0.1 * i as f64)
                .collect();
            let orig = x.clone();
            rfft(&mut x, n, FftDirection::Forward).unwrap();
            rfft(&mut x, n, FftDirection::Inverse).unwrap();
            for i in 0..n {
                assert!((x[i] - orig[i]).abs() < 1e-10, "n = {n}, i = {i}");
            }
        }
    }

    #[test]
    fn rfft_of_cosine_has_single_bin() {
        // cos(2*pi*n/8) at N = 32 puts all energy in bin 4
        let n = 32usize;
        let mut x: Vec<f64> = (0..n).map(|i| (TWO_PI * i as f64 / 8.0).cos()).collect();
        rfft(&mut x, n, FftDirection::Forward).unwrap();
        let mut amp = vec![0.0; n / 2 + 1];
        rfft_lin_amp(&x, &mut amp, n);
        for (k, a) in amp.iter().enumerate() {
            if k == 4 {
                assert!((a - 1.0).abs() < 1e-12);
            } else {
                assert!(a.abs() < 1e-12, "bin {k}");
            }
        }
    }

    #[test]
    fn phase_of_zero_spectrum() {
        let n = 8usize;
        let c = vec![0.0; n];
        let mut p = vec![1.0; n / 2 + 1];
        rfft_phase(&c, &mut p, n);
        assert!(p.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn bin_conversions() {
        assert_eq!(freq_to_bin(1000.0, 16000.0, 512), 32);
        assert_eq!(freq_to_bin(-5.0, 16000.0, 512), 0);
        assert_eq!(freq_to_bin(9000.0, 16000.0, 512), 256);
        assert_eq!(bin_to_freq(32, 16000.0, 512), 1000.0);
        assert_eq!(bin_to_freq(400, 16000.0, 512), 8000.0);
    }
}
