//! Frame-level signal utilities shared by the analysis pipelines.

/// Calculates and subtracts the DC (mean) value in place.
/// Returns the mean.
pub fn remove_dc(s: &mut [f64]) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let mean = s.iter().sum::<f64>() / s.len() as f64;
    for v in s.iter_mut() {
        *v -= mean;
    }
    mean
}

/// In-place emphasis of a signal with `P(z) = 1 + u*z^-1`.
///
/// To emphasize high-frequency components `u` should be negative. `tap`
/// is the initial value of the filter tap (the un-emphasized sample
/// preceding `s[0]`).
pub fn pre_emphasis(s: &mut [f64], u: f64, mut tap: f64) {
    if u == 0.0 {
        return;
    }
    for v in s.iter_mut() {
        let save = *v;
        *v += u * tap;
        tap = save;
    }
}

/// Multiplies a signal in place with window coefficients.
pub fn mul_sig_wf(s: &mut [f64], wf: &[f64]) {
    for (v, w) in s.iter_mut().zip(wf.iter()) {
        *v *= w;
    }
}

/// Autocorrelation coefficients of a windowed signal:
/// `r[m] = sum(s[n] * s[n+m])` for `n = 0 .. N-m-1`, `m = 0 ..= order`.
pub fn acf(s: &[f64], r: &mut [f64], order: usize) {
    let n = s.len();
    debug_assert!(order < n);
    for m in 0..=order {
        let mut sum = 0.0;
        for i in 0..n - m {
            sum += s[i] * s[i + m];
        }
        r[m] = sum;
    }
}

/// Length-normalized (average) autocorrelation coefficients:
/// `r[m] = acf[m] / (N - m)`.
pub fn mean_acf(s: &[f64], r: &mut [f64], order: usize) {
    let n = s.len();
    acf(s, r, order);
    for m in 0..=order {
        r[m] /= (n - m) as f64;
    }
}

/// Energy-normalized autocorrelation: `r[0] = 1` per definition,
/// `r[m] = acf[m] / R0`. A zero-energy signal yields all-zero lags.
/// Returns `R0`.
pub fn norm_acf(s: &[f64], r: &mut [f64], order: usize) -> f64 {
    acf(s, r, order);
    let r0 = r[0];
    r[0] = 1.0;
    if r0 <= 0.0 {
        for v in r[1..=order].iter_mut() {
            *v = 0.0;
        }
    } else {
        for v in r[1..=order].iter_mut() {
            *v /= r0;
        }
    }
    r0
}

/// Zero-crossing rate of the signal values in Hz.
///
/// The mean period between crossings is estimated by linear
/// interpolation between the first and the last crossing; fewer than
/// 3 crossings yield 0 Hz.
pub fn zero_crossing_rate(s: &[f64], samp_freq: f64) -> f64 {
    if s.is_empty() || samp_freq <= 0.0 {
        return 0.0;
    }
    let mut num_zx = 0usize;
    let mut first = -1.0f64;
    let mut last = -1.0f64;
    let mut positive = s[0] >= 0.0;
    let mut prev = s[0];
    for (n, &v) in s.iter().enumerate().skip(1) {
        if v >= 0.0 {
            if !positive {
                positive = true;
                num_zx += 1;
                last = n as f64 - v / (v - prev);
                if first < 0.0 {
                    first = last;
                }
            }
        } else if positive {
            positive = false;
            num_zx += 1;
            last = n as f64 + v / (prev - v);
            if first < 0.0 {
                first = last;
            }
        }
        prev = v;
    }
    if num_zx > 2 {
        let avr_period = (last - first) / (num_zx - 1) as f64;
        samp_freq / avr_period
    } else {
        0.0
    }
}

/// Root mean square (effective) amplitude.
pub fn rms(s: &[f64]) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let sum: f64 = s.iter().map(|v| v * v).sum();
    (sum / s.len() as f64).sqrt()
}

/// Maximum magnitude in an array of signal values.
pub fn max_magnitude(s: &[f64]) -> f64 {
    s.iter().fold(0.0f64, |acc, &v| acc.max(v.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn dc_removal() {
        let mut s = vec![1.0, 2.0, 3.0, 4.0];
        let mean = remove_dc(&mut s);
        assert_eq!(mean, 2.5);
        assert_eq!(s, vec![-1.5, -0.5, 0.5, 1.5]);
    }

    #[test]
    fn pre_emphasis_uses_tap() {
        let mut s = vec![1.0, 1.0, 1.0];
        pre_emphasis(&mut s, -1.0, 1.0);
        assert_eq!(s, vec![0.0, 0.0, 0.0]);
        let mut s = vec![2.0, 3.0];
        pre_emphasis(&mut s, -0.5, 0.0);
        assert_eq!(s, vec![2.0, 2.0]);
    }

    #[test]
    fn acf_of_cosine() {
        // x[n] = cos(2 pi n / 8), N = 512: r[0] = 256, r[4] = -252, r[8] = 252
        let s: Vec<f64> = (0..512).map(|n| (2.0 * PI * n as f64 / 8.0).cos()).collect();
        let mut r = vec![0.0; 9];
        acf(&s, &mut r, 8);
        assert!((r[0] - 256.0).abs() < 1e-9);
        assert!((r[4] + 252.0).abs() < 1e-9);
        assert!((r[8] - 252.0).abs() < 1e-9);
    }

    #[test]
    fn normalized_acf() {
        let s: Vec<f64> = (0..64).map(|n| (2.0 * PI * n as f64 / 8.0).cos()).collect();
        let mut r = vec![0.0; 5];
        let r0 = norm_acf(&s, &mut r, 4);
        assert!(r0 > 0.0);
        assert_eq!(r[0], 1.0);
        assert!(r[1..].iter().all(|v| v.abs() <= 1.0 + 1e-12));

        let zeros = vec![0.0; 16];
        let r0 = norm_acf(&zeros, &mut r, 4);
        assert_eq!(r0, 0.0);
        assert_eq!(r[0], 1.0);
        assert!(r[1..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn mean_acf_divides_by_lag_count() {
        let s = vec![1.0; 8];
        let mut r = vec![0.0; 3];
        mean_acf(&s, &mut r, 2);
        assert!((r[0] - 1.0).abs() < 1e-15);
        assert!((r[1] - 1.0).abs() < 1e-15);
    }

    #[test]
    fn zcr_of_square_wave() {
        // 1 kHz square wave at 10 kHz sampling: 5 samples per half period
        let sf = 10000.0;
        let s: Vec<f64> = (0..101)
            .map(|n| if (n / 5) % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let rate = zero_crossing_rate(&s, sf);
        assert!((rate - 2000.0).abs() <= 20.0, "rate = {rate}");
    }

    #[test]
    fn zcr_needs_three_crossings() {
        let s = vec![-1.0, -0.5, 0.5, 1.0, 1.0, 1.0];
        assert_eq!(zero_crossing_rate(&s, 8000.0), 0.0);
    }

    #[test]
    fn rms_of_sine() {
        let s: Vec<f64> = (0..1000).map(|n| (2.0 * PI * n as f64 / 10.0).sin()).collect();
        assert!((rms(&s) - 1.0 / 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn magnitude() {
        assert_eq!(max_magnitude(&[0.5, -2.0, 1.0]), 2.0);
        assert_eq!(max_magnitude(&[]), 0.0);
    }
}
