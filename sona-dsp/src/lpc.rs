//! Linear prediction: the Durbin recursion and the algebraic conversions
//! between the equivalent parameter sets.
//!
//! Array dimensions for prediction order `M`:
//!
//! ```text
//! acf[M+1]  lpc[M+1]  rfc[M]  arf[M+1]  lar[M]  cep[M+1]  pqp[M]  rfb[M]
//! ```

use crate::math::{bairstow, has_ccr, Bairstow};
use std::f64::consts::PI;
use thiserror::Error;

const TWO_PI: f64 = 2.0 * PI;

/// Some conversions use fixed-size scratch arrays.
pub const MAX_LP_ORDER: usize = 50;
pub const MAX_FORMANTS: usize = 25;

#[derive(Debug, Error, PartialEq)]
pub enum LpcError {
    #[error("rounding error in recursion")]
    Rounding,
    #[error("unstable filter (|k| >= 1)")]
    Unstable,
    #[error("squared error not positive")]
    NoGain,
    #[error("zero area sum")]
    ZeroArea,
    #[error("root solving did not converge")]
    NoConvergence,
    #[error("invalid arguments")]
    BadArgs,
}

/// Durbin recursion deriving LP filter coefficients and reflection
/// coefficients from the autocorrelation function.
///
/// Returns the squared error signal. If the signal is empty
/// (`acf[0] <= 0`) the standard solution (identity filter, zero error)
/// is stored and returned. On a detected rounding blow-up the standard
/// solution is stored as well and `LpcError::Rounding` is returned.
pub fn durbin(acf: &[f64], lpc: &mut [f64], mut rfc: Option<&mut [f64]>, order: usize)
    -> Result<f64, LpcError>
{
    let standard = |lpc: &mut [f64], rfc: &mut Option<&mut [f64]>| {
        lpc[0] = 1.0;
        for v in lpc[1..=order].iter_mut() {
            *v = 0.0;
        }
        if let Some(rfc) = rfc {
            for v in rfc[..order].iter_mut() {
                *v = 0.0;
            }
        }
    };

    if acf[0] <= 0.0 {
        // standard solution if no signal
        standard(lpc, &mut rfc);
        return Ok(0.0);
    }

    lpc[0] = 1.0;
    lpc[1] = -acf[1] / acf[0];
    if let Some(rfc) = rfc.as_deref_mut() {
        rfc[0] = lpc[1];
    }
    let mut sqerr = acf[0] + lpc[1] * acf[1];
    for m in 2..=order {
        if sqerr < 0.0 {
            // rounding error
            standard(lpc, &mut rfc);
            return Err(LpcError::Rounding);
        }
        let mut sum = acf[m];
        for (i, j) in (1..m).zip((1..m).rev()) {
            sum += lpc[i] * acf[j];
        }
        sum = -sum / sqerr;
        let (mut i, mut j) = (1, m - 1);
        while i < j {
            let save = lpc[j];
            lpc[j] += sum * lpc[i];
            lpc[i] += sum * save;
            i += 1;
            j -= 1;
        }
        if i == j {
            lpc[i] += sum * lpc[i];
        }
        lpc[m] = sum;
        if let Some(rfc) = rfc.as_deref_mut() {
            rfc[m - 1] = sum;
        }
        sqerr *= 1.0 - sum * sum;
    }
    Ok(sqerr)
}

/// Converts LP filter coefficients to reflection coefficients
/// (cascaded recursion, in-place with triangular swap).
pub fn lpc_to_rfc(lpc: &[f64], rfc: &mut [f64], order: usize) -> Result<(), LpcError> {
    for i in 0..order {
        rfc[i] = lpc[i + 1];
    }
    for i in (1..order).rev() {
        let j = (i + 1) >> 1;
        let fac1 = rfc[i];
        if fac1.abs() >= 1.0 {
            return Err(LpcError::Unstable);
        }
        let fac2 = 1.0 - fac1 * fac1;
        let (mut k, mut l) = (0, i - 1);
        while k < j {
            let save = (rfc[k] - fac1 * rfc[l]) / fac2;
            rfc[l] = (rfc[l] - fac1 * rfc[k]) / fac2;
            rfc[k] = save;
            k += 1;
            if l == 0 {
                break;
            }
            l -= 1;
        }
    }
    Ok(())
}

/// Converts reflection coefficients to LP filter coefficients.
pub fn rfc_to_lpc(rfc: &[f64], lpc: &mut [f64], order: usize) -> Result<(), LpcError> {
    if order < 1 {
        return Err(LpcError::BadArgs);
    }
    for m in 0..order {
        if rfc[m].abs() >= 1.0 {
            return Err(LpcError::Unstable);
        }
    }
    lpc[0] = 1.0;
    lpc[1] = rfc[0];
    for m in 2..=order {
        let half = m / 2;
        let save = rfc[m - 1];
        for (j, k) in (1..=half).zip((1..m).rev()) {
            let keep = lpc[j] + save * lpc[k];
            lpc[k] += save * lpc[j];
            lpc[j] = keep;
        }
        lpc[m] = save;
    }
    Ok(())
}

/// Converts reflection coefficients to the vocal tract area function.
/// `arf[0]` corresponds to the area at the lips, `arf[order]` to that at
/// the glottis (normalized to 1).
pub fn rfc_to_arf(rfc: &[f64], arf: &mut [f64], order: usize) -> Result<(), LpcError> {
    arf[order] = 1.0;
    for j in (0..order).rev() {
        if rfc[j].abs() >= 1.0 {
            return Err(LpcError::Unstable);
        }
        arf[j] = arf[j + 1] * (1.0 + rfc[j]) / (1.0 - rfc[j]);
    }
    Ok(())
}

/// Converts an area function to reflection coefficients.
pub fn arf_to_rfc(arf: &[f64], rfc: &mut [f64], order: usize) -> Result<(), LpcError> {
    for i in 0..order {
        if arf[i] == -arf[i + 1] {
            return Err(LpcError::ZeroArea);
        }
        rfc[i] = if arf[i] == arf[i + 1] {
            0.0
        } else {
            (arf[i] - arf[i + 1]) / (arf[i] + arf[i + 1])
        };
    }
    Ok(())
}

/// Converts reflection coefficients to log area ratios.
pub fn rfc_to_lar(rfc: &[f64], lar: &mut [f64], order: usize) -> Result<(), LpcError> {
    for i in (0..order).rev() {
        if rfc[i].abs() >= 1.0 {
            return Err(LpcError::Unstable);
        }
        lar[i] = ((1.0 - rfc[i]) / (1.0 + rfc[i])).ln();
    }
    Ok(())
}

/// Converts log area ratios to reflection coefficients.
pub fn lar_to_rfc(lar: &[f64], rfc: &mut [f64], order: usize) {
    for i in 0..order {
        let fac = lar[i].exp();
        rfc[i] = (1.0 - fac) / (1.0 + fac);
    }
}

/// Converts LP filter coefficients to the first `order + 1` cepstral
/// coefficients via Oppenheim's recursion, using the squared error.
pub fn lpc_to_cep(lpc: &[f64], sqerr: f64, cep: &mut [f64], order: usize)
    -> Result<(), LpcError>
{
    if sqerr <= 0.0 {
        return Err(LpcError::NoGain);
    }
    cep[0] = sqerr.ln();
    cep[1] = -lpc[1];
    for i in 2..=order {
        let mut sum = lpc[i] * i as f64;
        for (j, k) in (1..i).zip((1..i).rev()) {
            sum += lpc[j] * cep[k] * k as f64;
        }
        cep[i] = -sum / i as f64;
    }
    Ok(())
}

/// Converts LP filter coefficients to PQ parameter pairs (coefficients
/// of 2nd-order sections) using Bairstow's method with deflation.
///
/// `pqp` supplies the starting estimates and receives the final ones
/// (`P_n = pqp[2i]`, `Q_n = pqp[2i+1]`). On a non-converged factor, one
/// retry with the neighbour's pair is made. Returns the summed number of
/// iterations.
pub fn lpc_to_pqp(lpc: &[f64], pqp: &mut [f64], order: usize, term: &Bairstow)
    -> Result<usize, LpcError>
{
    if order > MAX_LP_ORDER {
        return Err(LpcError::BadArgs);
    }
    let nf = order / 2;
    let mut c = [0.0f64; MAX_LP_ORDER + 1];
    let mut r = [0.0f64; MAX_LP_ORDER + 1];
    let mut t = [0.0f64; MAX_LP_ORDER + 1];
    let mut p = [0.0f64; MAX_FORMANTS];
    let mut q = [0.0f64; MAX_FORMANTS];
    c[..=order].copy_from_slice(&lpc[..=order]);
    for i in 0..nf {
        p[i] = pqp[2 * i];
        q[i] = pqp[2 * i + 1];
    }

    let mut m = order;
    let mut i = 0usize;
    let mut iter = 0usize;
    let mut retried = false;
    while m >= 2 {
        let j = bairstow(&c[..=m], &mut p[i], &mut q[i], &mut r, m, &mut t, term)
            .ok_or(LpcError::BadArgs)?;
        if j > term.max_iter {
            // only one retry; no convergence error can occur for m = 2
            if retried || m < 4 {
                return Err(LpcError::NoConvergence);
            }
            retried = true;
            p[i] = p[i + 1];
            q[i] = q[i + 1];
            iter += j;
        } else {
            retried = false;
            iter += j;
            i += 1;
            m -= 2; // order of the rest polynomial
            for j in 0..=m {
                c[j] = r[j];
            }
        }
    }
    for i in 0..nf {
        pqp[2 * i] = p[i];
        pqp[2 * i + 1] = q[i];
    }
    Ok(iter)
}

/// Converts formant frequency/bandwidth pairs to PQ parameter pairs.
pub fn ffb_to_pqp(ffb: &[f64], pqp: &mut [f64], num_pairs: usize, samp_freq: f64) {
    let pi_t = PI / samp_freq;
    let two_pi_t = TWO_PI / samp_freq;
    for i in 0..num_pairs {
        pqp[2 * i] = -2.0 * (-pi_t * ffb[2 * i + 1]).exp() * (two_pi_t * ffb[2 * i]).cos();
        pqp[2 * i + 1] = (-two_pi_t * ffb[2 * i + 1]).exp();
    }
}

/// Converts PQ parameter pairs to resonance frequency/bandwidth pairs
/// sorted on increasing frequency. Only pairs with complex conjugate
/// roots are converted; remaining pairs are zeroed. Returns the number
/// of resonances.
pub fn pqp_to_rfb(pqp: &[f64], rfb: &mut [f64], num_pairs: usize, samp_freq: f64) -> usize {
    let fac = samp_freq / TWO_PI;
    let mut n = 0usize; // filled cells
    for m in 0..num_pairs {
        let p = pqp[2 * m];
        let q = pqp[2 * m + 1];
        if has_ccr(p, q) {
            let freq = fac * (-p / (2.0 * q.sqrt())).acos();
            let band = -fac * q.ln();
            let mut i = 0usize;
            while i < n {
                if freq < rfb[i] {
                    // shift to make place
                    let mut j = n;
                    while j > i {
                        rfb[j + 1] = rfb[j - 1];
                        rfb[j] = rfb[j - 2];
                        j -= 2;
                    }
                    break;
                }
                i += 2;
            }
            rfb[i] = freq;
            rfb[i + 1] = band;
            n += 2;
        } // else real roots; don't increase n
    }
    let resonances = n / 2;
    for v in rfb[n..2 * num_pairs].iter_mut() {
        *v = 0.0;
    }
    resonances
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speech_like_acf(order: usize) -> Vec<f64> {
        // ACF of a decaying resonant signal; positive definite
        let mut acf = vec![0.0; order + 1];
        for (m, v) in acf.iter_mut().enumerate() {
            let m = m as f64;
            *v = (0.97f64).powf(m) * (TWO_PI * m * 0.07).cos() * 512.0;
        }
        acf
    }

    #[test]
    fn durbin_no_signal() {
        let acf = vec![0.0; 11];
        let mut lpc = vec![9.0; 11];
        let mut rfc = vec![9.0; 10];
        let err = durbin(&acf, &mut lpc, Some(&mut rfc), 10).unwrap();
        assert_eq!(err, 0.0);
        assert_eq!(lpc[0], 1.0);
        assert!(lpc[1..].iter().all(|&v| v == 0.0));
        assert!(rfc.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn durbin_produces_stable_filter() {
        let order = 12;
        let acf = speech_like_acf(order);
        let mut lpc = vec![0.0; order + 1];
        let mut rfc = vec![0.0; order];
        let sqerr = durbin(&acf, &mut lpc, Some(&mut rfc), order).unwrap();
        assert!(sqerr > 0.0);
        assert!(rfc.iter().all(|&k| k.abs() < 1.0));
    }

    #[test]
    fn lpc_rfc_round_trip() {
        let order = 18;
        let acf = speech_like_acf(order);
        let mut lpc = vec![0.0; order + 1];
        let mut rfc = vec![0.0; order];
        durbin(&acf, &mut lpc, Some(&mut rfc), order).unwrap();

        let mut rfc2 = vec![0.0; order];
        lpc_to_rfc(&lpc, &mut rfc2, order).unwrap();
        for (a, b) in rfc.iter().zip(rfc2.iter()) {
            assert!((a - b).abs() <= 1e-10);
        }
        let mut lpc2 = vec![0.0; order + 1];
        rfc_to_lpc(&rfc2, &mut lpc2, order).unwrap();
        for (a, b) in lpc.iter().zip(lpc2.iter()) {
            assert!((a - b).abs() <= 1e-10);
        }
    }

    #[test]
    fn rfc_arf_round_trip() {
        let rfc = [0.5, -0.3, 0.12, -0.07, 0.01];
        let order = rfc.len();
        let mut arf = vec![0.0; order + 1];
        rfc_to_arf(&rfc, &mut arf, order).unwrap();
        assert_eq!(arf[order], 1.0);
        let mut back = vec![0.0; order];
        arf_to_rfc(&arf, &mut back, order).unwrap();
        for (a, b) in rfc.iter().zip(back.iter()) {
            assert!((a - b).abs() <= 1e-12);
        }
    }

    #[test]
    fn rfc_lar_round_trip() {
        let rfc = [0.9, -0.8, 0.5, 0.0, -0.1];
        let order = rfc.len();
        let mut lar = vec![0.0; order];
        rfc_to_lar(&rfc, &mut lar, order).unwrap();
        assert!((lar[0] - ((1.0 - 0.9f64) / 1.9).ln()).abs() < 1e-15);
        let mut back = vec![0.0; order];
        lar_to_rfc(&lar, &mut back, order);
        for (a, b) in rfc.iter().zip(back.iter()) {
            assert!((a - b).abs() <= 1e-12);
        }
    }

    #[test]
    fn unstable_filters_are_rejected() {
        let rfc = [0.5, 1.0];
        let mut lpc = vec![0.0; 3];
        assert_eq!(rfc_to_lpc(&rfc, &mut lpc, 2), Err(LpcError::Unstable));
        let mut lar = vec![0.0; 2];
        assert_eq!(rfc_to_lar(&rfc, &mut lar, 2), Err(LpcError::Unstable));
    }

    #[test]
    fn cepstrum_first_coefficient_is_log_error() {
        let order = 8;
        let acf = speech_like_acf(order);
        let mut lpc = vec![0.0; order + 1];
        let sqerr = durbin(&acf, &mut lpc, None, order).unwrap();
        let mut cep = vec![0.0; order + 1];
        lpc_to_cep(&lpc, sqerr, &mut cep, order).unwrap();
        assert!((cep[0] - sqerr.ln()).abs() < 1e-15);
        assert!((cep[1] + lpc[1]).abs() < 1e-15);
    }

    #[test]
    fn ffb_pqp_round_trip_sorted() {
        let sf = 16000.0;
        // deliberately unsorted formants
        let ffb = [2500.0, 120.0, 500.0, 60.0, 1500.0, 90.0];
        let mut pqp = vec![0.0; 6];
        ffb_to_pqp(&ffb, &mut pqp, 3, sf);
        let mut rfb = vec![0.0; 6];
        let n = pqp_to_rfb(&pqp, &mut rfb, 3, sf);
        assert_eq!(n, 3);
        assert!((rfb[0] - 500.0).abs() < 1e-6);
        assert!((rfb[1] - 60.0).abs() < 1e-6);
        assert!((rfb[2] - 1500.0).abs() < 1e-6);
        assert!((rfb[4] - 2500.0).abs() < 1e-6);
    }

    #[test]
    fn lpc_to_pqp_recovers_roots() {
        let sf = 10000.0;
        let ffb = [700.0, 80.0, 2300.0, 150.0];
        let mut pqp_true = vec![0.0; 4];
        ffb_to_pqp(&ffb, &mut pqp_true, 2, sf);
        // polynomial = product of the two quadratic factors
        let (p1, q1, p2, q2) = (pqp_true[0], pqp_true[1], pqp_true[2], pqp_true[3]);
        let lpc = [1.0, p1 + p2, q1 + q2 + p1 * p2, p1 * q2 + p2 * q1, q1 * q2];
        // start estimates slightly off
        let mut pqp = vec![p1 + 0.05, q1 - 0.05, p2 - 0.05, q2 + 0.05];
        let term = Bairstow::default();
        lpc_to_pqp(&lpc, &mut pqp, 4, &term).unwrap();
        let mut rfb = vec![0.0; 4];
        let n = pqp_to_rfb(&pqp, &mut rfb, 2, sf);
        assert_eq!(n, 2);
        assert!((rfb[0] - 700.0).abs() < 0.5);
        assert!((rfb[2] - 2300.0).abs() < 0.5);
    }
}
