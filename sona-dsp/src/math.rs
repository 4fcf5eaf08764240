//! General numerical mathematics functions.

/// Termination criteria for [`bairstow`].
#[derive(Debug, Clone)]
pub struct Bairstow {
    pub max_iter: usize,
    /// maximum absolute error in the dp value
    pub abs_p_eps: f64,
    /// maximum relative error in the dp value
    pub rel_p_eps: f64,
    pub abs_q_eps: f64,
    pub rel_q_eps: f64,
}

impl Default for Bairstow {
    fn default() -> Self {
        Bairstow {
            max_iter: 100,
            abs_p_eps: 1.0e-12,
            rel_p_eps: 1.0e-6,
            abs_q_eps: 1.0e-12,
            rel_q_eps: 1.0e-6,
        }
    }
}

/// Greatest common divisor; 0 when either argument is 0.
pub fn gcd(n: u32, m: u32) -> u32 {
    if n == 0 || m == 0 {
        return 0;
    }
    let (mut gcd, mut m) = if n > m { (m, n) } else { (n, m) };
    loop {
        let rest = m % gcd;
        if rest == 0 {
            return gcd;
        }
        m = gcd;
        gcd = rest;
    }
}

/// Least common multiple in double precision; 0 when either argument is 0.
pub fn lcm(n: u32, m: u32) -> f64 {
    let g = gcd(n, m);
    if g == 0 {
        return 0.0;
    }
    n as f64 * (m / g) as f64
}

/// Linear inter/extrapolation of `y` at `x` through (x1,y1) and (x2,y2).
pub fn linterpol(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> Option<f64> {
    if (x2 - x1).abs() == 0.0 {
        return None;
    }
    Some(y1 + (x - x1) * (y2 - y1) / (x2 - x1))
}

/// Parabolic fit through three equidistant data points; calculates the
/// constants of `y - Y0 = A*(x - X0)^2`. Returns `(x0, y0, a)` with `x0`
/// relative to the position of `y2`, or `None` when the points lie on a
/// straight line.
pub fn parabola(y1: f64, y2: f64, y3: f64, dx: f64) -> Option<(f64, f64, f64)> {
    let dy = 2.0 * (y1 - y2 - y2 + y3);
    if dy == 0.0 {
        return None;
    }
    let yy = y1 - y3;
    Some((
        dx * yy / dy,
        y2 - yy * yy / (4.0 * dy),
        dy / (4.0 * dx * dx),
    ))
}

/// Bairstow's method for root solving of normalized polynomials with
/// real coefficients. Determines `p` and `q` such that
///
/// ```text
/// (X^2 + pX + q) * sum(r[m] * X^(M-2-m)) = sum(c[m] * X^(M-m))
/// ```
///
/// `c[..=m]` holds the input polynomial (`c[0] == 1`), `p`/`q` carry the
/// starting estimates in and the final estimates out, `r` receives the
/// rest polynomial and `t` is scratch storage (both at least `m - 1`
/// cells). Returns the number of iterations; a value exceeding
/// `term.max_iter` means `p`/`q` are not reliable. `None` on invalid
/// arguments.
pub fn bairstow(
    c: &[f64],
    p: &mut f64,
    q: &mut f64,
    r: &mut [f64],
    m: usize,
    t: &mut [f64],
    term: &Bairstow,
) -> Option<usize> {
    if m < 2 || c.len() <= m || r.len() < m - 1 || t.len() < m - 1 {
        return None;
    }
    if m == 2 {
        // trivial case
        *p = c[1];
        *q = c[2];
        r[0] = 1.0;
        return Some(0);
    }
    let m_1 = m - 1;
    let mut dp = 0.0f64;
    let mut dq = 0.0f64;
    r[0] = 1.0;
    t[0] = 1.0;
    let mut iterations = term.max_iter + 1; // signals no convergence
    for i in 0..term.max_iter {
        r[1] = c[1] - *p; // j = 1 case outside the loop
        t[1] = r[1] - *p;
        for j in 2..m_1 {
            r[j] = c[j] - *p * r[j - 1] - *q * r[j - 2];
            t[j] = r[j] - *p * t[j - 1] - *q * t[j - 2];
        }
        // the last values stay in locals, not in the arrays
        let (k, l) = (m - 2, m - 3);
        let r_m_1 = c[m_1] - *p * r[k] - *q * r[l];
        let t_r = -*p * t[k] - *q * t[l]; // t[M-1] - r[M-1]
        let r_m = c[m] - *p * r_m_1 - *q * r[k];
        let det = t[k] * t[k] - t_r * t[l];
        if det == 0.0 {
            // improbable but who knows?
            dp = if dp < 0.0 { -1.0 } else { 1.0 };
            dq = if dq < 0.0 { -1.0 } else { 1.0 };
        } else {
            dp = (t[k] * r_m_1 - t[l] * r_m) / det;
            dq = if t[l] == 0.0 {
                (r_m - t_r * dp) / t[k]
            } else {
                (r_m_1 - t[k] * dp) / t[l]
            };
        }
        *p += dp;
        *q += dq;
        let pe = p.abs() * term.rel_p_eps + term.abs_p_eps;
        let qe = q.abs() * term.rel_q_eps + term.abs_q_eps;
        if dp.abs() <= pe && dq.abs() <= qe {
            iterations = i + 1;
            break;
        }
    }
    // construct the rest polynomial
    r[0] = 1.0;
    r[1] = c[1] - *p;
    if m_1 > 2 {
        r[2] = c[2] - *p * r[1] - *q;
        for j in 3..m_1 {
            r[j] = c[j] - *p * r[j - 1] - *q * r[j - 2];
        }
    }
    Some(iterations)
}

/// Whether `X^2 + pX + q` has complex conjugate roots.
pub fn has_ccr(p: f64, q: f64) -> bool {
    q > 0.0 && q > 0.25 * p * p
}

/// Zeroth order modified Bessel function of the first kind with
/// user-definable accuracy (series expansion).
pub fn bessel_i0(x: f64, eps: f64) -> f64 {
    if x == 0.0 {
        return 1.0;
    }
    let eps = if eps <= 0.0 { 0.5e-6 } else { eps };
    let x2 = 0.5 * x;
    let mut fact = 1.0; // k!
    let mut pow = x2; // (x/2)^k
    let mut term = pow * pow;
    let mut y = 1.0 + term;
    let mut k = 2.0f64;
    while term > eps {
        pow *= x2;
        fact *= k;
        term = pow / fact;
        term *= term;
        y += term;
        k += 1.0;
    }
    y
}

/// Polynomial approximation of the zeroth order modified Bessel function
/// of the first kind (error below 2e-7).
pub fn bessel_i0_approx(x: f64) -> f64 {
    if x == 0.0 {
        return 1.0;
    }
    let ax = x.abs();
    if ax < 3.75 {
        let t = (x / 3.75) * (x / 3.75);
        1.0 + t * (3.5156229
            + t * (3.0899424
                + t * (1.2067492 + t * (0.2659732 + t * (0.0360768 + t * 0.0045813)))))
    } else {
        let t = 3.75 / ax;
        (ax.exp() / ax.sqrt())
            * (0.39894228
                + t * (0.01328592
                    + t * (0.00225319
                        + t * (-0.00157565
                            + t * (0.00916281
                                + t * (-0.02057706
                                    + t * (0.02635537
                                        + t * (-0.01647633 + t * 0.00392377))))))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcd_lcm() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(0, 5), 0);
        assert_eq!(lcm(4, 6), 12.0);
        assert_eq!(lcm(0, 6), 0.0);
    }

    #[test]
    fn linterpol_basics() {
        assert_eq!(linterpol(0.0, 0.0, 2.0, 4.0, 1.0), Some(2.0));
        assert_eq!(linterpol(1.0, 3.0, 1.0, 5.0, 2.0), None);
    }

    #[test]
    fn parabola_vertex() {
        // y = (x - 0.5)^2 sampled at -1, 0, 1 around x = 0
        let (x0, y0, a) = parabola(2.25, 0.25, 0.25, 1.0).unwrap();
        assert!((x0 - 0.5).abs() < 1e-12);
        assert!((y0 - 0.0).abs() < 1e-12);
        assert!((a - 1.0).abs() < 1e-12);
        assert!(parabola(1.0, 2.0, 3.0, 1.0).is_none());
    }

    #[test]
    fn bairstow_trivial_quadratic() {
        let c = [1.0, -3.0, 2.0];
        let (mut p, mut q) = (0.0, 0.0);
        let mut r = [0.0; 2];
        let mut t = [0.0; 2];
        let it = bairstow(&c, &mut p, &mut q, &mut r, 2, &mut t, &Bairstow::default()).unwrap();
        assert_eq!(it, 0);
        assert_eq!(p, -3.0);
        assert_eq!(q, 2.0);
    }

    #[test]
    fn bairstow_extracts_quadratic_factor() {
        // (x^2 + x + 0.5)(x^2 - 0.5x + 0.25)
        let c = [1.0, 0.5, 0.25, 0.125, 0.125];
        let (mut p, mut q) = (0.9, 0.4);
        let mut r = [0.0; 4];
        let mut t = [0.0; 4];
        let term = Bairstow::default();
        let it = bairstow(&c, &mut p, &mut q, &mut r, 4, &mut t, &term).unwrap();
        assert!(it <= term.max_iter);
        assert!((p - 1.0).abs() < 1e-6);
        assert!((q - 0.5).abs() < 1e-6);
        assert!((r[0] - 1.0).abs() < 1e-12);
        assert!((r[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn ccr_detection() {
        assert!(has_ccr(0.0, 1.0));
        assert!(!has_ccr(2.0, 1.0)); // double real root
        assert!(!has_ccr(0.0, -1.0));
    }

    #[test]
    fn bessel_agreement() {
        for &x in &[0.0, 0.5, 1.0, 2.0, 3.74, 3.76, 10.0] {
            let series = bessel_i0(x, 1e-12);
            let approx = bessel_i0_approx(x);
            assert!((series - approx).abs() / series < 3e-7, "x = {x}");
        }
    }
}
