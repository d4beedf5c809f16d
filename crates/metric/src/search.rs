//! Derivative-free scalar minimization over the shift variable.
//!
//! `minimize_bounded` is Brent's method restricted to a closed interval
//! (golden-section steps with parabolic interpolation, interior points
//! only). `bracket` grows a downhill triple from two starting points, so an
//! unbounded search can hand a finite interval to the bounded solver.

/// `(3 - sqrt(5)) / 2`
const GOLDEN_MEAN: f64 = 0.381_966_011_250_105_1;
const GOLD: f64 = 1.618_034;
const GROW_LIMIT: f64 = 110.0;
const VERY_SMALL: f64 = 1e-21;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Minimum {
    pub x: f64,
    pub fx: f64,
    pub evaluations: usize,
    pub iterations: usize,
    pub converged: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Bracket {
    pub lo: f64,
    pub hi: f64,
    pub best_x: f64,
    pub best_fx: f64,
    pub evaluations: usize,
    pub found: bool,
}

#[inline]
fn sign_or_one(v: f64) -> f64 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}

pub(crate) fn minimize_bounded<F, E>(
    mut f: F,
    lo: f64,
    hi: f64,
    x_tolerance: f64,
    max_iterations: usize,
) -> Result<Minimum, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    let sqrt_eps = f64::EPSILON.sqrt();
    let (mut a, mut b) = if lo <= hi { (lo, hi) } else { (hi, lo) };

    let mut fulc = a + GOLDEN_MEAN * (b - a);
    let mut nfc = fulc;
    let mut xf = fulc;
    let mut rat = 0.0_f64;
    let mut e = 0.0_f64;
    let mut fx = f(xf)?;
    let mut evaluations = 1;
    let mut ffulc = fx;
    let mut fnfc = fx;
    let mut xm = 0.5 * (a + b);
    let mut tol1 = sqrt_eps * xf.abs() + x_tolerance / 3.0;
    let mut tol2 = 2.0 * tol1;
    let mut iterations = 0;
    let mut converged = true;

    while (xf - xm).abs() > tol2 - 0.5 * (b - a) {
        if iterations >= max_iterations {
            converged = false;
            break;
        }
        iterations += 1;

        let mut golden = true;
        if e.abs() > tol1 {
            golden = false;
            let mut r = (xf - nfc) * (fx - ffulc);
            let mut q = (xf - fulc) * (fx - fnfc);
            let mut p = (xf - fulc) * q - (xf - nfc) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            r = e;
            e = rat;

            if p.abs() < (0.5 * q * r).abs() && p > q * (a - xf) && p < q * (b - xf) {
                rat = p / q;
                let x = xf + rat;
                if (x - a) < tol2 || (b - x) < tol2 {
                    rat = tol1 * sign_or_one(xm - xf);
                }
            } else {
                golden = true;
            }
        }
        if golden {
            e = if xf >= xm { a - xf } else { b - xf };
            rat = GOLDEN_MEAN * e;
        }

        let x = xf + sign_or_one(rat) * rat.abs().max(tol1);
        let fu = f(x)?;
        evaluations += 1;

        if fu <= fx {
            if x >= xf {
                a = xf;
            } else {
                b = xf;
            }
            fulc = nfc;
            ffulc = fnfc;
            nfc = xf;
            fnfc = fx;
            xf = x;
            fx = fu;
        } else {
            if x < xf {
                a = x;
            } else {
                b = x;
            }
            if fu <= fnfc || nfc == xf {
                fulc = nfc;
                ffulc = fnfc;
                nfc = x;
                fnfc = fu;
            } else if fu <= ffulc || fulc == xf || fulc == nfc {
                fulc = x;
                ffulc = fu;
            }
        }

        xm = 0.5 * (a + b);
        tol1 = sqrt_eps * xf.abs() + x_tolerance / 3.0;
        tol2 = 2.0 * tol1;
    }

    Ok(Minimum {
        x: xf,
        fx,
        evaluations,
        iterations,
        converged,
    })
}

/// Searches downhill from `xa`, `xb` until the middle of three points is
/// lower than both outer points.
pub(crate) fn bracket<F, E>(
    mut f: F,
    xa: f64,
    xb: f64,
    max_iterations: usize,
) -> Result<Bracket, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    let (mut xa, mut xb) = (xa, xb);
    let mut fa = f(xa)?;
    let mut fb = f(xb)?;
    if fa < fb {
        std::mem::swap(&mut xa, &mut xb);
        std::mem::swap(&mut fa, &mut fb);
    }
    let mut xc = xb + GOLD * (xb - xa);
    let mut fc = f(xc)?;
    let mut evaluations = 3;
    let mut iterations = 0;

    while fc < fb {
        if iterations >= max_iterations {
            return Ok(Bracket {
                lo: xa.min(xc),
                hi: xa.max(xc),
                best_x: xc,
                best_fx: fc,
                evaluations,
                found: false,
            });
        }
        iterations += 1;

        let tmp1 = (xb - xa) * (fb - fc);
        let tmp2 = (xb - xc) * (fb - fa);
        let val = tmp2 - tmp1;
        let denom = if val.abs() < VERY_SMALL {
            2.0 * VERY_SMALL
        } else {
            2.0 * val
        };
        let mut w = xb - ((xb - xc) * tmp2 - (xb - xa) * tmp1) / denom;
        let wlim = xb + GROW_LIMIT * (xc - xb);
        let mut fw;

        if (w - xc) * (xb - w) > 0.0 {
            fw = f(w)?;
            evaluations += 1;
            if fw < fc {
                xa = xb;
                xb = w;
                fb = fw;
                break;
            } else if fw > fb {
                xc = w;
                break;
            }
            w = xc + GOLD * (xc - xb);
            fw = f(w)?;
            evaluations += 1;
        } else if (w - wlim) * (wlim - xc) >= 0.0 {
            w = wlim;
            fw = f(w)?;
            evaluations += 1;
        } else if (w - wlim) * (xc - w) > 0.0 {
            fw = f(w)?;
            evaluations += 1;
            if fw < fc {
                xb = xc;
                xc = w;
                w = xc + GOLD * (xc - xb);
                fb = fc;
                fc = fw;
                fw = f(w)?;
                evaluations += 1;
            }
        } else {
            w = xc + GOLD * (xc - xb);
            fw = f(w)?;
            evaluations += 1;
        }

        xa = xb;
        xb = xc;
        xc = w;
        fa = fb;
        fb = fc;
        fc = fw;
    }

    Ok(Bracket {
        lo: xa.min(xc),
        hi: xa.max(xc),
        best_x: xb,
        best_fx: fb,
        evaluations,
        found: true,
    })
}
