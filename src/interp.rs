//! Lagrange interpolation through evenly spaced samples.

/// Interpolates `y` at `x`, where `y[i]` is the value at abscissa `i`.
/// Weights are accumulated in cascade so each sample costs one multiply
/// and one divide. Errors are negligible with ten points and `x` in the
/// middle of the window, i.e. five samples on either side.
///
/// When `x` lands exactly on an abscissa every weight degenerates: the
/// tabulated sample is returned unchanged instead of dividing by zero.
pub(crate) fn interpolate(y: &[f64], x: f64) -> f64 {
    let n = y.len();
    let mut c = 1.0;
    let mut t = 1.0;

    for i in 0..n {
        c *= x - i as f64;
        if i > 0 {
            t *= -(i as f64);
        }
    }

    if c == 0.0 {
        // on an abscissa
        y[(x + 0.5) as usize]
    } else {
        let mut rval = y[0] / (t * x);
        for i in 1..n {
            t *= i as f64 / (i as f64 - n as f64);
            rval += y[i] / (t * (x - i as f64));
        }
        rval * c
    }
}
