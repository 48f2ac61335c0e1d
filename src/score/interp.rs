//! Piecewise-linear interpolation over explicit control points.
//!
//! Every FH sub-score is a curve of the form:
//!
//! ```text
//! f(x) = y_i + (x - x_i) * (y_{i+1} - y_i) / (x_{i+1} - x_i)    for x_i <= x <= x_{i+1}
//! ```
//!
//! Outside the control points the curve is flat (first/last output), and the
//! result is clipped to the outputs' range so a misordered table can never
//! push a sub-score outside its bounds.

/// Interpolate `x` over `points` (inputs strictly ascending).
pub fn interpolate(x: f64, points: &[(f64, f64)]) -> f64 {
    let (Some(&(x0, y0)), Some(&(xn, yn))) = (points.first(), points.last()) else {
        return 0.0;
    };

    let y = if x <= x0 {
        y0
    } else if x >= xn {
        yn
    } else {
        points
            .windows(2)
            .find(|w| x <= w[1].0)
            .map(|w| {
                let (xa, ya) = w[0];
                let (xb, yb) = w[1];
                ya + (x - xa) * (yb - ya) / (xb - xa)
            })
            .unwrap_or(yn)
    };

    let (lo, hi) = output_bounds(points);
    y.clamp(lo, hi)
}

/// Interpolate an optional input; missing or NaN inputs take the middle
/// control point's input. Infinities land on the flat ends.
pub fn interpolate_or_mid(x: Option<f64>, points: &[(f64, f64)]) -> f64 {
    let x = match x {
        Some(v) if !v.is_nan() => v,
        _ => mid_input(points),
    };
    interpolate(x, points)
}

pub fn mid_input(points: &[(f64, f64)]) -> f64 {
    points.get(points.len() / 2).map(|p| p.0).unwrap_or(0.0)
}

fn output_bounds(points: &[(f64, f64)]) -> (f64, f64) {
    points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| {
            (lo.min(y), hi.max(y))
        })
}
