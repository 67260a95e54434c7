//! Trend lines through the `lowess` crate.

use lowess::prelude::*;

/// Number of robustifying passes after the initial fit.
pub const DEFAULT_ITERATIONS: usize = 3;

/// Smallest number of neighbours a local fit may use.
const MIN_WINDOW: f64 = 3.0;

/// LOWESS trend of `y` against `x`.
///
/// Returns `(x, fitted)` pairs sorted by `x`, one per finite input pair.
/// Fewer than three points come back unsmoothed. A failed fit is logged
/// and yields no trend.
pub fn lowess_trend(x: &[f64], y: &[f64], frac: f64, iterations: usize) -> Vec<[f64; 2]> {
    let mut points: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .map(|(&a, &b)| (a, b))
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = points.len();
    if n < MIN_WINDOW as usize {
        return points.into_iter().map(|(a, b)| [a, b]).collect();
    }

    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
    let frac = frac.clamp(MIN_WINDOW / n as f64, 1.0);

    match fit(&xs, &ys, frac, iterations) {
        Ok(fitted) if fitted.len() == n => xs.into_iter().zip(fitted).map(|(a, b)| [a, b]).collect(),
        Ok(fitted) => {
            log::warn!("LOWESS returned {} values for {n} points", fitted.len());
            Vec::new()
        }
        Err(e) => {
            log::warn!("LOWESS fit failed: {e}");
            Vec::new()
        }
    }
}

fn fit(xs: &[f64], ys: &[f64], frac: f64, iterations: usize) -> std::result::Result<Vec<f64>, String> {
    let model = Lowess::new()
        .fraction(frac)
        .iterations(iterations)
        .adapter(Batch)
        .build()
        .map_err(|e| e.to_string())?;
    let result = model.fit(xs, ys).map_err(|e| e.to_string())?;
    Ok(result.y)
}
