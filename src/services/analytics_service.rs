//! Derived series computed from price tables

use crate::models::Histogram;

/// Number of bins used by the closing-price histogram
pub const HISTOGRAM_BINS: usize = 20;

/// Close-to-close percentage change.
///
/// The output has the same length as `values`; the first entry, and any entry
/// whose change is not finite (zero or missing previous value), is `None`.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(values.windows(2).map(|w| {
        let change = (w[1] - w[0]) / w[0] * 100.0;
        change.is_finite().then_some(change)
    }));
    out
}

/// Split the observed range of `values` into `bins` equal-width intervals.
///
/// The last bin is closed on the right so the maximum is counted. A constant
/// series is widened to `[v - 0.5, v + 0.5]`; non-finite values are ignored.
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    let bins = bins.max(1);
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();

    let (mut lo, mut hi) = min_max(&finite).unwrap_or((0.0, 1.0));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins)
        .map(|i| if i == bins { hi } else { lo + width * i as f64 })
        .collect();

    let mut counts = vec![0usize; bins];
    for v in finite {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Histogram { edges, counts }
}

/// Minimum and maximum of the finite values, `None` when there are none
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Axis bounds with 10% headroom on each side; never a zero-width range
pub fn padded_range(values: &[f64]) -> (f64, f64) {
    match min_max(values) {
        Some((lo, hi)) => {
            let span = (hi - lo).max(1e-8);
            let padding = if hi > lo { span * 0.1 } else { lo.abs().max(1.0) * 0.1 };
            (lo - padding, hi + padding)
        }
        None => (-1.0, 1.0),
    }
}
