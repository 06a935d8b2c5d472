//! Density Estimation Module
//! Histogram binning and Gaussian kernel density estimates for the
//! distribution charts.

use statrs::distribution::{Continuous, Normal};

/// Equal-width histogram of finite values.
#[derive(Debug, Clone, Default)]
pub struct Histogram {
    /// Bin edges; one more entry than `counts`.
    pub edges: Vec<f64>,
    pub counts: Vec<u32>,
}

impl Histogram {
    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Bin values into equal-width bins anchored at the floored minimum.
/// Non-finite values are ignored; an empty input or non-positive `binwidth`
/// yields an empty histogram.
pub fn histogram(values: &[f64], binwidth: f64) -> Histogram {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || binwidth <= 0.0 {
        return Histogram::default();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let start = (min / binwidth).floor() * binwidth;
    let bins = (((max - start) / binwidth).floor() as usize) + 1;

    let mut counts = vec![0u32; bins];
    for value in &finite {
        let index = (((value - start) / binwidth) as usize).min(bins - 1);
        counts[index] += 1;
    }

    let edges = (0..=bins)
        .map(|i| start + i as f64 * binwidth)
        .collect();
    Histogram { edges, counts }
}

/// Gaussian kernel density estimate over an evenly spaced grid spanning the
/// data (padded by three bandwidths), Silverman's rule for the bandwidth.
/// Returns (x, density) pairs; fewer than two distinct finite values yield
/// an empty curve.
pub fn gaussian_kde(values: &[f64], grid_len: usize) -> Vec<(f64, f64)> {
    let data: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let n = data.len();
    if n < 2 || grid_len < 2 {
        return Vec::new();
    }

    let bandwidth = silverman_bandwidth(&data);
    if bandwidth <= 0.0 {
        return Vec::new();
    }
    let Ok(kernel) = Normal::new(0.0, 1.0) else {
        return Vec::new();
    };

    let min = data.iter().copied().fold(f64::INFINITY, f64::min) - 3.0 * bandwidth;
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 3.0 * bandwidth;
    let step = (max - min) / (grid_len - 1) as f64;

    (0..grid_len)
        .map(|i| {
            let x = min + i as f64 * step;
            let density = data
                .iter()
                .map(|value| kernel.pdf((x - value) / bandwidth))
                .sum::<f64>()
                / (n as f64 * bandwidth);
            (x, density)
        })
        .collect()
}

/// Silverman's rule of thumb: 0.9 * min(std, iqr / 1.34) * n^(-1/5).
fn silverman_bandwidth(data: &[f64]) -> f64 {
    let n = data.len();
    let mean = data.iter().sum::<f64>() / n as f64;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = variance.sqrt();

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let iqr = percentile(&sorted, 75.0) - percentile(&sorted, 25.0);

    let spread = if iqr > 0.0 {
        std.min(iqr / 1.34)
    } else {
        std
    };
    0.9 * spread * (n as f64).powf(-0.2)
}

/// Percentile by linear interpolation over pre-sorted values.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (rank.ceil() as usize).min(n - 1);
    let frac = rank - lower as f64;

    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn histogram_bins_and_counts() {
        let hist = histogram(&[0.5, 1.5, 1.7, 2.2, 9.9], 1.0);
        assert_eq!(hist.edges.len(), hist.counts.len() + 1);
        assert_approx_eq!(hist.edges[0], 0.0, 1e-12);
        assert_eq!(hist.counts[0], 1);
        assert_eq!(hist.counts[1], 2);
        assert_eq!(hist.counts[2], 1);
        assert_eq!(*hist.counts.last().unwrap(), 1);
        assert_eq!(hist.max_count(), 2);
    }

    #[test]
    fn histogram_ignores_non_finite_values() {
        let hist = histogram(&[1.0, f64::NAN, 2.0, f64::INFINITY], 1.0);
        assert_eq!(hist.counts.iter().sum::<u32>(), 2);
    }

    #[test]
    fn histogram_empty_input() {
        assert!(histogram(&[], 1.0).counts.is_empty());
        assert!(histogram(&[1.0], 0.0).counts.is_empty());
    }

    #[test]
    fn kde_integrates_to_one() {
        let values = [1.0, 2.0, 2.5, 3.0, 3.5, 4.0, 5.0, 6.0, 7.5, 8.0];
        let curve = gaussian_kde(&values, 512);
        assert!(!curve.is_empty());

        // trapezoid rule over the grid
        let mut mass = 0.0;
        for pair in curve.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            mass += (x1 - x0) * (y0 + y1) / 2.0;
        }
        assert_approx_eq!(mass, 1.0, 0.01);
    }

    #[test]
    fn kde_needs_at_least_two_values() {
        assert!(gaussian_kde(&[1.0], 128).is_empty());
        assert!(gaussian_kde(&[], 128).is_empty());
    }

    #[test]
    fn percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_approx_eq!(percentile(&sorted, 0.0), 1.0, 1e-12);
        assert_approx_eq!(percentile(&sorted, 50.0), 2.5, 1e-12);
        assert_approx_eq!(percentile(&sorted, 100.0), 4.0, 1e-12);
    }
}
