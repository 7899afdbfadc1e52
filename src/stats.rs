use serde::Serialize;
use statrs::statistics::Statistics;

/// Slope and intercept of `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn is_finite(&self) -> bool {
        self.slope.is_finite() && self.intercept.is_finite()
    }
}

/// Ordinary least squares through the closed-form normal equations.
///
/// With fewer than two points, or when every x is the same, the result is
/// NaN or infinite. Callers discard non-finite fits.
pub fn linear_regression_least_squares(xs: &[f64], ys: &[f64]) -> LinearFit {
    let n = xs.len().min(ys.len()) as f64;
    let (mut x_sum, mut y_sum, mut xx_sum, mut xy_sum) = (0.0, 0.0, 0.0, 0.0);

    for (&x, &y) in xs.iter().zip(ys) {
        x_sum += x;
        y_sum += y;
        xx_sum += x * x;
        xy_sum += x * y;
    }

    let slope = (n * xy_sum - x_sum * y_sum) / (n * xx_sum - x_sum * x_sum);
    let intercept = (y_sum - slope * x_sum) / n;

    LinearFit { slope, intercept }
}

/// Element at index `floor(n / 2)` of the sorted values.
///
/// For an even count this is the upper of the two middle elements, not their
/// mean. Weekday charts have always been built this way.
pub fn upper_median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(sorted[sorted.len() / 2])
}

/// Nearest-rank quantile of already sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * q).round() as usize;
    sorted[idx]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub q10: f64,
    pub q50: f64,
    pub q90: f64,
}

impl SeriesSummary {
    pub fn from_values(values: &[f64]) -> Option<SeriesSummary> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        // Sample deviation is undefined for a single point
        let std_dev = if sorted.len() > 1 { sorted.iter().std_dev() } else { 0.0 };

        Some(SeriesSummary {
            count: sorted.len(),
            mean: sorted.iter().mean(),
            std_dev,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            q10: quantile(&sorted, 0.10),
            q50: quantile(&sorted, 0.50),
            q90: quantile(&sorted, 0.90),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_a_known_line() {
        let fit = linear_regression_least_squares(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0]);
        assert!((fit.slope - 1.0).abs() < 1e-9);
        assert!((fit.intercept - 1.0).abs() < 1e-9);
        assert!((fit.at(10.0) - 11.0).abs() < 1e-9);
    }

    #[test]
    fn fits_noisy_points() {
        // y = 2x - 1 with symmetric noise
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [1.5, 2.5, 5.5, 6.5];
        let fit = linear_regression_least_squares(&xs, &ys);
        assert!((fit.slope - 1.8).abs() < 1e-9);
        assert!((fit.intercept - (-0.5)).abs() < 1e-9);
    }

    #[test]
    fn degenerate_inputs_are_not_finite() {
        assert!(!linear_regression_least_squares(&[], &[]).is_finite());
        assert!(!linear_regression_least_squares(&[5.0], &[3.0]).is_finite());
        assert!(!linear_regression_least_squares(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).is_finite());
    }

    #[test]
    fn upper_median_picks_upper_middle() {
        assert_eq!(upper_median(&[30.0, 10.0, 20.0]), Some(20.0));
        assert_eq!(upper_median(&[20.0, 10.0]), Some(20.0));
        assert_eq!(upper_median(&[7.0]), Some(7.0));
        assert_eq!(upper_median(&[]), None);
    }

    #[test]
    fn summary_of_prices() {
        let summary = SeriesSummary::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(summary.count, 8);
        assert!((summary.mean - 5.0).abs() < 1e-9);
        // sample standard deviation
        assert!((summary.std_dev - 2.138089935).abs() < 1e-6);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 9.0);
        assert_eq!(summary.q50, 5.0);
        assert!(SeriesSummary::from_values(&[]).is_none());
    }
}
