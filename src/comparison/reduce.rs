use crate::models::CalcMethod;
use crate::query::Sample;

impl CalcMethod {
    /// Folds a window into one value, or `None` for an empty window.
    ///
    /// `max` starts from zero, so an all-negative window has a `max` of 0.
    /// `min` is the true minimum, not a fold from zero: a zero-seeded `min`
    /// would report 0 for any all-positive window, so `min` of `[10, 20, 30]`
    /// is 10 here.
    pub fn reduce(&self, samples: &[Sample]) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        let values = samples.iter().map(|s| s.value);
        let reduced: f64 = match self {
            CalcMethod::Sum => values.sum(),
            CalcMethod::Avg => values.sum::<f64>() / samples.len() as f64,
            CalcMethod::Max => values.fold(0.0, |acc, v| if acc < v { v } else { acc }),
            CalcMethod::Min => values
                .reduce(|acc, v| if acc > v { v } else { acc })
                .unwrap_or_default(),
        };
        Some(reduced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: &[f64]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(i as f64 * 10.0, *v))
            .collect()
    }

    #[test]
    fn basic_methods() {
        let window = samples(&[10.0, 20.0, 30.0]);
        assert_eq!(CalcMethod::Avg.reduce(&window), Some(20.0));
        assert_eq!(CalcMethod::Sum.reduce(&window), Some(60.0));
        assert_eq!(CalcMethod::Max.reduce(&window), Some(30.0));
        assert_eq!(CalcMethod::Min.reduce(&window), Some(10.0));
    }

    #[test]
    fn min_of_mixed_window() {
        let window = samples(&[10.0, -4.0, 30.0]);
        assert_eq!(CalcMethod::Min.reduce(&window), Some(-4.0));
    }

    #[test]
    fn max_is_floored_at_zero() {
        let window = samples(&[-5.0, -3.0]);
        assert_eq!(CalcMethod::Max.reduce(&window), Some(0.0));
    }

    #[test]
    fn avg_counts_zero_samples() {
        let window = samples(&[0.0, 0.0, 9.0]);
        assert_eq!(CalcMethod::Avg.reduce(&window), Some(3.0));
    }

    #[test]
    fn empty_window_has_no_value() {
        for method in [CalcMethod::Avg, CalcMethod::Sum, CalcMethod::Max, CalcMethod::Min] {
            assert_eq!(method.reduce(&[]), None);
        }
    }
}
