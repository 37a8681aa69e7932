//! Published comparison results and their text exposition.

use std::fmt::Write;

use parking_lot::RwLock;

use crate::metrics;
use crate::models::ComparisonResult;

/// The result set served to scrapers. Replaced wholesale after each pass.
#[derive(Debug, Default)]
pub struct PublishedResults {
    results: RwLock<Vec<ComparisonResult>>,
}

impl PublishedResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, results: Vec<ComparisonResult>) {
        let count = results.len();
        *self.results.write() = results;
        metrics::set_published_results(count);
    }

    pub fn snapshot(&self) -> Vec<ComparisonResult> {
        self.results.read().clone()
    }

    pub fn render(&self) -> String {
        render(&self.results.read())
    }
}

/// One `name{k="v",...} value` line per result, value to two decimals.
pub fn render(results: &[ComparisonResult]) -> String {
    let mut out = String::new();
    for result in results {
        out.push_str(&result.name);
        out.push('{');
        for (i, (key, value)) in result.labels.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{}=\"{}\"", key, escape_label_value(value));
        }
        out.push_str("} ");
        out.push_str(&format_value(result.value));
        out.push('\n');
    }
    out
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{:.2}", value)
    }
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(labels: &[(&str, &str)], value: f64) -> ComparisonResult {
        ComparisonResult {
            name: "cpu_diff".to_string(),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            value,
        }
    }

    #[test]
    fn renders_labels_in_insertion_order() {
        let output = render(&[result(&[("host", "h1"), ("calc_type", "diff")], 12.345)]);
        assert_eq!(output, "cpu_diff{host=\"h1\",calc_type=\"diff\"} 12.35\n");
    }

    #[test]
    fn one_line_per_result() {
        let output = render(&[
            result(&[("host", "h1"), ("calc_type", "diff")], 1.0),
            result(&[("host", "h1"), ("calc_type", "diff_percent")], -2.5),
        ]);
        assert_eq!(
            output,
            "cpu_diff{host=\"h1\",calc_type=\"diff\"} 1.00\n\
             cpu_diff{host=\"h1\",calc_type=\"diff_percent\"} -2.50\n"
        );
    }

    #[test]
    fn non_finite_values() {
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_value(f64::NAN), "NaN");
    }

    #[test]
    fn quotes_in_values_are_escaped() {
        let output = render(&[result(&[("path", "a\"b"), ("calc_type", "diff")], 0.0)]);
        assert_eq!(output, "cpu_diff{path=\"a\\\"b\",calc_type=\"diff\"} 0.00\n");
    }

    #[test]
    fn replace_swaps_whole_set() {
        let published = PublishedResults::new();
        published.replace(vec![result(&[("calc_type", "diff")], 1.0)]);
        published.replace(vec![]);
        assert!(published.snapshot().is_empty());
        assert_eq!(published.render(), "");
    }
}
