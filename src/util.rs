// Number helpers and display formatting.
//
// Values are abbreviated on the Indian scale: thousand (K), lakh (L) and
// crore (Cr). Everything here is presentation only; aggregation works on the
// raw `f64`.
use num_format::{Locale, ToFormattedString};

const CRORE: f64 = 10_000_000.0;
const LAKH: f64 = 100_000.0;
const THOUSAND: f64 = 1_000.0;

/// Placeholder shown for cells with no data.
pub const EMPTY_CELL: &str = "-";

pub fn average(v: &[f64]) -> f64 {
    // Mean of the slice; an empty slice gives 0 rather than NaN.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

// Magnitude without sign, e.g. `1.2Cr`, `45.0K`, `950`.
fn abbreviate(abs: f64) -> String {
    if abs >= CRORE {
        format!("{:.1}Cr", abs / CRORE)
    } else if abs >= LAKH {
        format!("{:.1}L", abs / LAKH)
    } else if abs >= THOUSAND {
        format!("{:.1}K", abs / THOUSAND)
    } else {
        format_int(abs.round() as i64)
    }
}

fn sign(n: f64) -> &'static str {
    if n < 0.0 {
        "-"
    } else {
        ""
    }
}

pub fn format_currency(n: f64) -> String {
    if n.is_nan() || n == 0.0 {
        return "₹0".to_string();
    }
    format!("{}₹{}", sign(n), abbreviate(n.abs()))
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "0".to_string();
    }
    format!("{}{}", sign(n), abbreviate(n.abs()))
}

pub fn format_percentage(n: f64) -> String {
    if n.is_nan() {
        return "0%".to_string();
    }
    format!("{:.1}%", n)
}

/// How a metric's values are displayed, decided from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Currency,
    Percentage,
    Count,
}

impl MetricKind {
    pub fn of(metric: &str) -> Self {
        let m = metric.to_lowercase();
        if ["sales", "amount", "vat", "value"].iter().any(|k| m.contains(k)) {
            MetricKind::Currency
        } else if m.contains("percentage") || m.contains("rate") {
            MetricKind::Percentage
        } else {
            MetricKind::Count
        }
    }
}

/// Render one cell of `metric`. Missing values and zero print as `-`.
pub fn format_metric_value(metric: &str, value: Option<f64>) -> String {
    let n = match value {
        Some(n) if n != 0.0 && !n.is_nan() => n,
        _ => return EMPTY_CELL.to_string(),
    };
    match MetricKind::of(metric) {
        MetricKind::Currency => format_currency(n),
        MetricKind::Percentage => format_percentage(n),
        MetricKind::Count => format_number(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_uses_indian_scale() {
        assert_eq!(format_currency(12_345_678.0), "₹1.2Cr");
        assert_eq!(format_currency(250_000.0), "₹2.5L");
        assert_eq!(format_currency(4_560.0), "₹4.6K");
        assert_eq!(format_currency(999.4), "₹999");
    }

    #[test]
    fn currency_placeholder_and_sign() {
        assert_eq!(format_currency(0.0), "₹0");
        assert_eq!(format_currency(f64::NAN), "₹0");
        assert_eq!(format_currency(-500.0), "-₹500");
        assert_eq!(format_currency(-1_500_000.0), "-₹15.0L");
    }

    #[test]
    fn number_and_percentage() {
        assert_eq!(format_number(f64::NAN), "0");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-2_000.0), "-2.0K");
        assert_eq!(format_percentage(12.345), "12.3%");
        assert_eq!(format_percentage(f64::NAN), "0%");
    }

    #[test]
    fn metric_kind_follows_name() {
        assert_eq!(MetricKind::of("Gross Sales"), MetricKind::Currency);
        assert_eq!(MetricKind::of("Average Transaction Value"), MetricKind::Currency);
        assert_eq!(MetricKind::of("Discount Percentage"), MetricKind::Percentage);
        assert_eq!(MetricKind::of("Retention Rate"), MetricKind::Percentage);
        assert_eq!(MetricKind::of("Footfall"), MetricKind::Count);
    }

    #[test]
    fn empty_and_zero_cells_print_placeholder() {
        assert_eq!(format_metric_value("Gross Sales", None), EMPTY_CELL);
        assert_eq!(format_metric_value("Gross Sales", Some(0.0)), EMPTY_CELL);
        assert_eq!(format_metric_value("Footfall", Some(1_234.0)), "1.2K");
    }

    #[test]
    fn average_of_empty_is_zero() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[2.0, 4.0]), 3.0);
    }
}
