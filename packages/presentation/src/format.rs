//! Display formatting for shares and currency amounts.

/// Formats a fraction as a percentage with one decimal (`0.153` → `15.3%`).
#[must_use]
pub fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Formats an amount as whole pounds with thousands separators
/// (`1234567.8` → `£1,234,568`).
#[must_use]
pub fn pounds(amount: f64) -> String {
    let rounded = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, digit) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if amount < 0.0 && rounded != "0" {
        format!("-£{grouped}")
    } else {
        format!("£{grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_percent() {
        assert_eq!(percent(0.153), "15.3%");
        assert_eq!(percent(0.0), "0.0%");
        assert_eq!(percent(1.0), "100.0%");
    }

    #[test]
    fn formats_pounds_with_separators() {
        assert_eq!(pounds(0.0), "£0");
        assert_eq!(pounds(999.4), "£999");
        assert_eq!(pounds(1_000.0), "£1,000");
        assert_eq!(pounds(1_234_567.8), "£1,234,568");
        assert_eq!(pounds(-45_000.0), "-£45,000");
    }
}
