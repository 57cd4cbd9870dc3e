//! TWD amount formatting

/// Thousands-grouped amount: `1250000.0` → `1,250,000`, `1234.5` → `1,234.5`.
/// Fractions are rounded to two places and dropped when zero.
pub fn group_thousands(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    match frac {
        0 => format!("{sign}{grouped}"),
        f if f % 10 == 0 => format!("{sign}{grouped}.{}", f / 10),
        f => format!("{sign}{grouped}.{f:02}"),
    }
}

/// `NT$ 1,250,000`
pub fn format_twd(amount: f64) -> String {
    format!("NT$ {}", group_thousands(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1_000.0), "1,000");
        assert_eq!(group_thousands(1_250_000.0), "1,250,000");
        assert_eq!(group_thousands(1_234.5), "1,234.5");
        assert_eq!(group_thousands(-700_000.0), "-700,000");
        assert_eq!(group_thousands(12.05), "12.05");
    }

    #[test]
    fn test_format_twd() {
        assert_eq!(format_twd(850_000.0), "NT$ 850,000");
    }
}
