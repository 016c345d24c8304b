pub mod pages;
pub mod panels;
pub mod plot;

// ---------------------------------------------------------------------------
// Number formatting shared by the panels
// ---------------------------------------------------------------------------

/// `1234567.891` with 2 decimals → `1,234,567.89`.
pub fn fmt_thousands(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    let is_zero = grouped.chars().all(|c| matches!(c, '0' | ',' | '.'));
    if value.is_sign_negative() && !is_zero {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Whole-dollar amount: `-1234.4` → `-$1,234`.
pub fn fmt_money(value: f64) -> String {
    let digits = fmt_thousands(value, 0);
    match digits.strip_prefix('-') {
        Some(rest) => format!("-${rest}"),
        None => format!("${digits}"),
    }
}

pub fn fmt_count(n: usize) -> String {
    fmt_thousands(n as f64, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_thousands() {
        assert_eq!(fmt_thousands(0.0, 0), "0");
        assert_eq!(fmt_thousands(999.0, 0), "999");
        assert_eq!(fmt_thousands(1000.0, 0), "1,000");
        assert_eq!(fmt_thousands(1234567.891, 2), "1,234,567.89");
        assert_eq!(fmt_thousands(-4500.0, 1), "-4,500.0");
        assert_eq!(fmt_thousands(-0.2, 0), "0");
    }

    #[test]
    fn test_fmt_money_and_count() {
        assert_eq!(fmt_money(8911407.9), "$8,911,408");
        assert_eq!(fmt_money(-1234.4), "-$1,234");
        assert_eq!(fmt_count(4338), "4,338");
    }
}
