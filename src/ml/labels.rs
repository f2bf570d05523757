//! Label normalization so `1`, `1.0` and ` 1 ` name the same class.

/// Canonical text form of a class label.
pub fn normalize_label(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", value as i64)
        }
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_collapse() {
        assert_eq!(normalize_label("1"), "1");
        assert_eq!(normalize_label(" 1.0 "), "1");
        assert_eq!(normalize_label("-0"), "0");
        assert_eq!(normalize_label("0.5"), "0.5");
        assert_eq!(normalize_label(" yes "), "yes");
    }
}
