/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Matching key for a display name: lower-cased and trimmed, everything but
/// `[a-z0-9]` and whitespace dropped, whitespace runs collapsed to one space.
///
/// Idempotent: `normalize_name(&normalize_name(s)) == normalize_name(s)`.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a numeric cell. Empty, unparseable and non-finite values are `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let c = clean_str(raw);
    if c.is_empty() {
        return None;
    }
    c.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_str_strips_quotes_and_space() {
        assert_eq!(clean_str("  \"Raw\" "), "Raw");
        assert_eq!(clean_str("\""), "\"");
        assert_eq!(clean_str("plain"), "plain");
    }

    #[test]
    fn normalize_name_examples() {
        assert_eq!(normalize_name("Jane Doe"), "jane doe");
        assert_eq!(normalize_name("  JOHN   q.  Public-Smith "), "john q publicsmith");
        assert_eq!(normalize_name("Zoë #1"), "zo 1");
        assert_eq!(normalize_name("Line\tBreak\nName"), "line break name");
        assert_eq!(normalize_name("!!!"), "");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn normalize_name_is_idempotent() {
        for s in [
            "Jane Doe",
            " a  b ",
            "Ünïcödé Nåme",
            "x - y",
            "O'Neil Jr.",
            "\u{00a0}nbsp\u{00a0}name",
            "123 456",
        ] {
            let once = normalize_name(s);
            assert_eq!(normalize_name(&once), once, "input {:?}", s);
        }
    }

    #[test]
    fn parse_number_degrades_to_none() {
        assert_eq!(parse_number("100"), Some(100.0));
        assert_eq!(parse_number(" 62.5 "), Some(62.5));
        assert_eq!(parse_number("\"-17.5\""), Some(-17.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }
}
