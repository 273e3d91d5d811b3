/// Greedy word wrap; words longer than `width` get a line of their own.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    lines
}

/// Shortens `s` to at most `max_len` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max_len: usize) -> String {
    match max_len {
        0 => return String::new(),
        1 if s.chars().count() > 1 => return "…".to_string(),
        _ => {}
    }

    if s.chars().count() <= max_len {
        return s.to_string();
    }

    let mut out: String = s.chars().take(max_len - 1).collect();
    out.push('…');
    out
}

/// Renders an optional value, or `-` when absent.
pub fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_short_text() {
        assert_eq!(wrap("unknown type ID", 20), vec!["unknown type ID"]);
    }

    #[test]
    fn wrap_long_text() {
        assert_eq!(
            wrap("malformed CFG record in Size section", 16),
            vec!["malformed CFG", "record in Size", "section"]
        );
    }

    #[test]
    fn wrap_empty_text() {
        assert_eq!(wrap("   ", 10), vec![String::new()]);
    }

    #[test]
    fn truncate_short() {
        assert_eq!(truncate("Si", 10), "Si");
    }

    #[test]
    fn truncate_exact() {
        assert_eq!(truncate("END_CFG", 7), "END_CFG");
    }

    #[test]
    fn truncate_long() {
        assert_eq!(truncate("PlusStress", 6), "PlusS…");
    }

    #[test]
    fn truncate_unicode() {
        assert_eq!(truncate("Å³·eV·Å⁻¹", 4), "Å³·…");
    }

    #[test]
    fn optional_values() {
        assert_eq!(or_dash(Some(-5.0)), "-5");
        assert_eq!(or_dash::<i64>(None), "-");
        assert_eq!(yes_no(true), "yes");
    }
}
