//! Display helpers shared by prompts and panel views

/// Two decimals with thousands separators: 1234567.891 → "1,234,567.89".
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "NaN".to_string()
        } else if value > 0.0 {
            "∞".to_string()
        } else {
            "-∞".to_string()
        };
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && fixed.chars().any(|c| c != '0' && c != '.');
    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac_part)
}

/// Currency symbol glued to a formatted amount: "₹50,000.00".
pub fn format_money(symbol: &str, value: f64) -> String {
    format!("{}{}", symbol, format_amount(value))
}

/// First character upper-cased, the rest lower-cased.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Chat titles: at most 40 characters, with "..." appended when cut.
pub fn truncate_title(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(23000.0), "23,000.00");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-4500.5), "-4,500.50");
        assert_eq!(format_amount(-0.001), "0.00");
        assert_eq!(format_amount(f64::INFINITY), "∞");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money("₹", 50000.0), "₹50,000.00");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("groceries"), "Groceries");
        assert_eq!(capitalize("STRESS"), "Stress");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_truncate_title() {
        assert_eq!(truncate_title("short", 40), "short");
        let long = "How should I split my salary between rent and savings?";
        let title = truncate_title(long, 40);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), 43);
    }
}
