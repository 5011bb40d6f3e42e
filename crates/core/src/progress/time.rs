/// Formats a number of seconds given as text into `mm:ss`. Only the leading
/// integer part is read; text without one shows `00:00`.
pub fn format_time(text: &str) -> String {
    match parse_leading_int(text) {
        Some(seconds) => {
            let seconds = seconds.max(0);
            format!("{:02}:{:02}", seconds / 60, seconds % 60)
        }
        None => "00:00".to_string(),
    }
}

/// Parses an optional sign followed by digits at the start of `text`,
/// ignoring leading whitespace and anything after the digits.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let value = digits[..end].parse::<i64>().ok()?;
    Some(if negative { -value } else { value })
}
