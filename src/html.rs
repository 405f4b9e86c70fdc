use chrono::{DateTime, Local, NaiveDateTime};

/// Escapes `& < > " '` for safe interpolation into element bodies and attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn inline_error(message: &str) -> String {
    format!("<mark>Error: {}</mark>", escape_html(message))
}

/// Local date-time for a backend timestamp; `-` when absent, the raw value when unparseable.
pub fn format_timestamp(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return "-".to_string();
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return naive.format("%Y-%m-%d %H:%M:%S").to_string();
        }
    }
    raw.to_string()
}

/// True when `text` contains a raw `<`, `>`, `"` or `'` or an `&` that does not start an entity.
/// Markup written by the renderers themselves must be stripped before calling this.
pub fn has_unescaped_specials(text: &str) -> bool {
    let bytes = text.as_bytes();
    for (index, byte) in bytes.iter().enumerate() {
        match byte {
            b'<' | b'>' | b'"' | b'\'' => return true,
            b'&' => {
                let rest = &text[index..];
                let known = ["&amp;", "&lt;", "&gt;", "&quot;", "&#39;"];
                if !known.iter().any(|entity| rest.starts_with(entity)) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}
