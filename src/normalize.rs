// src/normalize.rs

/// Normalize a scraped title: decode entities, drop invisible characters,
/// collapse whitespace, trim.
pub fn clean_title(s: &str) -> String {
    // 1) HTML entity decode
    let decoded = html_escape::decode_html_entities(s);

    // 2) Strip zero-width and non-whitespace control characters
    let mut out = String::with_capacity(decoded.len());
    for c in decoded.chars() {
        if is_invisible(c) {
            continue;
        }
        out.push(c);
    }

    // 3) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Escape characters with structural meaning in Markdown link labels so no
/// title can break the surrounding `[label](url)` syntax.
pub fn escape_link_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '[' => out.push_str("\\["),
            ']' => out.push_str("\\]"),
            _ => out.push(c),
        }
    }
    out
}

fn is_invisible(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200F}' | '\u{2060}' | '\u{FEFF}') || (c.is_control() && !c.is_whitespace())
}
