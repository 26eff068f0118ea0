//! Escaping for text embedded in generated markup and style sheets.
//!
//! Two contexts need care:
//!
//! - **Markup** (HTML and SVG element content or attribute values):
//!   [`escape_markup`] replaces the five reserved characters with named
//!   entities. It is the only escaping applied to watermark text inside the
//!   SVG tile.
//! - **CSS strings** (the `content:` value of the single-mark watermark):
//!   [`escape_css_string`] produces a double-quoted CSS string. Entities are
//!   not decoded inside `<style>`, so markup escaping would show up literally
//!   there.
//!
//! Neither function is idempotent: escaping an already-escaped string escapes
//! it again.

/// Escape `& < > " '` to their named entities.
///
/// Ampersands are replaced first so the entities introduced for the other
/// characters are not escaped a second time.
pub fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Quote `text` as a CSS string literal, including the surrounding quotes.
///
/// Backslashes and double quotes are backslash-escaped. Line breaks and `<`
/// become hex escapes, so the literal cannot close the enclosing `<style>`
/// element or span lines.
pub fn escape_css_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\a "),
            '\r' => out.push_str("\\d "),
            '<' => out.push_str("\\3c "),
            '>' => out.push_str("\\3e "),
            c if c.is_control() => out.push_str(&format!("\\{:x} ", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
