/// Quote `text` so that, compiled as a pattern, it matches itself literally.
///
/// Every byte except ASCII alphanumerics, `_` and bytes >= 0x80 is prefixed
/// with a backslash. NUL is written as `\x00`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        match c {
            '\0' => out.push_str("\\x00"),
            c if c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii() => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}
