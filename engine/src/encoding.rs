//! Percent-encoding in the CWP dialect.
//!
//! CWP does not use the standard URL component encoding. The set of bytes left
//! untouched is letters, digits and most ASCII punctuation; see
//! [`should_escape`] for the exact rule.

/// Returns true if `byte` must be written as `%XX`.
pub fn should_escape(byte: u8) -> bool {
    byte >= 128
        || byte < 33
        || (34..38).contains(&byte)
        || byte == b'<'
        || byte == b'='
        || byte == b'>'
        || byte == b':'
        || (91..95).contains(&byte)
        || byte == b'`'
        || (123..=126).contains(&byte)
        || byte == b'+'
}

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Encode `text` for use as a CWP query key or value.
pub fn encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for &byte in text.as_bytes() {
        if should_escape(byte) {
            out.push('%');
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0F) as usize] as char);
        } else {
            out.push(byte as char);
        }
    }
    out
}
