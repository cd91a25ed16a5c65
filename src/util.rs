/// Decode `%XX` escapes. Returns `None` on a truncated or non-hex escape, or
/// when the decoded bytes are not UTF-8.
pub fn percent_decode_utf8(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hi = *bytes.get(i + 1)?;
                let lo = *bytes.get(i + 2)?;
                let hi = (hi as char).to_digit(16)? as u8;
                let lo = (lo as char).to_digit(16)? as u8;
                out.push((hi << 4) | lo);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).ok()
}

/// Decode when the input carries escapes; fall back to the raw text when it
/// does not decode.
pub fn decode_if_encoded(raw: &str) -> String {
    if !raw.contains('%') {
        return raw.to_string();
    }
    percent_decode_utf8(raw).unwrap_or_else(|| raw.to_string())
}

/// Split on `\n` only, keeping a trailing empty segment, so line numbers match
/// what the analysis pass recorded.
pub fn split_lines(content: &str) -> Vec<&str> {
    content.split('\n').collect()
}
