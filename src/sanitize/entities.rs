//! Character reference handling for the sanitizer. Decoding happens exactly
//! once, at lex time, so a payload cannot hide a scheme behind `&colon;` or
//! `&#x3a;`; escaping happens exactly once, at serialization.

/// Named references worth decoding. Punctuation entities such as `colon` and
/// `sol` matter for URI sniffing; the rest cover typographic marks common in
/// article bodies. Lookup is case-sensitive, matching the HTML definitions.
const NAMED: &[(&str, char)] = &[
    ("AMP", '&'),
    ("GT", '>'),
    ("LT", '<'),
    ("NewLine", '\n'),
    ("QUOT", '"'),
    ("Tab", '\t'),
    ("amp", '&'),
    ("apos", '\''),
    ("bull", '\u{2022}'),
    ("cent", '\u{00A2}'),
    ("colon", ':'),
    ("comma", ','),
    ("copy", '\u{00A9}'),
    ("deg", '\u{00B0}'),
    ("divide", '\u{00F7}'),
    ("equals", '='),
    ("euro", '\u{20AC}'),
    ("excl", '!'),
    ("frac12", '\u{00BD}'),
    ("gt", '>'),
    ("hellip", '\u{2026}'),
    ("laquo", '\u{00AB}'),
    ("ldquo", '\u{201C}'),
    ("lpar", '('),
    ("lsquo", '\u{2018}'),
    ("lt", '<'),
    ("mdash", '\u{2014}'),
    ("middot", '\u{00B7}'),
    ("ndash", '\u{2013}'),
    ("nbsp", '\u{00A0}'),
    ("num", '#'),
    ("para", '\u{00B6}'),
    ("period", '.'),
    ("plus", '+'),
    ("pound", '\u{00A3}'),
    ("quest", '?'),
    ("quot", '"'),
    ("raquo", '\u{00BB}'),
    ("rdquo", '\u{201D}'),
    ("reg", '\u{00AE}'),
    ("rsquo", '\u{2019}'),
    ("sect", '\u{00A7}'),
    ("semi", ';'),
    ("sol", '/'),
    ("times", '\u{00D7}'),
    ("trade", '\u{2122}'),
    ("yen", '\u{00A5}'),
];

/// Decode character references in `input`. Unknown or malformed references
/// stay as literal text. Numeric references accept a missing semicolon the
/// way browsers do; out-of-range and surrogate code points become U+FFFD.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match parse_reference(tail) {
            Some((decoded, consumed)) => {
                out.push(decoded);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parse one reference at the start of `s` (which begins with `&`).
/// Returns the decoded character and the number of bytes consumed.
fn parse_reference(s: &str) -> Option<(char, usize)> {
    let body = &s[1..];
    if let Some(numeric) = body.strip_prefix('#') {
        return parse_numeric(numeric).map(|(ch, used)| (ch, used + 2));
    }
    let name_len = body
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if name_len == 0 || name_len > 31 {
        return None;
    }
    if body.as_bytes().get(name_len) != Some(&b';') {
        return None;
    }
    let name = &body[..name_len];
    NAMED
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, ch)| (*ch, 1 + name_len + 1))
}

/// Parse the digits of a numeric reference, past the `&#`. Returns the
/// character and bytes consumed after the `&#`.
fn parse_numeric(s: &str) -> Option<(char, usize)> {
    let (radix, digits_at) = match s.as_bytes().first() {
        Some(b'x') | Some(b'X') => (16u32, 1usize),
        _ => (10, 0),
    };
    let digits = &s[digits_at..];
    let len = digits
        .bytes()
        .take_while(|b| (*b as char).is_digit(radix))
        .count();
    if len == 0 {
        return None;
    }
    let mut used = digits_at + len;
    if digits.as_bytes().get(len) == Some(&b';') {
        used += 1;
    }
    // Saturate long digit runs instead of overflowing; the result is out of
    // range either way and maps to the replacement character.
    let value = digits[..len]
        .bytes()
        .fold(0u32, |acc, b| {
            acc.saturating_mul(radix)
                .saturating_add((b as char).to_digit(radix).unwrap_or(0))
        });
    let ch = match value {
        0 => '\u{FFFD}',
        v => char::from_u32(v).unwrap_or('\u{FFFD}'),
    };
    Some((ch, used))
}

/// Escape text for element content. `"` stays literal; it is inert outside
/// attribute values.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a value for a double-quoted attribute.
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
