//! Lex, filter, serialize. The lexer degrades anything it cannot parse into
//! plain text instead of failing, so sanitization never returns an error.

use super::entities::{decode_entities, escape_attr, escape_text};
use super::policy::Policy;

#[derive(Debug)]
enum Token {
    /// Entity-decoded run of character data.
    Text(String),
    /// Start tag with lowercased name and decoded attribute values.
    Open {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// End tag, lowercased. Anything after the name was already discarded.
    Close { name: String },
}

/// Sanitize `input` under `policy`. Disallowed elements are unwrapped so
/// their children survive; drop-content elements take their subtree with
/// them. Output is balanced and re-parses to itself, which is what makes the
/// transform idempotent.
pub fn sanitize_with(policy: &Policy, input: &str) -> String {
    let tokens = tokenize(input);
    let mut out = String::with_capacity(input.len());
    // tags emitted but not yet closed
    let mut open: Vec<String> = Vec::new();
    // drop-content elements currently swallowing their subtree
    let mut dropping: Vec<String> = Vec::new();

    for tok in &tokens {
        match tok {
            Token::Text(t) => {
                if dropping.is_empty() {
                    out.push_str(&escape_text(t));
                }
            }
            Token::Open { name, attrs } => {
                if !dropping.is_empty() {
                    if Policy::drops_content(name) {
                        dropping.push(name.clone());
                    }
                    continue;
                }
                if Policy::drops_content(name) {
                    dropping.push(name.clone());
                } else if policy.allows_tag(name) {
                    write_open(&mut out, name, attrs, policy);
                    if !Policy::is_void(name) {
                        open.push(name.clone());
                    }
                }
                // unwrapped otherwise: the tag vanishes, children stay
            }
            Token::Close { name } => {
                if let Some(top) = dropping.last() {
                    if top == name {
                        dropping.pop();
                    }
                    continue;
                }
                if !policy.allows_tag(name) {
                    continue;
                }
                // close everything the stray markup left open above it;
                // an end tag with no matching start is simply dropped
                if let Some(idx) = open.iter().rposition(|n| n == name) {
                    while open.len() > idx {
                        let n = open.pop().unwrap_or_default();
                        out.push_str("</");
                        out.push_str(&n);
                        out.push('>');
                    }
                }
            }
        }
    }
    while let Some(n) = open.pop() {
        out.push_str("</");
        out.push_str(&n);
        out.push('>');
    }
    out
}

fn write_open(out: &mut String, name: &str, attrs: &[(String, String)], policy: &Policy) {
    out.push('<');
    out.push_str(name);
    for (k, v) in attrs {
        if !policy.allows_attr(k) {
            continue;
        }
        if Policy::is_uri_attr(k) && !Policy::uri_allowed(v) {
            continue;
        }
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        out.push_str(&escape_attr(v));
        out.push('"');
    }
    out.push('>');
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pending = String::new();
    let b = input.as_bytes();
    let mut pos = 0;

    while pos < b.len() {
        let Some(rel) = input[pos..].find('<') else {
            pending.push_str(&input[pos..]);
            break;
        };
        let lt = pos + rel;
        pending.push_str(&input[pos..lt]);
        match b.get(lt + 1).copied() {
            Some(c) if c.is_ascii_alphabetic() => match parse_start_tag(&input[lt..]) {
                Some((name, attrs, used)) => {
                    flush_text(&mut tokens, &mut pending);
                    pos = lt + used;
                    if Policy::is_raw_text(&name) {
                        // raw-text bodies never reach the filter; the whole
                        // element is consumed here and nothing is emitted
                        pos = skip_raw_text(input, pos, &name);
                    } else {
                        tokens.push(Token::Open { name, attrs });
                    }
                }
                None => {
                    // tag ran off the end of the input: not markup, keep it
                    // as text
                    pending.push_str(&input[lt..]);
                    pos = input.len();
                }
            },
            Some(b'/') if b.get(lt + 2).is_some_and(|c| c.is_ascii_alphabetic()) => {
                match parse_end_tag(&input[lt..]) {
                    Some((name, used)) => {
                        flush_text(&mut tokens, &mut pending);
                        tokens.push(Token::Close { name });
                        pos = lt + used;
                    }
                    None => {
                        pending.push_str(&input[lt..]);
                        pos = input.len();
                    }
                }
            }
            Some(b'!') | Some(b'?') | Some(b'/') => {
                // comments, doctypes, and bogus markup are dropped whole
                pos = skip_markup_decl(input, lt);
            }
            _ => {
                pending.push('<');
                pos = lt + 1;
            }
        }
    }
    flush_text(&mut tokens, &mut pending);
    tokens
}

fn flush_text(tokens: &mut Vec<Token>, pending: &mut String) {
    if !pending.is_empty() {
        tokens.push(Token::Text(decode_entities(pending)));
        pending.clear();
    }
}

/// Parse a start tag at the head of `s` (`s` begins with `<` and a letter).
/// Returns the lowercased name, decoded attributes, and bytes consumed, or
/// None if the input ends before the tag does.
fn parse_start_tag(s: &str) -> Option<(String, Vec<(String, String)>, usize)> {
    let b = s.as_bytes();
    let mut i = 1;
    let name_start = i;
    while i < b.len() && (b[i].is_ascii_alphanumeric() || b[i] == b'-') {
        i += 1;
    }
    let name = s[name_start..i].to_ascii_lowercase();
    let mut attrs: Vec<(String, String)> = Vec::new();
    loop {
        while i < b.len() && (b[i].is_ascii_whitespace() || b[i] == b'/') {
            i += 1;
        }
        if i >= b.len() {
            return None;
        }
        if b[i] == b'>' {
            return Some((name, attrs, i + 1));
        }
        let attr_start = i;
        while i < b.len()
            && !b[i].is_ascii_whitespace()
            && b[i] != b'='
            && b[i] != b'>'
            && b[i] != b'/'
        {
            i += 1;
        }
        let attr_name = s[attr_start..i].to_ascii_lowercase();
        while i < b.len() && b[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = String::new();
        if i < b.len() && b[i] == b'=' {
            i += 1;
            while i < b.len() && b[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= b.len() {
                return None;
            }
            match b[i] {
                q @ (b'"' | b'\'') => {
                    i += 1;
                    let val_start = i;
                    while i < b.len() && b[i] != q {
                        i += 1;
                    }
                    if i >= b.len() {
                        // unterminated quote swallows the rest of the input
                        return None;
                    }
                    value = decode_entities(&s[val_start..i]);
                    i += 1;
                }
                _ => {
                    let val_start = i;
                    while i < b.len() && !b[i].is_ascii_whitespace() && b[i] != b'>' {
                        i += 1;
                    }
                    value = decode_entities(&s[val_start..i]);
                }
            }
        }
        // first occurrence of an attribute wins, as in the DOM
        if !attr_name.is_empty() && !attrs.iter().any(|(k, _)| *k == attr_name) {
            attrs.push((attr_name, value));
        }
    }
}

/// Parse an end tag at the head of `s` (`s` begins with `</` and a letter).
fn parse_end_tag(s: &str) -> Option<(String, usize)> {
    let b = s.as_bytes();
    let mut i = 2;
    let name_start = i;
    while i < b.len() && (b[i].is_ascii_alphanumeric() || b[i] == b'-') {
        i += 1;
    }
    let name = s[name_start..i].to_ascii_lowercase();
    while i < b.len() && b[i] != b'>' {
        i += 1;
    }
    if i >= b.len() {
        return None;
    }
    Some((name, i + 1))
}

/// Skip a comment, doctype, CDATA section, or processing instruction
/// starting at `lt`. Returns the position just past it.
fn skip_markup_decl(input: &str, lt: usize) -> usize {
    let rest = &input[lt..];
    if rest.starts_with("<!--") {
        let body = &rest[4..];
        // abruptly closed comments end at the first '>' like in a browser
        if body.starts_with('>') {
            return lt + 5;
        }
        if body.starts_with("->") {
            return lt + 6;
        }
        return match body.find("-->") {
            Some(end) => lt + 4 + end + 3,
            None => input.len(),
        };
    }
    match rest.find('>') {
        Some(end) => lt + end + 1,
        None => input.len(),
    }
}

/// Consume the raw-text body of `name` up to its matching close tag, or to
/// the end of input when the close never appears.
fn skip_raw_text(input: &str, from: usize, name: &str) -> usize {
    if name == "plaintext" {
        return input.len();
    }
    let close = format!("</{name}");
    let mut search = from;
    loop {
        let Some(off) = find_ci(&input[search..], &close) else {
            return input.len();
        };
        let at = search + off;
        let after = at + close.len();
        let closes = match input.as_bytes().get(after) {
            None => true,
            Some(c) => matches!(c, b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r' | b'\x0C'),
        };
        if closes {
            return match input[after..].find('>') {
                Some(gt) => after + gt + 1,
                None => input.len(),
            };
        }
        search = at + 1;
    }
}

/// ASCII case-insensitive substring search.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}
