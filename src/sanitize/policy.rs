use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Rich-text tags permitted in article bodies. Anything absent is removed.
pub const RICH_TEXT_TAGS: &[&str] = &[
    "p", "br", "strong", "em", "u", "s", "a", "ul", "ol", "li",
    "h1", "h2", "h3", "h4", "h5", "h6",
    "blockquote", "code", "pre",
    "img", "figure", "figcaption",
    "table", "thead", "tbody", "tr", "th", "td",
    "div", "span",
];

/// Attributes permitted on allowed tags. Exact-match only, so event handler
/// names like `onerror` can never slip through as near-misses.
pub const RICH_TEXT_ATTRS: &[&str] = &[
    "href", "target", "rel", "src", "alt", "title", "class", "id",
];

/// Attributes whose values are interpreted as URIs and scheme-checked.
const URI_ATTRS: &[&str] = &["href", "src"];

/// Accepts the allowed schemes plus relative paths and fragment references.
/// A leading run of scheme characters followed by `:` fails the third
/// alternative, so `javascript:`, `data:` and `vbscript:` never match.
static ALLOWED_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:https?|mailto|tel|callto|sms|cid|xmpp):|[^a-z]|[a-z+.\-]+(?:[^a-z+.\-:]|$))")
        .unwrap()
});

/// Control and whitespace characters ignored by browsers when they sniff a
/// scheme out of an attribute value. Stripped before the regex check so
/// `java\tscript:` style smuggling collapses to the plain scheme.
static URI_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new("[\u{0000}-\u{0020}\u{00A0}\u{1680}\u{180E}\u{2028}\u{2029}\u{205F}\u{3000}]")
        .unwrap()
});

/// Elements whose entire contents are discarded along with the element.
/// Everything else that is disallowed is unwrapped, keeping its children.
pub const DROP_CONTENT_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "title", "textarea",
    "noscript", "template", "svg", "math", "xmp", "noembed", "noframes",
    "plaintext", "frame", "frameset", "applet",
];

/// Subset of [`DROP_CONTENT_TAGS`] whose bodies are raw text in HTML, so the
/// tokenizer must swallow everything up to the matching close tag instead of
/// lexing the body as markup.
pub const RAW_TEXT_TAGS: &[&str] = &[
    "script", "style", "title", "textarea", "noscript", "xmp", "noembed",
    "noframes", "plaintext",
];

/// Void elements in the rich-text set; serialized without a close tag.
const VOID_TAGS: &[&str] = &["br", "img"];

/// One auditable table of what survives sanitization. Both the rich-text and
/// the text-only policies are instances of this; call sites never carry their
/// own tag or attribute checks.
#[derive(Debug, Clone)]
pub struct Policy {
    allowed_tags: HashSet<&'static str>,
    allowed_attrs: HashSet<&'static str>,
}

impl Policy {
    /// Policy for article bodies: basic structure and emphasis, images,
    /// tables, and anchors with scheme-checked targets.
    pub fn rich_text() -> Self {
        Policy {
            allowed_tags: RICH_TEXT_TAGS.iter().copied().collect(),
            allowed_attrs: RICH_TEXT_ATTRS.iter().copied().collect(),
        }
    }

    /// Policy for plain-text fields such as comments: no tag survives.
    pub fn text_only() -> Self {
        Policy {
            allowed_tags: HashSet::new(),
            allowed_attrs: HashSet::new(),
        }
    }

    pub fn allows_tag(&self, name: &str) -> bool {
        self.allowed_tags.contains(name)
    }

    pub fn allows_attr(&self, name: &str) -> bool {
        self.allowed_attrs.contains(name)
    }

    pub fn is_uri_attr(name: &str) -> bool {
        URI_ATTRS.contains(&name)
    }

    /// Scheme check applied to entity-decoded href/src values. Empty values
    /// are harmless and kept; a value that only becomes a scheme once the
    /// noise characters are stripped is rejected.
    pub fn uri_allowed(value: &str) -> bool {
        if value.is_empty() {
            return true;
        }
        let stripped = URI_NOISE.replace_all(value, "");
        ALLOWED_URI.is_match(&stripped)
    }

    pub fn drops_content(name: &str) -> bool {
        DROP_CONTENT_TAGS.contains(&name)
    }

    pub fn is_raw_text(name: &str) -> bool {
        RAW_TEXT_TAGS.contains(&name)
    }

    pub fn is_void(name: &str) -> bool {
        VOID_TAGS.contains(&name)
    }
}
