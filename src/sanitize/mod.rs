//! Allow-list HTML sanitization for everything user-authored or
//! externally sourced. This is the single choke point: article bodies and
//! comment text pass through here before they are served, with no other
//! path to the response body.
//!
//! Both entry points are pure functions of their input and the fixed
//! policy tables, never panic, and are idempotent, so double-sanitizing
//! already-clean content is harmless.

mod engine;
mod entities;
mod policy;

pub use engine::sanitize_with;
pub use policy::{Policy, DROP_CONTENT_TAGS, RICH_TEXT_ATTRS, RICH_TEXT_TAGS};

use once_cell::sync::Lazy;

static RICH_TEXT: Lazy<Policy> = Lazy::new(Policy::rich_text);
static TEXT_ONLY: Lazy<Policy> = Lazy::new(Policy::text_only);

/// Sanitize an HTML fragment for rendering, keeping basic rich-text
/// structure and dropping everything else: unknown elements, unknown
/// attributes, script-bearing URIs, comments, and declarations.
pub fn sanitize_html(input: &str) -> String {
    sanitize_with(&RICH_TEXT, input)
}

/// Strict mode for plain-text fields: no tag survives, only the
/// concatenated text content.
pub fn sanitize_text(input: &str) -> String {
    sanitize_with(&TEXT_ONLY, input)
}
