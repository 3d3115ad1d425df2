//! Code-fence stripping for raw model output.
//!
//! Models frequently wrap JSON replies in Markdown fences:
//!
//! ````text
//! ```json
//! {"Segunda": [...]}
//! ```
//! ````
//!
//! [`sanitize`] removes the leading fence (with its optional format hint),
//! the trailing fence, and surrounding whitespace. Interior content is never
//! touched.

const FENCE: &str = "```";

/// Strip code fences and surrounding whitespace from `text`.
///
/// The result is a fixpoint: `sanitize(&sanitize(t)) == sanitize(t)` for
/// every input, including pathological ones where removing one fence pair
/// exposes another.
pub fn sanitize(text: &str) -> String {
    let mut current = text;
    loop {
        let next = strip_once(current);
        if next.len() == current.len() {
            return next.to_string();
        }
        current = next;
    }
}

fn strip_once(text: &str) -> &str {
    let mut s = text.trim();

    if let Some(rest) = s.strip_prefix(FENCE) {
        // Format hint such as `json` or `JSON`, directly after the fence.
        let hint_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
            .unwrap_or(rest.len());
        s = rest[hint_len..].trim_start();
    }

    if let Some(rest) = s.strip_suffix(FENCE) {
        s = rest;
    }

    s.trim()
}
