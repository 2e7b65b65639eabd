use serde::{Deserialize, Serialize};

use crate::models::Contact;

pub const NAME_TAG: &str = "{{Name}}";
pub const EMAIL_TAG: &str = "{{Email}}";

/// Recipient values substituted into merge tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeContext {
    pub name: String,
    pub email: String,
}

impl MergeContext {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn for_contact(contact: &Contact) -> Self {
        Self::new(contact.name.clone(), contact.email.clone())
    }

    /// Placeholder recipient shown in editor previews.
    pub fn sample() -> Self {
        Self::new("John Doe", "john.doe@example.com")
    }
}

/// Replaces `{{Name}}` and `{{Email}}` only. Tags are case-sensitive and
/// nothing else in `{{...}}` form is recognized.
pub fn merge_tags(template: &str, context: &MergeContext) -> String {
    template
        .replace(NAME_TAG, &context.name)
        .replace(EMAIL_TAG, &context.email)
}

/// Substitutes merge tags, then converts `*bold*`, `_italic_` and
/// `~strike~` to HTML. Markup runs after substitution, so it sees the
/// recipient's values too. There is no escape syntax.
pub fn render(template: &str, context: &MergeContext) -> String {
    let merged = merge_tags(template, context);
    let bold = wrap_spans(&merged, '*', "<strong>", "</strong>");
    let italic = wrap_spans(&bold, '_', "<em>", "</em>");
    wrap_spans(&italic, '~', "<del>", "</del>")
}

/// Renders against [`MergeContext::sample`].
pub fn preview(template: &str) -> String {
    render(template, &MergeContext::sample())
}

// One left-to-right pass: each span is the shortest non-empty run between two
// delimiters. A delimiter that opens no span is kept and scanning resumes
// right after it.
fn wrap_spans(text: &str, delim: char, open: &str, close: &str) -> String {
    let width = delim.len_utf8();
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(delim) {
        let after = &rest[start + width..];
        match after.find(delim) {
            Some(end) if end > 0 => {
                out.push_str(&rest[..start]);
                out.push_str(open);
                out.push_str(&after[..end]);
                out.push_str(close);
                rest = &after[end + width..];
            }
            _ => {
                out.push_str(&rest[..start + width]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
