//! HTML escaping for untrusted text.
//!
//! Anything a visitor submits (comments, search terms) is rendered back into
//! a page by the browser client. The secure route family escapes it here so
//! markup in the input is displayed as text instead of being interpreted.

use std::borrow::Cow;

/// Escape the five HTML-significant characters.
///
/// Returns `Cow::Borrowed` when nothing needs escaping, avoiding allocation.
///
/// # Examples
///
/// ```
/// use securescape_types::escape_html;
///
/// assert_eq!(escape_html("plain text"), "plain text");
/// assert_eq!(
///     escape_html("<script>alert('x')</script>"),
///     "&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"
/// );
/// ```
#[must_use]
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            other => result.push(other),
        }
    }
    Cow::Owned(result)
}
