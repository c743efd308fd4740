//! Attachment filename selection and `Content-Disposition` framing.

use url::Url;

/// Name used when neither a hint nor a usable path segment exists.
const FALLBACK_FILENAME: &str = "download";

/// Picks the attachment name: caller hint, else last URL path segment, else `download`.
///
/// The path segment is percent-decoded; the result is not header-safe until
/// passed through [`content_disposition`].
pub(crate) fn attachment_filename(hint: Option<&str>, url: &Url) -> String {
    if let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) {
        return sanitize_filename(hint);
    }

    if let Some(mut segments) = url.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        let decoded = urlencoding::decode(last).map_or_else(|_| last.to_string(), |d| d.into_owned());
        let name = sanitize_filename(&decoded);
        if !name.trim_matches('_').is_empty() {
            return name;
        }
    }

    FALLBACK_FILENAME.to_string()
}

/// `attachment; filename="<percent-encoded name>"`.
#[must_use]
pub fn content_disposition(filename: &str) -> String {
    format!("attachment; filename=\"{}\"", urlencoding::encode(filename))
}

/// Replaces path separators and control characters.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
