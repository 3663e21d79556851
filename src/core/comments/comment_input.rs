// Input validation and sanitization for reader submissions.
//
// Everything here is a pure function of its input: no storage, no clock,
// no network. The service runs these before anything touches the store.

use super::comment_models::{CommentSubmission, SanitizedComment};
use super::comment_service::CommentError;

/// Maximum length of the `name` field, in characters.
pub const MAX_NAME_LEN: usize = 100;
/// Maximum length of the `content` field, in characters.
pub const MAX_CONTENT_LEN: usize = 5000;

/// Escape HTML-special characters so stored text renders as literal text.
///
/// `&` goes first so the entities produced by the later replacements are
/// not escaped again - this is a single pass, applied exactly once per
/// field, after validation and before persistence.
pub fn sanitize_input(value: &str) -> String {
    value
        .trim()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Basic `local@domain.tld` shape check.
///
/// Accepts exactly the strings matched by `^[^\s@]+@[^\s@]+\.[^\s@]+$`:
/// one `@`, no whitespace anywhere, and a dot in the domain with at least
/// one character on each side.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let (local, domain) = match email.split_once('@') {
        Some(parts) => parts,
        None => return false,
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    // A dot with at least one character before and after it.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Anonymize a requester's network address into a fixed-width hex token.
///
/// An order-dependent rolling hash over the raw bytes, reduced to 32 bits.
/// This is a privacy measure for rate limiting, not a security hash: it
/// only has to avoid storing raw addresses, not resist reversal.
pub fn hash_ip(ip: &str) -> String {
    let mut hash: i32 = 0;
    for byte in ip.bytes() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(byte as i32);
    }
    format!("{:08x}", hash as u32)
}

/// Validate a submission and escape its strings.
///
/// Rules run in order and short-circuit on the first failure:
/// required fields, name length, content length, email shape. Only a
/// submission that passes all of them gets sanitized.
pub fn validate_and_sanitize(
    submission: &CommentSubmission,
) -> Result<SanitizedComment, CommentError> {
    let post = submission.post.trim();
    let name = submission.name.trim();
    let content = submission.content.trim();

    if post.is_empty() {
        return Err(CommentError::MissingField("post"));
    }
    if name.is_empty() {
        return Err(CommentError::MissingField("name"));
    }
    if content.is_empty() {
        return Err(CommentError::MissingField("content"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(CommentError::FieldTooLong {
            field: "name",
            max: MAX_NAME_LEN,
        });
    }
    if content.chars().count() > MAX_CONTENT_LEN {
        return Err(CommentError::FieldTooLong {
            field: "content",
            max: MAX_CONTENT_LEN,
        });
    }

    // Email is optional; an empty string counts as absent.
    let email = submission
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    if let Some(email) = email {
        if !is_valid_email(email) {
            return Err(CommentError::InvalidEmail);
        }
    }

    Ok(SanitizedComment {
        post_slug: sanitize_input(post),
        name: sanitize_input(name),
        email: email.map(sanitize_input),
        content: sanitize_input(content),
        parent_id: submission.parent_id,
    })
}
