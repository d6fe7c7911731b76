//! # Certificate Extraction
//!
//! The cert authority answers with a body that embeds one or more PEM
//! certificates (leaf first, then the chain). Only the leaf is needed, so
//! extraction is a plain string scan with fixed anchors:
//!
//! - the first `-----BEGIN CERTIFICATE-----` in the body opens the block;
//! - the nearest `-----END CERTIFICATE-----` after at least one character of
//!   content closes it;
//! - both anchors are included in the result.
//!
//! No block yields `None`. When several blocks are present the first wins.

/// Opening anchor of a PEM certificate block.
pub const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";

/// Closing anchor of a PEM certificate block.
pub const PEM_END: &str = "-----END CERTIFICATE-----";

/// Extract the first PEM certificate block from `body`.
pub fn extract_certificate(body: &str) -> Option<&str> {
    let start = body.find(PEM_BEGIN)?;
    let content_start = start + PEM_BEGIN.len();
    let rest = &body[content_start..];
    // The block must carry at least one character between the anchors.
    let first_char_len = rest.chars().next()?.len_utf8();
    let end_rel = rest[first_char_len..].find(PEM_END)? + first_char_len;
    let end = content_start + end_rel + PEM_END.len();
    Some(&body[start..end])
}
