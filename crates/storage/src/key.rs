//! Storage keys derived from document identity

use pdf_drawer_core::DocumentIdentity;

/// Prefix shared by every annotation entry
pub const KEY_PREFIX: &str = "pdf-annotations-";

/// `pdf-annotations-{name}-{byte_size}`
///
/// Two files with the same name but different sizes get different keys.
pub fn storage_key(identity: &DocumentIdentity) -> String {
    format!("{KEY_PREFIX}{}-{}", identity.name, identity.byte_size)
}

/// Recover the document identity from a key, splitting at the last `-`
pub fn parse_storage_key(key: &str) -> Option<DocumentIdentity> {
    let rest = key.strip_prefix(KEY_PREFIX)?;
    let (name, size) = rest.rsplit_once('-')?;
    if name.is_empty() || size.is_empty() || !size.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(DocumentIdentity::new(name, size.parse().ok()?))
}

pub fn is_annotation_key(key: &str) -> bool {
    key.starts_with(KEY_PREFIX)
}
