//! Replay identifier derivation.
//!
//! A replay id binds one table case to its recorded session. Derived ids
//! have the shape `<method>/<item>`, each half lowercased with every run of
//! non-alphanumeric characters collapsed to a single `_`:
//!
//! ```text
//! models.generate_content + "test Simple--Text!"  ->  models_generate_content/test_simple_text
//! ```

use crate::error::{ReplayError, Result};

/// Separator placed between the method and item halves of a derived id.
pub const ID_SEPARATOR: char = '/';

/// Computes the replay id for a table item.
///
/// A non-empty `override_id` is returned unchanged.
#[must_use]
pub fn derive_id(test_method: &str, item_name: &str, override_id: Option<&str>) -> String {
    if let Some(id) = override_id.filter(|id| !id.is_empty()) {
        return id.to_string();
    }
    format!("{}{ID_SEPARATOR}{}", normalize(test_method), normalize(item_name))
}

/// Lowercases and collapses non-alphanumeric runs into `_`, trimming the ends.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Checks that an id (derived or overridden) stays inside the replays
/// directory when used as a relative path.
///
/// # Errors
///
/// Returns [`ReplayError::InvalidReplayIdentifier`] for empty ids, absolute
/// paths, backslashes, and `.`/`..` components.
pub fn validate_id(replay_id: &str) -> Result<()> {
    let reject = |reason: &str| -> Result<()> {
        Err(ReplayError::InvalidReplayIdentifier {
            replay_id: replay_id.to_string(),
            reason: reason.to_string(),
        })
    };

    if replay_id.trim().is_empty() {
        return reject("identifier is empty");
    }
    if replay_id.contains('\\') {
        return reject("backslashes are not allowed");
    }
    if replay_id.starts_with('/') {
        return reject("identifier must be relative");
    }
    for segment in replay_id.split(ID_SEPARATOR) {
        match segment {
            "" => return reject("identifier contains an empty path segment"),
            "." | ".." => return reject("`.` and `..` components are not allowed"),
            _ => {}
        }
    }
    Ok(())
}
