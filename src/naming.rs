//! Output filename convention.
//!
//! Every transform writes a fresh file named
//! `{prefix}_{YYYYmmdd_HHMMSS}_{8 hex}.{ext}`:
//!
//! - `resized_20251015_142301_9f3a0c1e.jpg`
//! - `bg_removed_20251015_142305_00b7e2d4.png`
//! - `converted_webp_20251015_142310_5c1d9a77.webp`
//!
//! The prefix names the operation, the timestamp is local wall-clock time,
//! and the hex suffix comes from a v4 UUID. Two calls in the same second
//! still get different names, so concurrent operations can share one output
//! directory without coordination.

use chrono::Local;
use uuid::Uuid;

/// Length of the random hex suffix.
const SUFFIX_LEN: usize = 8;

/// Build a unique output filename.
///
/// The prefix is sanitized: anything outside `[A-Za-z0-9_-]` becomes `-`, so
/// user-supplied fragments (e.g. an unknown crop style) can't escape the
/// output directory.
pub fn generate_output_name(prefix: &str, extension: &str) -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let uuid = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}.{}",
        sanitize(prefix),
        timestamp,
        &uuid[..SUFFIX_LEN],
        extension
    )
}

fn sanitize(prefix: &str) -> String {
    let cleaned: String = prefix
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "output".to_string()
    } else {
        cleaned
    }
}

/// Result of parsing a generated name like `cropped_square_20251015_142301_9f3a0c1e.jpg`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutputName {
    /// Operation prefix; may itself contain underscores.
    pub prefix: String,
    /// `YYYYmmdd_HHMMSS`
    pub timestamp: String,
    pub suffix: String,
    pub extension: String,
}

/// Parse a name produced by [`generate_output_name`].
///
/// Returns `None` for anything that doesn't follow the convention.
pub fn parse_output_name(name: &str) -> Option<ParsedOutputName> {
    let (stem, extension) = name.rsplit_once('.')?;
    let mut parts = stem.rsplitn(4, '_');
    let suffix = parts.next()?;
    let time = parts.next()?;
    let date = parts.next()?;
    let prefix = parts.next()?;

    let all_digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
    let is_hex = suffix.len() == SUFFIX_LEN && suffix.bytes().all(|b| b.is_ascii_hexdigit());
    if !all_digits(date, 8) || !all_digits(time, 6) || !is_hex || prefix.is_empty() {
        return None;
    }

    Some(ParsedOutputName {
        prefix: prefix.to_string(),
        timestamp: format!("{date}_{time}"),
        suffix: suffix.to_string(),
        extension: extension.to_string(),
    })
}
