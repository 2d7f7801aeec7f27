//! Identifier utilities

use rand::Rng;
use uuid::Uuid;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Generate a prediction identifier: `bird_<unix millis>_<9 base36 chars>`
///
/// Unique with very high probability within one process; not a security token.
pub fn prediction_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("bird_{}_{}", millis, suffix)
}

/// Generate an opaque object name that keeps the original file extension
///
/// `"call.WAV"` becomes `"<uuid>.WAV"`. A name without an extension, or with
/// one that is not plain ASCII alphanumerics, yields the bare uuid so the
/// name never needs escaping in a URL or object path.
pub fn object_name(original_filename: &str) -> String {
    let id = generate();
    match extension(original_filename) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

fn extension(filename: &str) -> Option<&str> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}
