//! REST base URL normalization.

use index_config_shared::{ErrorCode, ErrorEnvelope, Result};

/// Normalize a service address into the base URL the `/v1/...` paths hang off.
///
/// Adds `http://` when no scheme is given and strips trailing slashes and a
/// trailing `/v1`.
pub fn to_rest_base_url(address: &str) -> Result<Box<str>> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "vector database URL is required",
        ));
    }

    let mut processed = trimmed.to_owned();
    if !processed.starts_with("http://") && !processed.starts_with("https://") {
        processed = format!("http://{processed}");
    }

    let trimmed_len = processed.trim_end_matches('/').len();
    processed.truncate(trimmed_len);
    if let Some(stripped) = processed.strip_suffix("/v1") {
        let stripped_len = stripped.trim_end_matches('/').len();
        processed.truncate(stripped_len);
    }

    Ok(processed.into_boxed_str())
}
