//! Verification token generation.

use crate::error::AppError;
use base64::Engine as _;
use serde_json::json;

/// Random bytes before base64 encoding.
const TOKEN_LENGTH_BYTES: usize = 32;

/// Prefix making tokens recognizable among other TXT records.
pub const TOKEN_PREFIX: &str = "cd-verify-";

/// Generates a fresh, unguessable verification token.
///
/// 32 bytes from the OS RNG, URL-safe base64 without padding, prefixed with
/// [`TOKEN_PREFIX`]. Safe to publish in a TXT record or a plain-text file.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system RNG is unavailable.
pub fn generate_verification_token() -> Result<String, AppError> {
    let mut buffer = [0u8; TOKEN_LENGTH_BYTES];

    getrandom::fill(&mut buffer).map_err(|e| {
        tracing::error!(error = %e, "System RNG failure");
        AppError::internal("Failed to generate verification token", json!({}))
    })?;

    Ok(format!(
        "{TOKEN_PREFIX}{}",
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer)
    ))
}
