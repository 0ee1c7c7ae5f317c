//! # Audio Payload Encoding
//!
//! Turns an uploaded audio body into the base64 string embedded in the
//! generation request. The whole payload is buffered before encoding; nothing
//! streams to the provider, so the size limit is enforced while reading.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures_util::{Stream, StreamExt};
use std::fmt::Display;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("failed to read audio: {0}")]
    Read(String),
    #[error("audio exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Base64 characters checked per step. A multiple of 4, so every chunk but
/// the last is a complete, unpadded group of quads.
const VALIDATE_CHUNK: usize = 64 * 1024;

/// Check that `encoded` is valid base64 and return how many bytes it decodes
/// to, failing with [`AudioError::TooLarge`] past `limit`.
///
/// Decoding happens chunk by chunk into one reused buffer, so a payload is
/// never held twice in memory.
pub fn decoded_len(encoded: &str, limit: usize) -> Result<usize, AudioError> {
    // Padding trims at most two bytes off the estimate.
    let upper_bound = encoded.len().div_ceil(4) * 3;
    if upper_bound.saturating_sub(2) > limit {
        return Err(AudioError::TooLarge { limit });
    }
    // A single chunk cannot tell padding mid-payload from a valid tail.
    if let Some(offset) = encoded.trim_end_matches('=').find('=') {
        return Err(base64::DecodeError::InvalidByte(offset, b'=').into());
    }

    let mut buffer = Vec::with_capacity(VALIDATE_CHUNK / 4 * 3);
    let mut total = 0;
    for chunk in encoded.as_bytes().chunks(VALIDATE_CHUNK) {
        buffer.clear();
        STANDARD.decode_vec(chunk, &mut buffer)?;
        total += buffer.len();
    }

    if total > limit {
        return Err(AudioError::TooLarge { limit });
    }
    Ok(total)
}

/// Length of the base64 text for `raw_len` bytes (padded).
pub fn encoded_len(raw_len: usize) -> usize {
    raw_len.div_ceil(3) * 4
}

/// Accept either bare base64 or a `data:<mime>;base64,<payload>` URL and
/// return just the payload.
pub fn strip_data_url(input: &str) -> &str {
    match input.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, payload)| payload).unwrap_or(rest),
        None => input,
    }
}

/// Drain a byte stream into memory, failing once more than `limit` bytes
/// arrive or when the stream yields an error.
pub async fn read_limited<S, B, E>(mut stream: S, limit: usize) -> Result<Vec<u8>, AudioError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut bytes = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AudioError::Read(e.to_string()))?;
        let chunk = chunk.as_ref();
        if bytes.len() + chunk.len() > limit {
            return Err(AudioError::TooLarge { limit });
        }
        bytes.extend_from_slice(chunk);
    }
    Ok(bytes)
}
