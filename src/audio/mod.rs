//! # Audio Input Handling
//!
//! Everything between a raw upload and the base64 payload the gateway sends
//! upstream. No decoding happens here; the provider receives the file as-is.

pub mod encoding;
pub mod format;

pub use encoding::{
    decoded_len, encode_base64, encoded_len, read_limited, strip_data_url, AudioError,
};
pub use format::{format_file_size, is_audio_mime, normalize_audio_mime};
