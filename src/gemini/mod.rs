//! # Gemini Provider
//!
//! `reqwest` client for the hosted Gemini `generateContent` API, implementing
//! the gateway's `GenerativeClient` port.

pub mod client;
pub mod types;

pub use client::GeminiClient;
