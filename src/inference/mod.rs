//! # Inference Module
//!
//! The request/fallback core: picks a candidate order, walks it one model at
//! a time, and hands back exactly one outcome per request.
//!
//! ## Key Components:
//! - **pool**: priority or shuffled candidate ordering
//! - **gateway**: sequential attempts with quota-aware fallback
//! - **provider**: the client trait plus the quota predicate
//! - **progress**: status sink for callers rendering progress text
//! - **prompts**: per-task instruction prompts and temperatures
//! - **request**: request and outcome types

pub mod gateway;
pub mod pool;
pub mod progress;
pub mod prompts;
pub mod provider;
pub mod request;

pub use gateway::{
    AttemptRecord, AttemptResult, EmptyOutputPolicy, GatewaySettings, InferenceGateway,
};
pub use pool::{CandidatePool, PoolMode};
pub use progress::{ProgressLog, ProgressReporter};
pub use provider::{ContentPart, GenerationCall, GenerativeClient, ProviderError};
pub use request::{FailureReason, InferenceOutcome, InferenceRequest};
