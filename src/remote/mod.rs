//! HTTP clients for the dandanplay-compatible metadata service.
//!
//! Both clients share the same transient-failure policy: a fixed number
//! of attempts with a constant delay in between. Only transport errors
//! and unparsable bodies count as transient. A well-formed response with
//! `success: false` is a hard rejection and is never retried.

mod danmu_client;
mod match_client;
mod types;

pub use danmu_client::{DanmuClient, FetchOptions};
pub use match_client::{MatchClient, MatchOutcome};
pub use types::{CommentItem, CommentResponse, MatchCandidate, MatchRequest, MatchResponse};

use std::time::Duration;

/// Attempts made against the service before giving up on an item.
pub const MAX_ATTEMPTS: u32 = 3;

/// Pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
