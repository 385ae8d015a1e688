//! Typed failure taxonomy for the resolution pipeline.
//!
//! Failures below the provider-adapter boundary never propagate to the
//! caller; they degrade to empty/partial data plus structured logging. The
//! variants here exist so the degradation sites log a classified event
//! rather than a bare string.

use thiserror::Error;

use crate::types::ProviderId;

#[derive(Debug, Error)]
pub enum ScheduleError {
    /// No provider could resolve the team name. Non-fatal: the prospect
    /// contributes an empty schedule.
    #[error("no provider match for team '{team}'")]
    ResolutionMiss { team: String },

    /// HTTP/timeout failure from a provider, after the single retry.
    /// Treated as an empty result.
    #[error("provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: ProviderId, reason: String },

    /// The resolver found multiple equally strong candidates. Must never be
    /// silently resolved to an arbitrary pick; the fix belongs in the
    /// curated override table.
    #[error("ambiguous match for '{team}' on {provider}: candidates {candidates:?}")]
    AmbiguousMatch {
        team: String,
        provider: ProviderId,
        candidates: Vec<String>,
    },

    /// Two distinct real-world games produced the same game key. A
    /// data-integrity defect: logged loudly, never silently dropped.
    #[error("game key collision on '{key}': '{incumbent}' vs '{candidate}'")]
    KeyCollision {
        key: String,
        incumbent: String,
        candidate: String,
    },

    /// The full pipeline exceeded its deadline and no cached payload was
    /// available to fall back on.
    #[error("schedule pipeline timed out after {secs}s with no cached fallback")]
    PipelineTimeout { secs: u64 },

    /// The cache store itself failed. The only non-timeout failure a caller
    /// may see, and only when no last-good payload exists.
    #[error("cache store unavailable: {0}")]
    StoreUnavailable(String),
}
