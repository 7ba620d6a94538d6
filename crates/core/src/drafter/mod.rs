//! Self-speculative drafting: propose continuation tokens from the token
//! history instead of a second model.
//!
//! A drafter is invoked once per decode step by the speculative decoding
//! driver with the token history and the token the sampler just chose. It
//! returns candidate continuation tokens (possibly none), which the driver
//! verifies against the target model in one batched forward pass. Only
//! verified tokens are kept, so a drafter can be aggressive without
//! affecting output quality; a good drafter simply gets more tokens per
//! forward pass on self-repetitive text such as refactored code or
//! structured output.
//!
//! [`SelfDrafter`] implementations:
//! - [`SimpleNgramDrafter`]: echoes the continuation of the most recent
//!   prior occurrence of the trailing n-gram. No persistent statistics.
//! - [`KeyedNgramMap`]: keeps per-key continuation statistics for the
//!   session and drafts only when one continuation dominates; adapts draft
//!   lengths from acceptance feedback.
//!
//! Both are pure CPU components with zero model state. An instance belongs
//! to exactly one generation session and must not be shared across
//! concurrent sequences without external synchronization.

mod keyed;
mod simple;
mod stats;
mod tokens;

pub use keyed::{KeyedNgramConfig, KeyedNgramMap, MAX_TRACKED_OCCURRENCES, MAX_VALUE_SLOTS};
pub use simple::{SimpleNgramConfig, SimpleNgramDrafter};
pub use stats::{DrafterStats, DrafterStatsSnapshot, NoDraftReason};
pub use tokens::{format_token_window, format_tokens};

/// Trait for self-speculative token drafters.
///
/// A drafter examines the tokens generated so far plus the token just
/// sampled (not yet appended to the history) and proposes candidate
/// continuations. The history slice must be the same append-only sequence
/// across all calls of one session: drafters store indices into it and read
/// the tokens back out live.
///
/// `&mut self` throughout: the decode loop is single-threaded per sequence,
/// so no interior mutability is needed.
pub trait SelfDrafter: Send {
    /// Propose draft tokens for the current decode step.
    ///
    /// Returns an empty vec when no draft is produced. Never fails: every
    /// invalid or insufficient condition resolves to an empty draft.
    fn draft(&mut self, history: &[u32], sampled: u32) -> Vec<u32>;

    /// Notify the drafter how many tokens of its most recent draft the
    /// target model confirmed.
    ///
    /// Called once per decode step in which `draft` returned a non-empty
    /// result and verification ran, with 0 if nothing was accepted.
    /// Drafters without a feedback mechanism ignore it.
    fn on_tokens_accepted(&mut self, _num_accepted: usize) {}

    /// Name for logging and diagnostics.
    fn name(&self) -> &str;

    /// Snapshot of the drafter's session statistics.
    fn stats(&self) -> DrafterStatsSnapshot;
}
