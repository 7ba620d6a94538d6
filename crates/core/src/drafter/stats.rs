//! Per-session drafting statistics.
//!
//! Every `draft` call either proposes tokens or declines for one of a small
//! set of reasons; both outcomes are counted here so operators can see how
//! often a drafter fires and how much of what it proposes survives
//! verification. A drafter is owned by a single generation session, so the
//! counters are plain fields mutated through `&mut` — no atomics.

use serde::Serialize;

/// Why a `draft` call produced no tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDraftReason {
    /// History shorter than the configured n/m lengths require.
    HistoryTooShort,
    /// The check-rate interval has not elapsed since the last attempt.
    Throttled,
    /// No prior occurrence of the trailing n-gram was found.
    NoMatch,
    /// The key has been seen fewer than `min_hits` times.
    BelowMinHits,
    /// No candidate continuation dominates the others in frequency.
    NoDominantValue,
}

/// Counters for one drafter over one generation session.
#[derive(Debug, Default)]
pub struct DrafterStats {
    drafts_proposed: u64,
    tokens_drafted: u64,
    tokens_accepted: u64,
    history_too_short: u64,
    throttled: u64,
    no_match: u64,
    below_min_hits: u64,
    no_dominant_value: u64,
}

impl DrafterStats {
    /// Create new stats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a draft of `num_tokens` proposed tokens.
    pub fn record_draft(&mut self, num_tokens: usize) {
        self.drafts_proposed += 1;
        self.tokens_drafted += num_tokens as u64;
    }

    /// Record a declined draft attempt.
    pub fn record_no_draft(&mut self, reason: NoDraftReason) {
        match reason {
            NoDraftReason::HistoryTooShort => self.history_too_short += 1,
            NoDraftReason::Throttled => self.throttled += 1,
            NoDraftReason::NoMatch => self.no_match += 1,
            NoDraftReason::BelowMinHits => self.below_min_hits += 1,
            NoDraftReason::NoDominantValue => self.no_dominant_value += 1,
        }
    }

    /// Record how many tokens of the most recent draft were confirmed by
    /// the target model.
    pub fn record_accepted(&mut self, num_tokens: usize) {
        self.tokens_accepted += num_tokens as u64;
    }

    /// Total drafts proposed.
    pub fn drafts_proposed(&self) -> u64 {
        self.drafts_proposed
    }

    /// Total tokens proposed across all drafts.
    pub fn tokens_drafted(&self) -> u64 {
        self.tokens_drafted
    }

    /// Total proposed tokens confirmed by verification.
    pub fn tokens_accepted(&self) -> u64 {
        self.tokens_accepted
    }

    /// Fraction of drafted tokens that were accepted (0.0 to 1.0).
    ///
    /// Returns `None` before any tokens have been drafted.
    pub fn acceptance_rate(&self) -> Option<f64> {
        if self.tokens_drafted == 0 {
            None
        } else {
            Some(self.tokens_accepted as f64 / self.tokens_drafted as f64)
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Get a snapshot of all statistics.
    pub fn snapshot(&self) -> DrafterStatsSnapshot {
        DrafterStatsSnapshot {
            drafts_proposed: self.drafts_proposed,
            tokens_drafted: self.tokens_drafted,
            tokens_accepted: self.tokens_accepted,
            history_too_short: self.history_too_short,
            throttled: self.throttled,
            no_match: self.no_match,
            below_min_hits: self.below_min_hits,
            no_dominant_value: self.no_dominant_value,
            acceptance_rate: self.acceptance_rate(),
        }
    }
}

/// Point-in-time snapshot of drafting statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DrafterStatsSnapshot {
    /// Total drafts proposed.
    pub drafts_proposed: u64,
    /// Total tokens proposed across all drafts.
    pub tokens_drafted: u64,
    /// Total proposed tokens confirmed by verification.
    pub tokens_accepted: u64,
    /// Attempts declined: history too short.
    pub history_too_short: u64,
    /// Attempts declined: check-rate throttle.
    pub throttled: u64,
    /// Attempts declined: no pattern match in history.
    pub no_match: u64,
    /// Attempts declined: key below the min-hits threshold.
    pub below_min_hits: u64,
    /// Attempts declined: no dominant candidate continuation.
    pub no_dominant_value: u64,
    /// tokens_accepted / tokens_drafted, `None` if nothing drafted yet.
    pub acceptance_rate: Option<f64>,
}
