//! Simple n-gram drafter.
//!
//! Treats the token history as its own draft model: find the most recent
//! prior occurrence of the trailing n-gram (including the token the sampler
//! just chose) and propose the tokens that followed it last time. No
//! persistent statistics are kept; the only cross-call state is the
//! check-rate throttle position.
//!
//! The backward scan is O(history) per attempt, which is why attempts are
//! throttled to once per `check_rate` generated tokens.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::stats::{DrafterStats, DrafterStatsSnapshot, NoDraftReason};
use super::SelfDrafter;

/// Configuration for the simple n-gram drafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleNgramConfig {
    /// Length of the trailing n-gram looked up in the token history.
    pub size_ngram: usize,
    /// Maximum number of tokens to draft after a match.
    pub size_mgram: usize,
    /// Minimum number of generated tokens between two search attempts.
    pub check_rate: usize,
}

impl Default for SimpleNgramConfig {
    fn default() -> Self {
        Self {
            size_ngram: 6,
            size_mgram: 12,
            check_rate: 5,
        }
    }
}

/// Self-speculative drafter that echoes the continuation of the most recent
/// prior occurrence of the current trailing n-gram.
///
/// # Algorithm
///
/// 1. Build the n-gram that will exist once the sampled token is committed:
///    the last `size_ngram - 1` history tokens plus the sampled token.
/// 2. Scan backward through the history for the nearest prior position
///    holding that exact n-gram. Position 0 is reserved as the no-match
///    sentinel and never tested.
/// 3. Propose up to `size_mgram` tokens that followed the match, provided at
///    least `size_ngram` of them exist (shorter echoes are not worth a
///    verification pass).
///
/// Every failure mode resolves to an empty draft; the only mutation besides
/// the throttle position is the statistics counters.
#[derive(Debug)]
pub struct SimpleNgramDrafter {
    config: SimpleNgramConfig,
    /// History length at which a search was last attempted. Monotonically
    /// non-decreasing and never larger than the current history length.
    idx_last_check: usize,
    stats: DrafterStats,
}

impl SimpleNgramDrafter {
    /// Create a new drafter with the given configuration.
    ///
    /// The configuration is taken as-is; zero-sized n-grams or a zero check
    /// rate are caller precondition violations (see
    /// [`crate::config::DrafterConfig::build`] for the validating path).
    pub fn new(config: SimpleNgramConfig) -> Self {
        Self {
            config,
            idx_last_check: 0,
            stats: DrafterStats::new(),
        }
    }

    /// Create a drafter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SimpleNgramConfig::default())
    }

    /// Propose draft tokens for the current decode step.
    ///
    /// `history` is the token sequence generated so far; `sampled` is the
    /// token the sampler just chose, not yet appended to `history`. Returns
    /// an empty vec whenever no useful draft exists.
    pub fn draft(&mut self, history: &[u32], sampled: u32) -> Vec<u32> {
        let cur_len = history.len();
        let n = self.config.size_ngram;
        let m = self.config.size_mgram;

        // Only check every check_rate tokens to bound search cost.
        if self.idx_last_check + self.config.check_rate > cur_len {
            self.stats.record_no_draft(NoDraftReason::Throttled);
            return Vec::new();
        }

        // Need room for the pattern, a full draft, and the sentinel.
        if cur_len <= n + m + 1 {
            self.stats.record_no_draft(NoDraftReason::HistoryTooShort);
            return Vec::new();
        }

        // The n-gram that will exist once `sampled` is committed.
        let mut pattern = Vec::with_capacity(n);
        pattern.extend_from_slice(&history[cur_len - n + 1..]);
        pattern.push(sampled);

        self.idx_last_check = cur_len;

        // Backward scan, skipping the trailing position we are standing on.
        // Position 0 is the no-match sentinel and is never tested.
        let search_start = cur_len - n - 1;
        let Some(match_pos) = rfind_pattern(history, &pattern, search_start) else {
            self.stats.record_no_draft(NoDraftReason::NoMatch);
            return Vec::new();
        };

        // Cap by the configured maximum and by what actually follows the
        // matched n-gram in history.
        let draft_len = m.min(cur_len - (match_pos + n));
        if draft_len < n {
            // Too few tokens to be worth a verification pass.
            self.stats.record_no_draft(NoDraftReason::NoMatch);
            return Vec::new();
        }

        debug!(
            cur_len,
            match_pos,
            pattern_len = pattern.len(),
            draft_len,
            "ngram pattern matched"
        );

        self.stats.record_draft(draft_len);
        history[match_pos + n..][..draft_len].to_vec()
    }

    /// Snapshot of this drafter's session statistics.
    pub fn stats(&self) -> DrafterStatsSnapshot {
        self.stats.snapshot()
    }
}

impl SelfDrafter for SimpleNgramDrafter {
    fn draft(&mut self, history: &[u32], sampled: u32) -> Vec<u32> {
        SimpleNgramDrafter::draft(self, history, sampled)
    }

    fn name(&self) -> &str {
        "ngram_simple"
    }

    fn stats(&self) -> DrafterStatsSnapshot {
        SimpleNgramDrafter::stats(self)
    }
}

/// Find the highest position in `1..=search_start` where `pattern` occurs in
/// `history`. The caller guarantees `search_start + pattern.len() <=
/// history.len()`.
fn rfind_pattern(history: &[u32], pattern: &[u32], search_start: usize) -> Option<usize> {
    (1..=search_start)
        .rev()
        .find(|&j| history[j..j + pattern.len()] == *pattern)
}
