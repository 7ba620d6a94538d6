//! Keyed n-gram drafter with multi-value statistics.
//!
//! Maintains a session-lifetime table of key n-grams discovered in the token
//! history. For each key, up to [`MAX_VALUE_SLOTS`] distinct continuation
//! m-grams are tracked with occurrence counts, and a draft is only proposed
//! when one continuation clearly dominates the others. After the target
//! model verifies a draft, [`KeyedNgramMap::accept`] feeds the confirmed
//! token count back into a per-(key, value) trusted length that caps future
//! drafts of that pairing.
//!
//! The table is append-only: keys are never evicted and value slots beyond
//! the fixed capacity are silently dropped. Both scans over the history are
//! linear; the check-rate throttle and the per-key statistics watermark
//! (`stat_idx`) keep the amortized cost per generated token small.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::stats::{DrafterStats, DrafterStatsSnapshot, NoDraftReason};
use super::tokens::format_token_window;
use super::SelfDrafter;

/// Number of distinct continuations tracked per key. Continuations beyond
/// this are dropped rather than evicting a tracked slot.
pub const MAX_VALUE_SLOTS: usize = 4;

/// Saturation cap for key and value occurrence counters.
pub const MAX_TRACKED_OCCURRENCES: u16 = 16380;

/// Configuration for the keyed n-gram drafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyedNgramConfig {
    /// Length of the key n-gram.
    pub size_key: usize,
    /// Length of the value m-gram (maximum draft length).
    pub size_value: usize,
    /// Minimum number of generated tokens between two draft attempts.
    pub check_rate: usize,
    /// Minimum key occurrence count before a draft is considered.
    pub min_hits: u16,
    /// Draft from the most recent continuation unconditionally, skipping
    /// the frequency-dominance reasoning.
    pub key_only: bool,
}

impl Default for KeyedNgramConfig {
    fn default() -> Self {
        Self {
            size_key: 4,
            size_value: 8,
            check_rate: 1,
            min_hits: 2,
            key_only: false,
        }
    }
}

/// One tracked continuation of a key n-gram.
#[derive(Debug, Clone, Copy)]
struct ValueSlot {
    /// History index where this continuation m-gram begins. The tokens are
    /// always read live from the history, never stored.
    start: usize,
    /// How often this continuation has been observed after the key.
    hits: u16,
    /// Adaptive cap on how many tokens of this continuation to draft,
    /// overwritten by acceptance feedback.
    trusted_len: u16,
}

/// Statistics for one distinct key n-gram.
#[derive(Debug)]
struct KeyEntry {
    /// History index of the first known occurrence; used only to read the
    /// key's tokens back out of the history for identity comparisons.
    key_idx: usize,
    /// History positions below this have already been scanned into the
    /// value statistics. Monotonically increases toward the most recent
    /// match position.
    stat_idx: usize,
    /// How often this key has been observed, saturating.
    key_num: u16,
    /// Tracked continuations; slots fill from the front and no gaps form.
    values: [Option<ValueSlot>; MAX_VALUE_SLOTS],
}

impl KeyEntry {
    fn new(key_idx: usize) -> Self {
        Self {
            key_idx,
            stat_idx: 0,
            key_num: 0,
            values: [None; MAX_VALUE_SLOTS],
        }
    }
}

/// Self-speculative drafter backed by a keyed n-gram statistics table.
///
/// Each `draft` call resolves the trailing key n-gram against the table,
/// updates occurrence statistics for the continuations seen after it, and
/// drafts only when the key has been seen at least `min_hits` times and one
/// continuation is at least three times as frequent as all others combined.
/// In `key_only` mode the statistics machinery is bypassed and the most
/// recent continuation is drafted unconditionally.
///
/// One instance serves one generation session; the table lives for the
/// session and is never persisted.
#[derive(Debug)]
pub struct KeyedNgramMap {
    config: KeyedNgramConfig,
    /// History length at which a draft was last attempted.
    idx_last_check: usize,
    /// Discovered keys in insertion order. Append-only.
    keys: Vec<KeyEntry>,
    /// Whether the most recent draft came from the dominance path and is
    /// awaiting acceptance feedback.
    last_draft_created: bool,
    last_draft_key_idx: usize,
    last_draft_value_idx: usize,
    stats: DrafterStats,
}

impl KeyedNgramMap {
    /// Create a new map with the given configuration.
    ///
    /// The configuration is taken as-is; zero lengths or a zero check rate
    /// are caller precondition violations (see
    /// [`crate::config::DrafterConfig::build`] for the validating path).
    pub fn new(config: KeyedNgramConfig) -> Self {
        Self {
            config,
            idx_last_check: 0,
            keys: Vec::new(),
            last_draft_created: false,
            last_draft_key_idx: 0,
            last_draft_value_idx: 0,
            stats: DrafterStats::new(),
        }
    }

    /// Create a map with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(KeyedNgramConfig::default())
    }

    /// Propose draft tokens for the current decode step.
    ///
    /// `history` is the token sequence generated so far; `sampled` is the
    /// token the sampler just chose, not yet appended to `history`. Returns
    /// an empty vec whenever no draft is produced; every call fully
    /// completes or fully no-ops, there is no suspended state between calls
    /// beyond the persisted fields.
    pub fn draft(&mut self, history: &[u32], sampled: u32) -> Vec<u32> {
        self.last_draft_created = false;
        self.last_draft_key_idx = 0;
        self.last_draft_value_idx = 0;

        let cur_len = history.len();
        let n = self.config.size_key;
        let m = self.config.size_value;
        if cur_len < 2 * n + m {
            self.stats.record_no_draft(NoDraftReason::HistoryTooShort);
            return Vec::new();
        }

        // Only check every check_rate tokens to bound search cost.
        if self.idx_last_check + self.config.check_rate > cur_len {
            self.stats.record_no_draft(NoDraftReason::Throttled);
            return Vec::new();
        }
        self.idx_last_check = cur_len;

        // The key n-gram that will exist once `sampled` is committed.
        let mut key_tokens = Vec::with_capacity(n);
        key_tokens.extend_from_slice(&history[cur_len - n + 1..]);
        key_tokens.push(sampled);

        // Backward search for a prior occurrence, leaving room for a full
        // value m-gram after it. Position 0 is the no-match sentinel.
        let search_start = cur_len - n - m - 1;
        let Some(match_pos) = rfind_window(history, &key_tokens, search_start) else {
            self.stats.record_no_draft(NoDraftReason::NoMatch);
            return Vec::new();
        };
        debug!(cur_len, n, m, sampled, match_pos, "key n-gram matched");

        // Resolve the key's identity in the table by comparing the live
        // history window at each entry's first occurrence, not stored
        // copies.
        let key_offset = match self
            .keys
            .iter()
            .position(|key| history[key.key_idx..key.key_idx + n] == key_tokens[..])
        {
            Some(offset) => offset,
            None => {
                self.keys.push(KeyEntry::new(match_pos));
                self.keys.len() - 1
            }
        };

        let entry = &mut self.keys[key_offset];
        entry.key_num = bump(entry.key_num);

        if self.config.key_only {
            // Draft the continuation of the most recent occurrence
            // unconditionally, working with slot 0 only. Key-only drafts do
            // not arm the acceptance-feedback path.
            let trusted = entry.values[0].map_or(m, |slot| usize::from(slot.trusted_len));
            let draft_len = m.min(trusted);
            let draft = history[match_pos + n..][..draft_len].to_vec();

            debug!(
                key_offset,
                key_num = entry.key_num,
                draft_len = draft.len(),
                "key-only draft"
            );

            self.last_draft_key_idx = key_offset;
            self.last_draft_value_idx = 0;
            self.stats.record_draft(draft.len());
            return draft;
        }

        if entry.key_num < self.config.min_hits {
            debug!(
                key_offset,
                key_num = entry.key_num,
                min_hits = self.config.min_hits,
                "key below min hits, no draft"
            );
            self.stats.record_no_draft(NoDraftReason::BelowMinHits);
            return Vec::new();
        }

        // Fold every occurrence of the key since the last scan into the
        // value statistics. The watermark avoids rescanning the prefix on
        // every call.
        for i in entry.stat_idx..=match_pos {
            if history[i..i + n] != key_tokens[..] {
                continue;
            }
            let value_start = i + n;
            for slot in entry.values.iter_mut() {
                match slot {
                    Some(value)
                        if history[value_start..value_start + m]
                            == history[value.start..value.start + m] =>
                    {
                        value.hits = bump(value.hits);
                        break;
                    }
                    None => {
                        *slot = Some(ValueSlot {
                            start: value_start,
                            hits: 1,
                            trusted_len: m as u16,
                        });
                        break;
                    }
                    // Occupied by a different continuation; try the next
                    // slot. With all slots full the occurrence is dropped.
                    Some(_) => {}
                }
            }
        }
        entry.stat_idx = match_pos;

        // Dominance decision: the leading continuation must be at least
        // three times as frequent as all others combined.
        let mut max_occur: u16 = 0;
        let mut slot_max = 0;
        for (v, slot) in entry.values.iter().enumerate() {
            let occur = slot.map_or(0, |value| value.hits);
            if occur > max_occur {
                max_occur = occur;
                slot_max = v;
            }
        }
        let sum_occur: u32 = entry
            .values
            .iter()
            .enumerate()
            .filter(|(v, _)| *v != slot_max)
            .map(|(_, slot)| slot.map_or(0, |value| u32::from(value.hits)))
            .sum();

        debug!(
            key_offset,
            max_occur, sum_occur, slot_max, "value statistics updated"
        );
        for (v, slot) in entry.values.iter().enumerate() {
            if let Some(value) = slot {
                trace!(
                    slot = v,
                    hits = value.hits,
                    tokens = %format_token_window(history, value.start, m),
                    "tracked value"
                );
            }
        }

        if sum_occur > 0 && u32::from(max_occur) < 3 * sum_occur {
            self.stats.record_no_draft(NoDraftReason::NoDominantValue);
            return Vec::new();
        }

        let trusted = entry.values[slot_max].map_or(m, |slot| usize::from(slot.trusted_len));
        let draft_len = m.min(trusted);
        let draft = history[match_pos + n..][..draft_len].to_vec();

        debug!(
            key_offset,
            slot_max,
            key_num = entry.key_num,
            draft_len = draft.len(),
            "dominant-value draft"
        );

        self.last_draft_created = true;
        self.last_draft_key_idx = key_offset;
        self.last_draft_value_idx = slot_max;
        self.stats.record_draft(draft.len());
        draft
    }

    /// Feed back how many tokens of the most recent draft the target model
    /// confirmed.
    ///
    /// A no-op unless the last `draft` call produced a dominance-path draft
    /// whose feedback has not yet been consumed. The confirmed count
    /// directly overwrites the (key, value) pair's trusted length, capping
    /// the next draft of that pairing.
    pub fn accept(&mut self, num_accepted: usize) {
        if !self.last_draft_created {
            return;
        }
        self.last_draft_created = false;

        let entry = &mut self.keys[self.last_draft_key_idx];
        if let Some(slot) = entry.values[self.last_draft_value_idx].as_mut() {
            debug!(
                num_accepted,
                prev_trusted = slot.trusted_len,
                key_offset = self.last_draft_key_idx,
                slot = self.last_draft_value_idx,
                "acceptance feedback"
            );
            slot.trusted_len = num_accepted.min(usize::from(u16::MAX)) as u16;
            self.stats.record_accepted(num_accepted);
        }
    }

    /// Whether the most recent `draft` call armed the feedback path.
    ///
    /// The driver can use this to decide whether an `accept` call will have
    /// any effect; key-only drafts never arm it.
    pub fn last_draft_created(&self) -> bool {
        self.last_draft_created
    }

    /// Number of distinct keys discovered so far.
    pub fn num_keys(&self) -> usize {
        self.keys.len()
    }

    /// Snapshot of this drafter's session statistics.
    pub fn stats(&self) -> DrafterStatsSnapshot {
        self.stats.snapshot()
    }
}

impl SelfDrafter for KeyedNgramMap {
    fn draft(&mut self, history: &[u32], sampled: u32) -> Vec<u32> {
        KeyedNgramMap::draft(self, history, sampled)
    }

    fn on_tokens_accepted(&mut self, num_accepted: usize) {
        self.accept(num_accepted);
    }

    fn name(&self) -> &str {
        "ngram_map"
    }

    fn stats(&self) -> DrafterStatsSnapshot {
        KeyedNgramMap::stats(self)
    }
}

/// Saturating occurrence-counter increment.
fn bump(counter: u16) -> u16 {
    counter.saturating_add(1).min(MAX_TRACKED_OCCURRENCES)
}

/// Find the highest position in `1..=search_start` where `window` occurs in
/// `history`. The caller guarantees `search_start + window.len() <=
/// history.len()`.
fn rfind_window(history: &[u32], window: &[u32], search_start: usize) -> Option<usize> {
    (1..=search_start)
        .rev()
        .find(|&j| history[j..j + window.len()] == *window)
}
