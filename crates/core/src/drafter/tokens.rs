//! Token formatting helpers for drafter diagnostics.
//!
//! Draft decisions are easiest to debug by looking at the raw token windows
//! involved, so log events render them in the `[v0, v1, v2]` form.

use std::fmt::Write;

/// Render a token slice as `[v0, v1, v2, ...]`.
pub fn format_tokens(tokens: &[u32]) -> String {
    let mut out = String::with_capacity(2 + tokens.len() * 6);
    out.push('[');
    for (i, tok) in tokens.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{tok}");
    }
    out.push(']');
    out
}

/// Render the `len`-token window of `tokens` starting at `start`.
///
/// The window is clamped to the end of the slice, so a window that runs past
/// the end renders the tokens that do exist rather than panicking.
pub fn format_token_window(tokens: &[u32], start: usize, len: usize) -> String {
    let start = start.min(tokens.len());
    let end = (start + len).min(tokens.len());
    format_tokens(&tokens[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slice() {
        assert_eq!(format_tokens(&[]), "[]");
    }

    #[test]
    fn single_token() {
        assert_eq!(format_tokens(&[42]), "[42]");
    }

    #[test]
    fn multiple_tokens() {
        assert_eq!(format_tokens(&[5, 1, 2, 3]), "[5, 1, 2, 3]");
    }

    #[test]
    fn window_basic() {
        assert_eq!(format_token_window(&[5, 1, 2, 3, 9], 1, 3), "[1, 2, 3]");
    }

    #[test]
    fn window_clamped_to_end() {
        assert_eq!(format_token_window(&[5, 1, 2], 1, 10), "[1, 2]");
    }

    #[test]
    fn window_start_past_end() {
        assert_eq!(format_token_window(&[5, 1, 2], 7, 2), "[]");
    }
}
