//! Self-speculative decoding drafters.
//!
//! Components that propose candidate continuation tokens for an LLM
//! inference server without running a second neural model, by mining the
//! already-generated token history for repeated patterns. The driver
//! verifies drafts against the target model in one batched forward pass and
//! keeps only the accepted tokens, turning self-repetitive output into
//! multiple tokens per forward pass.

pub mod config;
pub mod drafter;
