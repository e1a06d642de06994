//! Batched delivery to the push gateway.
//!
//! Tokens are split into consecutive chunks of at most `batch_size`; each
//! chunk is one gateway call. Per-token tickets and per-chunk transport
//! failures are reduced into a single `DispatchResult`.

mod sender;

pub use sender::{BatchConfig, BatchSender};
