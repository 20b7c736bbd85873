//! Shared utilities.

mod cancel;
mod hash;
mod path;
mod pool;

pub use cancel::CancellationToken;
pub use hash::content_hash;
pub use path::{file_stem, join_relative, normalize_separators, split_segments};
pub use pool::{worker_count, worker_pool};
