//! In-memory HTTP response cache.
//!
//! Reads go through [`serve`]: on a hit the stored response is replayed onto
//! the sink and the real handler never runs. On a miss the handler writes
//! through a [`CacheWriter`], which mirrors the response into the shared
//! [`ResponseStore`] while forwarding it to the client. Mutating handlers
//! invalidate the affected keys once their persistent write succeeds.

pub mod entry;
pub mod headers;
pub mod key;
pub mod serve;
pub mod store;
pub mod writer;

pub use entry::CachedResponse;
pub use key::make_key;
pub use serve::serve;
pub use store::ResponseStore;
pub use writer::CacheWriter;
