//! View cache crate.
//!
//! Keeps one payload per logical view ("feed window", "browse page", ..)
//! and refreshes it through a caller-supplied fetch once it goes stale.

pub mod clock;
pub mod layer;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use layer::{CacheStats, ViewCache};
pub use store::{CacheEntry, CacheStore, JsonFileStore, MemoryStore};
