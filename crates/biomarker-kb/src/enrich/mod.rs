//! Optional metadata enrichment for the rebuild direction.
//!
//! The rebuild engine only talks to a [`MetadataLookup`]. Network clients
//! are not part of this crate; callers plug their own in, usually behind a
//! [`CachedLookup`] so every identifier is fetched at most once per cache.

mod cache;
mod cached;
mod lookup;
mod mock;

pub use cache::{JsonFileCache, MemoryCache, MetadataCache};
pub use cached::{CachedLookup, LookupStats, RateLimiter};
pub use lookup::{CitationMetadata, ConditionMetadata, EntityMetadata, MetadataLookup, OfflineLookup};
pub use mock::MockLookup;
