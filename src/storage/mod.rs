//! Data storage and persistence
//!
//! The pending transaction pool lives in memory. The only durable state is
//! the head pointer, kept in sled.

pub mod head_store;
pub mod memory_pool;

pub use head_store::HeadStore;
pub use memory_pool::MemoryPool;
