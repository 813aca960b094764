pub mod handle;
pub mod memory;
pub mod redis;

pub use handle::CacheHandle;
pub use memory::MemoryStore;
pub use redis::RedisStore;
