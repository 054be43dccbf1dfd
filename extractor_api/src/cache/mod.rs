pub mod api;
pub mod memory;

pub use api::{CacheAPI, MapAPI};
pub use memory::MemoryCache;
