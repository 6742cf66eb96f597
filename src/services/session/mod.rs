pub mod registry;
pub mod store;
pub mod sweeper;
pub mod types;
pub mod user_index;

pub use registry::SessionRegistry;
pub use store::SessionStore;
pub use types::{Eviction, EvictionCause, Generation, LiveBinding};
pub use user_index::UserIndex;
