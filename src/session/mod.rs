/// Session store
///
/// Server-side session records keyed by user id. A session's presence is
/// what keeps otherwise self-contained tokens valid.

mod memory;
mod redis;
mod store;

pub use self::memory::InMemorySessionStore;
pub use self::redis::RedisSessionStore;
pub use self::store::{SessionRecord, SessionStore};
