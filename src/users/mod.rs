/// User directory
///
/// The user record store consumed by the authentication core, with a
/// Postgres backend and an in-memory backend.

mod directory;
mod memory;
mod model;
mod postgres;

pub use directory::UserDirectory;
pub use memory::InMemoryUserDirectory;
pub use model::{NewUser, Projection, User, DEFAULT_PHOTO, DEFAULT_ROLE};
pub use postgres::PgUserDirectory;
