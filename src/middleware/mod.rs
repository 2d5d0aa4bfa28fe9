/// Middleware module
///
/// Guards for routes that need an authenticated user.

mod require_login;

pub use require_login::RequireLogin;
