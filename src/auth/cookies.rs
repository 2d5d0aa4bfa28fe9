/// Session cookies
///
/// Login and refresh hand tokens to browsers through three cookies:
/// `access_token` and `refresh_token` (httpOnly) and `logged_in`, a
/// script-readable flag that mirrors the access token lifetime.

use actix_web::cookie::time::{Duration as CookieDuration, OffsetDateTime};
use actix_web::cookie::{Cookie, SameSite};

use crate::configuration::JwtSettings;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const LOGGED_IN_COOKIE: &str = "logged_in";

/// Builds token cookies with lifetimes matching the tokens they carry
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    access_ttl: CookieDuration,
    refresh_ttl: CookieDuration,
    secure: bool,
}

impl CookiePolicy {
    pub fn from_settings(config: &JwtSettings) -> Self {
        Self {
            access_ttl: CookieDuration::minutes(config.access_token_expires_in),
            refresh_ttl: CookieDuration::minutes(config.refresh_token_expires_in),
            secure: config.secure_cookies,
        }
    }

    pub fn access_token(&self, token: &str) -> Cookie<'static> {
        self.build(ACCESS_TOKEN_COOKIE, token.to_string(), self.access_ttl, true)
    }

    pub fn refresh_token(&self, token: &str) -> Cookie<'static> {
        self.build(REFRESH_TOKEN_COOKIE, token.to_string(), self.refresh_ttl, true)
    }

    pub fn logged_in(&self) -> Cookie<'static> {
        self.build(LOGGED_IN_COOKIE, "true".to_string(), self.access_ttl, false)
    }

    /// Cookies that overwrite and immediately expire all three session cookies
    pub fn cleared(&self) -> Vec<Cookie<'static>> {
        [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, LOGGED_IN_COOKIE]
            .into_iter()
            .map(|name| {
                Cookie::build(name, "")
                    .path("/")
                    .max_age(CookieDuration::ZERO)
                    .expires(OffsetDateTime::now_utc() - CookieDuration::days(365))
                    .finish()
            })
            .collect()
    }

    fn build(
        &self,
        name: &'static str,
        value: String,
        ttl: CookieDuration,
        http_only: bool,
    ) -> Cookie<'static> {
        // browsers drop SameSite=None cookies that are not Secure
        let same_site = if self.secure { SameSite::None } else { SameSite::Lax };

        Cookie::build(name, value)
            .path("/")
            .http_only(http_only)
            .secure(self.secure)
            .same_site(same_site)
            .max_age(ttl)
            .expires(OffsetDateTime::now_utc() + ttl)
            .finish()
    }
}
