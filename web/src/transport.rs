//! Writing credentials onto responses.
//!
//! Login and refresh set the encrypted session cookie and return the CSRF
//! token in the `X-CSRF-Token` response header. Logout replaces the cookie
//! with an expired, empty one.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use marketplace_auth::config::CookieConfig;
use marketplace_auth::constants::transport::CSRF_HEADER;
use marketplace_auth::IssuedCredentials;
use time::Duration;

/// Session cookie carrying `value`.
#[must_use]
pub fn session_cookie(config: &CookieConfig, value: String) -> Cookie<'static> {
    Cookie::build((config.name.clone(), value))
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .path(config.path.clone())
        .max_age(Duration::seconds(config.max_age.num_seconds()))
        .build()
}

/// Removal cookie for the session.
#[must_use]
pub fn clear_session_cookie(config: &CookieConfig) -> Cookie<'static> {
    Cookie::build((config.name.clone(), ""))
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .path(config.path.clone())
        .max_age(Duration::ZERO)
        .build()
}

/// Cookie jar and CSRF header for freshly issued credentials.
#[must_use]
pub fn issue(
    jar: CookieJar,
    config: &CookieConfig,
    issued: &IssuedCredentials,
) -> (CookieJar, [(&'static str, String); 1]) {
    let jar = jar.add(session_cookie(config, issued.cookie_value.clone()));
    (jar, [(CSRF_HEADER, issued.csrf_token.clone())])
}

/// Cookie jar with the session cookie cleared.
#[must_use]
pub fn clear(jar: CookieJar, config: &CookieConfig) -> CookieJar {
    jar.add(clear_session_cookie(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let config = CookieConfig::default();
        let cookie = session_cookie(&config, "opaque".to_string());

        assert_eq!(cookie.name(), "marketplace-session");
        assert_eq!(cookie.value(), "opaque");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    }

    #[test]
    fn test_insecure_cookie_for_local_development() {
        let config = CookieConfig::default().with_secure(false);
        assert_eq!(session_cookie(&config, String::new()).secure(), Some(false));
    }

    #[test]
    fn test_clear_session_cookie() {
        let cookie = clear_session_cookie(&CookieConfig::default());

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.path(), Some("/"));
    }
}
