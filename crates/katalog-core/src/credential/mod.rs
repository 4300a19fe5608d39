//! Bearer token lookup.
//!
//! The token is an opaque credential owned by whatever session manager logged
//! the user in. This module only reads it; nothing here caches a token, since
//! it may change between two calls (after a login, for example).

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::ClientConfig;

/// Well-known cookie key the session manager writes the token under.
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// Environment variable read by [`EnvCredentials`].
pub const TOKEN_ENV_VAR: &str = "KATALOG_TOKEN";

#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Returns `None` for blank input; a blank token is the same as no token.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("Token").field(&"[REDACTED]").finish()
    }
}

/// Source of the current bearer token. Absence is a normal state.
pub trait CredentialSource: Send + Sync {
    fn token(&self) -> Option<Token>;
}

/// Anonymous access; the server decides what an unauthenticated caller may do.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialSource for NoCredentials {
    fn token(&self) -> Option<Token> {
        None
    }
}

/// Reads the token out of a `k=v; k2=v2` cookie string.
///
/// The cookie string is shared: the session manager replaces it through
/// [`CookieCredentials::set_cookies`] and every request re-parses it.
#[derive(Debug, Clone)]
pub struct CookieCredentials {
    key: String,
    jar: Arc<RwLock<String>>,
}

impl Default for CookieCredentials {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_KEY)
    }
}

impl CookieCredentials {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            jar: Arc::new(RwLock::new(String::new())),
        }
    }

    /// Cookie accessor keyed by the configured token cookie name.
    #[must_use]
    pub fn for_config(config: &ClientConfig) -> Self {
        Self::new(config.token_cookie_name.clone())
    }

    pub fn set_cookies(&self, raw: impl Into<String>) {
        *self.jar.write().unwrap_or_else(PoisonError::into_inner) = raw.into();
    }

    pub fn clear(&self) {
        self.jar
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl CredentialSource for CookieCredentials {
    fn token(&self) -> Option<Token> {
        let jar = self.jar.read().unwrap_or_else(PoisonError::into_inner);
        token_from_cookies(&jar, &self.key)
    }
}

/// Reads the token from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self {
            var: TOKEN_ENV_VAR.to_string(),
        }
    }
}

impl EnvCredentials {
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvCredentials {
    fn token(&self) -> Option<Token> {
        std::env::var(&self.var).ok().and_then(Token::new)
    }
}

/// Find `key` in a cookie string. Values are percent-decoded when possible.
#[must_use]
pub fn token_from_cookies(cookies: &str, key: &str) -> Option<Token> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == key)
        .and_then(|(_, value)| {
            let decoded = urlencoding::decode(value)
                .map_or_else(|_| value.to_string(), std::borrow::Cow::into_owned);
            Token::new(decoded)
        })
}
