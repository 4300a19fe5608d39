//! Bearer token storage backed by the system keychain.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use katalog_core::credential::{CredentialSource, EnvCredentials, Token};

use crate::error::CliError;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "katalog-cli";

/// Where the token for a profile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    Environment,
    Keychain,
}

#[derive(Clone)]
pub struct TokenStore {
    username: String,
}

impl TokenStore {
    pub fn new(profile_name: &str) -> Self {
        Self {
            username: format!("bearer_token:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> Result<Entry, CliError> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| CliError::Auth(error.to_string()))
    }

    #[cfg(not(test))]
    pub fn load(&self) -> Result<Option<Token>, CliError> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(Token::new(raw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(CliError::Auth(error.to_string())),
        }
    }

    #[cfg(test)]
    pub fn load(&self) -> Result<Option<Token>, CliError> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| CliError::Auth(error.to_string()))?;
        Ok(guard.get(&self.username).and_then(Token::new))
    }

    #[cfg(not(test))]
    pub fn save(&self, token: &Token) -> Result<(), CliError> {
        self.entry()?
            .set_password(token.expose())
            .map_err(|error| CliError::Auth(error.to_string()))
    }

    #[cfg(test)]
    pub fn save(&self, token: &Token) -> Result<(), CliError> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| CliError::Auth(error.to_string()))?;
        guard.insert(self.username.clone(), token.expose().to_string());
        Ok(())
    }

    #[cfg(not(test))]
    pub fn clear(&self) -> Result<(), CliError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(CliError::Auth(error.to_string())),
        }
    }

    #[cfg(test)]
    pub fn clear(&self) -> Result<(), CliError> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| CliError::Auth(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

/// `KATALOG_TOKEN` when set, otherwise the profile's keychain entry.
///
/// Read on every request, so `auth set-token` from another shell takes
/// effect without restarting anything.
pub struct ProfileCredentials {
    store: TokenStore,
    env: EnvCredentials,
}

impl ProfileCredentials {
    pub fn new(profile_name: &str) -> Self {
        Self {
            store: TokenStore::new(profile_name),
            env: EnvCredentials::default(),
        }
    }

    pub fn resolve(&self) -> Result<Option<(Token, TokenOrigin)>, CliError> {
        if let Some(token) = self.env.token() {
            return Ok(Some((token, TokenOrigin::Environment)));
        }
        Ok(self
            .store
            .load()?
            .map(|token| (token, TokenOrigin::Keychain)))
    }
}

impl CredentialSource for ProfileCredentials {
    fn token(&self) -> Option<Token> {
        match self.resolve() {
            Ok(found) => found.map(|(token, _)| token),
            Err(error) => {
                tracing::warn!("Failed to read stored token: {error}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Each test reads its own variable so parallel tests never interfere.
    fn credentials(profile: &str, env_var: &str, env_value: Option<&str>) -> ProfileCredentials {
        match env_value {
            Some(value) => std::env::set_var(env_var, value),
            None => std::env::remove_var(env_var),
        }
        ProfileCredentials {
            store: TokenStore::new(profile),
            env: EnvCredentials::new(env_var),
        }
    }

    #[test]
    fn keychain_token_roundtrip() {
        let store = TokenStore::new("auth-roundtrip");
        store.save(&Token::new("abc.def").unwrap()).unwrap();
        assert_eq!(store.load().unwrap().unwrap().expose(), "abc.def");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn environment_token_wins_over_keychain() {
        TokenStore::new("auth-env")
            .save(&Token::new("from-keychain").unwrap())
            .unwrap();
        let credentials = credentials("auth-env", "KATALOG_TEST_TOKEN_ENV", Some("from-env"));

        let (token, origin) = credentials.resolve().unwrap().unwrap();
        assert_eq!(token.expose(), "from-env");
        assert_eq!(origin, TokenOrigin::Environment);
    }

    #[test]
    fn blank_environment_token_falls_through() {
        TokenStore::new("auth-blank-env")
            .save(&Token::new("from-keychain").unwrap())
            .unwrap();
        let credentials = credentials("auth-blank-env", "KATALOG_TEST_TOKEN_BLANK", Some("  "));

        let (token, origin) = credentials.resolve().unwrap().unwrap();
        assert_eq!(token.expose(), "from-keychain");
        assert_eq!(origin, TokenOrigin::Keychain);
    }

    #[test]
    fn missing_token_is_anonymous() {
        let credentials = credentials("auth-missing", "KATALOG_TEST_TOKEN_MISSING", None);
        assert!(credentials.token().is_none());
    }
}
