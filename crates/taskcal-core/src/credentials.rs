//! Calendar access token lookup.
//!
//! The token is taken from `TASKCAL_GOOGLE_TOKEN` when set, otherwise from the
//! OS keyring. Obtaining or refreshing tokens is left to external tooling.

use crate::error::CoreError;

/// Environment variable that overrides the stored token.
pub const TOKEN_ENV: &str = "TASKCAL_GOOGLE_TOKEN";

const TOKEN_KEY: &str = "google_access_token";

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    use crate::error::CoreError;

    const SERVICE: &str = "taskcal";

    fn entry(key: &str) -> Result<keyring::Entry, CoreError> {
        keyring::Entry::new(SERVICE, key).map_err(|e| CoreError::Credentials(e.to_string()))
    }

    pub fn get(key: &str) -> Result<Option<String>, CoreError> {
        match entry(key)?.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CoreError::Credentials(e.to_string())),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), CoreError> {
        entry(key)?
            .set_password(value)
            .map_err(|e| CoreError::Credentials(e.to_string()))
    }

    pub fn delete(key: &str) -> Result<(), CoreError> {
        match entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CoreError::Credentials(e.to_string())),
        }
    }
}

/// Pick the token from an environment value or the keyring.
fn resolve(
    env_value: Option<String>,
    stored: impl FnOnce() -> Result<Option<String>, CoreError>,
) -> Result<Option<String>, CoreError> {
    if let Some(token) = env_value.filter(|t| !t.trim().is_empty()) {
        tracing::debug!("using access token from {TOKEN_ENV}");
        return Ok(Some(token));
    }
    stored()
}

/// The configured access token, if any.
pub fn access_token() -> Result<Option<String>, CoreError> {
    resolve(std::env::var(TOKEN_ENV).ok(), || keyring_store::get(TOKEN_KEY))
}

/// Store a token in the keyring.
pub fn store_access_token(token: &str) -> Result<(), CoreError> {
    if token.trim().is_empty() {
        return Err(CoreError::Credentials("token must not be empty".into()));
    }
    keyring_store::set(TOKEN_KEY, token.trim())?;
    tracing::info!("stored access token in keyring");
    Ok(())
}

/// Remove the stored token; a missing entry is not an error.
pub fn clear_access_token() -> Result<(), CoreError> {
    keyring_store::delete(TOKEN_KEY)?;
    tracing::info!("cleared access token from keyring");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_wins_over_keyring() {
        let token = resolve(Some("env-token".into()), || panic!("keyring consulted")).unwrap();
        assert_eq!(token.as_deref(), Some("env-token"));
    }

    #[test]
    fn blank_environment_falls_back_to_keyring() {
        let token = resolve(Some("  ".into()), || Ok(Some("stored".into()))).unwrap();
        assert_eq!(token.as_deref(), Some("stored"));
        assert_eq!(resolve(None, || Ok(None)).unwrap(), None);
    }

    #[test]
    fn keyring_errors_propagate() {
        let err = resolve(None, || Err(CoreError::Credentials("locked".into()))).unwrap_err();
        assert!(err.to_string().contains("locked"));
    }

    #[test]
    fn empty_token_is_not_stored() {
        assert!(store_access_token("   ").is_err());
    }
}
