use crate::utils::error::{RelocatorError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_required_field, Validate};
use std::fmt;
use std::path::{Path, PathBuf};

pub const USERNAME_VAR: &str = "SF_USERNAME";
pub const PASSWORD_VAR: &str = "SF_PASSWORD";
pub const SECURITY_TOKEN_VAR: &str = "SF_SECURITY_TOKEN";

/// Username/password login material for the SOAP `login` call.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Appended to the password; empty when the org trusts the caller's IP.
    pub security_token: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str, security_token: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            security_token: security_token.to_string(),
        }
    }

    /// Reads the `SF_*` variables from the process environment. Call
    /// [`load_dotenv`] first for `.env` support.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup(USERNAME_VAR);
        let password = lookup(PASSWORD_VAR);

        let credentials = Self {
            username: validate_required_field(USERNAME_VAR, &username)?.clone(),
            password: validate_required_field(PASSWORD_VAR, &password)?.clone(),
            security_token: lookup(SECURITY_TOKEN_VAR).unwrap_or_default(),
        };
        credentials.validate()?;
        Ok(credentials)
    }
}

/// Loads `.env` from the working directory (or a parent) into the process
/// environment. Variables already set are kept. Returns the file used, or
/// `None` when there is no `.env`.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(dotenv_error(e)),
    }
}

pub fn load_dotenv_from<P: AsRef<Path>>(path: P) -> Result<()> {
    dotenvy::from_path(path.as_ref()).map_err(dotenv_error)
}

fn dotenv_error(e: dotenvy::Error) -> RelocatorError {
    RelocatorError::ConfigError {
        message: format!("Failed to load .env file: {}", e),
    }
}

impl Validate for Credentials {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string(USERNAME_VAR, &self.username)?;
        validate_non_empty_string(PASSWORD_VAR, &self.password)?;
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field(
                "security_token",
                &if self.security_token.is_empty() { "" } else { "***" },
            )
            .finish()
    }
}
