//! Configuration for shiftgate-core

use serde::Deserialize;

use crate::jwt::JwtConfig;
use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CoreConfig {
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    /// Whether login and the authorization gate check the shift window.
    /// Off by default; flipping it on requires no code change.
    pub shift_enforcement: bool,
}

/// Password hashing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub bcrypt_cost: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self { bcrypt_cost: 12 }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            password: PasswordConfig::default(),
            shift_enforcement: false,
        }
    }
}

impl CoreConfig {
    /// Load configuration from the environment.
    ///
    /// `JWT_SECRET` and `JWT_REFRESH_SECRET` are required; everything else
    /// has defaults. Secret length is enforced by the token issuer at
    /// construction.
    pub fn from_env() -> Result<Self> {
        let access_secret = require_env("JWT_SECRET")?;
        let refresh_secret = require_env("JWT_REFRESH_SECRET")?;

        let defaults = JwtConfig::default();
        Ok(Self {
            jwt: JwtConfig {
                access_secret,
                refresh_secret,
                access_ttl_seconds: parse_env("JWT_EXPIRATION_SECONDS", defaults.access_ttl_seconds)?,
                refresh_ttl_seconds: parse_env(
                    "JWT_REFRESH_EXPIRATION_SECONDS",
                    defaults.refresh_ttl_seconds,
                )?,
            },
            password: PasswordConfig {
                bcrypt_cost: parse_env("BCRYPT_SALT_ROUNDS", PasswordConfig::default().bcrypt_cost)?,
            },
            shift_enforcement: parse_env("SHIFT_ENFORCEMENT", false)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| Error::Config(format!("{key} is not set")))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("{key} has an invalid value"))),
        Err(_) => Ok(default),
    }
}
