//! JWT token issuance and verification
//!
//! Access and refresh tokens are signed with distinct HS256 secrets so that
//! possession of one never allows forging the other. The issuer only proves
//! signature, shape and expiry; device binding and fingerprint rotation are
//! layered on top by the session manager.

use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::{Error, Result, User, UserRole};

/// Minimum secret length accepted at construction time. Anything shorter is
/// rejected outright rather than discovered compromised later.
pub const MIN_SECRET_BYTES: usize = 32;

/// Which of the two token families to verify against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Signed token claims.
///
/// `device_id` is omitted from the wire form entirely when the session has no
/// device binding; a token issued without a device must not carry a stale
/// device claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub company_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// An access/refresh pair minted together for one identity.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_seconds: u64,
    pub refresh_ttl_seconds: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: String::new(),
            refresh_secret: String::new(),
            access_ttl_seconds: 900,        // 15 minutes
            refresh_ttl_seconds: 604_800,   // 7 days
        }
    }
}

/// Token issuer holding both signing key pairs.
pub struct TokenIssuer {
    config: JwtConfig,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    header: Header,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(config: JwtConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::check_secret("access", &config.access_secret)?;
        Self::check_secret("refresh", &config.refresh_secret)?;

        Ok(Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            header: Header::new(Algorithm::HS256),
            config,
            clock,
        })
    }

    fn check_secret(which: &str, secret: &str) -> Result<()> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(Error::Config(format!(
                "{} secret must be at least {} bytes",
                which, MIN_SECRET_BYTES
            )));
        }
        Ok(())
    }

    /// Mint an access/refresh pair for `user`.
    ///
    /// Both tokens carry the same payload; only secret and expiry differ.
    /// An explicit `device_id` wins over the user's stored binding; empty
    /// strings count as absent.
    pub fn issue(&self, user: &User, device_id: Option<&str>) -> Result<TokenPair> {
        let device = device_id
            .filter(|d| !d.is_empty())
            .map(str::to_owned)
            .or_else(|| user.device_id.clone());

        let now = self.clock.now().timestamp();

        let access = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            company_id: user.company_id.clone(),
            device_id: device.clone(),
            iat: now,
            exp: now + self.config.access_ttl_seconds as i64,
        };
        let refresh = Claims {
            exp: now + self.config.refresh_ttl_seconds as i64,
            ..access.clone()
        };

        Ok(TokenPair {
            access_token: encode(&self.header, &access, &self.access_encoding)?,
            refresh_token: encode(&self.header, &refresh, &self.refresh_encoding)?,
        })
    }

    /// Verify signature, structure and expiry of a token.
    ///
    /// Fails with `Error::InvalidToken` on any of the three; device binding
    /// and session-fingerprint checks are not performed here.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims> {
        let key = match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        };
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, key, &validation)?;
        Ok(data.claims)
    }

    pub fn access_ttl_seconds(&self) -> u64 {
        self.config.access_ttl_seconds
    }
}
