//! Authentication service: the per-identity session state machine
//!
//! States: NoSession → Bound(device, fingerprint) → NoSession. `login`
//! establishes the binding, `refresh` rotates the fingerprint, `logout` and
//! device conflicts tear it down. Exactly one refresh token is valid per
//! identity at any time.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::PasswordConfig;
use crate::jwt::{Claims, TokenIssuer, TokenKind, TokenPair};
use crate::shift::eval;
use crate::store::{ShiftStore, UserStore};
use crate::{Error, RegisterRequest, Result, User, UserStatus};

/// Result of a successful registration or login.
#[derive(Debug)]
pub struct AuthenticationResult {
    pub user: User,
    pub tokens: TokenPair,
    pub expires_in: Duration,
}

/// Authentication service
pub struct AuthenticationService {
    users: Arc<dyn UserStore>,
    shifts: Arc<dyn ShiftStore>,
    issuer: TokenIssuer,
    password: PasswordConfig,
    clock: Arc<dyn Clock>,
    shift_enforcement: bool,
}

impl AuthenticationService {
    pub fn new(
        users: Arc<dyn UserStore>,
        shifts: Arc<dyn ShiftStore>,
        issuer: TokenIssuer,
        password: PasswordConfig,
        clock: Arc<dyn Clock>,
        shift_enforcement: bool,
    ) -> Self {
        Self {
            users,
            shifts,
            issuer,
            password,
            clock,
            shift_enforcement,
        }
    }

    /// Create an account and mint a first token pair.
    ///
    /// Registration does not bind a session: the device/fingerprint binding
    /// is only established by `login`, so the pair returned here serves the
    /// client until its access token expires.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthenticationResult> {
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(Error::Conflict);
        }

        let password_hash = bcrypt::hash(&request.password, self.password.bcrypt_cost)
            .map_err(|e| Error::Internal(format!("password hashing failed: {e}")))?;

        let now = self.clock.now();
        let user = User {
            id: User::new_id(),
            email: request.email,
            password_hash,
            full_name: request.full_name,
            role: request.role,
            phone: request.phone,
            status: UserStatus::Active,
            device_id: None,
            session_token: None,
            last_login: None,
            company_id: request.company_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let user = self.users.create(user).await?;
        let tokens = self.issuer.issue(&user, None)?;
        info!(user_id = %user.id, role = ?user.role, "registered user");

        Ok(self.result(user, tokens))
    }

    /// Authenticate with email + password, optionally binding a device.
    ///
    /// Unknown email, wrong password and non-active account all collapse
    /// into the same `Unauthorized` so callers cannot enumerate accounts.
    /// Supplying a device id different from the bound one evicts the prior
    /// session: binding, fingerprint and last-login are replaced in one
    /// atomic store write, so the other device's refresh token dies with it.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        device_id: Option<&str>,
    ) -> Result<AuthenticationResult> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Err(Error::Unauthorized);
        };

        let password_ok = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| Error::Internal(format!("password verification failed: {e}")))?;
        if !password_ok {
            return Err(Error::Unauthorized);
        }

        if user.status != UserStatus::Active {
            return Err(Error::Unauthorized);
        }

        if self.shift_enforcement {
            let records = self.shifts.find_by_user(&user.id).await?;
            if !eval::is_authorized_now(&records, self.clock.now()) {
                return Err(Error::Forbidden(
                    "cannot log in outside the assigned shift window".to_string(),
                ));
            }
        }

        let supplied = device_id.filter(|d| !d.is_empty());
        if let (Some(new), Some(old)) = (supplied, user.device_id.as_deref()) {
            if new != old {
                warn!(user_id = %user.id, "login from a new device, evicting prior session");
            }
        }

        // No device supplied keeps the existing binding, which also flows
        // into the new token claims.
        let device = supplied
            .map(str::to_owned)
            .or_else(|| user.device_id.clone());

        let tokens = self.issuer.issue(&user, device.as_deref())?;
        let now = self.clock.now();
        self.users
            .bind_session(&user.id, device.clone(), tokens.refresh_token.clone(), now)
            .await?;
        info!(user_id = %user.id, device_bound = device.is_some(), "login");

        let mut user = user;
        user.device_id = device;
        user.session_token = Some(tokens.refresh_token.clone());
        user.last_login = Some(now);

        Ok(self.result(user, tokens))
    }

    /// Rotate a refresh token into a fresh pair.
    ///
    /// The stored fingerprint must equal the presented token; the swap to
    /// the new fingerprint is a store-level compare-and-swap, so a token
    /// superseded by a later `refresh` or `login` can never rotate again,
    /// even under concurrent requests.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self
            .issuer
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(Error::into_unauthorized)?;

        let Some(user) = self.users.find_by_id(&claims.sub).await? else {
            return Err(Error::Unauthorized);
        };
        if user.status != UserStatus::Active {
            return Err(Error::Unauthorized);
        }

        let tokens = self.issuer.issue(&user, user.device_id.as_deref())?;
        let rotated = self
            .users
            .rotate_session(&user.id, refresh_token, &tokens.refresh_token)
            .await?;
        if !rotated {
            // Superseded or stolen token; the stored fingerprint no longer
            // matches.
            warn!(user_id = %user.id, "refresh token reuse detected");
            return Err(Error::Unauthorized);
        }

        debug!(user_id = %user.id, "rotated refresh token");
        Ok(tokens)
    }

    /// Tear down the session binding. Idempotent.
    pub async fn logout(&self, user_id: &str) -> Result<()> {
        self.users.clear_session(user_id).await?;
        info!(user_id, "logout");
        Ok(())
    }

    /// Authoritative per-request freshness check, beyond token signature
    /// validity: catches bindings revoked after issuance, e.g. a concurrent
    /// login from another device.
    pub async fn validate(&self, user_id: &str, device_id: Option<&str>) -> Result<User> {
        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Err(Error::Unauthorized);
        };
        if user.status != UserStatus::Active {
            return Err(Error::Unauthorized);
        }

        if let (Some(supplied), Some(bound)) = (
            device_id.filter(|d| !d.is_empty()),
            user.device_id.as_deref(),
        ) {
            if supplied != bound {
                return Err(Error::Unauthorized);
            }
        }

        Ok(user)
    }

    /// Verify an access token, surfacing issuer failures as `Unauthorized`.
    pub fn verify_access(&self, token: &str) -> Result<Claims> {
        self.issuer
            .verify(token, TokenKind::Access)
            .map_err(Error::into_unauthorized)
    }

    fn result(&self, user: User, tokens: TokenPair) -> AuthenticationResult {
        AuthenticationResult {
            user,
            tokens,
            expires_in: Duration::from_secs(self.issuer.access_ttl_seconds()),
        }
    }
}
