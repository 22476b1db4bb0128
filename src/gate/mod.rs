//! Per-request authorization gate
//!
//! An explicit short-circuit pipeline composed at wiring time, replacing the
//! original metadata-reflection guards: token verification, session
//! validation, optional shift-window check, optional role check. The gate is
//! read-only; it mutates nothing.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::auth::AuthenticationService;
use crate::clock::Clock;
use crate::shift::eval;
use crate::store::ShiftStore;
use crate::{Error, Result, User, UserRole};

/// Normalized identity context handed to request handlers on allow.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub company_id: String,
    pub device_id: Option<String>,
}

impl AuthContext {
    fn from_user(user: &User) -> Self {
        Self {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            company_id: user.company_id.clone(),
            device_id: user.device_id.clone(),
        }
    }
}

pub struct AuthorizationGate {
    auth: Arc<AuthenticationService>,
    shifts: Arc<dyn ShiftStore>,
    clock: Arc<dyn Clock>,
    shift_enforcement: bool,
}

impl AuthorizationGate {
    pub fn new(
        auth: Arc<AuthenticationService>,
        shifts: Arc<dyn ShiftStore>,
        clock: Arc<dyn Clock>,
        shift_enforcement: bool,
    ) -> Self {
        Self {
            auth,
            shifts,
            clock,
            shift_enforcement,
        }
    }

    /// Run the full pipeline for one request.
    ///
    /// `required_roles` empty means no role restriction. Token and session
    /// failures are `Unauthorized`; shift-window and role failures are
    /// `Forbidden`.
    pub async fn authorize(
        &self,
        access_token: &str,
        required_roles: &[UserRole],
    ) -> Result<AuthContext> {
        // 1. Signature, shape, expiry.
        let claims = self.auth.verify_access(access_token)?;

        // 2. Authoritative freshness: account status + device binding.
        let user = self
            .auth
            .validate(&claims.sub, claims.device_id.as_deref())
            .await?;

        // 3. Shift window, when enforcement is switched on.
        if self.shift_enforcement {
            let records = self.shifts.find_by_user(&user.id).await?;
            if !eval::is_authorized_now(&records, self.clock.now()) {
                debug!(user_id = %user.id, "request outside authorized shift window");
                return Err(Error::Forbidden(
                    "shift has ended; actions outside the assigned window are not allowed"
                        .to_string(),
                ));
            }
        }

        // 4. Role membership.
        if !required_roles.is_empty() && !required_roles.contains(&user.role) {
            return Err(Error::Forbidden("insufficient role".to_string()));
        }

        Ok(AuthContext::from_user(&user))
    }
}
