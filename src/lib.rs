//! # Shiftgate-Core
//!
//! Authentication and session-authorization core for multi-tenant workforce
//! applications.
//!
//! This crate provides:
//! - Registration and password login with bcrypt hashing
//! - JWT token pairs (HS256, distinct access/refresh secrets) with one-shot
//!   refresh rotation
//! - A single-active-device policy: logging in from a new device evicts the
//!   previous session atomically
//! - Shift-window authorization: recurring weekly windows and one-off
//!   exception windows, evaluated as a pure function of the injected clock
//! - A per-request authorization gate combining token verification, session
//!   freshness, shift window and role checks
//!
//! ## Architecture
//!
//! HTTP routing, request validation, rate limiting and durable storage
//! belong to the serving layer. This core consumes the [`store::UserStore`]
//! and [`store::ShiftStore`] seams (in-memory reference implementations are
//! included) and an injected [`clock::Clock`].

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod jwt;
pub mod shift;
pub mod store;
pub mod types;

pub use auth::{AuthenticationResult, AuthenticationService};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CoreConfig, PasswordConfig};
pub use error::{Error, Result};
pub use gate::{AuthContext, AuthorizationGate};
pub use jwt::{Claims, JwtConfig, TokenIssuer, TokenKind, TokenPair};
pub use shift::{Shift, ShiftKind, ShiftService, ShiftStatus};
pub use store::{MemoryShiftStore, MemoryUserStore, ShiftStore, UserStore};
pub use types::{RegisterRequest, User, UserRole, UserStatus};

use std::sync::Arc;

/// The wired-up core: session manager, shift administration and the
/// per-request gate, sharing one configuration and clock.
pub struct Core {
    pub auth: Arc<AuthenticationService>,
    pub shifts: Arc<ShiftService>,
    pub gate: AuthorizationGate,
}

/// Initialize the core against caller-provided stores and clock.
///
/// Fails fast (`Error::Config`) when either JWT secret is missing or below
/// the minimum safety length.
pub fn init(
    config: CoreConfig,
    users: Arc<dyn UserStore>,
    shifts: Arc<dyn ShiftStore>,
    clock: Arc<dyn Clock>,
) -> Result<Core> {
    let issuer = TokenIssuer::new(config.jwt, clock.clone())?;

    let auth = Arc::new(AuthenticationService::new(
        users,
        shifts.clone(),
        issuer,
        config.password,
        clock.clone(),
        config.shift_enforcement,
    ));

    let shift_service = Arc::new(ShiftService::new(shifts.clone(), clock.clone()));

    let gate = AuthorizationGate::new(auth.clone(), shifts, clock, config.shift_enforcement);

    Ok(Core {
        auth,
        shifts: shift_service,
        gate,
    })
}
