//! Identity and shift storage seams
//!
//! Durable stores live with the serving layer; this crate defines the
//! contracts it consumes plus in-memory reference implementations used by
//! tests and embedded deployments.
//!
//! Session transitions are deliberately modeled as single store operations
//! rather than a generic partial update: two concurrent logins, or a login
//! racing a refresh, must never leave both the old and new fingerprints
//! valid. `rotate_session` is a compare-and-swap so the last writer wins and
//! a superseded refresh token can never rotate again.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::shift::{Shift, ShiftStatus};
use crate::{Error, Result, User, UserStatus};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a live (non-soft-deleted) user by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Look up a live user by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Persist a new user. Fails with `Error::Conflict` when a live row
    /// already holds the email.
    async fn create(&self, user: User) -> Result<User>;

    /// Replace the session binding in one atomic write: device id, session
    /// fingerprint and last-login together. Passing `device_id: None` keeps
    /// no binding (fingerprint-only session).
    async fn bind_session(
        &self,
        user_id: &str,
        device_id: Option<String>,
        fingerprint: String,
        last_login: DateTime<Utc>,
    ) -> Result<()>;

    /// Compare-and-swap fingerprint rotation: succeeds and installs `next`
    /// only if the stored fingerprint currently equals `current`. Returns
    /// whether the swap happened.
    async fn rotate_session(&self, user_id: &str, current: &str, next: &str) -> Result<bool>;

    /// Clear device id and fingerprint together. Idempotent; unknown ids
    /// are a no-op.
    async fn clear_session(&self, user_id: &str) -> Result<()>;

    /// Administrative status transition (suspend, reactivate).
    async fn set_status(&self, user_id: &str, status: UserStatus) -> Result<()>;

    /// Mark the row deleted; it disappears from every lookup but stays for
    /// audit needs.
    async fn soft_delete(&self, user_id: &str) -> Result<()>;
}

#[async_trait]
pub trait ShiftStore: Send + Sync {
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Shift>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Shift>>;
    async fn insert(&self, shift: Shift) -> Result<Shift>;
    /// Returns the updated record, or `None` if the id is unknown.
    async fn set_status(
        &self,
        id: &str,
        status: ShiftStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Shift>>;
    /// Returns whether a record was removed.
    async fn delete(&self, id: &str) -> Result<bool>;
    async fn all(&self) -> Result<Vec<Shift>>;
}

/// In-memory user store. Every mutation runs under one write lock, which
/// gives the per-identity single-writer semantics the session manager
/// relies on.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read();
        Ok(users
            .values()
            .find(|u| u.is_live() && u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let users = self.users.read();
        Ok(users.get(id).filter(|u| u.is_live()).cloned())
    }

    async fn create(&self, user: User) -> Result<User> {
        let mut users = self.users.write();
        if users.values().any(|u| u.is_live() && u.email == user.email) {
            return Err(Error::Conflict);
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn bind_session(
        &self,
        user_id: &str,
        device_id: Option<String>,
        fingerprint: String,
        last_login: DateTime<Utc>,
    ) -> Result<()> {
        let mut users = self.users.write();
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| Error::Store(format!("no such user: {user_id}")))?;
        user.device_id = device_id;
        user.session_token = Some(fingerprint);
        user.last_login = Some(last_login);
        user.updated_at = last_login;
        Ok(())
    }

    async fn rotate_session(&self, user_id: &str, current: &str, next: &str) -> Result<bool> {
        let mut users = self.users.write();
        let Some(user) = users.get_mut(user_id) else {
            return Ok(false);
        };
        if user.session_token.as_deref() != Some(current) {
            return Ok(false);
        }
        user.session_token = Some(next.to_string());
        Ok(true)
    }

    async fn clear_session(&self, user_id: &str) -> Result<()> {
        let mut users = self.users.write();
        if let Some(user) = users.get_mut(user_id) {
            user.device_id = None;
            user.session_token = None;
        }
        Ok(())
    }

    async fn set_status(&self, user_id: &str, status: UserStatus) -> Result<()> {
        let mut users = self.users.write();
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| Error::Store(format!("no such user: {user_id}")))?;
        user.status = status;
        Ok(())
    }

    async fn soft_delete(&self, user_id: &str) -> Result<()> {
        let mut users = self.users.write();
        if let Some(user) = users.get_mut(user_id) {
            user.deleted_at = Some(Utc::now());
        }
        Ok(())
    }
}

/// In-memory shift store.
#[derive(Default)]
pub struct MemoryShiftStore {
    shifts: RwLock<HashMap<String, Shift>>,
}

impl MemoryShiftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShiftStore for MemoryShiftStore {
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Shift>> {
        let shifts = self.shifts.read();
        Ok(shifts
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Shift>> {
        Ok(self.shifts.read().get(id).cloned())
    }

    async fn insert(&self, shift: Shift) -> Result<Shift> {
        self.shifts.write().insert(shift.id.clone(), shift.clone());
        Ok(shift)
    }

    async fn set_status(
        &self,
        id: &str,
        status: ShiftStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Shift>> {
        let mut shifts = self.shifts.write();
        Ok(shifts.get_mut(id).map(|shift| {
            shift.status = status;
            shift.updated_at = updated_at;
            shift.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.shifts.write().remove(id).is_some())
    }

    async fn all(&self) -> Result<Vec<Shift>> {
        Ok(self.shifts.read().values().cloned().collect())
    }
}
