//! Shift records and administration
//!
//! A shift is either a recurring weekly window (weekday set plus wall-clock
//! start/end) or a one-off exception window with absolute bounds, used for
//! supervisory overrides. Window evaluation lives in [`eval`].

pub mod eval;

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::Clock;
use crate::store::ShiftStore;
use crate::{Error, Result, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftKind {
    Recurring,
    Exception,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Active,
    Inactive,
    Expired,
}

/// One shift record belonging to a single user.
///
/// Recurring records use `start_time`/`end_time`/`days_of_week`
/// (0 = Sunday .. 6 = Saturday); exception records use
/// `exception_start`/`exception_end`. Fields of the other kind stay `None`.
/// A record missing required fields for its own kind never matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: String,
    pub user_id: String,
    pub kind: ShiftKind,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub days_of_week: Option<Vec<u8>>,
    pub exception_start: Option<DateTime<Utc>>,
    pub exception_end: Option<DateTime<Utc>>,
    pub status: ShiftStatus,
    /// Weak reference to the approving supervisor/admin: id only.
    pub approved_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shift administration service: creation, status transitions and lookups.
///
/// Status mutation is the preferred lifecycle (records referenced by audits
/// stay queryable); physical deletion is an administrative escape hatch.
pub struct ShiftService {
    store: Arc<dyn ShiftStore>,
    clock: Arc<dyn Clock>,
}

impl ShiftService {
    pub fn new(store: Arc<dyn ShiftStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Is the user inside an authorized window right now?
    ///
    /// A user with no shift records at all is always authorized
    /// (default-open for users not yet scheduled).
    pub async fn is_user_in_active_shift(&self, user_id: &str) -> Result<bool> {
        let shifts = self.store.find_by_user(user_id).await?;
        Ok(eval::is_authorized_now(&shifts, self.clock.now()))
    }

    pub async fn create_recurring(
        &self,
        user_id: &str,
        start_time: NaiveTime,
        end_time: NaiveTime,
        days_of_week: Vec<u8>,
        approved_by: Option<String>,
        notes: Option<String>,
    ) -> Result<Shift> {
        let now = self.clock.now();
        let shift = Shift {
            id: User::new_id(),
            user_id: user_id.to_string(),
            kind: ShiftKind::Recurring,
            start_time: Some(start_time),
            end_time: Some(end_time),
            days_of_week: Some(days_of_week),
            exception_start: None,
            exception_end: None,
            status: ShiftStatus::Active,
            approved_by,
            notes,
            created_at: now,
            updated_at: now,
        };
        let shift = self.store.insert(shift).await?;
        info!(shift_id = %shift.id, user_id, "created recurring shift");
        Ok(shift)
    }

    pub async fn create_exception(
        &self,
        user_id: &str,
        exception_start: DateTime<Utc>,
        exception_end: DateTime<Utc>,
        approved_by: String,
        notes: Option<String>,
    ) -> Result<Shift> {
        let now = self.clock.now();
        let shift = Shift {
            id: User::new_id(),
            user_id: user_id.to_string(),
            kind: ShiftKind::Exception,
            start_time: None,
            end_time: None,
            days_of_week: None,
            exception_start: Some(exception_start),
            exception_end: Some(exception_end),
            status: ShiftStatus::Active,
            approved_by: Some(approved_by),
            notes,
            created_at: now,
            updated_at: now,
        };
        let shift = self.store.insert(shift).await?;
        info!(shift_id = %shift.id, user_id, "created exception shift");
        Ok(shift)
    }

    /// All of a user's shifts, newest first.
    pub async fn user_shifts(&self, user_id: &str) -> Result<Vec<Shift>> {
        let mut shifts = self.store.find_by_user(user_id).await?;
        shifts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(shifts)
    }

    pub async fn update_status(&self, shift_id: &str, status: ShiftStatus) -> Result<Shift> {
        let shift = self
            .store
            .set_status(shift_id, status, self.clock.now())
            .await?
            .ok_or_else(|| Error::NotFound(shift_id.to_string()))?;
        info!(shift_id, ?status, "updated shift status");
        Ok(shift)
    }

    pub async fn get(&self, shift_id: &str) -> Result<Shift> {
        self.store
            .find_by_id(shift_id)
            .await?
            .ok_or_else(|| Error::NotFound(shift_id.to_string()))
    }

    /// Physically remove a record. Idempotent: deleting an absent id is not
    /// an error.
    pub async fn delete(&self, shift_id: &str) -> Result<()> {
        if self.store.delete(shift_id).await? {
            info!(shift_id, "deleted shift");
        }
        Ok(())
    }

    pub async fn all_shifts(&self) -> Result<Vec<Shift>> {
        let mut shifts = self.store.all().await?;
        shifts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(shifts)
    }
}
