//! Core identity types for shiftgate-core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a workforce account. Closed set; the gate's role check and the
/// token claims both use the lowercase wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Operator,
    Supervisor,
    Admin,
    Client,
}

/// Account lifecycle status. Only `Active` accounts may log in, refresh or
/// pass per-request validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

/// User account.
///
/// `password_hash` and `session_token` never leave the process in serialized
/// form. The pair (`device_id`, `session_token`) is the session binding: both
/// are set and cleared together by the store's atomic session operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub status: UserStatus,
    pub device_id: Option<String>,
    #[serde(skip_serializing)]
    pub session_token: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub company_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new user ID
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Soft-deleted rows are dead to every query.
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Request to register a new account.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub company_id: String,
}
