//! Reader accounts, used to scope persistent-store reads

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reader role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Regular,
}

impl Role {
    /// Numeric form used by the persistent store
    pub fn as_i64(self) -> i64 {
        match self {
            Role::Admin => 0,
            Role::Regular => 1,
        }
    }

    /// Parse the persistent store's numeric form, unknown values are regular
    pub fn from_i64(value: i64) -> Self {
        match value {
            0 => Role::Admin,
            _ => Role::Regular,
        }
    }
}

/// A reader whose library is tracked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(default)]
    pub uuid: Option<Uuid>,

    pub firstname: String,

    pub lastname: String,

    #[serde(default = "default_role")]
    pub role: Role,

    #[serde(default)]
    pub created: Option<NaiveDateTime>,

    #[serde(default)]
    pub updated: Option<NaiveDateTime>,
}

fn default_role() -> Role {
    Role::Regular
}

impl User {
    pub fn new(firstname: impl Into<String>, lastname: impl Into<String>) -> Self {
        Self {
            uuid: None,
            firstname: firstname.into(),
            lastname: lastname.into(),
            role: Role::Regular,
            created: None,
            updated: None,
        }
    }

    /// Stable identifier string: the uuid, or `lastname_firstname` until
    /// the store has assigned one
    pub fn identity(&self) -> String {
        match self.uuid {
            Some(uuid) => uuid.to_string(),
            None => format!("{}_{}", self.lastname, self.firstname),
        }
    }
}
