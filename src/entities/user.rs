//! Investor accounts

use crate::core::entity::timestamp;
use crate::core::field::validate_phone;
use crate::core::validation::{FieldFilter, Payload};
use crate::impl_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub minimum_investment: f64,
    #[serde(default)]
    pub role: Role,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl_entity!(User {
    singular: "user",
    plural: "users",
    display: "user",
    unique: ["email"],
});

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone_number: String,
    #[validate(range(min = 0.0, message = "Minimum investment cannot be negative"))]
    pub minimum_investment: f64,
    #[serde(default)]
    pub role: Role,
}

impl User {
    pub fn from_payload(payload: NewUser) -> Self {
        let now = timestamp::now();
        Self {
            id: Uuid::new_v4(),
            name: payload.name,
            email: payload.email.trim().to_lowercase(),
            phone_number: payload.phone_number,
            minimum_investment: payload.minimum_investment,
            role: payload.role,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone_number: Option<String>,
    #[validate(range(min = 0.0, message = "Minimum investment cannot be negative"))]
    pub minimum_investment: Option<f64>,
    pub role: Option<Role>,
}

impl UserPatch {
    pub fn into_changes(self) -> Map<String, Value> {
        let mut changes = Map::new();
        if let Some(v) = self.name {
            changes.insert("name".into(), Value::String(v));
        }
        if let Some(v) = self.email {
            changes.insert("email".into(), Value::String(v.trim().to_lowercase()));
        }
        if let Some(v) = self.phone_number {
            changes.insert("phoneNumber".into(), Value::String(v));
        }
        if let Some(v) = self.minimum_investment {
            changes.insert("minimumInvestment".into(), Value::from(v));
        }
        if let Some(v) = self.role {
            changes.insert("role".into(), serde_json::to_value(v).unwrap_or(Value::Null));
        }
        changes
    }
}

const USER_FILTERS: &[(&str, FieldFilter)] = &[
    ("name", FieldFilter::Trim),
    ("email", FieldFilter::Trim),
    ("email", FieldFilter::Lowercase),
    ("phoneNumber", FieldFilter::Trim),
];

impl Payload for NewUser {
    const FILTERS: &'static [(&'static str, FieldFilter)] = USER_FILTERS;
}

impl Payload for UserPatch {
    const FILTERS: &'static [(&'static str, FieldFilter)] = USER_FILTERS;
}
