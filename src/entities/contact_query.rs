//! Contact enquiries submitted from the public site

use crate::core::entity::timestamp;
use crate::core::filter::{ParamRule, ParamSpec};
use crate::core::validation::{FieldFilter, Payload};
use crate::impl_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    #[default]
    New,
    InProgress,
    Resolved,
    Spam,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::New => "new",
            QueryStatus::InProgress => "in_progress",
            QueryStatus::Resolved => "resolved",
            QueryStatus::Spam => "spam",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub message: String,
    #[serde(with = "timestamp")]
    pub responded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactQuery {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub status: QueryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<QueryResponse>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl_entity!(ContactQuery {
    singular: "query",
    plural: "queries",
    display: "query",
    text_index: ["name", "email", "subject", "message"],
});

pub const QUERY_FILTERS: &[ParamSpec] = &[
    ParamSpec::new("search", ParamRule::FullText),
    ParamSpec::new("status", ParamRule::Equals("status")),
];

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewContactQuery {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

impl ContactQuery {
    pub fn from_payload(payload: NewContactQuery) -> Self {
        let now = timestamp::now();
        Self {
            id: Uuid::new_v4(),
            name: payload.name,
            email: payload.email.trim().to_lowercase(),
            phone: payload.phone.filter(|p| !p.trim().is_empty()),
            subject: payload.subject,
            message: payload.message,
            status: QueryStatus::New,
            response: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of `PUT /queries/{id}/status`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StatusUpdate {
    pub status: QueryStatus,
}

impl StatusUpdate {
    pub fn into_changes(self) -> Map<String, Value> {
        let mut changes = Map::new();
        changes.insert("status".into(), Value::from(self.status.as_str()));
        changes
    }
}

/// Body of `POST /queries/{id}/respond`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    #[validate(length(min = 1, message = "Response message is required"))]
    pub message: String,
    pub responded_by: Option<String>,
}

impl RespondRequest {
    /// Records the response and resolves the query
    pub fn into_changes(self) -> Map<String, Value> {
        let mut response = json!({
            "message": self.message,
            "respondedAt": timestamp::now_string(),
        });
        if let Some(by) = self.responded_by {
            response["respondedBy"] = Value::String(by);
        }

        let mut changes = Map::new();
        changes.insert("response".into(), response);
        changes.insert("status".into(), Value::from(QueryStatus::Resolved.as_str()));
        changes
    }
}

impl Payload for NewContactQuery {
    const FILTERS: &'static [(&'static str, FieldFilter)] = &[
        ("name", FieldFilter::Trim),
        ("email", FieldFilter::Trim),
        ("email", FieldFilter::Lowercase),
        ("subject", FieldFilter::Trim),
        ("message", FieldFilter::Trim),
    ];
}

impl Payload for StatusUpdate {}

impl Payload for RespondRequest {
    const FILTERS: &'static [(&'static str, FieldFilter)] = &[("message", FieldFilter::Trim)];
}
