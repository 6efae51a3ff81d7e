//! Team members shown on the public site

use crate::core::entity::timestamp;
use crate::core::field::validate_phone;
use crate::core::filter::{ParamRule, ParamSpec};
use crate::core::validation::{FieldFilter, Payload};
use crate::impl_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

/// Image used when a member has none of their own
pub const DEFAULT_AVATAR: &str = "default-avatar.jpg";

fn default_avatar() -> String {
    DEFAULT_AVATAR.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    #[serde(default = "default_avatar")]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub social_links: SocialLinks,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(with = "timestamp")]
    pub join_date: DateTime<Utc>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl_entity!(TeamMember {
    singular: "team_member",
    plural: "team-members",
    display: "team member",
    text_index: ["name", "email", "position", "department"],
    unique: ["email"],
    active_flag: "isActive",
});

pub const TEAM_MEMBER_FILTERS: &[ParamSpec] = &[
    ParamSpec::new("search", ParamRule::FullText),
    ParamSpec::new("department", ParamRule::Equals("department")),
    ParamSpec::new("position", ParamRule::Equals("position")),
];

/// Skills arrive either as a list or as `"a, b, c"`
fn skills_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Skills {
        List(Vec<String>),
        Csv(String),
    }

    let raw: Option<Skills> = Option::deserialize(deserializer)?;
    let items = match raw {
        None => return Ok(None),
        Some(Skills::List(list)) => list,
        Some(Skills::Csv(csv)) => csv.split(',').map(str::to_string).collect(),
    };
    Ok(Some(
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    ))
}

/// Payload for creating a member
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTeamMember {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Position is required"))]
    pub position: String,
    pub image: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub social_links: SocialLinks,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "skills_list")]
    pub skills: Option<Vec<String>>,
    pub department: Option<String>,
}

impl TeamMember {
    pub fn from_payload(payload: NewTeamMember) -> Self {
        let now = timestamp::now();
        Self {
            id: Uuid::new_v4(),
            name: payload.name,
            email: payload.email.trim().to_lowercase(),
            phone: payload.phone,
            position: payload.position,
            image: payload
                .image
                .filter(|img| !img.is_empty())
                .unwrap_or_else(default_avatar),
            description: payload.description,
            social_links: payload.social_links,
            is_active: payload.is_active.unwrap_or(true),
            join_date: now,
            skills: payload.skills.unwrap_or_default(),
            department: payload.department.filter(|d| !d.trim().is_empty()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Image file owned by this member, if not the shared default
    pub fn owned_image(&self) -> Option<&str> {
        owned_image(&self.image)
    }
}

fn owned_image(image: &str) -> Option<&str> {
    let trimmed = image.trim();
    (!trimmed.is_empty() && !trimmed.ends_with(DEFAULT_AVATAR)).then_some(trimmed)
}

/// Partial update payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberPatch {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(length(min = 1))]
    pub position: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub social_links: Option<SocialLinks>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "skills_list")]
    pub skills: Option<Vec<String>>,
    pub department: Option<String>,
}

impl TeamMemberPatch {
    /// Normalized email, if the patch changes it
    pub fn email(&self) -> Option<String> {
        self.email.as_ref().map(|e| e.trim().to_lowercase())
    }

    /// Old image to remove once the update lands, if the image is replaced
    pub fn replaced_image(&self, current: &TeamMember) -> Option<String> {
        let new_image = self.image.as_deref()?;
        if new_image == current.image {
            return None;
        }
        current.owned_image().map(str::to_string)
    }

    pub fn into_changes(self) -> Map<String, Value> {
        let mut changes = Map::new();
        if let Some(email) = self.email() {
            changes.insert("email".into(), Value::String(email));
        }
        if let Some(v) = self.name {
            changes.insert("name".into(), Value::String(v));
        }
        if let Some(v) = self.phone {
            changes.insert("phone".into(), Value::String(v));
        }
        if let Some(v) = self.position {
            changes.insert("position".into(), Value::String(v));
        }
        if let Some(v) = self.image {
            changes.insert("image".into(), Value::String(v));
        }
        if let Some(v) = self.description {
            changes.insert("description".into(), Value::String(v));
        }
        if let Some(v) = self.social_links {
            changes.insert(
                "socialLinks".into(),
                serde_json::to_value(v).unwrap_or(Value::Null),
            );
        }
        if let Some(v) = self.is_active {
            changes.insert("isActive".into(), Value::Bool(v));
        }
        if let Some(v) = self.skills {
            changes.insert("skills".into(), Value::from(v));
        }
        if let Some(v) = self.department {
            let value = if v.trim().is_empty() { Value::Null } else { Value::String(v) };
            changes.insert("department".into(), value);
        }
        changes
    }
}

const MEMBER_FILTERS: &[(&str, FieldFilter)] = &[
    ("name", FieldFilter::Trim),
    ("email", FieldFilter::Trim),
    ("email", FieldFilter::Lowercase),
    ("phone", FieldFilter::Trim),
    ("position", FieldFilter::Trim),
    ("department", FieldFilter::Trim),
];

impl Payload for NewTeamMember {
    const FILTERS: &'static [(&'static str, FieldFilter)] = MEMBER_FILTERS;
}

impl Payload for TeamMemberPatch {
    const FILTERS: &'static [(&'static str, FieldFilter)] = MEMBER_FILTERS;
}
