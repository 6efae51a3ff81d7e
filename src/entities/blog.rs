use crate::core::entity::timestamp;
use crate::core::validation::{FieldFilter, Payload};
use crate::impl_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image: String,
    pub created_by: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl_entity!(Blog {
    singular: "blog",
    plural: "blogs",
    display: "blog",
    text_index: ["name", "description"],
});

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewBlog {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "Image is required"))]
    pub image: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub created_by: String,
}

impl Blog {
    pub fn from_payload(payload: NewBlog) -> Self {
        let now = timestamp::now();
        Self {
            id: Uuid::new_v4(),
            name: payload.name,
            description: payload.description,
            image: payload.image,
            created_by: payload.created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlogPatch {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub image: Option<String>,
    #[validate(length(min = 1))]
    pub created_by: Option<String>,
}

impl BlogPatch {
    pub fn into_changes(self) -> Map<String, Value> {
        [
            ("name", self.name),
            ("description", self.description),
            ("image", self.image),
            ("createdBy", self.created_by),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), Value::String(v))))
        .collect()
    }
}

impl Payload for NewBlog {
    const FILTERS: &'static [(&'static str, FieldFilter)] = &[("name", FieldFilter::Trim)];
}

impl Payload for BlogPatch {
    const FILTERS: &'static [(&'static str, FieldFilter)] = &[("name", FieldFilter::Trim)];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_only_sets_present_fields() {
        let changes = BlogPatch {
            name: Some("Market update".into()),
            ..BlogPatch::default()
        }
        .into_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["name"], "Market update");
    }

    #[test]
    fn test_name_limit() {
        let blog = NewBlog {
            name: "n".repeat(101),
            description: "d".into(),
            image: "uploads/b.jpg".into(),
            created_by: "admin".into(),
        };
        assert!(blog.validate().is_err());
    }
}
