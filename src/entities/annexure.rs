//! Investment annexure records
//!
//! An annexure is the PDF handed to an investor for one property
//! investment. The record keeps the values it was rendered from and the
//! path of the stored file.

use crate::core::entity::timestamp;
use crate::core::validation::{FieldFilter, Payload};
use crate::impl_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annexure {
    pub id: Uuid,
    pub investor_name: String,
    pub investor_id: String,
    pub pan_aadhaar: String,
    pub property_id: String,
    pub property_name: String,
    #[serde(default)]
    pub property_type: String,
    #[serde(default)]
    pub property_address: String,
    #[serde(default)]
    pub city_state: String,
    #[serde(default)]
    pub llp_name: String,
    #[serde(default)]
    pub llpin: String,
    #[serde(default)]
    pub total_valuation: String,
    #[serde(default)]
    pub total_tokens: String,
    #[serde(default)]
    pub investor_tokens: String,
    pub invest_amount: String,
    pub date: String,
    pub pdf_path: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl_entity!(Annexure {
    singular: "annexure",
    plural: "annexures",
    display: "annexure",
});

/// Body of `POST /generate-annexure`. Absent fields deserialize as empty
/// so validation can report all of them at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnexureRequest {
    #[validate(length(min = 1, message = "investorName is required"))]
    pub investor_name: String,
    #[validate(length(min = 1, message = "investorId is required"))]
    pub investor_id: String,
    #[validate(length(min = 1, message = "panAadhaar is required"))]
    pub pan_aadhaar: String,
    #[validate(length(min = 1, message = "propertyId is required"))]
    pub property_id: String,
    #[validate(length(min = 1, message = "propertyName is required"))]
    pub property_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llp_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llpin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_valuation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investor_tokens: Option<String>,
    #[validate(length(min = 1, message = "investAmount is required"))]
    pub invest_amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl AnnexureRequest {
    /// Template data: the request fields in camelCase
    pub fn template_data(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Annexure {
    /// Record for a rendered annexure. `data` is the filled template data,
    /// so defaults applied during rendering (such as `date`) are kept.
    pub fn from_rendered(data: &Value, pdf_path: String) -> Self {
        let field = |key: &str| {
            data.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let now = timestamp::now();
        Self {
            id: Uuid::new_v4(),
            investor_name: field("investorName"),
            investor_id: field("investorId"),
            pan_aadhaar: field("panAadhaar"),
            property_id: field("propertyId"),
            property_name: field("propertyName"),
            property_type: field("propertyType"),
            property_address: field("propertyAddress"),
            city_state: field("cityState"),
            llp_name: field("llpName"),
            llpin: field("llpin"),
            total_valuation: field("totalValuation"),
            total_tokens: field("totalTokens"),
            investor_tokens: field("investorTokens"),
            invest_amount: field("investAmount"),
            date: field("date"),
            pdf_path,
            created_at: now,
            updated_at: now,
        }
    }

    /// `Annexure_<investor name>.pdf` with whitespace runs replaced by `_`
    pub fn download_file_name(&self) -> String {
        let name: Vec<&str> = self.investor_name.split_whitespace().collect();
        format!("Annexure_{}.pdf", name.join("_"))
    }
}

impl Payload for AnnexureRequest {
    const FILTERS: &'static [(&'static str, FieldFilter)] = &[
        ("investorName", FieldFilter::Trim),
        ("investorId", FieldFilter::Trim),
        ("panAadhaar", FieldFilter::Trim),
        ("panAadhaar", FieldFilter::Uppercase),
        ("propertyId", FieldFilter::Trim),
        ("propertyName", FieldFilter::Trim),
        ("investAmount", FieldFilter::Trim),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_required_fields_are_reported() {
        let request: AnnexureRequest =
            serde_json::from_value(json!({"investorName": "Asha", "investAmount": "500000"}))
                .unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("investor_id"));
        assert!(fields.contains_key("pan_aadhaar"));
        assert!(fields.contains_key("property_id"));
        assert!(fields.contains_key("property_name"));
        assert!(!fields.contains_key("investor_name"));
    }

    #[test]
    fn test_template_data_omits_absent_optionals() {
        let request = AnnexureRequest {
            investor_name: "Asha".into(),
            llpin: Some("AAA-1234".into()),
            ..AnnexureRequest::default()
        };
        let data = request.template_data();
        assert_eq!(data["investorName"], "Asha");
        assert_eq!(data["llpin"], "AAA-1234");
        assert!(data.get("cityState").is_none());
    }

    #[test]
    fn test_download_file_name() {
        let record = Annexure::from_rendered(
            &json!({"investorName": "Asha  K  Rao", "date": "01/02/2026"}),
            "documents/a.pdf".into(),
        );
        assert_eq!(record.download_file_name(), "Annexure_Asha_K_Rao.pdf");
        assert_eq!(record.date, "01/02/2026");
        assert_eq!(record.llp_name, "");
    }
}
