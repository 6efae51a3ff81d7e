//! Property listings

use crate::core::entity::timestamp;
use crate::core::filter::{ParamRule, ParamSpec};
use crate::core::query::SortOrder;
use crate::core::validation::{FieldFilter, Payload};
use crate::impl_entity;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Kind of property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PropertyType {
    #[default]
    Residential,
    Commercial,
    Industrial,
    Land,
    Other,
}

impl PropertyType {
    pub const ALL: [PropertyType; 5] = [
        PropertyType::Residential,
        PropertyType::Commercial,
        PropertyType::Industrial,
        PropertyType::Land,
        PropertyType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Residential => "Residential",
            PropertyType::Commercial => "Commercial",
            PropertyType::Industrial => "Industrial",
            PropertyType::Land => "Land",
            PropertyType::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// Market status of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PropertyStatus {
    #[default]
    #[serde(rename = "For Sale")]
    ForSale,
    #[serde(rename = "For Rent")]
    ForRent,
    Sold,
    Rented,
}

impl PropertyStatus {
    pub const ALL: [PropertyStatus; 4] = [
        PropertyStatus::ForSale,
        PropertyStatus::ForRent,
        PropertyStatus::Sold,
        PropertyStatus::Rented,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::ForSale => "For Sale",
            PropertyStatus::ForRent => "For Rent",
            PropertyStatus::Sold => "Sold",
            PropertyStatus::Rented => "Rented",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSuffix {
    #[default]
    Month,
    Week,
    Day,
    Sqft,
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaUnit {
    #[default]
    Sqft,
    Sqm,
    Marla,
    Kanal,
    Acre,
    Hectare,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Area {
    #[validate(range(min = 0.0, message = "Area cannot be negative"))]
    pub value: f64,
    #[serde(default)]
    pub unit: AreaUnit,
}

fn default_country() -> String {
    "India".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[validate(length(min = 1, message = "Street is required"))]
    pub street: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "Postal code is required"))]
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Feature {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PropertyImage {
    #[validate(length(min = 1, message = "Image url is required"))]
    pub url: String,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FloorPlan {
    #[validate(length(min = 1, message = "Floor plan name is required"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A property listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub property_type: PropertyType,
    pub status: PropertyStatus,
    pub price: f64,
    #[serde(default)]
    pub price_suffix: PriceSuffix,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<Area>,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    #[serde(default)]
    pub garages: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    pub address: Address,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub images: Vec<PropertyImage>,
    #[serde(default)]
    pub floor_plans: Vec<FloorPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_tour: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_tour: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl_entity!(Property {
    singular: "property",
    plural: "properties",
    display: "property",
    text_index: ["title", "description"],
    unique: ["slug"],
    active_flag: "isActive",
    sort: SortOrder::new().descending("isFeatured").descending("createdAt"),
});

/// Listing filters: `search, propertyType, status, minPrice, maxPrice,
/// bedrooms, bathrooms, city, featured`
pub const PROPERTY_FILTERS: &[ParamSpec] = &[
    ParamSpec::new("search", ParamRule::FullText),
    ParamSpec::new("propertyType", ParamRule::Equals("propertyType")),
    ParamSpec::new("status", ParamRule::Equals("status")),
    ParamSpec::new("minPrice", ParamRule::Min("price")),
    ParamSpec::new("maxPrice", ParamRule::Max("price")),
    ParamSpec::new("bedrooms", ParamRule::Min("bedrooms")),
    ParamSpec::new("bathrooms", ParamRule::Min("bathrooms")),
    ParamSpec::new("city", ParamRule::ContainsCi("address.city")),
    ParamSpec::new("featured", ParamRule::Flag("isFeatured")),
];

/// URL slug: lowercase, runs of non-alphanumerics collapsed to `-`
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Titles must yield a non-empty slug
fn validate_title_slug(title: &str) -> Result<(), ValidationError> {
    if slugify(title).is_empty() {
        let mut err = ValidationError::new("title_slug");
        err.message = Some("Title must contain letters or digits".into());
        Err(err)
    } else {
        Ok(())
    }
}

fn validate_year_built(year: i32) -> Result<(), ValidationError> {
    let max = Utc::now().year() + 1;
    if (1000..=max).contains(&year) {
        Ok(())
    } else {
        let mut err = ValidationError::new("year_built");
        err.message = Some(format!("Year must be between 1000 and {}", max).into());
        Err(err)
    }
}

/// Payload for creating a property
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    #[validate(
        length(min = 1, max = 200, message = "Property title is required"),
        custom(function = "validate_title_slug")
    )]
    pub title: String,
    #[validate(length(min = 1, message = "Property description is required"))]
    pub description: String,
    #[serde(default)]
    pub property_type: PropertyType,
    #[serde(default)]
    pub status: PropertyStatus,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    #[serde(default)]
    pub price_suffix: PriceSuffix,
    #[validate(nested)]
    pub area: Option<Area>,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    #[serde(default)]
    pub garages: u32,
    #[validate(custom(function = "validate_year_built"))]
    pub year_built: Option<i32>,
    #[validate(nested)]
    pub address: Option<Address>,
    #[serde(default)]
    #[validate(nested)]
    pub features: Vec<Feature>,
    #[serde(default)]
    #[validate(nested)]
    pub images: Vec<PropertyImage>,
    #[serde(default)]
    #[validate(nested)]
    pub floor_plans: Vec<FloorPlan>,
    #[validate(url)]
    pub video_tour: Option<String>,
    #[validate(url)]
    pub virtual_tour: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    pub is_active: Option<bool>,
    pub created_by: Option<String>,
}

impl Property {
    /// Build a record from a validated payload. `address` must be present.
    pub fn from_payload(payload: NewProperty, address: Address) -> Self {
        let now = timestamp::now();
        let mut property = Self {
            id: Uuid::new_v4(),
            slug: slugify(&payload.title),
            title: payload.title,
            description: payload.description,
            property_type: payload.property_type,
            status: payload.status,
            price: payload.price,
            price_suffix: payload.price_suffix,
            area: payload.area,
            bedrooms: payload.bedrooms,
            bathrooms: payload.bathrooms,
            garages: payload.garages,
            year_built: payload.year_built,
            address,
            features: payload.features,
            images: payload.images,
            floor_plans: payload.floor_plans,
            video_tour: payload.video_tour,
            virtual_tour: payload.virtual_tour,
            is_featured: payload.is_featured,
            is_active: payload.is_active.unwrap_or(true),
            created_by: payload.created_by,
            created_at: now,
            updated_at: now,
        };
        ensure_featured_image(&mut property.images);
        property
    }

    /// Url of the featured image, else the first image, else empty
    pub fn featured_image(&self) -> &str {
        self.images
            .iter()
            .find(|img| img.is_featured)
            .or_else(|| self.images.first())
            .map(|img| img.url.as_str())
            .unwrap_or("")
    }

    /// Stored files referenced by this listing (images and floor plan images)
    pub fn file_paths(&self) -> Vec<String> {
        self.images
            .iter()
            .map(|img| img.url.clone())
            .chain(self.floor_plans.iter().filter_map(|fp| fp.image.clone()))
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// JSON view including the computed `featuredImage`
    pub fn to_view(&self) -> Value {
        let mut json = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(fields) = &mut json {
            fields.insert(
                "featuredImage".to_string(),
                Value::String(self.featured_image().to_string()),
            );
        }
        json
    }
}

/// Flag the first image as featured when none is
pub fn ensure_featured_image(images: &mut [PropertyImage]) {
    if !images.iter().any(|img| img.is_featured)
        && let Some(first) = images.first_mut()
    {
        first.is_featured = true;
    }
}

/// Payload for a partial update.
///
/// `images` are appended to the existing ones; `featuredImageIndex` picks
/// the featured image among the resulting list.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPatch {
    #[validate(length(min = 1, max = 200), custom(function = "validate_title_slug"))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    pub property_type: Option<PropertyType>,
    pub status: Option<PropertyStatus>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,
    pub price_suffix: Option<PriceSuffix>,
    #[validate(nested)]
    pub area: Option<Area>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub garages: Option<u32>,
    #[validate(custom(function = "validate_year_built"))]
    pub year_built: Option<i32>,
    #[validate(nested)]
    pub address: Option<Address>,
    #[validate(nested)]
    pub features: Option<Vec<Feature>>,
    #[validate(nested)]
    pub images: Option<Vec<PropertyImage>>,
    #[validate(nested)]
    pub floor_plans: Option<Vec<FloorPlan>>,
    #[validate(url)]
    pub video_tour: Option<String>,
    #[validate(url)]
    pub virtual_tour: Option<String>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
    pub featured_image_index: Option<usize>,
}

impl PropertyPatch {
    /// Field changes to apply to `current`, as a store patch
    pub fn into_changes(self, current: &Property) -> Map<String, Value> {
        let mut changes = Map::new();
        let mut set = |key: &str, value: Value| {
            changes.insert(key.to_string(), value);
        };

        if let Some(title) = self.title {
            set("slug", Value::String(slugify(&title)));
            set("title", Value::String(title));
        }
        if let Some(v) = self.description {
            set("description", Value::String(v));
        }
        if let Some(v) = self.property_type {
            set("propertyType", Value::from(v.as_str()));
        }
        if let Some(v) = self.status {
            set("status", Value::from(v.as_str()));
        }
        if let Some(v) = self.price {
            set("price", Value::from(v));
        }
        if let Some(v) = self.price_suffix {
            set("priceSuffix", to_json(&v));
        }
        if let Some(v) = self.area {
            set("area", to_json(&v));
        }
        if let Some(v) = self.bedrooms {
            set("bedrooms", Value::from(v));
        }
        if let Some(v) = self.bathrooms {
            set("bathrooms", Value::from(v));
        }
        if let Some(v) = self.garages {
            set("garages", Value::from(v));
        }
        if let Some(v) = self.year_built {
            set("yearBuilt", Value::from(v));
        }
        if let Some(v) = self.address {
            set("address", to_json(&v));
        }
        if let Some(v) = self.features {
            set("features", to_json(&v));
        }
        if let Some(v) = self.floor_plans {
            set("floorPlans", to_json(&v));
        }
        if let Some(v) = self.video_tour {
            set("videoTour", Value::String(v));
        }
        if let Some(v) = self.virtual_tour {
            set("virtualTour", Value::String(v));
        }
        if let Some(v) = self.is_featured {
            set("isFeatured", Value::Bool(v));
        }
        if let Some(v) = self.is_active {
            set("isActive", Value::Bool(v));
        }

        if self.images.is_some() || self.featured_image_index.is_some() {
            let mut images = current.images.clone();
            images.extend(self.images.unwrap_or_default().into_iter().map(|mut img| {
                img.is_featured = false;
                img
            }));
            if let Some(index) = self.featured_image_index
                && index < images.len()
            {
                for (i, img) in images.iter_mut().enumerate() {
                    img.is_featured = i == index;
                }
            }
            ensure_featured_image(&mut images);
            set("images", to_json(&images));
        }

        changes
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

impl Payload for NewProperty {
    const FILTERS: &'static [(&'static str, FieldFilter)] = &[
        ("title", FieldFilter::Trim),
        ("description", FieldFilter::Trim),
        ("address.city", FieldFilter::Trim),
        ("address.state", FieldFilter::Trim),
        ("address.postalCode", FieldFilter::Trim),
    ];
}

impl Payload for PropertyPatch {
    const FILTERS: &'static [(&'static str, FieldFilter)] = &[
        ("title", FieldFilter::Trim),
        ("description", FieldFilter::Trim),
    ];
}
