//! Catalog entity records.
//!
//! The catalog API serializes its records with PascalCase keys and emits
//! `null` for empty collections, so every field here tolerates both a missing
//! key and an explicit `null`. Keys this crate does not model are kept in
//! `extras` and written back to the index untouched.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::AppError;

/// Identifier of a catalog entity. Only positive values are valid.
pub type EntityId = i64;

/// The catalog entity types that are synchronized into the search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Category,
    Part,
}

impl EntityKind {
    /// All kinds, in the order a full run processes them.
    pub const ALL: [EntityKind; 2] = [EntityKind::Category, EntityKind::Part];

    /// Returns the name used for API paths and index document types.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Category => "category",
            EntityKind::Part => "part",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "category" | "categories" => Ok(Self::Category),
            "part" | "parts" => Ok(Self::Part),
            _ => Err(AppError::ConfigError(format!(
                "Unknown entity type: '{}'. Valid options: category, part",
                s
            ))),
        }
    }
}

/// Treats an explicit JSON `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Content {
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Attribute {
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vehicle {
    #[serde(rename = "ID", default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub year: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub make: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub submodel: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub configuration: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Pricing {
    #[serde(default, deserialize_with = "null_as_default")]
    pub r#type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enforced: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Review {
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub review_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Image {
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sort: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub height: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub width: i32,
    /// Image location, kept in whatever shape the API emits it.
    #[serde(default)]
    pub path: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PartVideo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub you_tube_video_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub r#type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_primary: bool,
    #[serde(default)]
    pub type_icon: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Package {
    #[serde(default, deserialize_with = "null_as_default")]
    pub height: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub width: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub length: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weight: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dimension_unit: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dimension_unit_label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weight_unit: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weight_unit_label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub package_unit: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub package_unit_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomerPart {
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cart_reference: i64,
}

/// A catalog category with its nested subcategories and content blocks.
///
/// # Examples
///
/// ```
/// use catsync_core::models::Category;
///
/// let json = r#"{
///     "CategoryId": 7,
///     "ParentId": 0,
///     "Title": "Hitches",
///     "SubCategories": null,
///     "Content": [{"Key": "SEO", "Value": "tow"}],
///     "MenuIcon": "hitch.png"
/// }"#;
///
/// let category: Category = serde_json::from_str(json).unwrap();
/// assert_eq!(category.category_id, 7);
/// assert!(category.sub_categories.is_empty());
/// assert!(category.extras.contains_key("MenuIcon"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Category {
    #[serde(default, deserialize_with = "null_as_default")]
    pub category_id: EntityId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parent_id: EntityId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sort: i32,
    #[serde(default)]
    pub date_added: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub short_desc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub long_desc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub font_code: String,
    #[serde(default)]
    pub image: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_lifestyle: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vehicle_specific: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_categories: Vec<Category>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<Content>,
    /// Fields returned by the API that are not modelled above.
    #[serde(flatten)]
    pub extras: serde_json::Map<String, Value>,
}

/// A catalog part with pricing, media, fitment and packaging details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Part {
    #[serde(default, deserialize_with = "null_as_default")]
    pub part_id: EntityId,
    /// Publication status. Zero or negative means the part must not be indexed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_code: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub related_count: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub average_review: f64,
    #[serde(default)]
    pub date_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_added: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub short_desc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub part_class: String,
    #[serde(default)]
    pub install_sheet: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Vec<Attribute>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vehicle_attributes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vehicles: Vec<Vehicle>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<Content>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pricing: Vec<Pricing>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reviews: Vec<Review>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<Image>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub related: Vec<EntityId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<Category>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub videos: Vec<PartVideo>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub packages: Vec<Package>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customer: CustomerPart,
    /// Fields returned by the API that are not modelled above.
    #[serde(flatten)]
    pub extras: serde_json::Map<String, Value>,
}

/// A fully fetched entity, ready to be written to the index as one document.
///
/// Serializes as the inner record, without a variant tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityRecord {
    Category(Category),
    Part(Part),
}

impl EntityRecord {
    /// Decodes a catalog API body into the record type for `kind`.
    pub fn from_json(kind: EntityKind, body: &[u8]) -> Result<Self, AppError> {
        Ok(match kind {
            EntityKind::Category => EntityRecord::Category(serde_json::from_slice(body)?),
            EntityKind::Part => EntityRecord::Part(serde_json::from_slice(body)?),
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRecord::Category(_) => EntityKind::Category,
            EntityRecord::Part(_) => EntityKind::Part,
        }
    }

    /// The identifier carried inside the record itself.
    pub fn id(&self) -> EntityId {
        match self {
            EntityRecord::Category(c) => c.category_id,
            EntityRecord::Part(p) => p.part_id,
        }
    }

    /// Validity predicate applied before any index write.
    ///
    /// Categories need a positive id; parts additionally need a positive status.
    pub fn is_indexable(&self) -> bool {
        match self {
            EntityRecord::Category(c) => c.category_id > 0,
            EntityRecord::Part(p) => p.part_id > 0 && p.status > 0,
        }
    }
}

impl From<Category> for EntityRecord {
    fn from(category: Category) -> Self {
        EntityRecord::Category(category)
    }
}

impl From<Part> for EntityRecord {
    fn from(part: Part) -> Self {
        EntityRecord::Part(part)
    }
}
