//! Product-owned child records and many-to-many link kinds
//!
//! Every child record carries its own external ID, unique across the whole
//! table, and belongs to exactly one product. Children are reconciled with an
//! owned-set diff: deleted by absence, updated in place, inserted when new.
//! [`ChildRecord`] lets one generic routine handle every kind.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::catalog::{Category, Mark};
use super::diff::{DiffBuilder, FieldChange, FieldDiff};
use super::errors::RecordError;
use super::payload::{decode, optional_text, IncomingRecord};
use super::report::EntityKind;

// ============================================================================
// Child record types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductColor {
    #[serde(rename = "color_id", alias = "Color_ID")]
    pub id: i64,
    #[serde(rename = "color_name", alias = "Color_Name")]
    pub name: String,
    #[serde(rename = "color_code", alias = "Color_Code")]
    pub code: String,
    #[serde(default, rename = "color_image", alias = "Color_image")]
    pub image: Option<String>,
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub json_data: Option<Value>,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

impl IncomingRecord for ProductColor {
    const REQUIRED: &'static [&'static str] = &["Color_ID", "Color_Name", "Color_Code"];
}

impl FieldDiff for ProductColor {
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        DiffBuilder::new()
            .field("name", &self.name, &incoming.name)
            .field("code", &self.code, &incoming.code)
            .field("image", &self.image, &incoming.image)
            .field("discount", &self.discount, &incoming.discount)
            .field("json_data", &self.json_data, &incoming.json_data)
            .field("sort_order", &self.sort_order, &incoming.sort_order)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductParameter {
    #[serde(rename = "parameter_id", alias = "Parameter_ID")]
    pub id: i64,
    pub name: String,
    pub parameter_string: String,
    pub price: f64,
    #[serde(default)]
    pub old_price: Option<f64>,
    pub chosen: bool,
    pub disabled: bool,
    #[serde(default)]
    pub extra_field_color: Option<String>,
    #[serde(default)]
    pub extra_field_image: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

impl IncomingRecord for ProductParameter {
    const REQUIRED: &'static [&'static str] = &[
        "Parameter_ID",
        "name",
        "parameter_string",
        "price",
        "chosen",
        "disabled",
    ];
}

impl FieldDiff for ProductParameter {
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        DiffBuilder::new()
            .field("name", &self.name, &incoming.name)
            .field("parameter_string", &self.parameter_string, &incoming.parameter_string)
            .field("price", &self.price, &incoming.price)
            .field("old_price", &self.old_price, &incoming.old_price)
            .field("chosen", &self.chosen, &incoming.chosen)
            .field("disabled", &self.disabled, &incoming.disabled)
            .field("extra_field_color", &self.extra_field_color, &incoming.extra_field_color)
            .field("extra_field_image", &self.extra_field_image, &incoming.extra_field_image)
            .field("sort_order", &self.sort_order, &incoming.sort_order)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    #[serde(rename = "image_id", alias = "Image_ID")]
    pub id: i64,
    #[serde(rename = "image_url", alias = "Image_URL")]
    pub url: String,
    #[serde(rename = "main_image", alias = "MainImage")]
    pub main_image: bool,
    #[serde(default, deserialize_with = "optional_text")]
    pub position: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
}

impl IncomingRecord for ProductImage {
    const REQUIRED: &'static [&'static str] = &["Image_ID", "Image_URL", "MainImage"];
}

impl FieldDiff for ProductImage {
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        DiffBuilder::new()
            .field("url", &self.url, &incoming.url)
            .field("main_image", &self.main_image, &incoming.main_image)
            .field("position", &self.position, &incoming.position)
            .field("sort_order", &self.sort_order, &incoming.sort_order)
            .field("title", &self.title, &incoming.title)
            .finish()
    }
}

/// Free-text product details (characteristics, delivery terms, kit contents...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductExtra {
    #[serde(rename = "product_extra_id", alias = "Extra_ID")]
    pub id: i64,
    #[serde(default)]
    pub characteristics: Option<String>,
    #[serde(default)]
    pub delivery: Option<String>,
    #[serde(default)]
    pub kit: Option<String>,
    #[serde(default)]
    pub offer: Option<String>,
    #[serde(default)]
    pub ai_description: Option<String>,
}

impl IncomingRecord for ProductExtra {
    const REQUIRED: &'static [&'static str] = &["Extra_ID"];
}

impl FieldDiff for ProductExtra {
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        DiffBuilder::new()
            .field("characteristics", &self.characteristics, &incoming.characteristics)
            .field("delivery", &self.delivery, &incoming.delivery)
            .field("kit", &self.kit, &incoming.kit)
            .field("offer", &self.offer, &incoming.offer)
            .field("ai_description", &self.ai_description, &incoming.ai_description)
            .finish()
    }
}

/// A customer review photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductReview {
    #[serde(rename = "photo_id", alias = "Photo_ID")]
    pub id: i64,
    #[serde(rename = "photo_url", alias = "Photo_URL")]
    pub url: String,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

impl IncomingRecord for ProductReview {
    const REQUIRED: &'static [&'static str] = &["Photo_ID", "Photo_URL"];
}

impl FieldDiff for ProductReview {
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        DiffBuilder::new()
            .field("url", &self.url, &incoming.url)
            .field("sort_order", &self.sort_order, &incoming.sort_order)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVideo {
    #[serde(rename = "video_id", alias = "Video_ID")]
    pub id: i64,
    #[serde(rename = "video_url", alias = "Video_URL")]
    pub url: String,
    #[serde(default, rename = "poster_url", alias = "Poster_URL")]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

impl IncomingRecord for ProductVideo {
    const REQUIRED: &'static [&'static str] = &["Video_ID", "Video_URL"];
}

impl FieldDiff for ProductVideo {
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        DiffBuilder::new()
            .field("url", &self.url, &incoming.url)
            .field("poster_url", &self.poster_url, &incoming.poster_url)
            .field("sort_order", &self.sort_order, &incoming.sort_order)
            .finish()
    }
}

/// A color/parameter pair that cannot be ordered together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedCombination {
    pub id: i64,
    #[serde(rename = "color_id", alias = "Color_ID")]
    pub color_id: i64,
    #[serde(rename = "parameter_id", alias = "Parameter_ID")]
    pub parameter_id: i64,
}

impl IncomingRecord for ExcludedCombination {
    const REQUIRED: &'static [&'static str] = &["id", "Color_ID", "Parameter_ID"];
}

impl FieldDiff for ExcludedCombination {
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        DiffBuilder::new()
            .field("color_id", &self.color_id, &incoming.color_id)
            .field("parameter_id", &self.parameter_id, &incoming.parameter_id)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportanceItem {
    pub id: i64,
    pub importance: i64,
}

impl IncomingRecord for ImportanceItem {
    const REQUIRED: &'static [&'static str] = &["id", "importance"];
}

impl FieldDiff for ImportanceItem {
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        DiffBuilder::new()
            .field("importance", &self.importance, &incoming.importance)
            .finish()
    }
}

// ============================================================================
// ChildKind / ChildRecord
// ============================================================================

/// The kinds of exclusively owned product children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildKind {
    Color,
    Parameter,
    Image,
    Extra,
    Review,
    Video,
    ExcludedCombination,
    Importance,
}

impl ChildKind {
    /// Reconciliation order within one product
    pub const ALL: [ChildKind; 8] = [
        ChildKind::Color,
        ChildKind::Parameter,
        ChildKind::Image,
        ChildKind::Extra,
        ChildKind::Review,
        ChildKind::Video,
        ChildKind::ExcludedCombination,
        ChildKind::Importance,
    ];

    /// Key of the nested list inside a product payload
    pub fn section_key(&self) -> &'static str {
        match self {
            ChildKind::Color => "colors",
            ChildKind::Parameter => "parameters",
            ChildKind::Image => "images",
            ChildKind::Extra => "extras",
            ChildKind::Review => "reviews",
            ChildKind::Video => "videos",
            ChildKind::ExcludedCombination => "excluded",
            ChildKind::Importance => "importance",
        }
    }

    /// Payload field holding the external ID
    pub fn id_field(&self) -> &'static str {
        match self {
            ChildKind::Color => "Color_ID",
            ChildKind::Parameter => "Parameter_ID",
            ChildKind::Image => "Image_ID",
            ChildKind::Extra => "Extra_ID",
            ChildKind::Review => "Photo_ID",
            ChildKind::Video => "Video_ID",
            ChildKind::ExcludedCombination | ChildKind::Importance => "id",
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            ChildKind::Color => EntityKind::Color,
            ChildKind::Parameter => EntityKind::Parameter,
            ChildKind::Image => EntityKind::Image,
            ChildKind::Extra => EntityKind::Extra,
            ChildKind::Review => EntityKind::Review,
            ChildKind::Video => EntityKind::Video,
            ChildKind::ExcludedCombination => EntityKind::ExcludedCombination,
            ChildKind::Importance => EntityKind::ImportanceItem,
        }
    }
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section_key())
    }
}

/// One child record of any kind
#[derive(Debug, Clone, PartialEq)]
pub enum ChildRecord {
    Color(ProductColor),
    Parameter(ProductParameter),
    Image(ProductImage),
    Extra(ProductExtra),
    Review(ProductReview),
    Video(ProductVideo),
    ExcludedCombination(ExcludedCombination),
    Importance(ImportanceItem),
}

impl ChildRecord {
    /// Validates and decodes one payload entry of the given kind
    pub fn decode(kind: ChildKind, raw: &Value) -> Result<Self, RecordError> {
        Ok(match kind {
            ChildKind::Color => ChildRecord::Color(decode(raw)?),
            ChildKind::Parameter => ChildRecord::Parameter(decode(raw)?),
            ChildKind::Image => ChildRecord::Image(decode(raw)?),
            ChildKind::Extra => ChildRecord::Extra(decode(raw)?),
            ChildKind::Review => ChildRecord::Review(decode(raw)?),
            ChildKind::Video => ChildRecord::Video(decode(raw)?),
            ChildKind::ExcludedCombination => ChildRecord::ExcludedCombination(decode(raw)?),
            ChildKind::Importance => ChildRecord::Importance(decode(raw)?),
        })
    }

    pub fn id(&self) -> i64 {
        match self {
            ChildRecord::Color(c) => c.id,
            ChildRecord::Parameter(p) => p.id,
            ChildRecord::Image(i) => i.id,
            ChildRecord::Extra(e) => e.id,
            ChildRecord::Review(r) => r.id,
            ChildRecord::Video(v) => v.id,
            ChildRecord::ExcludedCombination(x) => x.id,
            ChildRecord::Importance(i) => i.id,
        }
    }

    pub fn kind(&self) -> ChildKind {
        match self {
            ChildRecord::Color(_) => ChildKind::Color,
            ChildRecord::Parameter(_) => ChildKind::Parameter,
            ChildRecord::Image(_) => ChildKind::Image,
            ChildRecord::Extra(_) => ChildKind::Extra,
            ChildRecord::Review(_) => ChildKind::Review,
            ChildRecord::Video(_) => ChildKind::Video,
            ChildRecord::ExcludedCombination(_) => ChildKind::ExcludedCombination,
            ChildRecord::Importance(_) => ChildKind::Importance,
        }
    }
}

impl FieldDiff for ChildRecord {
    /// Records of different kinds never compare; the caller keys by kind first.
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        match (self, incoming) {
            (ChildRecord::Color(a), ChildRecord::Color(b)) => a.diff(b),
            (ChildRecord::Parameter(a), ChildRecord::Parameter(b)) => a.diff(b),
            (ChildRecord::Image(a), ChildRecord::Image(b)) => a.diff(b),
            (ChildRecord::Extra(a), ChildRecord::Extra(b)) => a.diff(b),
            (ChildRecord::Review(a), ChildRecord::Review(b)) => a.diff(b),
            (ChildRecord::Video(a), ChildRecord::Video(b)) => a.diff(b),
            (ChildRecord::ExcludedCombination(a), ChildRecord::ExcludedCombination(b)) => a.diff(b),
            (ChildRecord::Importance(a), ChildRecord::Importance(b)) => a.diff(b),
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// LinkKind
// ============================================================================

/// Many-to-many associations rebuilt wholesale on every product sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Category,
    Mark,
}

impl LinkKind {
    pub const ALL: [LinkKind; 2] = [LinkKind::Category, LinkKind::Mark];

    pub fn section_key(&self) -> &'static str {
        match self {
            LinkKind::Category => "categories",
            LinkKind::Mark => "marks",
        }
    }

    pub fn id_field(&self) -> &'static str {
        match self {
            LinkKind::Category => "Category_ID",
            LinkKind::Mark => "Mark_ID",
        }
    }

    /// Schema enforced when the linked entity has to be created on the fly
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            LinkKind::Category => Category::REQUIRED,
            LinkKind::Mark => Mark::REQUIRED,
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            LinkKind::Category => EntityKind::Category,
            LinkKind::Mark => EntityKind::Mark,
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section_key())
    }
}
