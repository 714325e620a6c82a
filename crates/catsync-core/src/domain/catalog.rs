//! Top-level catalog entities
//!
//! Categories, marks and products are identified by the remote-assigned
//! external ID, which doubles as the local primary key. The project-level
//! rows are keyed by a string (parameter key, config type) or by their
//! remote ID (actions, badges).
//!
//! Serde field names follow the stored/served representation; `alias`
//! attributes accept the remote payload spelling on input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::children::{
    ExcludedCombination, ImportanceItem, ProductColor, ProductExtra, ProductImage,
    ProductParameter, ProductReview, ProductVideo,
};
use super::diff::{DiffBuilder, FieldChange, FieldDiff};
use super::payload::IncomingRecord;

// ============================================================================
// Category / Mark
// ============================================================================

/// A product category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "category_id", alias = "Category_ID")]
    pub id: i64,
    #[serde(rename = "category_name", alias = "Category_Name")]
    pub name: String,
    #[serde(rename = "category_image", alias = "Category_Image")]
    pub image: String,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

impl IncomingRecord for Category {
    const REQUIRED: &'static [&'static str] = &["Category_ID", "Category_Name", "Category_Image"];
}

impl FieldDiff for Category {
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        DiffBuilder::new()
            .field("name", &self.name, &incoming.name)
            .field("image", &self.image, &incoming.image)
            .field("sort_order", &self.sort_order, &incoming.sort_order)
            .finish()
    }
}

/// A product mark (badge-like label attached to products)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "mark_id", alias = "Mark_ID")]
    pub id: i64,
    #[serde(rename = "mark_name", alias = "Mark_Name")]
    pub name: String,
}

impl IncomingRecord for Mark {
    const REQUIRED: &'static [&'static str] = &["Mark_ID", "Mark_Name"];
}

impl FieldDiff for Mark {
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        DiffBuilder::new()
            .field("name", &self.name, &incoming.name)
            .finish()
    }
}

// ============================================================================
// Product
// ============================================================================

/// The scalar part of a product aggregate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    #[serde(rename = "product_id")]
    pub id: i64,
    #[serde(rename = "product_name")]
    pub name: String,
    pub on_main: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Opaque blob handed over by the upstream inventory connector
    #[serde(rename = "moysklad_connector_products_data")]
    pub connector_data: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl FieldDiff for Product {
    /// `created_at` is set once on insert and never diffed.
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        DiffBuilder::new()
            .field("name", &self.name, &incoming.name)
            .field("on_main", &self.on_main, &incoming.on_main)
            .field("updated_at", &self.updated_at, &incoming.updated_at)
            .field("tags", &self.tags, &incoming.tags)
            .field("connector_data", &self.connector_data, &incoming.connector_data)
            .finish()
    }
}

/// A product with every nested collection inlined, as served by `/info`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub categories: Vec<Category>,
    pub marks: Vec<Mark>,
    pub colors: Vec<ProductColor>,
    pub parameters: Vec<ProductParameter>,
    pub images: Vec<ProductImage>,
    pub extras: Vec<ProductExtra>,
    pub reviews: Vec<ProductReview>,
    pub videos: Vec<ProductVideo>,
    pub excluded: Vec<ExcludedCombination>,
    pub importance: Vec<ImportanceItem>,
}

impl ProductView {
    /// A view with every collection empty
    pub fn new(product: Product) -> Self {
        Self {
            product,
            categories: Vec::new(),
            marks: Vec::new(),
            colors: Vec::new(),
            parameters: Vec::new(),
            images: Vec::new(),
            extras: Vec::new(),
            reviews: Vec::new(),
            videos: Vec::new(),
            excluded: Vec::new(),
            importance: Vec::new(),
        }
    }
}

// ============================================================================
// Project configuration rows
// ============================================================================

/// A free-form project parameter, keyed by its parameter key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectParameter {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

impl FieldDiff for ProjectParameter {
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        DiffBuilder::new()
            .field("value", &self.value, &incoming.value)
            .field("description", &self.description, &incoming.description)
            .finish()
    }
}

/// A promotional action shown by the storefront
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAction {
    pub id: i64,
    pub action_type: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub sort_order: i64,
    #[serde(default)]
    pub extra_field_1: Option<String>,
    #[serde(default)]
    pub extra_field_2: Option<String>,
}

impl IncomingRecord for ProjectAction {
    const REQUIRED: &'static [&'static str] = &["id", "action_type", "description", "sort_order"];
}

impl FieldDiff for ProjectAction {
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        DiffBuilder::new()
            .field("action_type", &self.action_type, &incoming.action_type)
            .field("description", &self.description, &incoming.description)
            .field("image_url", &self.image_url, &incoming.image_url)
            .field("url", &self.url, &incoming.url)
            .field("sort_order", &self.sort_order, &incoming.sort_order)
            .field("extra_field_1", &self.extra_field_1, &incoming.extra_field_1)
            .field("extra_field_2", &self.extra_field_2, &incoming.extra_field_2)
            .finish()
    }
}

/// A badge shown next to products or on the landing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBadge {
    pub id: i64,
    pub description: String,
    pub image_url: String,
    #[serde(default)]
    pub meaning_tag: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub sort_order: i64,
}

impl IncomingRecord for ProjectBadge {
    const REQUIRED: &'static [&'static str] = &["id", "description", "image_url", "sort_order"];
}

impl FieldDiff for ProjectBadge {
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        DiffBuilder::new()
            .field("description", &self.description, &incoming.description)
            .field("image_url", &self.image_url, &incoming.image_url)
            .field("meaning_tag", &self.meaning_tag, &incoming.meaning_tag)
            .field("url", &self.url, &incoming.url)
            .field("sort_order", &self.sort_order, &incoming.sort_order)
            .finish()
    }
}

/// An arbitrary JSON document keyed by its config type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectJsonConfig {
    pub config_type: String,
    pub config_data: Value,
}

impl FieldDiff for ProjectJsonConfig {
    /// Documents are compared structurally, so key order is irrelevant.
    fn diff(&self, incoming: &Self) -> Vec<FieldChange> {
        DiffBuilder::new()
            .field("config_data", &self.config_data, &incoming.config_data)
            .finish()
    }
}
