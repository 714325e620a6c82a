//! Row mapping between SQLite and domain types
//!
//! | Domain Type     | SQL Type | Strategy                                   |
//! |-----------------|----------|--------------------------------------------|
//! | DateTime<Utc>   | TEXT     | RFC 3339 via `to_rfc3339()` / `parse_from_rfc3339()` |
//! | tags            | TEXT     | serde_json array                           |
//! | json_data, config_data | TEXT | serde_json document                     |
//! | bool            | INTEGER  | 0 / 1                                      |

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use catsync_core::domain::{
    Category, ChildKind, ChildRecord, ExcludedCombination, ImportanceItem, LinkKind, Mark,
    Product, ProductColor, ProductExtra, ProductImage, ProductParameter, ProductReview,
    ProductVideo, ProjectAction, ProjectBadge, ProjectJsonConfig, ProjectParameter,
};

use crate::CacheError;

// ============================================================================
// Table metadata
// ============================================================================

/// `(table, id column)` for a child kind
pub(crate) fn child_table(kind: ChildKind) -> (&'static str, &'static str) {
    match kind {
        ChildKind::Color => ("product_colors", "color_id"),
        ChildKind::Parameter => ("product_parameters", "parameter_id"),
        ChildKind::Image => ("product_images", "image_id"),
        ChildKind::Extra => ("product_extras", "product_extra_id"),
        ChildKind::Review => ("product_reviews", "photo_id"),
        ChildKind::Video => ("product_videos", "video_id"),
        ChildKind::ExcludedCombination => ("excluded_combinations", "id"),
        ChildKind::Importance => ("importance_items", "id"),
    }
}

/// `(association table, target column)` for a link kind
pub(crate) fn link_table(kind: LinkKind) -> (&'static str, &'static str) {
    match kind {
        LinkKind::Category => ("product_category_association", "category_id"),
        LinkKind::Mark => ("product_mark_association", "mark_id"),
    }
}

// ============================================================================
// Value conversions
// ============================================================================

pub(crate) fn datetime_to_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, CacheError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CacheError::Decode(format!("Invalid timestamp '{s}': {e}")))
}

pub(crate) fn json_to_string<T: serde::Serialize>(value: &T) -> Result<String, CacheError> {
    serde_json::to_string(value).map_err(|e| CacheError::Decode(e.to_string()))
}

fn parse_json<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, CacheError> {
    serde_json::from_str(s).map_err(|e| CacheError::Decode(e.to_string()))
}

fn optional_json<T: serde::de::DeserializeOwned>(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<T>, CacheError> {
    row.try_get::<Option<String>, _>(column)?
        .as_deref()
        .map(parse_json::<T>)
        .transpose()
}

// ============================================================================
// Top-level rows
// ============================================================================

pub(crate) fn row_to_category(row: &SqliteRow) -> Result<Category, CacheError> {
    Ok(Category {
        id: row.try_get("category_id")?,
        name: row.try_get("category_name")?,
        image: row.try_get("category_image")?,
        sort_order: row.try_get("sort_order")?,
    })
}

pub(crate) fn row_to_mark(row: &SqliteRow) -> Result<Mark, CacheError> {
    Ok(Mark {
        id: row.try_get("mark_id")?,
        name: row.try_get("mark_name")?,
    })
}

pub(crate) fn row_to_product(row: &SqliteRow) -> Result<Product, CacheError> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(Product {
        id: row.try_get("product_id")?,
        name: row.try_get("product_name")?,
        on_main: row.try_get("on_main")?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
        connector_data: row.try_get("moysklad_connector_products_data")?,
        tags: optional_json(row, "tags")?,
    })
}

pub(crate) fn row_to_parameter(row: &SqliteRow) -> Result<ProjectParameter, CacheError> {
    Ok(ProjectParameter {
        key: row.try_get("param_key")?,
        value: row.try_get("value")?,
        description: row.try_get("description")?,
    })
}

pub(crate) fn row_to_action(row: &SqliteRow) -> Result<ProjectAction, CacheError> {
    Ok(ProjectAction {
        id: row.try_get("id")?,
        action_type: row.try_get("action_type")?,
        description: row.try_get("description")?,
        image_url: row.try_get("image_url")?,
        url: row.try_get("url")?,
        sort_order: row.try_get("sort_order")?,
        extra_field_1: row.try_get("extra_field_1")?,
        extra_field_2: row.try_get("extra_field_2")?,
    })
}

pub(crate) fn row_to_badge(row: &SqliteRow) -> Result<ProjectBadge, CacheError> {
    Ok(ProjectBadge {
        id: row.try_get("id")?,
        description: row.try_get("description")?,
        image_url: row.try_get("image_url")?,
        meaning_tag: row.try_get("meaning_tag")?,
        url: row.try_get("url")?,
        sort_order: row.try_get("sort_order")?,
    })
}

pub(crate) fn row_to_json_config(row: &SqliteRow) -> Result<ProjectJsonConfig, CacheError> {
    let data: String = row.try_get("config_data")?;
    Ok(ProjectJsonConfig {
        config_type: row.try_get("config_type")?,
        config_data: parse_json::<Value>(&data)?,
    })
}

// ============================================================================
// Child rows
// ============================================================================

pub(crate) fn row_to_child(kind: ChildKind, row: &SqliteRow) -> Result<ChildRecord, CacheError> {
    Ok(match kind {
        ChildKind::Color => ChildRecord::Color(ProductColor {
            id: row.try_get("color_id")?,
            name: row.try_get("color_name")?,
            code: row.try_get("color_code")?,
            image: row.try_get("color_image")?,
            discount: row.try_get("discount")?,
            json_data: optional_json(row, "json_data")?,
            sort_order: row.try_get("sort_order")?,
        }),
        ChildKind::Parameter => ChildRecord::Parameter(ProductParameter {
            id: row.try_get("parameter_id")?,
            name: row.try_get("name")?,
            parameter_string: row.try_get("parameter_string")?,
            price: row.try_get("price")?,
            old_price: row.try_get("old_price")?,
            chosen: row.try_get("chosen")?,
            disabled: row.try_get("disabled")?,
            extra_field_color: row.try_get("extra_field_color")?,
            extra_field_image: row.try_get("extra_field_image")?,
            sort_order: row.try_get("sort_order")?,
        }),
        ChildKind::Image => ChildRecord::Image(ProductImage {
            id: row.try_get("image_id")?,
            url: row.try_get("image_url")?,
            main_image: row.try_get("main_image")?,
            position: row.try_get("position")?,
            sort_order: row.try_get("sort_order")?,
            title: row.try_get("title")?,
        }),
        ChildKind::Extra => ChildRecord::Extra(ProductExtra {
            id: row.try_get("product_extra_id")?,
            characteristics: row.try_get("characteristics")?,
            delivery: row.try_get("delivery")?,
            kit: row.try_get("kit")?,
            offer: row.try_get("offer")?,
            ai_description: row.try_get("ai_description")?,
        }),
        ChildKind::Review => ChildRecord::Review(ProductReview {
            id: row.try_get("photo_id")?,
            url: row.try_get("photo_url")?,
            sort_order: row.try_get("sort_order")?,
        }),
        ChildKind::Video => ChildRecord::Video(ProductVideo {
            id: row.try_get("video_id")?,
            url: row.try_get("video_url")?,
            poster_url: row.try_get("poster_url")?,
            sort_order: row.try_get("sort_order")?,
        }),
        ChildKind::ExcludedCombination => ChildRecord::ExcludedCombination(ExcludedCombination {
            id: row.try_get("id")?,
            color_id: row.try_get("color_id")?,
            parameter_id: row.try_get("parameter_id")?,
        }),
        ChildKind::Importance => ChildRecord::Importance(ImportanceItem {
            id: row.try_get("id")?,
            importance: row.try_get("importance")?,
        }),
    })
}
