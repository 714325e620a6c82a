//! SQLite implementation of ICatalogStore
//!
//! [`SqliteCatalogStore`] opens transactions on the pool and serves the
//! `/info` read model. [`SqliteCatalogTransaction`] wraps one
//! `sqlx::Transaction` and implements every write the reconcilers need,
//! including a stack of named savepoints for per-record rollback.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use catsync_core::domain::{
    Category, ChildKind, ChildRecord, LinkKind, Mark, Product, ProductView, ProjectAction,
    ProjectBadge, ProjectJsonConfig, ProjectParameter,
};
use catsync_core::ports::{ICatalogStore, ICatalogTransaction};

use crate::rows::{
    child_table, datetime_to_string, json_to_string, link_table, row_to_action, row_to_badge,
    row_to_category, row_to_child, row_to_json_config, row_to_mark, row_to_parameter,
    row_to_product,
};
use crate::CacheError;

// ============================================================================
// SqliteCatalogStore
// ============================================================================

/// SQLite-backed catalog store
#[derive(Clone)]
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a concrete transaction (the trait method boxes this)
    pub async fn begin_transaction(&self) -> Result<SqliteCatalogTransaction, CacheError> {
        let tx = self.pool.begin().await?;
        Ok(SqliteCatalogTransaction { tx, savepoints: 0 })
    }
}

#[async_trait]
impl ICatalogStore for SqliteCatalogStore {
    async fn begin(&self) -> Result<Box<dyn ICatalogTransaction>> {
        Ok(Box::new(self.begin_transaction().await?))
    }

    async fn load_catalog(&self) -> Result<Vec<ProductView>> {
        let product_rows = sqlx::query("SELECT * FROM products ORDER BY product_id")
            .fetch_all(&self.pool)
            .await?;

        let mut views = Vec::with_capacity(product_rows.len());
        let mut index = HashMap::with_capacity(product_rows.len());
        for row in &product_rows {
            let product = row_to_product(row)?;
            index.insert(product.id, views.len());
            views.push(ProductView::new(product));
        }

        let category_rows = sqlx::query(
            "SELECT a.product_id AS owner_id, c.* FROM product_category_association a \
             JOIN categories c ON c.category_id = a.category_id \
             ORDER BY a.product_id, c.category_id",
        )
        .fetch_all(&self.pool)
        .await?;
        for row in &category_rows {
            let owner: i64 = row.try_get("owner_id")?;
            if let Some(&i) = index.get(&owner) {
                views[i].categories.push(row_to_category(row)?);
            }
        }

        let mark_rows = sqlx::query(
            "SELECT a.product_id AS owner_id, m.* FROM product_mark_association a \
             JOIN product_marks m ON m.mark_id = a.mark_id \
             ORDER BY a.product_id, m.mark_id",
        )
        .fetch_all(&self.pool)
        .await?;
        for row in &mark_rows {
            let owner: i64 = row.try_get("owner_id")?;
            if let Some(&i) = index.get(&owner) {
                views[i].marks.push(row_to_mark(row)?);
            }
        }

        for kind in ChildKind::ALL {
            let (table, id_column) = child_table(kind);
            let sql = format!("SELECT * FROM {table} ORDER BY product_id, {id_column}");
            let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
            for row in &rows {
                let owner: i64 = row.try_get("product_id")?;
                if let Some(&i) = index.get(&owner) {
                    attach(&mut views[i], row_to_child(kind, row)?);
                }
            }
        }

        tracing::debug!(products = views.len(), "Loaded catalog");
        Ok(views)
    }
}

fn attach(view: &mut ProductView, child: ChildRecord) {
    match child {
        ChildRecord::Color(c) => view.colors.push(c),
        ChildRecord::Parameter(p) => view.parameters.push(p),
        ChildRecord::Image(i) => view.images.push(i),
        ChildRecord::Extra(e) => view.extras.push(e),
        ChildRecord::Review(r) => view.reviews.push(r),
        ChildRecord::Video(v) => view.videos.push(v),
        ChildRecord::ExcludedCombination(x) => view.excluded.push(x),
        ChildRecord::Importance(i) => view.importance.push(i),
    }
}

// ============================================================================
// SqliteCatalogTransaction
// ============================================================================

/// One open SQLite transaction
///
/// Savepoints are named `sp_1`, `sp_2`, ... by nesting depth.
pub struct SqliteCatalogTransaction {
    tx: Transaction<'static, Sqlite>,
    savepoints: usize,
}

impl SqliteCatalogTransaction {
    /// Current savepoint nesting depth
    pub fn savepoint_depth(&self) -> usize {
        self.savepoints
    }

    async fn execute_control(&mut self, sql: String) -> Result<(), CacheError> {
        sqlx::query(&sql).execute(&mut *self.tx).await?;
        Ok(())
    }
}

#[async_trait]
impl ICatalogTransaction for SqliteCatalogTransaction {
    async fn savepoint(&mut self) -> Result<()> {
        let depth = self.savepoints + 1;
        self.execute_control(format!("SAVEPOINT sp_{depth}")).await?;
        self.savepoints = depth;
        Ok(())
    }

    async fn release_savepoint(&mut self) -> Result<()> {
        let depth = self.savepoints;
        if depth == 0 {
            return Err(CacheError::NoSavepoint.into());
        }
        self.execute_control(format!("RELEASE SAVEPOINT sp_{depth}"))
            .await?;
        self.savepoints -= 1;
        Ok(())
    }

    async fn rollback_to_savepoint(&mut self) -> Result<()> {
        let depth = self.savepoints;
        if depth == 0 {
            return Err(CacheError::NoSavepoint.into());
        }
        self.execute_control(format!("ROLLBACK TO SAVEPOINT sp_{depth}"))
            .await?;
        self.execute_control(format!("RELEASE SAVEPOINT sp_{depth}"))
            .await?;
        self.savepoints -= 1;
        tracing::trace!(depth, "Rolled back to savepoint");
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    async fn get_category(&mut self, id: i64) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE category_id = ?")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.as_ref().map(row_to_category).transpose()?)
    }

    async fn insert_category(&mut self, category: &Category) -> Result<()> {
        sqlx::query(
            "INSERT INTO categories (category_id, category_name, category_image, sort_order) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.image)
        .bind(category.sort_order)
        .execute(&mut *self.tx)
        .await?;
        tracing::trace!(category_id = category.id, "Inserted category");
        Ok(())
    }

    async fn update_category(&mut self, category: &Category) -> Result<()> {
        sqlx::query(
            "UPDATE categories SET category_name = ?, category_image = ?, sort_order = ? \
             WHERE category_id = ?",
        )
        .bind(&category.name)
        .bind(&category.image)
        .bind(category.sort_order)
        .bind(category.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Marks
    // ------------------------------------------------------------------

    async fn get_mark(&mut self, id: i64) -> Result<Option<Mark>> {
        let row = sqlx::query("SELECT * FROM product_marks WHERE mark_id = ?")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.as_ref().map(row_to_mark).transpose()?)
    }

    async fn insert_mark(&mut self, mark: &Mark) -> Result<()> {
        sqlx::query("INSERT INTO product_marks (mark_id, mark_name) VALUES (?, ?)")
            .bind(mark.id)
            .bind(&mark.name)
            .execute(&mut *self.tx)
            .await?;
        tracing::trace!(mark_id = mark.id, "Inserted mark");
        Ok(())
    }

    async fn update_mark(&mut self, mark: &Mark) -> Result<()> {
        sqlx::query("UPDATE product_marks SET mark_name = ? WHERE mark_id = ?")
            .bind(&mark.name)
            .bind(mark.id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------

    async fn get_product(&mut self, id: i64) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE product_id = ?")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.as_ref().map(row_to_product).transpose()?)
    }

    async fn insert_product(&mut self, product: &Product) -> Result<()> {
        let tags = product.tags.as_ref().map(json_to_string).transpose()?;
        sqlx::query(
            "INSERT INTO products \
             (product_id, product_name, on_main, created_at, updated_at, \
              moysklad_connector_products_data, tags) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.on_main)
        .bind(datetime_to_string(&product.created_at))
        .bind(datetime_to_string(&product.updated_at))
        .bind(&product.connector_data)
        .bind(&tags)
        .execute(&mut *self.tx)
        .await?;
        tracing::trace!(product_id = product.id, "Inserted product");
        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> Result<()> {
        let tags = product.tags.as_ref().map(json_to_string).transpose()?;
        sqlx::query(
            "UPDATE products SET product_name = ?, on_main = ?, updated_at = ?, \
             moysklad_connector_products_data = ?, tags = ? WHERE product_id = ?",
        )
        .bind(&product.name)
        .bind(product.on_main)
        .bind(datetime_to_string(&product.updated_at))
        .bind(&product.connector_data)
        .bind(&tags)
        .bind(product.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Project parameters
    // ------------------------------------------------------------------

    async fn get_parameter(&mut self, key: &str) -> Result<Option<ProjectParameter>> {
        let row = sqlx::query("SELECT * FROM project_parameters WHERE param_key = ?")
            .bind(key)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.as_ref().map(row_to_parameter).transpose()?)
    }

    async fn insert_parameter(&mut self, parameter: &ProjectParameter) -> Result<()> {
        sqlx::query(
            "INSERT INTO project_parameters (param_key, value, description) VALUES (?, ?, ?)",
        )
        .bind(&parameter.key)
        .bind(&parameter.value)
        .bind(&parameter.description)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_parameter(&mut self, parameter: &ProjectParameter) -> Result<()> {
        sqlx::query(
            "UPDATE project_parameters SET value = ?, description = ? WHERE param_key = ?",
        )
        .bind(&parameter.value)
        .bind(&parameter.description)
        .bind(&parameter.key)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Project actions
    // ------------------------------------------------------------------

    async fn get_action(&mut self, id: i64) -> Result<Option<ProjectAction>> {
        let row = sqlx::query("SELECT * FROM project_actions WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.as_ref().map(row_to_action).transpose()?)
    }

    async fn insert_action(&mut self, action: &ProjectAction) -> Result<()> {
        sqlx::query(
            "INSERT INTO project_actions \
             (id, action_type, description, image_url, url, sort_order, extra_field_1, extra_field_2) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(action.id)
        .bind(&action.action_type)
        .bind(&action.description)
        .bind(&action.image_url)
        .bind(&action.url)
        .bind(action.sort_order)
        .bind(&action.extra_field_1)
        .bind(&action.extra_field_2)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_action(&mut self, action: &ProjectAction) -> Result<()> {
        sqlx::query(
            "UPDATE project_actions SET action_type = ?, description = ?, image_url = ?, \
             url = ?, sort_order = ?, extra_field_1 = ?, extra_field_2 = ? WHERE id = ?",
        )
        .bind(&action.action_type)
        .bind(&action.description)
        .bind(&action.image_url)
        .bind(&action.url)
        .bind(action.sort_order)
        .bind(&action.extra_field_1)
        .bind(&action.extra_field_2)
        .bind(action.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Project badges
    // ------------------------------------------------------------------

    async fn get_badge(&mut self, id: i64) -> Result<Option<ProjectBadge>> {
        let row = sqlx::query("SELECT * FROM project_badges WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.as_ref().map(row_to_badge).transpose()?)
    }

    async fn insert_badge(&mut self, badge: &ProjectBadge) -> Result<()> {
        sqlx::query(
            "INSERT INTO project_badges (id, description, image_url, meaning_tag, url, sort_order) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(badge.id)
        .bind(&badge.description)
        .bind(&badge.image_url)
        .bind(&badge.meaning_tag)
        .bind(&badge.url)
        .bind(badge.sort_order)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_badge(&mut self, badge: &ProjectBadge) -> Result<()> {
        sqlx::query(
            "UPDATE project_badges SET description = ?, image_url = ?, meaning_tag = ?, \
             url = ?, sort_order = ? WHERE id = ?",
        )
        .bind(&badge.description)
        .bind(&badge.image_url)
        .bind(&badge.meaning_tag)
        .bind(&badge.url)
        .bind(badge.sort_order)
        .bind(badge.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // JSON configs
    // ------------------------------------------------------------------

    async fn get_json_config(&mut self, config_type: &str) -> Result<Option<ProjectJsonConfig>> {
        let row = sqlx::query("SELECT * FROM project_json_configs WHERE config_type = ?")
            .bind(config_type)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.as_ref().map(row_to_json_config).transpose()?)
    }

    async fn insert_json_config(&mut self, config: &ProjectJsonConfig) -> Result<()> {
        let data = json_to_string(&config.config_data)?;
        sqlx::query("INSERT INTO project_json_configs (config_type, config_data) VALUES (?, ?)")
            .bind(&config.config_type)
            .bind(&data)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update_json_config(&mut self, config: &ProjectJsonConfig) -> Result<()> {
        let data = json_to_string(&config.config_data)?;
        sqlx::query("UPDATE project_json_configs SET config_data = ? WHERE config_type = ?")
            .bind(&data)
            .bind(&config.config_type)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Owned children
    // ------------------------------------------------------------------

    async fn load_children(&mut self, kind: ChildKind, product_id: i64) -> Result<Vec<ChildRecord>> {
        let (table, id_column) = child_table(kind);
        let sql = format!("SELECT * FROM {table} WHERE product_id = ? ORDER BY {id_column}");
        let rows = sqlx::query(&sql)
            .bind(product_id)
            .fetch_all(&mut *self.tx)
            .await?;
        let children = rows
            .iter()
            .map(|row| row_to_child(kind, row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(children)
    }

    async fn insert_child(&mut self, product_id: i64, child: &ChildRecord) -> Result<()> {
        let query = match child {
            ChildRecord::Color(c) => sqlx::query(
                "INSERT INTO product_colors \
                 (color_id, product_id, color_name, color_code, color_image, discount, json_data, sort_order) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(c.id)
            .bind(product_id)
            .bind(c.name.clone())
            .bind(c.code.clone())
            .bind(c.image.clone())
            .bind(c.discount)
            .bind(c.json_data.as_ref().map(json_to_string).transpose()?)
            .bind(c.sort_order),
            ChildRecord::Parameter(p) => sqlx::query(
                "INSERT INTO product_parameters \
                 (parameter_id, product_id, name, parameter_string, price, old_price, chosen, \
                  disabled, extra_field_color, extra_field_image, sort_order) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(p.id)
            .bind(product_id)
            .bind(p.name.clone())
            .bind(p.parameter_string.clone())
            .bind(p.price)
            .bind(p.old_price)
            .bind(p.chosen)
            .bind(p.disabled)
            .bind(p.extra_field_color.clone())
            .bind(p.extra_field_image.clone())
            .bind(p.sort_order),
            ChildRecord::Image(i) => sqlx::query(
                "INSERT INTO product_images \
                 (image_id, product_id, image_url, main_image, position, sort_order, title) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(i.id)
            .bind(product_id)
            .bind(i.url.clone())
            .bind(i.main_image)
            .bind(i.position.clone())
            .bind(i.sort_order)
            .bind(i.title.clone()),
            ChildRecord::Extra(e) => sqlx::query(
                "INSERT INTO product_extras \
                 (product_extra_id, product_id, characteristics, delivery, kit, offer, ai_description) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(e.id)
            .bind(product_id)
            .bind(e.characteristics.clone())
            .bind(e.delivery.clone())
            .bind(e.kit.clone())
            .bind(e.offer.clone())
            .bind(e.ai_description.clone()),
            ChildRecord::Review(r) => sqlx::query(
                "INSERT INTO product_reviews (photo_id, product_id, photo_url, sort_order) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(r.id)
            .bind(product_id)
            .bind(r.url.clone())
            .bind(r.sort_order),
            ChildRecord::Video(v) => sqlx::query(
                "INSERT INTO product_videos (video_id, product_id, video_url, poster_url, sort_order) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(v.id)
            .bind(product_id)
            .bind(v.url.clone())
            .bind(v.poster_url.clone())
            .bind(v.sort_order),
            ChildRecord::ExcludedCombination(x) => sqlx::query(
                "INSERT INTO excluded_combinations (id, product_id, color_id, parameter_id) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(x.id)
            .bind(product_id)
            .bind(x.color_id)
            .bind(x.parameter_id),
            ChildRecord::Importance(i) => sqlx::query(
                "INSERT INTO importance_items (id, product_id, importance) VALUES (?, ?, ?)",
            )
            .bind(i.id)
            .bind(product_id)
            .bind(i.importance),
        };
        query.execute(&mut *self.tx).await?;
        tracing::trace!(kind = %child.kind(), id = child.id(), product_id, "Inserted child");
        Ok(())
    }

    async fn update_child(&mut self, child: &ChildRecord) -> Result<()> {
        let query = match child {
            ChildRecord::Color(c) => sqlx::query(
                "UPDATE product_colors SET color_name = ?, color_code = ?, color_image = ?, \
                 discount = ?, json_data = ?, sort_order = ? WHERE color_id = ?",
            )
            .bind(c.name.clone())
            .bind(c.code.clone())
            .bind(c.image.clone())
            .bind(c.discount)
            .bind(c.json_data.as_ref().map(json_to_string).transpose()?)
            .bind(c.sort_order)
            .bind(c.id),
            ChildRecord::Parameter(p) => sqlx::query(
                "UPDATE product_parameters SET name = ?, parameter_string = ?, price = ?, \
                 old_price = ?, chosen = ?, disabled = ?, extra_field_color = ?, \
                 extra_field_image = ?, sort_order = ? WHERE parameter_id = ?",
            )
            .bind(p.name.clone())
            .bind(p.parameter_string.clone())
            .bind(p.price)
            .bind(p.old_price)
            .bind(p.chosen)
            .bind(p.disabled)
            .bind(p.extra_field_color.clone())
            .bind(p.extra_field_image.clone())
            .bind(p.sort_order)
            .bind(p.id),
            ChildRecord::Image(i) => sqlx::query(
                "UPDATE product_images SET image_url = ?, main_image = ?, position = ?, \
                 sort_order = ?, title = ? WHERE image_id = ?",
            )
            .bind(i.url.clone())
            .bind(i.main_image)
            .bind(i.position.clone())
            .bind(i.sort_order)
            .bind(i.title.clone())
            .bind(i.id),
            ChildRecord::Extra(e) => sqlx::query(
                "UPDATE product_extras SET characteristics = ?, delivery = ?, kit = ?, \
                 offer = ?, ai_description = ? WHERE product_extra_id = ?",
            )
            .bind(e.characteristics.clone())
            .bind(e.delivery.clone())
            .bind(e.kit.clone())
            .bind(e.offer.clone())
            .bind(e.ai_description.clone())
            .bind(e.id),
            ChildRecord::Review(r) => {
                sqlx::query("UPDATE product_reviews SET photo_url = ?, sort_order = ? WHERE photo_id = ?")
                    .bind(r.url.clone())
                    .bind(r.sort_order)
                    .bind(r.id)
            }
            ChildRecord::Video(v) => sqlx::query(
                "UPDATE product_videos SET video_url = ?, poster_url = ?, sort_order = ? \
                 WHERE video_id = ?",
            )
            .bind(v.url.clone())
            .bind(v.poster_url.clone())
            .bind(v.sort_order)
            .bind(v.id),
            ChildRecord::ExcludedCombination(x) => sqlx::query(
                "UPDATE excluded_combinations SET color_id = ?, parameter_id = ? WHERE id = ?",
            )
            .bind(x.color_id)
            .bind(x.parameter_id)
            .bind(x.id),
            ChildRecord::Importance(i) => {
                sqlx::query("UPDATE importance_items SET importance = ? WHERE id = ?")
                    .bind(i.importance)
                    .bind(i.id)
            }
        };
        query.execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn delete_child(&mut self, kind: ChildKind, id: i64) -> Result<()> {
        let (table, id_column) = child_table(kind);
        let sql = format!("DELETE FROM {table} WHERE {id_column} = ?");
        sqlx::query(&sql).bind(id).execute(&mut *self.tx).await?;
        tracing::trace!(%kind, id, "Deleted child");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------

    async fn linked_ids(&mut self, kind: LinkKind, product_id: i64) -> Result<Vec<i64>> {
        let (table, column) = link_table(kind);
        let sql = format!("SELECT {column} FROM {table} WHERE product_id = ? ORDER BY {column}");
        let ids = sqlx::query_scalar::<_, i64>(&sql)
            .bind(product_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(ids)
    }

    async fn clear_links(&mut self, kind: LinkKind, product_id: i64) -> Result<()> {
        let (table, _) = link_table(kind);
        let sql = format!("DELETE FROM {table} WHERE product_id = ?");
        sqlx::query(&sql)
            .bind(product_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn add_link(&mut self, kind: LinkKind, product_id: i64, target_id: i64) -> Result<()> {
        let (table, column) = link_table(kind);
        let sql = format!("INSERT OR IGNORE INTO {table} (product_id, {column}) VALUES (?, ?)");
        sqlx::query(&sql)
            .bind(product_id)
            .bind(target_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }
}
