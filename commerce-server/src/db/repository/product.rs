//! Product Repository

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqliteConnection;

use super::{RepoError, RepoResult, from_unix, parse_decimal};
use crate::db::models::{Category, Product, ProductCreate, ProductId, ProductUpdate};

/// Raw products row
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    price: String,
    category: String,
    in_stock: i64,
    created: i64,
    updated: i64,
}

impl ProductRow {
    fn into_model(self) -> RepoResult<Product> {
        let category: Category = self
            .category
            .parse()
            .map_err(|e: String| RepoError::Database(format!("Corrupt category: {e}")))?;
        Ok(Product {
            id: self.id,
            name: self.name,
            description: self.description,
            price: parse_decimal(&self.price, "products.price")?,
            category,
            in_stock: self.in_stock != 0,
            created: from_unix(self.created),
            updated: from_unix(self.updated),
        })
    }
}

/// Canonical storage form for a price (2 fraction digits)
fn price_text(price: Decimal) -> String {
    let mut p = price;
    p.rescale(2);
    p.to_string()
}

fn like_pattern(search: &str) -> String {
    format!("%{search}%")
}

// =============================================================================
// Product Repository
// =============================================================================

pub struct ProductRepository;

impl ProductRepository {
    /// Find product by id
    pub async fn find_by_id(
        conn: &mut SqliteConnection,
        id: ProductId,
    ) -> RepoResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, name, description, price, category, in_stock, created, updated \
             FROM products WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        row.map(ProductRow::into_model).transpose()
    }

    /// Paginated listing, newest first, optionally filtered by category
    /// and/or a case-insensitive name search.
    pub async fn list(
        conn: &mut SqliteConnection,
        category: Option<Category>,
        search: Option<&str>,
        limit: u32,
        offset: i64,
    ) -> RepoResult<Vec<Product>> {
        let mut sql = String::from(
            "SELECT id, name, description, price, category, in_stock, created, updated \
             FROM products WHERE 1=1",
        );
        if category.is_some() {
            sql.push_str(" AND category = ?");
        }
        if search.is_some() {
            sql.push_str(" AND name LIKE ?");
        }
        sql.push_str(" ORDER BY created DESC, id DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, ProductRow>(&sql);
        if let Some(cat) = category {
            query = query.bind(cat.as_str());
        }
        if let Some(s) = search {
            query = query.bind(like_pattern(s));
        }
        let rows = query.bind(limit).bind(offset).fetch_all(conn).await?;
        rows.into_iter().map(ProductRow::into_model).collect()
    }

    /// Total row count matching the same filters as [`list`](Self::list)
    pub async fn count(
        conn: &mut SqliteConnection,
        category: Option<Category>,
        search: Option<&str>,
    ) -> RepoResult<i64> {
        let mut sql = String::from("SELECT COUNT(*) FROM products WHERE 1=1");
        if category.is_some() {
            sql.push_str(" AND category = ?");
        }
        if search.is_some() {
            sql.push_str(" AND name LIKE ?");
        }

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(cat) = category {
            query = query.bind(cat.as_str());
        }
        if let Some(s) = search {
            query = query.bind(like_pattern(s));
        }
        Ok(query.fetch_one(conn).await?)
    }

    /// Create a new product
    pub async fn create(conn: &mut SqliteConnection, data: ProductCreate) -> RepoResult<Product> {
        let now = Utc::now().timestamp();
        let row: ProductRow = sqlx::query_as(
            "INSERT INTO products (name, description, price, category, in_stock, created, updated) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             RETURNING id, name, description, price, category, in_stock, created, updated",
        )
        .bind(&data.name)
        .bind(data.description.unwrap_or_default())
        .bind(price_text(data.price))
        .bind(data.category.as_str())
        .bind(data.in_stock.unwrap_or(true))
        .bind(now)
        .bind(now)
        .fetch_one(conn)
        .await?;
        row.into_model()
    }

    /// Partial update; only provided fields are written
    pub async fn update(
        conn: &mut SqliteConnection,
        id: ProductId,
        data: ProductUpdate,
    ) -> RepoResult<Product> {
        // Build dynamic SET clauses with proper type bindings
        let mut set_parts: Vec<&str> = Vec::new();
        if data.name.is_some() {
            set_parts.push("name = ?");
        }
        if data.description.is_some() {
            set_parts.push("description = ?");
        }
        if data.price.is_some() {
            set_parts.push("price = ?");
        }
        if data.category.is_some() {
            set_parts.push("category = ?");
        }
        if data.in_stock.is_some() {
            set_parts.push("in_stock = ?");
        }

        if set_parts.is_empty() {
            // No fields to update
            return Self::find_by_id(conn, id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")));
        }
        set_parts.push("updated = ?");

        let sql = format!(
            "UPDATE products SET {} WHERE id = ? \
             RETURNING id, name, description, price, category, in_stock, created, updated",
            set_parts.join(", ")
        );

        let mut query = sqlx::query_as::<_, ProductRow>(&sql);
        if let Some(v) = data.name {
            query = query.bind(v);
        }
        if let Some(v) = data.description {
            query = query.bind(v);
        }
        if let Some(v) = data.price {
            query = query.bind(price_text(v));
        }
        if let Some(v) = data.category {
            query = query.bind(v.as_str());
        }
        if let Some(v) = data.in_stock {
            query = query.bind(v);
        }
        let row: Option<ProductRow> = query
            .bind(Utc::now().timestamp())
            .bind(id)
            .fetch_optional(conn)
            .await?;

        row.ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))?
            .into_model()
    }

    /// Hard delete a product
    pub async fn delete(conn: &mut SqliteConnection, id: ProductId) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("Product {id} not found")));
        }
        Ok(())
    }
}
