//! Product repository for database operations.
//!
//! Listing queries are assembled with `sqlx::QueryBuilder` because every
//! filter is optional. All values are bound; only the `ORDER BY` clause is
//! spliced in, and it comes from the closed `ProductSort` enum.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use bazaar_core::{CategoryId, PageRequest, Price, ProductId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::category::CategorySummary;
use crate::models::product::{NewProduct, Product, ProductChanges, ProductFilter, ProductView};

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.price, p.category_id, p.images, \
     p.stock, p.tags, p.is_active, p.featured, p.seo_title, p.seo_description, p.slug, \
     p.created_at, p.updated_at";

const VIEW_SELECT: &str = "SELECT p.id, p.name, p.description, p.price, p.category_id, \
     p.images, p.stock, p.tags, p.is_active, p.featured, p.seo_title, p.seo_description, \
     p.slug, p.created_at, p.updated_at, \
     c.name AS category_name, c.slug AS category_slug, c.description AS category_description \
     FROM products p LEFT JOIN categories c ON c.id = p.category_id";

const SEARCH_DOCUMENT: &str =
    "to_tsvector('simple', p.name || ' ' || p.description || ' ' || array_to_string(p.tags, ' '))";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    category_id: i32,
    images: Vec<String>,
    stock: i32,
    tags: Vec<String>,
    is_active: bool,
    featured: bool,
    seo_title: Option<String>,
    seo_description: Option<String>,
    slug: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price,
            category_id: CategoryId::new(row.category_id),
            images: row.images,
            stock: row.stock,
            tags: row.tags,
            is_active: row.is_active,
            featured: row.featured,
            seo_title: row.seo_title,
            seo_description: row.seo_description,
            slug: row.slug,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductViewRow {
    #[sqlx(flatten)]
    product: ProductRow,
    category_name: Option<String>,
    category_slug: Option<String>,
    category_description: Option<String>,
}

impl TryFrom<ProductViewRow> for ProductView {
    type Error = RepositoryError;

    fn try_from(row: ProductViewRow) -> Result<Self, Self::Error> {
        let product = Product::try_from(row.product)?;
        let category = match (row.category_name, row.category_slug) {
            (Some(name), Some(slug)) => Some(CategorySummary {
                id: product.category_id,
                name,
                slug,
                description: row.category_description,
            }),
            _ => None,
        };
        Ok(Self::new(product, category))
    }
}

fn collect_views(rows: Vec<ProductViewRow>) -> Result<Vec<ProductView>, RepositoryError> {
    rows.into_iter().map(TryInto::try_into).collect()
}

/// Append the `WHERE` clause for a public listing.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE p.is_active");

    if let Some(category) = filter.category {
        qb.push(" AND p.category_id = ").push_bind(category);
    }
    if let Some(search) = filter.search.clone() {
        qb.push(" AND ")
            .push(SEARCH_DOCUMENT)
            .push(" @@ plainto_tsquery('simple', ")
            .push_bind(search)
            .push(")");
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND p.price >= ").push_bind(min.amount());
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND p.price <= ").push_bind(max.amount());
    }
    if !filter.tags.is_empty() {
        qb.push(" AND p.tags && ").push_bind(filter.tags.clone());
    }
    if let Some(featured) = filter.featured {
        qb.push(" AND p.featured = ").push_bind(featured);
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of active products plus the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<ProductView>, i64), RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut page_query = QueryBuilder::<Postgres>::new(VIEW_SELECT);
        push_filters(&mut page_query, filter);
        page_query
            .push(" ORDER BY ")
            .push(filter.sort.order_by())
            .push(" LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = page_query
            .build_query_as::<ProductViewRow>()
            .fetch_all(self.pool)
            .await?;

        Ok((collect_views(rows)?, total))
    }

    /// Newest active featured products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: u32) -> Result<Vec<ProductView>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductViewRow>(&format!(
            "{VIEW_SELECT} WHERE p.is_active AND p.featured ORDER BY p.created_at DESC LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        collect_views(rows)
    }

    /// Newest active products in `category`, excluding `product`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related(
        &self,
        product: ProductId,
        category: CategoryId,
        limit: u32,
    ) -> Result<Vec<ProductView>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductViewRow>(&format!(
            r"
            {VIEW_SELECT}
            WHERE p.is_active AND p.category_id = $1 AND p.id <> $2
            ORDER BY p.created_at DESC
            LIMIT $3
            "
        ))
        .bind(category)
        .bind(product)
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        collect_views(rows)
    }

    /// Product with its category, by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn view_by_id(&self, id: ProductId) -> Result<Option<ProductView>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductViewRow>(&format!("{VIEW_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Active product with its category, by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_view_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ProductView>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductViewRow>(&format!(
            "{VIEW_SELECT} WHERE p.slug = $1 AND p.is_active"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Fetch every product whose id is in `ids`, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Whether a product with exactly this name exists, optionally ignoring one id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn name_taken(
        &self,
        name: &str,
        except: Option<ProductId>,
    ) -> Result<bool, RepositoryError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM products WHERE name = $1 AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(except)
        .fetch_one(self.pool)
        .await?;

        Ok(taken)
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is already used.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products AS p (
                name, description, price, category_id, images, stock, tags,
                featured, seo_title, seo_description, slug
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.category_id)
        .bind(&product.images)
        .bind(product.stock)
        .bind(&product.tags)
        .bind(product.featured)
        .bind(&product.seo_title)
        .bind(&product.seo_description)
        .bind(&product.slug)
        .fetch_one(self.pool)
        .await
        .map_err(conflict_on_unique("product"))?;

        row.try_into()
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the new slug is already used.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products AS p SET
                name            = COALESCE($2, p.name),
                slug            = COALESCE($3, p.slug),
                description     = COALESCE($4, p.description),
                price           = COALESCE($5, p.price),
                category_id     = COALESCE($6, p.category_id),
                images          = COALESCE($7, p.images),
                stock           = COALESCE($8, p.stock),
                tags            = COALESCE($9, p.tags),
                is_active       = COALESCE($10, p.is_active),
                featured        = COALESCE($11, p.featured),
                seo_title       = COALESCE($12, p.seo_title),
                seo_description = COALESCE($13, p.seo_description),
                updated_at      = now()
            WHERE p.id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.slug)
        .bind(&changes.description)
        .bind(changes.price.map(|p| p.amount()))
        .bind(changes.category_id)
        .bind(&changes.images)
        .bind(changes.stock)
        .bind(&changes.tags)
        .bind(changes.is_active)
        .bind(changes.featured)
        .bind(&changes.seo_title)
        .bind(&changes.seo_description)
        .fetch_optional(self.pool)
        .await
        .map_err(conflict_on_unique("product"))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if nothing was deleted.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::ProductSort;

    #[test]
    fn test_unfiltered_listing_only_checks_active() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        push_filters(&mut qb, &ProductFilter::default());
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM products p WHERE p.is_active");
    }

    #[test]
    fn test_filters_are_bound_in_order() {
        let filter = ProductFilter {
            category: Some(CategoryId::new(3)),
            search: Some("phone".to_string()),
            tags: vec!["sale".to_string()],
            featured: Some(false),
            sort: ProductSort::PriceAsc,
            ..ProductFilter::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        push_filters(&mut qb, &filter);
        let sql = qb.sql();
        assert!(sql.contains("p.category_id = $1"));
        assert!(sql.contains("plainto_tsquery('simple', $2)"));
        assert!(sql.contains("p.tags && $3"));
        assert!(sql.contains("p.featured = $4"));
    }
}
