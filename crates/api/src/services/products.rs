//! Product catalog service.

use sqlx::PgPool;

use bazaar_core::{CategoryId, PageRequest, Pagination, Price, ProductId};

use super::ServiceError;
use super::categories::slug_for;
use crate::db::{CategoryRepository, ProductRepository};
use crate::models::product::{NewProduct, ProductChanges, ProductFilter, ProductView};

/// Validated input for creating a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: CategoryId,
    pub images: Vec<String>,
    pub stock: Option<i32>,
    pub tags: Vec<String>,
    pub featured: Option<bool>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

/// Validated partial update for a product.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub category: Option<CategoryId>,
    pub images: Option<Vec<String>>,
    pub stock: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub featured: Option<bool>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

const DUPLICATE_NAME: &str = "product name already exists";

pub struct ProductService<'a> {
    products: ProductRepository<'a>,
    categories: CategoryRepository<'a>,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
            categories: CategoryRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<ProductView>, Pagination), ServiceError> {
        let (products, total) = self.products.list(filter, page).await?;
        Ok((products, Pagination::new(page, total)))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn featured(&self, limit: u32) -> Result<Vec<ProductView>, ServiceError> {
        Ok(self.products.featured(limit).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn related(
        &self,
        product: ProductId,
        category: CategoryId,
        limit: u32,
    ) -> Result<Vec<ProductView>, ServiceError> {
        Ok(self.products.related(product, category, limit).await?)
    }

    /// Active product by id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if missing or inactive.
    pub async fn get(&self, id: ProductId) -> Result<ProductView, ServiceError> {
        self.products
            .view_by_id(id)
            .await?
            .filter(|view| view.product.is_active)
            .ok_or(ServiceError::NotFound("product"))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no active product has this slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<ProductView, ServiceError> {
        self.products
            .active_view_by_slug(slug)
            .await?
            .ok_or(ServiceError::NotFound("product"))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the category does not exist.
    /// Returns `ServiceError::BadRequest` if the name is taken or yields an empty slug.
    pub async fn create(&self, input: ProductInput) -> Result<ProductView, ServiceError> {
        self.ensure_category(input.category).await?;

        if self.products.name_taken(&input.name, None).await? {
            return Err(ServiceError::bad_request(DUPLICATE_NAME));
        }
        let slug = slug_for(&input.name)?;

        let product = self
            .products
            .create(&NewProduct {
                name: input.name,
                description: input.description,
                price: input.price,
                category_id: input.category,
                images: input.images,
                stock: input.stock.unwrap_or(0),
                tags: input.tags,
                featured: input.featured.unwrap_or(false),
                seo_title: input.seo_title,
                seo_description: input.seo_description,
                slug,
            })
            .await?;

        tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");
        self.view(product.id).await
    }

    /// Apply a partial update; renaming re-derives the slug.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product or a new category does not exist.
    /// Returns `ServiceError::BadRequest` if the new name is taken.
    pub async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<ProductView, ServiceError> {
        let existing = self
            .products
            .view_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("product"))?
            .product;

        if let Some(category) = update.category {
            self.ensure_category(category).await?;
        }

        let mut changes = ProductChanges {
            description: update.description,
            price: update.price,
            category_id: update.category,
            images: update.images,
            stock: update.stock,
            tags: update.tags,
            is_active: update.is_active,
            featured: update.featured,
            seo_title: update.seo_title,
            seo_description: update.seo_description,
            ..ProductChanges::default()
        };

        if let Some(name) = update.name.filter(|n| *n != existing.name) {
            if self.products.name_taken(&name, Some(id)).await? {
                return Err(ServiceError::bad_request(DUPLICATE_NAME));
            }
            changes.slug = Some(slug_for(&name)?);
            changes.name = Some(name);
        }

        self.products.update(id, &changes).await?;
        self.view(id).await
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), ServiceError> {
        self.products.delete(id).await.map_err(|e| match e {
            crate::db::RepositoryError::NotFound => ServiceError::NotFound("product"),
            other => other.into(),
        })?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    async fn ensure_category(&self, id: CategoryId) -> Result<(), ServiceError> {
        match self.categories.get_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound("category")),
        }
    }

    async fn view(&self, id: ProductId) -> Result<ProductView, ServiceError> {
        self.products
            .view_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("product"))
    }
}
