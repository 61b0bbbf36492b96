//! Category catalog service.

use sqlx::PgPool;

use bazaar_core::{CategoryId, slugify};

use super::ServiceError;
use crate::db::CategoryRepository;
use crate::models::category::{Category, CategoryChanges, CategoryWithCount, NewCategory};

/// Validated input for creating a category.
#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub sort_order: Option<i32>,
}

/// Validated partial update for a category.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

const DUPLICATE_NAME: &str = "category name already exists";

pub(crate) fn slug_for(name: &str) -> Result<String, ServiceError> {
    slugify(name).ok_or_else(|| {
        ServiceError::bad_request("name must contain at least one letter or digit")
    })
}

pub struct CategoryService<'a> {
    categories: CategoryRepository<'a>,
}

impl<'a> CategoryService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            categories: CategoryRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Category>, ServiceError> {
        Ok(self.categories.list(include_inactive).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn list_with_product_count(&self) -> Result<Vec<CategoryWithCount>, ServiceError> {
        Ok(self.categories.list_with_product_count().await?)
    }

    /// Active category by id; inactive categories are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if missing or inactive.
    pub async fn get(&self, id: CategoryId) -> Result<Category, ServiceError> {
        self.categories
            .get_by_id(id)
            .await?
            .filter(|c| c.is_active)
            .ok_or(ServiceError::NotFound("category"))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no active category has this slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Category, ServiceError> {
        self.categories
            .get_active_by_slug(slug)
            .await?
            .ok_or(ServiceError::NotFound("category"))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::BadRequest` if the name is taken or yields an empty slug.
    pub async fn create(&self, input: CategoryInput) -> Result<Category, ServiceError> {
        if self.categories.name_taken(&input.name, None).await? {
            return Err(ServiceError::bad_request(DUPLICATE_NAME));
        }
        let slug = slug_for(&input.name)?;

        let category = self
            .categories
            .create(&NewCategory {
                name: input.name,
                description: input.description,
                slug,
                image: input.image,
                sort_order: input.sort_order.unwrap_or(0),
            })
            .await?;

        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    /// Apply a partial update; renaming re-derives the slug.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the category does not exist.
    /// Returns `ServiceError::BadRequest` if the new name is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<Category, ServiceError> {
        let existing = self
            .categories
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("category"))?;

        let mut changes = CategoryChanges {
            description: update.description,
            image: update.image,
            is_active: update.is_active,
            sort_order: update.sort_order,
            ..CategoryChanges::default()
        };

        if let Some(name) = update.name.filter(|n| *n != existing.name) {
            if self.categories.name_taken(&name, Some(id)).await? {
                return Err(ServiceError::bad_request(DUPLICATE_NAME));
            }
            changes.slug = Some(slug_for(&name)?);
            changes.name = Some(name);
        }

        Ok(self.categories.update(id, &changes).await?)
    }

    /// Delete a category that no product references.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the category does not exist.
    /// Returns `ServiceError::BadRequest` if any product still references it.
    pub async fn delete(&self, id: CategoryId) -> Result<(), ServiceError> {
        if self.categories.get_by_id(id).await?.is_none() {
            return Err(ServiceError::NotFound("category"));
        }

        if self.categories.product_count(id).await? > 0 {
            return Err(ServiceError::bad_request(
                "cannot delete a category that still has products",
            ));
        }

        self.categories.delete(id).await?;
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }
}
