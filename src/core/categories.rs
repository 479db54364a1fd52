use crate::core::catalogue::remove_images;
use crate::domain::model::{create_slug, Category, CategoryChangeSummary, CategoryChanges};
use crate::domain::ports::{CategoryRepository, ImageStorage, ProductRepository};
use crate::utils::error::{CatalogueError, Result};
use std::sync::Arc;

#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
    products: Arc<dyn ProductRepository>,
    images: Arc<dyn ImageStorage>,
}

impl CategoryService {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        products: Arc<dyn ProductRepository>,
        images: Arc<dyn ImageStorage>,
    ) -> Self {
        Self {
            categories,
            products,
            images,
        }
    }

    pub async fn list(&self) -> Result<Vec<Category>> {
        self.categories.list().await
    }

    /// Applies deletions, then renames, then additions, and returns the resulting categories.
    ///
    /// Deleting a category deletes its products and their images. Renaming moves
    /// every product to the new path. Steps already applied stay applied when a
    /// later one fails.
    pub async fn save(
        &self,
        changes: CategoryChanges,
    ) -> Result<(Vec<Category>, CategoryChangeSummary)> {
        check_changes(&changes)?;

        let summary = self
            .apply(&changes)
            .await
            .inspect_err(|e| tracing::error!("❌ Error saving categories: {}", e))?;

        tracing::info!(
            deleted = summary.deleted_categories,
            renamed = summary.renamed_categories,
            added = summary.added_categories,
            "✅ Categories saved"
        );
        Ok((self.categories.list().await?, summary))
    }

    async fn apply(&self, changes: &CategoryChanges) -> Result<CategoryChangeSummary> {
        let mut summary = CategoryChangeSummary::default();

        for category in &changes.deleted_categories {
            let products = self.products.list_by_category(&category.path).await?;
            let ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();
            self.products.delete_many(&ids).await?;

            let images: Vec<String> = products.into_iter().flat_map(|p| p.images).collect();
            remove_images(self.images.as_ref(), &images).await;

            self.categories.delete(&category.path).await?;
            tracing::info!(path = %category.path, products = ids.len(), "Deleted category");
            summary.deleted_categories += 1;
            summary.deleted_products += ids.len();
        }

        for rename in &changes.modified_categories {
            let new_path = create_slug(&rename.new_name);
            let ids: Vec<String> = self
                .products
                .list_by_category(&rename.path)
                .await?
                .into_iter()
                .map(|p| p.id)
                .collect();
            self.products.set_category(&ids, &new_path).await?;

            if new_path != rename.path {
                self.categories.delete(&rename.path).await?;
            }
            self.categories
                .put(&Category {
                    path: new_path.clone(),
                    name: rename.new_name.trim().to_string(),
                })
                .await?;
            tracing::info!(from = %rename.path, to = %new_path, products = ids.len(), "Renamed category");
            summary.renamed_categories += 1;
            summary.relabelled_products += ids.len();
        }

        for added in &changes.added_categories {
            let category = Category {
                path: create_slug(&added.name),
                name: added.name.trim().to_string(),
            };
            self.categories.put(&category).await?;
            tracing::info!(path = %category.path, "Added category");
            summary.added_categories += 1;
        }

        Ok(summary)
    }
}

// Rejects the whole batch before any write.
fn check_changes(changes: &CategoryChanges) -> Result<()> {
    if changes
        .deleted_categories
        .iter()
        .any(|c| c.path.trim().is_empty())
    {
        return Err(CatalogueError::validation("Category path is required"));
    }
    for rename in &changes.modified_categories {
        if rename.path.trim().is_empty() {
            return Err(CatalogueError::validation("Category path is required"));
        }
        if create_slug(&rename.new_name).is_empty() {
            return Err(CatalogueError::validation(format!(
                "Invalid category name '{}'",
                rename.new_name
            )));
        }
    }
    for added in &changes.added_categories {
        if create_slug(&added.name).is_empty() {
            return Err(CatalogueError::validation(format!(
                "Invalid category name '{}'",
                added.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        MemoryCategoryRepository, MemoryImageStore, MemoryProductRepository,
    };
    use crate::domain::model::{CategoryRef, CategoryRename, NewCategory, Product};

    struct Fixture {
        service: CategoryService,
        products: Arc<MemoryProductRepository>,
        images: Arc<MemoryImageStore>,
    }

    async fn fixture() -> Fixture {
        let categories = Arc::new(MemoryCategoryRepository::default());
        let products = Arc::new(MemoryProductRepository::default());
        let images = Arc::new(MemoryImageStore::new("https://bucket.s3.ap-south-1.amazonaws.com"));

        for (path, name) in [("lamps", "Lamps"), ("idols", "Idols")] {
            categories
                .put(&Category {
                    path: path.to_string(),
                    name: name.to_string(),
                })
                .await
                .unwrap();
        }

        for i in 0..30 {
            let category = if i % 3 == 0 { "idols" } else { "lamps" };
            let url = images
                .upload(&format!("p{}/a.png", i), "image/png", vec![0])
                .await
                .unwrap();
            products
                .put(&Product {
                    id: format!("p{}", i),
                    name: format!("Product {}", i),
                    desc: String::new(),
                    variants: Vec::new(),
                    notes: Vec::new(),
                    category: category.to_string(),
                    images: vec![url],
                    created_at: None,
                    updated_at: None,
                })
                .await
                .unwrap();
        }

        Fixture {
            service: CategoryService::new(categories, products.clone(), images.clone()),
            products,
            images,
        }
    }

    #[tokio::test]
    async fn test_rename_relabels_products() {
        let f = fixture().await;

        let (categories, summary) = f
            .service
            .save(CategoryChanges {
                modified_categories: vec![CategoryRename {
                    path: "lamps".to_string(),
                    new_name: "Oil Lamps".to_string(),
                }],
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(summary.renamed_categories, 1);
        assert_eq!(summary.relabelled_products, 20);
        assert!(categories.iter().any(|c| c.path == "oil-lamps" && c.name == "Oil Lamps"));
        assert!(!categories.iter().any(|c| c.path == "lamps"));

        assert!(f.products.list_by_category("lamps").await.unwrap().is_empty());
        let moved = f.products.list_by_category("oil-lamps").await.unwrap();
        assert_eq!(moved.len(), 20);
        assert!(moved.iter().all(|p| p.updated_at.is_some()));
    }

    #[tokio::test]
    async fn test_delete_removes_products_and_images() {
        let f = fixture().await;

        let (categories, summary) = f
            .service
            .save(CategoryChanges {
                deleted_categories: vec![CategoryRef {
                    path: "lamps".to_string(),
                }],
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(summary.deleted_products, 20);
        assert_eq!(categories.len(), 1);
        assert_eq!(f.products.list().await.unwrap().len(), 10);
        assert_eq!(f.images.len().await, 10);
    }

    #[tokio::test]
    async fn test_add_uses_slug_paths() {
        let f = fixture().await;

        let (categories, summary) = f
            .service
            .save(CategoryChanges {
                added_categories: vec![NewCategory {
                    name: " Wall Art & Decor ".to_string(),
                }],
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(summary.added_categories, 1);
        assert!(categories
            .iter()
            .any(|c| c.path == "wall-art-decor" && c.name == "Wall Art & Decor"));
    }

    #[tokio::test]
    async fn test_invalid_name_rejected_before_any_write() {
        let f = fixture().await;

        let result = f
            .service
            .save(CategoryChanges {
                deleted_categories: vec![CategoryRef {
                    path: "lamps".to_string(),
                }],
                added_categories: vec![NewCategory {
                    name: "***".to_string(),
                }],
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(CatalogueError::ValidationError { .. })));
        assert_eq!(f.products.list().await.unwrap().len(), 30);
        assert_eq!(f.service.list().await.unwrap().len(), 2);
    }
}
