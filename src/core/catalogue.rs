use super::export;
use crate::domain::model::{Product, ProductInput, StoredImage, UploadedImage};
use crate::domain::ports::{ImageStorage, ProductRepository};
use crate::utils::error::{CatalogueError, Result};
use crate::utils::validation::require_text;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

/// Product reads and admin edits, including the product images in object storage.
#[derive(Clone)]
pub struct CatalogueService {
    products: Arc<dyn ProductRepository>,
    images: Arc<dyn ImageStorage>,
}

impl CatalogueService {
    pub fn new(products: Arc<dyn ProductRepository>, images: Arc<dyn ImageStorage>) -> Self {
        Self { products, images }
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.products.list().await
    }

    pub async fn products_in_category(&self, category: &str) -> Result<Vec<Product>> {
        let category = require_text(Some(category), "Category is required")?;
        self.products.list_by_category(&category).await
    }

    pub async fn product(&self, id: &str) -> Result<Product> {
        let id = require_text(Some(id), "Product id is required")?;
        self.products
            .get(&id)
            .await?
            .ok_or_else(|| CatalogueError::not_found(format!("Product {}", id)))
    }

    /// Product data for the client-side PDF catalogue.
    pub async fn catalogue(&self, category: Option<&str>) -> Result<Vec<Product>> {
        match category.map(str::trim).filter(|c| !c.is_empty()) {
            Some(category) => self.products.list_by_category(category).await,
            None => self.products.list().await,
        }
    }

    /// ZIP export of the catalogue, optionally limited to one category.
    pub async fn export_catalogue(&self, category: Option<&str>) -> Result<Vec<u8>> {
        let products = self.catalogue(category).await?;
        export::catalogue_archive(&products)
    }

    /// Creates a product. An image that fails to upload is skipped, the product is still stored.
    pub async fn add_product(
        &self,
        input: ProductInput,
        images: Vec<UploadedImage>,
    ) -> Result<Product> {
        let name = require_text(Some(&input.name), "Product name is required")?;
        let id = Uuid::new_v4().to_string();

        let mut urls = Vec::with_capacity(images.len());
        for image in images {
            let key = image_key(&id, &image.filename);
            match self
                .images
                .upload(&key, &image.content_type, image.bytes)
                .await
            {
                Ok(url) => urls.push(url),
                Err(e) => tracing::error!(product_id = %id, key = %key, "Unable to upload image: {}", e),
            }
        }

        let product = Product {
            id,
            name,
            desc: input.desc,
            variants: input.variants,
            notes: input.notes,
            category: input.category.trim().to_string(),
            images: urls,
            created_at: Some(Utc::now()),
            updated_at: None,
        };

        self.products.put(&product).await?;
        tracing::info!(product_id = %product.id, images = product.images.len(), "✅ Product added");
        Ok(product)
    }

    /// Replaces the product's fields. Only URLs listed in `existing_images` that
    /// belong to the product are kept; the others are removed from storage.
    pub async fn update_product(
        &self,
        id: &str,
        input: ProductInput,
        images: Vec<UploadedImage>,
    ) -> Result<Product> {
        let existing = self.product(id).await?;
        let name = require_text(Some(&input.name), "Product name is required")?;

        let requested = input.existing_images.unwrap_or_default();
        let retained: Vec<String> = requested
            .into_iter()
            .filter(|url| existing.images.contains(url))
            .collect();
        let removed: Vec<String> = existing
            .images
            .iter()
            .filter(|url| !retained.contains(url))
            .cloned()
            .collect();
        remove_images(self.images.as_ref(), &removed).await;

        let mut final_images = retained;
        for image in images {
            let key = image_key(&existing.id, &image.filename);
            let url = self
                .images
                .upload(&key, &image.content_type, image.bytes)
                .await?;
            final_images.push(url);
        }

        let product = Product {
            name,
            desc: input.desc,
            variants: input.variants,
            notes: input.notes,
            category: input.category.trim().to_string(),
            images: final_images,
            updated_at: Some(Utc::now()),
            ..existing
        };

        let updated = self.products.update(&product).await?;
        tracing::info!(
            product_id = %updated.id,
            removed_images = removed.len(),
            "✅ Product updated"
        );
        Ok(updated)
    }

    pub async fn delete_product(&self, id: &str) -> Result<()> {
        let existing = self.product(id).await?;
        remove_images(self.images.as_ref(), &existing.images).await;
        self.products.delete(&existing.id).await?;
        tracing::info!(product_id = %existing.id, "🗑️ Product deleted");
        Ok(())
    }

    /// Reads an image back through the API. URLs outside the bucket are refused.
    pub async fn fetch_image(&self, url: &str) -> Result<StoredImage> {
        if self.images.key_for(url.trim()).is_none() {
            return Err(CatalogueError::validation("Invalid S3 URL"));
        }
        self.images
            .fetch(url.trim())
            .await?
            .ok_or_else(|| CatalogueError::not_found("Image"))
    }
}

/// Deletes the images concurrently. Failures are logged and otherwise ignored.
pub async fn remove_images(storage: &dyn ImageStorage, urls: &[String]) -> usize {
    let results = join_all(urls.iter().map(|url| async move {
        storage
            .delete(url)
            .await
            .inspect_err(|e| tracing::error!(url = %url, "Failed to delete image: {}", e))
    }))
    .await;

    results.iter().filter(|r| r.is_ok()).count()
}

// Uploaded names keep their file name but never a directory part.
fn image_key(product_id: &str, filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    format!("{}/{}", product_id, name)
}
