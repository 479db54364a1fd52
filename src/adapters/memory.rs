//! In-process backends for tests and local runs without AWS.

use crate::domain::model::{
    AdminUser, Category, CustomerEnquiry, Product, StoredImage, Testimonial, TestimonialPatch,
};
use crate::domain::ports::{
    CategoryRepository, EnquiryNotifier, EnquiryRepository, ImageStorage, ProductRepository,
    TestimonialRepository, UserRepository,
};
use crate::utils::error::{CatalogueError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default)]
pub struct MemoryProductRepository {
    items: Arc<Mutex<BTreeMap<String, Product>>>,
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn list(&self) -> Result<Vec<Product>> {
        Ok(self.items.lock().await.values().cloned().collect())
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>> {
        Ok(self
            .items
            .lock()
            .await
            .values()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Product>> {
        Ok(self.items.lock().await.get(id).cloned())
    }

    async fn put(&self, product: &Product) -> Result<()> {
        self.items
            .lock()
            .await
            .insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<Product> {
        let mut items = self.items.lock().await;
        let stored = items
            .get_mut(&product.id)
            .ok_or_else(|| CatalogueError::not_found(format!("Product {}", product.id)))?;
        *stored = product.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.items.lock().await.remove(id);
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<()> {
        let mut items = self.items.lock().await;
        for id in ids {
            items.remove(id);
        }
        Ok(())
    }

    async fn set_category(&self, ids: &[String], category: &str) -> Result<()> {
        let mut items = self.items.lock().await;
        let now = Utc::now();
        for id in ids {
            if let Some(product) = items.get_mut(id) {
                product.category = category.to_string();
                product.updated_at = Some(now);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCategoryRepository {
    items: Arc<Mutex<BTreeMap<String, Category>>>,
}

#[async_trait]
impl CategoryRepository for MemoryCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>> {
        Ok(self.items.lock().await.values().cloned().collect())
    }

    async fn put(&self, category: &Category) -> Result<()> {
        self.items
            .lock()
            .await
            .insert(category.path.clone(), category.clone());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.items.lock().await.remove(path);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTestimonialRepository {
    items: Arc<Mutex<BTreeMap<u64, Testimonial>>>,
}

#[async_trait]
impl TestimonialRepository for MemoryTestimonialRepository {
    async fn list(&self) -> Result<Vec<Testimonial>> {
        Ok(self.items.lock().await.values().cloned().collect())
    }

    async fn insert(&self, testimonial: &Testimonial) -> Result<()> {
        let mut items = self.items.lock().await;
        if items.contains_key(&testimonial.id) {
            return Err(CatalogueError::Conflict {
                message: format!("Testimonial {} already exists", testimonial.id),
            });
        }
        items.insert(testimonial.id, testimonial.clone());
        Ok(())
    }

    async fn update(&self, id: u64, patch: &TestimonialPatch) -> Result<Option<Testimonial>> {
        let mut items = self.items.lock().await;
        let Some(stored) = items.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(category) = &patch.category {
            stored.category = category.clone();
        }
        if let Some(product) = &patch.product {
            stored.product = product.clone();
        }
        if let Some(product_id) = &patch.product_id {
            stored.product_id = product_id.clone();
        }
        if let Some(comments) = &patch.comments {
            stored.comments = comments.clone();
        }
        if let Some(rating) = patch.rating {
            stored.rating = rating;
        }
        if let Some(customer_name) = &patch.customer_name {
            stored.customer_name = customer_name.clone();
        }
        stored.updated_at = Utc::now();

        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: u64) -> Result<bool> {
        Ok(self.items.lock().await.remove(&id).is_some())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryEnquiryRepository {
    items: Arc<Mutex<Vec<CustomerEnquiry>>>,
}

#[async_trait]
impl EnquiryRepository for MemoryEnquiryRepository {
    async fn list(&self) -> Result<Vec<CustomerEnquiry>> {
        Ok(self.items.lock().await.clone())
    }

    async fn put(&self, enquiry: &CustomerEnquiry) -> Result<()> {
        self.items.lock().await.push(enquiry.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryUserRepository {
    users: HashMap<String, AdminUser>,
}

impl MemoryUserRepository {
    pub fn with_user(username: &str, password_hash: &str) -> Self {
        let mut users = HashMap::new();
        users.insert(
            username.to_string(),
            AdminUser {
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
        Self { users }
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find(&self, username: &str) -> Result<Option<AdminUser>> {
        Ok(self.users.get(username).cloned())
    }
}

/// Object store keyed like the S3 bucket, serving URLs under `base_url`.
#[derive(Debug, Clone)]
pub struct MemoryImageStore {
    base_url: String,
    objects: Arc<Mutex<HashMap<String, StoredImage>>>,
    failing_names: Arc<Mutex<HashSet<String>>>,
}

impl MemoryImageStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            objects: Arc::new(Mutex::new(HashMap::new())),
            failing_names: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }

    pub async fn contains(&self, url: &str) -> bool {
        match self.key_for(url) {
            Some(key) => self.objects.lock().await.contains_key(&key),
            None => false,
        }
    }

    /// Makes uploads of files with this name fail.
    pub async fn fail_uploads_named(&self, filename: &str) {
        self.failing_names.lock().await.insert(filename.to_string());
    }
}

#[async_trait]
impl ImageStorage for MemoryImageStore {
    async fn upload(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        let filename = key.rsplit('/').next().unwrap_or(key);
        if self.failing_names.lock().await.contains(filename) {
            return Err(CatalogueError::storage("PutObject", "simulated failure"));
        }

        self.objects.lock().await.insert(
            key.to_string(),
            StoredImage {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(format!("{}/{}", self.base_url, key))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let key = self
            .key_for(url)
            .ok_or_else(|| CatalogueError::storage("DeleteObject", format!("foreign URL {}", url)))?;
        self.objects.lock().await.remove(&key);
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<Option<StoredImage>> {
        match self.key_for(url) {
            Some(key) => Ok(self.objects.lock().await.get(&key).cloned()),
            None => Ok(None),
        }
    }

    fn key_for(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.base_url)?
            .strip_prefix('/')
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}

/// Notifier that keeps what it was asked to send.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<CustomerEnquiry>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn sent(&self) -> Vec<CustomerEnquiry> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EnquiryNotifier for RecordingNotifier {
    async fn notify(&self, enquiry: &CustomerEnquiry) -> Result<()> {
        if self.fail {
            return Err(CatalogueError::NotificationError {
                message: "simulated failure".to_string(),
            });
        }
        self.sent.lock().await.push(enquiry.clone());
        Ok(())
    }
}
