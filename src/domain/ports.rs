use crate::domain::model::{
    AdminUser, Category, CustomerEnquiry, Product, StoredImage, Testimonial, TestimonialPatch,
};
use crate::utils::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Product>>;
    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>>;
    async fn get(&self, id: &str) -> Result<Option<Product>>;
    async fn put(&self, product: &Product) -> Result<()>;
    /// Overwrites the editable fields of an existing product and returns the stored row.
    async fn update(&self, product: &Product) -> Result<Product>;
    async fn delete(&self, id: &str) -> Result<()>;
    async fn delete_many(&self, ids: &[String]) -> Result<()>;
    async fn set_category(&self, ids: &[String], category: &str) -> Result<()>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Category>>;
    async fn put(&self, category: &Category) -> Result<()>;
    async fn delete(&self, path: &str) -> Result<()>;
}

#[async_trait]
pub trait TestimonialRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Testimonial>>;
    /// Stores a testimonial whose id must not exist yet.
    async fn insert(&self, testimonial: &Testimonial) -> Result<()>;
    /// Returns `None` when no testimonial has this id.
    async fn update(&self, id: u64, patch: &TestimonialPatch) -> Result<Option<Testimonial>>;
    /// Returns `false` when no testimonial has this id.
    async fn delete(&self, id: u64) -> Result<bool>;
}

#[async_trait]
pub trait EnquiryRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<CustomerEnquiry>>;
    async fn put(&self, enquiry: &CustomerEnquiry) -> Result<()>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, username: &str) -> Result<Option<AdminUser>>;
}

#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Stores the bytes under `key` and returns the public URL.
    async fn upload(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String>;
    async fn delete(&self, url: &str) -> Result<()>;
    /// Returns `None` when the object does not exist.
    async fn fetch(&self, url: &str) -> Result<Option<StoredImage>>;
    /// Object key for a URL served by this storage, `None` for foreign URLs.
    fn key_for(&self, url: &str) -> Option<String>;
}

#[async_trait]
pub trait EnquiryNotifier: Send + Sync {
    async fn notify(&self, enquiry: &CustomerEnquiry) -> Result<()>;
}
