pub mod auth;
pub mod catalogue;
pub mod categories;
pub mod enquiries;
pub mod export;
pub mod testimonials;

use crate::config::AuthConfig;
use crate::domain::ports::{
    CategoryRepository, EnquiryNotifier, EnquiryRepository, ImageStorage, ProductRepository,
    TestimonialRepository, UserRepository,
};
use std::sync::Arc;

pub use auth::AuthService;
pub use catalogue::CatalogueService;
pub use categories::CategoryService;
pub use enquiries::EnquiryService;
pub use testimonials::TestimonialService;

/// The storage and delivery backends the services run on.
#[derive(Clone)]
pub struct Backends {
    pub products: Arc<dyn ProductRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub testimonials: Arc<dyn TestimonialRepository>,
    pub enquiries: Arc<dyn EnquiryRepository>,
    pub users: Arc<dyn UserRepository>,
    pub images: Arc<dyn ImageStorage>,
    pub mailer: Option<Arc<dyn EnquiryNotifier>>,
    pub sms: Option<Arc<dyn EnquiryNotifier>>,
}

#[derive(Clone)]
pub struct Services {
    pub catalogue: CatalogueService,
    pub categories: CategoryService,
    pub testimonials: TestimonialService,
    pub enquiries: EnquiryService,
    pub auth: AuthService,
}

impl Services {
    pub fn new(backends: Backends, auth: &AuthConfig) -> Self {
        Self {
            catalogue: CatalogueService::new(backends.products.clone(), backends.images.clone()),
            categories: CategoryService::new(
                backends.categories,
                backends.products,
                backends.images,
            ),
            testimonials: TestimonialService::new(backends.testimonials),
            enquiries: EnquiryService::new(backends.enquiries, backends.mailer, backends.sms),
            auth: AuthService::new(
                backends.users,
                &auth.admin_token_secret,
                auth.token_ttl_minutes,
            ),
        }
    }
}
