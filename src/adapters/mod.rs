pub mod dynamo;
pub mod mailjet;
pub mod memory;
pub mod s3;
pub mod sns;

use crate::config::AppConfig;
use crate::core::Backends;
use crate::domain::ports::EnquiryNotifier;
use crate::utils::error::Result;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Region;
use std::sync::Arc;

use dynamo::{
    DynamoCategoryRepository, DynamoEnquiryRepository, DynamoProductRepository,
    DynamoTestimonialRepository, DynamoUserRepository,
};
use mailjet::MailjetNotifier;
use s3::S3ImageStore;
use sns::SnsSmsNotifier;

/// Builds the AWS-backed adapters. SDK clients are created once and shared by every request.
pub async fn aws_backends(config: &AppConfig) -> Result<Backends> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.aws.region.clone()));
    if let Some(endpoint) = &config.aws.endpoint_url {
        tracing::info!(endpoint = %endpoint, "Using custom AWS endpoint");
        loader = loader.endpoint_url(endpoint);
    }
    let shared = loader.load().await;

    let dynamo = aws_sdk_dynamodb::Client::new(&shared);
    // LocalStack and MinIO only serve path-style bucket addressing.
    let s3_config = aws_sdk_s3::config::Builder::from(&shared)
        .force_path_style(config.aws.endpoint_url.is_some())
        .build();
    let s3 = aws_sdk_s3::Client::from_conf(s3_config);

    let tables = &config.tables;
    let images = S3ImageStore::new(s3, &config.aws.s3_bucket, config.bucket_url());

    let mailer: Option<Arc<dyn EnquiryNotifier>> = match &config.notifications.mailjet {
        Some(mailjet) => Some(Arc::new(MailjetNotifier::new(mailjet.clone())?)),
        None => {
            tracing::warn!("Mailjet is not configured, /sendEmail will fail");
            None
        }
    };

    let sms: Option<Arc<dyn EnquiryNotifier>> =
        if config.notifications.admin_phone_numbers.is_empty() {
            tracing::warn!("No admin phone numbers configured, SMS notifications disabled");
            None
        } else {
            Some(Arc::new(SnsSmsNotifier::new(
                aws_sdk_sns::Client::new(&shared),
                config.notifications.admin_phone_numbers.clone(),
            )))
        };

    tracing::info!(
        region = %config.aws.region,
        bucket = %config.aws.s3_bucket,
        products_table = %tables.products,
        "AWS backends ready"
    );

    Ok(Backends {
        products: Arc::new(DynamoProductRepository::new(dynamo.clone(), &tables.products)),
        categories: Arc::new(DynamoCategoryRepository::new(dynamo.clone(), &tables.categories)),
        testimonials: Arc::new(DynamoTestimonialRepository::new(
            dynamo.clone(),
            &tables.testimonials,
        )),
        enquiries: Arc::new(DynamoEnquiryRepository::new(dynamo.clone(), &tables.enquiries)),
        users: Arc::new(DynamoUserRepository::new(dynamo, &tables.users)),
        images: Arc::new(images),
        mailer,
        sms,
    })
}
