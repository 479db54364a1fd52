use crate::domain::model::{CustomerEnquiry, EnquiryInput};
use crate::domain::ports::{EnquiryNotifier, EnquiryRepository};
use crate::utils::error::{CatalogueError, Result};
use crate::utils::validation::{is_valid_email, is_valid_phone, require_text};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Customer enquiries and the admin notifications they trigger.
#[derive(Clone)]
pub struct EnquiryService {
    enquiries: Arc<dyn EnquiryRepository>,
    mailer: Option<Arc<dyn EnquiryNotifier>>,
    sms: Option<Arc<dyn EnquiryNotifier>>,
}

impl EnquiryService {
    pub fn new(
        enquiries: Arc<dyn EnquiryRepository>,
        mailer: Option<Arc<dyn EnquiryNotifier>>,
        sms: Option<Arc<dyn EnquiryNotifier>>,
    ) -> Self {
        Self {
            enquiries,
            mailer,
            sms,
        }
    }

    pub async fn list(&self) -> Result<Vec<CustomerEnquiry>> {
        self.enquiries.list().await
    }

    /// Stores an enquiry from the contact form. Every contact field is required.
    pub async fn submit(&self, input: EnquiryInput) -> Result<CustomerEnquiry> {
        let name = require_text(input.name.as_deref(), "Name is required")?;
        let email = require_text(input.email.as_deref(), "Email is required")?;
        let phone = require_text(input.phone.as_deref(), "Phone is required")?;
        let query = require_text(input.query.as_deref(), "Query is required")?;

        if !is_valid_email(&email) {
            return Err(CatalogueError::validation("Invalid email format"));
        }
        if !is_valid_phone(&phone) {
            return Err(CatalogueError::validation("Invalid phone number format"));
        }

        let enquiry = new_enquiry(name, email, phone, query, input.product);
        self.enquiries.put(&enquiry).await?;
        tracing::info!(enquiry_id = %enquiry.id, "✅ Customer enquiry saved");
        Ok(enquiry)
    }

    /// Stores the enquiry and emails it to the shop owners.
    pub async fn email(&self, input: EnquiryInput) -> Result<CustomerEnquiry> {
        let enquiry = contact(input)?;
        self.enquiries.put(&enquiry).await?;

        let mailer = self.mailer.as_ref().ok_or_else(|| CatalogueError::NotificationError {
            message: "email delivery is not configured".to_string(),
        })?;
        mailer
            .notify(&enquiry)
            .await
            .inspect_err(|e| tracing::error!(enquiry_id = %enquiry.id, "❌ Error sending email: {}", e))?;

        tracing::info!(enquiry_id = %enquiry.id, "✅ Email sent successfully");
        Ok(enquiry)
    }

    /// Texts the enquiry to the admin phones. Delivery problems are logged only.
    pub async fn sms(&self, input: EnquiryInput) -> Result<()> {
        let enquiry = contact(input)?;

        match &self.sms {
            Some(sms) => {
                if let Err(e) = sms.notify(&enquiry).await {
                    tracing::error!("❌ Error sending SMS: {}", e);
                }
            }
            None => tracing::warn!("SMS delivery is not configured, enquiry not sent"),
        }
        Ok(())
    }
}

// Contact requests need a name, a query, and at least one way to reply.
fn contact(input: EnquiryInput) -> Result<CustomerEnquiry> {
    let has_text = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    if !has_text(&input.name)
        || !has_text(&input.query)
        || !(has_text(&input.email) || has_text(&input.phone))
    {
        return Err(CatalogueError::validation("All fields are required."));
    }

    let trimmed = |v: Option<String>| v.map(|s| s.trim().to_string()).unwrap_or_default();
    Ok(new_enquiry(
        trimmed(input.name),
        trimmed(input.email),
        trimmed(input.phone),
        trimmed(input.query),
        input.product,
    ))
}

fn new_enquiry(
    name: String,
    email: String,
    phone: String,
    query: String,
    product: Option<String>,
) -> CustomerEnquiry {
    CustomerEnquiry {
        id: Uuid::new_v4().to_string(),
        name,
        email,
        phone,
        query,
        product: product.filter(|p| !p.trim().is_empty()),
        date: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryEnquiryRepository, RecordingNotifier};

    fn input() -> EnquiryInput {
        EnquiryInput {
            name: Some("Ravi".to_string()),
            email: Some("ravi@example.com".to_string()),
            phone: Some("+91 98765 43210".to_string()),
            query: Some("Do you ship abroad?".to_string()),
            product: Some("Brass Diya".to_string()),
        }
    }

    #[tokio::test]
    async fn test_submit_stores_enquiry() {
        let repo = Arc::new(MemoryEnquiryRepository::default());
        let service = EnquiryService::new(repo.clone(), None, None);

        let enquiry = service.submit(input()).await.unwrap();

        assert_eq!(enquiry.name, "Ravi");
        assert_eq!(enquiry.product.as_deref(), Some("Brass Diya"));
        assert_eq!(service.list().await.unwrap(), vec![enquiry]);
    }

    #[tokio::test]
    async fn test_submit_validates_contact_details() {
        let service = EnquiryService::new(Arc::new(MemoryEnquiryRepository::default()), None, None);

        let mut bad_email = input();
        bad_email.email = Some("ravi.example.com".to_string());
        assert!(matches!(
            service.submit(bad_email).await,
            Err(CatalogueError::ValidationError { message }) if message == "Invalid email format"
        ));

        let mut bad_phone = input();
        bad_phone.phone = Some("123".to_string());
        assert!(service.submit(bad_phone).await.is_err());

        let mut no_phone = input();
        no_phone.phone = None;
        assert!(service.submit(no_phone).await.is_err());

        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_email_stores_and_notifies() {
        let repo = Arc::new(MemoryEnquiryRepository::default());
        let mailer = Arc::new(RecordingNotifier::default());
        let service = EnquiryService::new(repo, Some(mailer.clone()), None);

        let mut only_phone = input();
        only_phone.email = None;
        service.email(only_phone).await.unwrap();

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].email, "");
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_email_failure_is_reported() {
        let mailer = Arc::new(RecordingNotifier::failing());
        let service = EnquiryService::new(
            Arc::new(MemoryEnquiryRepository::default()),
            Some(mailer),
            None,
        );

        assert!(matches!(
            service.email(input()).await,
            Err(CatalogueError::NotificationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_contact_requires_a_reply_channel() {
        let service = EnquiryService::new(Arc::new(MemoryEnquiryRepository::default()), None, None);
        let mut anonymous = input();
        anonymous.email = None;
        anonymous.phone = Some("  ".to_string());

        assert!(matches!(
            service.sms(anonymous).await,
            Err(CatalogueError::ValidationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_sms_failure_is_swallowed() {
        let sms = Arc::new(RecordingNotifier::failing());
        let repo = Arc::new(MemoryEnquiryRepository::default());
        let service = EnquiryService::new(repo, None, Some(sms));

        assert!(service.sms(input()).await.is_ok());
        assert!(service.list().await.unwrap().is_empty());
    }
}
