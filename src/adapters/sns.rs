use crate::domain::model::CustomerEnquiry;
use crate::domain::ports::EnquiryNotifier;
use crate::utils::error::{CatalogueError, Result};
use async_trait::async_trait;
use aws_sdk_sns::error::DisplayErrorContext;
use aws_sdk_sns::types::MessageAttributeValue;
use aws_sdk_sns::Client as SnsClient;
use futures::future::join_all;

/// Texts enquiries to the admin phone numbers as transactional SMS.
#[derive(Debug, Clone)]
pub struct SnsSmsNotifier {
    client: SnsClient,
    phone_numbers: Vec<String>,
}

impl SnsSmsNotifier {
    pub fn new(client: SnsClient, phone_numbers: Vec<String>) -> Self {
        Self {
            client,
            phone_numbers,
        }
    }

    async fn publish(&self, phone_number: &str, message: &str) -> Result<()> {
        let sms_type = MessageAttributeValue::builder()
            .data_type("String")
            .string_value("Transactional")
            .build()
            .map_err(|e| CatalogueError::NotificationError {
                message: e.to_string(),
            })?;

        let output = self
            .client
            .publish()
            .phone_number(phone_number)
            .message(message)
            .message_attributes("AWS.SNS.SMS.SMSType", sms_type)
            .send()
            .await
            .map_err(|e| CatalogueError::NotificationError {
                message: format!("SNS publish to {} failed: {}", phone_number, DisplayErrorContext(&e)),
            })?;

        tracing::info!(
            phone_number = %phone_number,
            message_id = output.message_id().unwrap_or_default(),
            "✅ SMS sent"
        );
        Ok(())
    }
}

#[async_trait]
impl EnquiryNotifier for SnsSmsNotifier {
    /// Sends to every number; fails if any single publish failed.
    async fn notify(&self, enquiry: &CustomerEnquiry) -> Result<()> {
        let message = sms_text(enquiry);
        let results = join_all(
            self.phone_numbers
                .iter()
                .map(|number| self.publish(number, &message)),
        )
        .await;

        let failures: Vec<String> = results
            .into_iter()
            .filter_map(|r| r.err().map(|e| e.to_string()))
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(CatalogueError::NotificationError {
                message: failures.join("; "),
            })
        }
    }
}

fn sms_text(enquiry: &CustomerEnquiry) -> String {
    let product = enquiry
        .product
        .as_deref()
        .map(|p| format!("Product: {}\n", p))
        .unwrap_or_default();
    format!(
        "KalaKalaCorner enquiry: \n\nName: {}\nEmail: {}\nPhone: {}\n{}Query: {}",
        enquiry.name, enquiry.email, enquiry.phone, product, enquiry.query
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_sms_text() {
        let mut enquiry = CustomerEnquiry {
            id: "e-1".to_string(),
            name: "Ravi".to_string(),
            email: "ravi@example.com".to_string(),
            phone: "98765 43210".to_string(),
            query: "Price for 8 inch?".to_string(),
            product: Some("Brass Diya".to_string()),
            date: Utc::now(),
        };

        assert_eq!(
            sms_text(&enquiry),
            "KalaKalaCorner enquiry: \n\nName: Ravi\nEmail: ravi@example.com\nPhone: 98765 43210\nProduct: Brass Diya\nQuery: Price for 8 inch?"
        );

        enquiry.product = None;
        assert!(!sms_text(&enquiry).contains("Product:"));
    }
}
