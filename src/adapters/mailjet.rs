use crate::config::MailjetConfig;
use crate::domain::model::CustomerEnquiry;
use crate::domain::ports::EnquiryNotifier;
use crate::utils::error::{CatalogueError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const SENDER_NAME: &str = "Kalakala-Corner";
const SUBJECT: &str = "New Query From Kalakala Corner";

/// Emails enquiries through the Mailjet Send API v3.1.
#[derive(Debug, Clone)]
pub struct MailjetNotifier {
    client: Client,
    config: MailjetConfig,
}

impl MailjetNotifier {
    pub fn new(config: MailjetConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, config })
    }

    fn message(&self, enquiry: &CustomerEnquiry) -> serde_json::Value {
        let recipients: Vec<_> = self
            .config
            .recipients
            .iter()
            .map(|email| json!({ "Email": email }))
            .collect();

        json!({
            "Messages": [{
                "From": { "Email": self.config.sender_email, "Name": SENDER_NAME },
                "To": recipients,
                "Subject": SUBJECT,
                "HTMLPart": enquiry_html(enquiry),
            }]
        })
    }
}

#[async_trait]
impl EnquiryNotifier for MailjetNotifier {
    async fn notify(&self, enquiry: &CustomerEnquiry) -> Result<()> {
        if self.config.recipients.is_empty() {
            return Err(CatalogueError::NotificationError {
                message: "no email recipients configured".to_string(),
            });
        }

        let url = format!("{}/v3.1/send", self.config.endpoint.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .json(&self.message(enquiry))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogueError::NotificationError {
                message: format!("Mailjet returned {}: {}", status, body),
            });
        }

        tracing::debug!(recipients = self.config.recipients.len(), "Mailjet accepted message");
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    text.chars()
        .fold(String::with_capacity(text.len()), |mut out, c| {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                c => out.push(c),
            }
            out
        })
}

fn enquiry_html(enquiry: &CustomerEnquiry) -> String {
    let rows = [
        ("Name", enquiry.name.as_str()),
        ("Email", enquiry.email.as_str()),
        ("Phone", enquiry.phone.as_str()),
        ("Query", enquiry.query.as_str()),
        ("Product", enquiry.product.as_deref().unwrap_or("")),
    ];

    let table: String = rows
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            let shade = if i % 2 == 1 { " style=\"background-color: #f9f9f9;\"" } else { "" };
            format!(
                "<tr{shade}><td style=\"padding: 8px; font-weight: bold; color: #333;\">{label}:</td>\
                 <td style=\"padding: 8px; color: #555;\">{}</td></tr>",
                escape_html(value)
            )
        })
        .collect();

    format!(
        "<div style=\"font-family: Arial, sans-serif; background-color: #f7f7f7; padding: 20px;\">\
         <div style=\"max-width: 600px; margin: auto; background-color: #ffffff; border-radius: 8px; padding: 20px;\">\
         <h2 style=\"color: #333333; text-align: center;\">New Enquiry for <span style=\"color:#007BFF;\">KalaKalaCorner</span></h2>\
         <p style=\"font-size: 16px; color: #555;\">You've received a new enquiry. Details are as follows:</p>\
         <table style=\"width: 100%; border-collapse: collapse; margin-top: 15px;\">{table}</table>\
         <p style=\"margin-top: 25px; font-size: 14px; color: #777; text-align: center;\">Sent automatically by <strong>KalaKalaCorner</strong> Website</p>\
         </div></div>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use httpmock::prelude::*;

    fn enquiry() -> CustomerEnquiry {
        CustomerEnquiry {
            id: "e-1".to_string(),
            name: "Ravi <script>".to_string(),
            email: "ravi@example.com".to_string(),
            phone: "+91 98765 43210".to_string(),
            query: "Do you ship abroad?".to_string(),
            product: None,
            date: Utc::now(),
        }
    }

    fn config(endpoint: String) -> MailjetConfig {
        MailjetConfig {
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            sender_email: "shop@example.com".to_string(),
            recipients: vec!["owner@example.com".to_string()],
            endpoint,
        }
    }

    #[test]
    fn test_enquiry_html_escapes_input() {
        let html = enquiry_html(&enquiry());
        assert!(html.contains("Ravi &lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Do you ship abroad?"));
    }

    #[tokio::test]
    async fn test_notify_posts_to_send_api() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v3.1/send")
                .header_exists("authorization")
                .body_contains("owner@example.com")
                .body_contains("New Query From Kalakala Corner");
            then.status(200)
                .json_body(serde_json::json!({ "Messages": [{ "Status": "success" }] }));
        });

        let notifier = MailjetNotifier::new(config(server.base_url())).unwrap();
        notifier.notify(&enquiry()).await.unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_notify_reports_rejection() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v3.1/send");
            then.status(401).body("unauthorized");
        });

        let notifier = MailjetNotifier::new(config(server.base_url())).unwrap();
        let result = notifier.notify(&enquiry()).await;

        assert!(matches!(
            result,
            Err(CatalogueError::NotificationError { message }) if message.contains("401")
        ));
    }
}
