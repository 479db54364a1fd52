//! DynamoDB repositories.
//!
//! Tables and keys:
//! - products: `id` (S)
//! - categories: `path` (S)
//! - testimonials: `id` (N)
//! - enquiries: `id` (S)
//! - users: `username` (S)

use crate::domain::model::{
    AdminUser, Category, CustomerEnquiry, Product, Testimonial, TestimonialPatch,
};
use crate::domain::ports::{
    CategoryRepository, EnquiryRepository, ProductRepository, TestimonialRepository,
    UserRepository,
};
use crate::utils::error::{CatalogueError, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, ReturnValue, WriteRequest};
use aws_sdk_dynamodb::Client;
use chrono::Utc;
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, from_items, to_attribute_value, to_item};
use std::cmp::min;
use std::collections::HashMap;
use std::time::Duration;

/// BatchWriteItem accepts at most 25 requests.
const BATCH_WRITE_SIZE: usize = 25;
/// Category relabels run this many UpdateItem calls at once.
const UPDATE_BATCH_SIZE: usize = 10;
const MAX_BATCH_ATTEMPTS: u32 = 3;

type Item = HashMap<String, AttributeValue>;

fn db_error<E>(operation: &'static str) -> impl FnOnce(E) -> CatalogueError
where
    E: std::error::Error + 'static,
{
    move |e| {
        let err = CatalogueError::database(operation, DisplayErrorContext(&e));
        tracing::error!("{}", err);
        err
    }
}

/// Scans the whole table, following `LastEvaluatedKey`, optionally keeping only
/// items whose string attribute `filter.0` equals `filter.1`.
async fn scan_all<T: DeserializeOwned>(
    client: &Client,
    table: &str,
    filter: Option<(&str, &str)>,
) -> Result<Vec<T>> {
    let mut results = Vec::new();
    let mut start_key: Option<Item> = None;

    loop {
        let mut request = client
            .scan()
            .table_name(table)
            .set_exclusive_start_key(start_key.take());
        if let Some((attribute, value)) = filter {
            request = request
                .filter_expression("#attr = :value")
                .expression_attribute_names("#attr", attribute)
                .expression_attribute_values(":value", AttributeValue::S(value.to_string()));
        }

        let output = request.send().await.map_err(db_error("Scan"))?;
        let page: Vec<T> = from_items(output.items.unwrap_or_default())?;
        results.extend(page);

        match output.last_evaluated_key {
            Some(key) if !key.is_empty() => start_key = Some(key),
            _ => break,
        }
    }

    tracing::debug!(table = %table, items = results.len(), "Scanned table");
    Ok(results)
}

async fn put<T: Serialize>(client: &Client, table: &str, value: &T) -> Result<()> {
    client
        .put_item()
        .table_name(table)
        .set_item(Some(to_item(value)?))
        .send()
        .await
        .map_err(db_error("PutItem"))?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DynamoProductRepository {
    client: Client,
    table: String,
}

impl DynamoProductRepository {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn key(id: &str) -> AttributeValue {
        AttributeValue::S(id.to_string())
    }

    /// Writes one batch, resubmitting whatever DynamoDB reports as unprocessed.
    async fn write_batch(&self, mut batch: Vec<WriteRequest>) -> Result<()> {
        for attempt in 1..=MAX_BATCH_ATTEMPTS {
            let output = self
                .client
                .batch_write_item()
                .request_items(&self.table, batch)
                .send()
                .await
                .map_err(db_error("BatchWriteItem"))?;

            batch = output
                .unprocessed_items
                .and_then(|mut unprocessed| unprocessed.remove(&self.table))
                .unwrap_or_default();
            if batch.is_empty() {
                return Ok(());
            }

            tracing::warn!(
                table = %self.table,
                attempt,
                unprocessed = batch.len(),
                "Batch write left items unprocessed"
            );
            tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
        }

        Err(CatalogueError::DatabaseError {
            operation: "BatchWriteItem",
            message: format!(
                "{} items still unprocessed after {} attempts",
                batch.len(),
                MAX_BATCH_ATTEMPTS
            ),
        })
    }
}

#[async_trait]
impl ProductRepository for DynamoProductRepository {
    async fn list(&self) -> Result<Vec<Product>> {
        scan_all(&self.client, &self.table, None).await
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>> {
        scan_all(&self.client, &self.table, Some(("category", category))).await
    }

    async fn get(&self, id: &str) -> Result<Option<Product>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("id", Self::key(id))
            .send()
            .await
            .map_err(db_error("GetItem"))?;

        Ok(output.item.map(from_item).transpose()?)
    }

    async fn put(&self, product: &Product) -> Result<()> {
        put(&self.client, &self.table, product).await
    }

    async fn update(&self, product: &Product) -> Result<Product> {
        let result = self
            .client
            .update_item()
            .table_name(&self.table)
            .key("id", Self::key(&product.id))
            .update_expression(
                "SET #name = :name, #desc = :desc, #variants = :variants, #images = :images, \
                 #notes = :notes, #category = :category, #updatedAt = :updatedAt",
            )
            .condition_expression("attribute_exists(id)")
            .expression_attribute_names("#name", "name")
            .expression_attribute_names("#desc", "desc")
            .expression_attribute_names("#variants", "variants")
            .expression_attribute_names("#images", "images")
            .expression_attribute_names("#notes", "notes")
            .expression_attribute_names("#category", "category")
            .expression_attribute_names("#updatedAt", "updatedAt")
            .expression_attribute_values(":name", to_attribute_value(&product.name)?)
            .expression_attribute_values(":desc", to_attribute_value(&product.desc)?)
            .expression_attribute_values(":variants", to_attribute_value(&product.variants)?)
            .expression_attribute_values(":images", to_attribute_value(&product.images)?)
            .expression_attribute_values(":notes", to_attribute_value(&product.notes)?)
            .expression_attribute_values(":category", to_attribute_value(&product.category)?)
            .expression_attribute_values(
                ":updatedAt",
                to_attribute_value(product.updated_at.unwrap_or_else(Utc::now))?,
            )
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result {
            Ok(output) => Ok(from_item(output.attributes.unwrap_or_default())?),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Err(CatalogueError::not_found(format!("Product {}", product.id)))
            }
            Err(e) => Err(db_error("UpdateItem")(e)),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table)
            .key("id", Self::key(id))
            .send()
            .await
            .map_err(db_error("DeleteItem"))?;
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<()> {
        let mut requests = ids
            .iter()
            .map(|id| {
                let delete = DeleteRequest::builder()
                    .key("id", Self::key(id))
                    .build()
                    .map_err(db_error("BatchWriteItem"))?;
                Ok(WriteRequest::builder().delete_request(delete).build())
            })
            .collect::<Result<Vec<WriteRequest>>>()?;

        while !requests.is_empty() {
            let this_batch: Vec<_> = requests
                .drain(..min(requests.len(), BATCH_WRITE_SIZE))
                .collect();
            self.write_batch(this_batch).await?;
        }

        tracing::debug!(table = %self.table, deleted = ids.len(), "Batch deleted products");
        Ok(())
    }

    async fn set_category(&self, ids: &[String], category: &str) -> Result<()> {
        let updated_at = to_attribute_value(Utc::now())?;

        for batch in ids.chunks(UPDATE_BATCH_SIZE) {
            try_join_all(batch.iter().map(|id| {
                self.client
                    .update_item()
                    .table_name(&self.table)
                    .key("id", Self::key(id))
                    .update_expression("SET #category = :category, #updatedAt = :updatedAt")
                    .expression_attribute_names("#category", "category")
                    .expression_attribute_names("#updatedAt", "updatedAt")
                    .expression_attribute_values(":category", AttributeValue::S(category.to_string()))
                    .expression_attribute_values(":updatedAt", updated_at.clone())
                    .send()
            }))
            .await
            .map_err(db_error("UpdateItem"))?;
        }

        tracing::debug!(table = %self.table, updated = ids.len(), category = %category, "Relabelled products");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DynamoCategoryRepository {
    client: Client,
    table: String,
}

impl DynamoCategoryRepository {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl CategoryRepository for DynamoCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>> {
        scan_all(&self.client, &self.table, None).await
    }

    async fn put(&self, category: &Category) -> Result<()> {
        put(&self.client, &self.table, category).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table)
            .key("path", AttributeValue::S(path.to_string()))
            .send()
            .await
            .map_err(db_error("DeleteItem"))?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DynamoTestimonialRepository {
    client: Client,
    table: String,
}

impl DynamoTestimonialRepository {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn key(id: u64) -> AttributeValue {
        AttributeValue::N(id.to_string())
    }
}

/// `SET` clauses for the supplied fields of a patch, plus `updatedAt`.
fn testimonial_update(patch: &TestimonialPatch) -> Result<(String, Item, HashMap<String, String>)> {
    let mut clauses = Vec::new();
    let mut values = Item::new();
    let mut names = HashMap::new();

    let text_fields = [
        ("category", "category", &patch.category),
        ("product", "product", &patch.product),
        ("productId", "product-id", &patch.product_id),
        ("comments", "comments", &patch.comments),
        ("customerName", "customerName", &patch.customer_name),
    ];
    for (placeholder, attribute, value) in text_fields {
        if let Some(value) = value {
            clauses.push(format!("#{placeholder} = :{placeholder}"));
            names.insert(format!("#{placeholder}"), attribute.to_string());
            values.insert(format!(":{placeholder}"), AttributeValue::S(value.clone()));
        }
    }
    if let Some(rating) = patch.rating {
        clauses.push("#rating = :rating".to_string());
        names.insert("#rating".to_string(), "rating".to_string());
        values.insert(":rating".to_string(), AttributeValue::N(rating.to_string()));
    }

    clauses.push("#updatedAt = :updatedAt".to_string());
    names.insert("#updatedAt".to_string(), "updatedAt".to_string());
    values.insert(":updatedAt".to_string(), to_attribute_value(Utc::now())?);

    Ok((format!("SET {}", clauses.join(", ")), values, names))
}

#[async_trait]
impl TestimonialRepository for DynamoTestimonialRepository {
    async fn list(&self) -> Result<Vec<Testimonial>> {
        scan_all(&self.client, &self.table, None).await
    }

    async fn insert(&self, testimonial: &Testimonial) -> Result<()> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(to_item(testimonial)?))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Err(CatalogueError::Conflict {
                    message: format!("Testimonial {} already exists", testimonial.id),
                })
            }
            Err(e) => Err(db_error("PutItem")(e)),
        }
    }

    async fn update(&self, id: u64, patch: &TestimonialPatch) -> Result<Option<Testimonial>> {
        let (expression, values, names) = testimonial_update(patch)?;

        let result = self
            .client
            .update_item()
            .table_name(&self.table)
            .key("id", Self::key(id))
            .update_expression(expression)
            .condition_expression("attribute_exists(id)")
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result {
            Ok(output) => Ok(Some(from_item(output.attributes.unwrap_or_default())?)),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Ok(None)
            }
            Err(e) => Err(db_error("UpdateItem")(e)),
        }
    }

    async fn delete(&self, id: u64) -> Result<bool> {
        let output = self
            .client
            .delete_item()
            .table_name(&self.table)
            .key("id", Self::key(id))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(db_error("DeleteItem"))?;

        Ok(output.attributes.is_some_and(|old| !old.is_empty()))
    }
}

#[derive(Debug, Clone)]
pub struct DynamoEnquiryRepository {
    client: Client,
    table: String,
}

impl DynamoEnquiryRepository {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl EnquiryRepository for DynamoEnquiryRepository {
    async fn list(&self) -> Result<Vec<CustomerEnquiry>> {
        scan_all(&self.client, &self.table, None).await
    }

    async fn put(&self, enquiry: &CustomerEnquiry) -> Result<()> {
        put(&self.client, &self.table, enquiry).await
    }
}

#[derive(Debug, Clone)]
pub struct DynamoUserRepository {
    client: Client,
    table: String,
}

impl DynamoUserRepository {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl UserRepository for DynamoUserRepository {
    async fn find(&self, username: &str) -> Result<Option<AdminUser>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("username", AttributeValue::S(username.to_string()))
            .send()
            .await
            .map_err(db_error("GetItem"))?;

        Ok(output.item.map(from_item).transpose()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::config::retry::RetryConfig;
    use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
    use httpmock::prelude::*;

    const PRODUCTS_TABLE: &str = "product-catalogue";
    const AMZ_JSON: &str = "application/x-amz-json-1.0";

    fn mock_client(server: &MockServer) -> Client {
        let config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("ap-south-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .endpoint_url(server.base_url())
            .retry_config(RetryConfig::disabled())
            .build();
        Client::from_conf(config)
    }

    fn ids(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("p-{}", i)).collect()
    }

    #[tokio::test]
    async fn test_delete_many_writes_batches_of_25() {
        let server = MockServer::start();
        let first_batch = server.mock(|when, then| {
            when.method(POST)
                .header("x-amz-target", "DynamoDB_20120810.BatchWriteItem")
                .body_contains("\"p-0\"")
                .body_contains("\"p-24\"");
            then.status(200)
                .header("Content-Type", AMZ_JSON)
                .body(r#"{"UnprocessedItems":{}}"#);
        });
        let second_batch = server.mock(|when, then| {
            when.method(POST)
                .header("x-amz-target", "DynamoDB_20120810.BatchWriteItem")
                .body_contains("\"p-25\"")
                .body_contains("\"p-29\"");
            then.status(200)
                .header("Content-Type", AMZ_JSON)
                .body(r#"{"UnprocessedItems":{}}"#);
        });

        let repository = DynamoProductRepository::new(mock_client(&server), PRODUCTS_TABLE);
        repository.delete_many(&ids(30)).await.unwrap();

        // p-24 and p-25 land in different requests, so the split is 25 + 5.
        first_batch.assert_hits(1);
        second_batch.assert_hits(1);
    }

    #[tokio::test]
    async fn test_unprocessed_items_fail_after_three_attempts() {
        let server = MockServer::start();
        let unprocessed = server.mock(|when, then| {
            when.method(POST)
                .header("x-amz-target", "DynamoDB_20120810.BatchWriteItem");
            then.status(200).header("Content-Type", AMZ_JSON).body(
                r#"{"UnprocessedItems":{"product-catalogue":[{"DeleteRequest":{"Key":{"id":{"S":"p-0"}}}}]}}"#,
            );
        });

        let repository = DynamoProductRepository::new(mock_client(&server), PRODUCTS_TABLE);
        let result = repository.delete_many(&ids(1)).await;

        assert!(matches!(
            result,
            Err(CatalogueError::DatabaseError { operation: "BatchWriteItem", .. })
        ));
        unprocessed.assert_hits(3);
    }

    #[tokio::test]
    async fn test_unprocessed_items_are_resubmitted() {
        let server = MockServer::start();
        let retry = server.mock(|when, then| {
            when.method(POST)
                .header("x-amz-target", "DynamoDB_20120810.BatchWriteItem")
                .body_contains("\"p-1\"");
            then.status(200).header("Content-Type", AMZ_JSON).body(
                r#"{"UnprocessedItems":{"product-catalogue":[{"DeleteRequest":{"Key":{"id":{"S":"p-0"}}}}]}}"#,
            );
        });
        let resubmitted = server.mock(|when, then| {
            when.method(POST)
                .header("x-amz-target", "DynamoDB_20120810.BatchWriteItem")
                .body_contains("\"p-0\"");
            then.status(200)
                .header("Content-Type", AMZ_JSON)
                .body(r#"{"UnprocessedItems":{}}"#);
        });

        let repository = DynamoProductRepository::new(mock_client(&server), PRODUCTS_TABLE);
        repository.delete_many(&ids(2)).await.unwrap();

        retry.assert_hits(1);
        resubmitted.assert_hits(1);
    }

    #[tokio::test]
    async fn test_set_category_updates_every_product() {
        let server = MockServer::start();
        let update = server.mock(|when, then| {
            when.method(POST)
                .header("x-amz-target", "DynamoDB_20120810.UpdateItem")
                .body_contains("\"lamps-diyas\"");
            then.status(200).header("Content-Type", AMZ_JSON).body("{}");
        });

        let repository = DynamoProductRepository::new(mock_client(&server), PRODUCTS_TABLE);
        repository.set_category(&ids(12), "lamps-diyas").await.unwrap();

        update.assert_hits(12);
    }

    #[test]
    fn test_reads_rows_with_numeric_legacy_fields() {
        let testimonial: Item = HashMap::from([
            ("id".to_string(), AttributeValue::N("7".to_string())),
            ("product".to_string(), AttributeValue::S("Diya".to_string())),
            ("comments".to_string(), AttributeValue::S("Lovely".to_string())),
            ("rating".to_string(), AttributeValue::N("4.5".to_string())),
            (
                "updatedAt".to_string(),
                AttributeValue::S("2024-03-01T10:00:00Z".to_string()),
            ),
        ]);
        let testimonial: Testimonial = from_item(testimonial).unwrap();
        assert_eq!(testimonial.id, 7);
        assert_eq!(testimonial.rating, 4.5);

        let enquiry: Item = HashMap::from([
            ("id".to_string(), AttributeValue::S("e-1".to_string())),
            ("name".to_string(), AttributeValue::S("Ravi".to_string())),
            ("phone".to_string(), AttributeValue::N("9876543210".to_string())),
            ("query".to_string(), AttributeValue::S("Price?".to_string())),
            (
                "date".to_string(),
                AttributeValue::S("2024-03-01T10:00:00Z".to_string()),
            ),
        ]);
        let enquiry: CustomerEnquiry = from_item(enquiry).unwrap();
        assert_eq!(enquiry.phone, "9876543210");
        assert_eq!(enquiry.email, "");
    }

    #[test]
    fn test_testimonial_update_sets_only_supplied_fields() {
        let patch = TestimonialPatch {
            product_id: Some("p-9".to_string()),
            rating: Some(4.5),
            ..Default::default()
        };

        let (expression, values, names) = testimonial_update(&patch).unwrap();

        assert_eq!(
            expression,
            "SET #productId = :productId, #rating = :rating, #updatedAt = :updatedAt"
        );
        assert_eq!(names.get("#productId").map(String::as_str), Some("product-id"));
        assert_eq!(values.get(":rating"), Some(&AttributeValue::N("4.5".to_string())));
        assert!(values.contains_key(":updatedAt"));
        assert!(!names.contains_key("#comments"));
    }

    #[test]
    fn test_product_item_layout() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": "p-1",
            "name": "Diya",
            "variants": [{ "size": "6", "price": 450 }],
            "category": "lamps"
        }))
        .unwrap();

        let item: Item = to_item(&product).unwrap();
        assert_eq!(item.get("id"), Some(&AttributeValue::S("p-1".to_string())));
        assert!(matches!(item.get("variants"), Some(AttributeValue::L(v)) if v.len() == 1));
        assert!(!item.contains_key("createdAt"));

        let back: Product = from_item(item).unwrap();
        assert_eq!(back, product);
    }

    #[test]
    fn test_testimonial_key_is_numeric() {
        assert_eq!(
            DynamoTestimonialRepository::key(12),
            AttributeValue::N("12".to_string())
        );
    }
}
