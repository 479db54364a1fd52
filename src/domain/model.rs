use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default, deserialize_with = "first_category")]
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A purchasable size of a product.
///
/// Forms post every value as text, so numeric fields accept either
/// JSON numbers or numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "text_or_number"
    )]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "number_or_text"
    )]
    pub price: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "number_or_text"
    )]
    pub discounted_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub path: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: u64,
    #[serde(default)]
    pub category: String,
    pub product: String,
    #[serde(rename = "product-id", default)]
    pub product_id: String,
    pub comments: String,
    pub rating: f64,
    #[serde(default)]
    pub customer_name: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerEnquiry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    // Older rows stored the phone as a number.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub phone: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    pub date: DateTime<Utc>,
}

/// Row of the `app-config` table.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminUser {
    pub username: String,
    #[serde(rename = "password")]
    pub password_hash: String,
}

/// Product fields as submitted by the admin form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub category: String,
    /// URLs of the current images the admin chose to keep.
    #[serde(default)]
    pub existing_images: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialInput {
    pub category: Option<String>,
    pub product: Option<String>,
    #[serde(rename = "product-id")]
    pub product_id: Option<String>,
    pub comments: Option<String>,
    pub rating: Option<f64>,
    pub customer_name: Option<String>,
}

impl TestimonialInput {
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.product.is_none()
            && self.product_id.is_none()
            && self.comments.is_none()
            && self.rating.is_none()
            && self.customer_name.is_none()
    }
}

/// Validated partial update of a testimonial; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestimonialPatch {
    pub category: Option<String>,
    pub product: Option<String>,
    pub product_id: Option<String>,
    pub comments: Option<String>,
    pub rating: Option<f64>,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnquiryInput {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub phone: Option<String>,
    pub query: Option<String>,
    pub product: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryChanges {
    #[serde(default)]
    pub deleted_categories: Vec<CategoryRef>,
    #[serde(default)]
    pub modified_categories: Vec<CategoryRename>,
    #[serde(default)]
    pub added_categories: Vec<NewCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRef {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRename {
    pub path: String,
    pub new_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryChangeSummary {
    pub deleted_categories: usize,
    pub deleted_products: usize,
    pub renamed_categories: usize,
    pub relabelled_products: usize,
    pub added_categories: usize,
}

/// An image received from the admin form, not yet stored.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// An image read back from storage.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Turns a category name into its URL path, e.g. `"Wall Art & Decor"` → `"wall-art-decor"`.
pub fn create_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

fn number_or_text<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<TextOrNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(TextOrNumber::Number(n)) => Ok(n.as_f64()),
        Some(TextOrNumber::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(TextOrNumber::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<TextOrNumber>::deserialize(deserializer)? {
        None => None,
        Some(TextOrNumber::Number(n)) => Some(n.to_string()),
        Some(TextOrNumber::Text(s)) if s.trim().is_empty() => None,
        Some(TextOrNumber::Text(s)) => Some(s),
    })
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    text_or_number(deserializer).map(Option::unwrap_or_default)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

// Older admin forms posted `category[0]`, which was stored as a list.
fn first_category<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => String::new(),
        Some(OneOrMany::One(category)) => category,
        Some(OneOrMany::Many(categories)) => categories.into_iter().next().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_slug() {
        assert_eq!(create_slug("Wall Art & Decor"), "wall-art-decor");
        assert_eq!(create_slug("  Brass Idols  "), "brass-idols");
        assert_eq!(create_slug("--Lamps--"), "lamps");
        assert_eq!(create_slug("Pooja Items 2024"), "pooja-items-2024");
        assert_eq!(create_slug("!!!"), "");
    }

    #[test]
    fn test_variant_accepts_numeric_strings() {
        let variant: Variant = serde_json::from_value(serde_json::json!({
            "size": 12,
            "measurement": "inch",
            "price": "1499.50",
            "discountedPrice": ""
        }))
        .unwrap();

        assert_eq!(variant.size.as_deref(), Some("12"));
        assert_eq!(variant.price, Some(1499.5));
        assert_eq!(variant.discounted_price, None);
    }

    #[test]
    fn test_variant_rejects_non_numeric_price() {
        let result: std::result::Result<Variant, _> =
            serde_json::from_value(serde_json::json!({ "price": "cheap" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_testimonial_wire_names() {
        let json = serde_json::json!({
            "id": 3,
            "category": "lamps",
            "product": "Diya",
            "product-id": "p-1",
            "comments": "Lovely",
            "rating": 4.5,
            "customerName": "Meera",
            "updatedAt": "2025-01-01T00:00:00Z"
        });
        let testimonial: Testimonial = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(testimonial.product_id, "p-1");
        assert_eq!(testimonial.rating, 4.5);
        assert_eq!(serde_json::to_value(&testimonial).unwrap(), json);
    }

    #[test]
    fn test_product_category_list_uses_first_entry() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": "p-1",
            "name": "Diya",
            "category": ["lamps", "festive"]
        }))
        .unwrap();
        assert_eq!(product.category, "lamps");
        assert!(product.images.is_empty());
    }

    #[test]
    fn test_enquiry_phone_accepts_number() {
        let input: EnquiryInput =
            serde_json::from_value(serde_json::json!({ "phone": 9876543210u64 })).unwrap();
        assert_eq!(input.phone.as_deref(), Some("9876543210"));
    }
}
