//! Admin product form: `multipart/form-data` with bracketed field names, or plain JSON.
//!
//! Multipart fields:
//! - `name`, `desc`
//! - `category` or `category[0]`
//! - `variants[i][size|measurement|price|discountedPrice]`, or `variants` as a JSON string
//! - `notes[i]`, or `notes` as a JSON string or a single note
//! - `existingImages` as a JSON array of URLs, or `existingImages[i]`
//! - `images`: files

use super::envelope::ApiError;
use super::state::AppState;
use crate::domain::model::{ProductInput, UploadedImage};
use crate::utils::error::CatalogueError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static INDEXED_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)\[(\d+)\](?:\[(\w+)\])?$").expect("indexed field pattern compiles")
});

#[derive(Debug)]
pub struct ProductSubmission {
    pub input: ProductInput,
    pub images: Vec<UploadedImage>,
}

impl FromRequest<AppState> for ProductSubmission {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| CatalogueError::validation(e.body_text()))?;
            return Ok(read_multipart(multipart).await?);
        }

        let Json(input) = Json::<ProductInput>::from_request(req, state)
            .await
            .map_err(|e| CatalogueError::validation(e.body_text()))?;
        Ok(Self {
            input,
            images: Vec::new(),
        })
    }
}

async fn read_multipart(mut multipart: Multipart) -> crate::Result<ProductSubmission> {
    let mut fields = FormFields::default();
    let mut images = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CatalogueError::validation(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(filename) = field.file_name().map(str::to_string) {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| CatalogueError::validation(e.body_text()))?;
            if !bytes.is_empty() {
                images.push(UploadedImage {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| CatalogueError::validation(e.body_text()))?;
        fields.insert(&name, value);
    }

    let input = serde_json::from_value(fields.into_json()?)
        .map_err(|e| CatalogueError::validation(format!("Invalid product form: {}", e)))?;
    Ok(ProductSubmission { input, images })
}

/// Text fields collected from the form, grouped by their bracketed indexes.
#[derive(Debug, Default)]
struct FormFields {
    plain: Map<String, Value>,
    lists: BTreeMap<String, BTreeMap<usize, String>>,
    objects: BTreeMap<String, BTreeMap<usize, Map<String, Value>>>,
}

impl FormFields {
    fn insert(&mut self, name: &str, value: String) {
        match INDEXED_FIELD.captures(name) {
            Some(caps) => {
                let base = caps[1].to_string();
                let index: usize = caps[2].parse().unwrap_or_default();
                match caps.get(3) {
                    Some(key) => {
                        self.objects
                            .entry(base)
                            .or_default()
                            .entry(index)
                            .or_default()
                            .insert(key.as_str().to_string(), Value::String(value));
                    }
                    None => {
                        self.lists.entry(base).or_default().insert(index, value);
                    }
                }
            }
            None => {
                self.plain.insert(name.to_string(), Value::String(value));
            }
        }
    }

    fn into_json(mut self) -> crate::Result<Value> {
        let mut out = Map::new();

        for key in ["name", "desc"] {
            if let Some(value) = self.plain.remove(key) {
                out.insert(key.to_string(), value);
            }
        }

        // A product has one category; older forms posted it as a list.
        let category = self
            .plain
            .remove("category")
            .or_else(|| {
                self.lists
                    .remove("category")
                    .and_then(|list| list.into_values().next())
                    .map(Value::String)
            });
        if let Some(category) = category {
            out.insert("category".to_string(), category);
        }

        let variants = match self.objects.remove("variants") {
            Some(rows) => Some(Value::Array(rows.into_values().map(Value::Object).collect())),
            None => self
                .plain
                .remove("variants")
                .map(|raw| json_field("variants", raw))
                .transpose()?,
        };
        if let Some(variants) = variants {
            out.insert("variants".to_string(), variants);
        }

        let notes = match self.lists.remove("notes") {
            Some(list) => Some(string_list(list)),
            None => self.plain.remove("notes").map(|raw| match raw {
                Value::String(text) if text.trim_start().starts_with('[') => {
                    serde_json::from_str(&text).unwrap_or(Value::Array(vec![Value::String(text)]))
                }
                Value::String(text) if text.trim().is_empty() => Value::Array(Vec::new()),
                other => Value::Array(vec![other]),
            }),
        };
        if let Some(notes) = notes {
            out.insert("notes".to_string(), notes);
        }

        let existing_images = match self.lists.remove("existingImages") {
            Some(list) => Some(string_list(list)),
            None => self
                .plain
                .remove("existingImages")
                .map(|raw| json_field("existingImages", raw))
                .transpose()?,
        };
        if let Some(existing_images) = existing_images {
            out.insert("existingImages".to_string(), existing_images);
        }

        Ok(Value::Object(out))
    }
}

fn string_list(list: BTreeMap<usize, String>) -> Value {
    Value::Array(list.into_values().map(Value::String).collect())
}

fn json_field(field: &str, raw: Value) -> crate::Result<Value> {
    match raw {
        Value::String(text) => serde_json::from_str(&text)
            .map_err(|e| CatalogueError::validation(format!("Invalid JSON in {}: {}", field, e))),
        other => Ok(other),
    }
}
