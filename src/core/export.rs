use crate::domain::model::{Product, Variant};
use crate::utils::error::{CatalogueError, Result};
use serde::Serialize;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const CSV_FILENAME: &str = "catalogue.csv";
pub const JSON_FILENAME: &str = "catalogue.json";

#[derive(Debug, Serialize)]
struct CatalogueRow<'a> {
    id: &'a str,
    name: &'a str,
    category: &'a str,
    size: Option<&'a str>,
    measurement: Option<&'a str>,
    price: Option<f64>,
    discounted_price: Option<f64>,
    images: usize,
}

/// Packs the products into a ZIP holding `catalogue.csv` (one row per variant) and `catalogue.json`.
pub fn catalogue_archive(products: &[Product]) -> Result<Vec<u8>> {
    let csv_output = catalogue_csv(products)?;
    let json_output = serde_json::to_vec_pretty(products)?;

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file(CSV_FILENAME, SimpleFileOptions::default())?;
    zip.write_all(&csv_output)?;

    zip.start_file(JSON_FILENAME, SimpleFileOptions::default())?;
    zip.write_all(&json_output)?;

    let cursor = zip.finish()?;
    let zip_data = cursor.into_inner();
    tracing::debug!(
        products = products.len(),
        bytes = zip_data.len(),
        "Built catalogue archive"
    );
    Ok(zip_data)
}

fn catalogue_csv(products: &[Product]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let no_variant = [Variant::default()];

    for product in products {
        let variants: &[Variant] = if product.variants.is_empty() {
            &no_variant
        } else {
            &product.variants
        };

        for variant in variants {
            writer.serialize(CatalogueRow {
                id: &product.id,
                name: &product.name,
                category: &product.category,
                size: variant.size.as_deref(),
                measurement: variant.measurement.as_deref(),
                price: variant.price,
                discounted_price: variant.discounted_price,
                images: product.images.len(),
            })?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| CatalogueError::IoError(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn product(id: &str, variants: Vec<Variant>) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            desc: String::new(),
            variants,
            notes: Vec::new(),
            category: "lamps".to_string(),
            images: vec!["https://bucket.s3.ap-south-1.amazonaws.com/x.png".to_string()],
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_catalogue_csv_has_row_per_variant() {
        let products = vec![
            product(
                "p1",
                vec![
                    Variant {
                        size: Some("6".to_string()),
                        measurement: Some("inch".to_string()),
                        price: Some(450.0),
                        discounted_price: Some(399.0),
                    },
                    Variant {
                        size: Some("8".to_string()),
                        measurement: Some("inch".to_string()),
                        price: Some(650.0),
                        discounted_price: None,
                    },
                ],
            ),
            product("p2", Vec::new()),
        ];

        let csv_output = String::from_utf8(catalogue_csv(&products).unwrap()).unwrap();
        let lines: Vec<&str> = csv_output.lines().collect();

        assert_eq!(lines.len(), 4); // header + 2 variants + bare product
        assert_eq!(
            lines[0],
            "id,name,category,size,measurement,price,discounted_price,images"
        );
        assert_eq!(lines[1], "p1,Product p1,lamps,6,inch,450.0,399.0,1");
        assert_eq!(lines[2], "p1,Product p1,lamps,8,inch,650.0,,1");
        assert_eq!(lines[3], "p2,Product p2,lamps,,,,,1");
    }

    #[test]
    fn test_catalogue_archive_contents() {
        let products = vec![product("p1", Vec::new())];
        let zip_data = catalogue_archive(&products).unwrap();

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        let mut file_names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        file_names.sort();
        assert_eq!(file_names, vec![CSV_FILENAME, JSON_FILENAME]);

        let mut json = String::new();
        archive
            .by_name(JSON_FILENAME)
            .unwrap()
            .read_to_string(&mut json)
            .unwrap();
        let parsed: Vec<Product> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, products);
    }
}
