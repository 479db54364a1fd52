use crate::domain::model::{Testimonial, TestimonialInput, TestimonialPatch};
use crate::domain::ports::TestimonialRepository;
use crate::utils::error::{CatalogueError, Result};
use crate::utils::validation::{require_text, validate_rating};
use chrono::Utc;
use std::sync::Arc;

#[derive(Clone)]
pub struct TestimonialService {
    testimonials: Arc<dyn TestimonialRepository>,
}

impl TestimonialService {
    pub fn new(testimonials: Arc<dyn TestimonialRepository>) -> Self {
        Self { testimonials }
    }

    pub async fn list(&self) -> Result<Vec<Testimonial>> {
        self.testimonials.list().await
    }

    /// Stores a new testimonial under the next free numeric id.
    ///
    /// Two concurrent adds can compute the same id; the loser gets a conflict
    /// instead of overwriting the winner.
    pub async fn add(&self, input: TestimonialInput) -> Result<Testimonial> {
        let product = require_text(input.product.as_deref(), "Product is required")?;
        let comments = require_text(input.comments.as_deref(), "Comments are required")?;
        let rating = input
            .rating
            .ok_or_else(|| CatalogueError::validation("Rating is required"))
            .and_then(validate_rating)?;

        let next_id = self
            .testimonials
            .list()
            .await?
            .iter()
            .map(|t| t.id)
            .max()
            .unwrap_or(0)
            + 1;

        let testimonial = Testimonial {
            id: next_id,
            category: input.category.unwrap_or_default().trim().to_string(),
            product,
            product_id: input.product_id.unwrap_or_default(),
            comments,
            rating,
            customer_name: input.customer_name.unwrap_or_default().trim().to_string(),
            updated_at: Utc::now(),
        };

        self.testimonials.insert(&testimonial).await?;
        tracing::info!(testimonial_id = testimonial.id, "✅ Testimonial added");
        Ok(testimonial)
    }

    /// Changes only the supplied fields.
    pub async fn update(&self, id: &str, input: TestimonialInput) -> Result<Testimonial> {
        let id = parse_id(id)?;
        if input.is_empty() {
            return Err(CatalogueError::validation("No fields provided to update"));
        }

        let patch = TestimonialPatch {
            rating: input.rating.map(validate_rating).transpose()?,
            category: input.category,
            product: input.product,
            product_id: input.product_id,
            comments: input.comments,
            customer_name: input.customer_name,
        };

        let updated = self
            .testimonials
            .update(id, &patch)
            .await?
            .ok_or_else(|| CatalogueError::not_found(format!("Testimonial {}", id)))?;
        tracing::info!(testimonial_id = id, "✅ Testimonial updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = parse_id(id)?;
        if !self.testimonials.delete(id).await? {
            return Err(CatalogueError::not_found(format!("Testimonial {}", id)));
        }
        tracing::info!(testimonial_id = id, "🗑️ Testimonial deleted");
        Ok(())
    }
}

fn parse_id(id: &str) -> Result<u64> {
    id.trim()
        .parse()
        .map_err(|_| CatalogueError::validation("Invalid testimonial ID"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryTestimonialRepository;

    fn service() -> TestimonialService {
        TestimonialService::new(Arc::new(MemoryTestimonialRepository::default()))
    }

    fn input(rating: f64) -> TestimonialInput {
        TestimonialInput {
            category: Some("lamps".to_string()),
            product: Some("Brass Diya".to_string()),
            product_id: Some("p-1".to_string()),
            comments: Some("Beautiful finish".to_string()),
            rating: Some(rating),
            customer_name: Some("Meera".to_string()),
        }
    }

    #[tokio::test]
    async fn test_ids_increase() {
        let service = service();
        let first = service.add(input(5.0)).await.unwrap();
        let second = service.add(input(4.0)).await.unwrap();
        service.delete(&first.id.to_string()).await.unwrap();
        let third = service.add(input(3.0)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn test_fractional_rating_accepted() {
        let service = service();

        let created = service.add(input(4.5)).await.unwrap();
        assert_eq!(created.rating, 4.5);

        let updated = service
            .update(
                &created.id.to_string(),
                TestimonialInput {
                    rating: Some(3.5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.rating, 3.5);
    }

    #[tokio::test]
    async fn test_add_validates_fields() {
        let service = service();

        for rating in [0.0, 0.5, 5.5, 6.0] {
            assert!(matches!(
                service.add(input(rating)).await,
                Err(CatalogueError::ValidationError { .. })
            ));
        }

        let mut missing_comments = input(5.0);
        missing_comments.comments = None;
        assert!(service.add(missing_comments).await.is_err());

        let mut missing_rating = input(5.0);
        missing_rating.rating = None;
        assert!(service.add(missing_rating).await.is_err());

        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_changes_only_supplied_fields() {
        let service = service();
        let created = service.add(input(5.0)).await.unwrap();

        let updated = service
            .update(
                &created.id.to_string(),
                TestimonialInput {
                    comments: Some("Even better in person".to_string()),
                    rating: Some(4.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.comments, "Even better in person");
        assert_eq!(updated.rating, 4.0);
        assert_eq!(updated.product, "Brass Diya");
        assert_eq!(updated.customer_name, "Meera");
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_errors() {
        let service = service();
        service.add(input(5.0)).await.unwrap();

        let bad_id = service.update("abc", input(5.0)).await;
        assert!(matches!(bad_id, Err(CatalogueError::ValidationError { .. })));

        let empty = service.update("1", TestimonialInput::default()).await;
        assert!(matches!(empty, Err(CatalogueError::ValidationError { .. })));

        let bad_rating = service.update("1", input(9.0)).await;
        assert!(matches!(bad_rating, Err(CatalogueError::ValidationError { .. })));

        let missing = service.update("42", input(5.0)).await;
        assert!(matches!(missing, Err(CatalogueError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let service = service();
        assert!(matches!(
            service.delete("7").await,
            Err(CatalogueError::NotFound { .. })
        ));
        assert!(matches!(
            service.delete("seven").await,
            Err(CatalogueError::ValidationError { .. })
        ));
    }
}
