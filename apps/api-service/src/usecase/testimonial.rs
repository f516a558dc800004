//! お客様の声のユースケース
//!
//! 公開フォームからの投稿は常に未承認で保存し、一覧・詳細には
//! 承認済みのものだけを出す。

use std::sync::Arc;

use nailbook_domain::{
    clock::Clock,
    service::ServiceCategory,
    testimonial::{NewTestimonial, Rating, Testimonial, TestimonialFilter, TestimonialId},
    value_objects::PersonName,
};
use nailbook_infra::repository::TestimonialRepository;
use nailbook_shared::{event_log::event, log_business_event};

use super::FieldErrors;
use crate::error::ApiError;

/// 投稿の入力
#[derive(Debug, Clone)]
pub struct CreateTestimonialInput {
    pub client_name:      String,
    pub client_photo:     Option<String>,
    pub service_category: ServiceCategory,
    pub rating:           i64,
    pub review_text:      String,
}

pub struct TestimonialUseCaseImpl {
    testimonials: Arc<dyn TestimonialRepository>,
    clock:        Arc<dyn Clock>,
}

impl TestimonialUseCaseImpl {
    pub fn new(testimonials: Arc<dyn TestimonialRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            testimonials,
            clock,
        }
    }

    pub async fn list(&self, filter: &TestimonialFilter) -> Result<Vec<Testimonial>, ApiError> {
        Ok(self.testimonials.find_approved(filter).await?)
    }

    pub async fn get(&self, id: TestimonialId) -> Result<Testimonial, ApiError> {
        self.testimonials
            .find_approved_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Testimonial", id))
    }

    /// 投稿を未承認で保存する
    pub async fn create(&self, input: CreateTestimonialInput) -> Result<Testimonial, ApiError> {
        let mut errors = FieldErrors::default();

        let client_name = errors.check("client_name", PersonName::new(input.client_name));
        let rating = errors.check("rating", Rating::new(input.rating));
        let review_text = input.review_text.trim().to_string();
        if review_text.is_empty() {
            errors.reject("review_text", "This field may not be blank.");
        }

        let (Some(client_name), Some(rating)) = (client_name, rating) else {
            return Err(errors.into_error().into());
        };
        if !errors.is_empty() {
            return Err(errors.into_error().into());
        }

        let testimonial = self
            .testimonials
            .insert(
                &NewTestimonial {
                    client_name,
                    client_photo: input.client_photo.filter(|p| !p.trim().is_empty()),
                    service_category: input.service_category,
                    rating,
                    review_text,
                },
                self.clock.now(),
            )
            .await?;

        log_business_event!(
            event.category = event::category::TESTIMONIAL,
            event.action = event::action::TESTIMONIAL_SUBMITTED,
            event.entity_type = event::entity_type::TESTIMONIAL,
            event.entity_id = %testimonial.id,
            event.result = event::result::SUCCESS,
            testimonial.rating = testimonial.rating.value(),
            "お客様の声を受け付けました（承認待ち）"
        );

        Ok(testimonial)
    }
}

#[cfg(test)]
mod tests {
    use nailbook_infra::mock::MockTestimonialRepository;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::usecase::test_support::{clock, now};

    fn approved(id: i64, rating: i64, is_featured: bool) -> Testimonial {
        Testimonial {
            id: TestimonialId::new(id),
            client_name: PersonName::new("Ada").unwrap(),
            client_photo: None,
            service_category: ServiceCategory::Lashes,
            rating: Rating::new(rating).unwrap(),
            review_text: "Lovely lashes".to_string(),
            is_featured,
            is_approved: true,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn input(rating: i64) -> CreateTestimonialInput {
        CreateTestimonialInput {
            client_name:      "Grace".to_string(),
            client_photo:     None,
            service_category: ServiceCategory::Nails,
            rating,
            review_text:      "Best manicure in town".to_string(),
        }
    }

    #[tokio::test]
    async fn test_投稿は未承認で保存され詳細には出ない() {
        let repo = MockTestimonialRepository::new();
        let sut = TestimonialUseCaseImpl::new(Arc::new(repo.clone()), clock());

        let created = sut.create(input(5)).await.unwrap();

        assert!(!created.is_approved);
        assert!(!created.is_featured);
        assert_eq!(repo.stored().len(), 1);
        assert!(matches!(sut.get(created.id).await, Err(ApiError::NotFound(_))));
        assert!(sut.list(&TestimonialFilter::default()).await.unwrap().is_empty());
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[tokio::test]
    async fn test_範囲外の評価は400(#[case] rating: i64) {
        let sut = TestimonialUseCaseImpl::new(Arc::new(MockTestimonialRepository::new()), clock());

        let error = sut.create(input(rating)).await.unwrap_err();

        assert!(matches!(error, ApiError::Validation(p) if p[0].name == "rating"));
    }

    #[tokio::test]
    async fn test_承認済みを注目と評価の順に並べる() {
        let repo = MockTestimonialRepository::new();
        repo.add_testimonial(approved(1, 5, false));
        repo.add_testimonial(approved(2, 3, true));
        repo.add_testimonial(approved(3, 4, false));
        let sut = TestimonialUseCaseImpl::new(Arc::new(repo), clock());

        let ids: Vec<_> = sut
            .list(&TestimonialFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id.as_i64())
            .collect();

        assert_eq!(ids, vec![2, 1, 3]);
    }
}
