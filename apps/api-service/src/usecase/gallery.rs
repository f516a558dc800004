//! ギャラリー画像のユースケース
//!
//! 登録後のサムネイル生成はバックグラウンドランナーで行い、
//! 登録リクエストはその完了を待たない。

use std::sync::Arc;

use nailbook_domain::{
    clock::Clock,
    gallery::{
        GalleryCategory,
        GalleryFilter,
        GalleryImage,
        GalleryImageId,
        GalleryTitle,
        NewGalleryImage,
    },
};
use nailbook_infra::{repository::GalleryImageRepository, thumbnail::ThumbnailHook};
use nailbook_shared::{
    event_log::{error as error_field, event},
    log_business_event,
};

use super::FieldErrors;
use crate::{error::ApiError, runner::BackgroundRunner};

/// 画像登録の入力
#[derive(Debug, Clone)]
pub struct RegisterGalleryImageInput {
    pub title:            String,
    pub description:      String,
    pub category:         GalleryCategory,
    pub image:            String,
    pub comparison_image: Option<String>,
    pub is_featured:      bool,
    pub sort_order:       i32,
}

pub struct GalleryUseCaseImpl {
    images:     Arc<dyn GalleryImageRepository>,
    thumbnails: Arc<dyn ThumbnailHook>,
    runner:     BackgroundRunner,
    clock:      Arc<dyn Clock>,
}

impl GalleryUseCaseImpl {
    pub fn new(
        images: Arc<dyn GalleryImageRepository>,
        thumbnails: Arc<dyn ThumbnailHook>,
        runner: BackgroundRunner,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            images,
            thumbnails,
            runner,
            clock,
        }
    }

    pub async fn list(&self, filter: &GalleryFilter) -> Result<Vec<GalleryImage>, ApiError> {
        Ok(self.images.find_active(filter).await?)
    }

    pub async fn get(&self, id: GalleryImageId) -> Result<GalleryImage, ApiError> {
        self.images
            .find_active_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("GalleryImage", id))
    }

    /// 画像を登録し、サムネイル生成をスケジュールする
    pub async fn register(&self, input: RegisterGalleryImageInput) -> Result<GalleryImage, ApiError> {
        let mut errors = FieldErrors::default();
        let title = errors.check("title", GalleryTitle::new(input.title));
        let image_url = input.image.trim().to_string();
        if image_url.is_empty() {
            errors.reject("image", "No image was submitted.");
        }
        let Some(title) = title else {
            return Err(errors.into_error().into());
        };
        if !errors.is_empty() {
            return Err(errors.into_error().into());
        }

        let image = self
            .images
            .insert(
                &NewGalleryImage {
                    title,
                    description: input.description.trim().to_string(),
                    category: input.category,
                    image: image_url,
                    comparison_image: input.comparison_image.filter(|c| !c.trim().is_empty()),
                    is_featured: input.is_featured,
                    sort_order: input.sort_order,
                },
                self.clock.now(),
            )
            .await?;

        log_business_event!(
            event.category = event::category::GALLERY,
            event.action = event::action::GALLERY_IMAGE_REGISTERED,
            event.entity_type = event::entity_type::GALLERY_IMAGE,
            event.entity_id = %image.id,
            event.result = event::result::SUCCESS,
            "ギャラリー画像を登録しました"
        );

        self.runner.schedule(
            "thumbnail",
            generate_thumbnail(
                self.images.clone(),
                self.thumbnails.clone(),
                self.clock.clone(),
                image.id,
                image.image.clone(),
            ),
        );

        Ok(image)
    }
}

/// サムネイルを生成して保存する（バックグラウンドジョブ本体）
async fn generate_thumbnail(
    images: Arc<dyn GalleryImageRepository>,
    hook: Arc<dyn ThumbnailHook>,
    clock: Arc<dyn Clock>,
    id: GalleryImageId,
    image_url: String,
) {
    let thumbnail = match hook.generate(&image_url).await {
        Ok(Some(thumbnail)) => thumbnail,
        Ok(None) => {
            tracing::debug!(
                event.entity_id = %id,
                thumbnail.hook = hook.name(),
                "サムネイルは生成しません"
            );
            return;
        }
        Err(e) => {
            tracing::error!(
                error.category = error_field::category::BACKGROUND,
                error.kind = error_field::kind::INTERNAL,
                event.entity_id = %id,
                thumbnail.hook = hook.name(),
                "サムネイル生成に失敗: {e}"
            );
            return;
        }
    };

    match images.set_thumbnail(id, &thumbnail, clock.now()).await {
        Ok(true) => log_business_event!(
            event.category = event::category::GALLERY,
            event.action = event::action::THUMBNAIL_GENERATED,
            event.entity_type = event::entity_type::GALLERY_IMAGE,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            thumbnail.hook = hook.name(),
            "サムネイルを保存しました"
        ),
        Ok(false) => tracing::warn!(
            event.entity_id = %id,
            "サムネイル保存対象の画像が見つかりません"
        ),
        Err(e) => tracing::error!(
            error.category = error_field::category::INFRASTRUCTURE,
            error.kind = error_field::kind::DATABASE,
            event.entity_id = %id,
            "サムネイルの保存に失敗: {e}"
        ),
    }
}
