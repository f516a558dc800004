//! # サムネイル生成フック
//!
//! ギャラリー画像の登録後に非同期で呼ばれるフック。
//! 画像の変換そのものは画像配信 CDN に任せ、ここでは変換済み URL を組み立てるだけ。

use async_trait::async_trait;

use crate::error::InfraError;

/// サムネイルの一辺のピクセル数
pub const THUMBNAIL_SIZE: u32 = 300;

/// サムネイル生成フックトレイト
#[async_trait]
pub trait ThumbnailHook: Send + Sync {
    fn name(&self) -> &'static str;

    /// 元画像の URL からサムネイル URL を生成する
    ///
    /// 生成できない（対象外の URL、無効化されている）場合は `Ok(None)`。
    async fn generate(&self, image_url: &str) -> Result<Option<String>, InfraError>;
}

/// 何もしないフック
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledThumbnailHook;

#[async_trait]
impl ThumbnailHook for DisabledThumbnailHook {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn generate(&self, _image_url: &str) -> Result<Option<String>, InfraError> {
        Ok(None)
    }
}

/// CDN の URL 変換でサムネイルを得るフック
///
/// Cloudinary 形式の配信 URL（`.../upload/...`）の `upload/` 直後に
/// 正方形クロップの変換パラメータを挿入する。
#[derive(Debug, Clone, Copy, Default)]
pub struct CdnThumbnailHook;

const UPLOAD_SEGMENT: &str = "/upload/";

impl CdnThumbnailHook {
    fn transform(image_url: &str) -> Option<String> {
        let index = image_url.find(UPLOAD_SEGMENT)? + UPLOAD_SEGMENT.len();
        let (head, tail) = image_url.split_at(index);
        if tail.is_empty() || tail.starts_with("c_fill") {
            return None;
        }
        Some(format!(
            "{head}c_fill,w_{THUMBNAIL_SIZE},h_{THUMBNAIL_SIZE},q_auto,f_auto/{tail}"
        ))
    }
}

#[async_trait]
impl ThumbnailHook for CdnThumbnailHook {
    fn name(&self) -> &'static str {
        "cdn"
    }

    async fn generate(&self, image_url: &str) -> Result<Option<String>, InfraError> {
        Ok(Self::transform(image_url))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(
        "https://res.cloudinary.com/salon/image/upload/v17/gallery/nails.jpg",
        Some("https://res.cloudinary.com/salon/image/upload/c_fill,w_300,h_300,q_auto,f_auto/v17/gallery/nails.jpg")
    )]
    #[case("https://images.example.com/gallery/nails.jpg", None)]
    #[case("https://res.cloudinary.com/salon/image/upload/", None)]
    #[case(
        "https://res.cloudinary.com/salon/image/upload/c_fill,w_300,h_300/v17/nails.jpg",
        None
    )]
    fn test_cdn変換urlを組み立てる(#[case] url: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            CdnThumbnailHook::transform(url),
            expected.map(str::to_string)
        );
    }

    #[tokio::test]
    async fn 無効化フックは何も生成しない() {
        let result = DisabledThumbnailHook
            .generate("https://res.cloudinary.com/salon/image/upload/v1/a.jpg")
            .await
            .unwrap();

        assert_eq!(result, None);
    }
}
