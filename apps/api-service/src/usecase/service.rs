//! 施術メニューのユースケース（参照のみ）

use std::sync::Arc;

use nailbook_domain::service::{Service, ServiceFilter, ServiceId};
use nailbook_infra::repository::ServiceRepository;

use crate::error::ApiError;

pub struct ServiceUseCaseImpl {
    services: Arc<dyn ServiceRepository>,
}

impl ServiceUseCaseImpl {
    pub fn new(services: Arc<dyn ServiceRepository>) -> Self {
        Self { services }
    }

    /// 有効なメニューを絞り込み・並び替えて取得する
    pub async fn list(&self, filter: &ServiceFilter) -> Result<Vec<Service>, ApiError> {
        Ok(self.services.find_active(filter).await?)
    }

    /// 有効なメニューを取得する（無効なメニューは 404）
    pub async fn get(&self, id: ServiceId) -> Result<Service, ApiError> {
        self.services
            .find_by_id(id)
            .await?
            .filter(Service::is_bookable)
            .ok_or_else(|| ApiError::not_found("Service", id))
    }
}

#[cfg(test)]
mod tests {
    use nailbook_domain::service::ServiceOrdering;
    use nailbook_infra::mock::MockServiceRepository;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::usecase::test_support::gel_manicure;

    fn sut() -> ServiceUseCaseImpl {
        let services = MockServiceRepository::new();
        services.add_service(gel_manicure(1, true));
        services.add_service(gel_manicure(2, false));
        services.add_service(Service {
            name: "Acrylic Full Set".to_string(),
            ..gel_manicure(3, true)
        });
        ServiceUseCaseImpl::new(Arc::new(services))
    }

    #[tokio::test]
    async fn test_一覧は有効なメニューのみ() {
        let filter = ServiceFilter {
            ordering: ServiceOrdering::parse("name"),
            ..Default::default()
        };

        let names: Vec<_> = sut()
            .list(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();

        assert_eq!(names, vec!["Acrylic Full Set", "Gel Manicure"]);
    }

    #[tokio::test]
    async fn test_無効なメニューの詳細は404() {
        let sut = sut();

        assert!(sut.get(ServiceId::new(1)).await.is_ok());
        assert!(matches!(
            sut.get(ServiceId::new(2)).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
