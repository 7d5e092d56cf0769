use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::ProductNotFound | Self::CategoryNotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists | Self::GestureInProgress => StatusCode::CONFLICT,
            Self::ValidationFailed | Self::ProductInvalidPrice => StatusCode::BAD_REQUEST,
            // 503: 客户端可以稍后重试
            Self::CatalogNotLoaded | Self::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
