//! Numeric error codes
//!
//! - 0xxx: general
//! - 6xxx: catalog (categories, products, ordering)
//! - 9xxx: system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code carried in every error response
///
/// Serialized as a bare `u16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    ValidationFailed = 2,
    NotFound = 3,
    AlreadyExists = 4,

    // ==================== 6xxx: Catalog ====================
    ProductNotFound = 6001,
    ProductInvalidPrice = 6002,
    CategoryNotFound = 6101,
    /// 同一时间只允许一个拖拽手势
    GestureInProgress = 6202,
    /// 初始加载或重新同步失败
    CatalogNotLoaded = 6301,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
    StoreUnavailable = 9004,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default message used when an error carries no custom text
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInvalidPrice => "Product price is invalid",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::GestureInProgress => "Another drag gesture is in progress",
            ErrorCode::CatalogNotLoaded => "Catalog is not loaded",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::StoreUnavailable => "Record store is unavailable",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A `u16` that is not a known [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            6001 => ErrorCode::ProductNotFound,
            6002 => ErrorCode::ProductInvalidPrice,
            6101 => ErrorCode::CategoryNotFound,
            6202 => ErrorCode::GestureInProgress,
            6301 => ErrorCode::CatalogNotLoaded,
            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,
            9004 => ErrorCode::StoreUnavailable,
            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}
