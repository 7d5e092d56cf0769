//! Error codes, [`AppError`] and the HTTP error body
//!
//! ```
//! use shared::error::{AppError, ApiResponse};
//!
//! let err = AppError::validation("Name must not be empty").with_detail("field", "name");
//! let body = ApiResponse::<()>::error(&err);
//! assert_eq!(body.code, Some(2));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
