//! Browser-facing HTTP surface: home page, session creation, session page,
//! and the rendered error pages.

pub mod error;
pub mod handlers;
pub mod views;

pub use error::ApiError;
pub use views::Views;
