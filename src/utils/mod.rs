pub mod content_type;
pub mod error;
pub mod logger;
pub mod validation;
