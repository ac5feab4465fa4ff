pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{LocalStorage, TomlConfig};

pub use crate::core::{client::TransloaditClient, request::AssemblyRequest};
pub use domain::model::{AssemblyResponse, SignedParams, UploadFile, UploadProgress};
pub use utils::error::{Result, TransloaditError};
