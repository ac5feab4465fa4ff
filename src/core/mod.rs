pub mod client;
pub mod request;
pub mod signature;

pub use crate::domain::model::{AssemblyParams, AssemblyResponse, SignedParams, UploadFile};
pub use crate::domain::ports::{ConfigProvider, Storage};
pub use crate::utils::error::Result;
