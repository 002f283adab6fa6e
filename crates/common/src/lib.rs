pub mod name;
pub mod version;

pub use name::{DatasetName, NameError};
pub use version::{VersionToken, VersionTokenError};

pub type BoxError = Box<dyn std::error::Error + Sync + Send + 'static>;
pub type BoxResult<T> = Result<T, BoxError>;
