use crate::config::ConfigError;
use dom::DomError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KeyboardError>;

#[derive(Error, Debug)]
pub enum KeyboardError {
    /// A document operation on the container or a bound input failed.
    #[error("document error: {0}")]
    Dom(#[from] DomError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
