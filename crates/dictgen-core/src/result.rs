//! Result type alias for dictionary generation

use crate::error::DictgenError;

/// Standard Result type for dictionary generation
pub type Result<T> = std::result::Result<T, DictgenError>;
