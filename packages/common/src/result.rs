use crate::error::LessError;

/// Common Result type alias
pub type LessResult<T> = Result<T, LessError>;
