pub mod error;
pub mod resource;
pub mod result;
pub mod span;

pub use error::*;
pub use resource::*;
pub use result::*;
pub use span::*;
