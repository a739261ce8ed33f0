pub mod entities;
pub mod errors;
pub mod ports;
pub mod text_splitter;

pub use entities::*;
pub use errors::{DomainError, Result};
pub use text_splitter::TextSplitter;
