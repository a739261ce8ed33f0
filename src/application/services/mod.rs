mod document;
mod qa;
pub mod rag;

pub use document::{DocumentService, UploadedPdf};
pub use qa::{PromptTemplate, QaService, DEFAULT_QA_TEMPLATE, NO_ANSWER};
pub use rag::{RagService, DEFAULT_TOP_K};
