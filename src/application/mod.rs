//! Application layer - Use cases and orchestration.
//!
//! Services here turn uploaded PDFs into an indexed set of chunks and answer
//! questions against that index. They depend on domain ports (traits) rather
//! than concrete implementations.

pub mod services;

pub use services::{DocumentService, PromptTemplate, QaService, RagService, UploadedPdf};
