//! Question answering over uploaded PDFs.
//!
//! The `api` binary accepts uploads and questions and queues them on Redis; the
//! `worker` binary indexes extracted text into Qdrant and answers questions with
//! an OpenAI chat model grounded in the retrieved chunks.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod test_support;
