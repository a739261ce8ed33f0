mod extractor;

pub use extractor::PdfExtractor;
