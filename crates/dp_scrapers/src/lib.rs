pub mod huggingface;

pub use huggingface::HfPapersScraper;
