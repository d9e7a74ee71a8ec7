// Job extraction: turns cleaned posting text into structured job records via the LLM.

pub mod extractor;
pub mod prompts;

pub use extractor::{ExtractedJob, JobExtractor, LlmJobExtractor};
