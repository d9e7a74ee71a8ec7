// Cold email generation: one outreach email per extracted job.

pub mod prompts;
pub mod writer;

pub use writer::{EmailWriter, LlmEmailWriter};
