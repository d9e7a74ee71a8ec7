// Page scraping: fetch a job posting over HTTP and reduce it to plain text
// suitable for the extraction prompt.

pub mod fetcher;
pub mod normalizer;
