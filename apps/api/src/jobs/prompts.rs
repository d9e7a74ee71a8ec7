// Prompt constants for job extraction.

/// System prompt for extraction: JSON only.
pub const EXTRACT_JOBS_SYSTEM: &str = "You are an expert recruiter who reads scraped career pages. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON. \
    Do NOT use markdown code fences.";

/// Extraction prompt template. Replace `{page_text}` before sending.
pub const EXTRACT_JOBS_PROMPT_TEMPLATE: &str = r#"The text below was scraped from the careers page of a website.
Find every job posting in it and return them as a JSON ARRAY with this schema:
[
  {
    "role": "Senior Data Engineer",
    "experience": "3+ years",
    "skills": ["Python", "SQL", "Airflow"],
    "description": "Two or three sentences summarising the responsibilities."
  }
]

Rules:
1. One object per distinct job posting, in the order they appear on the page.
2. `skills` is a list of short skill or technology names. Use [] if none are stated.
3. Leave out navigation, cookie banners, and unrelated marketing copy.
4. If the page contains no job posting, return [].

SCRAPED TEXT:
{page_text}"#;
