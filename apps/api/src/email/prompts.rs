// Prompt constants for cold email generation.

/// System prompt for the email writer.
pub const WRITE_MAIL_SYSTEM: &str = "You write concise, specific cold outreach emails \
    in response to job postings. You never invent facts about the sender's company \
    beyond what you are given.";

/// Email prompt template.
/// Replace: {job_json}, {sender_name}, {sender_role}, {sender_company},
///          {sender_pitch}, {links}, {no_preamble}
pub const WRITE_MAIL_PROMPT_TEMPLATE: &str = r#"JOB POSTING:
{job_json}

You are {sender_name}, {sender_role} at {sender_company}, {sender_pitch}.

Write a cold email to the client about the job described above, explaining how
{sender_company} can fulfil their needs. Keep it under 200 words, address the
hiring team, and close with {sender_name}'s signature.

Where they are relevant to the job, cite these portfolio samples to show past work:
{links}

{no_preamble}"#;

/// Used in place of the link list when nothing in the portfolio matched.
pub const NO_LINKS_PLACEHOLDER: &str =
    "(no matching portfolio samples; do not mention a portfolio)";
