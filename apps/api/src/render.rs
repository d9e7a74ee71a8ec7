//! HTML rendering for the single-page UI.
//!
//! The page is small enough that plain `format!` templates do the job; every
//! user- or model-supplied string goes through `escape_html`.

use crate::config::PageConfig;
use crate::pipeline::PipelineOutcome;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 1100px; padding: 2rem; color: #1f2328; }
h1 { margin-bottom: 0.25rem; }
.tagline { color: #59636e; margin-top: 0; }
form { display: flex; gap: 0.75rem; align-items: end; }
form label { flex: 4; display: flex; flex-direction: column; gap: 0.35rem; }
input[type=url], input[type=text] { padding: 0.6rem; font-size: 1rem; border: 1px solid #d1d9e0; border-radius: 6px; }
button { flex: 1; padding: 0.65rem; font-size: 1rem; border: 0; border-radius: 6px; background: #1f6feb; color: #fff; cursor: pointer; }
button:disabled { background: #8c959f; }
hr { border: 0; border-top: 1px solid #d1d9e0; margin: 1.5rem 0; }
.spinner { display: none; color: #59636e; }
.spinner.active { display: block; }
.success { background: #dafbe1; border: 1px solid #4ac26b; padding: 0.6rem; border-radius: 6px; }
.error { background: #ffebe9; border: 1px solid #ff8182; padding: 0.6rem; border-radius: 6px; }
pre.email { background: #f6f8fa; padding: 1rem; border-radius: 6px; white-space: pre-wrap; }
"#;

const SUBMIT_SCRIPT: &str = r#"
document.getElementById('job-form').addEventListener('submit', function () {
  document.getElementById('submit').disabled = true;
  document.getElementById('spinner').classList.add('active');
});
"#;

/// Escapes text for use in HTML element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders the form, and the results of a submission when there is one.
pub fn render_page(page: &PageConfig, job_url: &str, outcome: Option<&PipelineOutcome>) -> String {
    let results = outcome.map(render_outcome).unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<h1>{heading}</h1>
<p class="tagline">{tagline}</p>
<h3>Enter Job Posting URL</h3>
<form id="job-form" method="post" action="/generate">
  <label>Enter the URL of the job posting:
    <input type="text" name="job_url" value="{job_url}" placeholder="https://example.com/job-posting">
  </label>
  <button id="submit" type="submit">Generate Email</button>
</form>
<p id="spinner" class="spinner">Fetching job details...</p>
<hr>
<section id="results">
{results}</section>
<script>{SUBMIT_SCRIPT}</script>
</body>
</html>
"#,
        title = escape_html(&page.title),
        heading = escape_html(&page.heading),
        tagline = escape_html(&page.tagline),
        job_url = escape_html(job_url),
    )
}

fn render_outcome(outcome: &PipelineOutcome) -> String {
    let mut html = String::new();

    for email in &outcome.emails {
        let heading = email
            .role
            .as_deref()
            .map(|role| format!("Email generated for {}", escape_html(role)))
            .unwrap_or_else(|| "Email generated successfully!".to_string());
        html.push_str(&format!(
            "<div class=\"result\">\n<p class=\"success\">{heading}</p>\n<pre class=\"email\"><code>{}</code></pre>\n</div>\n",
            escape_html(&email.body)
        ));
    }

    if let Some(error) = &outcome.error {
        html.push_str(&format!(
            "<p class=\"error\">An error occurred: {}</p>\n",
            escape_html(&error.user_message())
        ));
    }

    html
}
