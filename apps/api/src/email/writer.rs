//! Email writer: drafts a cold email for one job using the matched portfolio links.

use async_trait::async_trait;
use tracing::debug;

use crate::config::SenderProfile;
use crate::email::prompts::{NO_LINKS_PLACEHOLDER, WRITE_MAIL_PROMPT_TEMPLATE, WRITE_MAIL_SYSTEM};
use crate::errors::AppError;
use crate::jobs::ExtractedJob;
use crate::llm_client::prompts::NO_PREAMBLE_INSTRUCTION;
use crate::llm_client::LlmClient;
use crate::portfolio::PortfolioLink;

#[async_trait]
pub trait EmailWriter: Send + Sync {
    async fn write_mail(
        &self,
        job: &ExtractedJob,
        links: &[PortfolioLink],
    ) -> Result<String, AppError>;
}

pub struct LlmEmailWriter {
    llm: LlmClient,
    sender: SenderProfile,
}

impl LlmEmailWriter {
    pub fn new(llm: LlmClient, sender: SenderProfile) -> Self {
        Self { llm, sender }
    }
}

#[async_trait]
impl EmailWriter for LlmEmailWriter {
    async fn write_mail(
        &self,
        job: &ExtractedJob,
        links: &[PortfolioLink],
    ) -> Result<String, AppError> {
        let prompt = build_mail_prompt(job, links, &self.sender)?;
        let email = self
            .llm
            .call_text(&prompt, WRITE_MAIL_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Email generation failed: {e}")))?;

        debug!(
            "Generated {} char email for role {:?}",
            email.len(),
            job.role
        );
        Ok(email)
    }
}

/// Fills the email template with the job, the links and the sender profile.
pub fn build_mail_prompt(
    job: &ExtractedJob,
    links: &[PortfolioLink],
    sender: &SenderProfile,
) -> Result<String, AppError> {
    let job_json = serde_json::to_string_pretty(job)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize job: {e}")))?;

    let links_text = if links.is_empty() {
        NO_LINKS_PLACEHOLDER.to_string()
    } else {
        links
            .iter()
            .map(|l| format!("- {} ({})", l.link, l.tech_stack))
            .collect::<Vec<_>>()
            .join("\n")
    };

    Ok(fill_template(
        WRITE_MAIL_PROMPT_TEMPLATE,
        &[
            ("job_json", &job_json),
            ("sender_name", &sender.name),
            ("sender_role", &sender.role),
            ("sender_company", &sender.company),
            ("sender_pitch", &sender.pitch),
            ("links", &links_text),
            ("no_preamble", NO_PREAMBLE_INSTRUCTION),
        ],
    ))
}

/// Substitutes `{name}` placeholders in one scan of the template.
/// Substituted values are never rescanned, so braces in job text survive.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::test_support::{text_reply, StubApi};

    fn job() -> ExtractedJob {
        ExtractedJob {
            role: Some("Data Engineer".to_string()),
            description: Some("Build batch pipelines.".to_string()),
            skills: vec!["Python".to_string(), "SQL".to_string()],
            ..Default::default()
        }
    }

    fn link(url: &str) -> PortfolioLink {
        PortfolioLink {
            tech_stack: "Python, SQL".to_string(),
            link: url.to_string(),
        }
    }

    #[test]
    fn test_prompt_contains_job_and_links() {
        let prompt = build_mail_prompt(
            &job(),
            &[link("https://p.example/data")],
            &SenderProfile::default(),
        )
        .unwrap();
        assert!(prompt.contains("Data Engineer"));
        assert!(prompt.contains("Build batch pipelines."));
        assert!(prompt.contains("- https://p.example/data (Python, SQL)"));
        assert!(!prompt.contains(NO_LINKS_PLACEHOLDER));
    }

    #[test]
    fn test_prompt_uses_sender_profile() {
        let sender = SenderProfile {
            name: "Priya".to_string(),
            role: "Account Lead".to_string(),
            company: "Acme Labs".to_string(),
            pitch: "a data consultancy".to_string(),
        };
        let prompt = build_mail_prompt(&job(), &[], &sender).unwrap();
        assert!(prompt.contains("You are Priya, Account Lead at Acme Labs, a data consultancy."));
        assert!(prompt.contains("close with Priya's signature"));
    }

    #[test]
    fn test_prompt_without_links_uses_placeholder() {
        let prompt = build_mail_prompt(&job(), &[], &SenderProfile::default()).unwrap();
        assert!(prompt.contains(NO_LINKS_PLACEHOLDER));
    }

    #[test]
    fn test_placeholders_in_job_text_are_left_alone() {
        let mut job = job();
        job.description = Some("Apply via {links} and {sender_name}".to_string());
        let prompt = build_mail_prompt(&job, &[], &SenderProfile::default()).unwrap();
        assert!(prompt.contains("Apply via {links} and {sender_name}"));
        assert_eq!(prompt.matches(NO_LINKS_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn test_fill_template_keeps_unknown_braces() {
        let filled = fill_template("{a} {b} {{a}} {", &[("a", "x{b}")]);
        assert_eq!(filled, "x{b} {b} {x{b}} {");
    }

    #[tokio::test]
    async fn test_writer_returns_trimmed_email() {
        let stub = StubApi::spawn(vec![text_reply("\n Dear hiring team,\n\nRegards, Alex \n")]).await;
        let writer = LlmEmailWriter::new(stub.client(), SenderProfile::default());
        let email = writer.write_mail(&job(), &[]).await.unwrap();
        assert_eq!(email, "Dear hiring team,\n\nRegards, Alex");
    }

    #[tokio::test]
    async fn test_writer_maps_empty_answer_to_llm_error() {
        let stub = StubApi::spawn(vec![text_reply("   ")]).await;
        let writer = LlmEmailWriter::new(stub.client(), SenderProfile::default());
        let err = writer.write_mail(&job(), &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(ref msg) if msg.contains("empty content")));
    }

    #[test]
    fn test_prompt_has_no_unfilled_placeholders() {
        let prompt =
            build_mail_prompt(&job(), &[link("https://p.example/x")], &SenderProfile::default())
                .unwrap();
        for placeholder in [
            "{job_json}",
            "{sender_name}",
            "{sender_role}",
            "{sender_company}",
            "{sender_pitch}",
            "{links}",
            "{no_preamble}",
        ] {
            assert!(!prompt.contains(placeholder), "{placeholder} left in prompt");
        }
    }
}
