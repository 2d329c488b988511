use async_trait::async_trait;
use regex::{NoExpand, RegexBuilder};

use super::{CopyGenerator, GenerateCopyRequest, GeneratedCopy, Recipient, RewriteCopyRequest};
use crate::validation::non_blank;

pub(crate) const AI_NOTE: &str = "\n\n[Note: Configure OpenAI API key for AI-powered \
personalization and advanced copy generation.]";

const CONTEXT_PREVIEW_LEN: usize = 300;

const SALES_EMAIL: &str = "Hi [First Name],

I hope this email finds you well. I wanted to reach out to see if you'd be interested in \
scheduling a brief call to discuss how our solutions can help [Company Name] achieve your goals.

We've helped companies similar to yours:
• Increase productivity by 40%
• Reduce operational costs by 25%
• Streamline workflows and save time

Would you be available for a 15-minute call next week? I'd love to learn more about your current \
challenges and share how we can help.

Looking forward to connecting.

Best regards,
[Your Name]";

const FOLLOW_UP: &str = "Hi [First Name],

I wanted to follow up on our previous conversation. Please let me know if you have any questions \
or if you'd like to schedule a call to discuss next steps.

Best regards,
[Your Name]";

const CRM_NOTE: &str = "Note: [First Name] - [Company Name]

Summary of our conversation:
• [Key point 1]
• [Key point 2]

Next steps:
• [Action item]";

const DEAL_MESSAGE: &str = "Hi [First Name],

I wanted to provide an update on the [Company Name] deal. Current status: [stage]. \
Next steps: [action items].

Best regards,
[Your Name]";

const WORKFLOW_MESSAGE: &str = "Hi [First Name],

Following up on our conversation. Please let me know if you need any additional information.

Best regards,
[Your Name]";

const DEFAULT_TEMPLATE: &str = "Hi [First Name],

I hope this email finds you well. I wanted to reach out to see if you'd be interested in \
scheduling a brief call to discuss how our solutions can help [Company Name] achieve your goals.

Would you be available for a 15-minute call next week?

Best regards,
[Your Name]";

/// Offline generator used when no completion API is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateCopyGenerator;

impl TemplateCopyGenerator {
    fn body(&self, request: &GenerateCopyRequest) -> String {
        let brand = non_blank(request.company_name.as_deref());
        let template = template_for(request.copy_type());
        let mut body = fill(template, brand.as_deref(), request.recipient.as_ref());
        if let Some(context) = non_blank(request.context.as_deref()) {
            body = format!("{}\n\n---\nContext: {}\n---", body.trim_end(), preview(&context));
        }
        format!("{}{AI_NOTE}", body.trim())
    }
}

#[async_trait]
impl CopyGenerator for TemplateCopyGenerator {
    async fn generate(&self, request: &GenerateCopyRequest) -> String {
        let without_recipient = GenerateCopyRequest {
            recipient: None,
            ..request.clone()
        };
        self.body(&without_recipient)
    }

    async fn generate_with_recipient(&self, request: &GenerateCopyRequest) -> GeneratedCopy {
        let subject = request.wants_subject().then(|| {
            let company = request
                .recipient
                .as_ref()
                .and_then(|r| r.company.clone())
                .or_else(|| request.company_name.clone())
                .unwrap_or_else(|| "[Company]".to_string());
            format!("Meeting request: {company} partnership")
        });
        GeneratedCopy {
            body: self.body(request),
            subject,
        }
    }

    async fn rewrite(&self, request: &RewriteCopyRequest) -> String {
        format!("{}{AI_NOTE}", request.original())
    }
}

fn template_for(copy_type: &str) -> &'static str {
    match copy_type.to_lowercase().as_str() {
        "sales-email" => SALES_EMAIL,
        "follow-up" => FOLLOW_UP,
        "crm-note" => CRM_NOTE,
        "deal-message" => DEAL_MESSAGE,
        "workflow-message" => WORKFLOW_MESSAGE,
        _ => DEFAULT_TEMPLATE,
    }
}

fn preview(context: &str) -> String {
    if context.chars().count() > CONTEXT_PREVIEW_LEN {
        let cut: String = context.chars().take(CONTEXT_PREVIEW_LEN).collect();
        format!("{cut}...")
    } else {
        context.to_string()
    }
}

/// Case-insensitive literal replacement of a `[Placeholder]`.
fn replace(text: &str, placeholder: &str, value: &str) -> String {
    match RegexBuilder::new(&regex::escape(placeholder))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => pattern.replace_all(text, NoExpand(value)).into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Recipient values win over the brand for `[Company Name]`.
fn fill(template: &str, brand: Option<&str>, recipient: Option<&Recipient>) -> String {
    let mut text = template.to_string();
    if let Some(recipient) = recipient {
        if let Some(full) = non_blank(recipient.name.as_deref()) {
            let first = recipient.first_name().unwrap_or_else(|| full.clone());
            text = replace(&text, "[First Name]", &first);
            text = replace(&text, "[Contact Name]", &full);
        }
        if let Some(company) = non_blank(recipient.company.as_deref()) {
            text = replace(&text, "[Company Name]", &company);
        }
        if let Some(title) = non_blank(recipient.title.as_deref()) {
            text = replace(&text, "[Title]", &title);
        }
    }
    if let Some(brand) = brand {
        text = replace(&text, "[Company Name]", brand);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(copy_type: &str) -> GenerateCopyRequest {
        GenerateCopyRequest {
            copy_type_id: Some(copy_type.into()),
            goal: Some("book a demo".into()),
            ..GenerateCopyRequest::default()
        }
    }

    #[tokio::test]
    async fn known_types_use_their_template_and_append_the_note() {
        let copy = TemplateCopyGenerator.generate(&request("FOLLOW-UP")).await;
        assert!(copy.starts_with("Hi [First Name],\n\nI wanted to follow up"));
        assert!(copy.ends_with(AI_NOTE));

        let fallback = TemplateCopyGenerator.generate(&request("sms")).await;
        assert!(fallback.contains("Would you be available for a 15-minute call next week?"));
    }

    #[tokio::test]
    async fn recipient_fills_placeholders_and_subject() {
        let mut req = request("sales-email");
        req.company_name = Some("Acme".into());
        req.recipient = Some(Recipient {
            name: Some("Ada Lovelace".into()),
            company: Some("Analytical Engines".into()),
            ..Recipient::default()
        });
        let copy = TemplateCopyGenerator.generate_with_recipient(&req).await;
        assert!(copy.body.starts_with("Hi Ada,"));
        assert!(copy.body.contains("help Analytical Engines achieve"));
        assert_eq!(
            copy.subject.as_deref(),
            Some("Meeting request: Analytical Engines partnership")
        );

        let note = TemplateCopyGenerator
            .generate_with_recipient(&request("crm-note"))
            .await;
        assert_eq!(note.subject, None);
    }

    #[tokio::test]
    async fn long_context_is_previewed() {
        let mut req = request("follow-up");
        req.context = Some("a".repeat(400));
        let copy = TemplateCopyGenerator.generate(&req).await;
        let expected = format!("\n\n---\nContext: {}...\n---{AI_NOTE}", "a".repeat(300));
        assert!(copy.ends_with(&expected));
    }

    #[test]
    fn placeholders_match_case_insensitively() {
        assert_eq!(replace("Dear [first name]", "[First Name]", "$1 Bo"), "Dear $1 Bo");
    }

    #[tokio::test]
    async fn rewrite_echoes_original() {
        let req = RewriteCopyRequest {
            original_copy: Some("Hello there".into()),
            adjustment: Some("shorter".into()),
        };
        assert_eq!(
            TemplateCopyGenerator.rewrite(&req).await,
            format!("Hello there{AI_NOTE}")
        );
    }
}
