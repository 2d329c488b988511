use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::template::TemplateCopyGenerator;
use super::{
    CopyError, CopyGenerator, GenerateCopyRequest, GeneratedCopy, Recipient, RewriteCopyRequest,
};
use crate::validation::non_blank;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
const SUBJECT_TOKENS: u32 = 50;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = "You are an expert B2B sales copywriter. Your copy is:
- Concise and action-oriented
- Personalized and human-sounding
- Clear with strong calls-to-action
- Never generic or templated

Important rules:
- Do NOT use placeholder brackets like [First Name] - the copy should be ready to send
- Do NOT include signatures unless specifically asked
- Match the requested tone exactly
- Keep within length guidelines";

#[derive(Clone, Debug)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl OpenAiSettings {
    pub fn is_configured(&self) -> bool {
        self.api_key.trim().starts_with("sk-")
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

/// Chat-completions backed generator. Every failure falls back to templates.
#[derive(Clone, Debug)]
pub struct OpenAiCopyGenerator {
    http: reqwest::Client,
    settings: OpenAiSettings,
    fallback: TemplateCopyGenerator,
}

impl OpenAiCopyGenerator {
    pub fn new(settings: OpenAiSettings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            settings,
            fallback: TemplateCopyGenerator,
        }
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, CopyError> {
        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
            temperature: self.settings.temperature,
        };
        info!(model = %self.settings.model, "calling completion api");
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CopyError::Status(response.status().as_u16()));
        }
        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(CopyError::Empty)?;
        info!(
            tokens = parsed.usage.map(|u| u.total_tokens).unwrap_or_default(),
            "completion succeeded"
        );
        Ok(content)
    }

    fn max_tokens_for(&self, length: &str) -> u32 {
        match length.to_lowercase().as_str() {
            "short" => 150,
            "long" => 600,
            _ => self.settings.max_tokens,
        }
    }
}

#[async_trait]
impl CopyGenerator for OpenAiCopyGenerator {
    async fn generate(&self, request: &GenerateCopyRequest) -> String {
        let prompt = generation_prompt(request);
        match self.complete(&prompt, self.max_tokens_for(request.length())).await {
            Ok(copy) => copy,
            Err(err) => {
                warn!(error = %err, "copy generation failed, using templates");
                self.fallback.generate(request).await
            }
        }
    }

    async fn generate_with_recipient(&self, request: &GenerateCopyRequest) -> GeneratedCopy {
        let wants_subject = request.wants_subject();
        let extra = if wants_subject { SUBJECT_TOKENS } else { 0 };
        let prompt = recipient_prompt(request);
        match self.complete(&prompt, self.max_tokens_for(request.length()) + extra).await {
            Ok(copy) if wants_subject => split_subject(&copy),
            Ok(copy) => GeneratedCopy {
                body: copy,
                subject: None,
            },
            Err(err) => {
                warn!(error = %err, "recipient copy generation failed, using templates");
                self.fallback.generate_with_recipient(request).await
            }
        }
    }

    async fn rewrite(&self, request: &RewriteCopyRequest) -> String {
        let prompt = rewrite_prompt(request.original(), request.adjustment());
        match self.complete(&prompt, self.settings.max_tokens).await {
            Ok(copy) => copy,
            Err(err) => {
                warn!(error = %err, "copy rewrite failed, using templates");
                self.fallback.rewrite(request).await
            }
        }
    }
}

/// Splits a leading `Subject:` line off the completion.
fn split_subject(completion: &str) -> GeneratedCopy {
    let lines: Vec<&str> = completion.split('\n').filter(|l| !l.is_empty()).collect();
    if let Some(first) = lines.first() {
        let prefix = "Subject:".len();
        if first.get(..prefix).is_some_and(|p| p.eq_ignore_ascii_case("subject:")) {
            return GeneratedCopy {
                subject: Some(first[prefix..].trim().to_string()),
                body: lines[1..].join("\n").trim().to_string(),
            };
        }
    }
    GeneratedCopy {
        body: completion.to_string(),
        subject: None,
    }
}

fn tone_description(tone: Option<&str>) -> &'static str {
    match tone.map(str::to_lowercase).as_deref() {
        Some("friendly") => {
            "Warm, conversational, and approachable. Use casual language and appropriate emojis."
        }
        Some("persuasive") => {
            "Compelling, urgent, and action-oriented. Emphasize value and create FOMO."
        }
        _ => "Professional and business-focused. Polished but not stiff.",
    }
}

fn length_description(length: &str) -> &'static str {
    match length.to_lowercase().as_str() {
        "short" => "Very concise, 2-3 sentences max. Get straight to the point.",
        "long" => {
            "Detailed, 2-3 paragraphs with supporting points. Comprehensive but not rambling."
        }
        _ => "Moderate length, 1 paragraph or about 4-6 sentences. Balanced.",
    }
}

fn copy_type_name(copy_type: &str) -> &'static str {
    match copy_type.to_lowercase().as_str() {
        "sales-email" => "sales email",
        "follow-up" => "follow-up message",
        "crm-note" => "CRM note",
        "deal-message" => "deal update message",
        "workflow-message" => "workflow message",
        "linkedin-connect" => "LinkedIn connection request (max 300 characters)",
        "linkedin-inmail" => "LinkedIn InMail message",
        "sms" => "SMS text message (max 160 characters)",
        "call-script" => "phone call script",
        "meeting-agenda" => "meeting agenda",
        _ => "sales message",
    }
}

/// Goal, tone, length, brand and context lines shared by both generation prompts.
fn brief(request: &GenerateCopyRequest) -> String {
    let mut lines = vec![
        format!("GOAL: {}", request.goal.as_deref().unwrap_or_default().trim()),
        format!("TONE: {}", tone_description(request.brand_tone.as_deref())),
        format!("LENGTH: {}", length_description(request.length())),
    ];
    if let Some(brand) = non_blank(request.company_name.as_deref()) {
        lines.push(format!("YOUR BRAND: {brand}"));
    }
    if let Some(recipient) = request.recipient.as_ref().and_then(recipient_block) {
        lines.push(recipient);
    }
    if let Some(context) = non_blank(request.context.as_deref()) {
        lines.push(format!("\nADDITIONAL CONTEXT:\n{context}"));
    }
    lines.join("\n")
}

fn generation_prompt(request: &GenerateCopyRequest) -> String {
    let request = GenerateCopyRequest {
        recipient: None,
        ..request.clone()
    };
    format!(
        "Write a {} with these specifications:\n\n{}\n\n\
         Write only the message body. Do not include subject line or signature.",
        copy_type_name(request.copy_type()),
        brief(&request)
    )
}

fn recipient_prompt(request: &GenerateCopyRequest) -> String {
    let subject = if request.wants_subject() {
        "\n\nStart with 'Subject: [compelling subject line]' on its own line, then the body."
    } else {
        ""
    };
    format!(
        "Write a personalized {} with these specifications:\n\n{}\n\n\
         Personalize the message using the recipient information provided.{subject}",
        copy_type_name(request.copy_type()),
        brief(request)
    )
}

fn recipient_block(recipient: &Recipient) -> Option<String> {
    let fields = [
        ("Name", &recipient.name),
        ("Email", &recipient.email),
        ("Company", &recipient.company),
        ("Title", &recipient.title),
        ("Deal Stage", &recipient.deal_stage),
        ("Deal Value", &recipient.deal_value),
        ("Type", &recipient.kind),
    ];
    let parts: Vec<String> = fields
        .iter()
        .filter_map(|(label, value)| {
            non_blank(value.as_deref()).map(|v| format!("- {label}: {v}"))
        })
        .collect();
    (!parts.is_empty()).then(|| format!("\nRECIPIENT:\n{}", parts.join("\n")))
}

fn rewrite_prompt(original: &str, adjustment: &str) -> String {
    let instructions = match adjustment.to_lowercase().as_str() {
        "shorter" | "short" => {
            "Make this copy SHORTER:\n\
             - Cut to the essential message\n\
             - Remove all filler words and phrases\n\
             - Keep under 100 words\n\
             - Maintain the core message and CTA"
        }
        "friendlier" | "friendly" => {
            "Make this copy FRIENDLIER:\n\
             - Use warm, conversational language\n\
             - Add 1-2 appropriate emojis\n\
             - Replace formal phrases with casual ones\n\
             - Sound genuinely interested in the recipient"
        }
        "persuasive" | "more persuasive" => {
            "Make this copy MORE PERSUASIVE:\n\
             - Add urgency without being pushy\n\
             - Emphasize specific benefits and outcomes\n\
             - Include compelling statistics or proof points\n\
             - Strengthen the call-to-action\n\
             - Create appropriate FOMO"
        }
        _ => "Improve this copy while maintaining the core message.",
    };
    format!("{instructions}\n\nORIGINAL COPY:\n{original}\n\nREWRITTEN COPY:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_sk_keys_count_as_configured() {
        let mut settings = OpenAiSettings::default();
        assert!(!settings.is_configured());
        settings.api_key = "test-key".into();
        assert!(!settings.is_configured());
        settings.api_key = "sk-live".into();
        assert!(settings.is_configured());
    }

    #[test]
    fn subject_line_is_split_off() {
        let copy = split_subject("Subject: Quick idea for Acme\n\nHi Ada,\nShall we talk?");
        assert_eq!(copy.subject.as_deref(), Some("Quick idea for Acme"));
        assert_eq!(copy.body, "Hi Ada,\nShall we talk?");

        let plain = split_subject("Hi Ada,\nShall we talk?");
        assert_eq!(plain.subject, None);
        assert_eq!(plain.body, "Hi Ada,\nShall we talk?");
    }

    #[test]
    fn recipient_block_skips_blank_fields() {
        let recipient = Recipient {
            name: Some("Ada".into()),
            title: Some(" ".into()),
            deal_stage: Some("Proposal".into()),
            ..Recipient::default()
        };
        assert_eq!(
            recipient_block(&recipient).as_deref(),
            Some("\nRECIPIENT:\n- Name: Ada\n- Deal Stage: Proposal")
        );
        assert_eq!(recipient_block(&Recipient::default()), None);
    }

    #[test]
    fn rewrite_prompt_picks_instructions() {
        assert!(rewrite_prompt("Hi", "Shorter").starts_with("Make this copy SHORTER:"));
        assert!(rewrite_prompt("Hi", "louder").starts_with("Improve this copy"));
    }
}
