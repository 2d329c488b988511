//! Sales copy generation: an OpenAI chat-completions client with a template fallback.

mod openai;
mod template;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::validation::non_blank;

pub use openai::{OpenAiCopyGenerator, OpenAiSettings};
pub use template::TemplateCopyGenerator;

pub const COPY_TYPE_MAX_LEN: usize = 50;
pub const GOAL_MAX_LEN: usize = 500;
pub const CONTEXT_MAX_LEN: usize = 2000;
pub const LENGTH_MAX_LEN: usize = 20;
pub const ORIGINAL_MAX_LEN: usize = 10_000;
pub const DEFAULT_LENGTH: &str = "medium";

/// Produces copy. Implementations never fail: remote errors degrade to templates.
#[async_trait]
pub trait CopyGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateCopyRequest) -> String;

    async fn generate_with_recipient(&self, request: &GenerateCopyRequest) -> GeneratedCopy;

    async fn rewrite(&self, request: &RewriteCopyRequest) -> String;
}

/// OpenAI when the settings carry a usable key, templates otherwise.
pub fn from_settings(settings: OpenAiSettings) -> Arc<dyn CopyGenerator> {
    if settings.is_configured() {
        Arc::new(OpenAiCopyGenerator::new(settings))
    } else {
        Arc::new(TemplateCopyGenerator)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CopyError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion endpoint returned {0}")]
    Status(u16),
    #[error("completion was empty")]
    Empty,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub last_activity: Option<String>,
    pub deal_stage: Option<String>,
    pub deal_value: Option<String>,
}

impl Recipient {
    pub fn first_name(&self) -> Option<String> {
        non_blank(self.name.as_deref())
            .and_then(|name| name.split(' ').next().map(str::to_string))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCopyRequest {
    pub copy_type_id: Option<String>,
    pub goal: Option<String>,
    pub context: Option<String>,
    pub length: Option<String>,
    pub company_name: Option<String>,
    pub brand_tone: Option<String>,
    pub recipient: Option<Recipient>,
}

impl GenerateCopyRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        let copy_type =
            non_blank(self.copy_type_id.as_deref()).ok_or(DomainError::CopyTypeRequired)?;
        let goal = non_blank(self.goal.as_deref()).ok_or(DomainError::CopyGoalRequired)?;
        max_len("Copy type", Some(&copy_type), COPY_TYPE_MAX_LEN)?;
        max_len("Goal", Some(&goal), GOAL_MAX_LEN)?;
        max_len("Context", self.context.as_deref(), CONTEXT_MAX_LEN)?;
        max_len("Length", self.length.as_deref(), LENGTH_MAX_LEN)?;
        max_len("Company name", self.company_name.as_deref(), 200)?;
        max_len("Brand tone", self.brand_tone.as_deref(), 50)?;
        if let Some(recipient) = &self.recipient {
            max_len("Recipient name", recipient.name.as_deref(), 200)?;
            max_len("Recipient company", recipient.company.as_deref(), 200)?;
            max_len("Recipient title", recipient.title.as_deref(), 100)?;
            max_len("Recipient type", recipient.kind.as_deref(), 50)?;
            max_len("Last activity", recipient.last_activity.as_deref(), 100)?;
            max_len("Deal stage", recipient.deal_stage.as_deref(), 50)?;
            max_len("Deal value", recipient.deal_value.as_deref(), 50)?;
        }
        Ok(())
    }

    pub fn copy_type(&self) -> &str {
        self.copy_type_id.as_deref().map(str::trim).unwrap_or_default()
    }

    pub fn length(&self) -> &str {
        match self.length.as_deref().map(str::trim) {
            Some(length) if !length.is_empty() => length,
            _ => DEFAULT_LENGTH,
        }
    }

    /// Email-like copy types carry a subject line.
    pub fn wants_subject(&self) -> bool {
        self.copy_type().to_lowercase().contains("email")
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteCopyRequest {
    pub original_copy: Option<String>,
    pub adjustment: Option<String>,
}

impl RewriteCopyRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        let original =
            non_blank(self.original_copy.as_deref()).ok_or(DomainError::CopyOriginalRequired)?;
        max_len("Original copy", Some(&original), ORIGINAL_MAX_LEN)?;
        let adjustment = non_blank(self.adjustment.as_deref())
            .ok_or_else(|| DomainError::Validation("Adjustment is required".into()))?;
        max_len("Adjustment", Some(&adjustment), GOAL_MAX_LEN)
    }

    pub fn original(&self) -> &str {
        self.original_copy.as_deref().unwrap_or_default()
    }

    pub fn adjustment(&self) -> &str {
        self.adjustment.as_deref().map(str::trim).unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCopy {
    pub body: String,
    pub subject: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyText {
    pub copy: String,
}

fn max_len(field: &str, value: Option<&str>, limit: usize) -> Result<(), DomainError> {
    match value {
        Some(v) if v.chars().count() > limit => Err(DomainError::Validation(format!(
            "{field} must be at most {limit} characters"
        ))),
        _ => Ok(()),
    }
}
