use platform_api::{ApiError, StatusCode};
use platform_authn::AuthnError;
use sea_orm::DbErr;
use thiserror::Error;

/// How a domain failure surfaces to a client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    Forbidden,
    Conflict,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Conflict => StatusCode::CONFLICT,
        }
    }
}

/// Closed set of business rule failures, grouped by aggregate.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),
    #[error("An organization must be selected (X-Organization-Id header)")]
    OrganizationRequired,
    #[error("Authentication is required")]
    Unauthorized,

    #[error("An account with this email already exists")]
    EmailAlreadyExists,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Password must be at least 8 characters")]
    PasswordTooWeak,
    #[error("No user with this email address")]
    EmailNotFound,
    #[error("Email format is invalid")]
    AuthEmailInvalid,
    #[error("Name is required")]
    AuthNameRequired,
    #[error("User not found")]
    UserNotFound,

    #[error("Organization not found")]
    OrganizationNotFound,
    #[error("You are not a member of this organization")]
    NotMember,
    #[error("Only the organization owner can do this")]
    NotOwner,
    #[error("Only the organization owner or a manager can do this")]
    NotOwnerOrManager,
    #[error("User is already a member of this organization")]
    AlreadyMember,
    #[error("Member not found")]
    MemberNotFound,
    #[error("The owner role cannot be assigned")]
    CannotAssignOwner,
    #[error("The owner's role cannot be changed")]
    CannotChangeOwnerRole,
    #[error("The owner cannot be removed from the organization")]
    CannotRemoveOwner,
    #[error("Role must be member or manager")]
    InvalidRole,
    #[error("Missing or invalid X-Api-Key header")]
    WebhookKeyMissing,
    #[error("Invalid API key")]
    WebhookKeyInvalid,

    #[error("Pipeline not found")]
    PipelineNotFound,
    #[error("Pipeline name is required")]
    PipelineNameRequired,
    #[error("Pipeline still has deals; move or delete them first")]
    PipelineHasDeals,

    #[error("Deal stage not found")]
    DealStageNotFound,
    #[error("Deal stage name is required")]
    DealStageNameRequired,
    #[error("A stage cannot be both won and lost")]
    ConflictingOutcome,

    #[error("Deal not found")]
    DealNotFound,
    #[error("Deal name is required")]
    DealNameRequired,
    #[error("Deal value is required")]
    DealValueRequired,
    #[error("Deal value must be a number")]
    DealValueInvalid,
    #[error("Stage does not belong to the deal's pipeline")]
    InvalidStage,
    #[error("Pipeline not found for this deal")]
    DealPipelineNotFound,

    #[error("Company not found")]
    CompanyNotFound,
    #[error("Company name is required")]
    CompanyNameRequired,
    #[error("Company domain is invalid")]
    CompanyDomainInvalid,
    #[error("A company with this name already exists")]
    CompanyDuplicateName,

    #[error("Contact not found")]
    ContactNotFound,
    #[error("Contact name is required")]
    ContactNameRequired,
    #[error("Contact email is required")]
    ContactEmailRequired,
    #[error("Contact email format is invalid")]
    ContactEmailInvalid,
    #[error("Contact phone format is invalid")]
    ContactPhoneInvalid,
    #[error("A contact with this email already exists")]
    ContactDuplicateEmail,

    #[error("Lead not found")]
    LeadNotFound,
    #[error("Lead name is required")]
    LeadNameRequired,
    #[error("Lead email is required")]
    LeadEmailRequired,
    #[error("Lead email format is invalid")]
    LeadEmailInvalid,
    #[error("Lead phone format is invalid")]
    LeadPhoneInvalid,
    #[error("Lead has already been converted")]
    LeadAlreadyConverted,

    #[error("Task not found")]
    TaskNotFound,
    #[error("Task title is required")]
    TaskTitleRequired,
    #[error("Task status is invalid")]
    TaskInvalidStatus,
    #[error("Task priority is invalid")]
    TaskInvalidPriority,

    #[error("Activity not found")]
    ActivityNotFound,
    #[error("Activity type is invalid")]
    ActivityInvalidType,
    #[error("An activity needs a contact, deal or lead")]
    ActivityNoRelatedEntity,
    #[error("The related contact, deal or lead was not found")]
    ActivityRelatedEntityNotFound,

    #[error("Email sequence not found")]
    SequenceNotFound,
    #[error("Email sequence name is required")]
    SequenceNameRequired,
    #[error("Sequence step not found")]
    SequenceStepNotFound,
    #[error("Enrollment not found")]
    EnrollmentNotFound,
    #[error("Enrollment cannot move from {from} to {to}")]
    SequenceInvalidTransition { from: &'static str, to: &'static str },
    #[error("A recipient email, contact or lead is required")]
    SequenceRecipientRequired,

    #[error("Copy type is required")]
    CopyTypeRequired,
    #[error("Goal is required")]
    CopyGoalRequired,
    #[error("Original copy is required")]
    CopyOriginalRequired,
}

impl DomainError {
    pub fn code(&self) -> &'static str {
        use DomainError::*;
        match self {
            Validation(_) => "General.Validation",
            OrganizationRequired => "General.OrganizationRequired",
            Unauthorized => "General.Unauthorized",

            EmailAlreadyExists => "Auth.EmailAlreadyExists",
            InvalidCredentials => "Auth.InvalidCredentials",
            PasswordTooWeak => "Auth.PasswordTooWeak",
            EmailNotFound => "Auth.EmailNotFound",
            AuthEmailInvalid => "Auth.EmailInvalid",
            AuthNameRequired => "Auth.NameRequired",
            UserNotFound => "User.NotFound",

            OrganizationNotFound => "Organization.NotFound",
            NotMember => "Organization.NotMember",
            NotOwner => "Organization.NotOwner",
            NotOwnerOrManager => "Organization.NotOwnerOrManager",
            AlreadyMember => "Organization.AlreadyMember",
            MemberNotFound => "Organization.MemberNotFound",
            CannotAssignOwner => "Organization.CannotAssignOwner",
            CannotChangeOwnerRole => "Organization.CannotChangeOwnerRole",
            CannotRemoveOwner => "Organization.CannotRemoveOwner",
            InvalidRole => "Organization.InvalidRole",
            WebhookKeyMissing => "Webhook.ApiKeyMissing",
            WebhookKeyInvalid => "Webhook.ApiKeyInvalid",

            PipelineNotFound => "Pipeline.NotFound",
            PipelineNameRequired => "Pipeline.NameRequired",
            PipelineHasDeals => "Pipeline.HasDeals",

            DealStageNotFound => "DealStage.NotFound",
            DealStageNameRequired => "DealStage.NameRequired",
            ConflictingOutcome => "DealStage.ConflictingOutcome",

            DealNotFound => "Deal.NotFound",
            DealNameRequired => "Deal.NameRequired",
            DealValueRequired => "Deal.ValueRequired",
            DealValueInvalid => "Deal.ValueInvalid",
            InvalidStage => "Deal.InvalidStage",
            DealPipelineNotFound => "Deal.PipelineNotFound",

            CompanyNotFound => "Company.NotFound",
            CompanyNameRequired => "Company.NameRequired",
            CompanyDomainInvalid => "Company.DomainInvalid",
            CompanyDuplicateName => "Company.DuplicateName",

            ContactNotFound => "Contact.NotFound",
            ContactNameRequired => "Contact.NameRequired",
            ContactEmailRequired => "Contact.EmailRequired",
            ContactEmailInvalid => "Contact.EmailInvalid",
            ContactPhoneInvalid => "Contact.PhoneInvalid",
            ContactDuplicateEmail => "Contact.DuplicateEmail",

            LeadNotFound => "Lead.NotFound",
            LeadNameRequired => "Lead.NameRequired",
            LeadEmailRequired => "Lead.EmailRequired",
            LeadEmailInvalid => "Lead.EmailInvalid",
            LeadPhoneInvalid => "Lead.PhoneInvalid",
            LeadAlreadyConverted => "Lead.AlreadyConverted",

            TaskNotFound => "Task.NotFound",
            TaskTitleRequired => "Task.TitleRequired",
            TaskInvalidStatus => "Task.InvalidStatus",
            TaskInvalidPriority => "Task.InvalidPriority",

            ActivityNotFound => "Activity.NotFound",
            ActivityInvalidType => "Activity.InvalidType",
            ActivityNoRelatedEntity => "Activity.NoRelatedEntity",
            ActivityRelatedEntityNotFound => "Activity.RelatedEntityNotFound",

            SequenceNotFound => "EmailSequence.NotFound",
            SequenceNameRequired => "EmailSequence.NameRequired",
            SequenceStepNotFound => "EmailSequence.StepNotFound",
            EnrollmentNotFound => "EmailSequence.EnrollmentNotFound",
            SequenceInvalidTransition { .. } => "EmailSequence.InvalidTransition",
            SequenceRecipientRequired => "EmailSequence.RecipientRequired",

            CopyTypeRequired => "Copy.CopyTypeRequired",
            CopyGoalRequired => "Copy.GoalRequired",
            CopyOriginalRequired => "Copy.OriginalCopyRequired",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        use DomainError::*;
        match self {
            Unauthorized | InvalidCredentials | WebhookKeyMissing | WebhookKeyInvalid => {
                ErrorKind::Unauthorized
            }
            NotMember | NotOwner | NotOwnerOrManager => ErrorKind::Forbidden,
            EmailAlreadyExists
            | AlreadyMember
            | PipelineHasDeals
            | CompanyDuplicateName
            | ContactDuplicateEmail
            | LeadAlreadyConverted
            | SequenceInvalidTransition { .. } => ErrorKind::Conflict,
            EmailNotFound
            | UserNotFound
            | OrganizationNotFound
            | MemberNotFound
            | PipelineNotFound
            | DealStageNotFound
            | DealNotFound
            | DealPipelineNotFound
            | CompanyNotFound
            | ContactNotFound
            | LeadNotFound
            | TaskNotFound
            | ActivityNotFound
            | ActivityRelatedEntityNotFound
            | SequenceNotFound
            | SequenceStepNotFound
            | EnrollmentNotFound => ErrorKind::NotFound,
            _ => ErrorKind::Validation,
        }
    }
}

/// Service-level failure: a business rule, the store, or credential plumbing.
#[derive(Debug, Error)]
pub enum CrmError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("credential error: {0}")]
    Auth(#[from] AuthnError),
}

impl CrmError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            CrmError::Domain(err) => Some(err),
            _ => None,
        }
    }
}

pub type CrmResult<T> = Result<T, CrmError>;

impl From<CrmError> for ApiError {
    fn from(err: CrmError) -> Self {
        match err {
            CrmError::Domain(err) => err.into(),
            CrmError::Database(err) => ApiError::internal(anyhow::Error::new(err)),
            CrmError::Auth(err) => ApiError::internal(anyhow::Error::new(err)),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::coded(err.kind().status(), err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_grouped_by_aggregate() {
        assert_eq!(DomainError::InvalidStage.code(), "Deal.InvalidStage");
        assert_eq!(DomainError::ConflictingOutcome.code(), "DealStage.ConflictingOutcome");
        assert_eq!(DomainError::NotMember.code(), "Organization.NotMember");
        assert_eq!(
            DomainError::SequenceInvalidTransition {
                from: "completed",
                to: "paused"
            }
            .code(),
            "EmailSequence.InvalidTransition"
        );
    }

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(DomainError::DealNotFound.kind().status(), StatusCode::NOT_FOUND);
        assert_eq!(DomainError::NotOwnerOrManager.kind().status(), StatusCode::FORBIDDEN);
        assert_eq!(DomainError::AlreadyMember.kind().status(), StatusCode::CONFLICT);
        assert_eq!(DomainError::InvalidCredentials.kind().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(DomainError::DealValueInvalid.kind().status(), StatusCode::BAD_REQUEST);
        assert_eq!(DomainError::OrganizationRequired.kind(), ErrorKind::Validation);
    }

    #[test]
    fn database_errors_become_internal() {
        let api: ApiError = CrmError::Database(DbErr::Custom("pool timed out".into())).into();
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.code(), "General.ServerError");
        assert_eq!(api.to_string(), "internal server error");
    }

    #[test]
    fn domain_errors_keep_code_and_message() {
        let api: ApiError = DomainError::PipelineHasDeals.into();
        assert_eq!(api.status(), StatusCode::CONFLICT);
        assert_eq!(api.code(), "Pipeline.HasDeals");
        assert!(api.to_string().contains("still has deals"));
    }
}
