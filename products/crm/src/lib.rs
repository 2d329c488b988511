//! CRM domain crate: repositories, services and read models behind the REST API.

pub mod copy;
pub mod error;
pub mod kanban;
pub mod paging;
pub mod reminders;
pub mod repo;
pub mod scope;
pub mod service;
pub mod validation;

pub use error::{CrmError, CrmResult, DomainError, ErrorKind};
pub use paging::{PagedResult, PaginationParams};
pub use scope::Actor;
