use sea_orm::{ColumnTrait, Condition};
use uuid::Uuid;

use crate::error::DomainError;

/// Caller identity plus the tenant selected by `X-Organization-Id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub org_id: Option<Uuid>,
}

impl Actor {
    pub fn new(user_id: Uuid, org_id: Option<Uuid>) -> Self {
        Self { user_id, org_id }
    }

    pub fn require_org(&self) -> Result<Uuid, DomainError> {
        self.org_id.ok_or(DomainError::OrganizationRequired)
    }
}

/// Rows owned by the caller inside the selected tenant; without a tenant, only untenanted rows.
pub(crate) fn visible_to<C: ColumnTrait>(user_col: C, org_col: C, actor: &Actor) -> Condition {
    let cond = Condition::all().add(user_col.eq(actor.user_id));
    match actor.org_id {
        Some(org_id) => cond.add(org_col.eq(org_id)),
        None => cond.add(org_col.is_null()),
    }
}
