use std::collections::HashMap;

use entity::email_sequence_enrollments::{self as enrollments, EnrollmentStatus};
use entity::email_sequence_steps as steps;
use entity::email_sequences as sequences;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::scope::Actor;

/// Sequences the caller owns, plus ones shared with the selected organization.
fn visible(actor: &Actor) -> Condition {
    let owned = Condition::all().add(sequences::Column::UserId.eq(actor.user_id));
    match actor.org_id {
        Some(org_id) => Condition::any()
            .add(owned.add(sequences::Column::OrganizationId.eq(org_id)))
            .add(
                Condition::all()
                    .add(sequences::Column::OrganizationId.eq(org_id))
                    .add(sequences::Column::IsSharedWithOrganization.eq(true)),
            ),
        None => owned.add(sequences::Column::OrganizationId.is_null()),
    }
}

pub async fn list_visible<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
) -> Result<Vec<sequences::Model>, DbErr> {
    sequences::Entity::find()
        .filter(visible(actor))
        .order_by_asc(sequences::Column::Name)
        .all(db)
        .await
}

pub async fn find_visible<C: ConnectionTrait>(
    db: &C,
    sequence_id: Uuid,
    actor: &Actor,
) -> Result<Option<sequences::Model>, DbErr> {
    sequences::Entity::find_by_id(sequence_id)
        .filter(visible(actor))
        .one(db)
        .await
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    model: sequences::ActiveModel,
) -> Result<sequences::Model, DbErr> {
    model.insert(db).await
}

pub async fn update<C: ConnectionTrait>(
    db: &C,
    model: sequences::ActiveModel,
) -> Result<sequences::Model, DbErr> {
    model.update(db).await
}

pub async fn delete<C: ConnectionTrait>(db: &C, sequence_id: Uuid) -> Result<bool, DbErr> {
    let res = sequences::Entity::delete_by_id(sequence_id).exec(db).await?;
    Ok(res.rows_affected > 0)
}

pub async fn list_steps<C: ConnectionTrait>(
    db: &C,
    sequence_id: Uuid,
) -> Result<Vec<steps::Model>, DbErr> {
    steps::Entity::find()
        .filter(steps::Column::SequenceId.eq(sequence_id))
        .order_by_asc(steps::Column::StepOrder)
        .all(db)
        .await
}

pub async fn max_step_order<C: ConnectionTrait>(db: &C, sequence_id: Uuid) -> Result<i32, DbErr> {
    let max: Option<Option<i32>> = steps::Entity::find()
        .select_only()
        .column_as(Expr::col(steps::Column::StepOrder).max(), "max_order")
        .filter(steps::Column::SequenceId.eq(sequence_id))
        .into_tuple()
        .one(db)
        .await?;
    Ok(max.flatten().unwrap_or(0))
}

pub async fn insert_step<C: ConnectionTrait>(
    db: &C,
    model: steps::ActiveModel,
) -> Result<steps::Model, DbErr> {
    model.insert(db).await
}

pub async fn delete_step<C: ConnectionTrait>(
    db: &C,
    sequence_id: Uuid,
    step_id: Uuid,
) -> Result<bool, DbErr> {
    let res = steps::Entity::delete_many()
        .filter(steps::Column::Id.eq(step_id))
        .filter(steps::Column::SequenceId.eq(sequence_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

pub async fn list_enrollments<C: ConnectionTrait>(
    db: &C,
    sequence_id: Uuid,
) -> Result<Vec<enrollments::Model>, DbErr> {
    enrollments::Entity::find()
        .filter(enrollments::Column::SequenceId.eq(sequence_id))
        .order_by_desc(enrollments::Column::EnrolledAt)
        .all(db)
        .await
}

pub async fn find_enrollment<C: ConnectionTrait>(
    db: &C,
    sequence_id: Uuid,
    enrollment_id: Uuid,
) -> Result<Option<enrollments::Model>, DbErr> {
    enrollments::Entity::find_by_id(enrollment_id)
        .filter(enrollments::Column::SequenceId.eq(sequence_id))
        .one(db)
        .await
}

pub async fn insert_enrollment<C: ConnectionTrait>(
    db: &C,
    model: enrollments::ActiveModel,
) -> Result<enrollments::Model, DbErr> {
    model.insert(db).await
}

pub async fn update_enrollment<C: ConnectionTrait>(
    db: &C,
    model: enrollments::ActiveModel,
) -> Result<enrollments::Model, DbErr> {
    model.update(db).await
}

pub async fn delete_enrollment<C: ConnectionTrait>(
    db: &C,
    enrollment_id: Uuid,
) -> Result<bool, DbErr> {
    let res = enrollments::Entity::delete_by_id(enrollment_id).exec(db).await?;
    Ok(res.rows_affected > 0)
}

/// Step counts and active-enrollment counts per sequence.
pub async fn counts<C: ConnectionTrait>(
    db: &C,
    sequence_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, (u64, u64)>, DbErr> {
    let mut out: HashMap<Uuid, (u64, u64)> = HashMap::new();
    if sequence_ids.is_empty() {
        return Ok(out);
    }
    let step_rows: Vec<(Uuid, i64)> = steps::Entity::find()
        .select_only()
        .column(steps::Column::SequenceId)
        .column_as(Expr::col(steps::Column::Id).count(), "n")
        .filter(steps::Column::SequenceId.is_in(sequence_ids.clone()))
        .group_by(steps::Column::SequenceId)
        .into_tuple()
        .all(db)
        .await?;
    for (id, n) in step_rows {
        out.entry(id).or_default().0 = n.max(0) as u64;
    }
    let active_rows: Vec<(Uuid, i64)> = enrollments::Entity::find()
        .select_only()
        .column(enrollments::Column::SequenceId)
        .column_as(Expr::col(enrollments::Column::Id).count(), "n")
        .filter(enrollments::Column::SequenceId.is_in(sequence_ids))
        .filter(enrollments::Column::Status.eq(EnrollmentStatus::Active))
        .group_by(enrollments::Column::SequenceId)
        .into_tuple()
        .all(db)
        .await?;
    for (id, n) in active_rows {
        out.entry(id).or_default().1 = n.max(0) as u64;
    }
    Ok(out)
}
