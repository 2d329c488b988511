use entity::memberships::{self, MemberRole};
use entity::orgs;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

pub async fn find<C: ConnectionTrait>(db: &C, org_id: Uuid) -> Result<Option<orgs::Model>, DbErr> {
    orgs::Entity::find_by_id(org_id).one(db).await
}

pub async fn find_by_api_key<C: ConnectionTrait>(
    db: &C,
    api_key: &str,
) -> Result<Option<orgs::Model>, DbErr> {
    orgs::Entity::find()
        .filter(orgs::Column::WebhookApiKey.eq(api_key))
        .one(db)
        .await
}

/// Organizations the user belongs to, with the user's role in each, by name.
pub async fn list_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Vec<(orgs::Model, MemberRole)>, DbErr> {
    let rows = memberships::Entity::find()
        .filter(memberships::Column::UserId.eq(user_id))
        .find_also_related(orgs::Entity)
        .all(db)
        .await?;
    let mut out: Vec<(orgs::Model, MemberRole)> = rows
        .into_iter()
        .filter_map(|(membership, org)| org.map(|org| (org, membership.role)))
        .collect();
    out.sort_by(|a, b| a.0.name.cmp(&b.0.name).then(a.0.id.cmp(&b.0.id)));
    Ok(out)
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    model: orgs::ActiveModel,
) -> Result<orgs::Model, DbErr> {
    model.insert(db).await
}

pub async fn update<C: ConnectionTrait>(
    db: &C,
    model: orgs::ActiveModel,
) -> Result<orgs::Model, DbErr> {
    model.update(db).await
}

pub async fn member_role<C: ConnectionTrait>(
    db: &C,
    org_id: Uuid,
    user_id: Uuid,
) -> Result<Option<MemberRole>, DbErr> {
    Ok(memberships::Entity::find_by_id((org_id, user_id))
        .one(db)
        .await?
        .map(|m| m.role))
}

pub async fn members<C: ConnectionTrait>(
    db: &C,
    org_id: Uuid,
) -> Result<Vec<memberships::Model>, DbErr> {
    memberships::Entity::find()
        .filter(memberships::Column::OrganizationId.eq(org_id))
        .order_by_asc(memberships::Column::JoinedAt)
        .all(db)
        .await
}

pub async fn find_membership<C: ConnectionTrait>(
    db: &C,
    org_id: Uuid,
    user_id: Uuid,
) -> Result<Option<memberships::Model>, DbErr> {
    memberships::Entity::find_by_id((org_id, user_id)).one(db).await
}

pub async fn add_member<C: ConnectionTrait>(
    db: &C,
    model: memberships::ActiveModel,
) -> Result<memberships::Model, DbErr> {
    model.insert(db).await
}

pub async fn update_member<C: ConnectionTrait>(
    db: &C,
    model: memberships::ActiveModel,
) -> Result<memberships::Model, DbErr> {
    model.update(db).await
}

pub async fn remove_member<C: ConnectionTrait>(
    db: &C,
    org_id: Uuid,
    user_id: Uuid,
) -> Result<bool, DbErr> {
    let res = memberships::Entity::delete_by_id((org_id, user_id)).exec(db).await?;
    Ok(res.rows_affected > 0)
}
