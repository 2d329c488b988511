use sea_orm_migration::prelude::*;

use crate::create_index;

#[derive(DeriveIden)]
enum Pipelines {
    Table,
    Id,
    OrganizationId,
    Name,
    DisplayOrder,
}

#[derive(DeriveIden)]
enum DealStages {
    Table,
    Id,
    PipelineId,
    Name,
    DisplayOrder,
    IsWon,
    IsLost,
}

#[derive(DeriveIden)]
enum Deals {
    Table,
    Id,
    UserId,
    OrganizationId,
    Name,
    Value,
    Currency,
    Stage,
    PipelineId,
    DealStageId,
    CompanyId,
    ContactId,
    AssigneeId,
    ExpectedCloseDate,
    IsWon,
    CreatedAt,
    UpdatedAt,
    UpdatedBy,
}

#[derive(DeriveIden)]
enum DealStageChanges {
    Table,
    Id,
    DealId,
    FromDealStageId,
    FromStageName,
    ToDealStageId,
    ToStageName,
    ChangedByUserId,
    ChangedAt,
}

#[derive(DeriveIden)]
enum Orgs {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Pipelines::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Pipelines::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Pipelines::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(Pipelines::Name).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Pipelines::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pipelines_org")
                            .from(Pipelines::Table, Pipelines::OrganizationId)
                            .to(Orgs::Table, Orgs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DealStages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DealStages::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DealStages::PipelineId).uuid().not_null())
                    .col(ColumnDef::new(DealStages::Name).string_len(128).not_null())
                    .col(
                        ColumnDef::new(DealStages::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DealStages::IsWon)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DealStages::IsLost)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deal_stages_pipeline")
                            .from(DealStages::Table, DealStages::PipelineId)
                            .to(Pipelines::Table, Pipelines::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Deals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Deals::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Deals::UserId).uuid().not_null())
                    .col(ColumnDef::new(Deals::OrganizationId).uuid())
                    .col(ColumnDef::new(Deals::Name).string_len(512).not_null())
                    .col(ColumnDef::new(Deals::Value).string_len(64).not_null())
                    .col(ColumnDef::new(Deals::Currency).string_len(8))
                    .col(ColumnDef::new(Deals::Stage).string_len(128))
                    .col(ColumnDef::new(Deals::PipelineId).uuid())
                    .col(ColumnDef::new(Deals::DealStageId).uuid())
                    .col(ColumnDef::new(Deals::CompanyId).uuid())
                    .col(ColumnDef::new(Deals::ContactId).uuid())
                    .col(ColumnDef::new(Deals::AssigneeId).uuid())
                    .col(ColumnDef::new(Deals::ExpectedCloseDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(Deals::IsWon).boolean())
                    .col(
                        ColumnDef::new(Deals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Deals::UpdatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Deals::UpdatedBy).uuid())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deals_user")
                            .from(Deals::Table, Deals::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deals_pipeline")
                            .from(Deals::Table, Deals::PipelineId)
                            .to(Pipelines::Table, Pipelines::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deals_deal_stage")
                            .from(Deals::Table, Deals::DealStageId)
                            .to(DealStages::Table, DealStages::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deals_company")
                            .from(Deals::Table, Deals::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DealStageChanges::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DealStageChanges::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DealStageChanges::DealId).uuid().not_null())
                    .col(ColumnDef::new(DealStageChanges::FromDealStageId).uuid())
                    .col(ColumnDef::new(DealStageChanges::FromStageName).string_len(128))
                    .col(ColumnDef::new(DealStageChanges::ToDealStageId).uuid())
                    .col(ColumnDef::new(DealStageChanges::ToStageName).string_len(128))
                    .col(
                        ColumnDef::new(DealStageChanges::ChangedByUserId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DealStageChanges::ChangedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deal_stage_changes_deal")
                            .from(DealStageChanges::Table, DealStageChanges::DealId)
                            .to(Deals::Table, Deals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        create_index(manager, "idx_pipelines_org", Pipelines::Table, Pipelines::OrganizationId)
            .await?;
        create_index(
            manager,
            "idx_deal_stages_pipeline",
            DealStages::Table,
            DealStages::PipelineId,
        )
        .await?;
        create_index(manager, "idx_deals_org", Deals::Table, Deals::OrganizationId).await?;
        create_index(manager, "idx_deals_user", Deals::Table, Deals::UserId).await?;
        create_index(manager, "idx_deals_pipeline", Deals::Table, Deals::PipelineId).await?;
        create_index(manager, "idx_deals_deal_stage", Deals::Table, Deals::DealStageId).await?;
        create_index(
            manager,
            "idx_deal_stage_changes_deal",
            DealStageChanges::Table,
            DealStageChanges::DealId,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DealStageChanges::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Deals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DealStages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Pipelines::Table).to_owned())
            .await
    }
}
