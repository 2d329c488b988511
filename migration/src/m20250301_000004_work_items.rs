use sea_orm_migration::prelude::*;

use crate::create_index;

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
    UserId,
    OrganizationId,
    Title,
    Description,
    DueAt,
    ReminderAt,
    ReminderSentAt,
    Status,
    Priority,
    LeadId,
    DealId,
    ContactId,
    CreatedAt,
    UpdatedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum Activities {
    Table,
    Id,
    UserId,
    OrganizationId,
    Kind,
    Subject,
    Body,
    ContactId,
    DealId,
    LeadId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Deals {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Contacts {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Leads {
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
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tasks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tasks::UserId).uuid().not_null())
                    .col(ColumnDef::new(Tasks::OrganizationId).uuid())
                    .col(ColumnDef::new(Tasks::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Tasks::Description).text())
                    .col(ColumnDef::new(Tasks::DueAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Tasks::ReminderAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Tasks::ReminderSentAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .string_len(16)
                            .not_null()
                            .default("todo"),
                    )
                    .col(
                        ColumnDef::new(Tasks::Priority)
                            .string_len(16)
                            .not_null()
                            .default("none"),
                    )
                    .col(ColumnDef::new(Tasks::LeadId).uuid())
                    .col(ColumnDef::new(Tasks::DealId).uuid())
                    .col(ColumnDef::new(Tasks::ContactId).uuid())
                    .col(
                        ColumnDef::new(Tasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Tasks::UpdatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Tasks::CompletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_user")
                            .from(Tasks::Table, Tasks::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_deal")
                            .from(Tasks::Table, Tasks::DealId)
                            .to(Deals::Table, Deals::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_lead")
                            .from(Tasks::Table, Tasks::LeadId)
                            .to(Leads::Table, Leads::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_contact")
                            .from(Tasks::Table, Tasks::ContactId)
                            .to(Contacts::Table, Contacts::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Activities::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Activities::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Activities::UserId).uuid().not_null())
                    .col(ColumnDef::new(Activities::OrganizationId).uuid())
                    .col(ColumnDef::new(Activities::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(Activities::Subject).string_len(256))
                    .col(ColumnDef::new(Activities::Body).text())
                    .col(ColumnDef::new(Activities::ContactId).uuid())
                    .col(ColumnDef::new(Activities::DealId).uuid())
                    .col(ColumnDef::new(Activities::LeadId).uuid())
                    .col(
                        ColumnDef::new(Activities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activities_user")
                            .from(Activities::Table, Activities::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activities_deal")
                            .from(Activities::Table, Activities::DealId)
                            .to(Deals::Table, Deals::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activities_contact")
                            .from(Activities::Table, Activities::ContactId)
                            .to(Contacts::Table, Contacts::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activities_lead")
                            .from(Activities::Table, Activities::LeadId)
                            .to(Leads::Table, Leads::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        create_index(manager, "idx_tasks_org", Tasks::Table, Tasks::OrganizationId).await?;
        create_index(manager, "idx_tasks_user", Tasks::Table, Tasks::UserId).await?;
        create_index(manager, "idx_tasks_deal", Tasks::Table, Tasks::DealId).await?;
        create_index(manager, "idx_tasks_reminder_at", Tasks::Table, Tasks::ReminderAt).await?;
        create_index(
            manager,
            "idx_activities_org",
            Activities::Table,
            Activities::OrganizationId,
        )
        .await?;
        create_index(manager, "idx_activities_deal", Activities::Table, Activities::DealId)
            .await?;
        create_index(
            manager,
            "idx_activities_contact",
            Activities::Table,
            Activities::ContactId,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Activities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await
    }
}
