use sea_orm_migration::prelude::*;

use crate::create_index;

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
    UserId,
    OrganizationId,
    Name,
    Domain,
    Industry,
    Size,
    CreatedAt,
    UpdatedAt,
    UpdatedBy,
}

#[derive(DeriveIden)]
enum Contacts {
    Table,
    Id,
    UserId,
    OrganizationId,
    Name,
    Email,
    Phone,
    JobTitle,
    CompanyId,
    DoNotContact,
    ConvertedFromLeadId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Leads {
    Table,
    Id,
    UserId,
    OrganizationId,
    Name,
    Email,
    Phone,
    CompanyId,
    Source,
    Status,
    Description,
    IsConverted,
    ConvertedAt,
    ConvertedToContactId,
    ConvertedToDealId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
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
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Companies::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Companies::UserId).uuid().not_null())
                    .col(ColumnDef::new(Companies::OrganizationId).uuid())
                    .col(ColumnDef::new(Companies::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Companies::Domain).string_len(253))
                    .col(ColumnDef::new(Companies::Industry).string_len(128))
                    .col(ColumnDef::new(Companies::Size).string_len(64))
                    .col(
                        ColumnDef::new(Companies::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Companies::UpdatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Companies::UpdatedBy).uuid())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_companies_user")
                            .from(Companies::Table, Companies::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Contacts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Contacts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Contacts::UserId).uuid().not_null())
                    .col(ColumnDef::new(Contacts::OrganizationId).uuid())
                    .col(ColumnDef::new(Contacts::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Contacts::Email).string_len(254).not_null())
                    .col(ColumnDef::new(Contacts::Phone).string_len(50))
                    .col(ColumnDef::new(Contacts::JobTitle).string_len(128))
                    .col(ColumnDef::new(Contacts::CompanyId).uuid())
                    .col(
                        ColumnDef::new(Contacts::DoNotContact)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Contacts::ConvertedFromLeadId).uuid())
                    .col(
                        ColumnDef::new(Contacts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Contacts::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contacts_user")
                            .from(Contacts::Table, Contacts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contacts_company")
                            .from(Contacts::Table, Contacts::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Leads::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Leads::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Leads::UserId).uuid().not_null())
                    .col(ColumnDef::new(Leads::OrganizationId).uuid())
                    .col(ColumnDef::new(Leads::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Leads::Email).string_len(254).not_null())
                    .col(ColumnDef::new(Leads::Phone).string_len(50))
                    .col(ColumnDef::new(Leads::CompanyId).uuid())
                    .col(ColumnDef::new(Leads::Source).string_len(128))
                    .col(
                        ColumnDef::new(Leads::Status)
                            .string_len(64)
                            .not_null()
                            .default("New"),
                    )
                    .col(ColumnDef::new(Leads::Description).text())
                    .col(
                        ColumnDef::new(Leads::IsConverted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Leads::ConvertedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Leads::ConvertedToContactId).uuid())
                    .col(ColumnDef::new(Leads::ConvertedToDealId).uuid())
                    .col(
                        ColumnDef::new(Leads::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Leads::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leads_user")
                            .from(Leads::Table, Leads::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leads_company")
                            .from(Leads::Table, Leads::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        create_index(
            manager,
            "idx_companies_org",
            Companies::Table,
            Companies::OrganizationId,
        )
        .await?;
        create_index(manager, "idx_companies_user", Companies::Table, Companies::UserId).await?;
        create_index(manager, "idx_contacts_org", Contacts::Table, Contacts::OrganizationId).await?;
        create_index(manager, "idx_contacts_company", Contacts::Table, Contacts::CompanyId).await?;
        create_index(manager, "idx_leads_org", Leads::Table, Leads::OrganizationId).await?;
        create_index(manager, "idx_leads_user", Leads::Table, Leads::UserId).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Leads::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contacts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Companies::Table).to_owned())
            .await
    }
}
