use sea_orm_migration::prelude::*;

use crate::create_index;

#[derive(DeriveIden)]
enum EmailSequences {
    Table,
    Id,
    UserId,
    OrganizationId,
    Name,
    Description,
    IsActive,
    IsSharedWithOrganization,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EmailSequenceSteps {
    Table,
    Id,
    SequenceId,
    StepOrder,
    Subject,
    Body,
    CopyType,
    DelayDays,
    DelayHours,
    StopOnReply,
}

#[derive(DeriveIden)]
enum EmailSequenceEnrollments {
    Table,
    Id,
    SequenceId,
    UserId,
    ContactId,
    LeadId,
    RecipientEmail,
    RecipientName,
    CurrentStep,
    Status,
    EnrolledAt,
    LastSentAt,
    NextSendAt,
    CompletedAt,
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
                    .table(EmailSequences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailSequences::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EmailSequences::UserId).uuid().not_null())
                    .col(ColumnDef::new(EmailSequences::OrganizationId).uuid())
                    .col(ColumnDef::new(EmailSequences::Name).string_len(200).not_null())
                    .col(ColumnDef::new(EmailSequences::Description).string_len(1000))
                    .col(
                        ColumnDef::new(EmailSequences::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EmailSequences::IsSharedWithOrganization)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EmailSequences::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EmailSequences::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_sequences_user")
                            .from(EmailSequences::Table, EmailSequences::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmailSequenceSteps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailSequenceSteps::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EmailSequenceSteps::SequenceId).uuid().not_null())
                    .col(ColumnDef::new(EmailSequenceSteps::StepOrder).integer().not_null())
                    .col(
                        ColumnDef::new(EmailSequenceSteps::Subject)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(ColumnDef::new(EmailSequenceSteps::Body).text().not_null())
                    .col(
                        ColumnDef::new(EmailSequenceSteps::CopyType)
                            .string_len(50)
                            .not_null()
                            .default("sales-email"),
                    )
                    .col(
                        ColumnDef::new(EmailSequenceSteps::DelayDays)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EmailSequenceSteps::DelayHours)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EmailSequenceSteps::StopOnReply)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_sequence_steps_sequence")
                            .from(EmailSequenceSteps::Table, EmailSequenceSteps::SequenceId)
                            .to(EmailSequences::Table, EmailSequences::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmailSequenceEnrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailSequenceEnrollments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EmailSequenceEnrollments::SequenceId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EmailSequenceEnrollments::UserId).uuid().not_null())
                    .col(ColumnDef::new(EmailSequenceEnrollments::ContactId).uuid())
                    .col(ColumnDef::new(EmailSequenceEnrollments::LeadId).uuid())
                    .col(ColumnDef::new(EmailSequenceEnrollments::RecipientEmail).string_len(254))
                    .col(ColumnDef::new(EmailSequenceEnrollments::RecipientName).string_len(200))
                    .col(
                        ColumnDef::new(EmailSequenceEnrollments::CurrentStep)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(EmailSequenceEnrollments::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(EmailSequenceEnrollments::EnrolledAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmailSequenceEnrollments::LastSentAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(EmailSequenceEnrollments::NextSendAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(EmailSequenceEnrollments::CompletedAt)
                            .timestamp_with_time_zone(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_sequence_enrollments_sequence")
                            .from(
                                EmailSequenceEnrollments::Table,
                                EmailSequenceEnrollments::SequenceId,
                            )
                            .to(EmailSequences::Table, EmailSequences::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        create_index(
            manager,
            "idx_email_sequences_user",
            EmailSequences::Table,
            EmailSequences::UserId,
        )
        .await?;
        create_index(
            manager,
            "idx_email_sequences_org",
            EmailSequences::Table,
            EmailSequences::OrganizationId,
        )
        .await?;
        create_index(
            manager,
            "idx_email_sequence_steps_sequence",
            EmailSequenceSteps::Table,
            EmailSequenceSteps::SequenceId,
        )
        .await?;
        create_index(
            manager,
            "idx_email_sequence_enrollments_sequence",
            EmailSequenceEnrollments::Table,
            EmailSequenceEnrollments::SequenceId,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmailSequenceEnrollments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EmailSequenceSteps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EmailSequences::Table).to_owned())
            .await
    }
}
