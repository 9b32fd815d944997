use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConsentRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConsentRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ConsentRequests::EventId).uuid().not_null())
                    .col(ColumnDef::new(ConsentRequests::StudentId).uuid().not_null())
                    .col(
                        ColumnDef::new(ConsentRequests::RequestedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsentRequests::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ConsentRequests::EmailVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ConsentRequests::BlockchainVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ConsentRequests::VerificationToken)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsentRequests::TokenExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsentRequests::TokenConsumedAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(ColumnDef::new(ConsentRequests::IssuanceTicketId).uuid())
                    .col(
                        ColumnDef::new(ConsentRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ConsentRequests::Table, ConsentRequests::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ConsentRequests::Table, ConsentRequests::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(ConsentRequests::Table)
                    .col(ConsentRequests::StudentId)
                    .name("idx_consent_requests_student_id")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(ConsentRequests::Table)
                    .col(ConsentRequests::EventId)
                    .name("idx_consent_requests_event_id")
                    .to_owned(),
            )
            .await?;

        // sea-query has no partial index builder.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_consent_requests_open \
                 ON consent_requests (event_id, student_id) WHERE status = 'pending'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConsentRequests::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ConsentRequests {
    Table,
    Id,
    EventId,
    StudentId,
    RequestedAt,
    Status,
    EmailVerified,
    BlockchainVerified,
    VerificationToken,
    TokenExpiresAt,
    TokenConsumedAt,
    IssuanceTicketId,
    UpdatedAt,
}

#[derive(Iden)]
enum Events {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
