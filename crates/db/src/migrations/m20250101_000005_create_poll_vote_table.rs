//! Create poll vote table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PollVote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PollVote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PollVote::PollId).string_len(32).not_null())
                    .col(ColumnDef::new(PollVote::VoterId).string_len(32).not_null())
                    .col(ColumnDef::new(PollVote::OwnerId).string_len(32).not_null())
                    .col(ColumnDef::new(PollVote::OptionText).string_len(256).not_null())
                    .col(ColumnDef::new(PollVote::Docstatus).integer().not_null().default(0))
                    .col(ColumnDef::new(PollVote::AmendedFrom).string_len(32))
                    .col(
                        ColumnDef::new(PollVote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(PollVote::UpdatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(PollVote::SubmittedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_vote_poll")
                            .from(PollVote::Table, PollVote::PollId)
                            .to(Poll::Table, Poll::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_vote_voter")
                            .from(PollVote::Table, PollVote::VoterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (poll_id, voter_id, docstatus) - duplicate-vote check
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_vote_poll_voter_status")
                    .table(PollVote::Table)
                    .col(PollVote::PollId)
                    .col(PollVote::VoterId)
                    .col(PollVote::Docstatus)
                    .to_owned(),
            )
            .await?;

        // Index: owner_id (for listing a user's own votes)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_vote_owner_id")
                    .table(PollVote::Table)
                    .col(PollVote::OwnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PollVote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PollVote {
    Table,
    Id,
    PollId,
    VoterId,
    OwnerId,
    OptionText,
    Docstatus,
    AmendedFrom,
    CreatedAt,
    UpdatedAt,
    SubmittedAt,
}

#[derive(Iden)]
enum Poll {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
