use crate::m20261017_000001_create_staff_tables::{id_col, ref_col, ts_col};
use sea_orm_migration::prelude::*;

/// The seven ticket tables share one set of base columns.
#[derive(DeriveIden, Clone, Copy)]
enum TicketTable {
    Cashins,
    Cashouts,
    Commissions,
    Concerns,
    CustomerSupports,
    Remittances,
    Tasks,
}

#[derive(DeriveIden)]
enum TicketColumn {
    Id,
    UserId,
    CasinoGroupId,
    Status,
    Version,
    CreatedAt,
    UpdatedAt,
    Amount,
    Note,
    Remarks,
    Subject,
    Message,
    PaymentMethod,
    AccountName,
    AccountNumber,
    ReferenceNumber,
    Title,
    Description,
    AssigneeId,
}

#[derive(DeriveIden)]
enum TicketLogs {
    Table,
    Id,
    TicketType,
    TicketId,
    Action,
    PerformedById,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TicketThreads {
    Table,
    Id,
    TicketType,
    TicketId,
    AuthorId,
    Message,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ThreadAttachments {
    Table,
    Id,
    ParentThreadId,
    Url,
    Filename,
    Mimetype,
    CreatedAt,
}

fn amount() -> ColumnDef {
    ColumnDef::new(TicketColumn::Amount)
        .double()
        .not_null()
        .to_owned()
}

fn optional_text(col: TicketColumn) -> ColumnDef {
    ColumnDef::new(col).text().null().to_owned()
}

fn optional_string(col: TicketColumn) -> ColumnDef {
    ColumnDef::new(col).string_len(255).null().to_owned()
}

fn kind_columns(table: TicketTable) -> Vec<ColumnDef> {
    match table {
        TicketTable::Cashins => vec![amount(), optional_text(TicketColumn::Note)],
        TicketTable::Cashouts => vec![
            amount(),
            optional_string(TicketColumn::PaymentMethod),
            optional_string(TicketColumn::AccountName),
            optional_string(TicketColumn::AccountNumber),
        ],
        TicketTable::Commissions => vec![amount(), optional_text(TicketColumn::Remarks)],
        TicketTable::Concerns | TicketTable::CustomerSupports => vec![
            ColumnDef::new(TicketColumn::Subject)
                .string_len(255)
                .not_null()
                .to_owned(),
            optional_text(TicketColumn::Message),
        ],
        TicketTable::Remittances => vec![
            amount(),
            optional_string(TicketColumn::ReferenceNumber),
            optional_text(TicketColumn::Remarks),
        ],
        TicketTable::Tasks => vec![
            ColumnDef::new(TicketColumn::Title)
                .string_len(255)
                .not_null()
                .to_owned(),
            optional_text(TicketColumn::Description),
            ColumnDef::new(TicketColumn::AssigneeId)
                .string_len(36)
                .null()
                .to_owned(),
        ],
    }
}

fn ticket_table(table: TicketTable) -> TableCreateStatement {
    let mut stmt = Table::create();
    stmt.table(table)
        .if_not_exists()
        .col(id_col(TicketColumn::Id))
        .col(ref_col(TicketColumn::UserId))
        .col(ref_col(TicketColumn::CasinoGroupId));
    for col in kind_columns(table) {
        stmt.col(col);
    }
    stmt.col(
        ColumnDef::new(TicketColumn::Status)
            .string_len(32)
            .not_null()
            .default("PENDING"),
    )
    .col(
        ColumnDef::new(TicketColumn::Version)
            .integer()
            .not_null()
            .default(0),
    )
    .col(ts_col(TicketColumn::CreatedAt))
    .col(ts_col(TicketColumn::UpdatedAt))
    .to_owned()
}

const TABLES: [(TicketTable, &str); 7] = [
    (TicketTable::Cashins, "cashins"),
    (TicketTable::Cashouts, "cashouts"),
    (TicketTable::Commissions, "commissions"),
    (TicketTable::Concerns, "concerns"),
    (TicketTable::CustomerSupports, "customer_supports"),
    (TicketTable::Remittances, "remittances"),
    (TicketTable::Tasks, "tasks"),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (table, name) in TABLES {
            manager.create_table(ticket_table(table)).await?;

            // pending counts query by (group, status)
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(format!("idx_{name}_group_status"))
                        .table(table)
                        .col(TicketColumn::CasinoGroupId)
                        .col(TicketColumn::Status)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(TicketLogs::Table)
                    .if_not_exists()
                    .col(id_col(TicketLogs::Id))
                    .col(ColumnDef::new(TicketLogs::TicketType).string_len(32).not_null())
                    .col(ref_col(TicketLogs::TicketId))
                    .col(ColumnDef::new(TicketLogs::Action).string_len(64).not_null())
                    .col(ref_col(TicketLogs::PerformedById))
                    .col(ts_col(TicketLogs::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ticket_logs_ticket")
                    .table(TicketLogs::Table)
                    .col(TicketLogs::TicketType)
                    .col(TicketLogs::TicketId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketThreads::Table)
                    .if_not_exists()
                    .col(id_col(TicketThreads::Id))
                    .col(
                        ColumnDef::new(TicketThreads::TicketType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ref_col(TicketThreads::TicketId))
                    .col(ref_col(TicketThreads::AuthorId))
                    .col(ColumnDef::new(TicketThreads::Message).text().not_null())
                    .col(ts_col(TicketThreads::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ticket_threads_ticket")
                    .table(TicketThreads::Table)
                    .col(TicketThreads::TicketType)
                    .col(TicketThreads::TicketId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ThreadAttachments::Table)
                    .if_not_exists()
                    .col(id_col(ThreadAttachments::Id))
                    .col(ref_col(ThreadAttachments::ParentThreadId))
                    .col(ColumnDef::new(ThreadAttachments::Url).string_len(1024).not_null())
                    .col(
                        ColumnDef::new(ThreadAttachments::Filename)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ThreadAttachments::Mimetype)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ts_col(ThreadAttachments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_thread_attachments_thread")
                            .from(ThreadAttachments::Table, ThreadAttachments::ParentThreadId)
                            .to(TicketThreads::Table, TicketThreads::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut stmt = Table::drop();
        stmt.table(ThreadAttachments::Table)
            .table(TicketThreads::Table)
            .table(TicketLogs::Table);
        for (table, _) in TABLES {
            stmt.table(table);
        }
        manager.drop_table(stmt.if_exists().to_owned()).await
    }
}
