use crate::m20261017_000001_create_staff_tables::{id_col, ref_col, ts_col};
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum TransactionRequests {
    Table,
    Id,
    CashinId,
    CasinoGroupId,
    ExternalUserId,
    Amount,
    RequestType,
    Status,
    QbetStatus,
    RawRequest,
    CreatedAt,
    UpdatedAt,
}

/// One Dpay merchant credential set per group.
#[derive(DeriveIden)]
enum DpayConfigs {
    Table,
    Id,
    CasinoGroupId,
    MerchantCode,
    SecretKey,
    Active,
    CreatedAt,
    UpdatedAt,
}

/// Gateway settlement and ledger credit are tracked separately.
#[derive(DeriveIden)]
enum PaymentTransactions {
    Table,
    Id,
    Gateway,
    CasinoGroupId,
    InitiatedBy,
    ExternalUserId,
    Amount,
    PaymentType,
    Status,
    QbetStatus,
    TransactionNumber,
    RawRequest,
    RawGatewayResponse,
    RawWebhook,
    ReconcileFlaggedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TransactionRequests::Table)
                    .if_not_exists()
                    .col(id_col(TransactionRequests::Id))
                    .col(
                        ColumnDef::new(TransactionRequests::CashinId)
                            .string_len(36)
                            .null(),
                    )
                    .col(ref_col(TransactionRequests::CasinoGroupId))
                    .col(
                        ColumnDef::new(TransactionRequests::ExternalUserId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionRequests::Amount).double().not_null())
                    .col(
                        ColumnDef::new(TransactionRequests::RequestType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionRequests::Status)
                            .string_len(32)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(TransactionRequests::QbetStatus)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionRequests::RawRequest).text().null())
                    .col(ts_col(TransactionRequests::CreatedAt))
                    .col(ts_col(TransactionRequests::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transaction_requests_group_status")
                    .table(TransactionRequests::Table)
                    .col(TransactionRequests::CasinoGroupId)
                    .col(TransactionRequests::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transaction_requests_cashin")
                    .table(TransactionRequests::Table)
                    .col(TransactionRequests::CashinId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DpayConfigs::Table)
                    .if_not_exists()
                    .col(id_col(DpayConfigs::Id))
                    .col(
                        ColumnDef::new(DpayConfigs::CasinoGroupId)
                            .string_len(36)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(DpayConfigs::MerchantCode)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(DpayConfigs::SecretKey).string_len(255).not_null())
                    .col(
                        ColumnDef::new(DpayConfigs::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ts_col(DpayConfigs::CreatedAt))
                    .col(ts_col(DpayConfigs::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaymentTransactions::Table)
                    .if_not_exists()
                    .col(id_col(PaymentTransactions::Id))
                    .col(
                        ColumnDef::new(PaymentTransactions::Gateway)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ref_col(PaymentTransactions::CasinoGroupId))
                    .col(
                        ColumnDef::new(PaymentTransactions::InitiatedBy)
                            .string_len(36)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PaymentTransactions::ExternalUserId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentTransactions::Amount).double().not_null())
                    .col(
                        ColumnDef::new(PaymentTransactions::PaymentType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentTransactions::Status)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentTransactions::QbetStatus)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentTransactions::TransactionNumber)
                            .string_len(128)
                            .null(),
                    )
                    .col(ColumnDef::new(PaymentTransactions::RawRequest).text().null())
                    .col(
                        ColumnDef::new(PaymentTransactions::RawGatewayResponse)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(PaymentTransactions::RawWebhook).text().null())
                    .col(
                        ColumnDef::new(PaymentTransactions::ReconcileFlaggedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ts_col(PaymentTransactions::CreatedAt))
                    .col(ts_col(PaymentTransactions::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // webhooks look up by gateway transaction number
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_payment_transactions_number")
                    .table(PaymentTransactions::Table)
                    .col(PaymentTransactions::TransactionNumber)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_payment_transactions_status")
                    .table(PaymentTransactions::Table)
                    .col(PaymentTransactions::Status)
                    .col(PaymentTransactions::QbetStatus)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(PaymentTransactions::Table)
                    .table(DpayConfigs::Table)
                    .table(TransactionRequests::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}
