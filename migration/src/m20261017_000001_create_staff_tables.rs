use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum CasinoGroups {
    Table,
    Id,
    Name,
    Description,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    Username,
    PasswordHash,
    Role,
    Active,
    IsClockedIn,
    Balance,
    MessengerLink,
    CreatedAt,
    UpdatedAt,
}

/// Groups visible to a user (many to many).
#[derive(DeriveIden)]
enum UserCasinoGroups {
    Table,
    UserId,
    CasinoGroupId,
}

#[derive(DeriveIden)]
enum Attendances {
    Table,
    Id,
    UserId,
    Time,
    Active,
    IpAddress,
    Device,
    ClockedOutAt,
}

#[derive(DeriveIden)]
enum ReadyChecks {
    Table,
    Id,
    InitiatorId,
    StartedAt,
    EndedAt,
    TotalParticipants,
    TotalClockedIn,
}

#[derive(DeriveIden)]
enum ReadyCheckParticipants {
    Table,
    Id,
    ReadyCheckId,
    UserId,
    WasClockedIn,
    Responded,
    RespondedAt,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    UserId,
    Message,
    Link,
    IsRead,
    CreatedAt,
}

#[derive(DeriveIden)]
enum GroupChats {
    Table,
    Id,
    Name,
    Link,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum GroupChatUsers {
    Table,
    GroupChatId,
    UserId,
}

pub(crate) fn id_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .string_len(36)
        .not_null()
        .primary_key()
        .to_owned()
}

pub(crate) fn ref_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).string_len(36).not_null().to_owned()
}

pub(crate) fn ts_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CasinoGroups::Table)
                    .if_not_exists()
                    .col(id_col(CasinoGroups::Id))
                    .col(
                        ColumnDef::new(CasinoGroups::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(CasinoGroups::Description).text().null())
                    .col(
                        ColumnDef::new(CasinoGroups::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ts_col(CasinoGroups::CreatedAt))
                    .col(ts_col(CasinoGroups::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(id_col(Users::Id))
                    .col(ColumnDef::new(Users::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Users::Email).string_len(255).null())
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string_len(255).not_null())
                    .col(ColumnDef::new(Users::Role).string_len(32).not_null())
                    .col(ColumnDef::new(Users::Active).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Users::IsClockedIn)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::Balance).double().not_null().default(0.0))
                    .col(ColumnDef::new(Users::MessengerLink).string_len(512).null())
                    .col(ts_col(Users::CreatedAt))
                    .col(ts_col(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserCasinoGroups::Table)
                    .if_not_exists()
                    .col(ref_col(UserCasinoGroups::UserId))
                    .col(ref_col(UserCasinoGroups::CasinoGroupId))
                    .primary_key(
                        Index::create()
                            .col(UserCasinoGroups::UserId)
                            .col(UserCasinoGroups::CasinoGroupId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_casino_groups_user")
                            .from(UserCasinoGroups::Table, UserCasinoGroups::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_casino_groups_group")
                            .from(UserCasinoGroups::Table, UserCasinoGroups::CasinoGroupId)
                            .to(CasinoGroups::Table, CasinoGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // attendance
        manager
            .create_table(
                Table::create()
                    .table(Attendances::Table)
                    .if_not_exists()
                    .col(id_col(Attendances::Id))
                    .col(ref_col(Attendances::UserId))
                    .col(ts_col(Attendances::Time))
                    .col(ColumnDef::new(Attendances::Active).boolean().not_null())
                    .col(ColumnDef::new(Attendances::IpAddress).string_len(64).null())
                    .col(ColumnDef::new(Attendances::Device).string_len(255).null())
                    .col(
                        ColumnDef::new(Attendances::ClockedOutAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attendances_user_active")
                    .table(Attendances::Table)
                    .col(Attendances::UserId)
                    .col(Attendances::Active)
                    .to_owned(),
            )
            .await?;

        // one open attendance per user
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_attendances_one_active \
                 ON attendances (user_id) WHERE active",
            )
            .await?;

        // ready checks
        manager
            .create_table(
                Table::create()
                    .table(ReadyChecks::Table)
                    .if_not_exists()
                    .col(id_col(ReadyChecks::Id))
                    .col(ref_col(ReadyChecks::InitiatorId))
                    .col(ts_col(ReadyChecks::StartedAt))
                    .col(
                        ColumnDef::new(ReadyChecks::EndedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReadyChecks::TotalParticipants)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ReadyChecks::TotalClockedIn)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReadyCheckParticipants::Table)
                    .if_not_exists()
                    .col(id_col(ReadyCheckParticipants::Id))
                    .col(ref_col(ReadyCheckParticipants::ReadyCheckId))
                    .col(ref_col(ReadyCheckParticipants::UserId))
                    .col(
                        ColumnDef::new(ReadyCheckParticipants::WasClockedIn)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReadyCheckParticipants::Responded)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ReadyCheckParticipants::RespondedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ready_check_participants_check")
                            .from(
                                ReadyCheckParticipants::Table,
                                ReadyCheckParticipants::ReadyCheckId,
                            )
                            .to(ReadyChecks::Table, ReadyChecks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // one row per user per ready check
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ready_check_participants_unique")
                    .table(ReadyCheckParticipants::Table)
                    .col(ReadyCheckParticipants::ReadyCheckId)
                    .col(ReadyCheckParticipants::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(id_col(Notifications::Id))
                    .col(ref_col(Notifications::UserId))
                    .col(ColumnDef::new(Notifications::Message).text().not_null())
                    .col(ColumnDef::new(Notifications::Link).string_len(512).null())
                    .col(
                        ColumnDef::new(Notifications::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ts_col(Notifications::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notifications_user_read")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .col(Notifications::IsRead)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupChats::Table)
                    .if_not_exists()
                    .col(id_col(GroupChats::Id))
                    .col(ColumnDef::new(GroupChats::Name).string_len(255).not_null())
                    .col(ColumnDef::new(GroupChats::Link).string_len(512).null())
                    .col(
                        ColumnDef::new(GroupChats::Status)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ts_col(GroupChats::CreatedAt))
                    .col(ts_col(GroupChats::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupChatUsers::Table)
                    .if_not_exists()
                    .col(ref_col(GroupChatUsers::GroupChatId))
                    .col(ref_col(GroupChatUsers::UserId))
                    .primary_key(
                        Index::create()
                            .col(GroupChatUsers::GroupChatId)
                            .col(GroupChatUsers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_chat_users_chat")
                            .from(GroupChatUsers::Table, GroupChatUsers::GroupChatId)
                            .to(GroupChats::Table, GroupChats::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(GroupChatUsers::Table)
                    .table(GroupChats::Table)
                    .table(Notifications::Table)
                    .table(ReadyCheckParticipants::Table)
                    .table(ReadyChecks::Table)
                    .table(Attendances::Table)
                    .table(UserCasinoGroups::Table)
                    .table(Users::Table)
                    .table(CasinoGroups::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}
