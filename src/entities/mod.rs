pub mod attendances;
pub mod cashins;
pub mod cashouts;
pub mod casino_groups;
pub mod commissions;
pub mod concerns;
pub mod customer_supports;
pub mod dpay_configs;
pub mod group_chat_users;
pub mod group_chats;
pub mod notifications;
pub mod payment_transactions;
pub mod ready_check_participants;
pub mod ready_checks;
pub mod remittances;
pub mod tasks;
pub mod thread_attachments;
pub mod ticket;
pub mod ticket_logs;
pub mod ticket_threads;
pub mod transaction_requests;
pub mod user_casino_groups;
pub mod users;

pub use attendances as attendance_entity;
pub use casino_groups as casino_group_entity;
pub use dpay_configs as dpay_config_entity;
pub use group_chat_users as group_chat_user_entity;
pub use group_chats as group_chat_entity;
pub use notifications as notification_entity;
pub use payment_transactions as payment_transaction_entity;
pub use ready_check_participants as ready_check_participant_entity;
pub use ready_checks as ready_check_entity;
pub use thread_attachments as thread_attachment_entity;
pub use ticket_logs as ticket_log_entity;
pub use ticket_threads as ticket_thread_entity;
pub use transaction_requests as transaction_request_entity;
pub use user_casino_groups as user_casino_group_entity;
pub use users as user_entity;

pub use payment_transactions::{LedgerCreditStatus, PaymentGateway, PaymentType, SettlementStatus};
pub use ticket::{TicketDraft, TicketEntity, TicketHead, TicketKind, TicketPolicy};
pub use transaction_requests::{TransactionRequestStatus, TransactionRequestType};
pub use users::UserRole;
