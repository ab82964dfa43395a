pub mod account_service;
pub mod attendance_service;
pub mod auth_service;
pub mod casino_group_service;
pub mod group_chat_service;
pub mod ledger_service;
pub mod notification_service;
pub mod payment_service;
pub mod pending_count;
pub mod ready_check_service;
pub mod realtime_service;
pub mod ticket_service;
pub mod transaction_request_service;

pub use account_service::*;
pub use attendance_service::*;
pub use auth_service::*;
pub use casino_group_service::*;
pub use group_chat_service::*;
pub use ledger_service::*;
pub use notification_service::*;
pub use payment_service::*;
pub use ready_check_service::*;
pub use realtime_service::*;
pub use ticket_service::*;
pub use transaction_request_service::*;
