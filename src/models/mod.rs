pub mod pagination;
pub mod payment;
pub mod session;
pub mod staff;
pub mod ticket;
pub mod transaction_request;

pub use pagination::*;
pub use payment::*;
pub use session::*;
pub use staff::*;
pub use ticket::*;
pub use transaction_request::*;
