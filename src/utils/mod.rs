pub mod jwt;
pub mod password;
pub mod rate_limiter;
pub mod signature;

pub use jwt::*;
pub use password::*;
pub use rate_limiter::*;
pub use signature::*;
