pub mod blob;
pub mod dpay;
pub mod gateway;
pub mod optimum_pay;
pub mod pusher;
pub mod qbet88;

pub use blob::*;
pub use dpay::*;
pub use gateway::*;
pub use optimum_pay::*;
pub use pusher::*;
pub use qbet88::*;
