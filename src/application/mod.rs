pub mod batch;
pub mod controller;

pub use batch::{BatchHealer, TargetResult};
pub use controller::{decide, Decision, SessionController, AUTO_HEAL_CONFIDENCE};
