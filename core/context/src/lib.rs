//! helm-context - the cost Budget and its threshold callbacks (§3, §4.1
//! step 8).
//!
//! [`helm_protocol::budget`] holds the plain data shapes (`BudgetConfig`,
//! `BudgetState`); this crate owns the behavior built on top of them - the
//! synchronous threshold-crossing and exhaustion callbacks the Step Loop
//! wires up to surface spend to the caller and, at exhaustion, to stop the
//! run.

pub mod budget;

pub use budget::Budget;
pub use budget::ExhaustedCallback;
pub use budget::ThresholdCallback;
