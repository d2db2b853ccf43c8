//! Types library for the delegated matching-funds engine
//!
//! Core type definitions shared by the persistence layer, the matching
//! engine and the simulation tooling.
//!
//! # Modules
//! - `ids`: Unique identifiers (ProcessId, TransferId, MatchPaymentId, DelegateId)
//! - `numeric`: Fixed-point non-negative `Amount`
//! - `process`: Funding process, phase schedule and status
//! - `transfer`: Committed and candidate transfers
//! - `payment`: Committed match payments
//! - `errors`: Error taxonomy

pub mod ids;
pub mod numeric;
pub mod process;
pub mod transfer;
pub mod payment;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::process::*;
    pub use crate::transfer::*;
    pub use crate::payment::*;
    pub use crate::errors::*;
}
