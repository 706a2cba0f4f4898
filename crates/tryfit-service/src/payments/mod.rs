//! Payment webhook reconciliation.
//!
//! Everything between the raw webhook body and the credit ledger lives
//! here: signature verification over the exact bytes received, the
//! provider-agnostic event shape, and the reconciler that turns a
//! verified event into at most one ledger credit.

pub mod reconcile;
pub mod signature;
pub mod types;

pub use reconcile::Disposition;
pub use types::PaymentEvent;
