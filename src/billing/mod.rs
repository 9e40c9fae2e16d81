//! Billing: invoices, outstanding balances and payment reconciliation

pub mod balance;
pub mod invoicing;
pub mod payments;

pub use balance::*;
pub use invoicing::*;
pub use payments::*;
