//! Reporting over stored invoices

pub mod sales;

pub use sales::*;
