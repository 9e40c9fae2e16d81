//! # Workshop Core
//!
//! Back-office logic for a workshop or small retail counter: inventory,
//! customers, invoicing with stock deduction, and payment reconciliation.
//!
//! ## Features
//!
//! - **Inventory**: Items with sales/cost prices, unique product codes and stock levels
//! - **Customers**: Regular and walk-in customers with partial updates
//! - **Invoicing**: All-or-nothing stock deduction with price-at-sale snapshots
//! - **Payments**: Single-invoice updates and customer payments spread oldest first
//! - **Balances**: Outstanding totals that also pick up legacy invoices matched by name
//! - **Storage abstraction**: Database-agnostic design with an atomic `RecordStore` trait
//!
//! ## Quick Start
//!
//! ```rust
//! use workshop_core::{utils::MemoryStore, NewCustomer, Workshop};
//! use bigdecimal::BigDecimal;
//!
//! # tokio_test_block(async {
//! let mut workshop = Workshop::new(MemoryStore::new());
//! let customer = workshop.create_customer(NewCustomer::named("Suresh")).await.unwrap();
//! let balance = workshop.customer_outstanding_balance(customer.id).await.unwrap();
//! assert_eq!(balance, BigDecimal::from(0));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

pub mod billing;
pub mod catalog;
pub mod observability;
pub mod reports;
pub mod settings;
pub mod traits;
pub mod types;
pub mod utils;
pub mod workshop;

// Re-export commonly used types
pub use billing::*;
pub use catalog::*;
pub use reports::*;
pub use settings::*;
pub use traits::*;
pub use types::*;
pub use workshop::Workshop;
