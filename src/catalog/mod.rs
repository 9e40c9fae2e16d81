//! Catalog module containing item and customer management

pub mod customers;
pub mod items;

pub use customers::*;
pub use items::*;
