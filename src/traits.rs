//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::types::*;
use crate::utils::validation::*;

/// Storage abstraction for the workshop system
///
/// The workshop logic never talks to a database directly. Any backend
/// (PostgreSQL, SQLite, in-memory, etc.) can be used by implementing these
/// lookups plus an atomic [`RecordStore::commit`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Get a customer by ID
    async fn find_customer_by_id(&self, id: CustomerId) -> WorkshopResult<Option<Customer>>;

    /// List customers, optionally filtered by type, in id order
    async fn list_customers(
        &self,
        customer_type: Option<CustomerType>,
    ) -> WorkshopResult<Vec<Customer>>;

    /// Get an invoice by ID, lines included
    async fn find_invoice_by_id(&self, id: InvoiceId) -> WorkshopResult<Option<Invoice>>;

    /// Invoices whose `customer_id` equals `customer_id`
    async fn find_invoices_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> WorkshopResult<Vec<Invoice>>;

    /// Invoices without a `customer_id` whose `client_name` equals `name`
    async fn find_invoices_by_client_name_with_null_customer_id(
        &self,
        name: &str,
    ) -> WorkshopResult<Vec<Invoice>>;

    /// Invoices created in `[start, end)`
    async fn find_invoices_created_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> WorkshopResult<Vec<Invoice>>;

    /// Every invoice, in id order
    async fn list_invoices(&self) -> WorkshopResult<Vec<Invoice>>;

    /// Get an item by ID
    async fn find_item_by_id(&self, id: ItemId) -> WorkshopResult<Option<Item>>;

    /// Get an item by its product code
    async fn find_item_by_product_code(&self, product_code: &str) -> WorkshopResult<Option<Item>>;

    /// Every item, in id order
    async fn list_items(&self) -> WorkshopResult<Vec<Item>>;

    /// Apply every mutation in `unit` as one atomic step.
    ///
    /// Either all mutations become visible or none do. Updates and deletes of
    /// records that do not exist fail the whole unit. Updating an invoice
    /// replaces its header only; stored lines are never rewritten.
    async fn commit(&mut self, unit: UnitOfWork) -> WorkshopResult<CommitReceipt>;
}

/// A single write against the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    InsertCustomer(Customer),
    UpdateCustomer(Customer),
    DeleteCustomer(CustomerId),
    InsertItem(Item),
    UpdateItem(Item),
    /// Insert an invoice together with its lines
    InsertInvoice(Invoice),
    /// Replace an invoice header
    UpdateInvoice(Invoice),
}

/// Batch of mutations committed together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitOfWork {
    pub mutations: Vec<Mutation>,
}

impl UnitOfWork {
    /// Create an empty unit of work
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a mutation
    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    /// Queue a mutation, builder style
    pub fn with(mut self, mutation: Mutation) -> Self {
        self.push(mutation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }
}

/// Result of a successful commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// Ids assigned to inserted records, in mutation order
    pub inserted_ids: Vec<i64>,
}

impl CommitReceipt {
    /// Id of the first inserted record
    pub fn first_inserted(&self) -> WorkshopResult<i64> {
        self.inserted_ids
            .first()
            .copied()
            .ok_or_else(|| WorkshopError::Storage("Commit did not insert any record".to_string()))
    }
}

/// Trait for implementing custom item validation rules
pub trait ItemValidator: Send + Sync {
    /// Validate an item before saving
    fn validate_item(&self, item: &Item) -> WorkshopResult<()>;
}

/// Trait for implementing custom customer validation rules
pub trait CustomerValidator: Send + Sync {
    /// Validate a customer before saving
    fn validate_customer(&self, customer: &Customer) -> WorkshopResult<()>;

    /// Validate customer deletion (e.g., refuse when invoices still reference it)
    fn validate_customer_deletion(&self, customer: &Customer) -> WorkshopResult<()>;
}

/// Default item validator with basic catalog rules
pub struct DefaultItemValidator;

impl ItemValidator for DefaultItemValidator {
    fn validate_item(&self, item: &Item) -> WorkshopResult<()> {
        validate_name("Item name", &item.name)?;
        validate_product_code(&item.product_code)?;
        validate_name("Item category", &item.category)?;
        validate_non_negative_amount("Item price", &item.price)?;
        validate_non_negative_amount("Item purchase price", &item.purchase_price)?;
        if item.quantity < 0 {
            return Err(WorkshopError::Validation(
                "Item quantity cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default customer validator
pub struct DefaultCustomerValidator;

impl CustomerValidator for DefaultCustomerValidator {
    fn validate_customer(&self, customer: &Customer) -> WorkshopResult<()> {
        validate_name("Customer name", &customer.name)
    }

    fn validate_customer_deletion(&self, _customer: &Customer) -> WorkshopResult<()> {
        // Invoices keep their customer_id when a customer goes away
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    fn item() -> Item {
        Item::from_new(NewItem {
            name: "Brake pad".to_string(),
            price: BigDecimal::from(450),
            purchase_price: BigDecimal::from(300),
            product_code: "BP-01".to_string(),
            category: "Brakes".to_string(),
            image_filename: None,
            quantity: 4,
        })
    }

    #[test]
    fn test_unit_of_work_queues_in_order() {
        let mut unit = UnitOfWork::new();
        assert!(unit.is_empty());

        unit.push(Mutation::InsertItem(item()));
        let unit = unit.with(Mutation::DeleteCustomer(3));
        assert!(!unit.is_empty());
        assert_eq!(unit.len(), 2);
        assert!(matches!(unit.mutations[1], Mutation::DeleteCustomer(3)));
    }

    #[test]
    fn test_default_item_validator() {
        let validator = DefaultItemValidator;
        assert!(validator.validate_item(&item()).is_ok());

        let mut negative_stock = item();
        negative_stock.quantity = -1;
        assert!(validator.validate_item(&negative_stock).is_err());

        let mut blank_code = item();
        blank_code.product_code = "  ".to_string();
        assert!(validator.validate_item(&blank_code).is_err());
    }

    #[test]
    fn test_default_customer_validator() {
        let validator = DefaultCustomerValidator;
        let customer = Customer::from_new(NewCustomer::named("Anita"));
        assert!(validator.validate_customer(&customer).is_ok());
        assert!(validator.validate_customer_deletion(&customer).is_ok());

        let nameless = Customer::from_new(NewCustomer::named(""));
        assert!(validator.validate_customer(&nameless).is_err());
    }

    #[test]
    fn test_commit_receipt_first_inserted() {
        let receipt = CommitReceipt {
            inserted_ids: vec![12, 13],
        };
        assert_eq!(receipt.first_inserted().unwrap(), 12);
        assert!(CommitReceipt::default().first_inserted().is_err());
    }
}
