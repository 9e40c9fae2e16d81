//! Main workshop facade that wires every manager to one record store

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::billing::{BalanceAggregator, InvoiceManager, PaymentManager};
use crate::catalog::{CustomerManager, ItemManager};
use crate::reports::{SalesReporter, SalesTrackerEntry};
use crate::settings::WorkshopConfig;
use crate::traits::*;
use crate::types::*;

/// Workshop back office: inventory, customers, invoices and payments
pub struct Workshop<S: RecordStore> {
    item_manager: ItemManager<S>,
    customer_manager: CustomerManager<S>,
    invoice_manager: InvoiceManager<S>,
    payment_manager: PaymentManager<S>,
    balances: BalanceAggregator<S>,
    sales: SalesReporter<S>,
}

impl<S: RecordStore + Clone> Workshop<S> {
    /// Create a new workshop with the given storage backend and default settings
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, &WorkshopConfig::default())
    }

    /// Create a new workshop with explicit settings
    pub fn with_config(storage: S, config: &WorkshopConfig) -> Self {
        Self::assemble(
            storage,
            config,
            Box::new(DefaultItemValidator),
            Box::new(DefaultCustomerValidator),
        )
    }

    /// Create a new workshop with custom validators
    pub fn with_validators(
        storage: S,
        config: &WorkshopConfig,
        item_validator: Box<dyn ItemValidator>,
        customer_validator: Box<dyn CustomerValidator>,
    ) -> Self {
        Self::assemble(storage, config, item_validator, customer_validator)
    }

    fn assemble(
        storage: S,
        config: &WorkshopConfig,
        item_validator: Box<dyn ItemValidator>,
        customer_validator: Box<dyn CustomerValidator>,
    ) -> Self {
        Self {
            item_manager: ItemManager::with_validator(storage.clone(), item_validator),
            customer_manager: CustomerManager::with_validator(storage.clone(), customer_validator)
                .including_walk_in(config.customers.include_walk_in),
            invoice_manager: InvoiceManager::new(storage.clone()),
            payment_manager: PaymentManager::new(storage.clone())
                .with_negative_amounts_rejected(config.payments.reject_negative_amount_paid),
            balances: BalanceAggregator::new(storage.clone()),
            sales: SalesReporter::new(storage),
        }
    }

    // Item operations
    /// Create a new item
    pub async fn create_item(&mut self, new_item: NewItem) -> WorkshopResult<Item> {
        self.item_manager.create_item(new_item).await
    }

    /// Get an item by ID
    pub async fn get_item(&self, item_id: ItemId) -> WorkshopResult<Option<Item>> {
        self.item_manager.get_item(item_id).await
    }

    /// List all items
    pub async fn list_items(&self) -> WorkshopResult<Vec<Item>> {
        self.item_manager.list_items().await
    }

    /// Partially update an item
    pub async fn update_item(&mut self, item_id: ItemId, update: ItemUpdate) -> WorkshopResult<Item> {
        self.item_manager.update_item(item_id, update).await
    }

    // Customer operations
    /// Create a new customer
    pub async fn create_customer(&mut self, new_customer: NewCustomer) -> WorkshopResult<Customer> {
        self.customer_manager.create_customer(new_customer).await
    }

    /// Get a customer by ID
    pub async fn get_customer(&self, customer_id: CustomerId) -> WorkshopResult<Option<Customer>> {
        self.customer_manager.get_customer(customer_id).await
    }

    /// List customers
    pub async fn list_customers(&self) -> WorkshopResult<Vec<Customer>> {
        self.customer_manager.list_customers().await
    }

    /// Partially update a customer
    pub async fn update_customer(
        &mut self,
        customer_id: CustomerId,
        update: CustomerUpdate,
    ) -> WorkshopResult<Customer> {
        self.customer_manager
            .update_customer(customer_id, update)
            .await
    }

    /// Delete a customer
    pub async fn delete_customer(&mut self, customer_id: CustomerId) -> WorkshopResult<()> {
        self.customer_manager.delete_customer(customer_id).await
    }

    // Invoice operations
    /// Write an invoice and deduct its stock
    pub async fn create_invoice(&mut self, new_invoice: NewInvoice) -> WorkshopResult<Invoice> {
        self.invoice_manager.create_invoice(new_invoice).await
    }

    /// Get an invoice by ID
    pub async fn get_invoice(&self, invoice_id: InvoiceId) -> WorkshopResult<Option<Invoice>> {
        self.invoice_manager.get_invoice(invoice_id).await
    }

    /// Invoices written on a given day
    pub async fn invoices_on(&self, date: NaiveDate) -> WorkshopResult<Vec<Invoice>> {
        self.invoice_manager.invoices_on(date).await
    }

    /// Invoices attributed to a customer, oldest first
    pub async fn customer_invoices(&self, customer_id: CustomerId) -> WorkshopResult<Vec<Invoice>> {
        self.invoice_manager.customer_invoices(customer_id).await
    }

    /// Attach a registered customer to an invoice
    pub async fn assign_invoice_customer(
        &mut self,
        invoice_id: InvoiceId,
        customer_id: CustomerId,
    ) -> WorkshopResult<Invoice> {
        self.invoice_manager
            .assign_invoice_customer(invoice_id, customer_id)
            .await
    }

    // Payment and balance operations
    /// Set the cumulative amount paid on one invoice
    pub async fn update_invoice_payment(
        &mut self,
        invoice_id: InvoiceId,
        amount_paid: BigDecimal,
    ) -> WorkshopResult<Invoice> {
        self.payment_manager
            .update_invoice_payment(invoice_id, amount_paid)
            .await
    }

    /// Spread a customer payment over their outstanding invoices, oldest first
    pub async fn process_customer_payment(
        &mut self,
        customer_id: CustomerId,
        payment_amount: BigDecimal,
    ) -> WorkshopResult<PaymentAllocation> {
        self.payment_manager
            .process_customer_payment(customer_id, payment_amount)
            .await
    }

    /// What a customer still owes
    pub async fn customer_outstanding_balance(
        &self,
        customer_id: CustomerId,
    ) -> WorkshopResult<BigDecimal> {
        self.balances.outstanding_balance(customer_id).await
    }

    // Reporting
    /// Every sold line, newest invoice first
    pub async fn sales_tracker(&self) -> WorkshopResult<Vec<SalesTrackerEntry>> {
        self.sales.sales_tracker().await
    }

    /// Revenue summed per item category
    pub async fn revenue_by_category(&self) -> WorkshopResult<HashMap<String, BigDecimal>> {
        self.sales.revenue_by_category().await
    }
}
