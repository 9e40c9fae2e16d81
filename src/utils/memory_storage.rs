//! In-memory record store for testing and development

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Clone, Default)]
struct Tables {
    customers: BTreeMap<CustomerId, Customer>,
    items: BTreeMap<ItemId, Item>,
    invoices: BTreeMap<InvoiceId, Invoice>,
    last_customer_id: i64,
    last_item_id: i64,
    last_invoice_id: i64,
    last_line_id: i64,
}

impl Tables {
    fn apply(&mut self, mutation: Mutation, receipt: &mut CommitReceipt) -> WorkshopResult<()> {
        match mutation {
            Mutation::InsertCustomer(mut customer) => {
                self.last_customer_id += 1;
                customer.id = self.last_customer_id;
                receipt.inserted_ids.push(customer.id);
                self.customers.insert(customer.id, customer);
            }
            Mutation::UpdateCustomer(customer) => {
                let stored = self
                    .customers
                    .get_mut(&customer.id)
                    .ok_or(WorkshopError::CustomerNotFound(customer.id))?;
                *stored = customer;
            }
            Mutation::DeleteCustomer(id) => {
                self.customers
                    .remove(&id)
                    .ok_or(WorkshopError::CustomerNotFound(id))?;
            }
            Mutation::InsertItem(mut item) => {
                self.last_item_id += 1;
                item.id = self.last_item_id;
                receipt.inserted_ids.push(item.id);
                self.items.insert(item.id, item);
            }
            Mutation::UpdateItem(item) => {
                let stored = self
                    .items
                    .get_mut(&item.id)
                    .ok_or(WorkshopError::ItemNotFound(item.id))?;
                *stored = item;
            }
            Mutation::InsertInvoice(mut invoice) => {
                self.last_invoice_id += 1;
                invoice.id = self.last_invoice_id;
                for line in &mut invoice.lines {
                    self.last_line_id += 1;
                    line.id = self.last_line_id;
                    line.invoice_id = invoice.id;
                }
                receipt.inserted_ids.push(invoice.id);
                self.invoices.insert(invoice.id, invoice);
            }
            Mutation::UpdateInvoice(mut invoice) => {
                let stored = self
                    .invoices
                    .get_mut(&invoice.id)
                    .ok_or(WorkshopError::InvoiceNotFound(invoice.id))?;
                // Lines are written once, at insert
                invoice.lines = std::mem::take(&mut stored.lines);
                *stored = invoice;
            }
        }
        Ok(())
    }
}

/// In-memory record store for testing and development
///
/// All tables sit behind a single lock, so a commit is applied to a staged
/// copy and swapped in only when every mutation succeeded. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create a new memory store instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit fail with a storage error before applying anything
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    fn read(&self) -> WorkshopResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| WorkshopError::Storage("Memory store lock poisoned".to_string()))
    }

    fn write(&self) -> WorkshopResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| WorkshopError::Storage("Memory store lock poisoned".to_string()))
    }

    fn select_invoices<F>(&self, predicate: F) -> WorkshopResult<Vec<Invoice>>
    where
        F: Fn(&Invoice) -> bool,
    {
        Ok(self
            .read()?
            .invoices
            .values()
            .filter(|invoice| predicate(invoice))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_customer_by_id(&self, id: CustomerId) -> WorkshopResult<Option<Customer>> {
        Ok(self.read()?.customers.get(&id).cloned())
    }

    async fn list_customers(
        &self,
        customer_type: Option<CustomerType>,
    ) -> WorkshopResult<Vec<Customer>> {
        Ok(self
            .read()?
            .customers
            .values()
            .filter(|customer| customer_type.is_none_or(|t| customer.customer_type == t))
            .cloned()
            .collect())
    }

    async fn find_invoice_by_id(&self, id: InvoiceId) -> WorkshopResult<Option<Invoice>> {
        Ok(self.read()?.invoices.get(&id).cloned())
    }

    async fn find_invoices_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> WorkshopResult<Vec<Invoice>> {
        self.select_invoices(|invoice| invoice.customer_id == Some(customer_id))
    }

    async fn find_invoices_by_client_name_with_null_customer_id(
        &self,
        name: &str,
    ) -> WorkshopResult<Vec<Invoice>> {
        self.select_invoices(|invoice| invoice.customer_id.is_none() && invoice.client_name == name)
    }

    async fn find_invoices_created_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> WorkshopResult<Vec<Invoice>> {
        self.select_invoices(|invoice| invoice.created_at >= start && invoice.created_at < end)
    }

    async fn list_invoices(&self) -> WorkshopResult<Vec<Invoice>> {
        self.select_invoices(|_| true)
    }

    async fn find_item_by_id(&self, id: ItemId) -> WorkshopResult<Option<Item>> {
        Ok(self.read()?.items.get(&id).cloned())
    }

    async fn find_item_by_product_code(&self, product_code: &str) -> WorkshopResult<Option<Item>> {
        Ok(self
            .read()?
            .items
            .values()
            .find(|item| item.product_code == product_code)
            .cloned())
    }

    async fn list_items(&self) -> WorkshopResult<Vec<Item>> {
        Ok(self.read()?.items.values().cloned().collect())
    }

    async fn commit(&mut self, unit: UnitOfWork) -> WorkshopResult<CommitReceipt> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(WorkshopError::Storage(
                "Injected commit failure".to_string(),
            ));
        }

        let mut tables = self.write()?;
        let mut staged = tables.clone();
        let mut receipt = CommitReceipt::default();

        for mutation in unit.mutations {
            staged.apply(mutation, &mut receipt)?;
        }

        *tables = staged;
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let mut store = MemoryStore::new();
        let receipt = store
            .commit(
                UnitOfWork::new()
                    .with(Mutation::InsertCustomer(Customer::from_new(
                        NewCustomer::named("Meera"),
                    )))
                    .with(Mutation::InsertCustomer(Customer::from_new(
                        NewCustomer::named("Joseph"),
                    ))),
            )
            .await
            .unwrap();

        assert_eq!(receipt.inserted_ids, vec![1, 2]);
        let joseph = store.find_customer_by_id(2).await.unwrap().unwrap();
        assert_eq!(joseph.name, "Joseph");
    }

    #[tokio::test]
    async fn test_failed_mutation_rolls_back_unit() {
        let mut store = MemoryStore::new();
        let result = store
            .commit(
                UnitOfWork::new()
                    .with(Mutation::InsertCustomer(Customer::from_new(
                        NewCustomer::named("Meera"),
                    )))
                    .with(Mutation::DeleteCustomer(99)),
            )
            .await;

        assert!(matches!(result, Err(WorkshopError::CustomerNotFound(99))));
        assert!(store.list_customers(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure_applies_nothing() {
        let mut store = MemoryStore::new();
        store.fail_next_commit();
        let unit = UnitOfWork::new().with(Mutation::InsertCustomer(Customer::from_new(
            NewCustomer::named("Meera"),
        )));

        assert!(store.commit(unit.clone()).await.is_err());
        assert!(store.list_customers(None).await.unwrap().is_empty());

        // Only the next commit fails
        assert!(store.commit(unit).await.is_ok());
    }

    #[tokio::test]
    async fn test_invoice_update_keeps_lines() {
        let mut store = MemoryStore::new();
        let mut invoice = Invoice::new(None, "Walk-in".to_string(), BigDecimal::from(90), at(1));
        invoice.lines.push(InvoiceLine {
            id: UNASSIGNED_ID,
            invoice_id: UNASSIGNED_ID,
            item_id: 3,
            quantity: 2,
            unit_price: BigDecimal::from(45),
        });
        let id = store
            .commit(UnitOfWork::new().with(Mutation::InsertInvoice(invoice)))
            .await
            .unwrap()
            .first_inserted()
            .unwrap();

        let mut header = store.find_invoice_by_id(id).await.unwrap().unwrap();
        assert_eq!(header.lines[0].invoice_id, id);
        header.lines.clear();
        header.set_amount_paid(BigDecimal::from(90));
        store
            .commit(UnitOfWork::new().with(Mutation::UpdateInvoice(header)))
            .await
            .unwrap();

        let stored = store.find_invoice_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
        assert_eq!(stored.lines.len(), 1);
        assert_eq!(stored.lines[0].unit_price, BigDecimal::from(45));
    }

    #[tokio::test]
    async fn test_invoice_queries() {
        let mut store = MemoryStore::new();
        let mut owned = Invoice::new(Some(1), "Meera".to_string(), BigDecimal::from(10), at(1));
        owned.client_phone = Some("555-0101".to_string());
        let legacy = Invoice::new(None, "Meera".to_string(), BigDecimal::from(20), at(2));
        let other = Invoice::new(Some(2), "Meera".to_string(), BigDecimal::from(30), at(3));
        store
            .commit(
                UnitOfWork::new()
                    .with(Mutation::InsertInvoice(owned))
                    .with(Mutation::InsertInvoice(legacy))
                    .with(Mutation::InsertInvoice(other)),
            )
            .await
            .unwrap();

        assert_eq!(store.find_invoices_by_customer_id(1).await.unwrap().len(), 1);
        let by_name = store
            .find_invoices_by_client_name_with_null_customer_id("Meera")
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].total_amount, BigDecimal::from(20));

        let window = store
            .find_invoices_created_between(at(2), at(3))
            .await
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(store.list_invoices().await.unwrap().len(), 3);
    }
}
