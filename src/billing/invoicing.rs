//! Invoice creation with stock deduction, invoice queries and customer assignment

use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

use crate::billing::balance::{matched_invoices, sort_oldest_first};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::*;

/// Invoice manager for writing and reading invoices
pub struct InvoiceManager<S: RecordStore> {
    storage: S,
}

impl<S: RecordStore> InvoiceManager<S> {
    /// Create a new invoice manager
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Write an invoice and take its items out of stock.
    ///
    /// Fails as a whole with [`WorkshopError::InsufficientStock`] when any line
    /// asks for more than is on hand (counting earlier lines for the same
    /// item) or names an item that does not exist. Each line keeps the item's
    /// current price. Stock changes and the invoice are committed together.
    #[instrument(
        skip(self, new_invoice),
        fields(client = %new_invoice.client_name, lines = new_invoice.lines.len()),
        err
    )]
    pub async fn create_invoice(&mut self, new_invoice: NewInvoice) -> WorkshopResult<Invoice> {
        validate_invoice_lines(&new_invoice.lines)?;
        validate_name("Client name", &new_invoice.client_name)?;

        if let Some(customer_id) = new_invoice.customer_id {
            if self.storage.find_customer_by_id(customer_id).await?.is_none() {
                return Err(WorkshopError::CustomerNotFound(customer_id));
            }
        }

        // Working copies so repeated items see earlier deductions
        let mut stock: HashMap<ItemId, Item> = HashMap::new();
        let mut touched: Vec<ItemId> = Vec::new();
        let mut lines = Vec::with_capacity(new_invoice.lines.len());

        for request in &new_invoice.lines {
            if !stock.contains_key(&request.item_id) {
                if let Some(item) = self.storage.find_item_by_id(request.item_id).await? {
                    stock.insert(item.id, item);
                }
            }

            let Some(item) = stock.get_mut(&request.item_id) else {
                warn!(item_id = request.item_id, "Invoice line references a missing item");
                return Err(WorkshopError::InsufficientStock {
                    item_id: request.item_id,
                    requested: request.quantity,
                    available: 0,
                });
            };

            if item.quantity < request.quantity {
                warn!(
                    item_id = item.id,
                    requested = request.quantity,
                    available = item.quantity,
                    "Not enough stock for invoice line"
                );
                return Err(WorkshopError::InsufficientStock {
                    item_id: item.id,
                    requested: request.quantity,
                    available: item.quantity,
                });
            }

            item.deduct_stock(request.quantity);
            lines.push(InvoiceLine::snapshot(item, request.quantity));
            if !touched.contains(&item.id) {
                touched.push(item.id);
            }
        }

        let mut invoice = Invoice::new(
            new_invoice.customer_id,
            new_invoice.client_name,
            BigDecimal::from(0),
            chrono::Utc::now().naive_utc(),
        );
        invoice.client_phone = new_invoice.client_phone;
        invoice.lines = lines;
        invoice.total_amount = invoice.lines_total();
        invoice.set_amount_paid(new_invoice.amount_paid.unwrap_or_else(|| BigDecimal::from(0)));

        let mut unit = UnitOfWork::new();
        for item_id in &touched {
            if let Some(item) = stock.remove(item_id) {
                unit.push(Mutation::UpdateItem(item));
            }
        }
        unit.push(Mutation::InsertInvoice(invoice));

        let receipt = self.storage.commit(unit).await?;
        let invoice_id = receipt.first_inserted()?;
        let invoice = self.get_invoice_required(invoice_id).await?;

        info!(
            invoice_id,
            total = %invoice.total_amount,
            status = ?invoice.payment_status,
            "Created invoice"
        );
        Ok(invoice)
    }

    /// Get an invoice by ID
    pub async fn get_invoice(&self, invoice_id: InvoiceId) -> WorkshopResult<Option<Invoice>> {
        self.storage.find_invoice_by_id(invoice_id).await
    }

    /// Get an invoice by ID, returning an error if not found
    pub async fn get_invoice_required(&self, invoice_id: InvoiceId) -> WorkshopResult<Invoice> {
        self.storage
            .find_invoice_by_id(invoice_id)
            .await?
            .ok_or(WorkshopError::InvoiceNotFound(invoice_id))
    }

    /// Invoices written on `date` (UTC), oldest first
    pub async fn invoices_on(&self, date: NaiveDate) -> WorkshopResult<Vec<Invoice>> {
        let start = date.and_time(chrono::NaiveTime::MIN);
        let end = start + Duration::days(1);
        let mut invoices = self.storage.find_invoices_created_between(start, end).await?;
        sort_oldest_first(&mut invoices);
        Ok(invoices)
    }

    /// All invoices attributed to a customer, by id or by legacy name, oldest first
    pub async fn customer_invoices(&self, customer_id: CustomerId) -> WorkshopResult<Vec<Invoice>> {
        let customer = self
            .storage
            .find_customer_by_id(customer_id)
            .await?
            .ok_or(WorkshopError::CustomerNotFound(customer_id))?;
        matched_invoices(&self.storage, &customer).await
    }

    /// Attach a registered customer to an invoice
    #[instrument(skip(self), err)]
    pub async fn assign_invoice_customer(
        &mut self,
        invoice_id: InvoiceId,
        customer_id: CustomerId,
    ) -> WorkshopResult<Invoice> {
        let mut invoice = self.get_invoice_required(invoice_id).await?;
        if self.storage.find_customer_by_id(customer_id).await?.is_none() {
            return Err(WorkshopError::CustomerNotFound(customer_id));
        }

        invoice.customer_id = Some(customer_id);
        self.storage
            .commit(UnitOfWork::new().with(Mutation::UpdateInvoice(invoice.clone())))
            .await?;

        info!(invoice_id, customer_id, "Assigned customer to invoice");
        Ok(invoice)
    }
}
