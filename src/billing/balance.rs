//! Outstanding balance aggregation across a customer's invoices

use bigdecimal::BigDecimal;
use tracing::{debug, instrument};

use crate::traits::*;
use crate::types::*;

/// Every invoice belonging to `customer`, oldest first.
///
/// Runs the two halves of the [`InvoiceMatch`] rule as separate queries and
/// keeps only what the rule attributes to `customer` from each. They cannot
/// overlap: the first arm needs a `customer_id`, the second needs none. Ties
/// on `created_at` fall back to id order.
pub async fn matched_invoices<S: RecordStore + ?Sized>(
    storage: &S,
    customer: &Customer,
) -> WorkshopResult<Vec<Invoice>> {
    let mut invoices = attributed_to(
        customer,
        storage.find_invoices_by_customer_id(customer.id).await?,
        InvoiceMatch::ById,
    );
    invoices.extend(attributed_to(
        customer,
        storage
            .find_invoices_by_client_name_with_null_customer_id(&customer.name)
            .await?,
        InvoiceMatch::ByLegacyName,
    ));
    sort_oldest_first(&mut invoices);
    Ok(invoices)
}

/// Keep the invoices that [`InvoiceMatch::resolve`] attributes to `customer`
/// through `rule`
pub fn attributed_to(customer: &Customer, invoices: Vec<Invoice>, rule: InvoiceMatch) -> Vec<Invoice> {
    invoices
        .into_iter()
        .filter(|invoice| InvoiceMatch::resolve(customer, invoice) == Some(rule))
        .collect()
}

/// Order invoices by creation time, then id
pub fn sort_oldest_first(invoices: &mut [Invoice]) {
    invoices.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

/// Sum of the positive outstanding balances in `invoices`
pub fn positive_outstanding_total(invoices: &[Invoice]) -> BigDecimal {
    let zero = BigDecimal::from(0);
    invoices
        .iter()
        .map(|invoice| &invoice.outstanding_balance)
        .filter(|balance| **balance > zero)
        .sum()
}

/// Computes what a customer still owes
pub struct BalanceAggregator<S: RecordStore> {
    storage: S,
}

impl<S: RecordStore> BalanceAggregator<S> {
    /// Create a new balance aggregator
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Total outstanding balance for a customer.
    ///
    /// Unknown customers owe nothing. The result is never negative.
    #[instrument(skip(self), err)]
    pub async fn outstanding_balance(&self, customer_id: CustomerId) -> WorkshopResult<BigDecimal> {
        let Some(customer) = self.storage.find_customer_by_id(customer_id).await? else {
            debug!(customer_id, "Unknown customer, reporting zero balance");
            return Ok(BigDecimal::from(0));
        };

        let by_id = attributed_to(
            &customer,
            self.storage.find_invoices_by_customer_id(customer.id).await?,
            InvoiceMatch::ById,
        );
        let by_name = attributed_to(
            &customer,
            self.storage
                .find_invoices_by_client_name_with_null_customer_id(&customer.name)
                .await?,
            InvoiceMatch::ByLegacyName,
        );

        let total = positive_outstanding_total(&by_id) + positive_outstanding_total(&by_name);
        Ok(clamp_non_negative(total))
    }
}
