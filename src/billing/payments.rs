//! Payment recording: single-invoice updates and customer payments spread
//! across outstanding invoices

use bigdecimal::BigDecimal;
use tracing::{debug, info, instrument, warn};

use crate::billing::balance::{matched_invoices, sort_oldest_first};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::validate_non_negative_amount;

/// Spread `payment_amount` over `invoices`, oldest first.
///
/// Invoices without an outstanding balance are ignored. Returns the allocation
/// summary together with the invoices that changed, in the order they were
/// paid. Nothing is persisted here.
pub fn allocate_payment(
    customer_id: CustomerId,
    invoices: Vec<Invoice>,
    payment_amount: BigDecimal,
) -> (PaymentAllocation, Vec<Invoice>) {
    let zero = BigDecimal::from(0);
    let mut candidates: Vec<Invoice> = invoices
        .into_iter()
        .filter(|invoice| invoice.outstanding_balance > zero)
        .collect();
    sort_oldest_first(&mut candidates);

    let mut remaining = payment_amount.clone();
    let mut applications = Vec::new();
    let mut updated = Vec::new();

    for mut invoice in candidates {
        if remaining <= zero {
            break;
        }

        let due = invoice.outstanding_balance.clone();
        if due <= zero {
            continue;
        }

        let applied = if remaining < due { remaining.clone() } else { due };
        invoice.record_payment(&applied);
        remaining -= &applied;

        debug!(
            invoice_id = invoice.id,
            applied = %applied,
            outstanding = %invoice.outstanding_balance,
            "Applied payment to invoice"
        );

        applications.push(PaymentApplication {
            invoice_id: invoice.id,
            invoice_created_at: invoice.created_at,
            applied,
            outstanding_after: invoice.outstanding_balance.clone(),
            status_after: invoice.payment_status,
        });
        updated.push(invoice);
    }

    let allocation = PaymentAllocation {
        customer_id,
        updated_invoices: updated.len(),
        amount_applied: &payment_amount - &remaining,
        remaining_payment: remaining,
        applications,
    };
    (allocation, updated)
}

/// Records payments against invoices
pub struct PaymentManager<S: RecordStore> {
    storage: S,
    reject_negative_amount_paid: bool,
}

impl<S: RecordStore> PaymentManager<S> {
    /// Create a new payment manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            reject_negative_amount_paid: false,
        }
    }

    /// Refuse negative totals in [`PaymentManager::update_invoice_payment`]
    pub fn with_negative_amounts_rejected(mut self, reject: bool) -> Self {
        self.reject_negative_amount_paid = reject;
        self
    }

    /// Set the cumulative amount paid on one invoice.
    ///
    /// `amount_paid` replaces the previous value. Negative values go through
    /// unless the manager was configured to reject them.
    #[instrument(skip(self), err)]
    pub async fn update_invoice_payment(
        &mut self,
        invoice_id: InvoiceId,
        amount_paid: BigDecimal,
    ) -> WorkshopResult<Invoice> {
        if self.reject_negative_amount_paid {
            validate_non_negative_amount("Amount paid", &amount_paid)?;
        }

        let mut invoice = self
            .storage
            .find_invoice_by_id(invoice_id)
            .await?
            .ok_or(WorkshopError::InvoiceNotFound(invoice_id))?;

        invoice.set_amount_paid(amount_paid);
        self.storage
            .commit(UnitOfWork::new().with(Mutation::UpdateInvoice(invoice.clone())))
            .await?;

        info!(
            invoice_id,
            amount_paid = %invoice.amount_paid,
            status = ?invoice.payment_status,
            "Updated invoice payment"
        );
        Ok(invoice)
    }

    /// Apply a customer payment to their outstanding invoices, oldest first.
    ///
    /// An unknown customer is not an error: nothing is applied and the whole
    /// payment comes back as remaining. All touched invoices are written in a
    /// single commit. Calling this twice applies the payment twice.
    #[instrument(skip(self), err)]
    pub async fn process_customer_payment(
        &mut self,
        customer_id: CustomerId,
        payment_amount: BigDecimal,
    ) -> WorkshopResult<PaymentAllocation> {
        let Some(customer) = self.storage.find_customer_by_id(customer_id).await? else {
            warn!(customer_id, "Payment for unknown customer left unapplied");
            return Ok(PaymentAllocation::untouched(customer_id, payment_amount));
        };

        let invoices = matched_invoices(&self.storage, &customer).await?;
        let (allocation, updated) = allocate_payment(customer.id, invoices, payment_amount);

        let mut unit = UnitOfWork::new();
        for invoice in updated {
            unit.push(Mutation::UpdateInvoice(invoice));
        }
        if !unit.is_empty() {
            debug!(customer_id, invoices = unit.len(), "Committing payment allocation");
            self.storage.commit(unit).await?;
        }

        info!(
            customer_id,
            updated_invoices = allocation.updated_invoices,
            amount_applied = %allocation.amount_applied,
            remaining = %allocation.remaining_payment,
            "Processed customer payment"
        );
        Ok(allocation)
    }
}
