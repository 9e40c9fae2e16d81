//! Core records and data structures for the workshop system

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identifier of a customer record
pub type CustomerId = i64;
/// Identifier of an inventory item
pub type ItemId = i64;
/// Identifier of an invoice
pub type InvoiceId = i64;

/// Placeholder id carried by records that have not been inserted yet.
/// The record store replaces it on insert.
pub const UNASSIGNED_ID: i64 = 0;

fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// `max(0, value)` for money amounts
pub fn clamp_non_negative(value: BigDecimal) -> BigDecimal {
    if value > BigDecimal::from(0) {
        value
    } else {
        BigDecimal::from(0)
    }
}

/// Kind of customer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerType {
    /// Customer with a persistent record and account history
    #[default]
    #[serde(rename = "regular")]
    Regular,
    /// One-off counter customer
    #[serde(rename = "walk-in")]
    WalkIn,
}

/// Customer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Store-assigned identifier, immutable once created
    pub id: CustomerId,
    /// Display name, also the fallback key for legacy invoices
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub customer_type: CustomerType,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Customer {
    /// Build a customer record from creation input. The id is assigned on insert.
    pub fn from_new(new: NewCustomer) -> Self {
        let now = now();
        Self {
            id: UNASSIGNED_ID,
            name: new.name,
            phone: new.phone,
            email: new.email,
            address: new.address,
            customer_type: new.customer_type,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a customer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub customer_type: CustomerType,
}

impl NewCustomer {
    /// Regular customer with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Partial customer update. Only the fields that are `Some` overwrite the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub customer_type: Option<CustomerType>,
}

impl CustomerUpdate {
    /// Apply the supplied fields to `customer`
    pub fn apply_to(&self, customer: &mut Customer) {
        if let Some(name) = &self.name {
            customer.name = name.clone();
        }
        if let Some(phone) = &self.phone {
            customer.phone = Some(phone.clone());
        }
        if let Some(email) = &self.email {
            customer.email = Some(email.clone());
        }
        if let Some(address) = &self.address {
            customer.address = Some(address.clone());
        }
        if let Some(customer_type) = self.customer_type {
            customer.customer_type = customer_type;
        }
        customer.updated_at = now();
    }
}

/// Inventory item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Sales price
    pub price: BigDecimal,
    /// Cost price
    pub purchase_price: BigDecimal,
    /// Unique product code
    pub product_code: String,
    pub category: String,
    pub image_filename: Option<String>,
    /// Units in stock
    pub quantity: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Item {
    /// Build an item record from creation input. The id is assigned on insert.
    pub fn from_new(new: NewItem) -> Self {
        let now = now();
        Self {
            id: UNASSIGNED_ID,
            name: new.name,
            price: new.price,
            purchase_price: new.purchase_price,
            product_code: new.product_code,
            category: new.category,
            image_filename: new.image_filename,
            quantity: new.quantity,
            created_at: now,
            updated_at: now,
        }
    }

    /// Remove `quantity` units from stock
    pub fn deduct_stock(&mut self, quantity: i64) {
        self.quantity -= quantity;
        self.updated_at = now();
    }
}

/// Input for creating an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub price: BigDecimal,
    pub purchase_price: BigDecimal,
    pub product_code: String,
    pub category: String,
    #[serde(default)]
    pub image_filename: Option<String>,
    pub quantity: i64,
}

/// Partial item update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub price: Option<BigDecimal>,
    pub purchase_price: Option<BigDecimal>,
    pub product_code: Option<String>,
    pub category: Option<String>,
    pub image_filename: Option<String>,
    pub quantity: Option<i64>,
}

impl ItemUpdate {
    /// Apply the supplied fields to `item`
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(price) = &self.price {
            item.price = price.clone();
        }
        if let Some(purchase_price) = &self.purchase_price {
            item.purchase_price = purchase_price.clone();
        }
        if let Some(product_code) = &self.product_code {
            item.product_code = product_code.clone();
        }
        if let Some(category) = &self.category {
            item.category = category.clone();
        }
        if let Some(image_filename) = &self.image_filename {
            item.image_filename = Some(image_filename.clone());
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        item.updated_at = now();
    }
}

/// Payment state of an invoice, always derived from the amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    /// Status implied by `amount_paid` against `total_amount`.
    ///
    /// Anything covering the total is paid (this includes zero-total invoices),
    /// any positive payment below it is partial, the rest is unpaid.
    pub fn derive(total_amount: &BigDecimal, amount_paid: &BigDecimal) -> Self {
        if amount_paid >= total_amount {
            PaymentStatus::Paid
        } else if *amount_paid > BigDecimal::from(0) {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Unpaid
        }
    }
}

/// Line of an invoice. `unit_price` is the item price at the moment of sale
/// and is never re-read from the item afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub id: i64,
    pub invoice_id: InvoiceId,
    pub item_id: ItemId,
    pub quantity: i64,
    pub unit_price: BigDecimal,
}

impl InvoiceLine {
    /// Snapshot a sale of `quantity` units of `item`
    pub fn snapshot(item: &Item, quantity: i64) -> Self {
        Self {
            id: UNASSIGNED_ID,
            invoice_id: UNASSIGNED_ID,
            item_id: item.id,
            quantity,
            unit_price: item.price.clone(),
        }
    }

    /// Quantity times the snapshot price
    pub fn line_total(&self) -> BigDecimal {
        &self.unit_price * &BigDecimal::from(self.quantity)
    }
}

/// Invoice header plus its lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// Owning customer; `None` for walk-in and legacy invoices
    pub customer_id: Option<CustomerId>,
    /// Client name as written on the invoice, the legacy identity key
    pub client_name: String,
    pub client_phone: Option<String>,
    pub total_amount: BigDecimal,
    pub amount_paid: BigDecimal,
    pub outstanding_balance: BigDecimal,
    pub payment_status: PaymentStatus,
    pub created_at: NaiveDateTime,
    pub lines: Vec<InvoiceLine>,
}

impl Invoice {
    /// Create an unpaid invoice header with no lines
    pub fn new(
        customer_id: Option<CustomerId>,
        client_name: String,
        total_amount: BigDecimal,
        created_at: NaiveDateTime,
    ) -> Self {
        let mut invoice = Self {
            id: UNASSIGNED_ID,
            customer_id,
            client_name,
            client_phone: None,
            total_amount,
            amount_paid: BigDecimal::from(0),
            outstanding_balance: BigDecimal::from(0),
            payment_status: PaymentStatus::Unpaid,
            created_at,
            lines: Vec::new(),
        };
        invoice.refresh_payment_state();
        invoice
    }

    /// Set the cumulative amount paid and recompute the derived fields
    pub fn set_amount_paid(&mut self, amount_paid: BigDecimal) {
        self.amount_paid = amount_paid;
        self.refresh_payment_state();
    }

    /// Add `amount` to the amount paid and recompute the derived fields
    pub fn record_payment(&mut self, amount: &BigDecimal) {
        self.amount_paid += amount;
        self.refresh_payment_state();
    }

    /// Recompute `outstanding_balance` and `payment_status` from the amounts
    pub fn refresh_payment_state(&mut self) {
        self.outstanding_balance = clamp_non_negative(&self.total_amount - &self.amount_paid);
        self.payment_status = PaymentStatus::derive(&self.total_amount, &self.amount_paid);
    }

    /// Whether the derived fields agree with the amounts
    pub fn is_consistent(&self) -> bool {
        self.outstanding_balance == clamp_non_negative(&self.total_amount - &self.amount_paid)
            && self.payment_status == PaymentStatus::derive(&self.total_amount, &self.amount_paid)
    }

    /// Sum of the line totals
    pub fn lines_total(&self) -> BigDecimal {
        self.lines.iter().map(InvoiceLine::line_total).sum()
    }
}

/// Requested line on a new invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub item_id: ItemId,
    pub quantity: i64,
}

impl LineRequest {
    pub fn new(item_id: ItemId, quantity: i64) -> Self {
        Self { item_id, quantity }
    }
}

/// Input for creating an invoice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub lines: Vec<LineRequest>,
    /// Registered customer, if any
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    pub client_name: String,
    #[serde(default)]
    pub client_phone: Option<String>,
    /// Payment taken when the invoice is written; defaults to zero
    #[serde(default)]
    pub amount_paid: Option<BigDecimal>,
}

/// How an invoice is attributed to a customer.
///
/// An invoice belongs to a customer when its `customer_id` is the customer's
/// id, or when it has no `customer_id` and its `client_name` equals the
/// customer's name. The second arm exists for invoices written before
/// customer records did; two customers sharing a name both claim such invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceMatch {
    ById,
    ByLegacyName,
}

impl InvoiceMatch {
    /// Resolve how, if at all, `invoice` belongs to `customer`
    pub fn resolve(customer: &Customer, invoice: &Invoice) -> Option<Self> {
        match invoice.customer_id {
            Some(id) if id == customer.id => Some(InvoiceMatch::ById),
            Some(_) => None,
            None if invoice.client_name == customer.name => Some(InvoiceMatch::ByLegacyName),
            None => None,
        }
    }
}

/// Payment applied to one invoice during an allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentApplication {
    pub invoice_id: InvoiceId,
    pub invoice_created_at: NaiveDateTime,
    pub applied: BigDecimal,
    pub outstanding_after: BigDecimal,
    pub status_after: PaymentStatus,
}

/// Outcome of spreading a customer payment across invoices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub customer_id: CustomerId,
    /// Number of invoices that received part of the payment
    pub updated_invoices: usize,
    /// Portion of the payment absorbed by invoices
    pub amount_applied: BigDecimal,
    /// Portion left over once every outstanding invoice is settled
    pub remaining_payment: BigDecimal,
    /// Per-invoice breakdown, oldest invoice first
    pub applications: Vec<PaymentApplication>,
}

impl PaymentAllocation {
    /// Allocation that touched nothing
    pub fn untouched(customer_id: CustomerId, payment_amount: BigDecimal) -> Self {
        Self {
            customer_id,
            updated_invoices: 0,
            amount_applied: BigDecimal::from(0),
            remaining_payment: payment_amount,
            applications: Vec::new(),
        }
    }
}

/// Errors that can occur in the workshop system
#[derive(Debug, thiserror::Error)]
pub enum WorkshopError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),
    #[error("Not enough stock for item {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: ItemId,
        requested: i64,
        available: i64,
    },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl WorkshopError {
    /// Whether the error reports a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WorkshopError::CustomerNotFound(_)
                | WorkshopError::InvoiceNotFound(_)
                | WorkshopError::ItemNotFound(_)
        )
    }

    /// HTTP status an API layer should answer with
    pub fn http_status(&self) -> u16 {
        match self {
            e if e.is_not_found() => 404,
            WorkshopError::InsufficientStock { .. } | WorkshopError::Validation(_) => 400,
            _ => 500,
        }
    }
}

/// Result type for workshop operations
pub type WorkshopResult<T> = Result<T, WorkshopError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(total: i32) -> Invoice {
        Invoice::new(
            None,
            "Ravi".to_string(),
            BigDecimal::from(total),
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_payment_status_rules() {
        let total = BigDecimal::from(100);
        assert_eq!(
            PaymentStatus::derive(&total, &BigDecimal::from(0)),
            PaymentStatus::Unpaid
        );
        assert_eq!(
            PaymentStatus::derive(&total, &BigDecimal::from(-5)),
            PaymentStatus::Unpaid
        );
        assert_eq!(
            PaymentStatus::derive(&total, &BigDecimal::from(40)),
            PaymentStatus::Partial
        );
        assert_eq!(
            PaymentStatus::derive(&total, &BigDecimal::from(100)),
            PaymentStatus::Paid
        );
        assert_eq!(
            PaymentStatus::derive(&total, &BigDecimal::from(130)),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_new_invoice_is_unpaid() {
        let invoice = invoice(250);
        assert_eq!(invoice.outstanding_balance, BigDecimal::from(250));
        assert_eq!(invoice.payment_status, PaymentStatus::Unpaid);
        assert!(invoice.is_consistent());
    }

    #[test]
    fn test_overpayment_clamps_outstanding() {
        let mut invoice = invoice(80);
        invoice.set_amount_paid(BigDecimal::from(95));
        assert_eq!(invoice.outstanding_balance, BigDecimal::from(0));
        assert_eq!(invoice.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_negative_payment_grows_outstanding() {
        let mut invoice = invoice(80);
        invoice.set_amount_paid(BigDecimal::from(-20));
        assert_eq!(invoice.outstanding_balance, BigDecimal::from(100));
        assert_eq!(invoice.payment_status, PaymentStatus::Unpaid);
        assert!(invoice.is_consistent());
    }

    #[test]
    fn test_invoice_match_rule() {
        let customer = Customer::from_new(NewCustomer::named("Ravi"));
        let customer = Customer { id: 7, ..customer };

        let mut by_id = invoice(10);
        by_id.customer_id = Some(7);
        by_id.client_name = "Someone Else".to_string();
        assert_eq!(
            InvoiceMatch::resolve(&customer, &by_id),
            Some(InvoiceMatch::ById)
        );

        let legacy = invoice(10);
        assert_eq!(
            InvoiceMatch::resolve(&customer, &legacy),
            Some(InvoiceMatch::ByLegacyName)
        );

        let mut other_customer = invoice(10);
        other_customer.customer_id = Some(8);
        assert_eq!(InvoiceMatch::resolve(&customer, &other_customer), None);
    }

    #[test]
    fn test_customer_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&CustomerType::WalkIn).unwrap(),
            "\"walk-in\""
        );
        let parsed: CustomerType = serde_json::from_str("\"regular\"").unwrap();
        assert_eq!(parsed, CustomerType::Regular);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(WorkshopError::InvoiceNotFound(3).http_status(), 404);
        let stock = WorkshopError::InsufficientStock {
            item_id: 4,
            requested: 5,
            available: 3,
        };
        assert_eq!(stock.http_status(), 400);
        assert!(stock.to_string().contains("item 4"));
        assert_eq!(WorkshopError::Storage("down".into()).http_status(), 500);
    }
}
