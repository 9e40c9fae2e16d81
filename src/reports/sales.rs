//! Sales tracker: revenue per sold invoice line

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::traits::*;
use crate::types::*;

/// One sold line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesTrackerEntry {
    /// When the invoice was written
    pub date: NaiveDateTime,
    pub product_name: String,
    pub category: String,
    pub quantity: i64,
    /// Quantity times the price charged on the invoice
    pub revenue: BigDecimal,
}

/// Builds sales reports from stored invoices
pub struct SalesReporter<S: RecordStore> {
    storage: S,
}

impl<S: RecordStore> SalesReporter<S> {
    /// Create a new sales reporter
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Every sold line, newest invoice first.
    ///
    /// Revenue uses the price captured on the line, not the item's current
    /// price. Lines whose item no longer exists are left out.
    pub async fn sales_tracker(&self) -> WorkshopResult<Vec<SalesTrackerEntry>> {
        let items: HashMap<ItemId, Item> = self
            .storage
            .list_items()
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        let mut invoices = self.storage.list_invoices().await?;
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let items = &items;
        let entries = invoices
            .iter()
            .flat_map(|invoice| {
                invoice.lines.iter().filter_map(move |line| {
                    items.get(&line.item_id).map(|item| SalesTrackerEntry {
                        date: invoice.created_at,
                        product_name: item.name.clone(),
                        category: item.category.clone(),
                        quantity: line.quantity,
                        revenue: line.line_total(),
                    })
                })
            })
            .collect();

        Ok(entries)
    }

    /// Revenue summed per category
    pub async fn revenue_by_category(&self) -> WorkshopResult<HashMap<String, BigDecimal>> {
        let mut totals: HashMap<String, BigDecimal> = HashMap::new();
        for entry in self.sales_tracker().await? {
            *totals.entry(entry.category).or_default() += entry.revenue;
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStore;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_tracker_uses_snapshot_price_and_newest_first() {
        let mut store = MemoryStore::new();
        let mut tyre = Item::from_new(NewItem {
            name: "Tyre".to_string(),
            price: BigDecimal::from(2200),
            purchase_price: BigDecimal::from(1700),
            product_code: "TY-17".to_string(),
            category: "Wheels".to_string(),
            image_filename: None,
            quantity: 10,
        });
        let item_id = store
            .commit(UnitOfWork::new().with(Mutation::InsertItem(tyre.clone())))
            .await
            .unwrap()
            .first_inserted()
            .unwrap();
        tyre.id = item_id;

        let day = |d| {
            NaiveDate::from_ymd_opt(2024, 7, d)
                .unwrap()
                .and_hms_opt(11, 0, 0)
                .unwrap()
        };
        let mut older = Invoice::new(None, "A".to_string(), BigDecimal::from(0), day(1));
        older.lines.push(InvoiceLine::snapshot(&tyre, 2));
        tyre.price = BigDecimal::from(2500);
        let mut newer = Invoice::new(None, "B".to_string(), BigDecimal::from(0), day(3));
        newer.lines.push(InvoiceLine::snapshot(&tyre, 1));
        let mut orphan = Invoice::new(None, "C".to_string(), BigDecimal::from(0), day(2));
        orphan.lines.push(InvoiceLine {
            id: UNASSIGNED_ID,
            invoice_id: UNASSIGNED_ID,
            item_id: 404,
            quantity: 1,
            unit_price: BigDecimal::from(5),
        });
        store
            .commit(
                UnitOfWork::new()
                    .with(Mutation::InsertInvoice(older))
                    .with(Mutation::InsertInvoice(newer))
                    .with(Mutation::InsertInvoice(orphan)),
            )
            .await
            .unwrap();

        let reporter = SalesReporter::new(store);
        let entries = reporter.sales_tracker().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, day(3));
        assert_eq!(entries[0].revenue, BigDecimal::from(2500));
        assert_eq!(entries[1].revenue, BigDecimal::from(4400));

        let by_category = reporter.revenue_by_category().await.unwrap();
        assert_eq!(by_category["Wheels"], BigDecimal::from(6900));
    }
}
