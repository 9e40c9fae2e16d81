//! Basic workshop usage example

use bigdecimal::BigDecimal;
use workshop_core::utils::MemoryStore;
use workshop_core::{
    observability, LineRequest, NewCustomer, NewInvoice, NewItem, Workshop, WorkshopConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = WorkshopConfig::load()?;
    observability::init(&config.logging);

    println!("🔧 Workshop Core - Basic Example\n");

    let mut workshop = Workshop::with_config(MemoryStore::new(), &config);

    // 1. Stock the shelves
    println!("📦 Adding inventory...");
    let oil = workshop
        .create_item(NewItem {
            name: "Engine oil 1L".to_string(),
            price: BigDecimal::from(450),
            purchase_price: BigDecimal::from(330),
            product_code: "OIL-1L".to_string(),
            category: "Lubricants".to_string(),
            image_filename: None,
            quantity: 20,
        })
        .await?;
    let filter = workshop
        .create_item(NewItem {
            name: "Air filter".to_string(),
            price: BigDecimal::from(300),
            purchase_price: BigDecimal::from(190),
            product_code: "AF-200".to_string(),
            category: "Filters".to_string(),
            image_filename: None,
            quantity: 5,
        })
        .await?;
    for item in workshop.list_items().await? {
        println!(
            "  ✓ {} [{}] ₹{} x{}",
            item.name, item.product_code, item.price, item.quantity
        );
    }
    println!();

    // 2. Register a customer and bill two services
    println!("🧾 Writing invoices...");
    let customer = workshop
        .create_customer(NewCustomer {
            phone: Some("98400 12345".to_string()),
            ..NewCustomer::named("Ravi Kumar")
        })
        .await?;

    for lines in [
        vec![LineRequest::new(oil.id, 2), LineRequest::new(filter.id, 1)],
        vec![LineRequest::new(oil.id, 1)],
    ] {
        let invoice = workshop
            .create_invoice(NewInvoice {
                lines,
                customer_id: Some(customer.id),
                client_name: customer.name.clone(),
                ..Default::default()
            })
            .await?;
        println!(
            "  ✓ Invoice #{}: ₹{} ({:?})",
            invoice.id, invoice.total_amount, invoice.payment_status
        );
    }

    let balance = workshop.customer_outstanding_balance(customer.id).await?;
    println!("\n💰 {} owes ₹{}", customer.name, balance);

    // 3. Take a payment and spread it oldest first
    let allocation = workshop
        .process_customer_payment(customer.id, BigDecimal::from(1500))
        .await?;
    println!(
        "💳 Received ₹1500: applied ₹{} over {} invoice(s), ₹{} left over",
        allocation.amount_applied, allocation.updated_invoices, allocation.remaining_payment
    );
    for application in &allocation.applications {
        println!(
            "  ✓ Invoice #{}: paid ₹{}, still due ₹{} ({:?})",
            application.invoice_id,
            application.applied,
            application.outstanding_after,
            application.status_after
        );
    }

    let balance = workshop.customer_outstanding_balance(customer.id).await?;
    println!("\n💰 {} now owes ₹{}", customer.name, balance);

    // 4. Sales report
    println!("\n📊 Revenue by category:");
    for (category, revenue) in workshop.revenue_by_category().await? {
        println!("  {}: ₹{}", category, revenue);
    }

    Ok(())
}
