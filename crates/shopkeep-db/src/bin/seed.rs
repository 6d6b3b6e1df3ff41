//! # Seed Data Generator
//!
//! Creates a demo shop with stock, customers, sales and expenses for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed ./shopkeep_dev.db
//! cargo run -p shopkeep-db --bin seed
//!
//! # Specify database path and demo password
//! cargo run -p shopkeep-db --bin seed -- --db ./data/shopkeep.db --password hunter22
//! ```
//!
//! Log in afterwards as `demo@shopkeep.local`.
//!
//! ## Generated Data
//! - Stock across Grocery, Dairy, Snacks and Household, some below reorder level
//! - Three customers, two of them with outstanding dues
//! - A handful of sales (paid, part-paid and with change) and one due payment
//! - Rent and electricity expenses for the current month

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use chrono::{Datelike, Utc};
use shopkeep_core::sku::generate_sku;
use shopkeep_core::{
    NewCustomer, NewDuePayment, NewExpense, NewSale, NewStockItem, PaymentMode, SaleCustomer,
    SaleLineRequest, SettingsUpdate,
};
use shopkeep_db::{Database, DbConfig};
use std::env;

const DEMO_EMAIL: &str = "demo@shopkeep.local";

/// (category, name, cost, sale price, quantity) in paise.
const STOCK: &[(&str, &str, i64, i64, i64)] = &[
    ("Grocery", "Basmati Rice 5kg", 40_000, 52_500, 25),
    ("Grocery", "Toor Dal 1kg", 11_000, 14_000, 40),
    ("Grocery", "Sunflower Oil 1L", 13_500, 16_500, 3),
    ("Grocery", "Atta 10kg", 38_000, 45_000, 12),
    ("Dairy", "Amul Butter 500g", 24_000, 28_500, 8),
    ("Dairy", "Paneer 200g", 7_000, 9_000, 2),
    ("Snacks", "Masala Chips", 1_500, 2_000, 60),
    ("Snacks", "Glucose Biscuits", 800, 1_000, 120),
    ("Household", "Detergent 1kg", 9_500, 12_000, 15),
    ("Household", "Dish Soap Bar", 900, 1_200, 1),
];

/// (name, phone, address)
const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Asha Verma", "98765 43210", "12 MG Road"),
    ("Ravi Kumar", "91234 56789", "4 Station Street"),
    ("Meena Iyer", "99887 76655", ""),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./shopkeep_dev.db");
    let mut password = String::from("shopkeep");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopkeep Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>         Database file path (default: ./shopkeep_dev.db)");
                println!("  -p, --password <PASS>   Demo shop password (default: shopkeep)");
                println!("  -h, --help              Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Shopkeep Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.shops().get_by_email(DEMO_EMAIL).await?.is_some() {
        println!("⚠ Demo shop {} already exists", DEMO_EMAIL);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();

    let shop = db.shops().create_with_settings(DEMO_EMAIL, &password_hash).await?;
    db.settings()
        .update(
            &shop.id,
            &SettingsUpdate {
                shop_name: Some("Verma General Store".to_string()),
                gstin: Some("27AAPFU0939F1ZV".to_string()),
                phone: Some("022 2345 6789".to_string()),
                address: Some("Shop 3, Market Lane, Pune".to_string()),
                ..Default::default()
            },
        )
        .await?;
    println!("✓ Created shop {} ({})", DEMO_EMAIL, shop.id);

    // Stock
    let mut items = Vec::with_capacity(STOCK.len());
    for (category, name, cost, price, quantity) in STOCK {
        let item = db
            .stock()
            .add_or_restock(
                &shop.id,
                &NewStockItem {
                    sku: generate_sku(name, category),
                    name: name.to_string(),
                    category: Some(category.to_string()),
                    cost_price_cents: *cost,
                    sale_price_cents: *price,
                    quantity: *quantity,
                    reorder_level: 5,
                },
            )
            .await?;
        items.push(item);
    }
    println!("✓ Added {} stock items", items.len());

    // Customers
    let mut customers = Vec::with_capacity(CUSTOMERS.len());
    for (name, phone, address) in CUSTOMERS {
        let customer = db
            .customers()
            .create(
                &shop.id,
                &NewCustomer {
                    name: name.to_string(),
                    phone: phone.to_string(),
                    address: address.to_string(),
                },
            )
            .await?;
        customers.push(customer);
    }
    println!("✓ Added {} customers", customers.len());

    // Sales: (customer index, [(item index, qty)], discount, paid, mode)
    let plan: &[(usize, &[(usize, i64)], i64, Option<i64>, PaymentMode)] = &[
        (0, &[(0, 1), (1, 2)], 0, None, PaymentMode::Cash),
        (1, &[(3, 1), (6, 4)], 2_000, Some(30_000), PaymentMode::Upi),
        (2, &[(7, 10), (8, 1)], 0, Some(50_000), PaymentMode::Cash),
        (0, &[(4, 1), (5, 1)], 500, Some(20_000), PaymentMode::Card),
    ];

    let mut recorded = Vec::with_capacity(plan.len());
    for (customer_idx, lines, discount, paid, mode) in plan {
        let detail = db
            .sales()
            .record_sale(
                &shop.id,
                &NewSale {
                    customer: SaleCustomer::Existing {
                        id: customers[*customer_idx].id.clone(),
                    },
                    items: lines
                        .iter()
                        .map(|(item_idx, quantity)| SaleLineRequest {
                            stock_item_id: items[*item_idx].id.clone(),
                            quantity: *quantity,
                        })
                        .collect(),
                    discount_cents: *discount,
                    tax_rate_bps: None,
                    amount_paid_cents: *paid,
                    payment_mode: *mode,
                },
            )
            .await?;
        println!(
            "  Invoice #{}: total {}, due {}, change {}",
            detail.sale.invoice_number,
            detail.sale.grand_total(),
            detail.sale.due(),
            detail.sale.change()
        );
        recorded.push(detail);
    }
    println!("✓ Recorded {} sales", recorded.len());

    // Part of Ravi's due comes back
    if let Some(part_paid) = recorded.get(1) {
        let payment = part_paid.sale.due_cents.min(10_000);
        if payment > 0 {
            db.sales()
                .record_payment(
                    &shop.id,
                    &part_paid.sale.id,
                    &NewDuePayment {
                        amount_cents: payment,
                        payment_mode: PaymentMode::Cash,
                    },
                )
                .await?;
            println!("✓ Recorded due payment on invoice #{}", part_paid.sale.invoice_number);
        }
    }

    // Expenses
    let today = Utc::now().date_naive();
    let month_start = today.with_day(1).unwrap_or(today);
    for (date, title, category, amount) in [
        (month_start, "Shop rent", "Rent", 1_500_000),
        (today, "Electricity bill", "Utilities", 240_000),
    ] {
        db.expenses()
            .create(
                &shop.id,
                &NewExpense {
                    date,
                    title: title.to_string(),
                    category: category.to_string(),
                    amount_cents: amount,
                },
            )
            .await?;
    }
    println!("✓ Added expenses");

    let dashboard = db.reports().dashboard(&shop.id, today).await?;
    println!();
    println!("Today's revenue: {}", dashboard.today_revenue);
    println!("Total dues:      {}", dashboard.total_dues);
    println!("Low stock items: {}", dashboard.low_stock.len());

    println!();
    println!("✓ Seed complete! Log in as {} / {}", DEMO_EMAIL, password);

    db.close().await;
    Ok(())
}
