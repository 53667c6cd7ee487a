//! # Seed Data Generator
//!
//! Populates the database with development data.
//!
//! ## Usage
//! ```bash
//! # Seed ./tally_dev.db with the default catalog
//! cargo run -p tally-db --bin seed
//!
//! # Limit the number of products
//! cargo run -p tally-db --bin seed -- --count 40
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Data
//! - Cashiers 1..=3
//! - One supplier per category
//! - Products `{CATEGORY}-{NNN}` with stock between 0 and 100; every
//!   tenth product starts under its reorder threshold

use anyhow::{bail, Context};
use std::env;
use tally_core::Money;
use tally_db::repository::product::NewProduct;
use tally_db::repository::supplier::NewSupplier;
use tally_db::repository::user::NewUser;
use tally_db::{Database, DbConfig};

/// Product categories with their supplier and item names.
const CATALOG: &[(&str, &str, &str, &[&str])] = &[
    (
        "OFC",
        "Office",
        "Paperline Trading",
        &[
            "Ballpen Black",
            "Ballpen Blue",
            "Bond Paper A4",
            "Bond Paper Legal",
            "Stapler",
            "Staple Wire",
            "Folder Long",
            "Envelope Brown",
            "Marker Permanent",
            "Correction Tape",
        ],
    ),
    (
        "ELC",
        "Electronics",
        "Volt Supply Co",
        &[
            "USB Cable",
            "Phone Charger",
            "Earphones",
            "Power Bank",
            "Extension Cord",
            "AA Batteries",
            "Flash Drive 32GB",
            "Mouse Wireless",
            "Keyboard",
            "HDMI Cable",
        ],
    ),
    (
        "HWR",
        "Hardware",
        "Ironside Hardware",
        &[
            "Hammer",
            "Screwdriver Set",
            "Measuring Tape",
            "Duct Tape",
            "Wood Glue",
            "Nails 1in",
            "Pliers",
            "Padlock",
            "Paint Brush",
            "Sandpaper",
        ],
    ),
];

const CASHIERS: &[(i64, &str, &str, &str)] = &[
    (1, "Ana", "Cruz", "admin"),
    (2, "Ben", "Reyes", "cashier"),
    (3, "Carla", "Santos", "cashier"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = usize::MAX;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                let value = args.get(i + 1).context("--count needs a value")?;
                count = value.parse().context("--count must be a number")?;
                i += 1;
            }
            "--db" | "-d" => {
                db_path = args.get(i + 1).context("--db needs a path")?.clone();
                i += 1;
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Maximum number of products (default: all)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => bail!("unknown argument: {other}"),
        }
        i += 1;
    }

    println!("Tally Seed Data Generator");
    println!("=========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (user_id, first, last, role) in CASHIERS {
        db.users()
            .insert(&NewUser {
                user_id: *user_id,
                first_name: first.to_string(),
                last_name: last.to_string(),
                role: role.to_string(),
            })
            .await?;
    }
    println!("✓ Created {} users", CASHIERS.len());

    let mut generated = 0;
    let start = std::time::Instant::now();

    'catalog: for (code, category, supplier_name, names) in CATALOG {
        let supplier = db
            .suppliers()
            .insert(&NewSupplier {
                name: supplier_name.to_string(),
                ..Default::default()
            })
            .await?;

        for (index, name) in names.iter().enumerate() {
            if generated >= count {
                break 'catalog;
            }

            let product = generate_product(code, category, name, &supplier.supplier_id, index);
            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.product_id, e);
                continue;
            }
            generated += 1;
        }
    }

    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    let low = db.products().list_low_stock().await?;
    println!("  Low stock: {} products", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates one product with deterministic, varied data.
fn generate_product(
    code: &str,
    category: &str,
    name: &str,
    supplier_id: &str,
    seed: usize,
) -> NewProduct {
    // 15.00 - 514.00
    let unit_price = Money::from_cents(1500 + ((seed as i64 * 3700) % 50_000));

    let min_stock = 10;
    let current_stock = if seed % 10 == 0 {
        (seed % 7) as i64
    } else {
        20 + ((seed * 13) % 81) as i64
    };

    NewProduct {
        product_id: format!("{}-{:03}", code, seed + 1),
        name: name.to_string(),
        category: Some(category.to_string()),
        supplier_id: Some(supplier_id.to_string()),
        unit_price,
        current_stock,
        min_stock,
        max_stock: 200,
        allow_negative_stock: false,
    }
}
