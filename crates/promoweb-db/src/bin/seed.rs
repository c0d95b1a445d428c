//! # Seed Data Generator
//!
//! Populates a development database with a demo catalogue and the
//! Cameroon shipping zones.
//!
//! ## Usage
//! ```bash
//! # Default database
//! cargo run -p promoweb-db --bin seed
//!
//! # Specify database path
//! cargo run -p promoweb-db --bin seed -- --db ./data/promoweb.db
//! ```
//!
//! ## Generated Data
//! - One shipping zone per region, rates rising with distance from the
//!   Douala / Yaoundé hubs
//! - Products across categories (phones, computers, TV & audio, appliances)
//!   with a few variants each, stock between 0 and 24

use chrono::Utc;
use promoweb_core::{Product, ProductStatus, ShippingZone};
use promoweb_db::{Database, DbConfig};
use std::env;
use uuid::Uuid;

/// (code, name, base XAF, per kg XAF, free shipping above, max kg, min days, max days)
type ZoneRow = (&'static str, &'static str, i64, i64, Option<i64>, i64, i64, i64);

const ZONES: &[ZoneRow] = &[
    ("Littoral", "Douala & Littoral", 1_500, 500, Some(100_000), 50, 1, 2),
    ("Centre", "Yaoundé & Centre", 1_500, 500, Some(100_000), 50, 2, 3),
    ("Ouest", "Ouest", 4_000, 1_000, None, 25, 3, 5),
    ("Sud-Ouest", "Sud-Ouest", 4_000, 1_000, None, 25, 3, 5),
    ("Nord-Ouest", "Nord-Ouest", 4_000, 1_000, None, 25, 4, 6),
    ("Sud", "Sud", 4_000, 1_000, None, 25, 4, 6),
    ("Est", "Est", 6_000, 1_500, None, 20, 5, 7),
    ("Adamaoua", "Adamaoua", 6_000, 1_500, None, 20, 5, 7),
    ("Nord", "Nord", 8_000, 2_000, None, 15, 7, 10),
    ("Extreme-Nord", "Extrême-Nord", 8_000, 2_000, None, 15, 7, 10),
];

/// (SKU prefix, brand, base price XAF, weight grams, names)
type CategoryRow = (&'static str, &'static str, i64, i64, &'static [&'static str]);

const CATEGORIES: &[CategoryRow] = &[
    (
        "PHN",
        "Tecno",
        65_000,
        400,
        &["Spark 20", "Camon 30", "Pova 6", "Pop 8"],
    ),
    (
        "PHN",
        "Samsung",
        95_000,
        450,
        &["Galaxy A15", "Galaxy A35", "Galaxy S24"],
    ),
    (
        "CMP",
        "HP",
        285_000,
        2_300,
        &["Laptop 15", "ProBook 450", "EliteBook 840"],
    ),
    (
        "TVA",
        "Hisense",
        180_000,
        9_500,
        &["Smart TV 43", "Smart TV 55", "Soundbar HS214"],
    ),
    (
        "APL",
        "Nasco",
        45_000,
        12_000,
        &["Chest Freezer 150L", "Fridge 90L", "Blender 1.5L"],
    ),
];

/// Variant label and the price added to the base.
const VARIANTS: &[(&str, i64)] = &[("Standard", 0), ("Plus", 15_000), ("Pro", 40_000)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./data/promoweb.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("PromoWeb Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./data/promoweb.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 PromoWeb Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    if let Some(dir) = std::path::Path::new(&db_path).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Zones
    if db.shipping_zones().count().await? > 0 {
        println!("⚠ Shipping zones already present, skipping");
    } else {
        for row in ZONES {
            db.shipping_zones().insert(&zone(row)).await?;
        }
        println!("✓ Inserted {} shipping zones", ZONES.len());
    }

    // Catalogue
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping catalogue to avoid duplicates.");
        return Ok(());
    }

    let mut generated = 0usize;
    for (prefix, brand, base_price, weight, names) in CATEGORIES {
        for name in names.iter() {
            for (variant, addon) in VARIANTS {
                let product = generate_product(
                    prefix,
                    brand,
                    name,
                    variant,
                    base_price + addon,
                    *weight,
                    generated,
                );

                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.sku, e);
                    continue;
                }
                generated += 1;
            }
        }
    }

    println!("✓ Generated {} products", generated);
    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

fn zone(row: &ZoneRow) -> ShippingZone {
    let (code, name, base, per_kg, free_above, max_kg, min_days, max_days) = *row;
    ShippingZone {
        id: Uuid::new_v4().to_string(),
        code: code.to_string(),
        name: name.to_string(),
        base_rate_xaf: base,
        per_kg_rate_xaf: per_kg,
        free_shipping_threshold_xaf: free_above,
        max_weight_grams: Some(max_kg * 1_000),
        min_delivery_days: min_days,
        max_delivery_days: max_days,
        is_active: true,
        created_at: Utc::now(),
    }
}

fn generate_product(
    prefix: &str,
    brand: &str,
    name: &str,
    variant: &str,
    price_xaf: i64,
    weight_grams: i64,
    seed: usize,
) -> Product {
    let now = Utc::now();
    let sku = format!(
        "{}-{}-{:03}",
        prefix,
        brand.chars().take(3).collect::<String>().to_uppercase(),
        seed
    );

    Product {
        id: Uuid::new_v4().to_string(),
        sku,
        name: format!("{} {} {}", brand, name, variant),
        brand: Some(brand.to_string()),
        image_url: None,
        price_xaf,
        weight_grams,
        // Every seventh product starts out of stock
        stock_quantity: if seed % 7 == 0 { 0 } else { (seed % 24) as i64 + 1 },
        reserved_quantity: 0,
        status: ProductStatus::Active,
        created_at: now,
        updated_at: now,
    }
}
