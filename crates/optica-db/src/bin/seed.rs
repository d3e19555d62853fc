//! # Seed Data Generator
//!
//! Populates the database with sample inventory, suppliers and clients for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed ./optica_dev.db (default)
//! cargo run -p optica-db --bin seed
//!
//! # Specify database path
//! cargo run -p optica-db --bin seed -- --db ./data/optica.db
//! ```
//!
//! ## Generated Data
//! Loaded from the embedded `seed.json`:
//! - Frames, lenses, contact lenses and accessories with stock and prices
//! - Suppliers with a contact person
//! - Clients with RUTs in mixed spellings (normalized on insert)
//!
//! Nothing is written when the database already has products.

use optica_core::{ClientDraft, ProductDraft, SupplierDraft};
use optica_db::{Database, DbConfig, EntityRepository};
use serde::Deserialize;
use std::env;

const SEED_DATA: &str = include_str!("seed.json");

#[derive(Debug, Deserialize)]
struct SeedData {
    products: Vec<ProductDraft>,
    suppliers: Vec<SupplierDraft>,
    clients: Vec<ClientDraft>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./optica_dev.db");

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
                println!("Optica Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./optica_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let data: SeedData = serde_json::from_str(SEED_DATA)?;

    println!("Optica Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().list().await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        db.close().await;
        return Ok(());
    }

    let products = insert_all(&db.products(), &data.products, |p| p.name.as_str()).await;
    let suppliers = insert_all(&db.suppliers(), &data.suppliers, |s| s.name.as_str()).await;
    let clients = insert_all(&db.clients(), &data.clients, |c| c.rut.as_str()).await;

    println!();
    println!("✓ Products:  {}", products);
    println!("✓ Suppliers: {}", suppliers);
    println!("✓ Clients:   {}", clients);

    let lenses = db.products().search("cristal").await?;
    println!("  Search 'cristal': {} results", lenses.len());

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Inserts every draft, reporting failures and carrying on. Returns how many
/// were written.
async fn insert_all<R, F>(repo: &R, drafts: &[R::Draft], label: F) -> usize
where
    R: EntityRepository,
    F: Fn(&R::Draft) -> &str,
{
    let mut inserted = 0;
    for draft in drafts {
        match repo.create(draft).await {
            Ok(_) => inserted += 1,
            Err(e) => eprintln!("Failed to insert {} {}: {}", R::ENTITY, label(draft), e),
        }
    }
    inserted
}
