//! # Seed Data Generator
//!
//! Populates the database with demo points, receptions and products.
//!
//! ## Usage
//! ```bash
//! # 2 points per city, 6 products per reception (default)
//! cargo run -p pvz-db --bin seed
//!
//! # Custom amounts
//! cargo run -p pvz-db --bin seed -- --points 5 --products 20
//!
//! # Specify database path
//! cargo run -p pvz-db --bin seed -- --db ./data/pvz.db
//! ```
//!
//! ## Generated Data
//! For every allow-listed city and every point:
//! - one closed reception holding `--products` items
//! - one open reception holding half as many
//!
//! Product types rotate electronics → clothes → shoes.

use std::env;

use pvz_core::{ProductType, KNOWN_CITIES};
use pvz_db::{Database, DbConfig, DbError, Transactor, TransactorConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut points_per_city: usize = 2;
    let mut products_per_reception: usize = 6;
    let mut db_path = String::from("./pvz_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--points" | "-p" => {
                if i + 1 < args.len() {
                    points_per_city = args[i + 1].parse().unwrap_or(2);
                    i += 1;
                }
            }
            "--products" | "-n" => {
                if i + 1 < args.len() {
                    products_per_reception = args[i + 1].parse().unwrap_or(6);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("PVZ Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --points <N>     Points per city (default: 2)");
                println!("  -n, --products <N>   Products per closed reception (default: 6)");
                println!("  -d, --db <PATH>      Database file path (default: ./pvz_dev.db)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 PVZ Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Points per city: {}", points_per_city);
    println!("Products per reception: {}", products_per_reception);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let transactor = Transactor::new(db.pool().clone(), TransactorConfig::default());

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let points = db.points();
    let existing = transactor
        .run(move |conn| Box::pin(async move { points.count(conn).await }))
        .await?;
    if existing > 0 {
        println!("⚠ Database already has {} points", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating points...");

    let start = std::time::Instant::now();
    let mut created_points = 0usize;
    let mut created_products = 0usize;

    for city in KNOWN_CITIES {
        for _ in 0..points_per_city {
            match seed_point(&db, &transactor, city, products_per_reception).await {
                Ok(products) => {
                    created_points += 1;
                    created_products += products;
                }
                Err(e) => {
                    eprintln!("Failed to seed point in {}: {}", city, e);
                }
            }
        }
        println!("  {} done", city);
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Generated {} points and {} products in {:?}",
        created_points, created_products, elapsed
    );
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Creates one point with a closed and an open reception in one transaction.
///
/// Returns the number of products inserted.
async fn seed_point(
    db: &Database,
    transactor: &Transactor,
    city: &'static str,
    products_per_reception: usize,
) -> Result<usize, DbError> {
    let points = db.points();
    let receptions = db.receptions();
    let products = db.products();

    transactor
        .run(move |conn| {
            Box::pin(async move {
                let point = points.create(conn, city).await?;
                let mut inserted = 0;

                let closed = receptions.open(conn, point.id).await?;
                for n in 0..products_per_reception.max(1) {
                    products.insert(conn, closed.id, product_type(n)).await?;
                    inserted += 1;
                }
                receptions.close_latest(conn, point.id).await?;

                let open = receptions.open(conn, point.id).await?;
                for n in 0..products_per_reception / 2 {
                    products.insert(conn, open.id, product_type(n)).await?;
                    inserted += 1;
                }

                Ok(inserted)
            })
        })
        .await
}

fn product_type(n: usize) -> ProductType {
    ProductType::ALL[n % ProductType::ALL.len()]
}
