//! # Seed Data Generator
//!
//! Populates the database with demo accounts, services and a tax
//! configuration for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p khidmat-db --bin seed
//!
//! # Specify database path
//! cargo run -p khidmat-db --bin seed -- --db ./data/khidmat.db
//! ```
//!
//! ## Generated Data
//! - 1 admin, 3 customers, 2 provider accounts (with provider records)
//! - A catalog of bookable home services with realistic prices
//! - Provider/service links so the available-bookings pool is non-empty
//! - One address per customer
//! - An active tax config (Rs 50 visitation fee, 15%)

use chrono::Utc;
use std::env;
use uuid::Uuid;

use khidmat_core::{Role, Service, ServiceProvider, TaxConfig, User};
use khidmat_db::{Database, DbConfig};

/// Bookable services with prices in minor units.
const SERVICES: &[(&str, i64)] = &[
    ("AC Repair", 10_000),
    ("AC Installation", 35_000),
    ("Ceiling Fan Installation", 4_500),
    ("Electrical Wiring Check", 8_000),
    ("Water Tank Cleaning", 12_000),
    ("Plumbing Leak Fix", 6_500),
    ("Geyser Repair", 9_000),
    ("Deep House Cleaning", 25_000),
    ("Sofa Cleaning", 7_500),
    ("Pest Control", 15_000),
    ("Painting (per room)", 18_000),
    ("Carpenter Visit", 5_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./khidmat_dev.db");

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
                println!("Khidmat Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./khidmat_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Khidmat Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Skip when already seeded to avoid duplicate emails
    if db.catalog().get_user("admin-1").await?.is_some() {
        println!("⚠ Database already seeded, nothing to do.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    // Accounts
    let accounts: &[(&str, &str, Role)] = &[
        ("admin-1", "Admin", Role::Admin),
        ("user-1", "Ayesha Khan", Role::User),
        ("user-2", "Bilal Ahmed", Role::User),
        ("user-3", "Sana Malik", Role::User),
        ("prov-user-1", "Hamza Electric Works", Role::ServiceProvider),
        ("prov-user-2", "CleanPro Services", Role::ServiceProvider),
    ];

    for (id, name, role) in accounts {
        db.catalog()
            .insert_user(&User {
                id: id.to_string(),
                name: name.to_string(),
                email: format!("{id}@khidmat.dev"),
                role: *role,
                is_deleted: false,
                created_at: now,
            })
            .await?;
    }
    println!("✓ Seeded {} accounts", accounts.len());

    // Provider records backing the provider accounts
    let providers = [("provider-1", "prov-user-1"), ("provider-2", "prov-user-2")];
    for (id, user_id) in &providers {
        db.catalog()
            .insert_provider(&ServiceProvider {
                id: id.to_string(),
                user_id: user_id.to_string(),
                business_name: None,
                is_approved: true,
                is_deleted: false,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    println!("✓ Seeded {} providers", providers.len());

    // Catalog
    let mut service_ids = Vec::new();
    for (name, price_minor) in SERVICES {
        let id = Uuid::new_v4().to_string();
        db.catalog()
            .insert_service(&Service {
                id: id.clone(),
                name: name.to_string(),
                description: None,
                price_minor: *price_minor,
                is_deleted: false,
                created_at: now,
                updated_at: now,
            })
            .await?;
        service_ids.push(id);
    }
    println!("✓ Seeded {} services", service_ids.len());

    // provider-1 offers the first half, provider-2 the second half
    let half = service_ids.len() / 2;
    for service_id in &service_ids[..half] {
        db.catalog()
            .add_provider_service("provider-1", service_id)
            .await?;
    }
    for service_id in &service_ids[half..] {
        db.catalog()
            .add_provider_service("provider-2", service_id)
            .await?;
    }
    println!("✓ Linked provider services");

    // One address per customer
    for (idx, user_id) in ["user-1", "user-2", "user-3"].iter().enumerate() {
        db.catalog()
            .insert_address(
                &format!("addr-{}", idx + 1),
                user_id,
                &format!("House {}, Street 4", idx + 12),
                "Lahore",
            )
            .await?;
    }
    println!("✓ Seeded addresses");

    // Active tax config: Rs 50 visitation fee, 15%
    db.tax_configs()
        .insert(&TaxConfig {
            id: Uuid::new_v4().to_string(),
            visitation_fee_minor: 5_000,
            tax_rate_bps: 1_500,
            is_active: true,
            is_deleted: false,
            created_by: "admin-1".to_string(),
            created_at: now,
            updated_at: now,
        })
        .await?;
    println!("✓ Seeded active tax config (Rs 50.00 fee, 15%)");

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
