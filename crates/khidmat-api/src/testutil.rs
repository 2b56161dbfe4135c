//! Shared fixtures for service-layer tests: an in-memory database plus
//! the minimum catalog rows the flows under test depend on.

use chrono::Utc;

use khidmat_core::{Role, Service, ServiceProvider, User};
use khidmat_db::{Database, DbConfig};

/// Fresh isolated in-memory database with migrations applied.
pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub async fn seed_user(db: &Database, id: &str, role: Role) {
    db.catalog()
        .insert_user(&User {
            id: id.to_string(),
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
            role,
            is_deleted: false,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
}

pub async fn seed_provider(db: &Database, id: &str, user_id: &str) {
    seed_user(db, user_id, Role::ServiceProvider).await;
    let now = Utc::now();
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
        .await
        .unwrap();
}

pub async fn seed_service(db: &Database, id: &str, name: &str, price_minor: i64) {
    let now = Utc::now();
    db.catalog()
        .insert_service(&Service {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            price_minor,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
}

pub async fn seed_address(db: &Database, id: &str, user_id: &str) {
    db.catalog()
        .insert_address(id, user_id, "House 12, Street 4", "Lahore")
        .await
        .unwrap();
}
