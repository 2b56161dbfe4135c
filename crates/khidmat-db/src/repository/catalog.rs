//! # Catalog Repository
//!
//! Read access to the surrounding entities the booking core depends on:
//! bookable services, providers, users and addresses. Full CRUD for
//! these lives outside the booking core; this repository exposes the
//! minimal projections plus insert helpers for seeding and tests.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use khidmat_core::{Service, ServiceProvider, User};

/// Repository for catalog lookups.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Services
    // =========================================================================

    /// Gets a bookable service by ID. Soft-deleted services are invisible.
    pub async fn get_service(&self, id: &str) -> DbResult<Option<Service>> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, name, description, price_minor, is_deleted, created_at, updated_at
            FROM services
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    // =========================================================================
    // Providers
    // =========================================================================

    /// Resolves the provider record backed by a user account.
    ///
    /// Provider-scoped requests arrive with the acting user's id; the
    /// booking tables reference the provider id.
    pub async fn provider_by_user(&self, user_id: &str) -> DbResult<Option<ServiceProvider>> {
        let provider = sqlx::query_as::<_, ServiceProvider>(
            r#"
            SELECT id, user_id, business_name, is_approved, is_deleted, created_at, updated_at
            FROM service_providers
            WHERE user_id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(provider)
    }

    /// Gets a provider by its own ID.
    pub async fn get_provider(&self, id: &str) -> DbResult<Option<ServiceProvider>> {
        let provider = sqlx::query_as::<_, ServiceProvider>(
            r#"
            SELECT id, user_id, business_name, is_approved, is_deleted, created_at, updated_at
            FROM service_providers
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(provider)
    }

    /// Checks whether the provider offers at least one of the booking's
    /// services. Drives acceptance eligibility.
    pub async fn provider_offers_any_for_booking(
        &self,
        provider_id: &str,
        booking_id: &str,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM booking_items bi
            JOIN provider_services ps ON ps.service_id = bi.service_id
            WHERE bi.booking_id = ?1 AND ps.service_provider_id = ?2
            "#,
        )
        .bind(booking_id)
        .bind(provider_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Registers a service as offered by a provider.
    pub async fn add_provider_service(&self, provider_id: &str, service_id: &str) -> DbResult<()> {
        debug!(provider_id = %provider_id, service_id = %service_id, "Linking provider service");

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO provider_services (service_provider_id, service_id)
            VALUES (?1, ?2)
            "#,
        )
        .bind(provider_id)
        .bind(service_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Users & Addresses
    // =========================================================================

    /// Gets a user by ID (for notification addressing).
    pub async fn get_user(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, is_deleted, created_at
            FROM users
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Checks whether an address exists and belongs to the given user.
    pub async fn address_belongs_to(&self, address_id: &str, user_id: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM addresses
            WHERE id = ?1 AND user_id = ?2 AND is_deleted = 0
            "#,
        )
        .bind(address_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    // =========================================================================
    // Insert Helpers (seed + tests)
    // =========================================================================

    /// Inserts a user row.
    pub async fn insert_user(&self, user: &User) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, role, is_deleted, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.is_deleted)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a provider row.
    pub async fn insert_provider(&self, provider: &ServiceProvider) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO service_providers (
                id, user_id, business_name, is_approved, is_deleted, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&provider.id)
        .bind(&provider.user_id)
        .bind(&provider.business_name)
        .bind(provider.is_approved)
        .bind(provider.is_deleted)
        .bind(provider.created_at)
        .bind(provider.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a bookable service row.
    pub async fn insert_service(&self, service: &Service) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO services (
                id, name, description, price_minor, is_deleted, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price_minor)
        .bind(service.is_deleted)
        .bind(service.created_at)
        .bind(service.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts an address row.
    pub async fn insert_address(
        &self,
        id: &str,
        user_id: &str,
        line1: &str,
        city: &str,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO addresses (id, user_id, line1, city, is_deleted, created_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(line1)
        .bind(city)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
