/// Customer profile model and database operations
///
/// A customer profile is a 1:1 extension of a client user carrying business
/// details. Read views join the user's name and email and compute shipment
/// aggregates from `shipments` and `zones` at query time, so they always
/// reflect current zone prices.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE customer_status AS ENUM ('active', 'inactive', 'suspended');
///
/// CREATE TABLE customers (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     company_name VARCHAR(255) NOT NULL,
///     contact_person VARCHAR(255) NOT NULL,
///     phone VARCHAR(50) NOT NULL,
///     ...
///     status customer_status NOT NULL DEFAULT 'active',
///     credit_limit DOUBLE PRECISION NOT NULL DEFAULT 0
/// );
///
/// CREATE TABLE customer_addresses (
///     id BIGSERIAL PRIMARY KEY,
///     customer_id BIGINT NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
///     address_type address_type NOT NULL,
///     ...
///     is_default BOOLEAN NOT NULL DEFAULT FALSE
/// );
/// ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::user::{User, UserRole};
use crate::auth::authorization::Visibility;
use crate::error::{DomainError, DomainResult};

/// Number of customers reported in [`CustomerStats::top_customers`]
const TOP_CUSTOMERS: i64 = 5;

/// Customer account standing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "customer_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    Active,
    Inactive,
    Suspended,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Active => "active",
            CustomerStatus::Inactive => "inactive",
            CustomerStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an address is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "address_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    Billing,
    Shipping,
    Both,
}

/// Customer read view: profile, owning user and shipment aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub id: i64,
    pub user_id: i64,
    pub company_name: String,
    pub contact_person: String,
    pub phone: String,
    pub alternate_phone: Option<String>,
    pub website: Option<String>,
    pub tax_id: Option<String>,
    pub business_type: Option<String>,
    pub status: CustomerStatus,
    pub credit_limit: f64,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// From the owning user
    pub name: String,
    pub email: String,

    pub total_shipments: i64,

    /// Sum of `weight * price_per_kg` over the customer's shipments
    pub total_spent: f64,

    pub last_shipment: Option<DateTime<Utc>>,
}

/// Input for creating a customer profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCustomer {
    pub user_id: i64,
    pub company_name: String,
    pub contact_person: String,
    pub phone: String,
    pub alternate_phone: Option<String>,
    pub website: Option<String>,
    pub tax_id: Option<String>,
    pub business_type: Option<String>,
    pub credit_limit: f64,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
}

/// Full replacement of a customer profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCustomer {
    pub company_name: String,
    pub contact_person: String,
    pub phone: String,
    pub alternate_phone: Option<String>,
    pub website: Option<String>,
    pub tax_id: Option<String>,
    pub business_type: Option<String>,
    pub status: CustomerStatus,
    pub credit_limit: f64,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
}

/// Filters for [`Customer::list`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerFilter {
    pub status: Option<CustomerStatus>,
    pub business_type: Option<String>,
}

/// Customer statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerStats {
    pub total_customers: i64,
    pub active_customers: i64,
    pub inactive_customers: i64,
    pub suspended_customers: i64,
    pub total_revenue: f64,

    /// Revenue per shipment, 0 when there are no shipments
    pub average_order_value: f64,

    /// Highest `total_spent` first
    pub top_customers: Vec<Customer>,
}

#[derive(sqlx::FromRow)]
struct StatusCounts {
    total_customers: i64,
    active_customers: i64,
    inactive_customers: i64,
    suspended_customers: i64,
}

#[derive(sqlx::FromRow)]
struct Revenue {
    total_revenue: f64,
    shipment_count: i64,
}

/// Address attached to a customer profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CustomerAddress {
    pub id: i64,
    pub customer_id: i64,
    pub address_type: AddressType,

    /// Free-form name such as "office" or "warehouse"
    pub label: String,

    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for adding an address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAddress {
    pub address_type: AddressType,
    pub label: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub is_default: bool,
}

const CUSTOMER_VIEW: &str = r#"
    SELECT
        c.id, c.user_id, c.company_name, c.contact_person, c.phone,
        c.alternate_phone, c.website, c.tax_id, c.business_type,
        c.status, c.credit_limit, c.payment_terms, c.notes,
        c.created_at, c.updated_at,
        u.name, u.email,
        COALESCE(s.total_shipments, 0) AS total_shipments,
        COALESCE(s.total_spent, 0::DOUBLE PRECISION) AS total_spent,
        s.last_shipment
    FROM customers c
    JOIN users u ON u.id = c.user_id
    LEFT JOIN (
        SELECT
            sh.customer_id,
            COUNT(*) AS total_shipments,
            SUM(sh.weight * z.price_per_kg) AS total_spent,
            MAX(sh.created_at) AS last_shipment
        FROM shipments sh
        JOIN zones z ON z.id = sh.zone_id
        GROUP BY sh.customer_id
    ) s ON s.customer_id = c.user_id
"#;

const ADDRESS_COLUMNS: &str = "id, customer_id, address_type, label, address_line1, address_line2, \
     city, state, postal_code, country, is_default, created_at, updated_at";

impl Customer {
    /// Creates a profile for an existing client user
    ///
    /// # Errors
    ///
    /// - `NotFound("User")` if the user does not exist
    /// - `InvalidArgument` if the user is not a client
    /// - `Conflict` if the user already has a profile
    pub async fn create(pool: &PgPool, data: CreateCustomer) -> DomainResult<Self> {
        let user = User::find_by_id(pool, data.user_id)
            .await?
            .ok_or(DomainError::NotFound("User"))?;

        if user.role != UserRole::Client {
            return Err(DomainError::InvalidArgument(
                "Customer profiles can only be created for client users".to_string(),
            ));
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO customers (
                user_id, company_name, contact_person, phone, alternate_phone,
                website, tax_id, business_type, credit_limit, payment_terms, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(data.user_id)
        .bind(&data.company_name)
        .bind(&data.contact_person)
        .bind(&data.phone)
        .bind(&data.alternate_phone)
        .bind(&data.website)
        .bind(&data.tax_id)
        .bind(&data.business_type)
        .bind(data.credit_limit)
        .bind(&data.payment_terms)
        .bind(&data.notes)
        .fetch_one(pool)
        .await
        .map_err(DomainError::from_store)?;

        tracing::info!(customer_id = id, user_id = data.user_id, "Customer profile created");

        Self::find_by_id(pool, id)
            .await?
            .ok_or(DomainError::NotFound("Customer"))
    }

    /// Finds a customer by profile ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(&format!("{CUSTOMER_VIEW} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Loads a customer the caller may see
    ///
    /// # Errors
    ///
    /// `NotFound("Customer")` if it does not exist or belongs to someone else
    pub async fn find_visible(pool: &PgPool, id: i64, visibility: Visibility) -> DomainResult<Self> {
        Self::find_by_id(pool, id)
            .await?
            .filter(|c| visibility.permits_owner(c.user_id))
            .ok_or(DomainError::NotFound("Customer"))
    }

    /// Lists customers, newest first
    pub async fn list(pool: &PgPool, filter: &CustomerFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(&format!(
            r#"
            {CUSTOMER_VIEW}
            WHERE ($1::customer_status IS NULL OR c.status = $1)
              AND ($2::TEXT IS NULL OR c.business_type = $2)
            ORDER BY c.created_at DESC, c.id DESC
            "#
        ))
        .bind(filter.status)
        .bind(filter.business_type.as_deref())
        .fetch_all(pool)
        .await
    }

    /// Replaces a customer profile
    ///
    /// # Errors
    ///
    /// `NotFound("Customer")` if the profile does not exist
    pub async fn update(pool: &PgPool, id: i64, data: UpdateCustomer) -> DomainResult<Self> {
        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE customers
            SET company_name = $2, contact_person = $3, phone = $4, alternate_phone = $5,
                website = $6, tax_id = $7, business_type = $8, status = $9,
                credit_limit = $10, payment_terms = $11, notes = $12, updated_at = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&data.company_name)
        .bind(&data.contact_person)
        .bind(&data.phone)
        .bind(&data.alternate_phone)
        .bind(&data.website)
        .bind(&data.tax_id)
        .bind(&data.business_type)
        .bind(data.status)
        .bind(data.credit_limit)
        .bind(&data.payment_terms)
        .bind(&data.notes)
        .fetch_optional(pool)
        .await?;

        if updated.is_none() {
            return Err(DomainError::NotFound("Customer"));
        }

        tracing::info!(customer_id = id, status = %data.status, "Customer profile updated");

        Self::find_by_id(pool, id)
            .await?
            .ok_or(DomainError::NotFound("Customer"))
    }

    /// Deletes a customer profile and its addresses
    ///
    /// The owning user is kept.
    pub async fn delete(pool: &PgPool, id: i64) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("Customer"));
        }

        tracing::info!(customer_id = id, "Customer profile deleted");

        Ok(())
    }

    /// Aggregate statistics over all customers
    pub async fn stats(pool: &PgPool) -> Result<CustomerStats, sqlx::Error> {
        let counts = sqlx::query_as::<_, StatusCounts>(
            r#"
            SELECT
                COUNT(*) AS total_customers,
                COUNT(*) FILTER (WHERE status = 'active') AS active_customers,
                COUNT(*) FILTER (WHERE status = 'inactive') AS inactive_customers,
                COUNT(*) FILTER (WHERE status = 'suspended') AS suspended_customers
            FROM customers
            "#,
        )
        .fetch_one(pool)
        .await?;

        let revenue = sqlx::query_as::<_, Revenue>(
            r#"
            SELECT
                COALESCE(SUM(s.weight * z.price_per_kg), 0::DOUBLE PRECISION) AS total_revenue,
                COUNT(*) AS shipment_count
            FROM shipments s
            JOIN zones z ON z.id = s.zone_id
            "#,
        )
        .fetch_one(pool)
        .await?;

        let top_customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            {CUSTOMER_VIEW}
            ORDER BY total_spent DESC, c.id
            LIMIT $1
            "#
        ))
        .bind(TOP_CUSTOMERS)
        .fetch_all(pool)
        .await?;

        Ok(CustomerStats {
            total_customers: counts.total_customers,
            active_customers: counts.active_customers,
            inactive_customers: counts.inactive_customers,
            suspended_customers: counts.suspended_customers,
            total_revenue: revenue.total_revenue,
            average_order_value: average(revenue.total_revenue, revenue.shipment_count),
            top_customers,
        })
    }
}

fn average(total: f64, count: i64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

impl CustomerAddress {
    /// Adds an address to a customer
    ///
    /// A new default address replaces the previous default in the same
    /// transaction.
    pub async fn create(
        pool: &PgPool,
        customer_id: i64,
        data: CreateAddress,
    ) -> DomainResult<Self> {
        let mut tx = pool.begin().await?;

        if data.is_default {
            sqlx::query(
                r#"
                UPDATE customer_addresses
                SET is_default = FALSE, updated_at = NOW()
                WHERE customer_id = $1 AND is_default
                "#,
            )
            .bind(customer_id)
            .execute(&mut *tx)
            .await?;
        }

        let address = sqlx::query_as::<_, CustomerAddress>(&format!(
            r#"
            INSERT INTO customer_addresses (
                customer_id, address_type, label, address_line1, address_line2,
                city, state, postal_code, country, is_default
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ADDRESS_COLUMNS}
            "#
        ))
        .bind(customer_id)
        .bind(data.address_type)
        .bind(&data.label)
        .bind(&data.address_line1)
        .bind(&data.address_line2)
        .bind(&data.city)
        .bind(&data.state)
        .bind(&data.postal_code)
        .bind(&data.country)
        .bind(data.is_default)
        .fetch_one(&mut *tx)
        .await
        .map_err(DomainError::from_store)?;

        tx.commit().await?;

        tracing::info!(
            customer_id,
            address_id = address.id,
            is_default = address.is_default,
            "Customer address added"
        );

        Ok(address)
    }

    /// Lists a customer's addresses, default first
    pub async fn list_for_customer(
        pool: &PgPool,
        customer_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CustomerAddress>(&format!(
            r#"
            SELECT {ADDRESS_COLUMNS}
            FROM customer_addresses
            WHERE customer_id = $1
            ORDER BY is_default DESC, created_at, id
            "#
        ))
        .bind(customer_id)
        .fetch_all(pool)
        .await
    }
}
