/// Database models for GoExpress
///
/// Each model owns its SQL: structs derive `sqlx::FromRow` and expose
/// associated async functions taking a pool (or any executor, where the
/// operation must compose into a caller's transaction).
///
/// # Models
///
/// - `user`: Accounts, credentials and roles
/// - `zone`: Rate cards
/// - `shipment`: Shipments and the status lifecycle
/// - `tracking_update`: Append-only shipment history
/// - `customer`: Customer profiles and addresses
/// - `driver`: Driver accounts and profiles
///
/// # Example
///
/// ```no_run
/// use goexpress_shared::db::pool::{create_pool, DatabaseConfig};
/// use goexpress_shared::models::zone::{Zone, ZoneInput};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let zone = Zone::create(
///     &pool,
///     ZoneInput {
///         name: "Local".to_string(),
///         price_per_kg: 2.5,
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod customer;
pub mod driver;
pub mod shipment;
pub mod tracking_update;
pub mod user;
pub mod zone;
