/// Declarative authorization policy
///
/// Every handler asks the same question: may this caller perform `action`
/// on `resource`, and if so, which rows may it see? The answer comes from a
/// single rule table ([`rule`]) evaluated by [`authorize`], so role checks
/// never drift between handlers.
///
/// # Evaluation order
///
/// 1. Public rules allow everyone, authenticated or not
/// 2. Missing identity is `Unauthorized`
/// 3. Deleting one's own account is `SelfDeletion`, even for admins
/// 4. Admins are allowed everything, unfiltered
/// 5. Drivers and clients get what their column of the rule says:
///    `Deny` is `Forbidden`, `Own` attaches a [`Visibility`] row filter,
///    `All` is unfiltered
///
/// Rows hidden by a visibility filter are reported as not found by the
/// callers, so the existence of other users' records is not revealed.
///
/// # Example
///
/// ```
/// use goexpress_shared::auth::authorization::{authorize, Action, Resource, Visibility};
/// use goexpress_shared::auth::middleware::AuthContext;
/// use goexpress_shared::models::user::UserRole;
///
/// let driver = AuthContext::new(7, "d@example.com", UserRole::Driver);
///
/// let visibility = authorize(Some(&driver), Resource::Shipment, Action::List).unwrap();
/// assert_eq!(visibility, Visibility::Driver(7));
///
/// assert!(authorize(Some(&driver), Resource::Zone, Action::Create).is_err());
/// assert!(authorize(None, Resource::Zone, Action::List).is_ok());
/// ```

use super::middleware::AuthContext;
use crate::models::user::UserRole;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// No identity on a protected resource
    #[error("Authentication required")]
    Unauthorized,

    /// Identity present but the role may not perform the action
    #[error("Insufficient permissions for role {role}")]
    Forbidden { role: UserRole },

    /// A user tried to delete their own account
    #[error("Cannot delete your own account")]
    SelfDeletion,
}

/// Things a caller can act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Login, registration and token refresh
    Session,

    /// Zone rate cards
    Zone,

    /// Price quotes
    Quote,

    /// Public lookup of a shipment by tracking number
    Tracking,

    /// Shipments and their tracking history
    Shipment,

    /// The caller's own user record
    Account,

    /// User management; `target` is the user being acted on, if any
    User { target: Option<i64> },

    /// Customer profiles (and a customer's shipments)
    Customer,

    /// Addresses attached to a customer profile
    CustomerAddress,

    /// Driver profiles (and a driver's shipments)
    Driver,

    /// Aggregate statistics endpoints
    Statistics,
}

/// Operations on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Read,
    Create,
    Update,
    Delete,
    UpdateStatus,
    AssignDriver,
}

/// How much of a resource a non-admin role may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Nothing
    Deny,

    /// Only rows that belong to the caller
    Own,

    /// Every row
    All,
}

/// Policy rule for a (resource, action) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// No identity required
    Public,

    /// Admins only
    AdminOnly,

    /// Admins unfiltered; clients and drivers per their access level
    Scoped { client: Access, driver: Access },
}

/// Row filter attached to an allowed decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// No filtering
    All,

    /// Rows whose customer is this user id
    Customer(i64),

    /// Rows whose driver is this user id
    Driver(i64),
}

impl Visibility {
    /// Customer id to filter on, if any
    pub fn customer_id(&self) -> Option<i64> {
        match self {
            Visibility::Customer(id) => Some(*id),
            _ => None,
        }
    }

    /// Driver id to filter on, if any
    pub fn driver_id(&self) -> Option<i64> {
        match self {
            Visibility::Driver(id) => Some(*id),
            _ => None,
        }
    }

    /// Whether a shipment with these parties is visible
    pub fn permits_shipment(&self, customer_id: i64, driver_id: Option<i64>) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Customer(id) => customer_id == *id,
            Visibility::Driver(id) => driver_id == Some(*id),
        }
    }

    /// Whether a profile owned by `user_id` is visible
    pub fn permits_owner(&self, user_id: i64) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Customer(id) | Visibility::Driver(id) => user_id == *id,
        }
    }
}

/// The policy table
///
/// Pairs not listed are admin-only.
pub fn rule(resource: Resource, action: Action) -> Rule {
    use Access::{All, Deny, Own};

    match (resource, action) {
        (Resource::Session, _) => Rule::Public,
        (Resource::Zone, Action::List | Action::Read) => Rule::Public,
        (Resource::Quote, Action::Read) => Rule::Public,
        (Resource::Tracking, Action::Read) => Rule::Public,

        (Resource::Shipment, Action::List | Action::Read) => Rule::Scoped { client: Own, driver: Own },
        (Resource::Shipment, Action::Create) => Rule::Scoped { client: All, driver: All },
        (Resource::Shipment, Action::UpdateStatus) => Rule::Scoped { client: Deny, driver: Own },

        (Resource::Account, Action::Read | Action::Update) => Rule::Scoped { client: All, driver: All },

        (Resource::Customer, Action::Read) => Rule::Scoped { client: Own, driver: Deny },
        (Resource::CustomerAddress, Action::List | Action::Create) => {
            Rule::Scoped { client: Own, driver: Deny }
        }
        (Resource::Driver, Action::Read) => Rule::Scoped { client: Deny, driver: Own },

        _ => Rule::AdminOnly,
    }
}

/// Decides whether `identity` may perform `action` on `resource`
///
/// # Returns
///
/// The row filter the caller must apply on success
///
/// # Errors
///
/// - `AuthzError::Unauthorized` if the resource is protected and there is no identity
/// - `AuthzError::SelfDeletion` if a user targets their own account for deletion
/// - `AuthzError::Forbidden` if the role may not perform the action
pub fn authorize(
    identity: Option<&AuthContext>,
    resource: Resource,
    action: Action,
) -> Result<Visibility, AuthzError> {
    let rule = rule(resource, action);

    if rule == Rule::Public {
        return Ok(Visibility::All);
    }

    let identity = identity.ok_or(AuthzError::Unauthorized)?;

    if let (Resource::User { target: Some(target) }, Action::Delete) = (resource, action) {
        if target == identity.user_id {
            return Err(AuthzError::SelfDeletion);
        }
    }

    let access = match (identity.role, rule) {
        (UserRole::Admin, _) => Access::All,
        (_, Rule::Public) => Access::All,
        (_, Rule::AdminOnly) => Access::Deny,
        (UserRole::Client, Rule::Scoped { client, .. }) => client,
        (UserRole::Driver, Rule::Scoped { driver, .. }) => driver,
    };

    match access {
        Access::All => Ok(Visibility::All),
        Access::Own => Ok(match identity.role {
            UserRole::Driver => Visibility::Driver(identity.user_id),
            _ => Visibility::Customer(identity.user_id),
        }),
        Access::Deny => Err(AuthzError::Forbidden {
            role: identity.role,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> AuthContext {
        AuthContext::new(1, "admin@example.com", UserRole::Admin)
    }

    fn driver() -> AuthContext {
        AuthContext::new(2, "driver@example.com", UserRole::Driver)
    }

    fn client() -> AuthContext {
        AuthContext::new(3, "client@example.com", UserRole::Client)
    }

    #[test]
    fn test_public_operations_need_no_identity() {
        for (resource, action) in [
            (Resource::Session, Action::Create),
            (Resource::Zone, Action::List),
            (Resource::Zone, Action::Read),
            (Resource::Quote, Action::Read),
            (Resource::Tracking, Action::Read),
        ] {
            assert_eq!(authorize(None, resource, action), Ok(Visibility::All));
        }
    }

    #[test]
    fn test_protected_operations_require_identity() {
        for (resource, action) in [
            (Resource::Shipment, Action::List),
            (Resource::Shipment, Action::Create),
            (Resource::Zone, Action::Create),
            (Resource::Account, Action::Read),
            (Resource::User { target: None }, Action::List),
            (Resource::Statistics, Action::Read),
        ] {
            assert_eq!(authorize(None, resource, action), Err(AuthzError::Unauthorized));
        }
    }

    #[test]
    fn test_admin_is_allowed_everything_unfiltered() {
        let admin = admin();
        for (resource, action) in [
            (Resource::Zone, Action::Delete),
            (Resource::Shipment, Action::List),
            (Resource::Shipment, Action::UpdateStatus),
            (Resource::Shipment, Action::AssignDriver),
            (Resource::User { target: Some(99) }, Action::Delete),
            (Resource::Customer, Action::List),
            (Resource::Driver, Action::Create),
            (Resource::Statistics, Action::Read),
        ] {
            assert_eq!(authorize(Some(&admin), resource, action), Ok(Visibility::All));
        }
    }

    #[test]
    fn test_admin_only_endpoints_forbid_other_roles() {
        for identity in [driver(), client()] {
            for (resource, action) in [
                (Resource::Zone, Action::Create),
                (Resource::Zone, Action::Update),
                (Resource::Zone, Action::Delete),
                (Resource::User { target: None }, Action::List),
                (Resource::User { target: Some(42) }, Action::Delete),
                (Resource::Customer, Action::List),
                (Resource::Driver, Action::List),
                (Resource::Statistics, Action::Read),
                (Resource::Shipment, Action::AssignDriver),
            ] {
                assert_eq!(
                    authorize(Some(&identity), resource, action),
                    Err(AuthzError::Forbidden { role: identity.role })
                );
            }
        }
    }

    #[test]
    fn test_shipment_listing_is_scoped_per_role() {
        assert_eq!(
            authorize(Some(&driver()), Resource::Shipment, Action::List),
            Ok(Visibility::Driver(2))
        );
        assert_eq!(
            authorize(Some(&client()), Resource::Shipment, Action::List),
            Ok(Visibility::Customer(3))
        );
        assert_eq!(
            authorize(Some(&admin()), Resource::Shipment, Action::List),
            Ok(Visibility::All)
        );
    }

    #[test]
    fn test_status_updates() {
        assert_eq!(
            authorize(Some(&driver()), Resource::Shipment, Action::UpdateStatus),
            Ok(Visibility::Driver(2))
        );
        assert_eq!(
            authorize(Some(&client()), Resource::Shipment, Action::UpdateStatus),
            Err(AuthzError::Forbidden { role: UserRole::Client })
        );
    }

    #[test]
    fn test_any_role_can_create_shipments() {
        for identity in [admin(), driver(), client()] {
            assert_eq!(
                authorize(Some(&identity), Resource::Shipment, Action::Create),
                Ok(Visibility::All)
            );
        }
    }

    #[test]
    fn test_self_deletion_is_denied_even_for_admin() {
        let admin = admin();
        assert_eq!(
            authorize(Some(&admin), Resource::User { target: Some(admin.user_id) }, Action::Delete),
            Err(AuthzError::SelfDeletion)
        );

        let client = client();
        assert_eq!(
            authorize(Some(&client), Resource::User { target: Some(client.user_id) }, Action::Delete),
            Err(AuthzError::SelfDeletion)
        );
    }

    #[test]
    fn test_profile_reads_are_self_scoped() {
        assert_eq!(
            authorize(Some(&client()), Resource::Customer, Action::Read),
            Ok(Visibility::Customer(3))
        );
        assert_eq!(
            authorize(Some(&driver()), Resource::Customer, Action::Read),
            Err(AuthzError::Forbidden { role: UserRole::Driver })
        );
        assert_eq!(
            authorize(Some(&driver()), Resource::Driver, Action::Read),
            Ok(Visibility::Driver(2))
        );
        assert_eq!(
            authorize(Some(&client()), Resource::Driver, Action::Read),
            Err(AuthzError::Forbidden { role: UserRole::Client })
        );
    }

    #[test]
    fn test_account_is_open_to_every_role() {
        for identity in [driver(), client()] {
            assert_eq!(
                authorize(Some(&identity), Resource::Account, Action::Update),
                Ok(Visibility::All)
            );
        }
    }

    #[test]
    fn test_visibility_filters() {
        let client = Visibility::Customer(3);
        assert!(client.permits_shipment(3, None));
        assert!(!client.permits_shipment(4, Some(3)));
        assert_eq!(client.customer_id(), Some(3));
        assert_eq!(client.driver_id(), None);

        let driver = Visibility::Driver(2);
        assert!(driver.permits_shipment(9, Some(2)));
        assert!(!driver.permits_shipment(2, None));
        assert!(driver.permits_owner(2));
        assert!(!driver.permits_owner(3));

        assert!(Visibility::All.permits_shipment(1, None));
        assert!(Visibility::All.permits_owner(1));
    }

    #[test]
    fn test_unlisted_pairs_default_to_admin_only() {
        assert_eq!(rule(Resource::Quote, Action::Delete), Rule::AdminOnly);
        assert_eq!(rule(Resource::Tracking, Action::Update), Rule::AdminOnly);
        assert_eq!(rule(Resource::Account, Action::Delete), Rule::AdminOnly);
    }
}
