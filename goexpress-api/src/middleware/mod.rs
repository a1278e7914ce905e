/// HTTP middleware
///
/// - `identity`: decodes the bearer token into an `AuthContext`
/// - `security`: security response headers

pub mod identity;
pub mod security;
