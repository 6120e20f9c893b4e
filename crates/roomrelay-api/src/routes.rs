pub mod analytics;
pub mod auth;
pub mod rooms;
pub mod servers;
pub mod status;

/// The admin principal has no numeric id of its own (it is a single shared
/// credential, not a row in any table); `0` marks rows created or mutated
/// through the Admin API rather than relayed from the platform.
pub(crate) fn admin_principal_id(_admin: &crate::middleware::AdminUser) -> i64 {
    0
}
