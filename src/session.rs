/// Set once the operator has given the admin password.
pub const IS_ADMIN: &str = "is_admin";
