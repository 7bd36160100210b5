/// Authentication subsystem
///
/// Password hashing (Argon2id) and signed-token issuance/verification
/// (HS256 JWT). Session carriage (cookie vs bearer header) lives at
/// the API boundary; this module only issues and verifies.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{issue_token, verify_token, Claims};
