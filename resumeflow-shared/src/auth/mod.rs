/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password digests
/// - [`jwt`]: access/refresh token issuance and verification
/// - [`refresh`]: stored refresh token lifecycle (login, rotation, sign-out)
/// - [`middleware`]: access guard (bearer token → [`middleware::AuthContext`])
/// - [`authorization`]: role guard
///
/// Guards here only decide; turning their errors into HTTP responses is the
/// API crate's job.

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod refresh;
