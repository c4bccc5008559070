/// Role guard
///
/// A pure decision over the identity the access guard attached. It never
/// resolves identity itself and never touches the store.
///
/// # Example
///
/// ```
/// use resumeflow_shared::auth::authorization::{require_role, AuthzError};
/// use resumeflow_shared::auth::middleware::AuthContext;
/// use resumeflow_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let applicant = AuthContext {
///     user_id: Uuid::new_v4(),
///     email: "a@example.com".to_string(),
///     name: "A".to_string(),
///     role: Some(UserRole::Applicant),
/// };
///
/// assert!(matches!(
///     require_role(Some(&applicant), &[UserRole::Recruiter]),
///     Err(AuthzError::InsufficientRole { .. })
/// ));
/// ```

use super::middleware::AuthContext;
use crate::models::user::UserRole;

/// Roles allowed to review résumés
pub const RECRUITERS: &[UserRole] = &[UserRole::Recruiter];

/// Reasons the role guard rejects a request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// No identity attached; the access guard did not run
    #[error("no credentials")]
    NoCredentials,

    #[error("missing role")]
    MissingRole,

    #[error("insufficient role")]
    InsufficientRole {
        required: Vec<UserRole>,
        actual: UserRole,
    },
}

/// Allows the request if the identity holds one of `allowed`
pub fn require_role(identity: Option<&AuthContext>, allowed: &[UserRole]) -> Result<(), AuthzError> {
    let identity = identity.ok_or(AuthzError::NoCredentials)?;
    let role = identity.role.ok_or(AuthzError::MissingRole)?;

    if !allowed.contains(&role) {
        return Err(AuthzError::InsufficientRole {
            required: allowed.to_vec(),
            actual: role,
        });
    }

    Ok(())
}
