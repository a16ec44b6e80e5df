//! Role-based access guard.
//!
//! Each protected operation names the roles allowed to call it:
//!
//! | Operation        | Policy                |
//! |------------------|-----------------------|
//! | create point     | moderator             |
//! | open reception   | employee              |
//! | close reception  | employee              |
//! | add product      | employee              |
//! | delete product   | employee              |
//! | list points      | employee or moderator |

use pvz_core::UserRole;

use crate::auth::{extract_bearer_token, Claims, JwtManager};
use crate::error::{ServiceError, ServiceResult};

/// Which roles may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    ModeratorOnly,
    EmployeeOnly,
    EmployeeOrModerator,
}

impl AccessPolicy {
    pub const fn allows(&self, role: UserRole) -> bool {
        match self {
            AccessPolicy::ModeratorOnly => matches!(role, UserRole::Moderator),
            AccessPolicy::EmployeeOnly => matches!(role, UserRole::Employee),
            AccessPolicy::EmployeeOrModerator => true,
        }
    }
}

/// Protected operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreatePoint,
    OpenReception,
    CloseReception,
    AddProduct,
    DeleteProduct,
    ListPoints,
}

impl Operation {
    pub const fn policy(&self) -> AccessPolicy {
        match self {
            Operation::CreatePoint => AccessPolicy::ModeratorOnly,
            Operation::OpenReception
            | Operation::CloseReception
            | Operation::AddProduct
            | Operation::DeleteProduct => AccessPolicy::EmployeeOnly,
            Operation::ListPoints => AccessPolicy::EmployeeOrModerator,
        }
    }
}

/// Validates the caller's credentials and checks them against `policy`.
///
/// `credentials` may be a full `Authorization` header value or a bare token.
///
/// ## Returns
/// * `Ok(Claims)` - Caller is allowed
/// * `Err(ServiceError::InvalidAccessToken)` - Missing, malformed or expired token
/// * `Err(ServiceError::Forbidden)` - Valid token, wrong role
pub fn authorize(
    jwt: &JwtManager,
    credentials: Option<&str>,
    policy: AccessPolicy,
) -> ServiceResult<Claims> {
    let raw = credentials
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ServiceError::InvalidAccessToken)?;

    let token = if raw.starts_with("Bearer ") {
        extract_bearer_token(raw).ok_or(ServiceError::InvalidAccessToken)?
    } else {
        raw
    };

    let claims = jwt.validate_access_token(token)?;

    if !policy.allows(claims.role) {
        tracing::warn!(sub = %claims.sub, role = %claims.role, ?policy, "Access denied");
        return Err(ServiceError::Forbidden);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn jwt() -> JwtManager {
        JwtManager::new("a".to_string(), "r".to_string(), 900, 900)
    }

    fn header(jwt: &JwtManager, role: UserRole) -> String {
        let token = jwt
            .generate_access_token(Uuid::new_v4(), "someone@pvz.ru", role)
            .unwrap();
        format!("Bearer {}", token)
    }

    #[test]
    fn test_role_matrix() {
        let jwt = jwt();
        let moderator = header(&jwt, UserRole::Moderator);
        let employee = header(&jwt, UserRole::Employee);

        let cases = [
            (Operation::CreatePoint, true, false),
            (Operation::OpenReception, false, true),
            (Operation::CloseReception, false, true),
            (Operation::AddProduct, false, true),
            (Operation::DeleteProduct, false, true),
            (Operation::ListPoints, true, true),
        ];

        for (operation, moderator_ok, employee_ok) in cases {
            let result = authorize(&jwt, Some(&moderator), operation.policy());
            assert_eq!(result.is_ok(), moderator_ok, "{:?} as moderator", operation);
            if !moderator_ok {
                assert!(matches!(result, Err(ServiceError::Forbidden)));
            }

            let result = authorize(&jwt, Some(&employee), operation.policy());
            assert_eq!(result.is_ok(), employee_ok, "{:?} as employee", operation);
            if !employee_ok {
                assert!(matches!(result, Err(ServiceError::Forbidden)));
            }
        }
    }

    #[test]
    fn test_bare_token_accepted() {
        let jwt = jwt();
        let token = jwt
            .generate_access_token(Uuid::new_v4(), "m@pvz.ru", UserRole::Moderator)
            .unwrap();

        let claims = authorize(&jwt, Some(&token), AccessPolicy::ModeratorOnly).unwrap();
        assert_eq!(claims.role, UserRole::Moderator);
    }

    #[test]
    fn test_missing_or_bad_token() {
        let jwt = jwt();
        for credentials in [None, Some(""), Some("Bearer "), Some("Bearer garbage")] {
            assert!(matches!(
                authorize(&jwt, credentials, AccessPolicy::EmployeeOrModerator),
                Err(ServiceError::InvalidAccessToken)
            ));
        }
    }

    #[test]
    fn test_refresh_token_is_not_access() {
        let jwt = jwt();
        let token = jwt
            .generate_refresh_token(Uuid::new_v4(), "e@pvz.ru", UserRole::Employee)
            .unwrap();

        assert!(matches!(
            authorize(&jwt, Some(&token), AccessPolicy::EmployeeOnly),
            Err(ServiceError::InvalidAccessToken)
        ));
    }
}
