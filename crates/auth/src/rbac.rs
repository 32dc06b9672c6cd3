//! Role checks over the role names stored for a user

use crate::{AuthError, AuthResult};
use bookstore_core::{has_role, RoleName};

pub fn is_admin<S: AsRef<str>>(roles: &[S]) -> bool {
    has_role(roles, RoleName::Admin)
}

/// Admins and employees
pub fn is_staff<S: AsRef<str>>(roles: &[S]) -> bool {
    is_admin(roles) || has_role(roles, RoleName::Employee)
}

pub fn require_admin<S: AsRef<str>>(roles: &[S]) -> AuthResult<()> {
    if is_admin(roles) {
        Ok(())
    } else {
        Err(AuthError::access_denied("Admin role required."))
    }
}

pub fn require_staff<S: AsRef<str>>(roles: &[S]) -> AuthResult<()> {
    if is_staff(roles) {
        Ok(())
    } else {
        Err(AuthError::access_denied("Insufficient permissions."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_is_staff() {
        let roles = ["ROLE_ADMIN"];
        assert!(is_admin(&roles));
        assert!(is_staff(&roles));
        assert!(require_admin(&roles).is_ok());
    }

    #[test]
    fn test_legacy_employee_names_count_as_staff() {
        assert!(is_staff(&["employees"]));
        assert!(is_staff(&["EMPLOYEE"]));
        assert!(!is_admin(&["EMPLOYEE"]));
    }

    #[test]
    fn test_customer_is_denied() {
        let roles = vec!["ROLE_USER".to_string()];
        assert!(!is_staff(&roles));
        assert_eq!(
            require_staff(&roles).unwrap_err(),
            AuthError::access_denied("Insufficient permissions.")
        );
        assert_eq!(require_admin(&roles).unwrap_err().status_code(), 403);
    }
}
