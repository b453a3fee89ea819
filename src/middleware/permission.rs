//! Permission checks against the user's role on the current service.
//!
//! Permission names match the ones adminusers attaches to roles.

use crate::errors::AppError;
use crate::models::service::Service;
use crate::models::user::User;

pub const TRANSACTIONS_READ: &str = "transactions:read";
pub const TRANSACTIONS_DETAILS_READ: &str = "transactions-details:read";
pub const REFUNDS_CREATE: &str = "refunds:create";
pub const AGREEMENTS_READ: &str = "agreements:read";
pub const PAYMENT_TYPES_READ: &str = "payment-types:read";
pub const PAYMENT_TYPES_UPDATE: &str = "payment-types:update";
pub const TOGGLE_3DS_READ: &str = "toggle-3ds:read";
pub const TOGGLE_3DS_UPDATE: &str = "toggle-3ds:update";
pub const MOTO_MASK_INPUT_UPDATE: &str = "moto-mask-input:update";
pub const TOKENS_CREATE: &str = "tokens:create";
pub const TOKENS_READ: &str = "tokens:read";
pub const TOKENS_DELETE: &str = "tokens:delete";
pub const USERS_SERVICE_READ: &str = "users-service:read";
pub const USERS_SERVICE_CREATE: &str = "users-service:create";
pub const USERS_SERVICE_UPDATE: &str = "users-service:update";
pub const USERS_SERVICE_DELETE: &str = "users-service:delete";
pub const WEBHOOKS_READ: &str = "webhooks:read";
pub const WEBHOOKS_UPDATE: &str = "webhooks:update";
pub const MAKE_DEMO_PAYMENT: &str = "make-demo-payment:create";
pub const STRIPE_BANK_DETAILS_UPDATE: &str = "stripe-bank-details:update";
pub const STRIPE_RESPONSIBLE_PERSON_UPDATE: &str = "stripe-responsible-person:update";
pub const STRIPE_VAT_COMPANY_NUMBER_UPDATE: &str = "stripe-vat-number-company-number:update";

/// Any of these lets a user see the Stripe onboarding task list.
pub const STRIPE_SETUP_PERMISSIONS: &[&str] = &[
    STRIPE_BANK_DETAILS_UPDATE,
    STRIPE_RESPONSIBLE_PERSON_UPDATE,
    STRIPE_VAT_COMPANY_NUMBER_UPDATE,
];

/// Require `permission` for `user` on `service`.
pub fn require(user: &User, service: &Service, permission: &str) -> Result<(), AppError> {
    if user.has_permission(&service.external_id, permission) {
        Ok(())
    } else {
        tracing::info!(
            user_external_id = %user.external_id,
            service_external_id = %service.external_id,
            permission,
            "user lacks permission"
        );
        Err(AppError::PermissionDenied(permission.to_string()))
    }
}

/// Require at least one of `permissions` for `user` on `service`.
pub fn require_any(user: &User, service: &Service, permissions: &[&str]) -> Result<(), AppError> {
    if permissions
        .iter()
        .any(|p| user.has_permission(&service.external_id, p))
    {
        return Ok(());
    }
    tracing::info!(
        user_external_id = %user.external_id,
        service_external_id = %service.external_id,
        permissions = ?permissions,
        "user lacks all of the permissions"
    );
    Err(AppError::PermissionDenied(permissions.join(" or ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{Permission, Role, ServiceRole};

    fn user_with(permissions: &[&str]) -> (User, Service) {
        let service = Service {
            external_id: "svc-1".into(),
            name: "Service".into(),
            service_name: None,
            gateway_account_ids: vec!["42".into()],
            current_go_live_stage: None,
        };
        let user = User {
            external_id: "user-1".into(),
            username: None,
            email: "user@example.org".into(),
            disabled: false,
            service_roles: vec![ServiceRole {
                service: service.clone(),
                role: Role {
                    name: "view-only".into(),
                    description: None,
                    permissions: permissions
                        .iter()
                        .map(|p| Permission { name: p.to_string(), description: None })
                        .collect(),
                },
            }],
        };
        (user, service)
    }

    #[test]
    fn test_require_granted() {
        let (user, service) = user_with(&[TRANSACTIONS_READ]);
        assert!(require(&user, &service, TRANSACTIONS_READ).is_ok());
    }

    #[test]
    fn test_require_denied() {
        let (user, service) = user_with(&[TRANSACTIONS_READ]);
        let err = require(&user, &service, REFUNDS_CREATE).unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(p) if p == REFUNDS_CREATE));
    }

    #[test]
    fn test_require_denied_for_other_service() {
        let (user, mut service) = user_with(&[TRANSACTIONS_READ]);
        service.external_id = "svc-2".into();
        assert!(require(&user, &service, TRANSACTIONS_READ).is_err());
    }

    #[test]
    fn test_require_any() {
        let (user, service) = user_with(&[STRIPE_RESPONSIBLE_PERSON_UPDATE]);
        assert!(require_any(&user, &service, STRIPE_SETUP_PERMISSIONS).is_ok());

        let (user, service) = user_with(&[TRANSACTIONS_READ]);
        let err = require_any(&user, &service, STRIPE_SETUP_PERMISSIONS).unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
    }
}
