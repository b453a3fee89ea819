//! Adminusers: users, services and team membership.

use std::time::Duration;

use reqwest::Method;
use serde_json::json;

use super::{BaseClient, ClientError};
use crate::middleware::correlation::RequestContext;
use crate::models::user::{TeamMember, User};

/// Header naming the user performing a removal.
const USER_CONTEXT_HEADER: &str = "GovUkPay-User-Context";

#[derive(Clone)]
pub struct AdminUsersClient {
    base: BaseClient,
}

impl AdminUsersClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            base: BaseClient::new("adminusers", base_url, timeout)?,
        })
    }

    pub async fn get_user(&self, ctx: &RequestContext, external_id: &str) -> Result<User, ClientError> {
        let url = self.base.url("/v1/api/users/{externalId}", &[("externalId", external_id)]);
        self.base.json(self.base.request(ctx, Method::GET, &url)).await
    }

    pub async fn list_service_users(
        &self,
        ctx: &RequestContext,
        service_external_id: &str,
    ) -> Result<Vec<TeamMember>, ClientError> {
        let url = self.base.url(
            "/v1/api/services/{serviceExternalId}/users",
            &[("serviceExternalId", service_external_id)],
        );
        self.base.json(self.base.request(ctx, Method::GET, &url)).await
    }

    pub async fn update_service_role(
        &self,
        ctx: &RequestContext,
        user_external_id: &str,
        service_external_id: &str,
        role_name: &str,
    ) -> Result<(), ClientError> {
        let url = self.base.url(
            "/v1/api/users/{userExternalId}/services/{serviceExternalId}",
            &[
                ("userExternalId", user_external_id),
                ("serviceExternalId", service_external_id),
            ],
        );
        let req = self
            .base
            .request(ctx, Method::PUT, &url)
            .json(&json!({ "role_name": role_name }));
        self.base.empty(req).await
    }

    pub async fn remove_user_from_service(
        &self,
        ctx: &RequestContext,
        service_external_id: &str,
        user_external_id: &str,
        remover_external_id: &str,
    ) -> Result<(), ClientError> {
        let url = self.base.url(
            "/v1/api/services/{serviceExternalId}/users/{userExternalId}",
            &[
                ("serviceExternalId", service_external_id),
                ("userExternalId", user_external_id),
            ],
        );
        let req = self
            .base
            .request(ctx, Method::DELETE, &url)
            .header(USER_CONTEXT_HEADER, remover_external_id);
        self.base.empty(req).await
    }

    pub async fn invite_user(
        &self,
        ctx: &RequestContext,
        service_external_id: &str,
        sender_external_id: &str,
        email: &str,
        role_name: &str,
    ) -> Result<(), ClientError> {
        let url = self.base.url("/v1/api/invites/create-invite-to-join-service", &[]);
        let body = json!({
            "email": email,
            "role_name": role_name,
            "service_external_id": service_external_id,
            "sender": sender_external_id,
        });
        self.base
            .empty(self.base.request(ctx, Method::POST, &url).json(&body))
            .await
    }
}
