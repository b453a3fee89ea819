//! Team members of a service.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use serde_json::json;

use super::path_param;
use super::view::View;
use crate::errors::AppError;
use crate::middleware::account::ServiceRequest;
use crate::middleware::correlation::RequestContext;
use crate::middleware::permission;
use crate::middleware::session::{Session, FLASH_ERROR, FLASH_GENERIC};
use crate::models::user::ASSIGNABLE_ROLES;
use crate::AppState;

pub const CANNOT_CHANGE_SELF_MESSAGE: &str = "You cannot change your own permissions";
pub const CANNOT_REMOVE_SELF_MESSAGE: &str = "You cannot remove yourself from a service";

pub async fn index(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: ServiceRequest,
) -> Result<View, AppError> {
    req.require(permission::USERS_SERVICE_READ)?;
    let service_id = req.service.external_id.as_str();
    let members = state.adminusers.list_service_users(&ctx, service_id).await?;

    let mut by_role: BTreeMap<String, Vec<serde_json::Value>> = BTreeMap::new();
    for member in &members {
        let role = member.role_for(service_id).unwrap_or("unknown").to_string();
        by_role.entry(role).or_default().push(json!({
            "externalId": member.external_id,
            "email": member.email,
            "isCurrentUser": member.external_id == req.user.external_id,
            "permissionsLink": req.path(&format!("team-members/{}/permissions", member.external_id)),
        }));
    }

    Ok(View::new(
        "team-members/index",
        json!({
            "serviceName": req.service.display_name(false),
            "teamMembers": by_role,
            "numberOfMembers": members.len(),
            "inviteLink": req.path("team-members/invite"),
            "canInvite": req
                .user
                .has_permission(service_id, permission::USERS_SERVICE_CREATE),
        }),
    )
    .with_flash(session.take_flash()))
}

#[derive(Debug, Deserialize)]
pub struct RoleForm {
    #[serde(rename = "role-input", default)]
    pub role: String,
}

pub async fn update_role(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: ServiceRequest,
    Path(params): Path<HashMap<String, String>>,
    Form(form): Form<RoleForm>,
) -> Result<Response, AppError> {
    req.require(permission::USERS_SERVICE_UPDATE)?;
    let user_id = path_param(&params, "userExternalId")?;
    let redirect = Redirect::to(&req.path("team-members")).into_response();

    if user_id == req.user.external_id {
        session.flash(FLASH_ERROR, CANNOT_CHANGE_SELF_MESSAGE);
        return Ok(redirect);
    }
    let role = form.role.trim();
    if !ASSIGNABLE_ROLES.contains(&role) {
        return Err(AppError::BadRequest(format!("unknown role '{}'", role)));
    }

    state
        .adminusers
        .update_service_role(&ctx, user_id, &req.service.external_id, role)
        .await?;
    tracing::info!(
        service_external_id = %req.service.external_id,
        user_external_id = %user_id,
        role,
        "updated team member role"
    );
    session.flash(FLASH_GENERIC, "Permissions have been updated");
    Ok(redirect)
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: ServiceRequest,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Response, AppError> {
    req.require(permission::USERS_SERVICE_DELETE)?;
    let user_id = path_param(&params, "userExternalId")?;
    let redirect = Redirect::to(&req.path("team-members")).into_response();

    if user_id == req.user.external_id {
        session.flash(FLASH_ERROR, CANNOT_REMOVE_SELF_MESSAGE);
        return Ok(redirect);
    }

    match state
        .adminusers
        .remove_user_from_service(&ctx, &req.service.external_id, user_id, &req.user.external_id)
        .await
    {
        Ok(()) => session.flash(FLASH_GENERIC, "The team member was removed from the service"),
        Err(e) if e.is_not_found() => {
            session.flash(FLASH_ERROR, "The team member could not be found");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(redirect)
}

#[derive(Debug, Deserialize)]
pub struct InviteForm {
    #[serde(rename = "invitee-email", default)]
    pub email: String,
    #[serde(rename = "role-input", default)]
    pub role: String,
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !value.contains(' '),
        None => false,
    }
}

pub async fn invite(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    session: Session,
    req: ServiceRequest,
    Form(form): Form<InviteForm>,
) -> Result<Response, AppError> {
    req.require(permission::USERS_SERVICE_CREATE)?;
    let back = Redirect::to(&req.path("team-members/invite")).into_response();

    let email = form.email.trim().to_lowercase();
    if !looks_like_email(&email) {
        session.flash(FLASH_ERROR, "Enter a valid email address");
        return Ok(back);
    }
    let role = form.role.trim();
    if !ASSIGNABLE_ROLES.contains(&role) {
        session.flash(FLASH_ERROR, "Select a permission level");
        return Ok(back);
    }

    match state
        .adminusers
        .invite_user(&ctx, &req.service.external_id, &req.user.external_id, &email, role)
        .await
    {
        Ok(()) => {
            session.flash(FLASH_GENERIC, format!("Invite sent to {}", email));
            Ok(Redirect::to(&req.path("team-members")).into_response())
        }
        Err(e) if e.error_code == Some(409) => {
            session.flash(FLASH_ERROR, format!("{} is already a member of this team", email));
            Ok(back)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn invite_page(req: ServiceRequest, session: Session) -> Result<View, AppError> {
    req.require(permission::USERS_SERVICE_CREATE)?;
    Ok(View::new(
        "team-members/invite",
        json!({
            "formAction": req.path("team-members/invite"),
            "roles": ASSIGNABLE_ROLES,
            "serviceName": req.service.display_name(false),
        }),
    )
    .with_flash(session.take_flash()))
}
