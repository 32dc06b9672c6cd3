//! `/auth`: signup, signin, current user, logout, password change

use crate::error::{HttpError, HttpResult};
use crate::extract::{AuthUser, BearerToken, JsonBody};
use crate::services::accounts;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bookstore_auth::AuthError;
use bookstore_core::RoleName;
use bookstore_orm::repositories::users;
use bookstore_validation::{
    ConfirmedValidator, DifferentValidator, EmailValidator, LengthValidator, RequiredValidator, Rules,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct SignupRequest {
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
}

/// Signup and signin response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub username: String,
    pub roles: Vec<String>,
    pub jwt_token: String,
}

fn signup_rules() -> Rules {
    Rules::new()
        .field("username", RequiredValidator::new())
        .field("username", LengthValidator::new().range(2, 20))
        .field("email", RequiredValidator::new())
        .field("email", EmailValidator::new())
        .field("email", LengthValidator::new().max(50))
        .field("password", RequiredValidator::new())
        .field("password", LengthValidator::new().range(6, 100))
}

fn signin_rules() -> Rules {
    Rules::new()
        .field("username", RequiredValidator::new())
        .field("password", RequiredValidator::new())
}

fn change_password_rules() -> Rules {
    Rules::new()
        .field("oldPassword", RequiredValidator::new())
        .field("newPassword", RequiredValidator::new())
        .field("newPassword", LengthValidator::new().range(6, 100))
        .request(DifferentValidator::new("newPassword", "oldPassword"))
        .request(ConfirmedValidator::new("newPassword"))
}

/// `POST /auth/signup`. The `role` field is accepted but every new account gets `ROLE_USER`.
pub async fn signup(State(state): State<AppState>, body: JsonBody) -> HttpResult<impl IntoResponse> {
    signup_rules().validate(body.value()).await?;
    let input: SignupRequest = body.parse()?;

    let mut tx = state.pool.begin().await?;
    let account = accounts::register(
        &mut tx,
        &state.passwords,
        &input.username,
        &input.email,
        &input.password,
        &[RoleName::User.as_str().to_string()],
    )
    .await?;
    let issued = state.jwt.issue(account.user.id, &account.user.user_name)?;
    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            username: account.user.user_name,
            roles: account.roles,
            jwt_token: issued.token,
        }),
    ))
}

/// `POST /auth/signin`
pub async fn signin(State(state): State<AppState>, body: JsonBody) -> HttpResult<Json<TokenResponse>> {
    signin_rules().validate(body.value()).await?;
    let input: Credentials = body.parse()?;

    let user_name = accounts::normalize_identity(&input.username);
    let user = users::find_by_user_name(&state.pool, &user_name)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !state.passwords.verify_async(&input.password, &user.password).await? {
        tracing::info!(user_id = user.id, "Rejected sign-in");
        return Err(AuthError::InvalidCredentials.into());
    }

    let roles = users::roles_for(&state.pool, user.id).await?;
    let issued = state.jwt.issue(user.id, &user.user_name)?;

    Ok(Json(TokenResponse {
        username: user.user_name,
        roles,
        jwt_token: issued.token,
    }))
}

/// `GET /auth/me`
pub async fn me(auth: AuthUser) -> Json<serde_json::Value> {
    Json(json!({
        "userName": auth.user.user_name,
        "roles": auth.roles,
    }))
}

/// `POST /auth/logout`: the token is refused until it would have expired anyway
pub async fn logout(State(state): State<AppState>, BearerToken(token): BearerToken) -> HttpResult<impl IntoResponse> {
    let Some(token) = token else {
        return Err(HttpError::bad_request("No token").with_error("auth", "Authorization token is required."));
    };

    let claims = state.jwt.verify(&token)?;
    state.denylist.revoke(&claims.jti, claims.exp);
    tracing::info!(sub = %claims.sub, "User logged out");

    Ok(Json(json!({ "message": "Logged out" })))
}

/// `POST /auth/change-password`
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    body: JsonBody,
) -> HttpResult<impl IntoResponse> {
    change_password_rules().validate(body.value()).await?;
    let input: ChangePasswordRequest = body.parse()?;

    if !state.passwords.verify_async(&input.old_password, &auth.user.password).await? {
        return Err(HttpError::bad_request("Old password is incorrect")
            .with_error("oldPassword", "Old password is incorrect."));
    }

    let hash = state.passwords.hash_async(&input.new_password).await?;
    users::update_password(&state.pool, auth.id(), &hash).await?;
    tracing::info!(user_id = auth.id(), "Password changed");

    Ok(Json(json!({ "message": "Password changed successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signup_rules() {
        let errors = signup_rules()
            .validate(&json!({"username": "a", "email": "nope", "password": "123"}))
            .await
            .unwrap_err();
        let fields = errors.field_messages();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));

        let ok = json!({"username": "alice", "email": "alice@example.com", "password": "secret1"});
        assert!(signup_rules().validate(&ok).await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_rules() {
        let same = json!({
            "oldPassword": "secret1",
            "newPassword": "secret1",
            "newPassword_confirmation": "secret1"
        });
        assert!(change_password_rules().validate(&same).await.is_err());

        let unconfirmed = json!({
            "oldPassword": "secret1",
            "newPassword": "secret2",
            "newPassword_confirmation": "secret3"
        });
        assert!(change_password_rules().validate(&unconfirmed).await.is_err());

        let good = json!({
            "oldPassword": "secret1",
            "newPassword": "secret2",
            "newPassword_confirmation": "secret2"
        });
        assert!(change_password_rules().validate(&good).await.is_ok());
    }
}
