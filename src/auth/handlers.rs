use crate::{
    auth::{accounts::Accounts, jwt::generate_access_token},
    config::Config,
    error::{AppError, AppResult},
    model::UserId,
    models::{LoginReqDto, RegisterReq},
};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    #[schema(example = 1)]
    pub user_id: UserId,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = 1)]
    pub user_id: UserId,
    pub access_token: String,
}

/// User registration handler
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account created with the default profile", body = RegisterResponse),
        (status = 400, description = "Empty fields or passwords do not match"),
        (status = 409, description = "Username already taken")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(accounts, user), fields(username = %user.username))]
pub async fn register(
    user: web::Json<RegisterReq>,
    accounts: web::Data<Accounts>,
) -> AppResult<HttpResponse> {
    let user_id = accounts
        .signup(&user.username, &user.password, &user.confirm_password)
        .await?;

    Ok(HttpResponse::Created().json(RegisterResponse { user_id }))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 401, description = "Invalid username or password")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(accounts, config, user), fields(username = %user.username))]
pub async fn login(
    user: web::Json<LoginReqDto>,
    accounts: web::Data<Accounts>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    let user_id = accounts.login(&user.username, &user.password).await?;

    let (access_token, claims) = generate_access_token(
        user_id,
        user.username.trim().to_string(),
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    info!(user_id, session_id = %claims.jti, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        user_id,
        access_token,
    }))
}
