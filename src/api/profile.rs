use crate::accounting::{Accounting, validate_balance};
use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::model::profile::Weekday;
use crate::session::{Flow, SessionRegistry};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpdateWeekdayHours {
    #[schema(example = 8.0)]
    pub hours: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateBalance {
    #[schema(example = 200.0)]
    pub leave_balance: f64,
}

#[derive(Serialize, ToSchema)]
pub struct BalanceProposal {
    pub flow: Flow,
    #[schema(example = 307.5)]
    pub current: f64,
    #[schema(example = 200.0)]
    pub proposed: f64,
}

/// Current profile; created with the defaults on first access
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Weekday hours and leave balance", body = Profile),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Account no longer exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn get_profile(
    auth: AuthUser,
    accounting: web::Data<Accounting>,
) -> AppResult<HttpResponse> {
    let profile = accounting.get_profile(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    put,
    path = "/api/profile/weekday-hours/{weekday}",
    params(
        ("weekday" = Weekday, Path, description = "mon, tue, wed, thu, fri, sat or sun")
    ),
    request_body = UpdateWeekdayHours,
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 400, description = "Negative hours"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn set_weekday_hours(
    auth: AuthUser,
    accounting: web::Data<Accounting>,
    path: web::Path<Weekday>,
    payload: web::Json<UpdateWeekdayHours>,
) -> AppResult<HttpResponse> {
    let profile = accounting
        .set_weekday_hours(auth.user_id, path.into_inner(), payload.hours)
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// Holds a manual balance override until `/api/confirm/balance-update`
#[utoipa::path(
    put,
    path = "/api/profile/balance",
    request_body = UpdateBalance,
    responses(
        (status = 202, description = "Override held for confirmation", body = BalanceProposal),
        (status = 400, description = "Negative balance"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn propose_balance(
    auth: AuthUser,
    accounting: web::Data<Accounting>,
    sessions: web::Data<SessionRegistry>,
    payload: web::Json<UpdateBalance>,
) -> AppResult<HttpResponse> {
    validate_balance(payload.leave_balance)?;
    let current = accounting.get_profile(auth.user_id).await?.leave_balance;

    sessions
        .with_session(&auth.session_id, |s| s.balance_update.propose(payload.leave_balance))
        .await;

    Ok(HttpResponse::Accepted().json(BalanceProposal {
        flow: Flow::BalanceUpdate,
        current,
        proposed: payload.leave_balance,
    }))
}
