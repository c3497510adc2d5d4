use crate::accounting::{Accounting, DeleteAllOutcome};
use crate::auth::accounts::Accounts;
use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::LeaveId;
use crate::session::{Flow, PendingAction, SessionRegistry};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct LeaveDeleted {
    #[schema(example = 4)]
    pub leave_id: LeaveId,
    #[schema(example = 307.5)]
    pub leave_balance: f64,
}

#[derive(Serialize, ToSchema)]
pub struct PendingFlows {
    pub pending: Vec<Flow>,
}

/// Flows in this session that hold a proposal
#[utoipa::path(
    get,
    path = "/api/pending",
    responses(
        (status = 200, description = "Flows awaiting confirmation", body = PendingFlows),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Confirmation"
)]
pub async fn pending(
    auth: AuthUser,
    sessions: web::Data<SessionRegistry>,
) -> AppResult<HttpResponse> {
    let pending = sessions
        .with_session(&auth.session_id, |s| s.pending_flows())
        .await;
    Ok(HttpResponse::Ok().json(PendingFlows { pending }))
}

/// Applies the proposal held by `flow`
#[utoipa::path(
    post,
    path = "/api/confirm/{flow}",
    params(
        ("flow" = Flow, Path, description = "overlap, balance-update, delete-leave, delete-all or delete-account")
    ),
    responses(
        (status = 200, description = "Balance updated, leave deleted, or all leave deleted"),
        (status = 201, description = "Overlapping leave booked", body = AddedLeave),
        (status = 204, description = "Account deleted"),
        (status = 400, description = "Nothing to confirm"),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Insufficient leave balance")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Confirmation"
)]
#[instrument(
    name = "flow_confirm",
    skip(auth, accounting, accounts, sessions, path),
    fields(user_id = auth.user_id)
)]
pub async fn confirm(
    auth: AuthUser,
    accounting: web::Data<Accounting>,
    accounts: web::Data<Accounts>,
    sessions: web::Data<SessionRegistry>,
    path: web::Path<Flow>,
) -> AppResult<HttpResponse> {
    let flow = path.into_inner();
    info!(%flow, "Confirming held proposal");
    let action = sessions
        .with_session(&auth.session_id, |s| s.confirm(flow))
        .await
        .ok_or_else(|| AppError::Validation(format!("Nothing to confirm for {flow}")))?;

    match action {
        PendingAction::AddLeave(proposal) => {
            let added = accounting.confirm_leave(auth.user_id, proposal).await?;
            Ok(HttpResponse::Created().json(added))
        }
        PendingAction::SetBalance(new_balance) => {
            let profile = accounting.set_balance(auth.user_id, new_balance).await?;
            Ok(HttpResponse::Ok().json(profile))
        }
        PendingAction::DeleteLeave(leave_id) => {
            let leave_balance = accounting.delete_leave(auth.user_id, leave_id).await?;
            Ok(HttpResponse::Ok().json(LeaveDeleted {
                leave_id,
                leave_balance,
            }))
        }
        PendingAction::DeleteAll => {
            let outcome: DeleteAllOutcome = accounting.delete_all(auth.user_id).await?;
            Ok(HttpResponse::Ok().json(outcome))
        }
        PendingAction::DeleteAccount => {
            accounting.delete_account(auth.user_id).await?;
            accounts.forget_username(&auth.username).await;
            sessions.end(&auth.session_id).await;

            info!("Account closed by its owner");
            Ok(HttpResponse::NoContent().finish())
        }
    }
}

/// Discards the proposal held by `flow`
#[utoipa::path(
    post,
    path = "/api/cancel/{flow}",
    params(
        ("flow" = Flow, Path, description = "overlap, balance-update, delete-leave, delete-all or delete-account")
    ),
    responses(
        (status = 204, description = "Proposal discarded"),
        (status = 400, description = "Nothing to cancel"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Confirmation"
)]
pub async fn cancel(
    auth: AuthUser,
    sessions: web::Data<SessionRegistry>,
    path: web::Path<Flow>,
) -> AppResult<HttpResponse> {
    let flow = path.into_inner();
    let cancelled = sessions
        .with_session(&auth.session_id, |s| s.cancel(flow))
        .await;

    if !cancelled {
        return Err(AppError::Validation(format!("Nothing to cancel for {flow}")));
    }
    Ok(HttpResponse::NoContent().finish())
}
