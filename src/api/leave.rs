use crate::accounting::{Accounting, LeaveProposal, LeaveRequest};
use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::LeaveId;
use crate::model::leave_record::LeaveRecord;
use crate::session::{Flow, SessionRegistry};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Hours to book instead of the weekday schedule total
    pub hours: Option<f64>,
}

#[derive(Deserialize, IntoParams)]
pub struct PreviewQuery {
    /// first day of leave
    #[param(example = "2026-01-05", value_type = String)]
    pub start_date: NaiveDate,
    /// last day of leave, inclusive
    #[param(example = "2026-01-09", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct PreviewResponse {
    #[schema(example = 38.0)]
    pub hours: f64,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteProposal {
    pub flow: Flow,
    pub record: LeaveRecord,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteAllProposal {
    pub flow: Flow,
    #[schema(example = 3)]
    pub records: usize,
    #[schema(example = 76.0)]
    pub refund_hours: f64,
}

#[derive(Serialize, ToSchema)]
pub struct OverlapResponse {
    #[schema(example = "Requested leave overlaps an existing leave record")]
    pub message: String,
    #[schema(example = "overlap")]
    pub flow: String,
    pub proposal: LeaveProposal,
}

/// The user's leave records, earliest start first
#[utoipa::path(
    get,
    path = "/api/leave",
    responses(
        (status = 200, description = "Leave records sorted by start date", body = [LeaveRecord]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    accounting: web::Data<Accounting>,
) -> AppResult<HttpResponse> {
    let leaves = accounting.list_leaves(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

/// Hours a date range would consume under the current schedule
#[utoipa::path(
    get,
    path = "/api/leave/preview",
    params(PreviewQuery),
    responses(
        (status = 200, description = "Computed hours; nothing is booked", body = PreviewResponse),
        (status = 400, description = "start_date after end_date"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn preview_leave(
    auth: AuthUser,
    accounting: web::Data<Accounting>,
    query: web::Query<PreviewQuery>,
) -> AppResult<HttpResponse> {
    let hours = accounting
        .preview_hours(auth.user_id, query.start_date, query.end_date)
        .await?;
    Ok(HttpResponse::Ok().json(PreviewResponse { hours }))
}

/// Book leave. An overlap is held for `/api/confirm/overlap`
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave booked and balance debited", body = AddedLeave),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Overlaps an existing record; proposal held", body = OverlapResponse),
        (status = 422, description = "Insufficient leave balance")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
#[instrument(
    name = "leave_create",
    skip(auth, accounting, sessions, payload),
    fields(user_id = auth.user_id)
)]
pub async fn create_leave(
    auth: AuthUser,
    accounting: web::Data<Accounting>,
    sessions: web::Data<SessionRegistry>,
    payload: web::Json<CreateLeave>,
) -> AppResult<HttpResponse> {
    let request = LeaveRequest {
        start_date: payload.start_date,
        end_date: payload.end_date,
        hours_override: payload.hours,
    };

    match accounting.add_leave(auth.user_id, request).await {
        Ok(added) => Ok(HttpResponse::Created().json(added)),
        Err(AppError::OverlapDetected(proposal)) => {
            sessions
                .with_session(&auth.session_id, |s| s.overlap.propose(proposal.clone()))
                .await;
            Err(AppError::OverlapDetected(proposal))
        }
        Err(e) => Err(e),
    }
}

/// Holds a delete until `/api/confirm/delete-leave`
#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave record to delete")
    ),
    responses(
        (status = 202, description = "Delete held for confirmation", body = DeleteProposal),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Record belongs to another user"),
        (status = 404, description = "Leave record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn propose_delete_leave(
    auth: AuthUser,
    accounting: web::Data<Accounting>,
    sessions: web::Data<SessionRegistry>,
    path: web::Path<LeaveId>,
) -> AppResult<HttpResponse> {
    let record = accounting
        .find_own_leave(auth.user_id, path.into_inner())
        .await?;

    sessions
        .with_session(&auth.session_id, |s| s.delete_leave.propose(record.id))
        .await;

    Ok(HttpResponse::Accepted().json(DeleteProposal {
        flow: Flow::DeleteLeave,
        record,
    }))
}

/// Holds a delete of every record until `/api/confirm/delete-all`
#[utoipa::path(
    delete,
    path = "/api/leave",
    responses(
        (status = 202, description = "Delete-all held for confirmation", body = DeleteAllProposal),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn propose_delete_all(
    auth: AuthUser,
    accounting: web::Data<Accounting>,
    sessions: web::Data<SessionRegistry>,
) -> AppResult<HttpResponse> {
    let leaves = accounting.list_leaves(auth.user_id).await?;

    sessions
        .with_session(&auth.session_id, |s| s.delete_all.propose(()))
        .await;

    Ok(HttpResponse::Accepted().json(DeleteAllProposal {
        flow: Flow::DeleteAll,
        records: leaves.len(),
        refund_hours: leaves.iter().map(|l| l.hours).sum(),
    }))
}
