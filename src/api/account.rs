use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::session::{Flow, SessionRegistry};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct AccountDeletionProposal {
    pub flow: Flow,
    #[schema(example = "ada")]
    pub username: String,
}

/// Holds account deletion until `/api/confirm/delete-account`
#[utoipa::path(
    delete,
    path = "/api/account",
    responses(
        (status = 202, description = "Deletion held for confirmation", body = AccountDeletionProposal),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Account"
)]
pub async fn propose_delete_account(
    auth: AuthUser,
    sessions: web::Data<SessionRegistry>,
) -> AppResult<HttpResponse> {
    sessions
        .with_session(&auth.session_id, |s| s.delete_account.propose(()))
        .await;

    Ok(HttpResponse::Accepted().json(AccountDeletionProposal {
        flow: Flow::DeleteAccount,
        username: auth.username,
    }))
}
