use crate::accounting::{AddedLeave, DeleteAllOutcome, LeaveProposal};
use crate::api::account::AccountDeletionProposal;
use crate::api::confirm::{LeaveDeleted, PendingFlows};
use crate::api::leave::{
    CreateLeave, DeleteAllProposal, DeleteProposal, OverlapResponse, PreviewResponse,
};
use crate::api::profile::{BalanceProposal, UpdateBalance, UpdateWeekdayHours};
use crate::auth::handlers::{LoginResponse, RegisterResponse};
use crate::model::leave_record::LeaveRecord;
use crate::model::profile::{Profile, Weekday, WeekdayHours};
use crate::models::{LoginReqDto, RegisterReq};
use crate::session::Flow;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Ledger API",
        version = "0.1.0",
        description = r#"
## Leave Ledger

Tracks a user's leave balance in **hours**. Each user has a weekday schedule
(hours worked Monday to Sunday); booking leave debits the hours the schedule
says the date range is worth, and deleting leave refunds exactly what was
debited.

### 🔹 Key Features
- **Profile**
  - Weekday hours and a manually overridable leave balance
- **Leave**
  - Preview, book, list and delete leave records
- **Confirmation flows**
  - Overlapping leave, balance overrides and every delete are held per session
    until confirmed or cancelled

### 🔐 Security
Every `/api` endpoint needs a **JWT Bearer** token from `/auth/login`.
The token's `jti` identifies the session that holds pending proposals.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,

        crate::api::profile::get_profile,
        crate::api::profile::set_weekday_hours,
        crate::api::profile::propose_balance,

        crate::api::leave::leave_list,
        crate::api::leave::preview_leave,
        crate::api::leave::create_leave,
        crate::api::leave::propose_delete_leave,
        crate::api::leave::propose_delete_all,

        crate::api::account::propose_delete_account,

        crate::api::confirm::pending,
        crate::api::confirm::confirm,
        crate::api::confirm::cancel
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            RegisterResponse,
            LoginResponse,
            Weekday,
            WeekdayHours,
            Profile,
            UpdateWeekdayHours,
            UpdateBalance,
            BalanceProposal,
            LeaveRecord,
            CreateLeave,
            PreviewResponse,
            LeaveProposal,
            AddedLeave,
            OverlapResponse,
            DeleteProposal,
            DeleteAllProposal,
            DeleteAllOutcome,
            LeaveDeleted,
            AccountDeletionProposal,
            PendingFlows,
            Flow
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Signup and login"),
        (name = "Profile", description = "Weekday hours and leave balance"),
        (name = "Leave", description = "Leave records and previews"),
        (name = "Account", description = "Account removal"),
        (name = "Confirmation", description = "Confirm or cancel held proposals"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
