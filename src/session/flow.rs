use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};
use utoipa::ToSchema;

use crate::accounting::LeaveProposal;
use crate::model::LeaveId;

/// One confirmation dialog: `Idle -> Proposed -> {Confirmed, Cancelled}`.
/// Proposing again from any state replaces whatever was held.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState<A> {
    Idle,
    Proposed(A),
    Confirmed,
    Cancelled,
}

impl<A> Default for FlowState<A> {
    fn default() -> Self {
        FlowState::Idle
    }
}

impl<A> FlowState<A> {
    pub fn propose(&mut self, action: A) {
        *self = FlowState::Proposed(action);
    }

    /// Hands out the held action. `None` when nothing is proposed; the state is then left as is.
    pub fn confirm(&mut self) -> Option<A> {
        match std::mem::replace(self, FlowState::Idle) {
            FlowState::Proposed(action) => {
                *self = FlowState::Confirmed;
                Some(action)
            }
            other => {
                *self = other;
                None
            }
        }
    }

    /// Discards the held action. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        match self {
            FlowState::Proposed(_) => {
                *self = FlowState::Cancelled;
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> Option<&A> {
        match self {
            FlowState::Proposed(action) => Some(action),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema, Display, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Flow {
    Overlap,
    BalanceUpdate,
    DeleteLeave,
    DeleteAll,
    DeleteAccount,
}

/// What a confirmed flow asks the engine to do.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    AddLeave(LeaveProposal),
    SetBalance(f64),
    DeleteLeave(LeaveId),
    DeleteAll,
    DeleteAccount,
}

/// Transient confirmation state of one login session.
#[derive(Debug, Default)]
pub struct Session {
    pub overlap: FlowState<LeaveProposal>,
    pub balance_update: FlowState<f64>,
    pub delete_leave: FlowState<LeaveId>,
    pub delete_all: FlowState<()>,
    pub delete_account: FlowState<()>,
}

impl Session {
    pub fn confirm(&mut self, flow: Flow) -> Option<PendingAction> {
        match flow {
            Flow::Overlap => self.overlap.confirm().map(PendingAction::AddLeave),
            Flow::BalanceUpdate => self.balance_update.confirm().map(PendingAction::SetBalance),
            Flow::DeleteLeave => self.delete_leave.confirm().map(PendingAction::DeleteLeave),
            Flow::DeleteAll => self.delete_all.confirm().map(|_| PendingAction::DeleteAll),
            Flow::DeleteAccount => self.delete_account.confirm().map(|_| PendingAction::DeleteAccount),
        }
    }

    /// Flows currently holding a proposal.
    pub fn pending_flows(&self) -> Vec<Flow> {
        let held = [
            (Flow::Overlap, self.overlap.pending().is_some()),
            (Flow::BalanceUpdate, self.balance_update.pending().is_some()),
            (Flow::DeleteLeave, self.delete_leave.pending().is_some()),
            (Flow::DeleteAll, self.delete_all.pending().is_some()),
            (Flow::DeleteAccount, self.delete_account.pending().is_some()),
        ];
        held.into_iter()
            .filter_map(|(flow, pending)| pending.then_some(flow))
            .collect()
    }

    pub fn cancel(&mut self, flow: Flow) -> bool {
        match flow {
            Flow::Overlap => self.overlap.cancel(),
            Flow::BalanceUpdate => self.balance_update.cancel(),
            Flow::DeleteLeave => self.delete_leave.cancel(),
            Flow::DeleteAll => self.delete_all.cancel(),
            Flow::DeleteAccount => self.delete_account.cancel(),
        }
    }
}
