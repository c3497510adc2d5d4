pub mod leave_record;
pub mod profile;
pub mod user;

/// Store-assigned account id. The engine treats it as an opaque, pre-validated token.
pub type UserId = u64;
pub type LeaveId = u64;
