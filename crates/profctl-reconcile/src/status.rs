//! Derived request-status priority fold.

use profctl_schemas::{CommandStatus, RequestStatus};

/// Map a command's lifecycle status onto the request-status domain.
fn request_status_for(command_status: CommandStatus) -> RequestStatus {
    match command_status {
        CommandStatus::Completed => RequestStatus::Completed,
        CommandStatus::Pending => RequestStatus::Pending,
        CommandStatus::Sent => RequestStatus::Sent,
        CommandStatus::Failed => RequestStatus::Failed,
    }
}

/// Derive a request's status as the priority-max over its contributing
/// commands' statuses, using `completed < pending < sent < failed`
/// (`failed` dominates).
///
/// Returns `None` for a request with no contributing commands — callers
/// should treat that as "not yet reconciled" rather than guessing a value.
pub fn derive_request_status(command_statuses: &[CommandStatus]) -> Option<RequestStatus> {
    command_statuses
        .iter()
        .copied()
        .map(request_status_for)
        .max()
}
