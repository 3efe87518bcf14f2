/// Describes the kinds of errors surfaced to the callers of the reminder operations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Request parameters are malformed (e.g. empty title).
    InvalidRequest,
    /// Timestamp is unparsable or doesn't carry an explicit UTC offset.
    InvalidTimestamp,
    /// Target time is closer to "now" than the configured minimum lead time.
    LeadTimeTooShort,
    /// Reminder with the specified ID doesn't exist.
    NotFound,
    /// Reminder isn't in a state that allows the requested transition.
    InvalidState,
    /// Storage backend failed or is unavailable.
    Storage,
}
