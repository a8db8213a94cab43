/// Request type answered with `{ "history": [...] }`.
pub const HISTORY_REQUEST_TYPE: &str = "lock_history/history";

/// Event fired by the backend whenever an entry was added to the history.
pub const HISTORY_UPDATED_EVENT: &str = "lock_history.history_updated";

/// Amount of entries the backend keeps.
pub const MAX_HISTORY: usize = 99;
