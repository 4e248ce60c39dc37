//! Error reporting helpers shared by every subsystem

/// Errors that know whether their message is meant for the operator
///
/// A user-actionable error (bad configuration, missing role, unknown format)
/// carries a message that tells the operator what to change. Anything else
/// is logged with the operation that failed and the detail goes to debug.
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return `Some`.
pub trait ContextualError: std::error::Error {
    fn is_user_actionable(&self) -> bool;

    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error at the detail level suited to the audience
///
/// Returns the line that was logged at error level so callers can echo it.
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) -> String {
    let headline = match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => format!("FATAL: {}", user_msg),
        _ => format!("FATAL: {}: {}", operation_context, error),
    };
    log::error!("{}", headline);
    log::debug!("DEBUG_DETAILS: {:?}", error);
    headline
}
