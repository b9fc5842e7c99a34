//! Forced navigation to the login view.

/// Receives the "session is gone, go to login" signal.
///
/// Presentation code implements this; the orchestrator only triggers it.
pub trait LoginNavigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Navigator that only records the redirect in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl LoginNavigator for LogNavigator {
    fn redirect_to_login(&self) {
        tracing::warn!("Session expired, redirecting to login");
    }
}
