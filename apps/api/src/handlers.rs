pub mod activity;
pub mod attendance;
pub mod batches;
pub mod fees;
pub mod health;
pub mod students;

use academy_application::AuthorizationService;
use academy_core::{AppResult, Caller};

/// Unwraps the caller attached by the session middleware.
fn authenticated(caller: Option<Caller>) -> AppResult<Caller> {
    AuthorizationService::require_authenticated(caller.as_ref()).copied()
}

#[cfg(test)]
mod tests;
