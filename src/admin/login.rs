use std::sync::Arc;

use axum::{Form, debug_handler, extract::State, response::Redirect};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::{AppResult, AppState, Config, session::IS_ADMIN};

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    #[serde(default)]
    password: String,
}

/// Constant-time check. Nothing matches while no password is configured.
fn password_matches(expected: Option<&str>, given: &str) -> bool {
    match expected {
        Some(expected) => expected.as_bytes().ct_eq(given.as_bytes()).into(),
        None => false,
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn login(
    State(config): State<Arc<Config>>,
    session: Session,
    Form(LoginForm { password }): Form<LoginForm>,
) -> AppResult<Redirect> {
    if password_matches(config.admin_password.as_deref(), &password) {
        session.cycle_id().await?;
        session.insert(IS_ADMIN, true).await?;
        info!("operator signed in");
    } else {
        warn!("rejected admin login");
        session.clear().await;
    }
    Ok(Redirect::to("/admin"))
}

#[debug_handler]
pub(crate) async fn logout(session: Session) -> AppResult<Redirect> {
    session.flush().await?;
    Ok(Redirect::to("/admin"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_configured_password_matches() {
        assert!(password_matches(Some("hunter2"), "hunter2"));
        assert!(!password_matches(Some("hunter2"), "hunter3"));
        assert!(!password_matches(Some("hunter2"), "hunter22"));
        assert!(!password_matches(Some("hunter2"), ""));
        assert!(!password_matches(None, ""));
        assert!(!password_matches(None, "hunter2"));
    }
}
