use super::{now_iso, CommandResult};
use crate::error::ClientError;
use crate::refresh::spawn_refresh_loop;
use crate::state::{AppState, SessionManager};
use crate::types::RefreshOutcome;
use crate::validation::require_credentials;
use std::time::Duration;

pub(super) async fn login(state: &AppState, email: &str, password: &str) -> CommandResult {
    require_credentials(email, password)?;
    let session = state.session.login(email.trim(), password).await?;
    Ok(format!("Login successful! Signed in as {}.", session.email))
}

pub(super) async fn register(state: &AppState, email: &str, password: &str) -> CommandResult {
    require_credentials(email, password)?;
    let session = state.session.register(email.trim(), password).await?;
    Ok(format!("Registration successful! Signed in as {}.", session.email))
}

pub(super) async fn logout(state: &AppState) -> CommandResult {
    let was_signed_in = state.session.is_authenticated().await;
    state.session.logout().await;
    Ok(if was_signed_in {
        "Logged out.".to_string()
    } else {
        "Not signed in.".to_string()
    })
}

pub(super) async fn whoami(state: &AppState) -> CommandResult {
    state
        .session
        .current_user()
        .await
        .map(|email| format!("Signed in as {email}."))
        .ok_or(ClientError::NotAuthenticated)
}

pub(super) async fn refresh(state: &AppState) -> CommandResult {
    match state.session.refresh().await? {
        RefreshOutcome::Refreshed => Ok("Session refreshed.".to_string()),
        RefreshOutcome::Expired => Err(ClientError::Authentication(
            "Your session has expired. Please log in again.".to_string(),
        )),
        RefreshOutcome::Skipped => Ok("Session changed during refresh; nothing to do.".to_string()),
    }
}

pub(super) async fn health(state: &AppState) -> CommandResult {
    let status = state.files.health().await?;
    Ok(format!("Server status: {status}"))
}

/// Resolves once the session is gone, checking every `every`.
async fn signed_out(session: &SessionManager, every: Duration) {
    loop {
        tokio::time::sleep(every).await;
        if !session.is_authenticated().await {
            return;
        }
    }
}

/// Runs the refresh loop until Ctrl-C or until the session ends.
pub(super) async fn watch(state: &AppState) -> CommandResult {
    let email = state.session.current_user().await.unwrap_or_default();
    let interval = state.refresh_interval();
    println!(
        "Keeping {email} signed in, refreshing every {}s. Press Ctrl-C to stop.",
        interval.as_secs()
    );

    let task = spawn_refresh_loop(state.session.clone(), interval);
    let result = tokio::select! {
        res = tokio::signal::ctrl_c() => res
            .map(|_| format!("Stopped at {}.", now_iso()))
            .map_err(ClientError::from),
        _ = signed_out(&state.session, interval) => Err(ClientError::Authentication(format!(
            "Session ended at {}. Please log in again.",
            now_iso()
        ))),
    };
    task.shutdown().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::state_for;
    use crate::types::Session;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn login_reports_success_and_persists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"token": "T1", "email": "a@b.com"})),
            )
            .mount(&server)
            .await;

        let (state, dir) = state_for(&server, None);
        let out = login(&state, "a@b.com", "Passw0rd").await.unwrap();
        assert!(out.starts_with("Login successful!"));

        let stored = std::fs::read_to_string(dir.path().join("session.json")).unwrap();
        assert!(stored.contains("\"authToken\""));
        assert!(stored.contains("T1"));
    }

    #[tokio::test]
    async fn blank_fields_are_rejected_before_the_session() {
        let server = MockServer::start().await;
        let (state, _dir) = state_for(&server, None);

        let err = login(&state, " ", "Passw0rd").await.unwrap_err();
        assert_eq!(err.to_string(), "Please fill in all fields");
        let err = register(&state, "a@b.com", "weak").await.unwrap_err();
        assert!(matches!(err, ClientError::WeakPassword(_)));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn logout_without_session_is_harmless() {
        let server = MockServer::start().await;
        let (state, _dir) = state_for(&server, None);
        assert_eq!(logout(&state).await.unwrap(), "Not signed in.");
    }

    #[tokio::test]
    async fn refresh_command_reports_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let (state, _dir) = state_for(&server, Some(Session::new("T1", "a@b.com")));
        let err = refresh(&state).await.unwrap_err();
        assert!(matches!(err, ClientError::Authentication(_)));
        assert!(!state.session.is_authenticated().await);
    }

    #[tokio::test]
    async fn whoami_names_the_user() {
        let server = MockServer::start().await;
        let (state, _dir) = state_for(&server, Some(Session::new("T1", "a@b.com")));
        assert_eq!(whoami(&state).await.unwrap(), "Signed in as a@b.com.");
    }

    #[tokio::test]
    async fn health_prints_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "UP"})))
            .mount(&server)
            .await;

        let (state, _dir) = state_for(&server, None);
        assert_eq!(health(&state).await.unwrap(), "Server status: UP");
    }

    #[tokio::test]
    async fn signed_out_resolves_after_logout() {
        let server = MockServer::start().await;
        let (state, _dir) = state_for(&server, Some(Session::new("T1", "a@b.com")));
        state.session.logout().await;

        tokio::time::timeout(
            Duration::from_secs(2),
            signed_out(&state.session, Duration::from_millis(10)),
        )
        .await
        .unwrap();
    }
}
