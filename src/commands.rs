mod auth;
mod config;
mod files;

use crate::cli::{Commands, ConfigCommand, FilesCommand};
use crate::error::ClientError;
use crate::redact::{redact_known_token, redact_secrets};
use crate::settings::{default_config_dir, SettingsStore};
use crate::state::AppState;
use std::path::PathBuf;

type CommandResult<T = String> = Result<T, ClientError>;

/// Global options shared by every command.
pub struct CommandContext {
  pub config_dir: Option<PathBuf>,
  pub base_url: Option<String>,
}

fn now_iso() -> String {
  time::OffsetDateTime::now_utc()
    .format(&time::format_description::well_known::Rfc3339)
    .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Validates a restored session with the server before an authenticated
/// command runs. Fails locally when no session is left afterwards.
async fn require_session(state: &AppState) -> CommandResult<()> {
  if !state.session.is_authenticated().await {
    return Err(ClientError::NotAuthenticated);
  }
  if !state.session.validate_current_session().await {
    return Err(ClientError::Authentication(
      "Your session has expired. Please log in again.".to_string(),
    ));
  }
  Ok(())
}

fn open_settings(ctx: &CommandContext) -> CommandResult<SettingsStore> {
  let dir = ctx
    .config_dir
    .clone()
    .or_else(default_config_dir)
    .ok_or_else(|| {
      ClientError::Validation(
        "could not determine a configuration directory; pass --config-dir".to_string(),
      )
    })?;
  Ok(SettingsStore::open_in(&dir)?)
}

async fn run_command(command: Commands, state: &AppState) -> CommandResult {
  match command {
    Commands::Login { email, password } => auth::login(state, &email, &password).await,
    Commands::Register { email, password } => auth::register(state, &email, &password).await,
    Commands::Logout => auth::logout(state).await,
    Commands::Health => auth::health(state).await,
    Commands::Download { token, output } => {
      files::download(state, &token, output.as_deref()).await
    }
    Commands::Whoami => {
      require_session(state).await?;
      auth::whoami(state).await
    }
    Commands::Refresh => {
      require_session(state).await?;
      auth::refresh(state).await
    }
    Commands::Watch => {
      require_session(state).await?;
      auth::watch(state).await
    }
    Commands::Files(sub) => {
      require_session(state).await?;
      match sub {
        FilesCommand::List => files::list(state).await,
        FilesCommand::Upload { path, title, desc } => {
          files::upload(state, &path, &title, &desc).await
        }
        FilesCommand::Delete { id } => files::delete(state, id).await,
        FilesCommand::Share { id } => files::share(state, id).await,
        FilesCommand::Unshare { id } => files::unshare(state, id).await,
        FilesCommand::Url { id } => files::url(state, id).await,
      }
    }
    Commands::Config(_) => unreachable!("config commands are dispatched before the session is built"),
  }
}

fn run_config(command: ConfigCommand, ctx: &CommandContext) -> CommandResult {
  let mut settings = open_settings(ctx)?;
  match command {
    ConfigCommand::Show => config::show(&settings),
    ConfigCommand::Set { key, value } => config::set(&mut settings, &key, &value),
    ConfigCommand::Unset { key } => config::unset(&mut settings, &key),
  }
}

/// Runs one CLI command and returns the text to print on success.
pub async fn dispatch(command: Commands, ctx: &CommandContext) -> CommandResult {
  // Settings must stay editable even when they hold a broken base URL.
  let command = match command {
    Commands::Config(sub) => return run_config(sub, ctx),
    other => other,
  };

  let state = AppState::build(ctx.config_dir.clone(), ctx.base_url.as_deref())?;
  let token = state.session.current_session().await.map(|s| s.token);
  run_command(command, &state).await.inspect_err(|err| {
    let message = match &token {
      Some(token) => redact_known_token(&error_message(err), token),
      None => error_message(err),
    };
    tracing::debug!(error = %message, "command failed");
  })
}

/// User-facing text for a failed command. Secrets never reach the terminal.
pub fn error_message(err: &ClientError) -> String {
  let message = redact_secrets(&err.to_string()).into_owned();
  match err {
    ClientError::NotAuthenticated => {
      format!("{message}. Run `minicloud login <email>` first.")
    }
    _ => message,
  }
}

#[cfg(test)]
pub(crate) mod test_support {
  use crate::state::AppState;
  use crate::state::FileSessionStore;
  use crate::state::SessionStore;
  use crate::types::Session;
  use tempfile::TempDir;
  use wiremock::MockServer;

  /// An `AppState` rooted in a temp dir and pointed at `server`.
  pub(crate) fn state_for(server: &MockServer, session: Option<Session>) -> (AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    if let Some(session) = session {
      FileSessionStore::new(dir.path().join("session.json"))
        .save(&session)
        .unwrap();
    }
    let state = AppState::build(
      Some(dir.path().to_path_buf()),
      Some(&format!("{}/api/v1", server.uri())),
    )
    .unwrap();
    (state, dir)
  }
}

#[cfg(test)]
mod tests {
  use super::test_support::state_for;
  use super::*;
  use crate::types::Session;
  use serde_json::json;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[tokio::test]
  async fn authenticated_commands_validate_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/v1/auth/validate"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": false})))
      .expect(1)
      .mount(&server)
      .await;

    let (state, dir) = state_for(&server, Some(Session::new("T1", "a@b.com")));
    let err = run_command(Commands::Files(FilesCommand::List), &state)
      .await
      .unwrap_err();
    assert!(matches!(err, ClientError::Authentication(_)));
    assert!(!state.session.is_authenticated().await);

    let stored = std::fs::read_to_string(dir.path().join("session.json")).unwrap();
    assert!(!stored.contains("T1"));
  }

  #[tokio::test]
  async fn authenticated_commands_without_session_send_nothing() {
    let server = MockServer::start().await;
    let (state, _dir) = state_for(&server, None);

    let err = run_command(Commands::Whoami, &state).await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));
    assert!(error_message(&err).contains("minicloud login"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
  }

  #[tokio::test]
  async fn dispatch_keeps_the_error_variant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/v1/auth/validate"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": true})))
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .and(path("/api/v1/files/4"))
      .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "Denied for T1"})))
      .mount(&server)
      .await;

    let (_state, dir) = state_for(&server, Some(Session::new("T1", "a@b.com")));
    let ctx = CommandContext {
      config_dir: Some(dir.path().to_path_buf()),
      base_url: Some(format!("{}/api/v1", server.uri())),
    };
    let err = dispatch(Commands::Files(FilesCommand::Delete { id: 4 }), &ctx)
      .await
      .unwrap_err();
    assert!(matches!(err, ClientError::Server { status: 403, .. }));
    assert_eq!(err.status_code(), Some(403));
  }

  #[tokio::test]
  async fn config_commands_run_without_building_a_session() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = CommandContext {
      config_dir: Some(dir.path().to_path_buf()),
      base_url: Some("not a url".to_string()),
    };
    let out = dispatch(Commands::Config(ConfigCommand::Show), &ctx).await.unwrap();
    assert!(out.contains("\"baseUrl\""));
  }

  #[test]
  fn error_message_redacts_tokens() {
    let err = ClientError::Network("failed: Authorization: Bearer abc.def.ghi".to_string());
    assert!(!error_message(&err).contains("abc.def.ghi"));
  }

  #[test]
  fn timestamps_are_rfc3339() {
    let now = now_iso();
    assert!(now.contains('T'));
    assert!(now.ends_with('Z'));
  }
}
