use super::CommandResult;
use crate::formatters::{format_file_list, format_file_size};
use crate::state::AppState;
use std::path::Path;

pub(super) async fn list(state: &AppState) -> CommandResult {
    let records = state.files.list().await?;
    Ok(format_file_list(&records, |r| state.files.public_url_for(r)))
}

pub(super) async fn upload(state: &AppState, path: &Path, title: &str, desc: &str) -> CommandResult {
    let record = state.files.upload(Some(path), title, desc).await?;
    Ok(format!(
        "File uploaded successfully! [{}] {} ({})",
        record.id,
        record.title,
        format_file_size(record.file_size)
    ))
}

pub(super) async fn delete(state: &AppState, id: i64) -> CommandResult {
    state.files.delete(id).await?;
    Ok("File deleted successfully!".to_string())
}

pub(super) async fn share(state: &AppState, id: i64) -> CommandResult {
    let url = state.files.share(id).await?;
    Ok(format!("File shared successfully! Public URL generated.\n{url}"))
}

pub(super) async fn unshare(state: &AppState, id: i64) -> CommandResult {
    state.files.revoke_share(id).await?;
    Ok("File sharing revoked successfully!".to_string())
}

pub(super) async fn url(state: &AppState, id: i64) -> CommandResult {
    Ok(state
        .files
        .share_status(id)
        .await?
        .unwrap_or_else(|| "File is not shared.".to_string()))
}

pub(super) async fn download(state: &AppState, token: &str, output: Option<&Path>) -> CommandResult {
    let written = state.files.download_public(token, output).await?;
    Ok(format!("Downloaded to {}", written.display()))
}
