use super::CommandResult;
use crate::error::ClientError;
use crate::settings::SettingsStore;
use serde_json::Value;

pub(super) fn show(settings: &SettingsStore) -> CommandResult {
    let entries = serde_json::to_string_pretty(&Value::Object(settings.entries()))
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
    Ok(format!("# {}\n{entries}", settings.path().display()))
}

pub(super) fn set(settings: &mut SettingsStore, key: &str, value: &str) -> CommandResult {
    settings
        .set_from_str(key, value)
        .map_err(ClientError::Validation)?;
    settings.save()?;
    Ok(format!("Saved {key}."))
}

pub(super) fn unset(settings: &mut SettingsStore, key: &str) -> CommandResult {
    settings.remove(key);
    settings.save()?;
    Ok(format!("Reset {key} to its default."))
}
