pub mod chat;
pub mod embed;
pub mod identity;
pub mod snippet;

use crate::SettingsArgs;
use anyhow::{Context, Result};
use embedchat_core::config::endpoint_origin;
use embedchat_core::identity::IdentityStore;
use embedchat_infrastructure::{FileStore, Settings, SettingsStorage};

/// Resolves settings: flags > environment > file > defaults.
pub fn load_settings(args: &SettingsArgs) -> Result<Settings> {
    let storage = match &args.config {
        Some(path) => SettingsStorage::with_path(path.clone()),
        None => SettingsStorage::new().context("could not locate settings file")?,
    };
    let mut settings = storage
        .load()
        .with_context(|| format!("failed to load {}", storage.path().display()))?
        .apply_env();

    if let Some(endpoint) = &args.endpoint {
        settings.endpoint = endpoint.clone();
    }
    if let Some(client_id) = &args.client_id {
        settings.client_id = Some(client_id.clone());
    }
    if let Some(timeout) = args.timeout {
        settings.request_timeout_secs = timeout;
    }
    Ok(settings)
}

/// Identity store for `origin` (or the endpoint origin) in the default file.
pub fn identity_store(settings: &Settings, origin: Option<&str>) -> Result<IdentityStore<FileStore>> {
    let store = FileStore::new().context("could not open identity store")?;
    let origin = origin.unwrap_or_else(|| endpoint_origin(&settings.endpoint));
    Ok(IdentityStore::new(store, origin))
}
