pub mod auth;
pub mod config;
pub mod sync;

use anyhow::Result;

use crate::config::{self as cfg, Config};

/// Load the config file, writing the template on first run.
/// Returns None when the template was just created and needs filling in.
pub fn load_config() -> Result<Option<Config>> {
    let path = cfg::config_path()?;

    if cfg::ensure_template(&path)? {
        println!("Created a config template at {}", path.display());
        println!("Fill in your Garoon and Google credentials, then run again.");
        return Ok(None);
    }

    Ok(Some(cfg::load(&path)?))
}

pub fn oauth_client(config: &Config) -> grnsync_google::OAuthClient {
    grnsync_google::OAuthClient::new(&config.google.client_id, &config.google.client_secret)
}
