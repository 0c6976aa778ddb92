use anyhow::{Context as AnyhowContext, Result};
use phenoflow_core::{ServiceConfig, DEFAULT_KEEP_REPOSITORY};
use phenoflow_protocol::Committer;
use phenoflow_store::StoreConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub(crate) const USER_NAME_ENV: &str = "USER_NAME";
pub(crate) const USER_EMAIL_ENV: &str = "USER_EMAIL";
pub(crate) const PORT_ENV: &str = "PORT";
pub(crate) const KEEP_REPOS_ENV: &str = "PHENOFLOW_KEEP_REPOS";
pub(crate) const SEED_PATH_ENV: &str = "PHENOFLOW_SEED_PATH";

pub(crate) const DEFAULT_PORT: u16 = 3000;
const LOCAL_COMMITTER: &str = "phenoflow";

/// Loads `.env` from the working directory or an ancestor. A missing file
/// is fine; one that fails to parse is fatal.
pub(crate) fn load_dotenv() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err).context("Failed to load .env"),
    }
}

/// Address used when `--bind` is absent: loopback on `$PORT`.
pub(crate) fn default_bind() -> Result<String> {
    let port = match env::var(PORT_ENV) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u16>()
            .with_context(|| format!("{PORT_ENV} must be a port number, got {raw:?}"))?,
        _ => DEFAULT_PORT,
    };
    Ok(format!("127.0.0.1:{port}"))
}

pub(crate) fn store_config(timeout: Duration) -> Result<StoreConfig> {
    let config = StoreConfig::from_env().context("Failed to read store configuration")?;
    Ok(config.with_timeout(timeout))
}

/// Commit identity and bulk-operation settings. With `local` set, the
/// committer falls back to a fixed identity instead of failing.
pub(crate) fn service_config(local: bool) -> Result<ServiceConfig> {
    let committer = match (env_value(USER_NAME_ENV), env_value(USER_EMAIL_ENV)) {
        (Some(name), Some(email)) => Committer { name, email },
        _ if local => Committer {
            name: LOCAL_COMMITTER.to_string(),
            email: format!("{LOCAL_COMMITTER}@localhost"),
        },
        _ => anyhow::bail!("{USER_NAME_ENV} and {USER_EMAIL_ENV} must be set"),
    };

    let mut config = ServiceConfig::new(committer);
    config.keep_repositories = env_value(KEEP_REPOS_ENV)
        .map(|raw| parse_keep_list(&raw))
        .unwrap_or_else(|| vec![DEFAULT_KEEP_REPOSITORY.to_string()]);
    config.seed_path = env_value(SEED_PATH_ENV).map(PathBuf::from);
    Ok(config)
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_keep_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
