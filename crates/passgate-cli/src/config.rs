//! Resolved CLI configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use passgate_core::{ApiUrl, AppProfile, RouteGuard};
use passgate_http::Session;
use passgate_store::FileStorage;

use crate::cli::GlobalArgs;

/// Used when neither `--api-url` nor `PASSGATE_API_URL` is given.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Settings every command runs with.
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiUrl,
    pub profile: AppProfile,
    pub data_dir: PathBuf,
}

impl Config {
    /// Resolve flags (or their environment variables) against the defaults.
    pub fn resolve(args: &GlobalArgs) -> Result<Self> {
        let api = ApiUrl::new(args.api_url.as_deref().unwrap_or(DEFAULT_API_URL))
            .context("Invalid API URL")?;

        let profile = match &args.app {
            Some(app) => app.parse().context("Invalid application profile")?,
            None => AppProfile::Admin,
        };

        let data_dir = match &args.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };

        tracing::debug!(
            api = %api,
            app = %profile,
            data_dir = %data_dir.display(),
            "Configuration resolved"
        );

        Ok(Self {
            api,
            profile,
            data_dir,
        })
    }

    /// Open the session for the configured profile.
    pub fn session(&self) -> Result<Session> {
        let storage = Arc::new(FileStorage::new(&self.data_dir));
        let session = Session::open(self.api.clone(), storage, self.profile)
            .context("Failed to open session")?;
        tracing::debug!(
            app = %self.profile,
            authenticated = session.is_authenticated(),
            "Session opened"
        );
        Ok(session)
    }

    /// A route guard for the configured profile, backed by `session`.
    pub fn guard(&self, session: Session) -> RouteGuard<Session> {
        RouteGuard::new(session, self.profile.routes(), self.profile.login_path())
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "passgate")
        .context("Could not determine a data directory; pass --data-dir")?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_given() {
        let args = GlobalArgs {
            data_dir: Some(PathBuf::from("/tmp/passgate-test")),
            ..GlobalArgs::default()
        };
        let config = Config::resolve(&args).unwrap();

        assert_eq!(config.api.host(), Some("localhost"));
        assert_eq!(
            config.api.endpoint("/api/auth/login"),
            "http://localhost:8000/api/auth/login"
        );
        assert_eq!(config.profile, AppProfile::Admin);
    }

    #[test]
    fn explicit_values_win() {
        let args = GlobalArgs {
            api_url: Some("https://passes.example.com/".to_string()),
            app: Some("guard".to_string()),
            data_dir: Some(PathBuf::from("/tmp/passgate-test")),
        };
        let config = Config::resolve(&args).unwrap();

        assert_eq!(config.api.host(), Some("passes.example.com"));
        assert_eq!(config.profile, AppProfile::Guard);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/passgate-test"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_url = GlobalArgs {
            api_url: Some("ftp://example.com".to_string()),
            data_dir: Some(PathBuf::from("/tmp")),
            ..GlobalArgs::default()
        };
        assert!(Config::resolve(&bad_url).is_err());

        let bad_app = GlobalArgs {
            app: Some("kiosk".to_string()),
            data_dir: Some(PathBuf::from("/tmp")),
            ..GlobalArgs::default()
        };
        assert!(Config::resolve(&bad_app).is_err());
    }
}
