use std::{fmt, path::PathBuf, time::Duration};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::Result;

/// Environment variables with this prefix override the settings file, e.g. `PCH_SPREADSHEET_ID`.
pub const ENV_PREFIX: &str = "PCH";
/// Optional settings file (any format `config` understands) in the working directory.
pub const SETTINGS_FILE: &str = "helpcenter_qna";

/// How long to wait before each subpage fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacingMode {
    /// Someone is watching: 0.5 to 5 sec.
    #[default]
    Interactive,
    /// Left running on its own: 5 to 10 sec, gentler on the site's rate limits.
    Unattended,
}

impl PacingMode {
    pub fn delay_range(self) -> (Duration, Duration) {
        match self {
            PacingMode::Interactive => (Duration::from_millis(500), Duration::from_secs(5)),
            PacingMode::Unattended => (Duration::from_secs(5), Duration::from_secs(10)),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct Settings {
    pub spreadsheet_id: String,
    /// OAuth bearer token for the Sheets API.
    pub sheets_token: String,
    #[serde(default = "default_sheets_api_url")]
    pub sheets_api_url: String,

    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(default = "default_helpcenter_url")]
    pub helpcenter_url: String,
    /// Prefix for the relative links found on the index page.
    #[serde(default = "default_article_base_url")]
    pub article_base_url: String,
    #[serde(default)]
    pub pacing: PacingMode,

    #[serde(default = "default_container_env_var")]
    pub container_env_var: String,
    #[serde(default = "default_container_export_dir")]
    pub container_export_dir: PathBuf,
    /// Where to dump the freshly scraped pairs for inspection, if anywhere.
    #[serde(default)]
    pub scrape_dump: Option<PathBuf>,
}

impl Settings {
    /// Reads `helpcenter_qna.*` if present, then `PCH_*` environment variables.
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(SETTINGS_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        Ok(config.try_deserialize()?)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("sheets_token", &"<redacted>")
            .field("sheets_api_url", &self.sheets_api_url)
            .field("webdriver_url", &self.webdriver_url)
            .field("headless", &self.headless)
            .field("helpcenter_url", &self.helpcenter_url)
            .field("article_base_url", &self.article_base_url)
            .field("pacing", &self.pacing)
            .field("container_env_var", &self.container_env_var)
            .field("container_export_dir", &self.container_export_dir)
            .field("scrape_dump", &self.scrape_dump)
            .finish()
    }
}

fn default_sheets_api_url() -> String {
    "https://sheets.googleapis.com/v4/spreadsheets".into()
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}

fn default_headless() -> bool {
    true
}

fn default_helpcenter_url() -> String {
    "https://polycade.com/pages/helphq-2#/".into()
}

fn default_article_base_url() -> String {
    "https://polycade.com/pages/helphq-2".into()
}

fn default_container_env_var() -> String {
    "PCH_IN_CONTAINER".into()
}

fn default_container_export_dir() -> PathBuf {
    PathBuf::from("/data/exports")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_builder() -> config::ConfigBuilder<config::builder::DefaultState> {
        Config::builder()
            .set_override("spreadsheet_id", "sheet-123")
            .unwrap()
            .set_override("sheets_token", "secret-token")
            .unwrap()
    }

    #[test]
    fn defaults_fill_everything_but_credentials() {
        let settings = Settings::from_config(base_builder().build().unwrap()).unwrap();
        assert_eq!(settings.spreadsheet_id, "sheet-123");
        assert_eq!(settings.pacing, PacingMode::Interactive);
        assert!(settings.headless);
        assert_eq!(settings.article_base_url, "https://polycade.com/pages/helphq-2");
        assert_eq!(settings.container_export_dir, PathBuf::from("/data/exports"));
        assert!(settings.scrape_dump.is_none());
    }

    #[test]
    fn pacing_mode_is_read_from_lowercase_name() {
        let config = base_builder()
            .set_override("pacing", "unattended")
            .unwrap()
            .build()
            .unwrap();
        let settings = Settings::from_config(config).unwrap();
        assert_eq!(settings.pacing, PacingMode::Unattended);
        assert_eq!(
            settings.pacing.delay_range(),
            (Duration::from_secs(5), Duration::from_secs(10))
        );
    }

    #[test]
    fn missing_spreadsheet_id_is_an_error() {
        let config = Config::builder()
            .set_override("sheets_token", "secret-token")
            .unwrap()
            .build()
            .unwrap();
        assert!(Settings::from_config(config).is_err());
    }

    #[test]
    fn debug_output_hides_the_token() {
        let settings = Settings::from_config(base_builder().build().unwrap()).unwrap();
        let printed = format!("{settings:?}");
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("<redacted>"));
    }
}
