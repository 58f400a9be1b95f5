use crate::error::{M365Error, Result};
use crate::output::OutputMode;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const GRAPH_RESOURCE: &str = "https://graph.microsoft.com";
pub const LOGIN_AUTHORITY: &str = "https://login.microsoftonline.com";

/// PnP Management Shell, the multi-tenant app used when no app id is given
pub const DEFAULT_CLIENT_ID: &str = "31359c7f-bd7e-475c-86db-fdb8c937548e";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Output mode used when `--output` is not given
    #[serde(default)]
    pub output: Option<OutputMode>,

    /// SharePoint root site URL, e.g. https://contoso.sharepoint.com
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spo_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_resource: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionConfig>,
}

/// The tenant and app registration the CLI signs in with
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub name: String,

    /// Tenant id or domain; `common` for device code sign-in without a tenant
    pub tenant: String,

    pub client_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub auth_type: AuthType,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AuthType {
    #[default]
    DeviceCode,
    Secret,
}

/// Cached access token for one resource
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenCache {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub resource: String,
}

impl TokenCache {
    pub fn is_expired(&self) -> bool {
        // Treat tokens about to expire as expired so a request never races the clock
        self.expires_at - chrono::Duration::minutes(1) < chrono::Utc::now()
    }
}

/// Read-only view of the process-wide connection state handed to the executor
#[derive(Debug, Clone)]
pub struct Session {
    pub connected: bool,
    pub connection: Option<String>,
    pub graph_resource: String,
    pub authority: String,
    pub spo_url: Option<String>,
}

impl Session {
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            connection: None,
            graph_resource: GRAPH_RESOURCE.to_string(),
            authority: LOGIN_AUTHORITY.to_string(),
            spo_url: None,
        }
    }

    /// A connected session against the given Graph resource
    pub fn connected(graph_resource: impl Into<String>) -> Self {
        Self {
            connected: true,
            connection: Some("default".to_string()),
            graph_resource: graph_resource.into().trim_end_matches('/').to_string(),
            ..Self::disconnected()
        }
    }

    pub fn with_spo_url(mut self, spo_url: impl Into<String>) -> Self {
        self.spo_url = Some(spo_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into().trim_end_matches('/').to_string();
        self
    }
}

/// Configuration manager
#[derive(Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let project_dirs = ProjectDirs::from("com", "m365ctl", "m365ctl").ok_or_else(|| {
            M365Error::ConfigError("Failed to determine config directory".into())
        })?;

        Self::with_dir(project_dirs.config_dir().to_path_buf())
    }

    pub fn with_dir(config_dir: PathBuf) -> Result<Self> {
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        Ok(Self { config_dir })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    fn cache_dir(&self, connection: &str) -> PathBuf {
        self.config_dir.join("cache").join(connection)
    }

    pub fn token_cache_file(&self, connection: &str, resource: &str) -> PathBuf {
        self.cache_dir(connection)
            .join(format!("{}.json", resource_file_stem(resource)))
    }

    /// Load main config
    pub fn load_config(&self) -> Result<Config> {
        let config_path = self.config_file();

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save main config
    pub fn save_config(&self, config: &Config) -> Result<()> {
        let contents = toml::to_string_pretty(config)
            .map_err(|e| M365Error::ConfigError(format!("Failed to serialize config: {}", e)))?;
        fs::write(self.config_file(), contents)?;
        Ok(())
    }

    pub fn set_connection(&self, connection: ConnectionConfig, spo_url: Option<String>) -> Result<()> {
        let mut config = self.load_config()?;

        if let Some(previous) = &config.connection {
            if previous.name != connection.name {
                self.delete_tokens(&previous.name)?;
            }
        }

        config.connection = Some(connection);
        if spo_url.is_some() {
            config.spo_url = spo_url;
        }
        self.save_config(&config)
    }

    /// Forget the active connection and every cached token for it
    pub fn clear_connection(&self) -> Result<Option<ConnectionConfig>> {
        let mut config = self.load_config()?;
        let previous = config.connection.take();

        if let Some(connection) = &previous {
            self.delete_tokens(&connection.name)?;
        }

        self.save_config(&config)?;
        Ok(previous)
    }

    pub fn save_token(&self, connection: &str, token: &TokenCache) -> Result<()> {
        let cache_dir = self.cache_dir(connection);
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir)?;
        }

        let contents = serde_json::to_string_pretty(token)?;
        fs::write(self.token_cache_file(connection, &token.resource), contents)?;
        Ok(())
    }

    /// Load a cached token, expired or not
    pub fn load_token(&self, connection: &str, resource: &str) -> Result<Option<TokenCache>> {
        let token_path = self.token_cache_file(connection, resource);

        if !token_path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(token_path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Any cached token for the connection that carries a refresh token
    pub fn find_refresh_token(&self, connection: &str) -> Result<Option<String>> {
        let cache_dir = self.cache_dir(connection);
        if !cache_dir.exists() {
            return Ok(None);
        }

        for entry in fs::read_dir(cache_dir)? {
            let contents = fs::read_to_string(entry?.path())?;
            let token: TokenCache = serde_json::from_str(&contents)?;
            if token.refresh_token.is_some() {
                return Ok(token.refresh_token);
            }
        }

        Ok(None)
    }

    pub fn has_tokens(&self, connection: &str) -> bool {
        fs::read_dir(self.cache_dir(connection))
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    pub fn delete_tokens(&self, connection: &str) -> Result<()> {
        let cache_dir = self.cache_dir(connection);

        if cache_dir.exists() {
            fs::remove_dir_all(cache_dir)?;
        }

        Ok(())
    }

    /// Build the session the executor runs against
    pub fn session(&self) -> Result<Session> {
        let config = self.load_config()?;

        let connected = match &config.connection {
            Some(connection) => {
                connection.client_secret.is_some() || self.has_tokens(&connection.name)
            }
            None => false,
        };

        let mut session = Session::disconnected();
        session.connected = connected;
        session.connection = config.connection.map(|c| c.name);
        if let Some(graph) = config.graph_resource {
            session.graph_resource = graph.trim_end_matches('/').to_string();
        }
        if let Some(authority) = config.authority {
            session.authority = authority.trim_end_matches('/').to_string();
        }
        session.spo_url = config.spo_url.map(|u| u.trim_end_matches('/').to_string());

        Ok(session)
    }
}

fn resource_file_stem(resource: &str) -> String {
    resource
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .replace([':', '/'], "_")
}
