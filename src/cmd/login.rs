use super::validation::{self, Rule, match_one_of};
use crate::config::{AuthType, ConfigManager, ConnectionConfig, DEFAULT_CLIENT_ID};
use crate::error::{Result, ValidationError};
use crate::graph::auth::GraphAuth;
use crate::output::Output;
use crate::tui::prompts;
use clap::Args;
use colored::Colorize;
use serde_json::json;

const AUTH_TYPES: &[&str] = &["deviceCode", "secret"];
const COMMON_TENANT: &str = "common";

#[derive(Args, Debug, Clone, Default)]
pub struct LoginArgs {
    /// Authentication method: deviceCode (default) or secret
    #[arg(long = "authType")]
    pub auth_type: Option<String>,

    /// Tenant id or domain to sign in to. Defaults to common
    #[arg(short, long)]
    pub tenant: Option<String>,

    /// Application (client) id. Defaults to the PnP Management Shell app
    #[arg(long = "appId")]
    pub app_id: Option<String>,

    /// Client secret, required when authType is secret
    #[arg(short, long)]
    pub secret: Option<String>,

    /// SharePoint root URL, e.g. https://contoso.sharepoint.com
    #[arg(long = "spoUrl")]
    pub spo_url: Option<String>,
}

impl LoginArgs {
    fn auth_type(&self) -> AuthType {
        match self.auth_type.as_deref().and_then(|t| match_one_of(t, AUTH_TYPES)) {
            Some("secret") => AuthType::Secret,
            _ => AuthType::DeviceCode,
        }
    }

    fn rules(&self) -> Vec<Rule<'_>> {
        let secret_auth = self.auth_type() == AuthType::Secret;

        vec![
            Rule::OneOf {
                option: "authType",
                value: self.auth_type.as_deref(),
                allowed: AUTH_TYPES,
            },
            Rule::RequiredWhen {
                option: "secret",
                present: self.secret.is_some(),
                active: secret_auth,
                condition: "authType is secret",
            },
            Rule::RequiredWhen {
                option: "tenant",
                present: self.tenant.is_some(),
                active: secret_auth,
                condition: "authType is secret",
            },
            Rule::Guid {
                option: "appId",
                value: self.app_id.as_deref(),
            },
            Rule::SharePointUrl {
                option: "spoUrl",
                value: self.spo_url.as_deref(),
            },
        ]
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        validation::check(&self.rules())
    }

    pub fn connection(&self) -> ConnectionConfig {
        let tenant = self.tenant.clone().unwrap_or_else(|| COMMON_TENANT.to_string());
        let auth_type = self.auth_type();

        ConnectionConfig {
            name: tenant.clone(),
            tenant,
            client_id: self
                .app_id
                .clone()
                .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            client_secret: match auth_type {
                AuthType::Secret => self.secret.clone(),
                AuthType::DeviceCode => None,
            },
            auth_type,
        }
    }
}

/// Sign in and make the connection the active one
pub async fn login(args: LoginArgs, config_manager: &ConfigManager) -> Result<()> {
    args.validate()?;

    let session = config_manager.session()?;
    let connection = args.connection();
    let auth = GraphAuth::new(config_manager.clone(), &session.authority);

    tracing::debug!(
        "Signing in to {} with {:?} as {}",
        connection.tenant,
        connection.auth_type,
        connection.client_id
    );

    match connection.auth_type {
        AuthType::DeviceCode => {
            auth.login_device_code(&connection, &session.graph_resource)
                .await?
        }
        AuthType::Secret => auth.login_secret(&connection, &session.graph_resource).await?,
    };

    let name = connection.name.clone();
    config_manager.set_connection(connection, args.spo_url.clone())?;

    prompts::success(&format!("Logged in to {}", name.bold()));
    Ok(())
}

/// Forget the active connection and its cached tokens
pub fn logout(config_manager: &ConfigManager) -> Result<()> {
    match config_manager.clear_connection()? {
        Some(connection) => prompts::success(&format!("Logged out from {}", connection.name)),
        None => prompts::info("Not logged in"),
    }
    Ok(())
}

/// Describe the active connection
pub fn status(config_manager: &ConfigManager) -> Result<Output> {
    let session = config_manager.session()?;
    let config = config_manager.load_config()?;

    match config.connection {
        Some(connection) if session.connected => Ok(Output::Json(json!({
            "connectedAs": connection.name,
            "tenant": connection.tenant,
            "appId": connection.client_id,
            "authType": connection.auth_type,
            "spoUrl": session.spo_url,
        }))),
        _ => Ok(Output::Json(json!({ "connectedAs": null }))),
    }
}
