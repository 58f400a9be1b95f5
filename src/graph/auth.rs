use crate::config::{ConfigManager, ConnectionConfig, TokenCache};
use crate::error::{M365Error, Result};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, DeviceAuthorizationUrl, EmptyExtraDeviceAuthorizationFields,
    RefreshToken, Scope, TokenResponse, TokenUrl,
};
use std::time::Duration;

const OFFLINE_ACCESS: &str = "offline_access";

fn default_scope(resource: &str) -> Scope {
    Scope::new(format!("{}/.default", resource.trim_end_matches('/')))
}

/// Acquires and caches tokens for the active connection
pub struct GraphAuth {
    config_manager: ConfigManager,
    authority: String,
}

impl GraphAuth {
    pub fn new(config_manager: ConfigManager, authority: &str) -> Self {
        Self {
            config_manager,
            authority: authority.trim_end_matches('/').to_string(),
        }
    }

    fn client(&self, connection: &ConnectionConfig) -> Result<BasicClient> {
        let tenant = &connection.tenant;

        let auth_url = AuthUrl::new(format!("{}/{}/oauth2/v2.0/authorize", self.authority, tenant))
            .map_err(|e| M365Error::AuthError(format!("Invalid auth URL: {}", e)))?;

        let token_url = TokenUrl::new(format!("{}/{}/oauth2/v2.0/token", self.authority, tenant))
            .map_err(|e| M365Error::AuthError(format!("Invalid token URL: {}", e)))?;

        let device_auth_url =
            DeviceAuthorizationUrl::new(format!("{}/{}/oauth2/v2.0/devicecode", self.authority, tenant))
                .map_err(|e| M365Error::AuthError(format!("Invalid device auth URL: {}", e)))?;

        let client_secret = connection.client_secret.clone().map(ClientSecret::new);

        Ok(BasicClient::new(
            ClientId::new(connection.client_id.clone()),
            client_secret,
            auth_url,
            Some(token_url),
        )
        .set_device_authorization_url(device_auth_url))
    }

    /// Authenticate using device code flow (interactive)
    pub async fn login_device_code(
        &self,
        connection: &ConnectionConfig,
        resource: &str,
    ) -> Result<TokenCache> {
        let client = self.client(connection)?;

        let details: oauth2::DeviceAuthorizationResponse<EmptyExtraDeviceAuthorizationFields> =
            client
                .exchange_device_code()
                .map_err(|e| M365Error::AuthError(format!("Device code exchange failed: {}", e)))?
                .add_scope(default_scope(resource))
                .add_scope(Scope::new(OFFLINE_ACCESS.to_string()))
                .request_async(async_http_client)
                .await
                .map_err(|e| {
                    M365Error::AuthError(format!("Device authorization request failed: {}", e))
                })?;

        println!("\nTo sign in, visit: {}", details.verification_uri().as_str());
        println!("Enter code: {}\n", details.user_code().secret());

        let token = client
            .exchange_device_access_token(&details)
            .request_async(async_http_client, tokio::time::sleep, None)
            .await
            .map_err(|e| M365Error::AuthError(format!("Token exchange failed: {}", e)))?;

        let cache = to_cache(&token, resource, None);
        self.config_manager.save_token(&connection.name, &cache)?;
        Ok(cache)
    }

    /// Authenticate with the app's client secret (non-interactive)
    pub async fn login_secret(
        &self,
        connection: &ConnectionConfig,
        resource: &str,
    ) -> Result<TokenCache> {
        if connection.client_secret.is_none() {
            return Err(M365Error::AuthError(
                "Client secret required for secret authentication".into(),
            ));
        }

        let token = self
            .client(connection)?
            .exchange_client_credentials()
            .add_scope(default_scope(resource))
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                M365Error::AuthError(format!("Client credentials exchange failed: {}", e))
            })?;

        let cache = to_cache(&token, resource, None);
        self.config_manager.save_token(&connection.name, &cache)?;
        Ok(cache)
    }

    /// Exchange a refresh token issued for one resource for a token to another
    async fn refresh(
        &self,
        connection: &ConnectionConfig,
        refresh_token: String,
        resource: &str,
    ) -> Result<TokenCache> {
        let token = self
            .client(connection)?
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .add_scope(default_scope(resource))
            .add_scope(Scope::new(OFFLINE_ACCESS.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| M365Error::AuthError(format!("Token refresh failed: {}", e)))?;

        let cache = to_cache(&token, resource, Some(refresh_token));
        self.config_manager.save_token(&connection.name, &cache)?;
        Ok(cache)
    }

    /// Valid access token for `resource`: cached, refreshed, or requested with the secret
    pub async fn access_token(&self, connection: &ConnectionConfig, resource: &str) -> Result<String> {
        if let Some(token) = self.config_manager.load_token(&connection.name, resource)? {
            if !token.is_expired() {
                return Ok(token.access_token);
            }
            tracing::debug!("Cached token for {} expired", resource);
        }

        if connection.client_secret.is_some() {
            tracing::debug!("Requesting app-only token for {}", resource);
            return Ok(self.login_secret(connection, resource).await?.access_token);
        }

        match self.config_manager.find_refresh_token(&connection.name)? {
            Some(refresh_token) => {
                tracing::debug!("Refreshing token for {}", resource);
                Ok(self.refresh(connection, refresh_token, resource).await?.access_token)
            }
            None => Err(M365Error::TokenNotFound),
        }
    }
}

fn to_cache(token: &BasicTokenResponse, resource: &str, previous_refresh: Option<String>) -> TokenCache {
    let lifetime = token.expires_in().unwrap_or(Duration::from_secs(3600));
    let expires_at = chrono::Utc::now()
        + chrono::Duration::from_std(lifetime).unwrap_or_else(|_| chrono::Duration::hours(1));

    TokenCache {
        access_token: token.access_token().secret().clone(),
        refresh_token: token
            .refresh_token()
            .map(|t| t.secret().clone())
            .or(previous_refresh),
        expires_at,
        resource: resource.trim_end_matches('/').to_string(),
    }
}
