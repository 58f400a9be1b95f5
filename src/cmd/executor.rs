use super::Command;
use super::confirm::{ConfirmationState, Prompter};
use crate::config::Session;
use crate::error::{M365Error, Result};
use crate::graph::Transport;
use crate::graph::request::{ACCEPT_JSON, ACCEPT_NOMETADATA, RequestDescriptor, graph_v1, site_api};
use crate::output::{Output, OutputMode};
use serde_json::Value;

/// Terminal result of one invocation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed(Output),
    /// The user declined the confirmation prompt; nothing was sent
    Aborted,
}

/// What a running command may use: the session and a way to issue requests
pub struct CommandContext<'a, T> {
    pub session: &'a Session,
    pub mode: OutputMode,
    transport: &'a T,
}

impl<'a, T: Transport> CommandContext<'a, T> {
    pub fn new(session: &'a Session, transport: &'a T, mode: OutputMode) -> Self {
        Self {
            session,
            mode,
            transport,
        }
    }

    /// Issue a preliminary lookup; failures surface as `ContextResolution`
    pub async fn resolve(&self, request: RequestDescriptor) -> Result<String> {
        self.transport
            .send(&request)
            .await
            .map_err(|e| M365Error::ContextResolution(e.message()))
    }

    pub async fn resolve_json(&self, request: RequestDescriptor) -> Result<Value> {
        parse_body(&self.resolve(request).await?)
    }

    /// Issue the command's primary request; failures surface as `Operation`
    pub async fn perform(&self, request: RequestDescriptor) -> Result<String> {
        self.transport
            .send(&request)
            .await
            .map_err(|e| M365Error::Operation(e.message()))
    }

    pub async fn perform_json(&self, request: RequestDescriptor) -> Result<Value> {
        parse_body(&self.perform(request).await?)
    }
}

fn parse_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}

/// Capability of discovering the SharePoint sites a command targets implicitly
#[allow(async_fn_in_trait)]
pub trait ResolvesSiteContext {
    /// Root SharePoint URL of the tenant, e.g. https://contoso.sharepoint.com
    async fn spo_url(&self) -> Result<String>;

    /// URL of the tenant app catalog site
    async fn tenant_app_catalog_url(&self) -> Result<String>;
}

impl<T: Transport> ResolvesSiteContext for CommandContext<'_, T> {
    async fn spo_url(&self) -> Result<String> {
        if let Some(url) = &self.session.spo_url {
            return Ok(url.clone());
        }

        tracing::debug!("No SharePoint URL configured. Retrieving it from the root site...");

        let request = RequestDescriptor::get(graph_v1(
            &self.session.graph_resource,
            "sites/root?$select=webUrl",
        ))
        .accept(ACCEPT_JSON);
        let site = self.resolve_json(request).await?;

        site.get("webUrl")
            .and_then(Value::as_str)
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| {
                M365Error::ContextResolution("SharePoint URL not found for the tenant".into())
            })
    }

    async fn tenant_app_catalog_url(&self) -> Result<String> {
        let spo_url = self.spo_url().await?;

        tracing::debug!("Retrieving tenant app catalog URL from {}...", spo_url);

        let request = RequestDescriptor::get(site_api(&spo_url, "_api/SP_TenantSettings_Current"))
            .accept(ACCEPT_NOMETADATA);
        let settings = self.resolve_json(request).await?;

        settings
            .get("CorporateCatalogUrl")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| {
                M365Error::ContextResolution(
                    "Tenant app catalog URL not found. Specify the URL of the app catalog site using the appCatalogUrl option.".into(),
                )
            })
    }
}

/// Runs commands against one session, transport and prompt
pub struct Executor<'a, T> {
    session: &'a Session,
    transport: &'a T,
    prompter: &'a dyn Prompter,
    mode: OutputMode,
}

impl<'a, T: Transport> Executor<'a, T> {
    pub fn new(
        session: &'a Session,
        transport: &'a T,
        prompter: &'a dyn Prompter,
        mode: OutputMode,
    ) -> Self {
        Self {
            session,
            transport,
            prompter,
            mode,
        }
    }

    pub async fn execute<C: Command>(&self, command: &C) -> Result<Outcome> {
        let descriptor = command.descriptor();

        command.validate()?;

        if command.requires_connection() && !self.session.connected {
            return Err(M365Error::NotConnected);
        }

        if let Some(gate) = command.confirmation() {
            if ConfirmationState::enter(gate).settle(self.prompter)? == ConfirmationState::Abort {
                tracing::info!("{} cancelled", descriptor.name);
                return Ok(Outcome::Aborted);
            }
        }

        tracing::debug!("Executing {}", descriptor.name);

        let ctx = CommandContext::new(self.session, self.transport, self.mode);
        let output = command.run(&ctx).await?;

        Ok(Outcome::Completed(
            output.project(descriptor.default_properties, self.mode),
        ))
    }
}
