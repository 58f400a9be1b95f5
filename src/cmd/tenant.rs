//! Tenant identity lookup

use super::executor::{CommandContext, ResolvesSiteContext};
use super::{Command, CommandDescriptor};
use crate::error::{M365Error, Result};
use crate::graph::Transport;
use crate::graph::request::{ACCEPT_JSON, RequestDescriptor, encode_segment};
use crate::output::Output;
use clap::Args;
use serde_json::Value;

pub static ID_GET: CommandDescriptor = CommandDescriptor {
    name: "tenant id get",
    description: "Gets Microsoft 365 tenant ID for the specified domain",
    default_properties: None,
    autocomplete: &[],
    requires_connection: true,
};

#[derive(Args, Debug, Clone)]
pub struct IdGetArgs {
    /// The domain name for which to retrieve the tenant ID. Defaults to the current tenant
    #[arg(short, long = "domainName")]
    pub domain_name: Option<String>,
}

/// `contoso.sharepoint.com` -> `contoso.onmicrosoft.com`
pub fn domain_from_spo_url(spo_url: &str) -> Option<String> {
    let host = reqwest::Url::parse(spo_url).ok()?.host_str()?.to_string();
    let tenant = host.split('.').next().filter(|label| !label.is_empty())?;
    Some(format!("{}.onmicrosoft.com", tenant))
}

/// The tenant id is the first path segment of the token endpoint
fn tenant_id_from_configuration(configuration: &Value) -> Option<String> {
    let endpoint = configuration.get("token_endpoint")?.as_str()?;
    let url = reqwest::Url::parse(endpoint).ok()?;
    url.path_segments()?
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

impl Command for IdGetArgs {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &ID_GET
    }

    // An explicit domain is looked up anonymously
    fn requires_connection(&self) -> bool {
        self.domain_name.is_none()
    }

    async fn run<T: Transport>(&self, ctx: &CommandContext<'_, T>) -> Result<Output> {
        let domain = match &self.domain_name {
            Some(domain) => domain.clone(),
            None => {
                let spo_url = ctx.spo_url().await?;
                domain_from_spo_url(&spo_url).ok_or_else(|| {
                    M365Error::ContextResolution(format!(
                        "Unable to determine the tenant domain from {}",
                        spo_url
                    ))
                })?
            }
        };

        tracing::info!("Retrieving tenant ID for {}...", domain);

        let url = format!(
            "{}/{}/.well-known/openid-configuration",
            ctx.session.authority,
            encode_segment(&domain)
        );
        let configuration = ctx
            .perform_json(RequestDescriptor::get(url).accept(ACCEPT_JSON).anonymous())
            .await?;

        match tenant_id_from_configuration(&configuration) {
            Some(tenant_id) => Ok(Output::Json(Value::String(tenant_id))),
            None => Ok(Output::Empty),
        }
    }
}
