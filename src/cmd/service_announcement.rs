//! Service health and message center
//!
//! All six commands read from `{graph}/v1.0/admin/serviceAnnouncement`.

use super::executor::CommandContext;
use super::{Command, CommandDescriptor, collection_output};
use crate::error::Result;
use crate::graph::Transport;
use crate::graph::request::{
    ACCEPT_GRAPH_NO_METADATA, RequestDescriptor, encode_segment, graph_v1, odata_filter,
};
use crate::output::Output;
use clap::Args;

const HEALTH_PROPERTIES: &[&str] = &["id", "status", "service"];
const ANNOUNCEMENT_PROPERTIES: &[&str] = &["id", "title"];

const fn announcement(
    name: &'static str,
    description: &'static str,
    default_properties: &'static [&'static str],
) -> CommandDescriptor {
    CommandDescriptor {
        name,
        description,
        default_properties: Some(default_properties),
        autocomplete: &[],
        requires_connection: true,
    }
}

pub static HEALTH_LIST: CommandDescriptor = announcement(
    "tenant serviceannouncement health list",
    "Gets the health report of all subscribed services for a tenant",
    HEALTH_PROPERTIES,
);
pub static HEALTH_GET: CommandDescriptor = announcement(
    "tenant serviceannouncement health get",
    "Gets the health report of a specified service for a tenant",
    HEALTH_PROPERTIES,
);
pub static HEALTHISSUE_LIST: CommandDescriptor = announcement(
    "tenant serviceannouncement healthissue list",
    "Gets all service health issues for the tenant",
    ANNOUNCEMENT_PROPERTIES,
);
pub static HEALTHISSUE_GET: CommandDescriptor = announcement(
    "tenant serviceannouncement healthissue get",
    "Gets a specified service health issue for tenant",
    ANNOUNCEMENT_PROPERTIES,
);
pub static MESSAGE_LIST: CommandDescriptor = announcement(
    "tenant serviceannouncement message list",
    "Gets all service update messages for the tenant",
    ANNOUNCEMENT_PROPERTIES,
);
pub static MESSAGE_GET: CommandDescriptor = announcement(
    "tenant serviceannouncement message get",
    "Retrieves a specified service update message for the tenant",
    ANNOUNCEMENT_PROPERTIES,
);

fn announcement_url(graph_resource: &str, path: &str) -> String {
    graph_v1(graph_resource, &format!("admin/serviceAnnouncement/{}", path))
}

fn with_query(path: String, query: Option<String>) -> String {
    match query {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    }
}

fn expand_issues(issues: bool) -> Option<String> {
    issues.then(|| "$expand=issues".to_string())
}

async fn get<T: Transport>(ctx: &CommandContext<'_, T>, url: String) -> Result<serde_json::Value> {
    ctx.perform_json(RequestDescriptor::get(url).accept(ACCEPT_GRAPH_NO_METADATA))
        .await
}

#[derive(Args, Debug, Clone)]
pub struct HealthListArgs {
    /// Include the collection of issues for each service
    #[arg(long)]
    pub issues: bool,
}

impl HealthListArgs {
    pub fn url(&self, graph_resource: &str) -> String {
        announcement_url(
            graph_resource,
            &with_query("healthOverviews".to_string(), expand_issues(self.issues)),
        )
    }
}

impl Command for HealthListArgs {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &HEALTH_LIST
    }

    async fn run<T: Transport>(&self, ctx: &CommandContext<'_, T>) -> Result<Output> {
        let response = get(ctx, self.url(&ctx.session.graph_resource)).await?;
        Ok(collection_output(response))
    }
}

#[derive(Args, Debug, Clone)]
pub struct HealthGetArgs {
    /// The service name to retrieve the health report for
    #[arg(short, long = "serviceName")]
    pub service_name: String,

    /// Include the collection of issues for the service
    #[arg(long)]
    pub issues: bool,
}

impl HealthGetArgs {
    pub fn url(&self, graph_resource: &str) -> String {
        announcement_url(
            graph_resource,
            &with_query(
                format!("healthOverviews/{}", encode_segment(&self.service_name)),
                expand_issues(self.issues),
            ),
        )
    }
}

impl Command for HealthGetArgs {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &HEALTH_GET
    }

    async fn run<T: Transport>(&self, ctx: &CommandContext<'_, T>) -> Result<Output> {
        let response = get(ctx, self.url(&ctx.session.graph_resource)).await?;
        Ok(Output::Json(response))
    }
}

#[derive(Args, Debug, Clone)]
pub struct HealthIssueListArgs {
    /// Only return issues for this service
    #[arg(short, long)]
    pub service: Option<String>,
}

impl HealthIssueListArgs {
    pub fn url(&self, graph_resource: &str) -> String {
        announcement_url(
            graph_resource,
            &with_query(
                "issues".to_string(),
                self.service.as_deref().map(|s| odata_filter("service", s)),
            ),
        )
    }
}

impl Command for HealthIssueListArgs {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &HEALTHISSUE_LIST
    }

    async fn run<T: Transport>(&self, ctx: &CommandContext<'_, T>) -> Result<Output> {
        let response = get(ctx, self.url(&ctx.session.graph_resource)).await?;
        Ok(collection_output(response))
    }
}

#[derive(Args, Debug, Clone)]
pub struct HealthIssueGetArgs {
    /// The issue id, e.g. EX123456
    #[arg(short, long)]
    pub id: String,
}

impl Command for HealthIssueGetArgs {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &HEALTHISSUE_GET
    }

    async fn run<T: Transport>(&self, ctx: &CommandContext<'_, T>) -> Result<Output> {
        let url = announcement_url(
            &ctx.session.graph_resource,
            &format!("issues/{}", encode_segment(&self.id)),
        );
        Ok(Output::Json(get(ctx, url).await?))
    }
}

#[derive(Args, Debug, Clone)]
pub struct MessageListArgs {
    /// Only return messages that concern this service
    #[arg(short, long)]
    pub service: Option<String>,
}

impl MessageListArgs {
    pub fn url(&self, graph_resource: &str) -> String {
        announcement_url(
            graph_resource,
            &with_query(
                "messages".to_string(),
                self.service
                    .as_deref()
                    .map(|s| format!("$filter=services/any(c:c eq '{}')", encode_segment(s))),
            ),
        )
    }
}

impl Command for MessageListArgs {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &MESSAGE_LIST
    }

    async fn run<T: Transport>(&self, ctx: &CommandContext<'_, T>) -> Result<Output> {
        let response = get(ctx, self.url(&ctx.session.graph_resource)).await?;
        Ok(collection_output(response))
    }
}

#[derive(Args, Debug, Clone)]
pub struct MessageGetArgs {
    /// The message id, e.g. MC123456
    #[arg(short, long)]
    pub id: String,
}

impl Command for MessageGetArgs {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &MESSAGE_GET
    }

    async fn run<T: Transport>(&self, ctx: &CommandContext<'_, T>) -> Result<Output> {
        let url = announcement_url(
            &ctx.session.graph_resource,
            &format!("messages/{}", encode_segment(&self.id)),
        );
        Ok(Output::Json(get(ctx, url).await?))
    }
}
