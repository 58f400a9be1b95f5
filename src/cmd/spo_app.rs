//! SharePoint app catalog commands

use super::confirm::RequiresConfirmation;
use super::executor::{CommandContext, ResolvesSiteContext};
use super::validation::{Rule, match_one_of};
use super::{Command, CommandDescriptor};
use crate::error::Result;
use crate::graph::Transport;
use crate::graph::request::{ACCEPT_NOMETADATA, RequestDescriptor, encode_segment, site_api};
use crate::output::Output;
use clap::Args;

const SCOPES: &[&str] = &["tenant", "sitecollection"];

pub static REMOVE: CommandDescriptor = CommandDescriptor {
    name: "spo app remove",
    description: "Removes the specified app from the specified app catalog",
    default_properties: None,
    autocomplete: &[("scope", SCOPES)],
    requires_connection: true,
};

#[derive(Args, Debug, Clone)]
pub struct RemoveArgs {
    /// ID of the app to remove
    #[arg(short, long)]
    pub id: String,

    /// URL of the app catalog site. Required when scope is sitecollection
    #[arg(short = 'u', long = "appCatalogUrl")]
    pub app_catalog_url: Option<String>,

    /// Catalog to remove the app from: tenant (default) or sitecollection
    #[arg(short, long)]
    pub scope: Option<String>,

    /// Don't prompt for confirmation
    #[arg(long)]
    pub confirm: bool,
}

impl RemoveArgs {
    fn scope(&self) -> &'static str {
        self.scope
            .as_deref()
            .and_then(|scope| match_one_of(scope, SCOPES))
            .unwrap_or("tenant")
    }
}

/// `{catalog}/_api/web/{scope}appcatalog/AvailableApps/GetById('{id}')/remove`
pub fn remove_url(app_catalog_url: &str, scope: &str, id: &str) -> String {
    site_api(
        app_catalog_url,
        &format!(
            "_api/web/{}appcatalog/AvailableApps/GetById('{}')/remove",
            scope,
            encode_segment(id)
        ),
    )
}

impl RequiresConfirmation for RemoveArgs {
    fn confirmed(&self) -> bool {
        self.confirm
    }

    fn confirmation_message(&self) -> String {
        format!(
            "Are you sure you want to remove the app {} from the app catalog?",
            self.id
        )
    }
}

impl Command for RemoveArgs {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &REMOVE
    }

    fn rules(&self) -> Vec<Rule<'_>> {
        vec![
            Rule::OneOf {
                option: "scope",
                value: self.scope.as_deref(),
                allowed: SCOPES,
            },
            Rule::RequiredWhen {
                option: "appCatalogUrl",
                present: self.app_catalog_url.is_some(),
                active: self.scope() == "sitecollection",
                condition: "the scope is sitecollection",
            },
            Rule::Guid {
                option: "id",
                value: Some(&self.id),
            },
            Rule::SharePointUrl {
                option: "appCatalogUrl",
                value: self.app_catalog_url.as_deref(),
            },
        ]
    }

    fn confirmation(&self) -> Option<&dyn RequiresConfirmation> {
        Some(self)
    }

    async fn run<T: Transport>(&self, ctx: &CommandContext<'_, T>) -> Result<Output> {
        let app_catalog_url = match &self.app_catalog_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => ctx.tenant_app_catalog_url().await?,
        };

        tracing::debug!(
            "Retrieved app catalog URL {}. Removing app from the app catalog...",
            app_catalog_url
        );

        let request = RequestDescriptor::post(remove_url(&app_catalog_url, self.scope(), &self.id))
            .accept(ACCEPT_NOMETADATA);
        ctx.perform(request).await?;

        Ok(Output::Empty)
    }
}
