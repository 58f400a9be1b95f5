//! SharePoint file commands

use super::executor::CommandContext;
use super::validation::Rule;
use super::{Command, CommandDescriptor};
use crate::error::{Result, ValidationError};
use crate::graph::Transport;
use crate::graph::request::{ACCEPT_NOMETADATA, RequestDescriptor, encode_segment, site_api};
use crate::output::Output;
use clap::Args;

pub static CHECKOUT: CommandDescriptor = CommandDescriptor {
    name: "spo file checkout",
    description: "Checks out the specified file",
    default_properties: None,
    autocomplete: &[],
    requires_connection: true,
};

#[derive(Args, Debug, Clone)]
pub struct CheckoutArgs {
    /// URL of the site where the file is located
    #[arg(short, long = "webUrl")]
    pub web_url: String,

    /// UniqueId (GUID) of the file. Specify id or fileUrl, not both
    #[arg(short, long)]
    pub id: Option<String>,

    /// Server-relative URL of the file. Specify id or fileUrl, not both
    #[arg(short, long = "fileUrl")]
    pub file_url: Option<String>,
}

/// How the file to check out is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutTarget<'a> {
    ById(&'a str),
    ByUrl(&'a str),
}

impl CheckoutTarget<'_> {
    fn function(self) -> String {
        match self {
            CheckoutTarget::ById(id) => format!("GetFileById('{}')", encode_segment(id)),
            CheckoutTarget::ByUrl(file_url) => {
                format!("GetFileByServerRelativeUrl('{}')", encode_segment(file_url))
            }
        }
    }
}

impl CheckoutArgs {
    /// The file addressed by exactly one of id and fileUrl
    pub fn target(&self) -> Option<CheckoutTarget<'_>> {
        match (&self.id, &self.file_url) {
            (Some(id), None) => Some(CheckoutTarget::ById(id)),
            (None, Some(file_url)) => Some(CheckoutTarget::ByUrl(file_url)),
            _ => None,
        }
    }

    pub fn checkout_url(&self) -> Option<String> {
        let target = self.target()?;
        Some(site_api(
            &self.web_url,
            &format!("_api/web/{}/checkout", target.function()),
        ))
    }
}

impl Command for CheckoutArgs {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &CHECKOUT
    }

    fn rules(&self) -> Vec<Rule<'_>> {
        vec![
            Rule::SharePointUrl {
                option: "webUrl",
                value: Some(&self.web_url),
            },
            Rule::Guid {
                option: "id",
                value: self.id.as_deref(),
            },
            Rule::ExactlyOne {
                first: "id",
                first_present: self.id.is_some(),
                second: "fileUrl",
                second_present: self.file_url.is_some(),
            },
        ]
    }

    async fn run<T: Transport>(&self, ctx: &CommandContext<'_, T>) -> Result<Output> {
        tracing::info!("Checking out file...");

        let url = self
            .checkout_url()
            .ok_or_else(|| ValidationError::AmbiguousOrMissingTarget {
                first: "id".to_string(),
                second: "fileUrl".to_string(),
                both: self.id.is_some(),
            })?;

        let request = RequestDescriptor::post(url).accept(ACCEPT_NOMETADATA);
        ctx.perform(request).await?;

        Ok(Output::Empty)
    }
}
