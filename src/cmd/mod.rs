//! Command framework and the individual commands
//!
//! Every command is a clap `Args` struct implementing [`Command`]. The
//! [`executor::Executor`] validates it, checks the session, runs the optional
//! confirmation gate and then lets the command issue its requests through a
//! [`executor::CommandContext`].

pub mod aad_oauth2grant;
pub mod confirm;
pub mod executor;
pub mod login;
pub mod service_announcement;
pub mod spo_app;
pub mod spo_file;
pub mod tenant;
pub mod tenant_report;
pub mod validation;

use crate::cli::GlobalArgs;
use crate::error::{Result, ValidationError};
use crate::graph::Transport;
use crate::output::Output;
use confirm::RequiresConfirmation;
use executor::CommandContext;
use serde_json::Value;
use std::collections::BTreeMap;
use validation::Rule;

/// Static identity of a command
#[derive(Debug)]
pub struct CommandDescriptor {
    /// Space separated command path, e.g. `spo app remove`
    pub name: &'static str,
    pub description: &'static str,
    /// Properties kept for text and csv output
    pub default_properties: Option<&'static [&'static str]>,
    /// Advisory completion values per long option name
    pub autocomplete: &'static [(&'static str, &'static [&'static str])],
    pub requires_connection: bool,
}

#[allow(async_fn_in_trait)]
pub trait Command {
    fn descriptor(&self) -> &'static CommandDescriptor;

    fn rules(&self) -> Vec<Rule<'_>> {
        Vec::new()
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        validation::check(&self.rules())
    }

    fn requires_connection(&self) -> bool {
        self.descriptor().requires_connection
    }

    /// Destructive commands return their confirmation gate
    fn confirmation(&self) -> Option<&dyn RequiresConfirmation> {
        None
    }

    async fn run<T: Transport>(&self, ctx: &CommandContext<'_, T>) -> Result<Output>;
}

/// One entry of a command's option schema
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    pub long: String,
    pub short: Option<char>,
    pub required: bool,
    pub takes_value: bool,
    pub autocomplete: Vec<&'static str>,
}

impl OptionSpec {
    /// `-i, --id <id>`, `-u, --appCatalogUrl [appCatalogUrl]` or `--confirm`
    pub fn usage(&self) -> String {
        let mut usage = match self.short {
            Some(short) => format!("-{}, --{}", short, self.long),
            None => format!("--{}", self.long),
        };
        if self.takes_value {
            if self.required {
                usage.push_str(&format!(" <{}>", self.long));
            } else {
                usage.push_str(&format!(" [{}]", self.long));
            }
        }
        usage
    }
}

#[derive(Debug)]
pub struct RegisteredCommand {
    pub descriptor: &'static CommandDescriptor,
    pub options: Vec<OptionSpec>,
}

/// Every command known to the CLI, keyed by name
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, RegisteredCommand>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command; its option schema is read from the clap definition
    /// of `A` merged with the global options
    pub fn register<A: clap::Args>(&mut self, descriptor: &'static CommandDescriptor) {
        let mut command = <GlobalArgs as clap::Args>::augment_args(A::augment_args(clap::Command::new(
            descriptor.name,
        )));
        command.build();

        let options = command
            .get_arguments()
            .filter(|arg| !arg.is_positional())
            .filter(|arg| !matches!(arg.get_id().as_str(), "help" | "version"))
            .filter_map(|arg| {
                let long = arg.get_long()?.to_string();
                let autocomplete = descriptor
                    .autocomplete
                    .iter()
                    .find(|(option, _)| *option == long)
                    .map(|(_, values)| values.to_vec())
                    .unwrap_or_default();

                Some(OptionSpec {
                    short: arg.get_short(),
                    required: arg.is_required_set(),
                    takes_value: arg.get_action().takes_values(),
                    autocomplete,
                    long,
                })
            })
            .collect();

        self.commands
            .insert(descriptor.name, RegisteredCommand { descriptor, options });
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredCommand> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredCommand> {
        self.commands.values()
    }
}

/// The registry of every command the binary exposes
pub fn registry() -> CommandRegistry {
    use tenant_report::ReportKind;

    let mut registry = CommandRegistry::new();

    registry.register::<aad_oauth2grant::ListArgs>(&aad_oauth2grant::LIST);
    registry.register::<spo_app::RemoveArgs>(&spo_app::REMOVE);
    registry.register::<spo_file::CheckoutArgs>(&spo_file::CHECKOUT);
    registry.register::<tenant::IdGetArgs>(&tenant::ID_GET);

    for kind in ReportKind::ALL {
        match kind {
            ReportKind::ActiveUserDetail => {
                registry.register::<tenant_report::UserDetailReportArgs>(kind.descriptor())
            }
            kind if kind.takes_period() => {
                registry.register::<tenant_report::PeriodReportArgs>(kind.descriptor())
            }
            kind => registry.register::<tenant_report::ReportFileArgs>(kind.descriptor()),
        }
    }

    registry.register::<service_announcement::HealthListArgs>(&service_announcement::HEALTH_LIST);
    registry.register::<service_announcement::HealthGetArgs>(&service_announcement::HEALTH_GET);
    registry.register::<service_announcement::HealthIssueListArgs>(&service_announcement::HEALTHISSUE_LIST);
    registry.register::<service_announcement::HealthIssueGetArgs>(&service_announcement::HEALTHISSUE_GET);
    registry.register::<service_announcement::MessageListArgs>(&service_announcement::MESSAGE_LIST);
    registry.register::<service_announcement::MessageGetArgs>(&service_announcement::MESSAGE_GET);

    registry
}

/// The `commands` listing: name, description and option usage of every command
pub fn commands_output(registry: &CommandRegistry) -> Output {
    let commands = registry
        .iter()
        .map(|command| {
            let options: Vec<String> = command.options.iter().map(OptionSpec::usage).collect();
            serde_json::json!({
                "name": command.descriptor.name,
                "description": command.descriptor.description,
                "options": options.join(" "),
            })
        })
        .collect();

    Output::Json(Value::Array(commands))
}

/// Output for an OData collection response: its `value` array, or nothing when empty
///
/// A continuation link is reported on stderr rather than followed.
pub(crate) fn collection_output(mut response: Value) -> Output {
    if let Some(next_link) = response.get("@odata.nextLink").and_then(Value::as_str) {
        tracing::info!("More results are available at {}", next_link);
    }

    match response.get_mut("value").map(Value::take) {
        Some(Value::Array(items)) if items.is_empty() => Output::Empty,
        Some(value) => Output::Json(value),
        None => Output::Empty,
    }
}
