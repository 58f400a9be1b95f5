//! Command line surface
//!
//! The clap tree mirrors the command names (`spo app remove`, `tenant report
//! activeusercounts`, ...). Each leaf carries the command's `Args` struct, which
//! the [`Executor`] runs.

use crate::cmd::executor::{Executor, Outcome};
use crate::cmd::login::LoginArgs;
use crate::cmd::tenant_report::{
    PeriodReportArgs, ReportFileArgs, ReportKind, TenantReport, UserDetailReportArgs,
};
use crate::cmd::{aad_oauth2grant, service_announcement, spo_app, spo_file, tenant};
use crate::error::{Result, ValidationError};
use crate::graph::Transport;
use crate::output::OutputMode;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "m365ctl",
    about = "Manage Microsoft 365, SharePoint Online and Entra ID from the command line",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options every command accepts
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Output type: json, text or csv
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputMode>,

    /// Log progress to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log requests and responses to stderr
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in to Microsoft 365
    Login(LoginArgs),

    /// Log out and clear cached tokens
    Logout,

    /// Show the active connection
    Status,

    /// List all available commands
    #[command(name = "commands")]
    ListCommands,

    /// Azure Active Directory
    #[command(subcommand)]
    Aad(AadCommands),

    /// SharePoint Online
    #[command(subcommand)]
    Spo(SpoCommands),

    /// Microsoft 365 tenant
    #[command(subcommand)]
    Tenant(TenantCommands),
}

#[derive(Subcommand, Debug)]
pub enum AadCommands {
    /// OAuth2 permission grants
    #[command(name = "oauth2grant", subcommand)]
    OAuth2Grant(OAuth2GrantCommands),
}

#[derive(Subcommand, Debug)]
pub enum OAuth2GrantCommands {
    /// Lists OAuth2 permission grants for the specified service principal
    List(aad_oauth2grant::ListArgs),
}

#[derive(Subcommand, Debug)]
pub enum SpoCommands {
    /// App catalog
    #[command(subcommand)]
    App(SpoAppCommands),

    /// Files in document libraries
    #[command(subcommand)]
    File(SpoFileCommands),
}

#[derive(Subcommand, Debug)]
pub enum SpoAppCommands {
    /// Removes the specified app from the specified app catalog
    Remove(spo_app::RemoveArgs),
}

#[derive(Subcommand, Debug)]
pub enum SpoFileCommands {
    /// Checks out the specified file
    Checkout(spo_file::CheckoutArgs),
}

#[derive(Subcommand, Debug)]
pub enum TenantCommands {
    /// Tenant identity
    #[command(subcommand)]
    Id(TenantIdCommands),

    /// Usage reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Service health and message center
    #[command(name = "serviceannouncement", subcommand)]
    ServiceAnnouncement(ServiceAnnouncementCommands),
}

#[derive(Subcommand, Debug)]
pub enum TenantIdCommands {
    /// Gets Microsoft 365 tenant ID for the specified domain
    Get(tenant::IdGetArgs),
}

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Gets the count of daily active users in the Microsoft 365 services
    #[command(name = "activeusercounts")]
    ActiveUserCounts(PeriodReportArgs),

    /// Gets details about Microsoft 365 active users
    #[command(name = "activeuserdetail")]
    ActiveUserDetail(UserDetailReportArgs),

    /// Gets the count of Microsoft 365 activations on desktops and devices
    #[command(name = "office365activationcounts")]
    ActivationCounts(ReportFileArgs),

    /// Gets details about users who have activated Microsoft 365
    #[command(name = "office365activationsuserdetail")]
    ActivationsUserDetail(ReportFileArgs),

    /// Gets the count of users that activated the Office subscription
    #[command(name = "office365activationsusercounts")]
    ActivationsUserCounts(ReportFileArgs),

    /// Gets the count of users by activity type and service
    #[command(name = "servicesusercounts")]
    ServicesUserCounts(PeriodReportArgs),
}

impl ReportCommands {
    pub fn into_report(self) -> TenantReport {
        match self {
            ReportCommands::ActiveUserCounts(args) => args.report(ReportKind::ActiveUserCounts),
            ReportCommands::ActiveUserDetail(args) => args.report(),
            ReportCommands::ActivationCounts(args) => args.report(ReportKind::ActivationCounts),
            ReportCommands::ActivationsUserDetail(args) => {
                args.report(ReportKind::ActivationsUserDetail)
            }
            ReportCommands::ActivationsUserCounts(args) => {
                args.report(ReportKind::ActivationsUserCounts)
            }
            ReportCommands::ServicesUserCounts(args) => args.report(ReportKind::ServicesUserCounts),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ServiceAnnouncementCommands {
    /// Service health overviews
    #[command(subcommand)]
    Health(HealthCommands),

    /// Service health issues
    #[command(name = "healthissue", subcommand)]
    HealthIssue(HealthIssueCommands),

    /// Message center posts
    #[command(subcommand)]
    Message(MessageCommands),
}

#[derive(Subcommand, Debug)]
pub enum HealthCommands {
    /// Gets the health report of all subscribed services for a tenant
    List(service_announcement::HealthListArgs),

    /// Gets the health report of a specified service for a tenant
    Get(service_announcement::HealthGetArgs),
}

#[derive(Subcommand, Debug)]
pub enum HealthIssueCommands {
    /// Gets all service health issues for the tenant
    List(service_announcement::HealthIssueListArgs),

    /// Gets a specified service health issue for tenant
    Get(service_announcement::HealthIssueGetArgs),
}

#[derive(Subcommand, Debug)]
pub enum MessageCommands {
    /// Gets all service update messages for the tenant
    List(service_announcement::MessageListArgs),

    /// Retrieves a specified service update message for the tenant
    Get(service_announcement::MessageGetArgs),
}

impl AadCommands {
    pub async fn execute<T: Transport>(&self, executor: &Executor<'_, T>) -> Result<Outcome> {
        match self {
            AadCommands::OAuth2Grant(OAuth2GrantCommands::List(args)) => executor.execute(args).await,
        }
    }
}

impl SpoCommands {
    pub async fn execute<T: Transport>(&self, executor: &Executor<'_, T>) -> Result<Outcome> {
        match self {
            SpoCommands::App(SpoAppCommands::Remove(args)) => executor.execute(args).await,
            SpoCommands::File(SpoFileCommands::Checkout(args)) => executor.execute(args).await,
        }
    }
}

impl TenantCommands {
    pub async fn execute<T: Transport>(self, executor: &Executor<'_, T>) -> Result<Outcome> {
        match self {
            TenantCommands::Id(TenantIdCommands::Get(args)) => executor.execute(&args).await,
            TenantCommands::Report(report) => executor.execute(&report.into_report()).await,
            TenantCommands::ServiceAnnouncement(announcement) => match announcement {
                ServiceAnnouncementCommands::Health(HealthCommands::List(args)) => {
                    executor.execute(&args).await
                }
                ServiceAnnouncementCommands::Health(HealthCommands::Get(args)) => {
                    executor.execute(&args).await
                }
                ServiceAnnouncementCommands::HealthIssue(HealthIssueCommands::List(args)) => {
                    executor.execute(&args).await
                }
                ServiceAnnouncementCommands::HealthIssue(HealthIssueCommands::Get(args)) => {
                    executor.execute(&args).await
                }
                ServiceAnnouncementCommands::Message(MessageCommands::List(args)) => {
                    executor.execute(&args).await
                }
                ServiceAnnouncementCommands::Message(MessageCommands::Get(args)) => {
                    executor.execute(&args).await
                }
            },
        }
    }
}

/// Map clap's option errors onto the CLI's own validation errors
pub fn option_error(error: &clap::Error) -> Option<ValidationError> {
    let invalid_arg = || match error.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => Some(arg.clone()),
        Some(ContextValue::Strings(args)) => Some(args.join(", ")),
        _ => None,
    };

    match error.kind() {
        ErrorKind::UnknownArgument => invalid_arg().map(ValidationError::UnknownOption),
        ErrorKind::MissingRequiredArgument => {
            invalid_arg().map(ValidationError::MissingRequiredOption)
        }
        _ => None,
    }
}
