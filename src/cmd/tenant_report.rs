//! Microsoft 365 usage reports
//!
//! Graph serves these as CSV. In JSON output mode the CSV is converted to an
//! array of objects keyed by the header row; otherwise it is printed as-is or
//! written to `--outputFile`.

use super::executor::CommandContext;
use super::validation::Rule;
use super::{Command, CommandDescriptor};
use crate::error::Result;
use crate::graph::Transport;
use crate::graph::request::{ACCEPT_GRAPH_NO_METADATA, RequestDescriptor, graph_v1};
use crate::output::{Output, OutputMode};
use clap::Args;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

const PERIODS: &[&str] = &["D7", "D30", "D90", "D180"];

const fn report(
    name: &'static str,
    description: &'static str,
    autocomplete: &'static [(&'static str, &'static [&'static str])],
) -> CommandDescriptor {
    CommandDescriptor {
        name,
        description,
        default_properties: None,
        autocomplete,
        requires_connection: true,
    }
}

static ACTIVE_USER_COUNTS: CommandDescriptor = report(
    "tenant report activeusercounts",
    "Gets the count of daily active users in the Microsoft 365 services",
    &[("period", PERIODS)],
);
static ACTIVE_USER_DETAIL: CommandDescriptor = report(
    "tenant report activeuserdetail",
    "Gets details about Microsoft 365 active users",
    &[("period", PERIODS)],
);
static ACTIVATION_COUNTS: CommandDescriptor = report(
    "tenant report office365activationcounts",
    "Gets the count of Microsoft 365 activations on desktops and devices",
    &[],
);
static ACTIVATIONS_USER_DETAIL: CommandDescriptor = report(
    "tenant report office365activationsuserdetail",
    "Gets details about users who have activated Microsoft 365",
    &[],
);
static ACTIVATIONS_USER_COUNTS: CommandDescriptor = report(
    "tenant report office365activationsusercounts",
    "Gets the count of users that are enabled and those that have activated the Office subscription",
    &[],
);
static SERVICES_USER_COUNTS: CommandDescriptor = report(
    "tenant report servicesusercounts",
    "Gets the count of users by activity type and service",
    &[("period", PERIODS)],
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    ActiveUserCounts,
    ActiveUserDetail,
    ActivationCounts,
    ActivationsUserDetail,
    ActivationsUserCounts,
    ServicesUserCounts,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::ActiveUserCounts,
        ReportKind::ActiveUserDetail,
        ReportKind::ActivationCounts,
        ReportKind::ActivationsUserDetail,
        ReportKind::ActivationsUserCounts,
        ReportKind::ServicesUserCounts,
    ];

    pub fn descriptor(self) -> &'static CommandDescriptor {
        match self {
            ReportKind::ActiveUserCounts => &ACTIVE_USER_COUNTS,
            ReportKind::ActiveUserDetail => &ACTIVE_USER_DETAIL,
            ReportKind::ActivationCounts => &ACTIVATION_COUNTS,
            ReportKind::ActivationsUserDetail => &ACTIVATIONS_USER_DETAIL,
            ReportKind::ActivationsUserCounts => &ACTIVATIONS_USER_COUNTS,
            ReportKind::ServicesUserCounts => &SERVICES_USER_COUNTS,
        }
    }

    /// Graph report function name
    pub fn endpoint(self) -> &'static str {
        match self {
            ReportKind::ActiveUserCounts => "getOffice365ActiveUserCounts",
            ReportKind::ActiveUserDetail => "getOffice365ActiveUserDetail",
            ReportKind::ActivationCounts => "getOffice365ActivationCounts",
            ReportKind::ActivationsUserDetail => "getOffice365ActivationsUserDetail",
            ReportKind::ActivationsUserCounts => "getOffice365ActivationsUserCounts",
            ReportKind::ServicesUserCounts => "getOffice365ServicesUserCounts",
        }
    }

    pub fn takes_period(self) -> bool {
        matches!(
            self,
            ReportKind::ActiveUserCounts | ReportKind::ActiveUserDetail | ReportKind::ServicesUserCounts
        )
    }
}

/// Reports over a trailing period
#[derive(Args, Debug, Clone)]
pub struct PeriodReportArgs {
    /// The length of time over which the report is aggregated: D7, D30, D90 or D180
    #[arg(short, long)]
    pub period: String,

    /// Path to the file where the report should be stored
    #[arg(short = 'f', long = "outputFile")]
    pub output_file: Option<PathBuf>,
}

/// Per-user detail, over a period or for a single day
#[derive(Args, Debug, Clone)]
pub struct UserDetailReportArgs {
    /// The length of time over which the report is aggregated: D7, D30, D90 or D180
    #[arg(short, long)]
    pub period: Option<String>,

    /// The date for which to retrieve the report, in YYYY-MM-DD format
    #[arg(short, long)]
    pub date: Option<String>,

    /// Path to the file where the report should be stored
    #[arg(short = 'f', long = "outputFile")]
    pub output_file: Option<PathBuf>,
}

/// Reports without a time filter
#[derive(Args, Debug, Clone)]
pub struct ReportFileArgs {
    /// Path to the file where the report should be stored
    #[arg(short = 'f', long = "outputFile")]
    pub output_file: Option<PathBuf>,
}

impl PeriodReportArgs {
    pub fn report(self, kind: ReportKind) -> TenantReport {
        TenantReport {
            kind,
            period: Some(self.period),
            date: None,
            output_file: self.output_file,
        }
    }
}

impl UserDetailReportArgs {
    pub fn report(self) -> TenantReport {
        TenantReport {
            kind: ReportKind::ActiveUserDetail,
            period: self.period,
            date: self.date,
            output_file: self.output_file,
        }
    }
}

impl ReportFileArgs {
    pub fn report(self, kind: ReportKind) -> TenantReport {
        TenantReport {
            kind,
            period: None,
            date: None,
            output_file: self.output_file,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TenantReport {
    pub kind: ReportKind,
    pub period: Option<String>,
    pub date: Option<String>,
    pub output_file: Option<PathBuf>,
}

impl TenantReport {
    pub fn report_url(&self, graph_resource: &str) -> String {
        let filter = match (&self.period, &self.date) {
            (Some(period), _) => format!("(period='{}')", canonical_period(period)),
            (None, Some(date)) => format!("(date={})", date),
            (None, None) => String::new(),
        };

        graph_v1(
            graph_resource,
            &format!("reports/{}{}", self.kind.endpoint(), filter),
        )
    }
}

fn canonical_period(period: &str) -> &str {
    super::validation::match_one_of(period, PERIODS).unwrap_or(period)
}

/// Convert a CSV report to an array of objects keyed by the header row
pub fn csv_to_json(csv_text: &str) -> Result<Value> {
    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.to_string(), Value::String(value.to_string())))
            .collect();
        rows.push(Value::Object(row));
    }

    Ok(Value::Array(rows))
}

impl Command for TenantReport {
    fn descriptor(&self) -> &'static CommandDescriptor {
        self.kind.descriptor()
    }

    fn rules(&self) -> Vec<Rule<'_>> {
        let mut rules = Vec::new();

        if self.kind == ReportKind::ActiveUserDetail {
            rules.push(Rule::ExactlyOne {
                first: "period",
                first_present: self.period.is_some(),
                second: "date",
                second_present: self.date.is_some(),
            });
        }

        rules.push(Rule::OneOf {
            option: "period",
            value: self.period.as_deref(),
            allowed: PERIODS,
        });
        rules.push(Rule::Date {
            option: "date",
            value: self.date.as_deref(),
        });

        rules
    }

    async fn run<T: Transport>(&self, ctx: &CommandContext<'_, T>) -> Result<Output> {
        tracing::info!("Retrieving {} report...", self.kind.endpoint());

        let request = RequestDescriptor::get(self.report_url(&ctx.session.graph_resource))
            .accept(ACCEPT_GRAPH_NO_METADATA);
        let body = ctx.perform(request).await?;
        let report = body.trim_start_matches('\u{feff}');

        if let Some(path) = &self.output_file {
            fs::write(path, report)?;
            tracing::info!("File saved to path '{}'", path.display());
            return Ok(Output::Empty);
        }

        match ctx.mode {
            OutputMode::Json => Ok(Output::Json(csv_to_json(report)?)),
            OutputMode::Text | OutputMode::Csv => Ok(Output::Text(report.trim_end().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::confirm::tests::ScriptedPrompter;
    use crate::cmd::executor::{Executor, Outcome};
    use crate::config::Session;
    use crate::error::ValidationError;
    use crate::graph::testing::RecordingTransport;
    use serde_json::json;

    const GRAPH: &str = "https://graph.microsoft.com";
    const REPORT: &str = "\u{feff}Report Refresh Date,Office 365,Exchange,Report Period\n2024-03-03,83,81,7\n2024-03-02,79,77,7\n";

    fn period(kind: ReportKind, period: &str) -> TenantReport {
        PeriodReportArgs {
            period: period.to_string(),
            output_file: None,
        }
        .report(kind)
    }

    fn detail(period: Option<&str>, date: Option<&str>) -> TenantReport {
        UserDetailReportArgs {
            period: period.map(String::from),
            date: date.map(String::from),
            output_file: None,
        }
        .report()
    }

    async fn execute(report: &TenantReport, mode: OutputMode) -> (Outcome, RecordingTransport) {
        let session = Session::connected(GRAPH);
        let transport = RecordingTransport::new().respond(REPORT);
        let prompter = ScriptedPrompter::replying(false);
        let outcome = Executor::new(&session, &transport, &prompter, mode)
            .execute(report)
            .await
            .unwrap();
        (outcome, transport)
    }

    #[test]
    fn test_report_urls() {
        assert_eq!(
            period(ReportKind::ActiveUserCounts, "D7").report_url(GRAPH),
            "https://graph.microsoft.com/v1.0/reports/getOffice365ActiveUserCounts(period='D7')"
        );
        assert_eq!(
            period(ReportKind::ServicesUserCounts, "d90").report_url(GRAPH),
            "https://graph.microsoft.com/v1.0/reports/getOffice365ServicesUserCounts(period='D90')"
        );
        assert_eq!(
            detail(None, Some("2024-03-01")).report_url(GRAPH),
            "https://graph.microsoft.com/v1.0/reports/getOffice365ActiveUserDetail(date=2024-03-01)"
        );
        assert_eq!(
            ReportFileArgs { output_file: None }
                .report(ReportKind::ActivationCounts)
                .report_url(GRAPH),
            "https://graph.microsoft.com/v1.0/reports/getOffice365ActivationCounts"
        );
    }

    #[test]
    fn test_period_validation() {
        assert!(period(ReportKind::ActiveUserCounts, "D30").validate().is_ok());
        assert!(matches!(
            period(ReportKind::ActiveUserCounts, "D1").validate(),
            Err(ValidationError::InvalidEnumValue { .. })
        ));
    }

    #[test]
    fn test_user_detail_takes_period_or_date() {
        assert!(detail(Some("D7"), None).validate().is_ok());
        assert!(detail(None, Some("2024-03-01")).validate().is_ok());
        assert!(matches!(
            detail(Some("D7"), Some("2024-03-01")).validate(),
            Err(ValidationError::AmbiguousOrMissingTarget { both: true, .. })
        ));
        assert!(matches!(
            detail(None, None).validate(),
            Err(ValidationError::AmbiguousOrMissingTarget { both: false, .. })
        ));
        assert!(matches!(
            detail(None, Some("03/01/2024")).validate(),
            Err(ValidationError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_csv_to_json() {
        let value = csv_to_json("Report Refresh Date,Exchange\n2024-03-03,81\n").unwrap();
        assert_eq!(
            value,
            json!([{"Report Refresh Date": "2024-03-03", "Exchange": "81"}])
        );
        assert_eq!(csv_to_json("Report Refresh Date,Exchange\n").unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_text_output_is_raw_csv_without_bom() {
        let (outcome, transport) = execute(&period(ReportKind::ActiveUserCounts, "D7"), OutputMode::Text).await;

        let Outcome::Completed(Output::Text(text)) = outcome else {
            panic!("expected text output");
        };
        assert!(text.starts_with("Report Refresh Date,"));
        assert_eq!(text.lines().count(), 3);
        assert_eq!(
            transport.requests()[0].header_value("accept"),
            Some(ACCEPT_GRAPH_NO_METADATA)
        );
    }

    #[tokio::test]
    async fn test_json_output_converts_csv() {
        let (outcome, _) = execute(&period(ReportKind::ActiveUserCounts, "D7"), OutputMode::Json).await;

        let Outcome::Completed(Output::Json(Value::Array(rows))) = outcome else {
            panic!("expected JSON rows");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Report Refresh Date"], "2024-03-03");
        assert_eq!(rows[1]["Office 365"], "79");
    }

    #[tokio::test]
    async fn test_output_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        let report = TenantReport {
            output_file: Some(path.clone()),
            ..period(ReportKind::ActiveUserCounts, "D7")
        };

        let (outcome, _) = execute(&report, OutputMode::Json).await;

        assert_eq!(outcome, Outcome::Completed(Output::Empty));
        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.starts_with("Report Refresh Date,"));
    }
}
