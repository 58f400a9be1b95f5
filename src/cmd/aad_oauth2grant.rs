//! Azure AD OAuth2 permission grants

use super::executor::CommandContext;
use super::validation::Rule;
use super::{Command, CommandDescriptor, collection_output};
use crate::error::Result;
use crate::graph::Transport;
use crate::graph::request::{ACCEPT_GRAPH_NO_METADATA, RequestDescriptor, graph_v1, odata_filter};
use crate::output::Output;
use clap::Args;

pub static LIST: CommandDescriptor = CommandDescriptor {
    name: "aad oauth2grant list",
    description: "Lists OAuth2 permission grants for the specified service principal",
    default_properties: Some(&["objectId", "resourceId", "scope"]),
    autocomplete: &[],
    requires_connection: true,
};

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// objectId of the service principal for which the grants should be listed
    #[arg(short = 'i', long = "spObjectId")]
    pub sp_object_id: String,
}

impl ListArgs {
    pub fn list_url(&self, graph_resource: &str) -> String {
        graph_v1(
            graph_resource,
            &format!("oauth2PermissionGrants?{}", odata_filter("clientId", &self.sp_object_id)),
        )
    }
}

impl Command for ListArgs {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &LIST
    }

    fn rules(&self) -> Vec<Rule<'_>> {
        vec![Rule::Guid {
            option: "spObjectId",
            value: Some(&self.sp_object_id),
        }]
    }

    async fn run<T: Transport>(&self, ctx: &CommandContext<'_, T>) -> Result<Output> {
        tracing::info!("Retrieving list of OAuth grants for the service principal...");

        let request = RequestDescriptor::get(self.list_url(&ctx.session.graph_resource))
            .accept(ACCEPT_GRAPH_NO_METADATA);
        let response = ctx.perform_json(request).await?;

        Ok(collection_output(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::confirm::tests::ScriptedPrompter;
    use crate::cmd::executor::{Executor, Outcome};
    use crate::config::Session;
    use crate::error::{M365Error, ValidationError};
    use crate::graph::testing::RecordingTransport;
    use crate::output::OutputMode;
    use serde_json::json;

    const SP_ID: &str = "d6a7d2f4-5cf4-4d2e-9c5b-2f83a1bc4b9a";

    fn args() -> ListArgs {
        ListArgs {
            sp_object_id: SP_ID.to_string(),
        }
    }

    fn grants() -> String {
        json!({
            "value": [
                {
                    "clientId": SP_ID,
                    "consentType": "AllPrincipals",
                    "objectId": "50NAzUm3C0K9B6p8ORLtIhpPRByju_dHtPi9ZHhYCTs",
                    "principalId": null,
                    "resourceId": "cda04e3b-8f2c-4cb1-8e6b-5d5b0f2d1c04",
                    "scope": "user_impersonation"
                }
            ]
        })
        .to_string()
    }

    #[test]
    fn test_list_url() {
        assert_eq!(
            args().list_url("https://graph.microsoft.com"),
            "https://graph.microsoft.com/v1.0/oauth2PermissionGrants?$filter=clientId eq 'd6a7d2f4-5cf4-4d2e-9c5b-2f83a1bc4b9a'"
        );
    }

    #[test]
    fn test_rejects_invalid_object_id() {
        let args = ListArgs {
            sp_object_id: "123".into(),
        };
        assert!(matches!(args.validate(), Err(ValidationError::InvalidGuid { .. })));
    }

    #[tokio::test]
    async fn test_text_output_keeps_default_properties() {
        let session = Session::connected("https://graph.microsoft.com");
        let transport = RecordingTransport::new().respond(grants());
        let prompter = ScriptedPrompter::replying(false);
        let executor = Executor::new(&session, &transport, &prompter, OutputMode::Text);

        let outcome = executor.execute(&args()).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Completed(Output::Json(json!([{
                "objectId": "50NAzUm3C0K9B6p8ORLtIhpPRByju_dHtPi9ZHhYCTs",
                "resourceId": "cda04e3b-8f2c-4cb1-8e6b-5d5b0f2d1c04",
                "scope": "user_impersonation"
            }])))
        );
        let request = &transport.requests()[0];
        assert_eq!(request.header_value("accept"), Some(ACCEPT_GRAPH_NO_METADATA));
    }

    #[tokio::test]
    async fn test_json_output_is_unprojected() {
        let session = Session::connected("https://graph.microsoft.com");
        let transport = RecordingTransport::new().respond(grants());
        let prompter = ScriptedPrompter::replying(false);
        let executor = Executor::new(&session, &transport, &prompter, OutputMode::Json);

        let Outcome::Completed(Output::Json(value)) = executor.execute(&args()).await.unwrap() else {
            panic!("expected JSON output");
        };
        assert_eq!(value[0]["consentType"], "AllPrincipals");
        assert_eq!(value[0]["clientId"], SP_ID);
    }

    #[tokio::test]
    async fn test_no_grants_prints_nothing() {
        let session = Session::connected("https://graph.microsoft.com");
        let transport = RecordingTransport::new().respond(r#"{"value":[]}"#);
        let prompter = ScriptedPrompter::replying(false);
        let executor = Executor::new(&session, &transport, &prompter, OutputMode::Text);

        let outcome = executor.execute(&args()).await.unwrap();

        assert_eq!(outcome, Outcome::Completed(Output::Empty));
    }

    #[tokio::test]
    async fn test_graph_error_message() {
        let session = Session::connected("https://graph.microsoft.com");
        let transport = RecordingTransport::new().reject(
            400,
            r#"{"error":{"code":"Request_BadRequest","message":"Invalid filter clause"}}"#,
        );
        let prompter = ScriptedPrompter::replying(false);
        let executor = Executor::new(&session, &transport, &prompter, OutputMode::Text);

        let err = executor.execute(&args()).await.unwrap_err();

        assert!(matches!(err, M365Error::Operation(ref m) if m == "Invalid filter clause"));
    }
}
