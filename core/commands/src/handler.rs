//! The [`CommandHandler`] trait every catalog entry implements (§4.4
//! "Catalog").

use async_trait::async_trait;
use helm_protocol::Command;
use helm_protocol::CommandResult;

use crate::context::ExecutionContext;

/// One registered command handler.
///
/// `name` must match the [`Command::action_name`] this handler dispatches
/// for; [`CommandCatalog::register`](crate::catalog::CommandCatalog::register)
/// keys entries by this string.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// A JSON schema for this command's parameters, used by
    /// [`crate::catalog::CommandCatalog::validate`].
    fn parameter_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }

    /// Whether a successful result from this handler always ends the
    /// current sequence, regardless of `CommandResult::is_done` (§4.4
    /// "Sequence execution").
    fn terminates_sequence(&self) -> bool {
        false
    }

    async fn handle(&self, command: &Command, ctx: &ExecutionContext) -> CommandResult;
}
