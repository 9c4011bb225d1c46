//! The command catalog registry (§4.4 "Catalog", "Dispatch").

use std::collections::HashMap;
use std::sync::Arc;

use helm_protocol::Command;
use helm_protocol::CommandResult;
use tracing::warn;

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::error::command_error;
use crate::handler::CommandHandler;

/// A named registry of [`CommandHandler`]s keyed by action name.
///
/// Registration is idempotent by name: registering a second handler under a
/// name that is already taken replaces the first and logs a warning, rather
/// than erroring (§4.4: "later wins, with a warning").
#[derive(Default)]
pub struct CommandCatalog {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: impl CommandHandler + 'static) {
        let name = handler.name().to_string();
        if self.handlers.contains_key(&name) {
            warn!(command = %name, "overwriting an already-registered command handler");
        }
        self.handlers.insert(name, Arc::new(handler));
    }

    pub fn get(&self, action: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(action).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Validate `params` against the entry's parameter schema's `required`
    /// list, mirroring the teacher's default-tool-validation shape.
    pub fn validate(&self, action: &str, params: &serde_json::Value) -> Result<()> {
        let handler = self
            .get(action)
            .ok_or_else(|| command_error::UnknownCommandSnafu { action: action.to_string() }.build())?;

        let schema = handler.parameter_schema();
        if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
            for field in required {
                let Some(field_name) = field.as_str() else {
                    continue;
                };
                if params.get(field_name).is_none() {
                    return Err(command_error::SchemaViolationSnafu {
                        action: action.to_string(),
                        message: format!("missing required field: {field_name}"),
                    }
                    .build());
                }
            }
        }
        Ok(())
    }

    /// Look up the handler, validate, and invoke it (§4.4 "Dispatch").
    pub async fn dispatch(&self, command: &Command, ctx: &ExecutionContext) -> Result<CommandResult> {
        let action = command.action_name();
        let handler = self
            .get(action)
            .ok_or_else(|| command_error::UnknownCommandSnafu { action: action.to_string() }.build())?;

        let params = serde_json::to_value(command).unwrap_or_else(|_| serde_json::json!({}));
        self.validate(action, &params)?;

        Ok(handler.handle(command, ctx).await)
    }

    pub fn terminates_sequence(&self, action: &str) -> bool {
        self.get(action).is_some_and(|h| h.terminates_sequence())
    }
}

impl std::fmt::Debug for CommandCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandCatalog")
            .field("handlers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoHandler;

    #[async_trait]
    impl CommandHandler for EchoHandler {
        fn name(&self) -> &str {
            "back"
        }

        fn description(&self) -> &str {
            "test handler"
        }

        async fn handle(&self, _command: &Command, _ctx: &ExecutionContext) -> CommandResult {
            CommandResult::ok()
        }
    }

    struct ReplacementHandler;

    #[async_trait]
    impl CommandHandler for ReplacementHandler {
        fn name(&self) -> &str {
            "back"
        }

        fn description(&self) -> &str {
            "replacement handler"
        }

        async fn handle(&self, _command: &Command, _ctx: &ExecutionContext) -> CommandResult {
            CommandResult::failed("replaced")
        }
    }

    #[test]
    fn later_registration_wins_by_name() {
        let mut catalog = CommandCatalog::new();
        catalog.register(EchoHandler);
        catalog.register(ReplacementHandler);
        assert_eq!(catalog.names(), vec!["back".to_string()]);
        assert_eq!(catalog.get("back").expect("handler").description(), "replacement handler");
    }

    #[test]
    fn unknown_command_fails_validation() {
        let catalog = CommandCatalog::new();
        let result = catalog.validate("nonexistent", &serde_json::json!({}));
        assert!(result.is_err());
    }
}
