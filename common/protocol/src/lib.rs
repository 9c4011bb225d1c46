//! Shared data model for the agent workspace: messages, commands, page
//! signatures, step records, run state, budgets, and sandbox shapes (§3).

pub mod agent_state;
pub mod budget;
pub mod command;
pub mod message;
pub mod page;
pub mod sandbox;
pub mod step;

pub use agent_state::AgentState;
pub use budget::BudgetConfig;
pub use budget::BudgetState;
pub use command::Command;
pub use command::CommandResult;
pub use command::CustomCommand;
pub use command::ScrollDirection;
pub use message::ContentPart;
pub use message::IMAGE_TOKEN_ESTIMATE;
pub use message::Message;
pub use message::MessageCategory;
pub use message::MessageContent;
pub use message::Role;
pub use message::TrackedMessage;
pub use message::estimate_tokens;
pub use page::PageSignature;
pub use sandbox::CapturedOutput;
pub use sandbox::SandboxConfig;
pub use sandbox::SandboxError;
pub use sandbox::SandboxErrorCategory;
pub use sandbox::SandboxMetrics;
pub use sandbox::SandboxResult;
pub use sandbox::is_url_permitted;
pub use step::CommandOutcome;
pub use step::StepRecord;
pub use step::Usage;
