//! Tool registry: names, schemas and dispatch.
//!
//! A tool call from the model is parsed into a typed [`ToolInvocation`]
//! before it touches the dataset. Unknown names and bad arguments become
//! error results that still answer the call id.

use crate::dataset::Dataset;
use crate::tools::LookupTools;
use redmine_core::{coerce_user_id, ToolArguments, ToolCall, ToolError};
use redmine_llm::ToolSpec;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Key of the single positional argument.
pub const POSITIONAL_ARG: &str = "__arg1";

/// The lookup tools exposed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GetUserName,
    GetProjectsForUser,
    GetIssuesForProject,
    GetMyAssignedIssues,
    GetAllProjects,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        Self::GetUserName,
        Self::GetProjectsForUser,
        Self::GetIssuesForProject,
        Self::GetAllProjects,
        Self::GetMyAssignedIssues,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetUserName => "get_user_name",
            Self::GetProjectsForUser => "get_projects_for_user",
            Self::GetIssuesForProject => "get_issues_for_project",
            Self::GetMyAssignedIssues => "get_my_assigned_issues",
            Self::GetAllProjects => "get_all_projects",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::GetUserName => {
                "Finds the Redmine user ID for a given username. Use this when you need to look up a user. The result is the user ID."
            }
            Self::GetProjectsForUser => {
                "Gets a list of project names for a given user ID. Use this to see what projects a user is involved in."
            }
            Self::GetIssuesForProject => {
                "Fetches issues from a specific project. Can optionally filter by status (Open, In Progress, Closed) and/or priority (Low, Normal, High, Critical)."
            }
            Self::GetMyAssignedIssues => {
                "Gets all issues assigned to a specific user. Can optionally filter by status."
            }
            Self::GetAllProjects => {
                "Gets a list of project names. Use this to see what projects are available."
            }
        }
    }

    /// JSON Schema of the arguments object.
    pub fn parameters(&self) -> Value {
        match self {
            Self::GetUserName => json!({
                "type": "object",
                "properties": {
                    POSITIONAL_ARG: {"type": "string", "description": "Username to look up"}
                },
                "required": [POSITIONAL_ARG]
            }),
            Self::GetProjectsForUser => json!({
                "type": "object",
                "properties": {
                    POSITIONAL_ARG: {"type": ["string", "integer"], "description": "User ID"}
                },
                "required": [POSITIONAL_ARG]
            }),
            Self::GetIssuesForProject => json!({
                "type": "object",
                "properties": {
                    POSITIONAL_ARG: {"type": "string", "description": "Project name"},
                    "status": {
                        "type": "string",
                        "enum": ["Open", "In Progress", "Closed"],
                        "description": "Optional status filter"
                    },
                    "priority": {
                        "type": "string",
                        "enum": ["Low", "Normal", "High", "Critical"],
                        "description": "Optional priority filter"
                    }
                },
                "required": [POSITIONAL_ARG]
            }),
            Self::GetMyAssignedIssues => json!({
                "type": "object",
                "properties": {
                    POSITIONAL_ARG: {"type": ["string", "integer"], "description": "Username or user ID"},
                    "status": {
                        "type": "string",
                        "enum": ["Open", "In Progress", "Closed"],
                        "description": "Optional status filter"
                    }
                },
                "required": [POSITIONAL_ARG]
            }),
            Self::GetAllProjects => json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }

    /// Named aliases accepted in place of the positional argument.
    fn positional_aliases(&self) -> &'static [&'static str] {
        match self {
            Self::GetUserName => &["username"],
            Self::GetProjectsForUser => &["user_id"],
            Self::GetIssuesForProject => &["project_name"],
            Self::GetMyAssignedIssues => &["username", "user_id"],
            Self::GetAllProjects => &[],
        }
    }
}

/// A validated tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    GetUserName {
        username: String,
    },
    GetProjectsForUser {
        user_id: String,
    },
    GetIssuesForProject {
        project_name: String,
        status: Option<String>,
        priority: Option<String>,
    },
    GetMyAssignedIssues {
        user: String,
        status: Option<String>,
    },
    GetAllProjects,
}

impl ToolInvocation {
    /// Parse a model-issued call into a typed invocation.
    pub fn parse(call: &ToolCall) -> Result<Self, ToolError> {
        let kind = ToolKind::from_name(&call.name).ok_or_else(|| ToolError::UnknownTool {
            name: call.name.clone(),
        })?;
        let args = &call.args;

        Ok(match kind {
            ToolKind::GetUserName => Self::GetUserName {
                username: positional(kind, args)?,
            },
            ToolKind::GetProjectsForUser => Self::GetProjectsForUser {
                user_id: positional(kind, args)?,
            },
            ToolKind::GetIssuesForProject => Self::GetIssuesForProject {
                project_name: positional(kind, args)?,
                status: optional(kind, args, "status")?,
                priority: optional(kind, args, "priority")?,
            },
            ToolKind::GetMyAssignedIssues => Self::GetMyAssignedIssues {
                user: positional(kind, args)?,
                status: optional(kind, args, "status")?,
            },
            ToolKind::GetAllProjects => Self::GetAllProjects,
        })
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            Self::GetUserName { .. } => ToolKind::GetUserName,
            Self::GetProjectsForUser { .. } => ToolKind::GetProjectsForUser,
            Self::GetIssuesForProject { .. } => ToolKind::GetIssuesForProject,
            Self::GetMyAssignedIssues { .. } => ToolKind::GetMyAssignedIssues,
            Self::GetAllProjects => ToolKind::GetAllProjects,
        }
    }

    /// Run the lookup and render its result as JSON text.
    pub fn run(&self, dataset: &Dataset) -> String {
        let tools = LookupTools::new(dataset);
        match self {
            Self::GetUserName { username } => render(&tools.resolve_user(username)),
            Self::GetProjectsForUser { user_id } => render(&tools.projects_for_user(user_id)),
            Self::GetIssuesForProject {
                project_name,
                status,
                priority,
            } => render(&tools.issues_for_project(
                project_name,
                status.as_deref(),
                priority.as_deref(),
            )),
            Self::GetMyAssignedIssues { user, status } => {
                // Numeric values are ids, anything else is a display name.
                let user_id = coerce_user_id(user).or_else(|| tools.resolve_user(user));
                match user_id {
                    Some(id) => render(&tools.issues_assigned_to(&id.to_string(), status.as_deref())),
                    None => render(&Vec::<Value>::new()),
                }
            }
            Self::GetAllProjects => render(&tools.all_projects()),
        }
    }
}

fn positional(kind: ToolKind, args: &ToolArguments) -> Result<String, ToolError> {
    let value = std::iter::once(POSITIONAL_ARG)
        .chain(kind.positional_aliases().iter().copied())
        .find_map(|key| args.get(key).filter(|v| !v.is_null()));

    match value {
        Some(value) => scalar_text(kind, POSITIONAL_ARG, value),
        None => Err(ToolError::InvalidArguments {
            tool: kind.name().to_string(),
            reason: format!("missing required argument {}", POSITIONAL_ARG),
        }),
    }
}

fn optional(kind: ToolKind, args: &ToolArguments, key: &str) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_text(kind, key, value).map(Some),
    }
}

fn scalar_text(kind: ToolKind, key: &str, value: &Value) -> Result<String, ToolError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ToolError::InvalidArguments {
            tool: kind.name().to_string(),
            reason: format!("{} must be a string or number, got {}", key, other),
        }),
    }
}

fn render<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

/// Result of executing one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub content: String,
    pub is_error: bool,
}

/// Registry of the tools offered to the model.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolKind>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ToolRegistry {
    /// All five lookup tools.
    pub fn standard() -> Self {
        Self {
            tools: ToolKind::ALL.to_vec(),
        }
    }

    pub fn with_tools(tools: impl IntoIterator<Item = ToolKind>) -> Self {
        Self {
            tools: tools.into_iter().collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    /// Tool specifications sent with every model request.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(ToolKind::spec).collect()
    }

    /// Parse a call, rejecting names that are not registered.
    pub fn resolve(&self, call: &ToolCall) -> Result<ToolInvocation, ToolError> {
        if !self.contains(&call.name) {
            return Err(ToolError::UnknownTool {
                name: call.name.clone(),
            });
        }
        ToolInvocation::parse(call)
    }

    /// Execute a call. Failures are rendered as `{"error": ...}` so the
    /// call id is always answered.
    pub fn execute(&self, dataset: &Dataset, call: &ToolCall) -> ToolOutcome {
        match self.resolve(call) {
            Ok(invocation) => {
                let content = invocation.run(dataset);
                debug!(
                    call_id = %call.id,
                    tool = invocation.kind().name(),
                    result = %content,
                    "Tool executed"
                );
                ToolOutcome {
                    content,
                    is_error: false,
                }
            }
            Err(err) => {
                warn!(call_id = %call.id, tool = %call.name, error = %err, "Tool call rejected");
                ToolOutcome {
                    content: json!({ "error": err.to_string() }).to_string(),
                    is_error: true,
                }
            }
        }
    }
}
