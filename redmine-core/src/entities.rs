//! Dataset entities: users, projects and issues.

use crate::{IssueId, IssuePriority, IssueStatus, ProjectId, UserId};
use serde::{Deserialize, Serialize};

/// A Redmine user. Display names are unique under case-insensitive comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }

    /// Case-insensitive display name comparison.
    pub fn has_name(&self, name: &str) -> bool {
        self.username.to_lowercase() == name.to_lowercase()
    }
}

/// A project and the users who belong to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub members: Vec<UserId>,
}

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>, members: Vec<UserId>) -> Self {
        Self {
            id,
            name: name.into(),
            members,
        }
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    pub fn has_member(&self, user_id: UserId) -> bool {
        self.members.contains(&user_id)
    }
}

/// An issue inside a project. `assigned_to == None` means unassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub project_id: ProjectId,
    pub subject: String,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub assigned_to: Option<UserId>,
}

impl Issue {
    /// Check the optional status and priority filters. A missing or blank
    /// filter matches everything.
    pub fn passes_filters(&self, status: Option<&str>, priority: Option<&str>) -> bool {
        let status_ok = match status.filter(|s| !s.is_empty()) {
            Some(filter) => self.status.matches(filter),
            None => true,
        };
        let priority_ok = match priority.filter(|p| !p.is_empty()) {
            Some(filter) => self.priority.matches(filter),
            None => true,
        };
        status_ok && priority_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue() -> Issue {
        Issue {
            id: 1,
            project_id: 201,
            subject: "Fix login button".to_string(),
            status: IssueStatus::Open,
            priority: IssuePriority::High,
            assigned_to: Some(101),
        }
    }

    #[test]
    fn test_user_has_name_case_insensitive() {
        let user = User::new(102, "sally");
        assert!(user.has_name("SALLY"));
        assert!(user.has_name("Sally"));
        assert!(!user.has_name("sal"));
    }

    #[test]
    fn test_project_membership() {
        let project = Project::new(202, "Internal Tools", vec![101]);
        assert!(project.has_member(101));
        assert!(!project.has_member(102));
        assert!(project.has_name("internal tools"));
    }

    #[test]
    fn test_issue_filters() {
        let issue = issue();
        assert!(issue.passes_filters(None, None));
        assert!(issue.passes_filters(Some("open"), None));
        assert!(issue.passes_filters(Some("Open"), Some("HIGH")));
        assert!(!issue.passes_filters(Some("Closed"), None));
        assert!(!issue.passes_filters(None, Some("Low")));
        assert!(issue.passes_filters(Some(""), Some("")));
    }
}
