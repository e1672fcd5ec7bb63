//! In-memory dataset of users, projects and issues.

use redmine_core::{
    DatasetError, Issue, IssueId, IssuePriority, IssueStatus, Project, ProjectId, User, UserId,
};
use std::collections::HashSet;

/// Read-only collection of users, projects and issues, kept in insertion
/// order. Shared between sessions behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dataset {
    users: Vec<User>,
    projects: Vec<Project>,
    issues: Vec<Issue>,
}

impl Dataset {
    /// Build a dataset and check its referential integrity.
    pub fn new(
        users: Vec<User>,
        projects: Vec<Project>,
        issues: Vec<Issue>,
    ) -> Result<Self, DatasetError> {
        let dataset = Self {
            users,
            projects,
            issues,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Build a dataset without the integrity check.
    #[cfg(test)]
    pub(crate) fn unchecked(users: Vec<User>, projects: Vec<Project>, issues: Vec<Issue>) -> Self {
        Self {
            users,
            projects,
            issues,
        }
    }

    /// The fixed seed the assistant ships with.
    pub fn seed() -> Self {
        let issue = |id: IssueId,
                     project_id: ProjectId,
                     subject: &str,
                     status: IssueStatus,
                     priority: IssuePriority,
                     assigned_to: UserId| Issue {
            id,
            project_id,
            subject: subject.to_string(),
            status,
            priority,
            assigned_to: Some(assigned_to),
        };

        Self {
            users: vec![User::new(101, "dave"), User::new(102, "sally")],
            projects: vec![
                Project::new(201, "Project Phoenix", vec![101, 102]),
                Project::new(202, "Internal Tools", vec![101]),
                Project::new(203, "Mobile App Q3", vec![101, 102]),
            ],
            issues: vec![
                issue(1, 201, "Fix login button", IssueStatus::Open, IssuePriority::High, 101),
                issue(2, 201, "Update documentation", IssueStatus::InProgress, IssuePriority::Normal, 102),
                issue(3, 203, "Deploy to TestFlight", IssueStatus::Open, IssuePriority::High, 101),
                issue(4, 202, "Setup CI/CD pipeline", IssueStatus::Closed, IssuePriority::Normal, 101),
                issue(5, 203, "Fix crash on iOS 17", IssueStatus::Open, IssuePriority::Critical, 102),
            ],
        }
    }

    /// Check name uniqueness, project membership and issue references.
    pub fn validate(&self) -> Result<(), DatasetError> {
        let mut names = HashSet::new();
        for user in &self.users {
            if !names.insert(user.username.to_lowercase()) {
                return Err(DatasetError::DuplicateUserName {
                    username: user.username.clone(),
                });
            }
        }

        for project in &self.projects {
            if let Some(&user_id) = project
                .members
                .iter()
                .find(|&&member| self.user(member).is_none())
            {
                return Err(DatasetError::UnknownMember {
                    project_id: project.id,
                    user_id,
                });
            }
        }

        for issue in &self.issues {
            if self.project(issue.project_id).is_none() {
                return Err(DatasetError::UnknownProject {
                    issue_id: issue.id,
                    project_id: issue.project_id,
                });
            }
            if let Some(user_id) = issue.assigned_to {
                if self.user(user_id).is_none() {
                    return Err(DatasetError::UnknownAssignee {
                        issue_id: issue.id,
                        user_id,
                    });
                }
            }
        }

        Ok(())
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// First user whose display name matches, ignoring case.
    pub fn user_by_name(&self, name: &str) -> Option<&User> {
        self.users.iter().find(|u| u.has_name(name))
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn project_by_name(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.has_name(name))
    }
}
