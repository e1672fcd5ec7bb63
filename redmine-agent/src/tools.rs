//! Lookup tools over the dataset.
//!
//! Every lookup is total: malformed input degrades to an empty result or
//! `None`, never to an error.

use crate::dataset::Dataset;
use redmine_core::{coerce_user_id, IssueId, IssuePriority, IssueStatus, UserId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Assignee label used for issues without an assigned user.
pub const UNASSIGNED: &str = "Unassigned";
/// Project label for issues whose project is missing from the dataset.
pub const UNKNOWN_PROJECT: &str = "Unknown Project";

/// An issue as listed for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectIssue {
    pub id: IssueId,
    pub subject: String,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub assignee: String,
}

/// An issue as listed for its assignee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedIssue {
    pub id: IssueId,
    pub subject: String,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub project: String,
}

/// The five lookup operations, borrowed over one dataset.
#[derive(Debug, Clone, Copy)]
pub struct LookupTools<'a> {
    dataset: &'a Dataset,
}

impl<'a> LookupTools<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    /// Resolve a display name to a user id, ignoring case.
    pub fn resolve_user(&self, username: &str) -> Option<UserId> {
        debug!(tool = "get_user_name", username, "Lookup");
        self.dataset.user_by_name(username).map(|u| u.id)
    }

    /// Names of the projects the user belongs to, in dataset order.
    pub fn projects_for_user(&self, user_id: &str) -> Vec<String> {
        debug!(tool = "get_projects_for_user", user_id, "Lookup");
        let Some(user_id) = coerce_user_id(user_id) else {
            warn!(user_id, "Cannot coerce user id");
            return Vec::new();
        };
        self.dataset
            .projects()
            .iter()
            .filter(|p| p.has_member(user_id))
            .map(|p| p.name.clone())
            .collect()
    }

    /// Issues of the named project, optionally filtered by status and priority.
    pub fn issues_for_project(
        &self,
        project_name: &str,
        status: Option<&str>,
        priority: Option<&str>,
    ) -> Vec<ProjectIssue> {
        debug!(
            tool = "get_issues_for_project",
            project_name,
            status = status.unwrap_or(""),
            priority = priority.unwrap_or(""),
            "Lookup"
        );
        let Some(project) = self.dataset.project_by_name(project_name) else {
            return Vec::new();
        };

        self.dataset
            .issues()
            .iter()
            .filter(|i| i.project_id == project.id && i.passes_filters(status, priority))
            .map(|i| ProjectIssue {
                id: i.id,
                subject: i.subject.clone(),
                status: i.status,
                priority: i.priority,
                assignee: i
                    .assigned_to
                    .and_then(|id| self.dataset.user(id))
                    .map(|u| u.username.clone())
                    .unwrap_or_else(|| UNASSIGNED.to_string()),
            })
            .collect()
    }

    /// Issues assigned to the user, optionally filtered by status.
    pub fn issues_assigned_to(&self, user_id: &str, status: Option<&str>) -> Vec<AssignedIssue> {
        debug!(
            tool = "get_my_assigned_issues",
            user_id,
            status = status.unwrap_or(""),
            "Lookup"
        );
        let Some(user_id) = coerce_user_id(user_id) else {
            return Vec::new();
        };

        self.dataset
            .issues()
            .iter()
            .filter(|i| i.assigned_to == Some(user_id) && i.passes_filters(status, None))
            .map(|i| AssignedIssue {
                id: i.id,
                subject: i.subject.clone(),
                status: i.status,
                priority: i.priority,
                project: self
                    .dataset
                    .project(i.project_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| UNKNOWN_PROJECT.to_string()),
            })
            .collect()
    }

    /// Every project name, in dataset order.
    pub fn all_projects(&self) -> Vec<String> {
        debug!(tool = "get_all_projects", "Lookup");
        self.dataset
            .projects()
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn subjects(issues: &[ProjectIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.subject.as_str()).collect()
    }

    #[test]
    fn test_resolve_user() {
        let dataset = Dataset::seed();
        let tools = LookupTools::new(&dataset);
        assert_eq!(tools.resolve_user("sally"), Some(102));
        assert_eq!(tools.resolve_user("Dave"), Some(101));
        assert_eq!(tools.resolve_user("mallory"), None);
        assert_eq!(tools.resolve_user(""), None);
    }

    #[test]
    fn test_projects_for_user_coerces_text_ids() {
        let dataset = Dataset::seed();
        let tools = LookupTools::new(&dataset);
        assert_eq!(
            tools.projects_for_user("102"),
            vec!["Project Phoenix", "Mobile App Q3"]
        );
        assert_eq!(
            tools.projects_for_user(" 101 "),
            vec!["Project Phoenix", "Internal Tools", "Mobile App Q3"]
        );
        assert!(tools.projects_for_user("sally").is_empty());
        assert!(tools.projects_for_user("999").is_empty());
    }

    #[test]
    fn test_issues_for_project_with_filters() {
        let dataset = Dataset::seed();
        let tools = LookupTools::new(&dataset);

        let all = tools.issues_for_project("project phoenix", None, None);
        assert_eq!(subjects(&all), vec!["Fix login button", "Update documentation"]);
        assert_eq!(all[0].assignee, "dave");
        assert_eq!(all[1].assignee, "sally");

        let open = tools.issues_for_project("Mobile App Q3", Some("open"), None);
        assert_eq!(open.len(), 2);

        let critical = tools.issues_for_project("Mobile App Q3", Some("Open"), Some("CRITICAL"));
        assert_eq!(subjects(&critical), vec!["Fix crash on iOS 17"]);

        assert!(tools.issues_for_project("Nonexistent", None, None).is_empty());
    }

    #[test]
    fn test_unassigned_issue_label() {
        let mut seed = Dataset::seed();
        let mut issues = seed.issues().to_vec();
        issues[0].assigned_to = None;
        seed = Dataset::new(seed.users().to_vec(), seed.projects().to_vec(), issues).unwrap();

        let tools = LookupTools::new(&seed);
        let listed = tools.issues_for_project("Project Phoenix", None, None);
        assert_eq!(listed[0].assignee, UNASSIGNED);
    }

    #[test]
    fn test_assigned_issue_with_missing_project_is_labelled() {
        let seed = Dataset::seed();
        let mut issues = seed.issues().to_vec();
        issues[0].project_id = 999;
        let assignee = issues[0].assigned_to.unwrap();
        let dataset = Dataset::unchecked(seed.users().to_vec(), seed.projects().to_vec(), issues);

        let tools = LookupTools::new(&dataset);
        let listed = tools.issues_assigned_to(&assignee.to_string(), None);
        assert_eq!(listed[0].project, UNKNOWN_PROJECT);
    }

    #[test]
    fn test_issues_assigned_to() {
        let dataset = Dataset::seed();
        let tools = LookupTools::new(&dataset);

        let dave = tools.issues_assigned_to("101", None);
        assert_eq!(dave.len(), 3);
        assert_eq!(dave[1].project, "Mobile App Q3");

        let dave_open = tools.issues_assigned_to("101", Some("Open"));
        assert_eq!(dave_open.len(), 2);

        assert!(tools.issues_assigned_to("", None).is_empty());
        assert!(tools.issues_assigned_to("abc", None).is_empty());
    }

    #[test]
    fn test_issue_records_serialize_with_labels() {
        let dataset = Dataset::seed();
        let tools = LookupTools::new(&dataset);
        let json = serde_json::to_value(tools.issues_for_project("Project Phoenix", None, None)).unwrap();
        assert_eq!(json[1]["status"], "In Progress");
        assert_eq!(json[1]["priority"], "Normal");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Listing all projects twice yields the same ordered sequence
        #[test]
        fn prop_all_projects_idempotent(_seed in any::<u8>()) {
            let dataset = Dataset::seed();
            let tools = LookupTools::new(&dataset);
            prop_assert_eq!(tools.all_projects(), tools.all_projects());
        }

        /// Unparseable ids never produce results
        #[test]
        fn prop_non_numeric_ids_yield_nothing(raw in "[a-zA-Z_ ]{0,12}") {
            let dataset = Dataset::seed();
            let tools = LookupTools::new(&dataset);
            prop_assert!(tools.projects_for_user(&raw).is_empty());
            prop_assert!(tools.issues_assigned_to(&raw, None).is_empty());
        }
    }
}
