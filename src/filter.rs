// Filter engine shared by the timeline, workload and heatmap views.
use crate::types::{Filter, Project};
use chrono::Datelike;

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.client.is_none()
            && self.team.is_none()
            && self.kind.is_none()
            && self.phase.is_none()
            && self.month.is_none()
    }

    /// Build a filter from free-text inputs (menus, CLI flags). Blank text
    /// means "no constraint"; a month outside 1..=12 is ignored.
    pub fn from_inputs(
        client: Option<&str>,
        team: Option<&str>,
        kind: Option<&str>,
        phase: Option<&str>,
        month: Option<&str>,
    ) -> Self {
        Filter {
            client: non_blank(client),
            team: non_blank(team),
            kind: non_blank(kind),
            phase: non_blank(phase),
            month: month
                .and_then(|m| m.trim().parse::<u32>().ok())
                .filter(|m| (1..=12).contains(m)),
        }
    }

    /// The team the views should report on, when the filter pins one.
    pub fn team(&self) -> Option<&str> {
        self.team.as_deref().filter(|t| !t.is_empty())
    }

    pub fn matches(&self, project: &Project) -> bool {
        if let Some(client) = field(&self.client) {
            if project.client != client {
                return false;
            }
        }
        if let Some(team) = field(&self.team) {
            if !project.has_team(team) {
                return false;
            }
        }
        if let Some(kind) = field(&self.kind) {
            if project.kind != kind {
                return false;
            }
        }
        if let Some(phase) = field(&self.phase) {
            if project.phase != phase {
                return false;
            }
        }
        if let Some(month) = self.month.filter(|m| (1..=12).contains(m)) {
            return spans_month(project, month);
        }
        true
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn field(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Whether a project's month span (1-based, end defaulting to start)
/// includes `month`. Projects without a start date never match.
pub fn spans_month(project: &Project, month: u32) -> bool {
    let Some(start) = project.start_date else {
        return false;
    };
    let start_month = start.month();
    let end_month = project.end_date.map_or(start_month, |d| d.month());
    start_month <= month && month <= end_month
}

/// Order-preserving selection of the projects that pass every constraint.
pub fn apply<'a>(projects: &'a [Project], filter: &Filter) -> Vec<&'a Project> {
    projects.iter().filter(|p| filter.matches(p)).collect()
}
