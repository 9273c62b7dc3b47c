use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

/// Group label used for projects whose client cell is empty.
pub const NO_CLIENT_LABEL: &str = "Sin Cliente";

/// Month labels shown on the workload chart and heatmap axis.
pub const MONTH_LABELS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

pub const QUARTER_LABELS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

/// One spreadsheet row as delivered by a source: header text to cell value.
///
/// Key order follows the source column order. The substring pass of the
/// column resolver walks keys in this order, so it matters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(Map<String, Value>);

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for fixtures and the demo rows.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        RawRow(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: usize,
    pub client: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub phase: String,
    pub tasks: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub confirmed_date: Option<NaiveDate>,
    pub external_link: String,
    pub teams: Vec<String>,
}

impl Project {
    /// End of the span; a project without an end date is a single point.
    pub fn effective_end(&self) -> Option<NaiveDate> {
        self.end_date.or(self.start_date)
    }

    /// Client name as used for grouping.
    pub fn group_label(&self) -> &str {
        if self.client.is_empty() {
            NO_CLIENT_LABEL
        } else {
            &self.client
        }
    }

    pub fn has_team(&self, team: &str) -> bool {
        self.teams.iter().any(|t| t == team)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientGroup {
    pub client: String,
    pub projects: Vec<Project>,
}

/// The normalized collection built from one batch of raw rows.
///
/// A dataset is never edited after it is built; a refresh builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub projects: Vec<Project>,
    pub projects_by_client: Vec<ClientGroup>,
    pub clients: Vec<String>,
    pub teams: Vec<String>,
    pub types: Vec<String>,
    pub built_at: DateTime<Utc>,
}

impl Dataset {
    pub fn empty() -> Self {
        Dataset {
            projects: Vec::new(),
            projects_by_client: Vec::new(),
            clients: Vec::new(),
            teams: Vec::new(),
            types: Vec::new(),
            built_at: Utc::now(),
        }
    }

    pub fn projects_for_client(&self, client: &str) -> Option<&[Project]> {
        self.projects_by_client
            .iter()
            .find(|g| g.client == client)
            .map(|g| g.projects.as_slice())
    }

    /// Content equality, ignoring the build timestamp.
    pub fn same_content(&self, other: &Dataset) -> bool {
        self.projects == other.projects
            && self.projects_by_client == other.projects_by_client
            && self.clients == other.clients
            && self.teams == other.teams
            && self.types == other.types
    }
}

/// Query narrowing the project list for one view. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub client: Option<String>,
    pub team: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub phase: Option<String>,
    pub month: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodMode {
    #[default]
    Month,
    Quarter,
}

impl PeriodMode {
    pub fn bucket_count(self) -> usize {
        match self {
            PeriodMode::Month => MONTH_LABELS.len(),
            PeriodMode::Quarter => QUARTER_LABELS.len(),
        }
    }

    pub fn labels(self) -> &'static [&'static str] {
        match self {
            PeriodMode::Month => &MONTH_LABELS,
            PeriodMode::Quarter => &QUARTER_LABELS,
        }
    }

    /// Bucket index for a zero-based month.
    pub fn bucket(self, month0: u32) -> usize {
        match self {
            PeriodMode::Month => month0 as usize,
            PeriodMode::Quarter => (month0 / 3) as usize,
        }
    }
}

impl fmt::Display for PeriodMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodMode::Month => write!(f, "month"),
            PeriodMode::Quarter => write!(f, "quarter"),
        }
    }
}

impl FromStr for PeriodMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "month" | "mes" | "m" => Ok(PeriodMode::Month),
            "quarter" | "trimestre" | "q" => Ok(PeriodMode::Quarter),
            other => Err(format!("unknown period '{}', expected month or quarter", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSeries {
    pub team: String,
    pub counts: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workload {
    pub mode: PeriodMode,
    pub labels: Vec<String>,
    pub teams: Vec<TeamSeries>,
}

impl Workload {
    pub fn counts_for(&self, team: &str) -> Option<&[u32]> {
        self.teams
            .iter()
            .find(|s| s.team == team)
            .map(|s| s.counts.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub team: String,
    pub team_index: usize,
    pub month: String,
    pub month_index: usize,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub cells: Vec<HeatmapCell>,
    pub teams: Vec<String>,
    pub months: Vec<String>,
    pub max_value: u32,
}

impl Heatmap {
    pub fn value(&self, team: &str, month_index: usize) -> Option<u32> {
        self.cells
            .iter()
            .find(|c| c.team == team && c.month_index == month_index)
            .map(|c| c.value)
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct TeamLoad {
    #[serde(rename = "Team")]
    #[tabled(rename = "Team")]
    pub team: String,
    #[serde(rename = "TotalProjects")]
    #[tabled(rename = "TotalProjects")]
    pub total: u32,
    #[serde(rename = "PeakPeriod")]
    #[tabled(rename = "PeakPeriod")]
    pub peak_label: String,
    #[serde(rename = "PeakCount")]
    #[tabled(rename = "PeakCount")]
    pub peak_value: u32,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct TimelineRow {
    #[serde(rename = "Client")]
    #[tabled(rename = "Client")]
    pub client: String,
    #[serde(rename = "Project")]
    #[tabled(rename = "Project")]
    pub project: String,
    #[serde(rename = "Type")]
    #[tabled(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Phase")]
    #[tabled(rename = "Phase")]
    pub phase: String,
    #[serde(rename = "Start")]
    #[tabled(rename = "Start")]
    pub start: String,
    #[serde(rename = "End")]
    #[tabled(rename = "End")]
    pub end: String,
    #[serde(rename = "Teams")]
    #[tabled(rename = "Teams")]
    pub teams: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_projects: usize,
    pub filtered_projects: usize,
    pub total_clients: usize,
    pub total_teams: usize,
    pub period: PeriodMode,
    pub filter: Filter,
    pub heatmap_max: u32,
    pub busiest_team: Option<String>,
    pub last_update: DateTime<Utc>,
}
