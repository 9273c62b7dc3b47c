use crate::filter;
use crate::loader::group_by_client;
use crate::types::{
    ClientGroup, Dataset, Filter, Heatmap, HeatmapCell, PeriodMode, Project, SummaryStats,
    TeamLoad, TeamSeries, TimelineRow, Workload, MONTH_LABELS,
};
use chrono::{Datelike, NaiveDate};

/// Teams a view reports on: the filter's team if pinned, otherwise the teams
/// found on the filtered projects (first appearance), otherwise every team
/// the dataset knows about.
pub fn teams_to_report(filtered: &[&Project], filter: &Filter, known_teams: &[String]) -> Vec<String> {
    if let Some(team) = filter.team() {
        return vec![team.to_string()];
    }
    let mut teams: Vec<String> = Vec::new();
    for p in filtered {
        for t in &p.teams {
            if !teams.contains(t) {
                teams.push(t.clone());
            }
        }
    }
    if teams.is_empty() {
        known_teams.to_vec()
    } else {
        teams
    }
}

/// Zero-based (start, end) months of a project's span, or `None` when it has
/// no start date.
fn month_span(project: &Project) -> Option<(u32, u32)> {
    let start: NaiveDate = project.start_date?;
    let end = project.effective_end().unwrap_or(start);
    Some((start.month0(), end.month0()))
}

/// Projects per team per period. A project counts once in every period
/// between its start and end, inclusive.
pub fn workload(
    filtered: &[&Project],
    filter: &Filter,
    known_teams: &[String],
    mode: PeriodMode,
) -> Workload {
    let teams = teams_to_report(filtered, filter, known_teams);
    let mut series: Vec<TeamSeries> = teams
        .into_iter()
        .map(|team| TeamSeries {
            team,
            counts: vec![0; mode.bucket_count()],
        })
        .collect();

    for project in filtered {
        let Some((start, end)) = month_span(project) else {
            continue;
        };
        let (first, last) = (mode.bucket(start), mode.bucket(end));
        for team in &project.teams {
            let Some(row) = series.iter_mut().find(|s| &s.team == team) else {
                continue;
            };
            for bucket in first..=last {
                row.counts[bucket] += 1;
            }
        }
    }

    Workload {
        mode,
        labels: mode.labels().iter().map(|l| l.to_string()).collect(),
        teams: series,
    }
}

/// Team by month occupancy. Always monthly, regardless of the workload
/// period setting.
pub fn heatmap(filtered: &[&Project], filter: &Filter, known_teams: &[String]) -> Heatmap {
    let teams = teams_to_report(filtered, filter, known_teams);
    let spans: Vec<(&Project, (u32, u32))> = filtered
        .iter()
        .filter_map(|p| month_span(p).map(|span| (*p, span)))
        .collect();

    let mut cells = Vec::with_capacity(teams.len() * MONTH_LABELS.len());
    for (team_index, team) in teams.iter().enumerate() {
        for (month_index, month) in MONTH_LABELS.iter().enumerate() {
            let m = month_index as u32;
            let value = spans
                .iter()
                .filter(|(p, (start, end))| p.has_team(team) && *start <= m && m <= *end)
                .count() as u32;
            cells.push(HeatmapCell {
                team: team.clone(),
                team_index,
                month: month.to_string(),
                month_index,
                value,
            });
        }
    }

    let max_value = cells.iter().map(|c| c.value).max().unwrap_or(0).max(1);
    Heatmap {
        cells,
        teams,
        months: MONTH_LABELS.iter().map(|m| m.to_string()).collect(),
        max_value,
    }
}

/// Per-team totals and the busiest period. Ties go to the earliest period.
pub fn summarize_workload(workload: &Workload) -> Vec<TeamLoad> {
    workload
        .teams
        .iter()
        .map(|series| {
            let total: u32 = series.counts.iter().sum();
            let (peak_idx, peak_value) = series
                .counts
                .iter()
                .copied()
                .enumerate()
                .fold((0usize, 0u32), |best, (idx, v)| if v > best.1 { (idx, v) } else { best });
            TeamLoad {
                team: series.team.clone(),
                total,
                peak_label: workload.labels.get(peak_idx).cloned().unwrap_or_default(),
                peak_value,
            }
        })
        .collect()
}

/// Filtered projects regrouped by client for the timeline view.
pub fn timeline_groups(filtered: &[&Project]) -> Vec<ClientGroup> {
    group_by_client(filtered.iter().copied())
}

fn format_date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_default()
}

pub fn timeline_rows(groups: &[ClientGroup]) -> Vec<TimelineRow> {
    groups
        .iter()
        .flat_map(|g| {
            g.projects.iter().map(move |p| TimelineRow {
                client: g.client.clone(),
                project: p.name.clone(),
                kind: p.kind.clone(),
                phase: p.phase.clone(),
                start: format_date(p.start_date),
                end: format_date(p.end_date),
                teams: p.teams.join(", "),
            })
        })
        .collect()
}

/// Everything one dashboard refresh renders, computed from a single dataset.
pub struct DashboardReport {
    pub timeline: Vec<ClientGroup>,
    pub workload: Workload,
    pub team_loads: Vec<TeamLoad>,
    pub heatmap: Heatmap,
    pub summary: SummaryStats,
}

pub fn generate_report(dataset: &Dataset, filter: &Filter, mode: PeriodMode) -> DashboardReport {
    let filtered = filter::apply(&dataset.projects, filter);
    let workload = workload(&filtered, filter, &dataset.teams, mode);
    let team_loads = summarize_workload(&workload);
    let heatmap = heatmap(&filtered, filter, &dataset.teams);
    let busiest_team = team_loads
        .iter()
        .filter(|t| t.total > 0)
        .max_by(|a, b| a.total.cmp(&b.total).then_with(|| b.team.cmp(&a.team)))
        .map(|t| t.team.clone());
    let summary = SummaryStats {
        total_projects: dataset.projects.len(),
        filtered_projects: filtered.len(),
        total_clients: dataset.clients.len(),
        total_teams: dataset.teams.len(),
        period: mode,
        filter: filter.clone(),
        heatmap_max: heatmap.max_value,
        busiest_team,
        last_update: dataset.built_at,
    };
    DashboardReport {
        timeline: timeline_groups(&filtered),
        workload,
        team_loads,
        heatmap,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn project(id: usize, start: Option<(u32, u32)>, end: Option<(u32, u32)>, teams: &[&str]) -> Project {
        Project {
            id,
            client: "Acme".to_string(),
            name: format!("p{}", id),
            kind: String::new(),
            phase: String::new(),
            tasks: String::new(),
            start_date: start.and_then(|(m, d)| NaiveDate::from_ymd_opt(2026, m, d)),
            end_date: end.and_then(|(m, d)| NaiveDate::from_ymd_opt(2026, m, d)),
            confirmed_date: None,
            external_link: String::new(),
            teams: teams.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn known(teams: &[&str]) -> Vec<String> {
        teams.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn span_counts_every_month_touched() {
        // March through May, zero-based months 2..=4.
        let p = project(0, Some((3, 10)), Some((5, 2)), &["Dev"]);
        let w = workload(&[&p], &Filter::default(), &[], PeriodMode::Month);
        assert_eq!(
            w.counts_for("Dev").unwrap(),
            &[0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn point_project_counts_once() {
        let p = project(0, Some((7, 1)), None, &["Video"]);
        let w = workload(&[&p], &Filter::default(), &[], PeriodMode::Month);
        assert_eq!(w.counts_for("Video").unwrap().iter().sum::<u32>(), 1);
        assert_eq!(w.counts_for("Video").unwrap()[6], 1);
    }

    #[test]
    fn quarter_mode_buckets_by_three_months() {
        let a = project(0, Some((2, 1)), Some((4, 30)), &["Dev"]);
        let b = project(1, Some((1, 1)), Some((3, 31)), &["Dev"]);
        let w = workload(&[&a, &b], &Filter::default(), &[], PeriodMode::Quarter);
        assert_eq!(w.labels, vec!["Q1", "Q2", "Q3", "Q4"]);
        // a spans Q1..Q2, b sits inside Q1 and counts once.
        assert_eq!(w.counts_for("Dev").unwrap(), &[2, 1, 0, 0]);
    }

    #[test]
    fn end_before_start_adds_nothing() {
        let p = project(0, Some((11, 1)), Some((2, 1)), &["Dev"]);
        let w = workload(&[&p], &Filter::default(), &[], PeriodMode::Month);
        assert_eq!(w.counts_for("Dev").unwrap().iter().sum::<u32>(), 0);
        let h = heatmap(&[&p], &Filter::default(), &[]);
        assert_eq!(h.cells.iter().map(|c| c.value).sum::<u32>(), 0);
    }

    #[test]
    fn undated_projects_do_not_contribute() {
        let p = project(0, None, Some((3, 1)), &["Dev"]);
        let w = workload(&[&p], &Filter::default(), &[], PeriodMode::Month);
        assert_eq!(w.counts_for("Dev").unwrap(), &[0; 12]);
    }

    #[test]
    fn pinned_team_reports_only_that_team() {
        let p = project(0, Some((1, 1)), None, &["Dev", "Video"]);
        let filter = Filter {
            team: Some("Dev".into()),
            ..Filter::default()
        };
        let w = workload(&[&p], &filter, &known(&["Dev", "Video"]), PeriodMode::Month);
        assert_eq!(w.teams.len(), 1);
        assert_eq!(w.teams[0].team, "Dev");
        assert_eq!(w.teams[0].counts[0], 1);
    }

    #[test]
    fn falls_back_to_known_teams_with_zero_rows() {
        let p = project(0, Some((1, 1)), None, &[]);
        let w = workload(&[&p], &Filter::default(), &known(&["Content", "Dev"]), PeriodMode::Month);
        let teams: Vec<&str> = w.teams.iter().map(|s| s.team.as_str()).collect();
        assert_eq!(teams, vec!["Content", "Dev"]);
        assert!(w.teams.iter().all(|s| s.counts.iter().all(|c| *c == 0)));
    }

    #[test]
    fn heatmap_is_team_major_and_monthly() {
        let a = project(0, Some((1, 5)), Some((2, 5)), &["Dev"]);
        let b = project(1, Some((2, 1)), None, &["Dev", "Content"]);
        let h = heatmap(&[&a, &b], &Filter::default(), &[]);
        assert_eq!(h.teams, vec!["Dev", "Content"]);
        assert_eq!(h.cells.len(), 24);
        assert_eq!(h.cells[0].team, "Dev");
        assert_eq!(h.cells[12].team, "Content");
        assert_eq!(h.cells[12].team_index, 1);
        assert_eq!(h.value("Dev", 0), Some(1));
        assert_eq!(h.value("Dev", 1), Some(2));
        assert_eq!(h.value("Content", 1), Some(1));
        assert_eq!(h.max_value, 2);
        assert_eq!(h.months[11], "Dic");
    }

    #[test]
    fn heatmap_max_is_at_least_one() {
        let h = heatmap(&[], &Filter::default(), &known(&["Dev"]));
        assert_eq!(h.cells.len(), 12);
        assert!(h.cells.iter().all(|c| c.value == 0));
        assert_eq!(h.max_value, 1);

        let h = heatmap(&[], &Filter::default(), &[]);
        assert!(h.cells.is_empty());
        assert_eq!(h.max_value, 1);
    }

    #[test]
    fn summary_picks_earliest_peak() {
        let w = Workload {
            mode: PeriodMode::Quarter,
            labels: known(&["Q1", "Q2", "Q3", "Q4"]),
            teams: vec![TeamSeries {
                team: "Dev".into(),
                counts: vec![1, 3, 3, 0],
            }],
        };
        assert_eq!(
            summarize_workload(&w),
            vec![TeamLoad {
                team: "Dev".into(),
                total: 7,
                peak_label: "Q2".into(),
                peak_value: 3,
            }]
        );
    }

    #[test]
    fn timeline_rows_format_dates() {
        let p = project(0, Some((3, 1)), None, &["Dev", "Video"]);
        let rows = timeline_rows(&timeline_groups(&[&p]));
        assert_eq!(rows[0].start, "01/03/2026");
        assert_eq!(rows[0].end, "");
        assert_eq!(rows[0].teams, "Dev, Video");
    }
}
