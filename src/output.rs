use crate::error::OutputError;
use crate::types::{Heatmap, Workload};
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), OutputError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Team per row, one column per period label.
pub fn workload_records(workload: &Workload) -> Vec<Vec<String>> {
    let mut records = Vec::with_capacity(workload.teams.len() + 1);
    let mut header = vec!["Team".to_string()];
    header.extend(workload.labels.iter().cloned());
    records.push(header);
    for series in &workload.teams {
        let mut row = vec![series.team.clone()];
        row.extend(series.counts.iter().map(|c| c.to_string()));
        records.push(row);
    }
    records
}

/// Heatmap laid out as a team by month grid.
pub fn heatmap_records(heatmap: &Heatmap) -> Vec<Vec<String>> {
    let mut records = Vec::with_capacity(heatmap.teams.len() + 1);
    let mut header = vec!["Team".to_string()];
    header.extend(heatmap.months.iter().cloned());
    records.push(header);
    for (team_index, team) in heatmap.teams.iter().enumerate() {
        let mut row = vec![team.clone()];
        row.extend(
            heatmap
                .cells
                .iter()
                .filter(|c| c.team_index == team_index)
                .map(|c| c.value.to_string()),
        );
        records.push(row);
    }
    records
}

pub fn write_records(path: &Path, records: &[Vec<String>]) -> Result<(), OutputError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in records {
        wtr.write_record(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Markdown table from a header record followed by data records.
pub fn records_table(records: &[Vec<String>]) -> String {
    if records.len() <= 1 {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    for r in records {
        builder.push_record(r.iter().cloned());
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PeriodMode, TeamLoad, TeamSeries};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn quarter_workload() -> Workload {
        Workload {
            mode: PeriodMode::Quarter,
            labels: vec!["Q1".into(), "Q2".into(), "Q3".into(), "Q4".into()],
            teams: vec![TeamSeries {
                team: "Dev".into(),
                counts: vec![2, 1, 0, 0],
            }],
        }
    }

    #[test]
    fn workload_records_have_one_column_per_period() {
        let records = workload_records(&quarter_workload());
        assert_eq!(records[0], vec!["Team", "Q1", "Q2", "Q3", "Q4"]);
        assert_eq!(records[1], vec!["Dev", "2", "1", "0", "0"]);
    }

    #[test]
    fn markdown_table_contains_headers() {
        let table = records_table(&workload_records(&quarter_workload()));
        assert!(table.contains("| Team |"));
        assert!(table.contains("Dev"));
        assert_eq!(records_table(&[vec!["Team".to_string()]]), "(no rows)");
    }

    #[test]
    fn writes_csv_and_json_files() {
        let dir = tempdir().unwrap();
        let rows = vec![TeamLoad {
            team: "Dev".into(),
            total: 3,
            peak_label: "Q1".into(),
            peak_value: 2,
        }];
        let csv_path = dir.path().join("loads.csv");
        write_csv(&csv_path, &rows).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(text, "Team,TotalProjects,PeakPeriod,PeakCount\nDev,3,Q1,2\n");

        let json_path = dir.path().join("loads.json");
        write_json(&json_path, &rows).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(value[0]["PeakPeriod"], "Q1");
    }
}
