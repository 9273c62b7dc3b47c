use crate::columns::{is_affirmative, resolve, resolve_value, FieldAliases};
use crate::dates::DateParser;
use crate::error::IngestError;
use crate::types::{ClientGroup, Dataset, Project, RawRow};
use chrono::Utc;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub project_rows: usize,
    pub dropped_rows: usize,
}

/// Turns raw rows into projects using an alias table and a date chain.
pub struct RowNormalizer {
    aliases: FieldAliases,
    dates: DateParser,
}

impl Default for RowNormalizer {
    fn default() -> Self {
        RowNormalizer::new(FieldAliases::default(), DateParser::standard())
    }
}

impl RowNormalizer {
    pub fn new(aliases: FieldAliases, dates: DateParser) -> Self {
        RowNormalizer { aliases, dates }
    }

    pub fn aliases(&self) -> &FieldAliases {
        &self.aliases
    }

    /// Normalize one row. Rows with neither a client nor a project name are
    /// not projects and come back as `None`.
    pub fn normalize(&self, row: &RawRow, index: usize) -> Option<Project> {
        let a = &self.aliases;
        let client = resolve(row, &a.client);
        let name = resolve(row, &a.name);
        if client.is_empty() && name.is_empty() {
            return None;
        }

        let date = |aliases: &Vec<String>| {
            let text = resolve(row, aliases);
            self.dates.parse(&text)
        };

        let mut teams: Vec<String> = Vec::new();
        for col in &a.teams {
            if resolve_value(row, &col.aliases).is_some_and(is_affirmative) {
                push_unique(&mut teams, &col.team);
            }
        }

        Some(Project {
            id: index,
            client,
            name,
            kind: resolve(row, &a.kind),
            phase: resolve(row, &a.phase),
            tasks: resolve(row, &a.tasks),
            start_date: date(&a.start_date),
            end_date: date(&a.end_date),
            confirmed_date: date(&a.confirmed_date),
            external_link: resolve(row, &a.external_link),
            teams,
        })
    }

    /// Build a complete dataset from a batch of rows.
    pub fn build(&self, rows: &[RawRow]) -> (Dataset, LoadReport) {
        let projects: Vec<Project> = rows
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| self.normalize(row, idx))
            .collect();

        let mut clients: Vec<String> = Vec::new();
        let mut teams: Vec<String> = Vec::new();
        let mut types: Vec<String> = Vec::new();
        for p in &projects {
            push_unique(&mut clients, &p.client);
            push_unique(&mut types, &p.kind);
            for t in &p.teams {
                push_unique(&mut teams, t);
            }
        }

        let projects_by_client = group_by_client(projects.iter());

        let report = LoadReport {
            total_rows: rows.len(),
            project_rows: projects.len(),
            dropped_rows: rows.len() - projects.len(),
        };
        info!(
            projects = projects.len(),
            teams = teams.len(),
            clients = clients.len(),
            "processed dataset"
        );
        if report.dropped_rows > 0 {
            debug!(dropped = report.dropped_rows, "skipped rows without client or project");
        }

        let dataset = Dataset {
            projects,
            projects_by_client,
            clients,
            teams,
            types,
            built_at: Utc::now(),
        };
        (dataset, report)
    }
}

fn push_unique(seen: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !seen.iter().any(|v| v == value) {
        seen.push(value.to_string());
    }
}

/// Group projects by client label, keeping first-seen group order and the
/// input order inside each group.
pub fn group_by_client<'a>(projects: impl IntoIterator<Item = &'a Project>) -> Vec<ClientGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<ClientGroup> = Vec::new();
    for p in projects {
        let label = p.group_label();
        let slot = *index.entry(label.to_string()).or_insert_with(|| {
            groups.push(ClientGroup {
                client: label.to_string(),
                projects: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].projects.push(p.clone());
    }
    groups
}

pub fn normalize_row(row: &RawRow, index: usize) -> Option<Project> {
    RowNormalizer::default().normalize(row, index)
}

pub fn build_dataset(rows: &[RawRow]) -> Dataset {
    RowNormalizer::default().build(rows).0
}

pub fn build_dataset_with_report(rows: &[RawRow]) -> (Dataset, LoadReport) {
    RowNormalizer::default().build(rows)
}

/// Read a CSV export. Every cell is kept as text under its header.
pub fn rows_from_csv<R: Read>(reader: R) -> Result<Vec<RawRow>, IngestError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .filter(|(h, _)| !h.is_empty())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Read a JSON array of row objects.
pub fn rows_from_json<R: Read>(reader: R) -> Result<Vec<RawRow>, IngestError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Load rows from a `.csv` or `.json` file, picked by extension.
pub fn load_rows(path: &Path) -> Result<Vec<RawRow>, IngestError> {
    let file = File::open(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        rows_from_json(file)
    } else {
        rows_from_csv(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(client: &str, name: &str) -> RawRow {
        RawRow::new().with("Cliente", client).with("Proyecto", name)
    }

    #[test]
    fn normalizes_a_full_row() {
        let raw = row("Localiza", "Semana Santa")
            .with("Línea / Tipo", "Campaña")
            .with("Fase", "Pre-production")
            .with("Tareas", "Campaña Semana Santa")
            .with("Fecha de Inicio", "1-Mar-2026")
            .with("Fecha Finalización", "15-Apr-2026")
            .with("Fecha confirmada", "10-Apr-2026")
            .with("Link Click Up", "https://app.clickup.com/t/1")
            .with("Equipo Content", "Aplica")
            .with("Equipo Video", "No Aplica")
            .with("Equipo Social Media", json!(true))
            .with("Equipo Dev", "TRUE");

        let p = normalize_row(&raw, 7).unwrap();
        assert_eq!(p.id, 7);
        assert_eq!(p.client, "Localiza");
        assert_eq!(p.name, "Semana Santa");
        assert_eq!(p.kind, "Campaña");
        assert_eq!(p.phase, "Pre-production");
        assert_eq!(p.start_date, Some(date(2026, 3, 1)));
        assert_eq!(p.end_date, Some(date(2026, 4, 15)));
        assert_eq!(p.confirmed_date, Some(date(2026, 4, 10)));
        assert_eq!(p.external_link, "https://app.clickup.com/t/1");
        assert_eq!(p.teams, vec!["Content", "Dev", "Social Media"]);
    }

    #[test]
    fn row_without_client_and_name_is_dropped() {
        let raw = row("", "").with("Fase", "Planning");
        assert!(normalize_row(&raw, 0).is_none());
    }

    #[test]
    fn client_or_name_alone_is_enough() {
        assert!(normalize_row(&row("Acme", ""), 0).is_some());
        assert!(normalize_row(&row("", "Launch"), 0).is_some());
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let p = normalize_row(&row("Acme", "Launch"), 0).unwrap();
        assert_eq!(p.kind, "");
        assert_eq!(p.tasks, "");
        assert_eq!(p.start_date, None);
        assert!(p.teams.is_empty());
    }

    #[test]
    fn bad_dates_become_none() {
        let raw = row("Acme", "Launch")
            .with("Fecha de Inicio", "soon")
            .with("Fecha Finalización", "1-Jun-2026");
        let p = normalize_row(&raw, 0).unwrap();
        assert_eq!(p.start_date, None);
        assert_eq!(p.end_date, Some(date(2026, 6, 1)));
    }

    #[test]
    fn ids_follow_row_position_including_dropped_rows() {
        let rows = vec![row("A", "one"), row("", ""), row("B", "two")];
        let (ds, report) = build_dataset_with_report(&rows);
        let ids: Vec<usize> = ds.projects.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(
            report,
            LoadReport {
                total_rows: 3,
                project_rows: 2,
                dropped_rows: 1
            }
        );
    }

    #[test]
    fn groups_and_distinct_sets_keep_first_appearance() {
        let rows = vec![
            row("Beta", "b1").with("Tipo", "Evento").with("Equipo Dev", "Aplica"),
            row("", "orphan").with("Equipo Video", "Aplica"),
            row("Alpha", "a1").with("Tipo", "Campaña").with("Equipo Dev", "Aplica"),
            row("Beta", "b2").with("Tipo", "Evento").with("Equipo Content", "Aplica"),
        ];
        let ds = build_dataset(&rows);

        assert_eq!(ds.clients, vec!["Beta", "Alpha"]);
        assert_eq!(ds.types, vec!["Evento", "Campaña"]);
        assert_eq!(ds.teams, vec!["Dev", "Video", "Content"]);

        let groups: Vec<(&str, Vec<&str>)> = ds
            .projects_by_client
            .iter()
            .map(|g| {
                (
                    g.client.as_str(),
                    g.projects.iter().map(|p| p.name.as_str()).collect(),
                )
            })
            .collect();
        assert_eq!(
            groups,
            vec![
                ("Beta", vec!["b1", "b2"]),
                ("Sin Cliente", vec!["orphan"]),
                ("Alpha", vec!["a1"]),
            ]
        );
    }

    #[test]
    fn building_twice_gives_the_same_content() {
        let rows = vec![row("A", "one"), row("B", "two")];
        let first = build_dataset(&rows);
        let second = build_dataset(&rows);
        assert!(first.same_content(&second));
    }

    #[test]
    fn reads_csv_exports() {
        let csv = "\
Cliente,Proyecto,Fecha de Inicio,Equipo Dev
Acme,Launch,1-Mar-2026,Aplica
,,,
Acme,Review,1/5/2026,No Aplica
";
        let rows = rows_from_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        let ds = build_dataset(&rows);
        assert_eq!(ds.projects.len(), 2);
        assert_eq!(ds.projects[1].start_date, Some(date(2026, 5, 1)));
        assert_eq!(ds.teams, vec!["Dev"]);
    }

    #[test]
    fn reads_json_arrays_with_booleans() {
        let json = r#"[{"Cliente": "Acme", "Proyecto": "Launch", "Equipo Strategy": true}]"#;
        let rows = rows_from_json(json.as_bytes()).unwrap();
        let ds = build_dataset(&rows);
        assert_eq!(ds.projects[0].teams, vec!["Strategy"]);
    }

    #[test]
    fn json_that_is_not_an_array_is_an_error() {
        assert!(rows_from_json(r#"{"oops": 1}"#.as_bytes()).is_err());
    }
}
