// Header alias table and the column resolver.
//
// Sheet headers drift (accents, language, abbreviations), so every logical
// field is looked up through a declared list of aliases instead of a single
// literal key.
use crate::types::RawRow;
use serde_json::Value;

/// Team flag columns in their fixed scan order: (team name, header).
pub const TEAM_COLUMNS: [(&str, &str); 8] = [
    ("Content", "Equipo Content"),
    ("Diseño", "Equipo Diseño"),
    ("Video", "Equipo Video"),
    ("Dev", "Equipo Dev"),
    ("Traducciones", "Equipo Traducciones"),
    ("Social Media", "Equipo Social Media"),
    ("Field Marketing", "Equipo Field Marketing"),
    ("Strategy", "Equipo Strategy"),
];

/// Marker meaning "this team is assigned" in a flag column.
pub const AFFIRMATIVE_MARKER: &str = "aplica";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamColumn {
    pub team: String,
    pub aliases: Vec<String>,
}

/// Aliases per logical field, tried in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAliases {
    pub client: Vec<String>,
    pub name: Vec<String>,
    pub kind: Vec<String>,
    pub phase: Vec<String>,
    pub tasks: Vec<String>,
    pub start_date: Vec<String>,
    pub end_date: Vec<String>,
    pub confirmed_date: Vec<String>,
    pub external_link: Vec<String>,
    pub teams: Vec<TeamColumn>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for FieldAliases {
    fn default() -> Self {
        FieldAliases {
            client: owned(&["Cliente", "Client", "cliente"]),
            name: owned(&["Proyecto", "Project", "proyecto", "Nombre"]),
            kind: owned(&["Línea / Tipo", "Linea / Tipo", "Tipo", "Type"]),
            phase: owned(&["Fase", "Phase", "Etapa"]),
            tasks: owned(&["Tareas", "Tasks", "Descripción"]),
            start_date: owned(&["Fecha de Inicio", "Fecha Inicio", "Start Date", "Inicio"]),
            end_date: owned(&[
                "Fecha Finalización",
                "Fecha Finalizacion",
                "Fecha de Fin",
                "End Date",
            ]),
            confirmed_date: owned(&["Fecha confirmada", "Fecha Confirmada", "Confirmed Date"]),
            external_link: owned(&["Link Click Up", "Link ClickUp", "ClickUp", "Link"]),
            teams: TEAM_COLUMNS
                .iter()
                .map(|(team, header)| TeamColumn {
                    team: team.to_string(),
                    aliases: vec![header.to_string(), format!("Team {}", team)],
                })
                .collect(),
        }
    }
}

/// Render a cell as trimmed text. Null is empty; integral numbers drop the
/// fractional part the way a sheet displays them.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// First non-empty value for any alias.
///
/// Exact keys are tried first, in alias order. Only if none of them hits,
/// each alias is matched as a case-insensitive substring of the row keys.
pub fn resolve<S: AsRef<str>>(row: &RawRow, aliases: &[S]) -> String {
    resolve_value(row, aliases)
        .map(cell_text)
        .unwrap_or_default()
}

/// Same lookup as [`resolve`] but returns the raw cell, so callers can
/// inspect booleans.
pub fn resolve_value<'a, S: AsRef<str>>(row: &'a RawRow, aliases: &[S]) -> Option<&'a Value> {
    let exact = aliases.iter().find_map(|alias| {
        row.get(alias.as_ref())
            .filter(|v| !cell_text(v).is_empty())
    });
    if exact.is_some() {
        return exact;
    }
    aliases.iter().find_map(|alias| {
        let needle = alias.as_ref().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        row.iter()
            .filter(|(key, _)| key.to_lowercase().contains(&needle))
            .map(|(_, v)| v)
            .find(|v| !cell_text(v).is_empty())
    })
}

/// Whether a team flag cell marks the team as assigned.
pub fn is_affirmative(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case(AFFIRMATIVE_MARKER) || s.eq_ignore_ascii_case("true")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exact_pass_skips_missing_aliases() {
        let row = RawRow::new().with("Línea / Tipo", "Evento");
        assert_eq!(resolve(&row, &["Tipo", "Línea / Tipo"]), "Evento");
    }

    #[test]
    fn exact_pass_wins_over_substring() {
        let row = RawRow::new()
            .with("Cliente anterior", "Old Co")
            .with("Client", "New Co");
        assert_eq!(resolve(&row, &["Cliente", "Client"]), "New Co");
    }

    #[test]
    fn empty_exact_value_falls_through() {
        let row = RawRow::new().with("Cliente", "  ").with("Client", "Acme");
        assert_eq!(resolve(&row, &["Cliente", "Client"]), "Acme");
    }

    #[test]
    fn substring_pass_is_case_insensitive() {
        let row = RawRow::new()
            .with("Nombre", "x")
            .with("FASE DEL PROYECTO", "Planning");
        assert_eq!(resolve(&row, &["Fase", "Phase"]), "Planning");
    }

    #[test]
    fn substring_pass_follows_row_key_order() {
        let row = RawRow::new()
            .with("Tipo (viejo)", "")
            .with("Tipo actual", "Campaña")
            .with("Otro Tipo", "Evento");
        assert_eq!(resolve(&row, &["tipo"]), "Campaña");
    }

    #[test]
    fn nothing_matches_yields_empty() {
        let row = RawRow::new().with("Foo", "bar");
        assert_eq!(resolve(&row, &["Cliente"]), "");
        assert_eq!(resolve::<&str>(&row, &[]), "");
    }

    #[test]
    fn cells_render_as_text() {
        assert_eq!(cell_text(&json!(2026)), "2026");
        assert_eq!(cell_text(&json!(1.5)), "1.5");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&json!(null)), "");
        assert_eq!(cell_text(&json!("  padded ")), "padded");
    }

    #[test]
    fn affirmative_markers() {
        assert!(is_affirmative(&json!("Aplica")));
        assert!(is_affirmative(&json!("APLICA")));
        assert!(is_affirmative(&json!("TRUE")));
        assert!(is_affirmative(&json!(true)));
        assert!(!is_affirmative(&json!("No Aplica")));
        assert!(!is_affirmative(&json!(false)));
        assert!(!is_affirmative(&json!("")));
        assert!(!is_affirmative(&json!(1)));
    }

    #[test]
    fn default_table_declares_every_team_in_order() {
        let aliases = FieldAliases::default();
        let teams: Vec<&str> = aliases.teams.iter().map(|t| t.team.as_str()).collect();
        assert_eq!(
            teams,
            vec![
                "Content",
                "Diseño",
                "Video",
                "Dev",
                "Traducciones",
                "Social Media",
                "Field Marketing",
                "Strategy"
            ]
        );
    }
}
