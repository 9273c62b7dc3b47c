// Demo rows shown when neither the live sheet nor a fresh cache is available.
//
// They use the sheet's real headers and go through the same normalizer as
// live data.
use crate::columns::TEAM_COLUMNS;
use crate::types::RawRow;

type Text = (&'static str, &'static str, &'static str, &'static str, &'static str);
type Dates = (&'static str, &'static str, &'static str);

fn demo_row(text: Text, dates: Dates, flags: [&str; 8]) -> RawRow {
    let (client, project, kind, phase, tasks) = text;
    let (start, end, confirmed) = dates;
    let mut row = RawRow::new()
        .with("Cliente", client)
        .with("Proyecto", project)
        .with("Línea / Tipo", kind)
        .with("Fase", phase)
        .with("Tareas", tasks)
        .with("Fecha de Inicio", start)
        .with("Fecha Finalización", end)
        .with("Fecha confirmada", confirmed)
        .with("Link Click Up", "");
    for ((_, header), flag) in TEAM_COLUMNS.iter().zip(flags) {
        row.insert(*header, flag);
    }
    row
}

pub fn demo_rows() -> Vec<RawRow> {
    vec![
        demo_row(
            (
                "Google Public Sector",
                "Account Onboarding",
                "Always On",
                "Planning",
                "Onboarding inicial del cliente",
            ),
            ("1-Jan-2026", "31-Jan-2026", ""),
            ["Aplica", "Aplica", "No Aplica", "No Aplica",
             "No Aplica", "No Aplica", "No Aplica", "Aplica"],
        ),
        demo_row(
            (
                "Google Public Sector",
                "Strategy Approval",
                "Always On",
                "Planning",
                "Workshops de estrategia y aprobación",
            ),
            ("1-Feb-2026", "28-Feb-2026", ""),
            ["Aplica", "No Aplica", "No Aplica", "No Aplica",
             "No Aplica", "No Aplica", "No Aplica", "Aplica"],
        ),
        demo_row(
            (
                "Google Public Sector",
                "Channel Activation",
                "Always On",
                "Production",
                "Activación de contenido en canales",
            ),
            ("1-Mar-2026", "30-Jun-2026", ""),
            ["Aplica", "Aplica", "Aplica", "No Aplica",
             "No Aplica", "Aplica", "No Aplica", "No Aplica"],
        ),
        demo_row(
            (
                "Google Public Sector",
                "Google Next",
                "Evento",
                "Pre-production",
                "Preparación para evento Google Next",
            ),
            ("1-Mar-2026", "24-Apr-2026", "22-Apr-2026"),
            ["Aplica", "Aplica", "Aplica", "Aplica",
             "Aplica", "Aplica", "Aplica", "Aplica"],
        ),
        demo_row(
            (
                "Google Public Sector",
                "Public Sector Summit",
                "Evento",
                "Planning",
                "Summit de sector público",
            ),
            ("1-Aug-2026", "15-Oct-2026", "10-Oct-2026"),
            ["Aplica", "Aplica", "Aplica", "No Aplica",
             "Aplica", "Aplica", "Aplica", "Aplica"],
        ),
        demo_row(
            (
                "Localiza",
                "Campaña Mundial",
                "Campaña",
                "Production",
                "Campaña publicitaria mundial",
            ),
            ("15-Jan-2026", "28-Feb-2026", ""),
            ["Aplica", "Aplica", "Aplica", "No Aplica",
             "Aplica", "Aplica", "Aplica", "No Aplica"],
        ),
        demo_row(
            (
                "Localiza",
                "Semana Santa",
                "Campaña",
                "Pre-production",
                "Campaña Semana Santa",
            ),
            ("1-Mar-2026", "15-Apr-2026", "10-Apr-2026"),
            ["Aplica", "Aplica", "Aplica", "No Aplica",
             "No Aplica", "Aplica", "Aplica", "No Aplica"],
        ),
        demo_row(
            (
                "Localiza",
                "Tianguis Turístico",
                "Evento",
                "Planning",
                "Participación en Tianguis Turístico",
            ),
            ("1-May-2026", "30-May-2026", "25-May-2026"),
            ["No Aplica", "Aplica", "No Aplica", "No Aplica",
             "No Aplica", "Aplica", "Aplica", "Aplica"],
        ),
    ]
}
