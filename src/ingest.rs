// Ingestion: fetch raw rows from a source, fall back to cache or demo data,
// and swap in a freshly built dataset.
use crate::cache::RowCache;
use crate::columns::cell_text;
use crate::config::{Config, SourceConfig};
use crate::error::IngestError;
use crate::fallback::demo_rows;
use crate::loader::{load_rows, LoadReport, RowNormalizer};
use crate::types::{Dataset, RawRow};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Anything that can hand over a batch of raw rows.
pub trait RowSource: Send + Sync {
    fn describe(&self) -> String;
    fn fetch(&self) -> Result<Vec<RawRow>, IngestError>;
}

/// A local `.csv` or `.json` export.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }
}

impl RowSource for FileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    fn fetch(&self) -> Result<Vec<RawRow>, IngestError> {
        load_rows(&self.path)
    }
}

pub struct DemoSource;

impl RowSource for DemoSource {
    fn describe(&self) -> String {
        "demo rows".to_string()
    }

    fn fetch(&self) -> Result<Vec<RawRow>, IngestError> {
        Ok(demo_rows())
    }
}

/// A published spreadsheet read through its JSON query endpoint.
pub struct SheetSource {
    sheet_id: String,
    timeout: Duration,
}

pub fn sheet_url(sheet_id: &str) -> String {
    format!(
        "https://docs.google.com/spreadsheets/d/{}/gviz/tq?tqx=out:json",
        sheet_id
    )
}

impl SheetSource {
    pub fn new(sheet_id: impl Into<String>, timeout: Duration) -> Self {
        SheetSource {
            sheet_id: sheet_id.into(),
            timeout,
        }
    }
}

impl RowSource for SheetSource {
    fn describe(&self) -> String {
        format!("sheet {}", self.sheet_id)
    }

    fn fetch(&self) -> Result<Vec<RawRow>, IngestError> {
        if self.sheet_id.trim().is_empty() {
            return Err(IngestError::Transport("no sheet id configured".to_string()));
        }
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let body = match agent.get(&sheet_url(&self.sheet_id)).call() {
            Ok(resp) => resp.into_string()?,
            Err(ureq::Error::Status(code, _)) => return Err(IngestError::Status(code)),
            Err(e) => return Err(IngestError::Transport(e.to_string())),
        };
        parse_sheet_response(&body)
    }
}

/// Strip the callback wrapper around the query response and convert its
/// table into raw rows.
pub fn parse_sheet_response(body: &str) -> Result<Vec<RawRow>, IngestError> {
    let (Some(open), Some(close)) = (body.find('{'), body.rfind('}')) else {
        return Err(IngestError::MalformedResponse("no JSON object in response".to_string()));
    };
    if close < open {
        return Err(IngestError::MalformedResponse("no JSON object in response".to_string()));
    }
    let value: Value = serde_json::from_str(&body[open..=close])?;
    if value.get("status").and_then(Value::as_str) == Some("error") {
        let detail = value
            .pointer("/errors/0/detailed_message")
            .or_else(|| value.pointer("/errors/0/message"))
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(IngestError::MalformedResponse(format!("sheet query failed: {}", detail)));
    }
    let table = value
        .get("table")
        .ok_or_else(|| IngestError::MalformedResponse("missing table".to_string()))?;
    rows_from_sheet_table(table)
}

/// Convert a query-response table (`cols` + `rows[].c[]`) into raw rows
/// keyed by column label.
pub fn rows_from_sheet_table(table: &Value) -> Result<Vec<RawRow>, IngestError> {
    let headers: Vec<String> = table
        .get("cols")
        .and_then(Value::as_array)
        .ok_or_else(|| IngestError::MalformedResponse("missing table.cols".to_string()))?
        .iter()
        .map(|col| col.get("label").map(cell_text).unwrap_or_default())
        .collect();
    let rows = table
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| IngestError::MalformedResponse("missing table.rows".to_string()))?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(cells) = row.get("c").and_then(Value::as_array) else {
            continue;
        };
        let mut raw = RawRow::new();
        for (header, cell) in headers.iter().zip(cells) {
            if header.is_empty() {
                continue;
            }
            raw.insert(header.clone(), sheet_cell_value(cell));
        }
        out.push(raw);
    }
    Ok(out)
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}

/// A cell is `{ v, f }`: raw value and formatted text. Dates come as
/// `Date(y,m,d)` in `v`, where the formatted text is preferred.
fn sheet_cell_value(cell: &Value) -> Value {
    if cell.is_null() {
        return Value::String(String::new());
    }
    let v = cell.get("v").filter(|v| !v.is_null());
    let f = cell.get("f").filter(|f| is_truthy(f));
    match v {
        Some(Value::String(s)) if s.starts_with("Date(") => {
            f.cloned().unwrap_or_else(|| Value::String(s.clone()))
        }
        Some(v) => v.clone(),
        None => f.cloned().unwrap_or_else(|| Value::String(String::new())),
    }
}

pub fn source_from_config(config: &Config) -> Arc<dyn RowSource> {
    match &config.source {
        SourceConfig::Sheet { sheet_id } => {
            Arc::new(SheetSource::new(sheet_id.clone(), config.fetch_timeout()))
        }
        SourceConfig::Csv { path } | SourceConfig::Json { path } => {
            Arc::new(FileSource::new(path.clone()))
        }
        SourceConfig::Demo => Arc::new(DemoSource),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Live,
    Cache,
    Demo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Loaded {
        origin: DataOrigin,
        report: LoadReport,
        /// User-facing explanation when the data is not live.
        notice: Option<String>,
    },
    /// Another ingestion was still running; the current dataset is kept.
    Skipped,
}

impl IngestOutcome {
    pub fn origin(&self) -> Option<DataOrigin> {
        match self {
            IngestOutcome::Loaded { origin, .. } => Some(*origin),
            IngestOutcome::Skipped => None,
        }
    }

    pub fn notice(&self) -> Option<&str> {
        match self {
            IngestOutcome::Loaded { notice, .. } => notice.as_deref(),
            IngestOutcome::Skipped => None,
        }
    }
}

/// Clears the in-flight flag when the fetch worker finishes or panics.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Explicit application context: the current dataset plus everything needed
/// to refresh it.
pub struct Session {
    source: Arc<dyn RowSource>,
    cache: RowCache,
    timeout: Duration,
    normalizer: RowNormalizer,
    dataset: Arc<Dataset>,
    in_flight: Arc<AtomicBool>,
}

impl Session {
    pub fn new(source: Arc<dyn RowSource>, cache: RowCache, timeout: Duration) -> Self {
        Session {
            source,
            cache,
            timeout,
            normalizer: RowNormalizer::default(),
            dataset: Arc::new(Dataset::empty()),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let cache = RowCache::new(&config.cache_dir, &config.cache_key, config.cache_ttl());
        Session::new(source_from_config(config), cache, config.fetch_timeout())
    }

    pub fn with_normalizer(mut self, normalizer: RowNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// The current dataset. Callers keep a consistent snapshot even if a
    /// refresh replaces it meanwhile.
    pub fn dataset(&self) -> Arc<Dataset> {
        Arc::clone(&self.dataset)
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    fn install(&mut self, rows: &[RawRow]) -> LoadReport {
        let (dataset, report) = self.normalizer.build(rows);
        self.dataset = Arc::new(dataset);
        report
    }

    /// Build the dataset from a fresh cache entry, if there is one.
    pub fn warm_from_cache(&mut self) -> Option<LoadReport> {
        let rows = self.cache.load().filter(|rows| !rows.is_empty())?;
        info!("Loading from cache...");
        Some(self.install(&rows))
    }

    /// Show cached data right away, then fetch live data. `on_update` sees
    /// the warm cache load (if any) and then the fetch outcome.
    pub fn start<F>(&mut self, mut on_update: F)
    where
        F: FnMut(&IngestOutcome, &Dataset),
    {
        if let Some(report) = self.warm_from_cache() {
            let warm = IngestOutcome::Loaded {
                origin: DataOrigin::Cache,
                report,
                notice: None,
            };
            on_update(&warm, &*self.dataset);
        }
        let outcome = self.ingest();
        on_update(&outcome, &*self.dataset);
    }

    /// Fetch from the source with a timeout. Failures fall back to a fresh
    /// cache entry, then to the demo rows. Never fails.
    pub fn ingest(&mut self) -> IngestOutcome {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            info!("previous ingestion still running, skipping");
            return IngestOutcome::Skipped;
        }
        let guard = InFlight(Arc::clone(&self.in_flight));
        let source = Arc::clone(&self.source);
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("row-fetch".to_string())
            .spawn(move || {
                let result = source.fetch();
                drop(guard);
                // The receiver is gone if we already timed out.
                let _ = tx.send(result);
            });
        if let Err(e) = spawned {
            // The closure (and its guard) was dropped, clearing the flag.
            return self.fall_back(IngestError::Io(e));
        }

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(rows)) => {
                info!(rows = rows.len(), source = %self.source.describe(), "Data loaded from source");
                self.cache.save(&rows);
                let report = self.install(&rows);
                IngestOutcome::Loaded {
                    origin: DataOrigin::Live,
                    report,
                    notice: None,
                }
            }
            Ok(Err(e)) => self.fall_back(e),
            Err(RecvTimeoutError::Timeout) => {
                warn!("Request timeout, using fallback data");
                self.fall_back(IngestError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => self.fall_back(IngestError::Disconnected),
        }
    }

    fn fall_back(&mut self, error: IngestError) -> IngestOutcome {
        warn!("ingestion failed: {}", error);
        if let Some(rows) = self.cache.load().filter(|rows| !rows.is_empty()) {
            let report = self.install(&rows);
            return IngestOutcome::Loaded {
                origin: DataOrigin::Cache,
                report,
                notice: Some(format!(
                    "Could not refresh data ({}); using cached data.",
                    error
                )),
            };
        }
        info!("Loading fallback demo data...");
        let report = self.install(&demo_rows());
        IngestOutcome::Loaded {
            origin: DataOrigin::Demo,
            report,
            notice: Some(format!(
                "Using demo data ({}). For live data, make sure the sheet is shared publicly.",
                error
            )),
        }
    }

    /// Re-ingest on a fixed interval. Each round waits for the previous one,
    /// so rounds never overlap. `cycles = None` runs forever.
    pub fn watch<F>(&mut self, interval: Duration, cycles: Option<usize>, mut on_update: F)
    where
        F: FnMut(&IngestOutcome, &Dataset),
    {
        let mut done = 0usize;
        loop {
            let outcome = self.ingest();
            let dataset = self.dataset();
            on_update(&outcome, &dataset);
            done += 1;
            if cycles.is_some_and(|n| done >= n) {
                break;
            }
            thread::sleep(interval);
        }
    }
}
