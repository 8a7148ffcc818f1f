//! Rscript engine - runs the BOIN R package in a subprocess.
//!
//! Each call spawns `Rscript --vanilla -e <code>`. The generated code loads
//! the package, calls one function and prints tagged, tab-separated lines
//! that this adapter parses:
//!
//! ```text
//! lambda  0.236   0.359
//! row     3       0       2       3
//! selection       0.1     11.2    52.3
//! mtd     3
//! ```
//!
//! Text rendering happens in Rust, so the output never depends on R's
//! print formatting. Time limits are applied by the caller; the child is
//! killed when the call future is dropped.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use crate::domain::boin::{
    BoundaryRequest, BoundaryRow, BoundaryTable, DecisionThresholds, MtdSelection,
    MtdSelectionRequest, OperatingCharacteristics, OperatingCharacteristicsRequest,
};
use crate::ports::{EngineError, StatisticsEngine};

/// Runs BOIN functions through `Rscript`.
#[derive(Debug, Clone)]
pub struct RscriptEngine {
    rscript_path: String,
}

impl Default for RscriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RscriptEngine {
    pub fn new() -> Self {
        Self {
            rscript_path: "Rscript".to_string(),
        }
    }

    /// Sets the interpreter executable.
    pub fn with_rscript_path(mut self, path: impl Into<String>) -> Self {
        self.rscript_path = path.into();
        self
    }

    pub fn rscript_path(&self) -> &str {
        &self.rscript_path
    }

    /// Check that the interpreter can be started.
    pub async fn is_available(&self) -> bool {
        let output = Command::new(&self.rscript_path)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await;

        output.map(|o| o.status.success()).unwrap_or(false)
    }

    /// Runs R code and returns its stdout.
    async fn run(&self, code: &str) -> Result<String, EngineError> {
        let output = Command::new(&self.rscript_path)
            .args(["--vanilla", "-e", code])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                EngineError::spawn(format!("could not run '{}': {}", self.rscript_path, e))
            })?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        match output.status.code() {
            Some(code) => Err(EngineError::failed(format!(
                "exit status {}: {}",
                code,
                last_lines(&stderr, 5)
            ))),
            None => Err(EngineError::crashed(format!(
                "terminated by signal: {}",
                last_lines(&stderr, 5)
            ))),
        }
    }
}

#[async_trait]
impl StatisticsEngine for RscriptEngine {
    async fn boundary_table(&self, request: &BoundaryRequest) -> Result<BoundaryTable, EngineError> {
        let stdout = self.run(&boundary_code(request)).await?;
        parse_boundary_output(&stdout)
    }

    async fn operating_characteristics(
        &self,
        request: &OperatingCharacteristicsRequest,
    ) -> Result<OperatingCharacteristics, EngineError> {
        let stdout = self.run(&oc_code(request)).await?;
        parse_oc_output(&stdout)
    }

    async fn select_mtd(&self, request: &MtdSelectionRequest) -> Result<MtdSelection, EngineError> {
        let stdout = self.run(&mtd_code(request)).await?;
        parse_mtd_output(&stdout)
    }

    fn name(&self) -> &str {
        "rscript"
    }
}

// ============================================================================
// R code
// ============================================================================

const PRELUDE: &str = r#"suppressMessages(library(BOIN))
pick <- function(x, alt) if (is.null(x)) alt else x
emit <- function(tag, ...) { cat(tag, ..., sep = "\t"); cat("\n") }
"#;

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn boundary_code(request: &BoundaryRequest) -> String {
    format!(
        r#"{PRELUDE}b <- get.boundary(target = {target}, ncohort = {ncohort}, cohortsize = {cohortsize})
tab <- pick(b$boundary_tab, b$boundary.tab)
emit("lambda", pick(b$lambda_e, NA), pick(b$lambda_d, NA))
for (j in seq_len(ncol(tab))) emit("row", tab[1, j], tab[2, j], tab[3, j], tab[4, j])
"#,
        target = request.target,
        ncohort = request.cohort_count,
        cohortsize = request.cohort_size,
    )
}

pub(crate) fn oc_code(request: &OperatingCharacteristicsRequest) -> String {
    format!(
        r#"{PRELUDE}oc <- get.oc(target = {target}, p.true = c({ptrue}), ncohort = {ncohort}, cohortsize = {cohortsize})
share <- function(x) if (sum(x) > 0) 100 * x / sum(x) else 0 * x
emit("selection", pick(oc$MTD.select.percent, oc$selpercent))
emit("patients", pick(oc$n.pat.percent, share(oc$npatients)))
emit("toxicity", pick(oc$tox.percent, share(oc$ntox)))
"#,
        target = request.target,
        ptrue = join(&request.true_probabilities),
        ncohort = request.cohort_count,
        cohortsize = request.cohort_size,
    )
}

pub(crate) fn mtd_code(request: &MtdSelectionRequest) -> String {
    format!(
        r#"{PRELUDE}res <- select.mtd(target = {target}, ntox = c({ntox}), npts = c({npts}))
emit("mtd", pick(res$MTD, res$d_selected))
"#,
        target = request.target,
        ntox = join(&request.toxicity_counts),
        npts = join(&request.patient_counts),
    )
}

// ============================================================================
// Output parsing
// ============================================================================

/// Yields the fields of every line carrying `tag`.
fn tagged<'a>(stdout: &'a str, tag: &'a str) -> impl Iterator<Item = Vec<&'a str>> + 'a {
    stdout.lines().filter_map(move |line| {
        let mut fields = line.trim_end().split('\t');
        (fields.next() == Some(tag)).then(|| fields.map(str::trim).collect())
    })
}

fn parse_count(field: &str) -> Result<u32, EngineError> {
    field
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
        .map(|v| v as u32)
        .ok_or_else(|| EngineError::output(format!("expected a count, got '{}'", field)))
}

fn parse_optional_count(field: &str) -> Result<Option<u32>, EngineError> {
    if field == "NA" {
        Ok(None)
    } else {
        parse_count(field).map(Some)
    }
}

fn parse_number(field: &str) -> Result<f64, EngineError> {
    field
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EngineError::output(format!("expected a number, got '{}'", field)))
}

pub(crate) fn parse_boundary_output(stdout: &str) -> Result<BoundaryTable, EngineError> {
    let rows = tagged(stdout, "row")
        .map(|fields| match fields.as_slice() {
            [n, e, d, elim] => Ok(BoundaryRow {
                patients_treated: parse_count(n)?,
                escalate_at_most: parse_count(e)?,
                deescalate_at_least: parse_count(d)?,
                eliminate_at_least: parse_optional_count(elim)?,
            }),
            other => Err(EngineError::output(format!(
                "boundary row has {} fields, expected 4",
                other.len()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if rows.is_empty() {
        return Err(EngineError::output("no boundary rows in engine output"));
    }

    let table = BoundaryTable::new(rows);
    let thresholds = tagged(stdout, "lambda").next().and_then(|fields| match fields.as_slice() {
        [e, d] => Some(DecisionThresholds {
            escalation: parse_number(e).ok()?,
            deescalation: parse_number(d).ok()?,
        }),
        _ => None,
    });

    Ok(match thresholds {
        Some(t) => table.with_thresholds(t),
        None => table,
    })
}

fn parse_vector(stdout: &str, tag: &str) -> Result<Vec<f64>, EngineError> {
    let fields = tagged(stdout, tag)
        .next()
        .ok_or_else(|| EngineError::output(format!("missing '{}' line in engine output", tag)))?;
    fields.iter().map(|f| parse_number(f)).collect()
}

pub(crate) fn parse_oc_output(stdout: &str) -> Result<OperatingCharacteristics, EngineError> {
    let oc = OperatingCharacteristics {
        selection_percent: parse_vector(stdout, "selection")?,
        patients_percent: parse_vector(stdout, "patients")?,
        toxicity_percent: parse_vector(stdout, "toxicity")?,
    };

    let len = oc.selection_percent.len();
    if len == 0 || oc.patients_percent.len() != len || oc.toxicity_percent.len() != len {
        return Err(EngineError::output(format!(
            "operating characteristics vectors disagree: {}, {}, {}",
            len,
            oc.patients_percent.len(),
            oc.toxicity_percent.len()
        )));
    }
    Ok(oc)
}

pub(crate) fn parse_mtd_output(stdout: &str) -> Result<MtdSelection, EngineError> {
    let fields = tagged(stdout, "mtd")
        .next()
        .ok_or_else(|| EngineError::output("missing 'mtd' line in engine output"))?;
    match fields.as_slice() {
        [level] => Ok(MtdSelection::from_engine_level(parse_count(level)?)),
        other => Err(EngineError::output(format!(
            "mtd line has {} fields, expected 1",
            other.len()
        ))),
    }
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    lines[lines.len().saturating_sub(n)..].join(" | ")
}
