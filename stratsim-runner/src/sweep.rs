//! Parameter sweep over a cartesian grid, run in parallel with rayon.

use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::config::RunConfig;
use crate::data_loader::{dataset_hash, load_data};
use crate::runner::{run_on_frame, RunError, RunReport};

/// Errors from parsing a grid axis such as `fast=5,10,20`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid axis '{0}' must look like name=v1,v2,...")]
    Malformed(String),
    #[error("grid axis '{0}' has no values")]
    EmptyAxis(String),
    #[error("grid axis '{axis}': '{value}' is not a finite number")]
    BadValue { axis: String, value: String },
    #[error("grid axis '{0}' given more than once")]
    DuplicateAxis(String),
}

/// Parameter grid specification.
///
/// Parameter name → values to try. Every combination is one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamGrid {
    axes: BTreeMap<String, Vec<f64>>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_axis(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.axes.insert(name.into(), values);
        self
    }

    /// Build a grid from CLI-style axis strings.
    pub fn parse<S: AsRef<str>>(axes: &[S]) -> Result<Self, GridError> {
        let mut grid = Self::new();
        for text in axes {
            let (name, values) = parse_axis(text.as_ref())?;
            if grid.axes.contains_key(&name) {
                return Err(GridError::DuplicateAxis(name));
            }
            grid.axes.insert(name, values);
        }
        Ok(grid)
    }

    pub fn axes(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.axes
    }

    /// Number of combinations before ordering filters.
    pub fn size(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes.values().map(Vec::len).product()
    }

    /// Generates all configurations in the grid.
    ///
    /// Grid values overwrite the base config's parameters. Combinations
    /// with `fast >= slow` are skipped.
    pub fn generate_configs(&self, base: &RunConfig) -> Vec<RunConfig> {
        let mut configs = vec![base.clone()];
        for (name, values) in &self.axes {
            configs = configs
                .iter()
                .flat_map(|config| {
                    values.iter().map(move |&v| {
                        let mut next = config.clone();
                        next.strategy.params.insert(name.clone(), v);
                        next
                    })
                })
                .collect();
        }

        configs.retain(|config| {
            let params = &config.strategy.params;
            match (params.get("fast"), params.get("slow")) {
                (Some(fast), Some(slow)) => fast < slow,
                _ => true,
            }
        });
        configs
    }
}

/// Parse one `name=v1,v2,...` axis.
pub fn parse_axis(text: &str) -> Result<(String, Vec<f64>), GridError> {
    let (name, rest) = text
        .split_once('=')
        .ok_or_else(|| GridError::Malformed(text.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(GridError::Malformed(text.to_string()));
    }

    let values = rest
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| match v.parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(x),
            _ => Err(GridError::BadValue {
                axis: name.to_string(),
                value: v.to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.is_empty() {
        return Err(GridError::EmptyAxis(name.to_string()));
    }
    Ok((name.to_string(), values))
}

/// Parameter sweep executor.
///
/// Loads the base config's data once and runs every grid point against it.
#[derive(Debug, Clone, Copy)]
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn sweep(&self, grid: &ParamGrid, base: &RunConfig) -> Result<SweepResults, RunError> {
        let frame = load_data(&base.data)?;
        let hash = dataset_hash(&frame);
        let configs = grid.generate_configs(base);
        tracing::info!(points = configs.len(), parallel = self.parallel, "starting sweep");

        let reports: Vec<RunReport> = if self.parallel {
            configs
                .par_iter()
                .map(|config| run_on_frame(config, &frame, &hash))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            configs
                .iter()
                .map(|config| run_on_frame(config, &frame, &hash))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(SweepResults::new(reports))
    }
}

/// Sweep reports, best total return first.
///
/// Ties break on run id, so the order never depends on thread scheduling.
#[derive(Debug)]
pub struct SweepResults {
    reports: Vec<RunReport>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(mut reports: Vec<RunReport>) -> Self {
        reports.sort_by(|a, b| {
            b.total_return()
                .total_cmp(&a.total_return())
                .then_with(|| a.run_id.cmp(&b.run_id))
        });
        let by_run_id = reports
            .iter()
            .enumerate()
            .map(|(i, r)| (r.run_id.clone(), i))
            .collect();
        Self { reports, by_run_id }
    }

    pub fn all(&self) -> &[RunReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn get(&self, run_id: &str) -> Option<&RunReport> {
        self.by_run_id.get(run_id).map(|&i| &self.reports[i])
    }

    pub fn top_n(&self, n: usize) -> &[RunReport] {
        &self.reports[..n.min(self.reports.len())]
    }

    pub fn best(&self) -> Option<&RunReport> {
        self.reports.first()
    }
}
