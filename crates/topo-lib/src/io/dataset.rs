use crate::signal::{Dataset, Matrix, Trial};
use anyhow::{anyhow, bail, Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// On-disk trial tensor: `X` is trials × channels × samples, `y` one label per trial.
#[derive(Debug, Deserialize)]
struct RawDataset {
    #[serde(rename = "X")]
    x: Vec<Vec<Vec<f64>>>,
    #[serde(rename = "y")]
    y: Vec<f64>,
}

/// One row of the long CSV layout `trial,label,channel,sample,value`.
#[derive(Debug, Deserialize)]
struct LongRow {
    trial: usize,
    label: f64,
    channel: usize,
    sample: usize,
    value: f64,
}

/// Load a trial dataset, choosing the parser from the file extension.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("json") => load_dataset_json(path),
        Some("csv") => load_dataset_csv(path),
        _ => Err(anyhow!(
            "unsupported dataset format for {} (expected .json or .csv)",
            path.display()
        )),
    }
}

pub fn load_dataset_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_dataset_json(&text).with_context(|| format!("invalid dataset {}", path.display()))
}

pub fn parse_dataset_json(text: &str) -> Result<Dataset> {
    let raw: RawDataset = serde_json::from_str(text).context("parsing dataset JSON")?;
    if raw.x.len() != raw.y.len() {
        bail!(
            "label count {} does not match trial count {}",
            raw.y.len(),
            raw.x.len()
        );
    }
    let mut trials = Vec::with_capacity(raw.x.len());
    for (idx, (rows, label)) in raw.x.into_iter().zip(raw.y).enumerate() {
        let signals =
            Matrix::from_rows(&rows).with_context(|| format!("trial {} is ragged", idx))?;
        trials.push(Trial {
            signals,
            label: integral_label(label).with_context(|| format!("trial {}", idx))?,
        });
    }
    check_uniform(&trials)?;
    Ok(Dataset { trials })
}

#[derive(Default)]
struct TrialCells {
    label: Option<i64>,
    cells: BTreeMap<(usize, usize), f64>,
}

pub fn load_dataset_csv(path: &Path) -> Result<Dataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut by_trial: BTreeMap<usize, TrialCells> = BTreeMap::new();
    for (line, result) in reader.deserialize::<LongRow>().enumerate() {
        // header is line 1
        let row = result.with_context(|| format!("{} line {}", path.display(), line + 2))?;
        let label = integral_label(row.label)
            .with_context(|| format!("{} line {}", path.display(), line + 2))?;
        let entry = by_trial.entry(row.trial).or_default();
        match entry.label {
            Some(existing) if existing != label => bail!(
                "trial {} has conflicting labels {} and {}",
                row.trial,
                existing,
                label
            ),
            _ => entry.label = Some(label),
        }
        if entry
            .cells
            .insert((row.channel, row.sample), row.value)
            .is_some()
        {
            bail!(
                "trial {} repeats channel {} sample {}",
                row.trial,
                row.channel,
                row.sample
            );
        }
    }

    let mut trials = Vec::with_capacity(by_trial.len());
    for (id, cells) in by_trial {
        let channels = cells.cells.keys().map(|(c, _)| c + 1).max().unwrap_or(0);
        let samples = cells.cells.keys().map(|(_, s)| s + 1).max().unwrap_or(0);
        if cells.cells.len() != channels * samples {
            bail!(
                "trial {} is incomplete: {} values for {} channels × {} samples",
                id,
                cells.cells.len(),
                channels,
                samples
            );
        }
        // BTreeMap order is channel-major, which is the row-major layout
        let data: Vec<f64> = cells.cells.into_values().collect();
        trials.push(Trial {
            signals: Matrix::from_vec(channels, samples, data)?,
            label: cells.label.unwrap_or_default(),
        });
    }
    check_uniform(&trials)?;
    Ok(Dataset { trials })
}

fn integral_label(value: f64) -> Result<i64> {
    if value.is_finite() && value.fract() == 0.0 {
        Ok(value as i64)
    } else {
        Err(anyhow!("label {} is not an integer", value))
    }
}

fn check_uniform(trials: &[Trial]) -> Result<()> {
    let Some(first) = trials.first() else {
        return Ok(());
    };
    let shape = first.signals.shape();
    for (idx, trial) in trials.iter().enumerate() {
        if trial.signals.shape() != shape {
            bail!(
                "trial {} has shape {:?}, expected {:?}",
                idx,
                trial.signals.shape(),
                shape
            );
        }
    }
    Ok(())
}
