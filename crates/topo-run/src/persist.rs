use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use topo_lib::io::write_graph_record;
use topo_lib::GraphCollection;

pub const SAVE_PROMPT: &str = "Save Graph Data? (y/n) : ";

/// `{method_id}_{dataset_type}_graph_topologies.json`
pub fn output_file_name(method_id: &str, dataset_type: &str) -> String {
    format!("{}_{}_graph_topologies.json", method_id, dataset_type)
}

/// Ask on `output` and read one line from `input`; only an exact `y` confirms.
pub fn confirm_save<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<bool> {
    output.write_all(SAVE_PROMPT.as_bytes())?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("reading save confirmation")?;
    let answer = line
        .strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(&line);
    Ok(answer == "y")
}

/// Write the collection under `dir`, creating it if needed; returns the file path.
pub fn save_graphs(
    dir: &Path,
    method_id: &str,
    dataset_type: &str,
    graphs: &GraphCollection,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(output_file_name(method_id, dataset_type));
    write_graph_record(&path, graphs)?;
    info!("Saved {} graphs to {}", graphs.len(), path.display());
    Ok(path)
}
