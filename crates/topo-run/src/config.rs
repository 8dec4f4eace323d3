use crate::method::Method;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use topo_lib::Tsne;

/// Everything one run needs, read once from TOML and then patched by CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub dataset: PathBuf,
    #[serde(default = "default_class_labels")]
    pub class_labels: Vec<String>,
    #[serde(default = "default_dataset_type")]
    pub dataset_type: String,
    #[serde(default = "default_graph_data_dir")]
    pub graph_data_dir: PathBuf,
    /// Leading channels kept from every trial.
    #[serde(default = "default_channels")]
    pub channels: usize,
    #[serde(default)]
    pub save: bool,
    /// Overrides the method's default min-max rescaling.
    #[serde(default)]
    pub rescale: Option<bool>,
    pub method: Method,
    #[serde(default)]
    pub visualize: VisualizeConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizeConfig {
    #[serde(default)]
    pub learnt_graphs: bool,
    #[serde(default = "default_true")]
    pub latent_space: bool,
    #[serde(default = "default_plot_dir")]
    pub plot_dir: PathBuf,
}

impl Default for VisualizeConfig {
    fn default() -> Self {
        Self {
            learnt_graphs: false,
            latent_space: true,
            plot_dir: default_plot_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_perplexity")]
    pub perplexity: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_n_iter")]
    pub n_iter: usize,
    #[serde(default)]
    pub seed: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            perplexity: default_perplexity(),
            learning_rate: default_learning_rate(),
            n_iter: default_n_iter(),
            seed: 0,
        }
    }
}

impl EmbeddingConfig {
    pub fn tsne(&self) -> Tsne {
        Tsne::new()
            .with_perplexity(self.perplexity)
            .with_learning_rate(self.learning_rate)
            .with_n_iter(self.n_iter)
            .with_seed(self.seed)
    }
}

impl RunConfig {
    /// Rescaling actually applied: the explicit setting, else the method default.
    pub fn rescale_enabled(&self) -> bool {
        self.rescale
            .unwrap_or_else(|| self.method.rescales_by_default())
    }
}

fn default_class_labels() -> Vec<String> {
    ["Middle_Flexion", "Ring_Flexion", "Hand_Closure", "V_Flexion", "Pointer"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_dataset_type() -> String {
    "train".into()
}

fn default_graph_data_dir() -> PathBuf {
    PathBuf::from("graph_data")
}

fn default_channels() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_plot_dir() -> PathBuf {
    PathBuf::from("plots")
}

fn default_perplexity() -> f64 {
    60.0
}

fn default_learning_rate() -> f64 {
    200.0
}

fn default_n_iter() -> usize {
    1000
}

pub fn parse_config(text: &str) -> Result<RunConfig> {
    let config: RunConfig = toml::from_str(text).context("parsing run configuration")?;
    Ok(config)
}

pub fn read_config(path: &Path) -> Result<RunConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: RunConfig =
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}
