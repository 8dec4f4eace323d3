use crate::config::{EmbeddingConfig, RunConfig};
use crate::method::Method;
use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;
use topo_lib::{prune_small_edges, rescale_mcw, Dataset, GraphCollection, Matrix};

/// Machine-readable outcome of a `learn` run, printed as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub method: String,
    pub trials: usize,
    pub graph_shape: [usize; 3],
    pub rescaled: bool,
    pub embedded: bool,
    pub saved: Option<PathBuf>,
    pub latent_csv: Option<PathBuf>,
}

impl RunSummary {
    pub fn new(config: &RunConfig, graphs: &GraphCollection) -> Self {
        let (n, r, c) = graphs.shape();
        Self {
            method: config.method.id().to_string(),
            trials: n,
            graph_shape: [n, r, c],
            rescaled: config.rescale_enabled(),
            embedded: false,
            saved: None,
            latent_csv: None,
        }
    }
}

/// Run the configured method over every trial, in order.
///
/// `on_graph(i, w, label)` is called for each learnt graph before it is
/// accumulated; it is not called for the raw-window modes.
pub fn learn_graphs<F>(config: &RunConfig, dataset: &Dataset, mut on_graph: F) -> Result<GraphCollection>
where
    F: FnMut(usize, &Matrix, i64) -> Result<()>,
{
    let method = &config.method;
    info!("Method : {}", method.id());
    let rescale = config.rescale_enabled();

    let trials = match method {
        Method::TmaMaps => dataset.clone(),
        _ => dataset
            .select_channels(config.channels)
            .context("selecting channels")?,
    };
    let prepare = |x: &Matrix| if rescale { rescale_mcw(x) } else { x.clone() };

    let Some(learner) = method.learner() else {
        let shape = trials
            .trial_shape()
            .unwrap_or((config.channels, 0));
        let mut graphs = GraphCollection::new(shape);
        for (i, trial) in trials.trials.iter().enumerate() {
            graphs
                .push(prepare(&trial.signals), trial.label)
                .with_context(|| format!("trial {}", i + 1))?;
        }
        return Ok(graphs);
    };

    let mut graphs = GraphCollection::new((config.channels, config.channels));
    for (i, trial) in trials.trials.iter().enumerate() {
        let x = prepare(&trial.signals);
        let mut w = learner
            .find_graph(&x)
            .with_context(|| format!("learning graph for trial {}", i + 1))?;
        if method.prunes() {
            prune_small_edges(&mut w);
        }
        on_graph(i, &w, trial.label)?;
        graphs
            .push(w, trial.label)
            .with_context(|| format!("trial {}", i + 1))?;
        info!("Graph {} : Completed!", i + 1);
    }
    Ok(graphs)
}

/// Jointly embed the flattened graphs in 2-D; `None` when there is nothing to embed.
pub fn embed_graphs(graphs: &GraphCollection, config: &EmbeddingConfig) -> Result<Option<Matrix>> {
    if graphs.is_empty() {
        warn!("no graphs learnt; skipping latent-space embedding");
        return Ok(None);
    }
    let tsne = config.tsne();
    let coords = tsne
        .fit_transform(&graphs.flatten())
        .context("computing t-SNE embedding")?;
    info!(
        "Embedded {} graphs in the latent space (perplexity {})",
        graphs.len(),
        tsne.perplexity()
    );
    Ok(Some(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use topo_lib::{GraphError, Trial};

    fn dataset(trials: usize, channels: usize, samples: usize) -> Dataset {
        let trials = (0..trials)
            .map(|k| {
                let mut m = Matrix::zeros(channels, samples);
                for c in 0..channels {
                    for t in 0..samples {
                        let phase = t as f64 * 0.35 + k as f64;
                        let v = (phase + (c / 2) as f64 * 0.4).sin() + 0.05 * ((c * 7 + t * 3) % 5) as f64;
                        m.set(c, t, v);
                    }
                }
                Trial {
                    signals: m,
                    label: (k % 3) as i64,
                }
            })
            .collect();
        Dataset { trials }
    }

    fn config(method: &str, extra: &str) -> RunConfig {
        parse_config(&format!(
            "dataset = \"unused.json\"\n{}\n[method]\n{}",
            extra, method
        ))
        .unwrap()
    }

    #[test]
    fn correlation_run_yields_one_graph_per_trial() {
        let cfg = config("kind = \"correlation\"\nalpha = 0.05", "");
        let ds = dataset(3, 10, 40);
        let mut seen = Vec::new();
        let graphs = learn_graphs(&cfg, &ds, |i, w, label| {
            assert_eq!(w.shape(), (8, 8));
            seen.push((i, label));
            Ok(())
        })
        .unwrap();
        assert_eq!(graphs.shape(), (3, 8, 8));
        assert_eq!(graphs.labels(), &[0, 1, 2]);
        assert_eq!(seen, vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn empty_dataset_gives_empty_collection() {
        let cfg = config("kind = \"correlation\"\nalpha = 0.05", "");
        let graphs = learn_graphs(&cfg, &Dataset::default(), |_, _, _| Ok(())).unwrap();
        assert!(graphs.is_empty());
        assert_eq!(graphs.shape(), (0, 8, 8));
        assert!(embed_graphs(&graphs, &cfg.embedding).unwrap().is_none());
    }

    #[test]
    fn raw_windows_keep_selected_channels() {
        let cfg = config("kind = \"raw_windows\"", "channels = 4");
        let ds = dataset(2, 6, 20);
        let graphs = learn_graphs(&cfg, &ds, |_, _, _| panic!("no learner")).unwrap();
        assert_eq!(graphs.shape(), (2, 4, 20));
        assert_eq!(graphs.items()[1].row(3), ds.trials[1].signals.row(3));
    }

    #[test]
    fn tma_maps_keep_every_channel() {
        let cfg = config("kind = \"tma_maps\"", "");
        let graphs = learn_graphs(&cfg, &dataset(2, 12, 20), |_, _, _| Ok(())).unwrap();
        assert_eq!(graphs.shape(), (2, 12, 20));
    }

    #[test]
    fn too_few_channels_is_fatal() {
        let cfg = config("kind = \"correlation\"\nalpha = 0.05", "");
        assert!(learn_graphs(&cfg, &dataset(1, 5, 20), |_, _, _| Ok(())).is_err());
    }

    #[test]
    fn learner_failure_aborts_the_run() {
        let cfg = config(
            "kind = \"graphical_lasso\"\nalpha = 0.05\nbeta = 0.5\ngamma = 0.0001\nimax = 1\nepsilon = 1e-12",
            "",
        );
        let err = learn_graphs(&cfg, &dataset(2, 8, 40), |_, _, _| Ok(())).unwrap_err();
        assert!(matches!(
            err.root_cause().downcast_ref::<GraphError>(),
            Some(GraphError::NotConverged { .. })
        ));
    }

    #[test]
    fn smooth_signal_graphs_are_pruned() {
        let cfg = config(
            "kind = \"smooth_signal\"\nalpha = 3\nbeta = 5\ngamma = 0.01\nimax = 20000\nepsilon = 0.0001",
            "channels = 4",
        );
        let graphs = learn_graphs(&cfg, &dataset(2, 4, 40), |_, _, _| Ok(())).unwrap();
        for w in graphs.items() {
            for v in w.as_slice() {
                assert!(*v == 0.0 || v.abs() > topo_lib::PRUNE_THRESHOLD);
            }
        }
    }

    #[test]
    fn every_method_handles_a_single_channel() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../test_data/six_trials.json");
        let ds = topo_lib::io::load_dataset(&path).unwrap();
        let shared = "beta = 0.5\ngamma = 0.0001\nimax = 2000\nepsilon = 0.01";
        let cases = [
            ("kind = \"raw_windows\"".to_string(), (6, 1, 40)),
            ("kind = \"tma_maps\"".to_string(), (6, 10, 40)),
            ("kind = \"correlation\"\nalpha = 0.05".to_string(), (6, 1, 1)),
            ("kind = \"partial_correlation\"\nalpha = 0.05".to_string(), (6, 1, 1)),
            (format!("kind = \"graphical_lasso\"\nalpha = 0.05\n{}", shared), (6, 1, 1)),
            (format!("kind = \"sem\"\n{}", shared), (6, 1, 1)),
            (format!("kind = \"svarm\"\np = 2\n{}", shared), (6, 1, 1)),
            (
                "kind = \"smooth_signal\"\nalpha = 3\nbeta = 5\ngamma = 0.01\nimax = 2000\nepsilon = 0.0001"
                    .to_string(),
                (6, 1, 1),
            ),
            (format!("kind = \"smooth_autoregress\"\n{}", shared), (6, 1, 1)),
            (format!("kind = \"autoregress\"\ndelta = 1.0\n{}", shared), (6, 1, 1)),
            ("kind = \"diffusion\"\np = 5\nbeta_1 = 10\nbeta_2 = 0.1".to_string(), (6, 1, 1)),
        ];
        for (method, shape) in cases {
            let cfg = config(&method, "channels = 1");
            let graphs = learn_graphs(&cfg, &ds, |_, _, _| Ok(()))
                .unwrap_or_else(|e| panic!("{}: {:#}", cfg.method.id(), e));
            assert_eq!(graphs.shape(), shape, "{}", cfg.method.id());
        }
    }

    #[test]
    fn embedding_needs_more_graphs_than_perplexity() {
        let cfg = config("kind = \"correlation\"\nalpha = 0.05", "[embedding]\nperplexity = 5.0");
        let graphs = learn_graphs(&cfg, &dataset(3, 8, 40), |_, _, _| Ok(())).unwrap();
        let err = embed_graphs(&graphs, &cfg.embedding).unwrap_err();
        assert!(matches!(
            err.root_cause().downcast_ref::<GraphError>(),
            Some(GraphError::TooFewSamples { samples: 3, .. })
        ));
    }

    #[test]
    fn embedding_places_every_graph() {
        let cfg = config(
            "kind = \"correlation\"\nalpha = 0.05",
            "[embedding]\nperplexity = 2.0\nlearning_rate = 10.0\nn_iter = 200",
        );
        let graphs = learn_graphs(&cfg, &dataset(6, 8, 40), |_, _, _| Ok(())).unwrap();
        let coords = embed_graphs(&graphs, &cfg.embedding).unwrap().unwrap();
        assert_eq!(coords.shape(), (6, 2));
        assert!(coords.is_finite());
    }
}
