mod render;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;
use std::{
    fs,
    io,
    path::{Path, PathBuf},
};
use topo_lib::{
    io::{load_dataset, read_graph_record, write_embedding_csv},
    plot::{figure_from_embedding, figure_from_graph, Figure},
    GraphCollection,
};
use topo_run::{
    confirm_save, embed_graphs, learn_graphs, read_config, save_graphs, EmbeddingConfig,
    RunConfig, RunSummary, CATALOG,
};

#[derive(Parser)]
#[command(
    name = "topo",
    version,
    about = "Learn channel-graph topologies from multi-channel sEMG trials"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Learn one graph per trial with the configured method
    Learn(LearnArgs),
    /// Embed a saved graph collection and plot its latent space
    Embed(EmbedArgs),
    /// List the available methods and their hyperparameters
    Methods,
}

#[derive(Args)]
struct LearnArgs {
    #[arg(long)]
    config: PathBuf,
    /// Override the dataset path from the config
    #[arg(long)]
    dataset: Option<PathBuf>,
    /// Override the graph output directory
    #[arg(long)]
    out_dir: Option<PathBuf>,
    #[arg(long)]
    plot_dir: Option<PathBuf>,
    /// Save the graph collection without asking
    #[arg(long)]
    save: bool,
    /// Ask before saving; only an exact `y` saves
    #[arg(long)]
    prompt: bool,
    /// Skip the latent-space embedding
    #[arg(long)]
    no_latent: bool,
    /// Render a heatmap for every learnt graph
    #[arg(long)]
    plot_graphs: bool,
}

#[derive(Args)]
struct EmbedArgs {
    /// Graph record written by `topo learn`
    #[arg(long)]
    graphs: PathBuf,
    /// Run config supplying class labels and embedding settings
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    plot_dir: Option<PathBuf>,
    #[arg(long)]
    perplexity: Option<f64>,
}

#[derive(Serialize)]
struct EmbedSummary {
    graphs: usize,
    embedded: bool,
    latent_csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();
    match cli.command {
        Commands::Learn(args) => cmd_learn(args)?,
        Commands::Embed(args) => cmd_embed(args)?,
        Commands::Methods => cmd_methods()?,
    }
    Ok(())
}

fn apply_overrides(config: &mut RunConfig, args: &LearnArgs) {
    if let Some(dataset) = &args.dataset {
        config.dataset = dataset.clone();
    }
    if let Some(dir) = &args.out_dir {
        config.graph_data_dir = dir.clone();
    }
    if let Some(dir) = &args.plot_dir {
        config.visualize.plot_dir = dir.clone();
    }
    if args.save {
        config.save = true;
    }
    if args.no_latent {
        config.visualize.latent_space = false;
    }
    if args.plot_graphs {
        config.visualize.learnt_graphs = true;
    }
}

fn cmd_learn(args: LearnArgs) -> Result<()> {
    let mut config = read_config(&args.config)?;
    apply_overrides(&mut config, &args);
    let dataset = load_dataset(&config.dataset)?;
    info!(
        "Loaded {} trials from {}",
        dataset.len(),
        config.dataset.display()
    );

    let plot_dir = config.visualize.plot_dir.clone();
    if config.visualize.learnt_graphs {
        ensure_dir(&plot_dir)?;
    }
    let graphs = learn_graphs(&config, &dataset, |i, w, label| {
        if !config.visualize.learnt_graphs {
            return Ok(());
        }
        let fig = figure_from_graph(w, label, &config.class_labels);
        render_or_warn(
            &plot_dir.join(format!("graph_{:04}.png", i)),
            &fig,
            render::GRAPH_SIZE,
        );
        Ok(())
    })?;

    let mut summary = RunSummary::new(&config, &graphs);
    if config.visualize.latent_space {
        if let Some(csv) = plot_latent_space(
            &graphs,
            &config.embedding,
            &config.class_labels,
            &plot_dir,
        )? {
            summary.embedded = true;
            summary.latent_csv = Some(csv);
        }
    }

    let save = if args.prompt {
        // stdout carries the JSON summary, so the question goes to stderr
        confirm_save(io::stdin().lock(), io::stderr())?
    } else {
        config.save
    };
    if save {
        let path = save_graphs(
            &config.graph_data_dir,
            config.method.id(),
            &config.dataset_type,
            &graphs,
        )?;
        summary.saved = Some(path);
    } else {
        warn!("Graph data not saved");
    }

    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn cmd_embed(args: EmbedArgs) -> Result<()> {
    let graphs = read_graph_record(&args.graphs)?;
    let (mut embedding, class_labels, config_plot_dir) = match &args.config {
        Some(path) => {
            let config = read_config(path)?;
            (
                config.embedding,
                config.class_labels,
                config.visualize.plot_dir,
            )
        }
        None => (EmbeddingConfig::default(), Vec::new(), PathBuf::from("plots")),
    };
    if let Some(perplexity) = args.perplexity {
        embedding.perplexity = perplexity;
    }
    let plot_dir = args.plot_dir.unwrap_or(config_plot_dir);
    let latent_csv = plot_latent_space(&graphs, &embedding, &class_labels, &plot_dir)?;
    let summary = EmbedSummary {
        graphs: graphs.len(),
        embedded: latent_csv.is_some(),
        latent_csv,
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn cmd_methods() -> Result<()> {
    println!("{}", serde_json::to_string(CATALOG)?);
    Ok(())
}

/// Embed, then write `latent_space.csv` and `latent_space.png`; returns the CSV path.
fn plot_latent_space(
    graphs: &GraphCollection,
    embedding: &EmbeddingConfig,
    class_labels: &[String],
    plot_dir: &Path,
) -> Result<Option<PathBuf>> {
    let Some(coords) = embed_graphs(graphs, embedding)? else {
        return Ok(None);
    };
    ensure_dir(plot_dir)?;
    let csv_path = plot_dir.join("latent_space.csv");
    write_embedding_csv(&csv_path, &coords, graphs.labels(), class_labels)?;
    let fig = figure_from_embedding(&coords, graphs.labels(), class_labels);
    render_or_warn(&plot_dir.join("latent_space.png"), &fig, render::LATENT_SIZE);
    info!("Latent space written to {}", plot_dir.display());
    Ok(Some(csv_path))
}

/// Rendering failures are logged, not propagated.
fn render_or_warn(path: &Path, fig: &Figure, size: (u32, u32)) {
    if let Err(err) = render::save_png(path, fig, size) {
        warn!("could not render {}: {:#}", path.display(), err);
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))
}
