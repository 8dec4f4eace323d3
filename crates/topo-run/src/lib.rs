pub mod config;
pub mod method;
pub mod persist;
pub mod pipeline;

pub use config::{parse_config, read_config, EmbeddingConfig, RunConfig, VisualizeConfig};
pub use method::{Method, MethodInfo, CATALOG};
pub use persist::{confirm_save, output_file_name, save_graphs, SAVE_PROMPT};
pub use pipeline::{embed_graphs, learn_graphs, RunSummary};
