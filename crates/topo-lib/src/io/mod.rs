pub mod dataset;
pub mod graphs;

pub use dataset::{load_dataset, load_dataset_csv, load_dataset_json, parse_dataset_json};
pub use graphs::{read_graph_record, write_embedding_csv, write_graph_record, GraphRecord};
