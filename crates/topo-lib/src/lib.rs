pub mod collection;
pub mod embed;
pub mod error;
pub mod io;
pub mod learn;
pub mod linalg;
pub mod plot;
pub mod signal;
pub mod stats;

pub use collection::GraphCollection;
pub use embed::Tsne;
pub use error::GraphError;
pub use learn::{prune_small_edges, GraphLearner, PRUNE_THRESHOLD};
pub use signal::{rescale_mcw, Dataset, Matrix, Trial};
