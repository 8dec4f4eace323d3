use serde::{Deserialize, Serialize};
use topo_lib::learn::{
    AutoregressLearner, CorrelationLearner, DiffusionLearner, GraphLearner, GraphicalLassoLearner,
    PartialCorrelationLearner, SemLearner, SmoothAutoregressLearner, SmoothSignalLearner,
    SvarmLearner,
};

/// The single graph-construction method of a run, with its hyperparameters.
///
/// Read from the `[method]` table; `kind` selects the variant and every
/// hyperparameter the variant needs is a required field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Method {
    /// Keep the selected channel windows themselves.
    RawWindows,
    /// Keep the full multi-order TMA maps (no channel selection).
    TmaMaps,
    Correlation(CorrelationLearner),
    PartialCorrelation(PartialCorrelationLearner),
    GraphicalLasso(GraphicalLassoLearner),
    Sem(SemLearner),
    Svarm(SvarmLearner),
    SmoothSignal(SmoothSignalLearner),
    SmoothAutoregress(SmoothAutoregressLearner),
    Autoregress(AutoregressLearner),
    Diffusion(DiffusionLearner),
}

/// Static description of one method kind, for listings.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MethodInfo {
    pub kind: &'static str,
    pub id: &'static str,
    pub fields: &'static [&'static str],
    pub rescale: bool,
    pub prunes: bool,
}

pub const CATALOG: &[MethodInfo] = &[
    MethodInfo { kind: "raw_windows", id: "mcw", fields: &[], rescale: false, prunes: false },
    MethodInfo { kind: "tma_maps", id: "tma", fields: &[], rescale: false, prunes: false },
    MethodInfo { kind: "correlation", id: "correlation", fields: &["alpha"], rescale: true, prunes: false },
    MethodInfo {
        kind: "partial_correlation",
        id: "partial_correlation",
        fields: &["alpha"],
        rescale: true,
        prunes: false,
    },
    MethodInfo {
        kind: "graphical_lasso",
        id: "graphical_lasso",
        fields: &["alpha", "beta", "gamma", "imax", "epsilon"],
        rescale: false,
        prunes: false,
    },
    MethodInfo {
        kind: "sem",
        id: "sem",
        fields: &["beta", "gamma", "imax", "epsilon"],
        rescale: true,
        prunes: false,
    },
    MethodInfo {
        kind: "svarm",
        id: "svarm",
        fields: &["beta", "p", "gamma", "imax", "epsilon"],
        rescale: true,
        prunes: false,
    },
    MethodInfo {
        kind: "smooth_signal",
        id: "smoothSignal",
        fields: &["alpha", "beta", "gamma", "imax", "epsilon"],
        rescale: false,
        prunes: true,
    },
    MethodInfo {
        kind: "smooth_autoregress",
        id: "smoothAutoregression",
        fields: &["beta", "gamma", "imax", "epsilon"],
        rescale: true,
        prunes: true,
    },
    MethodInfo {
        kind: "autoregress",
        id: "autoreg",
        fields: &["beta", "gamma", "delta", "imax", "epsilon"],
        rescale: true,
        prunes: false,
    },
    MethodInfo {
        kind: "diffusion",
        id: "diffusion",
        fields: &["p", "beta_1", "beta_2"],
        rescale: false,
        prunes: false,
    },
];

impl Method {
    /// Learner for this method, or `None` when the trial windows are kept as-is.
    pub fn learner(&self) -> Option<&dyn GraphLearner> {
        match self {
            Method::RawWindows | Method::TmaMaps => None,
            Method::Correlation(l) => Some(l),
            Method::PartialCorrelation(l) => Some(l),
            Method::GraphicalLasso(l) => Some(l),
            Method::Sem(l) => Some(l),
            Method::Svarm(l) => Some(l),
            Method::SmoothSignal(l) => Some(l),
            Method::SmoothAutoregress(l) => Some(l),
            Method::Autoregress(l) => Some(l),
            Method::Diffusion(l) => Some(l),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.info().kind
    }

    /// Identifier used in logs and the output file name.
    pub fn id(&self) -> &'static str {
        self.info().id
    }

    /// Whether trials are min-max rescaled when the config leaves `rescale` unset.
    pub fn rescales_by_default(&self) -> bool {
        self.info().rescale
    }

    /// Whether edges with `|w| <= 1e-5` are zeroed after learning.
    pub fn prunes(&self) -> bool {
        self.info().prunes
    }

    fn info(&self) -> &'static MethodInfo {
        let idx = match self {
            Method::RawWindows => 0,
            Method::TmaMaps => 1,
            Method::Correlation(_) => 2,
            Method::PartialCorrelation(_) => 3,
            Method::GraphicalLasso(_) => 4,
            Method::Sem(_) => 5,
            Method::Svarm(_) => 6,
            Method::SmoothSignal(_) => 7,
            Method::SmoothAutoregress(_) => 8,
            Method::Autoregress(_) => 9,
            Method::Diffusion(_) => 10,
        };
        &CATALOG[idx]
    }
}
