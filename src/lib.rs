//! # dfc-topology
//!
//! Topological Dissimilarity of Dynamic Functional Connectivity:
//! Persistent Homology over Sliding-Window Connectivity Snapshots
//!
//! ## Framework
//!
//! A subject's dynamic functional connectivity is a sequence of T
//! windowed snapshots over R brain regions. This crate turns every
//! snapshot into a topological signature and compares all pairs of
//! snapshots, producing one symmetric T × T dissimilarity matrix per
//! subject. Downstream tools (embedding, clustering into states) read
//! that matrix; they are not part of this crate.
//!
//! ### Pipeline
//!
//! 1. **Normalization**: each window becomes a Pearson correlation matrix
//!    `c`, mapped to the distance `sqrt(1 - c²)`. Missing readings and
//!    undefined correlations are repaired to 0 and reported.
//!
//! 2. **Signature extraction**: the snapshot is read as a distance matrix,
//!    its Vietoris-Rips filtration is built, and the finite degree-0
//!    barcode (component births and merges) is kept.
//!
//! 3. **Comparison**: barcodes are compared with the optimal-transport
//!    (Wasserstein, order 1) or bottleneck distance between persistence
//!    diagrams. The traditional pipeline skips topology and compares raw
//!    snapshots with the Frobenius norm.
//!
//! 4. **Assembly**: every signature is extracted once, the lower triangle
//!    is filled pair by pair, mirrored, and rounded.
//!
//! ## Key Property
//!
//! For every subject and configuration:
//!
//!   D[i][i] = 0,  D[i][j] = D[j][i] ≥ 0
//!
//! and the matrix is fully determined by the input tensor.
//!
//! ## References
//!
//! - Edelsbrunner & Harer, "Computational Topology" (2010)
//! - Cohen-Steiner, Edelsbrunner & Harer, "Stability of Persistence
//!   Diagrams" (2007) - bottleneck stability
//! - Allen et al., "Tracking Whole-Brain Connectivity Dynamics in the
//!   Resting State" (2014) - sliding-window DFC

pub mod batch;
pub mod config;
pub mod distance;
pub mod engine;
pub mod error;
pub mod io;
pub mod normalize;
pub mod synthetic;
pub mod telemetry;
pub mod topology;

pub use error::{DfcError, Result};

// Re-exports from config
pub use config::{BatchConfig, DistanceConfig, Metric, Pipeline};

// Re-exports from normalize
pub use normalize::{
    correlation_to_distance,
    normalize_subject,
    normalize_tensor,
    NormalizationReport,
    NormalizedSubject,
};

// Re-exports from topology
pub use topology::{
    // Filtration
    RipsFiltration,
    FilteredEdge,
    // Persistence
    compute_persistence,
    degree0_barcode,
    PersistenceDiagram,
    Barcode,
    PersistencePair,
};

// Re-exports from distance
pub use distance::{
    barcode_distance,
    bottleneck_distance,
    frobenius_distance,
    wasserstein_distance,
    BarcodeDistance,
};

// Re-exports from engine
pub use engine::{
    compute_dissimilarity,
    DissimilarityEngine,
    DissimilarityMatrix,
    EngineOutput,
    EngineStats,
    SnapshotMeasure,
    TopologicalMeasure,
    TraditionalMeasure,
};

// Re-exports from batch
pub use batch::{process_subject, run_batch, BatchReport, SubjectInput, SubjectOutcome};

pub use synthetic::SyntheticSubject;
