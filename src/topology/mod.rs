//! Topology Module: Rips Filtrations and Degree-0 Barcodes
//!
//! A normalized connectivity snapshot is read as the pairwise distance
//! matrix of R points (one per region). Growing a threshold ε over that
//! matrix builds the Vietoris-Rips filtration VR_ε; the connected
//! components of VR_ε appear and merge as ε grows, and their lifetimes
//! form the snapshot's barcode.
//!
//! ## Pipeline
//!
//! ```text
//! distance matrix ──► RipsFiltration (vertices + edges)
//!                 ──► compute_persistence (H0, elder rule)
//!                 ──► finite_barcode (essential class dropped)
//! ```
//!
//! Only H0 is computed: the filtration stops at dimension 1, so there are
//! no triangles to kill cycles and higher homology is meaningless here.

mod barcode;
mod persistence;
mod vietoris_rips;

pub use barcode::{Barcode, PersistencePair};
pub use persistence::{compute_persistence, degree0_barcode, PersistenceDiagram};
pub use vietoris_rips::{FilteredEdge, RipsFiltration};
