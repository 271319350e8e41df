//! Multi-dimensional lookup tables with multilinear interpolation.
//!
//! Tabulated data keyed by one or more independent variables is sorted and organised
//! into a breakpoint tree, one level per variable. Queries bracket each variable's
//! breakpoints and blend linearly, clamping flat outside the tabulated range.

pub mod algorithms;
pub mod errors;
pub mod loader;
pub mod storage;
pub mod tables;
pub mod utilities;

pub use algorithms::trace::{NoTrace, TraceEvent, TraceRecorder, TraceSink, TracingSink};
pub use errors::LTError;
pub use loader::LoaderOptions;
pub use storage::lookup_tree::{LookupNode, NodeData};
pub use tables::lookup_table::LookupTable;
