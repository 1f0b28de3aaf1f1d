pub mod backend;
pub mod cache;
pub mod classical;
pub mod stats;

pub use backend::{create_backend, BoundaryBackend, SimulatedBackend, VqeResult};
pub use cache::SolutionCache;
pub use classical::ClassicalBoundaryOptimizer;
pub use stats::{shannon_entropy, SegmentStats};
