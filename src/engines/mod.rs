pub mod generation;
pub mod quantum;
pub mod safety;
