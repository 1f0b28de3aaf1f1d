pub mod checker;
pub mod privacy;

pub use checker::{
    ExploitPenalty, Recommendation, SafetyChecker, SafetyReport, SafetyTestResult, Severity,
    KNOWN_EXPLOITS,
};
pub use privacy::DifferentialPrivacy;
