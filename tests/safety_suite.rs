use evotok::config::GaConfig;
use evotok::engines::safety::{Recommendation, SafetyChecker};
use evotok::{EvotokConfig, InMemoryCorpus, QuantumEvoTokenizer};
use tempfile::TempDir;

fn config(dir: &TempDir) -> EvotokConfig {
    EvotokConfig {
        output_dir: dir.path().to_string_lossy().into_owned(),
        ga: GaConfig {
            population_size: 6,
            generations: 3,
            elite_size: 2,
            init_tokens_min: 10,
            init_tokens_max: 30,
            ..GaConfig::default()
        },
        ..EvotokConfig::default()
    }
}

#[test]
fn evolved_tokenizer_passes_the_suite() {
    let dir = TempDir::new().unwrap();
    let mut tok = QuantumEvoTokenizer::new(config(&dir)).unwrap();
    let corpus = InMemoryCorpus::from_texts(&[
        "the quick brown fox jumps over the lazy dog",
        "safety checks guard the token budget",
    ]);
    tok.evolve(&corpus).unwrap();

    let report = tok.run_safety_suite();
    assert_eq!(report.total, report.passed + report.failed);
    // Byte fallback keeps round-trips exact, so nothing critical can fail.
    assert_ne!(report.recommendation, Recommendation::Block);
}

#[test]
fn suite_runs_without_evolution() {
    let dir = TempDir::new().unwrap();
    let mut tok = QuantumEvoTokenizer::new(config(&dir)).unwrap();
    let report = tok.run_safety_suite();
    assert_eq!(report.failed, 0);
    assert_eq!(report.recommendation, Recommendation::Pass);
}

#[test]
fn report_serializes_for_audit_logs() {
    let dir = TempDir::new().unwrap();
    let mut tok = QuantumEvoTokenizer::new(config(&dir)).unwrap();
    let report = tok.run_safety_suite();

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("recommendation"));
}

#[test]
fn budget_check_is_config_driven() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(&dir);
    cfg.safety.max_tokens_per_byte_ratio = 0.5;
    let checker = SafetyChecker::new(cfg.safety.clone());

    // One token per byte exceeds a 0.5 ratio.
    assert!(!checker.check_token_budget(100, 100).passed);
    assert!(checker.check_token_budget(100, 50).passed);
}
