use anyhow::Context;
use evotok::{EvotokConfig, InMemoryCorpus, QuantumEvoTokenizer};
use log::info;
use std::path::Path;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config_path = Path::new("evotok.toml");
    let config = if config_path.exists() {
        let manager = evotok::ConfigManager::new();
        manager
            .load_from_file(config_path)
            .context("loading evotok.toml")?;
        manager.get()
    } else {
        EvotokConfig::default()
    };

    let corpus = InMemoryCorpus::from_texts(&[
        "The quick brown fox jumps over the lazy dog.",
        "Machine learning models process text as token sequences.",
        "Tokenization quality affects downstream model performance.",
        "Byte-level vocabularies never fail on unseen input.",
        "The lazy dog sleeps while the quick fox runs.",
    ]);

    let mut tokenizer = QuantumEvoTokenizer::new(config).context("initializing tokenizer")?;
    let best = tokenizer.evolve(&corpus).context("evolving vocabulary")?;
    info!(
        "best fitness {:.4} with {} tokens",
        best.overall_fitness,
        best.vocab.len()
    );

    let sample = b"The quick brown fox jumps over the lazy dog.";
    let ids = tokenizer.encode(sample);
    println!(
        "encoded {} bytes into {} tokens ({:.2} bytes/token)",
        sample.len(),
        ids.len(),
        sample.len() as f64 / ids.len().max(1) as f64
    );

    let report = tokenizer.run_safety_suite();
    println!(
        "safety suite: {}/{} passed, recommendation {:?}",
        report.passed, report.total, report.recommendation
    );

    let record = tokenizer.save("v1", false).context("saving vocabulary")?;
    println!("saved version {} (hash {})", record.version, &record.hash[..12]);

    Ok(())
}
