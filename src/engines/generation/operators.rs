//! Genetic operators: selection, crossover, mutation, random init.

use crate::config::GaConfig;
use crate::engines::generation::individual::Individual;
use crate::engines::generation::ngram::NgramTable;
use crate::engines::generation::pareto::crowded_compare;
use crate::vocab::{is_valid_token, Vocabulary, MAX_TOKEN_LEN};
use rand::rngs::StdRng;
use rand::Rng;

/// Random starting vocabulary: the byte baseline plus a sampled batch of
/// corpus n-grams.
pub fn random_vocabulary(config: &GaConfig, ngrams: &NgramTable, rng: &mut StdRng) -> Vocabulary {
    let mut vocab = Vocabulary::base();
    if ngrams.is_empty() {
        return vocab;
    }

    let target = rng.gen_range(config.init_tokens_min..=config.init_tokens_max);
    let mut attempts = 0;
    let mut added = 0;
    while added < target && attempts < target * 10 {
        attempts += 1;
        if let Some(ngram) = ngrams.sample_weighted(rng) {
            if ngram.len() > 1 && is_valid_token(ngram, config.byte_validity_check) {
                if vocab.insert(ngram.to_vec()) {
                    added += 1;
                }
            }
        }
    }
    vocab
}

/// Scalar-fitness tournament. Returns the index of the winner.
pub fn tournament_selection(
    population: &[Individual],
    tournament_size: usize,
    rng: &mut StdRng,
) -> usize {
    let mut best = rng.gen_range(0..population.len());
    for _ in 1..tournament_size {
        let challenger = rng.gen_range(0..population.len());
        if population[challenger].overall_fitness > population[best].overall_fitness {
            best = challenger;
        }
    }
    best
}

/// NSGA-II parent pool: fronts are consumed in rank order, and the front
/// that straddles the pool boundary is cut by descending crowding distance.
/// Requires that `rank_population` has already run on this population.
pub fn pareto_parent_pool(population: &[Individual], pool_size: usize) -> Vec<usize> {
    let mut pool = Vec::with_capacity(pool_size);
    let mut rank = 0;
    while pool.len() < pool_size {
        let mut front: Vec<usize> = (0..population.len())
            .filter(|&i| population[i].pareto_rank == rank)
            .collect();
        if front.is_empty() {
            break;
        }
        if pool.len() + front.len() > pool_size {
            front.sort_by(|&a, &b| {
                population[b]
                    .crowding_distance
                    .partial_cmp(&population[a].crowding_distance)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            front.truncate(pool_size - pool.len());
        }
        pool.extend(front);
        rank += 1;
    }
    pool
}

/// Tournament under the crowded comparison operator, drawn from a parent
/// pool built by [`pareto_parent_pool`]. Returns an index into `population`.
pub fn pareto_tournament_selection(
    population: &[Individual],
    pool: &[usize],
    tournament_size: usize,
    rng: &mut StdRng,
) -> usize {
    let mut best = pool[rng.gen_range(0..pool.len())];
    for _ in 1..tournament_size {
        let challenger = pool[rng.gen_range(0..pool.len())];
        if crowded_compare(&population[challenger], &population[best]) {
            best = challenger;
        }
    }
    best
}

/// Uniform set crossover: each multi-byte token in the union lands in one
/// child or the other by coin flip. Both children keep the byte baseline.
pub fn uniform_crossover(
    a: &Vocabulary,
    b: &Vocabulary,
    rng: &mut StdRng,
) -> (Vocabulary, Vocabulary) {
    let mut child_a = Vocabulary::base();
    let mut child_b = Vocabulary::base();

    let mut union: Vec<&Vec<u8>> = a.iter().chain(b.iter()).filter(|t| t.len() > 1).collect();
    union.sort();
    union.dedup();

    for token in union {
        if rng.gen_bool(0.5) {
            child_a.insert(token.clone());
        } else {
            child_b.insert(token.clone());
        }
    }

    (child_a, child_b)
}

/// In-place mutation: pick one of add / remove / merge per mutation event.
pub fn mutate(vocab: &mut Vocabulary, config: &GaConfig, ngrams: &NgramTable, rng: &mut StdRng) {
    if !rng.gen_bool(config.mutation_rate) {
        return;
    }

    match rng.gen_range(0..3u8) {
        // Add a token, guided by corpus frequency when enabled.
        0 => {
            let candidate: Option<Vec<u8>> = if config.ngram_guided_mutation && !ngrams.is_empty() {
                ngrams.sample_weighted(rng).map(|n| n.to_vec())
            } else {
                let len = rng.gen_range(2..=4usize);
                Some((0..len).map(|_| rng.gen::<u8>()).collect())
            };
            if let Some(token) = candidate {
                if token.len() > 1 && is_valid_token(&token, config.byte_validity_check) {
                    vocab.insert(token);
                }
            }
        }
        // Remove a multi-byte token; the baseline is untouchable.
        1 => {
            let multi: Vec<Vec<u8>> = vocab.iter().filter(|t| t.len() > 1).cloned().collect();
            if !multi.is_empty() {
                let victim = &multi[rng.gen_range(0..multi.len())];
                vocab.remove(victim);
            }
        }
        // Merge two existing tokens into a longer one.
        _ => {
            let all: Vec<Vec<u8>> = vocab.iter().cloned().collect();
            if all.len() >= 2 {
                let left = &all[rng.gen_range(0..all.len())];
                let right = &all[rng.gen_range(0..all.len())];
                if left.len() + right.len() <= MAX_TOKEN_LEN {
                    let mut merged = left.clone();
                    merged.extend_from_slice(right);
                    if is_valid_token(&merged, config.byte_validity_check) {
                        vocab.insert(merged);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn ngrams() -> NgramTable {
        NgramTable::build(
            &[b"hello world hello world".to_vec(), b"hello there".to_vec()],
            4,
        )
    }

    #[test]
    fn random_vocabulary_respects_init_bounds() {
        let config = GaConfig::default();
        let table = ngrams();
        let mut rng = StdRng::seed_from_u64(1);
        let vocab = random_vocabulary(&config, &table, &mut rng);

        assert!(vocab.len() >= 256);
        assert!(vocab.multi_byte_tokens().len() <= config.init_tokens_max);
    }

    #[test]
    fn crossover_children_partition_the_union() {
        let a = Vocabulary::from_tokens(vec![b"ab".to_vec(), b"cd".to_vec()]);
        let b = Vocabulary::from_tokens(vec![b"ef".to_vec(), b"gh".to_vec()]);
        let mut rng = StdRng::seed_from_u64(2);

        let (child_a, child_b) = uniform_crossover(&a, &b, &mut rng);

        for token in [b"ab", b"cd", b"ef", b"gh"] {
            let in_a = child_a.contains(token);
            let in_b = child_b.contains(token);
            assert!(in_a ^ in_b, "each union token lands in exactly one child");
        }
        assert!(child_a.len() >= 256 && child_b.len() >= 256);
    }

    #[test]
    fn tournament_prefers_fitter_individuals() {
        let mut population: Vec<Individual> = (0..10)
            .map(|i| {
                let mut ind = Individual::new(Vocabulary::base(), 0);
                ind.overall_fitness = i as f64;
                ind
            })
            .collect();
        population[9].overall_fitness = 100.0;

        let mut rng = StdRng::seed_from_u64(3);
        let mut wins = 0;
        for _ in 0..100 {
            if tournament_selection(&population, 5, &mut rng) == 9 {
                wins += 1;
            }
        }
        assert!(wins > 30);
    }

    fn ranked_population() -> Vec<Individual> {
        (0..6)
            .map(|i| {
                let mut ind = Individual::new(Vocabulary::base(), 0);
                ind.pareto_rank = if i < 3 { 0 } else { 1 };
                ind.crowding_distance = i as f64;
                ind
            })
            .collect()
    }

    #[test]
    fn parent_pool_fills_front_by_front() {
        let population = ranked_population();
        let pool = pareto_parent_pool(&population, 4);

        assert_eq!(pool.len(), 4);
        // The whole first front comes in before the second is touched.
        for i in 0..3 {
            assert!(pool.contains(&i));
        }
        // The split second front keeps its widest-spaced member only.
        assert!(pool.contains(&5));
        assert!(!pool.contains(&3) && !pool.contains(&4));
    }

    #[test]
    fn pool_tournament_never_reaches_past_the_pool() {
        let population = ranked_population();
        let pool = pareto_parent_pool(&population, 3);
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..100 {
            let pick = pareto_tournament_selection(&population, &pool, 3, &mut rng);
            assert!(pool.contains(&pick));
            assert_eq!(population[pick].pareto_rank, 0);
        }
    }

    #[test]
    fn mutation_never_drops_the_byte_baseline() {
        let config = GaConfig {
            mutation_rate: 1.0,
            ..GaConfig::default()
        };
        let table = ngrams();
        let mut rng = StdRng::seed_from_u64(4);
        let mut vocab = Vocabulary::from_tokens(vec![b"hello".to_vec()]);

        for _ in 0..200 {
            mutate(&mut vocab, &config, &table, &mut rng);
        }
        for b in 0u8..=255 {
            assert!(vocab.contains(&[b]));
        }
        assert!(vocab.iter().all(|t| t.len() <= MAX_TOKEN_LEN));
    }

    #[test]
    fn mutation_is_deterministic_per_seed() {
        let config = GaConfig {
            mutation_rate: 1.0,
            ..GaConfig::default()
        };
        let table = ngrams();

        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut vocab = Vocabulary::from_tokens(vec![b"hello".to_vec()]);
            for _ in 0..50 {
                mutate(&mut vocab, &config, &table, &mut rng);
            }
            vocab.canonical_hash()
        };

        assert_eq!(run(9), run(9));
    }
}
