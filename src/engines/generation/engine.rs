//! The core evolutionary loop over vocabulary populations.

use crate::config::{GaConfig, SelectionMethod};
use crate::engines::generation::fitness::FitnessEvaluator;
use crate::engines::generation::individual::{GaState, GenerationRecord, Individual};
use crate::engines::generation::ngram::NgramTable;
use crate::engines::generation::operators::{
    mutate, pareto_parent_pool, pareto_tournament_selection, random_vocabulary,
    tournament_selection, uniform_crossover,
};
use crate::engines::generation::pareto::{default_objectives, rank_population, Objective};
use crate::error::{EvotokError, Result};
use crate::vocab::Vocabulary;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

pub struct GaOptimizer {
    config: GaConfig,
    evaluator: FitnessEvaluator,
    objectives: Vec<Objective>,
    ngrams: NgramTable,
    rng: StdRng,
    state: Option<GaState>,
    history: Vec<GenerationRecord>,
}

impl GaOptimizer {
    pub fn new(config: GaConfig, evaluator: FitnessEvaluator, seed: u64) -> Self {
        Self {
            config,
            evaluator,
            objectives: default_objectives(),
            ngrams: NgramTable::default(),
            rng: StdRng::seed_from_u64(seed),
            state: None,
            history: Vec::new(),
        }
    }

    pub fn set_ngram_table(&mut self, table: NgramTable) {
        self.ngrams = table;
    }

    /// Start the run from copies of a known-good vocabulary instead of
    /// random initialization. Used to chain optimization phases.
    pub fn seed_population(&mut self, vocab: &Vocabulary) {
        let population = (0..self.config.population_size)
            .map(|_| Individual::new(vocab.clone(), 0))
            .collect();
        self.state = Some(GaState {
            generation: 0,
            best_fitness: f64::NEG_INFINITY,
            stagnation_count: 0,
            population,
        });
    }

    fn init_population(&mut self) -> Vec<Individual> {
        (0..self.config.population_size)
            .map(|_| Individual::new(random_vocabulary(&self.config, &self.ngrams, &mut self.rng), 0))
            .collect()
    }

    fn evaluate_population(&self, population: &mut [Individual], contexts: &[Vec<u8>]) {
        population
            .par_iter_mut()
            .for_each(|ind| self.evaluator.evaluate(ind, contexts));
    }

    fn best_index(population: &[Individual]) -> usize {
        let mut best = 0;
        for (i, ind) in population.iter().enumerate() {
            if ind.overall_fitness > population[best].overall_fitness {
                best = i;
            }
        }
        best
    }

    fn elite_indices(population: &[Individual], count: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..population.len()).collect();
        indices.sort_by(|&a, &b| {
            population[b]
                .overall_fitness
                .partial_cmp(&population[a].overall_fitness)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        indices.truncate(count.min(population.len()));
        indices
    }

    /// Elites survive; the rest of the slots are refilled by selection,
    /// crossover, and mutation until the population is back at full size.
    fn create_next_generation(&mut self, generation: usize) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };
        let population = std::mem::take(&mut state.population);

        let mut next: Vec<Individual> = Self::elite_indices(&population, self.config.elite_size)
            .into_iter()
            .map(|i| {
                let mut elite = population[i].clone();
                elite.generation = generation;
                elite
            })
            .collect();

        // Half the population gets to breed; under Pareto selection the
        // pool is filled front-by-front with a crowding-sorted split front.
        let pool = match self.config.selection_method {
            SelectionMethod::Pareto => {
                pareto_parent_pool(&population, (self.config.population_size / 2).max(2))
            }
            SelectionMethod::Tournament => Vec::new(),
        };

        while next.len() < self.config.population_size {
            let (p1, p2) = match self.config.selection_method {
                SelectionMethod::Tournament => (
                    tournament_selection(&population, self.config.tournament_size, &mut self.rng),
                    tournament_selection(&population, self.config.tournament_size, &mut self.rng),
                ),
                SelectionMethod::Pareto => (
                    pareto_tournament_selection(
                        &population,
                        &pool,
                        self.config.tournament_size,
                        &mut self.rng,
                    ),
                    pareto_tournament_selection(
                        &population,
                        &pool,
                        self.config.tournament_size,
                        &mut self.rng,
                    ),
                ),
            };

            let (mut child_a, mut child_b) = if self.rng.gen_bool(self.config.crossover_rate) {
                uniform_crossover(&population[p1].vocab, &population[p2].vocab, &mut self.rng)
            } else {
                (population[p1].vocab.clone(), population[p2].vocab.clone())
            };

            mutate(&mut child_a, &self.config, &self.ngrams, &mut self.rng);
            mutate(&mut child_b, &self.config, &self.ngrams, &mut self.rng);

            next.push(Individual::new(child_a, generation));
            if next.len() < self.config.population_size {
                next.push(Individual::new(child_b, generation));
            }
        }

        state.population = next;
        state.generation = generation;
    }

    /// Stagnation escape: keep the elites, replace a fraction of the
    /// population with fresh random vocabularies, heavily mutate the rest.
    fn catastrophic_reset(&mut self, generation: usize) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };
        let population = std::mem::take(&mut state.population);

        let mut next: Vec<Individual> = Self::elite_indices(&population, self.config.elite_size)
            .into_iter()
            .map(|i| {
                let mut elite = population[i].clone();
                elite.generation = generation;
                elite
            })
            .collect();

        let fresh = ((self.config.population_size - next.len()) as f64
            * self.config.catastrophic_mutation_rate)
            .round() as usize;
        for _ in 0..fresh {
            if next.len() >= self.config.population_size {
                break;
            }
            next.push(Individual::new(
                random_vocabulary(&self.config, &self.ngrams, &mut self.rng),
                generation,
            ));
        }

        let heavy = GaConfig {
            mutation_rate: (self.config.mutation_rate * 3.0).min(1.0),
            ..self.config.clone()
        };
        while next.len() < self.config.population_size {
            let source = tournament_selection(&population, self.config.tournament_size, &mut self.rng);
            let mut vocab = population[source].vocab.clone();
            for _ in 0..3 {
                mutate(&mut vocab, &heavy, &self.ngrams, &mut self.rng);
            }
            next.push(Individual::new(vocab, generation));
        }

        state.population = next;
        state.generation = generation;
        state.stagnation_count = 0;
    }

    /// One generation: evaluate, rank, record, then breed the next
    /// population (or reset on prolonged stagnation).
    pub fn evolve_step(&mut self, contexts: &[Vec<u8>]) -> Result<GenerationRecord> {
        if self.state.is_none() {
            let population = self.init_population();
            self.state = Some(GaState {
                generation: 0,
                best_fitness: f64::NEG_INFINITY,
                stagnation_count: 0,
                population,
            });
        }

        let generation = self
            .state
            .as_ref()
            .map(|s| s.generation)
            .unwrap_or(0);

        {
            let mut population = match self.state.as_mut() {
                Some(s) => std::mem::take(&mut s.population),
                None => Vec::new(),
            };
            if population.is_empty() {
                return Err(EvotokError::Evolution("population is empty".to_string()));
            }
            self.evaluate_population(&mut population, contexts);
            if self.config.selection_method == SelectionMethod::Pareto {
                rank_population(&mut population, &self.objectives);
            }
            if let Some(state) = self.state.as_mut() {
                state.population = population;
            }
        }

        let record = {
            let state = self
                .state
                .as_mut()
                .ok_or_else(|| EvotokError::Evolution("optimizer state missing".to_string()))?;

            let best_idx = Self::best_index(&state.population);
            let best = &state.population[best_idx];
            let record = GenerationRecord {
                generation,
                best_fitness: best.overall_fitness,
                best_vocab_size: best.vocab.len(),
                best_scores: best.fitness_scores.clone(),
            };

            if best.overall_fitness > state.best_fitness + 1e-9 {
                state.best_fitness = best.overall_fitness;
                state.stagnation_count = 0;
            } else {
                state.stagnation_count += 1;
            }
            record
        };

        self.history.push(record.clone());

        let stagnated = self
            .state
            .as_ref()
            .map(|s| s.stagnation_count >= self.config.stagnation_threshold)
            .unwrap_or(false);

        if stagnated {
            info!(
                "generation {}: stagnated for {} generations, resetting population",
                generation, self.config.stagnation_threshold
            );
            self.catastrophic_reset(generation + 1);
        } else {
            self.create_next_generation(generation + 1);
        }

        Ok(record)
    }

    /// Full run: `generations` steps followed by a final evaluation pass so
    /// the reported best reflects the last population.
    pub fn run(&mut self, contexts: &[Vec<u8>]) -> Result<Individual> {
        if contexts.is_empty() {
            return Err(EvotokError::Evolution(
                "cannot evolve against an empty corpus".to_string(),
            ));
        }

        for _ in 0..self.config.generations {
            let record = self.evolve_step(contexts)?;
            if record.generation % 10 == 0 {
                info!(
                    "generation {}: best fitness {:.4}, vocab size {}",
                    record.generation, record.best_fitness, record.best_vocab_size
                );
            } else {
                debug!(
                    "generation {}: best fitness {:.4}",
                    record.generation, record.best_fitness
                );
            }
        }

        let state = self
            .state
            .as_mut()
            .ok_or_else(|| EvotokError::Evolution("optimizer never initialized".to_string()))?;
        let mut population = std::mem::take(&mut state.population);
        self.evaluate_population(&mut population, contexts);
        if let Some(state) = self.state.as_mut() {
            state.population = population;
        }

        self.best_individual()
            .cloned()
            .ok_or_else(|| EvotokError::Evolution("no best individual produced".to_string()))
    }

    pub fn best_individual(&self) -> Option<&Individual> {
        let state = self.state.as_ref()?;
        if state.population.is_empty() {
            return None;
        }
        Some(&state.population[Self::best_index(&state.population)])
    }

    pub fn history(&self) -> &[GenerationRecord] {
        &self.history
    }
}
