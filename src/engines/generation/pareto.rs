//! NSGA-II style multi-objective ranking over a population.
//!
//! Fast non-dominated sorting assigns Pareto ranks (0 = best frontier),
//! crowding distance preserves diversity inside each front.

use crate::engines::generation::individual::{components, Individual};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationDirection {
    Maximize,
    Minimize,
}

/// One fitness component together with the direction it should move.
#[derive(Debug, Clone)]
pub struct Objective {
    pub component: String,
    pub direction: OptimizationDirection,
}

pub fn default_objectives() -> Vec<Objective> {
    vec![
        Objective {
            component: components::COMPRESSION.to_string(),
            direction: OptimizationDirection::Maximize,
        },
        Objective {
            component: components::SPARSITY.to_string(),
            direction: OptimizationDirection::Maximize,
        },
        Objective {
            component: components::OOV_COVERAGE.to_string(),
            direction: OptimizationDirection::Maximize,
        },
        Objective {
            component: components::CONTEXT_COVERAGE.to_string(),
            direction: OptimizationDirection::Maximize,
        },
        Objective {
            component: components::PERPLEXITY_PROXY.to_string(),
            direction: OptimizationDirection::Minimize,
        },
    ]
}

fn objective_values(individual: &Individual, objectives: &[Objective]) -> Vec<f64> {
    objectives.iter().map(|o| individual.score(&o.component)).collect()
}

/// A dominates B if A is no worse in every objective and strictly better
/// in at least one.
pub fn dominates(a: &[f64], b: &[f64], objectives: &[Objective]) -> bool {
    if a.len() != b.len() || a.len() != objectives.len() {
        return false;
    }

    let mut at_least_one_better = false;
    for i in 0..a.len() {
        let (a_better, b_better) = match objectives[i].direction {
            OptimizationDirection::Maximize => (a[i] > b[i], b[i] > a[i]),
            OptimizationDirection::Minimize => (a[i] < b[i], b[i] < a[i]),
        };
        if b_better {
            return false;
        }
        if a_better {
            at_least_one_better = true;
        }
    }
    at_least_one_better
}

/// Fast non-dominated sort. Writes `pareto_rank` into each individual and
/// returns the fronts as index groups (0 = best).
pub fn fast_non_dominated_sort(
    population: &mut [Individual],
    objectives: &[Objective],
) -> Vec<Vec<usize>> {
    let n = population.len();
    let values: Vec<Vec<f64>> = population
        .iter()
        .map(|ind| objective_values(ind, objectives))
        .collect();

    let mut domination_count = vec![0usize; n];
    let mut dominated: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut first_front = Vec::new();

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if dominates(&values[i], &values[j], objectives) {
                dominated[i].push(j);
            } else if dominates(&values[j], &values[i], objectives) {
                domination_count[i] += 1;
            }
        }
        if domination_count[i] == 0 {
            population[i].pareto_rank = 0;
            first_front.push(i);
        }
    }
    fronts.push(first_front);

    let mut front_index = 0;
    while front_index < fronts.len() && !fronts[front_index].is_empty() {
        let mut next_front = Vec::new();
        for &i in &fronts[front_index] {
            for &j in &dominated[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    population[j].pareto_rank = front_index + 1;
                    next_front.push(j);
                }
            }
        }
        if !next_front.is_empty() {
            fronts.push(next_front);
        }
        front_index += 1;
    }

    fronts
}

/// Crowding distance over one front. Boundary points get infinity so they
/// are always kept.
pub fn assign_crowding_distance(
    population: &mut [Individual],
    front: &[usize],
    objectives: &[Objective],
) {
    let front_size = front.len();
    if front_size <= 2 {
        for &idx in front {
            population[idx].crowding_distance = f64::INFINITY;
        }
        return;
    }

    for &idx in front {
        population[idx].crowding_distance = 0.0;
    }

    for objective in objectives {
        let mut sorted: Vec<usize> = front.to_vec();
        sorted.sort_by(|&a, &b| {
            population[a]
                .score(&objective.component)
                .partial_cmp(&population[b].score(&objective.component))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        population[sorted[0]].crowding_distance = f64::INFINITY;
        population[sorted[front_size - 1]].crowding_distance = f64::INFINITY;

        let min_val = population[sorted[0]].score(&objective.component);
        let max_val = population[sorted[front_size - 1]].score(&objective.component);
        let range = max_val - min_val;
        if range.abs() < 1e-10 {
            continue;
        }

        for i in 1..(front_size - 1) {
            let prev = population[sorted[i - 1]].score(&objective.component);
            let next = population[sorted[i + 1]].score(&objective.component);
            population[sorted[i]].crowding_distance += (next - prev) / range;
        }
    }
}

/// Rank the whole population: sorts into fronts and assigns crowding
/// distance within each.
pub fn rank_population(population: &mut [Individual], objectives: &[Objective]) -> Vec<Vec<usize>> {
    let fronts = fast_non_dominated_sort(population, objectives);
    for front in &fronts {
        assign_crowding_distance(population, front, objectives);
    }
    fronts
}

/// Crowded comparison operator: lower rank wins, ties broken by higher
/// crowding distance.
pub fn crowded_compare(a: &Individual, b: &Individual) -> bool {
    if a.pareto_rank != b.pareto_rank {
        return a.pareto_rank < b.pareto_rank;
    }
    a.crowding_distance > b.crowding_distance
}
