//! Exercise selector: greedy, deterministic coverage-maximizing selection.
//!
//! Candidates are ranked by:
//! 1. muscle groups not yet covered in the session (more first)
//! 2. movement pattern preferred by the block
//! 3. movement pattern not yet used in the block
//! 4. collective sessions only: fewer pieces of equipment
//! 5. exercise id
//!
//! Ranking is recomputed after every pick since coverage changes.

use crate::filter::EligibleSet;
use crate::types::{
    BlockPlan, ExerciseCatalog, ExerciseRecord, MovementPattern, SessionBlock, SessionMode,
    SkipReason,
};
use std::cmp::{Ordering, Reverse};
use std::collections::HashSet;

/// Session-wide record of what earlier blocks already used
#[derive(Clone, Debug, Default)]
pub struct CoverageTracker {
    used_ids: HashSet<String>,
    covered_muscles: HashSet<String>,
    covered_primaries: HashSet<String>,
}

impl CoverageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, exercise: &ExerciseRecord) {
        self.used_ids.insert(exercise.id.clone());
        self.covered_primaries
            .insert(exercise.primary_muscle.to_lowercase());
        for muscle in exercise.muscle_groups() {
            self.covered_muscles.insert(muscle.to_lowercase());
        }
    }

    /// Absorb a carried-over block; ids unknown to the catalog still count as used
    pub fn absorb_block(&mut self, block: &SessionBlock, catalog: &ExerciseCatalog) {
        for id in block.exercise_ids() {
            match catalog.get(id) {
                Some(exercise) => self.record(exercise),
                None => {
                    self.used_ids.insert(id.to_string());
                }
            }
        }
    }

    pub fn is_used(&self, id: &str) -> bool {
        self.used_ids.contains(id)
    }

    pub fn used_count(&self) -> usize {
        self.used_ids.len()
    }

    fn uncovered_count(&self, exercise: &ExerciseRecord) -> usize {
        exercise
            .muscle_groups()
            .map(str::to_lowercase)
            .collect::<HashSet<_>>()
            .into_iter()
            .filter(|m| !self.covered_muscles.contains(m))
            .count()
    }

    fn primary_covered(&self, exercise: &ExerciseRecord) -> bool {
        self.covered_primaries
            .contains(&exercise.primary_muscle.to_lowercase())
    }
}

/// Outcome of selecting exercises for one block
#[derive(Clone, Debug)]
pub struct Selection<'a> {
    pub exercises: Vec<&'a ExerciseRecord>,
    /// Unused pool was smaller than the target; repeats from other blocks allowed
    pub partial_selection: bool,
    pub skip_reason: Option<SkipReason>,
}

impl Selection<'_> {
    pub fn ids(&self) -> Vec<&str> {
        self.exercises.iter().map(|e| e.id.as_str()).collect()
    }
}

struct Ranking<'b> {
    block: &'b BlockPlan,
    mode: SessionMode,
    block_patterns: HashSet<MovementPattern>,
}

impl Ranking<'_> {
    fn key(&self, e: &ExerciseRecord, coverage: &CoverageTracker) -> (Reverse<usize>, Reverse<bool>, Reverse<bool>, usize) {
        let preferred = self.block.preferred_patterns.contains(&e.movement_pattern);
        let new_pattern = !self.block_patterns.contains(&e.movement_pattern);
        let equipment_bias = match self.mode {
            SessionMode::Collective => e.equipment.len(),
            SessionMode::Individual => 0,
        };
        (
            Reverse(coverage.uncovered_count(e)),
            Reverse(preferred),
            Reverse(new_pattern),
            equipment_bias,
        )
    }

    fn compare(&self, a: &ExerciseRecord, b: &ExerciseRecord, coverage: &CoverageTracker) -> Ordering {
        self.key(a, coverage)
            .cmp(&self.key(b, coverage))
            .then_with(|| a.id.cmp(&b.id))
    }
}

fn best<'a, F>(
    pool: &[&'a ExerciseRecord],
    picked: &[&'a ExerciseRecord],
    ranking: &Ranking<'_>,
    coverage: &CoverageTracker,
    accept: F,
) -> Option<&'a ExerciseRecord>
where
    F: Fn(&ExerciseRecord) -> bool,
{
    pool.iter()
        .copied()
        .filter(|e| !picked.iter().any(|p| p.id == e.id))
        .filter(|e| accept(e))
        .min_by(|a, b| ranking.compare(a, b, coverage))
}

/// Pick exercises for a block
///
/// Picks are recorded into `coverage` so later blocks see them as used.
pub fn select_exercises<'a>(
    eligible: &EligibleSet<'a>,
    block: &BlockPlan,
    coverage: &mut CoverageTracker,
    mode: SessionMode,
) -> Selection<'a> {
    let target = block.target_exercise_count;

    if eligible.is_empty() {
        tracing::warn!("No eligible exercises for block '{}', skipping", block.title);
        return Selection {
            exercises: Vec::new(),
            partial_selection: false,
            skip_reason: Some(SkipReason::NoEligibleExercises),
        };
    }

    let fresh: Vec<&'a ExerciseRecord> = eligible
        .exercises()
        .iter()
        .copied()
        .filter(|e| !coverage.is_used(&e.id))
        .collect();
    let partial_selection = fresh.len() < target;

    let mut ranking = Ranking {
        block,
        mode,
        block_patterns: HashSet::new(),
    };
    let mut picked: Vec<&'a ExerciseRecord> = Vec::with_capacity(target.min(eligible.len()));

    // Pass 1: unused, primary muscle not yet covered
    // Pass 2: any unused
    for strict in [true, false] {
        while picked.len() < target {
            let next = best(&fresh, &picked, &ranking, coverage, |e| {
                !strict || !coverage.primary_covered(e)
            });
            let Some(exercise) = next else { break };
            coverage.record(exercise);
            ranking.block_patterns.insert(exercise.movement_pattern);
            picked.push(exercise);
        }
    }

    // Pass 3: reuse from other blocks, never within this block
    if picked.len() < target {
        let reusable: Vec<&'a ExerciseRecord> = eligible
            .exercises()
            .iter()
            .copied()
            .filter(|e| coverage.is_used(&e.id))
            .collect();
        while picked.len() < target {
            let Some(exercise) = best(&reusable, &picked, &ranking, coverage, |_| true) else {
                break;
            };
            ranking.block_patterns.insert(exercise.movement_pattern);
            picked.push(exercise);
        }
    }

    if partial_selection {
        tracing::warn!(
            "Block '{}': only {} unused exercises for a target of {}, selected {}",
            block.title,
            fresh.len(),
            target,
            picked.len()
        );
    }

    tracing::debug!(
        "Block '{}' selected {:?}",
        block.title,
        picked.iter().map(|e| e.id.as_str()).collect::<Vec<_>>()
    );

    Selection {
        exercises: picked,
        partial_selection,
        skip_reason: None,
    }
}
