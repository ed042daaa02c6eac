//! Exercise filter: narrows the catalog to the eligible subset for a request.
//!
//! Rules, in order of precedence:
//! - Exclusions remove an exercise unconditionally
//! - Required equipment must be a subset of the available equipment
//! - Focus keeps exercises whose pattern or tags intersect the focus
//!   category, and is dropped (fail-open) when nothing would remain

use crate::types::{ExerciseCatalog, ExerciseRecord, MovementPattern};
use std::collections::{BTreeSet, HashSet};

/// Exercises that passed the request filters, ordered by id
#[derive(Clone, Debug)]
pub struct EligibleSet<'a> {
    exercises: Vec<&'a ExerciseRecord>,
    /// Focus was requested but matched nothing and was ignored
    pub focus_dropped: bool,
}

impl<'a> EligibleSet<'a> {
    pub fn new(mut exercises: Vec<&'a ExerciseRecord>) -> Self {
        exercises.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            exercises,
            focus_dropped: false,
        }
    }

    pub fn exercises(&self) -> &[&'a ExerciseRecord] {
        &self.exercises
    }

    pub fn get(&self, id: &str) -> Option<&'a ExerciseRecord> {
        self.exercises.iter().find(|e| e.id == id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// Number of distinct movement patterns in the pool
    pub fn pattern_count(&self) -> usize {
        self.exercises
            .iter()
            .map(|e| e.movement_pattern)
            .collect::<HashSet<_>>()
            .len()
    }
}

/// What a focus tag matches: any listed pattern or any listed tag
#[derive(Debug, PartialEq)]
struct FocusCategory {
    patterns: Vec<MovementPattern>,
    tags: Vec<String>,
}

impl FocusCategory {
    /// `None` means the focus does not restrict anything
    fn resolve(focus: &str) -> Option<Self> {
        use MovementPattern::*;

        let key = focus.trim().to_lowercase().replace(['-', ' '], "_");
        let (patterns, tags): (&[MovementPattern], &[&str]) = match key.as_str() {
            "" | "full_body" | "fullbody" | "full" => return None,
            "upper" | "upper_body" => (&[Push, Pull, Carry], &["upper_body"]),
            "lower" | "lower_body" => (&[Squat, Hinge, Lunge], &["lower_body"]),
            "push" => (&[Push], &[]),
            "pull" => (&[Pull], &[]),
            "core" => (&[Core, Rotation, Carry], &["core"]),
            "mobility" => (&[Mobility], &["mobility"]),
            "strength" | "force" => (&[], &["strength", "force"]),
            "conditioning" | "cardio" | "endurance" => {
                (&[], &["cardio", "conditioning", "endurance"])
            }
            "hypertrophy" => (&[], &["hypertrophy", "muscle"]),
            "technique" | "skill" => (&[], &["technique", "skill"]),
            _ => {
                let patterns = key.parse::<MovementPattern>().into_iter().collect();
                return Some(Self {
                    patterns,
                    tags: vec![key],
                });
            }
        };

        Some(Self {
            patterns: patterns.to_vec(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        })
    }

    fn matches(&self, exercise: &ExerciseRecord) -> bool {
        self.patterns.contains(&exercise.movement_pattern)
            || self.tags.iter().any(|t| exercise.has_tag(t))
    }
}

fn normalize(items: &BTreeSet<String>) -> HashSet<String> {
    items.iter().map(|s| s.trim().to_lowercase()).collect()
}

/// Compute the eligible exercise set for a request
pub fn filter_exercises<'a>(
    catalog: &'a ExerciseCatalog,
    equipment: &BTreeSet<String>,
    exclusions: &BTreeSet<String>,
    focus: Option<&str>,
) -> EligibleSet<'a> {
    let available = normalize(equipment);

    let base: Vec<&ExerciseRecord> = catalog
        .exercises
        .values()
        .filter(|e| !exclusions.contains(&e.id))
        .filter(|e| {
            e.equipment
                .iter()
                .all(|req| available.contains(&req.trim().to_lowercase()))
        })
        .collect();

    tracing::debug!(
        "{} of {} exercises pass equipment/exclusion filters",
        base.len(),
        catalog.len()
    );

    let Some(focus) = focus else {
        return EligibleSet::new(base);
    };
    let Some(category) = FocusCategory::resolve(focus) else {
        return EligibleSet::new(base);
    };

    let focused: Vec<&ExerciseRecord> = base
        .iter()
        .copied()
        .filter(|e| category.matches(e))
        .collect();

    if focused.is_empty() && !base.is_empty() {
        tracing::warn!(
            "Focus '{}' matches none of the {} eligible exercises, ignoring focus",
            focus,
            base.len()
        );
        let mut eligible = EligibleSet::new(base);
        eligible.focus_dropped = true;
        return eligible;
    }

    EligibleSet::new(focused)
}
