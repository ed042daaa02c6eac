//! Template catalog: named session shapes with nominal block weights.
//!
//! A template is an ordered list of slots. Each slot names the block kind,
//! the work format, a nominal time weight (renormalized at planning time, so
//! weights need not sum to one) and how many exercises the block wants.

use crate::types::{BlockFormat, BlockKind, MovementPattern, SetScheme};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static DEFAULT_TEMPLATES: Lazy<TemplateCatalog> = Lazy::new(build_default_templates);

/// Get a reference to the cached built-in templates
pub fn get_default_templates() -> &'static TemplateCatalog {
    &DEFAULT_TEMPLATES
}

/// Upper bound on a slot's exercise count
pub const MAX_EXERCISES_PER_BLOCK: usize = 50;

/// How many exercises a block should hold
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExerciseCount {
    Fixed { count: usize },
    /// One exercise per movement pattern present in the eligible pool
    PerPattern { min: usize, max: usize },
}

impl ExerciseCount {
    pub fn resolve(&self, pattern_count: usize) -> usize {
        match *self {
            ExerciseCount::Fixed { count } => count,
            ExerciseCount::PerPattern { min, max } => pattern_count.clamp(min, max.max(min)),
        }
    }
}

/// One block position within a template
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BlockSlot {
    pub kind: BlockKind,
    pub format: BlockFormat,
    pub weight: f64,
    pub exercises: ExerciseCount,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub work_sec: Option<u32>,
    #[serde(default)]
    pub rest_sec: Option<u32>,
    #[serde(default)]
    pub scheme: Option<SetScheme>,
    #[serde(default)]
    pub preferred_patterns: Vec<MovementPattern>,
}

impl BlockSlot {
    fn new(kind: BlockKind, format: BlockFormat, weight: f64, exercises: ExerciseCount) -> Self {
        Self {
            kind,
            format,
            weight,
            exercises,
            title: None,
            work_sec: None,
            rest_sec: None,
            scheme: None,
            preferred_patterns: Vec::new(),
        }
    }

    fn with_scheme(mut self, sets: u32, reps_min: u32, reps_max: u32, rest_sec: u32) -> Self {
        self.scheme = Some(SetScheme {
            sets,
            reps_min,
            reps_max,
            rest_sec,
        });
        self
    }

    fn preferring(mut self, patterns: &[MovementPattern]) -> Self {
        self.preferred_patterns = patterns.to_vec();
        self
    }

    /// Work and rest seconds per round; zero for non-interval formats
    pub fn work_rest(&self) -> (u32, u32) {
        let (work, rest) = self.format.default_work_rest().unwrap_or((0, 0));
        (self.work_sec.unwrap_or(work), self.rest_sec.unwrap_or(rest))
    }

    /// Set scheme for straight-set family formats
    pub fn resolved_scheme(&self) -> Option<SetScheme> {
        if self.format.is_interval() {
            return None;
        }
        Some(self.scheme.unwrap_or_else(|| default_scheme(self.format)))
    }

    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("{} - {}", self.kind, self.format))
    }
}

/// Fallback set scheme when a slot does not carry one
pub fn default_scheme(format: BlockFormat) -> SetScheme {
    match format {
        BlockFormat::Amrap => SetScheme {
            sets: 1,
            reps_min: 8,
            reps_max: 15,
            rest_sec: 0,
        },
        BlockFormat::ForTime => SetScheme {
            sets: 3,
            reps_min: 12,
            reps_max: 21,
            rest_sec: 0,
        },
        _ => SetScheme {
            sets: 3,
            reps_min: 8,
            reps_max: 12,
            rest_sec: 60,
        },
    }
}

/// A named session shape
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub name: String,
    pub label: String,
    pub slots: Vec<BlockSlot>,
}

impl Template {
    /// Validate the template, returning a list of problems
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Template has empty name".to_string());
        }
        if self.slots.is_empty() {
            errors.push(format!("Template '{}' has no slots", self.name));
        }

        for (idx, slot) in self.slots.iter().enumerate() {
            if !slot.weight.is_finite() || slot.weight <= 0.0 {
                errors.push(format!(
                    "Template '{}' slot {}: weight must be positive, got {}",
                    self.name, idx, slot.weight
                ));
            }
            if slot.format.is_interval() {
                let (work, rest) = slot.work_rest();
                if work == 0 {
                    errors.push(format!(
                        "Template '{}' slot {}: interval format needs work seconds",
                        self.name, idx
                    ));
                }
                match work.checked_add(rest) {
                    Some(0) => errors.push(format!(
                        "Template '{}' slot {}: round length is zero",
                        self.name, idx
                    )),
                    None => errors.push(format!(
                        "Template '{}' slot {}: round length {}s + {}s is out of range",
                        self.name, idx, work, rest
                    )),
                    Some(_) => {}
                }
            }
            if let Some(scheme) = slot.scheme {
                if scheme.sets == 0 {
                    errors.push(format!("Template '{}' slot {}: zero sets", self.name, idx));
                }
                if scheme.reps_min > scheme.reps_max {
                    errors.push(format!(
                        "Template '{}' slot {}: reps_min {} > reps_max {}",
                        self.name, idx, scheme.reps_min, scheme.reps_max
                    ));
                }
            }
            if let ExerciseCount::PerPattern { min, max } = slot.exercises {
                if min > max {
                    errors.push(format!(
                        "Template '{}' slot {}: min exercises {} > max {}",
                        self.name, idx, min, max
                    ));
                }
            }
            let most = match slot.exercises {
                ExerciseCount::Fixed { count } => count,
                ExerciseCount::PerPattern { min, max } => min.max(max),
            };
            if most > MAX_EXERCISES_PER_BLOCK {
                errors.push(format!(
                    "Template '{}' slot {}: {} exercises exceeds the limit of {}",
                    self.name, idx, most, MAX_EXERCISES_PER_BLOCK
                ));
            }
        }

        errors
    }
}

/// Registry of templates keyed by lowercase name
#[derive(Clone, Debug, Default)]
pub struct TemplateCatalog {
    templates: HashMap<String, Template>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a template
    pub fn insert(&mut self, template: Template) {
        self.templates
            .insert(template.name.trim().to_lowercase(), template);
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(&name.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Templates ordered by name
    pub fn sorted(&self) -> Vec<&Template> {
        let mut templates: Vec<_> = self.templates.values().collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        templates
    }

    /// Built-ins overlaid with extra templates (extras win on name clashes)
    pub fn with_overrides(extra: &[Template]) -> Self {
        let mut catalog = get_default_templates().clone();
        for template in extra {
            tracing::debug!("Registering template '{}'", template.name);
            catalog.insert(template.clone());
        }
        catalog
    }

    pub fn validate(&self) -> Vec<String> {
        self.sorted().into_iter().flat_map(|t| t.validate()).collect()
    }
}

fn warm_up(weight: f64) -> BlockSlot {
    BlockSlot::new(
        BlockKind::WarmUp,
        BlockFormat::StraightSets,
        weight,
        ExerciseCount::Fixed { count: 3 },
    )
    .with_scheme(2, 10, 10, 20)
    .preferring(&[MovementPattern::Mobility, MovementPattern::Locomotion])
}

fn cooldown(weight: f64) -> BlockSlot {
    BlockSlot::new(
        BlockKind::Cooldown,
        BlockFormat::StraightSets,
        weight,
        ExerciseCount::Fixed { count: 2 },
    )
    .with_scheme(1, 5, 8, 0)
    .preferring(&[MovementPattern::Mobility])
}

fn tabata_finisher(weight: f64) -> BlockSlot {
    BlockSlot::new(
        BlockKind::Finisher,
        BlockFormat::Tabata,
        weight,
        ExerciseCount::Fixed { count: 1 },
    )
    .preferring(&[MovementPattern::Jump, MovementPattern::Locomotion, MovementPattern::Core])
}

fn main_block(format: BlockFormat, weight: f64, min: usize, max: usize) -> BlockSlot {
    BlockSlot::new(
        BlockKind::Main,
        format,
        weight,
        ExerciseCount::PerPattern { min, max },
    )
}

fn template(name: &str, label: &str, slots: Vec<BlockSlot>) -> Template {
    Template {
        name: name.into(),
        label: label.into(),
        slots,
    }
}

/// Builds the built-in template registry
pub fn build_default_templates() -> TemplateCatalog {
    use BlockFormat::*;
    use MovementPattern::*;

    let mut catalog = TemplateCatalog::new();

    catalog.insert(template(
        "straight_sets",
        "Straight Sets",
        vec![
            warm_up(0.15),
            main_block(StraightSets, 0.70, 2, 5).with_scheme(4, 6, 10, 90),
            tabata_finisher(0.15),
        ],
    ));

    catalog.insert(template(
        "emom",
        "EMOM",
        vec![warm_up(0.15), main_block(Emom, 0.75, 2, 4), cooldown(0.10)],
    ));

    catalog.insert(template(
        "amrap",
        "AMRAP",
        vec![
            warm_up(0.15),
            main_block(Amrap, 0.70, 3, 5),
            tabata_finisher(0.15),
        ],
    ));

    catalog.insert(template(
        "tabata",
        "Tabata",
        vec![warm_up(0.20), main_block(Tabata, 0.65, 2, 4), cooldown(0.15)],
    ));

    catalog.insert(template(
        "for_time",
        "For Time",
        vec![warm_up(0.15), main_block(ForTime, 0.75, 3, 5), cooldown(0.10)],
    ));

    // Group class shapes, weighted in minutes of a 60' class
    catalog.insert(template(
        "cross_training",
        "Cross-Training",
        vec![warm_up(8.0), main_block(Amrap, 48.0, 3, 5), tabata_finisher(4.0)],
    ));

    catalog.insert(template(
        "hyrox",
        "Hyrox",
        vec![
            warm_up(8.0),
            main_block(ForTime, 48.0, 3, 5).preferring(&[Locomotion, Carry, Squat, Pull]),
            tabata_finisher(4.0),
        ],
    ));

    catalog.insert(template(
        "caf",
        "CAF",
        vec![
            warm_up(8.0),
            main_block(Amrap, 48.0, 3, 5).preferring(&[Squat, Lunge, Hinge, Core]),
            tabata_finisher(4.0),
        ],
    ));

    catalog.insert(template(
        "core_glutes",
        "Core & Glutes",
        vec![
            warm_up(8.0),
            main_block(Emom, 46.0, 2, 4).preferring(&[Core, Hinge, Rotation]),
            tabata_finisher(6.0),
        ],
    ));

    catalog
}
