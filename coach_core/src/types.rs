//! Core domain types for the session generation engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercise records and movement patterns
//! - Session requests (mode, intensity, constraints)
//! - Block plans, prescriptions and items
//! - Generated sessions and their advisory warnings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

// ============================================================================
// Exercise Types
// ============================================================================

/// Movement pattern used for balance and variety scoring
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MovementPattern {
    Push,
    Pull,
    Hinge,
    Squat,
    Lunge,
    Carry,
    Core,
    Rotation,
    Jump,
    Locomotion,
    Mobility,
}

impl MovementPattern {
    pub const ALL: [MovementPattern; 11] = [
        MovementPattern::Push,
        MovementPattern::Pull,
        MovementPattern::Hinge,
        MovementPattern::Squat,
        MovementPattern::Lunge,
        MovementPattern::Carry,
        MovementPattern::Core,
        MovementPattern::Rotation,
        MovementPattern::Jump,
        MovementPattern::Locomotion,
        MovementPattern::Mobility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementPattern::Push => "push",
            MovementPattern::Pull => "pull",
            MovementPattern::Hinge => "hinge",
            MovementPattern::Squat => "squat",
            MovementPattern::Lunge => "lunge",
            MovementPattern::Carry => "carry",
            MovementPattern::Core => "core",
            MovementPattern::Rotation => "rotation",
            MovementPattern::Jump => "jump",
            MovementPattern::Locomotion => "locomotion",
            MovementPattern::Mobility => "mobility",
        }
    }
}

impl fmt::Display for MovementPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        MovementPattern::ALL
            .into_iter()
            .find(|p| p.as_str() == needle)
            .ok_or_else(|| Error::Other(format!("Unknown movement pattern: {}", s)))
    }
}

/// An immutable exercise catalog entry
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseRecord {
    pub id: String,
    pub name: String,
    pub primary_muscle: String,
    #[serde(default)]
    pub secondary_muscles: Vec<String>,
    pub movement_pattern: MovementPattern,
    /// Equipment required; empty means bodyweight
    #[serde(default)]
    pub equipment: Vec<String>,
    /// Takes external resistance
    #[serde(default)]
    pub loadable: bool,
    pub seconds_per_rep: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ExerciseRecord {
    pub fn is_bodyweight(&self) -> bool {
        self.equipment.is_empty()
    }

    /// Primary muscle followed by the secondary muscles
    pub fn muscle_groups(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_muscle.as_str())
            .chain(self.secondary_muscles.iter().map(String::as_str))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// The read-only exercise catalog
#[derive(Clone, Debug, Default)]
pub struct ExerciseCatalog {
    pub exercises: HashMap<String, ExerciseRecord>,
}

// ============================================================================
// Request Types
// ============================================================================

/// Who the session is for
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    Individual,
    Collective,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Individual => f.write_str("individual"),
            SessionMode::Collective => f.write_str("collective"),
        }
    }
}

impl FromStr for SessionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "individual" | "individuel" => Ok(SessionMode::Individual),
            "collective" | "collectif" | "group" => Ok(SessionMode::Collective),
            other => Err(Error::InvalidRequest(format!("Unknown session mode: {}", other))),
        }
    }
}

/// Overall intensity, drives load guidance for loadable exercises
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Low,
    #[default]
    Moderate,
    High,
    Max,
}

impl Intensity {
    pub fn load_guidance(&self) -> &'static str {
        match self {
            Intensity::Low => "light load (60-65% 1RM)",
            Intensity::Moderate => "moderate load (70-75% 1RM)",
            Intensity::High => "heavy load (80-85% 1RM)",
            Intensity::Max => "near-maximal load (85-90% 1RM)",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intensity::Low => "low",
            Intensity::Moderate => "moderate",
            Intensity::High => "high",
            Intensity::Max => "max",
        };
        f.write_str(s)
    }
}

impl FromStr for Intensity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "light" => Ok(Intensity::Low),
            "moderate" | "medium" => Ok(Intensity::Moderate),
            "high" => Ok(Intensity::High),
            "max" | "maximal" => Ok(Intensity::Max),
            other => Err(Error::InvalidRequest(format!("Unknown intensity: {}", other))),
        }
    }
}

/// Input value object for one generation call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRequest {
    pub mode: SessionMode,
    pub duration_sec: u32,
    pub template: String,
    pub focus: Option<String>,
    #[serde(default)]
    pub equipment: BTreeSet<String>,
    #[serde(default)]
    pub exclusions: BTreeSet<String>,
    pub client_id: Option<String>,
    pub label: Option<String>,
    #[serde(default)]
    pub intensity: Intensity,
    /// Blocks carried over verbatim from a previous generation
    #[serde(default)]
    pub locked_blocks: Vec<SessionBlock>,
}

impl SessionRequest {
    /// A bodyweight-only individual request with no focus or exclusions
    pub fn new(template: impl Into<String>, duration_sec: u32) -> Self {
        Self {
            mode: SessionMode::Individual,
            duration_sec,
            template: template.into(),
            focus: None,
            equipment: BTreeSet::new(),
            exclusions: BTreeSet::new(),
            client_id: None,
            label: None,
            intensity: Intensity::default(),
            locked_blocks: Vec::new(),
        }
    }
}

// ============================================================================
// Block Types
// ============================================================================

/// Role of a block within the session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    WarmUp,
    Main,
    Finisher,
    Cooldown,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlockKind::WarmUp => "Warm-up",
            BlockKind::Main => "Main",
            BlockKind::Finisher => "Finisher",
            BlockKind::Cooldown => "Cooldown",
        };
        f.write_str(s)
    }
}

/// Work format of a block
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BlockFormat {
    StraightSets,
    Amrap,
    ForTime,
    Emom,
    Tabata,
}

impl BlockFormat {
    /// Interval formats are timed as rounds of work + rest
    pub fn is_interval(&self) -> bool {
        matches!(self, BlockFormat::Emom | BlockFormat::Tabata)
    }

    /// Default (work, rest) seconds per round for interval formats
    pub fn default_work_rest(&self) -> Option<(u32, u32)> {
        match self {
            BlockFormat::Emom => Some((45, 15)),
            BlockFormat::Tabata => Some((20, 10)),
            _ => None,
        }
    }
}

impl fmt::Display for BlockFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlockFormat::StraightSets => "Sets x Reps",
            BlockFormat::Amrap => "AMRAP",
            BlockFormat::ForTime => "For Time",
            BlockFormat::Emom => "EMOM",
            BlockFormat::Tabata => "Tabata",
        };
        f.write_str(s)
    }
}

/// Default volume for the straight-set family of formats
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetScheme {
    pub sets: u32,
    pub reps_min: u32,
    pub reps_max: u32,
    pub rest_sec: u32,
}

/// Intermediate plan for one block, consumed by selection and prescription
#[derive(Clone, Debug, PartialEq)]
pub struct BlockPlan {
    pub kind: BlockKind,
    pub format: BlockFormat,
    pub title: String,
    pub duration_sec: u32,
    pub target_exercise_count: usize,
    pub rounds: u32,
    pub work_sec: u32,
    pub rest_sec: u32,
    /// Rest of the last round, including leftover seconds folded in
    pub final_rest_sec: u32,
    pub scheme: Option<SetScheme>,
    pub preferred_patterns: Vec<MovementPattern>,
}

impl BlockPlan {
    pub fn effective_duration_sec(&self) -> u32 {
        effective_duration(
            self.format,
            self.duration_sec,
            self.rounds,
            self.work_sec,
            self.rest_sec,
            self.final_rest_sec,
        )
    }
}

fn effective_duration(
    format: BlockFormat,
    duration_sec: u32,
    rounds: u32,
    work_sec: u32,
    rest_sec: u32,
    final_rest_sec: u32,
) -> u32 {
    if format.is_interval() && rounds > 0 {
        rounds
            .saturating_mul(work_sec.saturating_add(rest_sec))
            .saturating_add(final_rest_sec.saturating_sub(rest_sec))
    } else {
        duration_sec
    }
}

// ============================================================================
// Prescription and Item Types
// ============================================================================

/// Concrete volume/intensity instruction, interpreted per block format
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Prescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_sec: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_sec: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_guidance: Option<String>,
}

impl fmt::Display for Prescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        match (self.sets, self.rounds) {
            (Some(sets), _) => parts.push(format!("{} sets", sets)),
            (None, Some(rounds)) => parts.push(format!("{} rounds", rounds)),
            _ => {}
        }
        match (self.reps, self.reps_min, self.reps_max) {
            (Some(reps), _, _) => parts.push(format!("{} reps", reps)),
            (None, Some(lo), Some(hi)) if lo == hi => parts.push(format!("{} reps", lo)),
            (None, Some(lo), Some(hi)) => parts.push(format!("{}-{} reps", lo, hi)),
            _ => {}
        }
        if let Some(work) = self.work_sec {
            parts.push(format!("{}s work", work));
        }
        if let Some(rest) = self.rest_sec {
            parts.push(format!("{}s rest", rest));
        }
        if let Some(ref load) = self.load_guidance {
            parts.push(load.clone());
        }
        f.write_str(&parts.join(", "))
    }
}

/// One exercise placed in a block
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionItem {
    pub exercise_id: String,
    pub prescription: Prescription,
    pub notes: Option<String>,
    /// The computed reps fell below one and were floored
    #[serde(default)]
    pub tight_fit: bool,
}

/// Why a block ended up without items
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoEligibleExercises,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoEligibleExercises => f.write_str("no eligible exercises"),
        }
    }
}

/// A finished block: metadata plus ordered items
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionBlock {
    pub id: Uuid,
    pub kind: BlockKind,
    pub format: BlockFormat,
    pub title: String,
    pub duration_sec: u32,
    pub rounds: u32,
    pub work_sec: u32,
    pub rest_sec: u32,
    pub final_rest_sec: u32,
    /// Do not auto-regenerate this block
    #[serde(default)]
    pub locked: bool,
    pub items: Vec<SessionItem>,
    #[serde(default)]
    pub partial_selection: bool,
    #[serde(default)]
    pub skip_reason: Option<SkipReason>,
}

impl SessionBlock {
    pub fn from_plan(plan: &BlockPlan, items: Vec<SessionItem>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: plan.kind,
            format: plan.format,
            title: plan.title.clone(),
            duration_sec: plan.duration_sec,
            rounds: plan.rounds,
            work_sec: plan.work_sec,
            rest_sec: plan.rest_sec,
            final_rest_sec: plan.final_rest_sec,
            locked: false,
            items,
            partial_selection: false,
            skip_reason: None,
        }
    }

    pub fn effective_duration_sec(&self) -> u32 {
        effective_duration(
            self.format,
            self.duration_sec,
            self.rounds,
            self.work_sec,
            self.rest_sec,
            self.final_rest_sec,
        )
    }

    pub fn exercise_ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|i| i.exercise_id.as_str())
    }
}

// ============================================================================
// Generated Session
// ============================================================================

/// Advisory condition attached to a generated session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationWarning {
    /// Locked blocks alone consume the requested duration
    DurationExceeded { requested_sec: u32, locked_sec: u32 },
    /// The focus matched nothing eligible and was ignored
    FocusDropped { focus: String },
    /// The block reused exercises or came up short of its target
    PartialSelection {
        block_index: usize,
        requested: usize,
        selected: usize,
    },
    BlockSkipped {
        block_index: usize,
        reason: SkipReason,
    },
    TightFit {
        block_index: usize,
        exercise_id: String,
    },
}

impl fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationWarning::DurationExceeded {
                requested_sec,
                locked_sec,
            } => write!(
                f,
                "locked blocks use {}s of the requested {}s",
                locked_sec, requested_sec
            ),
            GenerationWarning::FocusDropped { focus } => {
                write!(f, "focus '{}' matched no eligible exercise and was ignored", focus)
            }
            GenerationWarning::PartialSelection {
                block_index,
                requested,
                selected,
            } => write!(
                f,
                "block {}: pool too small ({} of {} exercises, repeats allowed)",
                block_index + 1,
                selected,
                requested
            ),
            GenerationWarning::BlockSkipped {
                block_index,
                reason,
            } => write!(f, "block {}: skipped ({})", block_index + 1, reason),
            GenerationWarning::TightFit {
                block_index,
                exercise_id,
            } => write!(
                f,
                "block {}: '{}' floored to 1 rep",
                block_index + 1,
                exercise_id
            ),
        }
    }
}

/// Root aggregate returned by the engine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeneratedSession {
    pub id: Uuid,
    pub client_id: Option<String>,
    pub mode: SessionMode,
    pub label: String,
    pub template: String,
    pub requested_duration_sec: u32,
    pub realized_duration_sec: u32,
    pub created_at: DateTime<Utc>,
    pub blocks: Vec<SessionBlock>,
    #[serde(default)]
    pub warnings: Vec<GenerationWarning>,
}

impl GeneratedSession {
    /// Realized minus requested duration, in seconds
    pub fn variance_sec(&self) -> i64 {
        i64::from(self.realized_duration_sec) - i64::from(self.requested_duration_sec)
    }

    pub fn item_count(&self) -> usize {
        self.blocks.iter().map(|b| b.items.len()).sum()
    }
}
