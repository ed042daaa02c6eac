//! Prescription calculator: turns an exercise placed in a block into sets/reps/rest.
//!
//! Rep counts are floored so the prescription never implies more volume than
//! the time allows, and never drop below one.

use crate::templates::default_scheme;
use crate::types::{
    BlockFormat, BlockPlan, ExerciseRecord, Intensity, Prescription, SessionItem,
};

/// Used when a record carries a non-positive per-rep estimate
const FALLBACK_SECONDS_PER_REP: f64 = 3.0;

/// Floor to an integer >= 1, reporting whether the raw value was below one
fn floor_reps(raw: f64) -> (u32, bool) {
    let floored = if raw.is_finite() { raw.floor() } else { 0.0 };
    if floored < 1.0 {
        (1, true)
    } else {
        (floored as u32, false)
    }
}

fn format_note(block: &BlockPlan) -> Option<String> {
    match block.format {
        BlockFormat::StraightSets => None,
        BlockFormat::Amrap => Some(format!(
            "As many rounds as possible in {} min",
            (block.duration_sec / 60).max(1)
        )),
        BlockFormat::ForTime => Some("Complete for time".to_string()),
        BlockFormat::Emom => Some("Every minute on the minute".to_string()),
        BlockFormat::Tabata => Some("Max effort during work intervals".to_string()),
    }
}

/// Build the item for `exercise` in `block`
pub fn prescribe(exercise: &ExerciseRecord, block: &BlockPlan, intensity: Intensity) -> SessionItem {
    let load_guidance = exercise
        .loadable
        .then(|| intensity.load_guidance().to_string());

    let (prescription, tight_fit) = if block.format.is_interval() {
        let seconds_per_rep = if exercise.seconds_per_rep.is_finite() && exercise.seconds_per_rep > 0.0 {
            exercise.seconds_per_rep
        } else {
            FALLBACK_SECONDS_PER_REP
        };
        let (reps, tight_fit) = floor_reps(f64::from(block.work_sec) / seconds_per_rep);

        let prescription = Prescription {
            rounds: Some(block.rounds.max(1)),
            reps: Some(reps),
            work_sec: Some(block.work_sec),
            rest_sec: Some(block.rest_sec),
            load_guidance,
            ..Default::default()
        };
        (prescription, tight_fit)
    } else {
        let scheme = block.scheme.unwrap_or_else(|| default_scheme(block.format));
        let (reps_min, tight_fit) = floor_reps(f64::from(scheme.reps_min));
        let reps_max = scheme.reps_max.max(reps_min);

        let prescription = Prescription {
            sets: Some(scheme.sets.max(1)),
            reps_min: Some(reps_min),
            reps_max: Some(reps_max),
            rest_sec: (scheme.rest_sec > 0).then_some(scheme.rest_sec),
            load_guidance,
            ..Default::default()
        };
        (prescription, tight_fit)
    };

    if tight_fit {
        tracing::debug!(
            "'{}' floored to 1 rep in block '{}'",
            exercise.id,
            block.title
        );
    }

    SessionItem {
        exercise_id: exercise.id.clone(),
        prescription,
        notes: format_note(block),
        tight_fit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_default_catalog;
    use crate::types::{BlockKind, SetScheme};

    fn interval_plan(format: BlockFormat, work: u32, rest: u32, rounds: u32) -> BlockPlan {
        BlockPlan {
            kind: BlockKind::Main,
            format,
            title: "Main".into(),
            duration_sec: rounds * (work + rest),
            target_exercise_count: 3,
            rounds,
            work_sec: work,
            rest_sec: rest,
            final_rest_sec: rest,
            scheme: None,
            preferred_patterns: vec![],
        }
    }

    fn straight_plan(format: BlockFormat, scheme: Option<SetScheme>) -> BlockPlan {
        BlockPlan {
            kind: BlockKind::Main,
            format,
            title: "Main".into(),
            duration_sec: 1260,
            target_exercise_count: 3,
            rounds: 0,
            work_sec: 0,
            rest_sec: 0,
            final_rest_sec: 0,
            scheme,
            preferred_patterns: vec![],
        }
    }

    #[test]
    fn test_emom_reps_fit_work_window() {
        let catalog = build_default_catalog();
        let burpee = catalog.get("burpee").unwrap();
        let block = interval_plan(BlockFormat::Emom, 45, 15, 10);

        let item = prescribe(burpee, &block, Intensity::Moderate);

        // 45s / 3s per rep
        assert_eq!(item.prescription.reps, Some(15));
        assert_eq!(item.prescription.rounds, Some(10));
        assert_eq!(item.prescription.rest_sec, Some(15));
        assert_eq!(item.prescription.load_guidance, None);
        assert_eq!(item.notes.as_deref(), Some("Every minute on the minute"));
        assert!(!item.tight_fit);
    }

    #[test]
    fn test_reps_are_floored() {
        let catalog = build_default_catalog();
        let lunge = catalog.get("walking_lunge").unwrap();
        let block = interval_plan(BlockFormat::Tabata, 20, 10, 8);

        let item = prescribe(lunge, &block, Intensity::Moderate);
        // 20 / 2.5 = 8 exactly; 21 / 2.5 = 8.4 floors to 8
        assert_eq!(item.prescription.reps, Some(8));

        let block = interval_plan(BlockFormat::Tabata, 21, 9, 8);
        let item = prescribe(lunge, &block, Intensity::Moderate);
        assert_eq!(item.prescription.reps, Some(8));
    }

    #[test]
    fn test_tight_fit_floors_to_one() {
        let catalog = build_default_catalog();
        let stretch = catalog.get("worlds_greatest_stretch").unwrap();
        let block = interval_plan(BlockFormat::Tabata, 5, 10, 4);

        let item = prescribe(stretch, &block, Intensity::Low);
        assert_eq!(item.prescription.reps, Some(1));
        assert!(item.tight_fit);
    }

    #[test]
    fn test_non_positive_seconds_per_rep_uses_fallback() {
        let mut record = build_default_catalog().exercises["push_up"].clone();
        record.seconds_per_rep = 0.0;
        let block = interval_plan(BlockFormat::Emom, 45, 15, 5);

        let item = prescribe(&record, &block, Intensity::Moderate);
        assert_eq!(item.prescription.reps, Some(15));
    }

    #[test]
    fn test_straight_sets_use_scheme_and_load_guidance() {
        let catalog = build_default_catalog();
        let deadlift = catalog.get("deadlift").unwrap();
        let scheme = SetScheme {
            sets: 4,
            reps_min: 6,
            reps_max: 10,
            rest_sec: 90,
        };
        let block = straight_plan(BlockFormat::StraightSets, Some(scheme));

        let item = prescribe(deadlift, &block, Intensity::High);
        assert_eq!(item.prescription.sets, Some(4));
        assert_eq!(item.prescription.reps_min, Some(6));
        assert_eq!(item.prescription.reps_max, Some(10));
        assert_eq!(item.prescription.rest_sec, Some(90));
        assert_eq!(
            item.prescription.load_guidance.as_deref(),
            Some("heavy load (80-85% 1RM)")
        );
        assert!(item.notes.is_none());
        assert_eq!(
            item.prescription.to_string(),
            "4 sets, 6-10 reps, 90s rest, heavy load (80-85% 1RM)"
        );
    }

    #[test]
    fn test_zero_rep_scheme_is_floored() {
        let catalog = build_default_catalog();
        let push_up = catalog.get("push_up").unwrap();
        let scheme = SetScheme {
            sets: 0,
            reps_min: 0,
            reps_max: 0,
            rest_sec: 0,
        };
        let block = straight_plan(BlockFormat::StraightSets, Some(scheme));

        let item = prescribe(push_up, &block, Intensity::Moderate);
        assert_eq!(item.prescription.sets, Some(1));
        assert_eq!(item.prescription.reps_min, Some(1));
        assert_eq!(item.prescription.reps_max, Some(1));
        assert_eq!(item.prescription.rest_sec, None);
        assert!(item.tight_fit);
    }

    #[test]
    fn test_amrap_note_and_default_scheme() {
        let catalog = build_default_catalog();
        let swing = catalog.get("kettlebell_swing").unwrap();
        let block = straight_plan(BlockFormat::Amrap, None);

        let item = prescribe(swing, &block, Intensity::Moderate);
        assert_eq!(
            item.notes.as_deref(),
            Some("As many rounds as possible in 21 min")
        );
        assert_eq!(item.prescription.reps_min, Some(8));
        assert_eq!(item.prescription.reps_max, Some(15));
        assert_eq!(
            item.prescription.load_guidance.as_deref(),
            Some("moderate load (70-75% 1RM)")
        );
    }
}
