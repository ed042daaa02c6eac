//! Generation engine: runs the pipeline for one session request.
//!
//! request → validate → filter → plan → (per block) select → prescribe → assemble
//!
//! Only an invalid request aborts. Everything else (focus dropped, locked
//! blocks over budget, short pools, floored reps) is attached to the returned
//! session as warnings and block flags.

use crate::assembler::assemble;
use crate::filter::filter_exercises;
use crate::planner::{plan_blocks, PlannedBlock};
use crate::prescription::prescribe;
use crate::selector::{select_exercises, CoverageTracker};
use crate::templates::{Template, TemplateCatalog};
use crate::{
    Error, ExerciseCatalog, GeneratedSession, GenerationWarning, Result, SessionBlock,
    SessionItem, SessionRequest,
};
use chrono::Utc;

/// Four hours
pub const DEFAULT_MAX_DURATION_SEC: u32 = 14_400;

/// Reject malformed requests before anything is computed
///
/// Returns the resolved template on success.
pub fn validate_request<'t>(
    request: &SessionRequest,
    templates: &'t TemplateCatalog,
    max_duration_sec: u32,
) -> Result<&'t Template> {
    if request.duration_sec == 0 {
        return Err(Error::InvalidRequest(
            "Duration must be a positive number of seconds".into(),
        ));
    }
    if request.duration_sec > max_duration_sec {
        return Err(Error::InvalidRequest(format!(
            "Duration {}s exceeds the maximum of {}s",
            request.duration_sec, max_duration_sec
        )));
    }

    let template = templates.get(&request.template).ok_or_else(|| {
        Error::InvalidRequest(format!("Unknown template '{}'", request.template))
    })?;

    if request.equipment.iter().any(|e| e.trim().is_empty()) {
        return Err(Error::InvalidRequest("Equipment names must not be blank".into()));
    }
    if request.exclusions.iter().any(|e| e.trim().is_empty()) {
        return Err(Error::InvalidRequest("Excluded exercise ids must not be blank".into()));
    }

    for (idx, block) in request.locked_blocks.iter().enumerate() {
        if !block.locked {
            return Err(Error::InvalidRequest(format!(
                "Carried-over block {} ('{}') is not marked locked",
                idx + 1,
                block.title
            )));
        }
        if block.duration_sec == 0 {
            return Err(Error::InvalidRequest(format!(
                "Locked block {} ('{}') has no duration",
                idx + 1,
                block.title
            )));
        }
        let effective = block.effective_duration_sec().max(block.duration_sec);
        if effective > max_duration_sec {
            return Err(Error::InvalidRequest(format!(
                "Locked block {} ('{}') runs {}s, above the maximum of {}s",
                idx + 1,
                block.title,
                effective,
                max_duration_sec
            )));
        }
    }

    Ok(template)
}

/// Generate a session with the default duration limit
pub fn generate_session(
    request: &SessionRequest,
    catalog: &ExerciseCatalog,
    templates: &TemplateCatalog,
) -> Result<GeneratedSession> {
    generate_session_with_limit(request, catalog, templates, DEFAULT_MAX_DURATION_SEC)
}

/// Generate a session
///
/// ## Pipeline
///
/// 1. **Validate**: duration, template, equipment/exclusion strings, locked blocks
/// 2. **Filter**: one eligible set for the whole session (focus fails open)
/// 3. **Plan**: locked blocks keep their slot, the remainder is apportioned
/// 4. **Select + prescribe**: open blocks in order, sharing one coverage tracker
///    that already knows the locked blocks' exercises
/// 5. **Assemble**: realized duration, label, warnings
pub fn generate_session_with_limit(
    request: &SessionRequest,
    catalog: &ExerciseCatalog,
    templates: &TemplateCatalog,
    max_duration_sec: u32,
) -> Result<GeneratedSession> {
    let template = validate_request(request, templates, max_duration_sec)?;

    tracing::info!(
        "Generating '{}' session: {}s, {} mode, {} locked blocks",
        template.name,
        request.duration_sec,
        request.mode,
        request.locked_blocks.len()
    );

    let mut warnings = Vec::new();

    let eligible = filter_exercises(
        catalog,
        &request.equipment,
        &request.exclusions,
        request.focus.as_deref(),
    );
    if eligible.focus_dropped {
        if let Some(ref focus) = request.focus {
            warnings.push(GenerationWarning::FocusDropped {
                focus: focus.clone(),
            });
        }
    }

    let planning = plan_blocks(
        template,
        request.duration_sec,
        &request.locked_blocks,
        eligible.pattern_count(),
    );
    if planning.duration_exceeded {
        tracing::warn!(
            "Locked blocks use {}s of the requested {}s, returning locked blocks only",
            planning.locked_sec,
            request.duration_sec
        );
        warnings.push(GenerationWarning::DurationExceeded {
            requested_sec: request.duration_sec,
            locked_sec: planning.locked_sec,
        });
    }

    let mut coverage = CoverageTracker::new();
    for block in &request.locked_blocks {
        coverage.absorb_block(block, catalog);
    }

    let mut blocks = Vec::with_capacity(planning.blocks.len());
    for (block_index, planned) in planning.blocks.into_iter().enumerate() {
        let plan = match planned {
            PlannedBlock::Locked(block) => {
                blocks.push(block);
                continue;
            }
            PlannedBlock::Open(plan) => plan,
        };

        let selection = select_exercises(&eligible, &plan, &mut coverage, request.mode);
        let items: Vec<SessionItem> = selection
            .exercises
            .iter()
            .map(|exercise| prescribe(exercise, &plan, request.intensity))
            .collect();

        for item in items.iter().filter(|i| i.tight_fit) {
            warnings.push(GenerationWarning::TightFit {
                block_index,
                exercise_id: item.exercise_id.clone(),
            });
        }
        if let Some(reason) = selection.skip_reason {
            warnings.push(GenerationWarning::BlockSkipped {
                block_index,
                reason,
            });
        } else if selection.partial_selection {
            warnings.push(GenerationWarning::PartialSelection {
                block_index,
                requested: plan.target_exercise_count,
                selected: items.len(),
            });
        }

        let mut block = SessionBlock::from_plan(&plan, items);
        block.partial_selection = selection.partial_selection;
        block.skip_reason = selection.skip_reason;
        blocks.push(block);
    }

    Ok(assemble(request, template, blocks, warnings, Utc::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::get_default_templates;
    use crate::{build_default_catalog, BlockFormat, BlockKind, SkipReason};

    #[test]
    fn test_zero_duration_rejected() {
        let request = SessionRequest::new("straight_sets", 0);
        let result = generate_session(&request, &build_default_catalog(), get_default_templates());
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_duration_above_limit_rejected() {
        let request = SessionRequest::new("emom", 7200);
        let result = generate_session_with_limit(
            &request,
            &build_default_catalog(),
            get_default_templates(),
            3600,
        );
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_unknown_template_rejected() {
        let request = SessionRequest::new("zumba", 1800);
        let err = validate_request(&request, get_default_templates(), DEFAULT_MAX_DURATION_SEC)
            .unwrap_err();
        assert!(err.to_string().contains("zumba"));
    }

    #[test]
    fn test_blank_equipment_and_exclusions_rejected() {
        let templates = get_default_templates();

        let mut request = SessionRequest::new("emom", 600);
        request.equipment.insert("  ".into());
        assert!(validate_request(&request, templates, DEFAULT_MAX_DURATION_SEC).is_err());

        let mut request = SessionRequest::new("emom", 600);
        request.exclusions.insert(String::new());
        assert!(validate_request(&request, templates, DEFAULT_MAX_DURATION_SEC).is_err());
    }

    #[test]
    fn test_unlocked_carried_block_rejected() {
        let catalog = build_default_catalog();
        let templates = get_default_templates();
        let previous = generate_session(&SessionRequest::new("emom", 600), &catalog, templates).unwrap();

        let mut request = SessionRequest::new("emom", 600);
        request.locked_blocks.push(previous.blocks[0].clone());
        assert!(matches!(
            validate_request(&request, templates, DEFAULT_MAX_DURATION_SEC),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_template_lookup_is_case_insensitive() {
        let request = SessionRequest::new("Straight_Sets", 1800);
        let session = generate_session(&request, &build_default_catalog(), get_default_templates()).unwrap();
        assert_eq!(session.template, "straight_sets");
    }

    #[test]
    fn test_generates_all_template_blocks() {
        let request = SessionRequest::new("straight_sets", 1800);
        let session = generate_session(&request, &build_default_catalog(), get_default_templates()).unwrap();

        let kinds: Vec<_> = session.blocks.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BlockKind::WarmUp, BlockKind::Main, BlockKind::Finisher]);
        assert!(session.blocks.iter().all(|b| !b.items.is_empty()));
        assert_eq!(session.label, "Straight Sets 30' (individual)");
        assert_eq!(session.realized_duration_sec, 1800);
    }

    #[test]
    fn test_empty_catalog_skips_every_block() {
        let request = SessionRequest::new("tabata", 1200);
        let session = generate_session(&request, &ExerciseCatalog::default(), get_default_templates()).unwrap();

        assert_eq!(session.blocks.len(), 3);
        for block in &session.blocks {
            assert!(block.items.is_empty());
            assert_eq!(block.skip_reason, Some(SkipReason::NoEligibleExercises));
        }
        let skipped = session
            .warnings
            .iter()
            .filter(|w| matches!(w, GenerationWarning::BlockSkipped { .. }))
            .count();
        assert_eq!(skipped, 3);
    }

    #[test]
    fn test_locked_only_session_when_budget_consumed() {
        let catalog = build_default_catalog();
        let templates = get_default_templates();
        let previous = generate_session(&SessionRequest::new("emom", 1200), &catalog, templates).unwrap();

        let mut main = previous.blocks[1].clone();
        main.locked = true;
        let mut request = SessionRequest::new("emom", 600);
        request.locked_blocks.push(main.clone());

        let session = generate_session(&request, &catalog, templates).unwrap();
        assert_eq!(session.blocks, vec![main]);
        assert!(session
            .warnings
            .iter()
            .any(|w| matches!(w, GenerationWarning::DurationExceeded { requested_sec: 600, .. })));
    }

    #[test]
    fn test_oversized_locked_block_rejected() {
        let catalog = build_default_catalog();
        let templates = get_default_templates();
        let previous = generate_session(&SessionRequest::new("tabata", 1200), &catalog, templates).unwrap();

        let mut finisher = previous
            .blocks
            .iter()
            .find(|b| b.format == BlockFormat::Tabata)
            .unwrap()
            .clone();
        finisher.locked = true;
        finisher.rounds = 200_000_000;
        finisher.work_sec = 20;
        finisher.rest_sec = 10;

        let mut request = SessionRequest::new("tabata", 1200);
        request.locked_blocks.push(finisher);

        let err = generate_session(&request, &catalog, templates).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert!(err.to_string().contains("above the maximum"));
    }
}
