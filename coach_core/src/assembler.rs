//! Session assembler: composes finished blocks into the session aggregate.

use crate::templates::Template;
use crate::types::{GeneratedSession, GenerationWarning, SessionBlock, SessionRequest};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Sum of effective block durations
///
/// Interval blocks count `rounds * (work + rest)` plus any leftover folded into
/// the last rest; other blocks count their nominal duration.
pub fn realized_duration(blocks: &[SessionBlock]) -> u32 {
    blocks
        .iter()
        .fold(0u32, |acc, b| acc.saturating_add(b.effective_duration_sec()))
}

/// Default label, e.g. `Hyrox 60' (collective)`
pub fn default_label(request: &SessionRequest, template: &Template) -> String {
    format!(
        "{} {}' ({})",
        template.label,
        request.duration_sec / 60,
        request.mode
    )
}

/// Build the session in planner order
///
/// The realized duration is reported alongside the requested one and is never
/// corrected here.
pub fn assemble(
    request: &SessionRequest,
    template: &Template,
    blocks: Vec<SessionBlock>,
    warnings: Vec<GenerationWarning>,
    created_at: DateTime<Utc>,
) -> GeneratedSession {
    let realized_duration_sec = realized_duration(&blocks);
    let label = request
        .label
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_label(request, template));

    let session = GeneratedSession {
        id: Uuid::new_v4(),
        client_id: request.client_id.clone(),
        mode: request.mode,
        label,
        template: template.name.clone(),
        requested_duration_sec: request.duration_sec,
        realized_duration_sec,
        created_at,
        blocks,
        warnings,
    };

    tracing::info!(
        "Assembled '{}': {} blocks, {} items, {}s realized vs {}s requested",
        session.label,
        session.blocks.len(),
        session.item_count(),
        session.realized_duration_sec,
        session.requested_duration_sec
    );

    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::get_default_templates;
    use crate::types::{BlockFormat, BlockKind, SessionMode};

    fn block(format: BlockFormat, duration: u32, rounds: u32, work: u32, rest: u32, final_rest: u32) -> SessionBlock {
        SessionBlock {
            id: Uuid::new_v4(),
            kind: BlockKind::Main,
            format,
            title: "Block".into(),
            duration_sec: duration,
            rounds,
            work_sec: work,
            rest_sec: rest,
            final_rest_sec: final_rest,
            locked: false,
            items: vec![],
            partial_selection: false,
            skip_reason: None,
        }
    }

    #[test]
    fn test_realized_duration_counts_interval_rounds() {
        let blocks = vec![
            block(BlockFormat::StraightSets, 270, 0, 0, 0, 0),
            block(BlockFormat::Emom, 1260, 21, 45, 15, 15),
            // 9 rounds of 30s with 15s folded into the last rest
            block(BlockFormat::Tabata, 285, 9, 20, 10, 25),
        ];
        assert_eq!(realized_duration(&blocks), 270 + 1260 + 285);
    }

    #[test]
    fn test_realized_duration_reports_rounding_overrun() {
        // Minimum one round even when the budget is shorter
        let blocks = vec![block(BlockFormat::Tabata, 9, 1, 20, 10, 10)];
        assert_eq!(realized_duration(&blocks), 30);
    }

    #[test]
    fn test_assemble_copies_request_header() {
        let templates = get_default_templates();
        let template = templates.get("hyrox").unwrap();
        let mut request = SessionRequest::new("hyrox", 3600);
        request.mode = SessionMode::Collective;
        request.client_id = Some("client-7".into());

        let created_at = Utc::now();
        let session = assemble(
            &request,
            template,
            vec![block(BlockFormat::ForTime, 3600, 0, 0, 0, 0)],
            vec![],
            created_at,
        );

        assert_eq!(session.label, "Hyrox 60' (collective)");
        assert_eq!(session.template, "hyrox");
        assert_eq!(session.client_id.as_deref(), Some("client-7"));
        assert_eq!(session.requested_duration_sec, 3600);
        assert_eq!(session.realized_duration_sec, 3600);
        assert_eq!(session.variance_sec(), 0);
        assert_eq!(session.created_at, created_at);
    }

    #[test]
    fn test_explicit_label_wins() {
        let templates = get_default_templates();
        let template = templates.get("emom").unwrap();
        let mut request = SessionRequest::new("emom", 600);
        request.label = Some("  Tuesday group  ".into());

        let session = assemble(&request, template, vec![], vec![], Utc::now());
        assert_eq!(session.label, "Tuesday group");
        assert_eq!(session.realized_duration_sec, 0);
        assert_eq!(session.variance_sec(), -600);
    }
}
