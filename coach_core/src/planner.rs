//! Block planner: turns a template and a time budget into ordered block plans.
//!
//! Locked blocks claim the first free template slot of the same kind and are
//! returned untouched. The remaining budget is apportioned over the open slots
//! by renormalized weight using largest-remainder rounding, so open block
//! durations always sum to exactly `total - locked`.

use crate::templates::{BlockSlot, Template};
use crate::types::{BlockPlan, SessionBlock};

/// A planner output slot
#[derive(Clone, Debug, PartialEq)]
pub enum PlannedBlock {
    /// Carried over verbatim, skips selection and prescription
    Locked(SessionBlock),
    /// Needs exercises
    Open(BlockPlan),
}

impl PlannedBlock {
    pub fn duration_sec(&self) -> u32 {
        match self {
            PlannedBlock::Locked(block) => block.duration_sec,
            PlannedBlock::Open(plan) => plan.duration_sec,
        }
    }
}

/// Result of planning one session
#[derive(Clone, Debug)]
pub struct BlockPlanning {
    pub blocks: Vec<PlannedBlock>,
    pub locked_sec: u32,
    /// Budget left for open blocks after locked blocks
    pub remaining_sec: u32,
    /// Locked blocks alone consume the whole requested duration
    pub duration_exceeded: bool,
}

impl BlockPlanning {
    pub fn open_plans(&self) -> impl Iterator<Item = &BlockPlan> {
        self.blocks.iter().filter_map(|b| match b {
            PlannedBlock::Open(plan) => Some(plan),
            PlannedBlock::Locked(_) => None,
        })
    }
}

/// Plan the blocks of a session
///
/// `pattern_count` is the number of distinct movement patterns in the eligible
/// pool, used to size per-pattern blocks.
pub fn plan_blocks(
    template: &Template,
    total_duration_sec: u32,
    locked_blocks: &[SessionBlock],
    pattern_count: usize,
) -> BlockPlanning {
    let locked_total: u64 = locked_blocks.iter().map(|b| u64::from(b.duration_sec)).sum();
    let locked_sec = u32::try_from(locked_total).unwrap_or(u32::MAX);

    // Slot index -> locked block index
    let mut claims: Vec<Option<usize>> = vec![None; template.slots.len()];
    let mut unmatched = Vec::new();
    for (locked_idx, block) in locked_blocks.iter().enumerate() {
        let free_slot = template
            .slots
            .iter()
            .enumerate()
            .position(|(slot_idx, slot)| slot.kind == block.kind && claims[slot_idx].is_none());
        match free_slot {
            Some(slot_idx) => claims[slot_idx] = Some(locked_idx),
            None => unmatched.push(locked_idx),
        }
    }

    if locked_total >= u64::from(total_duration_sec) && !locked_blocks.is_empty() {
        let mut blocks: Vec<PlannedBlock> = claims
            .iter()
            .flatten()
            .map(|&idx| PlannedBlock::Locked(locked_blocks[idx].clone()))
            .collect();
        blocks.extend(
            unmatched
                .iter()
                .map(|&idx| PlannedBlock::Locked(locked_blocks[idx].clone())),
        );
        return BlockPlanning {
            blocks,
            locked_sec,
            remaining_sec: 0,
            duration_exceeded: true,
        };
    }

    let remaining_sec = total_duration_sec - locked_sec;
    let open_weights: Vec<f64> = template
        .slots
        .iter()
        .zip(&claims)
        .filter(|(_, claim)| claim.is_none())
        .map(|(slot, _)| slot.weight)
        .collect();
    let mut durations = apportion(remaining_sec, &open_weights).into_iter();

    let mut blocks = Vec::with_capacity(template.slots.len() + unmatched.len());
    for (slot, claim) in template.slots.iter().zip(&claims) {
        match claim {
            Some(idx) => blocks.push(PlannedBlock::Locked(locked_blocks[*idx].clone())),
            None => {
                let duration = durations.next().unwrap_or(0);
                blocks.push(PlannedBlock::Open(build_plan(slot, duration, pattern_count)));
            }
        }
    }
    blocks.extend(
        unmatched
            .iter()
            .map(|&idx| PlannedBlock::Locked(locked_blocks[idx].clone())),
    );

    tracing::debug!(
        "Planned {} blocks for template '{}' ({}s open, {}s locked)",
        blocks.len(),
        template.name,
        remaining_sec,
        locked_sec
    );

    BlockPlanning {
        blocks,
        locked_sec,
        remaining_sec,
        duration_exceeded: false,
    }
}

/// Split `total` seconds proportionally to `weights`, summing exactly to `total`
pub fn apportion(total: u32, weights: &[f64]) -> Vec<u32> {
    if weights.is_empty() {
        return Vec::new();
    }

    let weight_sum: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    if weight_sum <= 0.0 {
        // Degenerate weights: split evenly
        let equal = vec![1.0; weights.len()];
        return apportion(total, &equal);
    }

    let raw: Vec<f64> = weights
        .iter()
        .map(|w| {
            let w = if w.is_finite() && *w > 0.0 { *w } else { 0.0 };
            f64::from(total) * w / weight_sum
        })
        .collect();

    let mut shares: Vec<u32> = raw.iter().map(|r| r.floor() as u32).collect();
    let assigned: u32 = shares.iter().sum();
    let mut leftover = total.saturating_sub(assigned);

    let mut by_remainder: Vec<usize> = (0..raw.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = raw[a] - raw[a].floor();
        let rb = raw[b] - raw[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });

    for idx in by_remainder.into_iter().cycle() {
        if leftover == 0 {
            break;
        }
        shares[idx] += 1;
        leftover -= 1;
    }

    shares
}

fn build_plan(slot: &BlockSlot, duration_sec: u32, pattern_count: usize) -> BlockPlan {
    let (work_sec, rest_sec) = slot.work_rest();

    let (rounds, final_rest_sec) = if slot.format.is_interval() {
        match work_sec.checked_add(rest_sec) {
            None | Some(0) => (1, rest_sec),
            Some(round_sec) => {
                let rounds = (duration_sec / round_sec).max(1);
                let leftover = duration_sec.saturating_sub(rounds.saturating_mul(round_sec));
                (rounds, rest_sec.saturating_add(leftover))
            }
        }
    } else {
        (0, 0)
    };

    BlockPlan {
        kind: slot.kind,
        format: slot.format,
        title: slot.display_title(),
        duration_sec,
        target_exercise_count: slot.exercises.resolve(pattern_count),
        rounds,
        work_sec,
        rest_sec,
        final_rest_sec,
        scheme: slot.resolved_scheme(),
        preferred_patterns: slot.preferred_patterns.clone(),
    }
}
