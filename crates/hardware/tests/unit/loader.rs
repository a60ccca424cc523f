//! Goal-Directed Loader Tests.
//!
//! Verifies alias-pool construction and the bounded goal search for each
//! wanted event, including goals on a parent reached through its child and
//! goals that no alias combination can realize.

use memhaz_core::arch::BufferId;
use memhaz_core::common::Error;
use memhaz_core::config::{GeneratorConfig, ReplacementPolicy};
use memhaz_core::loader::{Goal, GoalReacher, Reach, alias_pool};
use memhaz_core::run::{SequenceRun, Step};
use memhaz_core::sim::{BufferAccessEvent, MemoryAccess};
use memhaz_core::FilterPipeline;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::mocks::MockRule;
use crate::common::{buffer, flat_description, line, model, segment, single_buffer, translated, two_level};

fn goal(buffer: BufferId, event: BufferAccessEvent, address: u64) -> Goal {
    Goal {
        buffer,
        event,
        address,
    }
}

// ══════════════════════════════════════════════════════════
// 1. Alias pools
// ══════════════════════════════════════════════════════════

/// Aliases keep the offset, vary the tag and skip the target's tag.
#[test]
fn alias_pool_varies_tag_only() {
    let arch = single_buffer(1, 4, ReplacementPolicy::Lru);
    let ram = &arch.segments()[0];

    assert_eq!(
        alias_pool(&arch, BufferId(0), 0x0005, ram, 4),
        vec![0x0015, 0x0025, 0x0035, 0x0045]
    );
}

/// Aliases stay inside the segment.
#[test]
fn alias_pool_respects_segment() {
    let mut desc = flat_description();
    desc.segments = vec![segment("LOW", "PA", 0x0100, 0x01FF, 16)];
    desc.buffers.push(buffer("L1", "PA", 1, 4));
    let arch = model(&desc);

    let pool = alias_pool(&arch, BufferId(0), 0x0123, &arch.segments()[0], 3);
    assert_eq!(pool, vec![0x0103, 0x0113, 0x0133]);

    let all = alias_pool(&arch, BufferId(0), 0x0123, &arch.segments()[0], 100);
    assert_eq!(all.len(), 15);
}

/// Aliases keep the target's set.
#[test]
fn alias_pool_keeps_index() {
    let arch = single_buffer(4, 2, ReplacementPolicy::Lru);
    let l1 = arch.buffer(BufferId(0));

    let pool = alias_pool(&arch, BufferId(0), 0x0020, &arch.segments()[0], 3);
    assert_eq!(pool, vec![0x0060, 0x00A0, 0x00E0]);
    assert!(pool.iter().all(|&addr| l1.index(addr) == 2));
}

/// A segment of another address type yields no aliases.
#[test]
fn alias_pool_type_mismatch_is_empty() {
    let arch = translated();
    let l2 = arch.buffer_id("L2").unwrap();
    let vram = arch.segment(arch.segment_id("VRAM").unwrap());

    assert!(alias_pool(&arch, l2, 0x8000, vram, 4).is_empty());
}

// ══════════════════════════════════════════════════════════
// 2. REPLACE goals
// ══════════════════════════════════════════════════════════

/// 4-way, 1-set, empty: four distinct aliases, then the target replaces.
#[test]
fn replace_goal_end_to_end() {
    let arch = single_buffer(1, 4, ReplacementPolicy::Lru);
    let l1 = BufferId(0);
    let target = 0x0000;
    let mut run = SequenceRun::new(arch.clone(), FilterPipeline::standard());
    let pool = alias_pool(&arch, l1, target, &arch.segments()[0], 32);

    let reach = GoalReacher::default()
        .reach(&run, l1, goal(l1, BufferAccessEvent::Replace, target), &pool)
        .unwrap();
    let loader = reach.loader().unwrap();
    assert_eq!(loader.entry, l1);
    assert_eq!(loader.loads, vec![line(1), line(2), line(3), line(4)]);

    let buffer = arch.buffer(l1);
    for &load in &loader.loads {
        assert_eq!(buffer.index(load), buffer.index(target));
        assert_ne!(buffer.tag(load), buffer.tag(target));
        assert!(run.step(l1, load).unwrap().is_accepted());
    }
    let Step::Accepted(access) = run.step(l1, target).unwrap() else {
        panic!("target probe must be accepted");
    };
    assert_eq!(access.event(l1), Some(BufferAccessEvent::Replace));
}

/// An empty `k`-way buffer needs exactly `k` loads, whatever the policy.
#[rstest]
fn replace_goal_needs_exactly_ways_loads(
    #[values(1, 2, 3, 4, 8)] ways: usize,
    #[values(
        ReplacementPolicy::Lru,
        ReplacementPolicy::Plru,
        ReplacementPolicy::Fifo,
        ReplacementPolicy::Mru
    )]
    policy: ReplacementPolicy,
) {
    let arch = single_buffer(1, ways, policy);
    let l1 = BufferId(0);
    let run = SequenceRun::new(arch.clone(), FilterPipeline::standard());
    let pool = alias_pool(&arch, l1, line(0), &arch.segments()[0], ways + 1);

    let reach = GoalReacher::default()
        .reach(&run, l1, goal(l1, BufferAccessEvent::Replace, line(0)), &pool)
        .unwrap();
    assert_eq!(reach.loader().map(|l| l.loads.len()), Some(ways));
    assert!(run.is_empty());
}

/// A goal on the parent is reached through the child; each load also
/// probes the parent.
#[test]
fn replace_goal_on_parent() {
    let arch = two_level();
    let l1 = arch.buffer_id("L1").unwrap();
    let l2 = arch.buffer_id("L2").unwrap();
    let run = SequenceRun::new(arch, FilterPipeline::standard());

    let reach = GoalReacher::default()
        .reach(
            &run,
            l1,
            goal(l2, BufferAccessEvent::Replace, line(0)),
            &[line(1), line(2), line(3)],
        )
        .unwrap();
    assert_eq!(reach.loader().unwrap().loads, vec![line(1), line(2)]);
}

/// Without aliases a replacement cannot be forced.
#[test]
fn replace_goal_without_aliases_is_unreachable() {
    let arch = single_buffer(1, 2, ReplacementPolicy::Lru);
    let l1 = BufferId(0);
    let run = SequenceRun::new(arch, FilterPipeline::standard());
    let wanted = goal(l1, BufferAccessEvent::Replace, line(0));

    assert_eq!(
        GoalReacher::default().reach(&run, l1, wanted, &[]),
        Ok(Reach::Unreachable {
            goal: wanted,
            attempts: 1,
        })
    );
}

// ══════════════════════════════════════════════════════════
// 3. HIT and MISS goals
// ══════════════════════════════════════════════════════════

/// A hit needs one load of the target, or none if it is already resident.
#[test]
fn hit_goal_loads_target_once() {
    let arch = single_buffer(1, 2, ReplacementPolicy::Lru);
    let l1 = BufferId(0);
    let mut run = SequenceRun::new(arch, FilterPipeline::standard());
    let wanted = goal(l1, BufferAccessEvent::Hit, line(5));

    let reach = GoalReacher::default().reach(&run, l1, wanted, &[]).unwrap();
    assert_eq!(reach.loader().unwrap().loads, vec![line(5)]);

    let _ = run.step(l1, line(5)).unwrap();
    let reach = GoalReacher::default().reach(&run, l1, wanted, &[]).unwrap();
    assert!(reach.loader().unwrap().loads.is_empty());
}

/// A line resident in both levels hits the parent once an alias pushes it
/// out of the child.
#[test]
fn hit_goal_on_parent_evicts_child_copy() {
    let arch = two_level();
    let l1 = arch.buffer_id("L1").unwrap();
    let l2 = arch.buffer_id("L2").unwrap();
    let mut run = SequenceRun::new(arch, FilterPipeline::standard());
    let _ = run.step(l1, line(1)).unwrap();

    let reach = GoalReacher::default()
        .reach(
            &run,
            l1,
            goal(l2, BufferAccessEvent::Hit, line(1)),
            &[line(2), line(3)],
        )
        .unwrap();
    let loader = reach.loader().unwrap();
    assert_eq!(loader.loads, vec![line(2)]);

    for &load in &loader.loads {
        assert!(run.step(l1, load).unwrap().is_accepted());
    }
    let Step::Accepted(access) = run.step(l1, line(1)).unwrap() else {
        panic!("target probe must be accepted");
    };
    assert_eq!(access.event(l1), Some(BufferAccessEvent::Replace));
    assert_eq!(access.event(l2), Some(BufferAccessEvent::Hit));
}

/// From an empty hierarchy a parent hit needs the target, then an alias.
#[test]
fn hit_goal_on_parent_from_empty() {
    let arch = two_level();
    let l1 = arch.buffer_id("L1").unwrap();
    let l2 = arch.buffer_id("L2").unwrap();
    let run = SequenceRun::new(arch, FilterPipeline::standard());

    let reach = GoalReacher::default()
        .reach(
            &run,
            l1,
            goal(l2, BufferAccessEvent::Hit, line(1)),
            &[line(2), line(3)],
        )
        .unwrap();
    assert_eq!(reach.loader().unwrap().loads, vec![line(1), line(2)]);
}

/// A non-resident target already misses.
#[test]
fn miss_goal_on_empty_buffer_needs_no_loads() {
    let arch = single_buffer(1, 2, ReplacementPolicy::Lru);
    let l1 = BufferId(0);
    let run = SequenceRun::new(arch, FilterPipeline::standard());

    let reach = GoalReacher::default()
        .reach(&run, l1, goal(l1, BufferAccessEvent::Miss, line(1)), &[line(2)])
        .unwrap();
    assert_eq!(reach.loader().unwrap().loads, Vec::<u64>::new());
}

/// A resident target is evicted by aliases first.
#[test]
fn miss_goal_evicts_resident_target() {
    let arch = single_buffer(1, 2, ReplacementPolicy::Lru);
    let l1 = BufferId(0);
    let mut run = SequenceRun::new(arch, FilterPipeline::standard());
    let _ = run.step(l1, line(1)).unwrap();

    let reach = GoalReacher::default()
        .reach(
            &run,
            l1,
            goal(l1, BufferAccessEvent::Miss, line(1)),
            &[line(2), line(3), line(4)],
        )
        .unwrap();
    assert_eq!(reach.loader().unwrap().loads, vec![line(2), line(3)]);
    assert_eq!(run.len(), 1);
}

/// Under MRU the oldest line is never the victim, so it cannot be evicted.
#[test]
fn miss_goal_under_mru_is_unreachable() {
    let arch = single_buffer(1, 2, ReplacementPolicy::Mru);
    let l1 = BufferId(0);
    let mut run = SequenceRun::new(arch, FilterPipeline::standard());
    let _ = run.step(l1, line(1)).unwrap();
    let pool: Vec<u64> = (2..7).map(line).collect();

    let reach = GoalReacher::default()
        .reach(&run, l1, goal(l1, BufferAccessEvent::Miss, line(1)), &pool)
        .unwrap();
    assert!(matches!(reach, Reach::Unreachable { attempts: 5, .. }));
}

/// A load the pipeline rejects is rolled back and the next alias is used.
#[test]
fn rejected_load_is_skipped() {
    let arch = single_buffer(1, 2, ReplacementPolicy::Lru);
    let l1 = BufferId(0);
    let mut no_line_one = MockRule::new();
    let _ = no_line_one.expect_name().return_const("NoLineOne");
    let _ = no_line_one
        .expect_accept()
        .returning(|_, access: &MemoryAccess, _| Ok(access.address != line(1)));
    let run = SequenceRun::new(arch, FilterPipeline::new().with(no_line_one));

    let reach = GoalReacher::default()
        .reach(
            &run,
            l1,
            goal(l1, BufferAccessEvent::Replace, line(0)),
            &[line(1), line(2), line(3)],
        )
        .unwrap();
    assert_eq!(reach.loader().unwrap().loads, vec![line(2), line(3)]);
    assert!(run.is_empty());
    assert_eq!(run.stats().total_rejections(), 0);
}

// ══════════════════════════════════════════════════════════
// 4. Bounds and errors
// ══════════════════════════════════════════════════════════

/// A goal buffer off the access path is unreachable without any attempt.
#[test]
fn goal_buffer_off_path() {
    let arch = two_level();
    let l1 = arch.buffer_id("L1").unwrap();
    let l2 = arch.buffer_id("L2").unwrap();
    let run = SequenceRun::new(arch, FilterPipeline::standard());

    let reach = GoalReacher::default()
        .reach(&run, l2, goal(l1, BufferAccessEvent::Hit, line(0)), &[])
        .unwrap();
    assert!(matches!(reach, Reach::Unreachable { attempts: 0, .. }));
}

/// The load bound caps each attempt.
#[test]
fn load_bound_limits_attempt() {
    let arch = single_buffer(1, 4, ReplacementPolicy::Lru);
    let l1 = BufferId(0);
    let run = SequenceRun::new(arch.clone(), FilterPipeline::standard());
    let pool = alias_pool(&arch, l1, line(0), &arch.segments()[0], 8);
    let reacher = GoalReacher::new(GeneratorConfig {
        max_loads_per_goal: 3,
        ..GeneratorConfig::default()
    });

    let reach = reacher
        .reach(&run, l1, goal(l1, BufferAccessEvent::Replace, line(0)), &pool)
        .unwrap();
    assert!(reach.loader().is_none());
}

/// An unmapped target is an addressing error, not an unreachable goal.
#[test]
fn unmapped_target_is_an_error() {
    let arch = translated();
    let l1v = arch.buffer_id("L1V").unwrap();
    let run = SequenceRun::new(arch, FilterPipeline::standard());

    let result = GoalReacher::default().reach(
        &run,
        l1v,
        goal(l1v, BufferAccessEvent::Miss, 0x9000),
        &[],
    );
    assert!(matches!(result, Err(Error::AddressNotMapped { .. })));
}
