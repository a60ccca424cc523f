//! Architecture Model Tests.
//!
//! Verifies that well-formed descriptions build into a navigable model and
//! that every malformed description is rejected at construction with the
//! matching `ArchError`.

use memhaz_core::ArchModel;
use memhaz_core::arch::{BufferId, FieldLayout};
use memhaz_core::common::{ArchError, Bits, Error};
use memhaz_core::config::{ArchDescription, BufferDescription, ReplacementPolicy, TranslationDescription};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::{buffer, child, flat_description, translated, two_level};

fn build(desc: &ArchDescription) -> Result<ArchModel, ArchError> {
    ArchModel::new(desc)
}

// ══════════════════════════════════════════════════════════
// 1. Construction and lookup
// ══════════════════════════════════════════════════════════

/// Parents may be declared after their children; handles follow declaration order.
#[test]
fn builds_hierarchy_and_resolves_names() {
    let arch = two_level();
    let l1 = arch.buffer_id("L1").unwrap();
    let l2 = arch.buffer_id("L2").unwrap();

    assert_eq!(l1, BufferId(0));
    assert_eq!(l2, BufferId(1));
    assert_eq!(arch.buffer(l1).parent, Some(l2));
    assert_eq!(arch.path(l1), vec![l1, l2]);
    assert_eq!(arch.path(l2), vec![l2]);
    assert_eq!(arch.children(l2), vec![l1]);
    assert!(arch.children(l1).is_empty());
}

/// Unknown names resolve to `None`, or to `UnknownBuffer` through `require_buffer`.
#[test]
fn unknown_buffer_lookup() {
    let arch = two_level();
    assert_eq!(arch.buffer_id("L9"), None);
    assert_eq!(
        arch.require_buffer("L9"),
        Err(Error::UnknownBuffer("L9".to_owned()))
    );
    assert_eq!(arch.require_buffer("L2"), Ok(BufferId(1)));
}

/// Segments are found by type and containment; translations are linear.
#[test]
fn segments_and_translation() {
    let arch = translated();
    let va = arch.address_type_id("VA").unwrap();
    let pa = arch.address_type_id("PA").unwrap();

    let vram = arch.segment_containing(va, 0x0123).unwrap();
    assert_eq!(vram.name, "VRAM");
    assert_eq!(vram.size(), 0x8000);
    assert_eq!(vram.translate(0x0123), Some((pa, 0x8123)));
    assert_eq!(vram.translate(0x9000), None);

    assert!(arch.segment_containing(pa, 0x0123).is_none());
    assert_eq!(arch.segments_of(pa).count(), 1);
    let pram = arch.segment_id("PRAM").unwrap();
    assert_eq!(arch.segment(pram).translation, None);
}

/// Offset, index and tag are carved out by successive exclusion.
#[test]
fn field_layout_decomposition() {
    let mut desc = flat_description();
    desc.buffers.push(buffer("L1", "PA", 4, 2));
    let arch = build(&desc).unwrap();
    let l1 = arch.buffer(BufferId(0));

    assert_eq!(l1.layout.offset.intervals(), &[(0, 3)]);
    assert_eq!(l1.layout.index.intervals(), &[(4, 5)]);
    assert_eq!(l1.layout.tag.intervals(), &[(6, 15)]);

    assert_eq!(l1.index(0x1234), 3);
    assert_eq!(l1.tag(0x1234), 0x48);
    assert_eq!(l1.with_tag(0x1234, 0), 0x0034);
    assert_eq!(l1.layout.tag.len(), 10);
}

/// A fully associative buffer without line offset uses every bit as tag.
#[test]
fn degenerate_layout_is_all_tag() {
    let layout = FieldLayout::new(16, 0, 0);
    assert!(layout.offset.is_empty());
    assert!(layout.index.is_empty());
    assert_eq!(layout.tag.intervals(), &[(0, 15)]);
}

/// JSON descriptions go through the same validation.
#[test]
fn from_json_builds_model() {
    let arch = ArchModel::from_json(
        r#"{
            "address_types": [ { "name": "PA", "width": 32 } ],
            "segments": [ { "name": "RAM", "address_type": "PA",
                            "start": { "value": 0, "width": 32 },
                            "end": { "value": 65535, "width": 32 } } ],
            "buffers": [ { "name": "DTLB", "address_type": "PA", "sets": 16,
                           "ways": 4, "line_bits": 12, "policy": "PLRU" } ]
        }"#,
    )
    .unwrap();

    let dtlb = arch.buffer(arch.buffer_id("DTLB").unwrap());
    assert_eq!(dtlb.policy, ReplacementPolicy::Plru);
    assert_eq!(dtlb.layout.index.intervals(), &[(12, 15)]);
}

// ══════════════════════════════════════════════════════════
// 2. Validation errors
// ══════════════════════════════════════════════════════════

/// Address type widths outside `1..=64` are rejected.
#[rstest]
#[case(0)]
#[case(65)]
fn rejects_invalid_address_width(#[case] width: u32) {
    let mut desc = flat_description();
    desc.address_types[0].width = width;
    assert_eq!(
        build(&desc),
        Err(ArchError::InvalidWidth {
            name: "PA".to_owned(),
            width,
        })
    );
}

/// Segment bounds must be as wide as their address type.
#[test]
fn rejects_segment_width_mismatch() {
    let mut desc = flat_description();
    desc.segments[0].end = Bits { value: 0xFFFF, width: 32 };
    assert_eq!(
        build(&desc),
        Err(ArchError::WidthMismatch {
            segment: "RAM".to_owned(),
            expected: 16,
            found: 32,
        })
    );
}

/// A bound value must fit its declared width.
#[test]
fn rejects_bound_value_too_wide() {
    let mut desc = flat_description();
    desc.segments[0].end = Bits { value: 0x1_0000, width: 16 };
    assert_eq!(
        build(&desc),
        Err(ArchError::ValueTooWide {
            name: "RAM".to_owned(),
            value: 0x1_0000,
            width: 16,
        })
    );
}

/// Start above end is rejected.
#[test]
fn rejects_inverted_segment() {
    let mut desc = flat_description();
    desc.segments[0].start.value = 0x2000;
    desc.segments[0].end.value = 0x1000;
    assert_eq!(
        build(&desc),
        Err(ArchError::InvertedRange {
            segment: "RAM".to_owned(),
            start: 0x2000,
            end: 0x1000,
        })
    );
}

/// Translations must land inside the target address type.
#[test]
fn rejects_translation_overflow() {
    let mut desc = flat_description();
    desc.segments[0].translation = Some(TranslationDescription {
        target_type: "PA".to_owned(),
        base: 0x0001,
    });
    assert_eq!(
        build(&desc),
        Err(ArchError::ValueTooWide {
            name: "RAM".to_owned(),
            value: 0x0001,
            width: 16,
        })
    );
}

/// Identifiers are unique per declaration kind.
#[test]
fn rejects_duplicate_buffer() {
    let mut desc = flat_description();
    desc.buffers.push(buffer("L1", "PA", 1, 1));
    desc.buffers.push(buffer("L1", "PA", 1, 2));
    assert_eq!(
        build(&desc),
        Err(ArchError::DuplicateIdentifier {
            kind: "buffer",
            name: "L1".to_owned(),
        })
    );
}

/// References to undeclared address types are rejected.
#[test]
fn rejects_unknown_address_type() {
    let mut desc = flat_description();
    desc.buffers.push(buffer("L1", "XA", 1, 1));
    assert_eq!(
        build(&desc),
        Err(ArchError::UnknownAddressType {
            owner: "L1".to_owned(),
            name: "XA".to_owned(),
        })
    );
}

/// References to undeclared parents are rejected.
#[test]
fn rejects_unknown_parent() {
    let mut desc = flat_description();
    desc.buffers.push(child("L1", "PA", 1, 1, "L3"));
    assert_eq!(
        build(&desc),
        Err(ArchError::UnknownParent {
            buffer: "L1".to_owned(),
            parent: "L3".to_owned(),
        })
    );
}

/// Parent links must form a forest.
#[rstest]
#[case::self_loop(vec![child("A", "PA", 1, 1, "A")])]
#[case::two_cycle(vec![child("A", "PA", 1, 1, "B"), child("B", "PA", 1, 1, "A")])]
fn rejects_parent_cycle(#[case] buffers: Vec<BufferDescription>) {
    let mut desc = flat_description();
    desc.buffers = buffers;
    assert_eq!(
        build(&desc),
        Err(ArchError::ParentCycle {
            buffer: "A".to_owned(),
        })
    );
}

/// A view needs a parent to mirror.
#[test]
fn rejects_view_without_parent() {
    let mut desc = flat_description();
    desc.buffers.push(BufferDescription {
        view: true,
        ..buffer("V", "PA", 1, 1)
    });
    assert_eq!(
        build(&desc),
        Err(ArchError::ViewWithoutParent {
            buffer: "V".to_owned(),
        })
    );
}

/// Unusable geometries are rejected.
#[rstest]
#[case::zero_ways(1, 0, 4)]
#[case::sets_not_power_of_two(3, 1, 4)]
#[case::zero_sets(0, 1, 4)]
#[case::fields_exceed_width(1 << 13, 1, 4)]
fn rejects_invalid_geometry(#[case] sets: usize, #[case] ways: usize, #[case] line_bits: u32) {
    let mut desc = flat_description();
    desc.buffers.push(BufferDescription {
        line_bits,
        ..buffer("L1", "PA", sets, ways)
    });
    assert!(matches!(
        build(&desc),
        Err(ArchError::InvalidGeometry { buffer, .. }) if buffer == "L1"
    ));
}

/// PLRU tracks at most 64 ways.
#[test]
fn rejects_wide_plru() {
    let mut desc = flat_description();
    desc.buffers.push(BufferDescription {
        policy: ReplacementPolicy::Plru,
        ..buffer("L1", "PA", 1, 65)
    });
    assert!(matches!(
        build(&desc),
        Err(ArchError::InvalidGeometry { .. })
    ));
}

/// Malformed JSON is a parse error, not a geometry error.
#[test]
fn rejects_malformed_json() {
    let err = ArchModel::from_json("{ not json").unwrap_err();
    assert!(matches!(err, ArchError::Parse(_)));
    assert!(err.to_string().starts_with("malformed architecture description: "));

    let missing_field = ArchModel::from_json(r#"{ "buffers": [ { "name": "L1" } ] }"#).unwrap_err();
    assert!(matches!(missing_field, ArchError::Parse(_)));
}

/// Construction errors convert into the crate-level error.
#[test]
fn arch_error_converts_into_error() {
    let err: Error = ArchError::ParentCycle {
        buffer: "A".to_owned(),
    }
    .into();
    assert_eq!(
        err.to_string(),
        "invalid architecture: parent chain of buffer `A` contains a cycle"
    );
}
