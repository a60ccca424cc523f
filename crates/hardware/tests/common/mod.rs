//! Shared builders for small memory hierarchies.
//!
//! Every helper returns a ready-made [`ArchModel`] behind an `Arc`, the way a
//! generation run consumes it. Unless noted otherwise addresses are 16 bits
//! wide, lines are 16 bytes (`line_bits = 4`) and the whole address space is a
//! single segment called `RAM`.

use std::sync::Arc;

use memhaz_core::ArchModel;
use memhaz_core::common::Bits;
use memhaz_core::config::{
    AddressKind, AddressTypeDescription, ArchDescription, BufferDescription, ReplacementPolicy,
    SegmentDescription, TranslationDescription,
};


/// Width of the test address types.
pub const WIDTH: u32 = 16;

/// Line-offset bits of the test buffers.
pub const LINE_BITS: u32 = 4;

/// Installs a test subscriber honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An address type declaration.
pub fn address_type(name: &str, width: u32, kind: AddressKind) -> AddressTypeDescription {
    AddressTypeDescription {
        name: name.to_owned(),
        width,
        kind,
    }
}

/// A segment declaration without translation.
pub fn segment(name: &str, ty: &str, start: u64, end: u64, width: u32) -> SegmentDescription {
    SegmentDescription {
        name: name.to_owned(),
        address_type: ty.to_owned(),
        start: Bits { value: start, width },
        end: Bits { value: end, width },
        translation: None,
    }
}

/// A buffer declaration with `line_bits = 4` and LRU replacement.
pub fn buffer(name: &str, ty: &str, sets: usize, ways: usize) -> BufferDescription {
    BufferDescription {
        name: name.to_owned(),
        address_type: ty.to_owned(),
        sets,
        ways,
        line_bits: LINE_BITS,
        policy: ReplacementPolicy::Lru,
        parent: None,
        view: false,
    }
}

/// A buffer declaration with a parent.
pub fn child(name: &str, ty: &str, sets: usize, ways: usize, parent: &str) -> BufferDescription {
    BufferDescription {
        parent: Some(parent.to_owned()),
        ..buffer(name, ty, sets, ways)
    }
}

/// One physical address type `PA` covered by segment `RAM`, and no buffers.
pub fn flat_description() -> ArchDescription {
    ArchDescription {
        address_types: vec![address_type("PA", WIDTH, AddressKind::Physical)],
        segments: vec![segment("RAM", "PA", 0, 0xFFFF, WIDTH)],
        buffers: Vec::new(),
    }
}

/// Builds a model, panicking on an invalid description.
pub fn model(desc: &ArchDescription) -> Arc<ArchModel> {
    Arc::new(ArchModel::new(desc).expect("test description must be valid"))
}

/// A single buffer `L1` with the given geometry and policy.
pub fn single_buffer(sets: usize, ways: usize, policy: ReplacementPolicy) -> Arc<ArchModel> {
    let mut desc = flat_description();
    desc.buffers.push(BufferDescription {
        policy,
        ..buffer("L1", "PA", sets, ways)
    });
    model(&desc)
}

/// `L1` (1 set, 1 way) backed by `L2` (1 set, 2 ways), both LRU.
pub fn two_level() -> Arc<ArchModel> {
    let mut desc = flat_description();
    desc.buffers.push(child("L1", "PA", 1, 1, "L2"));
    desc.buffers.push(buffer("L2", "PA", 1, 2));
    model(&desc)
}

/// A view `V` (1 set, 2 ways) over a smaller parent `P` (1 set, 1 way).
///
/// `P` evicts lines `V` still holds, which makes a view hit over a parent miss
/// easy to provoke: `A`, `B`, `A` entering at `V`.
pub fn view_over_small_parent() -> Arc<ArchModel> {
    let mut desc = flat_description();
    desc.buffers.push(buffer("P", "PA", 1, 1));
    desc.buffers.push(BufferDescription {
        view: true,
        ..child("V", "PA", 1, 2, "P")
    });
    model(&desc)
}

/// A virtually-addressed `L1V` backed by a physically-addressed `L2`.
///
/// Virtual segment `VRAM` covers `[0x0000, 0x7FFF]` and translates to physical
/// `0x8000`; physical segment `PRAM` only covers `[0x8000, 0xBFFF]`, so virtual
/// addresses from `0x4000` up translate to unmapped physical addresses.
pub fn translated() -> Arc<ArchModel> {
    let desc = ArchDescription {
        address_types: vec![
            address_type("VA", WIDTH, AddressKind::Virtual),
            address_type("PA", WIDTH, AddressKind::Physical),
        ],
        segments: vec![
            SegmentDescription {
                translation: Some(TranslationDescription {
                    target_type: "PA".to_owned(),
                    base: 0x8000,
                }),
                ..segment("VRAM", "VA", 0x0000, 0x7FFF, WIDTH)
            },
            segment("PRAM", "PA", 0x8000, 0xBFFF, WIDTH),
        ],
        buffers: vec![child("L1V", "VA", 1, 2, "L2"), buffer("L2", "PA", 1, 4)],
    };
    model(&desc)
}

/// Address with tag `tag` in a 1-set buffer with 16-byte lines.
pub const fn line(tag: u64) -> u64 {
    tag << LINE_BITS
}
