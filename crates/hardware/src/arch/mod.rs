//! Architecture model.
//!
//! This module holds the immutable description of the memory subsystem under
//! test. It provides:
//! 1. **Address Spaces:** Address types and the segments that map them.
//! 2. **Buffers:** Associative buffers arranged in a parent/child tree, stored in an arena.
//! 3. **Field Decomposition:** Offset/index/tag layouts computed with the bit-field tracker.
//!
//! The model is validated once at construction and is read-only afterwards, so
//! it can be shared between concurrent generation runs behind an `Arc`.

/// Address types, segments and translations.
pub mod address;

/// Buffer declarations and address decomposition.
pub mod buffer;

/// Bit-field tracker.
pub mod fields;

use std::collections::HashSet;

pub use address::{AddressType, AddressTypeId, Segment, SegmentId, Translation};
pub use buffer::{Buffer, BufferId, FieldLayout};
pub use fields::FieldSet;

use crate::common::{self, ArchError, Error};
use crate::config::{ArchDescription, ReplacementPolicy};

/// Validated, immutable architecture model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchModel {
    address_types: Vec<AddressType>,
    segments: Vec<Segment>,
    buffers: Vec<Buffer>,
}

impl ArchModel {
    /// Builds and validates a model from a resolved description.
    ///
    /// # Errors
    ///
    /// Returns an [`ArchError`] when widths mismatch, ranges are inverted,
    /// identifiers collide, references do not resolve, parent links form a
    /// cycle, or a buffer's geometry is unusable.
    pub fn new(desc: &ArchDescription) -> Result<Self, ArchError> {
        let address_types = build_address_types(desc)?;
        let segments = build_segments(desc, &address_types)?;
        let buffers = build_buffers(desc, &address_types)?;

        let model = Self {
            address_types,
            segments,
            buffers,
        };
        model.check_acyclic()?;

        tracing::debug!(
            address_types = model.address_types.len(),
            segments = model.segments.len(),
            buffers = model.buffers.len(),
            "architecture model built"
        );
        Ok(model)
    }

    /// Parses a JSON description and builds the model.
    ///
    /// # Errors
    ///
    /// Malformed JSON is reported as [`ArchError::Parse`]; everything else as
    /// in [`ArchModel::new`].
    pub fn from_json(json: &str) -> Result<Self, ArchError> {
        let desc: ArchDescription =
            serde_json::from_str(json).map_err(|e| ArchError::Parse(e.to_string()))?;
        Self::new(&desc)
    }

    /// All address types, in declaration order.
    pub fn address_types(&self) -> &[AddressType] {
        &self.address_types
    }

    /// Address type by handle.
    pub fn address_type(&self, id: AddressTypeId) -> &AddressType {
        &self.address_types[id.0]
    }

    /// Looks up an address type by identifier.
    pub fn address_type_id(&self, name: &str) -> Option<AddressTypeId> {
        self.address_types
            .iter()
            .position(|t| t.name == name)
            .map(AddressTypeId)
    }

    /// All segments, in declaration order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segment by handle.
    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id.0]
    }

    /// Looks up a segment by identifier.
    pub fn segment_id(&self, name: &str) -> Option<SegmentId> {
        self.segments
            .iter()
            .position(|s| s.name == name)
            .map(SegmentId)
    }

    /// Segments of one address type, in declaration order.
    pub fn segments_of(&self, ty: AddressTypeId) -> impl Iterator<Item = &Segment> + '_ {
        self.segments.iter().filter(move |s| s.address_type == ty)
    }

    /// First declared segment of `ty` that contains `addr`.
    pub fn segment_containing(&self, ty: AddressTypeId, addr: u64) -> Option<&Segment> {
        self.segments_of(ty).find(|s| s.contains(addr))
    }

    /// All buffers; the position of a buffer is its [`BufferId`].
    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    /// Buffer by handle.
    pub fn buffer(&self, id: BufferId) -> &Buffer {
        &self.buffers[id.0]
    }

    /// Looks up a buffer by identifier.
    pub fn buffer_id(&self, name: &str) -> Option<BufferId> {
        self.buffers
            .iter()
            .position(|b| b.name == name)
            .map(BufferId)
    }

    /// Looks up a buffer by identifier, failing on unknown names.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownBuffer`] if no buffer is called `name`.
    pub fn require_buffer(&self, name: &str) -> common::Result<BufferId> {
        self.buffer_id(name)
            .ok_or_else(|| Error::UnknownBuffer(name.to_owned()))
    }

    /// Direct children of `id`, in declaration order.
    pub fn children(&self, id: BufferId) -> Vec<BufferId> {
        self.buffers
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent == Some(id))
            .map(|(i, _)| BufferId(i))
            .collect()
    }

    /// `entry` followed by its ancestors, nearest first.
    pub fn path(&self, entry: BufferId) -> Vec<BufferId> {
        let mut path = vec![entry];
        let mut current = self.buffers[entry.0].parent;
        while let Some(id) = current {
            path.push(id);
            current = self.buffers[id.0].parent;
        }
        path
    }

    fn check_acyclic(&self) -> Result<(), ArchError> {
        for (start, buffer) in self.buffers.iter().enumerate() {
            let mut current = buffer.parent;
            let mut steps = 0;
            while let Some(id) = current {
                if id.0 == start || steps > self.buffers.len() {
                    return Err(ArchError::ParentCycle {
                        buffer: buffer.name.clone(),
                    });
                }
                steps += 1;
                current = self.buffers[id.0].parent;
            }
        }
        Ok(())
    }
}

fn check_unique<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ArchError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ArchError::DuplicateIdentifier {
                kind,
                name: name.to_owned(),
            });
        }
    }
    Ok(())
}

fn resolve_type(
    types: &[AddressType],
    owner: &str,
    name: &str,
) -> Result<AddressTypeId, ArchError> {
    types
        .iter()
        .position(|t| t.name == name)
        .map(AddressTypeId)
        .ok_or_else(|| ArchError::UnknownAddressType {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
}

fn build_address_types(desc: &ArchDescription) -> Result<Vec<AddressType>, ArchError> {
    check_unique(
        "address type",
        desc.address_types.iter().map(|t| t.name.as_str()),
    )?;

    desc.address_types
        .iter()
        .map(|t| {
            if t.width == 0 || t.width > crate::common::bits::MAX_WIDTH {
                return Err(ArchError::InvalidWidth {
                    name: t.name.clone(),
                    width: t.width,
                });
            }
            Ok(AddressType {
                name: t.name.clone(),
                width: t.width,
                kind: t.kind,
            })
        })
        .collect()
}

fn build_segments(
    desc: &ArchDescription,
    types: &[AddressType],
) -> Result<Vec<Segment>, ArchError> {
    check_unique("segment", desc.segments.iter().map(|s| s.name.as_str()))?;

    desc.segments
        .iter()
        .map(|s| {
            let ty = resolve_type(types, &s.name, &s.address_type)?;
            let width = types[ty.0].width;

            s.start.validate(&s.name)?;
            s.end.validate(&s.name)?;
            for bound in [s.start, s.end] {
                if bound.width != width {
                    return Err(ArchError::WidthMismatch {
                        segment: s.name.clone(),
                        expected: width,
                        found: bound.width,
                    });
                }
            }
            if s.start.value > s.end.value {
                return Err(ArchError::InvertedRange {
                    segment: s.name.clone(),
                    start: s.start.value,
                    end: s.end.value,
                });
            }

            let translation = match &s.translation {
                Some(t) => {
                    let target = resolve_type(types, &s.name, &t.target_type)?;
                    let span = s.end.value - s.start.value;
                    let last = t.base.checked_add(span);
                    let target_mask = types[target.0].mask();
                    if last.is_none_or(|last| last & !target_mask != 0) {
                        return Err(ArchError::ValueTooWide {
                            name: s.name.clone(),
                            value: t.base,
                            width: types[target.0].width,
                        });
                    }
                    Some(Translation { target, base: t.base })
                }
                None => None,
            };

            Ok(Segment {
                name: s.name.clone(),
                address_type: ty,
                start: s.start.value,
                end: s.end.value,
                translation,
            })
        })
        .collect()
}

fn build_buffers(
    desc: &ArchDescription,
    types: &[AddressType],
) -> Result<Vec<Buffer>, ArchError> {
    check_unique("buffer", desc.buffers.iter().map(|b| b.name.as_str()))?;

    desc.buffers
        .iter()
        .map(|b| {
            let ty = resolve_type(types, &b.name, &b.address_type)?;
            let width = types[ty.0].width;

            if b.ways == 0 {
                return Err(ArchError::InvalidGeometry {
                    buffer: b.name.clone(),
                    reason: "ways must be non-zero".to_owned(),
                });
            }
            if !b.sets.is_power_of_two() {
                return Err(ArchError::InvalidGeometry {
                    buffer: b.name.clone(),
                    reason: format!("sets ({}) must be a power of two", b.sets),
                });
            }
            if b.policy == ReplacementPolicy::Plru && b.ways > 64 {
                return Err(ArchError::InvalidGeometry {
                    buffer: b.name.clone(),
                    reason: format!("PLRU supports at most 64 ways, got {}", b.ways),
                });
            }
            let index_bits = b.sets.trailing_zeros();
            if b.line_bits + index_bits > width {
                return Err(ArchError::InvalidGeometry {
                    buffer: b.name.clone(),
                    reason: format!(
                        "offset ({}) and index ({}) bits exceed the {}-bit address",
                        b.line_bits, index_bits, width
                    ),
                });
            }

            let parent = match &b.parent {
                Some(name) => Some(
                    desc.buffers
                        .iter()
                        .position(|p| &p.name == name)
                        .map(BufferId)
                        .ok_or_else(|| ArchError::UnknownParent {
                            buffer: b.name.clone(),
                            parent: name.clone(),
                        })?,
                ),
                None => None,
            };
            if b.view && parent.is_none() {
                return Err(ArchError::ViewWithoutParent {
                    buffer: b.name.clone(),
                });
            }

            Ok(Buffer {
                name: b.name.clone(),
                address_type: ty,
                sets: b.sets,
                ways: b.ways,
                line_bits: b.line_bits,
                policy: b.policy,
                parent,
                view: b.view,
                layout: FieldLayout::new(width, b.line_bits, index_bits),
            })
        })
        .collect()
}
