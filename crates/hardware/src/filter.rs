//! Hazard Filter Pipeline.
//!
//! Filters are independent predicates over an access and one of its united
//! hazards. A sequence is accepted only when every filter accepts every united
//! hazard of the newest access. Filters reject; they never repair.
//!
//! # Filters
//!
//! - `MultipleTagReplaced`: more than one replacement of the same tag has no single outcome.
//! - `ParentMissChildHit`: a view cannot hit or evict while its parent misses.

use std::fmt;
use std::sync::Arc;

use crate::arch::{ArchModel, BufferId};
use crate::common::FilterDefect;
use crate::hazard::{HazardType, MemoryUnitedHazard};
use crate::sim::MemoryAccess;

/// A pure predicate over an access and one united hazard.
///
/// Implementations must not depend on each other or keep mutable state. An
/// `Err` is reserved for inputs the filter cannot make sense of and is fatal
/// to the run.
pub trait Filter: Send + Sync {
    /// Name reported when this filter rejects a sequence.
    fn name(&self) -> &'static str;

    /// Returns `Ok(true)` to accept, `Ok(false)` to reject.
    ///
    /// # Arguments
    ///
    /// * `arch` - The architecture model.
    /// * `access` - The newest access of the sequence.
    /// * `united` - Hazards of `access` for one buffer it touched.
    ///
    /// # Errors
    ///
    /// A [`FilterDefect`] when the input violates an invariant the filter relies on.
    fn accept(
        &self,
        arch: &ArchModel,
        access: &MemoryAccess,
        united: &MemoryUnitedHazard,
    ) -> Result<bool, FilterDefect>;
}

/// Outcome of consulting the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Every filter accepted.
    Accepted,
    /// A filter rejected the united hazard of `buffer`.
    Rejected {
        /// Name of the rejecting filter.
        filter: &'static str,
        /// Buffer whose hazards were rejected.
        buffer: BufferId,
    },
}

impl Verdict {
    /// Returns `true` for [`Verdict::Accepted`].
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Rejects an access that re-installs a tag replaced more than once.
#[derive(Clone, Copy, Debug, Default)]
pub struct MultipleTagReplaced;

impl Filter for MultipleTagReplaced {
    fn name(&self) -> &'static str {
        "MultipleTagReplaced"
    }

    fn accept(
        &self,
        _arch: &ArchModel,
        _access: &MemoryAccess,
        united: &MemoryUnitedHazard,
    ) -> Result<bool, FilterDefect> {
        Ok(united.count(HazardType::TagReplaced) <= 1)
    }
}

/// Rejects a view that hits or replaces a tag while its parent misses.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParentMissChildHit;

impl Filter for ParentMissChildHit {
    fn name(&self) -> &'static str {
        "ParentMissChildHit"
    }

    fn accept(
        &self,
        arch: &ArchModel,
        access: &MemoryAccess,
        united: &MemoryUnitedHazard,
    ) -> Result<bool, FilterDefect> {
        let view = arch.buffer(united.buffer());
        if !view.view {
            return Ok(true);
        }
        let Some(parent) = view.parent else {
            return Err(FilterDefect {
                filter: self.name(),
                reason: format!("view `{}` has no parent", view.name),
            });
        };
        let Some(view_event) = access.event(united.buffer()) else {
            return Err(FilterDefect {
                filter: self.name(),
                reason: format!("hazards reported for untouched buffer `{}`", view.name),
            });
        };
        let Some(parent_event) = access.event(parent) else {
            // Views always forward to their parent, so this is an inconsistency.
            return Err(FilterDefect {
                filter: self.name(),
                reason: format!("parent of view `{}` was not probed", view.name),
            });
        };

        if parent_event.is_miss() {
            return Ok(!view_event.is_hit() && !united.has(HazardType::TagReplaced));
        }
        Ok(true)
    }
}

/// Ordered conjunction of filters.
///
/// Cloning shares the filters, which are stateless.
#[derive(Clone)]
pub struct FilterPipeline {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterPipeline {
    /// An empty pipeline that accepts everything.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// The pipeline with both canonical filters.
    pub fn standard() -> Self {
        Self::new()
            .with(MultipleTagReplaced)
            .with(ParentMissChildHit)
    }

    /// Appends a filter.
    #[must_use]
    pub fn with(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Appends a boxed filter.
    pub fn push(&mut self, filter: Box<dyn Filter>) {
        self.filters.push(Arc::from(filter));
    }

    /// Names of the filters, in evaluation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` when the pipeline holds no filter.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Consults every filter on every united hazard of `access`.
    ///
    /// # Errors
    ///
    /// Propagates the first [`FilterDefect`]; defects are never swallowed.
    pub fn check(
        &self,
        arch: &ArchModel,
        access: &MemoryAccess,
        hazards: &[MemoryUnitedHazard],
    ) -> Result<Verdict, FilterDefect> {
        for united in hazards {
            for filter in &self.filters {
                if !filter.accept(arch, access, united)? {
                    tracing::debug!(
                        filter = filter.name(),
                        buffer = united.buffer().0,
                        position = united.position(),
                        "access rejected"
                    );
                    return Ok(Verdict::Rejected {
                        filter: filter.name(),
                        buffer: united.buffer(),
                    });
                }
            }
        }
        Ok(Verdict::Accepted)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for FilterPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterPipeline")
            .field("filters", &self.names())
            .finish()
    }
}
