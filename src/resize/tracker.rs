//! SizeDeltaTracker - per-vertex delta bookkeeping for one propagation.
//!
//! Sign convention: a delta is `old_width - new_width`, so positive means
//! shrink. The tracker records the delta each vertex carries and resolves
//! the deltas of a vertex's producers when the backward walk enters it.

use std::collections::BTreeMap;

use crate::errors::ResizeError;
use crate::model::{GraphModel, SizeClass, VertexId, VertexSizeSemantics};

/// Accumulates a signed size-delta per vertex during a propagation and
/// splits deltas across unresolved branches at merge points.
#[derive(Debug, Default)]
pub struct SizeDeltaTracker {
    deltas: BTreeMap<VertexId, i64>,
}

impl SizeDeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds or records a known delta for a vertex.
    pub fn set(&mut self, vertex: VertexId, delta: i64) {
        self.deltas.insert(vertex, delta);
    }

    /// Returns the recorded delta, or `None` if the vertex is unresolved.
    pub fn get(&self, vertex: VertexId) -> Option<i64> {
        self.deltas.get(&vertex).copied()
    }

    /// Resolves the deltas of `vertex`'s producers from its own recorded
    /// delta. Called from the backward traversal's enter hook.
    ///
    /// Producers that already carry a delta are left alone. A vertex without
    /// a recorded delta has nothing to distribute and is a no-op.
    pub fn visit(
        &mut self,
        model: &GraphModel,
        semantics: &dyn VertexSizeSemantics,
        vertex: VertexId,
    ) -> Result<(), ResizeError> {
        let Some(delta) = self.get(vertex) else {
            return Ok(());
        };
        let spec = model
            .get(vertex)
            .ok_or(ResizeError::UnknownVertex(vertex))?;
        let class = semantics
            .classify(&spec.op)
            .ok_or(ResizeError::UnsupportedVertexKind(vertex))?;

        let mut resolved_sum = 0i64;
        let mut unresolved: Vec<VertexId> = Vec::new();
        for input in &spec.inputs {
            match self.get(*input) {
                Some(d) => resolved_sum += d,
                None if !unresolved.contains(input) => unresolved.push(*input),
                None => {}
            }
        }
        if unresolved.is_empty() {
            return Ok(());
        }

        match class {
            // Every branch of an elementwise vertex moves in lockstep.
            SizeClass::Elementwise => {
                for input in unresolved {
                    self.set(input, delta);
                }
                Ok(())
            }
            // A merge splits whatever is not already accounted for across
            // its unresolved branches, proportionally to their widths.
            SizeClass::Merge => {
                let remaining = delta - resolved_sum;
                if remaining == 0 {
                    return Ok(());
                }
                let mut branches = Vec::with_capacity(unresolved.len());
                for input in unresolved {
                    branches.push((input, model.width_of(input)?));
                }
                for (input, share) in split_proportional(vertex, remaining, &branches)? {
                    if share != 0 {
                        self.set(input, share);
                    }
                }
                Ok(())
            }
            // Single-producer vertices hand their delta through unchanged.
            SizeClass::PassThrough | SizeClass::CoupledSize => {
                for input in unresolved {
                    self.set(input, delta);
                }
                Ok(())
            }
            // A size-bearing vertex absorbs the change at its output; its
            // producers are untouched.
            SizeClass::SizeBearing => Ok(()),
        }
    }
}

/// Splits `remaining` across `branches` proportionally to their widths.
///
/// Largest-remainder allocation: integer shares are floored, then the
/// leftover units go to the branches with the largest fractional parts,
/// ties broken by declared order. A shrink leaves every branch at least one
/// unit wide, so a branch's share is capped at `width - 1` and the excess
/// moves to branches with headroom. Zero-width branches contribute nothing.
/// The returned shares sum to `remaining` exactly; when that is impossible
/// (no capacity, or a shrink larger than the branches can shed) the
/// propagation is aborted with [`ResizeError::DistributionImbalance`].
fn split_proportional(
    vertex: VertexId,
    remaining: i64,
    branches: &[(VertexId, u32)],
) -> Result<Vec<(VertexId, i64)>, ResizeError> {
    let shrinking = remaining > 0;
    let magnitude = remaining.abs();

    let total: i64 = branches.iter().map(|&(_, w)| i64::from(w)).sum();
    if total == 0 {
        return Err(ResizeError::DistributionImbalance {
            vertex,
            remainder: remaining,
        });
    }
    let shed_cap = |width: u32| -> i64 {
        if shrinking {
            i64::from(width).max(1) - 1
        } else {
            i64::MAX
        }
    };
    // A branch must keep at least one unit, so the combined shed capacity
    // is one less than each branch's width.
    if shrinking {
        let capacity: i64 = branches.iter().map(|&(_, w)| shed_cap(w)).sum();
        if magnitude > capacity {
            return Err(ResizeError::DistributionImbalance {
                vertex,
                remainder: magnitude - capacity,
            });
        }
    }

    let mut shares: Vec<i64> = Vec::with_capacity(branches.len());
    let mut fractions: Vec<(usize, i64)> = Vec::with_capacity(branches.len());
    let mut allocated = 0i64;
    for (index, &(_, width)) in branches.iter().enumerate() {
        let weighted = magnitude * i64::from(width);
        let share = (weighted / total).min(shed_cap(width));
        shares.push(share);
        allocated += share;
        if width > 0 {
            fractions.push((index, weighted % total));
        }
    }

    let mut leftover = magnitude - allocated;
    fractions.sort_by(|a, b| b.1.cmp(&a.1));
    while leftover > 0 {
        let mut placed = false;
        for &(index, _) in &fractions {
            if leftover == 0 {
                break;
            }
            if shares[index] < shed_cap(branches[index].1) {
                shares[index] += 1;
                leftover -= 1;
                placed = true;
            }
        }
        if !placed {
            break;
        }
    }
    if leftover != 0 {
        return Err(ResizeError::DistributionImbalance {
            vertex,
            remainder: if shrinking { leftover } else { -leftover },
        });
    }

    let sign = if shrinking { 1 } else { -1 };
    Ok(branches
        .iter()
        .zip(shares)
        .map(|(&(id, _), share)| (id, sign * share))
        .collect())
}
