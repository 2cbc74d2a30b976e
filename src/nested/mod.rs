/*! Nested critical sections and resource groups

Plain [Request](crate::model::Request) bounds carry no nesting
information, but nesting-aware protocols need to know which
resources a task can hold at the same time. This module models each
task's critical sections as an ordered list with parent links
(outermost sections have none) and derives from them the *resource
groups*: the coarsest partition of all referenced resources such
that no two groups share a resource that can be jointly held.
*/

use std::collections::BTreeSet;

use crate::model::ResourceId;
use crate::time::Duration;

/// A maximal set of resources that can be jointly held, directly or
/// via nesting.
pub type LockSet = BTreeSet<ResourceId>;

/// One (possibly nested) critical section in a task's code.
#[derive(Debug, Clone)]
pub struct CriticalSection {
    resource: ResourceId,
    length: Duration,
    outer: Option<usize>,
}

impl CriticalSection {
    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn length(&self) -> Duration {
        self.length
    }

    /// Index of the directly enclosing section, if any.
    pub fn outer(&self) -> Option<usize> {
        self.outer
    }

    pub fn is_outermost(&self) -> bool {
        self.outer.is_none()
    }
}

/// The ordered critical sections of one task. Nested sections refer
/// to their enclosing section by index, so enclosing sections must
/// be added first.
#[derive(Debug, Clone, Default)]
pub struct CriticalSections {
    cs: Vec<CriticalSection>,
}

impl CriticalSections {
    pub fn new() -> Self {
        Default::default()
    }

    /// Add an outermost section; returns its index for use as a
    /// nesting parent.
    pub fn add_outermost(&mut self, resource: ResourceId, length: Duration) -> usize {
        self.cs.push(CriticalSection {
            resource,
            length,
            outer: None,
        });
        self.cs.len() - 1
    }

    /// Add a section nested within the section at index `outer`.
    pub fn add_nested(&mut self, resource: ResourceId, length: Duration, outer: usize) -> usize {
        assert!(outer < self.cs.len());
        self.cs.push(CriticalSection {
            resource,
            length,
            outer: Some(outer),
        });
        self.cs.len() - 1
    }

    pub fn sections(&self) -> &[CriticalSection] {
        &self.cs
    }

    pub fn len(&self) -> usize {
        self.cs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cs.is_empty()
    }

    /// Indices of the outermost sections, in insertion order.
    pub fn outermost(&self) -> impl Iterator<Item = usize> + '_ {
        self.cs
            .iter()
            .enumerate()
            .filter(|(_, cs)| cs.is_outermost())
            .map(|(i, _)| i)
    }

    /// The outermost section enclosing section `i` (`i` itself if it
    /// is outermost).
    pub fn outermost_of(&self, mut i: usize) -> usize {
        while let Some(p) = self.cs[i].outer {
            i = p;
        }
        i
    }

    fn is_nested_within(&self, mut i: usize, y: usize) -> bool {
        while let Some(p) = self.cs[i].outer {
            if p == y {
                return true;
            }
            i = p;
        }
        false
    }

    /// All resources acquired within section `y`: its own resource
    /// plus those of every section nested (transitively) inside it.
    pub fn nested_closure(&self, y: usize) -> LockSet {
        self.cs
            .iter()
            .enumerate()
            .filter(|&(i, _)| i == y || self.is_nested_within(i, y))
            .map(|(_, cs)| cs.resource())
            .collect()
    }

    /// Whether everything section `y` acquires stays within the lock
    /// set `s`.
    pub fn is_within(&self, y: usize, s: &LockSet) -> bool {
        self.nested_closure(y).is_subset(s)
    }
}

/// The coarsest partition of all referenced resources into lock
/// sets: start from one {resource, outermost resource} pair per
/// section and merge overlapping sets until none overlap. Groups are
/// returned ordered by their smallest resource id.
pub fn resource_groups(all: &[CriticalSections]) -> Vec<LockSet> {
    let mut groups: Vec<LockSet> = Vec::new();

    for css in all {
        for (i, cs) in css.sections().iter().enumerate() {
            let outermost = css.sections()[css.outermost_of(i)].resource();
            groups.push([cs.resource(), outermost].into_iter().collect());
        }
    }

    // merge non-disjoint sets until a fixed point is reached
    loop {
        let mut merged_some = false;

        let mut i = 0;
        while i < groups.len() {
            let mut j = i + 1;
            while j < groups.len() {
                if !groups[i].is_disjoint(&groups[j]) {
                    let other = groups.swap_remove(j);
                    groups[i].extend(other);
                    merged_some = true;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }

        if !merged_some {
            break;
        }
    }

    groups.sort_by_key(|g| g.iter().next().copied());
    groups
}

/// The group containing `res`, if any section references it.
pub fn group_of(groups: &[LockSet], res: ResourceId) -> Option<usize> {
    groups.iter().position(|g| g.contains(&res))
}

fn has_parent_pair(a: &LockSet, b: &LockSet, all: &[CriticalSections]) -> bool {
    all.iter().any(|css| {
        css.sections().iter().any(|cs| {
            a.contains(&cs.resource())
                && cs
                    .outer()
                    .map(|p| b.contains(&css.sections()[p].resource()))
                    .unwrap_or(false)
        })
    })
}

/// Whether two lock sets can conflict: they share a resource, or a
/// resource of one is directly nested within a resource of the
/// other anywhere in the task set (checked in both directions).
pub fn possibly_conflicting(a: &LockSet, b: &LockSet, all: &[CriticalSections]) -> bool {
    !a.is_disjoint(b) || has_parent_pair(a, b, all) || has_parent_pair(b, a, all)
}
