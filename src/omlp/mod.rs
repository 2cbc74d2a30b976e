/*! Blocking bounds for the O(m) Locking Protocol (OMLP) family

This module covers the suspension-based OMLP analyses for global,
partitioned, and clustered scheduling, the clustered k-exclusion
variant, the clustered reader/writer variant, and the structurally
equivalent task-fair and phase-fair spinlock analyses.

All of them are compositions of the contention-set builder and the
greedy bound primitive; the per-protocol knowledge is confined to
the FIFO-queueing caps derived from processor counts and replica
counts.
*/

use crate::contention::{ClusterLimit, ClusterLimits, ClusterResources};
use crate::contention::{
    bound_blocking_all_clusters, contention_from_all_clusters, LimitedContentionSet,
};
use crate::bounds::Interference;
use crate::model::{ClusterId, ResourceId, Task, TaskSet};

mod clustered;
mod clustered_kx;
mod clustered_rw;
mod global;
mod partitioned;
mod task_fair;

pub use clustered::clustered;
pub use clustered_kx::clustered_kx;
pub use clustered_rw::clustered_rw;
pub use global::global;
pub use partitioned::partitioned;
pub use task_fair::task_fair_rw;

use crate::bounds::BlockingBounds;

/// Per-resource replica counts for the k-exclusion analysis,
/// indexed by resource id.
pub type ReplicaInfo = Vec<u64>;

/// Caps for non-preemptive FIFO queueing: at most one blocking
/// request per processor of each cluster per issued request, minus
/// the processor the task under analysis occupies and, if present,
/// the dedicated interrupt-handling processor.
pub(crate) fn np_fifo_limits(
    tsk: &Task,
    num_clusters: usize,
    procs_per_cluster: u64,
    issued: u64,
    dedicated_irq: Option<ClusterId>,
) -> ClusterLimits {
    let mut limits = ClusterLimits::with_capacity(num_clusters);

    for idx in 0..num_clusters {
        let mut parallelism = procs_per_cluster;

        if Some(idx) == dedicated_irq {
            parallelism -= 1;
        }

        if parallelism > 0 && tsk.cluster() == idx {
            parallelism -= 1;
        }

        limits.push(ClusterLimit::new(issued * parallelism, issued));
    }

    limits
}

/// Worst-case FIFO queueing delay for `issued` requests for one
/// resource, summed over all clusters.
pub(crate) fn np_fifo_per_resource(
    ts: &TaskSet,
    tsk: &Task,
    resources: &ClusterResources,
    procs_per_cluster: u64,
    res_id: ResourceId,
    issued: u64,
    dedicated_irq: Option<ClusterId>,
) -> Interference {
    let limits = np_fifo_limits(tsk, resources.len(), procs_per_cluster, issued, dedicated_irq);
    bound_blocking_all_clusters(ts, resources, &limits, res_id, tsk.response(), tsk.id())
}

/// Like [np_fifo_per_resource], but returning the capped candidate
/// set itself so that a caller can impose a further total cap.
pub(crate) fn np_fifo_per_resource_contention<'a>(
    ts: &TaskSet,
    tsk: &Task,
    resources: &ClusterResources<'a>,
    procs_per_cluster: u64,
    res_id: ResourceId,
    issued: u64,
    dedicated_irq: Option<ClusterId>,
) -> LimitedContentionSet<'a> {
    let limits = np_fifo_limits(tsk, resources.len(), procs_per_cluster, issued, dedicated_irq);
    contention_from_all_clusters(ts, resources, &limits, res_id, tsk.response(), tsk.id())
}

/// Merged read/write request counts of one task, per resource.
#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct RwCount {
    pub res_id: ResourceId,
    pub num_reads: u64,
    pub num_writes: u64,
    pub rlength: u64,
    pub wlength: u64,
}

/// Collapse a task's requests into one read count and one write
/// count per resource.
pub(crate) fn merge_rw_requests(tsk: &Task) -> Vec<RwCount> {
    let mut counts: Vec<RwCount> = Vec::new();

    for req in tsk.requests() {
        let res_id = req.resource();
        while counts.len() <= res_id {
            counts.push(RwCount {
                res_id: counts.len(),
                ..RwCount::default()
            });
        }

        if req.mode().is_read() {
            counts[res_id].num_reads += req.num_requests();
            counts[res_id].rlength = req.length();
        } else {
            counts[res_id].num_writes += req.num_requests();
            counts[res_id].wlength = req.length();
        }
    }

    counts
}

/// Task-fair mutex spin locks under clustered scheduling are
/// analyzed exactly like the clustered OMLP.
pub fn task_fair_mutex(
    ts: &TaskSet,
    procs_per_cluster: u64,
    dedicated_irq: Option<ClusterId>,
) -> BlockingBounds {
    clustered(ts, procs_per_cluster, dedicated_irq)
}

/// Phase-fair reader/writer locks are analyzed exactly like the
/// clustered reader/writer OMLP.
pub fn phase_fair_rw(
    ts: &TaskSet,
    procs_per_cluster: u64,
    dedicated_irq: Option<ClusterId>,
) -> BlockingBounds {
    clustered_rw(ts, procs_per_cluster, dedicated_irq)
}

#[cfg(test)]
mod tests;
