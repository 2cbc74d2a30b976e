/*! Contention sets and their construction

A *contention set* is the collection of critical-section requests
that can compete with one another — for a resource, within a
cluster, or per task. This module derives all contention-set shapes
used by the protocol analyses from a [TaskSet], and provides the
descending-by-length sort that every greedy bound relies on.

The greedy worst-case selection primitive itself lives in
[greedy].
*/

use crate::model::{Request, Task, TaskSet};

mod greedy;

pub use greedy::{
    add_blocking, bound_blocking, bound_blocking_all, bound_blocking_all_clusters, bound_limited,
    contention_from_all_clusters, sort_limited_by_request_length, ClusterLimit, ClusterLimits,
    Exclusion, LimitedContentionSet, LimitedRequest, NO_LIMIT,
};

/// Requests competing for one resource (or one cluster, or one
/// task), ordered by descending length once sorted.
pub type ContentionSet<'a> = Vec<&'a Request>;

/// Contention sets indexed by resource id.
pub type Resources<'a> = Vec<ContentionSet<'a>>;

/// The tasks assigned to one cluster, in task-set order.
pub type Cluster<'a> = Vec<&'a Task>;

/// Clusters indexed by cluster id.
pub type Clusters<'a> = Vec<Cluster<'a>>;

/// Per-cluster, per-resource contention sets.
pub type ClusterResources<'a> = Vec<Resources<'a>>;

/// One flat contention set per cluster.
pub type AllPerCluster<'a> = Vec<ContentionSet<'a>>;

/// One contention set per task of a cluster.
pub type TaskContention<'a> = Vec<ContentionSet<'a>>;

/// Per-task contention, per cluster.
pub type ClusterContention<'a> = Vec<TaskContention<'a>>;

/// Partition the task set by cluster id. Every task appears in
/// exactly one cluster.
pub fn split_by_cluster(ts: &TaskSet) -> Clusters<'_> {
    let mut clusters: Clusters = Vec::new();

    for tsk in ts.tasks() {
        while tsk.cluster() >= clusters.len() {
            clusters.push(Cluster::new());
        }
        clusters[tsk.cluster()].push(tsk);
    }

    clusters
}

/// Bucket every request of the task set by the resource it
/// accesses. Every request appears in exactly one bucket.
pub fn split_by_resource(ts: &TaskSet) -> Resources<'_> {
    let mut resources: Resources = Vec::new();

    for tsk in ts.tasks() {
        collect_by_resource(tsk, &mut resources);
    }

    resources
}

fn collect_by_resource<'a>(tsk: &'a Task, resources: &mut Resources<'a>) {
    for req in tsk.requests() {
        while req.resource() >= resources.len() {
            resources.push(ContentionSet::new());
        }
        resources[req.resource()].push(req);
    }
}

/// Bucket requests by resource separately within each cluster.
pub fn split_by_resource_per_cluster<'a>(clusters: &Clusters<'a>) -> ClusterResources<'a> {
    clusters
        .iter()
        .map(|cluster| {
            let mut resources = Resources::new();
            for tsk in cluster {
                collect_by_resource(tsk, &mut resources);
            }
            resources
        })
        .collect()
}

/// Split one contention set into its read and write parts.
/// `Exclusive` requests count as writes.
pub fn split_by_type<'a>(cs: &ContentionSet<'a>) -> (ContentionSet<'a>, ContentionSet<'a>) {
    let mut reads = ContentionSet::new();
    let mut writes = ContentionSet::new();

    for req in cs {
        if req.mode().is_read() {
            reads.push(req);
        } else {
            writes.push(req);
        }
    }

    (reads, writes)
}

/// Split per-resource contention sets into read and write parts.
/// Relative order, and hence sortedness, is maintained.
pub fn split_resources_by_type<'a>(resources: &Resources<'a>) -> (Resources<'a>, Resources<'a>) {
    resources.iter().map(split_by_type).unzip()
}

/// Split per-cluster, per-resource contention sets into read and
/// write parts.
pub fn split_cluster_resources_by_type<'a>(
    per_cluster: &ClusterResources<'a>,
) -> (ClusterResources<'a>, ClusterResources<'a>) {
    per_cluster.iter().map(split_resources_by_type).unzip()
}

/// All requests issued from each cluster, as one flat contention set
/// per cluster.
pub fn all_per_cluster<'a>(clusters: &Clusters<'a>) -> AllPerCluster<'a> {
    clusters
        .iter()
        .map(|cluster| {
            cluster
                .iter()
                .flat_map(|tsk| tsk.requests().iter())
                .collect()
        })
        .collect()
}

/// One contention set per task, per cluster.
pub fn derive_task_contention<'a>(clusters: &Clusters<'a>) -> ClusterContention<'a> {
    clusters
        .iter()
        .map(|cluster| {
            cluster
                .iter()
                .map(|tsk| tsk.requests().iter().collect())
                .collect()
        })
        .collect()
}

/// Stable descending sort by critical-section length. Stability
/// keeps equal-length ties in task-set order, which makes analysis
/// results reproducible.
pub fn sort_by_request_length(cs: &mut [&Request]) {
    cs.sort_by(|a, b| b.length().cmp(&a.length()));
}

/// [sort_by_request_length] applied to every set in a per-resource,
/// per-cluster, or per-task container.
pub fn sort_all_by_request_length(sets: &mut [ContentionSet<'_>]) {
    for cs in sets {
        sort_by_request_length(cs);
    }
}

/// [sort_by_request_length] applied to a doubly-nested container
/// (per cluster, per resource or per task).
pub fn sort_nested_by_request_length(sets: &mut [Vec<ContentionSet<'_>>]) {
    for inner in sets {
        sort_all_by_request_length(inner);
    }
}
