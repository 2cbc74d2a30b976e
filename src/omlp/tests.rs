use super::*;
use crate::bounds::Interference;
use crate::model::{AccessMode, Request, Task, TaskSet};

fn mutex_task(
    cluster: usize,
    priority: u32,
    response: u64,
    requests: Vec<(usize, u64, u64)>,
) -> Task {
    let mut t = Task::new(100, response, priority, cluster);
    for (res, num, len) in requests {
        t.add_request(Request::new(res, AccessMode::Exclusive, num, len));
    }
    t
}

#[test]
fn no_sharing_no_blocking() {
    let ts = TaskSet::new(vec![mutex_task(0, 1, 50, vec![])]);
    assert_eq!(global(&ts, 4)[0], Interference::default());
    assert_eq!(partitioned(&ts)[0], Interference::default());
    assert_eq!(clustered(&ts, 2, None)[0], Interference::default());
    assert_eq!(
        clustered_kx(&ts, &vec![], 2, None)[0],
        Interference::default()
    );
    assert_eq!(clustered_rw(&ts, 2, None)[0], Interference::default());
}

#[test]
fn global_priority_queue_case() {
    // four sources on two processors: 2m-1 total, 2 per source
    let ts = TaskSet::new(vec![
        mutex_task(0, 1, 50, vec![(0, 1, 2)]),
        mutex_task(0, 2, 100, vec![(0, 1, 10)]),
        mutex_task(1, 3, 100, vec![(0, 1, 6)]),
        mutex_task(1, 4, 100, vec![(0, 1, 4)]),
    ]);
    let bounds = global(&ts, 2);
    // two issues of the longest source, one of the next
    assert_eq!(bounds[0], Interference::new(26, 3));
}

#[test]
fn global_fifo_case() {
    // three sources on two processors: plain FIFO, one per source
    let ts = TaskSet::new(vec![
        mutex_task(0, 1, 50, vec![(0, 1, 2)]),
        mutex_task(0, 2, 100, vec![(0, 1, 10)]),
        mutex_task(1, 3, 100, vec![(0, 1, 6)]),
    ]);
    let bounds = global(&ts, 2);
    assert_eq!(bounds[0], Interference::new(16, 2));
}

#[test]
fn partitioned_counts_one_request_per_remote_partition() {
    let ts = TaskSet::new(vec![
        mutex_task(0, 1, 50, vec![(0, 1, 2)]),
        mutex_task(1, 2, 100, vec![(0, 1, 10)]),
        mutex_task(1, 3, 100, vec![(0, 1, 6)]),
        mutex_task(2, 4, 100, vec![(0, 1, 4)]),
    ]);
    let bounds = partitioned(&ts);
    // one blocking request per remote partition, longest first
    assert_eq!(bounds[0], Interference::new(14, 2));
    assert_eq!(bounds.max_request_span(0), Interference::new(16, 3));
    assert_eq!(bounds.arrival_blocking(0), Interference::default());
}

#[test]
fn clustered_charges_priority_donation() {
    let ts = TaskSet::new(vec![
        mutex_task(0, 1, 50, vec![(0, 1, 2)]),
        mutex_task(0, 2, 100, vec![(0, 1, 10)]),
        mutex_task(1, 3, 100, vec![(0, 1, 6)]),
        mutex_task(1, 4, 100, vec![(0, 1, 4)]),
    ]);
    let bounds = clustered(&ts, 2, None);

    // direct: one event from the local cluster (one other processor),
    // two from the remote cluster
    assert_eq!(bounds.arrival_blocking(0), Interference::new(22, 4));
    assert_eq!(bounds[0], Interference::new(42, 7));
}

#[test]
fn dedicated_irq_processor_hosts_no_contenders_in_the_span() {
    let ts = TaskSet::new(vec![
        mutex_task(0, 1, 50, vec![(0, 2, 2)]),
        mutex_task(1, 2, 100, vec![(0, 1, 10)]),
        mutex_task(1, 3, 100, vec![(0, 1, 6)]),
    ]);
    let bounds = clustered(&ts, 2, Some(1));

    // the single-issue span admits one slot from the remote cluster
    // (its second processor handles interrupts only) plus the
    // request itself
    assert_eq!(bounds.max_request_span(0), Interference::new(12, 2));
    assert_eq!(bounds[0], Interference::new(20, 2));
}

#[test]
fn task_fair_mutex_is_clustered_omlp() {
    let ts = TaskSet::new(vec![
        mutex_task(0, 1, 50, vec![(0, 1, 2)]),
        mutex_task(0, 2, 100, vec![(0, 1, 10)]),
        mutex_task(1, 3, 100, vec![(0, 2, 6)]),
    ]);
    assert_eq!(clustered(&ts, 2, None), task_fair_mutex(&ts, 2, None));
}

#[test]
fn kx_with_full_replication_eliminates_queueing() {
    let ts = TaskSet::new(vec![
        mutex_task(0, 1, 50, vec![(0, 1, 2)]),
        mutex_task(0, 2, 100, vec![(0, 1, 10)]),
        mutex_task(1, 3, 100, vec![(0, 1, 6)]),
        mutex_task(1, 4, 100, vec![(0, 1, 4)]),
    ]);
    // four processors, four replicas: ceil(4/4) - 1 = 0 queueing slots
    let bounds = clustered_kx(&ts, &vec![4], 2, None);

    // direct blocking vanishes; only priority donation remains
    assert_eq!(bounds.max_request_span(0), Interference::new(2, 1));
    assert_eq!(bounds[0], Interference::new(10, 1)); // arrival: span of task 1
    assert_eq!(bounds[1], Interference::default());
    assert_eq!(bounds[2], Interference::new(4, 1)); // arrival: span of task 3
    assert_eq!(bounds[3], Interference::default());
}

#[test]
fn kx_single_replica_matches_fifo_queueing() {
    let ts = TaskSet::new(vec![
        mutex_task(0, 1, 50, vec![(0, 1, 2)]),
        mutex_task(0, 2, 100, vec![(0, 1, 10)]),
        mutex_task(1, 3, 100, vec![(0, 1, 6)]),
        mutex_task(1, 4, 100, vec![(0, 1, 4)]),
    ]);
    let bounds = clustered_kx(&ts, &vec![1], 2, None);
    // one candidate from the local cluster, two from the remote one,
    // all admitted by the ceil(4/1) - 1 = 3 total cap
    assert_eq!(bounds.max_request_span(0), Interference::new(22, 4));
}

fn rw_task(cluster: usize, priority: u32, response: u64, reqs: Vec<(usize, AccessMode, u64)>) -> Task {
    let mut t = Task::new(100, response, priority, cluster);
    for (res, mode, len) in reqs {
        t.add_request(Request::new(res, mode, 1, len));
    }
    t
}

#[test]
fn readers_alone_never_block() {
    let ts = TaskSet::new(vec![
        rw_task(0, 1, 50, vec![(0, AccessMode::Read, 2)]),
        rw_task(0, 2, 100, vec![(0, AccessMode::Read, 3)]),
        rw_task(1, 3, 100, vec![(0, AccessMode::Read, 9)]),
    ]);
    let bounds = clustered_rw(&ts, 2, None);
    for i in 0..ts.len() {
        assert_eq!(bounds.remote_blocking(i), Interference::default());
        assert_eq!(bounds[i].total_length, bounds.arrival_blocking(i).total_length);
    }
}

#[test]
fn rw_reader_blocked_by_writer_phase() {
    let ts = TaskSet::new(vec![
        rw_task(0, 1, 50, vec![(0, AccessMode::Read, 2)]),
        rw_task(0, 2, 100, vec![(0, AccessMode::Read, 3)]),
        rw_task(1, 3, 100, vec![(0, AccessMode::Write, 8)]),
    ]);
    let bounds = clustered_rw(&ts, 2, None);

    // one writer phase (8) plus one reader phase (3)
    assert_eq!(bounds.arrival_blocking(0), Interference::new(13, 3));
    assert_eq!(bounds[0], Interference::new(24, 5));
    // the writer is blocked by at most one reader phase
    assert_eq!(bounds[2], Interference::new(3, 1));
}

#[test]
fn phase_fair_rw_is_clustered_rw() {
    let ts = TaskSet::new(vec![
        rw_task(0, 1, 50, vec![(0, AccessMode::Read, 2)]),
        rw_task(1, 2, 100, vec![(0, AccessMode::Write, 8)]),
    ]);
    assert_eq!(clustered_rw(&ts, 2, None), phase_fair_rw(&ts, 2, None));
}

#[test]
fn task_fair_rw_never_exceeds_mutex_degradation() {
    let rw = TaskSet::new(vec![
        rw_task(0, 1, 50, vec![(0, AccessMode::Read, 2)]),
        rw_task(0, 2, 100, vec![(0, AccessMode::Read, 3)]),
        rw_task(1, 3, 100, vec![(0, AccessMode::Write, 8)]),
    ]);
    let mtx = TaskSet::new(vec![
        rw_task(0, 1, 50, vec![(0, AccessMode::Exclusive, 2)]),
        rw_task(0, 2, 100, vec![(0, AccessMode::Exclusive, 3)]),
        rw_task(1, 3, 100, vec![(0, AccessMode::Exclusive, 8)]),
    ]);

    let bounds = task_fair_rw(&rw, &mtx, 2, None);
    let baseline = clustered(&mtx, 2, None);
    for i in 0..rw.len() {
        assert!(bounds[i].total_length <= baseline[i].total_length);
        assert!(bounds.max_request_span(i) <= baseline.max_request_span(i));
    }
}
