use crate::bounds::{BlockingBounds, Interference};
use crate::contention::{bound_blocking, sort_all_by_request_length, split_by_resource, Exclusion};
use crate::model::TaskSet;

/// Blocking bounds under the global FMLP.
///
/// Requests wait in FIFO order, so per issued request every other
/// task contributes at most one blocking request.
pub fn global(ts: &TaskSet) -> BlockingBounds {
    // split everything by resource, sort, and then start counting
    let mut resources = split_by_resource(ts);
    sort_all_by_request_length(&mut resources);

    let num_tasks = ts.len() as u64;
    let mut results = BlockingBounds::new(ts);

    for (i, tsk) in ts.tasks().iter().enumerate() {
        let mut bterm = Interference::default();

        for req in tsk.requests() {
            let cs = &resources[req.resource()];
            let interval = tsk.response();
            let issued = req.num_requests();

            // every other task may block once per request
            let total_limit = (num_tasks - 1) * issued;
            let per_src_limit = issued;

            bterm += bound_blocking(
                ts,
                cs,
                interval,
                total_limit,
                per_src_limit,
                Exclusion::Task(i),
                0,
            );
        }

        results[i] = bterm;
    }

    results
}
