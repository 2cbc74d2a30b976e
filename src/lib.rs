pub mod time;
pub mod model;
pub mod bounds;
pub mod contention;
pub mod omlp;
pub mod fmlp;
pub mod mpcp;
pub mod dpcp;
pub mod gipp;
pub mod linprog;
pub mod nested;

#[cfg(test)]
mod tests {
    use crate::bounds::Interference;
    use crate::model::{AccessMode, Request, Task, TaskSet};
    use crate::{dpcp, fmlp, mpcp, omlp};

    fn two_tasks_one_resource() -> TaskSet {
        // task 0 requests R once for length 5; the lower-priority
        // task 1 requests R once for length 3
        let mut a = Task::new(100, 50, 1, 0);
        a.add_request(Request::new(0, AccessMode::Exclusive, 1, 5));
        let mut b = Task::new(100, 60, 2, 1);
        b.add_request(Request::new(0, AccessMode::Exclusive, 1, 3));
        TaskSet::new(vec![a, b])
    }

    #[test]
    fn fifo_protocols_agree_on_the_two_task_scenario() {
        let ts = two_tasks_one_resource();

        for bounds in [
            fmlp::global(&ts),
            fmlp::partitioned(&ts, true),
            omlp::global(&ts, 2),
            omlp::clustered(&ts, 1, None),
        ] {
            assert_eq!(bounds[0].total_length, 3);
            assert_eq!(bounds[1].total_length, 5);
        }
    }

    #[test]
    fn growing_a_critical_section_never_helps_the_other_tasks() {
        let build = |len: u64| {
            let mut a = Task::new(100, 50, 1, 0);
            a.add_request(Request::new(0, AccessMode::Exclusive, 1, len));
            let mut b = Task::new(100, 60, 2, 0);
            b.add_request(Request::new(0, AccessMode::Exclusive, 1, 3));
            let mut c = Task::new(100, 80, 3, 1);
            c.add_request(Request::new(0, AccessMode::Exclusive, 2, 4));
            TaskSet::new(vec![a, b, c])
        };

        let mut prev = vec![0u64; 6];
        for len in [1u64, 2, 5, 9, 24] {
            let ts = build(len);
            let fmlp = fmlp::global(&ts);
            let omlp = omlp::clustered(&ts, 2, None);
            let totals: Vec<u64> = (0..3)
                .map(|i| fmlp[i].total_length)
                .chain((0..3).map(|i| omlp[i].total_length))
                .collect();

            // task 0 issues the growing request; the bounds of the
            // other tasks may only grow with it
            for i in [1, 2, 4, 5] {
                assert!(
                    totals[i] >= prev[i],
                    "bound shrank from {} to {} at length {}",
                    prev[i],
                    totals[i],
                    len
                );
            }
            prev = totals;
        }
    }

    #[test]
    fn priority_protocols_favor_the_high_priority_task() {
        let ts = two_tasks_one_resource();

        let mpcp = mpcp::mpcp_bounds(&ts, false);
        assert!(mpcp[0].total_length <= mpcp[1].total_length);

        let mut locality = dpcp::ResourceLocality::new();
        locality.assign(0, 0);
        let dpcp = dpcp::dpcp_bounds(&ts, &locality);
        assert!(dpcp.remote_blocking(1) > Interference::default());
    }
}
