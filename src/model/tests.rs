use super::*;

fn task_with_requests(period: Duration, response: Duration) -> Task {
    let mut t = Task::new(period, response, 1, 0);
    t.add_request(Request::new(0, AccessMode::Exclusive, 2, 5));
    t.add_request(Request::new(3, AccessMode::Read, 1, 7));
    t
}

#[test]
fn taskset_assigns_stable_indices() {
    let ts = TaskSet::new(vec![
        task_with_requests(100, 50),
        task_with_requests(200, 80),
    ]);
    for (i, t) in ts.tasks().iter().enumerate() {
        assert_eq!(t.id(), i);
        for r in t.requests() {
            assert_eq!(r.task(), i);
        }
    }
}

#[test]
fn max_num_requests_rounds_up() {
    let ts = TaskSet::new(vec![task_with_requests(100, 50)]);
    let req = &ts.task(0).requests()[0];
    // ceil((120 + 50) / 100) = 2 jobs, 2 requests each
    assert_eq!(ts.max_num_requests(req, 120), 4);
    // ceil((150 + 50) / 100) = 2 jobs exactly
    assert_eq!(ts.max_num_requests(req, 150), 4);
    assert_eq!(ts.max_num_requests(req, 151), 6);
}

#[test]
fn num_arrivals_includes_carry_in() {
    let t = Task::new(10, 10, 1, 0);
    assert_eq!(t.num_arrivals(), 2);
    let t = Task::new(10, 25, 1, 0);
    assert_eq!(t.num_arrivals(), 4);
}

#[test]
fn dimensions() {
    let mut a = Task::new(10, 10, 1, 2);
    a.add_request(Request::new(4, AccessMode::Write, 1, 1));
    let ts = TaskSet::new(vec![a]);
    assert_eq!(ts.num_clusters(), 3);
    assert_eq!(ts.num_resources(), 5);
    assert_eq!(ts.task(0).max_request_length(), 1);
}
