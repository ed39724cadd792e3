use siteforge::engine::{DispatchQueue, PendingDispatch};

#[test]
fn triggers_coalesce_into_one_follow_up_run() {
    let mut queue = DispatchQueue::new(1);
    assert!(queue.is_empty());

    queue.record(PendingDispatch {
        tasks: vec!["styles".into()],
        reload: false,
    });
    queue.record(PendingDispatch {
        tasks: vec!["images".into(), "styles".into()],
        reload: true,
    });

    let next = queue.pop().expect("one pending dispatch");
    // Order of first appearance is preserved; duplicates are dropped; a
    // reload request anywhere in the burst survives.
    assert_eq!(next.tasks, vec!["styles".to_string(), "images".to_string()]);
    assert!(next.reload);

    assert!(queue.is_empty());
    assert!(queue.pop().is_none());
}

#[test]
fn queue_length_is_clamped_to_at_least_one() {
    let mut queue = DispatchQueue::new(0);
    queue.record(PendingDispatch {
        tasks: vec!["html".into()],
        reload: false,
    });
    assert!(queue.pop().is_some());
}
