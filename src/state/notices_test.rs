use super::*;

#[test]
fn notices_default_empty() {
    assert!(Notices::new().pending().is_empty());
}

#[test]
fn drain_returns_in_order_and_empties() {
    let notices = Notices::new();
    notices.success("saved");
    notices.error("failed");
    let drained = notices.drain();
    assert_eq!(
        drained,
        vec![
            Notice { level: NoticeLevel::Success, message: "saved".into() },
            Notice { level: NoticeLevel::Error, message: "failed".into() },
        ]
    );
    assert!(notices.drain().is_empty());
}

#[test]
fn clones_share_queue() {
    let a = Notices::new();
    let b = a.clone();
    b.error("boom");
    assert_eq!(a.pending().len(), 1);
}
