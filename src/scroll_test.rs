use futures::FutureExt;
use futures::executor::block_on;

use super::*;
use crate::namespace::NamespaceKey;
use crate::store::{MemoryScalars, ScopedScalars};
use crate::test_support::{FakePage, ImmediateFrames, ManualFrames, ROW_HEIGHT};

fn memory() -> ScrollMemory<ScopedScalars<MemoryScalars>> {
    ScrollMemory::new(ScopedScalars::new(MemoryScalars::new(), NamespaceKey::new("quiz1", 1)))
}

// =============================================================
// Save
// =============================================================

#[test]
fn save_picks_first_fully_visible_row() {
    let page = FakePage::with_items(&["q1", "q2", "q3"]);
    page.scroll_by(ROW_HEIGHT / 2.0);
    let registry = ItemRegistry::enumerate(&page);
    let memory = memory();

    assert_eq!(memory.save_visible_position(&page, &registry).as_deref(), Some("q2"));
    assert_eq!(memory.saved_position().as_deref(), Some("q2"));
}

#[test]
fn save_overwrites_previous_position() {
    let page = FakePage::with_items(&["q1", "q2", "q3"]);
    let registry = ItemRegistry::enumerate(&page);
    let memory = memory();

    memory.save_visible_position(&page, &registry);
    page.scroll_by(ROW_HEIGHT * 2.0);
    memory.save_visible_position(&page, &registry);

    assert_eq!(memory.saved_position().as_deref(), Some("q3"));
}

#[test]
fn save_without_fully_visible_row_keeps_previous_value() {
    let page = FakePage::with_items(&["q1", "q2"]).viewport(ROW_HEIGHT / 2.0);
    let registry = ItemRegistry::enumerate(&page);
    let memory = memory();
    memory.scalars.set(VISIBLE_POSITION_KEY, "earlier").unwrap();

    assert_eq!(memory.save_visible_position(&page, &registry), None);
    assert_eq!(memory.saved_position().as_deref(), Some("earlier"));
}

#[test]
fn save_on_empty_page_writes_nothing() {
    let page = FakePage::new();
    let registry = ItemRegistry::enumerate(&page);
    let memory = memory();

    assert_eq!(memory.save_visible_position(&page, &registry), None);
    assert_eq!(memory.saved_position(), None);
}

// =============================================================
// Restore
// =============================================================

#[test]
fn restore_scrolls_only_after_two_frames() {
    let page = FakePage::with_items(&["q1", "q2"]);
    let memory = memory();
    memory.scalars.set(VISIBLE_POSITION_KEY, "q2").unwrap();
    let frames = ManualFrames::default();
    let target = page.target("q2");

    let mut restore = Box::pin(memory.restore_visible_position(&page, &frames));

    assert!(restore.as_mut().now_or_never().is_none());
    assert_eq!(frames.requested(), 1);
    assert_eq!(target.scroll_count(), 0);

    frames.tick();
    assert!(restore.as_mut().now_or_never().is_none());
    assert_eq!(frames.requested(), 2);
    assert_eq!(target.scroll_count(), 0, "one frame is not enough");

    frames.tick();
    let outcome = restore.as_mut().now_or_never();
    assert_eq!(outcome, Some(RestoreOutcome::Scrolled("q2".to_owned())));
    assert_eq!(target.scroll_count(), 1);
}

#[test]
fn restore_with_stale_id_is_a_no_op() {
    let page = FakePage::with_items(&["q1"]);
    let memory = memory();
    memory.scalars.set(VISIBLE_POSITION_KEY, "removed").unwrap();
    let frames = ImmediateFrames::default();

    let outcome = block_on(memory.restore_visible_position(&page, &frames));

    assert_eq!(outcome, RestoreOutcome::StaleReference("removed".to_owned()));
    assert_eq!(page.target("q1").scroll_count(), 0);
    assert_eq!(memory.saved_position().as_deref(), Some("removed"));
}

#[test]
fn restore_without_saved_position_requests_no_frames() {
    let page = FakePage::with_items(&["q1"]);
    let memory = memory();
    let frames = ImmediateFrames::default();

    let outcome = block_on(memory.restore_visible_position(&page, &frames));

    assert_eq!(outcome, RestoreOutcome::NothingSaved);
    assert_eq!(frames.requested(), 0);
}

#[test]
fn saved_position_is_scoped_to_document() {
    let raw = MemoryScalars::new();
    let quiz1 = ScrollMemory::new(ScopedScalars::new(raw.clone(), NamespaceKey::new("quiz1", 1)));
    let quiz2 = ScrollMemory::new(ScopedScalars::new(raw, NamespaceKey::new("quiz2", 1)));
    let page = FakePage::with_items(&["q1"]);
    let registry = ItemRegistry::enumerate(&page);

    quiz1.save_visible_position(&page, &registry);

    assert_eq!(quiz1.saved_position().as_deref(), Some("q1"));
    assert_eq!(quiz2.saved_position(), None);
}
