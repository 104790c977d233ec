#![allow(clippy::unwrap_used, reason = "Fine in tests")]
mod common;

use common::{RecordingSurface, numbered_lines};
use tome_core::{
  DeliveryController,
  DeliveryMode,
  DeliveryOptions,
  Outcome,
  delivery::{FocusContext, Key, Margin, ScrollMetrics, Slot},
  split::line_count,
};

fn controller(mode: DeliveryMode) -> DeliveryController<RecordingSurface> {
  DeliveryController::new(RecordingSurface::new(), DeliveryOptions {
    mode,
    lines_per_page: 10,
    ..DeliveryOptions::default()
  })
}

fn near_bottom() -> ScrollMetrics {
  ScrollMetrics {
    scroll_top:    1500.0,
    scroll_height: 2000.0,
    client_height: 400.0,
  }
}

#[tokio::test]
async fn infinite_scroll_appends_chunks() {
  let view = controller(DeliveryMode::InfiniteScroll);
  assert_eq!(view.load(numbered_lines(250), "Book").await, Outcome::Materialized(0));
  assert_eq!(view.state().unit_count, 3);
  assert_eq!(view.state().cursor, 1);

  assert_eq!(view.request_next().await, Outcome::Materialized(1));
  assert_eq!(view.request_next().await, Outcome::Materialized(2));
  assert_eq!(view.state().cursor, 3);
  assert!(!view.surface().last_navigation().unwrap().can_next);
  assert_eq!(view.request_next().await, Outcome::Exhausted);
  assert_eq!(view.state().cursor, 3);

  let blocks = view.surface().visible();
  let sizes: Vec<usize> = blocks.iter().map(|b| line_count(&b.markdown)).collect();
  assert_eq!(sizes, vec![100, 100, 50]);
  assert!(blocks.iter().all(|b| b.slot == Slot::Stream && b.frame.is_none()));
  assert_eq!(view.state().materialized_count, 3);
}

#[tokio::test]
async fn scroll_threshold_gates_loading() {
  let view = controller(DeliveryMode::InfiniteScroll);
  view.load(numbered_lines(250), "Book").await;

  let far = ScrollMetrics {
    scroll_top:    0.0,
    scroll_height: 5000.0,
    client_height: 400.0,
  };
  assert_eq!(view.on_scroll(far).await, Outcome::Ignored);
  assert_eq!(view.on_scroll(near_bottom()).await, Outcome::Materialized(1));
  assert_eq!(view.on_scroll(near_bottom()).await, Outcome::Materialized(2));
  assert_eq!(view.on_scroll(near_bottom()).await, Outcome::Exhausted);
}

#[tokio::test]
async fn continuous_scroll_starts_with_three_pages() {
  let view = controller(DeliveryMode::ContinuousScroll);
  assert_eq!(view.load(numbered_lines(55), "Book").await, Outcome::Materialized(2));
  assert_eq!(view.surface().visible_indices(), vec![0, 1, 2]);

  let first = &view.surface().visible()[0];
  let frame = first.frame.as_ref().unwrap();
  assert_eq!(frame.header, Margin::Text("Book".to_string()));
  assert_eq!(frame.footer, Margin::Text("Page 1 of 6".to_string()));

  assert_eq!(view.on_scroll(near_bottom()).await, Outcome::Materialized(3));
  assert_eq!(view.surface().visible_indices(), vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn continuous_scroll_short_document() {
  let view = controller(DeliveryMode::ContinuousScroll);
  assert_eq!(view.load("just one line", "Book").await, Outcome::Exhausted);
  assert_eq!(view.surface().visible_indices(), vec![0]);
  assert!(!view.can_go_next());
}

#[tokio::test]
async fn two_page_navigation_clamps() {
  let view = controller(DeliveryMode::TwoPage);
  view.load(numbered_lines(50), "Book").await;
  assert_eq!(view.state().unit_count, 5);
  assert_eq!(view.state().cursor, 0);
  assert_eq!(view.page_label().as_deref(), Some("Pages 1-2 of 5"));

  let mut cursors = vec![view.state().cursor];
  for _ in 0..3 {
    view.next().await;
    cursors.push(view.state().cursor);
  }
  assert_eq!(cursors, vec![0, 2, 4, 4]);
  assert!(!view.can_go_next());
  assert_eq!(view.page_label().as_deref(), Some("Page 5 of 5"));

  // The last spread has no right-hand page.
  let visible = view.surface().visible();
  assert_eq!(visible.len(), 1);
  assert_eq!(visible[0].slot, Slot::Left);

  assert_eq!(view.previous().await, Outcome::Materialized(2));
  let slots: Vec<Slot> = view.surface().visible().iter().map(|b| b.slot).collect();
  assert_eq!(slots, vec![Slot::Left, Slot::Right]);
}

#[tokio::test]
async fn single_page_navigation() {
  let view = controller(DeliveryMode::SinglePage);
  view.load(numbered_lines(25), "Book").await;
  assert!(!view.can_go_previous());
  assert_eq!(view.previous().await, Outcome::Exhausted);

  assert_eq!(view.request_next().await, Outcome::Materialized(1));
  assert_eq!(view.next().await, Outcome::Materialized(2));
  assert_eq!(view.next().await, Outcome::Exhausted);
  assert_eq!(view.surface().visible_indices(), vec![2]);
  assert_eq!(view.surface().visible()[0].slot, Slot::Single);

  let nav = view.surface().last_navigation().unwrap();
  assert_eq!(nav.label.as_deref(), Some("Page 3 of 3"));
  assert!(nav.can_previous);
  assert!(!nav.can_next);

  assert_eq!(view.request_previous().await, Outcome::Materialized(1));
}

#[tokio::test]
async fn spacers_replace_header_and_footer() {
  let view = DeliveryController::new(RecordingSurface::new(), DeliveryOptions {
    mode: DeliveryMode::SinglePage,
    show_header_footer: false,
    ..DeliveryOptions::default()
  });
  view.load("text", "Book").await;

  let block = &view.surface().visible()[0];
  let frame = block.frame.as_ref().unwrap();
  assert_eq!(frame.header, Margin::Spacer);
  assert_eq!(frame.footer, Margin::Spacer);
  assert_eq!((frame.page_number, frame.total_pages), (1, 1));
}

#[tokio::test]
async fn keys_only_act_in_page_views() {
  let view = controller(DeliveryMode::SinglePage);
  view.load(numbered_lines(30), "Book").await;

  assert_eq!(
    view.on_key(Key::ArrowRight, FocusContext::default()).await,
    Outcome::Materialized(1)
  );
  assert_eq!(
    view.on_key(Key::ArrowLeft, FocusContext::default()).await,
    Outcome::Materialized(0)
  );
  assert_eq!(
    view.on_key(Key::Other, FocusContext::default()).await,
    Outcome::Ignored
  );

  let typing = FocusContext {
    in_text_input: true,
    ..FocusContext::default()
  };
  assert_eq!(view.on_key(Key::ArrowRight, typing).await, Outcome::Ignored);

  let detached = FocusContext {
    attached: false,
    ..FocusContext::default()
  };
  assert_eq!(view.on_key(Key::ArrowRight, detached).await, Outcome::Ignored);
  assert_eq!(view.state().cursor, 0);

  let scroll = controller(DeliveryMode::InfiniteScroll);
  scroll.load(numbered_lines(300), "Book").await;
  assert_eq!(
    scroll.on_key(Key::ArrowRight, FocusContext::default()).await,
    Outcome::Ignored
  );
  assert_eq!(scroll.request_previous().await, Outcome::Ignored);
}

#[tokio::test]
async fn duplicate_trigger_is_dropped() {
  let view = DeliveryController::new(
    RecordingSurface::yielding(),
    DeliveryOptions::default(),
  );
  view.load(numbered_lines(250), "Book").await;

  let (first, second) = tokio::join!(view.request_next(), view.request_next());
  assert_eq!(first, Outcome::Materialized(1));
  assert_eq!(second, Outcome::Busy);
  assert_eq!(view.surface().visible_indices(), vec![0, 1]);

  // Once the first render finished the next trigger goes through.
  assert_eq!(view.request_next().await, Outcome::Materialized(2));
}

#[tokio::test]
async fn reload_discards_late_render() {
  let view = DeliveryController::new(
    RecordingSurface::yielding(),
    DeliveryOptions::default(),
  );
  view.load(numbered_lines(250), "Old").await;
  let old_epoch = view.state().epoch;

  let (late, fresh) = tokio::join!(view.request_next(), async {
    view.load(numbered_lines(120), "New").await
  });
  assert_eq!(late, Outcome::Stale);
  assert_eq!(fresh, Outcome::Materialized(0));

  let state = view.state();
  assert!(state.epoch > old_epoch);
  assert_eq!(state.cursor, 1);
  assert_eq!(state.materialized_count, 1);
  assert_eq!(state.unit_count, 2);
  assert_eq!(view.title(), "New");
}

#[tokio::test]
async fn close_discards_late_render() {
  let view = DeliveryController::new(
    RecordingSurface::yielding(),
    DeliveryOptions::default(),
  );
  view.load(numbered_lines(250), "Book").await;

  let (late, ()) = tokio::join!(view.request_next(), async { view.close() });
  assert_eq!(late, Outcome::Stale);
  assert!(view.document().is_none());
  assert_eq!(view.state().unit_count, 0);
  assert_eq!(view.state().materialized_count, 0);
  assert_eq!(view.request_next().await, Outcome::Ignored);
}

#[tokio::test]
async fn scroll_render_failure_keeps_cursor() {
  let view = controller(DeliveryMode::InfiniteScroll);
  view.surface().fail_index(1);
  view.load(numbered_lines(250), "Book").await;

  let outcome = view.request_next().await;
  assert!(matches!(outcome, Outcome::RenderFailed(_)));
  assert_eq!(view.state().materialized_count, 1);
  assert_eq!(view.state().cursor, 1);
  assert_eq!(view.surface().notices().len(), 1);

  view.surface().heal();
  assert_eq!(view.request_next().await, Outcome::Materialized(1));
}

#[tokio::test]
async fn page_render_failure_still_moves() {
  let view = controller(DeliveryMode::SinglePage);
  view.surface().fail_index(1);
  view.load(numbered_lines(30), "Book").await;

  assert!(matches!(view.next().await, Outcome::RenderFailed(_)));
  assert_eq!(view.state().cursor, 1);
  assert!(view.surface().notices()[0].contains("page 2"));
  assert_eq!(view.next().await, Outcome::Materialized(2));
}

#[tokio::test]
async fn update_options_resplits_without_recomposing() {
  let view = controller(DeliveryMode::InfiniteScroll);
  view.load(numbered_lines(250), "Book").await;
  view.request_next().await;
  let document = view.document().unwrap();

  let outcome = view
    .update_options(DeliveryOptions {
      mode: DeliveryMode::TwoPage,
      lines_per_page: 100,
      ..DeliveryOptions::default()
    })
    .await;
  assert_eq!(outcome, Outcome::Materialized(0));
  assert_eq!(view.document().unwrap(), document);

  let state = view.state();
  assert_eq!(state.mode, DeliveryMode::TwoPage);
  assert_eq!(state.cursor, 0);
  assert_eq!(state.unit_count, 3);
  assert_eq!(view.surface().visible_indices(), vec![0, 1]);
}

#[tokio::test]
async fn error_region_replaces_content() {
  let view = controller(DeliveryMode::InfiniteScroll);
  view.load(numbered_lines(250), "Book").await;
  view.show_error("Error rendering book: boom");

  assert_eq!(
    view.surface().last_error().as_deref(),
    Some("Error rendering book: boom")
  );
  assert!(view.surface().visible().is_empty());
  assert_eq!(view.state().unit_count, 0);
  assert_eq!(view.request_next().await, Outcome::Ignored);
}

#[tokio::test]
async fn empty_document_gets_one_empty_page() {
  let view = controller(DeliveryMode::TwoPage);
  assert_eq!(view.load("", "Empty").await, Outcome::Materialized(0));
  assert_eq!(view.state().unit_count, 1);
  assert_eq!(view.page_label().as_deref(), Some("Page 1 of 1"));

  let scroll = controller(DeliveryMode::InfiniteScroll);
  assert_eq!(scroll.load("", "Empty").await, Outcome::Exhausted);
  assert_eq!(scroll.surface().render_count(), 0);
}
