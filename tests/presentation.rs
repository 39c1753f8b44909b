//! 结果呈现集成测试
//!
//! 控制器在内存宿主上插入、替换、移除视图，以及浮动按钮位置的持久化

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mdtex_translator::parsers::html::HtmlSelection;
use mdtex_translator::presentation::{
    ControlEvent, ExtensionController, JsonFileStore, MemoryHost, Position, PresentationController,
    RunOutcome, Size, ToolbarAction, ViewEffect, ViewHost, ViewState,
};
use mdtex_translator::translation::TranslationError;

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{translator, translator_with_timeout, Reply, ScriptedBus};

fn controller(bus: Arc<ScriptedBus>) -> PresentationController<Arc<ScriptedBus>, MemoryHost> {
    PresentationController::new(translator(bus), MemoryHost::new())
}

#[tokio::test]
async fn test_result_view_replaces_loading_view() {
    let bus = ScriptedBus::replacing(&[("Hello", "你好")]);
    let controller = controller(bus);

    let outcome = controller.run(Some(HtmlSelection::new("<p>Hello $x_1$</p>"))).await;
    let RunOutcome::Rendered(id) = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };

    let view = controller.host().view(id).unwrap();
    match view.state() {
        ViewState::Result { html, raw } => {
            assert_eq!(raw, r"你好 $x\_{1}$");
            assert!(html.contains(r#"<span class="math inline">\(x_{1}\)</span>"#), "got: {html}");
        }
        other => panic!("unexpected state: {other:?}"),
    }
    assert!(controller.host().tooltips().is_empty());
}

#[tokio::test]
async fn test_missing_selection_shows_tooltip_only() {
    let bus = ScriptedBus::echo();
    let controller = controller(bus.clone());

    let outcome = controller.run::<HtmlSelection>(None).await;
    assert_eq!(outcome, RunOutcome::Tooltip(TranslationError::NoSelection));
    assert!(controller.host().view_ids().is_empty());
    assert_eq!(controller.host().tooltips().len(), 1);
    assert!(bus.requests().is_empty());
}

#[tokio::test]
async fn test_blank_selection_shows_tooltip_only() {
    let bus = ScriptedBus::echo();
    let controller = controller(bus.clone());

    let outcome = controller.run(Some(HtmlSelection::new("<p>   </p>"))).await;
    assert_eq!(outcome, RunOutcome::Tooltip(TranslationError::EmptyInput));
    assert!(controller.host().view_ids().is_empty());
    assert!(bus.requests().is_empty());
}

#[tokio::test]
async fn test_detached_range_cannot_host_a_view() {
    let bus = ScriptedBus::echo();
    let controller = controller(bus.clone());

    let selection = HtmlSelection::new("<p>Hello</p>");
    selection.detach();

    let outcome = controller.run(Some(selection)).await;
    assert!(matches!(outcome, RunOutcome::Tooltip(TranslationError::Insertion(_))));
    assert!(controller.host().view_ids().is_empty());
    assert!(bus.requests().is_empty());
}

#[tokio::test]
async fn test_failure_then_retry() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let bus = ScriptedBus::new(move |request| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Reply::Failure("Service unavailable".to_string())
        } else {
            Reply::Text(format!("译文：{}", request.first_text().unwrap_or_default()))
        }
    });
    let controller = controller(bus.clone());

    let outcome = controller.run(Some(HtmlSelection::new("<p>Good morning</p>"))).await;
    let RunOutcome::Failed(id) = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };

    match controller.host().view(id).unwrap().state() {
        ViewState::Error { message, retry_text, retryable } => {
            assert_eq!(message, "翻译服务出错，请稍后重试");
            assert_eq!(retry_text, "Good morning");
            assert!(retryable);
        }
        other => panic!("unexpected state: {other:?}"),
    }

    assert_eq!(controller.retry(id).await, RunOutcome::Rendered(id));
    assert_eq!(bus.seen_texts(), vec!["Good morning", "Good morning"]);
    match controller.host().view(id).unwrap().state() {
        ViewState::Result { raw, .. } => assert_eq!(raw, "译文：Good morning"),
        other => panic!("unexpected state: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_timeout_becomes_error_view() {
    let bus = ScriptedBus::new(|_| Reply::Late(Duration::from_secs(60), "太迟".to_string()));
    let controller = PresentationController::new(
        translator_with_timeout(bus, Duration::from_secs(5)),
        MemoryHost::new(),
    );

    let outcome = controller.run(Some(HtmlSelection::new("<p>slow</p>"))).await;
    let RunOutcome::Failed(id) = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };

    let html = controller.host().view(id).unwrap().to_html();
    assert!(html.contains("超时"), "got: {html}");
    assert!(html.contains(r#"data-action="retry""#));
}

#[tokio::test]
async fn test_result_is_dropped_when_view_was_removed() {
    let host = MemoryHost::new();
    let page = host.clone();
    let bus = ScriptedBus::new(move |request| {
        // 请求在途时页面移除了视图
        page.clear();
        Reply::Text(request.first_text().unwrap_or_default().to_string())
    });
    let controller = PresentationController::new(translator(bus), host);

    let outcome = controller.run(Some(HtmlSelection::new("<p>Hello</p>"))).await;
    assert_eq!(outcome, RunOutcome::Dropped);
    assert!(controller.host().view_ids().is_empty());
    assert!(controller.host().tooltips().is_empty());
}

#[tokio::test]
async fn test_toolbar_actions() {
    let bus = ScriptedBus::replacing(&[("Hello", "你好")]);
    let controller = controller(bus);

    let RunOutcome::Rendered(id) = controller.run(Some(HtmlSelection::new("<p>Hello</p>"))).await else {
        panic!("expected a rendered view");
    };

    assert_eq!(
        controller.press(id, ToolbarAction::Copy),
        Some(ViewEffect::Copy("你好".to_string()))
    );

    assert_eq!(controller.press(id, ToolbarAction::ToggleRaw), Some(ViewEffect::Redraw));
    let view = controller.host().view(id).unwrap();
    assert!(view.show_raw());
    assert!(view.to_html().contains(r#"<pre class="mdtex-raw">你好</pre>"#));

    assert_eq!(controller.press(id, ToolbarAction::Retry), Some(ViewEffect::Ignored));
    assert_eq!(controller.press(id, ToolbarAction::Close), Some(ViewEffect::Remove));
    assert!(controller.host().view(id).is_none());
    assert_eq!(controller.press(id, ToolbarAction::Copy), None);
}

#[test]
fn test_floating_position_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let button = Size::new(40.0, 40.0);
    let viewport = Size::new(1000.0, 800.0);

    let mut controller = ExtensionController::new(JsonFileStore::new(&path), button, viewport);
    assert_eq!(controller.init().position(), Position::new(940.0, 380.0));

    controller.pointer_down(950.0, 390.0);
    assert_eq!(controller.pointer_move(850.0, 290.0), Some(Position::new(840.0, 280.0)));
    assert_eq!(
        controller.pointer_up(850.0, 290.0).unwrap(),
        ControlEvent::Moved(Position::new(840.0, 280.0))
    );

    controller.pointer_down(845.0, 285.0);
    assert_eq!(controller.pointer_up(846.0, 286.0).unwrap(), ControlEvent::Translate);
    controller.teardown();

    let mut reopened = ExtensionController::new(JsonFileStore::new(&path), button, viewport);
    assert_eq!(reopened.init().position(), Position::new(840.0, 280.0));

    // 视口缩小后保存的位置被约束回可见区域
    let mut small = ExtensionController::new(JsonFileStore::new(&path), button, Size::new(600.0, 200.0));
    assert_eq!(small.init().position(), Position::new(580.0, 160.0));
}
