use inpage_actors::{spawn_memory_agent, spawn_search_session, ActorSystem, AgentHandle, SearchHandle};
use inpage_common::InPageError;
use inpage_config::SearchSettings;
use inpage_search::agent::{KeyCode, KeyPress};
use inpage_search::host::OverlayElement;
use inpage_search::memory::{MemoryContents, MemoryDocument, MemoryOverlay, MemoryWebview};
use inpage_search::{EventKind, InPageSearchOptions, SearchEvent, UiEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const PAGE: &str = "foo bar baz foo bar piyo poyo";

struct Fixture {
    system: ActorSystem,
    search: SearchHandle,
    overlay: Arc<MemoryOverlay>,
    document: MemoryDocument,
}

fn content_session(text: &str) -> Fixture {
    let document = MemoryDocument::new();
    let mut system = ActorSystem::new();
    let search = spawn_search_session(
        Arc::new(MemoryContents::new(text)),
        InPageSearchOptions::new(SearchSettings::default()),
        &document,
        &mut system,
    )
    .unwrap();
    let overlay = document.last_overlay().unwrap();
    Fixture {
        system,
        search,
        overlay,
        document,
    }
}

/// Two round trips: the first lets queued inputs run, the second the
/// results those inputs produced.
async fn settle(search: &SearchHandle) {
    search.snapshot().await.unwrap();
    search.snapshot().await.unwrap();
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn wrap_around_refocus_waits_for_the_delay() {
    let fx = content_session(PAGE);
    fx.search.open().await.unwrap();
    fx.search.start_to_find("foo").await.unwrap();
    settle(&fx.search).await;
    fx.search.find_next(true).await.unwrap();
    settle(&fx.search).await;
    assert_eq!(fx.search.snapshot().await.unwrap().active_match, 2);

    let before = fx.overlay.focus_count();
    fx.search.find_next(true).await.unwrap();
    settle(&fx.search).await;
    assert_eq!(fx.overlay.focus_count(), before);

    tokio::time::advance(Duration::from_millis(99)).await;
    tokio::task::yield_now().await;
    settle(&fx.search).await;
    assert_eq!(fx.overlay.focus_count(), before);

    tokio::time::advance(Duration::from_millis(1)).await;
    tokio::task::yield_now().await;
    settle(&fx.search).await;
    assert_eq!(fx.overlay.focus_count(), before + 1);

    fx.system.graceful_shutdown().await.unwrap();
}

#[tokio::test]
async fn events_are_broadcast_and_listeners_can_detach() {
    let fx = content_session(PAGE);
    let mut events = fx.search.subscribe_events();
    let found = Arc::new(AtomicUsize::new(0));
    let counter = found.clone();
    let id = fx
        .search
        .on(EventKind::Found, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

    fx.search.open().await.unwrap();
    fx.search.start_to_find("piyo").await.unwrap();
    settle(&fx.search).await;

    assert_eq!(events.recv().await.unwrap(), SearchEvent::Open);
    let mut seen = Vec::new();
    while let Ok(e) = events.try_recv() {
        seen.push(e);
    }
    assert!(seen.contains(&SearchEvent::Start { query: "piyo".into() }));
    assert!(seen.contains(&SearchEvent::Found {
        query: "piyo".into(),
        nth: 1,
        all: 1
    }));
    assert_eq!(found.load(Ordering::SeqCst), 1);

    assert!(fx.search.off(id).await.unwrap());
    fx.search.find_next(true).await.unwrap();
    settle(&fx.search).await;
    assert_eq!(found.load(Ordering::SeqCst), 1);

    fx.system.graceful_shutdown().await.unwrap();
}

#[tokio::test]
async fn find_next_while_idle_is_reported_to_the_caller() {
    let fx = content_session(PAGE);
    let err = fx.search.find_next(false).await.unwrap_err();
    assert!(matches!(err, InPageError::InvalidState(_)));
    assert!(!fx.search.is_searching().await.unwrap());
    fx.system.graceful_shutdown().await.unwrap();
}

#[tokio::test]
async fn finalize_detaches_and_stops_the_session() {
    let fx = content_session(PAGE);
    fx.search.open().await.unwrap();
    assert_eq!(fx.document.body_children(), 1);

    fx.search.finalize().await.unwrap();
    assert!(!fx.overlay.is_attached());
    assert_eq!(fx.document.body_children(), 0);
    assert!(matches!(
        fx.search.snapshot().await,
        Err(InPageError::ChannelClosed(_))
    ));
    fx.system.graceful_shutdown().await.unwrap();
}

#[tokio::test]
async fn finalize_without_open_still_stops_the_session() {
    let fx = content_session(PAGE);
    assert!(!fx.search.snapshot().await.unwrap().initialized);

    fx.search.finalize().await.unwrap();
    assert_eq!(fx.document.body_children(), 0);
    assert!(matches!(
        fx.search.snapshot().await,
        Err(InPageError::ChannelClosed(_))
    ));
    fx.system.graceful_shutdown().await.unwrap();
}

async fn sync(search: &SearchHandle, agent: &AgentHandle) {
    agent.display().await.unwrap();
    settle(search).await;
    agent.display().await.unwrap();
}

#[tokio::test]
async fn agent_drives_a_webview_session() {
    let document = MemoryDocument::new();
    let mut system = ActorSystem::new();
    let search = spawn_search_session(
        Arc::new(MemoryWebview::new(PAGE)),
        InPageSearchOptions::default(),
        &document,
        &mut system,
    )
    .unwrap();
    let overlay = document.last_overlay().unwrap();
    let agent = spawn_memory_agent(&overlay, &mut system);

    search.open().await.unwrap();
    sync(&search, &agent).await;
    assert!(agent.display().await.unwrap().focused);

    agent.ui(UiEvent::Input("bar".into())).await.unwrap();
    agent
        .ui(UiEvent::KeyDown(KeyPress::plain(KeyCode::Enter)))
        .await
        .unwrap();
    sync(&search, &agent).await;
    assert_eq!(agent.display().await.unwrap().counter, "1/2");

    agent.ui(UiEvent::BackClick).await.unwrap();
    sync(&search, &agent).await;
    assert_eq!(agent.display().await.unwrap().counter, "2/2");

    agent
        .ui(UiEvent::KeyDown(KeyPress::ctrl(KeyCode::Char('g'))))
        .await
        .unwrap();
    sync(&search, &agent).await;
    let shown = agent.display().await.unwrap();
    assert_eq!(shown.counter, "0/0");
    assert_eq!(shown.input, "");
    assert!(!search.snapshot().await.unwrap().is_open);

    system.graceful_shutdown().await.unwrap();
}
