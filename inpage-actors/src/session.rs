//! Actor hosting one [`InPageSearch`] and the async handle used to drive it.
//!
//! The session's [`SessionMailbox`] is the actor's own mailbox: host
//! callbacks and deferred refocus tasks post [`SessionInput`]s that are
//! processed in order with client requests.
use crate::actor::{spawn_actor_reserved, Actor, Addr, Context, WeakAddr};
use crate::system::ActorSystem;
use anyhow::Result;
use inpage_common::{InPageError, Result as SearchResult};
use inpage_search::events::{EventListener, SubscriptionId};
use inpage_search::host::{Document, SearchTarget};
use inpage_search::{
    search_in_page, EventKind, InPageSearch, InPageSearchOptions, SearchEvent, SessionInput,
    SessionMailbox, SessionSnapshot,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, warn};

pub const SESSION_MAILBOX: usize = 256;
const EVENT_BUFFER: usize = 64;

pub enum SessionMsg {
    Open {
        reply: oneshot::Sender<SearchResult<()>>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
    StartToFind {
        query: String,
        reply: oneshot::Sender<()>,
    },
    FindNext {
        forward: bool,
        reply: oneshot::Sender<SearchResult<()>>,
    },
    StopFind {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Subscribe {
        kind: Option<EventKind>,
        listener: EventListener,
        reply: oneshot::Sender<SubscriptionId>,
    },
    Unsubscribe {
        id: SubscriptionId,
        reply: oneshot::Sender<bool>,
    },
    /// Detach the overlay and stop the actor.
    Finalize {
        reply: oneshot::Sender<SearchResult<()>>,
    },
    Input(SessionInput),
}

pub struct SessionActor {
    search: InPageSearch,
}

impl SessionActor {
    /// Wrap a session, republishing its events on `events`.
    pub fn new(mut search: InPageSearch, events: broadcast::Sender<SearchEvent>) -> Self {
        search.events_mut().on_any(move |e| {
            // no receivers is fine
            let _ = events.send(e.clone());
        });
        Self { search }
    }
}

#[async_trait::async_trait]
impl Actor for SessionActor {
    type Msg = SessionMsg;

    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()> {
        match msg {
            SessionMsg::Open { reply } => {
                let _ = reply.send(self.search.open_search_window());
            }
            SessionMsg::Close { reply } => {
                self.search.close_search_window();
                let _ = reply.send(());
            }
            SessionMsg::StartToFind { query, reply } => {
                self.search.start_to_find(&query);
                let _ = reply.send(());
            }
            SessionMsg::FindNext { forward, reply } => {
                let _ = reply.send(self.search.find_next(forward));
            }
            SessionMsg::StopFind { reply } => {
                self.search.stop_find();
                let _ = reply.send(());
            }
            SessionMsg::Snapshot { reply } => {
                let _ = reply.send(self.search.snapshot());
            }
            SessionMsg::Subscribe {
                kind,
                listener,
                reply,
            } => {
                let id = self.search.events_mut().register(kind, listener);
                let _ = reply.send(id);
            }
            SessionMsg::Unsubscribe { id, reply } => {
                let _ = reply.send(self.search.events_mut().off(id));
            }
            SessionMsg::Finalize { reply } => {
                let res = self.search.finalize();
                if res.is_ok() {
                    ctx.stop();
                }
                let _ = reply.send(res);
            }
            SessionMsg::Input(input) => {
                if let Err(e) = self.search.handle_input(input) {
                    warn!(target: "inpage.actors", error = %e, "session input failed");
                }
            }
        }
        Ok(())
    }
}

/// [`SessionMailbox`] feeding a [`SessionActor`]'s own mailbox.
///
/// Holds a weak address so the session does not keep its own actor alive.
/// `post` never blocks the host callback: when the mailbox is full the input
/// is dropped with a warning, so a lost final result leaves the counter
/// stale and no `found` event is emitted for it.
pub struct ActorMailbox {
    addr: WeakAddr<SessionActor>,
}

impl ActorMailbox {
    pub fn new(addr: WeakAddr<SessionActor>) -> Self {
        Self { addr }
    }
}

impl SessionMailbox for ActorMailbox {
    fn post(&self, input: SessionInput) {
        let Some(addr) = self.addr.upgrade() else {
            debug!(target: "inpage.actors", "session gone; input dropped");
            return;
        };
        if addr.try_send(SessionMsg::Input(input)).is_err() {
            warn!(target: "inpage.actors", "session mailbox full or closed; input dropped");
        }
    }

    fn post_after(&self, input: SessionInput, delay: Duration) {
        let addr = self.addr.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(addr) = addr.upgrade() {
                let _ = addr.send(SessionMsg::Input(input)).await;
            }
        });
    }
}

/// Async client of a running search session.
#[derive(Clone)]
pub struct SearchHandle {
    addr: Addr<SessionActor>,
    events: broadcast::Sender<SearchEvent>,
}

impl SearchHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> SessionMsg) -> SearchResult<T> {
        let (tx, rx) = oneshot::channel();
        self.addr
            .send(make(tx))
            .await
            .map_err(|_| InPageError::ChannelClosed("search session"))?;
        rx.await
            .map_err(|_| InPageError::ChannelClosed("search session reply"))
    }

    pub async fn open(&self) -> SearchResult<()> {
        self.request(|reply| SessionMsg::Open { reply }).await?
    }

    pub async fn close(&self) -> SearchResult<()> {
        self.request(|reply| SessionMsg::Close { reply }).await
    }

    pub async fn start_to_find(&self, query: impl Into<String>) -> SearchResult<()> {
        let query = query.into();
        self.request(|reply| SessionMsg::StartToFind { query, reply })
            .await
    }

    pub async fn find_next(&self, forward: bool) -> SearchResult<()> {
        self.request(|reply| SessionMsg::FindNext { forward, reply })
            .await?
    }

    pub async fn stop_find(&self) -> SearchResult<()> {
        self.request(|reply| SessionMsg::StopFind { reply }).await
    }

    pub async fn snapshot(&self) -> SearchResult<SessionSnapshot> {
        self.request(|reply| SessionMsg::Snapshot { reply }).await
    }

    pub async fn is_searching(&self) -> SearchResult<bool> {
        Ok(self.snapshot().await?.is_searching)
    }

    /// Register a listener that runs on the session task.
    pub async fn on<F>(&self, kind: EventKind, listener: F) -> SearchResult<SubscriptionId>
    where
        F: Fn(&SearchEvent) + Send + Sync + 'static,
    {
        let listener: EventListener = Box::new(listener);
        self.request(|reply| SessionMsg::Subscribe {
            kind: Some(kind),
            listener,
            reply,
        })
        .await
    }

    pub async fn off(&self, id: SubscriptionId) -> SearchResult<bool> {
        self.request(|reply| SessionMsg::Unsubscribe { id, reply })
            .await
    }

    /// Stream of every public event emitted after this call.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SearchEvent> {
        self.events.subscribe()
    }

    /// Feed an input as if a host callback had posted it.
    pub async fn post(&self, input: SessionInput) -> SearchResult<()> {
        self.addr
            .send(SessionMsg::Input(input))
            .await
            .map_err(|_| InPageError::ChannelClosed("search session"))
    }

    /// Detach the overlay and stop the session actor.
    pub async fn finalize(&self) -> SearchResult<()> {
        self.request(|reply| SessionMsg::Finalize { reply }).await?
    }
}

/// Build a session over `target` and run it as a tracked actor.
pub fn spawn_search_session(
    target: Arc<dyn SearchTarget>,
    options: InPageSearchOptions,
    document: &dyn Document,
    system: &mut ActorSystem,
) -> SearchResult<SearchHandle> {
    let reserved = spawn_actor_reserved::<SessionActor>(SESSION_MAILBOX);
    let mailbox = Arc::new(ActorMailbox::new(reserved.addr().downgrade()));
    let search = search_in_page(target, options, document, mailbox)?;

    let (events, _) = broadcast::channel(EVENT_BUFFER);
    let actor = SessionActor::new(search, events.clone());
    let addr = system.start(reserved, actor);
    Ok(SearchHandle { addr, events })
}
