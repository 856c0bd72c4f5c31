//! Actor running the overlay UI agent.
use crate::actor::{Actor, Addr, Context};
use crate::system::ActorSystem;
use anyhow::Result;
use inpage_common::protocol::{AgentMessage, ControllerMessage};
use inpage_common::{InPageError, Result as SearchResult};
use inpage_search::agent::{AgentDisplay, OverlayAgent, UiEvent};
use inpage_search::memory::MemoryOverlay;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::warn;

pub const AGENT_MAILBOX: usize = 64;

/// Outbound path from the agent to the session's host.
pub trait AgentLink: Send + Sync + 'static {
    fn send_to_host(&self, msg: AgentMessage);
}

impl<F> AgentLink for F
where
    F: Fn(AgentMessage) + Send + Sync + 'static,
{
    fn send_to_host(&self, msg: AgentMessage) {
        self(msg)
    }
}

pub enum AgentMsg {
    Ui(UiEvent),
    Host(ControllerMessage),
    Display {
        reply: oneshot::Sender<AgentDisplay>,
    },
}

pub struct OverlayAgentActor {
    agent: OverlayAgent,
    link: Box<dyn AgentLink>,
}

impl OverlayAgentActor {
    pub fn new(link: impl AgentLink) -> Self {
        Self {
            agent: OverlayAgent::new(),
            link: Box::new(link),
        }
    }
}

#[async_trait::async_trait]
impl Actor for OverlayAgentActor {
    type Msg = AgentMsg;

    async fn handle(&mut self, msg: Self::Msg, _ctx: &mut Context<Self>) -> Result<()> {
        match msg {
            AgentMsg::Ui(event) => {
                if let Some(out) = self.agent.handle_ui(event) {
                    self.link.send_to_host(out);
                }
            }
            AgentMsg::Host(msg) => self.agent.handle_host(msg),
            AgentMsg::Display { reply } => {
                let _ = reply.send(self.agent.display());
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct AgentHandle {
    addr: Addr<OverlayAgentActor>,
}

impl AgentHandle {
    pub async fn ui(&self, event: UiEvent) -> SearchResult<()> {
        self.addr
            .send(AgentMsg::Ui(event))
            .await
            .map_err(|_| InPageError::ChannelClosed("overlay agent"))
    }

    /// Deliver a controller message without waiting; for host callbacks.
    pub fn deliver(&self, msg: ControllerMessage) -> SearchResult<()> {
        self.addr
            .try_send(AgentMsg::Host(msg))
            .map_err(|_| InPageError::ChannelClosed("overlay agent"))
    }

    pub async fn display(&self) -> SearchResult<AgentDisplay> {
        let (reply, rx) = oneshot::channel();
        self.addr
            .send(AgentMsg::Display { reply })
            .await
            .map_err(|_| InPageError::ChannelClosed("overlay agent"))?;
        rx.await
            .map_err(|_| InPageError::ChannelClosed("overlay agent reply"))
    }
}

pub fn spawn_overlay_agent(link: impl AgentLink, system: &mut ActorSystem) -> AgentHandle {
    AgentHandle {
        addr: system.spawn(OverlayAgentActor::new(link), AGENT_MAILBOX),
    }
}

/// Run an agent inside an in-memory overlay: its messages reach the session
/// through the overlay's listeners, and controller messages sent to the
/// overlay come back to the agent.
pub fn spawn_memory_agent(overlay: &Arc<MemoryOverlay>, system: &mut ActorSystem) -> AgentHandle {
    let to_host = Arc::downgrade(overlay);
    let handle = spawn_overlay_agent(
        move |msg: AgentMessage| {
            if let Some(overlay) = to_host.upgrade() {
                overlay.post_from_agent(msg);
            }
        },
        system,
    );
    let to_agent = handle.clone();
    overlay.connect(move |msg| {
        if let Err(e) = to_agent.deliver(msg) {
            warn!(target: "inpage.actors", error = %e, "controller message dropped");
        }
    });
    handle
}
