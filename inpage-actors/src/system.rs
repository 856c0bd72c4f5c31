//! Task tracking and cooperative shutdown for the actors of one host.
//!
//! Every actor started through the system listens on a shared broadcast
//! channel; [`ActorSystem::graceful_shutdown`] signals it and then awaits all
//! tracked tasks, surfacing the first actor failure.
use crate::actor::{spawn_actor_reserved, Actor, Addr, Reserved};
use anyhow::Result;
use tokio::{sync::broadcast, task::JoinSet};

pub struct ActorSystem {
    joinset: JoinSet<Result<()>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Default for ActorSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorSystem {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(8);
        Self {
            joinset: JoinSet::new(),
            shutdown_tx,
        }
    }

    /// Spawn and track an actor.
    pub fn spawn<A: Actor>(&mut self, actor: A, capacity: usize) -> Addr<A> {
        self.start(spawn_actor_reserved::<A>(capacity), actor)
    }

    /// Start and track a previously reserved actor.
    pub fn start<A: Actor>(&mut self, reserved: Reserved<A>, actor: A) -> Addr<A> {
        let handle = reserved.start_with_shutdown(actor, Some(self.shutdown_tx.subscribe()));
        self.joinset.spawn(async move { handle.task.await? });
        handle.addr
    }

    pub fn tracked(&self) -> usize {
        self.joinset.len()
    }

    /// Signal every actor to stop and wait for all of them.
    pub async fn graceful_shutdown(mut self) -> Result<()> {
        let _ = self.shutdown_tx.send(());
        while let Some(res) = self.joinset.join_next().await {
            res??;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Context;
    use async_trait::async_trait;

    struct Idle;

    #[async_trait]
    impl Actor for Idle {
        type Msg = ();
        async fn handle(&mut self, _msg: (), _ctx: &mut Context<Self>) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn shutdown_waits_for_actors_still_addressed() {
        let mut system = ActorSystem::new();
        let a = system.spawn(Idle, 1);
        let b = system.spawn(Idle, 1);
        assert_eq!(system.tracked(), 2);
        system.graceful_shutdown().await.unwrap();
        assert!(a.send(()).await.is_err());
        assert!(b.send(()).await.is_err());
    }
}
