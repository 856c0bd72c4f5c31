use anyhow::Result;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};

/// Minimal actor trait. `Self: Sized` avoids object-safety issues when using `Context<Self>`.
#[async_trait::async_trait]
pub trait Actor: Send + Sized + 'static {
    type Msg: Send + 'static;

    /// Handle a single message. Return `Err` to stop the actor.
    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()>;
}

/// Runtime context for an actor instance.
pub struct Context<A: Actor> {
    addr: WeakAddr<A>,
    stop: bool,
}

impl<A: Actor> Context<A> {
    /// This actor's address, if anything outside the actor still holds one.
    pub fn addr(&self) -> Option<Addr<A>> {
        self.addr.upgrade()
    }

    /// Request a graceful stop after processing the current message.
    ///
    /// ```
    /// # use anyhow::Result;
    /// # use async_trait::async_trait;
    /// # use inpage_actors::actor::{self, Actor, Context};
    /// # struct StopOnSecond(u8);
    /// # #[async_trait]
    /// # impl Actor for StopOnSecond {
    /// #     type Msg = u8;
    /// #     async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()> {
    /// #         self.0 += msg;
    /// #         if self.0 >= 2 {
    /// #             ctx.stop();
    /// #         }
    /// #         Ok(())
    /// #     }
    /// # }
    /// let rt = tokio::runtime::Runtime::new().unwrap();
    /// rt.block_on(async {
    ///     let actor::ActorHandle { addr, task } = actor::spawn_actor(StopOnSecond(0), 4);
    ///     addr.send(1).await.unwrap();
    ///     addr.send(1).await.unwrap();
    ///     task.await.unwrap().unwrap();
    ///     assert!(addr.send(1).await.is_err());
    /// });
    /// ```
    pub fn stop(&mut self) {
        self.stop = true;
    }
}

/// Address for sending messages to an actor.
///
/// The actor runs until every `Addr` is dropped, it calls
/// [`Context::stop`], or its handler fails.
pub struct Addr<A: Actor>(mpsc::Sender<A::Msg>);

/// Manual Clone to avoid unnecessary bounds on `A`/`A::Msg`.
impl<A: Actor> Clone for Addr<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: Actor> Addr<A> {
    /// Async send; awaits backpressure. Returns the message if the receiver is dropped.
    pub async fn send(&self, msg: A::Msg) -> std::result::Result<(), A::Msg> {
        self.0.send(msg).await.map_err(|e| e.0)
    }

    /// Try to send without waiting. Returns the message if the mailbox is full or closed.
    pub fn try_send(&self, msg: A::Msg) -> std::result::Result<(), A::Msg> {
        self.0.try_send(msg).map_err(|e| e.into_inner())
    }

    /// A non-owning address that does not keep the actor alive.
    ///
    /// ```
    /// # use anyhow::Result;
    /// # use async_trait::async_trait;
    /// # use inpage_actors::actor::{self, Actor, Context};
    /// # struct Sink;
    /// # #[async_trait]
    /// # impl Actor for Sink {
    /// #     type Msg = ();
    /// #     async fn handle(&mut self, _msg: Self::Msg, _ctx: &mut Context<Self>) -> Result<()> {
    /// #         Ok(())
    /// #     }
    /// # }
    /// let rt = tokio::runtime::Runtime::new().unwrap();
    /// rt.block_on(async {
    ///     let actor::ActorHandle { addr, task } = actor::spawn_actor(Sink, 4);
    ///     let weak = addr.downgrade();
    ///     assert!(weak.upgrade().is_some());
    ///     drop(addr);
    ///     task.await.unwrap().unwrap();
    ///     assert!(weak.upgrade().is_none());
    /// });
    /// ```
    pub fn downgrade(&self) -> WeakAddr<A> {
        WeakAddr(self.0.downgrade())
    }

    /// Bounded mailbox capacity.
    pub fn capacity(&self) -> usize {
        self.0.max_capacity()
    }
}

/// Address that does not count towards keeping an actor alive.
pub struct WeakAddr<A: Actor>(mpsc::WeakSender<A::Msg>);

impl<A: Actor> Clone for WeakAddr<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: Actor> WeakAddr<A> {
    pub fn upgrade(&self) -> Option<Addr<A>> {
        self.0.upgrade().map(Addr)
    }
}

/// Handle to a running actor task.
pub struct ActorHandle<A: Actor> {
    pub addr: Addr<A>,
    pub task: JoinHandle<anyhow::Result<()>>,
}

/// Spawn an actor with a bounded mailbox.
///
/// Stop conditions:
/// - `handle` returns `Err`
/// - all `Addr`s are dropped
/// - `ctx.stop()` is called
///
/// ```
/// # use anyhow::Result;
/// # use async_trait::async_trait;
/// # use inpage_actors::actor::{self, Actor, Context};
/// # struct Accumulator(u8);
/// # #[async_trait]
/// # impl Actor for Accumulator {
/// #     type Msg = u8;
/// #     async fn handle(&mut self, msg: Self::Msg, _ctx: &mut Context<Self>) -> Result<()> {
/// #         self.0 += msg;
/// #         Ok(())
/// #     }
/// # }
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let actor::ActorHandle { addr, task } = actor::spawn_actor(Accumulator(0), 8);
///     assert_eq!(addr.capacity(), 8);
///     addr.send(2).await.unwrap();
///     addr.try_send(3).unwrap();
///     drop(addr);
///     task.await.unwrap().unwrap();
/// });
/// ```
pub fn spawn_actor<A: Actor>(actor: A, capacity: usize) -> ActorHandle<A> {
    spawn_actor_with_shutdown(actor, capacity, None)
}

pub fn spawn_actor_with_shutdown<A: Actor>(
    actor: A,
    capacity: usize,
    shutdown: Option<broadcast::Receiver<()>>,
) -> ActorHandle<A> {
    spawn_actor_reserved::<A>(capacity).start_with_shutdown(actor, shutdown)
}

/// Reserved spawn: create mailbox+addr now; start the task later.
///
/// Lets an actor's own address be handed to the state it is built from.
pub struct Reserved<A: Actor> {
    addr: Addr<A>,
    rx: mpsc::Receiver<A::Msg>,
}

impl<A: Actor> Reserved<A> {
    pub fn addr(&self) -> Addr<A> {
        self.addr.clone()
    }

    /// Start the actor task on the reserved mailbox.
    ///
    /// ```
    /// # use anyhow::Result;
    /// # use async_trait::async_trait;
    /// # use inpage_actors::actor::{self, Actor, Context};
    /// # struct Echo;
    /// # #[async_trait]
    /// # impl Actor for Echo {
    /// #     type Msg = &'static str;
    /// #     async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()> {
    /// #         assert_eq!(msg, "ping");
    /// #         ctx.stop();
    /// #         Ok(())
    /// #     }
    /// # }
    /// let rt = tokio::runtime::Runtime::new().unwrap();
    /// rt.block_on(async {
    ///     let reserved = actor::spawn_actor_reserved::<Echo>(4);
    ///     let addr = reserved.addr();
    ///     let handle = reserved.start(Echo);
    ///     addr.send("ping").await.unwrap();
    ///     handle.task.await.unwrap().unwrap();
    /// });
    /// ```
    pub fn start(self, actor: A) -> ActorHandle<A> {
        self.start_with_shutdown(actor, None)
    }

    pub fn start_with_shutdown(
        self,
        actor: A,
        shutdown: Option<broadcast::Receiver<()>>,
    ) -> ActorHandle<A> {
        let Reserved { addr, rx } = self;
        let ctx = Context {
            addr: addr.downgrade(),
            stop: false,
        };
        let task = tokio::spawn(run(actor, ctx, rx, shutdown));
        ActorHandle { addr, task }
    }
}

/// Factory for reservation.
pub fn spawn_actor_reserved<A: Actor>(capacity: usize) -> Reserved<A> {
    let (tx, rx) = mpsc::channel::<A::Msg>(capacity);
    Reserved { addr: Addr(tx), rx }
}

async fn run<A: Actor>(
    mut actor: A,
    mut ctx: Context<A>,
    mut rx: mpsc::Receiver<A::Msg>,
    shutdown: Option<broadcast::Receiver<()>>,
) -> Result<()> {
    let Some(mut shutdown_rx) = shutdown else {
        while let Some(msg) = rx.recv().await {
            if step(&mut actor, msg, &mut ctx).await? {
                break;
            }
        }
        return Ok(());
    };

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_msg = rx.recv() => match maybe_msg {
                Some(msg) => {
                    if step(&mut actor, msg, &mut ctx).await? {
                        break;
                    }
                }
                None => break,
            },
        }
    }
    Ok(())
}

/// Handle one message; `Ok(true)` means the actor asked to stop.
async fn step<A: Actor>(actor: &mut A, msg: A::Msg, ctx: &mut Context<A>) -> Result<bool> {
    if let Err(e) = actor.handle(msg, ctx).await {
        tracing::error!(target: "inpage.actors", error = ?e, "actor returned error; stopping");
        return Err(e);
    }
    Ok(ctx.stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fails;

    #[async_trait]
    impl Actor for Fails {
        type Msg = ();
        async fn handle(&mut self, _msg: (), _ctx: &mut Context<Self>) -> Result<()> {
            anyhow::bail!("boom")
        }
    }

    struct SelfPing(Vec<u8>, tokio::sync::mpsc::UnboundedSender<Vec<u8>>);

    #[async_trait]
    impl Actor for SelfPing {
        type Msg = u8;
        async fn handle(&mut self, msg: u8, ctx: &mut Context<Self>) -> Result<()> {
            self.0.push(msg);
            if msg < 3 {
                if let Some(addr) = ctx.addr() {
                    let _ = addr.try_send(msg + 1);
                }
            } else {
                let _ = self.1.send(self.0.clone());
                ctx.stop();
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn handler_error_stops_with_err() {
        let ActorHandle { addr, task } = spawn_actor(Fails, 1);
        addr.send(()).await.unwrap();
        assert!(task.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn context_addr_reaches_self_while_held() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let ActorHandle { addr, task } = spawn_actor(SelfPing(Vec::new(), tx), 4);
        addr.send(0).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), vec![0, 1, 2, 3]);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn shutdown_signal_stops_idle_actor() {
        let (tx, rx) = broadcast::channel(1);
        let ActorHandle { addr, task } = spawn_actor_with_shutdown(Fails, 1, Some(rx));
        tx.send(()).unwrap();
        task.await.unwrap().unwrap();
        drop(addr);
    }
}
