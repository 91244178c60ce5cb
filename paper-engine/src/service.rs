use crate::engine::Engine;
use crate::error::{OrderNotCancelable, OrderRejected};
use crate::models::{
    Command, CommandReply, EngineEvent, InstrumentId, Notification, Order, OrderKind, Side,
    StateSnapshot,
};
use crate::store::StateStore;
use log::{error, info};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("trading service is no longer running")]
pub struct ServiceClosed;

enum Request {
    Event {
        event: EngineEvent,
        reply: Option<oneshot::Sender<CommandReply>>,
    },
    Snapshot {
        reply: oneshot::Sender<StateSnapshot>,
    },
}

/// Owns the engine and serializes every mutation through one queue.
/// Ticks come from a timer task that enqueues events like any other
/// caller, so ticks and commands apply strictly in arrival order.
pub struct TradingService {
    engine: Engine,
    store: StateStore,
    requests: mpsc::Receiver<Request>,
    notifications: broadcast::Sender<Notification>,
}

/// Cloneable front door for the presentation layer.
#[derive(Clone)]
pub struct TradingHandle {
    requests: mpsc::Sender<Request>,
    notifications: broadcast::Sender<Notification>,
}

impl TradingService {
    /// Spawns the service task; with `tick_interval` set, also spawns
    /// the timer task feeding tick events into the same queue. Pass
    /// None to drive ticks manually (tests, replay tooling).
    pub fn spawn(
        engine: Engine,
        store: StateStore,
        tick_interval: Option<Duration>,
    ) -> TradingHandle {
        let (requests_tx, requests_rx) = mpsc::channel(64);
        let (notifications_tx, _) = broadcast::channel(256);

        let service = Self {
            engine,
            store,
            requests: requests_rx,
            notifications: notifications_tx.clone(),
        };
        tokio::spawn(service.run());

        if let Some(interval) = tick_interval {
            let tick_tx = requests_tx.clone();
            tokio::spawn(async move {
                let mut timer = tokio::time::interval(interval);
                timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
                // interval fires immediately; the first real tick
                // should land one full period after startup.
                timer.tick().await;
                loop {
                    timer.tick().await;
                    let event = Request::Event {
                        event: EngineEvent::Tick,
                        reply: None,
                    };
                    if tick_tx.send(event).await.is_err() {
                        break;
                    }
                }
            });
        }

        TradingHandle {
            requests: requests_tx,
            notifications: notifications_tx,
        }
    }

    async fn run(mut self) {
        info!("trading service started");
        while let Some(request) = self.requests.recv().await {
            match request {
                Request::Snapshot { reply } => {
                    let _ = reply.send(self.engine.snapshot());
                }
                Request::Event { event, reply } => {
                    let outcome = self.engine.process(event);
                    self.commit();
                    for notification in self.engine.take_notifications() {
                        let _ = self.notifications.send(notification);
                    }
                    if let (Some(reply), Some(outcome)) = (reply, outcome) {
                        let _ = reply.send(outcome);
                    }
                }
            }
        }
        info!("trading service stopped");
    }

    /// End-of-event durable write. A failed commit is logged and the
    /// in-memory state stays authoritative; the next event retries.
    fn commit(&mut self) {
        if let Err(e) = self.store.save(&self.engine.snapshot()) {
            error!("state commit failed: {}", e);
        }
    }
}

impl TradingHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Sends one command and waits for its typed reply.
    pub async fn command(&self, command: Command) -> Result<CommandReply, ServiceClosed> {
        let (tx, rx) = oneshot::channel();
        let request = Request::Event {
            event: EngineEvent::Command(command),
            reply: Some(tx),
        };
        self.requests.send(request).await.map_err(|_| ServiceClosed)?;
        rx.await.map_err(|_| ServiceClosed)
    }

    /// Enqueues a price tick. Normal runs rely on the timer task; this
    /// is the manual-drive path.
    pub async fn tick(&self) -> Result<(), ServiceClosed> {
        self.requests
            .send(Request::Event {
                event: EngineEvent::Tick,
                reply: None,
            })
            .await
            .map_err(|_| ServiceClosed)
    }

    pub async fn snapshot(&self) -> Result<StateSnapshot, ServiceClosed> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(Request::Snapshot { reply: tx })
            .await
            .map_err(|_| ServiceClosed)?;
        rx.await.map_err(|_| ServiceClosed)
    }

    pub async fn place_order(
        &self,
        side: Side,
        kind: OrderKind,
        instrument_id: InstrumentId,
        quantity: u64,
    ) -> Result<Result<Order, OrderRejected>, ServiceClosed> {
        let reply = self
            .command(Command::PlaceOrder {
                side,
                kind,
                instrument_id,
                quantity,
            })
            .await?;
        match reply {
            CommandReply::OrderPlaced(result) => Ok(result),
            _ => unreachable!("PlaceOrder always yields OrderPlaced"),
        }
    }

    pub async fn cancel_order(
        &self,
        order_id: Uuid,
    ) -> Result<Result<Order, OrderNotCancelable>, ServiceClosed> {
        let reply = self.command(Command::CancelOrder { order_id }).await?;
        match reply {
            CommandReply::OrderCanceled(result) => Ok(result),
            _ => unreachable!("CancelOrder always yields OrderCanceled"),
        }
    }
}
