//! Tick scheduling for the observation loop.
//!
//! The loop never sleeps on its own; it asks its [`Ticker`] when the next
//! observation is due. Production uses [`IntervalTicker`] on the configured
//! cadence; tests drive a [`ManualTicker`] tick by tick so every observed
//! edge lands on a chosen instant.

use std::time::Duration;

use futures::future::BoxFuture;
use tokio::{
    sync::{mpsc, watch},
    time::{Interval, MissedTickBehavior, interval},
};

/// Cadence source for a polling loop.
pub trait Ticker: Send {
    /// Wait until the next tick is due.
    ///
    /// Returns `false` once the loop should tear down, either because
    /// shutdown was signalled or because the driving handle is gone.
    fn wait(&mut self) -> BoxFuture<'_, bool>;
}

/// Wall-clock ticker firing on a fixed interval until shut down.
pub struct IntervalTicker {
    interval: Interval,
    shutdown: watch::Receiver<bool>,
}

/// Handle signalling an [`IntervalTicker`] to stop.
pub struct TickerShutdown {
    tx: watch::Sender<bool>,
}

impl IntervalTicker {
    /// Build a ticker firing every `period`, plus its shutdown handle.
    pub fn new(period: Duration) -> (Self, TickerShutdown) {
        let (tx, rx) = watch::channel(false);
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        (
            Self {
                interval,
                shutdown: rx,
            },
            TickerShutdown { tx },
        )
    }
}

impl TickerShutdown {
    /// Stop the associated ticker after its current wait.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

impl Ticker for IntervalTicker {
    fn wait(&mut self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            if *self.shutdown.borrow() {
                return false;
            }
            tokio::select! {
                _ = self.interval.tick() => true,
                changed = self.shutdown.changed() => match changed {
                    Ok(()) => !*self.shutdown.borrow(),
                    Err(_) => false,
                },
            }
        })
    }
}

/// Test-driven ticker: each message from its driver releases one tick.
pub struct ManualTicker {
    rx: mpsc::UnboundedReceiver<()>,
}

/// Driver handle releasing ticks for a [`ManualTicker`].
#[derive(Clone)]
pub struct TickDriver {
    tx: mpsc::UnboundedSender<()>,
}

impl ManualTicker {
    /// Build a ticker plus the handle that releases its ticks.
    pub fn new() -> (Self, TickDriver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, TickDriver { tx })
    }
}

impl TickDriver {
    /// Release one tick; returns `false` when the ticker is gone.
    pub fn tick(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

impl Ticker for ManualTicker {
    fn wait(&mut self) -> BoxFuture<'_, bool> {
        Box::pin(async move { self.rx.recv().await.is_some() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_ticker_releases_one_wait_per_tick() {
        let (mut ticker, driver) = ManualTicker::new();

        assert!(driver.tick());
        assert!(driver.tick());
        assert!(ticker.wait().await);
        assert!(ticker.wait().await);

        drop(driver);
        assert!(!ticker.wait().await);
    }

    #[tokio::test]
    async fn interval_ticker_stops_after_shutdown() {
        let (mut ticker, shutdown) = IntervalTicker::new(Duration::from_millis(1));
        assert!(ticker.wait().await);

        shutdown.shutdown();
        // The pending shutdown wins over any further ticks.
        assert!(!ticker.wait().await);
        assert!(!ticker.wait().await);
    }
}
