//! The control loop driver.
//!
//! Notifications are processed strictly in delivery order on one task;
//! timers deliver completions back into the same queue. Guard flags and
//! pending timers are private to the loop — nothing else reads or mutates
//! them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use beltline_events::{AppendEvent, EventLog, LogError};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::action::{Action, ActionKind};
use crate::guard::GuardMap;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("observed aggregate subscription closed")]
    ObservationClosed,

    #[error(transparent)]
    Append(#[from] LogError),
}

/// A reactive policy over one or more observed aggregates.
///
/// `changed` waits for the next snapshot on any observed aggregate (watch
/// receivers + `tokio::select!`); `decide` evaluates the policy against the
/// latest snapshots. `decide` must be pure — the runtime owns the guards
/// and the timers.
#[async_trait]
pub trait Controller: Send + 'static {
    async fn changed(&mut self) -> Result<(), ControlError>;

    fn decide(&mut self) -> Vec<Action>;
}

enum Wake {
    Shutdown,
    Timer(TimerMsg),
    StateChanged,
}

enum TimerMsg {
    /// Simulated processing delay elapsed; time to emit.
    Elapsed {
        kind: ActionKind,
        emit: Vec<AppendEvent>,
        cooldown: Option<Duration>,
    },
    /// Post-completion cool-down elapsed; the guard may clear.
    CooldownOver { kind: ActionKind },
}

/// Drives one controller: state change → decide → guarded timed action →
/// emit → guard clear.
pub struct ControlLoop<C: Controller> {
    name: &'static str,
    controller: C,
    log: Arc<dyn EventLog>,
    guards: GuardMap,
}

impl<C: Controller> ControlLoop<C> {
    pub fn new(name: &'static str, controller: C, log: Arc<dyn EventLog>) -> Self {
        Self {
            name,
            controller,
            log,
            guards: GuardMap::new(),
        }
    }

    /// Run until `shutdown` is cancelled. Cancels all pending timers on the
    /// way out — an action that has not emitted yet never will.
    pub async fn run(mut self, shutdown: CancellationToken) -> anyhow::Result<()> {
        info!(name = self.name, "control loop started");

        let (timer_tx, mut timer_rx) = mpsc::unbounded_channel();
        let timers = CancellationToken::new();

        // The watch receivers already hold the current snapshots; evaluate
        // once before waiting for a change.
        self.evaluate(&timer_tx, &timers);

        loop {
            // Resolve the wake-up reason first; the select borrows the
            // controller, acting on it borrows the whole loop.
            let wake = tokio::select! {
                _ = shutdown.cancelled() => Wake::Shutdown,
                Some(msg) = timer_rx.recv() => Wake::Timer(msg),
                changed = self.controller.changed() => {
                    changed?;
                    Wake::StateChanged
                }
            };

            match wake {
                Wake::Shutdown => {
                    timers.cancel();
                    info!(name = self.name, "control loop stopped");
                    return Ok(());
                }
                Wake::Timer(TimerMsg::Elapsed { kind, emit, cooldown }) => {
                    self.complete(kind, emit, cooldown, &timer_tx, &timers).await;
                }
                Wake::Timer(TimerMsg::CooldownOver { kind }) => {
                    debug!(name = self.name, kind = kind.as_str(), "cool-down over");
                    self.guards.release(kind);
                    // A drain may need to fire again with no new event
                    // arriving; re-check the policy now.
                    self.evaluate(&timer_tx, &timers);
                }
                Wake::StateChanged => self.evaluate(&timer_tx, &timers),
            }
        }
    }

    /// Evaluate the policy; claim and schedule every decided action whose
    /// guard is free. Held kinds are dropped, not queued.
    fn evaluate(
        &mut self,
        timer_tx: &mpsc::UnboundedSender<TimerMsg>,
        timers: &CancellationToken,
    ) {
        for action in self.controller.decide() {
            if !self.guards.claim(action.kind) {
                debug!(
                    name = self.name,
                    kind = action.kind.as_str(),
                    "action in flight; notification ignored"
                );
                continue;
            }
            debug!(
                name = self.name,
                kind = action.kind.as_str(),
                delay_ms = action.delay.as_millis() as u64,
                "action started"
            );

            let token = timers.child_token();
            let tx = timer_tx.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep(action.delay) => {
                        let _ = tx.send(TimerMsg::Elapsed {
                            kind: action.kind,
                            emit: action.emit,
                            cooldown: action.cooldown,
                        });
                    }
                }
            });
        }
    }

    /// Emit the follow-up events for a completed action, then clear the
    /// guard: immediately, or after the cool-down.
    ///
    /// On success the loop does NOT re-evaluate here. The emitted events flow
    /// back through the observed aggregates and arrive as a change
    /// notification; deciding then sees state that includes this action's own
    /// output. Deciding now would read the pre-append snapshot and could
    /// schedule work the fresh state forbids.
    ///
    /// Appends are independent; a failure does not stop the remaining ones.
    /// A failure releases the guard and re-evaluates right away (the state
    /// did not change, so the current snapshot is still accurate) instead of
    /// wedging the kind forever.
    async fn complete(
        &mut self,
        kind: ActionKind,
        emit: Vec<AppendEvent>,
        cooldown: Option<Duration>,
        timer_tx: &mpsc::UnboundedSender<TimerMsg>,
        timers: &CancellationToken,
    ) {
        let mut failed = false;
        for event in emit {
            let tag = event.tag.clone();
            match self.log.append(event).await {
                Ok(ack) => {
                    debug!(name = self.name, kind = kind.as_str(), tag, seq = ack.seq, "emitted");
                }
                Err(err) => {
                    warn!(
                        name = self.name,
                        kind = kind.as_str(),
                        tag,
                        %err,
                        "append failed; action will be retried"
                    );
                    failed = true;
                }
            }
        }

        match cooldown {
            Some(hold) if !failed => {
                debug!(
                    name = self.name,
                    kind = kind.as_str(),
                    hold_ms = hold.as_millis() as u64,
                    "action complete; holding guard for cool-down"
                );
                let token = timers.child_token();
                let tx = timer_tx.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = token.cancelled() => {}
                        _ = tokio::time::sleep(hold) => {
                            let _ = tx.send(TimerMsg::CooldownOver { kind });
                        }
                    }
                });
            }
            _ => {
                self.guards.release(kind);
                if failed {
                    self.evaluate(timer_tx, timers);
                }
            }
        }
    }
}
