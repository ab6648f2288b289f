//! The coin toss: every observed state schedules the next toss.

use std::time::Duration;

use async_trait::async_trait;
use beltline_control::{Action, ActionKind, ControlError, Controller};
use beltline_engine::Snapshot;
use tokio::sync::watch;

use crate::aggregates::CoinState;
use crate::config::FactoryConfig;
use crate::events::{to_append, CoinEvent, TAG_COIN};

pub const TOSS: ActionKind = ActionKind("toss");

pub struct CoinController {
    coin: watch::Receiver<Snapshot<CoinState>>,
    toss_delay: Duration,
}

impl CoinController {
    pub fn new(coin: watch::Receiver<Snapshot<CoinState>>, config: &FactoryConfig) -> Self {
        Self {
            coin,
            toss_delay: config.toss_delay,
        }
    }
}

#[async_trait]
impl Controller for CoinController {
    async fn changed(&mut self) -> Result<(), ControlError> {
        self.coin
            .changed()
            .await
            .map_err(|_| ControlError::ObservationClosed)
    }

    fn decide(&mut self) -> Vec<Action> {
        self.coin.borrow_and_update();
        // Always toss again; the guard keeps it to one pending toss.
        vec![Action::new(TOSS, self.toss_delay).emit(to_append(
            TAG_COIN,
            &CoinEvent::Tossed {
                heads: rand::random::<bool>(),
            },
        ))]
    }
}
