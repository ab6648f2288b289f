//! Domain events, one tagged enum per station tag.
//!
//! Folds match exhaustively on these variants — there is no "unknown event,
//! return state unchanged" path. An event that does not decode is a fatal
//! materialization error, not a silent no-op.

use beltline_events::AppendEvent;
use serde::{Deserialize, Serialize};

pub const TAG_MACHINE: &str = "machine";
pub const TAG_ROBOT: &str = "robot";
pub const TAG_COIN: &str = "toss";

/// Events on the machine's buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MachineEvent {
    /// The machine finished producing parts into its buffer.
    Produced { qty: i64 },
    /// The robot took parts out of the buffer.
    PickedUp { qty: i64 },
}

/// Events on the robot's input and packaged buffers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RobotEvent {
    /// Parts arrived from the machine into the input buffer.
    PickedUpFromMachine { qty: i64 },
    /// Parts moved from the input buffer to the packaged buffer.
    Packaged { qty: i64 },
    /// The forklift took packaged parts away.
    PickedUp { qty: i64 },
}

/// The coin-toss toy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CoinEvent {
    Tossed { heads: bool },
}

/// Build an `AppendEvent` from a typed domain event.
pub fn to_append(tag: &str, event: &impl Serialize) -> AppendEvent {
    let payload = serde_json::to_value(event).expect("domain events serialize infallibly");
    AppendEvent::new(tag, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialize_with_kebab_case_type_tags() {
        let event = to_append(TAG_ROBOT, &RobotEvent::PickedUpFromMachine { qty: 2 });
        assert_eq!(event.tag, TAG_ROBOT);
        assert_eq!(
            event.payload,
            json!({"type": "picked-up-from-machine", "qty": 2})
        );
    }
}
