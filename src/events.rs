//! Structured events emitted by the line and the sinks that consume them.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::types::{Piece, PieceId, Position, VehicleId};

/// State transition observed on the line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineEvent {
    PieceAdded { piece: Piece },
    /// The conveyor moved a piece into the empty picking point.
    PieceAtPickingPoint { piece: PieceId, position: Position },
    VehicleMoved {
        vehicle: VehicleId,
        position: Position,
        battery_percent: u32,
    },
    /// Vehicle already at its target; it stayed put without spending battery.
    VehicleWaiting {
        vehicle: VehicleId,
        position: Position,
        battery_percent: u32,
    },
    PieceLoaded { vehicle: VehicleId, piece: Piece },
    PieceStored {
        vehicle: VehicleId,
        piece: Piece,
        storage: Position,
    },
    BatteryDepleted {
        vehicle: VehicleId,
        position: Position,
        lost: Option<PieceId>,
    },
    VehicleFinished {
        vehicle: VehicleId,
        position: Position,
        delivered: usize,
    },
}

impl fmt::Display for LineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineEvent::PieceAdded { piece } => write!(f, "{piece} added to the conveyor"),
            LineEvent::PieceAtPickingPoint { piece, position } => {
                write!(f, "piece #{piece} reached the picking point at {position}")
            }
            LineEvent::VehicleMoved {
                vehicle,
                position,
                battery_percent,
            } => write!(f, "AGVS {vehicle} ({battery_percent}%): moves to {position}"),
            LineEvent::VehicleWaiting {
                vehicle,
                position,
                battery_percent,
            } => write!(f, "AGVS {vehicle} ({battery_percent}%): is at {position}"),
            LineEvent::PieceLoaded { vehicle, piece } => write!(
                f,
                "AGVS {vehicle}: load {piece}, should be stored at {}",
                piece.destination()
            ),
            LineEvent::PieceStored {
                vehicle,
                piece,
                storage,
            } => write!(f, "AGVS {vehicle}: {piece} stored at {storage}"),
            LineEvent::BatteryDepleted {
                vehicle,
                position,
                lost,
            } => {
                write!(f, "AGVS {vehicle} (0%): has run out of battery at {position}")?;
                if let Some(piece) = lost {
                    write!(f, ", piece #{piece} lost")?;
                }
                Ok(())
            }
            LineEvent::VehicleFinished {
                vehicle,
                position,
                delivered,
            } => write!(f, "AGVS {vehicle}: finished at {position} after {delivered} deliveries"),
        }
    }
}

/// Sink for line events, shared by every vehicle thread.
///
/// Events from different vehicles interleave freely, except that a piece's
/// arrival at the picking point always precedes its loading. Arrival events
/// are emitted while the supply line is locked, so implementations must not
/// call back into the line.
pub trait LineObserver: Send + Sync {
    fn on_event(&self, event: &LineEvent);
}

/// Discards every event.
pub struct NoopObserver;

impl LineObserver for NoopObserver {
    fn on_event(&self, _event: &LineEvent) {}
}

/// Prints every event on stdout, one line each.
pub struct ConsoleObserver;

impl LineObserver for ConsoleObserver {
    fn on_event(&self, event: &LineEvent) {
        println!("{event}");
    }
}

/// Forwards every event to each wrapped observer in turn.
pub struct FanOut(pub Vec<Arc<dyn LineObserver>>);

impl LineObserver for FanOut {
    fn on_event(&self, event: &LineEvent) {
        for observer in &self.0 {
            observer.on_event(event);
        }
    }
}

/// Keeps every event in memory for validation after a run.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<LineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<LineEvent> {
        self.events.lock().expect("event log mutex poisoned").clone()
    }

    /// Ids of claimed pieces in claim order, duplicates included.
    pub fn loaded_pieces(&self) -> Vec<PieceId> {
        let guard = self.events.lock().expect("event log mutex poisoned");
        guard
            .iter()
            .filter_map(|event| match event {
                LineEvent::PieceLoaded { piece, .. } => Some(piece.id()),
                _ => None,
            })
            .collect()
    }
}

impl LineObserver for RecordingObserver {
    fn on_event(&self, event: &LineEvent) {
        let mut guard = self.events.lock().expect("event log mutex poisoned");
        guard.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Shape;

    #[test]
    fn recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        let piece = Piece::new(5, Shape::Square, Position::new(0, 2));
        observer.on_event(&LineEvent::PieceAdded {
            piece: piece.clone(),
        });
        observer.on_event(&LineEvent::PieceLoaded { vehicle: 1, piece });
        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LineEvent::PieceAdded { .. }));
        assert_eq!(observer.loaded_pieces(), vec![5]);
    }

    #[test]
    fn fan_out_reaches_every_observer() {
        let first = Arc::new(RecordingObserver::new());
        let second = Arc::new(RecordingObserver::new());
        let fan_out = FanOut(vec![
            first.clone() as Arc<dyn LineObserver>,
            second.clone(),
            Arc::new(NoopObserver),
        ]);
        fan_out.on_event(&LineEvent::VehicleFinished {
            vehicle: 1,
            position: Position::new(3, 2),
            delivered: 0,
        });
        assert_eq!(first.events().len(), 1);
        assert_eq!(second.events(), first.events());
    }

    #[test]
    fn depletion_renders_lost_piece() {
        let event = LineEvent::BatteryDepleted {
            vehicle: 2,
            position: Position::new(1, 2),
            lost: Some(9),
        };
        assert_eq!(
            event.to_string(),
            "AGVS 2 (0%): has run out of battery at (1, 2), piece #9 lost"
        );
    }
}
