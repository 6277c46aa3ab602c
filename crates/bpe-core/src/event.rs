//! # Event Metadata: Single Source of Truth
//!
//! Defines `EventKind`, the one table of BP-e events handled by this
//! workspace. The event request builder reads the description and detail
//! element from here; the protocol merger reads the proc wrapper name from
//! here. Adding an event forces every `match` to handle it.
//!
//! | Code   | Event            | Detail element        | Proc wrapper            |
//! |--------|------------------|-----------------------|-------------------------|
//! | 110111 | Cancellation     | `evCancBPe`           | `procCancBPe`           |
//! | 110115 | Boarding denial  | `evNaoEmbBPe`         | `procNaoEmb`            |
//! | 110116 | Seat change      | `evAlteracaoPoltrona` | `procAlteracaoPoltrona` |

use serde::{Deserialize, Serialize};

/// BP-e event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Ticket cancellation (110111).
    Cancellation,
    /// Passenger did not board (110115).
    NoBoarding,
    /// Seat reassignment (110116).
    SeatChange,
}

impl EventKind {
    /// All events in code order.
    pub fn all() -> &'static [EventKind] {
        &[Self::Cancellation, Self::NoBoarding, Self::SeatChange]
    }

    /// Numeric `tpEvento` code.
    pub fn code(&self) -> u32 {
        match self {
            Self::Cancellation => 110111,
            Self::NoBoarding => 110115,
            Self::SeatChange => 110116,
        }
    }

    /// Look up an event by its `tpEvento` text.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "110111" => Some(Self::Cancellation),
            "110115" => Some(Self::NoBoarding),
            "110116" => Some(Self::SeatChange),
            _ => None,
        }
    }

    /// `descEvento` text submitted to SEFAZ.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Cancellation => "Cancelamento",
            Self::NoBoarding => "Não Embarque",
            Self::SeatChange => "Alteração Poltrona",
        }
    }

    /// Element wrapping the event detail inside `detEvento`.
    pub fn detail_element(&self) -> &'static str {
        match self {
            Self::Cancellation => "evCancBPe",
            Self::NoBoarding => "evNaoEmbBPe",
            Self::SeatChange => "evAlteracaoPoltrona",
        }
    }

    /// Root of the composed event document.
    pub fn proc_element(&self) -> &'static str {
        match self {
            Self::Cancellation => "procCancBPe",
            Self::NoBoarding => "procNaoEmb",
            Self::SeatChange => "procAlteracaoPoltrona",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
