//! Slot and link identities.
//!
//! Four fixed slots form two links. Slot numbers follow the wiring used by the
//! front end: 1 = link 1 transmit, 2 = link 1 receive, 3 = link 2 receive,
//! 4 = link 2 transmit.

use crate::error::LinkError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four registry slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Link1Tx,
    Link1Rx,
    Link2Rx,
    Link2Tx,
}

impl Slot {
    /// All slots in slot-number order.
    pub const ALL: [Slot; 4] = [Slot::Link1Tx, Slot::Link1Rx, Slot::Link2Rx, Slot::Link2Tx];

    /// Slot number, 1 through 4.
    pub fn number(self) -> u8 {
        match self {
            Slot::Link1Tx => 1,
            Slot::Link1Rx => 2,
            Slot::Link2Rx => 3,
            Slot::Link2Tx => 4,
        }
    }

    pub(crate) fn index(self) -> usize {
        usize::from(self.number() - 1)
    }

    /// Dotted label such as `Link1.Tx`.
    pub fn label(self) -> &'static str {
        match self {
            Slot::Link1Tx => "Link1.Tx",
            Slot::Link1Rx => "Link1.Rx",
            Slot::Link2Rx => "Link2.Rx",
            Slot::Link2Tx => "Link2.Tx",
        }
    }
}

impl TryFrom<u8> for Slot {
    type Error = LinkError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        match number {
            1 => Ok(Slot::Link1Tx),
            2 => Ok(Slot::Link1Rx),
            3 => Ok(Slot::Link2Rx),
            4 => Ok(Slot::Link2Tx),
            other => Err(LinkError::InvalidSlot(other)),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A logical device link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Link {
    One,
    Two,
}

impl Link {
    pub fn number(self) -> u8 {
        match self {
            Link::One => 1,
            Link::Two => 2,
        }
    }

    /// Slot `send` writes to.
    pub fn tx_slot(self) -> Slot {
        match self {
            Link::One => Slot::Link1Tx,
            Link::Two => Slot::Link2Tx,
        }
    }

    /// Slot the receive engine reads from.
    pub fn rx_slot(self) -> Slot {
        match self {
            Link::One => Slot::Link1Rx,
            Link::Two => Slot::Link2Rx,
        }
    }
}

impl TryFrom<u8> for Link {
    type Error = LinkError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        match number {
            1 => Ok(Link::One),
            2 => Ok(Link::Two),
            other => Err(LinkError::InvalidLink(other)),
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}
