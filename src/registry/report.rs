use crate::receive::ReceiveState;
use crate::slot::Slot;
use serde::Serialize;
use std::fmt;

/// Snapshot of one slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotReport {
    pub slot: Slot,
    pub number: u8,
    /// Device name, `None` when the slot is empty.
    pub port: Option<String>,
    pub open: bool,
    pub baud_rate: Option<u32>,
    pub timeout_secs: Option<f64>,
}

/// Read-only snapshot returned by [`PortRegistry::describe`](super::PortRegistry::describe).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryReport {
    pub slots: Vec<SlotReport>,
    pub baud_rate: u32,
    pub timeout_secs: f64,
    pub append_terminator: bool,
    pub receive: ReceiveState,
}

impl RegistryReport {
    pub fn slot(&self, slot: Slot) -> Option<&SlotReport> {
        self.slots.iter().find(|s| s.slot == slot)
    }
}

impl fmt::Display for RegistryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in &self.slots {
            writeln!(
                f,
                "| {:<8} | {}",
                slot.slot.label(),
                slot.port.as_deref().unwrap_or("not set")
            )?;
        }
        writeln!(f, "| {:<8} | {}", "baudrate", self.baud_rate)?;
        writeln!(f, "| {:<8} | {}", "timeout", self.timeout_secs)?;
        let receive = match self.receive {
            ReceiveState::Idle => "idle".to_string(),
            ReceiveState::Running(link) => format!("link {link}"),
        };
        write!(f, "| {:<8} | {}", "receive", receive)
    }
}
