//! Hardware capability seam.
//!
//! The controller never touches SPI or GPIO directly; everything it needs
//! from the board is behind this trait so the control logic runs unchanged
//! against real hardware, the simulator, or a test double.

pub mod sim;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("sample unavailable on pin {pin}: {reason}")]
    SampleUnavailable { pin: u8, reason: String },
    #[error("relay unavailable: {0}")]
    RelayUnavailable(String),
}

/// Everything the controller asks of the physical board.
#[async_trait]
pub trait Board: Send + Sync {
    /// Take one raw ADC sample from the given channel (16-bit normalized).
    async fn read_adc(&self, pin: u8) -> Result<u16, BoardError>;

    /// Drive the heating-element relay. Idempotent.
    async fn set_relay(&self, on: bool) -> Result<(), BoardError>;
}
