//! Simulated board for running the host without hardware attached.
//!
//! Models the chamber probe as a first-order lag: its ADC code falls toward
//! a hot floor while the relay is on and relaxes back toward ambient when it
//! is off (NTC probes read lower codes as they heat). Food probes sit near
//! ambient with noise.

use super::{Board, BoardError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// ADC code of a probe at room temperature.
const AMBIENT_CODE: f64 = 61_000.0;
/// ADC code the chamber settles at with the element running flat out.
const HOT_CODE: f64 = 25_000.0;
/// Fraction of the remaining distance covered per sample.
const DRIFT_RATE: f64 = 0.002;
/// Peak-to-peak sample noise in ADC counts.
const NOISE_COUNTS: f64 = 120.0;

#[derive(Debug, Default)]
struct SimState {
    relay_on: bool,
    codes: HashMap<u8, f64>,
}

#[derive(Debug)]
pub struct SimulatedBoard {
    chamber_pin: u8,
    relay_pin: u8,
    state: Mutex<SimState>,
}

impl SimulatedBoard {
    pub fn new(chamber_pin: u8, relay_pin: u8) -> Self {
        Self { chamber_pin, relay_pin, state: Mutex::new(SimState::default()) }
    }

    pub fn relay_pin(&self) -> u8 {
        self.relay_pin
    }

    pub fn relay_on(&self) -> bool {
        self.state.lock().expect("sim state poisoned").relay_on
    }
}

#[async_trait]
impl Board for SimulatedBoard {
    async fn read_adc(&self, pin: u8) -> Result<u16, BoardError> {
        let mut state = self.state.lock().expect("sim state poisoned");
        let target = if pin == self.chamber_pin && state.relay_on {
            HOT_CODE
        } else {
            AMBIENT_CODE
        };
        let code = state.codes.entry(pin).or_insert(AMBIENT_CODE);
        *code += (target - *code) * DRIFT_RATE;

        let noise = (rand::random::<f64>() - 0.5) * NOISE_COUNTS;
        Ok((*code + noise).clamp(0.0, u16::MAX as f64) as u16)
    }

    async fn set_relay(&self, on: bool) -> Result<(), BoardError> {
        let mut state = self.state.lock().expect("sim state poisoned");
        if state.relay_on != on {
            tracing::debug!(
                "Simulated relay on pin {} -> {}",
                self.relay_pin,
                if on { "on" } else { "off" }
            );
        }
        state.relay_on = on;
        Ok(())
    }
}
