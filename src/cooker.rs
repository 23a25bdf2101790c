//! Cooker controller: hysteresis control of the heating-element relay.
//!
//! Bang-bang control with a dead band around the chamber target plus a
//! minimum-reactivation cooldown so the relay never short-cycles. One cook
//! per controller lifetime, identified by a generated cook id.

use crate::board::{Board, BoardError};
use crate::thermal::{Reading, Thermistor};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Hard ceiling for the chamber set point (about 350 °F). The controller
/// refuses anything hotter; zero means "always off".
pub const MAX_TARGET_KELVINS: f64 = 450.0;

#[derive(Debug, Error)]
pub enum CookerError {
    #[error("Target temperature outside of range: {0}K")]
    InvalidSetPoint(f64),
    #[error("a cooker needs at least one probe (the chamber)")]
    NoProbes,
    #[error("board error: {0}")]
    Board(#[from] BoardError),
}

/// Immutable view of the cook, safe to hand to the telemetry boundary.
#[derive(Debug, Clone, Serialize)]
pub struct CookSnapshot {
    pub cook_id: String,
    pub cook_start_time: DateTime<Utc>,
    pub chamber_target: f64,
    pub chamber_tolerance: f64,
    pub cooker_on: bool,
    pub readings: Vec<Reading>,
}

#[derive(Debug)]
struct ControlState {
    chamber_target: f64,
    chamber_tolerance: f64,
    cooldown: Duration,
    cooker_on: bool,
    last_on: Option<Instant>,
    last_readings: Vec<Reading>,
}

/// Owns the probes and the relay decision.
///
/// Probe index 0 is the chamber; any further probes are food probes and only
/// ever reported, never controlled on. Target, relay flag, and activation
/// timestamp live under one lock so a remote set-point change is atomic with
/// respect to `update`'s compare-and-toggle.
pub struct Cooker {
    cook_id: String,
    cook_start_time: DateTime<Utc>,
    board: Arc<dyn Board>,
    thermistors: Vec<Arc<Thermistor>>,
    state: Mutex<ControlState>,
}

impl Cooker {
    pub fn new(
        board: Arc<dyn Board>,
        thermistors: Vec<Arc<Thermistor>>,
        chamber_target: f64,
        chamber_tolerance: f64,
        cooldown: Duration,
    ) -> Result<Self, CookerError> {
        if thermistors.is_empty() {
            return Err(CookerError::NoProbes);
        }
        Ok(Self {
            cook_id: uuid::Uuid::new_v4().simple().to_string(),
            cook_start_time: Utc::now(),
            board,
            thermistors,
            state: Mutex::new(ControlState {
                chamber_target,
                chamber_tolerance: chamber_tolerance.max(0.0),
                cooldown,
                cooker_on: false,
                last_on: None,
                last_readings: Vec::new(),
            }),
        })
    }

    pub fn cook_id(&self) -> &str {
        &self.cook_id
    }

    /// Read every probe (chamber first), apply the hysteresis decision to the
    /// chamber temperature, and return the full reading set for telemetry.
    ///
    /// A non-finite chamber temperature counts as an unavailable sample: the
    /// decision is skipped for this tick and the relay holds its state. The
    /// relay flag only changes after the board call succeeds.
    pub async fn update(&self) -> Result<Vec<Reading>, CookerError> {
        let readings: Vec<Reading> = self.thermistors.iter().map(|t| t.reading()).collect();
        let chamber = readings[0];

        let mut state = self.state.lock().await;
        if !chamber.kelvins.is_finite() {
            tracing::warn!(
                "Chamber temperature on pin {} is not usable, holding relay state",
                chamber.pin
            );
        } else if chamber.kelvins > state.chamber_target + state.chamber_tolerance {
            if state.cooker_on {
                tracing::debug!("Chamber at {:.2}K, turning off cooker", chamber.kelvins);
                self.board.set_relay(false).await?;
                state.cooker_on = false;
            }
        } else if chamber.kelvins < state.chamber_target - state.chamber_tolerance
            && !state.cooker_on
        {
            if state.last_on.is_none_or(|t| t.elapsed() >= state.cooldown) {
                tracing::debug!("Chamber at {:.2}K, turning on cooker", chamber.kelvins);
                self.board.set_relay(true).await?;
                state.cooker_on = true;
                state.last_on = Some(Instant::now());
            } else {
                tracing::debug!(
                    "Chamber at {:.2}K but relay is in cooldown, staying off",
                    chamber.kelvins
                );
            }
        }
        state.last_readings = readings.clone();
        Ok(readings)
    }

    /// Replace the chamber set point. Out-of-range values are rejected and
    /// leave the cook untouched.
    pub async fn set_target_temperature(&self, kelvins: f64) -> Result<(), CookerError> {
        if !kelvins.is_finite() || !(0.0..=MAX_TARGET_KELVINS).contains(&kelvins) {
            return Err(CookerError::InvalidSetPoint(kelvins));
        }
        let mut state = self.state.lock().await;
        tracing::info!("Setting chamber target to {}K", kelvins);
        state.chamber_target = kelvins;
        Ok(())
    }

    pub async fn snapshot(&self) -> CookSnapshot {
        let state = self.state.lock().await;
        CookSnapshot {
            cook_id: self.cook_id.clone(),
            cook_start_time: self.cook_start_time,
            chamber_target: state.chamber_target,
            chamber_tolerance: state.chamber_tolerance,
            cooker_on: state.cooker_on,
            readings: state.last_readings.clone(),
        }
    }

    #[cfg(test)]
    async fn last_activation(&self) -> Option<Instant> {
        self.state.lock().await.last_on
    }
}
