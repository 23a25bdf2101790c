//! Steinhart-Hart calibration fitting.
//!
//! Each probe is characterized by three (resistance, temperature) points,
//! typically captured at ice water, room temperature, and boiling water.
//! From those the three Steinhart-Hart coefficients are solved exactly; with
//! fewer (or more) points the probe falls back to a documented default set.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("degenerate calibration set: {0}")]
    Degenerate(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One measured calibration point for a probe.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CalibrationPoint {
    /// Probe resistance in ohms.
    pub resistance: f64,
    /// Reference temperature in kelvin.
    #[serde(rename = "kelvins")]
    pub temperature: f64,
}

/// Fitted Steinhart-Hart coefficients: 1/T = a + b·ln(R) + c·ln(R)³.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Coefficients {
    /// Published coefficients for the stock probes, used whenever a probe
    /// has no usable calibration data of its own.
    pub const DEFAULT: Coefficients = Coefficients {
        a: 0.0007343140544,
        b: 0.0002157437229,
        c: 0.0000000951568577,
    };
}

/// Solve the Steinhart-Hart system exactly from three calibration points.
///
/// Points may be passed in any order; they are sorted by ascending
/// temperature before solving. Two points sharing a resistance or a
/// temperature make the system singular and are rejected.
pub fn fit(points: [CalibrationPoint; 3]) -> Result<Coefficients, CalibrationError> {
    let mut pts = points;
    pts.sort_by(|p, q| p.temperature.total_cmp(&q.temperature));

    if pts[0].temperature == pts[1].temperature || pts[1].temperature == pts[2].temperature {
        return Err(CalibrationError::Degenerate("duplicate temperature"));
    }
    if pts[0].resistance == pts[1].resistance
        || pts[1].resistance == pts[2].resistance
        || pts[0].resistance == pts[2].resistance
    {
        return Err(CalibrationError::Degenerate("duplicate resistance"));
    }

    let (l1, l2, l3) = (
        pts[0].resistance.ln(),
        pts[1].resistance.ln(),
        pts[2].resistance.ln(),
    );
    let (y1, y2, y3) = (
        1.0 / pts[0].temperature,
        1.0 / pts[1].temperature,
        1.0 / pts[2].temperature,
    );

    let g2 = (y2 - y1) / (l2 - l1);
    let g3 = (y3 - y1) / (l3 - l1);

    let c = ((g3 - g2) / (l3 - l2)) * (l1 + l2 + l3).recip();
    let b = g2 - c * (l1 * l1 + l1 * l2 + l2 * l2);
    let a = y1 - (b + l1 * l1 * c) * l1;

    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return Err(CalibrationError::Degenerate("non-finite coefficients"));
    }

    Ok(Coefficients { a, b, c })
}

/// Per-probe entry in the calibration file.
#[derive(Debug, Deserialize)]
struct ProbeCalibration {
    pin: u8,
    points: Vec<CalibrationPoint>,
}

/// Resolve the coefficients for one probe from its calibration points.
///
/// Exactly three points produce a fitted set; any other count (including a
/// degenerate triple) produces the defaults. The device keeps cooking on
/// defaults rather than refusing to start over one bad probe file.
pub fn coefficients_for(pin: u8, points: &[CalibrationPoint]) -> Coefficients {
    if points.len() == 3 {
        match fit([points[0], points[1], points[2]]) {
            Ok(coefficients) => {
                tracing::debug!(
                    "Fitted coefficients for pin {}: a={:e}, b={:e}, c={:e}",
                    pin,
                    coefficients.a,
                    coefficients.b,
                    coefficients.c
                );
                coefficients
            }
            Err(e) => {
                tracing::warn!(
                    "Calibration for pin {} is unusable ({}), using default coefficients",
                    pin,
                    e
                );
                Coefficients::DEFAULT
            }
        }
    } else {
        tracing::debug!(
            "Pin {} has {} calibration points (need 3), using default coefficients",
            pin,
            points.len()
        );
        Coefficients::DEFAULT
    }
}

/// Load a calibration file and resolve coefficients per pin.
///
/// File format: `[{"pin": 0, "points": [{"resistance": ..., "kelvins": ...}, ...]}, ...]`
pub fn load_file(path: &Path) -> Result<HashMap<u8, Coefficients>, CalibrationError> {
    let contents = std::fs::read_to_string(path)?;
    let entries: Vec<ProbeCalibration> = serde_json::from_str(&contents)?;

    let mut result = HashMap::new();
    for entry in &entries {
        result.insert(entry.pin, coefficients_for(entry.pin, &entry.points));
    }
    Ok(result)
}
