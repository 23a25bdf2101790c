//! Thermistor channel: moving average of raw ADC samples and conversion to
//! temperature through the probe's Steinhart-Hart coefficients.

use crate::thermal::calibration::Coefficients;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Maximum code the sampling capability can report (16-bit normalized, the
/// range the MCP3008 driver scales its 10-bit conversions into). The
/// resistance formula depends on this matching the upstream range exactly.
pub const ADC_FULL_SCALE: f64 = 65535.0;

/// A single converted measurement from one probe.
///
/// Ephemeral value, computed on demand from the current moving average.
/// `resistance` and `kelvins` carry wire-format precision (3 decimals).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub pin: u8,
    pub value: u32,
    pub resistance: f64,
    pub kelvins: f64,
}

impl Reading {
    fn zero(pin: u8) -> Self {
        Self { pin, value: 0, resistance: 0.0, kelvins: 0.0 }
    }

    pub fn celsius(&self) -> f64 {
        self.kelvins - 273.15
    }

    pub fn fahrenheit(&self) -> f64 {
        self.celsius() * 9.0 / 5.0 + 32.0
    }
}

#[derive(Debug, Default)]
struct SampleWindow {
    samples: VecDeque<u16>,
    average: f64,
}

/// One ADC channel with its calibration and sample history.
///
/// The sample window is written by the channel's sampling task and read by
/// the control loop; the mutex covers only the append-and-average step, so a
/// reader may observe a slightly stale average but never a torn one.
#[derive(Debug)]
pub struct Thermistor {
    pin: u8,
    coefficients: Coefficients,
    series_resistor: f64,
    supply_voltage: f64,
    capacity: usize,
    window: Mutex<SampleWindow>,
}

impl Thermistor {
    pub fn new(
        pin: u8,
        coefficients: Coefficients,
        series_resistor: f64,
        supply_voltage: f64,
        capacity: usize,
    ) -> Self {
        Self {
            pin,
            coefficients,
            series_resistor,
            supply_voltage,
            capacity: capacity.max(1),
            window: Mutex::new(SampleWindow::default()),
        }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Supply rail feeding the divider, in volts. Informational: the ADC
    /// codes are ratiometric to the rail, so it never enters the conversion.
    pub fn supply_voltage(&self) -> f64 {
        self.supply_voltage
    }

    /// Append one raw sample, evicting the oldest beyond the window size,
    /// and recompute the running mean. Never fails; zero is a valid sample.
    pub fn record_sample(&self, raw: u16) {
        let mut window = self.window.lock().expect("sample window poisoned");
        if window.samples.len() == self.capacity {
            window.samples.pop_front();
        }
        window.samples.push_back(raw);
        window.average =
            window.samples.iter().map(|&s| s as f64).sum::<f64>() / window.samples.len() as f64;
    }

    /// Current moving-average raw value; 0.0 until the first sample lands.
    pub fn average(&self) -> f64 {
        self.window.lock().expect("sample window poisoned").average
    }

    /// Convert the current moving average into a [`Reading`].
    ///
    /// A non-positive average yields the zero sentinel rather than a division
    /// by zero; a disconnected probe reads as 0 K, not as an error.
    pub fn reading(&self) -> Reading {
        let raw = self.average();
        if raw <= 0.0 {
            return Reading::zero(self.pin);
        }

        let resistance = self.series_resistor / ((ADC_FULL_SCALE / raw) - 1.0);
        let ln_r = resistance.ln_1p();
        let Coefficients { a, b, c } = self.coefficients;
        let kelvins = 1.0 / (a + b * ln_r + c * ln_r.powi(3));

        Reading {
            pin: self.pin,
            value: raw as u32,
            resistance: round3(resistance),
            kelvins: round3(kelvins),
        }
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thermal::calibration::{self, CalibrationPoint};

    const SERIES_RESISTOR: f64 = 10_000.0;
    const SUPPLY_VOLTAGE: f64 = 3.3;
    const WINDOW: usize = 100;

    fn default_thermistor(pin: u8) -> Thermistor {
        Thermistor::new(pin, Coefficients::DEFAULT, SERIES_RESISTOR, SUPPLY_VOLTAGE, WINDOW)
    }

    /// ADC code that the voltage divider produces for a probe resistance.
    fn code_for_resistance(resistance: f64) -> u16 {
        (ADC_FULL_SCALE * resistance / (resistance + SERIES_RESISTOR)).round() as u16
    }

    #[test]
    fn test_no_samples_yields_zero_sentinel() {
        let t = default_thermistor(0);
        for _ in 0..3 {
            let r = t.reading();
            assert_eq!(r, Reading { pin: 0, value: 0, resistance: 0.0, kelvins: 0.0 });
        }
    }

    #[test]
    fn test_zero_samples_yield_zero_sentinel() {
        let t = default_thermistor(4);
        t.record_sample(0);
        t.record_sample(0);
        let r = t.reading();
        assert_eq!(r.value, 0);
        assert_eq!(r.resistance, 0.0);
        assert_eq!(r.kelvins, 0.0);
    }

    #[test]
    fn test_fitted_coefficients_reproduce_calibration_points() {
        let points = [
            CalibrationPoint { resistance: 128378.0, temperature: 280.93 },
            CalibrationPoint { resistance: 77521.0, temperature: 297.15 },
            CalibrationPoint { resistance: 7239.0, temperature: 368.15 },
        ];
        let coefficients = calibration::fit(points).unwrap();
        for p in points {
            let t = Thermistor::new(0, coefficients, SERIES_RESISTOR, SUPPLY_VOLTAGE, WINDOW);
            t.record_sample(code_for_resistance(p.resistance));
            let reading = t.reading();
            assert!(
                (reading.kelvins - p.temperature).abs() <= 0.01,
                "pin fed R={} expected {} K, got {} K",
                p.resistance,
                p.temperature,
                reading.kelvins
            );
        }
    }

    #[test]
    fn test_higher_code_means_colder_probe() {
        // Higher ADC code = higher NTC resistance = lower temperature.
        let cold = default_thermistor(0);
        cold.record_sample(60_000);
        let hot = default_thermistor(0);
        hot.record_sample(30_000);
        assert!(cold.reading().kelvins < hot.reading().kelvins);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let t = Thermistor::new(0, Coefficients::DEFAULT, SERIES_RESISTOR, SUPPLY_VOLTAGE, 4);
        for _ in 0..4 {
            t.record_sample(1000);
        }
        assert_eq!(t.average(), 1000.0);
        // Four new samples push out every old one.
        for _ in 0..4 {
            t.record_sample(3000);
        }
        assert_eq!(t.average(), 3000.0);
    }

    #[test]
    fn test_average_is_arithmetic_mean() {
        let t = default_thermistor(2);
        t.record_sample(100);
        t.record_sample(200);
        t.record_sample(300);
        assert_eq!(t.average(), 200.0);
    }

    #[test]
    fn test_supply_voltage_is_informational() {
        // Codes are ratiometric to the rail: a 5V probe with the same
        // divider produces the same reading from the same code.
        let a = Thermistor::new(0, Coefficients::DEFAULT, SERIES_RESISTOR, 3.3, WINDOW);
        let b = Thermistor::new(0, Coefficients::DEFAULT, SERIES_RESISTOR, 5.0, WINDOW);
        a.record_sample(56_000);
        b.record_sample(56_000);
        assert_eq!(a.reading(), b.reading());
        assert_eq!(a.supply_voltage(), 3.3);
        assert_eq!(b.supply_voltage(), 5.0);
    }

    #[test]
    fn test_fahrenheit_conversion() {
        let r = Reading { pin: 0, value: 1, resistance: 1.0, kelvins: 373.15 };
        assert!((r.celsius() - 100.0).abs() < 1e-9);
        assert!((r.fahrenheit() - 212.0).abs() < 1e-9);
    }
}
