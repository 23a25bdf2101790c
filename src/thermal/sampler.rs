//! Background sampling task, one per thermistor channel.

use crate::board::Board;
use crate::thermal::thermistor::Thermistor;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Spawn the fixed-rate sampling loop for one channel.
///
/// Each tick takes one raw sample from the board and feeds the channel's
/// moving average. A failed read is logged and the tick skipped; the loop
/// only exits on the shutdown signal.
pub fn spawn(
    board: Arc<dyn Board>,
    thermistor: Arc<Thermistor>,
    rate_hz: u32,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    let period = std::time::Duration::from_secs_f64(1.0 / rate_hz.max(1) as f64);
    tokio::spawn(async move {
        let pin = thermistor.pin();
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Sampler for pin {} shutting down", pin);
                    break;
                }
                _ = interval.tick() => {
                    match board.read_adc(pin).await {
                        Ok(raw) => {
                            thermistor.record_sample(raw);
                            tracing::trace!("Pin {} sample: {}", pin, raw);
                        }
                        Err(e) => {
                            tracing::warn!("Skipping sample for pin {}: {}", pin, e);
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardError;
    use crate::thermal::calibration::Coefficients;
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixedBoard(u16);

    #[async_trait]
    impl Board for FixedBoard {
        async fn read_adc(&self, _pin: u8) -> Result<u16, BoardError> {
            Ok(self.0)
        }
        async fn set_relay(&self, _on: bool) -> Result<(), BoardError> {
            Ok(())
        }
    }

    struct DeadBoard;

    #[async_trait]
    impl Board for DeadBoard {
        async fn read_adc(&self, pin: u8) -> Result<u16, BoardError> {
            Err(BoardError::SampleUnavailable { pin, reason: "adc offline".into() })
        }
        async fn set_relay(&self, _on: bool) -> Result<(), BoardError> {
            Ok(())
        }
    }

    fn test_thermistor() -> Arc<Thermistor> {
        Arc::new(Thermistor::new(0, Coefficients::DEFAULT, 10_000.0, 3.3, 100))
    }

    #[tokio::test(start_paused = true)]
    async fn test_sampler_feeds_moving_average() {
        let thermistor = test_thermistor();
        let (shutdown_tx, _) = broadcast::channel(1);
        let handle = spawn(
            Arc::new(FixedBoard(42_000)),
            thermistor.clone(),
            10,
            shutdown_tx.subscribe(),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(thermistor.average(), 42_000.0);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sampler_survives_read_failures() {
        let thermistor = test_thermistor();
        let (shutdown_tx, _) = broadcast::channel(1);
        let handle = spawn(Arc::new(DeadBoard), thermistor.clone(), 10, shutdown_tx.subscribe());

        tokio::time::sleep(Duration::from_secs(2)).await;
        // Every tick failed; the average is untouched and the task is alive.
        assert_eq!(thermistor.average(), 0.0);
        assert!(!handle.is_finished());

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
