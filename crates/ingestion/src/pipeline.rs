//! Frame stream: drives a [`TelemetrySource`] on a tokio task

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{TelemetryFrame, TelemetrySource};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::config::{IngestionMetrics, StreamConfig};

/// Streams frames from one source over a bounded channel
///
/// The producer task waits for channel capacity, so a slow consumer
/// slows the source down instead of losing frames.
pub struct IngestionPipeline {
    config: StreamConfig,
    metrics: Arc<IngestionMetrics>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<u64>>,
}

impl IngestionPipeline {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(IngestionMetrics::new()),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Start streaming; returns the receiving end
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(name = "ingestion_start", skip(self, source), fields(source = source.name()))]
    pub fn start(&mut self, mut source: Box<dyn TelemetrySource>) -> mpsc::Receiver<TelemetryFrame> {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let running = self.running.clone();
        let metrics = self.metrics.clone();
        let interval = self.config.interval();
        let max_frames = self.config.max_frames;
        running.store(true, Ordering::SeqCst);

        info!(
            capacity = self.config.channel_capacity,
            paced = interval.is_some(),
            "starting frame stream"
        );

        self.handle = Some(tokio::spawn(async move {
            let name = source.name().to_string();
            let mut ticker = interval.map(tokio::time::interval);
            let mut sent: u64 = 0;

            while running.load(Ordering::Relaxed) && max_frames.map_or(true, |max| sent < max) {
                if let Some(ticker) = ticker.as_mut() {
                    ticker.tick().await;
                }
                let Some(frame) = source.next_frame() else {
                    debug!(source = %name, "source exhausted");
                    break;
                };
                if tx.send(frame).await.is_err() {
                    debug!(source = %name, "frame channel closed");
                    break;
                }
                metrics.record_emitted();
                sent += 1;
            }

            running.store(false, Ordering::SeqCst);
            debug!(source = %name, sent, "frame stream stopped");
            sent
        }));

        rx
    }

    /// Ask the producer task to stop after its current frame
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Wait for the producer task; returns the number of frames sent
    pub async fn join(&mut self) -> u64 {
        match self.handle.take() {
            Some(handle) => handle.await.unwrap_or(0),
            None => 0,
        }
    }
}

/// Convenience wrapper: start a pipeline for `source` and return both ends
pub fn spawn_stream(
    source: Box<dyn TelemetrySource>,
    config: StreamConfig,
) -> (IngestionPipeline, mpsc::Receiver<TelemetryFrame>) {
    let mut pipeline = IngestionPipeline::new(config);
    let rx = pipeline.start(source);
    (pipeline, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockField, MockFieldConfig};
    use crate::replay::ReplaySource;
    use std::io::Cursor;

    fn mock() -> Box<dyn TelemetrySource> {
        Box::new(
            MockField::new(MockFieldConfig {
                cars: 4,
                ..Default::default()
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_stream_respects_max_frames() {
        let config = StreamConfig {
            channel_capacity: 4,
            tick_hz: None,
            max_frames: Some(25),
        };
        let (mut pipeline, mut rx) = spawn_stream(mock(), config);

        let mut received = 0;
        let mut last_time = f64::NEG_INFINITY;
        while let Some(frame) = rx.recv().await {
            assert!(frame.session_time_sec > last_time);
            last_time = frame.session_time_sec;
            received += 1;
        }
        assert_eq!(received, 25);
        assert_eq!(pipeline.join().await, 25);
        assert_eq!(pipeline.metrics().snapshot().frames_emitted, 25);
        assert!(!pipeline.is_running());
    }

    #[tokio::test]
    async fn test_stream_ends_with_source() {
        let trace = "{\"session_time_sec\": 1.0, \"player_car_idx\": 0}\n\
                     {\"session_time_sec\": 2.0, \"player_car_idx\": 0}\n";
        let source = Box::new(ReplaySource::from_reader("mem", Cursor::new(trace)));
        let (mut pipeline, mut rx) = spawn_stream(source, StreamConfig::default());

        assert_eq!(rx.recv().await.map(|f| f.session_time_sec), Some(1.0));
        assert_eq!(rx.recv().await.map(|f| f.session_time_sec), Some(2.0));
        assert!(rx.recv().await.is_none());
        assert_eq!(pipeline.join().await, 2);
    }

    #[tokio::test]
    async fn test_stop_and_dropped_receiver() {
        let (mut pipeline, mut rx) = spawn_stream(mock(), StreamConfig::new(2, Some(1000.0)));
        assert!(rx.recv().await.is_some());
        pipeline.stop();
        drop(rx);
        let sent = pipeline.join().await;
        assert!(sent >= 1);
        assert!(!pipeline.is_running());
    }
}
