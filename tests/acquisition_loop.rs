use std::time::Duration;

use miran_sensor_rust::config::PollingConfig;
use miran_sensor_rust::utils::clock::FixedClock;
use miran_sensor_rust::{
    AcquisitionService, ChannelSink, MarkerSearch, MiranSensor, PublishPolicy, Reading,
    SensorError, SerialChannel, TickOutcome,
};

/// Sensor that always has the same bytes waiting and records every request.
struct StreamingSensor {
    response: Vec<u8>,
    requests: Vec<Vec<u8>>,
}

impl StreamingSensor {
    fn new(response: &[u8]) -> Self {
        Self { response: response.to_vec(), requests: Vec::new() }
    }
}

impl SerialChannel for StreamingSensor {
    fn is_open(&self) -> bool {
        true
    }

    fn bytes_available(&mut self) -> Result<usize, SensorError> {
        Ok(self.response.len())
    }

    fn write_request(&mut self, request: &[u8]) -> Result<(), SensorError> {
        self.requests.push(request.to_vec());
        Ok(())
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, SensorError> {
        let n = self.response.len().min(buf.len());
        buf[..n].copy_from_slice(&self.response[..n]);
        Ok(n)
    }
}

fn build(response: &[u8]) -> (AcquisitionService<StreamingSensor>, tokio::sync::mpsc::Receiver<Reading>) {
    let mut service = AcquisitionService::new(
        StreamingSensor::new(response),
        MiranSensor::default(),
        &PollingConfig::default(),
    )
    .unwrap()
    .with_clock(Box::new(FixedClock(1_700_000_000.0)));
    let (sink, rx) = ChannelSink::channel(1000);
    service.add_sink(Box::new(sink));
    (service, rx)
}

#[tokio::test]
async fn one_attempt_per_ten_ticks() {
    let frame = [0xAA, 0x01, 0x03, 0x04, 0x00, 0x03, 0x40, 0x00, 0x12, 0x34];
    let (mut service, mut rx) = build(&frame);

    for _ in 0..100 {
        service.tick().await;
    }

    assert_eq!(service.stats().ticks, 100);
    assert_eq!(service.stats().attempts, 10);
    assert_eq!(service.stats().decoded, 10);
    assert_eq!(service.channel().requests.len(), 10);
    assert!(service
        .channel()
        .requests
        .iter()
        .all(|r| r == &[0x01, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC4, 0x0B]));

    let mut received = 0;
    while let Ok(reading) = rx.try_recv() {
        assert_eq!(reading, Reading::new(1_700_000_000.0, 3.25));
        received += 1;
    }
    assert_eq!(received, 10);
}

#[tokio::test]
async fn markerless_stream_still_publishes() {
    let noise: Vec<u8> = (0u8..20).map(|b| b | 0x80).collect();
    let (mut service, mut rx) = build(&noise);

    let mut outcome = TickOutcome::Idle;
    for _ in 0..10 {
        let o = service.tick().await;
        if o != TickOutcome::Idle {
            outcome = o;
        }
    }

    match outcome {
        TickOutcome::Decoded(frame) => assert_eq!(frame.search, MarkerSearch::Fallback(12)),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(service.stats().fallback_decodes, 1);
    assert!(rx.try_recv().is_ok());
}

#[tokio::test]
async fn run_until_stops_on_shutdown() {
    let frame = [0x01, 0x03, 0x04, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
    let (mut service, mut rx) = build(&frame);

    let stats = service
        .run_until(tokio::time::sleep(Duration::from_millis(50)))
        .await;

    assert!(stats.ticks > 0);
    assert!(stats.attempts <= stats.ticks / 10 + 1);
    assert_eq!(stats.decoded, stats.attempts);

    let mut received = 0;
    while rx.try_recv().is_ok() {
        received += 1;
    }
    assert_eq!(received as u64, stats.publishes);
}

#[tokio::test]
async fn suppress_stale_policy_is_respected() {
    let polling = PollingConfig { publish_policy: PublishPolicy::SuppressStale, ..PollingConfig::default() };
    let mut service = AcquisitionService::new(StreamingSensor::new(&[0x01, 0x03, 0x04]), MiranSensor::default(), &polling)
        .unwrap();
    let (sink, mut rx) = ChannelSink::channel(8);
    service.add_sink(Box::new(sink));

    for _ in 0..30 {
        service.tick().await;
    }

    assert_eq!(service.stats().insufficient, 3);
    assert!(rx.try_recv().is_err());
}
