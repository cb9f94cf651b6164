use log::{debug, error, info, warn};
use std::future::Future;
use tokio::time::{interval, Duration, MissedTickBehavior};

use super::scheduler::PollScheduler;
use super::stats::PollStats;
use crate::config::{PollingConfig, PublishPolicy};
use crate::devices::{MiranSensor, Reading, SensorFrame};
use crate::modbus::SerialChannel;
use crate::output::ReadingSink;
use crate::utils::clock::{SystemClock, TimeSource};
use crate::utils::error::SensorError;

/// Scratch buffer size; one cycle never reads more than this.
pub const RAW_BUFFER_CAPACITY: usize = 1024;

/// What a single control-loop tick ended up doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Not a polling tick.
    Idle,
    /// The channel is gone; the tick did nothing.
    ChannelClosed,
    /// Due, but the channel had nothing to read.
    NoBytes,
    /// Querying or reading the channel failed.
    ReadFailed,
    /// Read fewer bytes than a frame needs.
    Insufficient(usize),
    /// A reading was decoded and published.
    Decoded(SensorFrame),
}

pub struct AcquisitionService<C: SerialChannel> {
    channel: C,
    sensor: MiranSensor,
    scheduler: PollScheduler,
    clock: Box<dyn TimeSource>,
    sinks: Vec<Box<dyn ReadingSink>>,
    buffer: [u8; RAW_BUFFER_CAPACITY],
    last_reading: Reading,
    policy: PublishPolicy,
    tick_period: Duration,
    stats: PollStats,
    closed_reported: bool,
}

impl<C: SerialChannel> AcquisitionService<C> {
    /// Takes ownership of an already opened channel. A channel that is not open
    /// at this point is a startup failure.
    pub fn new(channel: C, sensor: MiranSensor, polling: &PollingConfig) -> Result<Self, SensorError> {
        if !channel.is_open() {
            error!("❌ Serial channel for {} is not open", sensor.name);
            return Err(SensorError::ChannelClosed);
        }

        Ok(Self {
            channel,
            sensor,
            scheduler: PollScheduler::new(polling.cycle_length),
            clock: Box::new(SystemClock),
            sinks: Vec::new(),
            buffer: [0u8; RAW_BUFFER_CAPACITY],
            last_reading: Reading::default(),
            policy: polling.publish_policy,
            tick_period: polling.tick_period(),
            stats: PollStats::default(),
            closed_reported: false,
        })
    }

    pub fn with_clock(mut self, clock: Box<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    pub fn add_sink(&mut self, sink: Box<dyn ReadingSink>) {
        info!("📤 Publishing readings to {} sink", sink.sink_type());
        self.sinks.push(sink);
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    pub fn last_reading(&self) -> Reading {
        self.last_reading
    }

    /// Runs the control loop until `shutdown` resolves, then returns the final counters.
    pub async fn run_until<F>(&mut self, shutdown: F) -> PollStats
    where
        F: Future<Output = ()>,
    {
        info!("🔄 Starting acquisition loop for {}", self.sensor.name);
        info!("   ⏱️  Tick period: {:?}, poll every {} ticks",
              self.tick_period, self.scheduler.cycle_length());
        info!("   📨 Request: {}", self.sensor.request());

        let mut ticker = interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("🛑 Stopping acquisition loop...");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        self.stats.log_summary();
        self.stats.clone()
    }

    /// One control-loop tick.
    pub async fn tick(&mut self) -> TickOutcome {
        self.stats.ticks += 1;
        let due = self.scheduler.tick();

        if !self.channel.is_open() {
            return self.on_closed();
        }

        if !due {
            return TickOutcome::Idle;
        }

        self.stats.due_cycles += 1;
        self.poll_cycle().await
    }

    fn on_closed(&mut self) -> TickOutcome {
        if !self.closed_reported {
            warn!("⚠️  Serial channel closed, skipping poll cycles");
            self.closed_reported = true;
        }
        self.stats.closed_ticks += 1;
        TickOutcome::ChannelClosed
    }

    async fn poll_cycle(&mut self) -> TickOutcome {
        if let Err(e) = self.channel.write_request(self.sensor.request().as_bytes()) {
            self.stats.write_failures += 1;
            warn!("⚠️  Request write failed: {}", e);
            if !self.channel.is_open() {
                return self.on_closed();
            }
        }

        let available = match self.channel.bytes_available() {
            Ok(n) => n,
            Err(e) => {
                self.stats.read_failures += 1;
                warn!("⚠️  Cannot query available bytes: {}", e);
                return TickOutcome::ReadFailed;
            }
        };

        if available == 0 {
            self.stats.empty_cycles += 1;
            return TickOutcome::NoBytes;
        }

        self.stats.attempts += 1;
        self.buffer.fill(0);
        let wanted = available.min(RAW_BUFFER_CAPACITY);

        let read = match self.channel.read_into(&mut self.buffer[..wanted]) {
            Ok(n) => n,
            Err(e) => {
                self.stats.read_failures += 1;
                warn!("⚠️  Read failed: {}", e);
                return TickOutcome::ReadFailed;
            }
        };
        debug!("📥 Read {} of {} available bytes: {}",
               read, available, hex::encode(&self.buffer[..read]));

        match self.sensor.parse_raw_data(&self.buffer[..read], self.clock.as_ref()) {
            Some(frame) => {
                self.stats.decoded += 1;
                if !frame.search.is_found() {
                    self.stats.fallback_decodes += 1;
                }
                self.last_reading = frame.reading;
                self.publish(frame.reading).await;
                TickOutcome::Decoded(frame)
            }
            None => {
                self.stats.insufficient += 1;
                debug!("📉 Only {} bytes, need a full frame", read);
                if self.policy == PublishPolicy::RepublishLast {
                    self.publish(self.last_reading).await;
                }
                TickOutcome::Insufficient(read)
            }
        }
    }

    async fn publish(&mut self, reading: Reading) {
        for sink in &self.sinks {
            match sink.publish(&reading).await {
                Ok(()) => self.stats.publishes += 1,
                Err(e) => {
                    self.stats.publish_failures += 1;
                    warn!("⚠️  {} sink rejected reading: {}", sink.sink_type(), e);
                }
            }
        }
    }
}
