//! The sensor lifecycle state machine: warm-up, baseline acquisition, and
//! steady-state measurement, driven one heartbeat at a time.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::baseline_store::{is_expired, BaselineStore};
use crate::clock::Clock;
use crate::driver::Sgp30Driver;
use crate::error::{ControllerFault, WindowError};
use crate::event_bus::{Event, EventBus};
use crate::measurement::{Measurement, MeasurementWindow, TimedMeasurement};

/// Heartbeats the sensor needs to leave its warm-up phase.
const WARMUP_HEARTBEATS: u32 = 15;
/// Heartbeats `BaselineAcquisition` waits before trusting the sensor's
/// first self-calibrated baseline.
const FIRST_BASELINE_HEARTBEATS: u32 = 60;
/// Heartbeats between baseline refreshes once `Functioning`.
const BASELINE_REFRESH_HEARTBEATS: u32 = 30;
/// Default publish cadence, in heartbeats (the controller is driven at 1 Hz,
/// so this is also seconds).
const DEFAULT_PUBLISH_INTERVAL_HEARTBEATS: u16 = 10;

/// Where the controller is in the sensor's lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SensorState {
    /// No command has been sent to the sensor yet.
    Uninitialized,
    /// `init_air_quality` has run; the sensor is in its 15 s warm-up.
    Initializing,
    /// Warm-up is over and no usable baseline was available at startup;
    /// waiting to learn the sensor's own first baseline.
    BaselineAcquisition,
    /// Steady state: measuring and periodically refreshing the baseline.
    Functioning,
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            SensorState::Uninitialized => defmt::write!(f, "SensorState::Uninitialized"),
            SensorState::Initializing => defmt::write!(f, "SensorState::Initializing"),
            SensorState::BaselineAcquisition => {
                defmt::write!(f, "SensorState::BaselineAcquisition")
            }
            SensorState::Functioning => defmt::write!(f, "SensorState::Functioning"),
        }
    }
}

/// Drives an [`Sgp30Driver`] through its lifecycle and aggregates its
/// readings into a [`MeasurementWindow`].
///
/// `WN` is the measurement window capacity; `EVN` is the event bus's
/// subscriber capacity.
pub struct SensorController<'bus, 'ev, I2C, D, C, S, const WN: usize = 12, const EVN: usize = 4> {
    driver: Sgp30Driver<'bus, I2C, D>,
    clock: C,
    store: S,
    events: EventBus<'ev, EVN>,
    window: MeasurementWindow<WN>,
    state: SensorState,
    heartbeats_in_state: u32,
    baseline_in: Option<TimedMeasurement>,
    publish_interval_heartbeats: u16,
    pending_publish_interval: Option<u16>,
    heartbeats_since_publish: u16,
}

impl<'bus, 'ev, I2C, D, C, S, const WN: usize, const EVN: usize>
    SensorController<'bus, 'ev, I2C, D, C, S, WN, EVN>
where
    I2C: I2c,
    D: DelayNs,
    C: Clock,
    S: BaselineStore,
{
    /// Build a controller. Reads the store once, up front: a valid,
    /// unexpired baseline found here is applied during the `Initializing`
    /// → `Functioning` transition instead of the sensor having to learn one
    /// itself via `BaselineAcquisition`.
    pub fn new(driver: Sgp30Driver<'bus, I2C, D>, clock: C, mut store: S, events: EventBus<'ev, EVN>) -> Self {
        let baseline_in = match store.load() {
            Ok(b) if !is_expired(&b, clock.now()) => Some(b),
            Ok(_) => None,
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::trace!("no baseline found in store at startup");
                None
            }
        };

        Self {
            driver,
            clock,
            store,
            events,
            window: MeasurementWindow::new(),
            state: SensorState::Uninitialized,
            heartbeats_in_state: 0,
            baseline_in,
            publish_interval_heartbeats: DEFAULT_PUBLISH_INTERVAL_HEARTBEATS,
            pending_publish_interval: None,
            heartbeats_since_publish: 0,
        }
    }

    /// The controller's current state.
    pub fn state(&self) -> SensorState {
        self.state
    }

    /// The current rolling mean, if the window holds any samples.
    pub fn current_mean(&self) -> Option<Measurement> {
        self.window.mean()
    }

    /// Number of samples currently resident in the measurement window.
    pub fn measurement_count(&self) -> usize {
        self.window.len()
    }

    /// Reconfigure the publish cadence.
    ///
    /// The interval already in progress is not shortened retroactively:
    /// the new cadence takes effect starting with the *next* publish, not
    /// the one currently accumulating.
    pub fn on_publish_interval_changed(&mut self, seconds: u16) {
        self.pending_publish_interval = Some(seconds);
    }

    fn enter(&mut self, state: SensorState) {
        self.state = state;
        self.heartbeats_in_state = 0;
    }

    fn reset_to_uninitialized(&mut self) {
        self.window = MeasurementWindow::new();
        self.baseline_in = None;
        self.heartbeats_since_publish = 0;
        self.enter(SensorState::Uninitialized);
    }

    /// Append `m` to the window and, if a publish is due, emit
    /// `Event::NewMeasurement` with the window's mean.
    fn enqueue_and_maybe_publish(&mut self, m: Measurement) -> Result<(), ControllerFault> {
        self.window.enqueue(m);
        self.heartbeats_since_publish += 1;

        if self.heartbeats_since_publish < self.publish_interval_heartbeats {
            return Ok(());
        }

        self.heartbeats_since_publish = 0;
        if let Some(next) = self.pending_publish_interval.take() {
            self.publish_interval_heartbeats = next;
        }

        let mean = self.window.mean().ok_or(WindowError::Empty)?;
        self.events.publish(Event::NewMeasurement(mean));
        Ok(())
    }

    fn refresh_baseline(&mut self) {
        match self.driver.get_baseline() {
            Ok(measurement) => {
                let record = TimedMeasurement {
                    measurement,
                    time: self.clock.now(),
                };
                self.events.publish(Event::NewBaseline(record));
                let _ = self.store.save(record);
            }
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::trace!("baseline refresh failed, will retry on the next schedule");
            }
        }
    }

    /// Advance the state machine by one heartbeat (nominally 1 Hz).
    ///
    /// Transient transport errors are swallowed: the tick is treated as a
    /// no-op and the next heartbeat retries. The sole fatal condition is a
    /// mean requested over an empty window, which resets the controller
    /// back to [`SensorState::Uninitialized`].
    pub fn on_heartbeat(&mut self) {
        let fault = match self.state {
            SensorState::Uninitialized => {
                if self.driver.init_air_quality().is_ok() {
                    self.enter(SensorState::Initializing);
                }
                Ok(())
            }
            SensorState::Initializing => self.tick_initializing(),
            SensorState::BaselineAcquisition => self.tick_baseline_acquisition(),
            SensorState::Functioning => self.tick_functioning(),
        };

        if fault.is_err() {
            self.reset_to_uninitialized();
        }
    }

    fn tick_initializing(&mut self) -> Result<(), ControllerFault> {
        if self.heartbeats_in_state < WARMUP_HEARTBEATS {
            if let Ok(m) = self.driver.measure_air_quality() {
                if m != Measurement::WARMUP {
                    #[cfg(feature = "defmt")]
                    defmt::trace!(
                        "non-warmup reading during Initializing: eco2={} tvoc={}",
                        m.eco2_ppm,
                        m.tvoc_ppb
                    );
                }
            }
            self.heartbeats_in_state += 1;

            if self.heartbeats_in_state < WARMUP_HEARTBEATS {
                return Ok(());
            }
        }

        match self.baseline_in {
            None => {
                self.enter(SensorState::BaselineAcquisition);
            }
            Some(b) => {
                if self.driver.set_baseline(b.measurement).is_ok() {
                    self.enter(SensorState::Functioning);
                }
                // On failure, retry on the next heartbeat from the same spot.
            }
        }
        Ok(())
    }

    fn tick_baseline_acquisition(&mut self) -> Result<(), ControllerFault> {
        if let Ok(m) = self.driver.measure_air_quality() {
            self.enqueue_and_maybe_publish(m)?;
        }
        self.heartbeats_in_state += 1;

        if self.heartbeats_in_state >= FIRST_BASELINE_HEARTBEATS {
            self.refresh_baseline();
            self.enter(SensorState::Functioning);
        }
        Ok(())
    }

    fn tick_functioning(&mut self) -> Result<(), ControllerFault> {
        if let Ok(m) = self.driver.measure_air_quality() {
            self.enqueue_and_maybe_publish(m)?;
        }
        self.heartbeats_in_state += 1;

        if self.heartbeats_in_state % BASELINE_REFRESH_HEARTBEATS == 0 {
            self.refresh_baseline();
        }
        Ok(())
    }
}
