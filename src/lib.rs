//! Driver, aggregation and lifecycle core for a Sensirion SGP30-based
//! indoor air-quality sensor node.
//!
//! This crate owns the part of the node's firmware with the real
//! engineering in it: framing and CRC-checking the SGP30's I²C protocol,
//! driving the sensor through its warm-up/baseline/steady-state lifecycle,
//! aggregating readings into a rolling window, and deciding when a
//! persisted calibration baseline is still trustworthy.
//!
//! It deliberately does not know about Wi-Fi, MQTT, TLS, OTA updates, or
//! wall-clock time acquisition. Those are the concern of a board-support
//! binary, which wires this crate's [`clock::Clock`],
//! [`baseline_store::BaselineStore`] and [`event_bus::EventSink`] traits to
//! real peripherals and a real network stack, and drives
//! [`SensorController::on_heartbeat`] from a 1 Hz timer.
//!
//! ## Usage
//!
//! ```no_run
//! use linux_embedded_hal as hal;
//! use hal::{Delay, I2cdev};
//! use embedded_hal::delay::DelayNs;
//!
//! use sgp30_node::{BusMutex, Clock, Sgp30Driver, SensorController, I2cTransport};
//! use sgp30_node::{BaselineStore, StoreError, TimedMeasurement, EventBus, SGP30_I2C_ADDRESS};
//!
//! struct SystemClock;
//! impl Clock for SystemClock {
//!     fn now(&self) -> i64 { 0 /* wired to RTC in real firmware */ }
//! }
//!
//! struct NoBaseline;
//! impl BaselineStore for NoBaseline {
//!     fn save(&mut self, _b: TimedMeasurement) -> Result<(), StoreError> { Ok(()) }
//!     fn load(&mut self) -> Result<TimedMeasurement, StoreError> { Err(StoreError::NotFound) }
//! }
//!
//! # fn main() {
//! let dev = I2cdev::new("/dev/i2c-1").unwrap();
//! let bus = BusMutex::new(dev);
//! let driver = Sgp30Driver::new(I2cTransport::new(&bus, SGP30_I2C_ADDRESS, Delay));
//! let events: EventBus<'_, 4> = EventBus::new();
//! let mut controller: SensorController<'_, '_, _, _, _, _, 12, 4> =
//!     SensorController::new(driver, SystemClock, NoBaseline, events);
//!
//! loop {
//!     controller.on_heartbeat();
//!     Delay.delay_ms(1000);
//! }
//! # }
//! ```
#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

/// Baseline persistence: the [`BaselineStore`] capability trait, the raw
/// wire encoding, and validity rules.
pub mod baseline_store;
/// I²C command framing, CRC-8 integrity, and bus exclusivity.
pub mod bus;
/// The [`Clock`] capability trait.
pub mod clock;
/// SGP30 command opcodes and their timing/payload shape.
pub mod command;
/// The sensor lifecycle state machine.
pub mod controller;
/// The CRC-8 checksum used on every word the SGP30 sends or receives.
pub mod crc;
/// Typed wrappers around each SGP30 command.
pub mod driver;
/// Error types for every component.
pub mod error;
/// Fan-out of controller events to subscribers.
pub mod event_bus;
/// Measurement values and the fixed-capacity aggregation window.
pub mod measurement;

pub use baseline_store::BaselineStore;
pub use bus::{BusMutex, I2cTransport};
pub use clock::Clock;
pub use command::Command;
pub use controller::{SensorController, SensorState};
pub use driver::{Sgp30Driver, SGP30_I2C_ADDRESS};
pub use error::{ControllerFault, StoreError, TransportError, WindowError};
pub use event_bus::{Event, EventBus, EventSink};
pub use measurement::{Measurement, MeasurementWindow, TimedMeasurement};
