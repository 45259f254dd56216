//! Persistence adapter for the sensor's baseline, and the wire encoding
//! used to store it.

use crate::error::StoreError;
use crate::measurement::{Measurement, TimedMeasurement};

/// Seconds in 7 days: a baseline older than this is considered stale even
/// if the underlying store never fails.
pub const BASELINE_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// Encoded record size: `eco2(2) + tvoc(2) + pad(2) + time(8)`.
pub const RECORD_LEN: usize = 16;

/// A place a [`TimedMeasurement`] baseline can be persisted and recalled.
///
/// Implementations wrap whatever non-volatile storage the target offers
/// (flash-backed key/value store, a file on a host filesystem, a fake for
/// tests); this crate depends only on the trait.
pub trait BaselineStore {
    /// Persist `baseline`, overwriting any previous record.
    fn save(&mut self, baseline: TimedMeasurement) -> Result<(), StoreError>;

    /// Recall the most recently saved baseline.
    ///
    /// Returns [`StoreError::NotFound`] if nothing has ever been saved.
    fn load(&mut self) -> Result<TimedMeasurement, StoreError>;
}

/// Encode a baseline record into its on-disk byte layout: little-endian
/// `eco2_ppm`, `tvoc_ppb`, a reserved padding word, then an 8-byte `time`.
pub fn encode_record(record: TimedMeasurement) -> [u8; RECORD_LEN] {
    let mut buf = [0u8; RECORD_LEN];
    buf[0..2].copy_from_slice(&record.measurement.eco2_ppm.to_le_bytes());
    buf[2..4].copy_from_slice(&record.measurement.tvoc_ppb.to_le_bytes());
    // buf[4..6] is reserved padding, left zeroed.
    buf[8..16].copy_from_slice(&record.time.to_le_bytes());
    buf
}

/// Decode a record previously produced by [`encode_record`].
pub fn decode_record(buf: &[u8; RECORD_LEN]) -> TimedMeasurement {
    let eco2_ppm = u16::from_le_bytes([buf[0], buf[1]]);
    let tvoc_ppb = u16::from_le_bytes([buf[2], buf[3]]);
    let mut time_bytes = [0u8; 8];
    time_bytes.copy_from_slice(&buf[8..16]);
    let time = i64::from_le_bytes(time_bytes);
    TimedMeasurement {
        measurement: Measurement { eco2_ppm, tvoc_ppb },
        time,
    }
}

/// Whether a baseline recorded at `record.time` is too old to trust at
/// `now`.
///
/// A baseline is expired if it is older than [`BASELINE_MAX_AGE_SECS`], or
/// if `record.time` is not in the past relative to `now`. The latter means
/// the device's clock was not yet synchronized when the record was
/// written, so its age cannot be trusted either way.
pub fn is_expired(record: &TimedMeasurement, now: i64) -> bool {
    now <= record.time || now - record.time > BASELINE_MAX_AGE_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tm(eco2: u16, tvoc: u16, time: i64) -> TimedMeasurement {
        TimedMeasurement {
            measurement: Measurement {
                eco2_ppm: eco2,
                tvoc_ppb: tvoc,
            },
            time,
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let cases = [
            tm(0, 0, 0),
            tm(400, 0, 1_700_000_000),
            tm(u16::MAX, u16::MAX, i64::MAX),
            tm(12345, 6789, -1),
        ];
        for record in cases {
            let encoded = encode_record(record);
            assert_eq!(decode_record(&encoded), record);
        }
    }

    #[test]
    fn padding_bytes_are_zeroed() {
        let encoded = encode_record(tm(0xFFFF, 0xFFFF, i64::MAX));
        assert_eq!(&encoded[4..8], &[0, 0, 0, 0]);
    }

    #[test]
    fn fresh_record_is_not_expired() {
        let record = tm(400, 0, 1_000_000);
        assert!(!is_expired(&record, 1_000_100));
    }

    #[test]
    fn record_older_than_seven_days_is_expired() {
        let record = tm(400, 0, 1_000_000);
        assert!(is_expired(
            &record,
            1_000_000 + BASELINE_MAX_AGE_SECS + 1
        ));
        assert!(!is_expired(
            &record,
            1_000_000 + BASELINE_MAX_AGE_SECS
        ));
    }

    #[test]
    fn record_from_an_unsynchronized_clock_is_expired() {
        // `now` at or before `record.time` means the clock had not been
        // synchronized yet when the record was written.
        let record = tm(400, 0, 1_000_000);
        assert!(is_expired(&record, 1_000_000));
        assert!(is_expired(&record, 999_999));
    }

    struct FakeStore {
        slot: Option<TimedMeasurement>,
    }

    impl BaselineStore for FakeStore {
        fn save(&mut self, baseline: TimedMeasurement) -> Result<(), StoreError> {
            self.slot = Some(baseline);
            Ok(())
        }

        fn load(&mut self) -> Result<TimedMeasurement, StoreError> {
            self.slot.ok_or(StoreError::NotFound)
        }
    }

    #[test]
    fn fake_store_round_trips_through_the_trait() {
        let mut store = FakeStore { slot: None };
        assert_eq!(store.load(), Err(StoreError::NotFound));
        let record = tm(450, 12, 1_700_000_000);
        store.save(record).unwrap();
        assert_eq!(store.load(), Ok(record));
    }
}
