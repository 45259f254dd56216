//! Thin, typed wrappers around [`I2cTransport::execute`] for each SGP30
//! command.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::bus::I2cTransport;
use crate::command::Command;
use crate::error::TransportError;
use crate::measurement::Measurement;

/// The SGP30's fixed 7-bit I²C address.
pub const SGP30_I2C_ADDRESS: u8 = 0x58;

/// Driver for a single SGP30 device, built on top of an [`I2cTransport`].
///
/// Every method here is a thin wrapper: it supplies the word counts and
/// delays `Command` already knows about, then decodes the response words
/// `execute` already CRC-checked.
pub struct Sgp30Driver<'bus, I2C, D> {
    transport: I2cTransport<'bus, I2C, D>,
}

impl<'bus, I2C, D> Sgp30Driver<'bus, I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Wrap a transport as a driver.
    pub fn new(transport: I2cTransport<'bus, I2C, D>) -> Self {
        Self { transport }
    }

    fn exec(
        &mut self,
        command: Command,
        tx_words: &[u16],
    ) -> Result<crate::bus::ResponseWords, TransportError<I2C::Error>> {
        self.transport.execute(
            command,
            tx_words,
            command.write_delay_ms(),
            command.rx_words(),
            command.read_delay_ms(),
        )
    }

    /// Start the sensor's dynamic-baseline air quality algorithm.
    ///
    /// Must be called once before the first [`Self::measure_air_quality`]
    /// call and again after every power cycle.
    pub fn init_air_quality(&mut self) -> Result<(), TransportError<I2C::Error>> {
        self.exec(Command::InitAirQuality, &[])?;
        Ok(())
    }

    /// Read the current `(eco2, tvoc)` measurement.
    ///
    /// For the first 15 s after [`Self::init_air_quality`], the sensor
    /// always reports [`Measurement::WARMUP`].
    pub fn measure_air_quality(&mut self) -> Result<Measurement, TransportError<I2C::Error>> {
        let words = self.exec(Command::MeasureAirQuality, &[])?;
        Ok(Measurement {
            eco2_ppm: words[0],
            tvoc_ppb: words[1],
        })
    }

    /// Read the sensor's current internal baseline.
    pub fn get_baseline(&mut self) -> Result<Measurement, TransportError<I2C::Error>> {
        let words = self.exec(Command::GetBaseline, &[])?;
        Ok(Measurement {
            eco2_ppm: words[0],
            tvoc_ppb: words[1],
        })
    }

    /// Seed the sensor's internal baseline.
    ///
    /// Word order on the wire is `(eco2, tvoc)`, matching the order
    /// [`Self::get_baseline`] returns them in.
    pub fn set_baseline(
        &mut self,
        baseline: Measurement,
    ) -> Result<(), TransportError<I2C::Error>> {
        self.exec(
            Command::SetBaseline,
            &[baseline.eco2_ppm, baseline.tvoc_ppb],
        )?;
        Ok(())
    }

    /// Read the sensor's 48-bit serial number.
    pub fn get_serial_id(&mut self) -> Result<[u16; 3], TransportError<I2C::Error>> {
        let words = self.exec(Command::GetSerialId, &[])?;
        Ok([words[0], words[1], words[2]])
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    use super::*;
    use crate::bus::BusMutex;

    fn driver(
        bus: &BusMutex<I2cMock>,
    ) -> Sgp30Driver<'_, I2cMock, NoopDelay> {
        Sgp30Driver::new(I2cTransport::new(bus, SGP30_I2C_ADDRESS, NoopDelay))
    }

    #[test]
    fn init_air_quality_sends_opcode_only() {
        let expectations = [Transaction::write(SGP30_I2C_ADDRESS, vec![0x20, 0x03])];
        let mock = I2cMock::new(&expectations);
        let bus = BusMutex::new(mock);
        driver(&bus).init_air_quality().unwrap();
        bus.into_inner().done();
    }

    #[test]
    fn measure_air_quality_decodes_eco2_then_tvoc() {
        let expectations = [
            Transaction::write(SGP30_I2C_ADDRESS, vec![0x20, 0x08]),
            Transaction::read(
                SGP30_I2C_ADDRESS,
                vec![0x01, 0x90, 0x4C, 0x00, 0x14, 0x06],
            ),
        ];
        let mock = I2cMock::new(&expectations);
        let bus = BusMutex::new(mock);
        let m = driver(&bus).measure_air_quality().unwrap();
        assert_eq!(m.eco2_ppm, 400);
        assert_eq!(m.tvoc_ppb, 20);
        bus.into_inner().done();
    }

    #[test]
    fn set_baseline_writes_eco2_before_tvoc() {
        let expectations = [Transaction::write(
            SGP30_I2C_ADDRESS,
            vec![0x20, 0x1E, 0x01, 0x90, 0x4C, 0x00, 0x14, 0x06],
        )];
        let mock = I2cMock::new(&expectations);
        let bus = BusMutex::new(mock);
        driver(&bus)
            .set_baseline(Measurement {
                eco2_ppm: 400,
                tvoc_ppb: 20,
            })
            .unwrap();
        bus.into_inner().done();
    }

    #[test]
    fn get_serial_id_decodes_three_words() {
        let expectations = [
            Transaction::write(SGP30_I2C_ADDRESS, vec![0x36, 0x82]),
            Transaction::read(
                SGP30_I2C_ADDRESS,
                vec![
                    0x00, 0x01, 0xB0, 0x00, 0x02, 0xE3, 0x00, 0x03, 0xD2,
                ],
            ),
        ];
        let mock = I2cMock::new(&expectations);
        let bus = BusMutex::new(mock);
        let serial = driver(&bus).get_serial_id().unwrap();
        assert_eq!(serial, [0x0001, 0x0002, 0x0003]);
        bus.into_inner().done();
    }
}
