//! MAX31855 thermocouple amplifier
//!
//! Read-only SPI device that clocks out one 32-bit frame per conversion:
//!
//! | Bits  | Meaning                                   |
//! |-------|-------------------------------------------|
//! | 31-18 | Thermocouple temperature, signed, 0.25 °C |
//! | 16    | Fault                                     |
//! | 15-4  | Cold junction temperature, 0.0625 °C      |
//! | 2     | Short to VCC                              |
//! | 1     | Short to GND                              |
//! | 0     | Open circuit                              |

use embedded_hal::spi::SpiDevice;
use piwarmer_core::traits::{SensorError, TemperatureSensor};

const FAULT: u32 = 1 << 16;
const SHORT_TO_VCC: u32 = 1 << 2;
const SHORT_TO_GND: u32 = 1 << 1;
const OPEN_CIRCUIT: u32 = 1 << 0;

/// One decoded frame
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Max31855Reading {
    /// Hot junction (°C)
    pub thermocouple: f32,
    /// Cold junction, i.e. the chip itself (°C)
    pub internal: f32,
}

/// MAX31855 on an SPI bus
pub struct Max31855<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> Max31855<SPI> {
    /// Create a new driver
    ///
    /// The device must be configured for SPI mode 0, at most 5 MHz.
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Read and decode one frame
    pub fn read_frame(&mut self) -> Result<Max31855Reading, SensorError> {
        let mut buf = [0u8; 4];
        self.spi.read(&mut buf).map_err(|_| SensorError::Bus)?;
        decode(u32::from_be_bytes(buf))
    }

    /// Release the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> TemperatureSensor for Max31855<SPI> {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        self.read_frame().map(|r| r.thermocouple)
    }
}

/// Decode a raw frame
pub fn decode(raw: u32) -> Result<Max31855Reading, SensorError> {
    if raw & FAULT != 0 {
        return Err(if raw & OPEN_CIRCUIT != 0 {
            SensorError::OpenCircuit
        } else if raw & SHORT_TO_GND != 0 {
            SensorError::ShortToGround
        } else if raw & SHORT_TO_VCC != 0 {
            SensorError::ShortToVcc
        } else {
            SensorError::Bus
        });
    }

    // Arithmetic shifts sign-extend the 14- and 12-bit fields
    let thermocouple = (raw as i32) >> 18;
    let internal = ((raw as i32) << 16) >> 20;

    Ok(Max31855Reading {
        thermocouple: thermocouple as f32 * 0.25,
        internal: internal as f32 * 0.0625,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::spi::{ErrorType, Operation};

    /// Mock SPI device returning a fixed frame
    struct MockSpi {
        frame: [u8; 4],
    }

    impl ErrorType for MockSpi {
        type Error = Infallible;
    }

    impl SpiDevice for MockSpi {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
            for op in operations {
                if let Operation::Read(buf) = op {
                    buf.copy_from_slice(&self.frame[..buf.len()]);
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_datasheet_values() {
        // Examples from the datasheet's temperature data table
        assert_eq!(decode(0x6400_0000).unwrap().thermocouple, 1600.0);
        assert_eq!(decode(0x0190_0000).unwrap().thermocouple, 25.0);
        assert_eq!(decode(0x0000_0000).unwrap().thermocouple, 0.0);
        assert_eq!(decode(0xFFFC_0000).unwrap().thermocouple, -0.25);
        assert_eq!(decode(0xF060_0000).unwrap().thermocouple, -250.0);
    }

    #[test]
    fn test_internal_temperature() {
        // 25 °C cold junction: 0x190 in bits 15-4
        assert_eq!(decode(0x0000_1900).unwrap().internal, 25.0);
        // -0.0625 °C
        assert_eq!(decode(0x0000_FFF0).unwrap().internal, -0.0625);
    }

    #[test]
    fn test_faults() {
        assert_eq!(decode(FAULT | OPEN_CIRCUIT), Err(SensorError::OpenCircuit));
        assert_eq!(decode(FAULT | SHORT_TO_GND), Err(SensorError::ShortToGround));
        assert_eq!(decode(FAULT | SHORT_TO_VCC), Err(SensorError::ShortToVcc));
        // Fault bits without the fault flag are ignored
        assert!(decode(OPEN_CIRCUIT).is_ok());
    }

    #[test]
    fn test_reads_over_spi() {
        let mut sensor = Max31855::new(MockSpi {
            frame: 0x0190_1900u32.to_be_bytes(),
        });
        assert_eq!(sensor.read_temperature().unwrap(), 25.0);
        assert_eq!(sensor.read_frame().unwrap().internal, 25.0);
    }
}
