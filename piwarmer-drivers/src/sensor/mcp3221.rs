//! I²C temperature probe on an MCP3221 ADC
//!
//! The older board revision reads an analog probe through a 12-bit MCP3221
//! at address `0x4D`. The probe's output scales so that the raw count
//! divided by five is degrees Celsius.

use embedded_hal::i2c::I2c;
use piwarmer_core::traits::{SensorError, TemperatureSensor};

/// Default MCP3221 address (A5 variant)
pub const DEFAULT_ADDRESS: u8 = 0x4D;

/// Raw counts per °C
const COUNTS_PER_DEGREE: f32 = 5.0;

/// Analog probe behind an MCP3221
pub struct Mcp3221Probe<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Mcp3221Probe<I2C> {
    /// Create a probe at [`DEFAULT_ADDRESS`]
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Read the raw 12-bit conversion
    pub fn read_raw(&mut self) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .read(self.address, &mut buf)
            .map_err(|_| SensorError::Bus)?;
        // Upper nibble of the first byte is always zero
        Ok((u16::from(buf[0] & 0x0F) << 8) | u16::from(buf[1]))
    }

    /// Release the I²C bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> TemperatureSensor for Mcp3221Probe<I2C> {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        self.read_raw().map(|raw| f32::from(raw) / COUNTS_PER_DEGREE)
    }
}
