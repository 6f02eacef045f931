//! Raspberry Pi backend
//!
//! Heater: motor driver enable line on a GPIO plus a hardware PWM channel.
//! Probe: MAX31855 on SPI, or the legacy MCP3221 on I2C.

use std::convert::Infallible;

use log::info;
use piwarmer_drivers::heater::PwmHeater;
use piwarmer_drivers::sensor::{Max31855, Mcp3221Probe, Thermometer};
use rppal::gpio::Gpio;
use rppal::hal::Delay;
use rppal::i2c::I2c;
use rppal::pwm::{Channel, Polarity, Pwm};
use rppal::spi::{Bus, Mode, SimpleHalSpiDevice, SlaveSelect, Spi};

use crate::config::types::{HardwareConfig, ProbeKind};
use crate::config::DaemonConfig;
use crate::error::DaemonError;

pub fn start(config: &DaemonConfig) -> Result<Infallible, DaemonError> {
    let hw = &config.hardware;

    let enable = Gpio::new()?.get(hw.enable_pin)?;
    let enable = if hw.enable_inverted {
        enable.into_output_high()
    } else {
        enable.into_output_low()
    };
    let pwm = Pwm::with_frequency(
        pwm_channel(hw)?,
        hw.pwm_frequency_hz,
        0.0,
        Polarity::Normal,
        true,
    )?;
    let heater = PwmHeater::new(enable, pwm, hw.enable_inverted)?;
    info!(
        "Heater: GPIO {} enable, PWM{} at {} Hz",
        hw.enable_pin, hw.pwm_channel, hw.pwm_frequency_hz
    );

    match hw.probe {
        ProbeKind::Max31855 => {
            let spi = Spi::new(spi_bus(hw)?, slave_select(hw)?, hw.spi_clock_hz, Mode::Mode0)?;
            let probe = Max31855::new(SimpleHalSpiDevice::new(spi));
            info!("Probe: MAX31855 on SPI{}.{}", hw.spi_bus, hw.spi_slave_select);
            let sensor = Thermometer::new(probe, Delay::new(), config.sensor);
            crate::serve(sensor, heater, config)
        }
        ProbeKind::Mcp3221 => {
            let address = u8::try_from(hw.i2c_address).map_err(|_| DaemonError::ConfigValue {
                field: "hardware.i2c_address",
                reason: "must be a 7-bit address".into(),
            })?;
            let probe = Mcp3221Probe::with_address(I2c::new()?, address);
            info!("Probe: MCP3221 at I2C {address:#04x}");
            let sensor = Thermometer::new(probe, Delay::new(), config.sensor);
            crate::serve(sensor, heater, config)
        }
    }
}

fn unsupported(field: &'static str, value: u8) -> DaemonError {
    DaemonError::ConfigValue {
        field,
        reason: format!("{value} is not available on this board"),
    }
}

fn pwm_channel(hw: &HardwareConfig) -> Result<Channel, DaemonError> {
    match hw.pwm_channel {
        0 => Ok(Channel::Pwm0),
        1 => Ok(Channel::Pwm1),
        n => Err(unsupported("hardware.pwm_channel", n)),
    }
}

fn spi_bus(hw: &HardwareConfig) -> Result<Bus, DaemonError> {
    match hw.spi_bus {
        0 => Ok(Bus::Spi0),
        1 => Ok(Bus::Spi1),
        2 => Ok(Bus::Spi2),
        n => Err(unsupported("hardware.spi_bus", n)),
    }
}

fn slave_select(hw: &HardwareConfig) -> Result<SlaveSelect, DaemonError> {
    match hw.spi_slave_select {
        0 => Ok(SlaveSelect::Ss0),
        1 => Ok(SlaveSelect::Ss1),
        2 => Ok(SlaveSelect::Ss2),
        n => Err(unsupported("hardware.spi_slave_select", n)),
    }
}
