//! Heater and temperature sensor traits

use core::fmt;

/// Errors that can occur with temperature sensing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Bus transfer to the sensor failed
    Bus,
    /// Thermocouple disconnected (open circuit)
    OpenCircuit,
    /// Thermocouple shorted to ground
    ShortToGround,
    /// Thermocouple shorted to supply
    ShortToVcc,
    /// Reading is NaN or below the believable minimum
    Implausible,
    /// No believable reading within the attempt limit
    Timeout,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SensorError::Bus => "sensor bus transfer failed",
            SensorError::OpenCircuit => "thermocouple open circuit",
            SensorError::ShortToGround => "thermocouple shorted to ground",
            SensorError::ShortToVcc => "thermocouple shorted to VCC",
            SensorError::Implausible => "implausible temperature reading",
            SensorError::Timeout => "no believable temperature reading",
        })
    }
}

/// Trait for temperature sensors
///
/// Implementations cover both raw probes (thermocouple amplifier, I²C
/// probe) and filtered thermometers wrapping them.
pub trait TemperatureSensor {
    /// Read the current temperature in degrees Celsius
    ///
    /// May block while the hardware converts or the caller retries.
    /// Takes `&mut self` because bus reads require mutable access.
    fn read_temperature(&mut self) -> Result<f32, SensorError>;
}

impl<T: TemperatureSensor + ?Sized> TemperatureSensor for &mut T {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        (**self).read_temperature()
    }
}

/// Errors that can occur driving the heater
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorError {
    /// Enable line could not be driven
    Gpio,
    /// PWM channel rejected the duty cycle
    Pwm,
    /// Requested duty cycle outside 0..=100 %
    InvalidDutyCycle,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActuatorError::Gpio => "heater enable line failed",
            ActuatorError::Pwm => "heater PWM channel failed",
            ActuatorError::InvalidDutyCycle => "duty cycle outside 0-100 %",
        })
    }
}

/// Trait for heater output control
///
/// The heater is driven by a motor driver chip: an enable line plus a PWM
/// input. Disabled means no current flows whatever the duty cycle.
pub trait HeaterOutput {
    /// Power the driver stage
    fn enable(&mut self) -> Result<(), ActuatorError>;

    /// Cut power to the heater
    ///
    /// Must be safe to call at any time, any number of times.
    fn disable(&mut self) -> Result<(), ActuatorError>;

    /// Set the share of each PWM period the heater is on (%)
    fn set_duty_cycle(&mut self, percent: f32) -> Result<(), ActuatorError>;

    /// Check if the driver stage is powered
    fn is_enabled(&self) -> bool;
}

impl<T: HeaterOutput + ?Sized> HeaterOutput for &mut T {
    fn enable(&mut self) -> Result<(), ActuatorError> {
        (**self).enable()
    }

    fn disable(&mut self) -> Result<(), ActuatorError> {
        (**self).disable()
    }

    fn set_duty_cycle(&mut self, percent: f32) -> Result<(), ActuatorError> {
        (**self).set_duty_cycle(percent)
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}
