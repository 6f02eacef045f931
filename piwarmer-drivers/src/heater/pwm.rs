//! PWM heater output
//!
//! The heater hangs off a motor driver chip: one GPIO enables the output
//! stage, a PWM channel sets how much of each period current flows.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use piwarmer_core::traits::{ActuatorError, HeaterOutput};

/// Heater driven through an enable line and a PWM channel
///
/// The enable line can be configured as active-high (default) or
/// active-low.
pub struct PwmHeater<EN, PWM> {
    enable_pin: EN,
    pwm: PWM,
    /// If true, enabled = pin LOW
    inverted: bool,
    /// Current logical state
    enabled: bool,
    /// Last duty cycle applied (%)
    duty_cycle: f32,
}

impl<EN: OutputPin, PWM: SetDutyCycle> PwmHeater<EN, PWM> {
    /// Create a new heater output, disabled at zero duty
    ///
    /// # Arguments
    /// - `enable_pin`: GPIO driving the driver chip's enable input
    /// - `pwm`: PWM channel driving the heater input
    /// - `inverted`: If true, the output stage is enabled when the pin is LOW
    pub fn new(enable_pin: EN, pwm: PWM, inverted: bool) -> Result<Self, ActuatorError> {
        let mut heater = Self {
            enable_pin,
            pwm,
            inverted,
            enabled: true,
            duty_cycle: 0.0,
        };
        // Ensure heater starts off
        heater.disable()?;
        Ok(heater)
    }

    /// Last duty cycle applied (%)
    pub fn duty_cycle(&self) -> f32 {
        self.duty_cycle
    }

    /// Release the pins
    pub fn release(self) -> (EN, PWM) {
        (self.enable_pin, self.pwm)
    }

    fn drive_enable(&mut self, enabled: bool) -> Result<(), ActuatorError> {
        let result = if enabled != self.inverted {
            // Normal: enabled=true, inverted=false → high
            // Inverted: enabled=true, inverted=true → low
            self.enable_pin.set_high()
        } else {
            self.enable_pin.set_low()
        };
        result.map_err(|_| ActuatorError::Gpio)
    }

    fn drive_pwm(&mut self, percent: f32) -> Result<(), ActuatorError> {
        let max = self.pwm.max_duty_cycle();
        let duty = (percent / 100.0 * f32::from(max) + 0.5) as u16;
        self.pwm
            .set_duty_cycle(duty.min(max))
            .map_err(|_| ActuatorError::Pwm)?;
        self.duty_cycle = percent;
        Ok(())
    }
}

impl<EN: OutputPin, PWM: SetDutyCycle> HeaterOutput for PwmHeater<EN, PWM> {
    fn enable(&mut self) -> Result<(), ActuatorError> {
        self.drive_enable(true)?;
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), ActuatorError> {
        // Cut the output stage first; zero the PWM even if that failed
        let gpio = self.drive_enable(false);
        let pwm = self.drive_pwm(0.0);
        gpio?;
        self.enabled = false;
        pwm
    }

    fn set_duty_cycle(&mut self, percent: f32) -> Result<(), ActuatorError> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(ActuatorError::InvalidDutyCycle);
        }
        self.drive_pwm(percent)
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
