//! Per-run bookkeeping

/// Values observed during the current RUN cycle
///
/// Reset at PRERUN and discarded at SHUTDOWN.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunState {
    /// Seconds since the run started
    pub elapsed_s: f64,
    /// Segment index being executed, if any
    pub current_step: Option<usize>,
    /// Latest believable reading (°C)
    pub current_temperature: Option<f32>,
    /// Latest set point (°C)
    pub desired_temperature: Option<f32>,
    /// Duty cycle last sent to the heater (%)
    pub duty_cycle: f32,
    /// Completed RUN cycles
    pub cycles: u64,
}

impl RunState {
    /// Record a finished cycle
    pub fn record_cycle(
        &mut self,
        elapsed_s: f64,
        current_step: Option<usize>,
        current: f32,
        desired: f32,
        duty_cycle: f32,
    ) {
        self.elapsed_s = elapsed_s;
        self.current_step = current_step;
        self.current_temperature = Some(current);
        self.desired_temperature = Some(desired);
        self.duty_cycle = duty_cycle;
        self.cycles += 1;
    }
}
