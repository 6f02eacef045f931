//! Control loop
//!
//! Drives the `BOOT → LISTEN → PRERUN → RUN → SHUTDOWN → LISTEN` cycle.
//! Each call to [`Controller::step`] does the work of the current state and
//! applies the resulting event to the state machine; [`Controller::tick`]
//! adds the wait between polls and control cycles.
//!
//! Every way out of PRERUN and RUN goes through SHUTDOWN, which turns the
//! heater off before anything else and does not let a failure in one
//! clean-up action skip the next.

use std::time::Duration;

use log::{debug, error, info, warn};
use piwarmer_core::config::{ControlConfig, PidConfig};
use piwarmer_core::pid::{PiController, MAX_DUTY_CYCLE};
use piwarmer_core::program::{
    current_step, desired_temperature, minutes_left, seconds_left, upcoming_steps,
    DesiredTemperature, Label, Program,
};
use piwarmer_core::safety::{Isolated, IsolationReport, SafetyMonitor, SafetyStatus};
use piwarmer_core::state::{Event, FaultKind, RunState, State};
use piwarmer_core::traits::{
    HeaterOutput, KeyValueStore, Progress, RunStore, StoreError, TelemetryRecord, TelemetrySink,
    TemperatureSensor,
};

use crate::clock::Clock;
use crate::error::DaemonError;

/// Run key and history field format (local start time)
pub const RUN_KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DISABLE_HEATER: &str = "disable heater";
const CLEAR_RUN_STATE: &str = "clear run state";

/// State of the run in progress
struct ActiveRun {
    program: Program,
    pid: PiController,
    /// Start timestamp, keys telemetry and history
    key: String,
    started: Duration,
}

/// Heater control loop
pub struct Controller<S, H, K, T, C>
where
    S: TemperatureSensor,
    H: HeaterOutput,
    K: KeyValueStore,
    T: TelemetrySink,
    C: Clock,
{
    state: State,
    sensor: S,
    heater: H,
    store: K,
    telemetry: T,
    clock: C,
    control: ControlConfig,
    pid_config: PidConfig,
    safety: SafetyMonitor,
    active_run: Option<ActiveRun>,
    run: RunState,
}

impl<S, H, K, T, C> Controller<S, H, K, T, C>
where
    S: TemperatureSensor,
    H: HeaterOutput,
    K: KeyValueStore,
    T: TelemetrySink,
    C: Clock,
{
    pub fn new(
        sensor: S,
        heater: H,
        store: K,
        telemetry: T,
        clock: C,
        control: ControlConfig,
        pid_config: PidConfig,
    ) -> Self {
        Self {
            state: State::Boot,
            sensor,
            heater,
            store,
            telemetry,
            clock,
            safety: SafetyMonitor::new(control.max_temperature),
            control,
            pid_config,
            active_run: None,
            run: RunState::default(),
        }
    }

    /// Run forever
    pub fn run(&mut self) -> ! {
        info!(
            "Control loop starting, {} ms cycle",
            self.control.poll_interval_ms
        );
        loop {
            self.tick();
        }
    }

    /// One [`step`](Self::step), then wait out the rest of the interval
    ///
    /// Only LISTEN polls and RUN cycles wait; state changes proceed at once.
    pub fn tick(&mut self) -> State {
        let started = self.clock.now();
        let before = self.state;
        let after = self.step();

        if after == before && matches!(before, State::Listen | State::Run) {
            let interval = Duration::from_millis(self.control.poll_interval_ms.into());
            let spent = self.clock.now().saturating_sub(started);
            match interval.checked_sub(spent) {
                Some(rest) if !rest.is_zero() => self.clock.sleep(rest),
                _ => debug!("Cycle overran: {} ms", spent.as_millis()),
            }
        }
        after
    }

    /// Do the current state's work and apply the resulting event
    pub fn step(&mut self) -> State {
        let event = match self.state {
            State::Boot => Some(self.boot()),
            State::Listen => self.listen(),
            State::PreRun => Some(self.prerun()),
            State::Run => self.run_cycle(),
            State::Shutdown => Some(self.shutdown()),
        };

        if let Some(event) = event {
            let next = self.state.transition(event);
            if next != self.state {
                info!("{} -> {} ({:?})", self.state, next, event);
            }
            self.state = next;
        }
        self.state
    }

    fn boot(&mut self) -> Event {
        let report = self.make_safe();
        if report.failed(DISABLE_HEATER) {
            return Event::FaultDetected(FaultKind::Actuator);
        }
        Event::BootComplete
    }

    fn listen(&mut self) -> Option<Event> {
        if !self.state.heater_allowed() && self.heater.is_enabled() {
            error!("Heater enabled while idle, disabling");
            if let Err(e) = self.heater.disable() {
                error!("DANGER: heater did not shut down: {e}");
            }
        }

        match self.sensor.read_temperature() {
            Ok(temperature) => {
                if let Err(e) = self.store.publish_current_temp(temperature) {
                    warn!("Cannot publish temperature: {e}");
                }
            }
            Err(e) => warn!("Idle sensor read failed: {e}"),
        }

        match self.store.is_active() {
            Ok(true) => Some(Event::Activated),
            Ok(false) => {
                debug!("Inactive");
                None
            }
            Err(e) => {
                warn!("Cannot read `active`: {e}");
                None
            }
        }
    }

    fn prerun(&mut self) -> Event {
        match self.store.is_active() {
            Ok(true) => {}
            Ok(false) => return Event::Stopped,
            Err(e) => return self.fault(FaultKind::Store, e.into()),
        }

        let json = match self.store.program() {
            Ok(json) => json,
            Err(StoreError::MissingProgram) => {
                return self.fault(FaultKind::Program, StoreError::MissingProgram.into())
            }
            Err(e) => return self.fault(FaultKind::Store, e.into()),
        };
        let program = match Program::from_json(&json) {
            Ok(program) => program,
            Err(e) => return self.fault(FaultKind::Program, e.into()),
        };

        let key = self.clock.wall_clock().format(RUN_KEY_FORMAT).to_string();
        if let Err(e) = self.telemetry.begin_run(&key) {
            warn!("Run {key} has no telemetry: {e}");
        }

        if let Err(e) = self
            .heater
            .set_duty_cycle(0.0)
            .and_then(|()| self.heater.enable())
        {
            return self.fault(FaultKind::Actuator, e.into());
        }

        info!(
            "Run {key}: {} segments, {} s{}",
            program.segments().len(),
            program.total_duration_s(),
            if program.has_hold() { " then hold" } else { "" }
        );
        self.safety.reset();
        self.run = RunState::default();
        self.active_run = Some(ActiveRun {
            program,
            pid: PiController::new(self.pid_config),
            key,
            started: self.clock.now(),
        });
        Event::RunStarted
    }

    fn run_cycle(&mut self) -> Option<Event> {
        match self.store.is_active() {
            Ok(true) => {}
            Ok(false) => {
                info!("Run stopped");
                return Some(Event::Stopped);
            }
            Err(e) => return Some(self.fault(FaultKind::Store, e.into())),
        }

        let Some(run) = self.active_run.as_mut() else {
            error!("RUN without a compiled program");
            return Some(Event::FaultDetected(FaultKind::Program));
        };

        let elapsed_s = self.clock.now().saturating_sub(run.started).as_secs_f64();
        let desired = match desired_temperature(&run.program, elapsed_s) {
            DesiredTemperature::Temperature(t) => t,
            DesiredTemperature::ProgramComplete => {
                info!("Program complete after {elapsed_s:.0} s");
                return Some(Event::ProgramFinished);
            }
        };

        let current = match self.sensor.read_temperature() {
            Ok(t) => t,
            Err(e) => return Some(self.fault(FaultKind::Sensor, e.into())),
        };

        let requested = match run
            .pid
            .update_set_point(desired)
            .and_then(|()| run.pid.update(current))
        {
            Ok(duty) => duty,
            Err(e) => return Some(self.fault(FaultKind::Sensor, e.into())),
        };
        let terms = run.pid.terms();

        let scaled = (requested * self.control.output_scale).clamp(0.0, MAX_DUTY_CYCLE);
        let previous = self.safety.status();
        let status = self.safety.update_temperature(current);
        if status != previous {
            match status {
                SafetyStatus::OverTemperature => warn!(
                    "{current:.2} °C at or above {:.2} °C, heater held at 0 %",
                    self.safety.max_temperature()
                ),
                SafetyStatus::Ok => info!("Back below {:.2} °C", self.safety.max_temperature()),
            }
        }
        let duty = self.safety.limit_duty_cycle(scaled);

        debug!(
            "t={elapsed_s:.1}s current={current:.2} desired={desired:.2} P={:.2} I={:.2} duty={duty:.1}%",
            terms.proportional, terms.integral
        );

        if let Err(e) = self.telemetry.record(&TelemetryRecord {
            current_temperature: current,
            desired_temperature: desired,
            duty_cycle: duty,
        }) {
            warn!("Telemetry record dropped: {e}");
        }

        if let Err(e) = self.heater.set_duty_cycle(duty) {
            return Some(self.fault(FaultKind::Actuator, e.into()));
        }

        let step = current_step(&run.program, elapsed_s);
        let label: Label = step
            .map(|i| run.program.segments()[i].label())
            .unwrap_or_default();
        let upcoming = upcoming_steps(
            &run.program,
            elapsed_s,
            usize::from(self.control.upcoming_steps),
        );
        let progress = Progress {
            desired_temperature: desired,
            current_step: &label,
            seconds_left: seconds_left(&run.program, elapsed_s),
            minutes_left: minutes_left(&run.program, elapsed_s),
            upcoming: &upcoming,
        };

        let store = &mut self.store;
        let report = Isolated::new()
            .attempt("publish temperature", || store.publish_current_temp(current))
            .attempt("publish progress", || store.publish_progress(&progress))
            .attempt("append history", || {
                store.append_history(&run.key, elapsed_s, current)
            })
            .finish();
        for failure in report.failures() {
            warn!("Cannot {}: {}", failure.action, failure.error);
        }

        self.run.record_cycle(elapsed_s, step, current, desired, duty);
        None
    }

    fn shutdown(&mut self) -> Event {
        self.make_safe();
        self.telemetry.end_run();
        if self.active_run.take().is_some() {
            info!(
                "Run ended after {} cycles ({:.0} s)",
                self.run.cycles, self.run.elapsed_s
            );
        }
        Event::ShutdownComplete
    }

    /// Heater off, then run keys cleared, each attempted regardless of the other
    fn make_safe(&mut self) -> IsolationReport<DaemonError> {
        let heater = &mut self.heater;
        let store = &mut self.store;
        let report = Isolated::new()
            .attempt(DISABLE_HEATER, || {
                heater.disable().map_err(DaemonError::from)
            })
            .attempt(CLEAR_RUN_STATE, || {
                store.clear_run_state().map_err(DaemonError::from)
            })
            .finish();

        for failure in report.failures() {
            if failure.action == DISABLE_HEATER {
                error!("DANGER: heater did not shut down: {}", failure.error);
            } else {
                warn!("Cannot {}: {}", failure.action, failure.error);
            }
        }
        if report.is_clean() {
            debug!("Heater off, run state cleared");
        }
        report
    }

    fn fault(&self, kind: FaultKind, e: DaemonError) -> Event {
        error!("{} fault in {}: {e}", kind, self.state);
        Event::FaultDetected(kind)
    }
}

impl<S, H, K, T, C> Drop for Controller<S, H, K, T, C>
where
    S: TemperatureSensor,
    H: HeaterOutput,
    K: KeyValueStore,
    T: TelemetrySink,
    C: Clock,
{
    fn drop(&mut self) {
        if let Err(e) = self.heater.disable() {
            error!("DANGER: heater did not shut down: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::tests::ManualClock;
    use piwarmer_core::traits::{ActuatorError, SensorError, TelemetryError};
    use std::cell::{Cell, RefCell};
    use std::collections::{BTreeMap, VecDeque};
    use std::rc::Rc;

    /// Sensor returning scripted readings, then repeating the last one
    #[derive(Clone, Default)]
    struct MockSensor {
        readings: Rc<RefCell<VecDeque<Result<f32, SensorError>>>>,
        last: Rc<Cell<f32>>,
        /// Time each read takes on the test clock
        clock: ManualClock,
        read_time: Rc<Cell<Duration>>,
    }

    impl MockSensor {
        fn steady(temperature: f32) -> Self {
            let sensor = Self::default();
            sensor.last.set(temperature);
            sensor
        }

        fn push(&self, reading: Result<f32, SensorError>) {
            self.readings.borrow_mut().push_back(reading);
        }
    }

    impl TemperatureSensor for MockSensor {
        fn read_temperature(&mut self) -> Result<f32, SensorError> {
            self.clock.advance(self.read_time.get());
            match self.readings.borrow_mut().pop_front() {
                Some(Ok(t)) => {
                    self.last.set(t);
                    Ok(t)
                }
                Some(Err(e)) => Err(e),
                None => Ok(self.last.get()),
            }
        }
    }

    #[derive(Clone, Default)]
    struct MockHeater {
        enabled: Rc<Cell<bool>>,
        duty: Rc<Cell<f32>>,
        duties: Rc<RefCell<Vec<f32>>>,
        disables: Rc<Cell<u32>>,
        fail_duty: Rc<Cell<bool>>,
        fail_enable: Rc<Cell<bool>>,
        fail_disable: Rc<Cell<bool>>,
    }

    impl HeaterOutput for MockHeater {
        fn enable(&mut self) -> Result<(), ActuatorError> {
            if self.fail_enable.get() {
                return Err(ActuatorError::Gpio);
            }
            self.enabled.set(true);
            Ok(())
        }

        fn disable(&mut self) -> Result<(), ActuatorError> {
            self.disables.set(self.disables.get() + 1);
            if self.fail_disable.get() {
                return Err(ActuatorError::Gpio);
            }
            self.enabled.set(false);
            Ok(())
        }

        fn set_duty_cycle(&mut self, percent: f32) -> Result<(), ActuatorError> {
            if self.fail_duty.get() {
                return Err(ActuatorError::Pwm);
            }
            self.duty.set(percent);
            self.duties.borrow_mut().push(percent);
            Ok(())
        }

        fn is_enabled(&self) -> bool {
            self.enabled.get()
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStore {
        values: Rc<RefCell<BTreeMap<String, String>>>,
        fail_deletes: Rc<Cell<bool>>,
        fail_sets: Rc<Cell<bool>>,
        fail_gets: Rc<Cell<bool>>,
    }

    impl MemoryStore {
        fn value(&self, key: &str) -> Option<String> {
            self.values.borrow().get(key).cloned()
        }

        fn insert(&self, key: &str, value: &str) {
            self.values
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
        }
    }

    impl KeyValueStore for MemoryStore {
        fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
            if self.fail_gets.get() {
                return Err(StoreError::Io);
            }
            Ok(self.value(key))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.fail_sets.get() {
                return Err(StoreError::Io);
            }
            self.insert(key, value);
            Ok(())
        }

        fn delete(&mut self, key: &str) -> Result<(), StoreError> {
            if self.fail_deletes.get() {
                return Err(StoreError::Io);
            }
            self.values.borrow_mut().remove(key);
            Ok(())
        }

        fn append_field(&mut self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
            if self.fail_sets.get() {
                return Err(StoreError::Io);
            }
            self.values
                .borrow_mut()
                .entry(format!("{key}/{field}"))
                .or_default()
                .push_str(value);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct MockTelemetry {
        runs: Rc<RefCell<Vec<String>>>,
        records: Rc<RefCell<Vec<TelemetryRecord>>>,
        open: Rc<Cell<bool>>,
        fail_writes: Rc<Cell<bool>>,
    }

    /// Sink that notes whether the heater was still on when the run closed
    #[derive(Clone)]
    struct HeaterWatchingTelemetry {
        heater: MockHeater,
        enabled_at_end: Rc<RefCell<Vec<bool>>>,
    }

    impl TelemetrySink for HeaterWatchingTelemetry {
        fn begin_run(&mut self, _run_key: &str) -> Result<(), TelemetryError> {
            Ok(())
        }

        fn record(&mut self, _record: &TelemetryRecord) -> Result<(), TelemetryError> {
            Ok(())
        }

        fn end_run(&mut self) {
            self.enabled_at_end
                .borrow_mut()
                .push(self.heater.is_enabled());
        }
    }

    impl TelemetrySink for MockTelemetry {
        fn begin_run(&mut self, run_key: &str) -> Result<(), TelemetryError> {
            self.runs.borrow_mut().push(run_key.to_string());
            self.open.set(true);
            Ok(())
        }

        fn record(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
            if self.fail_writes.get() {
                return Err(TelemetryError::Write);
            }
            self.records.borrow_mut().push(*record);
            Ok(())
        }

        fn end_run(&mut self) {
            self.open.set(false);
        }
    }

    type TestController =
        Controller<MockSensor, MockHeater, MemoryStore, MockTelemetry, ManualClock>;

    struct Rig {
        sensor: MockSensor,
        heater: MockHeater,
        store: MemoryStore,
        telemetry: MockTelemetry,
        clock: ManualClock,
    }

    const SHORT_PROGRAM: &str = r#"{"1":{"mode":"set","temperature":60,"duration":3}}"#;
    const HOLD_PROGRAM: &str = r#"{"1":{"mode":"set","temperature":80,"duration":300},"2":{"mode":"hold","temperature":37}}"#;

    fn rig_with(control: ControlConfig) -> (Rig, TestController) {
        let clock = ManualClock::default();
        let mut sensor = MockSensor::steady(25.0);
        sensor.clock = clock.clone();
        let rig = Rig {
            sensor,
            heater: MockHeater::default(),
            store: MemoryStore::default(),
            telemetry: MockTelemetry::default(),
            clock,
        };
        let controller = Controller::new(
            rig.sensor.clone(),
            rig.heater.clone(),
            rig.store.clone(),
            rig.telemetry.clone(),
            rig.clock.clone(),
            control,
            PidConfig::default(),
        );
        (rig, controller)
    }

    fn rig() -> (Rig, TestController) {
        rig_with(ControlConfig::default())
    }

    /// Boot and start `program`, leaving the controller in RUN
    fn start(rig: &Rig, controller: &mut TestController, program: &str) {
        assert_eq!(controller.step(), State::Listen);
        rig.store.insert("program", program);
        rig.store.insert("active", "1");
        assert_eq!(controller.step(), State::PreRun);
        assert_eq!(controller.step(), State::Run);
    }

    #[test]
    fn test_boot_clears_stale_state() {
        let (rig, mut controller) = rig();
        rig.store.insert("active", "1");
        rig.store.insert("current_temp", "50.00");
        rig.store.insert("program", SHORT_PROGRAM);

        assert_eq!(controller.step(), State::Listen);
        assert_eq!(rig.store.value("active"), None);
        assert_eq!(rig.store.value("current_temp"), None);
        // The program itself survives
        assert!(rig.store.value("program").is_some());
        assert_eq!(rig.heater.disables.get(), 1);
    }

    #[test]
    fn test_listen_publishes_temperature() {
        let (rig, mut controller) = rig();
        controller.step();

        rig.sensor.push(Ok(36.6));
        assert_eq!(controller.tick(), State::Listen);
        assert_eq!(rig.store.value("current_temp").as_deref(), Some("36.60"));
        assert_eq!(rig.clock.sleeps.get(), 1);
        assert_eq!(rig.clock.last_sleep.get(), Duration::from_secs(1));
    }

    #[test]
    fn test_listen_survives_sensor_failure() {
        let (rig, mut controller) = rig();
        controller.step();

        rig.sensor.push(Err(SensorError::Timeout));
        assert_eq!(controller.step(), State::Listen);
        assert_eq!(rig.store.value("current_temp"), None);
        assert!(!rig.heater.is_enabled());
    }

    #[test]
    fn test_listen_turns_off_stray_heater() {
        let (rig, mut controller) = rig();
        controller.step();

        rig.heater.enabled.set(true);
        assert_eq!(controller.step(), State::Listen);
        assert!(!rig.heater.is_enabled());
    }

    #[test]
    fn test_full_run_to_completion() {
        let (rig, mut controller) = rig();
        start(&rig, &mut controller, SHORT_PROGRAM);

        assert!(rig.heater.is_enabled());
        assert_eq!(rig.telemetry.runs.borrow().as_slice(), ["2024-05-01 12:00:00"]);

        // Cycles at 0, 1 and 2 s, then the program is over at 3 s
        for _ in 0..3 {
            assert_eq!(controller.tick(), State::Run);
        }
        assert_eq!(rig.telemetry.records.borrow().len(), 3);
        assert_eq!(rig.store.value("current_setting").as_deref(), Some("60.00"));
        assert_eq!(
            rig.store.value("current_step").as_deref(),
            Some("60.0°C for 00:00:03")
        );
        assert_eq!(rig.store.value("seconds_left").as_deref(), Some("1"));

        let history = rig.store.value("history/2024-05-01 12:00:00").unwrap();
        assert_eq!(history, "0.0\t25.00\n1.0\t25.00\n2.0\t25.00\n");

        assert_eq!(controller.tick(), State::Shutdown);
        assert_eq!(controller.tick(), State::Listen);
        assert!(!rig.heater.is_enabled());
        assert!(!rig.telemetry.open.get());
        assert_eq!(rig.store.value("active"), None);
        assert_eq!(rig.store.value("current_setting"), None);
    }

    #[test]
    fn test_heating_duty_reaches_heater() {
        let (rig, mut controller) = rig();
        start(&rig, &mut controller, HOLD_PROGRAM);

        controller.step();
        // 55 °C below set point saturates the controller
        assert_eq!(rig.heater.duty.get(), MAX_DUTY_CYCLE);
        let record = rig.telemetry.records.borrow()[0];
        assert_eq!(record.current_temperature, 25.0);
        assert_eq!(record.desired_temperature, 80.0);
        assert_eq!(record.duty_cycle, MAX_DUTY_CYCLE);
    }

    #[test]
    fn test_invalid_program_never_heats() {
        let (rig, mut controller) = rig();
        controller.step();
        rig.store
            .insert("program", r#"{"1":{"mode":"set","temperature":60,"duration":0}}"#);
        rig.store.insert("active", "1");

        assert_eq!(controller.step(), State::PreRun);
        assert_eq!(controller.step(), State::Shutdown);
        assert!(rig.heater.duties.borrow().is_empty());
        assert!(!rig.heater.is_enabled());

        assert_eq!(controller.step(), State::Listen);
        assert_eq!(rig.store.value("active"), None);
    }

    #[test]
    fn test_missing_program() {
        let (rig, mut controller) = rig();
        controller.step();
        rig.store.insert("active", "1");

        assert_eq!(controller.step(), State::PreRun);
        assert_eq!(controller.step(), State::Shutdown);
        assert!(!rig.heater.is_enabled());
    }

    #[test]
    fn test_stop_disables_heater_even_if_clear_fails() {
        let (rig, mut controller) = rig();
        start(&rig, &mut controller, HOLD_PROGRAM);
        controller.step();
        assert!(rig.heater.is_enabled());

        rig.store.insert("active", "0");
        rig.store.fail_deletes.set(true);

        assert_eq!(controller.step(), State::Shutdown);
        assert_eq!(controller.step(), State::Listen);
        assert!(!rig.heater.is_enabled());
        assert_eq!(rig.heater.disables.get(), 2);
    }

    #[test]
    fn test_heater_off_before_telemetry_closes() {
        let clock = ManualClock::default();
        let heater = MockHeater::default();
        let store = MemoryStore::default();
        let telemetry = HeaterWatchingTelemetry {
            heater: heater.clone(),
            enabled_at_end: Rc::default(),
        };
        let mut controller = Controller::new(
            MockSensor::steady(25.0),
            heater.clone(),
            store.clone(),
            telemetry.clone(),
            clock,
            ControlConfig::default(),
            PidConfig::default(),
        );

        assert_eq!(controller.step(), State::Listen);
        store.insert("program", HOLD_PROGRAM);
        store.insert("active", "1");
        assert_eq!(controller.step(), State::PreRun);
        assert_eq!(controller.step(), State::Run);
        assert_eq!(controller.step(), State::Run);
        assert!(heater.is_enabled());

        store.insert("active", "0");
        assert_eq!(controller.step(), State::Shutdown);
        assert_eq!(controller.step(), State::Listen);
        assert_eq!(telemetry.enabled_at_end.borrow().as_slice(), [false]);
    }

    #[test]
    fn test_shutdown_clears_state_when_heater_will_not_turn_off() {
        let (rig, mut controller) = rig();
        start(&rig, &mut controller, HOLD_PROGRAM);
        controller.step();
        assert!(rig.store.value("current_temp").is_some());

        rig.heater.fail_disable.set(true);
        rig.store.insert("active", "0");
        assert_eq!(controller.step(), State::Shutdown);
        assert_eq!(controller.step(), State::Listen);

        assert_eq!(rig.heater.disables.get(), 2);
        assert_eq!(rig.store.value("active"), None);
        assert_eq!(rig.store.value("current_temp"), None);
        assert_eq!(rig.store.value("current_setting"), None);
        assert!(!rig.telemetry.open.get());
    }

    #[test]
    fn test_boot_disable_failure_routes_through_shutdown() {
        let (rig, mut controller) = rig();
        rig.store.insert("active", "1");
        rig.heater.fail_disable.set(true);

        assert_eq!(controller.step(), State::Shutdown);
        assert_eq!(rig.store.value("active"), None);

        rig.heater.fail_disable.set(false);
        assert_eq!(controller.step(), State::Listen);
        assert!(!rig.heater.is_enabled());
        assert_eq!(rig.heater.disables.get(), 2);
    }

    #[test]
    fn test_enable_failure_ends_in_shutdown() {
        let (rig, mut controller) = rig();
        controller.step();
        rig.store.insert("program", HOLD_PROGRAM);
        rig.store.insert("active", "1");
        rig.heater.fail_enable.set(true);

        assert_eq!(controller.step(), State::PreRun);
        assert_eq!(controller.step(), State::Shutdown);
        assert!(!rig.heater.is_enabled());

        assert_eq!(controller.step(), State::Listen);
        assert!(!rig.heater.is_enabled());
        assert_eq!(rig.store.value("active"), None);
        assert!(rig.telemetry.records.borrow().is_empty());
    }

    #[test]
    fn test_sensor_fault_shuts_down() {
        let (rig, mut controller) = rig();
        start(&rig, &mut controller, HOLD_PROGRAM);

        rig.sensor.push(Err(SensorError::Timeout));
        assert_eq!(controller.step(), State::Shutdown);
        assert_eq!(controller.step(), State::Listen);
        assert!(!rig.heater.is_enabled());
    }

    #[test]
    fn test_actuator_fault_shuts_down() {
        let (rig, mut controller) = rig();
        start(&rig, &mut controller, HOLD_PROGRAM);

        rig.heater.fail_duty.set(true);
        assert_eq!(controller.step(), State::Shutdown);
        controller.step();
        assert!(!rig.heater.is_enabled());
    }

    #[test]
    fn test_store_read_fault_shuts_down() {
        let (rig, mut controller) = rig();
        start(&rig, &mut controller, HOLD_PROGRAM);

        rig.store.fail_gets.set(true);
        assert_eq!(controller.step(), State::Shutdown);
        controller.step();
        assert!(!rig.heater.is_enabled());
    }

    #[test]
    fn test_over_temperature_cuts_duty() {
        let (rig, mut controller) = rig_with(ControlConfig {
            max_temperature: 50.0,
            ..ControlConfig::default()
        });
        start(&rig, &mut controller, HOLD_PROGRAM);

        rig.sensor.push(Ok(10.0));
        controller.step();
        assert_eq!(rig.heater.duty.get(), MAX_DUTY_CYCLE);

        // Still 20 °C below the 80 °C set point, but past the ceiling
        rig.sensor.push(Ok(60.0));
        assert_eq!(controller.step(), State::Run);
        assert_eq!(rig.heater.duty.get(), 0.0);

        // The run goes on and recovers once it cools
        rig.sensor.push(Ok(45.0));
        controller.step();
        assert_eq!(rig.heater.duty.get(), MAX_DUTY_CYCLE);
    }

    #[test]
    fn test_output_scale() {
        let (rig, mut controller) = rig_with(ControlConfig {
            output_scale: 0.5,
            ..ControlConfig::default()
        });
        start(&rig, &mut controller, HOLD_PROGRAM);

        controller.step();
        assert_eq!(rig.heater.duty.get(), 50.0);
    }

    #[test]
    fn test_publish_failures_do_not_stop_run() {
        let (rig, mut controller) = rig();
        start(&rig, &mut controller, HOLD_PROGRAM);

        rig.store.fail_sets.set(true);
        rig.telemetry.fail_writes.set(true);
        for _ in 0..3 {
            assert_eq!(controller.step(), State::Run);
        }
        assert!(rig.heater.is_enabled());
        assert_eq!(rig.heater.duties.borrow().len(), 4);
    }

    #[test]
    fn test_pacing_subtracts_cycle_time() {
        let (rig, mut controller) = rig();
        start(&rig, &mut controller, HOLD_PROGRAM);

        rig.sensor.read_time.set(Duration::from_millis(300));
        assert_eq!(controller.tick(), State::Run);
        assert_eq!(rig.clock.last_sleep.get(), Duration::from_millis(700));
        assert_eq!(rig.clock.now(), Duration::from_secs(1));
    }

    #[test]
    fn test_overrun_cycle_does_not_sleep() {
        let (rig, mut controller) = rig();
        start(&rig, &mut controller, HOLD_PROGRAM);

        rig.sensor.read_time.set(Duration::from_millis(1500));
        controller.tick();
        assert_eq!(rig.clock.sleeps.get(), 0);
    }

    #[test]
    fn test_state_changes_do_not_wait() {
        let (rig, mut controller) = rig();
        assert_eq!(controller.tick(), State::Listen);
        rig.store.insert("program", HOLD_PROGRAM);
        rig.store.insert("active", "1");
        assert_eq!(controller.tick(), State::PreRun);
        assert_eq!(controller.tick(), State::Run);
        assert_eq!(rig.clock.sleeps.get(), 0);
    }

    #[test]
    fn test_drop_disables_heater() {
        let (rig, mut controller) = rig();
        start(&rig, &mut controller, HOLD_PROGRAM);
        controller.step();
        assert!(rig.heater.is_enabled());

        drop(controller);
        assert!(!rig.heater.is_enabled());
    }
}
