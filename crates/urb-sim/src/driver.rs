//! The external-input entry point.
//!
//! Host environments drive the simulator through one mode-dispatched call:
//! `+1` initializes, `0` steps with an input vector, `-1` finalizes.  Any
//! other mode is a warning no-op.  [`Driver::run`] is the batch variant: it
//! replays whole input traces at a fixed rate, the way scripted host
//! programs do.

use urb_dynamics::VehicleDynamics;

use crate::observer::{NoopObserver, SimObserver};
use crate::sim::{Sim, StepInputs, StepOutputs};
use crate::SimResult;

/// Dispatch selector for [`Driver::dispatch`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Mode {
    Finalize,
    Step,
    Initialize,
}

impl Mode {
    /// Map the host's raw selector; `None` for anything unknown.
    pub fn from_raw(raw: i32) -> Option<Mode> {
        match raw {
            -1 => Some(Mode::Finalize),
            0 => Some(Mode::Step),
            1 => Some(Mode::Initialize),
            _ => None,
        }
    }
}

/// The six-float tuple a host passes per call.
#[derive(Copy, Clone, Debug, Default)]
pub struct DriverInputs {
    pub steer:     f32,
    pub accel:     f32,
    pub brake:     f32,
    pub handbrake: f32,
    pub dt:   f32,
    /// Step rate in Hz; used by trace replay, informational here.
    pub rate: f32,
}

impl DriverInputs {
    fn step_inputs(&self) -> StepInputs {
        StepInputs {
            steer: self.steer,
            accel: self.accel,
            brake: self.brake,
            handbrake: self.handbrake,
            dt: self.dt,
        }
    }
}

/// Per-channel input sequences replayed at a fixed rate.
///
/// Channels shorter than the replay length repeat 0 past their end.
#[derive(Clone, Debug, Default)]
pub struct InputTrace {
    pub steer:     Vec<f32>,
    pub accel:     Vec<f32>,
    pub brake:     Vec<f32>,
    pub handbrake: Vec<f32>,
    /// Simulated seconds to replay.
    pub seconds: f32,
    /// Steps per second; each step runs with `dt = 1 / rate`.
    pub rate: f32,
}

/// Mode-dispatched shim over the orchestrator.
///
/// The factory rebuilds the simulation on every `Initialize`, so a host can
/// cycle init → step… → finalize → init… within one process.
pub struct Driver<D: VehicleDynamics, F: FnMut() -> SimResult<Sim<D>>> {
    factory: F,
    sim: Option<Sim<D>>,
}

impl<D: VehicleDynamics, F: FnMut() -> SimResult<Sim<D>>> Driver<D, F> {
    pub fn new(factory: F) -> Self {
        Self { factory, sim: None }
    }

    /// Whether an initialized simulation is live.
    pub fn is_initialized(&self) -> bool {
        self.sim.is_some()
    }

    /// Borrow the live simulation, if any.
    pub fn sim(&self) -> Option<&Sim<D>> {
        self.sim.as_ref()
    }

    /// One host call: dispatch on `mode`.
    ///
    /// Returns `Some(outputs)` for a step, `None` for everything else.
    /// Stepping before initialization is a warning no-op.
    pub fn dispatch(&mut self, mode: i32, inputs: &DriverInputs) -> SimResult<Option<StepOutputs>> {
        match Mode::from_raw(mode) {
            Some(Mode::Initialize) => {
                log::info!("driver: initialize");
                self.sim = Some((self.factory)()?);
                Ok(None)
            }
            Some(Mode::Step) => match self.sim.as_mut() {
                Some(sim) => Ok(Some(sim.step(&inputs.step_inputs())?)),
                None => {
                    log::warn!("driver: step before initialize ignored");
                    Ok(None)
                }
            },
            Some(Mode::Finalize) => {
                log::info!("driver: finalize");
                self.sim = None;
                Ok(None)
            }
            None => {
                log::warn!("driver: unknown mode {mode} ignored");
                Ok(None)
            }
        }
    }

    /// Replay a whole input trace: initialize, run `ceil(seconds · rate)`
    /// fixed-dt steps, finalize.  Stops early if the simulation asks to.
    pub fn run(&mut self, trace: &InputTrace) -> SimResult<Vec<StepOutputs>> {
        self.run_observed(trace, &mut NoopObserver)
    }

    /// [`run`](Self::run) with observer hooks.
    pub fn run_observed<O: SimObserver>(
        &mut self,
        trace: &InputTrace,
        observer: &mut O,
    ) -> SimResult<Vec<StepOutputs>> {
        self.sim = Some((self.factory)()?);
        let sim = self.sim.as_mut().expect("just initialized");

        let dt = 1.0 / trace.rate;
        let steps = (trace.seconds * trace.rate).ceil() as usize;
        let sample = |channel: &[f32], i: usize| channel.get(i).copied().unwrap_or(0.0);

        let mut outputs = Vec::with_capacity(steps);
        for i in 0..steps {
            let inputs = StepInputs {
                steer: sample(&trace.steer, i),
                accel: sample(&trace.accel, i),
                brake: sample(&trace.brake, i),
                handbrake: sample(&trace.handbrake, i),
                dt,
            };
            let out = sim.step_observed(&inputs, observer)?;
            let running = out.running;
            outputs.push(out);
            if !running {
                break;
            }
        }

        self.sim = None;
        Ok(outputs)
    }
}
