//! Crate root: public surface and module map.
//!
//! This module is the **single canonical entry-point** for downstream users
//! of the library. It declares the six components (`physics`, `schema`,
//! `validator`, `router`, `simulator`, `telemetry`) and re-exports the types
//! a caller reaches for most often, so `use fpqa_mw::{validate, route};`
//! works without chasing submodule paths.
//!
//! ## Invariants
//!
//! - **No global mutable state.** Every public function takes its inputs as
//!   arguments and returns its outputs as values (or a bounded channel, for
//!   the simulator). There is no process-wide config or singleton.
//! - **Validated construction.** Every IR type with a structural invariant
//!   (`Register`, `Zone`, `Waveform`, `Operation`, `Job`, ...) can only be
//!   built through a constructor that returns `Result<Self, SchemaError>`;
//!   there is no way to observe a partially-built value.
//! - **Units.** Distances/velocities/time are `f64` in µm / µm·µs⁻¹ / µs
//!   unless a doc comment says otherwise.
//!
//! If any invariant is violated at runtime, the failure mode is a typed
//! error, never a panic or UB — this crate forbids `unsafe` entirely.

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms)]

/// Pure physics formulas: heating, fidelity loss, atom loss, decoder latency.
pub mod physics;
/// The intermediate representation: atoms, zones, registers, operations, jobs.
pub mod schema;
/// Static validation of a `Job` against physical and topological constraints.
pub mod validator;
/// Spectral-embedding qubit-to-grid-site router.
pub mod router;
/// Per-client continuous-operation simulator.
pub mod simulator;
/// Client registry connecting simulator tasks to their frame sinks.
pub mod telemetry;

pub use physics::{
    decoder_latency, fidelity_loss, fidelity_loss_default, heating_increment, heating_increment_default,
    loss_probability, loss_probability_default, DecoderState, CRITICAL_N_VIB, FIDELITY_WARN_N_VIB, MAX_AOD_VELOCITY,
};

pub use schema::{
    Atom, ContinuousOperationConfig, DeviceConfig, GateType, Job, MeasurementBasis, Operation, Register,
    SchemaError, ShieldingMode, SimulationConfig, Trajectory, TrapRole, Waveform, Zone, ZoneType,
};

pub use validator::{validate, Severity, ValidationError, ValidationResult, Warning};

pub use router::{route, CostBreakdown, InteractionGraph, QubitId, RouteResult, RouterError};

pub use simulator::{
    Benchmark, ClientHandle, ClockSource, FrameStatus, InstantClock, SimError, SimEvent, SimSource, Simulator,
    TelemetryFrame, TokioClock,
};

pub use telemetry::{ChannelSink, ClientId, FrameSink, TelemetryBus, TelemetryError};
