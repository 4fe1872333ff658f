//! Continuous-operation simulator (C5): drives one cooperative per-client
//! cycle loop modeling heating, cooling, atom loss, fidelity decay, and the
//! syndrome-decoder queue, emitting a [`TelemetryFrame`] at every cycle
//! boundary.
//!
//! Each client runs as its own `tokio` task; clients share no mutable
//! state. Stochastic behavior is drawn from a seeded [`rand::rngs::StdRng`],
//! never from ambient entropy, so a fixed seed and fixed stop schedule
//! reproduce byte-identical frame sequences.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

use crate::physics;
use crate::schema::Job;
use crate::telemetry::ClientId;

/// Physical zone-reorder latency and decoder deadline, in milliseconds.
pub const T_CYCLE_MS: f64 = 20.0;
/// Per-cycle Bernoulli atom-loss probability.
pub const ATOM_LOSS_PROBABILITY: f64 = 0.003;
/// Mean per-cycle heating increment before jitter.
pub const BASE_HEATING_PER_CYCLE: f64 = 0.05;
/// Vibrational number above which a cooling pause resets the atom.
pub const COOLING_TRIGGER_N_VIB: f64 = 1.5;
/// Vibrational number an atom is reset to after a cooling pause.
pub const COOLING_RESET_N_VIB: f64 = 0.1;
/// Per-cycle fidelity decay coefficient.
pub const FIDELITY_DECAY_COEFFICIENT: f64 = 1e-4;
/// Smallest allowed `total_cycles`.
pub const MIN_TOTAL_CYCLES: u32 = 1;
/// Largest allowed `total_cycles`.
pub const MAX_TOTAL_CYCLES: u32 = 1000;

/// Errors raised by the simulator's scheduling surface.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// `benchmark_type` is not one of the fixed whitelist.
    #[error("'{0}' is not a recognized benchmark type")]
    InvalidBenchmarkType(String),
    /// A cycle count could not be honored even after clamping.
    #[error("cycle count {0} is invalid")]
    InvalidCycleCount(u32),
}

/// Closed whitelist of synthetic benchmark scenarios a client may run
/// instead of a concrete [`Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Benchmark {
    VelocityFidelity,
    AncillaVsSwap,
    CoolingStrategies,
    ZonedCycles,
    SustainableDepth,
    Full,
}

impl FromStr for Benchmark {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, SimError> {
        match s {
            "velocity_fidelity" => Ok(Benchmark::VelocityFidelity),
            "ancilla_vs_swap" => Ok(Benchmark::AncillaVsSwap),
            "cooling_strategies" => Ok(Benchmark::CoolingStrategies),
            "zoned_cycles" => Ok(Benchmark::ZonedCycles),
            "sustainable_depth" => Ok(Benchmark::SustainableDepth),
            "full" => Ok(Benchmark::Full),
            other => Err(SimError::InvalidBenchmarkType(other.to_string())),
        }
    }
}

/// What a client runs: a concrete job, or a named synthetic benchmark.
#[derive(Debug, Clone)]
pub enum SimSource {
    /// Drive the loop against a real job's register size.
    Job(Box<Job>),
    /// Drive the loop against a nominal single-atom benchmark scenario.
    Benchmark(Benchmark),
}

impl SimSource {
    fn atom_count(&self) -> u32 {
        match self {
            SimSource::Job(job) => job.register.atoms().len() as u32,
            SimSource::Benchmark(_) => 1,
        }
    }
}

/// Lifecycle status of a telemetry frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrameStatus {
    Connecting,
    Running,
    Completed,
    Stopped,
    Error,
    AuthRequired,
}

/// A single telemetry frame, matching the wire JSON shape exactly (§6 item 5).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TelemetryFrame {
    pub status: FrameStatus,
    pub percentage: u8,
    pub cycle: u32,
    pub atoms_lost: u32,
    pub n_vib: f64,
    pub fidelity: f64,
    pub decoder_backlog_ms: f64,
    pub timestamp: String,
}

/// Message delivered from a simulator task to its telemetry sink.
#[derive(Debug, Clone)]
pub enum SimEvent {
    Frame(TelemetryFrame),
}

/// A clock abstraction so tests can skip real `T_cycle` delays.
///
/// Production code uses [`TokioClock`]; tests use [`InstantClock`].
pub trait ClockSource: Send + Sync {
    fn sleep(&self, duration: Duration) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>;
}

/// Real-time clock backed by `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl ClockSource for TokioClock {
    fn sleep(&self, duration: Duration) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Clock that never actually waits, for fast deterministic tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantClock;

impl ClockSource for InstantClock {
    fn sleep(&self, _duration: Duration) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
        Box::pin(std::future::ready(()))
    }
}

struct CycleState {
    cycle: u32,
    n_vib: f64,
    atoms_lost: u32,
    fidelity: f64,
    decoder_queue: f64,
    code_distance: u32,
}

impl CycleState {
    fn new() -> Self {
        Self {
            cycle: 0,
            n_vib: 0.0,
            atoms_lost: 0,
            fidelity: 1.0,
            decoder_queue: 0.0,
            code_distance: 3,
        }
    }
}

fn round_dp(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn code_distance_for_cycle(cycle: u32) -> u32 {
    if cycle <= 15 {
        3
    } else if cycle <= 30 {
        5
    } else {
        7
    }
}

fn build_frame(status: FrameStatus, state: &CycleState, decoder_backlog_ms: f64, total_cycles: u32) -> TelemetryFrame {
    let percentage = ((state.cycle as f64 / total_cycles as f64) * 100.0).round().clamp(0.0, 100.0) as u8;
    TelemetryFrame {
        status,
        percentage,
        cycle: state.cycle,
        atoms_lost: state.atoms_lost,
        n_vib: round_dp(state.n_vib, 3),
        fidelity: round_dp(state.fidelity, 6),
        decoder_backlog_ms: round_dp(decoder_backlog_ms, 2),
        timestamp: Utc::now().to_rfc3339(),
    }
}

/// A handle to a running (or finished) per-client simulation task.
pub struct ClientHandle {
    client_id: ClientId,
    running: Arc<AtomicBool>,
    task: tokio::task::JoinHandle<()>,
}

impl ClientHandle {
    /// The client this handle belongs to.
    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// A clone of the shared stop flag, suitable for registering with a
    /// [`crate::telemetry::TelemetryBus`] so `request_stop` flips the exact
    /// flag this task polls.
    #[must_use]
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Cooperatively request this client's task to stop at the next cycle
    /// boundary.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Wait for the task to finish.
    ///
    /// # Errors
    /// Returns the task's [`tokio::task::JoinError`] if it panicked or was
    /// aborted.
    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.task.await
    }
}

/// Drives per-client continuous-operation simulation tasks.
pub struct Simulator {
    clock: Arc<dyn ClockSource>,
}

impl Simulator {
    /// Construct a simulator backed by `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn ClockSource>) -> Self {
        Self { clock }
    }

    /// Construct a simulator backed by the real `tokio` clock.
    #[must_use]
    pub fn with_tokio_clock() -> Self {
        Self::new(Arc::new(TokioClock))
    }

    /// Spawn a simulation task for `client_id`, clamping `total_cycles` to
    /// `[1, 1000]` and streaming [`SimEvent::Frame`] over `sink`.
    ///
    /// # Errors
    /// Currently infallible; the `Result` is kept for forward-compatibility
    /// with future scheduling rejections (see `SimError`).
    pub fn start(
        &self,
        client_id: ClientId,
        source: SimSource,
        total_cycles: u32,
        seed: u64,
        sink: mpsc::Sender<SimEvent>,
    ) -> Result<ClientHandle, SimError> {
        let total_cycles = total_cycles.clamp(MIN_TOTAL_CYCLES, MAX_TOTAL_CYCLES);
        let running = Arc::new(AtomicBool::new(true));
        let task_running = running.clone();
        let clock = self.clock.clone();
        let task_client_id = client_id.clone();

        let task = tokio::task::spawn(async move {
            let span = tracing::info_span!("simulator_client", client_id = %task_client_id);
            let _enter = span.enter();
            run_client(source, total_cycles, seed, sink, task_running, clock).await;
        });

        Ok(ClientHandle {
            client_id,
            running,
            task,
        })
    }
}

async fn run_client(
    source: SimSource,
    total_cycles: u32,
    seed: u64,
    sink: mpsc::Sender<SimEvent>,
    running: Arc<AtomicBool>,
    clock: Arc<dyn ClockSource>,
) {
    let atom_count = source.atom_count();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut state = CycleState::new();

    for cycle in 1..=total_cycles {
        if !running.load(Ordering::SeqCst) {
            tracing::debug!(cycle, "stop flag observed at cycle boundary");
            let frame = build_frame(FrameStatus::Stopped, &state, 0.0, total_cycles);
            let _ = sink.send(SimEvent::Frame(frame)).await;
            return;
        }

        clock.sleep(Duration::from_millis(T_CYCLE_MS as u64)).await;

        state.cycle = cycle;
        state.code_distance = code_distance_for_cycle(cycle);

        let heating_jitter = rng.gen_range(0.9..1.1_f64);
        state.n_vib += BASE_HEATING_PER_CYCLE * heating_jitter;
        if state.n_vib > COOLING_TRIGGER_N_VIB {
            state.n_vib = COOLING_RESET_N_VIB;
        }

        state.fidelity *= 1.0 - FIDELITY_DECAY_COEFFICIENT * state.n_vib;

        if state.atoms_lost < atom_count && rng.gen::<f64>() < ATOM_LOSS_PROBABILITY {
            state.atoms_lost += 1;
        }

        let decoder_jitter = rng.gen_range(0.9..1.1_f64);
        let decoder = physics::decoder_latency(state.code_distance, state.decoder_queue, decoder_jitter, T_CYCLE_MS);
        state.decoder_queue = decoder.queue;

        tracing::trace!(
            cycle,
            n_vib = state.n_vib,
            fidelity = state.fidelity,
            decoder_backlog_ms = decoder.latency_ms,
            "cycle advanced"
        );

        let status = if cycle == total_cycles {
            FrameStatus::Completed
        } else {
            FrameStatus::Running
        };
        let frame = build_frame(status, &state, decoder.latency_ms, total_cycles);
        if sink.send(SimEvent::Frame(frame)).await.is_err() {
            tracing::debug!("telemetry sink closed; ending client task early");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(id: &str) -> ClientId {
        ClientId::parse(id).unwrap()
    }

    #[test]
    fn benchmark_from_str_accepts_whitelist() {
        for name in [
            "velocity_fidelity",
            "ancilla_vs_swap",
            "cooling_strategies",
            "zoned_cycles",
            "sustainable_depth",
            "full",
        ] {
            assert!(Benchmark::from_str(name).is_ok());
        }
    }

    #[test]
    fn benchmark_from_str_rejects_unknown() {
        assert!(matches!(
            Benchmark::from_str("not_a_real_benchmark"),
            Err(SimError::InvalidBenchmarkType(_))
        ));
    }

    #[test]
    fn code_distance_schedule_matches_spec() {
        assert_eq!(code_distance_for_cycle(1), 3);
        assert_eq!(code_distance_for_cycle(15), 3);
        assert_eq!(code_distance_for_cycle(16), 5);
        assert_eq!(code_distance_for_cycle(30), 5);
        assert_eq!(code_distance_for_cycle(31), 7);
        assert_eq!(code_distance_for_cycle(1000), 7);
    }

    #[tokio::test]
    async fn emits_completed_status_on_final_cycle() {
        let sim = Simulator::new(Arc::new(InstantClock));
        let (tx, mut rx) = mpsc::channel(64);
        let handle = sim
            .start(client("c1"), SimSource::Benchmark(Benchmark::Full), 5, 7, tx)
            .unwrap();

        let mut frames = Vec::new();
        while let Some(SimEvent::Frame(frame)) = rx.recv().await {
            frames.push(frame);
        }
        handle.join().await.unwrap();

        assert_eq!(frames.len(), 5);
        assert_eq!(frames.last().unwrap().status, FrameStatus::Completed);
        assert!(frames.last().unwrap().atoms_lost <= 1);
    }

    #[tokio::test]
    async fn stop_request_prevents_further_cycles() {
        let sim = Simulator::new(Arc::new(InstantClock));
        let (tx, mut rx) = mpsc::channel(64);
        let handle = sim
            .start(client("c2"), SimSource::Benchmark(Benchmark::Full), 1000, 3, tx)
            .unwrap();
        handle.stop();

        let mut frames = Vec::new();
        while let Some(SimEvent::Frame(frame)) = rx.recv().await {
            frames.push(frame);
        }
        handle.join().await.unwrap();

        assert!(frames.len() <= 1);
        if let Some(frame) = frames.first() {
            assert_eq!(frame.status, FrameStatus::Stopped);
        }
    }

    #[tokio::test]
    async fn frame_sequence_is_deterministic_for_fixed_seed() {
        async fn run(seed: u64) -> Vec<TelemetryFrame> {
            let sim = Simulator::new(Arc::new(InstantClock));
            let (tx, mut rx) = mpsc::channel(64);
            let handle = sim
                .start(client("c3"), SimSource::Benchmark(Benchmark::Full), 20, seed, tx)
                .unwrap();
            let mut frames = Vec::new();
            while let Some(SimEvent::Frame(frame)) = rx.recv().await {
                frames.push(frame);
            }
            handle.join().await.unwrap();
            frames
        }

        let a = run(99).await;
        let b = run(99).await;
        // Timestamps are wall-clock and may legitimately differ; compare
        // everything else, which must be byte-identical under a fixed seed.
        assert_eq!(a.len(), b.len());
        for (fa, fb) in a.iter().zip(&b) {
            assert_eq!(fa.status, fb.status);
            assert_eq!(fa.cycle, fb.cycle);
            assert_eq!(fa.atoms_lost, fb.atoms_lost);
            assert_eq!(fa.n_vib, fb.n_vib);
            assert_eq!(fa.fidelity, fb.fidelity);
            assert_eq!(fa.decoder_backlog_ms, fb.decoder_backlog_ms);
        }
    }

    #[tokio::test]
    async fn decoder_latency_grows_with_code_distance_regime() {
        let sim = Simulator::new(Arc::new(InstantClock));
        let (tx, mut rx) = mpsc::channel(128);
        let handle = sim
            .start(client("c4"), SimSource::Benchmark(Benchmark::SustainableDepth), 50, 123, tx)
            .unwrap();

        let mut frames = Vec::new();
        while let Some(SimEvent::Frame(frame)) = rx.recv().await {
            frames.push(frame);
        }
        handle.join().await.unwrap();

        let at_15 = frames.iter().find(|f| f.cycle == 15).unwrap();
        let at_31 = frames.iter().find(|f| f.cycle == 31).unwrap();
        assert!(at_31.decoder_backlog_ms > at_15.decoder_backlog_ms);
        assert_eq!(frames.last().unwrap().status, FrameStatus::Completed);
    }

    #[tokio::test]
    async fn total_cycles_is_clamped_to_valid_range() {
        let sim = Simulator::new(Arc::new(InstantClock));
        let (tx, mut rx) = mpsc::channel(4096);
        let handle = sim
            .start(client("c5"), SimSource::Benchmark(Benchmark::Full), 5_000, 1, tx)
            .unwrap();

        let mut count = 0;
        while let Some(SimEvent::Frame(_)) = rx.recv().await {
            count += 1;
        }
        handle.join().await.unwrap();
        assert_eq!(count as u32, MAX_TOTAL_CYCLES);
    }
}
