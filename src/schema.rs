//! Typed intermediate representation for an FPQA job.
//!
//! Every type here enforces its own structural invariants at construction:
//! there is no way to observe a partially built `Register`, `Waveform`,
//! `Operation`, or `Job` — construction either succeeds with a value that
//! satisfies its invariants, or fails with a [`SchemaError`] and produces
//! nothing. Types with invariants deserialize via `#[serde(try_from =
//! "...")]` into a plain mirror struct/enum and then run through the same
//! validating constructor used by hand-written code, so the JSON wire path
//! cannot bypass validation. Cross-cutting physical and kinematic rules
//! (collisions, blockade distance, velocity limits) are *not* checked here;
//! they belong to [`crate::validator`], which consumes already-valid jobs.

use serde::{Deserialize, Serialize};

/// Smallest allowed `min_atom_distance`, in µm.
pub const MIN_ATOM_DISTANCE_FLOOR: f64 = 1.0;
/// Largest allowed `min_atom_distance`, in µm.
pub const MIN_ATOM_DISTANCE_CEIL: f64 = 20.0;
/// Smallest allowed `blockade_radius`, in µm.
pub const BLOCKADE_RADIUS_FLOOR: f64 = 4.0;
/// Largest allowed `blockade_radius`, in µm.
pub const BLOCKADE_RADIUS_CEIL: f64 = 15.0;
/// Default `min_atom_distance`, in µm.
pub const DEFAULT_MIN_ATOM_DISTANCE: f64 = 4.0;
/// Default `blockade_radius`, in µm.
pub const DEFAULT_BLOCKADE_RADIUS: f64 = 8.0;
/// Maximum number of atoms in a register.
pub const MAX_ATOMS: usize = 256;
/// Maximum number of shots for a simulation config.
pub const MAX_SHOTS: u32 = 100_000;

/// Structural errors raised when constructing IR entities.
///
/// These are distinct from the physics/kinematic errors raised by
/// [`crate::validator`]; a `SchemaError` means the IR itself is malformed,
/// independent of the device it targets.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("duplicate atom id {0}")]
    DuplicateAtomId(u32),
    #[error("register must contain at least one atom")]
    EmptyAtomList,
    #[error("register has {0} atoms, exceeding the maximum of {MAX_ATOMS}")]
    TooManyAtoms(usize),
    #[error("waveform {0} is missing its required parameter")]
    WaveformMissingParam(&'static str),
    #[error("interpolated waveform has {times} times but {values} values")]
    InterpolatedLengthMismatch { times: usize, values: usize },
    #[error("zone bounds inverted: x [{x_min},{x_max}), y [{y_min},{y_max})")]
    InvertedZoneBounds {
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },
    #[error("{count} atom ids but {positions} target positions")]
    PositionCountMismatch { count: usize, positions: usize },
    #[error("{count} target atoms but {weights} weights")]
    WeightsCountMismatch { count: usize, weights: usize },
    #[error("operation references unknown atom id {0}")]
    OperationReferencesUnknownAtom(u32),
    #[error("duplicate zone id {0}")]
    DuplicateZoneId(String),
    #[error("min_atom_distance {0} out of range [{MIN_ATOM_DISTANCE_FLOOR},{MIN_ATOM_DISTANCE_CEIL}]")]
    InvalidMinAtomDistance(f64),
    #[error("blockade_radius {0} out of range [{BLOCKADE_RADIUS_FLOOR},{BLOCKADE_RADIUS_CEIL}]")]
    InvalidBlockadeRadius(f64),
    #[error("min_atom_distance {min} exceeds blockade_radius {blockade}")]
    MinDistanceExceedsBlockade { min: f64, blockade: f64 },
    #[error("waveform/operation duration must be positive, got {0}")]
    NonPositiveDuration(f64),
    #[error("job must contain at least one operation")]
    EmptyOperations,
    #[error("shot count {0} out of range [1,{MAX_SHOTS}]")]
    InvalidShotCount(u32),
    #[error("phase {0} out of range [0, 2*pi)")]
    InvalidPhase(f64),
}

/// The physical role of a trapped atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrapRole {
    /// Static data trap (spatial light modulator).
    Slm,
    /// Mobile trap (acousto-optic deflector).
    Aod,
    /// Mobile trap used as a flying entanglement messenger.
    Bus,
    /// Atom parked in a storage reservoir.
    Storage,
}

impl TrapRole {
    /// Whether this role can be the target of a [`Operation::ShuttleMove`].
    #[must_use]
    pub fn is_mobile(self) -> bool {
        matches!(self, TrapRole::Aod | TrapRole::Bus)
    }
}

/// A single trapped atom in a register.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Atom {
    /// Identifier, unique within its register.
    pub id: u32,
    /// Position in µm.
    pub x: f64,
    /// Position in µm.
    pub y: f64,
    /// Trap role.
    pub role: TrapRole,
    /// AOD row index, present only for atoms with grid metadata.
    #[serde(default)]
    pub aod_row: Option<i32>,
    /// AOD column index, present only for atoms with grid metadata.
    #[serde(default)]
    pub aod_col: Option<i32>,
}

impl Atom {
    /// Euclidean distance in µm to another atom's current position.
    #[must_use]
    pub fn distance(&self, other: &Atom) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Whether this atom carries both AOD grid indices.
    #[must_use]
    pub fn has_grid_indices(&self) -> bool {
        self.aod_row.is_some() && self.aod_col.is_some()
    }
}

/// Functional role of an axis-aligned register zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneType {
    /// Long-term parking area; not normally manipulated.
    Storage,
    /// Area where Rydberg gates are performed.
    Entanglement,
    /// Area where measurements are expected to take place.
    Readout,
    /// Area used to prepare atoms before entanglement.
    Preparation,
    /// Reservoir of spare atoms for reload operations.
    Reservoir,
    /// Scratch area with no dedicated physical meaning.
    Buffer,
}

/// An axis-aligned rectangular region of the register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, try_from = "RawZone")]
pub struct Zone {
    zone_id: String,
    zone_type: ZoneType,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    shielding_light: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawZone {
    zone_id: String,
    zone_type: ZoneType,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    shielding_light: bool,
}

impl TryFrom<RawZone> for Zone {
    type Error = SchemaError;

    fn try_from(r: RawZone) -> Result<Self, SchemaError> {
        Zone::new(
            r.zone_id,
            r.zone_type,
            r.x_min,
            r.x_max,
            r.y_min,
            r.y_max,
            r.shielding_light,
        )
    }
}

impl Zone {
    /// Construct a zone, validating `x_min < x_max` and `y_min < y_max`.
    pub fn new(
        zone_id: impl Into<String>,
        zone_type: ZoneType,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
        shielding_light: bool,
    ) -> Result<Self, SchemaError> {
        if !(x_min < x_max) || !(y_min < y_max) {
            return Err(SchemaError::InvertedZoneBounds {
                x_min,
                x_max,
                y_min,
                y_max,
            });
        }
        Ok(Self {
            zone_id: zone_id.into(),
            zone_type,
            x_min,
            x_max,
            y_min,
            y_max,
            shielding_light,
        })
    }

    /// This zone's identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.zone_id
    }

    /// This zone's functional type.
    #[must_use]
    pub fn zone_type(&self) -> ZoneType {
        self.zone_type
    }

    /// Whether this zone suppresses transport via a shielding light field.
    #[must_use]
    pub fn shielding_light(&self) -> bool {
        self.shielding_light
    }

    /// Whether `(x, y)` lies within this zone's closed rectangle.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

/// An atom register: ordered atoms, optional zones, and device geometry limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, try_from = "RawRegister")]
pub struct Register {
    layout_type: String,
    min_atom_distance: f64,
    blockade_radius: f64,
    atoms: Vec<Atom>,
    #[serde(default)]
    zones: Option<Vec<Zone>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRegister {
    layout_type: String,
    min_atom_distance: f64,
    blockade_radius: f64,
    atoms: Vec<Atom>,
    #[serde(default)]
    zones: Option<Vec<Zone>>,
}

impl TryFrom<RawRegister> for Register {
    type Error = SchemaError;

    fn try_from(r: RawRegister) -> Result<Self, SchemaError> {
        Register::new(
            r.layout_type,
            r.min_atom_distance,
            r.blockade_radius,
            r.atoms,
            r.zones,
        )
    }
}

impl Register {
    /// Construct a register, validating atom-id uniqueness, atom count, and
    /// the `min_atom_distance ≤ blockade_radius` relationship.
    pub fn new(
        layout_type: impl Into<String>,
        min_atom_distance: f64,
        blockade_radius: f64,
        atoms: Vec<Atom>,
        zones: Option<Vec<Zone>>,
    ) -> Result<Self, SchemaError> {
        if atoms.is_empty() {
            return Err(SchemaError::EmptyAtomList);
        }
        if atoms.len() > MAX_ATOMS {
            return Err(SchemaError::TooManyAtoms(atoms.len()));
        }
        let mut seen = std::collections::HashSet::with_capacity(atoms.len());
        for atom in &atoms {
            if !seen.insert(atom.id) {
                return Err(SchemaError::DuplicateAtomId(atom.id));
            }
        }
        if !(MIN_ATOM_DISTANCE_FLOOR..=MIN_ATOM_DISTANCE_CEIL).contains(&min_atom_distance) {
            return Err(SchemaError::InvalidMinAtomDistance(min_atom_distance));
        }
        if !(BLOCKADE_RADIUS_FLOOR..=BLOCKADE_RADIUS_CEIL).contains(&blockade_radius) {
            return Err(SchemaError::InvalidBlockadeRadius(blockade_radius));
        }
        if min_atom_distance > blockade_radius {
            return Err(SchemaError::MinDistanceExceedsBlockade {
                min: min_atom_distance,
                blockade: blockade_radius,
            });
        }
        if let Some(zs) = &zones {
            let mut seen_zones = std::collections::HashSet::with_capacity(zs.len());
            for z in zs {
                if !seen_zones.insert(z.id().to_string()) {
                    return Err(SchemaError::DuplicateZoneId(z.id().to_string()));
                }
            }
        }
        Ok(Self {
            layout_type: layout_type.into(),
            min_atom_distance,
            blockade_radius,
            atoms,
            zones,
        })
    }

    /// Register layout identifier (device-defined, e.g. `"square"`).
    #[must_use]
    pub fn layout_type(&self) -> &str {
        &self.layout_type
    }

    /// Minimum allowed distance between any two atoms, in µm.
    #[must_use]
    pub fn min_atom_distance(&self) -> f64 {
        self.min_atom_distance
    }

    /// Maximum distance at which a Rydberg gate can entangle a pair, in µm.
    #[must_use]
    pub fn blockade_radius(&self) -> f64 {
        self.blockade_radius
    }

    /// This register's atoms, in declaration order.
    #[must_use]
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// This register's zones, if any were declared.
    #[must_use]
    pub fn zones(&self) -> Option<&[Zone]> {
        self.zones.as_deref()
    }

    /// Look up an atom by id.
    #[must_use]
    pub fn atom(&self, id: u32) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.id == id)
    }
}

/// A time-varying control signal applied during an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields, try_from = "RawWaveform")]
pub enum Waveform {
    /// Flat amplitude for the full duration.
    Constant {
        /// Signal amplitude, rad/µs.
        amplitude: f64,
        /// Duration, ns.
        duration: f64,
    },
    /// Blackman-windowed pulse of given integrated area.
    Blackman {
        /// Pulse area (integral of amplitude over time).
        area: f64,
        /// Duration, ns.
        duration: f64,
    },
    /// Gaussian-windowed pulse of given integrated area.
    Gaussian {
        /// Pulse area.
        area: f64,
        /// Duration, ns.
        duration: f64,
    },
    /// Piecewise-linear waveform defined by explicit sample points.
    Interpolated {
        /// Sample times, ns, same length as `values`.
        times: Vec<f64>,
        /// Sample values, same length as `times`.
        values: Vec<f64>,
        /// Duration, ns.
        duration: f64,
    },
    /// Concatenation of sub-waveforms (opaque to the schema layer).
    Composite {
        /// Duration, ns.
        duration: f64,
    },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
enum RawWaveform {
    Constant { amplitude: f64, duration: f64 },
    Blackman { area: f64, duration: f64 },
    Gaussian { area: f64, duration: f64 },
    Interpolated {
        times: Vec<f64>,
        values: Vec<f64>,
        duration: f64,
    },
    Composite { duration: f64 },
}

impl TryFrom<RawWaveform> for Waveform {
    type Error = SchemaError;

    fn try_from(r: RawWaveform) -> Result<Self, SchemaError> {
        match r {
            RawWaveform::Constant { amplitude, duration } => Waveform::constant(amplitude, duration),
            RawWaveform::Blackman { area, duration } => Waveform::blackman(area, duration),
            RawWaveform::Gaussian { area, duration } => Waveform::gaussian(area, duration),
            RawWaveform::Interpolated { times, values, duration } => {
                Waveform::interpolated(times, values, duration)
            }
            RawWaveform::Composite { duration } => Waveform::composite(duration),
        }
    }
}

impl Waveform {
    /// Construct a [`Waveform::Constant`].
    pub fn constant(amplitude: f64, duration: f64) -> Result<Self, SchemaError> {
        Self::check_duration(duration)?;
        Ok(Self::Constant { amplitude, duration })
    }

    /// Construct a [`Waveform::Blackman`].
    pub fn blackman(area: f64, duration: f64) -> Result<Self, SchemaError> {
        Self::check_duration(duration)?;
        Ok(Self::Blackman { area, duration })
    }

    /// Construct a [`Waveform::Gaussian`].
    pub fn gaussian(area: f64, duration: f64) -> Result<Self, SchemaError> {
        Self::check_duration(duration)?;
        Ok(Self::Gaussian { area, duration })
    }

    /// Construct a [`Waveform::Interpolated`], requiring equal-length,
    /// non-empty `times`/`values`.
    pub fn interpolated(times: Vec<f64>, values: Vec<f64>, duration: f64) -> Result<Self, SchemaError> {
        Self::check_duration(duration)?;
        if times.is_empty() || values.is_empty() || times.len() != values.len() {
            return Err(SchemaError::InterpolatedLengthMismatch {
                times: times.len(),
                values: values.len(),
            });
        }
        Ok(Self::Interpolated {
            times,
            values,
            duration,
        })
    }

    /// Construct a [`Waveform::Composite`].
    pub fn composite(duration: f64) -> Result<Self, SchemaError> {
        Self::check_duration(duration)?;
        Ok(Self::Composite { duration })
    }

    fn check_duration(duration: f64) -> Result<(), SchemaError> {
        if !(duration > 0.0) {
            return Err(SchemaError::NonPositiveDuration(duration));
        }
        Ok(())
    }

    /// This waveform's duration, ns.
    #[must_use]
    pub fn duration(&self) -> f64 {
        match self {
            Waveform::Constant { duration, .. }
            | Waveform::Blackman { duration, .. }
            | Waveform::Gaussian { duration, .. }
            | Waveform::Interpolated { duration, .. }
            | Waveform::Composite { duration } => *duration,
        }
    }
}

/// Two-qubit entangling gate flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateType {
    /// Controlled-Z.
    Cz,
    /// Controlled-phase.
    Cphase,
}

/// Measurement basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementBasis {
    /// Computational (Z) basis.
    Computational,
    /// X basis.
    X,
    /// Y basis.
    Y,
}

/// Shuttle trajectory shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trajectory {
    /// Constant-velocity straight line.
    Linear,
    /// Smoothed, jerk-minimizing profile.
    MinimumJerk,
    /// Sinusoidal ease-in/ease-out profile.
    Sine,
}

/// Shielding activation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShieldingMode {
    /// Turn shielding light on.
    Activate,
    /// Turn shielding light off.
    Deactivate,
}

/// A tagged hardware operation with an explicit `start_time`.
///
/// The implied duration for each variant is documented on its constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields, try_from = "RawOperation")]
pub enum Operation {
    /// Apply a global Rabi drive to every atom on a channel.
    GlobalPulse {
        /// Hardware channel identifier.
        channel: String,
        /// Operation start time, ns.
        start_time: f64,
        /// Rabi-frequency waveform.
        omega: Waveform,
        /// Optional detuning waveform.
        #[serde(default)]
        detuning: Option<Waveform>,
        /// Carrier phase, radians, `[0, 2*pi)`.
        phase: f64,
    },
    /// Apply a site-resolved detuning to a subset of atoms.
    LocalDetuning {
        /// Hardware channel identifier.
        channel: String,
        /// Operation start time, ns.
        start_time: f64,
        /// Atoms receiving the detuning.
        target_atoms: Vec<u32>,
        /// Detuning waveform.
        detuning: Waveform,
        /// Optional per-atom weights, same length as `target_atoms`.
        #[serde(default)]
        weights: Option<Vec<f64>>,
    },
    /// Transport a set of mobile atoms to new positions.
    ShuttleMove {
        /// Atoms to move.
        atom_ids: Vec<u32>,
        /// Operation start time, ns.
        start_time: f64,
        /// Move duration, ns.
        duration: f64,
        /// Destination `(x, y)` per atom, same order/length as `atom_ids`.
        target_positions: Vec<(f64, f64)>,
        /// Trajectory shape.
        trajectory: Trajectory,
    },
    /// Entangle two atoms via a Rydberg blockade gate.
    RydbergGate {
        /// Control atom id.
        control_atom: u32,
        /// Target atom id.
        target_atom: u32,
        /// Operation start time, ns.
        start_time: f64,
        /// Gate flavor.
        gate_type: GateType,
        /// Optional gate phase, radians.
        #[serde(default)]
        phase: Option<f64>,
        /// Optional explicit pulse waveform; default duration 200 ns if absent.
        #[serde(default)]
        pulse: Option<Waveform>,
    },
    /// Projectively measure a set of atoms.
    Measurement {
        /// Atoms to measure.
        atom_ids: Vec<u32>,
        /// Operation start time, ns.
        start_time: f64,
        /// Measurement basis.
        basis: MeasurementBasis,
    },
    /// Toggle shielding light over a set of zones or atoms.
    ShieldingEvent {
        /// Operation start time, ns.
        start_time: f64,
        /// Affected zones, if targeted by zone.
        #[serde(default)]
        zone_ids: Option<Vec<String>>,
        /// Affected atoms, if targeted by atom.
        #[serde(default)]
        atom_ids: Option<Vec<u32>>,
        /// Activate or deactivate.
        mode: ShieldingMode,
        /// Event duration, ns.
        duration: f64,
    },
    /// Reload atoms from a reservoir zone into target trap slots.
    ReloadOperation {
        /// Operation start time, ns.
        start_time: f64,
        /// Destination trap slot ids.
        target_slots: Vec<u32>,
        /// Source reservoir zone id.
        source_zone: String,
        /// Loading duration, ns (also the implied operation duration).
        loading_duration_ns: f64,
        /// Whether a post-load cooling pause is applied.
        post_cooling: bool,
    },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
enum RawOperation {
    GlobalPulse {
        channel: String,
        start_time: f64,
        omega: Waveform,
        #[serde(default)]
        detuning: Option<Waveform>,
        phase: f64,
    },
    LocalDetuning {
        channel: String,
        start_time: f64,
        target_atoms: Vec<u32>,
        detuning: Waveform,
        #[serde(default)]
        weights: Option<Vec<f64>>,
    },
    ShuttleMove {
        atom_ids: Vec<u32>,
        start_time: f64,
        duration: f64,
        target_positions: Vec<(f64, f64)>,
        trajectory: Trajectory,
    },
    RydbergGate {
        control_atom: u32,
        target_atom: u32,
        start_time: f64,
        gate_type: GateType,
        #[serde(default)]
        phase: Option<f64>,
        #[serde(default)]
        pulse: Option<Waveform>,
    },
    Measurement {
        atom_ids: Vec<u32>,
        start_time: f64,
        basis: MeasurementBasis,
    },
    ShieldingEvent {
        start_time: f64,
        #[serde(default)]
        zone_ids: Option<Vec<String>>,
        #[serde(default)]
        atom_ids: Option<Vec<u32>>,
        mode: ShieldingMode,
        duration: f64,
    },
    ReloadOperation {
        start_time: f64,
        target_slots: Vec<u32>,
        source_zone: String,
        loading_duration_ns: f64,
        post_cooling: bool,
    },
}

impl TryFrom<RawOperation> for Operation {
    type Error = SchemaError;

    fn try_from(r: RawOperation) -> Result<Self, SchemaError> {
        match r {
            RawOperation::GlobalPulse {
                channel,
                start_time,
                omega,
                detuning,
                phase,
            } => Operation::global_pulse(channel, start_time, omega, detuning, phase),
            RawOperation::LocalDetuning {
                channel,
                start_time,
                target_atoms,
                detuning,
                weights,
            } => Operation::local_detuning(channel, start_time, target_atoms, detuning, weights),
            RawOperation::ShuttleMove {
                atom_ids,
                start_time,
                duration,
                target_positions,
                trajectory,
            } => Operation::shuttle_move(atom_ids, start_time, duration, target_positions, trajectory),
            RawOperation::RydbergGate {
                control_atom,
                target_atom,
                start_time,
                gate_type,
                phase,
                pulse,
            } => Operation::rydberg_gate(control_atom, target_atom, start_time, gate_type, phase, pulse),
            RawOperation::Measurement {
                atom_ids,
                start_time,
                basis,
            } => Ok(Operation::measurement(atom_ids, start_time, basis)),
            RawOperation::ShieldingEvent {
                start_time,
                zone_ids,
                atom_ids,
                mode,
                duration,
            } => Operation::shielding_event(start_time, zone_ids, atom_ids, mode, duration),
            RawOperation::ReloadOperation {
                start_time,
                target_slots,
                source_zone,
                loading_duration_ns,
                post_cooling,
            } => Operation::reload_operation(start_time, target_slots, source_zone, loading_duration_ns, post_cooling),
        }
    }
}

impl Operation {
    /// Construct a [`Operation::GlobalPulse`], validating phase range.
    pub fn global_pulse(
        channel: impl Into<String>,
        start_time: f64,
        omega: Waveform,
        detuning: Option<Waveform>,
        phase: f64,
    ) -> Result<Self, SchemaError> {
        Self::check_phase(phase)?;
        Ok(Self::GlobalPulse {
            channel: channel.into(),
            start_time,
            omega,
            detuning,
            phase,
        })
    }

    /// Construct a [`Operation::LocalDetuning`], validating `weights.len()`.
    pub fn local_detuning(
        channel: impl Into<String>,
        start_time: f64,
        target_atoms: Vec<u32>,
        detuning: Waveform,
        weights: Option<Vec<f64>>,
    ) -> Result<Self, SchemaError> {
        if let Some(w) = &weights {
            if w.len() != target_atoms.len() {
                return Err(SchemaError::WeightsCountMismatch {
                    count: target_atoms.len(),
                    weights: w.len(),
                });
            }
        }
        Ok(Self::LocalDetuning {
            channel: channel.into(),
            start_time,
            target_atoms,
            detuning,
            weights,
        })
    }

    /// Construct a [`Operation::ShuttleMove`], validating
    /// `target_positions.len() == atom_ids.len()` and `duration > 0`.
    pub fn shuttle_move(
        atom_ids: Vec<u32>,
        start_time: f64,
        duration: f64,
        target_positions: Vec<(f64, f64)>,
        trajectory: Trajectory,
    ) -> Result<Self, SchemaError> {
        if !(duration > 0.0) {
            return Err(SchemaError::NonPositiveDuration(duration));
        }
        if target_positions.len() != atom_ids.len() {
            return Err(SchemaError::PositionCountMismatch {
                count: atom_ids.len(),
                positions: target_positions.len(),
            });
        }
        Ok(Self::ShuttleMove {
            atom_ids,
            start_time,
            duration,
            target_positions,
            trajectory,
        })
    }

    /// Construct a [`Operation::RydbergGate`].
    pub fn rydberg_gate(
        control_atom: u32,
        target_atom: u32,
        start_time: f64,
        gate_type: GateType,
        phase: Option<f64>,
        pulse: Option<Waveform>,
    ) -> Result<Self, SchemaError> {
        if let Some(p) = phase {
            Self::check_phase(p)?;
        }
        Ok(Self::RydbergGate {
            control_atom,
            target_atom,
            start_time,
            gate_type,
            phase,
            pulse,
        })
    }

    /// Construct a [`Operation::Measurement`].
    pub fn measurement(atom_ids: Vec<u32>, start_time: f64, basis: MeasurementBasis) -> Self {
        Self::Measurement {
            atom_ids,
            start_time,
            basis,
        }
    }

    /// Construct a [`Operation::ShieldingEvent`].
    pub fn shielding_event(
        start_time: f64,
        zone_ids: Option<Vec<String>>,
        atom_ids: Option<Vec<u32>>,
        mode: ShieldingMode,
        duration: f64,
    ) -> Result<Self, SchemaError> {
        if !(duration > 0.0) {
            return Err(SchemaError::NonPositiveDuration(duration));
        }
        Ok(Self::ShieldingEvent {
            start_time,
            zone_ids,
            atom_ids,
            mode,
            duration,
        })
    }

    /// Construct a [`Operation::ReloadOperation`].
    pub fn reload_operation(
        start_time: f64,
        target_slots: Vec<u32>,
        source_zone: impl Into<String>,
        loading_duration_ns: f64,
        post_cooling: bool,
    ) -> Result<Self, SchemaError> {
        if !(loading_duration_ns > 0.0) {
            return Err(SchemaError::NonPositiveDuration(loading_duration_ns));
        }
        Ok(Self::ReloadOperation {
            start_time,
            target_slots,
            source_zone: source_zone.into(),
            loading_duration_ns,
            post_cooling,
        })
    }

    fn check_phase(phase: f64) -> Result<(), SchemaError> {
        if !(0.0..std::f64::consts::TAU).contains(&phase) {
            return Err(SchemaError::InvalidPhase(phase));
        }
        Ok(())
    }

    /// This operation's `start_time`, ns.
    #[must_use]
    pub fn start_time(&self) -> f64 {
        match self {
            Operation::GlobalPulse { start_time, .. }
            | Operation::LocalDetuning { start_time, .. }
            | Operation::ShuttleMove { start_time, .. }
            | Operation::RydbergGate { start_time, .. }
            | Operation::Measurement { start_time, .. }
            | Operation::ShieldingEvent { start_time, .. }
            | Operation::ReloadOperation { start_time, .. } => *start_time,
        }
    }

    /// This operation's implied duration, ns, per the table in §3 of the spec.
    #[must_use]
    pub fn duration(&self) -> f64 {
        match self {
            Operation::GlobalPulse { omega, .. } => omega.duration(),
            Operation::LocalDetuning { detuning, .. } => detuning.duration(),
            Operation::ShuttleMove { duration, .. } => *duration,
            Operation::RydbergGate { pulse, .. } => pulse.as_ref().map_or(200.0, Waveform::duration),
            Operation::Measurement { .. } => 0.0,
            Operation::ShieldingEvent { duration, .. } => *duration,
            Operation::ReloadOperation {
                loading_duration_ns, ..
            } => *loading_duration_ns,
        }
    }

    /// Every atom id this operation references, for the job-level
    /// "references a known atom" invariant.
    #[must_use]
    pub fn referenced_atoms(&self) -> Vec<u32> {
        match self {
            Operation::GlobalPulse { .. } => Vec::new(),
            Operation::LocalDetuning { target_atoms, .. } => target_atoms.clone(),
            Operation::ShuttleMove { atom_ids, .. } => atom_ids.clone(),
            Operation::RydbergGate {
                control_atom,
                target_atom,
                ..
            } => vec![*control_atom, *target_atom],
            Operation::Measurement { atom_ids, .. } => atom_ids.clone(),
            Operation::ShieldingEvent { atom_ids, .. } => atom_ids.clone().unwrap_or_default(),
            Operation::ReloadOperation { .. } => Vec::new(),
        }
    }
}

/// Backend/device selection for a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Identifier of the backend this job targets (`"simulator"`, a vendor id, ...).
    pub backend_id: String,
    /// Optional override caps, e.g. a vendor-specific maximum shot count.
    #[serde(default)]
    pub max_shots_override: Option<u32>,
}

/// Shot count and observable selection for a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, try_from = "RawSimulationConfig")]
pub struct SimulationConfig {
    /// Backend-reported shot count, `1..=100000`.
    pub shots: u32,
    /// Whether to record per-shot fidelity estimates.
    pub record_fidelity: bool,
    /// Whether to record per-shot atom-loss events.
    pub record_atom_loss: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSimulationConfig {
    shots: u32,
    #[serde(default)]
    record_fidelity: bool,
    #[serde(default)]
    record_atom_loss: bool,
}

impl TryFrom<RawSimulationConfig> for SimulationConfig {
    type Error = SchemaError;

    fn try_from(r: RawSimulationConfig) -> Result<Self, SchemaError> {
        SimulationConfig::new(r.shots, r.record_fidelity, r.record_atom_loss)
    }
}

impl SimulationConfig {
    /// Construct a simulation config, validating the shot count.
    pub fn new(shots: u32, record_fidelity: bool, record_atom_loss: bool) -> Result<Self, SchemaError> {
        if shots == 0 || shots > MAX_SHOTS {
            return Err(SchemaError::InvalidShotCount(shots));
        }
        Ok(Self {
            shots,
            record_fidelity,
            record_atom_loss,
        })
    }
}

/// Optional continuous-operation configuration for long-running jobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContinuousOperationConfig {
    /// Number of spare atoms held in the reservoir.
    pub reservoir_size: u32,
    /// Reservoir replenishment rate, atoms per cycle.
    pub replenishment_rate: f64,
    /// Atom count below which a reload is triggered.
    pub reload_threshold: u32,
    /// Target logical fidelity before the run is considered degraded.
    pub target_fidelity: f64,
}

/// A complete, structurally valid FPQA job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, try_from = "RawJob")]
pub struct Job {
    /// Caller-assigned identifier, if any.
    pub job_id: Option<String>,
    /// Human-readable name, if any.
    pub name: Option<String>,
    /// IR schema version; expected `"2.0"` or later.
    pub version: String,
    /// Target device.
    pub device: DeviceConfig,
    /// Atom register.
    pub register: Register,
    /// Time-ordered operation stream (construction order, not necessarily
    /// `start_time` order — see [`crate::validator`]).
    pub operations: Vec<Operation>,
    /// Execution/backend parameters.
    pub simulation: SimulationConfig,
    /// Continuous-operation parameters, if this is a long-running job.
    pub continuous_operation: Option<ContinuousOperationConfig>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawJob {
    #[serde(default)]
    job_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    version: String,
    device: DeviceConfig,
    register: Register,
    operations: Vec<Operation>,
    simulation: SimulationConfig,
    #[serde(default)]
    continuous_operation: Option<ContinuousOperationConfig>,
}

impl TryFrom<RawJob> for Job {
    type Error = SchemaError;

    fn try_from(r: RawJob) -> Result<Self, SchemaError> {
        Job::new(
            r.job_id,
            r.name,
            r.version,
            r.device,
            r.register,
            r.operations,
            r.simulation,
            r.continuous_operation,
        )
    }
}

impl Job {
    /// Construct a job, validating that `operations` is non-empty and that
    /// every atom id referenced by an operation exists in `register`.
    pub fn new(
        job_id: Option<String>,
        name: Option<String>,
        version: impl Into<String>,
        device: DeviceConfig,
        register: Register,
        operations: Vec<Operation>,
        simulation: SimulationConfig,
        continuous_operation: Option<ContinuousOperationConfig>,
    ) -> Result<Self, SchemaError> {
        if operations.is_empty() {
            return Err(SchemaError::EmptyOperations);
        }
        for op in &operations {
            for atom_id in op.referenced_atoms() {
                if register.atom(atom_id).is_none() {
                    return Err(SchemaError::OperationReferencesUnknownAtom(atom_id));
                }
            }
        }
        Ok(Self {
            job_id,
            name,
            version: version.into(),
            device,
            register,
            operations,
            simulation,
            continuous_operation,
        })
    }
}

/// A small, deterministic example job: a control and target SLM atom 6 µm
/// apart under an 8 µm blockade radius, entangled by a single `CZ` gate.
///
/// Useful as a fixture for tests and CLI demonstrations.
#[must_use]
pub fn example_job() -> Job {
    let atoms = vec![
        Atom {
            id: 0,
            x: 0.0,
            y: 0.0,
            role: TrapRole::Slm,
            aod_row: None,
            aod_col: None,
        },
        Atom {
            id: 1,
            x: 6.0,
            y: 0.0,
            role: TrapRole::Slm,
            aod_row: None,
            aod_col: None,
        },
    ];
    let register = Register::new("square", DEFAULT_MIN_ATOM_DISTANCE, DEFAULT_BLOCKADE_RADIUS, atoms, None)
        .expect("example register is well-formed");
    let op = Operation::rydberg_gate(0, 1, 0.0, GateType::Cz, None, None)
        .expect("example gate is well-formed");
    Job::new(
        Some("example".into()),
        Some("blockade demo".into()),
        "2.0",
        DeviceConfig {
            backend_id: "simulator".into(),
            max_shots_override: None,
        },
        register,
        vec![op],
        SimulationConfig::new(1000, true, true).expect("example shot count is well-formed"),
        None,
    )
    .expect("example job is well-formed")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slm(id: u32, x: f64, y: f64) -> Atom {
        Atom {
            id,
            x,
            y,
            role: TrapRole::Slm,
            aod_row: None,
            aod_col: None,
        }
    }

    #[test]
    fn register_rejects_duplicate_atom_ids() {
        let atoms = vec![slm(0, 0.0, 0.0), slm(0, 5.0, 0.0)];
        let err = Register::new("square", 4.0, 8.0, atoms, None).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateAtomId(0));
    }

    #[test]
    fn register_rejects_empty_atom_list() {
        let err = Register::new("square", 4.0, 8.0, vec![], None).unwrap_err();
        assert_eq!(err, SchemaError::EmptyAtomList);
    }

    #[test]
    fn register_rejects_min_distance_over_blockade() {
        let atoms = vec![slm(0, 0.0, 0.0)];
        let err = Register::new("square", 10.0, 8.0, atoms, None).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MinDistanceExceedsBlockade {
                min: 10.0,
                blockade: 8.0
            }
        );
    }

    #[test]
    fn waveform_constructors_reject_nonpositive_duration() {
        assert!(Waveform::constant(1.0, 0.0).is_err());
        assert!(Waveform::constant(1.0, -5.0).is_err());
        assert!(Waveform::constant(1.0, 10.0).is_ok());
    }

    #[test]
    fn interpolated_requires_matching_nonempty_lengths() {
        assert!(Waveform::interpolated(vec![], vec![], 10.0).is_err());
        assert!(Waveform::interpolated(vec![0.0, 1.0], vec![0.0], 10.0).is_err());
        assert!(Waveform::interpolated(vec![0.0, 1.0], vec![0.0, 1.0], 10.0).is_ok());
    }

    #[test]
    fn zone_rejects_inverted_bounds() {
        let err = Zone::new("z0", ZoneType::Storage, 10.0, 0.0, 0.0, 10.0, false).unwrap_err();
        assert!(matches!(err, SchemaError::InvertedZoneBounds { .. }));
    }

    #[test]
    fn shuttle_move_requires_matching_position_count() {
        let err = Operation::shuttle_move(vec![0, 1], 0.0, 100.0, vec![(1.0, 0.0)], Trajectory::Linear)
            .unwrap_err();
        assert!(matches!(err, SchemaError::PositionCountMismatch { .. }));
    }

    #[test]
    fn local_detuning_requires_matching_weights_count() {
        let wf = Waveform::constant(1.0, 10.0).unwrap();
        let err = Operation::local_detuning("ch0", 0.0, vec![0, 1], wf, Some(vec![1.0])).unwrap_err();
        assert!(matches!(err, SchemaError::WeightsCountMismatch { .. }));
    }

    #[test]
    fn job_rejects_operations_on_unknown_atoms() {
        let atoms = vec![slm(0, 0.0, 0.0)];
        let register = Register::new("square", 4.0, 8.0, atoms, None).unwrap();
        let op = Operation::measurement(vec![99], 0.0, MeasurementBasis::Computational);
        let err = Job::new(
            None,
            None,
            "2.0",
            DeviceConfig {
                backend_id: "simulator".into(),
                max_shots_override: None,
            },
            register,
            vec![op],
            SimulationConfig::new(10, false, false).unwrap(),
            None,
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::OperationReferencesUnknownAtom(99));
    }

    #[test]
    fn job_rejects_empty_operations() {
        let atoms = vec![slm(0, 0.0, 0.0)];
        let register = Register::new("square", 4.0, 8.0, atoms, None).unwrap();
        let err = Job::new(
            None,
            None,
            "2.0",
            DeviceConfig {
                backend_id: "simulator".into(),
                max_shots_override: None,
            },
            register,
            vec![],
            SimulationConfig::new(10, false, false).unwrap(),
            None,
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::EmptyOperations);
    }

    #[test]
    fn example_job_round_trips_through_json() {
        let job = example_job();
        let json = serde_json::to_string(&job).expect("serialize");
        let back: Job = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(job, back);
    }

    #[test]
    fn json_rejects_unknown_fields() {
        let json = r#"{
            "version": "2.0",
            "device": {"backend_id": "simulator"},
            "register": {"layout_type": "square", "min_atom_distance": 4.0, "blockade_radius": 8.0, "atoms": []},
            "operations": [],
            "simulation": {"shots": 10},
            "unexpected_field": true
        }"#;
        let result: Result<Job, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn json_deserialize_runs_validation_not_just_shape_check() {
        // Register with an inverted-bounds zone must fail at the try_from
        // boundary, not merely at shape-parse time.
        let json = r#"{
            "layout_type": "square",
            "min_atom_distance": 4.0,
            "blockade_radius": 8.0,
            "atoms": [{"id": 0, "x": 0.0, "y": 0.0, "role": "SLM"}],
            "zones": [{"zone_id": "z0", "zone_type": "STORAGE", "x_min": 10.0, "x_max": 0.0, "y_min": 0.0, "y_max": 10.0, "shielding_light": false}]
        }"#;
        let result: Result<Register, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
