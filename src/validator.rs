//! Physics-constrained validator (C3): composes [`crate::physics`] and
//! [`crate::schema`] to enforce geometric, kinematic, topological, spectral
//! and zonal constraints over a [`Job`], never mutating it.
//!
//! The validator walks operations in non-decreasing `start_time` order,
//! threading a value-owned `current_positions` map through the walk; the
//! map is discarded when validation ends. Two validations of the same job
//! always produce byte-identical results (ordering guarantee, §4.2.3).

use std::collections::{HashMap, HashSet};

use crate::physics;
use crate::schema::{Job, Operation, Trajectory, TrapRole, ZoneType};

/// Graded severity of a non-fatal finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; unlikely to affect execution.
    Low,
    /// Worth surfacing to the caller; execution proceeds.
    Medium,
    /// Close to a hard failure; execution proceeds unless `strict`.
    High,
}

/// Axis along which a topological ordering was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Ordinal order by `y` changed (row crossing).
    Row,
    /// Ordinal order by `x` changed (column crossing).
    Column,
}

/// A hard validation error. Every variant is a tagged enum case, never a
/// free-form string, per the error taxonomy.
#[derive(Debug, Clone, PartialEq, thiserror::Error, serde::Serialize)]
pub enum ValidationError {
    /// Two atoms are closer than `min_atom_distance`.
    #[error("collision between atom {a} and atom {b} at distance {distance}")]
    Collision { a: u32, b: u32, distance: f64 },
    /// A Rydberg gate's atoms are farther apart than `blockade_radius`.
    #[error("blockade distance {distance} exceeds radius between atom {control} and atom {target}")]
    BlockadeDistance {
        control: u32,
        target: u32,
        distance: f64,
    },
    /// A shuttle move exceeds the maximum AOD transport velocity.
    #[error("atom {atom} velocity {velocity} exceeds max_aod_velocity")]
    VelocityExceeded { atom: u32, velocity: f64 },
    /// A shuttle move reorders atoms along a grid axis.
    #[error("topological violation on {axis:?} axis")]
    TopologicalViolation { axis: Axis },
    /// An operation interacts with a zone in a disallowed way.
    ///
    /// Reserved for future zone rules with a hard-failure contract; the
    /// current algorithm (§4.2.2.4) only ever produces zone *warnings*, so
    /// this variant is not constructed by [`validate`] today.
    #[error("zone violation in zone {zone_id}")]
    ZoneViolation { zone_id: String },
    /// Strict-mode promotion of a near-critical heating warning.
    #[error("atom {atom} heating Δn_vib={delta_n_vib} is near-critical under strict mode")]
    SlewRate { atom: u32, delta_n_vib: f64 },
    /// A shuttle move targeted an atom whose role cannot be transported.
    #[error("atom {atom} has a non-mobile role and cannot be shuttled")]
    StaticAtomShuttle { atom: u32 },
}

/// A non-fatal finding surfaced to the caller.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Warning {
    /// Short machine-readable identifier, e.g. `"HEATING_MODERATE"`.
    pub code: &'static str,
    /// Human-readable description.
    pub message: String,
    /// Severity band.
    pub severity: Severity,
    /// Index into `job.operations` that triggered this warning, if any.
    pub operation_index: Option<usize>,
}

/// The outcome of validating a [`Job`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidationResult {
    /// Whether the job may proceed to execution.
    pub is_valid: bool,
    /// Hard errors, in the order their checks ran.
    pub errors: Vec<ValidationError>,
    /// Warnings, in the order their checks ran.
    pub warnings: Vec<Warning>,
    /// Sum of Euclidean shuttle distances across all moves, in µm.
    pub total_movement_distance_um: f64,
    /// Dimensionless accumulated decoherence proxy, Σ d·(v/v_max)·k.
    pub estimated_decoherence_cost: f64,
}

const NEAR_COLLISION_FACTOR: f64 = 1.1;
const HIGH_VELOCITY_FACTOR: f64 = 0.8;
const WEAK_BLOCKADE_FACTOR: f64 = 0.9;
const HEATING_MODERATE_FLOOR: f64 = 10.0;
const ATOM_LOSS_RISK_HIGH: f64 = 0.10;
const ATOM_LOSS_RISK_MEDIUM: f64 = 0.05;

struct Walk<'a> {
    job: &'a Job,
    strict: bool,
    positions: HashMap<u32, (f64, f64)>,
    errors: Vec<ValidationError>,
    warnings: Vec<Warning>,
    total_movement_distance_um: f64,
    estimated_decoherence_cost: f64,
}

/// Validate `job` against device physics, returning a complete picture of
/// every error and warning (the validator never stops at the first error).
///
/// `strict` promotes near-collision, weak-blockade, high-velocity, and
/// near-critical-heating warnings into hard errors; no other promotion is
/// implicit.
#[must_use]
pub fn validate(job: &Job, strict: bool) -> ValidationResult {
    let mut walk = Walk {
        job,
        strict,
        positions: job
            .register
            .atoms()
            .iter()
            .map(|a| (a.id, (a.x, a.y)))
            .collect(),
        errors: Vec::new(),
        warnings: Vec::new(),
        total_movement_distance_um: 0.0,
        estimated_decoherence_cost: 0.0,
    };

    walk.pre_walk_geometry();

    let mut ordered: Vec<(usize, &Operation)> = job.operations.iter().enumerate().collect();
    ordered.sort_by(|a, b| {
        a.1.start_time()
            .partial_cmp(&b.1.start_time())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut shuttle_intervals: Vec<(f64, f64, usize)> = Vec::new();

    for (index, op) in &ordered {
        match op {
            Operation::ShuttleMove { .. } => {
                walk.shuttle_move(*index, op);
                shuttle_intervals.push((op.start_time(), op.start_time() + op.duration(), *index));
            }
            Operation::RydbergGate { .. } => walk.rydberg_gate(*index, op),
            Operation::GlobalPulse { .. } => walk.global_pulse(*index, op),
            Operation::Measurement { .. } => walk.measurement(*index, op),
            Operation::LocalDetuning { .. }
            | Operation::ShieldingEvent { .. }
            | Operation::ReloadOperation { .. } => {
                tracing::debug!(operation_index = *index, "no physics checks defined for this operation kind");
            }
        }
    }

    walk.temporal_overlap(&shuttle_intervals);

    ValidationResult {
        is_valid: walk.errors.is_empty(),
        errors: walk.errors,
        warnings: walk.warnings,
        total_movement_distance_um: walk.total_movement_distance_um,
        estimated_decoherence_cost: walk.estimated_decoherence_cost,
    }
}

impl<'a> Walk<'a> {
    fn push_warning(&mut self, code: &'static str, message: String, severity: Severity, op_index: Option<usize>) {
        tracing::debug!(code, severity = ?severity, operation_index = op_index, "{}", message);
        self.warnings.push(Warning {
            code,
            message,
            severity,
            operation_index: op_index,
        });
    }

    fn push_error(&mut self, error: ValidationError) {
        tracing::debug!(?error, "validation error");
        self.errors.push(error);
    }

    fn pre_walk_geometry(&mut self) {
        let atoms = self.job.register.atoms();
        let min_d = self.job.register.min_atom_distance();
        for i in 0..atoms.len() {
            for j in (i + 1)..atoms.len() {
                let d = atoms[i].distance(&atoms[j]);
                if d < min_d {
                    self.push_error(ValidationError::Collision {
                        a: atoms[i].id,
                        b: atoms[j].id,
                        distance: d,
                    });
                } else if d < NEAR_COLLISION_FACTOR * min_d {
                    if self.strict {
                        self.push_error(ValidationError::Collision {
                            a: atoms[i].id,
                            b: atoms[j].id,
                            distance: d,
                        });
                    } else {
                        self.push_warning(
                            "NEAR_COLLISION",
                            format!("atoms {} and {} are near the collision threshold (d={d})", atoms[i].id, atoms[j].id),
                            Severity::Medium,
                            None,
                        );
                    }
                }
            }
        }
        for atom in atoms {
            if atom.role.is_mobile() && !atom.has_grid_indices() {
                self.push_warning(
                    "MISSING_AOD_GRID",
                    format!("mobile atom {} lacks AOD grid indices; topological checks degrade for it", atom.id),
                    Severity::High,
                    None,
                );
            }
        }
    }

    fn shuttle_move(&mut self, op_index: usize, op: &Operation) {
        let Operation::ShuttleMove {
            atom_ids,
            duration,
            target_positions,
            ..
        } = op
        else {
            unreachable!("dispatched only for ShuttleMove");
        };

        let mut participants: Vec<(u32, (f64, f64), (f64, f64))> = Vec::new();

        for (atom_id, target) in atom_ids.iter().zip(target_positions.iter()) {
            let Some(atom) = self.job.register.atom(*atom_id) else {
                continue; // unreachable: Job::new already rejected unknown atoms
            };
            if !atom.role.is_mobile() {
                self.push_error(ValidationError::StaticAtomShuttle { atom: *atom_id });
                continue;
            }
            let current = *self.positions.get(atom_id).unwrap_or(&(atom.x, atom.y));
            let d = ((target.0 - current.0).powi(2) + (target.1 - current.1).powi(2)).sqrt();
            self.total_movement_distance_um += d;

            let duration_us = duration / 1000.0;
            let v = if duration_us > 0.0 { d / duration_us } else { f64::INFINITY };

            if v > physics::MAX_AOD_VELOCITY {
                self.push_error(ValidationError::VelocityExceeded { atom: *atom_id, velocity: v });
            } else if v > HIGH_VELOCITY_FACTOR * physics::MAX_AOD_VELOCITY {
                if self.strict {
                    self.push_error(ValidationError::VelocityExceeded { atom: *atom_id, velocity: v });
                } else {
                    self.push_warning(
                        "HIGH_VELOCITY",
                        format!("atom {atom_id} velocity {v} approaches max_aod_velocity"),
                        Severity::Medium,
                        Some(op_index),
                    );
                }
            }

            let delta_n_vib = physics::heating_increment_default(d, v);
            if delta_n_vib > physics::CRITICAL_N_VIB {
                if self.strict {
                    self.push_error(ValidationError::SlewRate {
                        atom: *atom_id,
                        delta_n_vib,
                    });
                } else {
                    self.push_warning(
                        "HEATING_HIGH_NVIB",
                        format!("atom {atom_id} heating Δn_vib={delta_n_vib} exceeds critical threshold"),
                        Severity::High,
                        Some(op_index),
                    );
                }
            } else if delta_n_vib > HEATING_MODERATE_FLOOR {
                self.push_warning(
                    "HEATING_MODERATE",
                    format!("atom {atom_id} heating Δn_vib={delta_n_vib} is moderate"),
                    Severity::Medium,
                    Some(op_index),
                );
            }

            let p_loss = physics::loss_probability_default(delta_n_vib);
            if p_loss > ATOM_LOSS_RISK_HIGH {
                self.push_warning(
                    "ATOM_LOSS_RISK",
                    format!("atom {atom_id} loss probability {p_loss} is high"),
                    Severity::High,
                    Some(op_index),
                );
            } else if p_loss > ATOM_LOSS_RISK_MEDIUM {
                self.push_warning(
                    "ATOM_LOSS_RISK",
                    format!("atom {atom_id} loss probability {p_loss} is elevated"),
                    Severity::Medium,
                    Some(op_index),
                );
            }

            self.estimated_decoherence_cost +=
                d * (v / physics::MAX_AOD_VELOCITY) * physics::DEFAULT_HEATING_K;

            if atom.has_grid_indices() {
                participants.push((*atom_id, current, *target));
            }
            self.positions.insert(*atom_id, *target);
        }

        self.check_topological_order(op_index, &participants);

        // Post-move pairwise collision re-check over the full register.
        let atoms: Vec<u32> = self.job.register.atoms().iter().map(|a| a.id).collect();
        for i in 0..atoms.len() {
            for j in (i + 1)..atoms.len() {
                let pa = self.positions[&atoms[i]];
                let pb = self.positions[&atoms[j]];
                let d = ((pa.0 - pb.0).powi(2) + (pa.1 - pb.1).powi(2)).sqrt();
                if d < self.job.register.min_atom_distance() {
                    self.push_error(ValidationError::Collision {
                        a: atoms[i],
                        b: atoms[j],
                        distance: d,
                    });
                }
            }
        }
    }

    fn check_topological_order(&mut self, _op_index: usize, participants: &[(u32, (f64, f64), (f64, f64))]) {
        if participants.is_empty() {
            return;
        }
        // Order must be preserved against every other grid-carrying atom, not
        // just the atoms this move actually touches: a single atom shuttled
        // past a stationary neighbor still needs a row/column swap in the AOD.
        let moved: HashSet<u32> = participants.iter().map(|p| p.0).collect();
        let mut all = participants.to_vec();
        for atom in self.job.register.atoms() {
            if moved.contains(&atom.id) || !atom.has_grid_indices() {
                continue;
            }
            let pos = self.positions[&atom.id];
            all.push((atom.id, pos, pos));
        }
        if all.len() < 2 {
            return;
        }

        let mut by_cur_y = all.clone();
        by_cur_y.sort_by(|a, b| a.1 .1.partial_cmp(&b.1 .1).unwrap());
        let mut by_tgt_y = all.clone();
        by_tgt_y.sort_by(|a, b| a.2 .1.partial_cmp(&b.2 .1).unwrap());
        if by_cur_y.iter().map(|p| p.0).collect::<Vec<_>>() != by_tgt_y.iter().map(|p| p.0).collect::<Vec<_>>() {
            self.push_error(ValidationError::TopologicalViolation { axis: Axis::Row });
        }

        let mut by_cur_x = all.clone();
        by_cur_x.sort_by(|a, b| a.1 .0.partial_cmp(&b.1 .0).unwrap());
        let mut by_tgt_x = all.clone();
        by_tgt_x.sort_by(|a, b| a.2 .0.partial_cmp(&b.2 .0).unwrap());
        if by_cur_x.iter().map(|p| p.0).collect::<Vec<_>>() != by_tgt_x.iter().map(|p| p.0).collect::<Vec<_>>() {
            self.push_error(ValidationError::TopologicalViolation { axis: Axis::Column });
        }
    }

    fn rydberg_gate(&mut self, op_index: usize, op: &Operation) {
        let Operation::RydbergGate {
            control_atom,
            target_atom,
            ..
        } = op
        else {
            unreachable!("dispatched only for RydbergGate");
        };
        let control_pos = *self.positions.get(control_atom).unwrap();
        let target_pos = *self.positions.get(target_atom).unwrap();
        let d = ((control_pos.0 - target_pos.0).powi(2) + (control_pos.1 - target_pos.1).powi(2)).sqrt();
        let blockade = self.job.register.blockade_radius();

        if d > blockade {
            self.push_error(ValidationError::BlockadeDistance {
                control: *control_atom,
                target: *target_atom,
                distance: d,
            });
        } else if d > WEAK_BLOCKADE_FACTOR * blockade {
            if self.strict {
                self.push_error(ValidationError::BlockadeDistance {
                    control: *control_atom,
                    target: *target_atom,
                    distance: d,
                });
            } else {
                self.push_warning(
                    "WEAK_BLOCKADE",
                    format!("blockade distance {d} between atom {control_atom} and atom {target_atom} is weak"),
                    Severity::High,
                    Some(op_index),
                );
            }
        }

        if d < self.job.register.min_atom_distance() {
            self.push_error(ValidationError::Collision {
                a: *control_atom,
                b: *target_atom,
                distance: d,
            });
        }
    }

    fn global_pulse(&mut self, op_index: usize, _op: &Operation) {
        let Some(zones) = self.job.register.zones() else {
            return;
        };
        for atom in self.job.register.atoms() {
            let pos = self.positions[&atom.id];
            for zone in zones {
                if zone.zone_type() != ZoneType::Storage || !zone.contains(pos.0, pos.1) {
                    continue;
                }
                if zone.shielding_light() {
                    self.push_warning(
                        "PULSE_IN_SHIELDED_ZONE",
                        format!("global pulse reaches atom {} inside shielded zone {}", atom.id, zone.id()),
                        Severity::High,
                        Some(op_index),
                    );
                } else {
                    self.push_warning(
                        "PULSE_IN_STORAGE_ZONE",
                        format!("global pulse reaches atom {} inside storage zone {}", atom.id, zone.id()),
                        Severity::Medium,
                        Some(op_index),
                    );
                }
            }
        }
    }

    fn measurement(&mut self, op_index: usize, op: &Operation) {
        let Operation::Measurement { atom_ids, .. } = op else {
            unreachable!("dispatched only for Measurement");
        };
        let Some(zones) = self.job.register.zones() else {
            return;
        };
        let readout_zones: Vec<_> = zones.iter().filter(|z| z.zone_type() == ZoneType::Readout).collect();
        if readout_zones.is_empty() {
            return;
        }
        for atom_id in atom_ids {
            let pos = self.positions[atom_id];
            let inside = readout_zones.iter().any(|z| z.contains(pos.0, pos.1));
            if !inside {
                self.push_warning(
                    "MEASUREMENT_OUTSIDE_READOUT",
                    format!("measured atom {atom_id} is outside every READOUT zone"),
                    Severity::Medium,
                    Some(op_index),
                );
            }
        }
    }

    fn temporal_overlap(&mut self, intervals: &[(f64, f64, usize)]) {
        for i in 0..intervals.len() {
            for j in (i + 1)..intervals.len() {
                let (s1, e1, idx1) = intervals[i];
                let (s2, e2, idx2) = intervals[j];
                if s1 < e2 && s2 < e1 {
                    self.push_warning(
                        "CONCURRENT_SHUTTLES",
                        format!("shuttle moves at operations {idx1} and {idx2} overlap in time"),
                        Severity::High,
                        Some(idx1.min(idx2)),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        Atom, DeviceConfig, GateType, Job, MeasurementBasis, Operation, Register, SimulationConfig, TrapRole,
    };

    fn atom(id: u32, x: f64, y: f64, role: TrapRole) -> Atom {
        Atom {
            id,
            x,
            y,
            role,
            aod_row: None,
            aod_col: None,
        }
    }

    fn job_with(register: Register, ops: Vec<Operation>) -> Job {
        Job::new(
            None,
            None,
            "2.0",
            DeviceConfig {
                backend_id: "simulator".into(),
                max_shots_override: None,
            },
            register,
            ops,
            SimulationConfig::new(100, false, false).unwrap(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn scenario_valid_blockade() {
        let register = Register::new(
            "square",
            4.0,
            8.0,
            vec![atom(0, 0.0, 0.0, TrapRole::Slm), atom(1, 6.0, 0.0, TrapRole::Slm)],
            None,
        )
        .unwrap();
        let op = Operation::rydberg_gate(0, 1, 0.0, GateType::Cz, None, None).unwrap();
        let job = job_with(register, vec![op]);
        let result = validate(&job, false);
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn scenario_blockade_too_far() {
        let register = Register::new(
            "square",
            4.0,
            8.0,
            vec![atom(0, 0.0, 0.0, TrapRole::Slm), atom(1, 15.0, 0.0, TrapRole::Slm)],
            None,
        )
        .unwrap();
        let op = Operation::rydberg_gate(0, 1, 0.0, GateType::Cz, None, None).unwrap();
        let job = job_with(register, vec![op]);
        let result = validate(&job, false);
        assert!(!result.is_valid);
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::BlockadeDistance { .. })));
    }

    #[test]
    fn scenario_velocity_exceeded() {
        let register = Register::new("square", 4.0, 8.0, vec![atom(0, 0.0, 0.0, TrapRole::Aod)], None).unwrap();
        let op = Operation::shuttle_move(vec![0], 0.0, 100.0, vec![(100.0, 0.0)], Trajectory::Linear).unwrap();
        let job = job_with(register, vec![op]);
        let result = validate(&job, false);
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::VelocityExceeded { .. })));
    }

    #[test]
    fn scenario_topological_row_crossing() {
        let mut a0 = atom(0, 0.0, 0.0, TrapRole::Aod);
        a0.aod_row = Some(0);
        a0.aod_col = Some(0);
        let mut a1 = atom(1, 0.0, 10.0, TrapRole::Aod);
        a1.aod_row = Some(1);
        a1.aod_col = Some(0);
        let register = Register::new("square", 4.0, 8.0, vec![a0, a1], None).unwrap();
        // Move atom 0 up past atom 1's y (slowly, to avoid velocity/heating noise).
        let op = Operation::shuttle_move(vec![0], 0.0, 1_000_000.0, vec![(0.0, 15.0)], Trajectory::Linear).unwrap();
        let job = job_with(register, vec![op]);
        let result = validate(&job, false);
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::TopologicalViolation { axis: Axis::Row })));
    }

    #[test]
    fn scenario_heating_warnings() {
        let register = Register::new("square", 4.0, 8.0, vec![atom(0, 0.0, 0.0, TrapRole::Aod)], None).unwrap();
        let slow = Operation::shuttle_move(vec![0], 0.0, 50_000.0, vec![(5.0, 0.0)], Trajectory::Linear).unwrap();
        let job = job_with(register, vec![slow]);
        let result = validate(&job, false);
        assert!(!result
            .warnings
            .iter()
            .any(|w| w.code.starts_with("HEATING")));
    }

    #[test]
    fn boundary_exact_min_atom_distance_no_collision() {
        let register = Register::new(
            "square",
            4.0,
            8.0,
            vec![atom(0, 0.0, 0.0, TrapRole::Slm), atom(1, 4.0, 0.0, TrapRole::Slm)],
            None,
        )
        .unwrap();
        let op = Operation::measurement(vec![0, 1], 0.0, MeasurementBasis::Computational);
        let job = job_with(register, vec![op]);
        let result = validate(&job, false);
        assert!(!result
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::Collision { .. })));
    }

    #[test]
    fn boundary_exact_blockade_radius_no_error() {
        let register = Register::new(
            "square",
            1.0,
            8.0,
            vec![atom(0, 0.0, 0.0, TrapRole::Slm), atom(1, 8.0, 0.0, TrapRole::Slm)],
            None,
        )
        .unwrap();
        let op = Operation::rydberg_gate(0, 1, 0.0, GateType::Cz, None, None).unwrap();
        let job = job_with(register, vec![op]);
        let result = validate(&job, false);
        assert!(!result
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::BlockadeDistance { .. })));
    }

    #[test]
    fn boundary_exact_max_velocity_no_error() {
        let register = Register::new("square", 4.0, 8.0, vec![atom(0, 0.0, 0.0, TrapRole::Aod)], None).unwrap();
        // d/duration_us == 0.55 exactly: 55 um in 100_000 ns = 100 us -> v = 0.55
        let op = Operation::shuttle_move(vec![0], 0.0, 100_000.0, vec![(55.0, 0.0)], Trajectory::Linear).unwrap();
        let job = job_with(register, vec![op]);
        let result = validate(&job, false);
        assert!(!result
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::VelocityExceeded { .. })));
    }

    #[test]
    fn strict_promotes_weak_blockade_to_error() {
        let register = Register::new(
            "square",
            1.0,
            8.0,
            vec![atom(0, 0.0, 0.0, TrapRole::Slm), atom(1, 7.5, 0.0, TrapRole::Slm)],
            None,
        )
        .unwrap();
        let op = Operation::rydberg_gate(0, 1, 0.0, GateType::Cz, None, None).unwrap();
        let job = job_with(register, vec![op]);
        let lenient = validate(&job, false);
        let strict = validate(&job, true);
        assert!(lenient.is_valid);
        assert!(!strict.is_valid);
    }

    #[test]
    fn concurrent_shuttles_warn_not_error() {
        let register = Register::new(
            "square",
            4.0,
            8.0,
            vec![atom(0, 0.0, 0.0, TrapRole::Aod), atom(1, 50.0, 0.0, TrapRole::Aod)],
            None,
        )
        .unwrap();
        let op0 = Operation::shuttle_move(vec![0], 0.0, 1_000_000.0, vec![(1.0, 0.0)], Trajectory::Linear).unwrap();
        let op1 = Operation::shuttle_move(vec![1], 500.0, 1_000_000.0, vec![(51.0, 0.0)], Trajectory::Linear).unwrap();
        let job = job_with(register, vec![op0, op1]);
        let result = validate(&job, false);
        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.code == "CONCURRENT_SHUTTLES"));
    }

    #[test]
    fn validate_is_deterministic_across_repeated_runs() {
        let job = crate::schema::example_job();
        let r1 = validate(&job, false);
        let r2 = validate(&job, false);
        assert_eq!(r1, r2);
    }
}
