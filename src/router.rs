//! Topological router (C4): places logical qubits on a 2-D integer grid
//! from a weighted interaction graph, minimizing transport distance plus an
//! AOD-conflict penalty.
//!
//! The spectral embedding is computed without an eigensolver dependency: a
//! shifted, deflated power iteration against the graph Laplacian converges
//! to the Fiedler vector (and, deflated again, its successor), the same
//! trick `networkx.spectral_layout`-style tools use internally.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::graph::{NodeIndex, UnGraph};
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A logical qubit identifier.
pub type QubitId = u32;

/// Fixed weight `λ` applied to the conflict count in the total cost.
pub const LAMBDA_CONFLICT: f64 = 5.0;

/// XOR salt applied to the caller's seed before driving the random-baseline
/// comparison, so placement itself never depends on `seed`.
pub const BASELINE_SALT: u64 = 0x5151_4441_A70D_1CE5;

const POWER_ITERATIONS: usize = 300;

/// Errors produced while routing a graph onto a grid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouterError {
    /// The grid has fewer cells than the graph has qubits.
    #[error("grid has {available} slots but the graph has {needed} qubits")]
    InsufficientGridSlots { needed: usize, available: usize },
}

/// An undirected weighted interaction graph over qubits; edge weight is the
/// interaction count between a pair.
#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    graph: UnGraph<QubitId, f64>,
    index_of: HashMap<QubitId, NodeIndex>,
}

impl InteractionGraph {
    /// An empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            index_of: HashMap::new(),
        }
    }

    /// Ensure `qubit` has a node, returning its graph index.
    pub fn add_qubit(&mut self, qubit: QubitId) -> NodeIndex {
        *self
            .index_of
            .entry(qubit)
            .or_insert_with(|| self.graph.add_node(qubit))
    }

    /// Record an interaction between `a` and `b`, accumulating weight if the
    /// pair already has one. Self-loops are rejected silently (a no-op).
    pub fn add_interaction(&mut self, a: QubitId, b: QubitId, weight: f64) {
        let ia = self.add_qubit(a);
        let ib = self.add_qubit(b);
        if a == b {
            return;
        }
        if let Some(edge) = self.graph.find_edge(ia, ib) {
            if let Some(w) = self.graph.edge_weight_mut(edge) {
                *w += weight;
            }
        } else {
            self.graph.add_edge(ia, ib, weight);
        }
    }

    /// Number of distinct qubits in the graph.
    #[must_use]
    pub fn qubit_count(&self) -> usize {
        self.graph.node_count()
    }

    fn sorted_qubits(&self) -> Vec<QubitId> {
        let mut ids: Vec<QubitId> = self.graph.node_weights().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn weighted_edges(&self) -> Vec<(QubitId, QubitId, f64)> {
        self.graph
            .edge_indices()
            .map(|e| {
                let (ia, ib) = self.graph.edge_endpoints(e).expect("edge index is valid");
                (self.graph[ia], self.graph[ib], self.graph[e])
            })
            .collect()
    }
}

/// Per-run cost accounting.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct CostBreakdown {
    /// Σ `w·‖pos(u)−pos(v)‖₂` over every edge.
    pub total_distance: f64,
    /// Count of edges whose endpoints require a non-axis-aligned move.
    pub aod_conflicts: u32,
    /// `total_distance + λ · aod_conflicts`.
    pub total_cost: f64,
}

impl CostBreakdown {
    const ZERO: Self = Self {
        total_distance: 0.0,
        aod_conflicts: 0,
        total_cost: 0.0,
    };
}

/// The outcome of routing a graph onto a grid.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RouteResult {
    /// Grid position assigned to each qubit, `(x, y)` with `x < width`, `y < height`.
    pub mapping: BTreeMap<QubitId, (u32, u32)>,
    /// Cost of the spectral placement.
    pub cost: CostBreakdown,
    /// Cost of a seeded random placement over the same graph, for comparison.
    pub baseline_cost: CostBreakdown,
    /// `100 · (baseline_cost.total_cost − cost.total_cost) / baseline_cost.total_cost`,
    /// or `0.0` if the baseline cost is zero.
    pub reduction_percentage: f64,
}

/// Route `graph` onto a `width × height` grid.
///
/// Returns [`RouterError::InsufficientGridSlots`] if the grid cannot seat
/// every qubit. An empty graph routes to an empty mapping at zero cost.
pub fn route(graph: &InteractionGraph, width: u32, height: u32, seed: u64) -> Result<RouteResult, RouterError> {
    let ids = graph.sorted_qubits();
    let n = ids.len();

    if n == 0 {
        return Ok(RouteResult {
            mapping: BTreeMap::new(),
            cost: CostBreakdown::ZERO,
            baseline_cost: CostBreakdown::ZERO,
            reduction_percentage: 0.0,
        });
    }

    let slots = (width as usize).saturating_mul(height as usize);
    if slots < n {
        return Err(RouterError::InsufficientGridSlots {
            needed: n,
            available: slots,
        });
    }

    let edges = graph.weighted_edges();
    let local: HashMap<QubitId, usize> = ids.iter().enumerate().map(|(i, &q)| (q, i)).collect();
    let edges_local: Vec<(usize, usize, f64)> = edges
        .iter()
        .map(|(u, v, w)| (local[u], local[v], *w))
        .collect();

    let (embedding_x, embedding_y) = spectral_embedding(n, &edges_local);
    let mapping = assign_grid_positions(&ids, &embedding_x, &embedding_y, width, height);
    let cost = cost_breakdown(&edges, &mapping);

    let baseline_mapping = random_baseline_mapping(&ids, width, height, seed ^ BASELINE_SALT);
    let baseline_cost = cost_breakdown(&edges, &baseline_mapping);

    let reduction_percentage = if baseline_cost.total_cost > 0.0 {
        100.0 * (baseline_cost.total_cost - cost.total_cost) / baseline_cost.total_cost
    } else {
        0.0
    };

    Ok(RouteResult {
        mapping,
        cost,
        baseline_cost,
        reduction_percentage,
    })
}

fn laplacian(n: usize, edges: &[(usize, usize, f64)]) -> Vec<Vec<f64>> {
    let mut l = vec![vec![0.0; n]; n];
    for &(u, v, w) in edges {
        l[u][v] -= w;
        l[v][u] -= w;
        l[u][u] += w;
        l[v][v] += w;
    }
    l
}

fn matvec(m: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    m.iter().map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum()).collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

fn deflate(v: &mut [f64], against: &[Vec<f64>]) {
    for basis in against {
        let proj = dot(v, basis);
        for (vi, bi) in v.iter_mut().zip(basis) {
            *vi -= proj * bi;
        }
    }
}

fn normalize_or_seed(v: &mut Vec<f64>, seed_index_offset: usize) {
    let mut n = norm(v);
    if n < 1e-9 {
        for (i, vi) in v.iter_mut().enumerate() {
            *vi = weyl_seed(i + seed_index_offset + 1);
        }
        n = norm(v);
    }
    if n > 0.0 {
        for vi in v.iter_mut() {
            *vi /= n;
        }
    }
}

fn weyl_seed(i: usize) -> f64 {
    (((i as f64 + 1.0) * std::f64::consts::SQRT_2).fract()) - 0.5
}

/// Power-iterate `M = cI - L` deflated against `against`, returning a unit
/// eigenvector of the largest remaining eigenvalue of `M` (equivalently, of
/// the smallest remaining eigenvalue of `L`).
fn power_iterate_deflated(n: usize, c: f64, l: &[Vec<f64>], against: &[Vec<f64>], seed_offset: usize) -> Vec<f64> {
    let mut v: Vec<f64> = (0..n).map(|i| weyl_seed(i + seed_offset)).collect();
    deflate(&mut v, against);
    normalize_or_seed(&mut v, seed_offset);

    for _ in 0..POWER_ITERATIONS {
        let lv = matvec(l, &v);
        let mut mv: Vec<f64> = (0..n).map(|i| c * v[i] - lv[i]).collect();
        deflate(&mut mv, against);
        normalize_or_seed(&mut mv, seed_offset);
        v = mv;
    }
    v
}

/// Compute the first two non-trivial Laplacian eigenvectors (the Fiedler
/// vector and its successor), used as the 2-D spectral embedding.
fn spectral_embedding(n: usize, edges: &[(usize, usize, f64)]) -> (Vec<f64>, Vec<f64>) {
    if n == 1 {
        return (vec![0.0], vec![0.0]);
    }
    let l = laplacian(n, edges);
    let max_diag = l.iter().enumerate().map(|(i, row)| row[i]).fold(0.0_f64, f64::max);
    let shift = 2.0 * max_diag + 1.0;

    let mut ones = vec![1.0 / (n as f64).sqrt(); n];
    normalize_or_seed(&mut ones, 0);

    let fiedler1 = power_iterate_deflated(n, shift, &l, &[ones.clone()], 1);
    let fiedler2 = power_iterate_deflated(n, shift, &l, &[ones, fiedler1.clone()], 2);
    (fiedler1, fiedler2)
}

fn rank_order(values: &[f64], ids: &[QubitId]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(ids[a].cmp(&ids[b]))
    });
    let mut rank = vec![0usize; values.len()];
    for (r, idx) in order.into_iter().enumerate() {
        rank[idx] = r;
    }
    rank
}

fn assign_grid_positions(
    ids: &[QubitId],
    embedding_x: &[f64],
    embedding_y: &[f64],
    width: u32,
    height: u32,
) -> BTreeMap<QubitId, (u32, u32)> {
    let n = ids.len();
    let rank_x = rank_order(embedding_x, ids);
    let rank_y = rank_order(embedding_y, ids);

    let bucket = |rank: usize, span: u32| -> u32 {
        if span == 0 {
            0
        } else {
            ((rank * span as usize) / n).min(span as usize - 1) as u32
        }
    };

    let mut used: HashSet<(u32, u32)> = HashSet::with_capacity(n);
    let mut mapping = BTreeMap::new();
    for (i, &id) in ids.iter().enumerate() {
        let mut pos = (bucket(rank_x[i], width), bucket(rank_y[i], height));
        if used.contains(&pos) {
            pos = first_free_slot(&used, width, height).expect("grid has enough slots by precondition");
        }
        used.insert(pos);
        mapping.insert(id, pos);
    }
    mapping
}

fn first_free_slot(used: &HashSet<(u32, u32)>, width: u32, height: u32) -> Option<(u32, u32)> {
    for y in 0..height {
        for x in 0..width {
            if !used.contains(&(x, y)) {
                return Some((x, y));
            }
        }
    }
    None
}

fn cost_breakdown(edges: &[(QubitId, QubitId, f64)], mapping: &BTreeMap<QubitId, (u32, u32)>) -> CostBreakdown {
    let mut total_distance = 0.0;
    let mut conflicts = 0u32;
    for &(u, v, w) in edges {
        let pu = mapping[&u];
        let pv = mapping[&v];
        let dx = pu.0 as f64 - pv.0 as f64;
        let dy = pu.1 as f64 - pv.1 as f64;
        total_distance += w * (dx * dx + dy * dy).sqrt();
        if pu.0 != pv.0 && pu.1 != pv.1 {
            conflicts += 1;
        }
    }
    let total_cost = total_distance + LAMBDA_CONFLICT * conflicts as f64;
    CostBreakdown {
        total_distance,
        aod_conflicts: conflicts,
        total_cost,
    }
}

fn random_baseline_mapping(ids: &[QubitId], width: u32, height: u32, seed: u64) -> BTreeMap<QubitId, (u32, u32)> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut slots: Vec<(u32, u32)> = (0..height).flat_map(|y| (0..width).map(move |x| (x, y))).collect();
    slots.shuffle(&mut rng);
    ids.iter().copied().zip(slots).collect()
}
