//! Hierarchical Navigable Small World graph for approximate k-NN search.
//!
//! Pure Rust implementation tuned for the document index: cosine distance,
//! sequential `u32` node ids that double as document ordinals, and a layout
//! that encodes directly with bincode for persistence.
//!
//! # Algorithm Details
//! - Distance metric: cosine distance on unit-length copies of the inputs
//! - Level assignment: `floor(-ln(U) / ln(M))`, seeded per node id so a
//!   reloaded graph keeps assigning the same levels
//! - Neighbor selection: the HNSW diversity heuristic, topped up with the
//!   closest pruned candidates, `M` links on upper layers and `2 * M` on layer 0
//! - Connectivity: every node after the first is attached on layer 0 to a
//!   tree parent, and tree links are never pruned, so every node stays
//!   reachable from the entry point
//! - Layer 0 queries keep expanding through candidates at exactly the current
//!   worst distance, which matters for sparse vectors where many documents are
//!   orthogonal to the query
//! - Ties on equal distance resolve to the lower node id (insertion order)
//!
//! # Parameters
//! - `m`: per-node connectivity. Higher = better recall, more memory
//! - `ef_construction`: candidate list breadth while inserting
//! - `ef_search`: candidate list breadth while querying (raised to `k`)

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use bincode::{Decode, Encode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::vector::distance::{normalize, normalized_distance};
use crate::vector::types::{VectorDimension, VectorError};

/// Hard ceiling on node levels; with M=16 reaching it needs ~10^19 draws.
const MAX_LEVEL: usize = 16;

/// Spreads node ids across the seed space before seeding the level RNG.
const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Construction and query parameters for the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct HnswParams {
    /// Maximum number of nodes the graph accepts.
    pub max_elements: usize,
    /// Links per node on layers above 0.
    pub m: usize,
    /// Candidate list breadth during insertion.
    pub ef_construction: usize,
    /// Candidate list breadth during search.
    pub ef_search: usize,
    /// Seed for level assignment.
    pub seed: u64,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            max_elements: 10_000,
            m: 16,
            ef_construction: 200,
            ef_search: 50,
            seed: 100,
        }
    }
}

impl HnswParams {
    /// Validates the parameters.
    pub fn validate(&self) -> Result<(), VectorError> {
        if self.max_elements == 0 {
            return Err(VectorError::InvalidParameter {
                name: "max_elements",
                reason: "must be at least 1",
            });
        }
        if self.max_elements > u32::MAX as usize {
            return Err(VectorError::InvalidParameter {
                name: "max_elements",
                reason: "must fit in a u32 ordinal",
            });
        }
        if self.m < 2 {
            return Err(VectorError::InvalidParameter {
                name: "m",
                reason: "must be at least 2",
            });
        }
        if self.ef_construction == 0 {
            return Err(VectorError::InvalidParameter {
                name: "ef_construction",
                reason: "must be at least 1",
            });
        }
        if self.ef_search == 0 {
            return Err(VectorError::InvalidParameter {
                name: "ef_search",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Maximum links for a node on `level`.
    #[must_use]
    pub fn max_connections(&self, level: usize) -> usize {
        if level == 0 { self.m * 2 } else { self.m }
    }

    /// Tree links a node may carry; one layer 0 slot always stays free.
    fn max_tree_degree(&self) -> usize {
        self.max_connections(0) - 1
    }

    fn level_multiplier(&self) -> f64 {
        1.0 / (self.m as f64).ln()
    }
}

#[derive(Debug, Clone, Encode, Decode)]
struct Node {
    /// Unit-length copy of the inserted vector.
    vector: Vec<f32>,
    /// Neighbor ids per layer, `links[0]` is the base layer.
    links: Vec<Vec<u32>>,
    /// Layer 0 tree parent, always an older node. `None` only for node 0.
    parent: Option<u32>,
    /// Tree links touching this node: its parent plus its children.
    tree_degree: u32,
}

impl Node {
    fn level(&self) -> usize {
        self.links.len() - 1
    }
}

/// A candidate during graph traversal, ordered by distance then id.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    distance: f32,
    id: u32,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// HNSW graph over cosine distance.
#[derive(Debug, Clone, Encode, Decode)]
pub struct HnswGraph {
    params: HnswParams,
    dimension: VectorDimension,
    nodes: Vec<Node>,
    entry_point: Option<u32>,
    max_level: usize,
}

impl HnswGraph {
    /// Creates an empty graph.
    pub fn new(dimension: VectorDimension, params: HnswParams) -> Result<Self, VectorError> {
        params.validate()?;
        Ok(Self {
            params,
            dimension,
            nodes: Vec::new(),
            entry_point: None,
            max_level: 0,
        })
    }

    /// Inserts a vector and returns its node id.
    ///
    /// Node ids are sequential: the n-th successful insert returns `n - 1`.
    /// Dimension and capacity are checked before the graph is touched.
    pub fn insert(&mut self, vector: &[f32]) -> Result<u32, VectorError> {
        self.dimension.validate_vector(vector)?;
        if self.nodes.len() >= self.params.max_elements {
            return Err(VectorError::CapacityExceeded {
                capacity: self.params.max_elements,
            });
        }

        let id = self.nodes.len() as u32;
        let level = self.random_level(id);
        let unit = normalize(vector);

        self.nodes.push(Node {
            vector: unit.clone(),
            links: vec![Vec::new(); level + 1],
            parent: None,
            tree_degree: 0,
        });

        let Some(mut entry) = self.entry_point else {
            self.entry_point = Some(id);
            self.max_level = level;
            return Ok(id);
        };

        // Greedy descent through the layers above the new node's level
        for layer in (level + 1..=self.max_level).rev() {
            entry = self.greedy_closest(&unit, entry, layer);
        }

        let mut entry_points = vec![entry];
        for layer in (0..=level.min(self.max_level)).rev() {
            let candidates: Vec<Candidate> = self
                .search_layer(&unit, &entry_points, self.params.ef_construction, layer, false)
                .into_iter()
                .filter(|c| c.id != id)
                .collect();

            let mut neighbors = self.select_neighbors(&candidates, self.params.m);
            if layer == 0 {
                let parent = self.choose_parent(id, &unit, &neighbors, &candidates);
                self.attach(id, parent.id);
                if !neighbors.iter().any(|c| c.id == parent.id) {
                    if neighbors.len() >= self.params.m {
                        neighbors.pop();
                    }
                    neighbors.push(parent);
                    neighbors.sort();
                }
            }

            self.nodes[id as usize].links[layer] = neighbors.iter().map(|c| c.id).collect();
            for neighbor in &neighbors {
                self.connect(neighbor.id, id, layer);
            }

            if !candidates.is_empty() {
                entry_points = candidates.iter().map(|c| c.id).collect();
            }
        }

        if level > self.max_level {
            self.max_level = level;
            self.entry_point = Some(id);
        }

        Ok(id)
    }

    /// Returns up to `k` `(node id, cosine distance)` pairs, closest first.
    ///
    /// An empty graph or `k == 0` yields an empty result. While at least `k`
    /// nodes are indexed, exactly `k` pairs come back.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(u32, f32)>, VectorError> {
        self.dimension.validate_vector(query)?;

        let Some(mut entry) = self.entry_point else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let unit = normalize(query);
        if unit.iter().all(|&x| x == 0.0) {
            // Every node sits at distance 1.0 from a zero query
            return Ok((0..self.nodes.len().min(k) as u32)
                .map(|id| (id, self.distance_to(&unit, id)))
                .collect());
        }

        for layer in (1..=self.max_level).rev() {
            entry = self.greedy_closest(&unit, entry, layer);
        }

        let ef = self.params.ef_search.max(k);
        let mut found = self.search_layer(&unit, &[entry], ef, 0, true);
        found.truncate(k);

        Ok(found.into_iter().map(|c| (c.id, c.distance)).collect())
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Maximum number of nodes the graph accepts.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.params.max_elements
    }

    /// Raises the node ceiling. Never shrinks below the current node count.
    pub fn set_capacity(&mut self, max_elements: usize) -> Result<(), VectorError> {
        if max_elements < self.nodes.len() {
            return Err(VectorError::InvalidParameter {
                name: "max_elements",
                reason: "cannot be lower than the number of indexed vectors",
            });
        }
        let params = HnswParams {
            max_elements,
            ..self.params
        };
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Overrides the query-time candidate breadth.
    pub fn set_ef_search(&mut self, ef_search: usize) -> Result<(), VectorError> {
        let params = HnswParams {
            ef_search,
            ..self.params
        };
        params.validate()?;
        self.params = params;
        Ok(())
    }

    #[must_use]
    pub fn params(&self) -> HnswParams {
        self.params
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    /// Checks structural invariants of a graph decoded from storage.
    pub fn validate(&self) -> Result<(), VectorError> {
        if self.dimension.get() == 0 {
            return Err(VectorError::InvalidFormat(
                "graph has zero dimension".to_string(),
            ));
        }
        self.params.validate()?;

        let count = self.nodes.len();
        if count > self.params.max_elements {
            return Err(VectorError::InvalidFormat(format!(
                "graph holds {count} nodes but capacity is {}",
                self.params.max_elements
            )));
        }
        match self.entry_point {
            None if count > 0 => {
                return Err(VectorError::InvalidFormat(
                    "non-empty graph without entry point".to_string(),
                ));
            }
            Some(entry) if entry as usize >= count => {
                return Err(VectorError::InvalidFormat(format!(
                    "entry point {entry} out of range"
                )));
            }
            _ => {}
        }

        let mut tree_degrees = vec![0u32; count];
        for (id, node) in self.nodes.iter().enumerate() {
            self.dimension.validate_vector(&node.vector)?;
            if node.links.is_empty() || node.level() > self.max_level {
                return Err(VectorError::InvalidFormat(format!(
                    "node {id} has an invalid layer count"
                )));
            }
            if node.links.iter().flatten().any(|&n| n as usize >= count) {
                return Err(VectorError::InvalidFormat(format!(
                    "node {id} links to a missing node"
                )));
            }

            match node.parent {
                None if id == 0 => {}
                Some(parent) if (parent as usize) < id => {
                    let linked = node.links[0].contains(&parent)
                        && self.nodes[parent as usize].links[0].contains(&(id as u32));
                    if !linked {
                        return Err(VectorError::InvalidFormat(format!(
                            "node {id} is not linked to its tree parent {parent}"
                        )));
                    }
                    tree_degrees[id] += 1;
                    tree_degrees[parent as usize] += 1;
                }
                _ => {
                    return Err(VectorError::InvalidFormat(format!(
                        "node {id} has an invalid tree parent"
                    )));
                }
            }
        }

        if let Some(id) = (0..count).find(|&id| self.nodes[id].tree_degree != tree_degrees[id]) {
            return Err(VectorError::InvalidFormat(format!(
                "node {id} has an inconsistent tree degree"
            )));
        }

        Ok(())
    }

    // Private helper methods

    fn random_level(&self, id: u32) -> usize {
        let mut rng = StdRng::seed_from_u64(self.params.seed ^ (id as u64).wrapping_mul(SEED_MIX));
        // random() is in [0, 1), flip it so ln() never sees zero
        let uniform: f64 = 1.0 - rng.random::<f64>();
        let level = (-uniform.ln() * self.params.level_multiplier()).floor() as usize;
        level.min(MAX_LEVEL)
    }

    fn distance_to(&self, query: &[f32], id: u32) -> f32 {
        normalized_distance(query, &self.nodes[id as usize].vector)
    }

    fn distance_between(&self, a: u32, b: u32) -> f32 {
        normalized_distance(&self.nodes[a as usize].vector, &self.nodes[b as usize].vector)
    }

    fn greedy_closest(&self, query: &[f32], entry: u32, layer: usize) -> u32 {
        self.search_layer(query, &[entry], 1, layer, false)
            .first()
            .map_or(entry, |c| c.id)
    }

    /// Best-first search on one layer. Returns up to `ef` candidates, closest first.
    ///
    /// With `expand_ties`, neighbors at exactly the current worst distance are
    /// still expanded, so a plateau of equidistant nodes is crossed instead of
    /// ending the search.
    fn search_layer(
        &self,
        query: &[f32],
        entry_points: &[u32],
        ef: usize,
        layer: usize,
        expand_ties: bool,
    ) -> Vec<Candidate> {
        let mut visited: HashSet<u32> = HashSet::new();
        let mut frontier: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
        let mut results: BinaryHeap<Candidate> = BinaryHeap::new();

        for &id in entry_points {
            if visited.insert(id) {
                let candidate = Candidate {
                    distance: self.distance_to(query, id),
                    id,
                };
                frontier.push(Reverse(candidate));
                results.push(candidate);
                if results.len() > ef {
                    results.pop();
                }
            }
        }

        while let Some(Reverse(current)) = frontier.pop() {
            let furthest = results.peek().map_or(f32::INFINITY, |c| c.distance);
            if current.distance > furthest && results.len() >= ef {
                break;
            }

            let Some(neighbors) = self.nodes[current.id as usize].links.get(layer) else {
                continue;
            };

            for &neighbor in neighbors {
                if !visited.insert(neighbor) {
                    continue;
                }
                let candidate = Candidate {
                    distance: self.distance_to(query, neighbor),
                    id: neighbor,
                };
                let furthest = results.peek().map_or(f32::INFINITY, |c| c.distance);
                let closer = if expand_ties {
                    candidate.distance <= furthest
                } else {
                    candidate.distance < furthest
                };
                if results.len() < ef || closer {
                    frontier.push(Reverse(candidate));
                    results.push(candidate);
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        results.into_sorted_vec()
    }

    /// Neighbor selection heuristic over `candidates` sorted closest first.
    ///
    /// A candidate is taken when it is closer to the base node than to every
    /// neighbor already taken. Slots left over go to the closest rejected ones.
    fn select_neighbors(&self, candidates: &[Candidate], m: usize) -> Vec<Candidate> {
        let mut selected: Vec<Candidate> = Vec::with_capacity(m);
        let mut rejected = Vec::new();

        for &candidate in candidates {
            if selected.len() >= m {
                break;
            }
            let diverse = selected
                .iter()
                .all(|s| self.distance_between(candidate.id, s.id) > candidate.distance);
            if diverse {
                selected.push(candidate);
            } else {
                rejected.push(candidate);
            }
        }

        for candidate in rejected {
            if selected.len() >= m {
                break;
            }
            selected.push(candidate);
        }

        selected.sort();
        selected
    }

    /// Picks the layer 0 tree parent of `id`: the closest node with a free
    /// tree slot, falling back to the oldest such node.
    fn choose_parent(
        &self,
        id: u32,
        query: &[f32],
        neighbors: &[Candidate],
        candidates: &[Candidate],
    ) -> Candidate {
        let limit = self.params.max_tree_degree();
        let has_room = |node: u32| (self.nodes[node as usize].tree_degree as usize) < limit;

        if let Some(candidate) = neighbors.iter().chain(candidates).find(|c| has_room(c.id)) {
            return *candidate;
        }

        // A tree's average degree is below 2, so some older node has room
        let fallback = (0..id).find(|&node| has_room(node)).unwrap_or(0);
        Candidate {
            distance: self.distance_to(query, fallback),
            id: fallback,
        }
    }

    fn attach(&mut self, child: u32, parent: u32) {
        self.nodes[child as usize].parent = Some(parent);
        self.nodes[child as usize].tree_degree += 1;
        self.nodes[parent as usize].tree_degree += 1;
    }

    fn is_tree_link(&self, a: u32, b: u32) -> bool {
        self.nodes[a as usize].parent == Some(b) || self.nodes[b as usize].parent == Some(a)
    }

    /// Adds a `from -> to` link on `layer`, pruning `from` to its connection limit.
    ///
    /// Pruning keeps tree links on layer 0 and fills the remaining slots with
    /// the selection heuristic.
    fn connect(&mut self, from: u32, to: u32, layer: usize) {
        let limit = self.params.max_connections(layer);
        let current = &self.nodes[from as usize].links[layer];

        if current.contains(&to) {
            return;
        }
        if current.len() < limit {
            self.nodes[from as usize].links[layer].push(to);
            return;
        }

        let base = &self.nodes[from as usize].vector;
        let mut scored: Vec<Candidate> = current
            .iter()
            .chain(std::iter::once(&to))
            .map(|&id| Candidate {
                distance: normalized_distance(base, &self.nodes[id as usize].vector),
                id,
            })
            .collect();
        scored.sort();

        let (mut links, rest): (Vec<Candidate>, Vec<Candidate>) = if layer == 0 {
            scored
                .into_iter()
                .partition(|c| self.is_tree_link(from, c.id))
        } else {
            (Vec::new(), scored)
        };
        let room = limit.saturating_sub(links.len());
        links.extend(self.select_neighbors(&rest, room));
        links.sort();

        self.nodes[from as usize].links[layer] = links.into_iter().map(|c| c.id).collect();
    }
}
