//! Dependency tracking for formula calculation

use ahash::{AHashMap, AHashSet};
use gridcalc_core::CellAddress;
use std::fmt;

/// Packed cell key: row in the high 32 bits, column in the low 32 bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u64);

impl CellId {
    /// Create a new cell key
    pub fn new(row: u32, col: u32) -> Self {
        Self(((row as u64) << 32) | col as u64)
    }

    /// Zero-based row
    pub fn row(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Zero-based column
    pub fn col(self) -> u32 {
        self.0 as u32
    }

    /// Relative address of this cell
    pub fn address(self) -> CellAddress {
        CellAddress::new(self.row(), self.col())
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address())
    }
}

/// Dependency graph for formula cells
///
/// An edge runs from a formula cell to every cell it reads. Both directions
/// are indexed so a change can be pushed to its dependents.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Cell → Cells that depend on it (dependents)
    dependents: AHashMap<CellId, AHashSet<CellId>>,
    /// Cell → Cells it depends on (precedents)
    precedents: AHashMap<CellId, AHashSet<CellId>>,
}

/// Cells to recompute, precedents before dependents
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecalcOrder {
    /// Every affected cell exactly once, in evaluation order
    pub order: Vec<CellId>,
    /// Cells on a dependency cycle (members of a multi-cell strongly
    /// connected component, or cells that read themselves)
    pub cyclic: AHashSet<CellId>,
}

impl RecalcOrder {
    /// Check whether a cell sits on a cycle
    pub fn is_cyclic(&self, cell: CellId) -> bool {
        self.cyclic.contains(&cell)
    }
}

/// DFS visit state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not visited yet
    White,
    /// On the component stack, its component still open
    Gray,
    /// Assigned to a finished component
    Black,
}

struct Frame {
    node: CellId,
    neighbors: Vec<CellId>,
    idx: usize,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every outgoing edge of `cell` with edges to `precedents`
    pub fn set_precedents(&mut self, cell: CellId, precedents: impl IntoIterator<Item = CellId>) {
        self.clear_precedents(cell);

        let precedents: AHashSet<CellId> = precedents.into_iter().collect();
        if precedents.is_empty() {
            return;
        }
        for &precedent in &precedents {
            self.dependents.entry(precedent).or_default().insert(cell);
        }
        self.precedents.insert(cell, precedents);
    }

    /// Remove every outgoing edge of `cell`; edges from its dependents stay
    pub fn clear_precedents(&mut self, cell: CellId) {
        if let Some(precedents) = self.precedents.remove(&cell) {
            for precedent in precedents {
                if let Some(deps) = self.dependents.get_mut(&precedent) {
                    deps.remove(&cell);
                    if deps.is_empty() {
                        self.dependents.remove(&precedent);
                    }
                }
            }
        }
    }

    /// Get cells that depend on the given cell
    pub fn dependents(&self, cell: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Get cells that the given cell depends on
    pub fn precedents(&self, cell: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.precedents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Check whether `cell` has any outgoing edge
    pub fn has_precedents(&self, cell: CellId) -> bool {
        self.precedents.contains_key(&cell)
    }

    /// Number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.precedents.values().map(|deps| deps.len()).sum()
    }

    fn sorted_dependents(&self, cell: CellId) -> Vec<CellId> {
        let mut deps: Vec<CellId> = self.dependents(cell).collect();
        deps.sort_unstable();
        deps
    }

    /// Order `roots` and everything transitively depending on them for recalculation
    ///
    /// An iterative Tarjan walk over the dependents edges: components come out
    /// sinks first, so the reversed component list is a topological order.
    /// Every component with more than one cell, or a single cell reading
    /// itself, is reported as cyclic.
    pub fn recalc_order(&self, roots: impl IntoIterator<Item = CellId>) -> RecalcOrder {
        let mut color: AHashMap<CellId, Color> = AHashMap::new();
        let mut index: AHashMap<CellId, usize> = AHashMap::new();
        let mut lowlink: AHashMap<CellId, usize> = AHashMap::new();
        let mut stack: Vec<CellId> = Vec::new();
        let mut components: Vec<Vec<CellId>> = Vec::new();
        let mut next_index = 0usize;

        for root in roots {
            if color.get(&root).copied().unwrap_or(Color::White) != Color::White {
                continue;
            }

            let mut frames = Vec::new();
            self.open(root, &mut color, &mut index, &mut lowlink, &mut stack, &mut next_index);
            frames.push(Frame {
                node: root,
                neighbors: self.sorted_dependents(root),
                idx: 0,
            });

            while let Some(frame) = frames.last_mut() {
                let node = frame.node;
                if frame.idx < frame.neighbors.len() {
                    let next = frame.neighbors[frame.idx];
                    frame.idx += 1;

                    match color.get(&next).copied().unwrap_or(Color::White) {
                        Color::White => {
                            self.open(
                                next,
                                &mut color,
                                &mut index,
                                &mut lowlink,
                                &mut stack,
                                &mut next_index,
                            );
                            frames.push(Frame {
                                node: next,
                                neighbors: self.sorted_dependents(next),
                                idx: 0,
                            });
                        }
                        Color::Gray => {
                            let low = lowlink[&node].min(index[&next]);
                            lowlink.insert(node, low);
                        }
                        Color::Black => {}
                    }
                    continue;
                }

                frames.pop();
                if let Some(parent) = frames.last() {
                    let low = lowlink[&parent.node].min(lowlink[&node]);
                    lowlink.insert(parent.node, low);
                }

                if lowlink[&node] == index[&node] {
                    let mut component = Vec::new();
                    while let Some(member) = stack.pop() {
                        color.insert(member, Color::Black);
                        component.push(member);
                        if member == node {
                            break;
                        }
                    }
                    components.push(component);
                }
            }
        }

        let mut result = RecalcOrder::default();
        for mut component in components.into_iter().rev() {
            component.sort_unstable();
            let cyclic = component.len() > 1
                || self
                    .dependents
                    .get(&component[0])
                    .map_or(false, |deps| deps.contains(&component[0]));
            if cyclic {
                result.cyclic.extend(component.iter().copied());
            }
            result.order.extend(component);
        }
        result
    }

    fn open(
        &self,
        cell: CellId,
        color: &mut AHashMap<CellId, Color>,
        index: &mut AHashMap<CellId, usize>,
        lowlink: &mut AHashMap<CellId, usize>,
        stack: &mut Vec<CellId>,
        next_index: &mut usize,
    ) {
        color.insert(cell, Color::Gray);
        index.insert(cell, *next_index);
        lowlink.insert(cell, *next_index);
        *next_index += 1;
        stack.push(cell);
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}
