use std::collections::VecDeque;

use super::Network;
use crate::error::Result;

/// A set of buses connected by AC lines. Links never join sub-networks.
#[derive(Debug, Clone, PartialEq)]
pub struct SubNetwork {
    /// Bus indices; the first one is the slack bus.
    pub buses: Vec<usize>,
    /// Line indices with both ends inside this sub-network.
    pub lines: Vec<usize>,
}

/// One independent loop: `(line index, +1.0 | -1.0)` where the sign is
/// positive when the loop traverses the line from `bus0` to `bus1`.
pub type Cycle = Vec<(usize, f64)>;

/// Splits the network into connected components of the line graph.
///
/// Buses are visited in declaration order, so the slack of each sub-network is
/// its first-declared bus.
pub(crate) fn sub_networks(network: &Network) -> Result<Vec<SubNetwork>> {
    let n_bus = network.buses.len();
    let ends = line_ends(network)?;

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n_bus];
    for (l, &(a, b)) in ends.iter().enumerate() {
        adjacency[a].push(l);
        adjacency[b].push(l);
    }

    let mut component = vec![usize::MAX; n_bus];
    let mut subs: Vec<SubNetwork> = Vec::new();
    for start in 0..n_bus {
        if component[start] != usize::MAX {
            continue;
        }
        let id = subs.len();
        let mut buses = Vec::new();
        let mut queue = VecDeque::from([start]);
        component[start] = id;
        while let Some(bus) = queue.pop_front() {
            buses.push(bus);
            for &l in &adjacency[bus] {
                let (a, b) = ends[l];
                let other = if a == bus { b } else { a };
                if component[other] == usize::MAX {
                    component[other] = id;
                    queue.push_back(other);
                }
            }
        }
        subs.push(SubNetwork {
            buses,
            lines: Vec::new(),
        });
    }

    for (l, &(a, _)) in ends.iter().enumerate() {
        subs[component[a]].lines.push(l);
    }
    Ok(subs)
}

fn line_ends(network: &Network) -> Result<Vec<(usize, usize)>> {
    network
        .lines
        .iter()
        .map(|line| Ok((network.bus_index(&line.bus0)?, network.bus_index(&line.bus1)?)))
        .collect()
}

impl SubNetwork {
    /// Cycle basis from a BFS spanning tree: one loop per chord.
    pub fn cycles(&self, network: &Network) -> Result<Vec<Cycle>> {
        let ends = line_ends(network)?;
        let n_bus = network.buses.len();

        // parent[bus] = (parent bus, line, sign of traversing bus -> parent)
        let mut parent: Vec<Option<(usize, usize, f64)>> = vec![None; n_bus];
        let mut depth = vec![usize::MAX; n_bus];
        let mut in_tree = vec![false; ends.len()];

        let Some(&root) = self.buses.first() else {
            return Ok(Vec::new());
        };
        depth[root] = 0;
        let mut queue = VecDeque::from([root]);
        while let Some(bus) = queue.pop_front() {
            for &l in &self.lines {
                let (a, b) = ends[l];
                let (other, sign) = if a == bus {
                    (b, -1.0)
                } else if b == bus {
                    (a, 1.0)
                } else {
                    continue;
                };
                if depth[other] == usize::MAX {
                    depth[other] = depth[bus] + 1;
                    // child -> parent runs bus1 -> bus0 when the child is bus1
                    parent[other] = Some((bus, l, sign));
                    in_tree[l] = true;
                    queue.push_back(other);
                }
            }
        }

        let mut cycles = Vec::new();
        for &l in &self.lines {
            if in_tree[l] {
                continue;
            }
            let (a, b) = ends[l];
            // chord a -> b, then back from b to a through the tree
            let mut up_from_b = Vec::new();
            let mut down_to_a = Vec::new();
            let (mut u, mut v) = (b, a);
            while u != v {
                if depth[u] >= depth[v] {
                    let Some((p, line, sign)) = parent[u] else { break };
                    up_from_b.push((line, sign));
                    u = p;
                } else {
                    let Some((p, line, sign)) = parent[v] else { break };
                    down_to_a.push((line, -sign));
                    v = p;
                }
            }
            let mut cycle = vec![(l, 1.0)];
            cycle.extend(up_from_b);
            cycle.extend(down_to_a.into_iter().rev());
            cycles.push(cycle);
        }
        Ok(cycles)
    }
}
