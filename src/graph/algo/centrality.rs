use rayon::prelude::*;
use std::collections::VecDeque;

/// Normalised betweenness centrality of an undirected, unweighted graph
/// (PARALLELIZED).
///
/// Brandes' algorithm with one BFS per source node, sources spread over the
/// rayon pool. Every unordered pair is visited from both ends, so the raw sum
/// is scaled by `1 / ((n-1)(n-2))`, which equals halving and then applying
/// the usual `2 / ((n-1)(n-2))` normalisation. Graphs with fewer than three
/// nodes score all zeros.
///
/// # Arguments
/// * `adj` - Neighbour lists, by node position (weights ignored)
pub fn betweenness(adj: &[Vec<(usize, f64)>]) -> Vec<f64> {
    let n = adj.len();
    if n < 3 {
        return vec![0.0; n];
    }

    let partials: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|source| {
            let mut partial = vec![0.0; n];
            let mut stack: Vec<usize> = Vec::with_capacity(n);
            let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
            let mut num_paths = vec![0.0f64; n];
            let mut distance = vec![-1i64; n];
            num_paths[source] = 1.0;
            distance[source] = 0;

            let mut queue = VecDeque::new();
            queue.push_back(source);
            while let Some(v) = queue.pop_front() {
                stack.push(v);
                for &(w, _) in &adj[v] {
                    if distance[w] < 0 {
                        distance[w] = distance[v] + 1;
                        queue.push_back(w);
                    }
                    if distance[w] == distance[v] + 1 {
                        num_paths[w] += num_paths[v];
                        predecessors[w].push(v);
                    }
                }
            }

            // Dependency accumulation, farthest nodes first
            let mut dependency = vec![0.0f64; n];
            while let Some(w) = stack.pop() {
                for &v in &predecessors[w] {
                    dependency[v] += (num_paths[v] / num_paths[w]) * (1.0 + dependency[w]);
                }
                if w != source {
                    partial[w] += dependency[w];
                }
            }
            partial
        })
        .collect();

    let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
    let mut scores = vec![0.0; n];
    for partial in partials {
        for (i, value) in partial.into_iter().enumerate() {
            scores[i] += value;
        }
    }
    for s in &mut scores {
        *s *= scale;
    }
    scores
}
