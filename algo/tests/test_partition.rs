/*
 * SPDX-FileCopyrightText: 2026 The shardrank developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use shardrank::partition::{Ownership, contiguous_range};
use shardrank::prelude::*;

fn random_graph(n: usize, rng: &mut impl Rng) -> AdjGraph {
    AdjGraph::from_records((0..n).map(|page| {
        let outdegree = rng.random_range(0..4);
        let succ: Vec<usize> = (0..outdegree).map(|_| rng.random_range(0..n)).collect();
        (page, succ)
    }))
    .unwrap()
}

/// Checks that every page is owned by exactly one shard, and that shards
/// carry the natural out-links of their pages.
fn check_cover(graph: &AdjGraph, shards: &[Shard]) {
    let n = graph.num_nodes();
    let mut owner = vec![None; n];
    for shard in shards {
        assert_eq!(shard.num_nodes(), n);
        for (page, succ) in shard.iter() {
            assert!(owner[page].is_none(), "Page {page} owned twice");
            owner[page] = Some(shard.id());
            assert!(shard.ownership().contains(page));
            assert_eq!(succ, graph.natural_successors(page));
        }
    }
    assert!(owner.iter().all(Option::is_some));
    assert_eq!(
        shards.iter().map(Shard::num_arcs).sum::<u64>(),
        graph.num_arcs()
    );
}

#[test]
fn test_cover() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(0);
    for n in [0, 1, 5, 17, 64] {
        let graph = random_graph(n, &mut rng);
        for workers in 1..10 {
            for strategy in [Strategy::Contiguous, Strategy::Striped] {
                let shards = partition(&graph, workers, strategy)?;
                assert_eq!(shards.len(), workers);
                for (id, shard) in shards.iter().enumerate() {
                    assert_eq!(shard.id(), id);
                }
                check_cover(&graph, &shards);
            }
        }
    }
    Ok(())
}

#[test]
fn test_contiguous_remainder_to_first() -> Result<()> {
    let graph = AdjGraph::from_records((0..10).map(|page| (page, [(page + 1) % 10])))?;
    let shards = partition(&graph, 3, Strategy::Contiguous)?;
    assert_eq!(shards[0].pages(), &[0, 1, 2, 3]);
    assert_eq!(shards[1].pages(), &[4, 5, 6]);
    assert_eq!(shards[2].pages(), &[7, 8, 9]);
    assert_eq!(shards[1].ownership(), &Ownership::Range(4..7));
    assert_eq!(contiguous_range(10, 3, 2), 7..10);
    Ok(())
}

#[test]
fn test_striped() -> Result<()> {
    let graph = AdjGraph::from_records((0..7).map(|page| (page, [0])))?;
    let shards = partition(&graph, 3, Strategy::Striped)?;
    assert_eq!(shards[0].pages(), &[0, 3, 6]);
    assert_eq!(shards[1].pages(), &[1, 4]);
    assert_eq!(shards[2].pages(), &[2, 5]);
    Ok(())
}

#[test]
fn test_more_workers_than_pages() -> Result<()> {
    let graph = AdjGraph::from_records((0..2).map(|page| (page, [1 - page])))?;
    let shards = partition(&graph, 5, Strategy::Contiguous)?;
    assert_eq!(shards.len(), 5);
    // The two pages are the remainder, so they go to shard 0
    assert_eq!(shards[0].len(), 2);
    assert!(shards[1..].iter().all(Shard::is_empty));
    Ok(())
}

#[test]
fn test_zero_workers() {
    let graph = AdjGraph::default();
    assert!(matches!(
        partition(&graph, 0, Strategy::Striped),
        Err(PageRankError::Configuration(_))
    ));
}

#[test]
fn test_deterministic() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(1);
    let graph = random_graph(30, &mut rng);
    let a = partition(&graph, 4, Strategy::Striped)?;
    let b = partition(&graph, 4, Strategy::Striped)?;
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.pages(), y.pages());
        assert!(x.iter().eq(y.iter()));
    }
    Ok(())
}
