/*
 * SPDX-FileCopyrightText: 2026 The shardrank developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use shardrank::prelude::*;
use std::io::Write;

#[test]
fn test_load() -> Result<()> {
    let graph = AdjGraph::load("# a comment\n0 1 2\n\n1 2 2 0\n  2   \n".as_bytes())?;
    assert_eq!(graph.num_nodes(), 3);
    // Duplicate out-links count once
    assert_eq!(graph.num_arcs(), 4);
    assert_eq!(graph.natural_successors(1), &[0, 2]);
    assert_eq!(graph.dangling_nodes(), &[2]);
    assert_eq!(graph.num_dangling(), 1);
    assert_eq!(graph.outdegree(0), 2);
    assert_eq!(graph.outdegree(2), 3);
    Ok(())
}

#[test]
fn test_records_in_any_order() -> Result<()> {
    let graph = AdjGraph::load("2 0\n0 1\n1\n".as_bytes())?;
    assert_eq!(graph.num_nodes(), 3);
    assert_eq!(graph.natural_successors(2), &[0]);
    assert!(graph.is_dangling(1));
    assert_eq!(graph.successors(1).collect::<Vec<_>>(), vec![0, 1, 2]);
    Ok(())
}

#[test]
fn test_self_loop() -> Result<()> {
    let graph = AdjGraph::load("0 0\n1 0\n".as_bytes())?;
    assert!(!graph.is_dangling(0));
    assert_eq!(graph.successors(0).collect::<Vec<_>>(), vec![0]);
    Ok(())
}

#[test]
fn test_malformed_tokens() {
    for (input, line, bad) in [
        ("0 1\n1 x\n", 2, "x"),
        ("a 1\n", 1, "a"),
        ("0 1.5\n1\n", 1, "1.5"),
        ("0\n\n# c\n1 0 99999999999999999999\n", 4, "99999999999999999999"),
    ] {
        match AdjGraph::load(input.as_bytes()) {
            Err(PageRankError::MalformedRecord { line: l, token }) => {
                assert_eq!(l, line, "{input:?}");
                assert_eq!(token, bad, "{input:?}");
            }
            other => panic!("Unexpected result {other:?} for {input:?}"),
        }
    }
}

#[test]
fn test_negative_reference() {
    assert!(matches!(
        AdjGraph::load("0 -1\n".as_bytes()),
        Err(PageRankError::InvalidReference {
            page: 0,
            target: -1,
            ..
        })
    ));
    assert!(matches!(
        AdjGraph::load("-3 0\n".as_bytes()),
        Err(PageRankError::InvalidReference { target: -3, .. })
    ));
}

#[test]
fn test_reference_out_of_range() {
    assert!(matches!(
        AdjGraph::load("0 1\n1 7\n".as_bytes()),
        Err(PageRankError::InvalidReference {
            page: 1,
            target: 7,
            num_nodes: 2
        })
    ));
}

#[test]
fn test_duplicate_page() {
    assert!(matches!(
        AdjGraph::load("0 1\n1 0\n0\n".as_bytes()),
        Err(PageRankError::DuplicatePage {
            page: 0,
            line: 3,
            first_line: 1
        })
    ));
}

#[test]
fn test_missing_page() {
    assert!(matches!(
        AdjGraph::load("0 2\n2 0\n".as_bytes()),
        Err(PageRankError::Configuration(_))
    ));
    // The largest page alone can prove the gap
    assert!(matches!(
        AdjGraph::load("0 1\n1 0\n1000000\n".as_bytes()),
        Err(PageRankError::Configuration(_))
    ));
}

#[test]
fn test_huge_page() {
    assert!(matches!(
        AdjGraph::load("9223372036854775807\n".as_bytes()),
        Err(PageRankError::Configuration(_))
    ));
    assert!(matches!(
        AdjGraph::load("0 9223372036854775807\n".as_bytes()),
        Err(PageRankError::InvalidReference { page: 0, .. })
    ));
    assert!(matches!(
        AdjGraph::from_records([(usize::MAX, Vec::<usize>::new())]),
        Err(PageRankError::Configuration(_))
    ));
    assert!(matches!(
        AdjGraph::from_records([(0, vec![usize::MAX])]),
        Err(PageRankError::InvalidReference { page: 0, .. })
    ));
}

#[test]
fn test_from_records() -> Result<()> {
    let graph = AdjGraph::from_records([(1, vec![0usize]), (0, vec![1, 1])])?;
    assert_eq!(graph.num_nodes(), 2);
    assert_eq!(graph.num_arcs(), 2);
    assert!(matches!(
        AdjGraph::from_records([(0, Vec::<usize>::new()), (0, Vec::new())]),
        Err(PageRankError::DuplicatePage {
            page: 0,
            line: 2,
            first_line: 1
        })
    ));
    Ok(())
}

#[test]
fn test_load_from_path() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("graph.txt");
    let mut file = std::fs::File::create(&path)?;
    writeln!(file, "0 1 2")?;
    writeln!(file, "1 2")?;
    writeln!(file, "2 0")?;
    drop(file);

    let graph = AdjGraph::load_from_path(&path)?;
    assert_eq!(graph.num_nodes(), 3);
    assert_eq!(graph.num_arcs(), 4);
    assert_eq!(graph.num_dangling(), 0);

    assert!(matches!(
        AdjGraph::load_from_path(dir.path().join("missing.txt")),
        Err(PageRankError::Io(_))
    ));
    Ok(())
}
