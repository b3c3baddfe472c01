use std::path::PathBuf;

use cfgtree_core::indent::{build_flat, build_tree};
use cfgtree_core::{flatten_all, read_lines, IndentOptions};
use pretty_assertions::assert_eq;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

fn asa_options() -> IndentOptions {
    IndentOptions {
        skip_prefixes: vec!["#".to_string(), "<-".to_string()],
        hazard_prefixes: vec!["interface".to_string(), "mtu".to_string()],
        hazard_chars: vec!['(', ')', '{', '}', '"'],
    }
}

#[test]
fn asa_fixture_nests_object_children() {
    let lines = read_lines(&fixture("fixtures/asa-basic.cfg")).expect("read fixture");
    let roots = build_tree(&lines, &asa_options());

    let group = roots
        .iter()
        .find(|node| node.tokens == ["object-group", "network", "grp-servers"])
        .expect("group should exist");
    let members: Vec<&str> = group.children.iter().map(|c| c.word(1)).collect();
    assert_eq!(members, vec!["object", "host", "10.1.3.0"]);
}

#[test]
fn flatten_reproduces_source_order() {
    let lines = read_lines(&fixture("fixtures/asa-basic.cfg")).expect("read fixture");
    let roots = build_tree(&lines, &asa_options());
    let flat = build_flat(&lines, &asa_options());

    let tree_ids: Vec<usize> = flatten_all(&roots).iter().map(|node| node.id).collect();
    let flat_ids: Vec<usize> = flat.iter().map(|node| node.id).collect();
    assert_eq!(tree_ids, flat_ids);
}

#[test]
fn every_parent_is_the_nearest_shallower_line() {
    let lines = read_lines(&fixture("fixtures/asa-basic.cfg")).expect("read fixture");
    let flat = build_flat(&lines, &asa_options());

    for (pos, node) in flat.iter().enumerate() {
        let expected = flat[..pos]
            .iter()
            .rev()
            .find(|earlier| earlier.indentation < node.indentation)
            .map(|earlier| earlier.id);
        assert_eq!(node.parent_id, expected, "line {}", node.line);
    }
}
