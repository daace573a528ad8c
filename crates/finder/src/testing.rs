//! Test fixtures shared by the backend tests.

use finder_common::Node;

use crate::finder::Finder;
use crate::regexp::Pattern;

pub const TEST_NODE_NAMES: [&str; 3] = [
    "org.cybergarage.finder001",
    "org.cybergarage.finder002",
    "org.cybergarage.finder003",
];

pub fn setup_test_nodes() -> Vec<Node> {
    TEST_NODE_NAMES
        .iter()
        .map(|name| Node::with_host_name(*name))
        .collect()
}

/// Run the common query checks against a finder holding the test nodes
pub async fn finder_test(finder: &dyn Finder) {
    let nodes = finder.all_nodes().await.unwrap();
    assert_eq!(nodes.len(), TEST_NODE_NAMES.len());

    // One node per exact name
    for name in TEST_NODE_NAMES {
        let pattern = Pattern::new(name).unwrap();
        let nodes = finder.regexp_nodes(&pattern).await.unwrap();
        assert_eq!(nodes.len(), 1, "{}", name);
        assert_eq!(nodes[0].host(), name);
    }

    // All nodes
    for expr in [
        ".*",
        "^org.cybergarage.finder",
        "org.cybergarage.finder.*",
        "org.cybergarage.finder00[1-3]",
    ] {
        let pattern = Pattern::new(expr).unwrap();
        let nodes = finder.regexp_nodes(&pattern).await.unwrap();
        assert_eq!(nodes.len(), TEST_NODE_NAMES.len(), "{}", expr);
    }

    // Metrics paths select their node
    for name in TEST_NODE_NAMES {
        for suffix in ["", ".m1", ".system.m1"] {
            let path = format!("{}{}", name, suffix);
            let nodes = finder.prefix_nodes(&path).await.unwrap();
            assert_eq!(nodes.len(), 1, "{}", path);
            assert_eq!(nodes[0].host(), name);
        }
    }
}
