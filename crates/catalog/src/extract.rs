// ABOUTME: Locates the repeated product records inside a feed tree of unknown shape.
// ABOUTME: Tries rss/channel/item, items/item and products/product, then the first array found depth-first.

use crate::tree::Node;

/// Known container shapes, in priority order.
const KNOWN_SHAPES: &[&[&str]] = &[
    &["rss", "channel", "item"],
    &["items", "item"],
    &["products", "product"],
];

/// Returns the item records of a parsed feed.
///
/// A known shape matching a single record yields a one-element list. When no
/// known shape matches, the object's keys are walked in document order: the
/// first array-valued key is returned as-is, and object-valued keys are
/// searched recursively (known shapes included), stopping at the first
/// non-empty result.
pub fn extract_items(tree: &Node) -> Vec<Node> {
    for shape in KNOWN_SHAPES {
        match tree.path(shape) {
            Some(Node::Array(items)) => return items.clone(),
            Some(node) if node.is_truthy() => return vec![node.clone()],
            _ => {}
        }
    }

    let Node::Object(fields) = tree else {
        return Vec::new();
    };

    for (_, value) in fields {
        match value {
            Node::Array(items) => return items.clone(),
            Node::Object(_) => {
                let nested = extract_items(value);
                if !nested.is_empty() {
                    return nested;
                }
            }
            Node::Scalar(_) => {}
        }
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{parse_xml, Scalar};
    use pretty_assertions::assert_eq;

    fn num(n: f64) -> Node {
        Node::Scalar(Scalar::Number(n))
    }

    fn obj(fields: Vec<(&str, Node)>) -> Node {
        Node::Object(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn test_rss_channel_items() {
        let tree = obj(vec![(
            "rss",
            obj(vec![(
                "channel",
                obj(vec![(
                    "item",
                    Node::Array(vec![obj(vec![("a", num(1.0))]), obj(vec![("a", num(2.0))])]),
                )]),
            )]),
        )]);
        assert_eq!(
            extract_items(&tree),
            vec![obj(vec![("a", num(1.0))]), obj(vec![("a", num(2.0))])]
        );
    }

    #[test]
    fn test_single_item_is_wrapped() {
        let tree = obj(vec![("items", obj(vec![("item", obj(vec![("a", num(1.0))]))]))]);
        assert_eq!(extract_items(&tree), vec![obj(vec![("a", num(1.0))])]);
    }

    #[test]
    fn test_products_shape() {
        let tree = parse_xml("<products><product><sku>A</sku></product><product><sku>B</sku></product></products>")
            .unwrap();
        assert_eq!(extract_items(&tree).len(), 2);
    }

    #[test]
    fn test_priority_prefers_rss() {
        let tree = obj(vec![
            ("products", obj(vec![("product", obj(vec![("p", num(1.0))]))])),
            ("rss", obj(vec![("channel", obj(vec![("item", obj(vec![("r", num(1.0))]))]))])),
        ]);
        assert_eq!(extract_items(&tree), vec![obj(vec![("r", num(1.0))])]);
    }

    #[test]
    fn test_fallback_first_array_anywhere() {
        let tree = obj(vec![(
            "foo",
            obj(vec![(
                "bar",
                obj(vec![("baz", Node::Array(vec![num(1.0), num(2.0), num(3.0)]))]),
            )]),
        )]);
        assert_eq!(extract_items(&tree), vec![num(1.0), num(2.0), num(3.0)]);
    }

    #[test]
    fn test_fallback_is_depth_first_in_key_order() {
        // "first" is searched before "second" even though "second" holds a shallower array.
        let tree = obj(vec![
            ("first", obj(vec![("deep", obj(vec![("list", Node::Array(vec![num(1.0)]))]))])),
            ("second", Node::Array(vec![num(2.0)])),
        ]);
        assert_eq!(extract_items(&tree), vec![num(1.0)]);
    }

    #[test]
    fn test_fallback_finds_known_shape_when_nested() {
        let tree = obj(vec![(
            "envelope",
            obj(vec![("items", obj(vec![("item", obj(vec![("a", num(9.0))]))]))]),
        )]);
        assert_eq!(extract_items(&tree), vec![obj(vec![("a", num(9.0))])]);
    }

    #[test]
    fn test_fallback_skips_empty_subtrees() {
        let tree = obj(vec![
            ("meta", obj(vec![("title", Node::text_value("x"))])),
            ("data", obj(vec![("rows", Node::Array(vec![num(4.0)]))])),
        ]);
        assert_eq!(extract_items(&tree), vec![num(4.0)]);
    }

    #[test]
    fn test_empty_known_shape_falls_through() {
        // <items><item/></items> yields an empty string, which is not a record.
        let tree = parse_xml("<items><item/></items>").unwrap();
        assert!(extract_items(&tree).is_empty());
    }

    #[test]
    fn test_no_items() {
        assert!(extract_items(&Node::Object(vec![])).is_empty());
        assert!(extract_items(&Node::text_value("x")).is_empty());
        let tree = obj(vec![("a", obj(vec![("b", Node::text_value("c"))]))]);
        assert!(extract_items(&tree).is_empty());
    }
}
