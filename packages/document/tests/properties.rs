//! Property tests for tree rewriting

use proptest::prelude::*;
use serde_json::json;
use tabula_document::{extract_all, update_by_id, CellMatrix, CellValue, ContentNode};

fn cell() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        Just(CellValue::Null),
        any::<i64>().prop_map(CellValue::from),
        "[a-z0-9=+ ]{0,8}".prop_map(CellValue::from),
    ]
}

fn matrix() -> impl Strategy<Value = CellMatrix> {
    (1usize..6, 1usize..6).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(prop::collection::vec(cell(), cols), rows)
            .prop_map(|rows| CellMatrix::new(rows).expect("generated rows are equal length"))
    })
}

fn doc() -> ContentNode {
    serde_json::from_value(json!({
        "type": "doc",
        "content": [
            { "type": "paragraph", "content": [{ "type": "text", "text": "intro" }] },
            { "type": "bulletList", "content": [
                { "type": "listItem", "content": [
                    { "type": "spreadsheetNode", "attrs": { "id": "t1", "data": [["a"]] } }
                ]}
            ]},
            { "type": "spreadsheetNode", "attrs": { "id": "t2", "data": [["b"]] } }
        ]
    }))
    .expect("valid tree")
}

proptest! {
    #[test]
    fn update_by_id_is_idempotent(m in matrix()) {
        let tree = doc();
        let once = update_by_id(&tree, "t1", &m);
        let twice = update_by_id(&once, "t1", &m);

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(&extract_all(&twice)["t1"], &m);
    }

    #[test]
    fn update_by_id_leaves_input_and_other_nodes_alone(m in matrix()) {
        let tree = doc();
        let before = tree.clone();
        let updated = update_by_id(&tree, "t1", &m);

        prop_assert_eq!(&tree, &before);
        prop_assert_eq!(&extract_all(&updated)["t2"], &extract_all(&before)["t2"]);
    }
}
