//! Property tests over the cell round-trip and the embedding boundary.

use std::sync::Arc;

use convex_cells::cell::Cell;
use convex_cells::limits::MAX_EMBEDDED_LENGTH;
use proptest::prelude::*;

fn leaf_cell() -> impl Strategy<Value = Arc<Cell>> {
    prop_oneof![
        Just(Cell::null()),
        any::<bool>().prop_map(Cell::bool),
        any::<i64>().prop_map(Cell::long),
        any::<u64>().prop_map(Cell::address),
        any::<f64>().prop_map(Cell::double),
        proptest::collection::vec(any::<u8>(), 0..32).prop_map(Cell::blob),
        "[a-z]{0,16}".prop_map(Cell::string),
    ]
}

fn small_cell() -> impl Strategy<Value = Arc<Cell>> {
    leaf_cell().prop_recursive(3, 16, 4, |inner| {
        proptest::collection::vec(inner, 0..4)
            .prop_map(|items| Cell::vector(items).expect("vector construction cannot fail"))
    })
}

proptest! {
    #[test]
    fn decode_of_encode_is_identity(cell in small_cell()) {
        let bytes = cell.encoding().to_vec();
        let decoded = Cell::read(&bytes).expect("round trip");
        prop_assert_eq!(decoded.data(), cell.data());
        prop_assert_eq!(decoded.hash(), cell.hash());
    }

    #[test]
    fn encode_of_decode_of_encode_is_a_fixed_point(cell in small_cell()) {
        let bytes = cell.encoding().to_vec();
        let decoded = Cell::read(&bytes).expect("round trip");
        prop_assert_eq!(decoded.encoding(), bytes.as_slice());
    }

    #[test]
    fn encoding_is_stable_across_repeated_calls(cell in small_cell()) {
        let first = cell.encoding().to_vec();
        let second = cell.encoding().to_vec();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn blob_exactly_at_the_embedding_boundary_is_embedded(len in 1usize..8) {
        // A BlobLeaf's own encoding is tag(1) + VLQ-Count length prefix(1) + bytes.
        // Keep `len` small so the whole thing sits comfortably under the limit.
        let blob = Cell::blob(vec![0u8; len]);
        prop_assert!(blob.encoding_length() <= MAX_EMBEDDED_LENGTH);
        prop_assert!(blob.is_embeddable());
    }

    #[test]
    fn blob_past_the_embedding_boundary_is_not_embedded(extra in 1usize..64) {
        let blob = Cell::blob(vec![0u8; MAX_EMBEDDED_LENGTH + extra]);
        prop_assert!(blob.encoding_length() > MAX_EMBEDDED_LENGTH);
        prop_assert!(!blob.is_embeddable());
    }
}
