//! Property tests for `MemoryBackend` upsert and capacity semantics.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashMap;

use proptest::prelude::*;
use todo_storage::{MemoryBackend, Record, StorageBackend, StorageError};

#[derive(Debug, Clone)]
enum Op {
    Create(u8, String),
    Update(u8, String),
    Delete(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..12, "[a-z]{0,8}").prop_map(|(id, title)| Op::Create(id, title)),
        (0u8..12, "[a-z]{0,8}").prop_map(|(id, title)| Op::Update(id, title)),
        (0u8..12).prop_map(Op::Delete),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().expect("runtime")
}

proptest! {
    /// Any sequence of operations leaves the backend equal to a plain map
    /// model with the same cap, and never above the cap.
    #[test]
    fn matches_bounded_map_model(ops in proptest::collection::vec(op_strategy(), 0..64), cap in 0usize..8) {
        runtime().block_on(async {
            let backend = MemoryBackend::new(cap);
            let mut model: HashMap<String, String> = HashMap::new();

            for op in ops {
                match op {
                    Op::Create(id, title) | Op::Update(id, title) => {
                        let id = id.to_string();
                        let result = backend.update(Record::new(id.clone(), title.clone())).await;
                        if model.contains_key(&id) || model.len() < cap {
                            prop_assert!(result.is_ok());
                            model.insert(id, title);
                        } else {
                            let rejected = matches!(result, Err(StorageError::CapacityExceeded { .. }));
                            prop_assert!(rejected);
                        }
                    },
                    Op::Delete(id) => {
                        let id = id.to_string();
                        prop_assert_eq!(backend.delete(&id).await.unwrap(), id.clone());
                        model.remove(&id);
                    },
                }
                prop_assert!(backend.len() <= cap);
            }

            let mut actual: Vec<(String, String)> =
                backend.get_all().await.unwrap().into_iter().map(|r| (r.id, r.title)).collect();
            actual.sort();
            let mut expected: Vec<(String, String)> = model.into_iter().collect();
            expected.sort();
            prop_assert_eq!(actual, expected);
            Ok(())
        })?;
    }

    /// Whatever a record contains, `get` returns exactly what `create` stored.
    #[test]
    fn create_then_get_is_identity(id in "[ -~]{0,16}", title in ".{0,32}", description in ".{0,32}") {
        runtime().block_on(async {
            let backend = MemoryBackend::new(1);
            let record = Record::builder().id(id.clone()).title(title).description(description).build();
            backend.create(record.clone()).await.unwrap();
            prop_assert_eq!(backend.get(&id).await.unwrap(), Some(record));
            Ok(())
        })?;
    }
}
