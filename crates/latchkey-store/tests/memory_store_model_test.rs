//! Model-based checks of MemoryStore against a plain HashMap.
//!
//! Leases are long enough never to expire during a case, so the store must
//! behave exactly like "insert if absent / remove if equal".

use std::collections::HashMap;
use std::time::Duration;

use latchkey_store::{KeyValueStore, MemoryStore};
use proptest::prelude::*;

const LEASE: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
enum Op {
    TrySet(usize, usize),
    Get(usize),
    CompareAndDelete(usize, usize),
}

const KEYS: [&str; 3] = ["job-1", "job-2", "job-3"];
const TOKENS: [&str; 3] = ["tok-a", "tok-b", "tok-c"];

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..KEYS.len(), 0..TOKENS.len()).prop_map(|(k, t)| Op::TrySet(k, t)),
        (0..KEYS.len()).prop_map(Op::Get),
        (0..KEYS.len(), 0..TOKENS.len()).prop_map(|(k, t)| Op::CompareAndDelete(k, t)),
    ]
}

proptest! {
    #[test]
    fn memory_store_matches_model(ops in proptest::collection::vec(op_strategy(), 1..64)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        runtime.block_on(async {
            let store = MemoryStore::new();
            let mut model: HashMap<&str, &str> = HashMap::new();

            for op in ops {
                match op {
                    Op::TrySet(k, t) => {
                        let expected = !model.contains_key(KEYS[k]);
                        if expected {
                            model.insert(KEYS[k], TOKENS[t]);
                        }
                        prop_assert_eq!(store.try_set(KEYS[k], TOKENS[t], LEASE).await, expected);
                    }
                    Op::Get(k) => {
                        let expected = model.get(KEYS[k]).map(|t| t.to_string());
                        prop_assert_eq!(store.get(KEYS[k]).await, expected);
                    }
                    Op::CompareAndDelete(k, t) => {
                        let expected = model.get(KEYS[k]) == Some(&TOKENS[t]);
                        if expected {
                            model.remove(KEYS[k]);
                        }
                        prop_assert_eq!(store.compare_and_delete(KEYS[k], TOKENS[t]).await, expected);
                    }
                }
            }

            prop_assert_eq!(store.len(), model.len());
            Ok(())
        })?;
    }
}
