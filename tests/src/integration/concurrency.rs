//! # Concurrent Access
//!
//! - Racing first reads materialize one property per field
//! - Writers on many threads leave cache and store agreeing
//! - Any interleaving of local and external writes keeps the cache coherent

#[cfg(test)]
mod tests {
    use super::super::Profile;
    use proptest::prelude::*;
    use sd_02_kv_stores::{DefaultsDomain, DefaultsStore, InMemoryStore, KeyValueStore};
    use sd_03_coordinator::Coordinator;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    const THREADS: usize = 8;

    fn shared_pair() -> (Coordinator<Profile>, Coordinator<Profile>) {
        let domain = DefaultsDomain::in_memory("concurrency");
        let a: Arc<dyn KeyValueStore> = Arc::new(DefaultsStore::new(Arc::clone(&domain)));
        let b: Arc<dyn KeyValueStore> = Arc::new(DefaultsStore::new(domain));
        (Coordinator::new(a).unwrap(), Coordinator::new(b).unwrap())
    }

    #[test]
    fn test_racing_first_reads_share_one_property() {
        let profile = Arc::new(Coordinator::<Profile>::new(Arc::new(InMemoryStore::new())).unwrap());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let profile = Arc::clone(&profile);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    profile.resolve(&Profile::FONT_SIZE)
                })
            })
            .collect();

        let properties: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(properties.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(profile.materialized_count(), 1);
        assert_eq!(properties[0].observer_count(), 0);
    }

    #[test]
    fn test_parallel_writers_leave_cache_matching_store() {
        let (writer_side, reader_side) = shared_pair();
        let writer_side = Arc::new(writer_side);
        let reader_side = Arc::new(reader_side);
        let notified = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&notified);
        let _sub = reader_side.subscribe(&Profile::FONT_SIZE, move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let writer_side = Arc::clone(&writer_side);
                let reader_side = Arc::clone(&reader_side);
                thread::spawn(move || {
                    for n in 0..50 {
                        let size = i64::try_from(i * 100 + n).unwrap_or_default();
                        writer_side.set(&Profile::FONT_SIZE, size);
                        let _ = reader_side.get(&Profile::FONT_SIZE);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = writer_side.stored_value(&Profile::FONT_SIZE).unwrap();
        assert_eq!(Some(writer_side.get(&Profile::FONT_SIZE)), stored);
        assert_eq!(Some(reader_side.get(&Profile::FONT_SIZE)), stored);
        assert_eq!(notified.load(Ordering::Relaxed), 1 + THREADS * 50);
    }

    #[derive(Debug, Clone)]
    enum Op {
        SetLocal(i64),
        SetExternal(i64),
        RemoveLocal,
        RemoveExternal,
        Garbage,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<i64>().prop_map(Op::SetLocal),
            any::<i64>().prop_map(Op::SetExternal),
            Just(Op::RemoveLocal),
            Just(Op::RemoveExternal),
            Just(Op::Garbage),
        ]
    }

    proptest! {
        #[test]
        fn prop_cache_tracks_store(ops in prop::collection::vec(op(), 1..40)) {
            let (local, external) = shared_pair();
            let _ = local.get(&Profile::FONT_SIZE);

            for op in ops {
                match op {
                    Op::SetLocal(v) => local.set(&Profile::FONT_SIZE, v),
                    Op::SetExternal(v) => external.set(&Profile::FONT_SIZE, v),
                    Op::RemoveLocal => local.remove_stored_value(&Profile::FONT_SIZE),
                    Op::RemoveExternal => external.remove_stored_value(&Profile::FONT_SIZE),
                    Op::Garbage => external
                        .store()
                        .set_native_value("fontSize", sd_02_kv_stores::NativeValue::String("big".into())),
                }

                let expected = local
                    .stored_value(&Profile::FONT_SIZE)
                    .ok()
                    .flatten()
                    .unwrap_or(12);
                prop_assert_eq!(local.get(&Profile::FONT_SIZE), expected);
            }
        }
    }
}
