//! Property tests: concurrent writers never lose updates.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;

use proptest::prelude::*;

use modelwatch_core::metrics::Registry;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn counter_total_equals_number_of_increments(
        per_thread in proptest::collection::vec(1u64..300, 1..16),
    ) {
        let reg = Registry::new();
        let c = reg.counter("prop_total", "prop", &["k"]).unwrap();

        let handles: Vec<_> = per_thread
            .iter()
            .map(|&n| {
                let c = Arc::clone(&c);
                thread::spawn(move || {
                    for _ in 0..n {
                        c.inc(&[("k", "v")]).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let expected: u64 = per_thread.iter().sum();
        prop_assert_eq!(c.get(&[("k", "v")]).unwrap(), expected);
    }

    #[test]
    fn histogram_counts_match_observations(
        values in proptest::collection::vec(0.0f64..10.0, 1..400),
        threads in 1usize..8,
    ) {
        let bounds = [0.5, 1.0, 2.5, 5.0];
        let reg = Registry::new();
        let h = reg.histogram("prop_seconds", "prop", &[], &bounds).unwrap();

        let values = Arc::new(values);
        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let h = Arc::clone(&h);
                let values = Arc::clone(&values);
                thread::spawn(move || {
                    for v in values.iter().skip(t).step_by(threads) {
                        h.observe(&[], *v).unwrap();
                    }
                })
            })
            .collect();
        for j in handles {
            j.join().unwrap();
        }

        let snap = h.snapshot();
        let s = snap.single().unwrap();
        prop_assert_eq!(s.count, values.len() as u64);
        for (bound, count) in &s.buckets {
            let want = values.iter().filter(|v| **v <= *bound).count() as u64;
            prop_assert_eq!(*count, want);
        }
        let sum: f64 = values.iter().sum();
        prop_assert!((s.sum - sum).abs() < 1e-6);
    }
}
