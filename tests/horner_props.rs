//! Round-trip and boundary properties of the Horner codec.

use proptest::prelude::*;
use uacalc_kernel::util::horner::{
    horner, horner_inv, horner_uniform, horner_inv_uniform, left_right_reverse, reverse,
};

#[test]
fn worked_example() {
    assert_eq!(horner(&[1, 2, 3], &[4, 5, 6]).unwrap(), 45);
    assert_eq!(horner_inv(45, &[4, 5, 6]).unwrap(), vec![1, 2, 3]);
}

#[test]
fn reverse_is_involutive() {
    let v = vec![3, 1, 4, 1, 5];
    assert_eq!(reverse(&reverse(&v)), v);
}

#[test]
fn uniform_and_mixed_agree() {
    for k in 0..27 {
        assert_eq!(
            horner_inv(k, &[3, 3, 3]).unwrap(),
            horner_inv_uniform(k, 3, 3).unwrap()
        );
    }
}

proptest! {
    #[test]
    fn encode_decode_round_trip(sizes in prop::collection::vec(1usize..6, 1..5), seed in any::<u64>()) {
        let product: usize = sizes.iter().product();
        prop_assume!(product > 0);
        let k = (seed as usize) % product;
        let tuple = horner_inv(k, &sizes).unwrap();
        prop_assert_eq!(tuple.len(), sizes.len());
        for (t, s) in tuple.iter().zip(&sizes) {
            prop_assert!(t < s);
        }
        prop_assert_eq!(horner(&tuple, &sizes).unwrap(), k);
    }

    #[test]
    fn decode_encode_round_trip(sizes in prop::collection::vec(1usize..6, 1..5), picks in prop::collection::vec(any::<u64>(), 4)) {
        let tuple: Vec<usize> = sizes
            .iter()
            .enumerate()
            .map(|(i, &s)| (picks[i % picks.len()] as usize) % s)
            .collect();
        let k = horner(&tuple, &sizes).unwrap();
        prop_assert_eq!(horner_inv(k, &sizes).unwrap(), tuple);
    }

    #[test]
    fn left_right_reverse_involutive(arity in 1usize..4, size in 1usize..4, seed in any::<u64>()) {
        let len = size.pow(arity as u32);
        let table: Vec<usize> = (0..len)
            .map(|i| ((seed as usize).wrapping_add(i * 31)) % size)
            .collect();
        let rev = left_right_reverse(&table, size, arity).unwrap();
        prop_assert_eq!(left_right_reverse(&rev, size, arity).unwrap(), table);
    }

    #[test]
    fn out_of_range_is_rejected(size in 1usize..6, arity in 1usize..4) {
        let mut args = vec![0usize; arity];
        args[0] = size;
        prop_assert!(horner_uniform(&args, size).is_err());
    }
}
