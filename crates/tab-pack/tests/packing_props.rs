//! Property tests for the packers: every logical channel survives a
//! pack/unpack round trip, and nothing leaks into tail bits or padding.

use proptest::prelude::*;

use tab_core::{FloatTensor, Padding, TensorShape};
use tab_pack::{binarize, padding_clear, tail_bits_clear, ternarize, unpack, TernaryWord};

// Shapes small enough to keep cases fast but with channel counts on both
// sides of the 64-bit word boundary.
fn shape_strategy() -> impl Strategy<Value = (TensorShape, Padding)> {
    (1usize..3, 1usize..150, 1usize..4, 1usize..4, 0usize..3, 0usize..3)
        .prop_map(|(n, c, h, w, ph, pw)| (TensorShape::new(n, c, h, w), Padding::new(ph, pw)))
}

fn symbols(len: usize, ternary: bool) -> impl Strategy<Value = Vec<i8>> {
    let choice = if ternary {
        prop::sample::select(vec![-1i8, 0, 1])
    } else {
        prop::sample::select(vec![-1i8, 1])
    };
    prop::collection::vec(choice, len)
}

proptest! {
    #[test]
    fn binary_round_trip(
        (shape, padding, syms) in shape_strategy().prop_flat_map(|(shape, padding)| {
            (Just(shape), Just(padding), symbols(shape.numel(), false))
        })
    ) {
        let x = FloatTensor::from_vec(syms.iter().map(|&s| s as f32).collect(), shape).unwrap();
        let q = binarize(&x, padding, None);

        prop_assert_eq!(unpack(&q), syms);
        prop_assert!(tail_bits_clear(&q));
        prop_assert!(padding_clear(&q));
    }

    #[test]
    fn ternary_round_trip(
        (shape, padding, syms) in shape_strategy().prop_flat_map(|(shape, padding)| {
            (Just(shape), Just(padding), symbols(shape.numel(), true))
        })
    ) {
        let x = FloatTensor::from_vec(syms.iter().map(|&s| s as f32).collect(), shape).unwrap();
        let q = ternarize(&x, padding, &vec![0.5; shape.n]);

        prop_assert_eq!(unpack(&q), syms);
        prop_assert!(tail_bits_clear(&q));
        prop_assert!(padding_clear(&q));
        let invalid: u32 = q
            .words()
            .chunks_exact(2)
            .map(|p| TernaryWord::from_planes(p).count_invalid())
            .sum();
        prop_assert_eq!(invalid, 0);
    }
}

#[test]
fn sixty_four_vs_fifty_two_channels() {
    for c in [52usize, 64] {
        let shape = TensorShape::new(1, c, 2, 2);
        let syms: Vec<i8> = (0..shape.numel()).map(|i| [1i8, -1, 0][i % 3]).collect();
        let x = FloatTensor::from_vec(syms.iter().map(|&s| s as f32).collect(), shape).unwrap();
        let q = ternarize(&x, Padding::square(1), &[0.5]);
        assert_eq!(q.shape().c, 1);
        assert_eq!(unpack(&q), syms, "c = {c}");
        assert!(tail_bits_clear(&q));
    }
}
