//! Group laws on fixed tree pairs

mod common;

use common::{canon, pair};
use nvtrees::{growth, TreePair};
use test_case::test_case;

#[test_case("100,100,2 1" ; "swap")]
#[test_case("11000,10100" ; "x0")]
#[test_case("12000,20100,2 3 1" ; "two colours")]
#[test_case("1200200,1200200,2 1 4 3" ; "quadrant swap")]
#[test_case("1120000,1012000,4 3 2 1" ; "deeper")]
fn inverse_cancels(text: &str) {
    let a = pair(text);
    assert!(a.compose(&a.inverse()).unwrap().reduce().unwrap().is_identity());
    assert!(a.inverse().compose(&a).unwrap().reduce().unwrap().is_identity());
}

#[test_case("100,100,2 1" ; "swap")]
#[test_case("11000,10100" ; "x0")]
#[test_case("1100100,1010100,3 4 1 2" ; "shuffled")]
fn identity_is_neutral(text: &str) {
    let a = pair(text);
    let id = TreePair::identity();
    assert_eq!(canon(&id.compose(&a).unwrap()), canon(&a));
    assert_eq!(canon(&a.compose(&id).unwrap()), canon(&a));
}

#[test]
fn negative_power_is_inverse() {
    let a = pair("1100100,1010100,3 4 1 2");
    assert_eq!(canon(&a.power(-1).unwrap()), canon(&a.inverse()));
    assert_eq!(canon(&a.power(-2).unwrap()), canon(&a.inverse().power(2).unwrap()));
}

#[test]
fn composition_is_associative() {
    let a = pair("100,100,2 1");
    let b = pair("11000,10100");
    let c = pair("11000,11000,3 1 2");
    let left = a.compose(&b).unwrap().compose(&c).unwrap();
    let right = a.compose(&b.compose(&c).unwrap()).unwrap();
    assert_eq!(canon(&left), canon(&right));
}

#[test]
fn composition_applies_left_operand_first() {
    // a swaps the halves, b is x0; the two orders differ
    let a = pair("100,100,2 1");
    let b = pair("11000,10100");
    let ab = a.compose(&b).unwrap();
    let ba = b.compose(&a).unwrap();
    assert!(!TreePair::same_element(&ab, &ba).unwrap());
    // (a b) b⁻¹ = a
    assert_eq!(canon(&ab.compose(&b.inverse()).unwrap()), canon(&a));
}

#[test_case("2320000,2100300,1 4 3 2", "1330000,2033000,2 3 4 1" ; "three colours")]
fn composition_when_greedy_rebuild_stalls(a: &str, b: &str) {
    // refining these leaves no sibling blocks next to each other in any colour order
    let (a, b) = (pair(a), pair(b));
    let ab = a.compose(&b).unwrap();
    assert!(ab.bijection().validate(ab.left(), ab.right()).is_ok());
    assert_eq!(canon(&ab.compose(&b.inverse()).unwrap()), canon(&a));
    assert_eq!(canon(&a.inverse().compose(&ab).unwrap()), canon(&b));
}

#[test]
fn refinement_to_three_colour_pattern() {
    let a = pair("2200300,1101000,1 4 3 2");
    let target: nvtrees::ColoredTree = "1303000".parse().unwrap();
    let refined = a.refine_to(&target).unwrap();
    assert!(TreePair::same_element(&refined, &a).unwrap());
    assert!(refined.num_blocks() >= a.num_blocks());
}

#[test]
fn conjugation_preserves_order() {
    let swap = pair("100,100,2 1");
    let x0 = pair("11000,10100");
    let conj = swap.conjugate(&x0).unwrap();
    assert_eq!(conj.order(8).unwrap(), Some(2));
    let cycle = pair("11000,11000,3 1 2");
    assert_eq!(cycle.order(8).unwrap(), Some(3));
    assert_eq!(cycle.conjugate(&x0).unwrap().order(8).unwrap(), Some(3));
}

#[test]
fn growth_plateaus_at_order() {
    let cycle = pair("11000,11000,3 1 2");
    let counts = growth(&[cycle], 6).unwrap();
    assert_eq!(counts, vec![1, 2, 3, 3, 3, 3, 3]);
    assert!(counts.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn growth_of_two_generators_is_monotone() {
    let gens = [pair("100,100,2 1"), pair("11000,10100")];
    let counts = growth(&gens, 4).unwrap();
    assert_eq!(counts[0], 1);
    assert_eq!(counts[1], 3);
    assert!(counts.windows(2).all(|w| w[0] <= w[1]));
}
