//! Expression language end to end

mod common;

use common::{canon, pair};
use nvtrees::{
    ExpressionEngine, LeafBijection, NameError, NvError, ParseErrorKind, PermutationError,
    TreePair, VariableEnvironment,
};
use test_case::test_case;

fn setup() -> (ExpressionEngine, VariableEnvironment) {
    let mut env = VariableEnvironment::new();
    env.insert("A", pair("100,100,2 1")).unwrap();
    env.insert("B", pair("11000,10100")).unwrap();
    env.insert("C", pair("11000,11000,3 1 2")).unwrap();
    (ExpressionEngine::default(), env)
}

fn eval(engine: &mut ExpressionEngine, env: &mut VariableEnvironment, text: &str) -> TreePair {
    engine
        .evaluate(text, env)
        .unwrap_or_else(|err| panic!("{}: {}", text, err))
}

#[test_case("A^B*C", "(A^B)*C" ; "power before compose")]
#[test_case("A*B*C", "A*(B*C)" ; "rightmost compose first")]
#[test_case("!A*B", "(!A)*B" ; "unary before binary")]
#[test_case("A#B^2", "A#(B^2)" ; "power before commutator")]
#[test_case("A times B", "A*B" ; "word operator")]
fn precedence(text: &str, explicit: &str) {
    let (mut engine, mut env) = setup();
    let implicit = eval(&mut engine, &mut env, text);
    let explicit = eval(&mut engine, &mut env, explicit);
    assert_eq!(implicit.to_string(), explicit.to_string());
}

#[test]
fn parser_renders_precedence() {
    let engine = ExpressionEngine::default();
    assert_eq!(engine.parse("A^B*C").unwrap().to_string(), "((A ^ B) * C)");
    assert_eq!(engine.parse("A*B*C").unwrap().to_string(), "(A * (B * C))");
}

#[test]
fn operators_match_pair_methods() {
    let (mut engine, mut env) = setup();
    let a = env.get_pair("A").unwrap().clone();
    let b = env.get_pair("B").unwrap().clone();
    let compose = eval(&mut engine, &mut env, "A*B");
    assert_eq!(compose, a.compose(&b).unwrap());
    let conj = eval(&mut engine, &mut env, "A^B");
    assert_eq!(conj, a.conjugate(&b).unwrap());
    let comm = eval(&mut engine, &mut env, "A#B");
    assert_eq!(comm, a.commutator(&b).unwrap());
    let reduced = eval(&mut engine, &mut env, "$(B*!B)");
    assert!(reduced.is_identity());
    let square = eval(&mut engine, &mut env, "C^2");
    assert_eq!(canon(&square), canon(&eval(&mut engine, &mut env, "C^-1")));
}

#[test]
fn literals_and_assignment() {
    let (mut engine, mut env) = setup();
    let d = eval(&mut engine, &mut env, "D = {12000,20100,2 3 1}");
    assert_eq!(d.left().leaf_count(), d.right().leaf_count());
    assert_eq!(d.permutation_array().unwrap().len(), d.left().leaf_count());
    assert_eq!(env.get_pair("D").unwrap(), &d);
    assert_eq!(env.last_result(), Some(&d));
}

#[test]
fn consecutive_operators_fail() {
    let (mut engine, mut env) = setup();
    let err = engine.evaluate("A**B", &mut env).unwrap_err();
    assert!(matches!(
        err,
        NvError::Parse(ref e) if e.kind == ParseErrorKind::ConsecutiveOperators
    ));
}

#[test]
fn undefined_name_leaves_environment_clean() {
    let (mut engine, mut env) = setup();
    let before = env.names().len();
    let err = engine.evaluate("z*A", &mut env).unwrap_err();
    assert_eq!(err, NvError::Name(NameError::Undefined { name: "z".into() }));
    assert!(!env.contains("z"));
    assert_eq!(env.names().len(), before);
}

#[test]
fn short_permutation_fails() {
    let tree = "12000".parse().unwrap();
    let result = LeafBijection::parse("1 2", &tree, &tree);
    assert!(matches!(result, Err(PermutationError::LengthMismatch { .. })));
    let (mut engine, mut env) = setup();
    assert!(matches!(
        engine.evaluate("{12000,20100,1 2}", &mut env),
        Err(NvError::Permutation(_))
    ));
}
