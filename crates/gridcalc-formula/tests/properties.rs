use gridcalc_core::{CellAddress, GridLimits};
use gridcalc_formula::{evaluate, parse, translate, FormulaResult, Value};
use proptest::prelude::*;

fn arb_number() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..=1000).prop_map(|n| n.to_string()),
        (0u32..=1000, 1u32..=99).prop_map(|(i, f)| format!("{}.{}", i, f)),
    ]
}

fn arb_scalar_literal() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_number(),
        Just("TRUE".to_string()),
        Just("false".to_string()),
        Just("\"foo\"".to_string()),
        Just("\"say \"\"hi\"\"\"".to_string()),
        Just("\"\"".to_string()),
    ]
}

fn arb_cell(rows: std::ops::Range<u32>, cols: std::ops::Range<u32>) -> impl Strategy<Value = String> {
    (rows, cols, any::<bool>(), any::<bool>()).prop_map(|(r, c, ra, ca)| {
        CellAddress::with_absolute(r, c, ra, ca).to_a1_string()
    })
}

fn arb_reference() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_cell(20..60, 20..60),
        (arb_cell(20..60, 20..60), arb_cell(20..60, 20..60))
            .prop_map(|(a, b)| format!("{}:{}", a, b)),
    ]
}

/// Wrap leaves into operator and call expressions; children are parenthesized
/// so every generated source parses.
fn arb_source(leaf: BoxedStrategy<String>) -> impl Strategy<Value = String> {
    leaf.prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            (inner.clone(), prop::sample::select(vec!["+", "-", "*", "/"]), inner.clone())
                .prop_map(|(l, op, r)| format!("({}){}({})", l, op, r)),
            (inner.clone(), prop::sample::select(vec!["=", "<>", "<", "<=", ">", ">="]), inner.clone())
                .prop_map(|(l, op, r)| format!("({}) {} ({})", l, op, r)),
            inner.clone().prop_map(|e| format!("-({})", e)),
            prop::collection::vec(inner.clone(), 1..4)
                .prop_map(|args| format!("SUM({})", args.join(", "))),
            (inner.clone(), inner.clone(), inner)
                .prop_map(|(c, a, b)| format!("if({}, {}, {})", c, a, b)),
        ]
    })
}

fn canonical(source: &str) -> String {
    parse(source)
        .expect("generated source parses")
        .expect("generated source is not blank")
        .to_string()
}

fn blank(_row: u32, _col: u32) -> FormulaResult<Option<Value>> {
    Ok(None)
}

proptest! {
    #[test]
    fn prop_display_is_a_fixed_point(
        source in arb_source(prop_oneof![arb_scalar_literal(), arb_reference()].boxed())
    ) {
        let once = canonical(&source);
        let twice = canonical(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_translation_is_invertible(
        source in arb_source(prop_oneof![arb_number(), arb_reference()].boxed()),
        rows in -15i64..=15,
        cols in -15i64..=15,
    ) {
        let limits = GridLimits::default();
        let expr = parse(&source).unwrap().unwrap();

        let moved = translate(&expr, rows, cols, &limits).unwrap();
        let back = translate(&moved, -rows, -cols, &limits).unwrap();
        prop_assert_eq!(back.to_string(), expr.to_string());
    }

    #[test]
    fn prop_reference_free_evaluation_is_pure(
        source in arb_source(arb_scalar_literal().boxed())
    ) {
        let expr = parse(&source).unwrap().unwrap();
        let first = evaluate(&expr, &blank);
        let second = evaluate(&expr, &blank);
        prop_assert_eq!(format!("{:?}", first), format!("{:?}", second));
    }
}
