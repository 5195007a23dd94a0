//! Whole-engine properties

use gridcalc::prelude::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

type Snapshot = Vec<((u32, u32), CellState, Option<Value>, Option<FormulaError>)>;

fn snapshot(engine: &Engine) -> Snapshot {
    let mut cells = Vec::new();
    for row in 0..3 {
        for col in 0..3 {
            cells.push((
                (row, col),
                engine.state(row, col),
                engine.value(row, col).cloned(),
                engine.error(row, col).cloned(),
            ));
        }
    }
    cells
}

fn arb_input() -> impl Strategy<Value = String> {
    prop_oneof![
        (-5i32..=5).prop_map(|n| n.to_string()),
        Just("text".to_string()),
        Just("TRUE".to_string()),
        Just("=A1+B2".to_string()),
        Just("=C3*2".to_string()),
        Just("=SUM(A1:C1)".to_string()),
        Just("=SUM(A1:C3)".to_string()),
        Just("=MAX(B1:B3)-A3".to_string()),
        Just("=IF(A2>B2, A2, B2)".to_string()),
        Just("=INDEX(A1:C3, 2, 3)".to_string()),
        Just("=1/A1".to_string()),
        Just("=".to_string()),
    ]
}

fn arb_sheet() -> impl Strategy<Value = Vec<((u32, u32), String)>> {
    prop::collection::btree_map((0u32..3, 0u32..3), arb_input(), 1..9)
        .prop_map(|cells| cells.into_iter().collect())
}

fn build(inputs: &[((u32, u32), String)]) -> Engine {
    let mut engine = Engine::new();
    for ((row, col), input) in inputs {
        engine.set_input(*row, *col, input).unwrap();
    }
    engine
}

#[test]
fn test_section_examples() {
    let mut engine = Engine::new();
    engine.set_formula(0, 0, "5").unwrap();
    assert_eq!(engine.value(0, 0), Some(&Value::Number(5.0)));
    engine.set_formula(0, 0, "TRUE").unwrap();
    assert_eq!(engine.value(0, 0), Some(&Value::Boolean(true)));
    engine.set_formula(0, 0, "\"x\"").unwrap();
    assert_eq!(engine.value(0, 0), Some(&Value::Text("x".into())));

    // A text element fails SUM at the SUM call position
    let mut engine = Engine::new();
    engine.set_input(0, 0, "1").unwrap();
    engine.set_input(1, 0, "two").unwrap();
    engine.set_input(2, 0, "3").unwrap();
    engine.set_formula(0, 1, "SUM(A1:A3)").unwrap();
    let err = engine.error(0, 1).unwrap();
    assert_eq!(err.kind(), ErrorKind::ArgumentType);
    assert_eq!(err.position(), Some(0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_final_state_is_independent_of_entry_order(
        inputs in arb_sheet().prop_shuffle()
    ) {
        let forward = build(&inputs);
        let mut reversed_inputs = inputs.clone();
        reversed_inputs.reverse();
        let reversed = build(&reversed_inputs);

        prop_assert_eq!(snapshot(&forward), snapshot(&reversed));
    }

    #[test]
    fn prop_recalculate_all_is_a_no_op(inputs in arb_sheet()) {
        let mut engine = build(&inputs);
        let before = snapshot(&engine);
        engine.recalculate_all();
        prop_assert_eq!(before, snapshot(&engine));
    }

    #[test]
    fn prop_cycles_leave_no_residue(inputs in arb_sheet()) {
        let mut engine = build(&inputs);
        for row in 0..3 {
            for col in 0..3 {
                engine.clear(row, col).unwrap();
            }
        }
        for row in 0..3 {
            for col in 0..3 {
                prop_assert_eq!(engine.state(row, col), CellState::Empty);
                prop_assert!(engine.precedents(row, col).is_empty());
            }
        }
    }
}
