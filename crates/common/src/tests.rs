use super::*;
use pretty_assertions::assert_eq;
use std::cmp::Ordering::{Equal, Greater, Less};

#[test]
fn binary_operator_eval() {
    assert!(BinaryOperator::Equal.eval(3, 3));
    assert!(!BinaryOperator::Equal.eval(3, 4));
    assert!(BinaryOperator::NotEqual.eval(3, 4));
    assert!(BinaryOperator::Less.eval(-1, 0));
    assert!(BinaryOperator::Leq.eval(5, 5));
    assert!(BinaryOperator::Greater.eval(7, 2));
    assert!(BinaryOperator::Geq.eval(2, 2));
    assert!(!BinaryOperator::Geq.eval(1, 2));
}

#[test]
fn compare_rows_respects_direction() {
    let keys = [SortKey {
        column: 1,
        direction: SortDirection::Desc,
    }];
    assert_eq!(compare_rows(&[0, 10], &[0, 20], &keys), Greater);
    assert_eq!(compare_rows(&[0, 20], &[0, 10], &keys), Less);
    assert_eq!(compare_rows(&[0, 10], &[9, 10], &keys), Equal);
}

#[test]
fn compare_rows_composite_key() {
    let keys = [
        SortKey {
            column: 0,
            direction: SortDirection::Asc,
        },
        SortKey {
            column: 1,
            direction: SortDirection::Desc,
        },
    ];
    assert_eq!(compare_rows(&[1, 5], &[2, 9], &keys), Less);
    assert_eq!(compare_rows(&[1, 5], &[1, 9], &keys), Greater);
    assert_eq!(compare_rows(&[1, 5], &[1, 5], &keys), Equal);
}

#[test]
fn min_accumulator_has_no_finite_sentinel() {
    let mut acc = Accumulator::new(AggregateFn::Min);
    acc.push(5000);
    acc.push(7000);
    assert_eq!(acc.finish(), 5000);

    let mut acc = Accumulator::new(AggregateFn::Min);
    acc.push(i64::MAX);
    assert_eq!(acc.finish(), i64::MAX);
}

#[test]
fn max_accumulator_handles_negatives() {
    let mut acc = Accumulator::new(AggregateFn::Max);
    acc.push(-9);
    acc.push(-3);
    acc.push(-7);
    assert_eq!(acc.finish(), -3);
}

#[test]
fn avg_uses_integer_division() {
    let mut acc = Accumulator::new(AggregateFn::Avg);
    for v in [3, 9, 6] {
        acc.push(v);
    }
    assert_eq!(acc.finish(), 6);

    let mut acc = Accumulator::new(AggregateFn::Avg);
    for v in [1, 2] {
        acc.push(v);
    }
    assert_eq!(acc.finish(), 1);
}

#[test]
fn count_ignores_values() {
    let mut acc = Accumulator::new(AggregateFn::Count);
    for v in [42, 42, 0] {
        acc.push(v);
    }
    assert_eq!(acc.finish(), 3);
}

#[test]
fn accumulator_reset_clears_state() {
    let mut acc = Accumulator::new(AggregateFn::Sum);
    acc.push(10);
    acc.reset();
    acc.push(2);
    assert_eq!(acc.finish(), 2);
}

#[test]
fn config_row_capacity() {
    let config = Config::builder().block_size(32).build();
    assert_eq!(config.max_rows_per_block(2), 2);

    let config = Config::default();
    assert_eq!(config.max_rows_per_block(2), 62);
    assert_eq!(config.max_rows_per_block(1), 125);
}

#[test]
fn config_paths_are_rooted_in_data_dir() {
    let config = Config::builder()
        .data_dir(std::path::PathBuf::from("/tmp/d"))
        .build();
    assert_eq!(config.csv_path("t"), std::path::PathBuf::from("/tmp/d/t.csv"));
    assert_eq!(
        config.temp_csv_path("t"),
        std::path::PathBuf::from("/tmp/d/temp/t.csv")
    );
    assert_eq!(
        config.script_path("q"),
        std::path::PathBuf::from("/tmp/d/q.ra")
    );
}

#[test]
fn matrix_block_side_fits_block() {
    let config = Config::default();
    let side = config.matrix_block_side();
    assert!(side * side * std::mem::size_of::<i64>() <= config.block_size);
    assert_eq!(side, 11);
}

#[test]
fn render_rows_includes_header_and_values() {
    let out = pretty::render_rows(&["id".into(), "val".into()], &[vec![1, 10], vec![2, 20]]);
    assert!(out.contains("id"));
    assert!(out.contains("20"));
}
