// tests/evaluator_tests.rs

use bandmath::error::{BandmathError, ErrorKind};
use bandmath::evaluator::{evaluate, Environment, Evaluator};
use bandmath::grid::{CellType, Grid};
use bandmath::parser::Parser;
use bandmath::runner::interpret;
use bandmath::source::{MemorySource, RasterSource};
use bandmath::value::Object;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Helpers
// ============================================================================

fn grid(cell_type: CellType, width: usize, height: usize, data: &[f64], nodata: f64) -> Grid {
    Grid::new(cell_type, width, height, data.to_vec(), nodata).unwrap()
}

/// B5/B4: 2x2 UInt16 bands, BQA: UInt16 quality flags, F1: Float32.
fn landsat() -> MemorySource {
    MemorySource::new()
        .with_band("B5", grid(CellType::UInt16, 2, 2, &[4.0, 6.0, 0.0, 10.0], 0.0))
        .with_band("B4", grid(CellType::UInt16, 2, 2, &[2.0, 2.0, 0.0, 10.0], 0.0))
        .with_band("BQA", grid(CellType::UInt16, 2, 2, &[0.0, 4.0, 5.0, 8.0], 1.0))
        .with_band("F1", grid(CellType::Float32, 2, 2, &[0.5, 1.5, 2.5, 3.5], 0.0))
        .with_band("I1", grid(CellType::Int16, 2, 2, &[-1.0, 1.0, 2.0, 3.0], 0.0))
        .with_band("WIDE", grid(CellType::UInt16, 4, 1, &[1.0, 2.0, 3.0, 4.0], 0.0))
        .with_band("NODATA9", grid(CellType::UInt16, 2, 2, &[1.0, 1.0, 1.0, 1.0], 9.0))
}

fn counting_env(bands: MemorySource) -> (Environment, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let env = Environment::new(move |band: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        bands.resolve(band)
    });
    (env, calls)
}

fn eval(source: &str, env: &Environment) -> Object {
    let mut evaluator = Evaluator::new(env);
    interpret(source, &mut evaluator).unwrap_or_else(|errors| panic!("Failed to parse {:?}: {:?}", source, errors))
}

fn eval_error(source: &str, env: &Environment) -> BandmathError {
    match eval(source, env) {
        Object::Error(error) => error,
        other => panic!("expected an error from {:?}, got {}", source, other),
    }
}

fn eval_grid(source: &str, env: &Environment) -> Grid {
    match eval(source, env) {
        Object::Raster(grid) => grid.as_ref().clone(),
        other => panic!("expected a raster from {:?}, got {}", source, other),
    }
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn test_number_arithmetic() {
    let env = Environment::new(MemorySource::new());
    let test_cases = vec![
        ("1 + 2", 3.0),
        ("7 - 10", -3.0),
        ("2.5 * 4", 10.0),
        ("1 / 4", 0.25),
        ("-5 + 2", -3.0),
        ("2 * (3 + 4)", 14.0),
        ("10 - 4 - 3", 3.0),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval(input, &env), Object::Number(expected), "Failed for input: {}", input);
    }
}

#[test]
fn test_number_division_by_zero_is_ieee() {
    let env = Environment::new(MemorySource::new());
    assert_eq!(eval("1 / 0", &env), Object::Number(f64::INFINITY));
    assert_eq!(eval("-1 / 0", &env), Object::Number(f64::NEG_INFINITY));
    assert!(matches!(eval("0 / 0", &env), Object::Number(n) if n.is_nan()));
}

#[test]
fn test_comparisons() {
    let env = Environment::new(MemorySource::new());
    let test_cases = vec![
        ("1 < 2", true),
        ("1 > 2", false),
        ("2 == 2", true),
        ("2 != 2", false),
        ("true != false;", true),
        ("true == true", true),
        ("false == true", false),
        ("(1 < 2) == true", true),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval(input, &env), Object::Boolean(expected), "Failed for input: {}", input);
    }
}

#[test]
fn test_prefix_operators() {
    let env = Environment::new(landsat());
    assert_eq!(eval("!true", &env), Object::Boolean(false));
    assert_eq!(eval("!false", &env), Object::Boolean(true));
    assert_eq!(eval("!!5", &env), Object::Boolean(true));
    assert_eq!(eval("!0", &env), Object::Boolean(false));
    assert_eq!(eval("!B5", &env), Object::Boolean(false));
    assert_eq!(eval("--3", &env), Object::Number(3.0));

    let error = eval_error("-true", &env);
    assert_eq!(error.kind, ErrorKind::UnknownOperator);
    assert_eq!(error.message, "unknown operator: -BOOLEAN");

    assert_eq!(eval_error("-B5", &env).message, "unknown operator: -RASTER");
}

#[test]
fn test_type_errors() {
    let env = Environment::new(MemorySource::new());

    let error = eval_error("1 + true", &env);
    assert_eq!(error.kind, ErrorKind::TypeMismatch);
    assert_eq!(error.message, "type mismatch: NUMBER + BOOLEAN");
    assert_eq!((error.span.start, error.span.end), (0, 8));

    assert_eq!(eval_error("1 == true", &env).kind, ErrorKind::TypeMismatch);

    let error = eval_error("true + false", &env);
    assert_eq!(error.kind, ErrorKind::UnknownOperator);
    assert_eq!(error.message, "unknown operator: BOOLEAN + BOOLEAN");

    assert_eq!(eval_error("1 # 2", &env).message, "unknown operator: NUMBER # NUMBER");
}

// ============================================================================
// Raster algebra
// ============================================================================

#[test]
fn test_ndvi_scenario() {
    let env = Environment::new(landsat());
    let ndvi = eval_grid("(B5 - B4) / (B5 + B4);", &env);

    assert_eq!(ndvi.cell_type(), CellType::Float32);
    assert_eq!((ndvi.width(), ndvi.height()), (2, 2));
    assert_eq!(ndvi.nodata(), 0.0);

    let data = ndvi.data();
    assert!((data[0] - 2.0 / 6.0).abs() < 1e-12);
    assert_eq!(data[1], 0.5);
    // 0 / 0 follows IEEE rules
    assert!(data[2].is_nan());
    assert_eq!(data[3], 0.0);
}

#[test]
fn test_scalar_broadcast_is_commutative() {
    let env = Environment::new(landsat());

    for (a, b) in [("B5 + 1", "1 + B5"), ("B5 * 2", "2 * B5")] {
        let left = eval_grid(a, &env);
        let right = eval_grid(b, &env);
        assert_eq!(left, right, "{} vs {}", a, b);
        assert_eq!(left.cell_type(), CellType::UInt16);
        assert_eq!(left.nodata(), 0.0);
        assert_eq!((left.width(), left.height()), (2, 2));
    }

    assert_eq!(eval_grid("B5 + 1", &env).data(), &[5.0, 7.0, 1.0, 11.0]);
}

#[test]
fn test_scalar_on_the_left_is_not_swapped() {
    let env = Environment::new(landsat());
    assert_eq!(eval_grid("10 - B5", &env).data(), &[6.0, 4.0, 10.0, 0.0]);
    assert_eq!(eval_grid("B5 - 10", &env).data(), &[-6.0, -4.0, -10.0, 0.0]);

    let halves = eval_grid("B5 / 2", &env);
    assert_eq!(halves.data(), &[2.0, 3.0, 0.0, 5.0]);
    assert_eq!(halves.cell_type(), CellType::UInt16);
}

#[test]
fn test_scalar_quotient_keeps_units() {
    let env = Environment::new(landsat());
    let sum = eval_grid("B5 / 2 + B5", &env);
    assert_eq!(sum.data(), &[6.0, 9.0, 0.0, 15.0]);
    assert_eq!(sum.cell_type(), CellType::UInt16);
    assert_eq!(eval_grid("2 / B4", &env).cell_type(), CellType::UInt16);
}

#[test]
fn test_bit_test_wraps_scalar_to_cell_width() {
    let env = Environment::new(
        MemorySource::new()
            .with_band("I1", grid(CellType::Int16, 2, 1, &[-32768.0, 1.0], 0.0))
            .with_band("Q", grid(CellType::UInt16, 2, 1, &[65535.0, 0.0], 0.0)),
    );
    assert_eq!(eval_grid("I1 == 32768", &env).data(), &[1.0, 0.0]);
    assert_eq!(eval_grid("Q == -1", &env).data(), &[1.0, 0.0]);
}

#[test]
fn test_grid_arithmetic_preserves_units() {
    let env = Environment::new(landsat());
    let sum = eval_grid("B5 + B4", &env);
    assert_eq!(sum.data(), &[6.0, 8.0, 0.0, 20.0]);
    assert_eq!(sum.cell_type(), CellType::UInt16);
    assert_eq!(sum.nodata(), 0.0);

    assert_eq!(eval_grid("B5 * B4", &env).data(), &[8.0, 12.0, 0.0, 100.0]);
}

#[test]
fn test_grid_arithmetic_errors_are_distinct() {
    let env = Environment::new(landsat());

    let dims = eval_error("B5 + WIDE", &env);
    assert_eq!(dims.kind, ErrorKind::DimensionMismatch);
    assert!(dims.message.contains("2x2 vs 4x1"));

    let cell_type = eval_error("B5 + F1", &env);
    assert_eq!(cell_type.kind, ErrorKind::CellTypeMismatch);
    assert!(cell_type.kind.is_compatibility());

    let nodata = eval_error("B5 + NODATA9", &env);
    assert_eq!(nodata.kind, ErrorKind::NoDataMismatch);
    assert!(nodata.kind.is_compatibility());
}

#[test]
fn test_unsupported_raster_operators() {
    let env = Environment::new(landsat());
    assert_eq!(eval_error("B5 < B4", &env).message, "unknown operator: RASTER < RASTER");
    assert_eq!(eval_error("B5 == B4", &env).kind, ErrorKind::UnknownOperator);
    assert_eq!(eval_error("B5 != 4", &env).message, "unknown operator: RASTER != NUMBER");
    assert_eq!(eval_error("B5 # 1", &env).message, "unknown operator: RASTER # NUMBER");
    assert_eq!(eval_error("B5 + true", &env).kind, ErrorKind::TypeMismatch);
}

// ============================================================================
// Bitmask and masking
// ============================================================================

#[test]
fn test_equality_against_a_raster_is_a_bit_test() {
    let env = Environment::new(landsat());

    let flags = eval_grid("BQA == 4", &env);
    assert_eq!(flags.cell_type(), CellType::Boolean);
    assert_eq!(flags.data(), &[0.0, 1.0, 1.0, 0.0]);

    assert_eq!(eval_grid("4 == BQA", &env), flags);
    assert_eq!(eval_grid("I1 == 2", &env).data(), &[1.0, 0.0, 1.0, 1.0]);
}

#[test]
fn test_bit_test_requires_16_bit_integers() {
    let env = Environment::new(landsat());
    let error = eval_error("F1 == 1", &env);
    assert_eq!(error.kind, ErrorKind::Masking);
    assert!(error.message.contains("masking not implemented for Float32"));
}

#[test]
fn test_mask_operator() {
    let env = Environment::new(landsat());
    let masked = eval_grid("B5 # (BQA == 4);", &env);

    assert_eq!(masked.data(), &[4.0, 0.0, 0.0, 10.0]);
    assert_eq!(masked.cell_type(), CellType::UInt16);
    // The condition's NoData (1) does not have to match.
    assert_eq!(masked.nodata(), 0.0);
}

#[test]
fn test_mask_with_itself() {
    let env = Environment::new(landsat());
    // 4 & 4 and 6 & 4 overlap; 0 and 10 do not.
    assert_eq!(eval_grid("B5 # (B5 == 4);", &env).data(), &[0.0, 0.0, 0.0, 10.0]);
}

#[test]
fn test_mask_preconditions() {
    let env = Environment::new(landsat());

    let unsupported = eval_error("F1 # (F1 == 4);", &env);
    assert_eq!(unsupported.kind, ErrorKind::Masking);

    let not_boolean = eval_error("B5 # B4", &env);
    assert_eq!(not_boolean.kind, ErrorKind::Masking);
    assert!(not_boolean.message.contains("must be a Boolean raster"));

    let dims = eval_error("WIDE # (BQA == 4)", &env);
    assert_eq!(dims.kind, ErrorKind::DimensionMismatch);
}

// ============================================================================
// Band resolution and program semantics
// ============================================================================

#[test]
fn test_missing_band_is_a_data_source_error() {
    let env = Environment::new(landsat());
    let error = eval_error("B9 + 1", &env);
    assert_eq!(error.kind, ErrorKind::DataSource);
    assert!(error.message.starts_with("raster reading operation failed"));
    assert!(error.message.contains("B9"));
}

#[test]
fn test_each_band_is_resolved_once() {
    let (env, calls) = counting_env(landsat());
    eval("(B5 - B4) / (B5 + B4); B5 * B5;", &env);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_errors_short_circuit_left_to_right() {
    let (env, calls) = counting_env(landsat());

    assert_eq!(eval_error("(1 + true) + B5", &env).kind, ErrorKind::TypeMismatch);
    assert_eq!(eval_error("1 + true; B5;", &env).kind, ErrorKind::TypeMismatch);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert_eq!(eval_error("B9 + (1 + true)", &env).kind, ErrorKind::DataSource);
}

#[test]
fn test_syntax_errors_skip_evaluation() {
    let (env, calls) = counting_env(landsat());
    let mut evaluator = Evaluator::new(&env);

    let errors = interpret("(B5 - ;", &mut evaluator).unwrap_err();
    assert_eq!(errors[0].kind, ErrorKind::Syntax);
    assert!(errors[0].message.contains("';'"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_program_value_is_last_statement() {
    let env = Environment::new(landsat());
    assert_eq!(eval("1; 2; 3", &env), Object::Number(3.0));
    assert_eq!(eval("", &env), Object::Null);
    assert_eq!(eval("{ 1; 2 }", &env), Object::Number(2.0));
    assert_eq!(eval("{}", &env), Object::Null);
    assert_eq!(eval("1; { true; { 4 } }", &env), Object::Number(4.0));
}

#[test]
fn test_evaluation_is_idempotent() {
    let env = Environment::new(landsat());
    let program = Parser::from_source("(B5 + B4) * 2 # (BQA == 8);").parse().unwrap();

    let first = evaluate(&program, &env);
    let second = evaluate(&program, &env);
    assert!(matches!(first, Object::Raster(_)));
    assert_eq!(first, second);
}

#[test]
fn test_error_objects_display() {
    let env = Environment::new(landsat());
    let program = Parser::from_source("B5 + F1").parse().unwrap();
    let result = evaluate(&program, &env);

    assert!(result.is_error());
    assert_eq!(result.type_name(), "ERROR");
    assert!(result.to_string().starts_with("ERROR: raster cell types differ"));
}

#[test]
fn test_raster_display() {
    let env = Environment::new(landsat());
    assert_eq!(eval("(B5 - B4) / (B5 + B4)", &env).to_string(), "RASTER<Float32 2x2, nodata=0>");
    assert_eq!(eval("BQA == 4", &env).to_string(), "RASTER<Boolean 2x2, nodata=1>");
}

#[test]
fn test_results_can_be_shared_across_threads() {
    let env = Environment::new(landsat());
    let Object::Raster(sum) = eval("B5 + B4", &env) else {
        panic!("expected a raster");
    };

    let shared = Arc::clone(&sum);
    let total = std::thread::spawn(move || shared.data().iter().sum::<f64>())
        .join()
        .unwrap();
    assert_eq!(total, 34.0);
    assert_eq!(sum.data(), &[6.0, 8.0, 0.0, 20.0]);
}
