use ndarray::Array2;
use polars::prelude::*;
use proptest::prelude::*;
use tabprep_common::column_names;
use tabprep_model::TransformDescriptor;
use tabprep_transform::{
    Category, ColumnShape, TransformOutput, classify, default_registry, integrate, read_column,
};

fn output_strategy() -> impl Strategy<Value = (usize, TransformOutput)> {
    (1usize..8, 0usize..6, any::<bool>()).prop_map(|(rows, width, rank_one)| {
        let output = if rank_one {
            TransformOutput::Vector(ndarray::Array1::zeros(rows))
        } else {
            TransformOutput::Matrix(Array2::zeros((rows, width)))
        };
        (rows, output)
    })
}

proptest! {
    #[test]
    fn classification_is_deterministic((rows, output) in output_strategy()) {
        let shape = ColumnShape::new(rows, 1);
        let first = classify("AnyTransform", shape, &output).unwrap();
        let second = classify("AnyTransform", shape, &output).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn wide_outputs_add_exactly_width_columns(width in 2usize..6) {
        let mut df = df!("x" => &[1.0, 2.0, 3.0], "keep" => &[0i64, 1, 2]).unwrap();
        let output = TransformOutput::Matrix(Array2::zeros((3, width)));
        let category = classify("AnyTransform", ColumnShape::new(3, 1), &output).unwrap();
        prop_assert_eq!(category, Category::ExpandColumns { width });

        integrate(&mut df, "x", category, &output).unwrap();
        let names = column_names(&df);
        prop_assert!(!names.contains(&"x".to_string()));
        let expanded: Vec<String> = (0..width).map(|i| format!("x_{i}")).collect();
        prop_assert_eq!(&names[1..], expanded.as_slice());
    }
}

fn fit_field(df: &mut DataFrame, function: &str, field: &str) -> Category {
    let descriptor = TransformDescriptor::new("sklearn", "preprocessing", function);
    let mut transformer = default_registry().resolve(&descriptor).unwrap();
    let input = read_column(df, field).unwrap();
    let output = transformer.fit_transform(&input).unwrap();
    let category = classify(function, ColumnShape::of(&input), &output).unwrap();
    integrate(df, field, category, &output).unwrap();
    category
}

#[test]
fn standard_scaler_overwrites_in_place() {
    let mut df = df!("temp" => &[10.0, 20.0, 30.0], "id" => &[1i64, 2, 3]).unwrap();
    let category = fit_field(&mut df, "StandardScaler", "temp");
    assert_eq!(category, Category::OverwriteScalar);
    assert_eq!(column_names(&df), vec!["temp", "id"]);

    let mean = df.column("temp").unwrap().as_materialized_series().mean().unwrap();
    assert!(mean.abs() < 1e-12);
}

#[test]
fn one_hot_encoder_expands_seasons() {
    let mut df = df!(
        "season" => &["spring", "summer", "fall", "winter"],
        "id" => &[1i64, 2, 3, 4],
    )
    .unwrap();
    let category = fit_field(&mut df, "OneHotEncoder", "season");
    assert_eq!(category, Category::ExpandColumns { width: 4 });
    assert_eq!(
        column_names(&df),
        vec!["id", "season_0", "season_1", "season_2", "season_3"]
    );
}

#[test]
fn label_encoder_encodes_in_place() {
    let mut df = df!("color" => &["red", "blue", "red"]).unwrap();
    let category = fit_field(&mut df, "LabelEncoder", "color");
    assert_eq!(category, Category::EncodeScalar);
    let codes: Vec<Option<f64>> = df
        .column("color")
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(codes, vec![Some(1.0), Some(0.0), Some(1.0)]);
}

#[test]
fn normalizer_on_one_column_is_skipped() {
    let mut df = df!("temp" => &[3.0, -4.0]).unwrap();
    let before = df.clone();
    let category = fit_field(&mut df, "Normalizer", "temp");
    assert_eq!(category, Category::NoOp);
    assert!(df.equals(&before));
}
