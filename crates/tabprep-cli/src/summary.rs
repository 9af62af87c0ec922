//! Terminal tables for subcommand results.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde_json::Value;

use tabprep_common::format_numeric;
use tabprep_core::{
    ColumnKind, CompactData, DatasetProfile, GraphType, PreviewStep, PreviewValue,
};
use tabprep_model::{Summary, TransformCatalog};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

pub fn catalog_table(catalog: &TransformCatalog) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Transform"),
        header_cell("Defaults"),
        header_cell("Description"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for entry in catalog.entries() {
        let defaults = entry
            .descriptor
            .base_parameters
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(entry.transform_id),
            Cell::new(entry.descriptor.qualified_name()),
            dim_or_dash(&defaults),
            Cell::new(&entry.description),
        ]);
    }
    table
}

pub fn steps_table(summary: &Summary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Field"),
        header_cell("Function"),
        header_cell("Artifact"),
        header_cell("Classes"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for (index, step) in summary.iter().enumerate() {
        let classes = step
            .original_classes()
            .map(|classes| classes.len().to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&step.field_name),
            Cell::new(&step.function_name),
            dim_or_dash(step.artifact_file_name.as_deref().unwrap_or_default()),
            dim_or_dash(&classes),
        ]);
    }
    table
}

/// One row per previewed step, one column per previewed row.
pub fn preview_table(steps: &[PreviewStep]) -> Table {
    let width = steps
        .iter()
        .map(|step| step.test_result.len())
        .max()
        .unwrap_or(0);
    let mut table = Table::new();
    let mut header = vec![header_cell("Field"), header_cell("Function")];
    header.extend((0..width).map(|row| header_cell(&row.to_string())));
    table.set_header(header);
    apply_table_style(&mut table);
    for step in steps {
        let mut row = vec![
            Cell::new(&step.field_name),
            Cell::new(&step.function_name),
        ];
        row.extend(step.test_result.values().map(|value| match value {
            PreviewValue::Number(number) => Cell::new(format_numeric(*number)),
            PreviewValue::Text(text) => Cell::new(text),
        }));
        table.add_row(row);
    }
    table
}

pub fn profile_table(profile: &DatasetProfile) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Type"),
        header_cell("Graph"),
        header_cell("Missing"),
        header_cell("Detail"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    for column in &profile.statistics {
        let (missing, detail) = match &column.compact_data {
            CompactData::Histogram {
                additional_info, ..
            } => {
                let mean = additional_info
                    .mean
                    .map(format_numeric)
                    .unwrap_or_else(|| "-".to_string());
                (additional_info.nan.to_string(), format!("mean {mean}"))
            }
            CompactData::Frequencies {
                elements,
                additional_info,
                ..
            } => {
                let detail = match &additional_info.most_frequence {
                    Some(value) => format!("most frequent {value}"),
                    None => format!("{} distinct", elements.len()),
                };
                (additional_info.nan.to_string(), detail)
            }
            CompactData::Empty {} => (String::new(), String::new()),
        };
        table.add_row(vec![
            Cell::new(&column.name),
            Cell::new(kind_label(column.kind)),
            graph_cell(column.graph_type),
            dim_or_dash(&missing),
            Cell::new(detail),
        ]);
    }
    table
}

/// Compact rendering of inverted target values.
pub fn values_line(values: &[Value]) -> String {
    values
        .iter()
        .map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn kind_label(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Numerical => "numerical",
        ColumnKind::Categorical => "categorical",
    }
}

fn graph_cell(graph: GraphType) -> Cell {
    match graph {
        GraphType::Histogram => Cell::new("histogram"),
        GraphType::Count => Cell::new("count"),
        GraphType::Pie => Cell::new("pie"),
        GraphType::Bar => Cell::new("bar"),
        GraphType::Unavailable => Cell::new("unavailable").fg(Color::Yellow),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_or_dash(value: &str) -> Cell {
    if value.is_empty() {
        Cell::new("-").fg(Color::DarkGrey)
    } else {
        Cell::new(value)
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;
    use tabprep_model::StepRecord;
    use tabprep_transform::default_catalog;

    use super::*;

    #[test]
    fn test_catalog_table_lists_every_entry() {
        let catalog = default_catalog();
        let mut table = catalog_table(&catalog);
        assert_eq!(table.row_count(), catalog.len());
        assert_eq!(table.column_count(), 4);
    }

    #[test]
    fn test_steps_table_marks_drops_without_artifact() {
        let summary = Summary::from(vec![
            StepRecord::dropped("id", 13),
            StepRecord::fitted("temp", "StandardScaler", 11, "T_1_1.json", None),
        ]);
        let table = steps_table(&summary);
        assert_eq!(table.row_count(), 2);
        assert!(table.to_string().contains("T_1_1.json"));
    }

    #[test]
    fn test_preview_table_has_a_column_per_row() {
        let steps = vec![PreviewStep {
            field_name: "temp".to_string(),
            function_name: "StandardScaler".to_string(),
            function_parameter: None,
            test_result: BTreeMap::from([
                (0, PreviewValue::Number(-1.3416)),
                (1, PreviewValue::Number(0.4472)),
            ]),
        }];
        let mut table = preview_table(&steps);
        assert_eq!(table.column_count(), 4);
        assert!(table.to_string().contains("-1.3416"));
    }

    #[test]
    fn test_values_line_unquotes_strings() {
        assert_eq!(values_line(&[json!("y"), json!("x"), json!(2)]), "y, x, 2");
    }
}
