//! Table builder wrapper around comfy-table for consistent list display.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};

use crate::domain::models::DataPoint;

/// Create a standard list table with the given headers.
///
/// Uses the NOTHING preset (no borders) for a clean CLI aesthetic.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Render the table to string with a count header.
pub fn render_list(entity_name: &str, table: &Table, total: usize) -> String {
    if total == 0 {
        return format!("No {entity_name}s found.");
    }
    let noun = if total == 1 {
        entity_name.to_string()
    } else {
        format!("{entity_name}s")
    };
    format!("{total} {noun}:\n{table}")
}

/// One row per point, numbered from 1.
pub fn points_table(points: &[DataPoint]) -> Table {
    let mut table = list_table(&["#", "x", "y"]);
    for (i, point) in points.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(point.x).set_alignment(CellAlignment::Right),
            Cell::new(point.y).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty_list() {
        let table = list_table(&["x", "y"]);
        assert_eq!(render_list("point", &table, 0), "No points found.");
    }

    #[test]
    fn test_points_table_rows() {
        let points = [DataPoint::new(1, 2), DataPoint::new(5, 9)];
        let table = points_table(&points);
        assert_eq!(table.row_iter().count(), 2);

        let rendered = render_list("point", &table, points.len());
        assert!(rendered.starts_with("2 points:"));
        assert!(rendered.contains('9'));
    }
}
