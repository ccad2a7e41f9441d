//! Debug volume table.
//!
//! Text rendering of the per-bus volume overlay: one row per bus, sorted by
//! name, with current and target volume columns. Only compiled with the
//! `debug-draw` feature.

use crate::mixer::{BusKind, BusSnapshot};

/// Grid of labelled cells rendered as a bordered text table.
///
/// Columns and rows are registered on first use; adding a value for an
/// existing column and row pair overwrites the cell.
#[derive(Debug, Default)]
pub struct VolumeTable {
    column_labels: Vec<String>,
    row_labels: Vec<String>,
    column_widths: Vec<usize>,
    row_gutter: usize,
    elements: Vec<Vec<String>>,
}

impl VolumeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the standard overlay: current and target volume per bus.
    pub fn from_snapshots(rows: &[BusSnapshot]) -> Self {
        let mut sorted: Vec<&BusSnapshot> = rows.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name).then(a.kind.cmp(&b.kind)));

        let mut table = Self::new();
        for row in sorted {
            let label = match row.kind {
                BusKind::SoundClass => row.name.clone(),
                BusKind::Submix => format!("{} (submix)", row.name),
            };
            table.add_element("Current Volume", &label, &format!("{:.4}", row.volume));
            table.add_element("Target Volume", &label, &format!("{:.4}", row.target_volume));
        }
        table
    }

    /// Sets the cell at (`column`, `row`) to `value`, registering the labels
    /// if they are new and widening the layout to fit.
    pub fn add_element(&mut self, column: &str, row: &str, value: &str) {
        let x = match self.column_labels.iter().position(|c| c == column) {
            Some(index) => index,
            None => {
                self.column_labels.push(column.to_string());
                self.column_widths.push(column.len());
                self.column_labels.len() - 1
            }
        };
        let y = match self.row_labels.iter().position(|r| r == row) {
            Some(index) => index,
            None => {
                self.row_labels.push(row.to_string());
                self.elements.push(Vec::new());
                self.row_labels.len() - 1
            }
        };

        self.column_widths[x] = self.column_widths[x].max(value.len());
        self.row_gutter = self.row_gutter.max(row.len());

        let cells = &mut self.elements[y];
        if cells.len() < x + 1 {
            cells.resize(x + 1, String::new());
        }
        cells[x] = value.to_string();
    }

    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty()
    }

    /// Renders the table as bordered text lines. An empty table renders
    /// nothing.
    pub fn render(&self) -> Vec<String> {
        if self.is_empty() {
            return Vec::new();
        }

        let separator = self.separator();
        let mut lines = Vec::with_capacity(self.row_labels.len() + 4);

        lines.push(separator.clone());
        lines.push(self.header());
        lines.push(separator.clone());
        for (y, label) in self.row_labels.iter().enumerate() {
            lines.push(self.row(y, label));
        }
        lines.push(separator);
        lines
    }

    fn separator(&self) -> String {
        let mut line = format!("+-{}-", "-".repeat(self.row_gutter));
        for width in &self.column_widths {
            line.push_str(&format!("+-{}-", "-".repeat(*width)));
        }
        line.push('+');
        line
    }

    fn header(&self) -> String {
        let mut line = format!("| {} ", " ".repeat(self.row_gutter));
        for (label, width) in self.column_labels.iter().zip(&self.column_widths) {
            line.push_str(&format!("| {:<width$} ", label, width = width));
        }
        line.push('|');
        line
    }

    fn row(&self, y: usize, label: &str) -> String {
        let mut line = format!("| {:<width$} ", label, width = self.row_gutter);
        for (x, width) in self.column_widths.iter().enumerate() {
            let value = self.elements[y].get(x).map(String::as_str).unwrap_or("");
            line.push_str(&format!("| {:>width$} ", value, width = width));
        }
        line.push('|');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(name: &str, kind: BusKind, volume: f32, target: f32) -> BusSnapshot {
        BusSnapshot {
            name: name.to_string(),
            kind,
            volume,
            target_volume: target,
            fading: false,
            fading_to_silence: false,
        }
    }

    #[test]
    fn test_empty_table_renders_nothing() {
        assert!(VolumeTable::new().render().is_empty());
    }

    #[test]
    fn test_add_element_overwrites_existing_cells() {
        let mut table = VolumeTable::new();
        table.add_element("Current Volume", "Music", "1.0000");
        table.add_element("Current Volume", "Music", "0.5000");

        let lines = table.render();
        assert!(lines.iter().any(|line| line.contains("0.5000")));
        assert!(!lines.iter().any(|line| line.contains("1.0000")));
    }

    #[test]
    fn test_render_lines_share_one_width() {
        let rows = vec![
            snapshot("Music", BusKind::SoundClass, 0.5, 0.25),
            snapshot("Ambience", BusKind::SoundClass, 1.0, 1.0),
        ];
        let lines = VolumeTable::from_snapshots(&rows).render();

        assert!(!lines.is_empty());
        let width = lines[0].len();
        for line in &lines {
            assert_eq!(line.len(), width);
        }
    }

    #[test]
    fn test_from_snapshots_sorts_rows_by_name() {
        let rows = vec![
            snapshot("Music", BusKind::SoundClass, 0.5, 0.25),
            snapshot("Ambience", BusKind::SoundClass, 1.0, 1.0),
        ];
        let lines = VolumeTable::from_snapshots(&rows).render();

        let ambience = lines.iter().position(|l| l.contains("Ambience")).unwrap();
        let music = lines.iter().position(|l| l.contains("Music")).unwrap();
        assert!(ambience < music);
    }

    #[test]
    fn test_from_snapshots_formats_both_volume_columns() {
        let rows = vec![snapshot("Music", BusKind::SoundClass, 0.5, 0.25)];
        let lines = VolumeTable::from_snapshots(&rows).render();

        assert!(lines.iter().any(|l| l.contains("Current Volume")));
        assert!(lines.iter().any(|l| l.contains("Target Volume")));
        let row = lines.iter().find(|l| l.contains("Music")).unwrap();
        assert!(row.contains("0.5000"));
        assert!(row.contains("0.2500"));
    }

    #[test]
    fn test_submix_rows_are_marked() {
        let rows = vec![snapshot("Reverb", BusKind::Submix, 1.0, 1.0)];
        let lines = VolumeTable::from_snapshots(&rows).render();
        assert!(lines.iter().any(|l| l.contains("Reverb (submix)")));
    }
}
