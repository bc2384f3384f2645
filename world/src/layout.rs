//! Text format for maze layouts.
//!
//! Each line is one row. `#` marks a wall, `X` an obstacle, and `.` or a
//! space open floor. Blank lines before and after the grid are ignored.

use maze_whiskers_core::{CellKind, MazeLayout};
use thiserror::Error;

/// Reasons a textual layout could not be parsed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The input held no rows.
    #[error("maze layout is empty")]
    Empty,
    /// A row's width differed from the first row's width.
    #[error("row {row} has {found} cells but the maze is {expected} cells wide")]
    Ragged {
        /// Zero-based index of the offending row.
        row: usize,
        /// Width established by the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A character outside the layout alphabet appeared.
    #[error("unknown glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        column: usize,
    },
    /// The grid does not fit the coordinate range.
    #[error("maze layout of {columns}x{rows} cells is too large")]
    TooLarge {
        /// Parsed column count.
        columns: usize,
        /// Parsed row count.
        rows: usize,
    },
}

/// Parses a textual layout into a dense grid.
pub fn parse_layout(text: &str) -> Result<MazeLayout, LayoutError> {
    let lines: Vec<&str> = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .collect();
    let first = lines.iter().position(|line| !line.trim().is_empty());
    let last = lines.iter().rposition(|line| !line.trim().is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return Err(LayoutError::Empty);
    };
    let rows = &lines[first..=last];

    let expected = rows[0].chars().count();
    let mut cells = Vec::with_capacity(expected * rows.len());
    for (row_index, row) in rows.iter().enumerate() {
        let found = row.chars().count();
        if found != expected {
            return Err(LayoutError::Ragged {
                row: row_index,
                expected,
                found,
            });
        }

        for (column, glyph) in row.chars().enumerate() {
            let kind = match glyph {
                '#' => CellKind::Wall,
                'X' => CellKind::Obstacle,
                '.' | ' ' => CellKind::Empty,
                _ => {
                    return Err(LayoutError::UnknownGlyph {
                        glyph,
                        row: row_index,
                        column,
                    })
                }
            };
            cells.push(kind);
        }
    }

    let too_large = LayoutError::TooLarge {
        columns: expected,
        rows: rows.len(),
    };
    let columns = u32::try_from(expected).map_err(|_| too_large.clone())?;
    let row_count = u32::try_from(rows.len()).map_err(|_| too_large.clone())?;
    MazeLayout::from_cells(columns, row_count, cells).ok_or(too_large)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_whiskers_core::CellCoord;

    #[test]
    fn parses_walls_obstacles_and_floor() {
        let layout = parse_layout("\n#.#\n.X \n").expect("valid layout");

        assert_eq!(layout.columns(), 3);
        assert_eq!(layout.rows(), 2);
        assert_eq!(layout.kind(CellCoord::new(0, 0)), Some(CellKind::Wall));
        assert_eq!(layout.kind(CellCoord::new(1, 0)), Some(CellKind::Empty));
        assert_eq!(layout.kind(CellCoord::new(1, 1)), Some(CellKind::Obstacle));
        assert_eq!(layout.kind(CellCoord::new(2, 1)), Some(CellKind::Empty));
    }

    #[test]
    fn rejects_ragged_rows() {
        assert_eq!(
            parse_layout("###\n##\n"),
            Err(LayoutError::Ragged {
                row: 1,
                expected: 3,
                found: 2,
            })
        );
    }

    #[test]
    fn rejects_unknown_glyphs() {
        assert_eq!(
            parse_layout("#?#"),
            Err(LayoutError::UnknownGlyph {
                glyph: '?',
                row: 0,
                column: 1,
            })
        );
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(parse_layout("  \n\n"), Err(LayoutError::Empty));
    }
}
