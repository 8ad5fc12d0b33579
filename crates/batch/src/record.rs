//! Per-object output rows.

use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use u_circlepack_core::Layout;

/// CSV header of the layout file.
pub const CSV_HEADER: &str = "id,x,y,deg";

/// One object of one layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Layout size.
    pub n: usize,
    /// Object index within the layout.
    pub index: usize,
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// Rotation in degrees (always 0 for circles).
    pub deg: f64,
}

impl RunRecord {
    /// Row identifier, `"{n}_{index}"`.
    pub fn id(&self) -> String {
        format!("{}_{}", self.n, self.index)
    }

    /// Rows for every object of `layout`, in index order.
    pub fn from_layout(layout: &Layout) -> Vec<Self> {
        let n = layout.n();
        layout
            .objects()
            .map(|c| Self {
                n,
                index: c.index,
                x: c.position.x,
                y: c.position.y,
                deg: 0.0,
            })
            .collect()
    }

    /// Writes this row without a trailing header.
    pub fn write_csv_row<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{},{},{},{:.1}", self.id(), self.x, self.y, self.deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    #[test]
    fn test_ids_follow_index() {
        let layout = Layout::new(0.5, vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.5)]);
        let records = RunRecord::from_layout(&layout);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), "2_0");
        assert_eq!(records[1].id(), "2_1");
        assert_eq!(records[1].x, 1.0);
        assert_eq!(records[1].y, 0.5);
        assert!(records.iter().all(|r| r.deg == 0.0));
    }

    #[test]
    fn test_csv_row() {
        let record = RunRecord {
            n: 3,
            index: 2,
            x: 1.25,
            y: 0.0,
            deg: 0.0,
        };
        let mut out = Vec::new();
        record.write_csv_row(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "3_2,1.25,0,0.0\n");
    }
}
