//! Row-major cursor over a wrapped grid of chips, shared by the tag pickers.

/// Horizontal padding around each chip.
const CELL_PADDING: usize = 2;

/// How many chips fit across `width` when every cell is sized for the longest label.
pub fn column_count(width: u16, longest_label: usize) -> usize {
    let cell = longest_label.max(1) + CELL_PADDING;
    (usize::from(width) / cell).max(1)
}

/// Outcome of a vertical move.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum GridExit {
    Stayed,
    /// Moved above the first row; focus should go to the previous control.
    Above,
    /// Moved below the last row; focus should go to the next control.
    Below,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct GridCursor {
    index: usize,
    len: usize,
    columns: usize,
}

impl GridCursor {
    pub fn new(len: usize, columns: usize) -> Self {
        Self {
            index: 0,
            len,
            columns: columns.max(1),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.len.div_ceil(self.columns)
    }

    pub fn set_columns(&mut self, columns: usize) {
        self.columns = columns.max(1);
    }

    pub fn up(&mut self) -> GridExit {
        if self.index < self.columns {
            return GridExit::Above;
        }
        self.index -= self.columns;
        GridExit::Stayed
    }

    pub fn down(&mut self) -> GridExit {
        if self.index + self.columns >= self.len {
            return GridExit::Below;
        }
        self.index += self.columns;
        GridExit::Stayed
    }

    pub fn left(&mut self) {
        if self.len == 0 {
            return;
        }
        self.index = if self.index == 0 {
            self.len - 1
        } else {
            self.index - 1
        };
    }

    pub fn right(&mut self) {
        if self.len == 0 {
            return;
        }
        self.index = (self.index + 1) % self.len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_count_uses_longest_label() {
        assert_eq!(column_count(80, 8), 8);
        assert_eq!(column_count(80, 0), 26);
        assert_eq!(column_count(5, 30), 1);
    }

    #[test]
    fn vertical_moves_leave_at_edges() {
        let mut grid = GridCursor::new(7, 3);
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.up(), GridExit::Above);
        assert_eq!(grid.down(), GridExit::Stayed);
        assert_eq!(grid.index(), 3);
        assert_eq!(grid.down(), GridExit::Stayed);
        assert_eq!(grid.index(), 6);
        assert_eq!(grid.down(), GridExit::Below);
        assert_eq!(grid.index(), 6);
        assert_eq!(grid.up(), GridExit::Stayed);
        assert_eq!(grid.index(), 3);
    }

    #[test]
    fn partial_last_row_exits_below() {
        let mut grid = GridCursor::new(5, 3);
        grid.right();
        assert_eq!(grid.index(), 1);
        assert_eq!(grid.down(), GridExit::Stayed);
        assert_eq!(grid.index(), 4);
        grid.right();
        assert_eq!(grid.index(), 0);
        grid.left();
        assert_eq!(grid.index(), 4);
        grid.left();
        assert_eq!(grid.index(), 3);
        assert_eq!(grid.down(), GridExit::Below);
    }

    #[test]
    fn empty_grid_never_moves() {
        let mut grid = GridCursor::new(0, 4);
        grid.left();
        grid.right();
        assert_eq!(grid.index(), 0);
        assert_eq!(grid.down(), GridExit::Below);
        assert_eq!(grid.up(), GridExit::Above);
        assert!(grid.is_empty());
    }
}
