use std::ops::Range;

/// Result of a navigation request. `Refused` means an edge stopped the
/// motion; partial motion may still have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Motion {
    Moved,
    Refused,
}

impl Motion {
    pub fn refused(self) -> bool {
        self == Motion::Refused
    }
}

struct Edge;

/// A virtualized window mapping a list of `num_items` entries onto
/// `num_rows` visible rows starting at screen row `top_row`.
///
/// `start..end` is the half-open slice of the list currently visible,
/// `cursor` the selected row within the window, and `cur_item` the
/// selected list index. The window is recreated, not mutated, whenever
/// `num_rows` or `num_items` changes shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    num_rows: usize,
    num_items: usize,
    top_row: usize,
    cursor: usize,
    start: usize,
    end: usize,
    cur_item: usize,
    bar: Option<Range<usize>>,
}

impl Viewport {
    pub fn new(num_rows: usize, num_items: usize, top_row: usize) -> Self {
        let mut area = Self {
            num_rows,
            num_items,
            top_row,
            cursor: 0,
            start: 0,
            end: num_items.min(num_rows),
            cur_item: 0,
            bar: None,
        };
        area.update();
        area
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    pub fn top_row(&self) -> usize {
        self.top_row
    }

    pub fn cur_item(&self) -> usize {
        self.cur_item
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn bar(&self) -> Option<Range<usize>> {
        self.bar.clone()
    }

    /// Matches a window against new shape parameters; callers recreate
    /// the viewport when this returns false to avoid losing position on
    /// unrelated redraws.
    pub fn has_shape(&self, num_rows: usize, num_items: usize, top_row: usize) -> bool {
        self.num_rows == num_rows && self.num_items == num_items && self.top_row == top_row
    }

    /// The `(item_index, screen_row)` pairs currently visible.
    pub fn rows(&self) -> Vec<(usize, usize)> {
        (self.start..self.end)
            .map(|i| (i, self.top_row + i - self.start))
            .collect()
    }

    fn scroll_one(&mut self, up: bool) -> Result<(), Edge> {
        if self.num_items == 0 {
            return Err(Edge);
        }

        if up {
            if self.cursor == 0 {
                if self.start == 0 {
                    return Err(Edge);
                }
                self.start -= 1;
                if self.end - self.start > self.num_rows {
                    self.end -= 1;
                }
            } else {
                self.cursor -= 1;
            }
        } else {
            if self.cur_item + 1 == self.num_items {
                return Err(Edge);
            }
            if self.cursor + 1 == self.num_rows {
                self.start += 1;
                self.end += 1;
            } else {
                self.cursor += 1;
            }
        }

        self.update();
        Ok(())
    }

    /// Moves the selection by `delta` rows (negative is up), one row at
    /// a time, stopping at either list edge.
    pub fn scroll(&mut self, delta: i32) -> Motion {
        let up = delta < 0;
        for _ in 0..delta.unsigned_abs() {
            if self.scroll_one(up).is_err() {
                self.update();
                return Motion::Refused;
            }
        }
        Motion::Moved
    }

    pub fn page_up(&mut self) -> Motion {
        let motion = if self.num_items == 0 {
            Motion::Refused
        } else if self.num_items <= self.num_rows {
            self.cursor = 0;
            Motion::Refused
        } else if self.cur_item == 0 {
            self.cursor = 0;
            Motion::Refused
        } else if self.start + 1 < self.num_rows {
            // Less than a full page above.
            self.start = 0;
            self.end = self.num_rows;
            self.cursor = 0;
            Motion::Refused
        } else if self.start + 1 == self.num_rows {
            // Exactly one page above.
            self.start = 0;
            self.end = self.num_rows;
            self.cursor = 0;
            Motion::Moved
        } else {
            self.start -= self.num_rows;
            self.end = self.start + self.num_rows;
            Motion::Moved
        };
        self.update();
        motion
    }

    pub fn page_down(&mut self) -> Motion {
        let motion = if self.num_items == 0 {
            Motion::Refused
        } else if self.num_items <= self.num_rows {
            self.cursor = self.num_items - 1;
            Motion::Refused
        } else if self.num_items - self.start <= self.num_rows {
            // Already on the last page, exact or partial.
            self.start = self.num_items - 1;
            self.end = self.num_items;
            self.cursor = 0;
            Motion::Refused
        } else if self.num_items - self.end < self.num_rows {
            // Less than a full page left.
            self.start = self.end;
            self.end = self.num_items;
            let rows_displayed = self.end - self.start;
            // cursor is a 0-indexed row; rows_displayed is a count.
            if self.cursor >= rows_displayed {
                self.cursor = rows_displayed - 1;
            }
            Motion::Moved
        } else {
            self.start += self.num_rows;
            self.end += self.num_rows;
            Motion::Moved
        };
        self.update();
        motion
    }

    pub fn home(&mut self) -> Motion {
        let motion = if self.num_items == 0 {
            Motion::Refused
        } else if self.num_items <= self.num_rows {
            if self.cursor == 0 {
                Motion::Refused
            } else {
                self.cursor = 0;
                Motion::Moved
            }
        } else {
            let already_there = self.cur_item == 0;
            self.start = 0;
            self.end = self.num_rows;
            self.cursor = 0;
            if already_there {
                Motion::Refused
            } else {
                Motion::Moved
            }
        };
        self.update();
        motion
    }

    pub fn end_key(&mut self) -> Motion {
        let motion = if self.num_items == 0 {
            Motion::Refused
        } else if self.num_items <= self.num_rows {
            if self.cursor == self.num_items - 1 {
                Motion::Refused
            } else {
                self.cursor = self.num_items - 1;
                Motion::Moved
            }
        } else {
            let already_there = self.cur_item == self.num_items - 1;
            self.cursor = self.num_rows - 1;
            self.end = self.num_items;
            self.start = self.end - self.num_rows;
            if already_there {
                Motion::Refused
            } else {
                Motion::Moved
            }
        };
        self.update();
        motion
    }

    /// Repositions the cursor to an absolute on-screen row. Refuses when
    /// the row is off the window or outside the rendered item range; the
    /// cursor is still pinned, which lets a caller pin row 0 (or the
    /// bottom row) and then scroll the window itself.
    pub fn move_cursor(&mut self, row: usize) -> Motion {
        let motion = if self.num_rows < self.num_items && row < self.num_rows {
            self.cursor = row;
            let rendered = self.top_row..self.top_row + (self.end - self.start);
            if rendered.contains(&row) {
                Motion::Moved
            } else {
                Motion::Refused
            }
        } else {
            Motion::Refused
        };
        self.update();
        motion
    }

    /// Recomputes `cur_item` and the scrollbar after any motion. The bar
    /// is absent whenever the whole list fits; otherwise its length is
    /// `round(num_rows^2 / num_items)` and its start row
    /// `round(num_rows * start / num_items)`, clamped to the window.
    fn update(&mut self) {
        self.bar = if self.num_items <= self.num_rows {
            None
        } else {
            let rows = self.num_rows as f64;
            let items = self.num_items as f64;
            let len = ((rows * rows / items).round() as usize).max(1);
            let mut bar_start = (rows * self.start as f64 / items).round() as usize;
            let mut bar_end = bar_start + len;
            if bar_end > self.num_rows {
                bar_end = self.num_rows;
                if bar_start >= bar_end {
                    bar_start = bar_end - 1;
                }
            }
            Some(self.top_row + bar_start..self.top_row + bar_end)
        };
        self.cur_item = self.start + self.cursor;
    }

    #[cfg(test)]
    fn stat(
        &self,
    ) -> (
        usize,
        usize,
        usize,
        usize,
        usize,
        usize,
        Option<Range<usize>>,
    ) {
        (
            self.num_rows,
            self.cursor,
            self.num_items,
            self.start,
            self.end,
            self.cur_item,
            self.bar.clone(),
        )
    }
}
