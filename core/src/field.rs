//! Dense rectangular cell storage shared by every grid-based engine.

use crate::{CellCoord, GridDimensions};

/// Mutable rows × columns matrix of cell values stored in row-major order.
///
/// The dimensions are fixed at construction; engines reallocate a new field on
/// setup instead of resizing an existing one.
#[derive(Clone, Debug, PartialEq)]
pub struct Field<T> {
    dimensions: GridDimensions,
    cells: Vec<T>,
}

/// Resource availability overlay used by the resource-constrained automaton.
pub type ResourceField = Field<f32>;

impl<T: Copy> Field<T> {
    /// Creates a field with every cell set to `value`.
    #[must_use]
    pub fn filled(dimensions: GridDimensions, value: T) -> Self {
        Self {
            dimensions,
            cells: vec![value; dimensions.cell_count()],
        }
    }

    /// Creates a field by evaluating `init` for each cell in row-major order.
    #[must_use]
    pub fn from_fn<F>(dimensions: GridDimensions, mut init: F) -> Self
    where
        F: FnMut(CellCoord) -> T,
    {
        let mut cells = Vec::with_capacity(dimensions.cell_count());
        for row in 0..dimensions.rows() {
            for column in 0..dimensions.columns() {
                cells.push(init(CellCoord::new(column, row)));
            }
        }
        Self { dimensions, cells }
    }

    /// Dimensions of the field.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Value stored at the provided cell.
    ///
    /// # Panics
    ///
    /// Panics when the coordinate lies outside the field; engines only pass
    /// coordinates resolved through [`GridDimensions::neighbor`].
    #[must_use]
    pub fn get(&self, column: u32, row: u32) -> T {
        self.cells[self.index(column, row)]
    }

    /// Value stored at the provided cell, or `None` outside the field.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<T> {
        self.dimensions
            .index_of(cell.column(), cell.row())
            .map(|index| self.cells[index])
    }

    /// Overwrites the value stored at the provided cell.
    pub fn set(&mut self, column: u32, row: u32, value: T) {
        let index = self.index(column, row);
        self.cells[index] = value;
    }

    /// Row-major view of every cell.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    /// Mutable row-major view of every cell.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Iterates every cell together with its coordinate in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, T)> + '_ {
        let columns = self.dimensions.columns() as usize;
        self.cells.iter().enumerate().map(move |(index, value)| {
            (
                CellCoord::new((index % columns) as u32, (index / columns) as u32),
                *value,
            )
        })
    }

    /// Copies every cell of `other` into `self`.
    ///
    /// # Panics
    ///
    /// Panics when the dimensions differ.
    pub fn copy_from(&mut self, other: &Self) {
        assert_eq!(
            self.dimensions, other.dimensions,
            "fields must share dimensions"
        );
        self.cells.copy_from_slice(&other.cells);
    }

    fn index(&self, column: u32, row: u32) -> usize {
        match self.dimensions.index_of(column, row) {
            Some(index) => index,
            None => panic!(
                "cell ({column}, {row}) outside {}x{} field",
                self.dimensions.columns(),
                self.dimensions.rows()
            ),
        }
    }
}
