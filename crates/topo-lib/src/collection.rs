use crate::error::GraphError;
use crate::signal::Matrix;

/// Ordered per-trial graphs with their labels. Every item has the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphCollection {
    item_shape: (usize, usize),
    items: Vec<Matrix>,
    labels: Vec<i64>,
}

impl GraphCollection {
    pub fn new(item_shape: (usize, usize)) -> Self {
        Self {
            item_shape,
            items: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Append one trial's graph; a shape different from the collection's is rejected.
    pub fn push(&mut self, item: Matrix, label: i64) -> Result<(), GraphError> {
        if item.shape() != self.item_shape {
            return Err(GraphError::ShapeMismatch {
                expected: self.item_shape,
                actual: item.shape(),
            });
        }
        self.items.push(item);
        self.labels.push(label);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_shape(&self) -> (usize, usize) {
        self.item_shape
    }

    /// (trials, rows, cols)
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.items.len(), self.item_shape.0, self.item_shape.1)
    }

    pub fn items(&self) -> &[Matrix] {
        &self.items
    }

    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// One row per trial holding the row-major flattened item.
    pub fn flatten(&self) -> Matrix {
        let width = self.item_shape.0 * self.item_shape.1;
        let mut data = Vec::with_capacity(self.items.len() * width);
        for item in &self.items {
            data.extend_from_slice(item.as_slice());
        }
        Matrix::from_vec(self.items.len(), width, data)
            .unwrap_or_else(|_| Matrix::zeros(0, width))
    }
}
