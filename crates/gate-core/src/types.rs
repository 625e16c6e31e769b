//! Core type definitions: DType, Shape, and the boundary limits.

use smallvec::SmallVec;

/// Maximum tensor rank accepted at the boundary.
pub const MAX_TENSOR_DIMS: usize = 8;

/// Maximum number of input tensors per forward call.
pub const MAX_INPUTS: usize = 16;

/// Maximum number of output tensors per forward call.
pub const MAX_OUTPUTS: usize = 16;

/// Element data types crossing the boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    I32,
    I8,
    U8,
}

impl DType {
    /// Size in bytes of a single element.
    pub fn size_bytes(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::I32 => 4,
            DType::I8 => 1,
            DType::U8 => 1,
        }
    }

    /// Stable lowercase name, as reported over the boundary.
    pub fn name(self) -> &'static str {
        match self {
            DType::F32 => "float32",
            DType::I32 => "int32",
            DType::I8 => "int8",
            DType::U8 => "uint8",
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Tensor shape (dimensions). Dims are stored inline up to the rank cap.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape(pub SmallVec<[i64; MAX_TENSOR_DIMS]>);

impl Shape {
    pub fn new(dims: impl IntoIterator<Item = i64>) -> Self {
        Self(dims.into_iter().collect())
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements.
    ///
    /// An empty shape, a shape above the rank cap, a non-positive dimension,
    /// and a product overflow all count as 0 elements; the size check in
    /// `validate` turns that into a diagnosable mismatch rather than a
    /// silently wrong byte count.
    pub fn element_count(&self) -> usize {
        if self.0.is_empty() || self.0.len() > MAX_TENSOR_DIMS {
            return 0;
        }
        let mut count: usize = 1;
        for &dim in &self.0 {
            if dim <= 0 {
                return 0;
            }
            count = match count.checked_mul(dim as usize) {
                Some(c) => c,
                None => return 0,
            };
        }
        count
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(DType::F32.size_bytes(), 4);
        assert_eq!(DType::I32.size_bytes(), 4);
        assert_eq!(DType::I8.size_bytes(), 1);
        assert_eq!(DType::U8.size_bytes(), 1);
    }

    #[test]
    fn test_dtype_name() {
        assert_eq!(DType::F32.name(), "float32");
        assert_eq!(DType::U8.name(), "uint8");
        assert_eq!(DType::I8.to_string(), "int8");
    }

    #[test]
    fn test_element_count() {
        assert_eq!(Shape::new([2, 3, 4]).element_count(), 24);
        assert_eq!(Shape::new([1, 3, 224, 224]).element_count(), 150528);
        assert_eq!(Shape::new([7]).element_count(), 7);
    }

    #[test]
    fn test_element_count_invalid_is_zero() {
        assert_eq!(Shape::new([]).element_count(), 0);
        assert_eq!(Shape::new([2, 0, 4]).element_count(), 0);
        assert_eq!(Shape::new([2, -3]).element_count(), 0);
        assert_eq!(Shape::new([1; 9]).element_count(), 0);
    }

    #[test]
    fn test_element_count_overflow_is_zero() {
        assert_eq!(Shape::new([i64::MAX, i64::MAX]).element_count(), 0);
    }

    #[test]
    fn test_shape_display() {
        assert_eq!(Shape::new([1, 3, 224, 224]).to_string(), "[1, 3, 224, 224]");
    }
}
