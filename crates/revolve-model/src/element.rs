/// The uniform element type a checkpoint view reports. Storage tiers and the
/// compression adapter both key off this to size buffers and validate
/// round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementKind {
    F32,
    F64,
}

impl ElementKind {
    pub fn itemsize(self) -> usize {
        match self {
            ElementKind::F32 => 4,
            ElementKind::F64 => 8,
        }
    }
}

/// Implemented for the element types storage tiers may hold.
pub trait Element: Copy + Default + 'static {
    const KIND: ElementKind;

    fn to_le_bytes_vec(buf: &[Self]) -> Vec<u8>;
    fn from_le_bytes_vec(bytes: &[u8]) -> Vec<Self>;
}

impl Element for f32 {
    const KIND: ElementKind = ElementKind::F32;

    fn to_le_bytes_vec(buf: &[Self]) -> Vec<u8> {
        buf.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn from_le_bytes_vec(bytes: &[u8]) -> Vec<Self> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect()
    }
}

impl Element for f64 {
    const KIND: ElementKind = ElementKind::F64;

    fn to_le_bytes_vec(buf: &[Self]) -> Vec<u8> {
        buf.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn from_le_bytes_vec(bytes: &[u8]) -> Vec<Self> {
        bytes
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
            .collect()
    }
}
