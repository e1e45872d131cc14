//! Compression adapter used by the byte-slab storage tier (§4.6). A scheme
//! is registered once via [`init_compression`], producing a matched
//! compressor/decompressor pair that closes over its parameters; callers
//! never see the scheme's internals.

use revolve_model::{CompressionError, Element, ElementKind};
use std::sync::Arc;

/// Opaque compressed payload plus enough metadata to decompress and validate
/// the round trip: the original shape, element type, and any scheme-private
/// bytes (e.g. a zstd frame header is already self-describing, but custom
/// schemes may need more).
#[derive(Debug, Clone)]
pub struct CompressedObject {
    pub bytes: Vec<u8>,
    pub shape: Vec<usize>,
    pub dtype: ElementKind,
    pub scheme_metadata: Vec<u8>,
}

impl CompressedObject {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub type Compressor = Arc<dyn Fn(&[u8], &[usize], ElementKind) -> CompressedObject + Send + Sync>;
pub type Decompressor = Arc<dyn Fn(&CompressedObject) -> Result<Vec<u8>, CompressionError> + Send + Sync>;

/// A registered (compressor, decompressor) pair, captured with whatever
/// parameters `init_compression` was given.
#[derive(Clone)]
pub struct CompressionAdapter {
    pub compress: Compressor,
    pub decompress: Decompressor,
}

#[derive(Debug, Clone)]
pub enum CompressionScheme {
    /// Lossless, tunable 1-22 (zstd's own range; values outside are clamped
    /// by the zstd crate itself).
    Zstd { level: i32 },
    /// Passthrough: `compress` copies bytes verbatim. Useful as the
    /// trivial-baseline scheme in round-trip tests.
    None,
    /// User-supplied pair, captured at registration time.
    Custom {
        compress: Compressor,
        decompress: Decompressor,
    },
}

/// Builds the `(compressor, decompressor)` pair for a scheme. Mirrors the
/// source's global registry-of-functions, replaced here by a factory over a
/// closed enum plus an explicit escape hatch (`Custom`) for caller-supplied
/// functions, per the re-architecture note on dynamically parameterized
/// registries.
pub fn init_compression(scheme: CompressionScheme) -> CompressionAdapter {
    match scheme {
        CompressionScheme::Zstd { level } => zstd_adapter(level),
        CompressionScheme::None => none_adapter(),
        CompressionScheme::Custom {
            compress,
            decompress,
        } => CompressionAdapter {
            compress,
            decompress,
        },
    }
}

fn zstd_adapter(level: i32) -> CompressionAdapter {
    let compress: Compressor = Arc::new(move |bytes, shape, dtype| {
        let encoded = zstd::stream::encode_all(bytes, level)
            .expect("zstd in-memory encode over a Vec<u8> sink cannot fail");
        tracing::trace!(
            target: "revolve.compression",
            scheme = "zstd",
            raw_len = bytes.len(),
            encoded_len = encoded.len(),
            "compressed buffer"
        );
        CompressedObject {
            bytes: encoded,
            shape: shape.to_vec(),
            dtype,
            scheme_metadata: Vec::new(),
        }
    });
    let decompress: Decompressor = Arc::new(|object| {
        zstd::stream::decode_all(object.bytes.as_slice())
            .map_err(|e| CompressionError::Backend(e.to_string()))
    });
    CompressionAdapter {
        compress,
        decompress,
    }
}

fn none_adapter() -> CompressionAdapter {
    let compress: Compressor = Arc::new(|bytes, shape, dtype| CompressedObject {
        bytes: bytes.to_vec(),
        shape: shape.to_vec(),
        dtype,
        scheme_metadata: Vec::new(),
    });
    let decompress: Decompressor = Arc::new(|object| Ok(object.bytes.clone()));
    CompressionAdapter {
        compress,
        decompress,
    }
}

/// Compresses a typed buffer by first flattening it to little-endian bytes;
/// decompression and validation is the mirror of this, used by the
/// byte-slab tier and by the round-trip property tests in §8.
pub fn compress_elements<E: Element>(
    adapter: &CompressionAdapter,
    buf: &[E],
    shape: &[usize],
) -> CompressedObject {
    let bytes = E::to_le_bytes_vec(buf);
    (adapter.compress)(&bytes, shape, E::KIND)
}

pub fn decompress_elements<E: Element>(
    adapter: &CompressionAdapter,
    object: &CompressedObject,
) -> Result<Vec<E>, CompressionError> {
    if object.dtype != E::KIND {
        return Err(CompressionError::DtypeMismatch {
            expected: E::KIND,
            actual: object.dtype,
        });
    }
    let bytes = (adapter.decompress)(object)?;
    let expected_len: usize = object.shape.iter().product::<usize>() * E::KIND.itemsize();
    if bytes.len() != expected_len {
        return Err(CompressionError::LengthMismatch {
            expected: expected_len,
            actual: bytes.len(),
        });
    }
    Ok(E::from_le_bytes_vec(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<E: Element + PartialEq + std::fmt::Debug>(scheme: CompressionScheme, buf: Vec<E>) {
        let adapter = init_compression(scheme);
        let shape = vec![buf.len()];
        let object = compress_elements(&adapter, &buf, &shape);
        let back: Vec<E> = decompress_elements(&adapter, &object).unwrap();
        assert_eq!(back, buf);
    }

    #[test]
    fn zstd_round_trips_f32() {
        round_trip::<f32>(CompressionScheme::Zstd { level: 3 }, vec![1.0, 2.5, -3.25, 0.0]);
    }

    #[test]
    fn zstd_round_trips_f64_three_shapes() {
        for n in [1usize, 17, 256] {
            let buf: Vec<f64> = (0..n).map(|i| i as f64 * 0.5).collect();
            round_trip::<f64>(CompressionScheme::Zstd { level: 1 }, buf);
        }
    }

    #[test]
    fn none_scheme_is_exact_passthrough() {
        round_trip::<f32>(CompressionScheme::None, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn dtype_mismatch_is_rejected() {
        let adapter = init_compression(CompressionScheme::None);
        let object = compress_elements::<f32>(&adapter, &[1.0, 2.0], &[2]);
        let err = decompress_elements::<f64>(&adapter, &object).unwrap_err();
        assert!(matches!(err, CompressionError::DtypeMismatch { .. }));
    }
}
