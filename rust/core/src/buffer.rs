// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed buffers decoded from binary attachments
//!
//! Attachments are raw little-endian arrays. A [`TypedBuffer`] owns the
//! decoded values in their declared element type so the accumulation buffers
//! keep the producer's precision end to end.

use crate::element_type::ElementType;
use crate::error::{Error, Result};
use bytes::Bytes;
use std::fmt;
use std::ops::Range;

/// Scalar that can live inside a [`TypedBuffer`]
pub trait Element: bytemuck::Pod + PartialEq + fmt::Debug {
    const TYPE: ElementType;

    fn to_f64(self) -> f64;

    /// Saturating conversion for integer targets
    fn from_f64(value: f64) -> Self;
}

/// Owned array of one of the fixed element types
#[derive(Debug, Clone, PartialEq)]
pub enum TypedBuffer {
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

macro_rules! with_values {
    ($buffer:expr, $values:ident => $body:expr) => {
        match $buffer {
            TypedBuffer::Int8($values) => $body,
            TypedBuffer::UInt8($values) => $body,
            TypedBuffer::Int16($values) => $body,
            TypedBuffer::UInt16($values) => $body,
            TypedBuffer::Int32($values) => $body,
            TypedBuffer::UInt32($values) => $body,
            TypedBuffer::Float32($values) => $body,
            TypedBuffer::Float64($values) => $body,
        }
    };
}

macro_rules! impl_element {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const TYPE: ElementType = ElementType::$variant;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $t
                }
            }

            impl From<Vec<$t>> for TypedBuffer {
                fn from(values: Vec<$t>) -> Self {
                    TypedBuffer::$variant(values)
                }
            }
        )*
    };
}

impl_element! {
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    f32 => Float32,
    f64 => Float64,
}

impl TypedBuffer {
    /// Allocate `len` zeroed elements of `element_type`
    pub fn zeroed(element_type: ElementType, len: usize) -> Self {
        match element_type {
            ElementType::Int8 => TypedBuffer::Int8(vec![0; len]),
            ElementType::UInt8 => TypedBuffer::UInt8(vec![0; len]),
            ElementType::Int16 => TypedBuffer::Int16(vec![0; len]),
            ElementType::UInt16 => TypedBuffer::UInt16(vec![0; len]),
            ElementType::Int32 => TypedBuffer::Int32(vec![0; len]),
            ElementType::UInt32 => TypedBuffer::UInt32(vec![0; len]),
            ElementType::Float32 => TypedBuffer::Float32(vec![0.0; len]),
            ElementType::Float64 => TypedBuffer::Float64(vec![0.0; len]),
        }
    }

    /// Fallible [`TypedBuffer::zeroed`] for lengths taken off the wire
    ///
    /// Fails instead of aborting when the byte size overflows or the
    /// allocator cannot provide it.
    pub fn try_zeroed(element_type: ElementType, len: usize) -> Result<Self> {
        fn alloc<T: Clone + Default>(len: usize, element_type: ElementType) -> Result<Vec<T>> {
            let mut values = Vec::new();
            values.try_reserve_exact(len).map_err(|e| {
                Error::MalformedPayload(format!("cannot allocate {len} {element_type} elements: {e}"))
            })?;
            values.resize(len, T::default());
            Ok(values)
        }

        Ok(match element_type {
            ElementType::Int8 => TypedBuffer::Int8(alloc(len, element_type)?),
            ElementType::UInt8 => TypedBuffer::UInt8(alloc(len, element_type)?),
            ElementType::Int16 => TypedBuffer::Int16(alloc(len, element_type)?),
            ElementType::UInt16 => TypedBuffer::UInt16(alloc(len, element_type)?),
            ElementType::Int32 => TypedBuffer::Int32(alloc(len, element_type)?),
            ElementType::UInt32 => TypedBuffer::UInt32(alloc(len, element_type)?),
            ElementType::Float32 => TypedBuffer::Float32(alloc(len, element_type)?),
            ElementType::Float64 => TypedBuffer::Float64(alloc(len, element_type)?),
        })
    }

    /// Decode a little-endian attachment
    ///
    /// The byte length must be a whole number of elements. Attachment bytes
    /// carry no alignment guarantee, so values are copied out.
    pub fn decode(element_type: ElementType, bytes: &[u8]) -> Result<Self> {
        let size = element_type.size();
        if bytes.len() % size != 0 {
            return Err(Error::MalformedPayload(format!(
                "{} bytes is not a whole number of {}-byte {} elements",
                bytes.len(),
                size,
                element_type
            )));
        }
        Ok(match element_type {
            ElementType::Int8 => TypedBuffer::Int8(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::UInt8 => TypedBuffer::UInt8(bytes.to_vec()),
            ElementType::Int16 => TypedBuffer::Int16(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::UInt16 => TypedBuffer::UInt16(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::Int32 => TypedBuffer::Int32(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::UInt32 => TypedBuffer::UInt32(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::Float32 => TypedBuffer::Float32(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::Float64 => TypedBuffer::Float64(bytemuck::pod_collect_to_vec(bytes)),
        })
    }

    /// Encode as a little-endian attachment
    pub fn to_bytes(&self) -> Bytes {
        with_values!(self, values => {
            let raw: &[u8] = bytemuck::cast_slice(values.as_slice());
            Bytes::copy_from_slice(raw)
        })
    }

    /// Build a buffer of `element_type` from f64 values
    pub fn from_f64_slice(element_type: ElementType, values: &[f64]) -> Self {
        fn collect<T: Element>(values: &[f64]) -> Vec<T> {
            values.iter().map(|&v| T::from_f64(v)).collect()
        }
        match element_type {
            ElementType::Int8 => collect::<i8>(values).into(),
            ElementType::UInt8 => collect::<u8>(values).into(),
            ElementType::Int16 => collect::<i16>(values).into(),
            ElementType::UInt16 => collect::<u16>(values).into(),
            ElementType::Int32 => collect::<i32>(values).into(),
            ElementType::UInt32 => collect::<u32>(values).into(),
            ElementType::Float32 => collect::<f32>(values).into(),
            ElementType::Float64 => collect::<f64>(values).into(),
        }
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        match self {
            TypedBuffer::Int8(_) => ElementType::Int8,
            TypedBuffer::UInt8(_) => ElementType::UInt8,
            TypedBuffer::Int16(_) => ElementType::Int16,
            TypedBuffer::UInt16(_) => ElementType::UInt16,
            TypedBuffer::Int32(_) => ElementType::Int32,
            TypedBuffer::UInt32(_) => ElementType::UInt32,
            TypedBuffer::Float32(_) => ElementType::Float32,
            TypedBuffer::Float64(_) => ElementType::Float64,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        with_values!(self, values => values.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the values when `T` matches the element type
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        if self.element_type() != T::TYPE {
            return None;
        }
        with_values!(self, values => bytemuck::try_cast_slice(values.as_slice()).ok())
    }

    #[inline]
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        with_values!(self, values => values.get(index).map(|v| v.to_f64()))
    }

    /// Overwrite one element, converting from f64
    #[inline]
    pub fn set_f64(&mut self, index: usize, value: f64) {
        with_values!(self, values => {
            if let Some(slot) = values.get_mut(index) {
                *slot = Element::from_f64(value);
            }
        })
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_values!(self, values => values.iter().map(|v| v.to_f64()).collect())
    }

    /// Copy of a sub-range, keeping the element type
    pub fn slice(&self, range: Range<usize>) -> TypedBuffer {
        with_values!(self, values => TypedBuffer::from(values[range].to_vec()))
    }

    /// Write `src` starting at `offset` and return the new offset
    ///
    /// Values are converted when `src` has a different element type. Nothing
    /// is written when the write would run past the end of the buffer.
    pub fn write_at(&mut self, offset: usize, src: &TypedBuffer) -> Result<usize> {
        let capacity = self.len();
        let incoming = src.len();
        let end = offset
            .checked_add(incoming)
            .filter(|&end| end <= capacity)
            .ok_or(Error::BufferOverflow {
                offset,
                incoming,
                capacity,
            })?;

        with_values!(self, values => copy_converted(&mut values[offset..end], src));
        Ok(end)
    }
}

fn copy_converted<T: Element>(dst: &mut [T], src: &TypedBuffer) {
    if let Some(same) = src.as_slice::<T>() {
        dst.copy_from_slice(same);
        return;
    }
    with_values!(src, values => {
        for (slot, value) in dst.iter_mut().zip(values.iter()) {
            *slot = T::from_f64(value.to_f64());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_decode_float32() {
        let values = [1.5f32, -2.0, 3.25];
        let bytes: &[u8] = bytemuck::cast_slice(&values);
        let buffer = TypedBuffer::decode(ElementType::Float32, bytes).unwrap();
        assert_eq!(buffer, TypedBuffer::Float32(values.to_vec()));
        assert_eq!(buffer.to_bytes().as_ref(), bytes);
    }

    #[test]
    fn test_decode_unaligned_bytes() {
        let values = [7u32, 8, 9];
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(bytemuck::cast_slice(&values));
        let buffer = TypedBuffer::decode(ElementType::UInt32, &bytes[1..]).unwrap();
        assert_eq!(buffer.as_slice::<u32>(), Some(&values[..]));
    }

    #[test]
    fn test_decode_rejects_partial_elements() {
        let err = TypedBuffer::decode(ElementType::Float64, &[0u8; 12]).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));
    }

    #[test]
    fn test_write_at_advances_offset() {
        let mut dst = TypedBuffer::zeroed(ElementType::UInt32, 5);
        let offset = dst.write_at(0, &TypedBuffer::UInt32(vec![1, 2])).unwrap();
        assert_eq!(offset, 2);
        let offset = dst.write_at(offset, &TypedBuffer::UInt32(vec![3, 4, 5])).unwrap();
        assert_eq!(offset, 5);
        assert_eq!(dst, TypedBuffer::UInt32(vec![1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_write_at_overflow_leaves_buffer_untouched() {
        let mut dst = TypedBuffer::zeroed(ElementType::Float32, 4);
        dst.write_at(0, &TypedBuffer::Float32(vec![1.0, 2.0])).unwrap();

        let err = dst
            .write_at(2, &TypedBuffer::Float32(vec![3.0, 4.0, 5.0]))
            .unwrap_err();
        assert_eq!(
            err,
            Error::BufferOverflow {
                offset: 2,
                incoming: 3,
                capacity: 4
            }
        );
        assert_eq!(dst, TypedBuffer::Float32(vec![1.0, 2.0, 0.0, 0.0]));
    }

    #[test]
    fn test_write_at_converts_element_type() {
        let source = [0.1, 1.7, -2.3];
        let mut dst = TypedBuffer::zeroed(ElementType::Float32, 3);
        dst.write_at(0, &TypedBuffer::Float64(source.to_vec())).unwrap();
        assert_eq!(dst.element_type(), ElementType::Float32);
        for (written, expected) in dst.to_f64_vec().into_iter().zip(source) {
            assert_relative_eq!(written, expected, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_try_zeroed_matches_zeroed() {
        let buffer = TypedBuffer::try_zeroed(ElementType::Int16, 4).unwrap();
        assert_eq!(buffer, TypedBuffer::zeroed(ElementType::Int16, 4));
    }

    #[test]
    fn test_try_zeroed_rejects_impossible_length() {
        let err = TypedBuffer::try_zeroed(ElementType::Float64, usize::MAX / 3).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));
    }

    #[test]
    fn test_from_f64_slice_and_set() {
        let mut buffer = TypedBuffer::from_f64_slice(ElementType::Int16, &[1.0, -2.0]);
        assert_eq!(buffer, TypedBuffer::Int16(vec![1, -2]));
        buffer.set_f64(1, 300.0);
        assert_eq!(buffer.get_f64(1), Some(300.0));
        assert_eq!(buffer.get_f64(2), None);
    }
}
