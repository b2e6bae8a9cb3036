// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Numeric element types carried by attachments
//!
//! The producer names array types with VTK class names (`vtkFloatArray`,
//! `vtkUnsignedIntArray`, ...) and occasionally with JavaScript typed-array
//! names (`Float64Array`). Both resolve here, once, into a closed enum.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Fixed set of element types an attachment can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl ElementType {
    pub const ALL: [ElementType; 8] = [
        ElementType::Int8,
        ElementType::UInt8,
        ElementType::Int16,
        ElementType::UInt16,
        ElementType::Int32,
        ElementType::UInt32,
        ElementType::Float32,
        ElementType::Float64,
    ];

    /// Resolve a VTK array class name or a typed-array name
    #[inline]
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "vtkSignedCharArray" | "Int8Array" => Ok(ElementType::Int8),
            "vtkUnsignedCharArray" | "Uint8Array" => Ok(ElementType::UInt8),
            "vtkShortArray" | "Int16Array" => Ok(ElementType::Int16),
            "vtkUnsignedShortArray" | "Uint16Array" => Ok(ElementType::UInt16),
            "vtkIntArray" | "Int32Array" => Ok(ElementType::Int32),
            "vtkUnsignedIntArray" | "Uint32Array" => Ok(ElementType::UInt32),
            "vtkFloatArray" | "vtkTypeFloat32Array" | "Float32Array" => Ok(ElementType::Float32),
            "vtkDoubleArray" | "vtkTypeFloat64Array" | "Float64Array" => Ok(ElementType::Float64),
            // 64-bit integers have no lossless typed-array counterpart on the client
            other => Err(Error::UnknownElementType(other.to_string())),
        }
    }

    /// Canonical VTK class name, as emitted by the producer
    pub fn vtk_name(self) -> &'static str {
        match self {
            ElementType::Int8 => "vtkSignedCharArray",
            ElementType::UInt8 => "vtkUnsignedCharArray",
            ElementType::Int16 => "vtkShortArray",
            ElementType::UInt16 => "vtkUnsignedShortArray",
            ElementType::Int32 => "vtkIntArray",
            ElementType::UInt32 => "vtkUnsignedIntArray",
            ElementType::Float32 => "vtkFloatArray",
            ElementType::Float64 => "vtkDoubleArray",
        }
    }

    /// Size of one element in bytes
    #[inline]
    pub fn size(self) -> usize {
        match self {
            ElementType::Int8 | ElementType::UInt8 => 1,
            ElementType::Int16 | ElementType::UInt16 => 2,
            ElementType::Int32 | ElementType::UInt32 | ElementType::Float32 => 4,
            ElementType::Float64 => 8,
        }
    }

    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, ElementType::Float32 | ElementType::Float64)
    }
}

impl FromStr for ElementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.vtk_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vtk_names_round_trip() {
        for ty in ElementType::ALL {
            assert_eq!(ElementType::from_name(ty.vtk_name()).unwrap(), ty);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("vtkTypeFloat32Array".parse::<ElementType>().unwrap(), ElementType::Float32);
        assert_eq!("vtkTypeFloat64Array".parse::<ElementType>().unwrap(), ElementType::Float64);
        assert_eq!("Float64Array".parse::<ElementType>().unwrap(), ElementType::Float64);
        assert_eq!("Uint32Array".parse::<ElementType>().unwrap(), ElementType::UInt32);
    }

    #[test]
    fn test_unknown_names_rejected() {
        assert_eq!(
            ElementType::from_name("vtkLongArray"),
            Err(Error::UnknownElementType("vtkLongArray".to_string()))
        );
        // The producer sends an empty name when an array is missing
        assert!(ElementType::from_name("").is_err());
    }

    #[test]
    fn test_sizes() {
        assert_eq!(ElementType::UInt8.size(), 1);
        assert_eq!(ElementType::Int16.size(), 2);
        assert_eq!(ElementType::Float32.size(), 4);
        assert_eq!(ElementType::Float64.size(), 8);
        assert!(ElementType::Float32.is_float());
        assert!(!ElementType::UInt32.is_float());
    }
}
