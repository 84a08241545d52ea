//! Scalar types that can be gathered from an array handle

use super::DType;
use std::fmt::Debug;

/// Trait for types that can be stored in a gatherable array
///
/// `Default` provides the fill value of freshly allocated output buffers;
/// every slot is overwritten before a result is returned.
pub trait Element: Copy + Default + Debug + Send + Sync + 'static {
    const DTYPE: DType;
}

impl Element for u8 {
    const DTYPE: DType = DType::U8;
}
impl Element for i8 {
    const DTYPE: DType = DType::I8;
}
impl Element for u16 {
    const DTYPE: DType = DType::U16;
}
impl Element for i16 {
    const DTYPE: DType = DType::I16;
}
impl Element for u32 {
    const DTYPE: DType = DType::U32;
}
impl Element for i32 {
    const DTYPE: DType = DType::I32;
}
impl Element for u64 {
    const DTYPE: DType = DType::U64;
}
impl Element for i64 {
    const DTYPE: DType = DType::I64;
}
impl Element for f32 {
    const DTYPE: DType = DType::F32;
}
impl Element for f64 {
    const DTYPE: DType = DType::F64;
}
