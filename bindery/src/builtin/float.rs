use bindery_stream::{JsonReader, JsonWriter};

use crate::codec::TypedCodec;
use crate::error::{Error, ErrorKind, Result};

fn reject_non_finite(value: f64, special_floats: bool) -> Result<()> {
    if value.is_finite() || special_floats {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::InvalidNumericValue { value }))
    }
}

/// `f64`; NaN and infinities are rejected unless special floats are enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct F64Codec {
    special_floats: bool,
}

impl F64Codec {
    /// A codec that writes NaN and infinities as literals iff `special_floats`.
    pub const fn new(special_floats: bool) -> Self {
        Self { special_floats }
    }
}

impl TypedCodec for F64Codec {
    type Value = f64;

    fn encode(&self, out: &mut JsonWriter<'_>, value: &f64) -> Result<()> {
        reject_non_finite(*value, self.special_floats)?;
        Ok(out.f64_value(*value)?)
    }

    fn decode(&self, input: &mut JsonReader<'_>) -> Result<f64> {
        Ok(input.next_f64()?)
    }
}

/// `f32`, with the same rules as [`F64Codec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct F32Codec {
    special_floats: bool,
}

impl F32Codec {
    /// A codec that writes NaN and infinities as literals iff `special_floats`.
    pub const fn new(special_floats: bool) -> Self {
        Self { special_floats }
    }
}

impl TypedCodec for F32Codec {
    type Value = f32;

    fn encode(&self, out: &mut JsonWriter<'_>, value: &f32) -> Result<()> {
        reject_non_finite(f64::from(*value), self.special_floats)?;
        Ok(out.f32_value(*value)?)
    }

    fn decode(&self, input: &mut JsonReader<'_>) -> Result<f32> {
        Ok(input.next_f64()? as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(codec: F64Codec, value: f64) -> Result<String> {
        let mut buf = Vec::new();
        let mut out = JsonWriter::new(&mut buf);
        out.set_lenient(true);
        codec.encode(&mut out, &value)?;
        drop(out);
        Ok(String::from_utf8(buf).unwrap())
    }

    #[test]
    fn nan_needs_special_floats() {
        let err = encode(F64Codec::new(false), f64::NAN).unwrap_err();
        assert_eq!(err.code(), "bindery::invalid_numeric_value");
        assert_eq!(encode(F64Codec::new(true), f64::NAN).unwrap(), "NaN");
        assert_eq!(
            encode(F64Codec::new(true), f64::NEG_INFINITY).unwrap(),
            "-Infinity"
        );
        assert_eq!(encode(F64Codec::new(false), 1.5).unwrap(), "1.5");
    }
}
