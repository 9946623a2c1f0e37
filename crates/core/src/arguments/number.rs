use crate::error::{CommandSyntaxError, ErrorKind};
use crate::reader::StringReader;

use super::ArgumentType;

/// Defines a bounded numeric argument type over one primitive.
///
/// Bounds failures rewind the reader to the start of the token.
macro_rules! bounded_number {
    (
        $(#[$doc:meta])*
        $name:ident($ty:ty) {
            read: $read:ident,
            too_low: $too_low:ident,
            too_high: $too_high:ident,
            examples: $examples:expr $(,)?
        }
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name {
            minimum: $ty,
            maximum: $ty,
        }

        impl $name {
            /// Accept values in `[minimum, maximum]`.
            pub fn new(minimum: $ty, maximum: $ty) -> Self {
                Self { minimum, maximum }
            }

            /// Inclusive lower bound.
            pub fn minimum(&self) -> $ty {
                self.minimum
            }

            /// Inclusive upper bound.
            pub fn maximum(&self) -> $ty {
                self.maximum
            }
        }

        impl ArgumentType for $name {
            type Value = $ty;

            fn parse(&self, reader: &mut StringReader) -> Result<$ty, CommandSyntaxError> {
                let start = reader.cursor();
                let found = reader.$read()?;
                if found < self.minimum {
                    reader.set_cursor(start);
                    return Err(ErrorKind::$too_low {
                        found,
                        minimum: self.minimum,
                    }
                    .create_with_context(reader));
                }
                if found > self.maximum {
                    reader.set_cursor(start);
                    return Err(ErrorKind::$too_high {
                        found,
                        maximum: self.maximum,
                    }
                    .create_with_context(reader));
                }
                Ok(found)
            }

            fn examples(&self) -> &[&'static str] {
                $examples
            }
        }
    };
}

bounded_number! {
    /// A bounded `i32`.
    IntegerArgumentType(i32) {
        read: read_int,
        too_low: IntegerTooLow,
        too_high: IntegerTooHigh,
        examples: &["0", "123", "-123"],
    }
}

bounded_number! {
    /// A bounded `i64`.
    LongArgumentType(i64) {
        read: read_long,
        too_low: LongTooLow,
        too_high: LongTooHigh,
        examples: &["0", "123", "-123"],
    }
}

bounded_number! {
    /// A bounded `f32`.
    FloatArgumentType(f32) {
        read: read_float,
        too_low: FloatTooLow,
        too_high: FloatTooHigh,
        examples: &["0", "1.2", ".5", "-1", "-.5", "-1234.56"],
    }
}

bounded_number! {
    /// A bounded `f64`.
    DoubleArgumentType(f64) {
        read: read_double,
        too_low: DoubleTooLow,
        too_high: DoubleTooHigh,
        examples: &["0", "1.2", ".5", "-1", "-.5", "-1234.56"],
    }
}

/// Any `i32`.
pub fn integer() -> IntegerArgumentType {
    IntegerArgumentType::new(i32::MIN, i32::MAX)
}

/// An `i32` no smaller than `min`.
pub fn integer_min(min: i32) -> IntegerArgumentType {
    IntegerArgumentType::new(min, i32::MAX)
}

/// An `i32` in `[min, max]`.
pub fn integer_range(min: i32, max: i32) -> IntegerArgumentType {
    IntegerArgumentType::new(min, max)
}

/// Any `i64`.
pub fn long() -> LongArgumentType {
    LongArgumentType::new(i64::MIN, i64::MAX)
}

/// An `i64` no smaller than `min`.
pub fn long_min(min: i64) -> LongArgumentType {
    LongArgumentType::new(min, i64::MAX)
}

/// An `i64` in `[min, max]`.
pub fn long_range(min: i64, max: i64) -> LongArgumentType {
    LongArgumentType::new(min, max)
}

/// Any finite `f32`.
pub fn float() -> FloatArgumentType {
    FloatArgumentType::new(f32::MIN, f32::MAX)
}

/// An `f32` no smaller than `min`.
pub fn float_min(min: f32) -> FloatArgumentType {
    FloatArgumentType::new(min, f32::MAX)
}

/// An `f32` in `[min, max]`.
pub fn float_range(min: f32, max: f32) -> FloatArgumentType {
    FloatArgumentType::new(min, max)
}

/// Any finite `f64`.
pub fn double() -> DoubleArgumentType {
    DoubleArgumentType::new(f64::MIN, f64::MAX)
}

/// An `f64` no smaller than `min`.
pub fn double_min(min: f64) -> DoubleArgumentType {
    DoubleArgumentType::new(min, f64::MAX)
}

/// An `f64` in `[min, max]`.
pub fn double_range(min: f64, max: f64) -> DoubleArgumentType {
    DoubleArgumentType::new(min, max)
}
