//! Driver abstraction layer.
//!
//! Defines the native client interface the adapter consumes, the value types
//! that cross it, and the registry that converts raw cells to typed values.

mod conversion;
mod driver;
mod mock;
mod types;

pub use conversion::{ApplicationTimezone, ConversionFn, ConversionRegistry, WireType};
pub use driver::{NativeDriver, CONNECT_SUCCESS};
pub use mock::{MockConnection, MockDriver, MockLog, MockResponse, MockStatement};
pub use bigdecimal::BigDecimal;
pub use types::{ColumnDescriptor, RawValue, Row, Value};
