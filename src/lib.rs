//! # fixed-width-rs
//!
//! Typed records to and from fixed-width positional text lines.
//!
//! Legacy interchange files (bank extracts, payroll rosters, invoice feeds)
//! carry one record per line, each field at a fixed character position and
//! padded to a fixed width. This library maps such lines to plain Rust
//! structs and back.
//!
//! ## Overview
//!
//! - **Schema**: a record type lists its columns once in
//!   [`FixedRecord::describe`]; the layout is validated, sorted by column
//!   order and cached.
//! - **Conversion**: each column's value goes through a [`ValueConverter`],
//!   the [`DefaultConverter`] unless the column names its own.
//! - **Codec**: [`LineCodec`] encodes a record to one line and decodes a
//!   line to a record, under forgiving or strict [`CodecOptions`].
//! - **Streams**: the [`stream`] module reads and writes whole files.
//!
//! ## Example
//!
//! ```
//! use fixed_width_rs::{ColumnDescriptor, FixedRecord, LineCodec, SchemaBuilder};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Account {
//!     id: i64,
//!     owner: String,
//!     active: bool,
//! }
//!
//! impl FixedRecord for Account {
//!     fn describe(schema: &mut SchemaBuilder<Self>) {
//!         schema
//!             .column("id", |r| &r.id, |r| &mut r.id, ColumnDescriptor::new(1, 6).pad_left('0'))
//!             .column("owner", |r| &r.owner, |r| &mut r.owner, ColumnDescriptor::new(2, 8))
//!             .column("active", |r| &r.active, |r| &mut r.active, ColumnDescriptor::new(3, 1));
//!     }
//! }
//!
//! let codec = LineCodec::<Account>::new().unwrap();
//! let account = Account { id: 42, owner: "SMITH".to_string(), active: true };
//!
//! let line = codec.encode_record(&account).unwrap();
//! assert_eq!(line, "000042SMITH   Y");
//! assert_eq!(codec.decode_line(&line).unwrap(), account);
//! ```

pub mod codec;
pub mod converter;
pub mod default_converter;
pub mod descriptor;
pub mod error;
pub mod models;
pub mod schema;
pub mod stream;
pub mod value;

pub use codec::{CodecOptions, LineCodec, OnConversionError, OnOverflow, OnShortLine};
pub use converter::{
    ConverterFactory, MinorUnits, ValueConverter, lookup_converter, register_converter,
};
pub use default_converter::DefaultConverter;
pub use descriptor::{ColumnDescriptor, ConverterRef, PadSide};
pub use error::{ConversionError, FixedWidthError, Result, SchemaError};
pub use schema::{Column, FixedRecord, RecordSchema, SchemaBuilder, resolve_schema};
pub use stream::{
    RecordReader, RecordWriter, StreamOptions, TextEncoding, from_bytes, read_all, read_file,
    to_bytes, write_all, write_file,
};
pub use value::{FieldValue, Value, ValueKind};
