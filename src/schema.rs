//! Column schemas: which fields of a record type go on the line, and where.
//!
//! A record type implements [`FixedRecord`] and lists its columns in
//! [`FixedRecord::describe`]. Fields that are not listed contribute nothing
//! to the line. The resulting [`RecordSchema`] is sorted by column order and
//! holds, per column, the accessors and the converter resolved for it.
//!
//! ```
//! use fixed_width_rs::{ColumnDescriptor, FixedRecord, SchemaBuilder, resolve_schema};
//!
//! #[derive(Debug, Default)]
//! struct Account {
//!     number: i64,
//!     holder: String,
//! }
//!
//! impl FixedRecord for Account {
//!     fn describe(schema: &mut SchemaBuilder<Self>) {
//!         schema
//!             .column("holder", |r| &r.holder, |r| &mut r.holder, ColumnDescriptor::new(2, 20))
//!             .column(
//!                 "number",
//!                 |r| &r.number,
//!                 |r| &mut r.number,
//!                 ColumnDescriptor::new(1, 8).pad_left('0'),
//!             );
//!     }
//! }
//!
//! let schema = resolve_schema::<Account>().unwrap();
//! assert_eq!(schema.line_width(), 28);
//! assert_eq!(schema.columns()[0].name, "number");
//! ```

use crate::converter::{ValueConverter, lookup_converter};
use crate::default_converter::DefaultConverter;
use crate::descriptor::{ColumnDescriptor, ConverterRef};
use crate::error::SchemaError;
use crate::value::{FieldValue, Value, ValueKind};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::debug;

/// A record type with a fixed-width layout.
pub trait FixedRecord: Default + Send + Sync + 'static {
    /// Register every column of the layout, in any order.
    fn describe(schema: &mut SchemaBuilder<Self>);
}

type Getter<R> = Box<dyn Fn(&R) -> Value + Send + Sync>;
type Setter<R> = Box<dyn Fn(&mut R, Value) -> bool + Send + Sync>;

/// One field of a record bound to its column layout.
pub struct Column<R> {
    pub name: &'static str,
    pub kind: ValueKind,
    /// The field is an `Option` and holds `None` for absent values.
    pub nullable: bool,
    pub descriptor: ColumnDescriptor,
    converter: Arc<dyn ValueConverter>,
    get: Getter<R>,
    set: Setter<R>,
}

impl<R> Column<R> {
    /// Read the field's current value.
    pub fn get(&self, record: &R) -> Value {
        (self.get)(record)
    }

    /// Assign a converted value to the field.
    ///
    /// Returns `false` when the field's type cannot hold the value.
    pub fn set(&self, record: &mut R, value: Value) -> bool {
        (self.set)(record, value)
    }

    /// The converter for this column: the custom one if declared, else the
    /// default converter.
    pub fn converter(&self) -> &dyn ValueConverter {
        self.converter.as_ref()
    }

    /// The declared default value, else `Null` for optional fields and the
    /// zero value of the field's kind otherwise.
    pub fn fallback(&self) -> Value {
        match &self.descriptor.default_value {
            Some(value) => value.clone(),
            None if self.nullable => Value::Null,
            None => self.kind.zero(),
        }
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

struct PendingColumn<R> {
    name: &'static str,
    kind: ValueKind,
    nullable: bool,
    descriptor: ColumnDescriptor,
    get: Getter<R>,
    set: Setter<R>,
}

/// Collects the columns of a record type during [`FixedRecord::describe`].
pub struct SchemaBuilder<R> {
    columns: Vec<PendingColumn<R>>,
}

impl<R: 'static> SchemaBuilder<R> {
    fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Bind a field to a column.
    ///
    /// `get` and `get_mut` project the field out of the record; any type
    /// implementing [`FieldValue`] can be used.
    pub fn column<T: FieldValue + 'static>(
        &mut self,
        name: &'static str,
        get: fn(&R) -> &T,
        get_mut: fn(&mut R) -> &mut T,
        descriptor: ColumnDescriptor,
    ) -> &mut Self {
        self.columns.push(PendingColumn {
            name,
            kind: T::KIND,
            nullable: T::NULLABLE,
            descriptor,
            get: Box::new(move |record: &R| get(record).to_value()),
            set: Box::new(move |record: &mut R, value: Value| match T::from_value(value) {
                Some(v) => {
                    *get_mut(record) = v;
                    true
                }
                None => false,
            }),
        });
        self
    }
}

/// The ordered column layout of a record type.
pub struct RecordSchema<R> {
    record: &'static str,
    columns: Vec<Column<R>>,
}

impl<R: FixedRecord> RecordSchema<R> {
    /// Build the schema for `R` without consulting the process-wide cache.
    ///
    /// Columns are sorted by `order`; equal orders keep the sequence in
    /// which `describe` registered them.
    pub fn build() -> Result<Self, SchemaError> {
        let record = std::any::type_name::<R>();
        let mut builder = SchemaBuilder::new();
        R::describe(&mut builder);

        let mut columns = Vec::with_capacity(builder.columns.len());
        for pending in builder.columns {
            if pending.descriptor.width == 0 {
                return Err(SchemaError::ZeroWidth {
                    record,
                    field: pending.name.to_string(),
                });
            }
            let converter = resolve_converter(record, pending.name, &pending.descriptor)?;
            columns.push(Column {
                name: pending.name,
                kind: pending.kind,
                nullable: pending.nullable,
                descriptor: pending.descriptor,
                converter,
                get: pending.get,
                set: pending.set,
            });
        }
        columns.sort_by_key(|c| c.descriptor.order);

        let schema = Self { record, columns };
        debug!(
            record,
            columns = schema.columns.len(),
            line_width = schema.line_width(),
            "built fixed-width schema"
        );
        Ok(schema)
    }
}

impl<R> RecordSchema<R> {
    /// Name of the record type this schema describes.
    pub fn record_name(&self) -> &'static str {
        self.record
    }

    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column<R>> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Sum of all column widths: the length of a well-formed line.
    pub fn line_width(&self) -> usize {
        self.columns
            .iter()
            .fold(0usize, |width, c| width.saturating_add(c.descriptor.width))
    }

    /// Columns paired with their starting character offset.
    pub fn offsets(&self) -> impl Iterator<Item = (usize, &Column<R>)> {
        self.columns.iter().scan(0usize, |offset, column| {
            let start = *offset;
            *offset = start.saturating_add(column.descriptor.width);
            Some((start, column))
        })
    }
}

impl<R> fmt::Debug for RecordSchema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("record", &self.record)
            .field("columns", &self.columns)
            .finish()
    }
}

fn resolve_converter(
    record: &'static str,
    field: &str,
    descriptor: &ColumnDescriptor,
) -> Result<Arc<dyn ValueConverter>, SchemaError> {
    match &descriptor.converter {
        None => Ok(Arc::new(DefaultConverter)),
        Some(ConverterRef::Instance(converter)) => Ok(Arc::clone(converter)),
        Some(ConverterRef::Named(name)) => {
            let factory = lookup_converter(name).ok_or_else(|| SchemaError::UnknownConverter {
                record,
                field: field.to_string(),
                converter: name.clone(),
            })?;
            factory().map_err(|reason| SchemaError::ConverterInit {
                field: field.to_string(),
                converter: name.clone(),
                reason,
            })
        }
    }
}

type SchemaCache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

static SCHEMAS: OnceLock<SchemaCache> = OnceLock::new();

/// Resolve the schema for `R`, building it on first use.
///
/// The schema is cached for the life of the process and every caller gets
/// the same instance. It is built outside the cache lock, so `describe` and
/// converter factories may resolve other schemas; when first uses race, the
/// first schema stored wins. Errors are returned to the caller and never
/// cached.
pub fn resolve_schema<R: FixedRecord>() -> Result<Arc<RecordSchema<R>>, SchemaError> {
    let cache = SCHEMAS.get_or_init(|| RwLock::new(HashMap::new()));
    let key = TypeId::of::<R>();

    let cached = |entry: Option<&Arc<dyn Any + Send + Sync>>| {
        entry.and_then(|e| Arc::clone(e).downcast::<RecordSchema<R>>().ok())
    };

    if let Some(schema) = cached(cache.read().unwrap_or_else(PoisonError::into_inner).get(&key)) {
        return Ok(schema);
    }

    let schema = Arc::new(RecordSchema::<R>::build()?);
    let mut schemas = cache.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = cached(schemas.get(&key)) {
        return Ok(existing);
    }
    schemas.insert(key, schema.clone());
    Ok(schema)
}
