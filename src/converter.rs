//! Converter contract and the process-wide converter registry.
//!
//! A converter turns one value into the text of a single column and back.
//! [`DefaultConverter`](crate::DefaultConverter) covers the common types;
//! custom converters implement the same two operations for encodings it
//! cannot express, and are attached to a column either as an instance or by
//! a registered name.

use crate::default_converter::DefaultConverter;
use crate::error::ConversionError;
use crate::value::{Value, ValueKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Two-way conversion between a value and its column text.
pub trait ValueConverter: Send + Sync + fmt::Debug {
    /// Render `value` for a column of `width` characters.
    ///
    /// The result may be longer or shorter than `width`; the codec pads or
    /// truncates it afterwards.
    fn to_text(
        &self,
        value: &Value,
        width: usize,
        format: Option<&str>,
    ) -> Result<String, ConversionError>;

    /// Parse column text (already trimmed if the column asks for it) into a
    /// value of `kind`.
    fn from_text(
        &self,
        text: &str,
        kind: ValueKind,
        format: Option<&str>,
    ) -> Result<Value, ConversionError>;
}

/// Creates a converter instance for a registered name.
pub type ConverterFactory = fn() -> Result<Arc<dyn ValueConverter>, String>;

type Registry = RwLock<HashMap<String, ConverterFactory>>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn default_factory() -> Result<Arc<dyn ValueConverter>, String> {
    Ok(Arc::new(DefaultConverter))
}

fn minor_units_factory() -> Result<Arc<dyn ValueConverter>, String> {
    Ok(Arc::new(MinorUnits::cents()))
}

fn whole_units_factory() -> Result<Arc<dyn ValueConverter>, String> {
    Ok(Arc::new(MinorUnits::whole()))
}

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let mut builtins: HashMap<String, ConverterFactory> = HashMap::new();
        builtins.insert("default".to_string(), default_factory);
        builtins.insert("minor-units".to_string(), minor_units_factory);
        builtins.insert("whole-units".to_string(), whole_units_factory);
        RwLock::new(builtins)
    })
}

/// Register a named converter, returning the factory it replaced.
pub fn register_converter(
    name: impl Into<String>,
    factory: ConverterFactory,
) -> Option<ConverterFactory> {
    registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name.into(), factory)
}

/// Look up a registered converter factory.
pub fn lookup_converter(name: &str) -> Option<ConverterFactory> {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .copied()
}

/// Digits-only currency amounts with an implied scale.
///
/// The amount is multiplied by `10^scale` and written as an integer with no
/// separator. Decoding returns that unscaled integer: the scale is known by
/// convention only, so `1234567.89` at scale 2 is written `123456789` and
/// read back as `123456789`. With scale 0 the fraction is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinorUnits {
    pub scale: u32,
}

impl MinorUnits {
    pub fn new(scale: u32) -> Self {
        Self { scale }
    }

    /// Two implied decimals.
    pub fn cents() -> Self {
        Self::new(2)
    }

    /// Whole currency units, fraction discarded.
    pub fn whole() -> Self {
        Self::new(0)
    }

    fn units(&self, amount: f64) -> Result<i64, ConversionError> {
        let scaled = amount * 10f64.powi(self.scale as i32);
        // Rounding absorbs binary error such as 1234567.89 * 100 = 123456788.99999.
        let units = if self.scale == 0 {
            scaled.trunc()
        } else {
            scaled.round()
        };
        if !units.is_finite() || units.abs() >= i64::MAX as f64 {
            return Err(ConversionError::new(format!(
                "amount {amount} does not fit in minor units"
            )));
        }
        Ok(units as i64)
    }
}

impl ValueConverter for MinorUnits {
    fn to_text(
        &self,
        value: &Value,
        width: usize,
        _format: Option<&str>,
    ) -> Result<String, ConversionError> {
        if value.is_null() {
            return Ok(String::new());
        }
        let amount = value
            .as_f64()
            .ok_or_else(|| ConversionError::new(format!("{value:?} is not an amount")))?;
        let units = self.units(amount)?;
        let digits = units.unsigned_abs().to_string();
        Ok(if units < 0 {
            format!("-{digits:0>w$}", w = width.saturating_sub(1))
        } else {
            format!("{digits:0>width$}")
        })
    }

    fn from_text(
        &self,
        text: &str,
        kind: ValueKind,
        _format: Option<&str>,
    ) -> Result<Value, ConversionError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(kind.zero());
        }
        let units: i64 = text
            .parse()
            .map_err(|e| ConversionError::new(format!("'{text}' is not a digit amount: {e}")))?;
        match kind {
            ValueKind::Int => Ok(Value::Int(units)),
            ValueKind::Float => Ok(Value::Float(units as f64)),
            other => Err(ConversionError::new(format!(
                "minor units cannot produce a {other} value"
            ))),
        }
    }
}
