//! Encoding records to fixed-width lines and decoding lines back.
//!
//! The codec is forgiving by default, the way legacy batch files expect:
//!
//! - text longer than its column is cut from the right,
//! - a line too short for the remaining columns leaves them at their
//!   default values,
//! - a value that cannot be converted becomes the column's default.
//!
//! Each of these is a named policy in [`CodecOptions`];
//! [`CodecOptions::strict`] turns all three into errors.

use crate::error::{ConversionError, FixedWidthError, Result, SchemaError};
use crate::schema::{Column, FixedRecord, RecordSchema, resolve_schema};
use crate::value::Value;
use std::sync::Arc;
use tracing::{trace, warn};

/// What to do when a value cannot be converted to or from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnConversionError {
    /// Use the column's default value (or its type's zero value).
    #[default]
    UseDefault,
    /// Report a [`FixedWidthError::Conversion`].
    Fail,
}

/// What to do when encoded text is wider than its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnOverflow {
    /// Keep the leftmost `width` characters.
    #[default]
    Truncate,
    /// Report a [`FixedWidthError::Overflow`].
    Fail,
}

/// What to do when a line ends before all columns are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnShortLine {
    /// Give the remaining columns their default values.
    #[default]
    UseDefault,
    /// Report a [`FixedWidthError::ShortLine`].
    Fail,
}

/// Policies applied by a [`LineCodec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecOptions {
    pub on_conversion_error: OnConversionError,
    pub on_overflow: OnOverflow,
    pub on_short_line: OnShortLine,
}

impl CodecOptions {
    /// Every irregularity is reported as an error.
    pub fn strict() -> Self {
        Self {
            on_conversion_error: OnConversionError::Fail,
            on_overflow: OnOverflow::Fail,
            on_short_line: OnShortLine::Fail,
        }
    }

    pub fn on_conversion_error(mut self, policy: OnConversionError) -> Self {
        self.on_conversion_error = policy;
        self
    }

    pub fn on_overflow(mut self, policy: OnOverflow) -> Self {
        self.on_overflow = policy;
        self
    }

    pub fn on_short_line(mut self, policy: OnShortLine) -> Self {
        self.on_short_line = policy;
        self
    }
}

/// Converts records of type `R` to and from fixed-width lines.
#[derive(Debug)]
pub struct LineCodec<R> {
    schema: Arc<RecordSchema<R>>,
    options: CodecOptions,
}

impl<R> Clone for LineCodec<R> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            options: self.options,
        }
    }
}

impl<R: FixedRecord> LineCodec<R> {
    /// Codec with the forgiving default policies.
    pub fn new() -> std::result::Result<Self, SchemaError> {
        Self::with_options(CodecOptions::default())
    }

    pub fn with_options(options: CodecOptions) -> std::result::Result<Self, SchemaError> {
        Ok(Self {
            schema: resolve_schema::<R>()?,
            options,
        })
    }

    pub fn schema(&self) -> &RecordSchema<R> {
        &self.schema
    }

    pub fn options(&self) -> CodecOptions {
        self.options
    }

    /// Render `record` as one line of exactly [`RecordSchema::line_width`]
    /// characters (under the default policies).
    pub fn encode_record(&self, record: &R) -> Result<String> {
        let mut line = String::with_capacity(self.schema.line_width());
        for column in self.schema.columns() {
            let desc = &column.descriptor;
            let mut value = column.get(record);
            if value.is_null() {
                value = column.fallback();
            }
            let text = match column
                .converter()
                .to_text(&value, desc.width, desc.format.as_deref())
            {
                Ok(text) => text,
                Err(err) => self.encode_fallback(column, err)?,
            };
            let len = text.chars().count();
            if len > desc.width && self.options.on_overflow == OnOverflow::Fail {
                return Err(FixedWidthError::Overflow {
                    field: column.name.to_string(),
                    width: desc.width,
                    len,
                });
            }
            line.push_str(&desc.fit(&text));
        }
        Ok(line)
    }

    /// Parse one line into a new record.
    ///
    /// Columns are read left to right at their cumulative offsets. Once a
    /// column would run past the end of the line, it and every column after
    /// it take their default values.
    pub fn decode_line(&self, line: &str) -> Result<R> {
        // Byte offset of every character boundary, so columns slice by
        // character count rather than by byte.
        let bounds: Vec<usize> = line
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(line.len()))
            .collect();
        let line_len = bounds.len() - 1;

        let mut record = R::default();
        let mut offset: usize = 0;
        let mut ragged = false;
        for column in self.schema.columns() {
            let desc = &column.descriptor;
            let past_end = offset
                .checked_add(desc.width)
                .is_none_or(|end| end > line_len);
            if ragged || past_end {
                if self.options.on_short_line == OnShortLine::Fail {
                    return Err(FixedWidthError::ShortLine {
                        field: column.name.to_string(),
                        offset,
                        line_len,
                    });
                }
                if !ragged {
                    trace!(
                        field = column.name,
                        offset,
                        line_len,
                        "short line, defaulting remaining columns"
                    );
                    ragged = true;
                }
                self.assign_fallback(column, &mut record);
                continue;
            }

            let raw = &line[bounds[offset]..bounds[offset + desc.width]];
            offset += desc.width;
            let text = if desc.trim_on_read { desc.trim(raw) } else { raw };

            let converted = if column.nullable && text.trim().is_empty() {
                Ok(Value::Null)
            } else {
                column
                    .converter()
                    .from_text(text, column.kind, desc.format.as_deref())
            };
            let failure = match converted {
                Ok(value) if column.set(&mut record, value.clone()) => continue,
                Ok(value) => ConversionError::new(format!(
                    "{value:?} cannot be stored in a {} field",
                    column.kind
                )),
                Err(err) => err,
            };
            if self.options.on_conversion_error == OnConversionError::Fail {
                return Err(FixedWidthError::Conversion {
                    field: column.name.to_string(),
                    message: failure.to_string(),
                });
            }
            warn!(
                field = column.name,
                text,
                error = %failure,
                "conversion failed, using default"
            );
            self.assign_fallback(column, &mut record);
        }
        Ok(record)
    }

    pub fn encode_records<'a, I>(&self, records: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = &'a R>,
    {
        records.into_iter().map(|r| self.encode_record(r)).collect()
    }

    pub fn decode_lines<'a, I>(&self, lines: I) -> Result<Vec<R>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        lines.into_iter().map(|l| self.decode_line(l)).collect()
    }

    fn encode_fallback(&self, column: &Column<R>, err: ConversionError) -> Result<String> {
        if self.options.on_conversion_error == OnConversionError::Fail {
            return Err(FixedWidthError::Conversion {
                field: column.name.to_string(),
                message: err.to_string(),
            });
        }
        warn!(field = column.name, error = %err, "conversion failed, using default");
        let desc = &column.descriptor;
        Ok(column
            .converter()
            .to_text(&column.fallback(), desc.width, desc.format.as_deref())
            .unwrap_or_default())
    }

    fn assign_fallback(&self, column: &Column<R>, record: &mut R) {
        if !column.set(record, column.fallback()) {
            // A default of the wrong kind; the type's zero value always fits.
            column.set(record, column.kind.zero());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{MinorUnits, ValueConverter};
    use crate::descriptor::ColumnDescriptor;
    use crate::schema::SchemaBuilder;
    use crate::value::ValueKind;
    use chrono::NaiveDate;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Payment {
        id: i64,
        payee: String,
        paid_on: NaiveDate,
        amount: f64,
        cleared: bool,
        memo: Option<String>,
    }

    impl FixedRecord for Payment {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .column("payee", |r| &r.payee, |r| &mut r.payee, ColumnDescriptor::new(2, 12))
                .column(
                    "id",
                    |r| &r.id,
                    |r| &mut r.id,
                    ColumnDescriptor::new(1, 6).pad_left('0'),
                )
                .column(
                    "paid_on",
                    |r| &r.paid_on,
                    |r| &mut r.paid_on,
                    ColumnDescriptor::new(3, 8).format("yyyyMMdd"),
                )
                .column(
                    "amount",
                    |r| &r.amount,
                    |r| &mut r.amount,
                    ColumnDescriptor::new(4, 10).pad_left('0').format("0000000.00"),
                )
                .column(
                    "cleared",
                    |r| &r.cleared,
                    |r| &mut r.cleared,
                    ColumnDescriptor::new(5, 1),
                )
                .column("memo", |r| &r.memo, |r| &mut r.memo, ColumnDescriptor::new(6, 5));
        }
    }

    fn payment() -> Payment {
        Payment {
            id: 42,
            payee: "ACME".to_string(),
            paid_on: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            amount: 1234.56,
            cleared: true,
            memo: Some("RENT".to_string()),
        }
    }

    const PAYMENT_LINE: &str = "000042ACME        202402290000123456YRENT ";

    #[test]
    fn test_encode_layout() {
        let codec = LineCodec::<Payment>::new().unwrap();
        let line = codec.encode_record(&payment()).unwrap();
        assert_eq!(line, PAYMENT_LINE);
        assert_eq!(line.len(), codec.schema().line_width());
    }

    #[test]
    fn test_decode_layout() {
        let codec = LineCodec::<Payment>::new().unwrap();
        assert_eq!(codec.decode_line(PAYMENT_LINE).unwrap(), payment());
    }

    #[test]
    fn test_reencode_is_identical() {
        let codec = LineCodec::<Payment>::new().unwrap();
        let decoded = codec.decode_line(PAYMENT_LINE).unwrap();
        assert_eq!(codec.encode_record(&decoded).unwrap(), PAYMENT_LINE);
    }

    #[test]
    fn test_none_encodes_as_blank_and_decodes_as_none() {
        let codec = LineCodec::<Payment>::new().unwrap();
        let mut p = payment();
        p.memo = None;
        let line = codec.encode_record(&p).unwrap();
        assert!(line.ends_with("Y     "));
        assert_eq!(codec.decode_line(&line).unwrap().memo, None);
    }

    #[test]
    fn test_overlong_text_truncated() {
        let codec = LineCodec::<Payment>::new().unwrap();
        let mut p = payment();
        p.payee = "INTERNATIONAL WIDGETS".to_string();
        let line = codec.encode_record(&p).unwrap();
        assert_eq!(&line[6..18], "INTERNATIONA");
        assert_eq!(line.len(), codec.schema().line_width());
    }

    #[test]
    fn test_overflow_fails_in_strict_mode() {
        let codec = LineCodec::<Payment>::with_options(CodecOptions::strict()).unwrap();
        let mut p = payment();
        p.payee = "INTERNATIONAL WIDGETS".to_string();
        let err = codec.encode_record(&p).unwrap_err();
        assert!(matches!(
            err,
            FixedWidthError::Overflow { ref field, width: 12, len: 21 } if field == "payee"
        ));
    }

    #[test]
    fn test_short_line_defaults_remaining_columns() {
        let codec = LineCodec::<Payment>::new().unwrap();
        // id, payee and date present; amount cut short.
        let decoded = codec.decode_line("000042ACME        2024022900012").unwrap();
        assert_eq!(decoded.id, 42);
        assert_eq!(decoded.payee, "ACME");
        assert_eq!(decoded.paid_on, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(decoded.amount, 0.0);
        // The one-character bool would fit at the stale offset; it is still defaulted.
        assert!(!decoded.cleared);
        assert_eq!(decoded.memo, None);
    }

    #[test]
    fn test_empty_line_is_all_defaults() {
        let codec = LineCodec::<Payment>::new().unwrap();
        assert_eq!(codec.decode_line("").unwrap(), Payment::default());
    }

    #[test]
    fn test_short_line_fails_in_strict_mode() {
        let codec = LineCodec::<Payment>::with_options(CodecOptions::strict()).unwrap();
        let err = codec.decode_line("000042ACME").unwrap_err();
        assert!(matches!(
            err,
            FixedWidthError::ShortLine { ref field, offset: 6, line_len: 10 } if field == "payee"
        ));
    }

    #[test]
    fn test_bad_field_silently_defaulted() {
        let codec = LineCodec::<Payment>::new().unwrap();
        let line = PAYMENT_LINE.replace("20240229", "2024XX29");
        let decoded = codec.decode_line(&line).unwrap();
        // Corrupt data is indistinguishable from an empty date.
        assert_eq!(decoded.paid_on, NaiveDate::default());
        assert_eq!(decoded.amount, 1234.56);
    }

    #[test]
    fn test_bad_field_fails_when_policy_is_fail() {
        let options = CodecOptions::default().on_conversion_error(OnConversionError::Fail);
        let codec = LineCodec::<Payment>::with_options(options).unwrap();
        let line = PAYMENT_LINE.replace("20240229", "2024XX29");
        let err = codec.decode_line(&line).unwrap_err();
        assert!(matches!(err, FixedWidthError::Conversion { ref field, .. } if field == "paid_on"));
    }

    #[test]
    fn test_multibyte_text_counts_characters() {
        let codec = LineCodec::<Payment>::new().unwrap();
        let mut p = payment();
        p.payee = "Nguy\u{1ec5}n V\u{103}n A".to_string();
        let line = codec.encode_record(&p).unwrap();
        assert_eq!(line.chars().count(), codec.schema().line_width());
        assert_eq!(codec.decode_line(&line).unwrap().payee, p.payee);
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Adjustment {
        delta: i64,
        rate: f64,
    }

    impl FixedRecord for Adjustment {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .column(
                    "delta",
                    |r| &r.delta,
                    |r| &mut r.delta,
                    ColumnDescriptor::new(1, 6).pad_left('0'),
                )
                .column(
                    "rate",
                    |r| &r.rate,
                    |r| &mut r.rate,
                    ColumnDescriptor::new(2, 10).pad_left('0'),
                );
        }
    }

    #[test]
    fn test_negative_numbers_in_zero_filled_columns() {
        let codec = LineCodec::<Adjustment>::new().unwrap();
        let adjustment = Adjustment {
            delta: -42,
            rate: -12.5,
        };
        let line = codec.encode_record(&adjustment).unwrap();
        assert_eq!(line, "-00042-000001250");
        assert_eq!(codec.decode_line(&line).unwrap(), adjustment);

        let small = Adjustment {
            delta: -1,
            rate: -0.05,
        };
        let line = codec.encode_record(&small).unwrap();
        assert_eq!(line, "-00001-000000005");
        assert_eq!(codec.decode_line(&line).unwrap(), small);
    }

    #[test]
    fn test_oversized_column_is_short_line() {
        #[derive(Debug, Default)]
        struct Oversized {
            code: String,
            rest: String,
        }

        impl FixedRecord for Oversized {
            fn describe(schema: &mut SchemaBuilder<Self>) {
                schema
                    .column("code", |r| &r.code, |r| &mut r.code, ColumnDescriptor::new(1, 4))
                    .column(
                        "rest",
                        |r| &r.rest,
                        |r| &mut r.rest,
                        ColumnDescriptor::new(2, usize::MAX),
                    );
            }
        }

        let codec = LineCodec::<Oversized>::new().unwrap();
        assert_eq!(codec.schema().line_width(), usize::MAX);
        let decoded = codec.decode_line("ABCDEFGH").unwrap();
        assert_eq!(decoded.code, "ABCD");
        assert_eq!(decoded.rest, "");

        let strict = LineCodec::<Oversized>::with_options(CodecOptions::strict()).unwrap();
        assert!(matches!(
            strict.decode_line("ABCDEFGH"),
            Err(FixedWidthError::ShortLine { offset: 4, line_len: 8, .. })
        ));
    }

    #[derive(Debug, Default, PartialEq)]
    struct Ledger {
        account: i32,
        balance: f64,
        currency: String,
        active: bool,
    }

    impl FixedRecord for Ledger {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .column(
                    "account",
                    |r| &r.account,
                    |r| &mut r.account,
                    ColumnDescriptor::new(1, 4).pad_left('0').default_value(9999),
                )
                .column(
                    "balance",
                    |r| &r.balance,
                    |r| &mut r.balance,
                    ColumnDescriptor::new(2, 9)
                        .pad_left('0')
                        .converter(Arc::new(MinorUnits::cents())),
                )
                .column(
                    "currency",
                    |r| &r.currency,
                    |r| &mut r.currency,
                    ColumnDescriptor::new(3, 3).default_value("VND"),
                )
                .column(
                    "active",
                    |r| &r.active,
                    |r| &mut r.active,
                    ColumnDescriptor::new(4, 1).format("A/I").default_value(true),
                );
        }
    }

    #[test]
    fn test_custom_converter_decodes_unscaled() {
        let codec = LineCodec::<Ledger>::new().unwrap();
        let ledger = Ledger {
            account: 7,
            balance: 1234567.89,
            currency: "USD".to_string(),
            active: false,
        };
        let line = codec.encode_record(&ledger).unwrap();
        assert_eq!(line, "0007123456789USDI");
        let decoded = codec.decode_line(&line).unwrap();
        assert_eq!(decoded.balance, 123456789.0);
    }

    #[test]
    fn test_declared_defaults_fill_short_line() {
        let codec = LineCodec::<Ledger>::new().unwrap();
        let decoded = codec.decode_line("0012").unwrap();
        assert_eq!(decoded.account, 12);
        assert_eq!(decoded.balance, 0.0);
        assert_eq!(decoded.currency, "VND");
        assert!(decoded.active);
    }

    #[test]
    fn test_out_of_range_value_uses_default() {
        #[derive(Debug, Default)]
        struct Narrow {
            small: u32,
        }

        impl FixedRecord for Narrow {
            fn describe(schema: &mut SchemaBuilder<Self>) {
                schema.column(
                    "small",
                    |r| &r.small,
                    |r| &mut r.small,
                    ColumnDescriptor::new(1, 4).default_value(1),
                );
            }
        }

        let codec = LineCodec::<Narrow>::new().unwrap();
        assert_eq!(codec.decode_line("-005").unwrap().small, 1);
        let strict = LineCodec::<Narrow>::with_options(CodecOptions::strict()).unwrap();
        assert!(matches!(
            strict.decode_line("-005"),
            Err(FixedWidthError::Conversion { .. })
        ));
    }

    #[derive(Debug)]
    struct Rejecting;

    impl ValueConverter for Rejecting {
        fn to_text(
            &self,
            value: &Value,
            _width: usize,
            _format: Option<&str>,
        ) -> std::result::Result<String, ConversionError> {
            match value {
                Value::Text(s) if s == "FALLBACK" => Ok("FB".to_string()),
                _ => Err(ConversionError::new("rejected")),
            }
        }

        fn from_text(
            &self,
            _text: &str,
            _kind: ValueKind,
            _format: Option<&str>,
        ) -> std::result::Result<Value, ConversionError> {
            Err(ConversionError::new("rejected"))
        }
    }

    #[derive(Debug, Default)]
    struct Guarded {
        code: String,
    }

    impl FixedRecord for Guarded {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema.column(
                "code",
                |r| &r.code,
                |r| &mut r.code,
                ColumnDescriptor::new(1, 4)
                    .default_value("FALLBACK")
                    .converter(Arc::new(Rejecting)),
            );
        }
    }

    #[test]
    fn test_encode_failure_uses_default_text() {
        let codec = LineCodec::<Guarded>::new().unwrap();
        let line = codec
            .encode_record(&Guarded {
                code: "ABC".to_string(),
            })
            .unwrap();
        assert_eq!(line, "FB  ");
        assert_eq!(codec.decode_line("ABCD").unwrap().code, "FALLBACK");
    }

    #[test]
    fn test_encode_failure_reported_when_policy_is_fail() {
        let options = CodecOptions::default().on_conversion_error(OnConversionError::Fail);
        let codec = LineCodec::<Guarded>::with_options(options).unwrap();
        let err = codec
            .encode_record(&Guarded {
                code: "ABC".to_string(),
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "field 'code': rejected");
    }

    #[test]
    fn test_trim_on_read_disabled_keeps_padding() {
        #[derive(Debug, Default)]
        struct Raw {
            text: String,
        }

        impl FixedRecord for Raw {
            fn describe(schema: &mut SchemaBuilder<Self>) {
                schema.column(
                    "text",
                    |r| &r.text,
                    |r| &mut r.text,
                    ColumnDescriptor::new(1, 6).trim_on_read(false),
                );
            }
        }

        let codec = LineCodec::<Raw>::new().unwrap();
        assert_eq!(codec.decode_line("AB    ").unwrap().text, "AB    ");
    }

    #[test]
    fn test_batch_helpers() {
        let codec = LineCodec::<Payment>::new().unwrap();
        let records = vec![payment(), Payment::default()];
        let lines = codec.encode_records(&records).unwrap();
        assert_eq!(lines.len(), 2);
        let decoded = codec.decode_lines(lines.iter().map(String::as_str)).unwrap();
        assert_eq!(decoded[0], payment());
    }
}
