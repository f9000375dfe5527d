//! Per-column layout metadata.

use crate::converter::ValueConverter;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Side of the value on which padding is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PadSide {
    /// Pad on the left, value right-aligned: `"   ABC"`.
    Left,
    /// Pad on the right, value left-aligned: `"ABC   "`.
    #[default]
    Right,
}

/// Reference to a custom converter for one column.
#[derive(Clone)]
pub enum ConverterRef {
    /// A concrete converter instance.
    Instance(Arc<dyn ValueConverter>),
    /// A converter looked up by name in the registry when the schema is built.
    Named(String),
}

impl fmt::Debug for ConverterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConverterRef::Instance(c) => f.debug_tuple("Instance").field(c).finish(),
            ConverterRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

/// Layout of one column in a fixed-width line.
///
/// Built with [`ColumnDescriptor::new`] and refined with the chained setters:
///
/// ```
/// use fixed_width_rs::{ColumnDescriptor, PadSide};
///
/// let id = ColumnDescriptor::new(1, 10).pad_left('0');
/// assert_eq!(id.pad_side, PadSide::Left);
/// assert_eq!(id.pad_char, '0');
/// ```
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    /// Position among the record's columns (ascending).
    pub order: i32,
    /// Exact number of characters the column occupies.
    pub width: usize,
    pub pad_char: char,
    pub pad_side: PadSide,
    /// Hint passed to the converter (date pattern, numeric picture, bool token).
    pub format: Option<String>,
    pub trim_on_read: bool,
    /// Used for absent values, ragged lines, and failed conversions.
    pub default_value: Option<Value>,
    pub converter: Option<ConverterRef>,
}

impl ColumnDescriptor {
    pub fn new(order: i32, width: usize) -> Self {
        Self {
            order,
            width,
            pad_char: ' ',
            pad_side: PadSide::Right,
            format: None,
            trim_on_read: true,
            default_value: None,
            converter: None,
        }
    }

    /// Right-align the value, filling on the left with `pad_char`.
    pub fn pad_left(mut self, pad_char: char) -> Self {
        self.pad_side = PadSide::Left;
        self.pad_char = pad_char;
        self
    }

    /// Left-align the value, filling on the right with `pad_char`.
    pub fn pad_right(mut self, pad_char: char) -> Self {
        self.pad_side = PadSide::Right;
        self.pad_char = pad_char;
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn trim_on_read(mut self, trim: bool) -> Self {
        self.trim_on_read = trim;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn converter(mut self, converter: Arc<dyn ValueConverter>) -> Self {
        self.converter = Some(ConverterRef::Instance(converter));
        self
    }

    pub fn converter_named(mut self, name: impl Into<String>) -> Self {
        self.converter = Some(ConverterRef::Named(name.into()));
        self
    }

    /// Fit `text` to exactly `width` characters.
    ///
    /// Longer text is cut from the right; shorter text is padded on
    /// `pad_side`. Zero-filling keeps a leading `-` in front of the fill, so
    /// `-42` in six columns becomes `-00042`.
    pub fn fit(&self, text: &str) -> String {
        let len = text.chars().count();
        if len >= self.width {
            return text.chars().take(self.width).collect();
        }
        let padding: String = std::iter::repeat_n(self.pad_char, self.width - len).collect();
        match self.pad_side {
            PadSide::Right => format!("{text}{padding}"),
            PadSide::Left if self.pad_char.is_ascii_digit() => match text.strip_prefix('-') {
                Some(digits) => format!("-{padding}{digits}"),
                None => format!("{padding}{text}"),
            },
            PadSide::Left => format!("{padding}{text}"),
        }
    }

    /// Strip padding from a raw column slice before conversion.
    ///
    /// Surrounding whitespace always goes. A pad character that is neither
    /// whitespace nor a digit is also stripped from the pad side; digit
    /// padding is left for the numeric parser so fractional digits survive.
    pub fn trim<'a>(&self, raw: &'a str) -> &'a str {
        let mut text = raw.trim();
        if !self.pad_char.is_whitespace() && !self.pad_char.is_ascii_digit() {
            text = match self.pad_side {
                PadSide::Left => text.trim_start_matches(self.pad_char),
                PadSide::Right => text.trim_end_matches(self.pad_char),
            };
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let d = ColumnDescriptor::new(3, 8);
        assert_eq!(d.order, 3);
        assert_eq!(d.width, 8);
        assert_eq!(d.pad_char, ' ');
        assert_eq!(d.pad_side, PadSide::Right);
        assert!(d.trim_on_read);
        assert!(d.format.is_none());
        assert!(d.default_value.is_none());
        assert!(d.converter.is_none());
    }

    #[test]
    fn test_fit_pads_left_with_zeros() {
        let d = ColumnDescriptor::new(1, 10).pad_left('0');
        assert_eq!(d.fit("1007"), "0000001007");
    }

    #[test]
    fn test_fit_pads_right_with_spaces() {
        let d = ColumnDescriptor::new(2, 30);
        let fitted = d.fit("ABC");
        assert_eq!(fitted, format!("ABC{}", " ".repeat(27)));
        assert_eq!(fitted.len(), 30);
    }

    #[test]
    fn test_fit_truncates_from_right() {
        let d = ColumnDescriptor::new(1, 5).pad_left('0');
        assert_eq!(d.fit("ABCDEFGH"), "ABCDE");
    }

    #[test]
    fn test_fit_zero_fill_keeps_sign_first() {
        let d = ColumnDescriptor::new(1, 6).pad_left('0');
        assert_eq!(d.fit("-42"), "-00042");
        let d = ColumnDescriptor::new(1, 6).pad_left(' ');
        assert_eq!(d.fit("-42"), "   -42");
        let d = ColumnDescriptor::new(1, 6).pad_right('0');
        assert_eq!(d.fit("-42"), "-42000");
    }

    #[test]
    fn test_fit_counts_characters() {
        let d = ColumnDescriptor::new(1, 4);
        assert_eq!(d.fit("L\u{ea}"), "L\u{ea}  ");
        assert_eq!(d.fit("Nguy\u{1ec5}n"), "Nguy");
    }

    #[test]
    fn test_trim_keeps_digit_padding() {
        let d = ColumnDescriptor::new(1, 10).pad_left('0');
        assert_eq!(d.trim("0000000005"), "0000000005");
    }

    #[test]
    fn test_trim_strips_symbol_padding_on_pad_side() {
        let d = ColumnDescriptor::new(1, 8).pad_right('*');
        assert_eq!(d.trim("*AB*****"), "*AB");
        let d = ColumnDescriptor::new(1, 8).pad_left('_');
        assert_eq!(d.trim("____AB__"), "AB__");
    }

    #[test]
    fn test_trim_whitespace() {
        let d = ColumnDescriptor::new(1, 8);
        assert_eq!(d.trim("  AB    "), "AB");
    }
}
