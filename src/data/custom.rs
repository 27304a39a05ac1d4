use std::fmt::{Display, Formatter};

/// One value from the flattened `estats` custom data blob.
///
/// Numeric text is coerced on extraction; anything that fails to parse is kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl CustomValue {
    /// Coerces raw blob text: values containing a `.` are decimals, everything else an integer.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let parsed = if trimmed.contains('.') {
            trimmed.parse::<f64>().ok().map(CustomValue::Decimal)
        } else {
            trimmed.parse::<i64>().ok().map(CustomValue::Integer)
        };

        parsed.unwrap_or_else(|| CustomValue::Text(raw.to_string()))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CustomValue::Integer(i) => Some(*i as f64),
            CustomValue::Decimal(d) => Some(*d),
            CustomValue::Text(_) => None,
        }
    }

    /// Integer view of the value; decimals are only accepted when they are whole.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CustomValue::Integer(i) => Some(*i),
            CustomValue::Decimal(d) if d.fract() == 0.0 => Some(*d as i64),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, CustomValue::Text(_))
    }
}

impl Display for CustomValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CustomValue::Integer(i) => write!(f, "{i}"),
            // keeps the trailing `.0` so `850.0` is not shown as `850`
            CustomValue::Decimal(d) => write!(f, "{d:?}"),
            CustomValue::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_numbers() {
        assert_eq!(CustomValue::parse("1"), CustomValue::Integer(1));
        assert_eq!(CustomValue::parse("-12"), CustomValue::Integer(-12));
        assert_eq!(CustomValue::parse("850.5"), CustomValue::Decimal(850.5));
        assert_eq!(CustomValue::parse(" 42 "), CustomValue::Integer(42));
    }

    #[test]
    fn keeps_text_when_not_numeric() {
        assert_eq!(
            CustomValue::parse("25052801_14a19a2"),
            CustomValue::Text("25052801_14a19a2".into())
        );
        assert_eq!(CustomValue::parse("1.2.3"), CustomValue::Text("1.2.3".into()));
        assert_eq!(
            CustomValue::parse("45 50 48"),
            CustomValue::Text("45 50 48".into())
        );
    }

    #[test]
    fn display_preserves_decimal_form() {
        assert_eq!(CustomValue::Decimal(850.0).to_string(), "850.0");
        assert_eq!(CustomValue::Decimal(850.5).to_string(), "850.5");
        assert_eq!(CustomValue::Integer(850).to_string(), "850");
        assert_eq!(CustomValue::Text("abc".into()).to_string(), "abc");
    }

    #[test]
    fn numeric_views() {
        assert_eq!(CustomValue::Decimal(2.0).as_i64(), Some(2));
        assert_eq!(CustomValue::Decimal(2.5).as_i64(), None);
        assert_eq!(CustomValue::Integer(3).as_f64(), Some(3.0));
        assert!(!CustomValue::Text("x".into()).is_numeric());
    }
}
