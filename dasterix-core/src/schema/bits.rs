//! Bit-field descriptors of a Fixed format part.

/// How the raw bits of a field are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Plain unsigned integer (the grammar default).
    #[default]
    Unsigned,
    /// Two's-complement signed integer.
    Signed,
    /// ICAO six-bit character groups (callsigns, aircraft identification).
    SixBitsChar,
    /// Unsigned integer displayed in octal (Mode-3/A squawk codes).
    Octal,
    /// Raw octets rendered as a hex string.
    Hex,
    /// Single-bit flag, normally paired with enumerated meanings.
    Flag,
}

impl Encoding {
    /// Maps the grammar's `encode` attribute vocabulary. `ascii` is the
    /// historical spelling of the six-bit character encoding found in
    /// older category files.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unsigned" => Some(Encoding::Unsigned),
            "signed" => Some(Encoding::Signed),
            "6bitschar" | "ascii" => Some(Encoding::SixBitsChar),
            "octal" => Some(Encoding::Octal),
            "hex" => Some(Encoding::Hex),
            "flag" => Some(Encoding::Flag),
            _ => None,
        }
    }
}

/// One `(value, meaning)` enumeration entry of a bit field.
#[derive(Debug, Clone, PartialEq)]
pub struct BitsValue {
    pub value: i64,
    pub meaning: String,
}

/// Descriptor of one bit field inside a Fixed part.
///
/// `from`/`to` use the category-specification numbering: 1-based,
/// inclusive, bit 1 = LSB of the last octet of the part, `from >= to`.
/// A single-bit grammar declaration (`bit="n"`) loads as `from == to`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bits {
    pub from: usize,
    pub to: usize,
    pub short_name: String,
    pub name: String,
    pub encoding: Encoding,
    /// This bit is the extension bit of a Variable part.
    pub fx: bool,
    /// Multiplier applied to the raw value (from `BitsUnit scale=`).
    pub scale: Option<f64>,
    pub unit: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Expected constant value (from `BitsConst`).
    pub expected: Option<i64>,
    pub values: Vec<BitsValue>,
}

impl Bits {
    pub fn new(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            short_name: String::new(),
            name: String::new(),
            encoding: Encoding::default(),
            fx: false,
            scale: None,
            unit: String::new(),
            min: None,
            max: None,
            expected: None,
            values: Vec::new(),
        }
    }

    /// Field width in bits.
    pub fn width(&self) -> usize {
        self.from - self.to + 1
    }

    /// Spare bits carry no information and produce no output field.
    pub fn is_spare(&self) -> bool {
        self.short_name.eq_ignore_ascii_case("spare")
    }

    /// Enumerated meaning of `value`, if the grammar declares one.
    pub fn meaning_of(&self, value: i64) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.value == value)
            .map(|v| v.meaning.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_vocabulary() {
        assert_eq!(Encoding::parse("unsigned"), Some(Encoding::Unsigned));
        assert_eq!(Encoding::parse("signed"), Some(Encoding::Signed));
        assert_eq!(Encoding::parse("6bitschar"), Some(Encoding::SixBitsChar));
        assert_eq!(Encoding::parse("ascii"), Some(Encoding::SixBitsChar));
        assert_eq!(Encoding::parse("octal"), Some(Encoding::Octal));
        assert_eq!(Encoding::parse("hex"), Some(Encoding::Hex));
        assert_eq!(Encoding::parse("flag"), Some(Encoding::Flag));
        assert_eq!(Encoding::parse("float"), None);
    }

    #[test]
    fn width_and_spare() {
        let mut bits = Bits::new(16, 9);
        assert_eq!(bits.width(), 8);
        assert!(!bits.is_spare());

        bits.short_name = "spare".into();
        assert!(bits.is_spare());
    }

    #[test]
    fn meaning_lookup() {
        let mut bits = Bits::new(1, 1);
        bits.values.push(BitsValue {
            value: 0,
            meaning: "Plot".into(),
        });
        bits.values.push(BitsValue {
            value: 1,
            meaning: "Track".into(),
        });

        assert_eq!(bits.meaning_of(1), Some("Track"));
        assert_eq!(bits.meaning_of(2), None);
    }
}
