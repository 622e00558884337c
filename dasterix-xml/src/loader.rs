//! Event-driven loader for ASTERIX category definition files.
//!
//! The grammar files follow the classic `asterix.dtd` layout:
//!
//! ```xml
//! <Category id="48" name="Monoradar Target Reports" ver="1.30">
//!     <DataItem id="010" rule="mandatory">
//!         <DataItemName>Data Source Identifier</DataItemName>
//!         <DataItemFormat>
//!             <Fixed length="2">
//!                 <Bits from="16" to="9">
//!                     <BitsShortName>SAC</BitsShortName>
//!                     <BitsName>System Area Code</BitsName>
//!                 </Bits>
//!                 ...
//!             </Fixed>
//!         </DataItemFormat>
//!     </DataItem>
//!     <UAP>
//!         <UAPItem bit="0" frn="1" len="2">010</UAPItem>
//!         ...
//!     </UAP>
//! </Category>
//! ```
//!
//! The loader walks the XML event stream, keeping a builder stack for the
//! nested format elements and a single character-data sink selected by
//! the most recent opening element. Text may arrive in several chunks and
//! is always appended, never assigned. Every structural violation is
//! reported once with file and 1-based line, and aborts that file only.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use dasterix_core::error::AsterixError;
use dasterix_core::schema::{
    Bits, BitsValue, Category, CompoundFormat, DataItemDescription, DataItemFormat, Encoding,
    ExplicitFormat, FixedFormat, RepetitiveFormat, Rule, Uap, UapEntry, UapSelector, UapSlot,
    VariableFormat,
};

/// Longest accepted grammar or manifest path, re-checked defensively.
pub const MAX_PATH_LEN: usize = 4_096;

/// Loads one category definition file.
pub fn load_category_file(path: &Path) -> Result<Category, AsterixError> {
    let name = path.display().to_string();
    if name.len() > MAX_PATH_LEN {
        return Err(AsterixError::Config(format!(
            "path longer than {MAX_PATH_LEN} bytes"
        )));
    }
    let xml = std::fs::read_to_string(path)
        .map_err(|e| AsterixError::Config(format!("cannot read {name}: {e}")))?;
    parse_category(&xml, &name)
}

/// Parses a category definition from XML text. `file` is used in error
/// messages only.
pub fn parse_category(xml: &str, file: &str) -> Result<Category, AsterixError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut loader = Loader::new(xml, file);
    loop {
        let position = reader.buffer_position();
        match reader.read_event() {
            Err(e) => return Err(loader.error_at(position, format!("malformed XML: {e}"))),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => loader.element_start(&e, position)?,
            Ok(Event::Empty(e)) => {
                loader.element_start(&e, position)?;
                let name = e.name().as_ref().to_vec();
                loader.element_end(&name, position)?;
            }
            Ok(Event::End(e)) => {
                let name = e.name().as_ref().to_vec();
                loader.element_end(&name, position)?;
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| loader.error_at(position, format!("bad character data: {e}")))?;
                loader.character_data(&text);
            }
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t).into_owned();
                loader.character_data(&text);
            }
            // Declarations, doctype, comments and processing instructions
            // carry no grammar content.
            Ok(_) => {}
        }
    }

    loader.finish(xml.len())
}

/// Destination of the next character-data chunk. The original reference
/// implementation keeps two raw pointers for this; an enum of known sinks
/// expresses the same state machine without the aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CharSink {
    #[default]
    None,
    ItemName,
    ItemDefinition,
    ItemNote,
    BitsShortName,
    BitsName,
    BitsValueMeaning,
    BitsUnit,
    BitsConst,
    UapItem,
}

/// Format element currently being built. `DataItemFormat` is the wrapper
/// element holding the finished root until the item closes.
#[derive(Debug)]
enum FormatBuilder {
    Wrapper(Option<DataItemFormat>),
    Fixed(FixedFormat),
    Variable(VariableFormat),
    Compound(Vec<DataItemFormat>),
    Repetitive(RepetitiveFormat),
    Explicit(ExplicitFormat),
    Bds,
}

impl FormatBuilder {
    fn kind(&self) -> &'static str {
        match self {
            FormatBuilder::Wrapper(_) => "DataItemFormat",
            FormatBuilder::Fixed(_) => "Fixed",
            FormatBuilder::Variable(_) => "Variable",
            FormatBuilder::Compound(_) => "Compound",
            FormatBuilder::Repetitive(_) => "Repetitive",
            FormatBuilder::Explicit(_) => "Explicit",
            FormatBuilder::Bds => "BDS",
        }
    }
}

#[derive(Debug, Default)]
struct ItemBuilder {
    id: String,
    rule: Rule,
    name: String,
    definition: String,
    note: String,
}

#[derive(Debug, Default)]
struct UapItemBuilder {
    bit: u32,
    frn: String,
    length_hint: Option<u8>,
    text: String,
}

struct Loader<'a> {
    xml: &'a str,
    file: &'a str,
    category: Option<Category>,
    item: Option<ItemBuilder>,
    formats: Vec<FormatBuilder>,
    bits: Option<Bits>,
    bits_value: Option<i64>,
    bits_value_meaning: String,
    uap: Option<Uap>,
    uap_item: Option<UapItemBuilder>,
    sink: CharSink,
}

impl<'a> Loader<'a> {
    fn new(xml: &'a str, file: &'a str) -> Self {
        Self {
            xml,
            file,
            category: None,
            item: None,
            formats: Vec::new(),
            bits: None,
            bits_value: None,
            bits_value_meaning: String::new(),
            uap: None,
            uap_item: None,
            sink: CharSink::None,
        }
    }

    fn error_at(&self, position: usize, message: impl Into<String>) -> AsterixError {
        let position = position.min(self.xml.len());
        let line = self.xml[..position].bytes().filter(|&b| b == b'\n').count() + 1;
        AsterixError::Schema {
            file: self.file.to_string(),
            line,
            message: message.into(),
        }
    }

    // --- attribute helpers ----------------------------------------------

    fn attr(&self, e: &BytesStart<'_>, name: &str, pos: usize) -> Result<Option<String>, AsterixError> {
        match e.try_get_attribute(name) {
            Ok(Some(a)) => {
                let value = a
                    .unescape_value()
                    .map_err(|err| self.error_at(pos, format!("bad attribute {name}: {err}")))?;
                Ok(Some(value.into_owned()))
            }
            Ok(None) => Ok(None),
            Err(err) => Err(self.error_at(pos, format!("bad attribute {name}: {err}"))),
        }
    }

    fn required_attr(
        &self,
        e: &BytesStart<'_>,
        element: &str,
        name: &str,
        pos: usize,
    ) -> Result<String, AsterixError> {
        self.attr(e, name, pos)?.ok_or_else(|| {
            self.error_at(pos, format!("{element} is missing required attribute {name}"))
        })
    }

    fn int_attr(
        &self,
        e: &BytesStart<'_>,
        element: &str,
        name: &str,
        pos: usize,
    ) -> Result<Option<i64>, AsterixError> {
        match self.attr(e, name, pos)? {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<i64>().map(Some).map_err(|_| {
                self.error_at(pos, format!("{element} attribute {name} is not a number: {raw}"))
            }),
        }
    }

    // --- element start ---------------------------------------------------

    fn element_start(&mut self, e: &BytesStart<'_>, pos: usize) -> Result<(), AsterixError> {
        self.sink = CharSink::None;
        let name = e.name();
        match name.as_ref() {
            b"Category" => self.category_start(e, pos),
            b"DataItem" => self.data_item_start(e, pos),
            b"DataItemName" => self.string_sink(CharSink::ItemName, "DataItemName", pos),
            b"DataItemDefinition" => {
                self.string_sink(CharSink::ItemDefinition, "DataItemDefinition", pos)
            }
            b"DataItemNote" => self.string_sink(CharSink::ItemNote, "DataItemNote", pos),
            b"DataItemFormat" => self.format_wrapper_start(pos),
            b"Fixed" => self.fixed_start(e, pos),
            b"Variable" => self.variable_start(pos),
            b"Compound" => self.compound_start(pos),
            b"Repetitive" => self.repetitive_start(pos),
            b"Explicit" => self.explicit_start(pos),
            b"BDS" => self.bds_start(pos),
            b"Bits" => self.bits_start(e, pos),
            b"BitsShortName" => self.bits_sink(CharSink::BitsShortName, "BitsShortName", pos),
            b"BitsName" => self.bits_sink(CharSink::BitsName, "BitsName", pos),
            b"BitsValue" => self.bits_value_start(e, pos),
            b"BitsUnit" => self.bits_unit_start(e, pos),
            b"BitsConst" => self.bits_sink(CharSink::BitsConst, "BitsConst", pos),
            b"UAP" => self.uap_start(e, pos),
            b"UAPItem" => self.uap_item_start(e, pos),
            other => {
                log::warn!(
                    "{}: ignoring unknown element {}",
                    self.file,
                    String::from_utf8_lossy(other)
                );
                Ok(())
            }
        }
    }

    fn category_start(&mut self, e: &BytesStart<'_>, pos: usize) -> Result<(), AsterixError> {
        if self.category.is_some() {
            return Err(self.error_at(pos, "nested Category element"));
        }
        let id = self.required_attr(e, "Category", "id", pos)?;
        // The BDS register file declares itself with id="BDS"; everything
        // else uses the category number.
        let id = if id.trim().eq_ignore_ascii_case("BDS") {
            dasterix_core::BDS_CATEGORY
        } else {
            id.trim().parse::<u16>().ok().filter(|&n| n <= 255).ok_or_else(|| {
                self.error_at(pos, format!("Category id {id} is not a number in 0..=255"))
            })?
        };
        let name = self.attr(e, "name", pos)?.unwrap_or_default();
        let version = self.attr(e, "ver", pos)?.unwrap_or_default();
        self.category = Some(Category::new(id, name, version));
        Ok(())
    }

    fn data_item_start(&mut self, e: &BytesStart<'_>, pos: usize) -> Result<(), AsterixError> {
        if self.category.is_none() {
            return Err(self.error_at(pos, "DataItem outside of Category"));
        }
        if self.item.is_some() {
            return Err(self.error_at(pos, "nested DataItem element"));
        }
        let id = self.required_attr(e, "DataItem", "id", pos)?;
        let rule = self
            .attr(e, "rule", pos)?
            .map(|r| Rule::parse(r.trim()))
            .unwrap_or_default();
        self.item = Some(ItemBuilder {
            id: id.trim().to_string(),
            rule,
            ..ItemBuilder::default()
        });
        Ok(())
    }

    fn string_sink(
        &mut self,
        sink: CharSink,
        element: &str,
        pos: usize,
    ) -> Result<(), AsterixError> {
        if self.item.is_none() {
            return Err(self.error_at(pos, format!("{element} outside of DataItem")));
        }
        self.sink = sink;
        Ok(())
    }

    fn bits_sink(&mut self, sink: CharSink, element: &str, pos: usize) -> Result<(), AsterixError> {
        if self.bits.is_none() {
            return Err(self.error_at(pos, format!("{element} outside of Bits")));
        }
        self.sink = sink;
        Ok(())
    }

    fn format_wrapper_start(&mut self, pos: usize) -> Result<(), AsterixError> {
        if self.item.is_none() {
            return Err(self.error_at(pos, "DataItemFormat outside of DataItem"));
        }
        if !self.formats.is_empty() {
            return Err(self.error_at(pos, "nested DataItemFormat element"));
        }
        self.formats.push(FormatBuilder::Wrapper(None));
        Ok(())
    }

    /// Nesting-rule check shared by all format elements: the element is
    /// legal only under the listed parents.
    fn check_parent(
        &self,
        element: &str,
        allowed: &[&str],
        pos: usize,
    ) -> Result<(), AsterixError> {
        let parent = self.formats.last().map(|f| f.kind()).unwrap_or("DataItem");
        if !allowed.contains(&parent) {
            return Err(self.error_at(
                pos,
                format!("{element} not allowed inside {parent}"),
            ));
        }
        Ok(())
    }

    fn fixed_start(&mut self, e: &BytesStart<'_>, pos: usize) -> Result<(), AsterixError> {
        self.check_parent(
            "Fixed",
            &["DataItemFormat", "Variable", "Compound", "Repetitive", "Explicit"],
            pos,
        )?;
        let length = self.int_attr(e, "Fixed", "length", pos)?.ok_or_else(|| {
            self.error_at(pos, "Fixed is missing required attribute length")
        })?;
        if length <= 0 {
            return Err(self.error_at(pos, format!("Fixed length {length} must be positive")));
        }
        self.formats.push(FormatBuilder::Fixed(FixedFormat::new(length as usize)));
        Ok(())
    }

    fn variable_start(&mut self, pos: usize) -> Result<(), AsterixError> {
        self.check_parent("Variable", &["DataItemFormat", "Compound", "Explicit"], pos)?;
        // Inside Compound a Variable may only open the primary subfield.
        if let Some(FormatBuilder::Compound(children)) = self.formats.last() {
            if !children.is_empty() {
                return Err(self.error_at(
                    pos,
                    "Variable allowed in Compound only as the primary subfield",
                ));
            }
        }
        self.formats.push(FormatBuilder::Variable(VariableFormat::default()));
        Ok(())
    }

    fn compound_start(&mut self, pos: usize) -> Result<(), AsterixError> {
        self.check_parent("Compound", &["DataItemFormat", "Compound", "Explicit"], pos)?;
        // A Compound cannot be another Compound's primary subfield.
        if let Some(FormatBuilder::Compound(children)) = self.formats.last() {
            if children.is_empty() {
                return Err(self.error_at(
                    pos,
                    "Compound cannot be the primary subfield of a Compound",
                ));
            }
        }
        self.formats.push(FormatBuilder::Compound(Vec::new()));
        Ok(())
    }

    fn repetitive_start(&mut self, pos: usize) -> Result<(), AsterixError> {
        self.check_parent("Repetitive", &["DataItemFormat", "Compound", "Explicit"], pos)?;
        if let Some(FormatBuilder::Compound(children)) = self.formats.last() {
            if children.is_empty() {
                return Err(self.error_at(
                    pos,
                    "Repetitive cannot be the primary subfield of a Compound",
                ));
            }
        }
        self.formats.push(FormatBuilder::Repetitive(RepetitiveFormat::default()));
        Ok(())
    }

    fn explicit_start(&mut self, pos: usize) -> Result<(), AsterixError> {
        self.check_parent("Explicit", &["DataItemFormat", "Compound"], pos)?;
        if let Some(FormatBuilder::Compound(children)) = self.formats.last() {
            if children.is_empty() {
                return Err(self.error_at(
                    pos,
                    "Explicit cannot be the primary subfield of a Compound",
                ));
            }
        }
        self.formats.push(FormatBuilder::Explicit(ExplicitFormat::default()));
        Ok(())
    }

    fn bds_start(&mut self, pos: usize) -> Result<(), AsterixError> {
        self.check_parent("BDS", &["DataItemFormat", "Repetitive"], pos)?;
        self.formats.push(FormatBuilder::Bds);
        Ok(())
    }

    fn bits_start(&mut self, e: &BytesStart<'_>, pos: usize) -> Result<(), AsterixError> {
        if !matches!(self.formats.last(), Some(FormatBuilder::Fixed(_))) {
            return Err(self.error_at(pos, "Bits outside of Fixed"));
        }
        if self.bits.is_some() {
            return Err(self.error_at(pos, "nested Bits element"));
        }

        let (from, to) = if let Some(bit) = self.int_attr(e, "Bits", "bit", pos)? {
            (bit, bit)
        } else {
            let from = self.int_attr(e, "Bits", "from", pos)?;
            let to = self.int_attr(e, "Bits", "to", pos)?;
            match (from, to) {
                (Some(from), Some(to)) => (from, to),
                _ => {
                    return Err(
                        self.error_at(pos, "Bits needs either bit or both from and to")
                    );
                }
            }
        };
        // Some grammar files swap the range ends; normalize to from >= to.
        let (from, to) = if from >= to { (from, to) } else { (to, from) };
        if to <= 0 {
            return Err(self.error_at(pos, format!("Bits range {from}..{to} must be positive")));
        }

        let mut bits = Bits::new(from as usize, to as usize);
        if let Some(encode) = self.attr(e, "encode", pos)? {
            bits.encoding = Encoding::parse(encode.trim()).ok_or_else(|| {
                self.error_at(pos, format!("unknown Bits encoding {encode}"))
            })?;
        }
        if let Some(fx) = self.int_attr(e, "Bits", "fx", pos)? {
            bits.fx = fx == 1;
        }
        self.bits = Some(bits);
        Ok(())
    }

    fn bits_value_start(&mut self, e: &BytesStart<'_>, pos: usize) -> Result<(), AsterixError> {
        if self.bits.is_none() {
            return Err(self.error_at(pos, "BitsValue outside of Bits"));
        }
        let value = self.int_attr(e, "BitsValue", "val", pos)?.ok_or_else(|| {
            self.error_at(pos, "BitsValue is missing required attribute val")
        })?;
        self.bits_value = Some(value);
        self.bits_value_meaning.clear();
        self.sink = CharSink::BitsValueMeaning;
        Ok(())
    }

    fn bits_unit_start(&mut self, e: &BytesStart<'_>, pos: usize) -> Result<(), AsterixError> {
        let scale = self.float_attr(e, "BitsUnit", "scale", pos)?;
        let min = self.float_attr(e, "BitsUnit", "min", pos)?;
        let max = self.float_attr(e, "BitsUnit", "max", pos)?;
        let Some(bits) = self.bits.as_mut() else {
            return Err(self.error_at(pos, "BitsUnit outside of Bits"));
        };
        bits.scale = scale.or(Some(1.0));
        bits.min = min;
        bits.max = max;
        self.sink = CharSink::BitsUnit;
        Ok(())
    }

    fn float_attr(
        &self,
        e: &BytesStart<'_>,
        element: &str,
        name: &str,
        pos: usize,
    ) -> Result<Option<f64>, AsterixError> {
        match self.attr(e, name, pos)? {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|_| {
                self.error_at(pos, format!("{element} attribute {name} is not a number: {raw}"))
            }),
        }
    }

    fn uap_start(&mut self, e: &BytesStart<'_>, pos: usize) -> Result<(), AsterixError> {
        let Some(category) = self.category.as_ref() else {
            return Err(self.error_at(pos, "UAP outside of Category"));
        };
        if self.uap.is_some() {
            return Err(self.error_at(pos, "nested UAP element"));
        }

        let bit_set = self.int_attr(e, "UAP", "use_if_bit_set", pos)?;
        let byte_nr = self.int_attr(e, "UAP", "use_if_byte_nr", pos)?;
        let is_set_to = self.int_attr(e, "UAP", "is_set_to", pos)?;

        let selector = match (bit_set, byte_nr) {
            (Some(bit), None) => UapSelector::BitSet(bit as u32),
            (None, Some(byte)) => {
                let value = is_set_to.ok_or_else(|| {
                    self.error_at(pos, "UAP with use_if_byte_nr needs is_set_to")
                })?;
                UapSelector::ByteEquals {
                    byte_nr: byte as u32,
                    value: value as u8,
                }
            }
            (None, None) => UapSelector::Unconditional,
            (Some(_), Some(_)) => {
                return Err(
                    self.error_at(pos, "UAP cannot combine use_if_bit_set and use_if_byte_nr")
                );
            }
        };

        if selector == UapSelector::Unconditional
            && category
                .uaps
                .iter()
                .any(|u| u.selector == UapSelector::Unconditional)
        {
            return Err(self.error_at(pos, "more than one unconditional UAP"));
        }

        self.uap = Some(Uap::new(selector));
        Ok(())
    }

    fn uap_item_start(&mut self, e: &BytesStart<'_>, pos: usize) -> Result<(), AsterixError> {
        if self.uap.is_none() {
            return Err(self.error_at(pos, "UAPItem outside of UAP"));
        }
        let bit = self.int_attr(e, "UAPItem", "bit", pos)?.ok_or_else(|| {
            self.error_at(pos, "UAPItem is missing required attribute bit")
        })?;
        let frn = self.required_attr(e, "UAPItem", "frn", pos)?;
        let length_hint = self
            .attr(e, "len", pos)?
            .and_then(|l| l.trim().parse::<u8>().ok());

        self.uap_item = Some(UapItemBuilder {
            bit: bit as u32,
            frn: frn.trim().to_string(),
            length_hint,
            text: String::new(),
        });
        self.sink = CharSink::UapItem;
        Ok(())
    }

    // --- character data --------------------------------------------------

    fn character_data(&mut self, text: &str) {
        match self.sink {
            CharSink::None => {}
            CharSink::ItemName => append(self.item.as_mut().map(|i| &mut i.name), text),
            CharSink::ItemDefinition => {
                append(self.item.as_mut().map(|i| &mut i.definition), text)
            }
            CharSink::ItemNote => append(self.item.as_mut().map(|i| &mut i.note), text),
            CharSink::BitsShortName => {
                append(self.bits.as_mut().map(|b| &mut b.short_name), text)
            }
            CharSink::BitsName => append(self.bits.as_mut().map(|b| &mut b.name), text),
            CharSink::BitsValueMeaning => self.bits_value_meaning.push_str(text),
            CharSink::BitsUnit => append(self.bits.as_mut().map(|b| &mut b.unit), text),
            CharSink::BitsConst => {
                if let (Some(bits), Ok(value)) = (self.bits.as_mut(), text.trim().parse::<i64>())
                {
                    bits.expected = Some(value);
                }
            }
            CharSink::UapItem => append(self.uap_item.as_mut().map(|u| &mut u.text), text),
        }
    }

    // --- element end -----------------------------------------------------

    fn element_end(&mut self, name: &[u8], pos: usize) -> Result<(), AsterixError> {
        self.sink = CharSink::None;
        match name {
            b"Category" => Ok(()),
            b"DataItem" => self.data_item_end(pos),
            b"DataItemFormat" => Ok(()),
            b"Fixed" | b"Variable" | b"Compound" | b"Repetitive" | b"Explicit" | b"BDS" => {
                self.format_end(pos)
            }
            b"Bits" => self.bits_end(pos),
            b"BitsValue" => self.bits_value_end(pos),
            b"UAP" => self.uap_end(pos),
            b"UAPItem" => self.uap_item_end(pos),
            _ => Ok(()),
        }
    }

    fn data_item_end(&mut self, pos: usize) -> Result<(), AsterixError> {
        let Some(item) = self.item.take() else {
            return Err(self.error_at(pos, "stray DataItem end tag"));
        };
        // The wrapper stays on the stack until the item closes; pop it
        // here and take the finished root out of it.
        let format = match self.formats.pop() {
            Some(FormatBuilder::Wrapper(Some(format))) => format,
            Some(FormatBuilder::Wrapper(None)) | None => {
                return Err(self.error_at(
                    pos,
                    format!("DataItem {} has no format definition", item.id),
                ));
            }
            Some(other) => {
                return Err(self.error_at(
                    pos,
                    format!("unclosed {} element in DataItem {}", other.kind(), item.id),
                ));
            }
        };

        match self.category.as_mut() {
            None => Err(self.error_at(pos, "DataItem outside of Category")),
            Some(category) => {
                let id = if category.id == dasterix_core::BDS_CATEGORY {
                    normalize_register_id(&item.id)
                } else {
                    item.id
                };
                category.items.push(DataItemDescription {
                    id,
                    name: collapse(&item.name),
                    definition: collapse(&item.definition),
                    note: collapse(&item.note),
                    rule: item.rule,
                    format,
                });
                Ok(())
            }
        }
    }

    fn format_end(&mut self, pos: usize) -> Result<(), AsterixError> {
        let Some(builder) = self.formats.pop() else {
            return Err(self.error_at(pos, "stray format end tag"));
        };

        let format = match builder {
            FormatBuilder::Wrapper(_) => {
                return Err(self.error_at(pos, "mismatched DataItemFormat end tag"));
            }
            FormatBuilder::Fixed(fixed) => {
                if fixed.bits.is_empty() {
                    return Err(self.error_at(pos, "Fixed element without Bits"));
                }
                DataItemFormat::Fixed(fixed)
            }
            FormatBuilder::Variable(var) => {
                if var.parts.is_empty() {
                    return Err(self.error_at(pos, "Variable element without Fixed parts"));
                }
                DataItemFormat::Variable(var)
            }
            FormatBuilder::Compound(mut children) => {
                if children.is_empty() {
                    return Err(self.error_at(pos, "Compound element without subfields"));
                }
                let primary = match children.remove(0) {
                    DataItemFormat::Variable(var) => var,
                    other => {
                        return Err(self.error_at(
                            pos,
                            format!(
                                "Compound primary subfield must be Variable, found {}",
                                other.kind()
                            ),
                        ));
                    }
                };
                DataItemFormat::Compound(CompoundFormat {
                    primary,
                    parts: children,
                })
            }
            FormatBuilder::Repetitive(rep) => {
                if rep.parts.is_empty() {
                    return Err(self.error_at(pos, "Repetitive element without sub-parts"));
                }
                DataItemFormat::Repetitive(rep)
            }
            FormatBuilder::Explicit(exp) => DataItemFormat::Explicit(exp),
            FormatBuilder::Bds => DataItemFormat::Bds(dasterix_core::schema::BdsFormat),
        };

        match self.formats.last_mut() {
            Some(FormatBuilder::Wrapper(root)) => {
                if root.is_some() {
                    return Err(
                        self.error_at(pos, "DataItemFormat holds more than one root format")
                    );
                }
                *root = Some(format);
            }
            Some(FormatBuilder::Variable(var)) => match format {
                DataItemFormat::Fixed(fixed) => var.parts.push(fixed),
                other => {
                    return Err(self.error_at(
                        pos,
                        format!("{} not allowed inside Variable", other.kind()),
                    ));
                }
            },
            Some(FormatBuilder::Compound(children)) => children.push(format),
            Some(FormatBuilder::Repetitive(rep)) => rep.parts.push(format),
            Some(FormatBuilder::Explicit(exp)) => {
                if exp.inner.is_some() {
                    return Err(self.error_at(pos, "Explicit holds more than one inner format"));
                }
                exp.inner = Some(Box::new(format));
            }
            Some(FormatBuilder::Fixed(_)) | Some(FormatBuilder::Bds) | None => {
                return Err(self.error_at(
                    pos,
                    format!("{} closed outside of a format context", format.kind()),
                ));
            }
        }
        Ok(())
    }

    fn bits_end(&mut self, pos: usize) -> Result<(), AsterixError> {
        let Some(mut bits) = self.bits.take() else {
            return Err(self.error_at(pos, "stray Bits end tag"));
        };
        bits.short_name = collapse(&bits.short_name);
        bits.name = collapse(&bits.name);
        bits.unit = collapse(&bits.unit);

        match self.formats.last_mut() {
            Some(FormatBuilder::Fixed(fixed)) => {
                if bits.from > fixed.length * 8 {
                    let message = format!(
                        "Bits {} from={} exceeds the {}-octet Fixed part",
                        bits.short_name, bits.from, fixed.length
                    );
                    return Err(self.error_at(pos, message));
                }
                fixed.bits.push(bits);
                Ok(())
            }
            _ => Err(self.error_at(pos, "Bits outside of Fixed")),
        }
    }

    fn bits_value_end(&mut self, pos: usize) -> Result<(), AsterixError> {
        let Some(value) = self.bits_value.take() else {
            return Err(self.error_at(pos, "stray BitsValue end tag"));
        };
        let meaning = collapse(&self.bits_value_meaning);
        self.bits_value_meaning.clear();
        match self.bits.as_mut() {
            Some(bits) => {
                bits.values.push(BitsValue { value, meaning });
                Ok(())
            }
            None => Err(self.error_at(pos, "BitsValue outside of Bits")),
        }
    }

    fn uap_end(&mut self, pos: usize) -> Result<(), AsterixError> {
        let Some(uap) = self.uap.take() else {
            return Err(self.error_at(pos, "stray UAP end tag"));
        };
        match self.category.as_mut() {
            Some(category) => {
                category.uaps.push(uap);
                Ok(())
            }
            None => Err(self.error_at(pos, "UAP outside of Category")),
        }
    }

    fn uap_item_end(&mut self, pos: usize) -> Result<(), AsterixError> {
        let Some(entry) = self.uap_item.take() else {
            return Err(self.error_at(pos, "stray UAPItem end tag"));
        };
        let text = entry.text.trim();

        let slot = if entry.frn.eq_ignore_ascii_case("FX") || text.eq_ignore_ascii_case("FX") {
            UapSlot::Fx
        } else if text.is_empty() || text == "-" {
            UapSlot::Spare
        } else {
            UapSlot::Item(text.to_string())
        };

        match self.uap.as_mut() {
            Some(uap) => {
                uap.entries.push(UapEntry {
                    bit: entry.bit,
                    slot,
                    length_hint: entry.length_hint,
                });
                Ok(())
            }
            None => Err(self.error_at(pos, "UAPItem outside of UAP")),
        }
    }

    fn finish(mut self, end: usize) -> Result<Category, AsterixError> {
        if self.item.is_some() || !self.formats.is_empty() || self.uap.is_some() {
            return Err(self.error_at(end, "unexpected end of file inside an open element"));
        }
        self.category
            .take()
            .ok_or_else(|| self.error_at(end, "no Category element found"))
    }
}

fn append(target: Option<&mut String>, text: &str) {
    if let Some(target) = target {
        // Chunked delivery: always append, never assign.
        target.push_str(text);
    }
}

/// Collapses internal whitespace runs left over from XML pretty-printing.
fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical form of a BDS register id: an upper-case hex pair. The
/// grammar files are inconsistent between hex ("60") and decimal ("230")
/// spellings; two-character ids are read as hex, longer ones as decimal.
fn normalize_register_id(id: &str) -> String {
    let id = id.trim();
    if id.len() <= 2 && id.chars().all(|c| c.is_ascii_hexdigit()) {
        format!("{:0>2}", id.to_ascii_uppercase())
    } else if let Ok(value) = id.parse::<u8>() {
        format!("{value:02X}")
    } else {
        id.to_ascii_uppercase()
    }
}
