//! Rendition attribute identifiers and attribute lists.
//!
//! Attribute identifiers are a closed 16-bit vocabulary; the numeric codes
//! are part of the on-disk format and never change. An [`AttributeList`] is
//! a small sorted set of `(identifier, value)` pairs.

use crate::error::{CarError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum AttributeId {
    Element = 1,
    Part = 2,
    Size = 3,
    Direction = 4,
    Value = 6,
    Dimension1 = 7,
    Dimension2 = 8,
    State = 9,
    Layer = 10,
    Scale = 11,
    PresentationState = 14,
    Idiom = 15,
    Subtype = 16,
    Identifier = 17,
    PreviousValue = 18,
    PreviousState = 19,
    SizeClassHorizontal = 20,
    SizeClassVertical = 21,
    MemoryClass = 22,
    GraphicsClass = 23,
    DisplayGamut = 24,
    DeploymentTarget = 25,
    Appearance = 26,
}

impl AttributeId {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_u16(value: u16) -> Option<Self> {
        use AttributeId::*;
        match value {
            1 => Some(Element),
            2 => Some(Part),
            3 => Some(Size),
            4 => Some(Direction),
            6 => Some(Value),
            7 => Some(Dimension1),
            8 => Some(Dimension2),
            9 => Some(State),
            10 => Some(Layer),
            11 => Some(Scale),
            14 => Some(PresentationState),
            15 => Some(Idiom),
            16 => Some(Subtype),
            17 => Some(Identifier),
            18 => Some(PreviousValue),
            19 => Some(PreviousState),
            20 => Some(SizeClassHorizontal),
            21 => Some(SizeClassVertical),
            22 => Some(MemoryClass),
            23 => Some(GraphicsClass),
            24 => Some(DisplayGamut),
            25 => Some(DeploymentTarget),
            26 => Some(Appearance),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        use AttributeId::*;
        match self {
            Element => "element",
            Part => "part",
            Size => "size",
            Direction => "direction",
            Value => "value",
            Dimension1 => "dimension1",
            Dimension2 => "dimension2",
            State => "state",
            Layer => "layer",
            Scale => "scale",
            PresentationState => "presentation-state",
            Idiom => "idiom",
            Subtype => "subtype",
            Identifier => "identifier",
            PreviousValue => "previous-value",
            PreviousState => "previous-state",
            SizeClassHorizontal => "size-class-horizontal",
            SizeClassVertical => "size-class-vertical",
            MemoryClass => "memory-class",
            GraphicsClass => "graphics-class",
            DisplayGamut => "display-gamut",
            DeploymentTarget => "deployment-target",
            Appearance => "appearance",
        }
    }
}

/// A sorted set of attribute pairs. Insertion keeps identifier order so
/// serialization is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeList {
    pairs: Vec<(AttributeId, u16)>,
}

impl AttributeList {
    pub fn new() -> Self {
        AttributeList::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (AttributeId, u16)>) -> Self {
        let mut list = AttributeList::new();
        for (id, value) in pairs {
            list.set(id, value);
        }
        list
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, id: AttributeId) -> Option<u16> {
        self.pairs
            .binary_search_by_key(&id, |&(i, _)| i)
            .ok()
            .map(|at| self.pairs[at].1)
    }

    pub fn set(&mut self, id: AttributeId, value: u16) {
        match self.pairs.binary_search_by_key(&id, |&(i, _)| i) {
            Ok(at) => self.pairs[at].1 = value,
            Err(at) => self.pairs.insert(at, (id, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributeId, u16)> + '_ {
        self.pairs.iter().copied()
    }

    /// Serialize as `(u16 identifier, u16 value)` little-endian pairs in
    /// identifier order.
    pub fn write_to(&self, buffer: &mut Vec<u8>) {
        for &(id, value) in &self.pairs {
            buffer.extend_from_slice(&id.code().to_le_bytes());
            buffer.extend_from_slice(&value.to_le_bytes());
        }
    }

    pub fn parse(bytes: &[u8], count: usize) -> Result<Self> {
        if bytes.len() < count * 4 {
            return Err(CarError::Corrupt(format!(
                "attribute list declares {count} pairs but holds {} bytes",
                bytes.len()
            )));
        }
        let mut list = AttributeList::new();
        for i in 0..count {
            let at = i * 4;
            let code = u16::from_le_bytes(bytes[at..at + 2].try_into().unwrap());
            let value = u16::from_le_bytes(bytes[at + 2..at + 4].try_into().unwrap());
            let id = AttributeId::from_u16(code)
                .ok_or_else(|| CarError::Corrupt(format!("unknown attribute code {code}")))?;
            list.set(id, value);
        }
        Ok(list)
    }
}
