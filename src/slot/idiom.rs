//! Target device idiom.

/// The device family an asset variant targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Idiom {
    #[default]
    Universal,
    Phone,
    Pad,
    Desktop,
    Tv,
    Watch,
    Car,
    Marketing,
}

impl Idiom {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "universal" => Some(Idiom::Universal),
            "phone" => Some(Idiom::Phone),
            "pad" => Some(Idiom::Pad),
            "mac" => Some(Idiom::Desktop),
            "tv" => Some(Idiom::Tv),
            "watch" => Some(Idiom::Watch),
            "car" => Some(Idiom::Car),
            "marketing" => Some(Idiom::Marketing),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Idiom::Universal => "universal",
            Idiom::Phone => "phone",
            Idiom::Pad => "pad",
            Idiom::Desktop => "mac",
            Idiom::Tv => "tv",
            Idiom::Watch => "watch",
            Idiom::Car => "car",
            Idiom::Marketing => "marketing",
        }
    }

    /// The packed attribute value. Desktop has no code of its own and
    /// packs as universal.
    pub fn code(self) -> u16 {
        match self {
            Idiom::Universal | Idiom::Desktop => 0,
            Idiom::Phone => 1,
            Idiom::Pad => 2,
            Idiom::Tv => 3,
            Idiom::Car => 4,
            Idiom::Watch => 5,
            Idiom::Marketing => 6,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Idiom::Universal),
            1 => Some(Idiom::Phone),
            2 => Some(Idiom::Pad),
            3 => Some(Idiom::Tv),
            4 => Some(Idiom::Car),
            5 => Some(Idiom::Watch),
            6 => Some(Idiom::Marketing),
            _ => None,
        }
    }
}
