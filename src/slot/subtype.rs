//! Device subtype: screen-height refinements of the phone idiom. The
//! packed value is the point height itself.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceSubtype {
    #[default]
    None,
    /// 4" retina displays (568pt).
    Height568,
    /// 4.7" displays (667pt).
    Height667,
    /// 5.5" displays (736pt).
    Height736,
}

impl DeviceSubtype {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "retina4" => Some(DeviceSubtype::Height568),
            "667h" => Some(DeviceSubtype::Height667),
            "736h" => Some(DeviceSubtype::Height736),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceSubtype::None => "",
            DeviceSubtype::Height568 => "retina4",
            DeviceSubtype::Height667 => "667h",
            DeviceSubtype::Height736 => "736h",
        }
    }

    pub fn code(self) -> u16 {
        match self {
            DeviceSubtype::None => 0,
            DeviceSubtype::Height568 => 568,
            DeviceSubtype::Height667 => 667,
            DeviceSubtype::Height736 => 736,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(DeviceSubtype::None),
            568 => Some(DeviceSubtype::Height568),
            667 => Some(DeviceSubtype::Height667),
            736 => Some(DeviceSubtype::Height736),
            _ => None,
        }
    }
}
