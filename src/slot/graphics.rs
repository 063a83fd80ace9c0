//! Graphics feature class.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraphicsClass {
    #[default]
    Any,
    Metal1v2,
    Metal2v2,
    Metal3v1,
    Metal4v1,
}

impl GraphicsClass {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "metal1v2" => Some(GraphicsClass::Metal1v2),
            "metal2v2" => Some(GraphicsClass::Metal2v2),
            "metal3v1" => Some(GraphicsClass::Metal3v1),
            "metal4v1" => Some(GraphicsClass::Metal4v1),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GraphicsClass::Any => "",
            GraphicsClass::Metal1v2 => "metal1v2",
            GraphicsClass::Metal2v2 => "metal2v2",
            GraphicsClass::Metal3v1 => "metal3v1",
            GraphicsClass::Metal4v1 => "metal4v1",
        }
    }

    pub fn code(self) -> u16 {
        match self {
            GraphicsClass::Any => 0,
            GraphicsClass::Metal1v2 => 1,
            GraphicsClass::Metal2v2 => 2,
            GraphicsClass::Metal3v1 => 3,
            GraphicsClass::Metal4v1 => 4,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(GraphicsClass::Any),
            1 => Some(GraphicsClass::Metal1v2),
            2 => Some(GraphicsClass::Metal2v2),
            3 => Some(GraphicsClass::Metal3v1),
            4 => Some(GraphicsClass::Metal4v1),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        assert_eq!(GraphicsClass::parse("metal3v1"), Some(GraphicsClass::Metal3v1));
        assert_eq!(GraphicsClass::from_code(1), Some(GraphicsClass::Metal1v2));
        assert_eq!(GraphicsClass::parse("opengl"), None);
        assert_eq!(GraphicsClass::from_code(7), None);
    }
}
