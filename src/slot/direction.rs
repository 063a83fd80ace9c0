//! Layout direction axis.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Any,
    LeftToRight,
    RightToLeft,
}

impl Direction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left-to-right" => Some(Direction::LeftToRight),
            "right-to-left" => Some(Direction::RightToLeft),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Any => "",
            Direction::LeftToRight => "left-to-right",
            Direction::RightToLeft => "right-to-left",
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Direction::Any => 0,
            Direction::LeftToRight => 1,
            Direction::RightToLeft => 2,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Direction::Any),
            1 => Some(Direction::LeftToRight),
            2 => Some(Direction::RightToLeft),
            _ => None,
        }
    }
}
