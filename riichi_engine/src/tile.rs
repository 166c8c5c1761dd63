use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Man,
    Pin,
    Sou,
    Honor,
}

impl Suit {
    pub const NUMERALS: [Suit; 3] = [Suit::Man, Suit::Pin, Suit::Sou];

    fn marker(self) -> char {
        match self {
            Suit::Man => 'm',
            Suit::Pin => 'p',
            Suit::Sou => 's',
            Suit::Honor => 'z',
        }
    }
}

/// 宣言順がそのまま並び順（東南西北白發中）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Honor {
    East,
    South,
    West,
    North,
    White,
    Green,
    Red,
}

impl Honor {
    pub const ALL: [Honor; 7] = [
        Honor::East,
        Honor::South,
        Honor::West,
        Honor::North,
        Honor::White,
        Honor::Green,
        Honor::Red,
    ];
    pub const WINDS: [Honor; 4] = [Honor::East, Honor::South, Honor::West, Honor::North];
    pub const DRAGONS: [Honor; 3] = [Honor::White, Honor::Green, Honor::Red];

    pub fn is_wind(self) -> bool {
        matches!(self, Honor::East | Honor::South | Honor::West | Honor::North)
    }

    pub fn is_dragon(self) -> bool {
        !self.is_wind()
    }

    fn code(self) -> &'static str {
        match self {
            Honor::East => "E",
            Honor::South => "S",
            Honor::West => "W",
            Honor::North => "N",
            Honor::White => "P",
            Honor::Green => "F",
            Honor::Red => "C",
        }
    }
}

/// One of the 34 tile kinds. Ordered by (suit, rank, honor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tile {
    suit: Suit,
    num: u8,
    honor: Option<Honor>,
}

impl Tile {
    pub const KINDS: usize = 34;
    pub const COPIES: usize = 4;

    pub fn from_code(code: &str) -> Result<Self, String> {
        match code {
            "E" => return Ok(Self::honor(Honor::East)),
            "S" => return Ok(Self::honor(Honor::South)),
            "W" => return Ok(Self::honor(Honor::West)),
            "N" => return Ok(Self::honor(Honor::North)),
            "P" => return Ok(Self::honor(Honor::White)),
            "F" => return Ok(Self::honor(Honor::Green)),
            "C" => return Ok(Self::honor(Honor::Red)),
            _ => {}
        }

        let bytes = code.as_bytes();
        if bytes.len() != 2 {
            return Err(format!("invalid tile code: {}", code));
        }

        let n = (bytes[0] as char)
            .to_digit(10)
            .ok_or_else(|| format!("invalid number: {}", code))? as u8;

        let suit = match bytes[1] as char {
            'm' => Suit::Man,
            'p' => Suit::Pin,
            's' => Suit::Sou,
            _ => return Err(format!("invalid suit: {}", code)),
        };

        Self::numeral(suit, n).ok_or_else(|| format!("invalid number: {}", code))
    }

    /// `None` for honors or ranks outside 1..=9.
    pub fn numeral(suit: Suit, num: u8) -> Option<Self> {
        if suit == Suit::Honor || !(1..=9).contains(&num) {
            return None;
        }
        Some(Tile {
            suit,
            num,
            honor: None,
        })
    }

    pub fn honor(h: Honor) -> Self {
        Tile {
            suit: Suit::Honor,
            num: 0,
            honor: Some(h),
        }
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    /// Rank 1..=9 for numerals, 0 for honors.
    pub fn num(&self) -> u8 {
        self.num
    }

    pub fn honor_kind(&self) -> Option<Honor> {
        self.honor
    }

    pub fn is_honor(&self) -> bool {
        self.suit == Suit::Honor
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_honor() && (self.num == 1 || self.num == 9)
    }

    /// 么九牌（老頭牌 + 字牌）
    pub fn is_terminal_or_honor(&self) -> bool {
        self.is_honor() || self.is_terminal()
    }

    pub fn is_simple(&self) -> bool {
        !self.is_terminal_or_honor()
    }

    pub fn is_dragon(&self) -> bool {
        self.honor.map(Honor::is_dragon).unwrap_or(false)
    }

    pub fn is_wind(&self) -> bool {
        self.honor.map(Honor::is_wind).unwrap_or(false)
    }

    /// Dense index 0..34 (man, pin, sou, then honors).
    pub fn index(&self) -> usize {
        match self.honor {
            Some(h) => 27 + h as usize,
            None => (self.suit as usize) * 9 + (self.num as usize - 1),
        }
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0..=26 => Self::numeral(Suit::NUMERALS[idx / 9], (idx % 9) as u8 + 1),
            27..=33 => Some(Self::honor(Honor::ALL[idx - 27])),
            _ => None,
        }
    }

    /// All 34 kinds in order.
    pub fn all() -> impl Iterator<Item = Tile> {
        (0..Self::KINDS).filter_map(Self::from_index)
    }

    /// Same-suit numeral one rank up (no wrap).
    pub fn next(&self) -> Option<Self> {
        if self.is_honor() || self.num >= 9 {
            None
        } else {
            Self::numeral(self.suit, self.num + 1)
        }
    }

    pub fn next2(&self) -> Option<Self> {
        if self.is_honor() || self.num >= 8 {
            None
        } else {
            Self::numeral(self.suit, self.num + 2)
        }
    }

    /// Same-suit numeral one rank down (no wrap).
    pub fn prev(&self) -> Option<Self> {
        if self.is_honor() || self.num <= 1 {
            None
        } else {
            Self::numeral(self.suit, self.num - 1)
        }
    }

    /// Dora successor: 9 wraps to 1, honors follow one cycle E S W N P F C.
    pub fn dora_successor(&self) -> Self {
        match self.honor {
            Some(h) => {
                let i = Honor::ALL.iter().position(|&x| x == h).unwrap_or(0);
                Tile::honor(Honor::ALL[(i + 1) % Honor::ALL.len()])
            }
            None => Tile {
                suit: self.suit,
                num: if self.num == 9 { 1 } else { self.num + 1 },
                honor: None,
            },
        }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.honor {
            Some(h) => f.write_str(h.code()),
            None => write!(f, "{}{}", self.num, self.suit.marker()),
        }
    }
}

impl FromStr for Tile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tile::from_code(s)
    }
}

impl TryFrom<String> for Tile {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Tile::from_code(&s)
    }
}

impl From<Tile> for String {
    fn from(t: Tile) -> Self {
        t.to_string()
    }
}

/// Parses a whitespace separated list such as `"1m 2m 3m E E"`.
pub fn parse_tiles(s: &str) -> Result<Vec<Tile>, String> {
    s.split_whitespace().map(Tile::from_code).collect()
}

/// Per-kind counts indexed by [`Tile::index`].
pub fn count_kinds(tiles: &[Tile]) -> [u8; Tile::KINDS] {
    let mut counts = [0u8; Tile::KINDS];
    for t in tiles {
        counts[t.index()] += 1;
    }
    counts
}

pub fn sort_tiles(v: &mut [Tile]) {
    v.sort();
}
