//! 4人打ちリーチ麻雀のルールエンジン。
//!
//! 牌山・河・手牌の状態管理と、和了形・役・役満の判定を行う。
//! All mutations of one match go through [`Match`]; the evaluators are pure.

use serde::{Deserialize, Serialize};

pub mod config;
pub mod decompose;
pub mod dora;
pub mod error;
pub mod game;
pub mod hand;
pub mod river;
pub mod score;
pub mod tile;
pub mod wall;
pub mod yaku;
pub mod yakuman;

pub use config::{FanValue, RuleConfig};
pub use error::{EngineError, EngineResult, Resource};
pub use game::Match;
pub use hand::{CalledMeld, DrawSource, DrawnTile, MeldCandidate, MeldKind, PlayerHand};
pub use river::{ClaimKind, DiscardEntry, DiscardRiver};
pub use score::{Category, ScoreAggregator, ScoreOutcome};
pub use tile::{Honor, Suit, Tile};
pub use wall::{TileWall, WallSlot};
pub use yaku::{Yaku, YakuResult};
pub use yakuman::Yakuman;

/// 席ID（0～3）
pub type Seat = usize;

pub const PLAYER_MAX: usize = 4;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Wind {
    E,
    S,
    W,
    N,
}

impl Wind {
    pub const ALL: [Wind; 4] = [Wind::E, Wind::S, Wind::W, Wind::N];

    pub fn to_honor(self) -> Honor {
        match self {
            Wind::E => Honor::East,
            Wind::S => Honor::South,
            Wind::W => Honor::West,
            Wind::N => Honor::North,
        }
    }

    pub fn tile(self) -> Tile {
        Tile::honor(self.to_honor())
    }

    /// 自風：親が東、そこから反時計回りに南西北
    pub fn for_seat(seat: Seat, dealer: Seat) -> Wind {
        Wind::ALL[(seat + PLAYER_MAX - dealer % PLAYER_MAX) % PLAYER_MAX]
    }
}

/// 和了時の状況
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct WinContext {
    pub is_self_draw: bool,
    pub is_discard_win: bool,
    /// 嶺上牌での和了
    pub is_post_kan_draw: bool,
    pub round_wind: Wind,
}

impl WinContext {
    pub fn tsumo(round_wind: Wind) -> Self {
        WinContext {
            is_self_draw: true,
            is_discard_win: false,
            is_post_kan_draw: false,
            round_wind,
        }
    }

    pub fn ron(round_wind: Wind) -> Self {
        WinContext {
            is_self_draw: false,
            is_discard_win: true,
            is_post_kan_draw: false,
            round_wind,
        }
    }
}

/// 天和・地和・人和の判定に使う巡目情報
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TurnContext {
    pub is_dealer: bool,
    pub is_first_draw: bool,
}
