use crate::config::RuleConfig;
use crate::hand::PlayerHand;
use crate::wall::TileWall;
use crate::yaku::{self, Yaku};
use crate::yakuman::{self, Yakuman};
use crate::{TurnContext, WinContext};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Yaku(Yaku),
    Yakuman(Yakuman),
    NoYaku,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Yaku(y) => y.name(),
            Category::Yakuman(y) => y.name(),
            Category::NoYaku => Yaku::NoYaku.name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub categories: Vec<Category>,
    pub fan: u32,
}

impl ScoreOutcome {
    pub fn is_yakuman(&self) -> bool {
        self.categories
            .iter()
            .any(|c| matches!(c, Category::Yakuman(_)))
    }

    /// 役なし（和了できない）
    pub fn is_no_yaku(&self) -> bool {
        self.categories == [Category::NoYaku]
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.categories.iter().map(|c| c.name()).collect()
    }
}

/// 役満優先で全役を判定する唯一の入口
#[derive(Debug, Clone, Copy)]
pub struct ScoreAggregator<'a> {
    rules: &'a RuleConfig,
}

impl<'a> ScoreAggregator<'a> {
    pub fn new(rules: &'a RuleConfig) -> Self {
        ScoreAggregator { rules }
    }

    pub fn evaluate(
        &self,
        hand: &PlayerHand,
        wall: Option<&TileWall>,
        turn: TurnContext,
        win: WinContext,
    ) -> ScoreOutcome {
        let mut found = yakuman::evaluate(hand);
        if !found.is_empty() {
            found.extend(first_turn_yakuman(turn, win));
            return self.yakuman_outcome(found);
        }

        let standard = yaku::evaluate(hand, wall, &win, self.rules);
        if standard.fan > 0 {
            let blessings = first_turn_yakuman(turn, win);
            if !blessings.is_empty() {
                return self.yakuman_outcome(blessings);
            }
            if standard.fan >= self.rules.counted_yakuman_threshold {
                debug!(fan = standard.fan, "counted yakuman");
                return self.yakuman_outcome(vec![Yakuman::Kazoe]);
            }
        }

        let categories = standard
            .yaku
            .iter()
            .map(|&y| match y {
                Yaku::NoYaku => Category::NoYaku,
                other => Category::Yaku(other),
            })
            .collect();
        ScoreOutcome {
            categories,
            fan: standard.fan,
        }
    }

    fn yakuman_outcome(&self, list: Vec<Yakuman>) -> ScoreOutcome {
        let multiplier: u32 = list.iter().map(|&y| self.rules.multiplier(y)).sum();
        ScoreOutcome {
            fan: self.rules.yakuman_fan * multiplier,
            categories: list.into_iter().map(Category::Yakuman).collect(),
        }
    }
}

/// 天和・地和・人和
pub fn first_turn_yakuman(turn: TurnContext, win: WinContext) -> Vec<Yakuman> {
    let mut out = vec![];
    if !turn.is_first_draw {
        return out;
    }
    if turn.is_dealer && win.is_self_draw {
        out.push(Yakuman::Tenhou);
    }
    if !turn.is_dealer && win.is_self_draw {
        out.push(Yakuman::Chiihou);
    }
    if !turn.is_dealer && win.is_discard_win {
        out.push(Yakuman::Renhou);
    }
    out
}
