//! ルール設定（翻数表・役満倍率・各種しきい値）。

use crate::error::EngineResult;
use crate::yaku::Yaku;
use crate::yakuman::Yakuman;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// 翻数：門前/副露で同じなら数値、違うなら `{ "open": .., "closed": .. }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FanValue {
    Flat(u32),
    Split { open: u32, closed: u32 },
}

impl FanValue {
    pub fn for_hand(self, is_open: bool) -> u32 {
        match self {
            FanValue::Flat(v) => v,
            FanValue::Split { open, closed } => {
                if is_open {
                    open
                } else {
                    closed
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// 役のキー → 翻数
    pub fan: BTreeMap<String, FanValue>,
    /// 役満のキー → 倍率（未指定は1）
    pub yakuman_multiplier: BTreeMap<String, u32>,
    /// 数え役満になる翻数
    pub counted_yakuman_threshold: u32,
    /// 役満1倍あたりの翻数
    pub yakuman_fan: u32,
    /// ダブルリーチとみなす河牌番号の上限
    pub double_riichi_window: u32,
}

fn closed_only(v: u32) -> FanValue {
    FanValue::Split { open: 0, closed: v }
}

fn split(open: u32, closed: u32) -> FanValue {
    FanValue::Split { open, closed }
}

impl Default for RuleConfig {
    fn default() -> Self {
        let fan: BTreeMap<String, FanValue> = [
            ("pinfu", closed_only(1)),
            ("tanyao", FanValue::Flat(1)),
            ("iipeikou", closed_only(1)),
            ("menzen_tsumo", closed_only(1)),
            ("haitei", FanValue::Flat(1)),
            ("houtei", FanValue::Flat(1)),
            ("rinshan", FanValue::Flat(1)),
            ("toitoi", FanValue::Flat(2)),
            ("ittsu", split(1, 2)),
            ("sanshoku", split(1, 2)),
            ("sanankou", FanValue::Flat(2)),
            ("chanta", split(1, 2)),
            ("sanshoku_doukou", FanValue::Flat(2)),
            ("sankantsu", FanValue::Flat(2)),
            ("honroutou", FanValue::Flat(2)),
            ("double_riichi", closed_only(2)),
            ("chiitoitsu", FanValue::Flat(2)),
            ("honitsu", split(2, 3)),
            ("junchan", split(2, 3)),
            ("ryanpeikou", closed_only(3)),
            ("chinitsu", split(5, 6)),
            ("yakuhai", FanValue::Flat(1)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let yakuman_multiplier: BTreeMap<String, u32> = [
            (Yakuman::Kokushi13.key(), 2),
            (Yakuman::SuuankouTanki.key(), 2),
            (Yakuman::JunseiChuuren.key(), 2),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        RuleConfig {
            fan,
            yakuman_multiplier,
            counted_yakuman_threshold: 13,
            yakuman_fan: 13,
            double_riichi_window: 4,
        }
    }
}

impl RuleConfig {
    /// JSONから読み込む。指定されなかった役・倍率は既定値のまま。
    pub fn from_json(s: &str) -> EngineResult<Self> {
        let mut cfg: RuleConfig = serde_json::from_str(s)?;
        let defaults = RuleConfig::default();
        for (k, v) in defaults.fan {
            cfg.fan.entry(k).or_insert(v);
        }
        for (k, v) in defaults.yakuman_multiplier {
            cfg.yakuman_multiplier.entry(k).or_insert(v);
        }
        debug!(
            fan_entries = cfg.fan.len(),
            threshold = cfg.counted_yakuman_threshold,
            "rule config loaded"
        );
        Ok(cfg)
    }

    /// 未登録の役は0翻（＝成立しても数えない）
    pub fn fan_for(&self, yaku: Yaku, is_open: bool) -> u32 {
        self.fan
            .get(yaku.key())
            .map(|v| v.for_hand(is_open))
            .unwrap_or(0)
    }

    pub fn multiplier(&self, yakuman: Yakuman) -> u32 {
        self.yakuman_multiplier
            .get(yakuman.key())
            .copied()
            .unwrap_or(1)
    }
}
