//! 通常役の判定。
//!
//! Each predicate looks at tile counts of the hand; the fan for a satisfied
//! predicate comes from [`RuleConfig`] and a zero-fan entry is not reported.

use crate::config::RuleConfig;
use crate::decompose::is_seven_pairs;
use crate::hand::{CalledMeld, MeldKind, PlayerHand};
use crate::tile::{count_kinds, Honor, Suit, Tile};
use crate::wall::TileWall;
use crate::WinContext;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Yaku {
    Pinfu,
    Tanyao,
    Iipeikou,
    MenzenTsumo,
    Haitei,
    Houtei,
    Rinshan,
    Toitoi,
    Ittsu,
    Sanshoku,
    Sanankou,
    Chanta,
    SanshokuDoukou,
    Sankantsu,
    Honroutou,
    DoubleRiichi,
    Chiitoitsu,
    Honitsu,
    Junchan,
    Ryanpeikou,
    Chinitsu,
    Yakuhai(Honor),
    NoYaku,
}

impl Yaku {
    /// 翻数表のキー
    pub fn key(self) -> &'static str {
        match self {
            Yaku::Pinfu => "pinfu",
            Yaku::Tanyao => "tanyao",
            Yaku::Iipeikou => "iipeikou",
            Yaku::MenzenTsumo => "menzen_tsumo",
            Yaku::Haitei => "haitei",
            Yaku::Houtei => "houtei",
            Yaku::Rinshan => "rinshan",
            Yaku::Toitoi => "toitoi",
            Yaku::Ittsu => "ittsu",
            Yaku::Sanshoku => "sanshoku",
            Yaku::Sanankou => "sanankou",
            Yaku::Chanta => "chanta",
            Yaku::SanshokuDoukou => "sanshoku_doukou",
            Yaku::Sankantsu => "sankantsu",
            Yaku::Honroutou => "honroutou",
            Yaku::DoubleRiichi => "double_riichi",
            Yaku::Chiitoitsu => "chiitoitsu",
            Yaku::Honitsu => "honitsu",
            Yaku::Junchan => "junchan",
            Yaku::Ryanpeikou => "ryanpeikou",
            Yaku::Chinitsu => "chinitsu",
            Yaku::Yakuhai(_) => "yakuhai",
            Yaku::NoYaku => "no_yaku",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Yaku::Pinfu => "平和",
            Yaku::Tanyao => "断么九",
            Yaku::Iipeikou => "一盃口",
            Yaku::MenzenTsumo => "門前清自摸和",
            Yaku::Haitei => "海底撈月",
            Yaku::Houtei => "河底撈魚",
            Yaku::Rinshan => "嶺上開花",
            Yaku::Toitoi => "対々和",
            Yaku::Ittsu => "一気通貫",
            Yaku::Sanshoku => "三色同順",
            Yaku::Sanankou => "三暗刻",
            Yaku::Chanta => "混全帯么九",
            Yaku::SanshokuDoukou => "三色同刻",
            Yaku::Sankantsu => "三槓子",
            Yaku::Honroutou => "混老頭",
            Yaku::DoubleRiichi => "ダブル立直",
            Yaku::Chiitoitsu => "七対子",
            Yaku::Honitsu => "混一色",
            Yaku::Junchan => "純全帯么九",
            Yaku::Ryanpeikou => "二盃口",
            Yaku::Chinitsu => "清一色",
            Yaku::Yakuhai(h) => match h {
                Honor::East => "役牌（東）",
                Honor::South => "役牌（南）",
                Honor::West => "役牌（西）",
                Honor::North => "役牌（北）",
                Honor::White => "役牌（白）",
                Honor::Green => "役牌（發）",
                Honor::Red => "役牌（中）",
            },
            Yaku::NoYaku => "役なし",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YakuResult {
    pub yaku: Vec<Yaku>,
    pub fan: u32,
}

impl YakuResult {
    pub fn has_yaku(&self) -> bool {
        self.yaku.iter().any(|&y| y != Yaku::NoYaku)
    }
}

/// Precomputed views of a hand shared by the predicates.
struct HandView<'a> {
    hand: &'a PlayerHand,
    closed: Vec<Tile>,
    all: Vec<Tile>,
    /// 手牌 + 追加牌の枚数
    closed_counts: [u8; Tile::KINDS],
    all_counts: [u8; Tile::KINDS],
    /// 翻数表の open/closed 選択用（暗槓は門前扱い）
    is_open: bool,
}

impl<'a> HandView<'a> {
    fn new(hand: &'a PlayerHand) -> Self {
        let closed = hand.closed_tiles();
        let all = hand.all_tiles();
        HandView {
            hand,
            closed_counts: count_kinds(&closed),
            all_counts: count_kinds(&all),
            closed,
            all,
            is_open: hand.is_open(),
        }
    }

    /// 鳴き（暗槓も含む）なしで14枚
    fn menzen14(&self) -> bool {
        !self.hand.has_melds() && self.closed.len() == 14
    }
}

/// 役判定：条件を満たした役を決まった順に並べ、翻数を合計する
pub fn evaluate(
    hand: &PlayerHand,
    wall: Option<&TileWall>,
    ctx: &WinContext,
    rules: &RuleConfig,
) -> YakuResult {
    let v = HandView::new(hand);
    let mut yaku = vec![];
    let mut fan = 0;
    let mut add = |y: Yaku, ok: bool| {
        if !ok {
            return;
        }
        let f = rules.fan_for(y, v.is_open);
        if f > 0 {
            yaku.push(y);
            fan += f;
        }
    };

    let double_riichi = hand
        .riichi_lock()
        .map(|seq| seq <= rules.double_riichi_window)
        .unwrap_or(false);
    let self_draw = ctx.is_self_draw && hand.is_self_draw();
    let drawable = wall.map(|w| w.drawable_count());

    add(Yaku::Pinfu, is_pinfu(&v));
    add(Yaku::Tanyao, v.all.iter().all(|t| t.is_simple()));
    add(Yaku::Iipeikou, is_iipeikou(&v));
    add(Yaku::MenzenTsumo, !v.hand.has_melds() && self_draw);
    add(Yaku::Haitei, self_draw && drawable.map(|n| n <= 1).unwrap_or(false));
    add(
        Yaku::Houtei,
        ctx.is_discard_win && drawable.map(|n| n == 0).unwrap_or(false),
    );
    add(Yaku::Rinshan, ctx.is_post_kan_draw && self_draw);
    add(Yaku::Toitoi, is_toitoi(&v));
    add(Yaku::Ittsu, is_ittsu(&v));
    add(Yaku::Sanshoku, is_sanshoku(&v));
    add(Yaku::Sanankou, is_sanankou(&v));
    add(Yaku::Chanta, is_chanta(&v));
    add(Yaku::SanshokuDoukou, is_sanshoku_doukou(&v));
    add(
        Yaku::Sankantsu,
        hand.melds().iter().filter(|m| m.is_kan()).count() >= 3,
    );
    add(
        Yaku::Honroutou,
        v.all.iter().all(|t| t.is_terminal_or_honor()),
    );
    add(Yaku::DoubleRiichi, double_riichi);
    add(Yaku::Chiitoitsu, v.menzen14() && is_seven_pairs(&v.closed));
    add(Yaku::Honitsu, is_honitsu(&v));
    add(Yaku::Junchan, is_junchan(&v));
    add(Yaku::Ryanpeikou, is_ryanpeikou(&v));
    add(Yaku::Chinitsu, is_chinitsu(&v));
    for h in yakuhai(&v) {
        add(Yaku::Yakuhai(h), true);
    }

    if yaku.is_empty() {
        yaku.push(Yaku::NoYaku);
        fan = 0;
    }
    debug!(seat = hand.seat(), ?yaku, fan, "yaku evaluated");
    YakuResult { yaku, fan }
}

/// 数牌の枚数（suit毎、1..=9）
fn suit_counts(counts: &[u8; Tile::KINDS], suit: Suit) -> [u8; 10] {
    let mut out = [0u8; 10];
    for n in 1..=9u8 {
        if let Some(t) = Tile::numeral(suit, n) {
            out[n as usize] = counts[t.index()];
        }
    }
    out
}

/// 平和（簡易）：門前14枚で字牌なし。待ちの形は見ない
fn is_pinfu(v: &HandView) -> bool {
    v.menzen14()
        && !v.closed.iter().any(|t| t.is_honor())
        && v.closed_counts.iter().all(|&c| c as usize <= Tile::COPIES)
}

/// 同じ順子を2組作れる先頭の数（suit毎）
fn doubled_run_starts(counts: &[u8; Tile::KINDS], suit: Suit) -> usize {
    let c = suit_counts(counts, suit);
    (1..=7)
        .filter(|&n| c[n].min(c[n + 1]).min(c[n + 2]) >= 2)
        .count()
}

/// 順子の取れる数を先頭ごとに足し合わせたもの（重なりも数える）
fn overlapping_runs(counts: &[u8; Tile::KINDS], suit: Suit) -> u32 {
    let c = suit_counts(counts, suit);
    (1..=7)
        .map(|n| u32::from(c[n].min(c[n + 1]).min(c[n + 2])))
        .sum()
}

/// 一盃口（簡易）：どれかのsuitで順子の延べ数が2以上
fn is_iipeikou(v: &HandView) -> bool {
    !v.hand.has_melds()
        && Suit::NUMERALS
            .iter()
            .any(|&s| overlapping_runs(&v.closed_counts, s) >= 2)
}

fn is_toitoi(v: &HandView) -> bool {
    if v.hand.melds().iter().any(|m| m.kind() == MeldKind::Run) {
        return false;
    }
    v.all_counts.iter().filter(|&&c| c >= 3).count() >= 4
}

/// 一気通貫：同じsuitで 123/456/789 を順に取り除けるか
fn is_ittsu(v: &HandView) -> bool {
    Suit::NUMERALS.iter().any(|&s| {
        let mut c = suit_counts(&v.all_counts, s);
        for start in [1usize, 4, 7] {
            if (start..start + 3).any(|n| c[n] == 0) {
                return false;
            }
            for n in start..start + 3 {
                c[n] -= 1;
            }
        }
        true
    })
}

fn is_sanshoku(v: &HandView) -> bool {
    let per_suit = Suit::NUMERALS.map(|s| suit_counts(&v.all_counts, s));
    (1..=7).any(|n| per_suit.iter().all(|c| c[n] > 0 && c[n + 1] > 0 && c[n + 2] > 0))
}

fn is_sanankou(v: &HandView) -> bool {
    if is_seven_pairs(&v.closed) {
        return false;
    }
    v.closed_counts.iter().filter(|&&c| c >= 3).count() >= 3
}

fn is_chanta(v: &HandView) -> bool {
    let melds_ok = v
        .hand
        .melds()
        .iter()
        .all(|m| m.tiles().iter().any(|t| t.is_terminal_or_honor()));
    if !melds_ok || v.closed.len() < 2 {
        return false;
    }
    Tile::all().any(|t| t.is_terminal_or_honor() && v.closed_counts[t.index()] >= 2)
}

/// 三色同刻：鳴きのポン/カン、または手牌の3枚以上
fn is_sanshoku_doukou(v: &HandView) -> bool {
    let has_triplet = |t: Tile| {
        v.closed_counts[t.index()] >= 3
            || v.hand.melds().iter().any(|m| match m {
                CalledMeld::Triplet { tile, .. } | CalledMeld::Kan { tile, .. } => *tile == t,
                CalledMeld::Run { .. } => false,
            })
    };
    (1..=9u8).any(|n| {
        Suit::NUMERALS
            .iter()
            .all(|&s| Tile::numeral(s, n).map(has_triplet).unwrap_or(false))
    })
}

/// 使っている数牌のsuit（1種類のときだけ Some）
fn single_numeral_suit(tiles: &[Tile]) -> Option<Suit> {
    let mut suits = tiles.iter().filter(|t| !t.is_honor()).map(|t| t.suit());
    let first = suits.next()?;
    suits.all(|s| s == first).then_some(first)
}

/// 混一色：数牌が1種類だけ（字牌はあってもなくてもよい）
fn is_honitsu(v: &HandView) -> bool {
    single_numeral_suit(&v.all).is_some()
}

/// 清一色（簡易）：数牌が1種類だけ。字牌は判定に入れない
fn is_chinitsu(v: &HandView) -> bool {
    single_numeral_suit(&v.all).is_some()
}

/// 純全帯么九（簡易）：門前14枚、字牌なし、老頭牌5枚以上
fn is_junchan(v: &HandView) -> bool {
    if !v.menzen14() || v.closed.iter().any(|t| t.is_honor()) {
        return false;
    }
    v.closed.iter().filter(|t| t.is_terminal()).count() >= 5
}

/// 二盃口（簡易）：同じ順子が2組ずつ、2種類
fn is_ryanpeikou(v: &HandView) -> bool {
    if !v.menzen14() {
        return false;
    }
    Suit::NUMERALS
        .iter()
        .any(|&s| doubled_run_starts(&v.closed_counts, s) >= 2)
}

/// 役牌（簡易）：字牌の刻子すべて。風牌も場風・自風を問わない
fn yakuhai(v: &HandView) -> Vec<Honor> {
    Honor::ALL
        .into_iter()
        .filter(|&h| v.all_counts[Tile::honor(h).index()] >= 3)
        .collect()
}
