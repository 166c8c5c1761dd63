//! 役満の判定（国士無双、四暗刻、九蓮宝燈など）
use crate::hand::{CalledMeld, PlayerHand};
use crate::tile::{count_kinds, Honor, Suit, Tile};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Yakuman {
    Kokushi13,
    Kokushi,
    Tsuuiisou,
    Daisangen,
    Daisuushi,
    Shousuushi,
    Chinroutou,
    Suukantsu,
    Ryuuiisou,
    SuuankouTanki,
    Suuankou,
    JunseiChuuren,
    Chuuren,
    Tenhou,
    Chiihou,
    Renhou,
    /// 数え役満
    Kazoe,
}

impl Yakuman {
    /// 倍率表のキー
    pub fn key(self) -> &'static str {
        match self {
            Yakuman::Kokushi13 => "kokushi_13",
            Yakuman::Kokushi => "kokushi",
            Yakuman::Tsuuiisou => "tsuuiisou",
            Yakuman::Daisangen => "daisangen",
            Yakuman::Daisuushi => "daisuushi",
            Yakuman::Shousuushi => "shousuushi",
            Yakuman::Chinroutou => "chinroutou",
            Yakuman::Suukantsu => "suukantsu",
            Yakuman::Ryuuiisou => "ryuuiisou",
            Yakuman::SuuankouTanki => "suuankou_tanki",
            Yakuman::Suuankou => "suuankou",
            Yakuman::JunseiChuuren => "junsei_chuuren",
            Yakuman::Chuuren => "chuuren",
            Yakuman::Tenhou => "tenhou",
            Yakuman::Chiihou => "chiihou",
            Yakuman::Renhou => "renhou",
            Yakuman::Kazoe => "kazoe",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Yakuman::Kokushi13 => "国士無双十三面待ち",
            Yakuman::Kokushi => "国士無双",
            Yakuman::Tsuuiisou => "字一色",
            Yakuman::Daisangen => "大三元",
            Yakuman::Daisuushi => "大四喜",
            Yakuman::Shousuushi => "小四喜",
            Yakuman::Chinroutou => "清老頭",
            Yakuman::Suukantsu => "四槓子",
            Yakuman::Ryuuiisou => "緑一色",
            Yakuman::SuuankouTanki => "四暗刻単騎待ち",
            Yakuman::Suuankou => "四暗刻",
            Yakuman::JunseiChuuren => "純正九蓮宝燈",
            Yakuman::Chuuren => "九蓮宝燈",
            Yakuman::Tenhou => "天和",
            Yakuman::Chiihou => "地和",
            Yakuman::Renhou => "人和",
            Yakuman::Kazoe => "数え役満",
        }
    }
}

/// 役満判定（決まった順、排他関係はここで処理）
pub fn evaluate(hand: &PlayerHand) -> Vec<Yakuman> {
    let mut out = vec![];

    if is_kokushi13(hand) {
        out.push(Yakuman::Kokushi13);
    } else if is_kokushi(hand) {
        out.push(Yakuman::Kokushi);
    } else if is_tsuuiisou(hand) {
        out.push(Yakuman::Tsuuiisou);
    }

    if is_daisangen(hand) {
        out.push(Yakuman::Daisangen);
    }

    if is_daisuushi(hand) {
        out.push(Yakuman::Daisuushi);
    } else if is_shousuushi(hand) {
        out.push(Yakuman::Shousuushi);
    }

    if is_chinroutou(hand) {
        out.push(Yakuman::Chinroutou);
    }
    if is_suukantsu(hand) {
        out.push(Yakuman::Suukantsu);
    }
    if is_ryuuiisou(hand) {
        out.push(Yakuman::Ryuuiisou);
    }

    if is_suuankou(hand) {
        if is_tanki_on_pair(hand) {
            out.push(Yakuman::SuuankouTanki);
        } else {
            out.push(Yakuman::Suuankou);
        }
    }

    if is_chuuren_shape(hand) {
        if is_junsei_chuuren(hand) {
            out.push(Yakuman::JunseiChuuren);
        } else {
            out.push(Yakuman::Chuuren);
        }
    }

    if !out.is_empty() {
        debug!(seat = hand.seat(), ?out, "yakuman");
    }
    out
}

fn orphans() -> impl Iterator<Item = Tile> {
    Tile::all().filter(|t| t.is_terminal_or_honor())
}

fn holds_all_orphans(tiles: &[Tile]) -> bool {
    let counts = count_kinds(tiles);
    orphans().all(|t| counts[t.index()] >= 1)
}

/// 国士無双（13枚の時点で13種そろっていれば十三面待ち側）
fn is_kokushi(hand: &PlayerHand) -> bool {
    if holds_all_orphans(hand.concealed()) {
        return false;
    }
    let closed = hand.closed_tiles();
    if closed.len() != 14 || !holds_all_orphans(&closed) {
        return false;
    }
    let counts = count_kinds(&closed);
    orphans().any(|t| counts[t.index()] == 2)
}

fn is_kokushi13(hand: &PlayerHand) -> bool {
    if !holds_all_orphans(hand.concealed()) {
        return false;
    }
    let Some(drawn) = hand.drawn() else {
        return false;
    };
    let closed = hand.closed_tiles();
    if closed.len() != 14 {
        return false;
    }
    let counts = count_kinds(&closed);
    drawn.tile.is_terminal_or_honor() && counts[drawn.tile.index()] == 2
}

/// 鳴き面子のうち、刻子・槓子になっている牌
fn called_sets(hand: &PlayerHand) -> Vec<Tile> {
    hand.melds().iter().filter_map(CalledMeld::set_tile).collect()
}

/// 鳴きはすべて `allowed` の刻子/槓子、手牌は `allowed` の刻子 + 雀頭1つだけ
fn sets_and_one_pair_of(hand: &PlayerHand, allowed: impl Fn(&Tile) -> bool) -> bool {
    let melds_ok = hand
        .melds()
        .iter()
        .all(|m| m.set_tile().map(|t| allowed(&t)).unwrap_or(false));
    if !melds_ok {
        return false;
    }
    let closed = hand.closed_tiles();
    let counts = count_kinds(&closed);
    let mut members = 0;
    let mut heads = 0;
    for t in Tile::all().filter(|t| allowed(t)) {
        match counts[t.index()] {
            3 => members += 1,
            2 => heads += 1,
            _ => {}
        }
    }
    heads == 1 && members * 3 + heads * 2 == closed.len()
}

/// 字一色
fn is_tsuuiisou(hand: &PlayerHand) -> bool {
    sets_and_one_pair_of(hand, Tile::is_honor)
}

/// 清老頭
fn is_chinroutou(hand: &PlayerHand) -> bool {
    sets_and_one_pair_of(hand, Tile::is_terminal)
}

/// 鳴いていない `group` の牌がすべて手牌にちょうど3枚
fn uncalled_all_triplets(hand: &PlayerHand, group: &[Honor]) -> bool {
    let called = called_sets(hand);
    let counts = count_kinds(&hand.closed_tiles());
    group
        .iter()
        .map(|&h| Tile::honor(h))
        .filter(|t| !called.contains(t))
        .all(|t| counts[t.index()] == 3)
}

fn is_daisangen(hand: &PlayerHand) -> bool {
    uncalled_all_triplets(hand, &Honor::DRAGONS)
}

fn is_daisuushi(hand: &PlayerHand) -> bool {
    uncalled_all_triplets(hand, &Honor::WINDS)
}

fn is_shousuushi(hand: &PlayerHand) -> bool {
    let called = called_sets(hand);
    let rest: Vec<Tile> = Honor::WINDS
        .iter()
        .map(|&h| Tile::honor(h))
        .filter(|t| !called.contains(t))
        .collect();
    // 四喜牌を全て鳴いていたら大四喜
    if rest.is_empty() {
        return false;
    }
    let counts = count_kinds(&hand.closed_tiles());
    let mut members = 0;
    let mut heads = 0;
    for t in &rest {
        match counts[t.index()] {
            3 => members += 1,
            2 => heads += 1,
            _ => {}
        }
    }
    heads == 1 && members + heads == rest.len()
}

/// 四槓子：槓子4つ + 和了牌で単騎の雀頭
fn is_suukantsu(hand: &PlayerHand) -> bool {
    hand.melds().iter().filter(|m| m.is_kan()).count() == 4 && is_tanki_on_pair(hand)
}

/// 和了牌が手牌（追加牌込み）でちょうど2枚
fn is_tanki_on_pair(hand: &PlayerHand) -> bool {
    let Some(drawn) = hand.drawn() else {
        return false;
    };
    let counts = count_kinds(&hand.closed_tiles());
    counts[drawn.tile.index()] == 2
}

/// 緑一色：2s 3s 4s 6s 8s 發 のみ
fn is_ryuuiisou(hand: &PlayerHand) -> bool {
    let green = |t: &Tile| {
        t.honor_kind() == Some(Honor::Green)
            || (t.suit() == Suit::Sou && matches!(t.num(), 2 | 3 | 4 | 6 | 8))
    };
    let tiles = hand.all_tiles();
    !tiles.is_empty() && tiles.iter().all(green)
}

/// 四暗刻：鳴きは暗槓のみ、暗刻 + 暗槓で4つ、雀頭1つ。
///
/// Counts come from concealed + drawn tiles whatever the drawn tile's
/// source, so a triplet completed by ron still counts as concealed.
fn is_suuankou(hand: &PlayerHand) -> bool {
    let mut ankan = 0;
    for m in hand.melds() {
        match m {
            CalledMeld::Kan { from, .. } if *from == hand.seat() => ankan += 1,
            _ => return false,
        }
    }
    let counts = count_kinds(&hand.closed_tiles());
    let triplets = counts.iter().filter(|&&c| c == 3).count();
    let pairs = counts.iter().filter(|&&c| c == 2).count();
    triplets + ankan >= 4 && pairs == 1
}

/// 九蓮宝燈形：槓なし、同一色の数牌14枚、1と9が3枚以上、1～9すべてあり
fn is_chuuren_shape(hand: &PlayerHand) -> bool {
    if hand.melds().iter().any(CalledMeld::is_kan) {
        return false;
    }
    let tiles = hand.all_tiles();
    if tiles.len() != 14 || tiles.iter().any(|t| t.is_honor()) {
        return false;
    }
    let suit = tiles[0].suit();
    if tiles.iter().any(|t| t.suit() != suit) {
        return false;
    }
    let mut c = [0u8; 10];
    for t in &tiles {
        c[t.num() as usize] += 1;
    }
    c[1] >= 3 && c[9] >= 3 && (1..=9).all(|n| c[n] >= 1)
}

/// 純正：和了牌を除いた13枚が 1112345678999
fn is_junsei_chuuren(hand: &PlayerHand) -> bool {
    let Some(drawn) = hand.drawn() else {
        return false;
    };
    let mut before = hand.all_tiles();
    let Some(i) = before.iter().rposition(|&t| t == drawn.tile) else {
        return false;
    };
    before.remove(i);
    let mut c = [0u8; 10];
    for t in &before {
        c[t.num() as usize] += 1;
    }
    c == [0, 3, 1, 1, 1, 1, 1, 1, 1, 3]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::{DrawSource, DrawnTile};
    use crate::tile::parse_tiles;
    use crate::Wind;

    fn t(code: &str) -> Tile {
        Tile::from_code(code).unwrap()
    }

    fn hand_with(concealed: &str, win: &str, melds: Vec<CalledMeld>) -> PlayerHand {
        PlayerHand::from_parts(
            0,
            Wind::E,
            parse_tiles(concealed).unwrap(),
            Some(DrawnTile {
                tile: t(win),
                source: DrawSource::SelfDraw,
            }),
            melds,
            None,
        )
    }

    #[test]
    fn test_kokushi_single_wait() {
        let h = hand_with("1m 9m 1p 9p 1s 9s E S W N P F F", "C", vec![]);
        assert_eq!(evaluate(&h), vec![Yakuman::Kokushi]);
    }

    #[test]
    fn test_kokushi_thirteen_wait() {
        let h = hand_with("1m 9m 1p 9p 1s 9s E S W N P F C", "1m", vec![]);
        assert_eq!(evaluate(&h), vec![Yakuman::Kokushi13]);
    }

    #[test]
    fn test_kokushi_needs_all_kinds() {
        let h = hand_with("1m 9m 1p 9p 1s 9s E S W N P F F", "F", vec![]);
        assert!(evaluate(&h).is_empty());
    }

    #[test]
    fn test_daisangen_with_called_dragon() {
        let h = hand_with(
            "P P P F F F 2m 3m 4m 9s",
            "9s",
            vec![CalledMeld::Triplet {
                tile: t("C"),
                from: 2,
            }],
        );
        assert_eq!(evaluate(&h), vec![Yakuman::Daisangen]);
    }

    #[test]
    fn test_shousuushi_and_daisuushi() {
        let small = hand_with("E E E S S S W W W N 2p 3p 4p", "N", vec![]);
        let r = evaluate(&small);
        assert!(r.contains(&Yakuman::Shousuushi));
        assert!(!r.contains(&Yakuman::Daisuushi));

        let big = hand_with("E E E S S S W W W N N N 5p", "5p", vec![]);
        let r = evaluate(&big);
        assert!(r.contains(&Yakuman::Daisuushi));
        assert!(!r.contains(&Yakuman::Shousuushi));
        assert!(r.contains(&Yakuman::SuuankouTanki));
    }

    #[test]
    fn test_tsuuiisou_and_suuankou() {
        let h = hand_with("P P P F F F C C C E E E S", "S", vec![]);
        let r = evaluate(&h);
        assert_eq!(
            r,
            vec![
                Yakuman::Tsuuiisou,
                Yakuman::Daisangen,
                Yakuman::SuuankouTanki
            ]
        );
    }

    #[test]
    fn test_suuankou_not_tanki() {
        let h = hand_with("1m 1m 1m 5p 5p 5p 7s 7s 7s 9s 9s 2m 2m", "2m", vec![]);
        assert_eq!(evaluate(&h), vec![Yakuman::Suuankou]);
    }

    #[test]
    fn test_open_kan_breaks_suuankou() {
        let h = hand_with(
            "5p 5p 5p 7s 7s 7s 9s 9s 2m 2m",
            "2m",
            vec![CalledMeld::Kan {
                tile: t("1m"),
                from: 3,
            }],
        );
        assert!(!evaluate(&h).contains(&Yakuman::Suuankou));
    }

    #[test]
    fn test_chinroutou() {
        let h = hand_with("1m 1m 1m 9m 9m 9m 1p 1p 1p 9s 9s 9s 1s", "1s", vec![]);
        let r = evaluate(&h);
        assert!(r.contains(&Yakuman::Chinroutou));
        assert!(r.contains(&Yakuman::SuuankouTanki));
    }

    #[test]
    fn test_suukantsu() {
        let melds = ["1m", "5p", "E", "9s"]
            .iter()
            .map(|c| CalledMeld::Kan {
                tile: t(c),
                from: 1,
            })
            .collect();
        let h = hand_with("3s", "3s", melds);
        assert_eq!(evaluate(&h), vec![Yakuman::Suukantsu]);
    }

    #[test]
    fn test_ryuuiisou() {
        let h = hand_with("2s 3s 4s 2s 3s 4s 6s 6s 6s F F 8s 8s", "8s", vec![]);
        assert!(evaluate(&h).contains(&Yakuman::Ryuuiisou));
    }

    #[test]
    fn test_empty_hand_is_not_all_green() {
        let h = PlayerHand::new(0, Wind::E);
        assert!(!is_ryuuiisou(&h));
        assert!(evaluate(&h).is_empty());
    }

    #[test]
    fn test_suuankou_completed_by_ron() {
        // シャンポン待ちをロンで埋めても四暗刻として扱う
        let h = PlayerHand::from_parts(
            0,
            Wind::E,
            parse_tiles("1m 1m 1m 5p 5p 5p 7s 7s 7s 9s 9s 2m 2m").unwrap(),
            Some(DrawnTile {
                tile: t("2m"),
                source: DrawSource::Claimed,
            }),
            vec![],
            None,
        );
        assert_eq!(evaluate(&h), vec![Yakuman::Suuankou]);
    }

    #[test]
    fn test_chuuren_pure_and_normal() {
        let pure = hand_with("1p 1p 1p 2p 3p 4p 5p 6p 7p 8p 9p 9p 9p", "5p", vec![]);
        assert_eq!(evaluate(&pure), vec![Yakuman::JunseiChuuren]);

        let normal = hand_with("1p 1p 1p 2p 3p 4p 5p 5p 7p 8p 9p 9p 9p", "6p", vec![]);
        assert_eq!(evaluate(&normal), vec![Yakuman::Chuuren]);
    }

    #[test]
    fn test_ordinary_hand_has_no_yakuman() {
        let h = hand_with("1m 2m 3m 4p 5p 6p 7s 8s 9s E E 2m 3m", "4m", vec![]);
        assert!(evaluate(&h).is_empty());
    }
}
