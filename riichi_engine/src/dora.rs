//! ドラ表示牌からドラを求め、手牌のドラ枚数を数える。
use crate::tile::{count_kinds, Tile};

/// 表示牌の次の牌がドラ（9→1、字牌は東南西北白發中の順で循環）
pub fn indicator_to_dora(ind: Tile) -> Tile {
    ind.dora_successor()
}

/// 手牌・和了牌・鳴き牌を合わせたドラ枚数。
/// 同じ牌を指す表示牌が2枚あればその分だけ重ねて数える。
pub fn count_dora_from_indicators(all_tiles: &[Tile], indicators: &[Tile]) -> u32 {
    let held = count_kinds(all_tiles);
    indicators
        .iter()
        .map(|&ind| u32::from(held[indicator_to_dora(ind).index()]))
        .sum()
}
