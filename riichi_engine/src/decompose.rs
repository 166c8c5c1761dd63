//! 面子分解（4面子1雀頭）と待ち牌の列挙。
//!
//! Works on per-kind count arrays so the search order is fixed by
//! [`Tile::index`]: pick the pair, then always consume the smallest kind
//! left, either as a triplet or as the low end of a run.

use crate::tile::{count_kinds, Tile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 面子。順子は先頭（最小）の牌で表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Block {
    Shuntsu(Tile),
    Koutsu(Tile),
}

impl Block {
    pub fn tiles(&self) -> [Tile; 3] {
        match *self {
            Block::Koutsu(t) => [t; 3],
            Block::Shuntsu(t) => {
                // 生成時に next/next2 の存在を確認済み
                let mid = t.next().unwrap_or(t);
                let high = t.next2().unwrap_or(t);
                [t, mid, high]
            }
        }
    }

    pub fn contains(&self, tile: Tile) -> bool {
        self.tiles().contains(&tile)
    }

    pub fn is_run(&self) -> bool {
        matches!(self, Block::Shuntsu(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decomposition {
    pub blocks: Vec<Block>,
    /// 雀頭
    pub pair: Tile,
}

/// 14枚（副露なし）の分解
pub fn decompose(tiles: &[Tile]) -> Vec<Decomposition> {
    decompose_with_melds_needed(tiles, 4)
}

/// 副露あり対応：手牌側で必要な面子数を指定して分解する
pub fn decompose_with_melds_needed(tiles: &[Tile], melds_needed: usize) -> Vec<Decomposition> {
    let mut results = vec![];
    if tiles.len() != melds_needed * 3 + 2 {
        return results;
    }
    let mut counts = count_kinds(tiles);
    if counts.iter().any(|&c| c as usize > Tile::COPIES) {
        return results;
    }

    for pair_idx in 0..Tile::KINDS {
        if counts[pair_idx] < 2 {
            continue;
        }
        let Some(pair) = Tile::from_index(pair_idx) else {
            continue;
        };
        counts[pair_idx] -= 2;
        let mut blocks = Vec::with_capacity(melds_needed);
        search(&mut counts, &mut blocks, &mut results, pair, melds_needed);
        counts[pair_idx] += 2;
    }
    results
}

fn search(
    counts: &mut [u8; Tile::KINDS],
    blocks: &mut Vec<Block>,
    results: &mut Vec<Decomposition>,
    pair: Tile,
    melds_needed: usize,
) {
    let Some(idx) = counts.iter().position(|&c| c > 0) else {
        if blocks.len() == melds_needed {
            results.push(Decomposition {
                blocks: blocks.clone(),
                pair,
            });
        }
        return;
    };
    if blocks.len() == melds_needed {
        return;
    }
    let Some(tile) = Tile::from_index(idx) else {
        return;
    };

    // 刻子
    if counts[idx] >= 3 {
        counts[idx] -= 3;
        blocks.push(Block::Koutsu(tile));
        search(counts, blocks, results, pair, melds_needed);
        blocks.pop();
        counts[idx] += 3;
    }

    // 順子（最小牌を先頭にしたものだけ）
    if let (Some(t2), Some(t3)) = (tile.next(), tile.next2()) {
        let (i2, i3) = (t2.index(), t3.index());
        if counts[i2] > 0 && counts[i3] > 0 {
            counts[idx] -= 1;
            counts[i2] -= 1;
            counts[i3] -= 1;
            blocks.push(Block::Shuntsu(tile));
            search(counts, blocks, results, pair, melds_needed);
            blocks.pop();
            counts[idx] += 1;
            counts[i2] += 1;
            counts[i3] += 1;
        }
    }
}

/// 聴牌形（3k+1枚）の待ち牌。4枚使い切っている牌は含めない。
pub fn completing_tiles(tiles: &[Tile]) -> BTreeSet<Tile> {
    let mut waits = BTreeSet::new();
    if tiles.len() % 3 != 1 {
        return waits;
    }
    let melds_needed = tiles.len() / 3;
    let counts = count_kinds(tiles);
    let mut trial = Vec::with_capacity(tiles.len() + 1);
    for t in Tile::all() {
        if counts[t.index()] as usize >= Tile::COPIES {
            continue;
        }
        trial.clear();
        trial.extend_from_slice(tiles);
        trial.push(t);
        if !decompose_with_melds_needed(&trial, melds_needed).is_empty() {
            waits.insert(t);
        }
    }
    waits
}

/// 七対子形：14枚、7種類がちょうど2枚ずつ
pub fn is_seven_pairs(tiles: &[Tile]) -> bool {
    if tiles.len() != 14 {
        return false;
    }
    let counts = count_kinds(tiles);
    counts.iter().filter(|&&c| c == 2).count() == 7
}

/// 国士無双形：么九牌13種すべて + どれか1枚重複
pub fn is_thirteen_orphans_shape(tiles: &[Tile]) -> bool {
    if tiles.len() != 14 || !tiles.iter().all(|t| t.is_terminal_or_honor()) {
        return false;
    }
    let counts = count_kinds(tiles);
    Tile::all()
        .filter(|t| t.is_terminal_or_honor())
        .all(|t| counts[t.index()] >= 1)
}
