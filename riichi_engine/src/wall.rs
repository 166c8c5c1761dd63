//! 牌山（136枚）と王牌の管理。
//!
//! Slots stay in build order for the whole match; the dead wall is the
//! contiguous (circular) run of dead slots. Every index is recomputed
//! against the current length, so removals never invalidate later calls.

use crate::error::{EngineError, EngineResult, Resource};
use crate::tile::Tile;
use crate::Seat;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const WALL_SIZE: usize = Tile::KINDS * Tile::COPIES;
pub const WALL_TILES_PER_SEAT: usize = 34;
pub const DEAD_WALL_SIZE: usize = 14;
pub const MAX_KAN_DORA: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallSlot {
    pub tile: Tile,
    /// 席ID（0～3）
    pub seat: Seat,
    /// 牌山作成時の位置（0～135）
    pub position: usize,
    /// 席毎の列番号（0～16）
    pub column: usize,
    pub is_top: bool,
    pub is_dead_wall: bool,
    pub is_dora_indicator: bool,
    pub is_kan_dora_indicator: bool,
}

impl WallSlot {
    fn new(position: usize, tile: Tile) -> Self {
        let index_in_seat = position % WALL_TILES_PER_SEAT;
        WallSlot {
            tile,
            seat: position / WALL_TILES_PER_SEAT,
            position,
            column: index_in_seat / 2,
            is_top: index_in_seat % 2 == 0,
            is_dead_wall: false,
            is_dora_indicator: false,
            is_kan_dora_indicator: false,
        }
    }

    pub fn is_indicator(&self) -> bool {
        self.is_dora_indicator || self.is_kan_dora_indicator
    }
}

#[derive(Debug, Clone)]
pub struct TileWall {
    slots: Vec<WallSlot>,
    carved: bool,
    /// build positions of revealed indicators, reveal order
    revealed: Vec<usize>,
}

/// Vendored Fisher-Yates so the same seed gives the same wall across rand versions.
fn fisher_yates_shuffle<T>(slice: &mut [T], rng: &mut impl Rng) {
    for i in (1..slice.len()).rev() {
        let j = rng.gen_range(0..=i);
        slice.swap(i, j);
    }
}

fn sorted_tile_set() -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(WALL_SIZE);
    for t in Tile::all() {
        for _ in 0..Tile::COPIES {
            tiles.push(t);
        }
    }
    tiles
}

impl TileWall {
    /// 牌山作成：生成 → 洗牌 → 牌山情報の付与
    pub fn build(seed: u64) -> Self {
        let mut tiles = sorted_tile_set();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        fisher_yates_shuffle(&mut tiles, &mut rng);
        debug!(seed, "wall built");
        Self::from_ordered(tiles)
    }

    /// Production seeding from the OS entropy source.
    pub fn build_from_entropy() -> Self {
        Self::build(rand::rngs::OsRng.gen())
    }

    /// Builds a wall from a caller-supplied order (replays, fixtures).
    pub fn build_with_tiles(tiles: Vec<Tile>) -> EngineResult<Self> {
        if tiles.len() != WALL_SIZE {
            return Err(EngineError::invariant(format!(
                "wall needs {} tiles, got {}",
                WALL_SIZE,
                tiles.len()
            )));
        }
        let counts = crate::tile::count_kinds(&tiles);
        if let Some(idx) = counts.iter().position(|&c| c as usize != Tile::COPIES) {
            return Err(EngineError::invariant(format!(
                "wall holds {} copies of {}",
                counts[idx],
                Tile::from_index(idx).map(|t| t.to_string()).unwrap_or_default()
            )));
        }
        Ok(Self::from_ordered(tiles))
    }

    fn from_ordered(tiles: Vec<Tile>) -> Self {
        let slots = tiles
            .into_iter()
            .enumerate()
            .map(|(i, t)| WallSlot::new(i, t))
            .collect();
        TileWall {
            slots,
            carved: false,
            revealed: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[WallSlot] {
        &self.slots
    }

    pub fn is_carved(&self) -> bool {
        self.carved
    }

    /// 王牌設定：サイコロの出目から開始位置を決め、14枚を王牌にする
    pub fn carve_dead_wall(&mut self, die1: u8, die2: u8) -> EngineResult<usize> {
        if !(1..=6).contains(&die1) || !(1..=6).contains(&die2) {
            return Err(EngineError::state(format!(
                "dice out of range: {} {}",
                die1, die2
            )));
        }
        if self.carved {
            return Err(EngineError::exhausted(
                Resource::DeadWall,
                "dead wall already carved",
            ));
        }
        let len = self.slots.len();
        if len != WALL_SIZE {
            return Err(EngineError::exhausted(
                Resource::DeadWall,
                format!("cannot carve a {}-slot wall", len),
            ));
        }

        let split = ((die1 as usize + die2 as usize) * 2) % len;
        for i in 0..DEAD_WALL_SIZE {
            self.slots[(split + i) % len].is_dead_wall = true;
        }
        self.carved = true;
        debug!(die1, die2, split, "dead wall carved");
        Ok(split)
    }

    /// Indices of the dead wall in dead-wall order (head first, tail last).
    fn dead_run(&self) -> Vec<usize> {
        let len = self.slots.len();
        if len == 0 {
            return vec![];
        }
        let start = (0..len)
            .find(|&i| self.slots[i].is_dead_wall && !self.slots[(i + len - 1) % len].is_dead_wall)
            .unwrap_or(0);
        (0..len)
            .map(|k| (start + k) % len)
            .take_while(|&i| self.slots[i].is_dead_wall)
            .collect()
    }

    /// 王牌の上段のみ（王牌順）
    fn upper_dead_run(&self) -> Vec<usize> {
        self.dead_run()
            .into_iter()
            .filter(|&i| self.slots[i].is_top)
            .collect()
    }

    pub fn dead_wall(&self) -> Vec<&WallSlot> {
        self.dead_run().into_iter().map(|i| &self.slots[i]).collect()
    }

    pub fn dead_wall_len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_dead_wall).count()
    }

    /// 残り自摸が可能な牌数
    pub fn drawable_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_dead_wall).count()
    }

    /// 初期ドラ：王牌上段の最後尾から3つ目
    pub fn reveal_initial_dora(&mut self) -> EngineResult<Tile> {
        if !self.revealed.is_empty() {
            return Err(EngineError::state("initial dora already revealed"));
        }
        let upper = self.upper_dead_run();
        if upper.len() < 3 {
            return Err(EngineError::exhausted(
                Resource::DoraIndicator,
                format!("{} top-row dead wall slots, need 3", upper.len()),
            ));
        }
        let idx = upper[upper.len() - 3];
        let slot = &mut self.slots[idx];
        slot.is_dora_indicator = true;
        self.revealed.push(slot.position);
        debug!(tile = %slot.tile, position = slot.position, "dora indicator revealed");
        Ok(slot.tile)
    }

    /// 槓ドラ：最後にドラ表示牌になった牌の隣（上段）
    pub fn reveal_kan_dora(&mut self) -> EngineResult<Tile> {
        let upper = self.upper_dead_run();
        let Some(last) = upper.iter().rposition(|&i| self.slots[i].is_indicator()) else {
            return Err(EngineError::state(
                "no dora indicator assigned, cannot add a kan-dora",
            ));
        };
        if self.kan_dora_count() >= MAX_KAN_DORA {
            return Err(EngineError::exhausted(
                Resource::DoraIndicator,
                "all kan-dora indicators revealed",
            ));
        }
        let Some(&idx) = upper.get(last + 1) else {
            return Err(EngineError::exhausted(
                Resource::DoraIndicator,
                "no top-row dead wall slot after the last indicator",
            ));
        };
        let slot = &mut self.slots[idx];
        slot.is_kan_dora_indicator = true;
        self.revealed.push(slot.position);
        debug!(tile = %slot.tile, position = slot.position, "kan-dora indicator revealed");
        Ok(slot.tile)
    }

    pub fn kan_dora_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_kan_dora_indicator).count()
    }

    /// Next slot the draw cursor takes: first live slot after the dead wall's tail.
    fn next_live_index(&self) -> EngineResult<usize> {
        if !self.carved {
            return Err(EngineError::state("dead wall not carved yet"));
        }
        let len = self.slots.len();
        let dead = self.dead_run();
        let start = dead.last().map(|&t| (t + 1) % len).unwrap_or(0);
        (0..len)
            .map(|k| (start + k) % len)
            .find(|&i| !self.slots[i].is_dead_wall)
            .ok_or_else(|| EngineError::exhausted(Resource::LiveWall, "only dead wall tiles remain"))
    }

    /// 自摸牌取得
    pub fn draw_one(&mut self) -> EngineResult<Tile> {
        let idx = self.next_live_index()?;
        let slot = self.slots.remove(idx);
        debug!(tile = %slot.tile, position = slot.position, left = self.drawable_count(), "draw");
        Ok(slot.tile)
    }

    /// 配牌用：all-or-nothing
    pub fn draw_for_deal(&mut self, count: usize) -> EngineResult<Vec<Tile>> {
        if !self.carved {
            return Err(EngineError::state("dead wall not carved yet"));
        }
        let available = self.drawable_count();
        if available < count {
            return Err(EngineError::exhausted(
                Resource::LiveWall,
                format!("asked for {} tiles, {} drawable", count, available),
            ));
        }
        (0..count).map(|_| self.draw_one()).collect()
    }

    /// 嶺上牌の位置：王牌の最後尾から、ドラ表示牌用の上段を飛ばした最初の牌。
    ///
    /// Top-row slots from the initial indicator onward are kept for the
    /// indicator and the kan-dora that follow it.
    fn replacement_index(&self) -> Option<usize> {
        let dead = self.dead_run();
        let first_indicator = dead.iter().position(|&i| self.slots[i].is_indicator());
        dead.iter()
            .enumerate()
            .rev()
            .find(|&(k, &i)| !(self.slots[i].is_top && first_indicator.is_some_and(|f| k >= f)))
            .map(|(_, &i)| i)
    }

    /// 嶺上牌が取れるか（状態は変えない）
    pub fn can_draw_replacement(&self) -> bool {
        self.replacement_index().is_some()
    }

    /// 嶺上自摸
    pub fn draw_replacement(&mut self) -> EngineResult<Tile> {
        if self.dead_wall_len() == 0 {
            return Err(EngineError::exhausted(Resource::DeadWall, "dead wall is empty"));
        }
        let Some(idx) = self.replacement_index() else {
            return Err(EngineError::exhausted(
                Resource::DeadWall,
                "only dora indicator slots remain in the dead wall",
            ));
        };
        let slot = self.slots.remove(idx);
        debug!(tile = %slot.tile, position = slot.position, "replacement draw");
        Ok(slot.tile)
    }

    /// 山牌から王牌へ1枚補充（王牌を14枚に戻す）
    pub fn refill_dead_wall(&mut self) -> EngineResult<()> {
        let idx = self.next_live_index()?;
        self.slots[idx].is_dead_wall = true;
        debug!(position = self.slots[idx].position, dead = self.dead_wall_len(), "dead wall refilled");
        Ok(())
    }

    /// 表示牌（初期ドラ + 槓ドラ、公開順）
    pub fn dora_indicators(&self) -> Vec<Tile> {
        self.revealed
            .iter()
            .filter_map(|&p| self.slots.iter().find(|s| s.position == p))
            .map(|s| s.tile)
            .collect()
    }

    pub fn dora_tiles(&self) -> Vec<Tile> {
        self.dora_indicators()
            .into_iter()
            .map(crate::dora::indicator_to_dora)
            .collect()
    }

    /// 裏ドラ表示牌。
    ///
    /// Bottom-row slots are matched against the indicator slot records
    /// themselves instead of their columns, so nothing ever matches and the
    /// result is always empty. Left as-is until the intended lookup is decided.
    pub fn ura_dora_indicators(&self) -> Vec<Tile> {
        let indicator_slots: Vec<&WallSlot> =
            self.slots.iter().filter(|s| s.is_indicator()).collect();
        self.slots
            .iter()
            .filter(|s| !s.is_top && indicator_slots.iter().any(|d| *d == *s))
            .map(|s| s.tile)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carved(seed: u64, d1: u8, d2: u8) -> TileWall {
        let mut w = TileWall::build(seed);
        w.carve_dead_wall(d1, d2).unwrap();
        w
    }

    #[test]
    fn test_build_has_four_of_each_kind() {
        let w = TileWall::build(7);
        assert_eq!(w.len(), WALL_SIZE);
        let tiles: Vec<Tile> = w.slots().iter().map(|s| s.tile).collect();
        assert!(crate::tile::count_kinds(&tiles).iter().all(|&c| c == 4));
    }

    #[test]
    fn test_same_seed_same_order() {
        let a = TileWall::build(42);
        let b = TileWall::build(42);
        assert_eq!(a.slots(), b.slots());
        let c = TileWall::build(43);
        assert_ne!(a.slots(), c.slots());
    }

    #[test]
    fn test_slot_geometry() {
        let w = TileWall::build(1);
        let s = &w.slots()[35];
        assert_eq!(s.seat, 1);
        assert_eq!(s.column, 0);
        assert!(!s.is_top);
        let s = &w.slots()[135];
        assert_eq!(s.seat, 3);
        assert_eq!(s.column, 16);
    }

    #[test]
    fn test_carve_with_three_and_four() {
        let mut w = TileWall::build(3);
        let split = w.carve_dead_wall(3, 4).unwrap();
        assert_eq!(split, 14);
        for s in w.slots() {
            assert_eq!(s.is_dead_wall, (14..28).contains(&s.position), "pos {}", s.position);
        }
        assert_eq!(w.dead_wall_len(), DEAD_WALL_SIZE);
        assert_eq!(w.drawable_count(), WALL_SIZE - DEAD_WALL_SIZE);
    }

    #[test]
    fn test_carve_rejects_bad_dice_and_second_carve() {
        let mut w = TileWall::build(3);
        assert!(matches!(w.carve_dead_wall(0, 4), Err(EngineError::State { .. })));
        w.carve_dead_wall(1, 1).unwrap();
        assert!(matches!(
            w.carve_dead_wall(1, 1),
            Err(EngineError::ResourceExhausted { .. })
        ));
    }

    #[test]
    fn test_carve_rejects_short_wall() {
        let mut w = carved(3, 3, 4);
        w.draw_one().unwrap();
        w.carved = false;
        assert!(matches!(
            w.carve_dead_wall(3, 4),
            Err(EngineError::ResourceExhausted {
                resource: Resource::DeadWall,
                ..
            })
        ));
    }

    #[test]
    fn test_initial_dora_is_third_from_last_top_slot() {
        let mut w = carved(5, 3, 4);
        let tile = w.reveal_initial_dora().unwrap();
        // 上段: 14,16,..,26 → 後ろから3つ目は 22
        let slot = w.slots().iter().find(|s| s.is_dora_indicator).unwrap();
        assert_eq!(slot.position, 22);
        assert_eq!(slot.tile, tile);
        assert_eq!(w.dora_indicators(), vec![tile]);
        assert_eq!(w.dora_tiles(), vec![tile.dora_successor()]);
        assert!(w.reveal_initial_dora().is_err());
    }

    #[test]
    fn test_kan_dora_follows_previous_indicator() {
        let mut w = carved(5, 3, 4);
        assert!(matches!(w.reveal_kan_dora(), Err(EngineError::State { .. })));
        w.reveal_initial_dora().unwrap();
        w.reveal_kan_dora().unwrap();
        w.reveal_kan_dora().unwrap();
        let kan: Vec<usize> = w
            .slots()
            .iter()
            .filter(|s| s.is_kan_dora_indicator)
            .map(|s| s.position)
            .collect();
        assert_eq!(kan, vec![24, 26]);
        assert!(matches!(
            w.reveal_kan_dora(),
            Err(EngineError::ResourceExhausted {
                resource: Resource::DoraIndicator,
                ..
            })
        ));
        assert_eq!(w.dora_indicators().len(), 3);
    }

    #[test]
    fn test_draws_start_after_dead_wall_and_wrap() {
        let mut w = carved(9, 3, 4);
        let expected: Vec<Tile> = w.slots()[28..].iter().map(|s| s.tile).collect();
        let head: Vec<Tile> = w.slots()[..14].iter().map(|s| s.tile).collect();
        let drawn = w.draw_for_deal(108).unwrap();
        assert_eq!(drawn, expected);
        let rest = w.draw_for_deal(14).unwrap();
        assert_eq!(rest, head);
        assert_eq!(w.drawable_count(), 0);
        assert_eq!(w.len(), DEAD_WALL_SIZE);
        let err = w.draw_one().unwrap_err();
        assert!(err.is_wall_exhausted());
    }

    #[test]
    fn test_draw_for_deal_is_all_or_nothing() {
        let mut w = carved(9, 6, 6);
        w.draw_for_deal(120).unwrap();
        let before = w.len();
        assert!(w.draw_for_deal(3).unwrap_err().is_wall_exhausted());
        assert_eq!(w.len(), before);
    }

    #[test]
    fn test_draw_requires_carving() {
        let mut w = TileWall::build(1);
        assert!(matches!(w.draw_one(), Err(EngineError::State { .. })));
    }

    #[test]
    fn test_replacement_and_refill_keep_dead_wall_size() {
        let mut w = carved(11, 3, 4);
        w.reveal_initial_dora().unwrap();
        let tail = w.slots()[27].tile;
        assert_eq!(w.draw_replacement().unwrap(), tail);
        assert_eq!(w.dead_wall_len(), DEAD_WALL_SIZE - 1);

        let next_live = w.slots()[27].position;
        assert_eq!(next_live, 28);
        w.refill_dead_wall().unwrap();
        assert_eq!(w.dead_wall_len(), DEAD_WALL_SIZE);
        assert_eq!(w.dead_wall().last().unwrap().position, 28);
        assert_eq!(w.len(), WALL_SIZE - 1);

        // draw cursor moved past the refilled slot
        let drawn = w.draw_one().unwrap();
        assert_eq!(drawn, TileWall::build(11).slots()[29].tile);
        assert!(w.slots().iter().all(|s| s.position != 29));
    }

    #[test]
    fn test_replacement_skips_indicator_slots() {
        let mut w = carved(11, 3, 4);
        let at = |p: usize| TileWall::build(11).slots()[p].tile;
        w.reveal_initial_dora().unwrap();
        w.reveal_kan_dora().unwrap();
        w.reveal_kan_dora().unwrap();
        // tail 27 is bottom row: fine
        assert_eq!(w.draw_replacement().unwrap(), at(27));
        // 26 は槓ドラ表示牌なので下段の 25
        assert_eq!(w.draw_replacement().unwrap(), at(25));
        assert_eq!(w.dora_indicators(), vec![at(22), at(24), at(26)]);
    }

    #[test]
    fn test_four_kans_keep_dead_wall_and_reveal_four_kan_dora() {
        let mut w = carved(7, 3, 4);
        w.reveal_initial_dora().unwrap();
        for _ in 0..MAX_KAN_DORA {
            assert!(w.can_draw_replacement());
            w.draw_replacement().unwrap();
            w.refill_dead_wall().unwrap();
            w.reveal_kan_dora().unwrap();
            assert_eq!(w.dead_wall_len(), DEAD_WALL_SIZE);
        }
        assert_eq!(w.kan_dora_count(), MAX_KAN_DORA);
        assert_eq!(w.dora_indicators().len(), 1 + MAX_KAN_DORA);
        let kan: Vec<usize> = w
            .slots()
            .iter()
            .filter(|s| s.is_kan_dora_indicator)
            .map(|s| s.position)
            .collect();
        assert_eq!(kan, vec![24, 26, 28, 30]);
        // 表示牌はすべて王牌に残っている
        assert!(w.slots().iter().filter(|s| s.is_indicator()).all(|s| s.is_dead_wall));
        assert!(w.can_draw_replacement());
    }

    #[test]
    fn test_replacement_unavailable_when_only_indicators_remain() {
        let mut w = carved(6, 3, 4);
        w.reveal_initial_dora().unwrap();
        while w.dead_wall().iter().any(|s| !(s.is_top && s.position >= 22)) {
            w.draw_replacement().unwrap();
        }
        // 上段の 22, 24, 26 だけが残る
        assert_eq!(w.dead_wall_len(), 3);
        assert!(!w.can_draw_replacement());
        let before = w.len();
        assert!(matches!(
            w.draw_replacement(),
            Err(EngineError::ResourceExhausted {
                resource: Resource::DeadWall,
                ..
            })
        ));
        assert_eq!(w.len(), before);
    }

    #[test]
    fn test_replacement_on_empty_dead_wall() {
        let mut w = TileWall::build(2);
        assert!(matches!(
            w.draw_replacement(),
            Err(EngineError::ResourceExhausted {
                resource: Resource::DeadWall,
                ..
            })
        ));
    }

    #[test]
    fn test_refill_fails_without_live_tiles() {
        let mut w = carved(4, 2, 2);
        w.draw_for_deal(122).unwrap();
        w.draw_replacement().unwrap();
        assert!(w.refill_dead_wall().unwrap_err().is_wall_exhausted());
    }

    #[test]
    fn test_ura_dora_lookup_never_matches() {
        let mut w = carved(8, 3, 4);
        w.reveal_initial_dora().unwrap();
        w.reveal_kan_dora().unwrap();
        assert!(w.ura_dora_indicators().is_empty());
    }

    #[test]
    fn test_build_with_tiles_validates_multiset() {
        let mut tiles = sorted_tile_set();
        assert!(TileWall::build_with_tiles(tiles.clone()).is_ok());
        tiles[0] = tiles[135];
        assert!(matches!(
            TileWall::build_with_tiles(tiles),
            Err(EngineError::InvariantViolation { .. })
        ));
        assert!(TileWall::build_with_tiles(vec![]).is_err());
    }
}
