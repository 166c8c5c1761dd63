//! 1局分の状態（牌山・河・4人の手牌）をまとめて扱う。
//!
//! Every mutation goes through [`Match`] so the 136-tile census can be
//! checked after each step.

use crate::config::RuleConfig;
use crate::decompose::{decompose_with_melds_needed, is_seven_pairs, is_thirteen_orphans_shape};
use crate::dora::count_dora_from_indicators;
use crate::error::{EngineError, EngineResult, Resource};
use crate::hand::{MeldCandidate, MeldKind, PlayerHand};
use crate::river::{ClaimKind, DiscardRiver};
use crate::score::{ScoreAggregator, ScoreOutcome};
use crate::tile::{count_kinds, Tile};
use crate::wall::{TileWall, WALL_SIZE};
use crate::{Seat, TurnContext, WinContext, Wind, PLAYER_MAX};
use tracing::{debug, info, warn};

/// 配牌：4枚ずつ3周、最後に1枚ずつ
const DEAL_ROUNDS: usize = 3;
const DEAL_CHUNK: usize = 4;

#[derive(Debug, Clone)]
pub struct Match {
    wall: TileWall,
    river: DiscardRiver,
    hands: [PlayerHand; PLAYER_MAX],
    dealer: Seat,
    round_wind: Wind,
    rules: RuleConfig,
}

fn check_seat(seat: Seat) -> EngineResult<()> {
    if seat >= PLAYER_MAX {
        return Err(EngineError::state(format!("no such seat: {}", seat)));
    }
    Ok(())
}

impl Match {
    pub fn new(seed: u64, dealer: Seat, rules: RuleConfig) -> EngineResult<Self> {
        Self::with_wall(TileWall::build(seed), dealer, rules)
    }

    /// 牌山を外から与える（牌譜の再現など）
    pub fn with_wall(wall: TileWall, dealer: Seat, rules: RuleConfig) -> EngineResult<Self> {
        check_seat(dealer)?;
        let hands = std::array::from_fn(|seat| PlayerHand::new(seat, Wind::for_seat(seat, dealer)));
        Ok(Match {
            wall,
            river: DiscardRiver::new(),
            hands,
            dealer,
            round_wind: Wind::E,
            rules,
        })
    }

    pub fn set_round_wind(&mut self, wind: Wind) {
        self.round_wind = wind;
    }

    pub fn wall(&self) -> &TileWall {
        &self.wall
    }

    pub fn river(&self) -> &DiscardRiver {
        &self.river
    }

    pub fn hand(&self, seat: Seat) -> Option<&PlayerHand> {
        self.hands.get(seat)
    }

    pub fn dealer(&self) -> Seat {
        self.dealer
    }

    pub fn round_wind(&self) -> Wind {
        self.round_wind
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    fn hand_mut(&mut self, seat: Seat) -> EngineResult<&mut PlayerHand> {
        check_seat(seat)?;
        Ok(&mut self.hands[seat])
    }

    /// 手牌枚数（手牌 + 3×面子 + 自摸牌）が `units` であること
    fn check_size(&self, seat: Seat, units: usize, action: &str) -> EngineResult<()> {
        check_seat(seat)?;
        let held = self.hands[seat].size_units();
        if held != units {
            warn!(seat, held, units, action, "hand size does not allow the action");
            return Err(EngineError::state(format!(
                "player {} holds {} tiles, needs {} to {}",
                seat, held, units, action
            )));
        }
        Ok(())
    }

    fn check_replacement(&self) -> EngineResult<()> {
        if !self.wall.can_draw_replacement() {
            return Err(EngineError::exhausted(
                Resource::DeadWall,
                "no replacement tile left for a kan",
            ));
        }
        Ok(())
    }

    /// 王牌を切り出し、ドラ表示牌をめくって配牌する。ドラ表示牌を返す。
    pub fn setup(&mut self, die1: u8, die2: u8) -> EngineResult<Tile> {
        self.wall.carve_dead_wall(die1, die2)?;
        let indicator = self.wall.reveal_initial_dora()?;

        let order: Vec<Seat> = (0..PLAYER_MAX)
            .map(|k| (self.dealer + k) % PLAYER_MAX)
            .collect();
        for _ in 0..DEAL_ROUNDS {
            for &seat in &order {
                let tiles = self.wall.draw_for_deal(DEAL_CHUNK)?;
                self.hands[seat].add_tiles(&tiles);
            }
        }
        for &seat in &order {
            let tiles = self.wall.draw_for_deal(1)?;
            self.hands[seat].add_tiles(&tiles);
        }

        self.check_invariants()?;
        info!(
            dealer = self.dealer,
            dora_indicator = %indicator,
            drawable = self.wall.drawable_count(),
            "match set up"
        );
        Ok(indicator)
    }

    /// 自摸。山が尽きたら `Ok(None)`（流局）
    pub fn draw(&mut self, seat: Seat) -> EngineResult<Option<Tile>> {
        if self.hand_mut(seat)?.drawn().is_some() {
            return Err(EngineError::state(format!(
                "player {} already holds a drawn tile",
                seat
            )));
        }
        self.check_size(seat, 13, "draw")?;
        let tile = match self.wall.draw_one() {
            Ok(t) => t,
            Err(e) if e.is_wall_exhausted() => {
                info!(seat, "live wall exhausted, drawn game");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        self.hands[seat].record_draw(tile)?;
        Ok(Some(tile))
    }

    /// 打牌。河牌番号を返す。
    pub fn discard(&mut self, seat: Seat, tile: Tile, from_drawn: bool) -> EngineResult<u32> {
        self.check_size(seat, 14, "discard")?;
        self.hands[seat].discard(tile, from_drawn)?;
        Ok(self.river.append(seat, tile))
    }

    /// 打牌直後のリーチ宣言
    pub fn declare_riichi(&mut self, seat: Seat) -> EngineResult<u32> {
        self.hand_mut(seat)?.check_riichi()?;
        let seq = self.river.mark_riichi(seat)?;
        self.hands[seat].set_riichi_lock(seq)?;
        info!(seat, seq, "riichi");
        Ok(seq)
    }

    /// 最新の捨て牌に対して `claimer` が可能な鳴き
    pub fn call_options(&self, claimer: Seat) -> Vec<MeldCandidate> {
        let Some(hand) = self.hands.get(claimer) else {
            return vec![];
        };
        let Some(last) = self.river.last() else {
            return vec![];
        };
        if last.claimed_by.is_some() || last.owner == claimer || hand.drawn().is_some() {
            return vec![];
        }
        // 上家（直前の手番）の捨て牌ならチーも可能
        let is_left = (last.owner + 1) % PLAYER_MAX == claimer;
        hand.call_options(last.tile, last.owner, is_left)
    }

    /// 鳴きを実行する。大明槓なら嶺上牌を返す。
    pub fn call(&mut self, claimer: Seat, candidate: &MeldCandidate) -> EngineResult<Option<Tile>> {
        check_seat(claimer)?;
        if !self.call_options(claimer).contains(candidate) {
            warn!(claimer, kind = ?candidate.kind, "call not available");
            return Err(EngineError::state(format!(
                "player {} cannot make that call",
                claimer
            )));
        }
        let claim = match candidate.kind {
            MeldKind::Run => ClaimKind::Chi,
            MeldKind::Triplet => ClaimKind::Pon,
            MeldKind::Kan => ClaimKind::Kan,
        };
        if candidate.kind == MeldKind::Kan {
            self.check_replacement()?;
        }
        self.hands[claimer].form_meld(candidate)?;
        self.river.annotate_call(claimer, claim)?;
        info!(claimer, ?claim, tile = %candidate.claimed, "call");

        if candidate.kind == MeldKind::Kan {
            let replacement = self.kan_draw(claimer)?;
            return Ok(Some(replacement));
        }
        Ok(None)
    }

    /// 暗槓。嶺上牌を返す。
    pub fn declare_concealed_kan(&mut self, seat: Seat, tile: Tile) -> EngineResult<Tile> {
        self.check_size(seat, 14, "declare a concealed kan")?;
        self.hands[seat].check_concealed_kan(tile)?;
        self.check_replacement()?;
        self.hands[seat].declare_concealed_kan(tile)?;
        info!(seat, tile = %tile, "concealed kan");
        self.kan_draw(seat)
    }

    /// 嶺上自摸 → 王牌補充 → 槓ドラ
    fn kan_draw(&mut self, seat: Seat) -> EngineResult<Tile> {
        let tile = self.wall.draw_replacement()?;
        self.hands[seat].record_draw(tile)?;

        match self.wall.refill_dead_wall() {
            Ok(()) => {}
            Err(e) if e.is_wall_exhausted() => {
                warn!(seat, "no live tile left to refill the dead wall");
            }
            Err(e) => return Err(e),
        }

        match self.wall.reveal_kan_dora() {
            Ok(ind) => debug!(seat, indicator = %ind, "kan-dora revealed"),
            Err(EngineError::ResourceExhausted {
                resource: Resource::DoraIndicator,
                message,
            }) => {
                warn!(seat, reason = %message, "kan-dora not revealed");
            }
            Err(e) => return Err(e),
        }
        Ok(tile)
    }

    /// 和了形か（通常形・七対子・国士無双）
    fn is_complete(hand: &PlayerHand) -> bool {
        let closed = hand.closed_tiles();
        let needed = 4usize.saturating_sub(hand.melds().len());
        if !decompose_with_melds_needed(&closed, needed).is_empty() {
            return true;
        }
        !hand.has_melds() && (is_seven_pairs(&closed) || is_thirteen_orphans_shape(&closed))
    }

    /// ツモ和了
    pub fn declare_tsumo(
        &self,
        seat: Seat,
        turn: TurnContext,
        post_kan: bool,
    ) -> EngineResult<ScoreOutcome> {
        check_seat(seat)?;
        let hand = &self.hands[seat];
        if !hand.is_self_draw() {
            return Err(EngineError::state(format!(
                "player {} has no self-drawn tile to win on",
                seat
            )));
        }
        if !Self::is_complete(hand) {
            warn!(seat, "tsumo declared on an incomplete hand");
            return Err(EngineError::state(format!(
                "player {}'s hand is not complete",
                seat
            )));
        }
        let win = WinContext {
            is_self_draw: true,
            is_discard_win: false,
            is_post_kan_draw: post_kan,
            round_wind: self.round_wind,
        };
        let outcome = ScoreAggregator::new(&self.rules).evaluate(hand, Some(&self.wall), turn, win);
        info!(seat, fan = outcome.fan, names = ?outcome.names(), "tsumo");
        Ok(outcome)
    }

    /// ロン和了（最新の捨て牌で）
    pub fn declare_ron(&mut self, seat: Seat, turn: TurnContext) -> EngineResult<ScoreOutcome> {
        check_seat(seat)?;
        let Some(last) = self.river.last() else {
            return Err(EngineError::state("no discard to win on"));
        };
        let tile = last.tile;

        let mut hand = self.hands[seat].clone();
        hand.record_claim(tile)?;
        if !Self::is_complete(&hand) {
            warn!(seat, tile = %tile, "ron declared on an incomplete hand");
            return Err(EngineError::state(format!(
                "{} does not complete player {}'s hand",
                tile, seat
            )));
        }

        let mut river = self.river.clone();
        river.annotate_call(seat, ClaimKind::Ron)?;
        if river.is_illegal_win(seat, hand.riichi_lock(), tile) {
            warn!(seat, tile = %tile, "furiten");
            return Err(EngineError::state(format!(
                "player {} is furiten on {}",
                seat, tile
            )));
        }

        self.hands[seat] = hand;
        self.river = river;
        let win = WinContext {
            is_self_draw: false,
            is_discard_win: true,
            is_post_kan_draw: false,
            round_wind: self.round_wind,
        };
        let outcome = ScoreAggregator::new(&self.rules).evaluate(
            &self.hands[seat],
            Some(&self.wall),
            turn,
            win,
        );
        info!(seat, fan = outcome.fan, names = ?outcome.names(), "ron");
        Ok(outcome)
    }

    /// 山 + 手牌 + 河 + 鳴き牌の総数
    pub fn tile_census(&self) -> usize {
        self.wall.len()
            + self.hands.iter().map(PlayerHand::physical_count).sum::<usize>()
            + self.river.unclaimed_count()
    }

    fn kind_census(&self) -> [u8; Tile::KINDS] {
        let mut tiles: Vec<Tile> = self.wall.slots().iter().map(|s| s.tile).collect();
        for h in &self.hands {
            tiles.extend(h.all_tiles());
        }
        tiles.extend(
            self.river
                .entries()
                .iter()
                .filter(|e| e.claimed_by.is_none())
                .map(|e| e.tile),
        );
        count_kinds(&tiles)
    }

    /// 136枚の保存則と各牌4枚以下
    pub fn check_invariants(&self) -> EngineResult<()> {
        let census = self.tile_census();
        if census != WALL_SIZE {
            return Err(EngineError::invariant(format!(
                "tile census is {}, expected {}",
                census, WALL_SIZE
            )));
        }
        let counts = self.kind_census();
        if let Some(idx) = counts.iter().position(|&c| c as usize > Tile::COPIES) {
            return Err(EngineError::invariant(format!(
                "{} copies of {}",
                counts[idx],
                Tile::from_index(idx).map(|t| t.to_string()).unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// 手牌（鳴き含む）のドラ枚数
    pub fn dora_count(&self, seat: Seat) -> u32 {
        self.hands
            .get(seat)
            .map(|h| count_dora_from_indicators(&h.all_tiles(), &self.wall.dora_indicators()))
            .unwrap_or(0)
    }
}
