use crate::error::{EngineError, EngineResult};
use crate::tile::{sort_tiles, Tile};
use crate::{Seat, Wind};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawSource {
    /// 自摸
    SelfDraw,
    /// ロン（他家の捨て牌）
    Claimed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawnTile {
    pub tile: Tile,
    pub source: DrawSource,
}

/// 鳴きの種類。`Run` がチー。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeldKind {
    Triplet,
    Run,
    Kan,
}

/// A called (or self-declared) meld. `from` is the seat the tile came from;
/// a concealed kan carries the owner's own seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalledMeld {
    Triplet { tile: Tile, from: Seat },
    Run { tiles: [Tile; 3], from: Seat },
    Kan { tile: Tile, from: Seat },
}

impl CalledMeld {
    pub fn kind(&self) -> MeldKind {
        match self {
            CalledMeld::Triplet { .. } => MeldKind::Triplet,
            CalledMeld::Run { .. } => MeldKind::Run,
            CalledMeld::Kan { .. } => MeldKind::Kan,
        }
    }

    pub fn from(&self) -> Seat {
        match self {
            CalledMeld::Triplet { from, .. }
            | CalledMeld::Run { from, .. }
            | CalledMeld::Kan { from, .. } => *from,
        }
    }

    pub fn tiles(&self) -> Vec<Tile> {
        match self {
            CalledMeld::Triplet { tile, .. } => vec![*tile; 3],
            CalledMeld::Run { tiles, .. } => tiles.to_vec(),
            CalledMeld::Kan { tile, .. } => vec![*tile; 4],
        }
    }

    /// Tile of a triplet or kan; `None` for runs.
    pub fn set_tile(&self) -> Option<Tile> {
        match self {
            CalledMeld::Triplet { tile, .. } | CalledMeld::Kan { tile, .. } => Some(*tile),
            CalledMeld::Run { .. } => None,
        }
    }

    pub fn is_kan(&self) -> bool {
        matches!(self, CalledMeld::Kan { .. })
    }
}

/// A call the hand could make on a discard (see [`PlayerHand::call_options`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeldCandidate {
    pub kind: MeldKind,
    /// 面子全体（鳴いた牌を含む）
    pub tiles: Vec<Tile>,
    pub claimed: Tile,
    pub from: Seat,
}

impl MeldCandidate {
    fn to_meld(&self) -> Option<CalledMeld> {
        match self.kind {
            MeldKind::Triplet => Some(CalledMeld::Triplet {
                tile: self.claimed,
                from: self.from,
            }),
            MeldKind::Kan => Some(CalledMeld::Kan {
                tile: self.claimed,
                from: self.from,
            }),
            MeldKind::Run => {
                let mut tiles: [Tile; 3] = self.tiles.clone().try_into().ok()?;
                tiles.sort();
                Some(CalledMeld::Run {
                    tiles,
                    from: self.from,
                })
            }
        }
    }

    /// Tiles that must come out of the concealed hand.
    fn from_hand(&self) -> Vec<Tile> {
        let mut v = self.tiles.clone();
        if let Some(i) = v.iter().position(|&t| t == self.claimed) {
            v.remove(i);
        }
        v
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerHand {
    seat: Seat,
    seat_wind: Wind,
    /// 手牌（鳴いた面子を除く、常にソート済み）
    concealed: Vec<Tile>,
    drawn: Option<DrawnTile>,
    melds: Vec<CalledMeld>,
    /// リーチしたときの河牌番号
    riichi_lock: Option<u32>,
}

impl PlayerHand {
    pub fn new(seat: Seat, seat_wind: Wind) -> Self {
        PlayerHand {
            seat,
            seat_wind,
            concealed: vec![],
            drawn: None,
            melds: vec![],
            riichi_lock: None,
        }
    }

    /// Builds a hand directly from its parts (fixtures, replays).
    pub fn from_parts(
        seat: Seat,
        seat_wind: Wind,
        concealed: Vec<Tile>,
        drawn: Option<DrawnTile>,
        melds: Vec<CalledMeld>,
        riichi_lock: Option<u32>,
    ) -> Self {
        let mut concealed = concealed;
        sort_tiles(&mut concealed);
        PlayerHand {
            seat,
            seat_wind,
            concealed,
            drawn,
            melds,
            riichi_lock,
        }
    }

    pub fn seat(&self) -> Seat {
        self.seat
    }

    pub fn seat_wind(&self) -> Wind {
        self.seat_wind
    }

    pub fn concealed(&self) -> &[Tile] {
        &self.concealed
    }

    pub fn drawn(&self) -> Option<DrawnTile> {
        self.drawn
    }

    pub fn melds(&self) -> &[CalledMeld] {
        &self.melds
    }

    pub fn riichi_lock(&self) -> Option<u32> {
        self.riichi_lock
    }

    pub fn is_riichi(&self) -> bool {
        self.riichi_lock.is_some()
    }

    pub fn has_melds(&self) -> bool {
        !self.melds.is_empty()
    }

    /// 門前でない：チー・ポン・明槓がある（暗槓は門前のまま）
    pub fn is_open(&self) -> bool {
        self.melds
            .iter()
            .any(|m| !(m.is_kan() && m.from() == self.seat))
    }

    pub fn is_self_draw(&self) -> bool {
        matches!(
            self.drawn,
            Some(DrawnTile {
                source: DrawSource::SelfDraw,
                ..
            })
        )
    }

    /// 手牌 + 追加牌
    pub fn closed_tiles(&self) -> Vec<Tile> {
        let mut v = self.concealed.clone();
        if let Some(d) = self.drawn {
            v.push(d.tile);
        }
        v
    }

    /// 手牌 + 追加牌 + 鳴き牌
    pub fn all_tiles(&self) -> Vec<Tile> {
        let mut v = self.closed_tiles();
        for m in &self.melds {
            v.extend(m.tiles());
        }
        v
    }

    /// concealed + 3 × melds + drawn; 13 between turns, 14 with a drawn tile.
    pub fn size_units(&self) -> usize {
        self.concealed.len() + 3 * self.melds.len() + usize::from(self.drawn.is_some())
    }

    /// Physical tiles held, kan counted as four.
    pub fn physical_count(&self) -> usize {
        self.concealed.len()
            + usize::from(self.drawn.is_some())
            + self.melds.iter().map(|m| m.tiles().len()).sum::<usize>()
    }

    pub fn clear(&mut self) {
        self.concealed.clear();
        self.drawn = None;
        self.melds.clear();
        self.riichi_lock = None;
    }

    /// 初期配牌として牌を手牌に追加
    pub fn add_tiles(&mut self, tiles: &[Tile]) {
        self.concealed.extend_from_slice(tiles);
        sort_tiles(&mut self.concealed);
    }

    /// 牌を引く（追加牌として保持）
    pub fn record_draw(&mut self, tile: Tile) -> EngineResult<()> {
        self.set_drawn(tile, DrawSource::SelfDraw)
    }

    /// ロン牌を追加牌として保持
    pub fn record_claim(&mut self, tile: Tile) -> EngineResult<()> {
        self.set_drawn(tile, DrawSource::Claimed)
    }

    fn set_drawn(&mut self, tile: Tile, source: DrawSource) -> EngineResult<()> {
        if let Some(d) = self.drawn {
            return Err(EngineError::state(format!(
                "player {} already holds drawn tile {}",
                self.seat, d.tile
            )));
        }
        self.drawn = Some(DrawnTile { tile, source });
        debug!(seat = self.seat, tile = %tile, ?source, "tile added");
        Ok(())
    }

    /// 自摸牌を手牌に入れる
    pub fn merge_drawn(&mut self) {
        if let Some(d) = self.drawn.take() {
            self.concealed.push(d.tile);
            sort_tiles(&mut self.concealed);
        }
    }

    /// 牌を捨てる。`from_drawn` なら追加牌から、そうでなければ手牌から。
    pub fn discard(&mut self, tile: Tile, from_drawn: bool) -> EngineResult<Tile> {
        if from_drawn {
            match self.drawn {
                Some(DrawnTile {
                    tile: d,
                    source: DrawSource::SelfDraw,
                }) if d == tile => {
                    self.drawn = None;
                }
                _ => {
                    warn!(seat = self.seat, tile = %tile, "discard does not match drawn tile");
                    return Err(EngineError::state(format!(
                        "player {} has no drawn {}",
                        self.seat, tile
                    )));
                }
            }
        } else {
            if self.riichi_lock.is_some() {
                return Err(EngineError::state(format!(
                    "player {} is in riichi and may only discard the drawn tile",
                    self.seat
                )));
            }
            if matches!(self.drawn, Some(d) if d.source == DrawSource::Claimed) {
                return Err(EngineError::state("a claimed win tile cannot be discarded"));
            }
            let Some(i) = self.concealed.iter().position(|&t| t == tile) else {
                warn!(seat = self.seat, tile = %tile, "discard of a tile not in hand");
                return Err(EngineError::state(format!(
                    "{} is not in player {}'s hand",
                    tile, self.seat
                )));
            };
            self.concealed.remove(i);
            self.merge_drawn();
        }
        debug!(seat = self.seat, tile = %tile, from_drawn, "discarded");
        Ok(tile)
    }

    /// リーチ：門前でのみ、一度だけ
    pub fn set_riichi_lock(&mut self, seq: u32) -> EngineResult<()> {
        self.check_riichi()?;
        self.riichi_lock = Some(seq);
        Ok(())
    }

    pub fn check_riichi(&self) -> EngineResult<()> {
        if self.riichi_lock.is_some() {
            return Err(EngineError::state(format!(
                "player {} already declared riichi",
                self.seat
            )));
        }
        if self.is_open() {
            return Err(EngineError::state(format!(
                "player {} has an open hand and cannot declare riichi",
                self.seat
            )));
        }
        Ok(())
    }

    /// 手牌から鳴けるかを判定し、可能な面子候補を返す。
    /// `is_left_player`: 上家の捨て牌ならチーも候補に入る。
    pub fn call_options(
        &self,
        discard: Tile,
        from: Seat,
        is_left_player: bool,
    ) -> Vec<MeldCandidate> {
        let mut out = vec![];
        if self.riichi_lock.is_some() || from == self.seat {
            return out;
        }

        let held = self.concealed.iter().filter(|&&t| t == discard).count();
        if held >= 2 {
            out.push(MeldCandidate {
                kind: MeldKind::Triplet,
                tiles: vec![discard; 3],
                claimed: discard,
                from,
            });
        }
        if held == 3 {
            out.push(MeldCandidate {
                kind: MeldKind::Kan,
                tiles: vec![discard; 4],
                claimed: discard,
                from,
            });
        }

        if is_left_player && !discard.is_honor() {
            let shapes = [
                (discard.prev().and_then(|p| p.prev()), discard.prev()),
                (discard.prev(), discard.next()),
                (discard.next(), discard.next2()),
            ];
            for (a, b) in shapes {
                let (Some(a), Some(b)) = (a, b) else {
                    continue;
                };
                if self.concealed.contains(&a) && self.concealed.contains(&b) {
                    let mut tiles = vec![a, discard, b];
                    tiles.sort();
                    out.push(MeldCandidate {
                        kind: MeldKind::Run,
                        tiles,
                        claimed: discard,
                        from,
                    });
                }
            }
        }
        out
    }

    /// 鳴きを実行する（捨て牌以外の牌を手牌から抜く）
    pub fn form_meld(&mut self, candidate: &MeldCandidate) -> EngineResult<()> {
        let Some(meld) = candidate.to_meld() else {
            return Err(EngineError::state(format!(
                "malformed {:?} call: {:?}",
                candidate.kind, candidate.tiles
            )));
        };
        let mut rest = self.concealed.clone();
        for t in candidate.from_hand() {
            let Some(i) = rest.iter().position(|&x| x == t) else {
                return Err(EngineError::state(format!(
                    "player {} lacks {} for the call",
                    self.seat, t
                )));
            };
            rest.remove(i);
        }
        self.concealed = rest;
        debug!(seat = self.seat, kind = ?candidate.kind, from = candidate.from, "meld formed");
        self.melds.push(meld);
        Ok(())
    }

    /// 暗槓できるか：手牌 + 自摸牌に4枚そろっていること（状態は変えない）
    pub fn check_concealed_kan(&self, tile: Tile) -> EngineResult<()> {
        let drawn = usize::from(self.is_self_draw() && self.drawn.map(|d| d.tile) == Some(tile));
        let held = self.concealed.iter().filter(|&&t| t == tile).count() + drawn;
        if held != 4 {
            return Err(EngineError::state(format!(
                "player {} holds {} of {}, needs 4",
                self.seat, held, tile
            )));
        }
        Ok(())
    }

    pub fn declare_concealed_kan(&mut self, tile: Tile) -> EngineResult<()> {
        self.check_concealed_kan(tile)?;
        if self.is_self_draw() {
            self.merge_drawn();
        }
        self.concealed.retain(|&t| t != tile);
        self.melds.push(CalledMeld::Kan {
            tile,
            from: self.seat,
        });
        debug!(seat = self.seat, tile = %tile, "concealed kan");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::parse_tiles;

    fn t(code: &str) -> Tile {
        Tile::from_code(code).unwrap()
    }

    fn hand(codes: &str) -> PlayerHand {
        let mut h = PlayerHand::new(0, Wind::E);
        h.add_tiles(&parse_tiles(codes).unwrap());
        h
    }

    #[test]
    fn test_add_tiles_keeps_sorted() {
        let h = hand("E 3m 1p 1m");
        let codes: Vec<String> = h.concealed().iter().map(|t| t.to_string()).collect();
        assert_eq!(codes, vec!["1m", "3m", "1p", "E"]);
    }

    #[test]
    fn test_draw_then_discard_from_hand_merges_drawn() {
        let mut h = hand("1m 2m 3m 4m 5m 6m 7m 8m 9m 1p 2p 3p E");
        h.record_draw(t("S")).unwrap();
        assert_eq!(h.size_units(), 14);
        assert!(h.record_draw(t("W")).is_err());
        h.discard(t("E"), false).unwrap();
        assert!(h.drawn().is_none());
        assert!(h.concealed().contains(&t("S")));
        assert_eq!(h.size_units(), 13);
    }

    #[test]
    fn test_discard_drawn_tile() {
        let mut h = hand("1m 2m 3m");
        h.record_draw(t("9s")).unwrap();
        assert!(h.discard(t("8s"), true).is_err());
        h.discard(t("9s"), true).unwrap();
        assert!(h.drawn().is_none());
        assert_eq!(h.concealed().len(), 3);
    }

    #[test]
    fn test_discard_missing_tile_is_state_error() {
        let mut h = hand("1m 2m 3m");
        let err = h.discard(t("C"), false).unwrap_err();
        assert!(matches!(err, EngineError::State { .. }));
        assert_eq!(h.concealed().len(), 3);
    }

    #[test]
    fn test_riichi_locks_hand_discards() {
        let mut h = hand("1m 2m 3m");
        h.set_riichi_lock(5).unwrap();
        assert!(h.set_riichi_lock(6).is_err());
        h.record_draw(t("E")).unwrap();
        assert!(h.discard(t("1m"), false).is_err());
        h.discard(t("E"), true).unwrap();
        assert_eq!(h.riichi_lock(), Some(5));
    }

    #[test]
    fn test_call_options_pon_kan_chi() {
        let h = hand("3m 4m 5m 5m 5m 6m 7m E E S W N C");
        let pon = h.call_options(t("5m"), 3, false);
        let kinds: Vec<MeldKind> = pon.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![MeldKind::Triplet, MeldKind::Kan]);

        let chi = h.call_options(t("5m"), 3, true);
        let runs: Vec<Vec<String>> = chi
            .iter()
            .filter(|c| c.kind == MeldKind::Run)
            .map(|c| c.tiles.iter().map(|x| x.to_string()).collect())
            .collect();
        assert_eq!(
            runs,
            vec![
                vec!["3m", "4m", "5m"],
                vec!["4m", "5m", "6m"],
                vec!["5m", "6m", "7m"]
            ]
        );

        assert!(h.call_options(t("E"), 1, true).iter().all(|c| c.kind != MeldKind::Run));
        assert!(h.call_options(t("5m"), 0, true).is_empty());
    }

    #[test]
    fn test_form_meld_removes_hand_tiles() {
        let mut h = hand("4m 6m E E S W N C P F 1p 2p 3p");
        let cands = h.call_options(t("5m"), 3, true);
        assert_eq!(cands.len(), 1);
        h.form_meld(&cands[0]).unwrap();
        assert_eq!(h.concealed().len(), 11);
        assert_eq!(h.melds()[0].kind(), MeldKind::Run);
        assert_eq!(h.melds()[0].from(), 3);
        assert!(h.is_open());
        assert_eq!(h.size_units(), 14);
        assert!(h.set_riichi_lock(1).is_err());
    }

    #[test]
    fn test_form_meld_without_tiles_fails_cleanly() {
        let mut h = hand("E 1m");
        let bogus = MeldCandidate {
            kind: MeldKind::Triplet,
            tiles: vec![t("9p"); 3],
            claimed: t("9p"),
            from: 1,
        };
        assert!(h.form_meld(&bogus).is_err());
        assert_eq!(h.concealed().len(), 2);
        assert!(h.melds().is_empty());
    }

    #[test]
    fn test_concealed_kan_uses_drawn_tile() {
        let mut h = hand("7p 7p 7p 1m 2m 3m");
        h.record_draw(t("7p")).unwrap();
        h.declare_concealed_kan(t("7p")).unwrap();
        assert!(h.drawn().is_none());
        assert_eq!(h.concealed().len(), 3);
        assert!(!h.is_open());
        assert_eq!(h.physical_count(), 7);
        assert!(h.declare_concealed_kan(t("1m")).is_err());
    }

    #[test]
    fn test_rejected_concealed_kan_keeps_drawn_tile() {
        let mut h = hand("1m 1m 1m 2p 3p 4p 6s 7s 8s 9s 9s E E");
        h.set_riichi_lock(4).unwrap();
        h.record_draw(t("5s")).unwrap();
        let err = h.declare_concealed_kan(t("1m")).unwrap_err();
        assert!(matches!(err, EngineError::State { .. }));
        assert_eq!(h.drawn().map(|d| d.tile), Some(t("5s")));
        assert_eq!(h.concealed().len(), 13);
        assert!(h.melds().is_empty());
        // リーチ中でも自摸切りはできる
        h.discard(t("5s"), true).unwrap();
        assert_eq!(h.size_units(), 13);
    }

    #[test]
    fn test_claimed_tile_does_not_complete_concealed_kan() {
        let mut h = hand("E E E 1m");
        h.record_claim(t("E")).unwrap();
        assert!(h.check_concealed_kan(t("E")).is_err());
        assert!(h.declare_concealed_kan(t("E")).is_err());
        assert!(h.drawn().is_some());
        assert_eq!(h.concealed().len(), 4);
    }

    #[test]
    fn test_all_tiles_includes_melds() {
        let h = PlayerHand::from_parts(
            1,
            Wind::S,
            parse_tiles("1m 1m").unwrap(),
            Some(DrawnTile {
                tile: t("1m"),
                source: DrawSource::Claimed,
            }),
            vec![CalledMeld::Kan { tile: t("E"), from: 3 }],
            None,
        );
        assert_eq!(h.all_tiles().len(), 7);
        assert_eq!(h.closed_tiles().len(), 3);
        assert!(!h.is_self_draw());
    }
}
