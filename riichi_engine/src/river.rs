use crate::error::{EngineError, EngineResult};
use crate::tile::Tile;
use crate::Seat;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 鳴きの種類（捨て牌側の記録）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimKind {
    Chi,
    Pon,
    Kan,
    Ron,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardEntry {
    pub tile: Tile,
    pub owner: Seat,
    /// 河牌番号（1始まり、単調増加）
    pub seq: u32,
    pub claimed_by: Option<Seat>,
    pub claim_kind: Option<ClaimKind>,
    pub riichi: bool,
}

/// 河：全員分の捨て牌を打牌順に保持する
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscardRiver {
    entries: Vec<DiscardEntry>,
    last_seq: u32,
}

impl DiscardRiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, owner: Seat, tile: Tile) -> u32 {
        self.last_seq += 1;
        self.entries.push(DiscardEntry {
            tile,
            owner,
            seq: self.last_seq,
            claimed_by: None,
            claim_kind: None,
            riichi: false,
        });
        debug!(owner, tile = %tile, seq = self.last_seq, "discard");
        self.last_seq
    }

    pub fn last(&self) -> Option<&DiscardEntry> {
        self.entries.last()
    }

    pub fn entries(&self) -> &[DiscardEntry] {
        &self.entries
    }

    pub fn entries_of(&self, owner: Seat) -> impl Iterator<Item = &DiscardEntry> + '_ {
        self.entries.iter().filter(move |e| e.owner == owner)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discards still lying in the river (not taken into someone's meld or win).
    pub fn unclaimed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.claimed_by.is_none()).count()
    }

    /// 最新の河牌にリーチフラグを付与し、その河牌番号を返す
    pub fn mark_riichi(&mut self, player: Seat) -> EngineResult<u32> {
        if self.entries.iter().any(|e| e.owner == player && e.riichi) {
            warn!(player, "riichi already declared");
            return Err(EngineError::state(format!(
                "player {} already has a riichi discard",
                player
            )));
        }
        let Some(last) = self.entries.last_mut() else {
            warn!(player, "riichi with an empty river");
            return Err(EngineError::state("river is empty"));
        };
        if last.owner != player {
            warn!(player, owner = last.owner, "riichi on someone else's discard");
            return Err(EngineError::state(format!(
                "latest discard belongs to player {}, not {}",
                last.owner, player
            )));
        }
        last.riichi = true;
        Ok(last.seq)
    }

    /// 最新の河牌に鳴き情報を記録する（自分の捨て牌は鳴けない）
    pub fn annotate_call(&mut self, claimer: Seat, kind: ClaimKind) -> EngineResult<&DiscardEntry> {
        let Some(last) = self.entries.last_mut() else {
            return Err(EngineError::state("river is empty"));
        };
        if last.owner == claimer {
            warn!(claimer, "call on own discard");
            return Err(EngineError::state(format!(
                "player {} cannot call their own discard",
                claimer
            )));
        }
        if let Some(by) = last.claimed_by {
            return Err(EngineError::state(format!(
                "discard {} already claimed by player {}",
                last.seq, by
            )));
        }
        last.claimed_by = Some(claimer);
        last.claim_kind = Some(kind);
        debug!(claimer, ?kind, seq = last.seq, "discard claimed");
        Ok(last)
    }

    /// チョンボ牌チェック
    ///
    /// Other players' discards made before `riichi_lock` are ignored; every
    /// other entry, including all of the player's own, makes `tile` illegal
    /// to win on. The discard the player is currently winning on (claimed by
    /// them as a ron) is not counted against them.
    pub fn is_illegal_win(&self, player: Seat, riichi_lock: Option<u32>, tile: Tile) -> bool {
        for e in &self.entries {
            if e.claimed_by == Some(player) && e.claim_kind == Some(ClaimKind::Ron) {
                continue;
            }
            if e.owner != player {
                if let Some(lock) = riichi_lock {
                    if e.seq < lock {
                        continue;
                    }
                }
            }
            if e.tile == tile {
                return true;
            }
        }
        false
    }
}
