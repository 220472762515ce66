use grotto_chunk::entity::{CHEST, CRAB_NETTED};
use grotto_chunk::{ChunkGrid, EntityKind};
use grotto_geom::Vec3;

use crate::config::Pickup;
use crate::nets::NetManager;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PickupReport {
    pub chests: usize,
    pub crabs: usize,
}

impl PickupReport {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chests == 0 && self.crabs == 0
    }
}

/// Player collection of chests and netted crabs, with the running score.
#[derive(Clone, Debug, Default)]
pub struct Pickups {
    cfg: Pickup,
    score: u64,
}

impl Pickups {
    pub fn new(cfg: &Pickup) -> Self {
        Self {
            cfg: cfg.clone(),
            score: 0,
        }
    }

    #[inline]
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Removes every chest and netted crab the player overlaps, releasing the
    /// nets that held those crabs.
    pub fn collect(&mut self, player: Vec3, grid: &mut ChunkGrid, nets: &mut NetManager) -> PickupReport {
        let chest_reach = self.cfg.player_size + self.cfg.chest_radius;
        let crab_reach = self.cfg.player_size + self.cfg.crab_radius;
        let (chest_sq, crab_sq) = (chest_reach * chest_reach, crab_reach * crab_reach);

        let chunks: Vec<_> = grid.surrounding_chunks(player.x, player.z).collect();
        let mut report = PickupReport::default();
        for c in chunks {
            let taken = grid.drain_chunk_where(c, |e| {
                let d = (e.position - player).length_sq();
                match e.kind {
                    EntityKind::Chest => e.has_tag(CHEST) && d < chest_sq,
                    EntityKind::NettedCrab => e.has_tag(CRAB_NETTED) && d < crab_sq,
                    _ => false,
                }
            });
            for e in taken {
                if matches!(e.kind, EntityKind::NettedCrab) {
                    nets.remove_net_with_crab(e.key());
                    report.crabs += 1;
                    self.score += u64::from(self.cfg.crab_score);
                } else {
                    report.chests += 1;
                    self.score += u64::from(self.cfg.chest_score);
                }
            }
        }
        if !report.is_empty() {
            log::info!(
                target: "sim",
                "picked up {} chest(s), {} crab(s); score {}",
                report.chests,
                report.crabs,
                self.score
            );
        }
        report
    }
}
