use serde::{Deserialize, Serialize};
use xdag_hashes::Hash;

/// Aggregate chain statistics, persisted by the block store and merged
/// with the figures remote peers advertise.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XdagStats {
    pub difficulty: u128,
    pub max_difficulty: u128,
    pub n_blocks: u64,
    pub total_n_blocks: u64,
    pub n_main: u64,
    pub total_n_main: u64,
    pub n_hosts: u32,
    pub total_n_hosts: u32,
    pub n_wait_sync: u64,
    pub n_no_ref: u64,
    pub n_extra: u64,
    pub main_time: u64,
    pub balance: u64,
    pub global_miner: Option<Hash>,
    pub our_last_block_hash: Option<Hash>,
}

impl XdagStats {
    /// Folds in a remote peer's advertised totals. Totals only ever grow;
    /// local-only counters are left untouched.
    pub fn update(&mut self, remote: &XdagStats) {
        self.total_n_hosts = self.total_n_hosts.max(remote.total_n_hosts);
        self.total_n_blocks = self.total_n_blocks.max(remote.n_blocks);
        self.total_n_main = self.total_n_main.max(remote.total_n_main);
        self.max_difficulty = self.max_difficulty.max(remote.max_difficulty);
    }
}

/// The current DAG tip and its accumulated difficulty, plus the previous
/// candidate used while the next main block is still contested.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XdagTopStatus {
    pub top: Option<Hash>,
    pub top_diff: u128,
    pub pre_top: Option<Hash>,
    pub pre_top_diff: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_takes_maxima() {
        let mut local = XdagStats { total_n_blocks: 10, total_n_main: 5, total_n_hosts: 2, max_difficulty: 100, ..Default::default() };
        let remote = XdagStats { n_blocks: 50, total_n_main: 3, total_n_hosts: 9, max_difficulty: 70, ..Default::default() };
        local.update(&remote);
        assert_eq!(local.total_n_blocks, 50);
        assert_eq!(local.total_n_main, 5);
        assert_eq!(local.total_n_hosts, 9);
        assert_eq!(local.max_difficulty, 100);
    }
}
