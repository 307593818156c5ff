use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Per-player random stream derivation
///
/// A run with a base seed gives every player its own seed derived from the
/// base and the player id, so results do not depend on which worker picks the
/// player up or in what order.
pub struct StreamSeeder;

impl StreamSeeder {
    /// Seed for one player's stream under a base seed
    ///
    /// XXH3 of the player id keyed by the base seed. The algorithm is fixed, so
    /// seeds match across platforms and toolchain upgrades.
    pub fn worker_seed(base_seed: u64, player_id: &str) -> u64 {
        xxh3_64_with_seed(player_id.as_bytes(), base_seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_seed_is_stable() {
        let a = StreamSeeder::worker_seed(42, "WR1");
        let b = StreamSeeder::worker_seed(42, "WR1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_worker_seed_is_xxh3() {
        // Published XXH3-64 digest of empty input
        assert_eq!(StreamSeeder::worker_seed(0, ""), 0x2D06_8005_38D3_94C2);
    }

    #[test]
    fn test_worker_seed_separates_players_and_runs() {
        let base = StreamSeeder::worker_seed(42, "WR1");
        assert_ne!(base, StreamSeeder::worker_seed(42, "WR2"));
        assert_ne!(base, StreamSeeder::worker_seed(43, "WR1"));
    }
}
