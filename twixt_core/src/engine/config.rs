use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Search Parameters
    pub max_ply: u8,
    pub skipped_ply: Option<u8>, // not searched unless it is the final ply
    pub defensive_plies: usize,  // own distance ignored while the game is this young
    pub tt_size_mb: usize,
    pub game_over_score: i32,

    // Evaluation Parameters
    pub third_column_recheck: bool,

    // Move Generation
    pub random_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_ply: 20,
            skipped_ply: Some(4),
            defensive_plies: 8,
            tt_size_mb: 16,
            game_over_score: 1000,

            third_column_recheck: true,

            random_seed: None,
        }
    }
}

#[derive(Deserialize)]
struct EngineConfigJson {
    max_ply: Option<u8>,
    #[serde(default, deserialize_with = "explicit_option")]
    skipped_ply: Option<Option<u8>>,
    defensive_plies: Option<usize>,
    tt_size_mb: Option<usize>,
    game_over_score: Option<i32>,

    third_column_recheck: Option<bool>,

    random_seed: Option<u64>,
}

// Tells `"skipped_ply": null` (no skip) apart from a missing key (default).
fn explicit_option<'de, D>(deserializer: D) -> Result<Option<Option<u8>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<u8>::deserialize(deserializer).map(Some)
}

impl EngineConfig {
    /// Read a (possibly partial) JSON object; missing keys keep their defaults.
    pub fn load_from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        let json_config: EngineConfigJson = serde_json::from_str(json_str)?;
        let default = Self::default();

        Ok(Self {
            max_ply: json_config.max_ply.unwrap_or(default.max_ply),
            skipped_ply: json_config.skipped_ply.unwrap_or(default.skipped_ply),
            defensive_plies: json_config
                .defensive_plies
                .unwrap_or(default.defensive_plies),
            tt_size_mb: json_config.tt_size_mb.unwrap_or(default.tt_size_mb),
            game_over_score: json_config
                .game_over_score
                .unwrap_or(default.game_over_score),

            third_column_recheck: json_config
                .third_column_recheck
                .unwrap_or(default.third_column_recheck),

            random_seed: json_config.random_seed.or(default.random_seed),
        })
    }
}
