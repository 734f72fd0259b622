//! Process-wide tunables for the extraction pipeline.

/// Tunable thresholds that control grouping and worker sharding.
///
/// Mirrors the three knobs of the reference settings module; all three can
/// be overridden via environment variables through [`Config::from_env`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Default minimum line/table-rect overlap fraction for
    /// [`crate::table::table_cell_text`] when a caller doesn't supply one
    /// explicitly.
    pub block_threshold: f64,
    /// Minimum pages-per-worker before the page driver will spin up an
    /// additional worker thread.
    pub worker_page_threshold: usize,
    /// How many consecutive glyphs share one sampled font-name read during
    /// ingestion.
    pub fontname_sample_freq: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_threshold: 0.8,
            worker_page_threshold: 10,
            fontname_sample_freq: 6,
        }
    }
}

impl Config {
    /// Build a [`Config`], overriding defaults from
    /// `PDFLAYOUT_BLOCK_THRESHOLD`, `PDFLAYOUT_WORKER_PAGE_THRESHOLD`, and
    /// `PDFLAYOUT_FONTNAME_SAMPLE_FREQ` when present and parseable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("PDFLAYOUT_BLOCK_THRESHOLD") {
            if let Ok(v) = v.parse() {
                cfg.block_threshold = v;
            }
        }
        if let Ok(v) = std::env::var("PDFLAYOUT_WORKER_PAGE_THRESHOLD") {
            if let Ok(v) = v.parse() {
                cfg.worker_page_threshold = v;
            }
        }
        if let Ok(v) = std::env::var("PDFLAYOUT_FONTNAME_SAMPLE_FREQ") {
            if let Ok(v) = v.parse() {
                cfg.fontname_sample_freq = v;
            }
        }
        cfg
    }
}
