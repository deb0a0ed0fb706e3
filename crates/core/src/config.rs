use crate::{Rgba, Size, Viewport};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub card_color: String,
    pub pattern_color: String,
    /// 1-based slot indices drawn in the pattern colour while idle.
    pub pattern_list: Vec<usize>,
    pub text_color: String,
    pub lucky_color: String,
    pub card_size: Size,
    pub text_size: f64,
    pub row_count: usize,
    pub show_avatar: bool,
    pub title_font: String,
    pub title_font_sync_global: bool,
    /// Automatic stop after this many seconds of rolling.
    pub definite_time: Option<u64>,
    pub win_music: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            card_color: "#ff79c6".to_string(),
            pattern_color: "#1b66c9".to_string(),
            pattern_list: vec![
                21, 38, 55, 54, 53, 70, 87, 88, 89, 23, 40, 57, 74, 91, 92, 76, 59, 42, 25, 24,
                27, 28, 29, 46, 63, 62, 61, 78, 95, 96, 97, 20, 19, 31, 48, 66, 67, 84, 101, 100,
                32, 33, 93, 65, 82, 99,
            ],
            text_color: "#ffffff".to_string(),
            lucky_color: "#ecb1ac".to_string(),
            card_size: Size::default(),
            text_size: 30.0,
            row_count: 7,
            show_avatar: false,
            title_font: "微软雅黑".to_string(),
            title_font_sync_global: true,
            definite_time: None,
            win_music: true,
        }
    }
}

/// How renderers draw text: card text colour and the title font.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TextStyle {
    pub color: Rgba,
    /// `None` when the title follows the page's global font.
    pub title_font: Option<String>,
}

impl DisplayConfig {
    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            color: Rgba::from_hex(&self.text_color, 1.0),
            title_font: (!self.title_font_sync_global && !self.title_font.trim().is_empty())
                .then(|| self.title_font.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RollSpec {
    /// Half-turn multiplier: the scene turns `PI * turns * 1000` radians.
    pub turns: f64,
    pub seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub transform_ms: u64,
    pub churn_interval_ms: u64,
    pub churn_batch: usize,
    pub camera_tween_ms: u64,
    pub reveal_position_ms: u64,
    pub reveal_rotation_ms: u64,
    pub reveal_depth: f64,
    pub slow_roll: RollSpec,
    pub fast_roll: RollSpec,
    pub audio_cap: usize,
    pub initial_scatter: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            transform_ms: 1000,
            churn_interval_ms: 200,
            churn_batch: 4,
            camera_tween_ms: 1200,
            reveal_position_ms: 1200,
            reveal_rotation_ms: 900,
            reveal_depth: 1000.0,
            slow_roll: RollSpec {
                turns: 0.1,
                seconds: 2000.0,
            },
            fast_roll: RollSpec {
                turns: 10.0,
                seconds: 3000.0,
            },
            audio_cap: 10,
            initial_scatter: 2000.0,
        }
    }
}

/// Camera distance for the reveal, chosen by winner count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTiers {
    pub default_z: f64,
    pub single_z: f64,
    pub few_limit: usize,
    pub few_z: f64,
    pub some_limit: usize,
    pub some_z: f64,
    pub many_z: f64,
}

impl Default for CameraTiers {
    fn default() -> Self {
        Self {
            default_z: 3000.0,
            single_z: 2000.0,
            few_limit: 10,
            few_z: 3000.0,
            some_limit: 20,
            some_z: 3200.0,
            many_z: 3500.0,
        }
    }
}

impl CameraTiers {
    pub fn distance_for(&self, winners: usize) -> f64 {
        if winners == 1 {
            self.single_z
        } else if winners <= self.few_limit {
            self.few_z
        } else if winners <= self.some_limit {
            self.some_z
        } else {
            self.many_z
        }
    }
}

/// Card and text scale for revealed cards, chosen by winner count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleTiers {
    pub single: f64,
    pub small_limit: usize,
    pub small: f64,
    pub medium_limit: usize,
    pub medium: f64,
    pub large_limit: usize,
    pub large: f64,
    pub huge: f64,
}

impl Default for ScaleTiers {
    fn default() -> Self {
        Self {
            single: 2.5,
            small_limit: 5,
            small: 2.5,
            medium_limit: 10,
            medium: 2.0,
            large_limit: 25,
            large: 1.6,
            huge: 1.5,
        }
    }
}

impl ScaleTiers {
    pub fn scale_for(&self, winners: usize) -> f64 {
        if winners == 1 {
            self.single
        } else if winners <= self.small_limit {
            self.small
        } else if winners <= self.medium_limit {
            self.medium
        } else if winners <= self.large_limit {
            self.large
        } else {
            self.huge
        }
    }
}

/// Tunables of the winner cluster layout. Tier boundaries are inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterTuning {
    pub wide_limit: usize,
    pub wide_spacing: f64,
    pub medium_limit: usize,
    pub medium_spacing: f64,
    pub narrow_limit: usize,
    pub narrow_spacing: f64,
    pub min_spacing: f64,
    pub horizontal_margin: f64,
    pub small_row: usize,
    pub medium_row: (usize, usize),
    pub dense_limit: usize,
    pub dense_row: (usize, usize),
    pub densest_row: (usize, usize),
    pub row_gap_small: f64,
    pub row_gap_medium: f64,
    pub row_gap_large: f64,
    pub top_anchor: f64,
    pub top_compression: f64,
    pub max_vertical_offset: f64,
}

impl Default for ClusterTuning {
    fn default() -> Self {
        Self {
            wide_limit: 5,
            wide_spacing: 100.0,
            medium_limit: 10,
            medium_spacing: 80.0,
            narrow_limit: 20,
            narrow_spacing: 60.0,
            min_spacing: 40.0,
            horizontal_margin: 200.0,
            small_row: 5,
            medium_row: (5, 6),
            dense_limit: 24,
            dense_row: (6, 8),
            densest_row: (7, 9),
            row_gap_small: 60.0,
            row_gap_medium: 40.0,
            row_gap_large: 20.0,
            top_anchor: 400.0,
            top_compression: 0.15,
            max_vertical_offset: 600.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableTuning {
    pub column_gap: f64,
    pub row_gap: f64,
}

impl Default for TableTuning {
    fn default() -> Self {
        Self {
            column_gap: 40.0,
            row_gap: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereTuning {
    pub radius: f64,
}

impl Default for SphereTuning {
    fn default() -> Self {
        Self { radius: 800.0 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    pub display: DisplayConfig,
    pub timing: TimingConfig,
    pub camera: CameraTiers,
    pub scale: ScaleTiers,
    pub cluster: ClusterTuning,
    pub table: TableTuning,
    pub sphere: SphereTuning,
    pub viewport: Viewport,
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! camera_case {
        ($name:ident, $count:expr, $expected:expr) => {
            #[test]
            fn $name() {
                assert_eq!(CameraTiers::default().distance_for($count), $expected);
            }
        };
    }

    camera_case!(camera_single, 1, 2000.0);

    #[test]
    fn title_font_applies_only_when_not_synced() {
        let mut display = DisplayConfig::default();
        assert_eq!(display.text_style().title_font, None);
        assert_eq!(display.text_style().color, Rgba::from_hex("#ffffff", 1.0));
        display.title_font_sync_global = false;
        display.text_color = "#102030".into();
        let style = display.text_style();
        assert_eq!(style.title_font.as_deref(), Some("微软雅黑"));
        assert_eq!((style.color.r, style.color.g, style.color.b), (0x10, 0x20, 0x30));
    }
    camera_case!(camera_two, 2, 3000.0);
    camera_case!(camera_ten, 10, 3000.0);
    camera_case!(camera_eleven, 11, 3200.0);
    camera_case!(camera_twenty, 20, 3200.0);
    camera_case!(camera_many, 21, 3500.0);

    macro_rules! scale_case {
        ($name:ident, $count:expr, $expected:expr) => {
            #[test]
            fn $name() {
                assert_eq!(ScaleTiers::default().scale_for($count), $expected);
            }
        };
    }

    scale_case!(scale_single, 1, 2.5);
    scale_case!(scale_five, 5, 2.5);
    scale_case!(scale_six, 6, 2.0);
    scale_case!(scale_twenty_five, 25, 1.6);
    scale_case!(scale_many, 26, 1.5);

    #[test]
    fn partial_settings_fill_defaults() {
        let config: LotteryConfig =
            serde_json::from_str(r#"{"display":{"row_count":3},"timing":{"churn_batch":2}}"#)
                .expect("parse");
        assert_eq!(config.display.row_count, 3);
        assert_eq!(config.display.text_size, 30.0);
        assert_eq!(config.timing.churn_batch, 2);
        assert_eq!(config.timing.churn_interval_ms, 200);
        assert_eq!(config.cluster.wide_limit, 5);
    }
}
