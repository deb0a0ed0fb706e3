//! Card content rendering: candidate record in, visual descriptor out.
//!
//! Nothing here touches a display surface. Adapters turn a [`CardVisual`]
//! into whatever their toolkit draws.

use crate::{Candidate, DisplayConfig, ResourceError, RngState, Size};
use serde::{Deserialize, Serialize};

/// A display name split into a leading (latin) and trailing (CJK) segment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameParts {
    pub leading: String,
    pub trailing: String,
}

impl NameParts {
    pub fn is_stacked(&self) -> bool {
        !self.leading.is_empty() && !self.trailing.is_empty()
    }
}

fn is_cjk(ch: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&ch)
}

/// Splits at the first CJK character. Names without one stay whole in
/// `leading`; names starting with CJK and holding no latin letters stay whole
/// in `trailing`.
pub fn split_name(name: &str) -> NameParts {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return NameParts::default();
    }
    let Some(first_cjk) = trimmed.char_indices().find(|(_, ch)| is_cjk(*ch)).map(|(idx, _)| idx)
    else {
        return NameParts {
            leading: trimmed.to_string(),
            trailing: String::new(),
        };
    };
    if first_cjk == 0 && !trimmed.chars().any(|ch| ch.is_ascii_alphabetic()) {
        return NameParts {
            leading: String::new(),
            trailing: trimmed.to_string(),
        };
    }
    NameParts {
        leading: trimmed[..first_cjk].trim().to_string(),
        trailing: trimmed[first_cjk..].trim().to_string(),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    /// Parses `#rgb` or `#rrggbb`; anything else falls back to white.
    pub fn from_hex(hex: &str, alpha: f64) -> Self {
        let digits = hex.trim().trim_start_matches('#');
        let expanded: String = if digits.len() == 3 {
            digits.chars().flat_map(|ch| [ch, ch]).collect()
        } else {
            digits.to_string()
        };
        let channel = |range: std::ops::Range<usize>| {
            expanded
                .get(range)
                .and_then(|part| u8::from_str_radix(part, 16).ok())
        };
        match (channel(0..2), channel(2..4), channel(4..6)) {
            (Some(r), Some(g), Some(b)) if expanded.len() == 6 => Self {
                r,
                g,
                b,
                a: alpha.clamp(0.0, 1.0),
            },
            _ => {
                log::warn!("invalid colour {hex:?}, using white");
                Self {
                    r: 255,
                    g: 255,
                    b: 255,
                    a: alpha.clamp(0.0, 1.0),
                }
            }
        }
    }

    pub fn css(&self) -> String {
        format!("rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CardMode {
    /// Idle table; pattern highlights apply.
    Default,
    Sphere,
    /// Revealed winner.
    Lucky,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum NameBlock {
    Empty,
    Single(String),
    Stacked { leading: String, trailing: String },
}

/// Where the name block sits vertically inside the card.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum NameAnchor {
    Centered,
    /// Top edge at `fraction` of the card height plus `offset` pixels.
    BelowAvatar { fraction: f64, offset: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvatarVisual {
    pub url: String,
    pub full_width: bool,
    pub size: Option<Size>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardVisual {
    pub candidate_id: u64,
    pub mode: CardMode,
    pub lucky_class: bool,
    pub size: Size,
    pub background: Rgba,
    pub border: Rgba,
    pub shadow: Rgba,
    pub uid: Option<String>,
    pub uid_font: f64,
    pub name: NameBlock,
    pub name_font: f64,
    pub name_anchor: NameAnchor,
    pub detail: Option<(String, String)>,
    pub detail_font: f64,
    pub avatar: Option<AvatarVisual>,
}

impl CardVisual {
    pub fn display_name(&self) -> String {
        match &self.name {
            NameBlock::Empty => String::new(),
            NameBlock::Single(text) => text.clone(),
            NameBlock::Stacked { leading, trailing } => format!("{leading} {trailing}"),
        }
    }
}

/// Style inputs for one render; `size`/`text_size` already include any scaling.
#[derive(Debug, Clone)]
pub struct CardStyle<'a> {
    pub display: &'a DisplayConfig,
    pub base_color: &'a str,
    pub size: Size,
    pub text_size: f64,
}

impl<'a> CardStyle<'a> {
    pub fn idle(display: &'a DisplayConfig) -> Self {
        Self {
            display,
            base_color: &display.card_color,
            size: display.card_size,
            text_size: display.text_size,
        }
    }

    pub fn lucky(display: &'a DisplayConfig, scale: f64) -> Self {
        Self {
            display,
            base_color: &display.lucky_color,
            size: display.card_size.scaled(scale),
            text_size: display.text_size * scale,
        }
    }
}

const AVATAR_PX: f64 = 140.0;
const LUCKY_AVATAR_FRACTION: f64 = 0.60;
const LUCKY_NAME_OFFSET: f64 = 10.0;
const IDLE_AVATAR_FRACTION: f64 = 0.35;
const IDLE_NAME_OFFSET: f64 = 80.0;

/// The image a card shows for `candidate`; a blank URL has nothing to load.
pub fn avatar_source(candidate: &Candidate) -> Result<&str, ResourceError> {
    if !candidate.has_avatar() {
        return Err(ResourceError::AvatarUnavailable(format!(
            "of person {}",
            candidate.id
        )));
    }
    Ok(candidate.avatar.trim())
}

pub fn render_card(
    candidate: &Candidate,
    style: &CardStyle<'_>,
    slot_index: usize,
    mode: CardMode,
    rng: &mut RngState,
) -> CardVisual {
    let display = style.display;
    let patterned = mode == CardMode::Default && display.pattern_list.contains(&(slot_index + 1));
    let background = if patterned {
        Rgba::from_hex(&display.pattern_color, rng.range_f64(0.8, 1.0))
    } else {
        match mode {
            CardMode::Default | CardMode::Sphere => {
                Rgba::from_hex(style.base_color, rng.range_f64(0.25, 0.75))
            }
            CardMode::Lucky => Rgba::from_hex(style.base_color, 0.8),
        }
    };

    let avatar = if display.show_avatar {
        match avatar_source(candidate) {
            Ok(url) => Some(AvatarVisual {
                url: url.to_string(),
                full_width: mode == CardMode::Lucky,
                size: (mode != CardMode::Lucky).then_some(Size::new(AVATAR_PX, AVATAR_PX)),
            }),
            Err(err) => {
                log::debug!("{err}, drawing the card without it");
                None
            }
        }
    } else {
        None
    };
    let with_avatar = avatar.is_some();
    let name = if display.show_avatar {
        let parts = candidate.name_parts();
        if parts.is_stacked() {
            NameBlock::Stacked {
                leading: parts.leading.clone(),
                trailing: parts.trailing.clone(),
            }
        } else if !parts.leading.is_empty() || !parts.trailing.is_empty() {
            let text = if parts.leading.is_empty() {
                &parts.trailing
            } else {
                &parts.leading
            };
            NameBlock::Single(text.clone())
        } else if candidate.name.is_empty() {
            NameBlock::Empty
        } else {
            NameBlock::Single(candidate.name.clone())
        }
    } else if candidate.name.is_empty() {
        NameBlock::Empty
    } else {
        NameBlock::Single(candidate.name.clone())
    };

    let name_anchor = match (with_avatar, mode) {
        (false, _) => NameAnchor::Centered,
        (true, CardMode::Lucky) => NameAnchor::BelowAvatar {
            fraction: LUCKY_AVATAR_FRACTION,
            offset: LUCKY_NAME_OFFSET,
        },
        (true, _) => NameAnchor::BelowAvatar {
            fraction: IDLE_AVATAR_FRACTION,
            offset: IDLE_NAME_OFFSET,
        },
    };

    let detail = (!display.show_avatar
        && (!candidate.department.is_empty() || !candidate.identity.is_empty()))
    .then(|| (candidate.department.clone(), candidate.identity.clone()));

    CardVisual {
        candidate_id: candidate.id,
        mode,
        lucky_class: mode == CardMode::Lucky,
        size: style.size,
        background,
        border: Rgba::from_hex(style.base_color, 0.25),
        shadow: Rgba::from_hex(style.base_color, 0.5),
        uid: (!display.show_avatar && !candidate.uid.is_empty()).then(|| candidate.uid.clone()),
        uid_font: style.text_size * 0.5,
        name,
        name_font: style.text_size,
        name_anchor,
        detail,
        detail_font: style.text_size * 0.5,
        avatar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! split_case {
        ($name:ident, $input:expr, $leading:expr, $trailing:expr) => {
            #[test]
            fn $name() {
                let parts = split_name($input);
                assert_eq!(parts.leading, $leading);
                assert_eq!(parts.trailing, $trailing);
            }
        };
    }

    split_case!(split_mixed, "Gavin郭继朋", "Gavin", "郭继朋");
    split_case!(split_cjk_only, "张三", "", "张三");
    split_case!(split_latin_only, "Alice", "Alice", "");
    split_case!(split_trims_segments, "  Bob  李四 ", "Bob", "李四");
    split_case!(split_cjk_first_with_latin, "郭继朋Gavin", "", "郭继朋Gavin");
    split_case!(split_blank, "   ", "", "");
    split_case!(split_digits_are_latin_side, "007 王五", "007", "王五");

    fn avatar_display() -> DisplayConfig {
        DisplayConfig {
            show_avatar: true,
            pattern_list: vec![1],
            ..DisplayConfig::default()
        }
    }

    #[test]
    fn mixed_name_stacks_in_avatar_mode() {
        let display = avatar_display();
        let person = Candidate::new(1, "Gavin郭继朋").with_avatar("a.png");
        let mut rng = RngState::from_seed(1);
        let card = render_card(&person, &CardStyle::idle(&display), 4, CardMode::Sphere, &mut rng);
        assert_eq!(
            card.name,
            NameBlock::Stacked {
                leading: "Gavin".into(),
                trailing: "郭继朋".into()
            }
        );
        assert_eq!(
            card.name_anchor,
            NameAnchor::BelowAvatar {
                fraction: 0.35,
                offset: 80.0
            }
        );
        assert!(card.uid.is_none());
        assert!(card.detail.is_none());
    }

    #[test]
    fn single_script_name_is_centered_block() {
        let display = avatar_display();
        let person = Candidate::new(2, "张三");
        let mut rng = RngState::from_seed(1);
        let card = render_card(&person, &CardStyle::idle(&display), 4, CardMode::Sphere, &mut rng);
        assert_eq!(card.name, NameBlock::Single("张三".into()));
        assert_eq!(card.name_anchor, NameAnchor::Centered);
        assert!(card.avatar.is_none());
        assert!(matches!(
            avatar_source(&person),
            Err(ResourceError::AvatarUnavailable(_))
        ));
    }

    #[test]
    fn lucky_avatar_moves_name_lower() {
        let display = avatar_display();
        let person = Candidate::new(3, "Alice").with_avatar("a.png");
        let mut rng = RngState::from_seed(1);
        let card = render_card(
            &person,
            &CardStyle::lucky(&display, 2.0),
            0,
            CardMode::Lucky,
            &mut rng,
        );
        assert_eq!(
            card.name_anchor,
            NameAnchor::BelowAvatar {
                fraction: 0.60,
                offset: 10.0
            }
        );
        assert!(card.lucky_class);
        assert_eq!(card.background.a, 0.8);
        assert_eq!(card.size, display.card_size.scaled(2.0));
        assert_eq!(card.name_font, display.text_size * 2.0);
        assert!(card.avatar.as_ref().is_some_and(|avatar| avatar.full_width));
    }

    #[test]
    fn plain_mode_shows_raw_name_and_detail() {
        let display = DisplayConfig::default();
        let person = Candidate::new(4, "Gavin郭继朋").with_detail("Sales", "Lead");
        let mut rng = RngState::from_seed(1);
        let card = render_card(&person, &CardStyle::idle(&display), 200, CardMode::Default, &mut rng);
        assert_eq!(card.name, NameBlock::Single("Gavin郭继朋".into()));
        assert_eq!(card.detail, Some(("Sales".into(), "Lead".into())));
        assert_eq!(card.uid.as_deref(), Some("4"));
        assert!(card.avatar.is_none());
    }

    #[test]
    fn pattern_slots_use_pattern_colour_only_in_default_mode() {
        let display = avatar_display();
        let pattern = Rgba::from_hex(&display.pattern_color, 1.0);
        let person = Candidate::new(5, "Eve");
        let mut rng = RngState::from_seed(9);
        let idle = render_card(&person, &CardStyle::idle(&display), 0, CardMode::Default, &mut rng);
        assert_eq!((idle.background.r, idle.background.g, idle.background.b), (pattern.r, pattern.g, pattern.b));
        assert!(idle.background.a >= 0.8);
        let sphere = render_card(&person, &CardStyle::idle(&display), 0, CardMode::Sphere, &mut rng);
        assert!(sphere.background.a < 0.75);
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(Rgba::from_hex("#ff0080", 0.5).css(), "rgba(255, 0, 128, 0.500)");
        assert_eq!(Rgba::from_hex("#fff", 1.0).g, 255);
        assert_eq!(Rgba::from_hex("nope", 2.0).a, 1.0);
    }
}
