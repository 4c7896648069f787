//! Brightness levels and the level → color table.
//!
//! Level 0 is the head (brightest), `levels - 1` the dimmest tail. The
//! compositor only deals in levels; colors are attached when the diff is
//! emitted, through a [`Palette`] built once per session for the color
//! depth the terminal supports.

use crossterm::style::Color;

/// Level stored in blank grid cells. Never produced for an occupied cell.
pub const BLANK_LEVEL: u8 = u8::MAX;

/// Level for a row `distance` rows behind the head of a trail of `length`.
///
/// 0 only at the head; otherwise `ceil(distance * (levels - 1) / length)`,
/// clamped to `1..=levels - 1`, so the last trail row lands on the dimmest level.
pub fn level_for_distance(distance: usize, length: usize, levels: u8) -> u8 {
    if distance == 0 {
        return 0;
    }
    let max = levels.saturating_sub(1).max(1) as usize;
    let length = length.max(1);
    let scaled = (distance * max).div_ceil(length);
    scaled.clamp(1, max) as u8
}

/// One level brighter, never past the head level.
pub fn brighten(level: u8) -> u8 {
    level.saturating_sub(1)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ColorDepth {
    /// 16-color ANSI palette.
    Basic,
    /// 256-color palette.
    Extended,
}

/// Foreground color plus the dim attribute (needed to get a third green
/// out of the basic palette).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Tone {
    pub fg: Color,
    pub dim: bool,
}

impl Tone {
    pub const RESET: Tone = Tone { fg: Color::Reset, dim: false };

    const fn plain(fg: Color) -> Self {
        Tone { fg, dim: false }
    }
}

// ── Theme ramps (bright → dim) ──

const EXTENDED_HEAD: Tone = Tone::plain(Color::AnsiValue(231));
const EXTENDED_RAMP: [Tone; 5] = [
    Tone::plain(Color::AnsiValue(46)),
    Tone::plain(Color::AnsiValue(40)),
    Tone::plain(Color::AnsiValue(34)),
    Tone::plain(Color::AnsiValue(28)),
    Tone::plain(Color::AnsiValue(22)),
];

const BASIC_HEAD: Tone = Tone::plain(Color::White);
const BASIC_RAMP: [Tone; 3] = [
    Tone::plain(Color::Green),
    Tone::plain(Color::DarkGreen),
    Tone { fg: Color::DarkGreen, dim: true },
];

/// Fixed level → tone table.
#[derive(Clone, Debug)]
pub struct Palette {
    tones: Box<[Tone]>,
}

impl Palette {
    pub fn new(depth: ColorDepth, levels: u8) -> Self {
        let levels = levels.max(2);
        let (head, ramp): (Tone, &[Tone]) = match depth {
            ColorDepth::Basic => (BASIC_HEAD, &BASIC_RAMP),
            ColorDepth::Extended => (EXTENDED_HEAD, &EXTENDED_RAMP),
        };
        let trail_levels = levels as usize - 1;
        let tones = std::iter::once(head)
            .chain((0..trail_levels).map(|i| ramp[bucket(i, trail_levels, ramp.len())]))
            .collect();
        Palette { tones }
    }

    pub fn levels(&self) -> u8 {
        self.tones.len() as u8
    }

    /// Tone for a level. Blank and out-of-range levels map to the terminal default.
    pub fn tone(&self, level: u8) -> Tone {
        self.tones.get(level as usize).copied().unwrap_or(Tone::RESET)
    }
}

/// Map trail index `i` of `n` onto a ramp of `m` entries, keeping both ends
/// pinned. Several levels share an entry when `n > m`.
fn bucket(i: usize, n: usize, m: usize) -> usize {
    if n <= 1 || m <= 1 {
        return 0;
    }
    (i * (m - 1) + (n - 1) / 2) / (n - 1)
}
