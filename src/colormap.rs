// colormap.rs

use std::fmt;
use std::str::FromStr;

use plotters::prelude::RGBColor;

/// Sequential palettes a map can be shaded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMap {
    Greys,
    Purples,
    Blues,
    Greens,
    Oranges,
    #[default]
    Reds,
    YlOrBr,
    YlOrRd,
    OrRd,
    PuRd,
    RdPu,
    BuPu,
    GnBu,
    PuBu,
    YlGnBu,
    PuBuGn,
    BuGn,
    YlGn,
    Binary,
    GistYarg,
    GistGray,
    Gray,
    Bone,
    Pink,
    Spring,
    Summer,
    Autumn,
    Winter,
    Cool,
    Wistia,
    Hot,
    Afmhot,
    GistHeat,
    Copper,
}

type Stops = &'static [(f64, RGBColor)];

// Nine-class ColorBrewer ramps, sampled at every other class.
const fn brewer(c: [RGBColor; 5]) -> [(f64, RGBColor); 5] {
    [(0.0, c[0]), (0.25, c[1]), (0.5, c[2]), (0.75, c[3]), (1.0, c[4])]
}

const WHITE: RGBColor = RGBColor(255, 255, 255);
const BLACK: RGBColor = RGBColor(0, 0, 0);

const GREYS: [(f64, RGBColor); 5] = brewer([WHITE, RGBColor(217, 217, 217), RGBColor(150, 150, 150), RGBColor(82, 82, 82), BLACK]);
const PURPLES: [(f64, RGBColor); 5] = brewer([RGBColor(252, 251, 253), RGBColor(218, 218, 235), RGBColor(158, 154, 200), RGBColor(106, 81, 163), RGBColor(63, 0, 125)]);
const BLUES: [(f64, RGBColor); 5] = brewer([RGBColor(247, 251, 255), RGBColor(198, 219, 239), RGBColor(107, 174, 214), RGBColor(33, 113, 181), RGBColor(8, 48, 107)]);
const GREENS: [(f64, RGBColor); 5] = brewer([RGBColor(247, 252, 245), RGBColor(199, 233, 192), RGBColor(116, 196, 118), RGBColor(35, 139, 69), RGBColor(0, 68, 27)]);
const ORANGES: [(f64, RGBColor); 5] = brewer([RGBColor(255, 245, 235), RGBColor(253, 208, 162), RGBColor(253, 141, 60), RGBColor(217, 72, 1), RGBColor(127, 39, 4)]);
const REDS: [(f64, RGBColor); 5] = brewer([RGBColor(255, 245, 240), RGBColor(252, 187, 161), RGBColor(251, 106, 74), RGBColor(203, 24, 29), RGBColor(103, 0, 13)]);
const YL_OR_BR: [(f64, RGBColor); 5] = brewer([RGBColor(255, 255, 229), RGBColor(254, 227, 145), RGBColor(254, 153, 41), RGBColor(204, 76, 2), RGBColor(102, 37, 6)]);
const YL_OR_RD: [(f64, RGBColor); 5] = brewer([RGBColor(255, 255, 204), RGBColor(254, 217, 118), RGBColor(253, 141, 60), RGBColor(227, 26, 28), RGBColor(128, 0, 38)]);
const OR_RD: [(f64, RGBColor); 5] = brewer([RGBColor(255, 247, 236), RGBColor(253, 212, 158), RGBColor(252, 141, 89), RGBColor(215, 48, 31), RGBColor(127, 0, 0)]);
const PU_RD: [(f64, RGBColor); 5] = brewer([RGBColor(247, 244, 249), RGBColor(212, 185, 218), RGBColor(223, 101, 176), RGBColor(206, 18, 86), RGBColor(103, 0, 31)]);
const RD_PU: [(f64, RGBColor); 5] = brewer([RGBColor(255, 247, 243), RGBColor(252, 197, 192), RGBColor(247, 104, 161), RGBColor(174, 1, 126), RGBColor(73, 0, 106)]);
const BU_PU: [(f64, RGBColor); 5] = brewer([RGBColor(247, 252, 253), RGBColor(191, 211, 230), RGBColor(140, 150, 198), RGBColor(136, 65, 157), RGBColor(77, 0, 75)]);
const GN_BU: [(f64, RGBColor); 5] = brewer([RGBColor(247, 252, 240), RGBColor(204, 235, 197), RGBColor(123, 204, 196), RGBColor(43, 140, 190), RGBColor(8, 64, 129)]);
const PU_BU: [(f64, RGBColor); 5] = brewer([RGBColor(255, 247, 251), RGBColor(208, 209, 230), RGBColor(116, 169, 207), RGBColor(5, 112, 176), RGBColor(2, 56, 88)]);
const YL_GN_BU: [(f64, RGBColor); 5] = brewer([RGBColor(255, 255, 217), RGBColor(199, 233, 180), RGBColor(65, 182, 196), RGBColor(34, 94, 168), RGBColor(8, 29, 88)]);
const PU_BU_GN: [(f64, RGBColor); 5] = brewer([RGBColor(255, 247, 251), RGBColor(208, 209, 230), RGBColor(103, 169, 207), RGBColor(2, 129, 138), RGBColor(1, 70, 54)]);
const BU_GN: [(f64, RGBColor); 5] = brewer([RGBColor(247, 252, 253), RGBColor(204, 236, 230), RGBColor(102, 194, 164), RGBColor(35, 139, 69), RGBColor(0, 68, 27)]);
const YL_GN: [(f64, RGBColor); 5] = brewer([RGBColor(255, 255, 229), RGBColor(217, 240, 163), RGBColor(120, 198, 121), RGBColor(35, 132, 67), RGBColor(0, 69, 41)]);

const LIGHT_TO_DARK: [(f64, RGBColor); 2] = [(0.0, WHITE), (1.0, BLACK)];
const DARK_TO_LIGHT: [(f64, RGBColor); 2] = [(0.0, BLACK), (1.0, WHITE)];
const BONE: [(f64, RGBColor); 4] = [(0.0, BLACK), (0.375, RGBColor(74, 74, 103)), (0.75, RGBColor(166, 199, 199)), (1.0, WHITE)];
const PINK: [(f64, RGBColor); 4] = [(0.0, RGBColor(30, 0, 0)), (0.375, RGBColor(183, 132, 132)), (0.75, RGBColor(222, 222, 175)), (1.0, WHITE)];
const SPRING: [(f64, RGBColor); 2] = [(0.0, RGBColor(255, 0, 255)), (1.0, RGBColor(255, 255, 0))];
const SUMMER: [(f64, RGBColor); 2] = [(0.0, RGBColor(0, 128, 102)), (1.0, RGBColor(255, 255, 102))];
const AUTUMN: [(f64, RGBColor); 2] = [(0.0, RGBColor(255, 0, 0)), (1.0, RGBColor(255, 255, 0))];
const WINTER: [(f64, RGBColor); 2] = [(0.0, RGBColor(0, 0, 255)), (1.0, RGBColor(0, 255, 128))];
const COOL: [(f64, RGBColor); 2] = [(0.0, RGBColor(0, 255, 255)), (1.0, RGBColor(255, 0, 255))];
const WISTIA: [(f64, RGBColor); 5] = [(0.0, RGBColor(228, 255, 122)), (0.25, RGBColor(255, 232, 26)), (0.5, RGBColor(255, 189, 0)), (0.75, RGBColor(255, 160, 0)), (1.0, RGBColor(252, 127, 0))];
const HOT: [(f64, RGBColor); 4] = [(0.0, RGBColor(10, 0, 0)), (0.365, RGBColor(255, 0, 0)), (0.746, RGBColor(255, 255, 0)), (1.0, WHITE)];
const AFMHOT: [(f64, RGBColor); 5] = [(0.0, BLACK), (0.25, RGBColor(128, 0, 0)), (0.5, RGBColor(255, 128, 0)), (0.75, RGBColor(255, 255, 128)), (1.0, WHITE)];
const GIST_HEAT: [(f64, RGBColor); 4] = [(0.0, BLACK), (0.5, RGBColor(191, 0, 0)), (0.75, RGBColor(255, 128, 0)), (1.0, WHITE)];
const COPPER: [(f64, RGBColor); 3] = [(0.0, BLACK), (0.8, RGBColor(255, 159, 101)), (1.0, RGBColor(255, 199, 127))];

impl ColorMap {
    pub const ALL: [ColorMap; 34] = [
        ColorMap::Greys,
        ColorMap::Purples,
        ColorMap::Blues,
        ColorMap::Greens,
        ColorMap::Oranges,
        ColorMap::Reds,
        ColorMap::YlOrBr,
        ColorMap::YlOrRd,
        ColorMap::OrRd,
        ColorMap::PuRd,
        ColorMap::RdPu,
        ColorMap::BuPu,
        ColorMap::GnBu,
        ColorMap::PuBu,
        ColorMap::YlGnBu,
        ColorMap::PuBuGn,
        ColorMap::BuGn,
        ColorMap::YlGn,
        ColorMap::Binary,
        ColorMap::GistYarg,
        ColorMap::GistGray,
        ColorMap::Gray,
        ColorMap::Bone,
        ColorMap::Pink,
        ColorMap::Spring,
        ColorMap::Summer,
        ColorMap::Autumn,
        ColorMap::Winter,
        ColorMap::Cool,
        ColorMap::Wistia,
        ColorMap::Hot,
        ColorMap::Afmhot,
        ColorMap::GistHeat,
        ColorMap::Copper,
    ];

    /// Palette name as accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            ColorMap::Greys => "Greys",
            ColorMap::Purples => "Purples",
            ColorMap::Blues => "Blues",
            ColorMap::Greens => "Greens",
            ColorMap::Oranges => "Oranges",
            ColorMap::Reds => "Reds",
            ColorMap::YlOrBr => "YlOrBr",
            ColorMap::YlOrRd => "YlOrRd",
            ColorMap::OrRd => "OrRd",
            ColorMap::PuRd => "PuRd",
            ColorMap::RdPu => "RdPu",
            ColorMap::BuPu => "BuPu",
            ColorMap::GnBu => "GnBu",
            ColorMap::PuBu => "PuBu",
            ColorMap::YlGnBu => "YlGnBu",
            ColorMap::PuBuGn => "PuBuGn",
            ColorMap::BuGn => "BuGn",
            ColorMap::YlGn => "YlGn",
            ColorMap::Binary => "binary",
            ColorMap::GistYarg => "gist_yarg",
            ColorMap::GistGray => "gist_gray",
            ColorMap::Gray => "gray",
            ColorMap::Bone => "bone",
            ColorMap::Pink => "pink",
            ColorMap::Spring => "spring",
            ColorMap::Summer => "summer",
            ColorMap::Autumn => "autumn",
            ColorMap::Winter => "winter",
            ColorMap::Cool => "cool",
            ColorMap::Wistia => "Wistia",
            ColorMap::Hot => "hot",
            ColorMap::Afmhot => "afmhot",
            ColorMap::GistHeat => "gist_heat",
            ColorMap::Copper => "copper",
        }
    }

    fn stops(self) -> Stops {
        match self {
            ColorMap::Greys => &GREYS,
            ColorMap::Purples => &PURPLES,
            ColorMap::Blues => &BLUES,
            ColorMap::Greens => &GREENS,
            ColorMap::Oranges => &ORANGES,
            ColorMap::Reds => &REDS,
            ColorMap::YlOrBr => &YL_OR_BR,
            ColorMap::YlOrRd => &YL_OR_RD,
            ColorMap::OrRd => &OR_RD,
            ColorMap::PuRd => &PU_RD,
            ColorMap::RdPu => &RD_PU,
            ColorMap::BuPu => &BU_PU,
            ColorMap::GnBu => &GN_BU,
            ColorMap::PuBu => &PU_BU,
            ColorMap::YlGnBu => &YL_GN_BU,
            ColorMap::PuBuGn => &PU_BU_GN,
            ColorMap::BuGn => &BU_GN,
            ColorMap::YlGn => &YL_GN,
            ColorMap::Binary | ColorMap::GistYarg => &LIGHT_TO_DARK,
            ColorMap::GistGray | ColorMap::Gray => &DARK_TO_LIGHT,
            ColorMap::Bone => &BONE,
            ColorMap::Pink => &PINK,
            ColorMap::Spring => &SPRING,
            ColorMap::Summer => &SUMMER,
            ColorMap::Autumn => &AUTUMN,
            ColorMap::Winter => &WINTER,
            ColorMap::Cool => &COOL,
            ColorMap::Wistia => &WISTIA,
            ColorMap::Hot => &HOT,
            ColorMap::Afmhot => &AFMHOT,
            ColorMap::GistHeat => &GIST_HEAT,
            ColorMap::Copper => &COPPER,
        }
    }

    /// Color at position `t` in `[0, 1]`; values outside are clamped.
    pub fn sample(self, t: f64) -> RGBColor {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let upper = stops
            .iter()
            .position(|(pos, _)| *pos >= t)
            .unwrap_or(stops.len() - 1);
        if upper == 0 {
            return stops[0].1;
        }
        let (p0, c0) = stops[upper - 1];
        let (p1, c1) = stops[upper];
        let f = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
        RGBColor(lerp(c0.0, c1.0), lerp(c0.1, c1.1), lerp(c0.2, c1.2))
    }
}

impl fmt::Display for ColorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownColorMap(pub String);

impl fmt::Display for UnknownColorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = ColorMap::ALL.iter().map(|c| c.name()).collect();
        write!(f, "unknown color map '{}', expected one of: {}", self.0, names.join(", "))
    }
}

impl std::error::Error for UnknownColorMap {}

impl FromStr for ColorMap {
    type Err = UnknownColorMap;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorMap::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| UnknownColorMap(s.to_string()))
    }
}
