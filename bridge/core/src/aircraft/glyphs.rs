//! Display glyphs substituted for simulator control/symbol characters

/// `°`
pub const DEGREES: char = '\u{00B0}';
/// `☐`
pub const BALLOT_BOX: char = '\u{2610}';
/// `←`
pub const LEFT_ARROW: char = '\u{2190}';
/// `↑`
pub const UP_ARROW: char = '\u{2191}';
/// `→`
pub const RIGHT_ARROW: char = '\u{2192}';
/// `↓`
pub const DOWN_ARROW: char = '\u{2193}';
/// `Δ`
pub const GREEK_DELTA: char = '\u{0394}';
