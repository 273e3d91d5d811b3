//! The CFG text format.
//!
//! A stream is a concatenation of self-delimited blocks:
//!
//! ```text
//! BEGIN_CFG
//! Size
//! <atom_count>
//! Supercell                                   (omitted when non-periodic)
//! <ax> <ay> <az>                              (one row per periodic axis)
//! AtomData: id type cartes_x cartes_y cartes_z [fx fy fz]
//! <id> <type> <x> <y> <z> [<fx> <fy> <fz>]
//! Energy                                      (optional)
//! <energy>
//! PlusStress: xx yy zz yz xz xy               (optional)
//! <xx> <yy> <zz> <yz> <xz> <xy>
//! Feature identification <value>              (optional)
//! END_CFG
//! ```

use std::fmt;

pub mod reader;
pub mod writer;

pub(crate) const BEGIN_CFG: &str = "BEGIN_CFG";
pub(crate) const SIZE: &str = "Size";
pub(crate) const SUPERCELL: &str = "Supercell";
pub(crate) const ATOM_DATA: &str = "AtomData";
pub(crate) const ENERGY: &str = "Energy";
pub(crate) const PLUS_STRESS: &str = "PlusStress";
pub(crate) const END_CFG: &str = "END_CFG";
pub(crate) const FEATURE: &str = "Feature";
pub(crate) const IDENTIFICATION: &str = "identification";

/// Reader states. Every keyword line moves the scanner into exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    None,
    Begin,
    Size,
    Cell,
    Atom,
    Energy,
    Stress,
    Feature,
    End,
}

impl State {
    /// The keyword that moves the scanner into this state.
    pub fn keyword(self) -> &'static str {
        match self {
            State::None => "",
            State::Begin => BEGIN_CFG,
            State::Size => SIZE,
            State::Cell => SUPERCELL,
            State::Atom => ATOM_DATA,
            State::Energy => ENERGY,
            State::Stress => PLUS_STRESS,
            State::Feature => FEATURE,
            State::End => END_CFG,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::None => write!(f, "top-level"),
            other => write!(f, "{}", other.keyword()),
        }
    }
}

/// Keyword lines in the order they are tested; the first contained keyword wins.
const KEYWORD_ORDER: [State; 7] = [
    State::Begin,
    State::Size,
    State::Cell,
    State::Atom,
    State::Energy,
    State::Stress,
    State::End,
];

/// Classifies a line by case-sensitive keyword containment.
///
/// `Feature` records are matched by prefix before anything else so that feature
/// names containing another keyword are not misread. Returns `None` for data lines.
pub(crate) fn classify(line: &str) -> Option<State> {
    if line.trim_start().starts_with(FEATURE) {
        return Some(State::Feature);
    }
    KEYWORD_ORDER
        .into_iter()
        .find(|state| line.contains(state.keyword()))
}
