//! Symbol shapes known to the classifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Music symbol shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Shape {
    /// Not a symbol
    Noise,
    /// Several symbols stuck together
    Clutter,

    /// Treble clef
    GClef,
    /// Small treble clef (clef change)
    GClefSmall,
    /// Treble clef, octave higher
    GClef8va,
    /// Treble clef, octave lower
    GClef8vb,
    /// Bass clef
    FClef,
    /// Small bass clef (clef change)
    FClefSmall,
    /// Alto or tenor clef
    CClef,
    /// Percussion clef
    PercussionClef,

    /// Flat sign
    Flat,
    /// Natural sign
    Natural,
    /// Sharp sign
    Sharp,
    /// Double sharp sign
    DoubleSharp,
    /// Double flat sign
    DoubleFlat,

    /// Time digit 0
    TimeZero,
    /// Time digit 1
    TimeOne,
    /// Time digit 2
    TimeTwo,
    /// Time digit 3
    TimeThree,
    /// Time digit 4
    TimeFour,
    /// Time digit 5
    TimeFive,
    /// Time digit 6
    TimeSix,
    /// Time digit 7
    TimeSeven,
    /// Time digit 8
    TimeEight,
    /// Time digit 9
    TimeNine,
    /// Common time (4/4)
    CommonTime,
    /// Cut time (2/2)
    CutTime,

    /// Filled note head
    NoteheadBlack,
    /// Hollow note head
    NoteheadVoid,
    /// Whole note
    WholeNote,
    /// Double whole note
    Breve,
    /// Augmentation dot
    AugmentationDot,
    /// Fermata
    Fermata,
    /// Ledger line
    Ledger,
}

impl Shape {
    /// Report whether this is one of the clef shapes.
    pub fn is_clef(self) -> bool {
        matches!(
            self,
            Shape::GClef
                | Shape::GClefSmall
                | Shape::GClef8va
                | Shape::GClef8vb
                | Shape::FClef
                | Shape::FClefSmall
                | Shape::CClef
                | Shape::PercussionClef
        )
    }

    /// Report whether this is an accidental.
    pub fn is_alteration(self) -> bool {
        matches!(
            self,
            Shape::Flat | Shape::Natural | Shape::Sharp | Shape::DoubleSharp | Shape::DoubleFlat
        )
    }

    /// Report whether this is a time signature part.
    pub fn is_time(self) -> bool {
        matches!(
            self,
            Shape::TimeZero
                | Shape::TimeOne
                | Shape::TimeTwo
                | Shape::TimeThree
                | Shape::TimeFour
                | Shape::TimeFive
                | Shape::TimeSix
                | Shape::TimeSeven
                | Shape::TimeEight
                | Shape::TimeNine
                | Shape::CommonTime
                | Shape::CutTime
        )
    }

    /// Shapes that do not represent a real symbol.
    pub fn is_garbage(self) -> bool {
        matches!(self, Shape::Noise | Shape::Clutter)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_families() {
        assert!(Shape::FClef.is_clef());
        assert!(!Shape::Sharp.is_clef());
        assert!(Shape::Sharp.is_alteration());
        assert!(Shape::CommonTime.is_time());
        assert!(Shape::Noise.is_garbage());
        assert!(!Shape::GClef.is_garbage());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Shape::GClef8vb).unwrap();
        assert_eq!(json, "\"GClef8vb\"");
        let back: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Shape::GClef8vb);
        assert_eq!(Shape::Flat.to_string(), "Flat");
    }
}
