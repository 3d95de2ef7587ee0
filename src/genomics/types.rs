use std::fmt;

/// Number of nucleotide symbols tracked per pileup column (A, C, G, T).
pub const NUM_BASES: usize = 4;

/// One of the four fixed nucleotide symbols a pileup column is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Nucleotide {
    /// Adenine.
    A = 0,
    /// Cytosine.
    C = 1,
    /// Guanine.
    G = 2,
    /// Thymine.
    T = 3,
}

impl Nucleotide {
    /// All symbols in table order.
    pub const ALL: [Nucleotide; NUM_BASES] =
        [Nucleotide::A, Nucleotide::C, Nucleotide::G, Nucleotide::T];

    /// Parse an uppercase ASCII base. Lowercase, `N` and IUPAC codes are rejected.
    pub fn from_ascii(base: u8) -> Option<Self> {
        match base {
            b'A' => Some(Nucleotide::A),
            b'C' => Some(Nucleotide::C),
            b'G' => Some(Nucleotide::G),
            b'T' => Some(Nucleotide::T),
            _ => None,
        }
    }

    /// Parse a `char` symbol, see [`Nucleotide::from_ascii`].
    pub fn from_char(symbol: char) -> Option<Self> {
        if symbol.is_ascii() {
            Self::from_ascii(symbol as u8)
        } else {
            None
        }
    }

    /// ASCII representation.
    pub fn as_ascii(self) -> u8 {
        match self {
            Nucleotide::A => b'A',
            Nucleotide::C => b'C',
            Nucleotide::G => b'G',
            Nucleotide::T => b'T',
        }
    }

    /// Index into per-base tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The three symbols differing from `self`, in table order.
    pub fn alternates(self) -> impl Iterator<Item = Nucleotide> {
        Self::ALL.into_iter().filter(move |&base| base != self)
    }
}

impl fmt::Display for Nucleotide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ascii() as char)
    }
}
