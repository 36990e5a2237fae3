/// Sentence openers; each is rendered as `"{filler}, {line}"`.
pub const FILLERS: [&str; 28] = [
    "Yaar",
    "Bhai",
    "Bro",
    "Matlab",
    "Basically",
    "Toh",
    "Sunn",
    "Dekho",
    "Arre",
    "Arrey",
    "Accha",
    "Achha",
    "Haina",
    "Na",
    "You know",
    "I mean",
    "Well",
    "Like",
    "Actually",
    "Seriously",
    "Chalo",
    "Wahi toh",
    "Arey yaar",
    "Bhai yaar",
    "Like that only",
    "Ek minute",
    "Samjhe",
    "Legit",
];

/// Replaces a trailing `?` on questions.
pub const CONFIRMATION_SUFFIX: &str = "haina?";

/// Romanized words the Hindi voices misread, mapped to Devanagari.
pub const PHONETIC_SUBSTITUTIONS: [(&str, &str); 4] = [
    ("tune", "तूने"),
    ("cheezein", "चीज़ें"),
    ("cheeze", "चीज़ें"),
    ("cheez", "चीज़"),
];
