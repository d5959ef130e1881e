//! Material colours and the symbolic colour map.
//!
//! Renderables look up colours by key (`element.C`, `residue.ALA`,
//! `helix.?`). The map is plain text, one `name r g b` record per line.

use std::path::Path;

use rustc_hash::FxHashMap;

use crate::error::MolpassError;

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Colour {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Colour {
    /// Colour from channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Colour from floats in `0.0..=1.0`.
    #[must_use]
    pub fn from_f32(rgb: [f32; 3]) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(channel(rgb[0]), channel(rgb[1]), channel(rgb[2]))
    }

    /// Channels as floats in `0.0..=1.0`.
    #[must_use]
    pub fn to_f32(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }

    /// RGBA bytes with the given alpha.
    #[must_use]
    pub fn with_alpha(self, alpha: u8) -> [u8; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

const ELEMENTS: &[(&str, [u8; 3])] = &[
    ("H", [255, 255, 255]),
    ("C", [144, 144, 144]),
    ("N", [48, 80, 248]),
    ("O", [255, 13, 13]),
    ("S", [255, 255, 48]),
    ("P", [255, 128, 0]),
    ("Fe", [224, 102, 51]),
    ("Zn", [125, 128, 176]),
    ("Mg", [138, 255, 0]),
    ("Ca", [61, 255, 0]),
    ("Na", [171, 92, 242]),
    ("Cl", [31, 240, 31]),
];

const RESIDUES: &[(&str, [u8; 3])] = &[
    ("ALA", [200, 200, 200]),
    ("ARG", [20, 90, 255]),
    ("ASN", [0, 220, 220]),
    ("ASP", [230, 10, 10]),
    ("CYS", [230, 230, 0]),
    ("GLN", [0, 220, 220]),
    ("GLU", [230, 10, 10]),
    ("GLY", [235, 235, 235]),
    ("HIS", [130, 130, 210]),
    ("ILE", [15, 130, 15]),
    ("LEU", [15, 130, 15]),
    ("LYS", [20, 90, 255]),
    ("MET", [230, 230, 0]),
    ("PHE", [50, 50, 170]),
    ("PRO", [220, 150, 130]),
    ("SER", [250, 150, 0]),
    ("THR", [250, 150, 0]),
    ("TRP", [180, 90, 180]),
    ("TYR", [50, 50, 170]),
    ("VAL", [15, 130, 15]),
];

/// Symbolic key → colour table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColourMap {
    entries: FxHashMap<String, Colour>,
    fallback: Colour,
}

impl Default for ColourMap {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
            fallback: Colour::new(128, 128, 128),
        }
    }
}

impl ColourMap {
    /// Empty map with a grey fallback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// CPK element colours, amino-acid colours and the chain default.
    #[must_use]
    pub fn builtin() -> Self {
        let mut map = Self::new();
        for (symbol, [r, g, b]) in ELEMENTS {
            map.insert(&format!("element.{symbol}"), Colour::new(*r, *g, *b));
        }
        for (name, [r, g, b]) in RESIDUES {
            map.insert(&format!("residue.{name}"), Colour::new(*r, *g, *b));
        }
        map.insert("helix.?", Colour::new(240, 0, 128));
        map
    }

    /// Parse the text format.
    ///
    /// # Errors
    ///
    /// [`MolpassError::ColourMapParse`] on a record that is not a name
    /// followed by three integer channels in `0..=255`.
    pub fn parse(text: &str) -> Result<Self, MolpassError> {
        let mut map = Self::new();
        map.extend_from_str(text)?;
        Ok(map)
    }

    /// Load and parse a colour map file.
    ///
    /// # Errors
    ///
    /// [`MolpassError::Io`] if the file cannot be read, or
    /// [`MolpassError::ColourMapParse`] on a malformed record.
    pub fn load(path: &Path) -> Result<Self, MolpassError> {
        let text = std::fs::read_to_string(path).map_err(MolpassError::Io)?;
        Self::parse(&text)
    }

    /// Merge records from `text`; later records override earlier ones.
    ///
    /// # Errors
    ///
    /// [`MolpassError::ColourMapParse`] on a malformed record.
    pub fn extend_from_str(&mut self, text: &str) -> Result<(), MolpassError> {
        for (index, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let malformed = |message: &str| MolpassError::ColourMapParse {
                line: index + 1,
                message: message.to_owned(),
            };
            let [name, r, g, b] = fields.as_slice() else {
                return Err(malformed("expected `name r g b`"));
            };
            let channel = |s: &str| {
                s.parse::<u8>()
                    .map_err(|_| malformed("channel must be an integer in 0..=255"))
            };
            let colour = Colour::new(channel(*r)?, channel(*g)?, channel(*b)?);
            self.insert(*name, colour);
        }
        Ok(())
    }

    /// Set the colour of `key`.
    pub fn insert(&mut self, key: &str, colour: Colour) {
        let _ = self.entries.insert(key.to_owned(), colour);
    }

    /// Colour for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Colour> {
        self.entries.get(key).copied()
    }

    /// Colour for `key`, falling back to [`Self::fallback`].
    #[must_use]
    pub fn get_or_default(&self, key: &str) -> Colour {
        self.get(key).unwrap_or_else(|| {
            log::trace!("no colour for '{key}', using fallback");
            self.fallback
        })
    }

    /// Colour used for unknown keys.
    #[must_use]
    pub fn fallback(&self) -> Colour {
        self.fallback
    }

    /// Replace the fallback colour.
    pub fn set_fallback(&mut self, colour: Colour) {
        self.fallback = colour;
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Colour map key for an element symbol.
#[must_use]
pub fn element_key(symbol: &str) -> String {
    format!("element.{symbol}")
}

/// Colour map key for a residue name.
#[must_use]
pub fn residue_key(name: &str) -> String {
    format!("residue.{}", name.to_ascii_uppercase())
}

/// Colour map key used for whole chains.
pub const CHAIN_KEY: &str = "helix.?";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_and_comments() {
        let map = ColourMap::parse(
            "# element colours\nelement.C 10 20 30\n\nresidue.ALA 1 2 3 # alanine\n",
        )
        .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("element.C"), Some(Colour::new(10, 20, 30)));
        assert_eq!(map.get("residue.ALA"), Some(Colour::new(1, 2, 3)));
    }

    #[test]
    fn later_records_override() {
        let map = ColourMap::parse("a 1 1 1\na 2 2 2\n").unwrap();
        assert_eq!(map.get("a"), Some(Colour::new(2, 2, 2)));
    }

    #[test]
    fn malformed_record_reports_line() {
        let err = ColourMap::parse("a 1 1 1\nb 1 two 3\n").unwrap_err();
        assert!(matches!(err, MolpassError::ColourMapParse { line: 2, .. }));
        assert!(ColourMap::parse("c 1 1").is_err());
        assert!(ColourMap::parse("d 1 1 300").is_err());
    }

    #[test]
    fn missing_key_uses_fallback() {
        let mut map = ColourMap::builtin();
        assert_eq!(map.get("element.Xx"), None);
        map.set_fallback(Colour::new(1, 2, 3));
        assert_eq!(map.get_or_default("element.Xx"), Colour::new(1, 2, 3));
        assert_eq!(
            map.get_or_default(&element_key("O")),
            Colour::new(255, 13, 13)
        );
    }

    #[test]
    fn residue_keys_are_upper_case() {
        assert_eq!(residue_key("ala"), "residue.ALA");
        assert!(ColourMap::builtin().get(&residue_key("gly")).is_some());
    }

    #[test]
    fn float_conversion_round_trips() {
        let colour = Colour::from_f32([1.0, 0.5, 0.0]);
        assert_eq!(colour, Colour::new(255, 128, 0));
        assert_eq!(colour.with_alpha(7), [255, 128, 0, 7]);
    }
}
