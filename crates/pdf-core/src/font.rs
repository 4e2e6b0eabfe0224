//! Standard Type1 fonts used by overlays
//!
//! Overlays only need the base-14 fonts every PDF reader ships with, so
//! nothing is embedded: each font is a small Type1 dictionary referenced from
//! the page's `/Font` resources.

use lopdf::{Dictionary, Object};

/// A base-14 font available to overlay drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StandardFont {
    /// Helvetica, used for field values and text layers
    Helvetica,
    /// ZapfDingbats, used for the checkmark glyph
    ZapfDingbats,
}

impl StandardFont {
    /// PostScript name written to `/BaseFont`
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Resource name used in content streams (e.g. `/PfHelv 10 Tf`)
    ///
    /// The `Pf` prefix keeps overlay fonts clear of names already present
    /// in a blank form's resources.
    pub fn resource_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "PfHelv",
            StandardFont::ZapfDingbats => "PfZaDb",
        }
    }

    /// Whether text for this font is WinAnsi-encoded
    ///
    /// ZapfDingbats uses its built-in symbol encoding.
    pub fn uses_win_ansi(&self) -> bool {
        !matches!(self, StandardFont::ZapfDingbats)
    }

    /// Build the font dictionary for this font
    pub fn to_pdf_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Font".to_vec()));
        dict.set("Subtype", Object::Name(b"Type1".to_vec()));
        dict.set("BaseFont", Object::Name(self.base_font().as_bytes().to_vec()));
        if self.uses_win_ansi() {
            dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
        }
        dict
    }
}

/// Character code of the checkmark glyph (`a20`) in ZapfDingbats
pub const CHECKMARK_CODE: u8 = 0x34;
