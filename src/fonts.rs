//! Process-wide font registration
//!
//! Documents use the standard Times faces, which every PDF viewer provides,
//! so nothing is embedded. What does need loading is the metric table used to
//! measure and wrap text. [`register`] does that exactly once; renderers are
//! constructed from the returned `&'static FontSet` so no render can run
//! before registration.

use once_cell::sync::OnceCell;
use tracing::debug;

/// A single font face with its advance widths
#[derive(Debug)]
pub struct FontFace {
    /// PostScript name written as `/BaseFont`
    pub base_font: &'static str,
    /// Resource name used in content streams (`/F1`, `/F2`)
    pub resource_name: &'static str,
    widths: &'static [u16; 95],
}

impl FontFace {
    /// Advance width of one character in 1/1000ths of the em square
    pub fn char_width(&self, ch: char) -> u16 {
        let code = ch as u32;
        if (32..=126).contains(&code) {
            self.widths[(code - 32) as usize]
        } else {
            DEFAULT_WIDTH
        }
    }

    /// Width of `text` in points at `font_size`
    pub fn text_width(&self, text: &str, font_size: f64) -> f64 {
        let units: u32 = text.chars().map(|ch| self.char_width(ch) as u32).sum();
        units as f64 * font_size / 1000.0
    }
}

/// The faces available to page descriptions
#[derive(Debug)]
pub struct FontSet {
    pub regular: FontFace,
    pub bold: FontFace,
}

impl FontSet {
    /// Face for a text weight
    pub fn face(&self, bold: bool) -> &FontFace {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }

    /// Both faces in resource order
    pub fn faces(&self) -> [&FontFace; 2] {
        [&self.regular, &self.bold]
    }
}

static FONTS: OnceCell<FontSet> = OnceCell::new();

/// Register the document fonts, returning the process-wide set
///
/// Safe to call more than once; only the first call loads anything.
pub fn register() -> &'static FontSet {
    FONTS.get_or_init(|| {
        debug!("registering Times-Roman and Times-Bold metrics");
        FontSet {
            regular: FontFace {
                base_font: "Times-Roman",
                resource_name: "F1",
                widths: &TIMES_ROMAN_WIDTHS,
            },
            bold: FontFace {
                base_font: "Times-Bold",
                resource_name: "F2",
                widths: &TIMES_BOLD_WIDTHS,
            },
        }
    })
}

const DEFAULT_WIDTH: u16 = 500;

/// Times-Roman widths for characters 32-126
#[rustfmt::skip]
const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, // space ! " # $ % & ' ( )
    500, 564, 250, 333, 250, 278, 500, 500, 500, 500, // * + , - . / 0 1 2 3
    500, 500, 500, 500, 500, 500, 278, 278, 564, 564, // 4 5 6 7 8 9 : ; < =
    564, 444, 921, 722, 667, 667, 722, 611, 556, 722, // > ? @ A B C D E F G
    722, 333, 389, 722, 611, 889, 722, 722, 556, 722, // H I J K L M N O P Q
    667, 556, 611, 722, 722, 944, 722, 722, 611, 333, // R S T U V W X Y Z [
    278, 333, 469, 500, 333, 444, 500, 444, 500, 444, // \ ] ^ _ ` a b c d e
    333, 500, 500, 278, 278, 500, 278, 778, 500, 500, // f g h i j k l m n o
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, // p q r s t u v w x y
    444, 480, 200, 480, 541,                          // z { | } ~
];

/// Times-Bold widths for characters 32-126
#[rustfmt::skip]
const TIMES_BOLD_WIDTHS: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, // space ! " # $ % & ' ( )
    500, 570, 250, 333, 250, 278, 500, 500, 500, 500,  // * + , - . / 0 1 2 3
    500, 500, 500, 500, 500, 500, 333, 333, 570, 570,  // 4 5 6 7 8 9 : ; < =
    570, 500, 930, 722, 667, 722, 722, 667, 611, 778,  // > ? @ A B C D E F G
    778, 389, 500, 778, 667, 944, 722, 778, 611, 778,  // H I J K L M N O P Q
    722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, // R S T U V W X Y Z [
    278, 333, 581, 500, 333, 500, 556, 444, 556, 444,  // \ ] ^ _ ` a b c d e
    333, 500, 556, 278, 333, 556, 278, 833, 556, 500,  // f g h i j k l m n o
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500,  // p q r s t u v w x y
    444, 394, 220, 394, 520,                           // z { | } ~
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let first = register();
        let second = register();
        assert!(std::ptr::eq(first, second));
        assert!(FONTS.get().is_some());
    }

    #[test]
    fn test_char_widths() {
        let fonts = register();
        assert_eq!(fonts.regular.char_width(' '), 250);
        assert_eq!(fonts.regular.char_width('A'), 722);
        assert_eq!(fonts.bold.char_width('W'), 1000);
        assert_eq!(fonts.regular.char_width('é'), DEFAULT_WIDTH);
    }

    #[test]
    fn test_text_width() {
        let fonts = register();
        // "AB" = 722 + 667 units
        let width = fonts.regular.text_width("AB", 10.0);
        assert!((width - 13.89).abs() < 1e-9);
        let bold = fonts.bold.text_width("Lincoln High", 16.0);
        assert!(bold > fonts.regular.text_width("Lincoln High", 16.0));
    }
}
