//! Page description composition
//!
//! [`compose`] turns questions, a layout mode, and header text into a
//! [`PageDescription`]: an engine-agnostic tree of header lines, question
//! sections, and a footer. It performs no I/O; the tree is handed to a
//! rendering engine (see [`crate::pdf::PdfRenderer`]).
//!
//! The answers flag only adds an answer line to each section. Everything else,
//! including numbering, option letters, and section slots, is the same for
//! both settings.

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::layout::{flow_style, section_slot, FlowStyle, LayoutMode, SectionSlot};
use crate::question::{HeaderMetadata, Question};

/// Text drawn at the bottom of every page
pub const FOOTER_TEXT: &str = "End of Page";

/// Number of options that can be lettered (A-Z)
pub const MAX_OPTIONS: usize = 26;

/// RGB color, components 0-255
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const GREEN: Color = Color { r: 0, g: 128, b: 0 };
    pub const LIGHT_GRAY: Color = Color { r: 217, g: 217, b: 217 };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextStyle {
    pub font_size: f64,
    pub bold: bool,
    pub align: TextAlign,
    pub color: Color,
}

impl TextStyle {
    const fn plain(font_size: f64) -> Self {
        Self {
            font_size,
            bold: false,
            align: TextAlign::Left,
            color: Color::BLACK,
        }
    }

    const fn centered(font_size: f64) -> Self {
        Self {
            font_size,
            bold: false,
            align: TextAlign::Center,
            color: Color::BLACK,
        }
    }
}

const TITLE_STYLE: TextStyle = TextStyle {
    font_size: 16.0,
    bold: true,
    align: TextAlign::Center,
    color: Color::BLACK,
};
const HEADER_STYLE: TextStyle = TextStyle::centered(12.0);
const QUESTION_STYLE: TextStyle = TextStyle::plain(12.0);
const OPTION_STYLE: TextStyle = TextStyle::plain(10.0);
const ANSWER_STYLE: TextStyle = TextStyle {
    font_size: 10.0,
    bold: false,
    align: TextAlign::Left,
    color: Color::GREEN,
};
const FOOTER_STYLE: TextStyle = TextStyle::centered(10.0);

/// One line of styled text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    pub style: TextStyle,
}

impl TextLine {
    fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// School name, subject, and date, in that order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderBlock {
    pub lines: Vec<TextLine>,
}

/// One question section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionBlock {
    /// Display number (position in the input, starting at 1)
    pub number: usize,
    pub question_id: String,
    pub prompt: TextLine,
    pub options: Vec<TextLine>,
    /// Present only when answers are shown
    pub answer: Option<TextLine>,
    pub slot: SectionSlot,
}

impl QuestionBlock {
    /// All lines of the section in drawing order
    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        std::iter::once(&self.prompt)
            .chain(self.options.iter())
            .chain(self.answer.iter())
    }
}

/// Footer anchored to the bottom margin of every page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FooterBlock {
    pub text: TextLine,
    /// Draw a rule above the footer text
    pub rule: bool,
}

/// Diagonal text drawn behind the page content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Watermark {
    pub text: String,
    pub font_size: f64,
    pub color: Color,
    /// Counter-clockwise rotation
    pub angle_degrees: f64,
}

/// Abstract description of an exam document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageDescription {
    pub layout: LayoutMode,
    pub flow: FlowStyle,
    pub header: HeaderBlock,
    pub sections: Vec<QuestionBlock>,
    pub footer: FooterBlock,
    pub watermark: Option<Watermark>,
}

impl PageDescription {
    /// The same description with every answer line removed
    pub fn without_answers(&self) -> PageDescription {
        let mut description = self.clone();
        for section in &mut description.sections {
            section.answer = None;
        }
        description
    }

    /// Whether any section carries an answer line
    pub fn shows_answers(&self) -> bool {
        self.sections.iter().any(|section| section.answer.is_some())
    }
}

/// Letter for the option at `index`: 0 → 'A', 25 → 'Z'
///
/// Returns `None` past 'Z'.
pub fn option_letter(index: usize) -> Option<char> {
    if index < MAX_OPTIONS {
        Some((b'A' + index as u8) as char)
    } else {
        None
    }
}

/// Check that every question can be composed
///
/// Questions with more than [`MAX_OPTIONS`] options are rejected rather than
/// lettered past 'Z'.
pub fn validate(questions: &[Question]) -> Result<()> {
    for question in questions {
        let count = question.options().len();
        if count > MAX_OPTIONS {
            return Err(Error::TooManyOptions {
                question_id: question.id.clone(),
                count,
            });
        }
    }
    Ok(())
}

/// Build the page description for one document
pub fn compose(
    questions: &[Question],
    layout: LayoutMode,
    show_answers: bool,
    header: &HeaderMetadata,
) -> Result<PageDescription> {
    let header_block = HeaderBlock {
        lines: vec![
            TextLine::new(header.school_name.as_str(), TITLE_STYLE),
            TextLine::new(format!("Subject: {}", header.subject), HEADER_STYLE),
            TextLine::new(format!("Date: {}", header.date), HEADER_STYLE),
        ],
    };

    let sections = questions
        .iter()
        .enumerate()
        .map(|(index, question)| compose_section(index, question, layout, show_answers))
        .collect::<Result<Vec<_>>>()?;

    let watermark = match header.watermark.trim() {
        "" => None,
        text => Some(Watermark {
            text: text.to_string(),
            font_size: 60.0,
            color: Color::LIGHT_GRAY,
            angle_degrees: 45.0,
        }),
    };

    debug!(
        questions = sections.len(),
        %layout,
        show_answers,
        watermark = watermark.is_some(),
        "composed page description"
    );

    Ok(PageDescription {
        layout,
        flow: flow_style(layout),
        header: header_block,
        sections,
        footer: FooterBlock {
            text: TextLine::new(FOOTER_TEXT, FOOTER_STYLE),
            rule: true,
        },
        watermark,
    })
}

fn compose_section(
    index: usize,
    question: &Question,
    layout: LayoutMode,
    show_answers: bool,
) -> Result<QuestionBlock> {
    let number = index + 1;

    let options = question
        .options()
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let letter = option_letter(i).ok_or_else(|| Error::TooManyOptions {
                question_id: question.id.clone(),
                count: question.options().len(),
            })?;
            Ok(TextLine::new(format!("{}) {}", letter, option), OPTION_STYLE))
        })
        .collect::<Result<Vec<_>>>()?;

    let answer = show_answers
        .then(|| TextLine::new(format!("Answer: {}", question.answer), ANSWER_STYLE));

    Ok(QuestionBlock {
        number,
        question_id: question.id.clone(),
        prompt: TextLine::new(format!("{}. {}", number, question.text), QUESTION_STYLE),
        options,
        answer,
        slot: section_slot(layout, index),
    })
}
