//! Section header detection.
//!
//! A header line has the shape
//! `<5-digit code> <certification label> 工作項目<digits>：<title>`, e.g.
//! `11900 電腦軟體設計 丙級 工作項目01：電腦概論`. Headers are recognized at
//! the start of any line, so a whole-page text block that switches work items
//! mid-page is split correctly.

use regex::Regex;

use crate::model::Section;

/// Whether a section is currently accepting questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SegmenterState {
    /// No header seen yet (initial state)
    #[default]
    NoSectionOpen,
    /// A section is open and receives questions
    SectionOpen(Section),
}

impl SegmenterState {
    /// Open `section`, returning the previously open one (now closed).
    pub fn open(&mut self, section: Section) -> Option<Section> {
        match std::mem::replace(self, SegmenterState::SectionOpen(section)) {
            SegmenterState::SectionOpen(previous) => Some(previous),
            SegmenterState::NoSectionOpen => None,
        }
    }

    /// Close the open section, if any.
    pub fn close(&mut self) -> Option<Section> {
        match std::mem::take(self) {
            SegmenterState::SectionOpen(section) => Some(section),
            SegmenterState::NoSectionOpen => None,
        }
    }

    /// Check if a section is open.
    pub fn is_open(&self) -> bool {
        matches!(self, SegmenterState::SectionOpen(_))
    }

    /// The open section.
    pub fn current(&self) -> Option<&Section> {
        match self {
            SegmenterState::SectionOpen(section) => Some(section),
            SegmenterState::NoSectionOpen => None,
        }
    }

    /// The open section, mutably.
    pub fn current_mut(&mut self) -> Option<&mut Section> {
        match self {
            SegmenterState::SectionOpen(section) => Some(section),
            SegmenterState::NoSectionOpen => None,
        }
    }
}

/// A piece of a text block: either a header or the text between headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'t> {
    /// A header line, parsed into an empty section
    Header(Section),
    /// Text to be tokenized into questions
    Body(&'t str),
}

/// Splits text blocks on section header lines.
#[derive(Debug, Clone)]
pub struct Segmenter {
    header: Regex,
}

impl Segmenter {
    /// Create a segmenter for the work-item header grammar.
    pub fn new() -> Self {
        Self {
            header: Regex::new(
                r"(?m)^[^\S\n]*(\d{5})[^\S\n]+(.*?)[^\S\n]+工作項目(\d+)：[^\S\n]*(.+?)[^\S\n]*$",
            )
            .expect("valid section header pattern"),
        }
    }

    /// Parse a single header line.
    pub fn match_header(&self, line: &str) -> Option<Section> {
        let caps = self.header.captures(line.trim())?;
        (caps.get(0)?.start() == 0).then(|| section_from(&caps))
    }

    /// Split a text block into headers and bodies, in order.
    ///
    /// Empty bodies are omitted.
    pub fn split<'t>(&self, text: &'t str) -> Vec<Segment<'t>> {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in self.header.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            push_body(&mut segments, &text[last..whole.start()]);
            segments.push(Segment::Header(section_from(&caps)));
            last = whole.end();
        }
        push_body(&mut segments, &text[last..]);

        segments
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

fn push_body<'t>(segments: &mut Vec<Segment<'t>>, body: &'t str) {
    if !body.trim().is_empty() {
        segments.push(Segment::Body(body));
    }
}

fn section_from(caps: &regex::Captures<'_>) -> Section {
    Section::new(
        &caps[1],
        caps[2].trim(),
        &caps[3],
        caps[4].trim_end_matches('\r').trim(),
    )
}
