//! Form-page markup source.
//!
//! A qualifying table row has a center-aligned cell holding the question
//! number and a cell holding radio controls:
//!
//! ```html
//! <tr>
//!   <td align="center">5</td>
//!   <td>題目內容
//!     <p><input type="radio" name="q5" value="1">(1)&nbsp;甲&nbsp;&nbsp;</p>
//!     <p><input type="radio" name="q5" value="2">(2)&nbsp;乙&nbsp;&nbsp;</p>
//!   </td>
//!   <td><input type="hidden" id="ans5_correct" value="2"></td>
//! </tr>
//! ```
//!
//! Each such row becomes one text block `"<number>. <title>"` carrying the
//! row's controls. Markup pages have no pages and no images; every block is
//! tagged page 1.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;

use crate::error::Result;
use crate::model::{Block, FormControl, FormRow, TextBlock};

use super::{BlockSource, SourceKind};

/// Block source over the numbered rows of a form page.
#[derive(Debug)]
pub struct MarkupSource {
    rows: std::vec::IntoIter<Block>,
}

impl MarkupSource {
    /// Parse a form page.
    pub fn parse(html: &str) -> Self {
        // Server-side script islands (`<% ... %>`)
        let script_island = Regex::new(r"(?s)<%.*?%>").expect("valid script island pattern");
        // Identifier convention of the correct-answer control
        let correct_id = Regex::new(r"ans(\d+)_correct").expect("valid correct-control pattern");

        let cleaned = script_island.replace_all(html, "");
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(&*cleaned);

        let mut rows = Vec::new();
        collect_elements(&dom.document, "tr", &mut rows);

        let blocks: Vec<Block> = rows
            .iter()
            .filter_map(|row| row_block(row, &correct_id))
            .collect();
        log::debug!(
            "Markup source: {} rows, {} qualifying",
            rows.len(),
            blocks.len()
        );

        Self {
            rows: blocks.into_iter(),
        }
    }

    /// Number of qualifying rows not yet yielded.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl Iterator for MarkupSource {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(Ok)
    }
}

impl BlockSource for MarkupSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Markup
    }
}

/// Build the text block for a table row, if the row qualifies.
fn row_block(row: &Handle, correct_id: &Regex) -> Option<Block> {
    let mut cells = Vec::new();
    collect_cells(row, &mut cells);

    let number_cell = cells
        .iter()
        .find(|cell| attr(cell, "align").is_some_and(|a| a.eq_ignore_ascii_case("center")))?;
    let number = collapse_whitespace(&text_content(number_cell));
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let choice_cell = cells.iter().find(|cell| contains_radio(cell))?;

    let title = question_title(choice_cell);
    let mut controls = Vec::new();
    collect_controls(choice_cell, &mut controls);

    let form = FormRow {
        correct: correct_value(row, &number, correct_id),
        number: number.clone(),
        controls,
    };

    Some(Block::Text(
        TextBlock::new(1, format!("{}. {}", number, title)).with_form(form),
    ))
}

/// Question title: cell text before the first `<p>` or radio control,
/// whitespace collapsed.
fn question_title(cell: &Handle) -> String {
    let mut text = String::new();
    for child in cell.children.borrow().iter() {
        if local_name(child) == Some("p") || is_radio(child) || contains_radio(child) {
            break;
        }
        append_text(child, &mut text);
    }
    collapse_whitespace(&text)
}

/// Value of the row's correct-answer control.
///
/// Prefers `ans<number>_correct`; otherwise the first control following the
/// naming convention anywhere in the row.
fn correct_value(row: &Handle, number: &str, correct_id: &Regex) -> Option<String> {
    let mut inputs = Vec::new();
    collect_elements(row, "input", &mut inputs);

    let candidates: Vec<(String, Option<String>)> = inputs
        .iter()
        .filter_map(|input| {
            let id = attr(input, "id")?;
            let caps = correct_id.captures(&id)?;
            Some((caps[1].to_string(), attr(input, "value")))
        })
        .collect();

    candidates
        .iter()
        .find(|(n, _)| n == number)
        .or_else(|| candidates.first())
        .and_then(|(_, value)| value.clone())
}

/// Collect radio controls below `node` in document order.
fn collect_controls(node: &Handle, out: &mut Vec<FormControl>) {
    let children = node.children.borrow();
    for (i, child) in children.iter().enumerate() {
        if is_radio(child) {
            let trailing = children.get(i + 1).map(text_content);
            out.push(FormControl {
                value: attr(child, "value").unwrap_or_default(),
                fragment: text_content(node),
                trailing,
            });
        } else {
            collect_controls(child, out);
        }
    }
}

/// Collect the cells of a row without descending into nested tables.
fn collect_cells(node: &Handle, out: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        match local_name(child) {
            Some("td") | Some("th") => out.push(child.clone()),
            Some("table") => {}
            _ => collect_cells(child, out),
        }
    }
}

/// Collect all descendant elements with the given tag name.
fn collect_elements(node: &Handle, tag: &str, out: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        if local_name(child) == Some(tag) {
            out.push(child.clone());
        }
        collect_elements(child, tag, out);
    }
}

fn contains_radio(node: &Handle) -> bool {
    node.children
        .borrow()
        .iter()
        .any(|child| is_radio(child) || contains_radio(child))
}

fn is_radio(node: &Handle) -> bool {
    local_name(node) == Some("input")
        && attr(node, "type").is_some_and(|t| t.eq_ignore_ascii_case("radio"))
}

fn local_name(node: &Handle) -> Option<&str> {
    match node.data {
        NodeData::Element { ref name, .. } => Some(&*name.local),
        _ => None,
    }
}

fn attr(node: &Handle, key: &str) -> Option<String> {
    match node.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == key)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    append_text(node, &mut text);
    text
}

/// Append the text of `node` and its descendants; comments and scripts are skipped.
fn append_text(node: &Handle, out: &mut String) {
    match node.data {
        NodeData::Text { ref contents } => out.push_str(&contents.borrow()),
        NodeData::Element { ref name, .. }
            if matches!(&*name.local, "script" | "style") => {}
        NodeData::Element { .. } | NodeData::Document => {
            for child in node.children.borrow().iter() {
                append_text(child, out);
            }
        }
        _ => {}
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
