//! Go layout for generated fragments.
//!
//! Fragments are assembled with line breaks but no indentation. This pass
//! checks that every bracket is matched, then indents the way `gofmt` lays out
//! call arguments and method chains:
//!
//! * a line that leaves brackets open indents the following lines one tab,
//!   however many brackets it opened;
//! * a line starting with closers goes back to the level of its opener;
//! * a top-level line ending in `.` continues a method chain, and the lines
//!   after it get one extra tab.
use crate::error::{GenError, Result};

pub fn format_source(raw: &str) -> Result<String> {
    Layout::default()
        .run(raw)
        .map_err(|message| GenError::Formatting { message, raw: raw.to_string() })
}

#[derive(Default)]
struct Layout {
    /// Open brackets with the line they were opened on.
    open: Vec<(char, usize)>,
    /// Per indenting line, how many of its openers are still unclosed.
    groups: Vec<usize>,
    chain: usize,
}

impl Layout {
    fn run(mut self, raw: &str) -> Result<String, String> {
        let mut out = String::with_capacity(raw.len() * 2);
        for (idx, line) in raw.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim();
            let brackets = scan_brackets(line).map_err(|e| format!("line {line_no}: {e}"))?;
            let leading = line.chars().take_while(|c| is_closer(*c)).count();

            for &c in &brackets[..leading] {
                self.close(c, line_no)?;
                self.release_group();
            }
            if !line.is_empty() {
                out.extend(std::iter::repeat_n('\t', self.chain + self.groups.len()));
                out.push_str(line);
            }
            out.push('\n');

            let mut line_open = 0;
            for &c in &brackets[leading..] {
                if is_closer(c) {
                    self.close(c, line_no)?;
                    if line_open > 0 {
                        line_open -= 1;
                    } else {
                        self.release_group();
                    }
                } else {
                    self.open.push((c, line_no));
                    line_open += 1;
                }
            }
            if line_open > 0 {
                self.groups.push(line_open);
            }
            if self.open.is_empty() && line.ends_with('.') {
                self.chain = 1;
            }
        }
        if let Some(&(c, line_no)) = self.open.last() {
            return Err(format!("unclosed {c:?} opened on line {line_no}"));
        }
        Ok(out.trim().to_string())
    }

    fn close(&mut self, c: char, line_no: usize) -> Result<(), String> {
        match self.open.pop() {
            Some((opener, _)) if closer_for(opener) == c => Ok(()),
            Some((opener, opened_on)) => Err(format!(
                "line {line_no}: {c:?} does not match {opener:?} opened on line {opened_on}"
            )),
            None => Err(format!("line {line_no}: unexpected {c:?}")),
        }
    }

    fn release_group(&mut self) {
        if let Some(top) = self.groups.last_mut() {
            *top -= 1;
            if *top == 0 {
                self.groups.pop();
            }
        }
    }
}

fn is_closer(c: char) -> bool {
    matches!(c, ')' | ']' | '}')
}

fn closer_for(opener: char) -> char {
    match opener {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Brackets of one line in order, skipping string, rune and raw-string
/// literals and `//` comments. Literals must close on the line they open.
fn scan_brackets(line: &str) -> Result<Vec<char>, String> {
    let mut brackets = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '(' | '[' | '{' | ')' | ']' | '}' => brackets.push(c),
            '"' | '\'' => loop {
                match chars.next() {
                    Some('\\') => {
                        chars.next();
                    }
                    Some(q) if q == c => break,
                    Some(_) => {}
                    None => return Err("unterminated literal".to_string()),
                }
            },
            '`' => {
                if !chars.by_ref().any(|q| q == '`') {
                    return Err("unterminated raw string".to_string());
                }
            }
            '/' if chars.peek() == Some(&'/') => break,
            _ => {}
        }
    }
    Ok(brackets)
}
