//! In-memory hunk application.
//!
//! Hunks match exactly (no fuzz). A hunk may land away from the line its
//! header states, as long as it lands after the previous hunk; the nearest
//! matching position wins.

use crate::model::Hunk;

/// A text file split into lines without terminators.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextFile {
    pub lines: Vec<String>,
    /// The last line is not terminated by a newline.
    pub missing_newline: bool,
}

impl TextFile {
    pub fn parse(content: &str) -> Self {
        let mut file = Self::default();
        for piece in content.split_inclusive('\n') {
            match piece.strip_suffix('\n') {
                Some(line) => file.lines.push(line.to_string()),
                None => {
                    file.lines.push(piece.to_string());
                    file.missing_newline = true;
                }
            }
        }
        file
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if !self.lines.is_empty() && !self.missing_newline {
            out.push('\n');
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Where the hunks of a file landed relative to their headers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Fit {
    /// Every hunk matched at the line its header states.
    #[default]
    Exact,
    /// At least one hunk only matched further up or down the file.
    Shifted,
}

impl Fit {
    pub fn join(self, other: Fit) -> Fit {
        if self == Fit::Exact { other } else { Fit::Shifted }
    }
}

/// Why a hunk could not be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mismatch {
    /// One-based hunk number within the file.
    pub hunk: usize,
    /// One-based line the hunk header points at.
    pub line: usize,
}

/// Apply `hunks` in order to `file`, returning the new content and whether
/// any hunk had to move to match.
pub fn apply_hunks(file: &TextFile, hunks: &[Hunk]) -> Result<(TextFile, Fit), Mismatch> {
    let mut out = Vec::with_capacity(file.lines.len());
    let mut missing_newline = file.missing_newline;
    let mut cursor = 0usize;
    let mut offset = 0isize;
    let mut fit = Fit::Exact;

    for (idx, hunk) in hunks.iter().enumerate() {
        let mismatch = Mismatch {
            hunk: idx + 1,
            line: hunk.old_start,
        };
        let preimage: Vec<&str> = hunk.preimage().collect();
        let stated = hunk.stated_index();
        let wanted = stated.saturating_add_signed(offset);

        let pos = find_position(&file.lines, &preimage, wanted, cursor).ok_or(mismatch)?;
        if pos != stated {
            fit = Fit::Shifted;
        }
        let end = pos + preimage.len();
        let reaches_eof = end == file.lines.len();

        // The newline state of the old file's last line is part of the preimage.
        if !preimage.is_empty() {
            let file_state = reaches_eof && file.missing_newline;
            if hunk.old_missing_newline != file_state {
                return Err(mismatch);
            }
        }

        out.extend(file.lines[cursor..pos].iter().cloned());
        out.extend(hunk.postimage().map(str::to_string));
        cursor = end;
        offset = pos as isize - stated as isize;

        if reaches_eof {
            missing_newline = hunk.new_missing_newline;
        }
    }

    out.extend(file.lines[cursor..].iter().cloned());
    let patched = TextFile {
        lines: out,
        missing_newline,
    };
    Ok((patched, fit))
}

fn find_position(lines: &[String], preimage: &[&str], wanted: usize, min: usize) -> Option<usize> {
    let max = lines.len().checked_sub(preimage.len())?;
    if min > max {
        return None;
    }
    if preimage.is_empty() {
        return (min..=max).contains(&wanted).then_some(wanted);
    }

    let matches_at = |pos: usize| {
        lines[pos..pos + preimage.len()]
            .iter()
            .zip(preimage)
            .all(|(have, want)| have == want)
    };

    let start = wanted.clamp(min, max);
    let span = (start - min).max(max - start);
    for distance in 0..=span {
        if let Some(pos) = start.checked_add(distance).filter(|p| *p <= max) {
            if matches_at(pos) {
                return Some(pos);
            }
        }
        if distance > 0 {
            if let Some(pos) = start.checked_sub(distance).filter(|p| *p >= min) {
                if matches_at(pos) {
                    return Some(pos);
                }
            }
        }
    }
    None
}
