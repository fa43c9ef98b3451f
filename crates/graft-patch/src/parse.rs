//! Parser for git-style unified diffs.

use crate::model::{FilePatch, Hunk, Line, Patch};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use tracing::debug;

static HUNK_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap());

const DEV_NULL: &str = "/dev/null";

#[derive(Default)]
struct FileBuilder {
    git_paths: Option<(PathBuf, PathBuf)>,
    header: Option<(Option<PathBuf>, Option<PathBuf>)>,
    new_file: bool,
    deleted_file: bool,
    hunks: Vec<Hunk>,
}

impl FileBuilder {
    fn path_hint(&self) -> PathBuf {
        match (&self.header, &self.git_paths) {
            (Some((old, new)), _) => new.clone().or_else(|| old.clone()).unwrap_or_default(),
            (None, Some((_, new))) => new.clone(),
            (None, None) => PathBuf::new(),
        }
    }

    fn finish(self, line: usize) -> Result<Option<FilePatch>> {
        let (old_path, new_path) = match (self.header, self.git_paths) {
            (Some(header), _) => header,
            (None, Some((old, new))) => (
                (!self.new_file).then_some(old),
                (!self.deleted_file).then_some(new),
            ),
            (None, None) => return Ok(None),
        };

        match (&old_path, &new_path) {
            (None, None) => {
                return Err(Error::Parse {
                    line,
                    message: "both sides of the file header are /dev/null".into(),
                });
            }
            (Some(old), Some(new)) if old != new => {
                return Err(Error::Unsupported {
                    path: old.clone(),
                    reason: "renames are not supported",
                });
            }
            (Some(old), Some(_)) if self.hunks.is_empty() => {
                debug!(path = %old.display(), "skipping file entry without hunks");
                return Ok(None);
            }
            _ => {}
        }

        Ok(Some(FilePatch {
            old_path,
            new_path,
            hunks: self.hunks,
        }))
    }
}

pub(crate) fn parse(text: &str) -> Result<Patch> {
    let lines: Vec<&str> = text
        .split_inclusive('\n')
        .map(|l| l.strip_suffix('\n').unwrap_or(l))
        .collect();

    let mut files = Vec::new();
    let mut current: Option<FileBuilder> = None;
    let mut i = 0;

    while i < lines.len() {
        let header = lines[i].trim_end_matches('\r');

        if let Some(rest) = header.strip_prefix("diff --git ") {
            flush(&mut current, &mut files, i + 1)?;
            current = Some(FileBuilder {
                git_paths: parse_git_paths(rest),
                ..FileBuilder::default()
            });
            i += 1;
        } else if let Some((old, new)) = file_header(header, lines.get(i + 1).copied()) {
            let starts_new = current
                .as_ref()
                .is_none_or(|c| c.header.is_some() || !c.hunks.is_empty());
            if starts_new {
                flush(&mut current, &mut files, i + 1)?;
                current = Some(FileBuilder::default());
            }
            if let Some(builder) = current.as_mut() {
                builder.header = Some((old, new));
            }
            i += 2;
        } else if header.starts_with("@@") {
            let Some(builder) = current.as_mut().filter(|c| c.header.is_some()) else {
                return Err(Error::Parse {
                    line: i + 1,
                    message: "hunk appears before any file header".into(),
                });
            };
            let (hunk, consumed) = parse_hunk(&lines[i..], i)?;
            builder.hunks.push(hunk);
            i += consumed;
        } else {
            if let Some(builder) = current.as_mut() {
                extended_header(builder, header)?;
            }
            i += 1;
        }
    }
    flush(&mut current, &mut files, lines.len())?;

    if files.is_empty() {
        return Err(Error::Parse {
            line: lines.len(),
            message: "no file changes found".into(),
        });
    }
    Ok(Patch { files })
}

fn flush(current: &mut Option<FileBuilder>, files: &mut Vec<FilePatch>, line: usize) -> Result<()> {
    if let Some(builder) = current.take() {
        if let Some(file) = builder.finish(line)? {
            files.push(file);
        }
    }
    Ok(())
}

fn extended_header(builder: &mut FileBuilder, line: &str) -> Result<()> {
    if line.starts_with("new file mode") {
        builder.new_file = true;
    } else if line.starts_with("deleted file mode") {
        builder.deleted_file = true;
    } else if line.starts_with("GIT binary patch")
        || (line.starts_with("Binary files ") && line.ends_with(" differ"))
    {
        return Err(Error::Unsupported {
            path: builder.path_hint(),
            reason: "binary patches are not supported",
        });
    } else if line.starts_with("rename from") || line.starts_with("copy from") {
        return Err(Error::Unsupported {
            path: builder.path_hint(),
            reason: "renames and copies are not supported",
        });
    }
    Ok(())
}

/// Recognize a `--- old` / `+++ new` header pair.
fn file_header(line: &str, next: Option<&str>) -> Option<(Option<PathBuf>, Option<PathBuf>)> {
    let old = line.strip_prefix("--- ")?;
    let new = next?.trim_end_matches('\r').strip_prefix("+++ ")?;
    Some((parse_header_path(old, "a"), parse_header_path(new, "b")))
}

fn parse_header_path(raw: &str, prefix: &str) -> Option<PathBuf> {
    let raw = raw.split('\t').next().unwrap_or(raw).trim_end();
    if raw == DEV_NULL {
        return None;
    }
    let raw = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(raw);
    let stripped = raw
        .strip_prefix(prefix)
        .and_then(|r| r.strip_prefix('/'))
        .unwrap_or(raw);
    Some(PathBuf::from(stripped))
}

fn parse_git_paths(rest: &str) -> Option<(PathBuf, PathBuf)> {
    let split = rest.rfind(" b/")?;
    let old = rest[..split].strip_prefix("a/")?;
    let new = &rest[split + 3..];
    Some((PathBuf::from(old), PathBuf::from(new)))
}

/// Parse one hunk starting at its `@@` header. Returns the hunk and the
/// number of lines consumed.
fn parse_hunk(lines: &[&str], offset: usize) -> Result<(Hunk, usize)> {
    let header_line = offset + 1;
    let header = lines[0].trim_end_matches('\r');
    let caps = HUNK_HEADER.captures(header).ok_or_else(|| Error::Parse {
        line: header_line,
        message: format!("invalid hunk header '{header}'"),
    })?;
    let number = |idx: usize, default: usize| -> Result<usize> {
        caps.get(idx).map_or(Ok(default), |m| {
            m.as_str().parse().map_err(|_| Error::Parse {
                line: header_line,
                message: format!("line number out of range in '{header}'"),
            })
        })
    };

    let mut hunk = Hunk {
        old_start: number(1, 0)?,
        old_len: number(2, 1)?,
        new_start: number(3, 0)?,
        new_len: number(4, 1)?,
        lines: Vec::new(),
        old_missing_newline: false,
        new_missing_newline: false,
    };

    let mut old_left = hunk.old_len;
    let mut new_left = hunk.new_len;
    let mut i = 1;

    while old_left > 0 || new_left > 0 {
        let line_no = offset + i + 1;
        let Some(&raw) = lines.get(i) else {
            return Err(Error::Parse {
                line: line_no,
                message: "hunk ends before its stated length".into(),
            });
        };
        let mut chars = raw.chars();
        let marker = chars.next();
        let text = chars.as_str().to_string();

        match marker {
            // Some editors strip the single space of an empty context line.
            None | Some(' ') => {
                old_left = take(old_left, line_no)?;
                new_left = take(new_left, line_no)?;
                hunk.lines.push(Line::Context(text));
            }
            Some('-') => {
                old_left = take(old_left, line_no)?;
                hunk.lines.push(Line::Remove(text));
            }
            Some('+') => {
                new_left = take(new_left, line_no)?;
                hunk.lines.push(Line::Add(text));
            }
            Some('\\') => mark_missing_newline(&mut hunk),
            Some(_) => {
                return Err(Error::Parse {
                    line: line_no,
                    message: format!("unexpected line in hunk body: '{raw}'"),
                });
            }
        }
        i += 1;
    }

    if lines.get(i).is_some_and(|l| l.starts_with('\\')) {
        mark_missing_newline(&mut hunk);
        i += 1;
    }

    Ok((hunk, i))
}

fn take(left: usize, line: usize) -> Result<usize> {
    left.checked_sub(1).ok_or_else(|| Error::Parse {
        line,
        message: "hunk body is longer than its header states".into(),
    })
}

fn mark_missing_newline(hunk: &mut Hunk) {
    match hunk.lines.last() {
        Some(Line::Remove(_)) => hunk.old_missing_newline = true,
        Some(Line::Add(_)) => hunk.new_missing_newline = true,
        Some(Line::Context(_)) => {
            hunk.old_missing_newline = true;
            hunk.new_missing_newline = true;
        }
        None => {}
    }
}
