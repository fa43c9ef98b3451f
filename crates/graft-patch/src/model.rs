use std::ops::Range;
use std::path::{Path, PathBuf};

/// One line of a hunk body, without its line terminator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line {
    Context(String),
    Remove(String),
    Add(String),
}

impl Line {
    fn reversed(&self) -> Self {
        match self {
            Self::Context(s) => Self::Context(s.clone()),
            Self::Remove(s) => Self::Add(s.clone()),
            Self::Add(s) => Self::Remove(s.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<Line>,
    /// The last preimage line has no trailing newline.
    pub old_missing_newline: bool,
    /// The last postimage line has no trailing newline.
    pub new_missing_newline: bool,
}

impl Hunk {
    /// Lines the hunk expects to find: context and removals.
    pub fn preimage(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            Line::Context(s) | Line::Remove(s) => Some(s.as_str()),
            Line::Add(_) => None,
        })
    }

    /// Lines the hunk leaves behind: context and additions.
    pub fn postimage(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            Line::Context(s) | Line::Add(s) => Some(s.as_str()),
            Line::Remove(_) => None,
        })
    }

    /// Zero-based index of the first preimage line as stated by the header.
    ///
    /// A hunk with an empty preimage inserts after line `old_start`.
    pub fn stated_index(&self) -> usize {
        if self.old_len == 0 {
            self.old_start
        } else {
            self.old_start.saturating_sub(1)
        }
    }

    /// One-based line range of the preimage in the old file.
    pub fn old_range(&self) -> Range<usize> {
        let start = self.old_start.max(1);
        start..start + self.old_len.max(1)
    }

    pub fn reversed(&self) -> Self {
        Self {
            old_start: self.new_start,
            old_len: self.new_len,
            new_start: self.old_start,
            new_len: self.old_len,
            lines: self.lines.iter().map(Line::reversed).collect(),
            old_missing_newline: self.new_missing_newline,
            new_missing_newline: self.old_missing_newline,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileChange {
    Create,
    Delete,
    Modify,
}

/// The hunks a patch applies to one file.
///
/// `None` on either side stands for `/dev/null`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePatch {
    pub old_path: Option<PathBuf>,
    pub new_path: Option<PathBuf>,
    pub hunks: Vec<Hunk>,
}

impl FilePatch {
    pub fn change(&self) -> FileChange {
        match (&self.old_path, &self.new_path) {
            (None, _) => FileChange::Create,
            (_, None) => FileChange::Delete,
            _ => FileChange::Modify,
        }
    }

    /// Host-relative path of the file this patch touches.
    pub fn target(&self) -> &Path {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or_else(|| Path::new(""))
    }

    pub fn reversed(&self) -> Self {
        Self {
            old_path: self.new_path.clone(),
            new_path: self.old_path.clone(),
            hunks: self.hunks.iter().map(Hunk::reversed).collect(),
        }
    }
}

/// A parsed unified diff, possibly touching several files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Patch {
    pub files: Vec<FilePatch>,
}

impl Patch {
    pub fn parse(text: &str) -> crate::Result<Self> {
        crate::parse::parse(text)
    }

    pub fn reversed(&self) -> Self {
        Self {
            files: self.files.iter().map(FilePatch::reversed).collect(),
        }
    }

    pub fn targets(&self) -> Vec<PathBuf> {
        let mut targets: Vec<PathBuf> = Vec::new();
        for file in &self.files {
            let target = file.target().to_path_buf();
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        targets
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
