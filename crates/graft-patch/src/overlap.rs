use crate::model::FileChange;
use crate::{Error, PatchFile, Result};
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::PathBuf;

/// Reject a patch set in which two patches touch overlapping lines of the
/// same file. Creating or deleting a file claims all of it.
///
/// Ranges come from hunk headers in the old file, so the check is purely
/// static and runs before anything is written.
pub fn check_overlaps(patches: &[PatchFile]) -> Result<()> {
    let mut claims: BTreeMap<PathBuf, Vec<(usize, Range<usize>)>> = BTreeMap::new();

    for (idx, patch) in patches.iter().enumerate() {
        for file in &patch.patch().files {
            let ranges: Vec<Range<usize>> = match file.change() {
                FileChange::Create | FileChange::Delete => vec![0..usize::MAX],
                FileChange::Modify => file.hunks.iter().map(|h| h.old_range()).collect(),
            };
            let entry = claims.entry(file.target().to_path_buf()).or_default();

            for range in ranges {
                if let Some((other, _)) = entry
                    .iter()
                    .find(|(owner, held)| *owner != idx && overlaps(held, &range))
                {
                    return Err(Error::Overlap {
                        file: file.target().to_path_buf(),
                        first: patches[*other].name().to_string(),
                        second: patch.name().to_string(),
                    });
                }
                entry.push((idx, range));
            }
        }
    }
    Ok(())
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}
