//! Managed section handling inside user-owned files (shell rc files).
//!
//! A managed section is delimited by start/end marker lines. Writing it
//! again replaces the previous block in place, so repeated installs do not
//! pile up copies.

use std::path::Path;
use std::sync::Arc;

use crate::application::{ApplicationResult, IoResultExt};
use crate::infrastructure::traits::FileSystem;

pub const START_SECTION_DELIMITER: &str =
    "#----------------------------- lambdeploy start -----------------------------";
pub const END_SECTION_DELIMITER: &str =
    "#------------------------------ lambdeploy end ------------------------------";

/// Write `data` into the managed section of `target`.
/// Replaces an existing section or appends one if not present.
pub fn upsert_section(
    fs: &Arc<dyn FileSystem>,
    target: &Path,
    data: &str,
) -> ApplicationResult<()> {
    fs.ensure_parent(target)
        .with_path_context("create parent directory", target)?;

    let content = if fs.exists(target) {
        fs.read_to_string(target).with_path_context("read", target)?
    } else {
        String::new()
    };

    let new_content = replace_section(&content, data);
    fs.write(target, &new_content).with_path_context("write", target)?;
    Ok(())
}

/// Remove the managed section from `target`. Returns whether one was found.
pub fn delete_section(fs: &Arc<dyn FileSystem>, target: &Path) -> ApplicationResult<bool> {
    if !fs.exists(target) {
        return Ok(false);
    }
    let content = fs.read_to_string(target).with_path_context("read", target)?;
    let lines: Vec<&str> = content.lines().collect();

    match section_bounds(&lines) {
        Some((start, end)) => {
            // drop the blank separator written on append
            let before = if start > 0 && lines[start - 1].trim().is_empty() {
                start - 1
            } else {
                start
            };
            let mut kept: Vec<&str> = lines[..before].to_vec();
            kept.extend_from_slice(&lines[end + 1..]);
            let mut new_content = kept.join("\n");
            if !new_content.is_empty() {
                new_content.push('\n');
            }
            fs.write(target, &new_content).with_path_context("write", target)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn section_bounds(lines: &[&str]) -> Option<(usize, usize)> {
    let start = lines
        .iter()
        .position(|l| l.starts_with(START_SECTION_DELIMITER))?;
    let end = lines
        .iter()
        .position(|l| l.starts_with(END_SECTION_DELIMITER))?;
    (start < end).then_some((start, end))
}

fn replace_section(content: &str, data: &str) -> String {
    // END delimiter must sit on its own line
    let data_normalized = if data.ends_with('\n') {
        data.to_string()
    } else {
        format!("{}\n", data)
    };
    let section = format!(
        "{}\n{}{}\n",
        START_SECTION_DELIMITER, data_normalized, END_SECTION_DELIMITER
    );

    let lines: Vec<&str> = content.lines().collect();
    match section_bounds(&lines) {
        Some((start, end)) => {
            let mut result = String::new();
            if start > 0 {
                result.push_str(&lines[..start].join("\n"));
                result.push('\n');
            }
            result.push_str(&section);
            if end + 1 < lines.len() {
                result.push_str(&lines[end + 1..].join("\n"));
                result.push('\n');
            }
            result
        }
        None => {
            let mut result = content.to_string();
            if !result.is_empty() && !result.ends_with('\n') {
                result.push('\n');
            }
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str(&section);
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_empty_file_when_replace_then_writes_only_section() {
        let out = replace_section("", "complete -F _x x");
        assert!(out.starts_with(START_SECTION_DELIMITER));
        assert!(out.contains("complete -F _x x\n"));
        assert!(out.ends_with(&format!("{}\n", END_SECTION_DELIMITER)));
    }

    #[test]
    fn given_existing_section_when_replace_then_swaps_in_place() {
        let original = format!(
            "alias ll='ls -l'\n{}\nold\n{}\nexport A=1\n",
            START_SECTION_DELIMITER, END_SECTION_DELIMITER
        );

        let out = replace_section(&original, "new");

        assert!(out.starts_with("alias ll='ls -l'\n"));
        assert!(out.contains("\nnew\n"));
        assert!(!out.contains("old"));
        assert!(out.ends_with("export A=1\n"));
        assert_eq!(out.matches(START_SECTION_DELIMITER).count(), 1);
    }

    #[test]
    fn given_content_without_trailing_newline_when_append_then_separates() {
        let out = replace_section("export A=1", "data");
        assert!(out.starts_with("export A=1\n\n"));
    }
}
