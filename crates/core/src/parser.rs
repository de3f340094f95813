//! Section-aware todo parsing for daily markdown notes.
//!
//! A note holds at most one recognized section, delimited by a configured
//! H3 header and the next `### ` heading (or end of document). Only lines
//! inside that section which match the checkbox grammar are ever touched;
//! every other line round-trips byte for byte.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Todo;

/// Any H3 heading that is not the configured header ends the section.
const SECTION_PREFIX: &str = "### ";

/// Degenerate todo fragments eligible for in-place completion by insertion.
const PLACEHOLDER_LINES: [&str; 4] = ["-", "- ", "- []", "- [ ]"];

static TODO_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^- \[( |x)\] (.+)$").expect("valid regex"));

/// Extract the ordered todos inside the section introduced by
/// `section_header`.
///
/// Indices are assigned by occurrence order, starting at 0 on every call.
/// Parsing is pure and total: lines inside the section that do not match
/// the grammar are skipped silently, never reported. Only a single space
/// or a lowercase `x` is recognized as a status marker.
pub fn parse_todos(text: &str, section_header: &str) -> Vec<Todo> {
    let mut todos = Vec::new();
    let mut in_section = false;

    for line in text.split('\n') {
        if line.starts_with(section_header) {
            in_section = true;
            continue;
        }
        if line.starts_with(SECTION_PREFIX) && !line.starts_with(section_header) {
            in_section = false;
            continue;
        }
        if in_section {
            if let Some((done, text)) = match_todo_line(line) {
                todos.push(Todo::new(todos.len(), text, done));
            }
        }
    }

    todos
}

/// Rewrite the todo lines of `original` from `updated`, leaving every other
/// line untouched.
///
/// Entries are consumed in order by a running counter, not by their stored
/// index. A shorter `updated` list drops the trailing original todo lines
/// (deletion by shrinking); surplus entries are never emitted — growing the
/// list goes through [`add_todo`] instead. Lines are joined with `\n`,
/// which may normalize a foreign line-ending convention.
pub fn reconstruct_content(original: &str, updated: &[Todo], section_header: &str) -> String {
    let mut result: Vec<String> = Vec::new();
    let mut in_section = false;
    let mut cursor = 0usize;

    for line in original.split('\n') {
        if line.starts_with(section_header) {
            in_section = true;
            result.push(line.to_string());
            continue;
        }
        if line.starts_with(SECTION_PREFIX) && !line.starts_with(section_header) {
            in_section = false;
            result.push(line.to_string());
            continue;
        }
        if in_section && is_todo_line(line) {
            if let Some(todo) = updated.get(cursor) {
                result.push(render_todo_line(todo));
                cursor += 1;
            }
            continue;
        }
        result.push(line.to_string());
    }

    result.join("\n")
}

/// Insert a new unchecked todo into `text`, creating the section when the
/// header is absent.
///
/// Resolution order: replace the first placeholder line in the section;
/// else insert directly after the section's last todo line; else (a section
/// without todos) directly after the header, or at end of document when the
/// section runs to it; else append a fresh section at the end, preceded by
/// one blank separator line when the document is non-empty.
pub fn add_todo(text: &str, new_todo: &str, section_header: &str) -> String {
    let new_line = format!("- [ ] {}", new_todo);

    let mut lines: Vec<String> = if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').map(str::to_string).collect()
    };

    let Some(section) = find_section(&lines, section_header) else {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(section_header.to_string());
        lines.push(new_line);
        return lines.join("\n");
    };

    let body = section.header + 1..section.end;

    if let Some(at) = lines[body.clone()].iter().position(|l| is_placeholder_line(l)) {
        lines[section.header + 1 + at] = new_line;
        return lines.join("\n");
    }

    let insert_at = match lines[body].iter().rposition(|l| is_todo_line(l)) {
        Some(last) => section.header + 1 + last + 1,
        None if section.end < lines.len() => section.header + 1,
        None => lines.len(),
    };
    lines.insert(insert_at, new_line);
    lines.join("\n")
}

fn render_todo_line(todo: &Todo) -> String {
    format!("- [{}] {}", if todo.done { 'x' } else { ' ' }, todo.text)
}

fn match_todo_line(line: &str) -> Option<(bool, String)> {
    let caps = TODO_LINE_RE.captures(line.trim())?;
    Some((&caps[1] == "x", caps[2].to_string()))
}

fn is_todo_line(line: &str) -> bool {
    TODO_LINE_RE.is_match(line.trim())
}

fn is_placeholder_line(line: &str) -> bool {
    PLACEHOLDER_LINES.contains(&line.trim())
}

/// Half-open span of the first recognized section: `(header, end)` where
/// `end` is the next foreign `### ` heading or the line count.
struct SectionSpan {
    header: usize,
    end: usize,
}

fn find_section(lines: &[String], section_header: &str) -> Option<SectionSpan> {
    let header = lines.iter().position(|l| l.starts_with(section_header))?;
    let end = lines[header + 1..]
        .iter()
        .position(|l| l.starts_with(SECTION_PREFIX) && !l.starts_with(section_header))
        .map(|offset| header + 1 + offset)
        .unwrap_or(lines.len());
    Some(SectionSpan { header, end })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const HEADER: &str = "### 重点事项";

    fn doc(lines: &[&str]) -> String {
        lines.join("\n")
    }

    #[test]
    fn parses_todos_inside_section_only() {
        let text = doc(&[
            "2024-01-01",
            "- [ ] outside the section",
            HEADER,
            "- [ ] buy milk",
            "- [x] water plants",
            "### Notes",
            "- [ ] also outside",
        ]);

        let todos = parse_todos(&text, HEADER);
        assert_eq!(
            todos,
            vec![
                Todo::new(0, "buy milk", false),
                Todo::new(1, "water plants", true),
            ]
        );
    }

    #[test]
    fn skips_malformed_lines_silently() {
        let text = doc(&[
            HEADER,
            "- [X] uppercase marker is not done",
            "- [] missing space",
            "-[ ] missing gap",
            "* [ ] wrong bullet",
            "- [ ] ",
            "plain prose",
            "- [ ] the only real todo",
        ]);

        let todos = parse_todos(&text, HEADER);
        assert_eq!(todos, vec![Todo::new(0, "the only real todo", false)]);
    }

    #[test]
    fn trims_indentation_and_keeps_brackets_in_text() {
        let text = doc(&[HEADER, "   - [x] call [boss] at [5pm]   "]);
        let todos = parse_todos(&text, HEADER);
        assert_eq!(todos, vec![Todo::new(0, "call [boss] at [5pm]", true)]);
    }

    #[test]
    fn missing_header_yields_empty_list() {
        let text = doc(&["2024-01-01", "- [ ] stray todo", "### Notes", "text"]);
        assert!(parse_todos(&text, HEADER).is_empty());
    }

    #[test]
    fn indices_are_contiguous_from_zero() {
        let text = doc(&[
            HEADER,
            "- [ ] a",
            "not a todo",
            "- [x] b",
            "- [ ] c",
        ]);
        let indices: Vec<usize> = parse_todos(&text, HEADER).iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn reconstruction_with_unmodified_list_is_identity() {
        let text = doc(&[
            "2024-01-01",
            "",
            HEADER,
            "- [ ] buy milk",
            "some prose in between",
            "- [x] water plants",
            "",
            "### Notes",
            "unrelated text",
            "",
        ]);

        let todos = parse_todos(&text, HEADER);
        assert_eq!(reconstruct_content(&text, &todos, HEADER), text);
    }

    #[test]
    fn toggle_changes_only_the_status_byte() {
        let text = doc(&[
            "2024-01-01",
            HEADER,
            "- [ ] buy milk",
            "- [ ] water plants",
            "### Notes",
            "text",
        ]);

        let mut todos = parse_todos(&text, HEADER);
        todos[1].done = true;
        let rebuilt = reconstruct_content(&text, &todos, HEADER);

        let expected = doc(&[
            "2024-01-01",
            HEADER,
            "- [ ] buy milk",
            "- [x] water plants",
            "### Notes",
            "text",
        ]);
        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn shorter_list_drops_trailing_todo_lines() {
        let text = doc(&[
            HEADER,
            "- [ ] first",
            "- [x] second",
            "- [ ] third",
            "### Notes",
        ]);

        let todos = vec![Todo::new(0, "first", false), Todo::new(1, "third", false)];
        let rebuilt = reconstruct_content(&text, &todos, HEADER);

        let expected = doc(&[HEADER, "- [ ] first", "- [ ] third", "### Notes"]);
        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn surplus_entries_are_never_emitted() {
        let text = doc(&[HEADER, "- [ ] only line"]);
        let todos = vec![
            Todo::new(0, "only line", false),
            Todo::new(1, "cannot grow this way", false),
        ];
        assert_eq!(reconstruct_content(&text, &todos, HEADER), text);
    }

    #[test]
    fn inserts_after_last_todo_before_next_section() {
        let text = doc(&[
            "2024-01-01",
            "",
            HEADER,
            "- [ ] buy milk",
            "### Notes",
            "text",
        ]);

        let result = add_todo(&text, "call dentist", HEADER);
        let expected = doc(&[
            "2024-01-01",
            "",
            HEADER,
            "- [ ] buy milk",
            "- [ ] call dentist",
            "### Notes",
            "text",
        ]);
        assert_eq!(result, expected);
    }

    #[rstest]
    #[case("-")]
    #[case("- ")]
    #[case("- []")]
    #[case("- [ ]")]
    fn replaces_placeholder_in_place(#[case] placeholder: &str) {
        let text = doc(&["2024-01-01", HEADER, placeholder, "### Notes"]);
        let result = add_todo(&text, "email boss", HEADER);
        let expected = doc(&["2024-01-01", HEADER, "- [ ] email boss", "### Notes"]);
        assert_eq!(result, expected);
    }

    #[test]
    fn replaces_only_the_first_placeholder() {
        let text = doc(&[HEADER, "- [ ]", "- [ ]"]);
        let result = add_todo(&text, "email boss", HEADER);
        assert_eq!(result, doc(&[HEADER, "- [ ] email boss", "- [ ]"]));
    }

    #[test]
    fn placeholder_wins_over_existing_todos() {
        let text = doc(&[HEADER, "- [ ] keep me", "- []"]);
        let result = add_todo(&text, "email boss", HEADER);
        assert_eq!(result, doc(&[HEADER, "- [ ] keep me", "- [ ] email boss"]));
    }

    #[test]
    fn missing_section_appends_header_with_separator() {
        let text = doc(&["2024-01-01", "some notes"]);
        let result = add_todo(&text, "x", HEADER);
        let expected = doc(&["2024-01-01", "some notes", "", HEADER, "- [ ] x"]);
        assert_eq!(result, expected);
    }

    #[test]
    fn missing_section_in_empty_document_skips_separator() {
        let result = add_todo("", "x", HEADER);
        assert_eq!(result, doc(&[HEADER, "- [ ] x"]));
    }

    #[test]
    fn empty_section_before_next_header_inserts_after_header() {
        let text = doc(&[HEADER, "", "### Notes", "text"]);
        let result = add_todo(&text, "first", HEADER);
        assert_eq!(result, doc(&[HEADER, "- [ ] first", "", "### Notes", "text"]));
    }

    #[test]
    fn empty_section_at_eof_appends_at_document_end() {
        let text = doc(&["2024-01-01", "", HEADER, "", ""]);
        let result = add_todo(&text, "first", HEADER);
        assert_eq!(result, doc(&["2024-01-01", "", HEADER, "", "", "- [ ] first"]));
    }

    #[test]
    fn inserts_at_eof_when_section_runs_to_document_end() {
        let text = doc(&[HEADER, "- [ ] existing"]);
        let result = add_todo(&text, "next up", HEADER);
        assert_eq!(result, doc(&[HEADER, "- [ ] existing", "- [ ] next up"]));
    }

    #[test]
    fn round_trip_preserves_trailing_newline() {
        let text = format!("{}\n- [ ] a\n", HEADER);
        let todos = parse_todos(&text, HEADER);
        assert_eq!(reconstruct_content(&text, &todos, HEADER), text);
    }
}
