use crate::model::line::LineId;
use crate::model::outline::Outline;

pub const TAB: char = '\t';

/// Split tab-indented text into `(level, text)` pairs.
///
/// `level` is the number of leading tabs. Accepts `\n` and `\r\n`; a single
/// trailing newline ends the last line instead of starting an empty one.
pub fn split_indented(source: &str) -> Vec<(usize, &str)> {
    source
        .lines()
        .map(|line| {
            let text = line.trim_start_matches(TAB);
            (line.len() - text.len(), text)
        })
        .collect()
}

/// Build an outline from the persisted tab-indented format.
///
/// A line with more tabs than the previous one becomes its child (one level
/// at most), equal tabs make a sibling, fewer tabs walk back up the
/// ancestors. An empty source still yields one empty line to type into.
pub fn parse_outline(source: &str, name: &str) -> Outline {
    let mut outline = Outline::new(name);
    let root = outline.root();

    let mut parent = root;
    let mut brother: Option<LineId> = None;
    let mut old_level = 0;

    for (level, text) in split_indented(source) {
        if level > old_level {
            if let Some(b) = brother {
                parent = b;
            }
        } else if level < old_level {
            for _ in level..old_level {
                match outline.parent(parent) {
                    Some(grand) => parent = grand,
                    None => break,
                }
            }
        }
        let line = outline.append_new(parent, text);
        brother = Some(line);
        old_level = level;
    }

    if outline.is_empty() {
        outline.append_new(root, "");
    }
    outline
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(outline: &Outline) -> Vec<(usize, String)> {
        outline
            .descendants(outline.root())
            .map(|id| (outline.level(id), outline.text(id).to_string()))
            .collect()
    }

    #[test]
    fn split_counts_leading_tabs() {
        assert_eq!(
            split_indented("a\n\tb\r\n\t\tc\n"),
            vec![(0, "a"), (1, "b"), (2, "c")]
        );
        assert_eq!(split_indented("a\n\n"), vec![(0, "a"), (0, "")]);
        assert!(split_indented("").is_empty());
    }

    #[test]
    fn nesting_by_tabs() {
        let outline = parse_outline("A\n\tB\n\tC\nD\n", "doc");
        assert_eq!(
            shape(&outline),
            vec![
                (1, "A".to_string()),
                (2, "B".to_string()),
                (2, "C".to_string()),
                (1, "D".to_string()),
            ]
        );
        assert_eq!(outline.text(outline.root()), "doc");
    }

    #[test]
    fn dedent_walks_several_levels() {
        let outline = parse_outline("a\n\tb\n\t\tc\nd\n", "doc");
        let d = outline.descendants(outline.root()).last().unwrap();
        assert_eq!(outline.parent(d), Some(outline.root()));
        assert_eq!(outline.level(d), 1);
    }

    #[test]
    fn jump_of_two_levels_nests_once() {
        let outline = parse_outline("a\n\t\t\tb\n", "doc");
        assert_eq!(
            shape(&outline),
            vec![(1, "a".to_string()), (2, "b".to_string())]
        );
    }

    #[test]
    fn indented_first_line_goes_under_root() {
        let outline = parse_outline("\t\ta\nb\n", "doc");
        assert_eq!(
            shape(&outline),
            vec![(1, "a".to_string()), (1, "b".to_string())]
        );
    }

    #[test]
    fn empty_source_has_one_line() {
        let outline = parse_outline("", "doc");
        assert_eq!(shape(&outline), vec![(1, String::new())]);
    }
}
