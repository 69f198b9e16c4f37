//! Whole-document editing properties, driven through the public API.

use dones::editor::{Document, InputEvent};
use dones::model::{EditorConfig, LineFlag, LineId};
use pretty_assertions::assert_eq;

fn doc(source: &str) -> Document {
    Document::from_text(source, "doc", EditorConfig::default())
}

fn find(doc: &Document, text: &str) -> LineId {
    doc.outline()
        .descendants(doc.outline().root())
        .find(|&id| doc.outline().text(id) == text)
        .unwrap_or_else(|| panic!("no line {:?}", text))
}

/// Everything undo has to restore: text, fold state, and each tag's
/// active and done lists in order.
#[derive(Debug, PartialEq)]
struct Snapshot {
    text: String,
    folded: Vec<bool>,
    tags: Vec<(String, Vec<LineId>, Vec<LineId>)>,
}

fn snapshot(doc: &Document) -> Snapshot {
    let outline = doc.outline();
    Snapshot {
        text: doc.to_text(),
        folded: outline
            .descendants(outline.root())
            .map(|id| outline.is_folded(id))
            .collect(),
        tags: doc
            .tags()
            .iter()
            .filter(|(_, entry)| !entry.is_empty())
            .map(|(name, entry)| (name.to_string(), entry.active.clone(), entry.done.clone()))
            .collect(),
    }
}

/// Every attached tagged line sits in exactly one list of each of its
/// tags, and in the done list iff it is done.
fn assert_tag_partition(doc: &Document) {
    let outline = doc.outline();
    for line in outline.descendants(outline.root()) {
        for tag in outline.line(line).tags() {
            let entry = doc.tags().get(tag).unwrap();
            let in_active = entry.active.iter().filter(|&&l| l == line).count();
            let in_done = entry.done.iter().filter(|&&l| l == line).count();
            assert_eq!(in_active + in_done, 1, "{} in #{}", outline.text(line), tag);
            assert_eq!(in_done == 1, outline.line(line).flag(LineFlag::Done));
        }
    }
    for (tag, entry) in doc.tags().iter() {
        for line in entry.iter() {
            assert!(outline.is_attached(line), "detached line in #{}", tag);
            assert!(outline.line(line).has_tag(tag));
        }
    }
}

#[test]
fn undo_restores_every_step_of_a_session() {
    let mut d = doc("Groceries #todo\n\tMilk\n\tEggs #todo\nWork\n\tReport #work\n");
    let mut history = vec![snapshot(&d)];

    let eggs = find(&d, "Eggs #todo");
    d.focus_line(eggs, 4);
    d.split_line();
    history.push(snapshot(&d));

    d.type_text("Bread #todo");
    d.commit_text();
    history.push(snapshot(&d));

    d.indent();
    history.push(snapshot(&d));

    d.toggle_flag(LineFlag::Done);
    history.push(snapshot(&d));

    let work = find(&d, "Work");
    d.set_folded(work, true);
    history.push(snapshot(&d));

    let report = find(&d, "Report #work");
    d.focus_line(report, 0);
    d.backspace();
    history.push(snapshot(&d));

    d.paste("x #new\n\ty\nz");
    history.push(snapshot(&d));
    assert_tag_partition(&d);

    history.pop();
    while let Some(expected) = history.pop() {
        assert!(d.undo());
        assert_eq!(snapshot(&d), expected);
        assert_tag_partition(&d);
    }
    assert!(!d.undo());
}

#[test]
fn undo_keeps_manual_tag_order() {
    let mut d = doc("a #t\nb #t\nc #t\nd #u\n");
    let (a, b, c) = (find(&d, "a #t"), find(&d, "b #t"), find(&d, "c #t"));
    d.reorder_tag("t", c, 0);
    let before = snapshot(&d);
    assert_eq!(d.tags().get("t").unwrap().active, vec![c, a, b]);

    d.click(a, 0);
    d.ctrl_click(a);
    d.delete_selection();
    assert!(d.undo());
    assert_eq!(snapshot(&d), before);

    // Dropping a tag by typing, then undoing the burst
    d.click(c, 4);
    d.backspace();
    d.backspace();
    d.backspace();
    assert_eq!(d.outline().text(c), "c");
    assert!(d.undo());
    assert_eq!(snapshot(&d), before);

    // A tag that empties comes back in its old place in the tag list
    d.click(a, 0);
    let outline = d.outline().clone();
    d.shift_click(|line| outline.cmp_position(c, line), false);
    d.backspace();
    assert_eq!(d.tags().tags().collect::<Vec<_>>(), vec!["u"]);
    assert!(d.undo());
    assert_eq!(snapshot(&d), before);
    assert_tag_partition(&d);
}

#[test]
fn redo_replays_undone_steps() {
    let mut d = doc("a\n\tb\nc #t\n");
    let c = find(&d, "c #t");
    d.focus_line(c, 0);
    d.indent();
    d.outdent();
    d.indent();
    let after = snapshot(&d);
    while d.undo() {}
    while d.redo() {}
    assert_eq!(snapshot(&d), after);
    assert_tag_partition(&d);
}

#[test]
fn split_then_backspace_is_identity() {
    let source = "hello world\n\tchild\nnext\n";
    let mut d = doc(source);
    let line = find(&d, "hello world");
    d.focus_line(line, 5);
    d.split_line();
    assert_eq!(d.to_text(), "hello\n\t world\n\tchild\nnext\n");
    d.backspace();
    assert_eq!(d.to_text(), source);
    assert_eq!(d.focus().map(|c| c.pos), Some(5));
}

#[test]
fn merge_keeps_children_of_the_merged_line() {
    let mut d = doc("a\nb\n\tb1\n\tb2\n");
    let b = find(&d, "b");
    d.focus_line(b, 0);
    d.backspace();
    assert_eq!(d.to_text(), "ab\n\tb1\n\tb2\n");
    assert!(d.undo());
    assert_eq!(d.to_text(), "a\nb\n\tb1\n\tb2\n");
}

#[test]
fn indent_stops_at_first_child() {
    let mut d = doc("a\nb\nc\n");
    let (a, c) = (find(&d, "a"), find(&d, "c"));
    d.click(a, 0);
    let outline = d.outline().clone();
    d.shift_click(|line| outline.cmp_position(c, line), false);
    d.indent();
    // "a" has no previous sibling, so nothing moves
    assert_eq!(d.to_text(), "a\nb\nc\n");
}

#[test]
fn copy_then_paste_reproduces_structure() {
    let mut d = doc("p\n\tq #t\n\t\tr\n\ts\nend\n");
    let q = find(&d, "q #t");
    let s = find(&d, "s");
    d.click(q, 0);
    let outline = d.outline().clone();
    d.shift_click(|line| outline.cmp_position(s, line), false);
    let clip = d.copy().unwrap();
    assert_eq!(clip, "q #t\n\tr\ns");

    let end = find(&d, "end");
    d.click(end, 3);
    d.split_line();
    d.paste(&clip);
    assert_eq!(d.to_text(), "p\n\tq #t\n\t\tr\n\ts\nend\nq #t\n\tr\ns\n");
    assert_eq!(d.tags().get("t").unwrap().len(), 2);
    assert_tag_partition(&d);
}

#[test]
fn delete_selection_rescues_unselected_children() {
    let mut d = doc("a\n\tb\n\t\tc\nd\n");
    let b = find(&d, "b");
    d.click(b, 0);
    d.ctrl_click(b);
    d.backspace();
    assert_eq!(d.to_text(), "a\n\t\n\tc\nd\n");
    assert!(d.undo());
    assert_eq!(d.to_text(), "a\n\tb\n\t\tc\nd\n");
}

#[test]
fn done_lines_move_between_lists_and_back() {
    let mut d = doc("a #t\nb #t\nc #t\n");
    let a = find(&d, "a #t");
    d.focus_line(a, 0);
    d.toggle_flag(LineFlag::Done);
    let entry = d.tags().get("t").unwrap();
    assert_eq!(entry.done, vec![a]);
    assert_eq!(entry.active.len(), 2);
    assert_tag_partition(&d);

    assert!(d.undo());
    assert_eq!(d.tags().get("t").unwrap().active[0], a);
    assert_tag_partition(&d);
}

#[test]
fn scripted_session_matches_direct_calls() {
    let mut scripted = doc("one\ntwo\n");
    let events: Vec<InputEvent> = serde_json::from_str(
        r#"[{"type": "focus", "line": 1, "caret": 3},
            {"type": "enter"},
            {"type": "type", "text": "inner"},
            {"type": "tab"},
            {"type": "toggle_fold_all"}]"#,
    )
    .unwrap();
    for event in &events {
        scripted.handle(event);
    }

    let mut direct = doc("one\ntwo\n");
    let one = find(&direct, "one");
    direct.focus_line(one, 3);
    direct.split_line();
    direct.type_text("inner");
    direct.indent();
    direct.toggle_fold_all();

    assert_eq!(snapshot(&scripted), snapshot(&direct));
    assert!(scripted.is_all_folded());
}
