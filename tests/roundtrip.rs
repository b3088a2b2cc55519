//! Round-trip identity: with no mutation, printing replays the input byte
//! for byte, whatever the formatting looked like.

use template_edit::parse;

const CORPUS: &[&str] = &[
    "",
    "plain text, nothing else",
    "{{name}}",
    "{{  spaced.path  }}",
    "{{{trusted}}}",
    "{{foo-bar baz=\"stuff\"}}",
    "{{foo-bar\n  baz=\"stuff\"\n}}",
    "{{helper a b c=1 d=true e=null f=undefined}}",
    "{{concat (upper name) \"!\" count=3}}",
    "{{! a comment }}",
    "{{!-- a comment with }} inside --}}",
    "<!-- an html comment -->",
    "<div></div>",
    "<div   class=\"x\"   id='y'\n      data-z=unquoted></div>",
    "<Foo bar=\"baz\" />",
    "<input type=\"text\" disabled>",
    "<br>line two",
    "<a href={{url}} class=\"btn {{kind}}\">go</a>",
    "<Foo.Bar @arg={{x}} />",
    "<Foo as |bar|>{{bar}}</Foo>",
    "<div {{track-clicks}} {{! in-tag note }} class=\"a\">x</div>",
    "{{#foo-bar}}{{/foo-bar}}",
    "{{#if cond}}yes{{else}}no{{/if}}",
    "{{#if a}}A{{else if b}}B{{else}}C{{/if}}",
    "{{#each items as |item idx|}}\n  <li>{{item.name}}</li>\n{{/each}}",
    "<ul>\n  {{#each items as |item|}}\n    <li>{{item}}</li>\n  {{/each}}\n</ul>",
    "{{#outer}}\n  {{#inner}}\n    deep\n  {{/inner}}\n{{/outer}}",
    "line one\r\n<b>two</b>\r\n",
    "  leading blanks\n\n\nand trailing  \n",
    "<!DOCTYPE html>\n<p>doc</p>",
    "a < b but not a tag",
    "lone { brace and {{x}} after",
];

#[test]
fn print_replays_input_exactly() {
    for source in CORPUS {
        let editor = parse(source).unwrap_or_else(|e| panic!("parse failed for {source:?}: {e}"));
        let printed = editor
            .print()
            .unwrap_or_else(|e| panic!("print failed for {source:?}: {e}"));
        assert_eq!(&printed, source, "round trip mismatch for {source:?}");
    }
}

#[test]
fn printing_is_idempotent() {
    for source in CORPUS {
        let editor = parse(source).unwrap();
        let first = editor.print().unwrap();
        let second = editor.print().unwrap();
        assert_eq!(first, second, "second print differed for {source:?}");
    }
}

#[test]
fn subtree_printing_replays_node_slices() {
    let source = "<div   class=\"x\" >{{foo   bar}}</div>";
    let editor = parse(source).unwrap();
    for id in editor.descendants(editor.root()) {
        if let Some(span) = editor.span(id) {
            let printed = editor.print_node(id).unwrap();
            let expected = template_edit::SourceIndex::new(source).slice(span);
            assert_eq!(printed, expected);
        }
    }
}
