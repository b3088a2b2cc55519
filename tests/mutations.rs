//! Surgical reprinting under mutation: the authoritative editing
//! scenarios, quote handling, joiner synthesis, structural transitions,
//! and the error paths.

use template_edit::{parse, MutationError, Node, NodeId, TemplateEditor};

fn find(editor: &TemplateEditor, pred: impl Fn(&Node) -> bool) -> NodeId {
    editor
        .descendants(editor.root())
        .into_iter()
        .find(|&id| pred(editor.node(id)))
        .expect("no matching node")
}

fn set_text(editor: &mut TemplateEditor, id: NodeId, chars: &str) {
    let chars = chars.to_string();
    editor
        .update(id, move |node| {
            if let Node::Text(t) = node {
                t.chars = chars;
            }
        })
        .unwrap();
}

#[test]
fn rename_hash_key_keeps_multiline_layout() {
    let mut editor = parse("{{foo-bar\n  baz=\"stuff\"\n}}").unwrap();
    let pair = find(&editor, |n| matches!(n, Node::HashPair(_)));
    editor
        .update(pair, |node| {
            if let Node::HashPair(p) = node {
                p.key = "derp".to_string();
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "{{foo-bar\n  derp=\"stuff\"\n}}");
}

#[test]
fn append_attribute_to_bare_element() {
    let mut editor = parse("<div></div>").unwrap();
    let div = find(&editor, |n| matches!(n, Node::Element(_)));
    let attr = editor.build_text_attr("data-test", "wheee");
    editor.append_attribute(div, attr).unwrap();
    assert_eq!(editor.print().unwrap(), "<div data-test=\"wheee\"></div>");
}

#[test]
fn appending_a_child_flips_self_closing_to_pair() {
    let mut editor = parse("<Foo bar=\"baz\" />").unwrap();
    let foo = find(&editor, |n| matches!(n, Node::Element(_)));
    let text = editor.build_text("bay");
    editor.append_child(foo, text).unwrap();
    assert_eq!(editor.print().unwrap(), "<Foo bar=\"baz\">bay</Foo>");
}

#[test]
fn adding_an_inverse_synthesizes_the_else_marker() {
    let mut editor = parse("{{#foo-bar}}{{/foo-bar}}").unwrap();
    let block = find(&editor, |n| matches!(n, Node::Block(_)));
    let text = editor.build_text("ZOMG!");
    let inverse = editor.build_program(vec![text]);
    editor.set_inverse(block, inverse).unwrap();
    assert_eq!(
        editor.print().unwrap(),
        "{{#foo-bar}}{{else}}ZOMG!{{/foo-bar}}"
    );
}

#[test]
fn editing_attribute_text_keeps_double_quotes() {
    let mut editor = parse("<div class=\"lol\"></div>").unwrap();
    let text = find(&editor, |n| matches!(n, Node::Text(t) if t.chars == "lol"));
    set_text(&mut editor, text, "hahah");
    assert_eq!(editor.print().unwrap(), "<div class=\"hahah\"></div>");
}

#[test]
fn removing_the_only_hash_pair_drops_its_whitespace() {
    let mut editor = parse("{{foo-bar hello=\"world\"}}").unwrap();
    let hash = find(&editor, |n| matches!(n, Node::Hash(h) if !h.pairs.is_empty()));
    editor
        .update(hash, |node| {
            if let Node::Hash(h) = node {
                h.pairs.clear();
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "{{foo-bar}}");
}

// ---- quoting rules --------------------------------------------------------

#[test]
fn editing_attribute_text_keeps_single_quotes() {
    let mut editor = parse("<div class='lol'></div>").unwrap();
    let text = find(&editor, |n| matches!(n, Node::Text(t) if t.chars == "lol"));
    set_text(&mut editor, text, "hahah");
    assert_eq!(editor.print().unwrap(), "<div class='hahah'></div>");
}

#[test]
fn editing_unquoted_attribute_stays_unquoted() {
    let mut editor = parse("<div class=lol></div>").unwrap();
    let text = find(&editor, |n| matches!(n, Node::Text(t) if t.chars == "lol"));
    set_text(&mut editor, text, "hahah");
    assert_eq!(editor.print().unwrap(), "<div class=hahah></div>");
}

#[test]
fn replacing_expression_value_with_text_forces_double_quotes() {
    let mut editor = parse("<div class={{cls}}></div>").unwrap();
    let attr = find(&editor, |n| matches!(n, Node::Attr(_)));
    let text = editor.build_text("plain");
    editor
        .update(attr, |node| {
            if let Node::Attr(a) = node {
                a.value = text;
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "<div class=\"plain\"></div>");
}

#[test]
fn replacing_text_value_with_expression_drops_the_quotes() {
    let mut editor = parse("<div class=\"lol\"></div>").unwrap();
    let attr = find(&editor, |n| matches!(n, Node::Attr(_)));
    let value = editor.build_mustache("cls", Vec::new(), Vec::new());
    editor
        .update(attr, |node| {
            if let Node::Attr(a) = node {
                a.value = value;
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "<div class={{cls}}></div>");
}

#[test]
fn synthesized_concat_value_supplies_its_own_quotes() {
    let mut editor = parse("<div class=\"lol\"></div>").unwrap();
    let attr = find(&editor, |n| matches!(n, Node::Attr(_)));
    let left = editor.build_text("btn ");
    let right = editor.build_mustache("kind", Vec::new(), Vec::new());
    let concat = editor.build_concat(vec![left, right]);
    editor
        .update(attr, |node| {
            if let Node::Attr(a) = node {
                a.value = concat;
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "<div class=\"btn {{kind}}\"></div>");
}

#[test]
fn renaming_an_attribute_keeps_the_value_region() {
    let mut editor = parse("<div data-old=\"x\"></div>").unwrap();
    let attr = find(&editor, |n| matches!(n, Node::Attr(_)));
    editor
        .update(attr, |node| {
            if let Node::Attr(a) = node {
                a.name = "data-new".to_string();
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "<div data-new=\"x\"></div>");
}

// ---- joiner synthesis -----------------------------------------------------

#[test]
fn inserting_a_param_reuses_the_observed_separator() {
    let mut editor = parse("{{list a\n      b}}").unwrap();
    let mustache = find(&editor, |n| matches!(n, Node::Mustache(_)));
    let extra = editor.build_path("c");
    editor
        .update(mustache, |node| {
            if let Node::Mustache(m) = node {
                m.params.push(extra);
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "{{list a\n      b\n      c}}");
}

#[test]
fn inserting_a_hash_pair_reuses_the_observed_separator() {
    let mut editor = parse("{{foo a=1\n  b=2}}").unwrap();
    let hash = find(&editor, |n| matches!(n, Node::Hash(h) if !h.pairs.is_empty()));
    let three = editor.build_number(3.0);
    let pair = editor.build_hash_pair("c", three);
    editor
        .update(hash, |node| {
            if let Node::Hash(h) = node {
                h.pairs.push(pair);
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "{{foo a=1\n  b=2\n  c=3}}");
}

#[test]
fn first_hash_pair_gets_a_single_space() {
    let mut editor = parse("{{foo-bar}}").unwrap();
    let hash = find(&editor, |n| matches!(n, Node::Hash(_)));
    let value = editor.build_string("world");
    let pair = editor.build_hash_pair("hello", value);
    editor
        .update(hash, |node| {
            if let Node::Hash(h) = node {
                h.pairs.push(pair);
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "{{foo-bar hello=\"world\"}}");
}

#[test]
fn first_param_gets_a_single_space() {
    let mut editor = parse("{{foo-bar}}").unwrap();
    let mustache = find(&editor, |n| matches!(n, Node::Mustache(_)));
    let param = editor.build_path("x");
    editor
        .update(mustache, |node| {
            if let Node::Mustache(m) = node {
                m.params.push(param);
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "{{foo-bar x}}");
}

#[test]
fn attribute_insertion_reuses_the_attribute_separator() {
    let mut editor = parse("<div a=\"1\"  b=\"2\"></div>").unwrap();
    let div = find(&editor, |n| matches!(n, Node::Element(_)));
    let attr = editor.build_text_attr("c", "3");
    editor.append_attribute(div, attr).unwrap();
    assert_eq!(
        editor.print().unwrap(),
        "<div a=\"1\"  b=\"2\"  c=\"3\"></div>"
    );
}

// ---- structural transitions -----------------------------------------------

#[test]
fn removing_every_attribute_collapses_open_tag_whitespace() {
    let mut editor = parse("<div class=\"x\" >y</div>").unwrap();
    let div = find(&editor, |n| matches!(n, Node::Element(_)));
    editor
        .update(div, |node| {
            if let Node::Element(e) = node {
                e.attributes.clear();
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "<div>y</div>");
}

#[test]
fn removing_one_of_two_attributes_keeps_the_rest_intact() {
    let mut editor = parse("<div class=\"x\" id=\"y\">z</div>").unwrap();
    let div = find(&editor, |n| matches!(n, Node::Element(_)));
    editor
        .update(div, |node| {
            if let Node::Element(e) = node {
                e.attributes.remove(0);
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "<div id=\"y\">z</div>");
}

#[test]
fn appending_children_to_a_void_element_prints_a_close_pair() {
    let mut editor = parse("<br>").unwrap();
    let br = find(&editor, |n| matches!(n, Node::Element(_)));
    let text = editor.build_text("x");
    editor.append_child(br, text).unwrap();
    assert_eq!(editor.print().unwrap(), "<br>x</br>");
}

#[test]
fn adding_the_first_block_params_synthesizes_the_clause() {
    let mut editor = parse("{{#each items}}{{/each}}").unwrap();
    let block = find(&editor, |n| matches!(n, Node::Block(_)));
    editor
        .update(block, |node| {
            if let Node::Block(b) = node {
                b.block_params = vec!["item".to_string()];
            }
        })
        .unwrap();
    assert_eq!(
        editor.print().unwrap(),
        "{{#each items as |item|}}{{/each}}"
    );
}

#[test]
fn adding_element_block_params_synthesizes_the_clause() {
    let mut editor = parse("<Foo></Foo>").unwrap();
    let foo = find(&editor, |n| matches!(n, Node::Element(_)));
    editor
        .update(foo, |node| {
            if let Node::Element(e) = node {
                e.block_params = vec!["x".to_string()];
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "<Foo as |x|></Foo>");
}

#[test]
fn removing_block_params_drops_the_clause_and_its_space() {
    let mut editor = parse("{{#each items as |item|}}{{/each}}").unwrap();
    let block = find(&editor, |n| matches!(n, Node::Block(_)));
    editor
        .update(block, |node| {
            if let Node::Block(b) = node {
                b.block_params.clear();
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "{{#each items}}{{/each}}");
}

#[test]
fn renaming_a_block_path_renames_the_close_tag() {
    let mut editor = parse("{{#foo}}x{{/foo}}").unwrap();
    let path = find(&editor, |n| matches!(n, Node::Path(p) if p.original == "foo"));
    editor
        .update(path, |node| {
            if let Node::Path(p) = node {
                p.original = "bar".to_string();
                p.parts = vec!["bar".to_string()];
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "{{#bar}}x{{/bar}}");
}

#[test]
fn renaming_a_tag_renames_both_ends() {
    let mut editor = parse("<div class=\"x\">y</div>").unwrap();
    let div = find(&editor, |n| matches!(n, Node::Element(_)));
    editor
        .update(div, |node| {
            if let Node::Element(e) = node {
                e.tag = "section".to_string();
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "<section class=\"x\">y</section>");
}

#[test]
fn removing_an_inverse_keeps_the_primary_body() {
    let mut editor = parse("{{#if a}}X{{else}}Y{{/if}}").unwrap();
    let block = find(&editor, |n| matches!(n, Node::Block(_)));
    editor
        .update(block, |node| {
            if let Node::Block(b) = node {
                b.inverse = None;
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "{{#if a}}X{{/if}}");
}

#[test]
fn editing_inside_a_chained_block_keeps_the_chain_shape() {
    let mut editor = parse("{{#if a}}A{{else if b}}B{{/if}}").unwrap();
    let text = find(&editor, |n| matches!(n, Node::Text(t) if t.chars == "B"));
    set_text(&mut editor, text, "Z");
    assert_eq!(editor.print().unwrap(), "{{#if a}}A{{else if b}}Z{{/if}}");
}

#[test]
fn flipping_trusting_swaps_the_braces() {
    let mut editor = parse("{{body}}").unwrap();
    let mustache = find(&editor, |n| matches!(n, Node::Mustache(_)));
    editor
        .update(mustache, |node| {
            if let Node::Mustache(m) = node {
                m.trusting = true;
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "{{{body}}}");
}

#[test]
fn mustache_comment_edit_keeps_its_delimiter_style() {
    let mut editor = parse("{{!-- old --}}").unwrap();
    let comment = find(&editor, |n| matches!(n, Node::MustacheComment(_)));
    editor
        .update(comment, |node| {
            if let Node::MustacheComment(c) = node {
                c.value = " new ".to_string();
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "{{!-- new --}}");
}

#[test]
fn string_literal_edit_keeps_single_quotes() {
    let mut editor = parse("{{t 'hi'}}").unwrap();
    let lit = find(&editor, |n| matches!(n, Node::StringLiteral(_)));
    editor
        .update(lit, |node| {
            if let Node::StringLiteral(s) = node {
                s.value = "bye".to_string();
            }
        })
        .unwrap();
    assert_eq!(editor.print().unwrap(), "{{t 'bye'}}");
}

// ---- minimal diff ---------------------------------------------------------

#[test]
fn scalar_edit_touches_exactly_one_region() {
    let source = "<section>\n  <h1 class=\"title\">{{heading}}</h1>\n  <p>\n    body text\n  </p>\n</section>\n";
    let mut editor = parse(source).unwrap();
    let text = find(&editor, |n| matches!(n, Node::Text(t) if t.chars == "title"));
    set_text(&mut editor, text, "headline");
    let printed = editor.print().unwrap();

    let diff = similar::TextDiff::from_lines(source, &printed);
    let changed_pairs: Vec<_> = diff
        .ops()
        .iter()
        .filter(|op| !matches!(op.tag(), similar::DiffTag::Equal))
        .collect();
    // One replaced line: the one holding the attribute.
    assert_eq!(changed_pairs.len(), 1);
    assert_eq!(
        printed,
        source.replace("class=\"title\"", "class=\"headline\"")
    );
}

// ---- error paths ----------------------------------------------------------

#[test]
fn in_place_type_change_is_rejected() {
    let mut editor = parse("{{foo (bar)}}").unwrap();
    let sub = find(&editor, |n| matches!(n, Node::SubExpression(_)));
    let err = editor
        .update(sub, |node| {
            *node = Node::Text(template_edit::Text {
                chars: "oops".to_string(),
            });
        })
        .unwrap_err();
    assert!(matches!(
        err,
        MutationError::TypeTransition {
            from: "SubExpression",
            to: "Text"
        }
    ));
    // The rollback leaves the tree printable and untouched.
    assert_eq!(editor.print().unwrap(), "{{foo (bar)}}");
}

#[test]
fn relocated_subtree_keeps_its_original_text() {
    let mut editor = parse("<b>{{greeting   name}}</b><i></i>").unwrap();
    let mustache = find(&editor, |n| matches!(n, Node::Mustache(_)));
    let b = find(&editor, |n| matches!(n, Node::Element(e) if e.tag == "b"));
    let i = find(&editor, |n| matches!(n, Node::Element(e) if e.tag == "i"));

    editor
        .update(b, |node| {
            if let Node::Element(e) = node {
                e.children.clear();
            }
        })
        .unwrap();
    editor.append_child(i, mustache).unwrap();

    assert_eq!(editor.print().unwrap(), "<b></b><i>{{greeting   name}}</i>");
}
