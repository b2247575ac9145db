//! Integration tests for the full rendering pipeline.

use std::fs;
use std::path::Path;

use froth_engine::{Engine, EngineConfig, EngineError, Value};
use tempfile::tempdir;

fn engine() -> Engine {
    Engine::new(EngineConfig::default().with_indent_output(false))
}

fn engine_at(dir: &Path) -> Engine {
    Engine::new(EngineConfig::new(dir).with_indent_output(false))
}

fn write_template(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(format!("{name}.html")), body).unwrap();
}

fn user_value() -> Value {
    let json: serde_json::Value =
        serde_json::from_str(r#"{"name":"Ann","tags":["a","b"]}"#).unwrap();
    Value::from(json)
}

#[test]
fn test_query_interpolation_and_errors() {
    let mut engine = engine();
    engine.set("user", user_value());

    assert_eq!(
        engine
            .render_string("<b:template><p>${user.name}</p></b:template>")
            .unwrap(),
        "<p>Ann</p>"
    );
    assert_eq!(
        engine
            .render_string("<b:template><p>${user.tags[1]}</p></b:template>")
            .unwrap(),
        "<p>b</p>"
    );
    assert!(matches!(
        engine.render_string("<b:template><p>${user.missing}</p></b:template>"),
        Err(EngineError::KeyNotFound { .. })
    ));
    assert!(matches!(
        engine.render_string("<b:template><p>${nobody}</p></b:template>"),
        Err(EngineError::DataNotFound(_))
    ));
}

#[test]
fn test_interpolation_escapes_quotes_but_node_content_does_not() {
    let mut engine = engine();
    engine.set("quote", "it's \"quoted\"");
    let json: serde_json::Value =
        serde_json::from_str(r#"[{"code":"q","label":"it's \"quoted\""}]"#).unwrap();
    engine.set("opts", Value::from(json));

    // Textual substitution applies the HTML-escape layer, which covers
    // quote characters.
    let interpolated = engine
        .render_string("<b:template><p>${quote}</p></b:template>")
        .unwrap();
    assert_eq!(interpolated, "<p>it's &quot;quoted&quot;</p>");

    // Values placed into tree nodes only get the serializer's text
    // escaping, which leaves quotes alone.
    let via_tree = engine
        .render_string(
            r#"<b:template><b:selectItems items="${opts}" var="o" value="${o.code}" label="${o.label}"/></b:template>"#,
        )
        .unwrap();
    assert_eq!(
        via_tree,
        "<select><option value=\"q\">it's \"quoted\"</option></select>"
    );
}

#[test]
fn test_nested_foreach_reaches_fixed_point() {
    let mut engine = engine();
    let json: serde_json::Value =
        serde_json::from_str(r#"[{"name":"x","tags":["1","2"]},{"name":"y","tags":["3"]}]"#)
            .unwrap();
    engine.set("groups", Value::from(json));

    let out = engine
        .render_string(
            r#"<b:template><ul><b:foreach value="${groups}" var="g"><li>${g.name}<b:foreach value="${g.tags}" var="t"><em>${t}</em></b:foreach></li></b:foreach></ul></b:template>"#,
        )
        .unwrap();
    assert_eq!(
        out,
        "<ul><li>x<em>1</em><em>2</em></li><li>y<em>3</em></li></ul>"
    );
}

#[test]
fn test_foreach_map_with_key() {
    let mut engine = engine();
    let json: serde_json::Value = serde_json::from_str(r#"{"de":"German","fr":"French"}"#).unwrap();
    engine.set("langs", Value::from(json));

    let out = engine
        .render_string(
            r#"<b:template><b:foreach value="${langs}" var="l" key="code"><p>${code}=${l}</p></b:foreach></b:template>"#,
        )
        .unwrap();
    assert_eq!(out, "<p>de=German</p><p>fr=French</p>");
}

#[test]
fn test_foreach_over_scalar_is_invalid_data() {
    let mut engine = engine();
    engine.set("n", 3i64);
    assert!(matches!(
        engine.render_string(
            r#"<b:template><b:foreach value="${n}" var="x"><p>${x}</p></b:foreach></b:template>"#
        ),
        Err(EngineError::InvalidData(_))
    ));
}

#[test]
fn test_for_counts_down_inclusively() {
    let out = engine()
        .render_string(
            r#"<b:template><b:for var="i" from="3" to="1"><li>${i}</li></b:for></b:template>"#,
        )
        .unwrap();
    assert_eq!(out, "<li>3</li><li>2</li><li>1</li>");
}

#[test]
fn test_assign_is_visible_to_later_substitution() {
    let mut engine = engine();
    engine.set("base", 20i64);
    let out = engine
        .render_string(
            r#"<b:template><b:assign var="total" value="${base} * 2 + 2"/><p>${total}</p></b:template>"#,
        )
        .unwrap();
    assert_eq!(out, "<p>42</p>");
}

#[test]
fn test_assign_runs_before_same_stage_directives() {
    let mut engine = engine();
    engine.set("xs", Value::from(vec!["a", "b"]));
    // The foreach depends on a binding introduced by the assign; the
    // assign's lower priority value commits its edit first.
    let out = engine
        .render_string(
            r#"<b:template><b:assign var="ys" value="${xs}"/><b:foreach value="${ys}" var="y"><i>${y}</i></b:foreach></b:template>"#,
        )
        .unwrap();
    assert_eq!(out, "<i>a</i><i>b</i>");
}

#[test]
fn test_condition_branches() {
    let mut engine = engine();
    engine.set("role", "admin");
    let source = r#"<b:template><b:condition><if condition="${role} == 'admin'"><p>ops</p></if><elseif condition="${role} == 'editor'"><p>edit</p></elseif><else><p>read</p></else></b:condition></b:template>"#;
    assert_eq!(engine.render_string(source).unwrap(), "<p>ops</p>");

    engine.set("role", "editor");
    assert_eq!(engine.render_string(source).unwrap(), "<p>edit</p>");

    engine.set("role", "guest");
    assert_eq!(engine.render_string(source).unwrap(), "<p>read</p>");
}

#[test]
fn test_expression_island_with_helper() {
    let mut engine = engine();
    engine.set("name", "ann");
    let out = engine
        .render_string("<b:template><h1>{{ @upper(${name}) }}</h1></b:template>")
        .unwrap();
    assert_eq!(out, "<h1>ANN</h1>");
}

#[test]
fn test_unknown_helper_and_unknown_directive() {
    let engine = engine();
    assert!(matches!(
        engine.render_string("<b:template><p>{{ @nope(1) }}</p></b:template>"),
        Err(EngineError::UnknownFunction(_))
    ));
    assert!(matches!(
        engine.render_string("<b:template><b:widget/></b:template>"),
        Err(EngineError::UnknownToken(_))
    ));
}

#[test]
fn test_data_table() {
    let mut engine = engine();
    let json: serde_json::Value =
        serde_json::from_str(r#"[{"name":"Ann","age":34},{"name":"Ben","age":27}]"#).unwrap();
    engine.set("people", Value::from(json));

    let out = engine
        .render_string(
            r#"<b:template><b:dataTable value="${people}" var="p" class="grid"><column><head>Name</head><content>${p.name}</content></column><column><head>Age</head><content>${p.age}</content></column></b:dataTable></b:template>"#,
        )
        .unwrap();
    assert_eq!(
        out,
        "<table class=\"grid\"><thead><tr><th>Name</th><th>Age</th></tr></thead><tbody><tr><td>Ann</td><td>34</td></tr><tr><td>Ben</td><td>27</td></tr></tbody></table>"
    );
}

#[test]
fn test_data_table_without_heads_omits_thead() {
    let mut engine = engine();
    let json: serde_json::Value = serde_json::from_str(r#"[{"name":"Ann"}]"#).unwrap();
    engine.set("people", Value::from(json));

    let out = engine
        .render_string(
            r#"<b:template><b:dataTable value="${people}" var="p"><column><content>${p.name}</content></column></b:dataTable></b:template>"#,
        )
        .unwrap();
    assert_eq!(out, "<table><tbody><tr><td>Ann</td></tr></tbody></table>");
}

#[test]
fn test_select_items_marks_selected_option() {
    let mut engine = engine();
    let json: serde_json::Value =
        serde_json::from_str(r#"[{"code":"de","label":"German"},{"code":"fr","label":"French"}]"#)
            .unwrap();
    engine.set("langs", Value::from(json));
    engine.set("current", "fr");

    let out = engine
        .render_string(
            r#"<b:template><b:selectItems items="${langs}" var="l" value="${l.code}" label="${l.label}" selected="current" name="lang"/></b:template>"#,
        )
        .unwrap();
    assert_eq!(
        out,
        "<select name=\"lang\"><option value=\"de\">German</option><option value=\"fr\" selected=\"true\">French</option></select>"
    );
}

#[test]
fn test_fragment_wrapper_is_flattened() {
    let out = engine()
        .render_string("<b:template><b:fragment><p>a</p><p>b</p></b:fragment></b:template>")
        .unwrap();
    assert_eq!(out, "<p>a</p><p>b</p>");
}

#[test]
fn test_entity_references_survive_rendering() {
    let out = engine()
        .render_string("<b:template><p>caf&eacute;&nbsp;bar</p></b:template>")
        .unwrap();
    assert_eq!(out, "<p>caf&eacute;&nbsp;bar</p>");
}

#[test]
fn test_include_binds_local_context() {
    let dir = tempdir().unwrap();
    write_template(
        dir.path(),
        "card",
        "<b:template><div class=\"card\">${title}</div></b:template>",
    );
    write_template(
        dir.path(),
        "page",
        r#"<b:template><b:include path="card" title="Welcome ${user.name}"/></b:template>"#,
    );

    let mut engine = engine_at(dir.path());
    engine.set("user", user_value());
    assert_eq!(
        engine.render_file("page").unwrap(),
        "<div class=\"card\">Welcome Ann</div>"
    );
}

#[test]
fn test_include_context_values_escape_once() {
    let dir = tempdir().unwrap();
    write_template(
        dir.path(),
        "card",
        "<b:template><p>${title}</p></b:template>",
    );
    write_template(
        dir.path(),
        "page",
        r#"<b:template><b:include path="card" title="${name}"/></b:template>"#,
    );

    let mut engine = engine_at(dir.path());
    engine.set("name", "A&B");
    // The binding stays raw; only the child's interpolation escapes it.
    assert_eq!(engine.render_file("page").unwrap(), "<p>A&amp;B</p>");
}

#[test]
fn test_self_include_hits_depth_guard() {
    let dir = tempdir().unwrap();
    write_template(
        dir.path(),
        "loop",
        r#"<b:template><b:include path="loop"/></b:template>"#,
    );

    let engine = Engine::new(
        EngineConfig::new(dir.path())
            .with_indent_output(false)
            .with_max_include_depth(8),
    );
    assert!(matches!(
        engine.render_file("loop"),
        Err(EngineError::IncludeDepth(8))
    ));
}

#[test]
fn test_missing_template_file() {
    let dir = tempdir().unwrap();
    let engine = engine_at(dir.path());
    assert!(matches!(
        engine.render_file("ghost"),
        Err(EngineError::TemplateNotFound(_))
    ));
}

#[test]
fn test_inheritance_merge_keeps_parent_footer() {
    let dir = tempdir().unwrap();
    write_template(
        dir.path(),
        "layout",
        r#"<b:template><header><b:block name="header"><h1>Site</h1></b:block></header><footer><b:block name="footer"><p>All rights reserved.</p></b:block></footer></b:template>"#,
    );
    write_template(
        dir.path(),
        "home",
        r#"<b:template extends="layout"><header><h1>Home</h1></header></b:template>"#,
    );

    let engine = engine_at(dir.path());
    let out = engine.render_file("home").unwrap();
    assert_eq!(
        out,
        "<header><h1>Home</h1></header><footer><p>All rights reserved.</p></footer>"
    );
}

#[test]
fn test_indentation_only_changes_whitespace() {
    let dir = tempdir().unwrap();
    write_template(
        dir.path(),
        "page",
        "<b:template><div><p>${user.name}</p><hr/></div></b:template>",
    );

    let mut plain = engine_at(dir.path());
    plain.set("user", user_value());
    let mut pretty = Engine::new(EngineConfig::new(dir.path()).with_indent_output(true));
    pretty.set("user", user_value());

    let plain_out = plain.render_file("page").unwrap();
    let pretty_out = pretty.render_file("page").unwrap();
    assert_ne!(plain_out, pretty_out);

    let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    assert_eq!(strip(&plain_out), strip(&pretty_out));
}

#[test]
fn test_compile_writes_output_file() {
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("out.html");

    let mut engine = engine();
    engine.set("who", "world");
    engine
        .compile_string(
            "<b:template><p>Hello ${who}</p></b:template>",
            &out_path,
        )
        .unwrap();
    assert_eq!(fs::read_to_string(&out_path).unwrap(), "<p>Hello world</p>");
}
