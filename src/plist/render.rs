//! Depth-first renderer for the ASCII property-list dialect, using the
//! [`LineWriter`] to express every formatting special case locally
//! (`spec.md` §4.5).

use crate::model::literal::{Array, Dictionary, Literal, ObjectRef, Value};
use crate::model::sections::Sections;
use crate::plist::line_writer::LineWriter;
use crate::plist::UTF8_PROLOGUE;
use crate::error::Result;

/// Render `root` in the IDE's exact formatting: the dictionary tree,
/// terminated by a trailing newline, preceded by the leading
/// `// !$*UTF8*$!` prologue iff `prologue` is set. The source text doesn't
/// always carry it, and the renderer must not invent one (`spec.md` §8
/// Scenario S1) — callers (`Project::parse`/`Project::open`) remember
/// whether the parsed source had it and pass that back in here.
pub fn render(root: &Dictionary, prologue: bool) -> Result<String> {
    let mut w = LineWriter::new("\t");
    if prologue {
        w.append_raw(UTF8_PROLOGUE);
    }
    render_dictionary(root, &mut w)?;
    Ok(w.finish())
}

fn render_dictionary(dict: &Dictionary, w: &mut LineWriter) -> Result<()> {
    w.append("{");
    w.increase_indent();
    for (key, value) in dict {
        render_entry(key, value, w)?;
    }
    w.decrease_indent();
    w.append("}");
    Ok(())
}

fn render_entry(key: &Literal, value: &Value, w: &mut LineWriter) -> Result<()> {
    w.append(&format!("{} = ", render_literal_string(key)));
    w.same_line_next();
    render_value(value, w)?;
    w.same_line_next();
    w.append(";");
    if w.is_single_line() {
        w.append(" ");
    }
    Ok(())
}

fn render_array(arr: &Array, w: &mut LineWriter) -> Result<()> {
    w.append("(");
    w.increase_indent();
    for value in arr {
        render_value(value, w)?;
        w.same_line_next();
        w.append(",");
        if w.is_single_line() {
            w.append(" ");
        }
    }
    w.decrease_indent();
    w.append(")");
    Ok(())
}

fn render_sections(sections: &Sections, w: &mut LineWriter) -> Result<()> {
    w.append("{");
    w.increase_indent();
    for (name, section) in sections.iter() {
        w.append_raw("");
        w.append_raw(&format!("/* Begin {name} section */"));
        for (key, value) in section {
            render_entry(key, value, w)?;
        }
        w.append_raw(&format!("/* End {name} section */"));
    }
    w.decrease_indent();
    w.append("}");
    Ok(())
}

fn render_object(object: &ObjectRef, w: &mut LineWriter) -> Result<()> {
    let (single_line, content) = {
        let obj = object.borrow();
        (obj.render_single_line(), obj.content.clone())
    };
    if single_line {
        w.push_single_line();
    }
    render_dictionary(&content, w)?;
    if single_line {
        w.pop_single_line();
    }
    Ok(())
}

fn render_value(value: &Value, w: &mut LineWriter) -> Result<()> {
    match value {
        Value::Dictionary(dict) => render_dictionary(dict, w),
        Value::Array(arr) => render_array(arr, w),
        Value::Literal(lit) => {
            w.append(&render_literal_string(lit));
            Ok(())
        }
        Value::Object(object) => render_object(object, w),
        Value::Sections(sections) => render_sections(sections, w),
    }
}

/// Render a single [`Literal`]: the string (quoted/escaped per §4.5's rule)
/// for a plain string, or the id plus an optional ` /* comment */`
/// annotation for a live, non-silent reference.
fn render_literal_string(literal: &Literal) -> String {
    match literal {
        Literal::String(s) => render_plain_string(s),
        Literal::Ref { id, target, silent } => {
            let mut out = id.clone();
            if !*silent {
                if let Some(comment) = target.upgrade().and_then(|o| o.borrow().render_comment()) {
                    out.push_str(" /* ");
                    out.push_str(&comment);
                    out.push_str(" */");
                }
            }
            out
        }
    }
}

/// A string renders unquoted iff non-empty and every character is in
/// `[A-Za-z0-9._/]`; otherwise it is double-quoted with the project-parser's
/// four escapes, and non-ASCII characters are further replaced by `&#HHHH;`
/// XML-hex entities.
fn render_plain_string(s: &str) -> String {
    let is_bare = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/'));
    if is_bare {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_ascii() => out.push(c),
            c => out.push_str(&format!("&#{:04X};", c as u32)),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::linker::link;
    use crate::plist::parser::parse;

    #[test]
    fn scenario_s1_mutate_array_and_render() {
        let text = r#"{ foo = bar; baz = "qu ux"; arr = ( a, "b c", ); }"#;
        let mut dict = parse(text).unwrap();
        let array = dict.get_mut(&Literal::string("arr")).unwrap().as_array_mut().unwrap();
        array.truncate(1);
        let out = render(&dict, false).unwrap();
        assert_eq!(out, "{\n\tfoo = bar;\n\tbaz = \"qu ux\";\n\tarr = (\n\t\ta,\n\t);\n}\n");
    }

    #[test]
    fn unquoting_law_round_trips_special_strings() {
        for s in ["", "foo", "has space", "a\"b", "\u{03c0}"] {
            let rendered = render_plain_string(s);
            let mut dict = Dictionary::new();
            dict.insert(Literal::string("k"), Value::string(s));
            let out = render(&dict, false).unwrap();
            let reparsed = parse(&out).unwrap();
            assert_eq!(
                reparsed.get(&Literal::string("k")).unwrap().as_literal().unwrap().as_str(),
                s,
                "rendered form was {rendered:?}"
            );
        }
    }

    #[test]
    fn reference_comments_are_suppressed_when_silent() {
        let text = r#"{ objects = {
            AAAA000000000000000000AA = { isa = PBXContainerItemProxy; remoteGlobalIDString = BBBB000000000000000000BB; };
            BBBB000000000000000000BB = { isa = PBXNativeTarget; name = Target; };
        }; }"#;
        let root = parse(text).unwrap();
        let linked = link(root).unwrap();
        let out = render(&linked, false).unwrap();
        assert!(out.contains("remoteGlobalIDString = BBBB000000000000000000BB;"));
        assert!(!out.contains("remoteGlobalIDString = BBBB000000000000000000BB /*"));
    }
}
