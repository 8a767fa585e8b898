//! Renders a [`Line`] list back to `.xcconfig` text, normalizing comment
//! spacing to one leading space (`spec.md` §8 Testable Property 3).

use crate::config::line::{Conditionals, Line};

pub fn render(lines: &[Line]) -> String {
    let mut out = lines.iter().map(render_line).collect::<Vec<_>>().join("\n");
    out.push('\n');
    out
}

fn render_line(line: &Line) -> String {
    match line {
        Line::Empty => String::new(),
        Line::Comment(text) => format!("// {text}"),
        Line::Include { path, optional, .. } => {
            let marker = if *optional { "?" } else { "" };
            format!("#include{marker} \"{path}\"")
        }
        Line::Config {
            key,
            conditionals,
            values,
            trailing_comment,
        } => {
            let mut out = key.clone();
            out.push_str(&render_conditionals(conditionals));
            out.push_str(" = ");
            out.push_str(
                &values
                    .iter()
                    .map(|v| render_value_token(v))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
            if let Some(comment) = trailing_comment {
                out.push_str(&format!(" // {comment}"));
            }
            out
        }
    }
}

fn render_conditionals(conditionals: &Conditionals) -> String {
    let mut out = String::new();
    for (name, value) in [
        ("config", &conditionals.config),
        ("sdk", &conditionals.sdk),
        ("arch", &conditionals.arch),
    ] {
        if value != "*" {
            out.push_str(&format!("[{name}={value}]"));
        }
    }
    out
}

fn render_value_token(token: &str) -> String {
    let needs_quoting =
        token.is_empty() || token.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\');
    if !needs_quoting {
        return token.to_string();
    }
    let mut out = String::from("\"");
    for c in token.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parser::parse;

    #[test]
    fn scenario_s5_renders_identically() {
        let text = r#"K[sdk=iphoneos] = "v 1" v2 // c"#;
        let lines = parse(text).unwrap();
        assert_eq!(render(&lines), format!("{text}\n"));
    }

    #[test]
    fn comment_spacing_is_normalized() {
        let lines = parse("//no space").unwrap();
        assert_eq!(render(&lines), "// no space\n");
    }
}
