//! Line-oriented parser for `.xcconfig` text (`spec.md` §4.9).

use crate::config::line::{Conditionals, Line};
use crate::error::{ConfigError, Result};
use crate::plist::scanner::Scanner;

/// Parse `text` into one [`Line`] per newline-separated logical line.
pub fn parse(text: &str) -> Result<Vec<Line>> {
    text.lines().map(parse_line).collect()
}

fn parse_line(text: &str) -> Result<Line> {
    let mut scanner = Scanner::new(text);
    scanner.scan_while(|c| c == ' ' || c == '\t');

    if scanner.is_at_end() {
        return Ok(Line::Empty);
    }

    if scanner.scan_string("//") {
        let rest = scanner.remaining();
        let comment = rest.strip_prefix(' ').unwrap_or(rest);
        return Ok(Line::Comment(comment.to_string()));
    }

    if scanner.remaining().starts_with("#include") {
        return parse_include(&mut scanner);
    }

    parse_config_line(&mut scanner)
}

fn parse_include(scanner: &mut Scanner) -> Result<Line> {
    scanner.scan_string("#include");
    let optional = scanner.consume_char('?');
    scanner.scan_while(|c| c == ' ' || c == '\t');
    if !scanner.consume_char('"') {
        return Err(ConfigError::IncludeMissingOpenQuote.into());
    }
    let path = scanner.scan_up_to("\"");
    if !scanner.consume_char('"') {
        return Err(ConfigError::IncludeMissingCloseQuote.into());
    }
    scanner.scan_while(|c| c == ' ' || c == '\t');
    if !scanner.is_at_end() {
        return Err(ConfigError::IncludeTrailingChars(scanner.remaining().to_string()).into());
    }
    Ok(Line::Include {
        path: path.to_string(),
        optional,
        resolved_url: None,
        loaded: None,
    })
}

fn parse_config_line(scanner: &mut Scanner) -> Result<Line> {
    let key = scanner.scan_while(|c| c.is_ascii_alphanumeric() || c == '_');
    if key.is_empty() {
        return Err(ConfigError::MissingKey.into());
    }
    let key = key.to_string();

    let conditionals = parse_conditionals(scanner)?;

    scanner.scan_while(|c| c == ' ' || c == '\t');
    if !scanner.consume_char('=') {
        return Err(ConfigError::AssignmentMissingEquals.into());
    }

    let (values, trailing_comment) = parse_value_cluster(scanner)?;

    Ok(Line::Config {
        key,
        conditionals,
        values,
        trailing_comment,
    })
}

fn parse_conditionals(scanner: &mut Scanner) -> Result<Conditionals> {
    let mut conditionals = Conditionals::default();
    loop {
        if scanner.peek_char() != Some('[') {
            break;
        }
        scanner.consume_char('[');
        if scanner.consume_char(']') {
            break;
        }
        let body = scanner.scan_up_to("]");
        if !scanner.consume_char(']') {
            return Err(ConfigError::ConditionalMissingCloseBracket.into());
        }
        let Some((name, value)) = body.split_once('=') else {
            return Err(ConfigError::ConditionalMissingEquals.into());
        };
        match name {
            "config" => conditionals.config = value.to_string(),
            "sdk" => conditionals.sdk = value.to_string(),
            "arch" => conditionals.arch = value.to_string(),
            other => return Err(ConfigError::InvalidConditionalName(other.to_string()).into()),
        }
    }
    Ok(conditionals)
}

fn parse_value_cluster(scanner: &mut Scanner) -> Result<(Vec<String>, Option<String>)> {
    let mut values = Vec::new();
    loop {
        scanner.scan_while(|c| c == ' ' || c == '\t');
        if scanner.is_at_end() || scanner.remaining().starts_with("//") {
            break;
        }
        if scanner.peek_char() == Some('"') {
            values.push(parse_quoted_value(scanner)?);
        } else {
            values.push(scan_unquoted_token(scanner).to_string());
        }
    }

    let trailing_comment = if scanner.scan_string("//") {
        let rest = scanner.remaining();
        Some(rest.strip_prefix(' ').unwrap_or(rest).to_string())
    } else {
        None
    };

    Ok((values, trailing_comment))
}

/// Scan an unquoted token: a run of non-whitespace characters, stopping
/// before a `//` that starts a comment (a lone `/` is ordinary token text).
fn scan_unquoted_token<'a>(scanner: &mut Scanner<'a>) -> &'a str {
    let start = scanner.pos();
    loop {
        if scanner.is_at_end() {
            break;
        }
        let c = scanner.peek_char().unwrap();
        if c.is_whitespace() || scanner.remaining().starts_with("//") {
            break;
        }
        scanner.next_char();
    }
    scanner.slice(start, scanner.pos())
}

fn parse_quoted_value(scanner: &mut Scanner) -> Result<String> {
    scanner.consume_char('"');
    let mut out = String::new();
    loop {
        match scanner.next_char() {
            None => return Err(ConfigError::ValueMissingCloseQuote.into()),
            Some('"') => break,
            Some('\\') => match scanner.next_char() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => return Err(ConfigError::UnknownEscape(other).into()),
                None => return Err(ConfigError::DanglingEscape.into()),
            },
            Some(c) => out.push(c),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_s5_conditional_with_quoted_and_bare_values() {
        let lines = parse(r#"K[sdk=iphoneos] = "v 1" v2 // c"#).unwrap();
        assert_eq!(lines.len(), 1);
        let Line::Config { key, conditionals, values, trailing_comment } = &lines[0] else {
            panic!("expected a config line");
        };
        assert_eq!(key, "K");
        assert_eq!(conditionals.sdk, "iphoneos");
        assert_eq!(conditionals.config, "*");
        assert_eq!(values, &vec!["v 1".to_string(), "v2".to_string()]);
        assert_eq!(trailing_comment.as_deref(), Some("c"));
    }

    #[test]
    fn include_lines() {
        let lines = parse("#include \"Shared.xcconfig\"\n#include? \"Optional.xcconfig\"").unwrap();
        assert!(matches!(&lines[0], Line::Include { optional: false, path, .. } if path == "Shared.xcconfig"));
        assert!(matches!(&lines[1], Line::Include { optional: true, path, .. } if path == "Optional.xcconfig"));
    }

    #[test]
    fn empty_and_comment_lines() {
        let lines = parse("   \n// hello\n").unwrap();
        assert!(matches!(lines[0], Line::Empty));
        assert!(matches!(&lines[1], Line::Comment(c) if c == "hello"));
    }

    #[test]
    fn rejects_invalid_conditional_name() {
        assert!(parse("K[platform=ios] = 1").is_err());
    }

    #[test]
    fn rejects_unterminated_quoted_value() {
        assert!(parse(r#"K = "unterminated"#).is_err());
    }

    #[test]
    fn empty_quoted_value_is_preserved() {
        let lines = parse(r#"K = """#).unwrap();
        let Line::Config { values, .. } = &lines[0] else {
            panic!("expected a config line");
        };
        assert_eq!(values, &vec!["".to_string()]);
    }
}
