//! Recursive-descent parser for the ASCII property-list dialect used by
//! `project.pbxproj` (`spec.md` §4.2).

use crate::error::{PlistError, Result};
use crate::model::literal::{Array, Dictionary, Literal, Value};
use crate::plist::scanner::Scanner;
use crate::plist::UTF8_PROLOGUE;

/// Parse `text` into a root dictionary. Does not link references — callers
/// pass the result to [`crate::model::linker::link`].
pub fn parse(text: &str) -> Result<Dictionary> {
    Ok(parse_with_prologue(text)?.1)
}

/// Same as [`parse`], but also reports whether the leading `// !$*UTF8*$!`
/// prologue was present, so a caller (`Project::parse`) can remember it and
/// have the renderer reproduce it only when the source actually carried it
/// (`spec.md` §6, Testable Property 1 / Scenario S1).
pub fn parse_with_prologue(text: &str) -> Result<(bool, Dictionary)> {
    let mut scanner = Scanner::new(text);
    skip_trivia(&mut scanner);
    let has_prologue = scanner.scan_string(UTF8_PROLOGUE);
    skip_trivia(&mut scanner);

    if scanner.peek_char() != Some('{') {
        return Err(PlistError::MissingRootDictionary.into());
    }
    let dict = parse_dict(&mut scanner)?;
    Ok((has_prologue, dict))
}

fn skip_trivia(scanner: &mut Scanner) {
    loop {
        let before = scanner.pos();
        scanner.scan_while(char::is_whitespace);
        if scanner.scan_string("/*") {
            scanner.scan_up_to("*/");
            scanner.scan_string("*/");
        }
        if scanner.pos() == before {
            break;
        }
    }
}

fn expect(scanner: &mut Scanner, c: char, expected: &str) -> Result<()> {
    skip_trivia(scanner);
    if scanner.consume_char(c) {
        Ok(())
    } else {
        Err(PlistError::UnexpectedToken {
            expected: expected.to_string(),
            context: scanner.context(20),
        }
        .into())
    }
}

fn parse_dict(scanner: &mut Scanner) -> Result<Dictionary> {
    expect(scanner, '{', "'{'")?;
    let mut dict = Dictionary::new();
    loop {
        skip_trivia(scanner);
        if scanner.consume_char('}') {
            break;
        }
        let key = parse_key(scanner)?;
        expect(scanner, '=', "'='")?;
        skip_trivia(scanner);
        let value = parse_value(scanner)?;
        expect(scanner, ';', "';'")?;
        dict.insert(key, value);
    }
    Ok(dict)
}

fn parse_array(scanner: &mut Scanner) -> Result<Array> {
    expect(scanner, '(', "'('")?;
    let mut array = Array::new();
    loop {
        skip_trivia(scanner);
        if scanner.consume_char(')') {
            break;
        }
        let value = parse_value(scanner)?;
        expect(scanner, ',', "','")?;
        array.push(value);
    }
    Ok(array)
}

fn parse_key(scanner: &mut Scanner) -> Result<Literal> {
    skip_trivia(scanner);
    if scanner.peek_char() == Some('"') {
        Ok(Literal::string(parse_quoted_string(scanner)?))
    } else {
        let run = scanner.scan_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if run.is_empty() {
            return Err(PlistError::UnexpectedToken {
                expected: "a key".to_string(),
                context: scanner.context(20),
            }
            .into());
        }
        Ok(Literal::string(run.to_string()))
    }
}

fn parse_value(scanner: &mut Scanner) -> Result<Value> {
    skip_trivia(scanner);
    match scanner.peek_char() {
        Some('{') => Ok(Value::Dictionary(parse_dict(scanner)?)),
        Some('(') => Ok(Value::Array(parse_array(scanner)?)),
        Some('"') => Ok(Value::string(parse_quoted_string(scanner)?)),
        _ => {
            let run = scanner.scan_while(|c| {
                c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '/'
            });
            if run.is_empty() {
                return Err(PlistError::UnexpectedToken {
                    expected: "a value".to_string(),
                    context: scanner.context(20),
                }
                .into());
            }
            Ok(Value::string(run.to_string()))
        }
    }
}

fn parse_quoted_string(scanner: &mut Scanner) -> Result<String> {
    if !scanner.consume_char('"') {
        return Err(PlistError::UnexpectedToken {
            expected: "'\"'".to_string(),
            context: scanner.context(20),
        }
        .into());
    }
    let mut out = String::new();
    loop {
        match scanner.next_char() {
            None => return Err(PlistError::UnterminatedString.into()),
            Some('"') => break,
            Some('\\') => match scanner.next_char() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => return Err(PlistError::UnknownEscape(other).into()),
                None => return Err(PlistError::UnterminatedString.into()),
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
    fn parses_scenario_s1() {
        let text = r#"{ foo = bar; baz = "qu ux"; arr = ( a, "b c", ); }"#;
        let dict = parse(text).unwrap();
        assert_eq!(
            dict.get(&Literal::string("foo")).unwrap().as_literal().unwrap().as_str(),
            "bar"
        );
        let arr = dict.get(&Literal::string("arr")).unwrap().as_array().unwrap();
        assert_eq!(arr.len(), 2);
    }

    #[test]
    fn parses_utf8_prologue_and_comments() {
        let text = "// !$*UTF8*$!\n{ /* a comment */ a = 1; }";
        let dict = parse(text).unwrap();
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn rejects_unterminated_string() {
        let text = r#"{ a = "unterminated; }"#;
        assert!(parse(text).is_err());
    }

    #[test]
    fn rejects_unknown_escape() {
        let text = r#"{ a = "bad\qescape"; }"#;
        assert!(parse(text).is_err());
    }

    #[test]
    fn rejects_missing_root_dictionary() {
        assert!(parse("not-a-dict").is_err());
    }

    #[test]
    fn quoted_keys_are_supported() {
        let text = r#"{ "my key" = value; }"#;
        let dict = parse(text).unwrap();
        assert!(dict.get(&Literal::string("my key")).is_some());
    }
}
