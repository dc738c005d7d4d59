//! Quote-aware CSV line tokenizer.

/// Split one line into fields.
///
/// Either `"` or `'` opens a quoted section, and only the character that
/// opened it can close it. Inside quotes a doubled quote character is one
/// literal quote, the other quote character and the delimiter are literal.
/// The last field is always emitted, so an empty line yields one empty field.
pub fn parse_line(line: &str, delimiter: char, trim: bool) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quote = '"';

    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == quote {
                if chars.peek() == Some(&quote) {
                    current.push(quote);
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' || c == '\'' {
            in_quotes = true;
            quote = c;
        } else if c == delimiter {
            fields.push(finish_field(&current, trim));
            current.clear();
        } else {
            current.push(c);
        }
    }

    fields.push(finish_field(&current, trim));
    fields
}

fn finish_field(raw: &str, trim: bool) -> String {
    if trim {
        raw.trim().to_string()
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_delimiter_stays_in_field() {
        assert_eq!(
            parse_line(r#"1,"Jane, Smith",30"#, ',', true),
            vec!["1", "Jane, Smith", "30"]
        );
    }

    #[test]
    fn doubled_quotes_unescape() {
        assert_eq!(parse_line(r#""say ""hi""",x"#, ',', false), vec![r#"say "hi""#, "x"]);
        assert_eq!(parse_line("'it''s',y", ',', false), vec!["it's", "y"]);
    }

    #[test]
    fn other_quote_char_is_literal_inside_quotes() {
        assert_eq!(parse_line(r#""it's",'a "b"'"#, ',', false), vec!["it's", r#"a "b""#]);
    }

    #[test]
    fn trailing_and_empty_fields() {
        assert_eq!(parse_line("", ',', true), vec![""]);
        assert_eq!(parse_line("a,", ',', true), vec!["a", ""]);
        assert_eq!(parse_line(" a ; b ", ';', true), vec!["a", "b"]);
        assert_eq!(parse_line(" a ; b ", ';', false), vec![" a ", " b "]);
    }
}
