use kv::TxnId;

/// One parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Begin,
    Put { key: String, value: String, tid: Option<TxnId> },
    Get { key: String, tid: Option<TxnId> },
    Del { key: String, tid: Option<TxnId> },
    Commit { tid: TxnId },
    Rollback { tid: TxnId },
    CommitAll,
    ShowAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

/// Strips a trailing `tid` token off `tokens` iff the overall token count is
/// at least 3 and the last token is all ASCII digits. Applied identically to
/// `PUT`/`GET`/`DEL` before their verb-specific arity is checked, so a
/// trailing digit is always consumed as a candidate `tid` first - even if
/// that leaves too few tokens for the verb, which is then a `ParseError`
/// rather than the digit being reinterpreted as part of the value.
fn strip_trailing_tid<'a>(tokens: &'a [&'a str]) -> (&'a [&'a str], Option<TxnId>) {
    if tokens.len() >= 3 {
        if let Some(tid) = tokens.last().and_then(|t| t.parse::<TxnId>().ok()) {
            return (&tokens[..tokens.len() - 1], Some(tid));
        }
    }
    (tokens, None)
}

pub fn parse_line(line: &str) -> Result<Command, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((verb, rest)) = tokens.split_first() else {
        return Err(ParseError("empty command".to_string()));
    };

    match verb.to_ascii_uppercase().as_str() {
        "BEGIN" => Ok(Command::Begin),
        "COMMITALL" => Ok(Command::CommitAll),
        "SHOWALL" => Ok(Command::ShowAll),
        "COMMIT" => {
            let tid = rest.first().ok_or_else(|| ParseError("COMMIT requires a transaction id".to_string()))?;
            let tid = tid.parse::<TxnId>().map_err(|_| ParseError(format!("invalid transaction id \"{tid}\"")))?;
            Ok(Command::Commit { tid })
        }
        "ROLLBACK" => {
            let tid = rest.first().ok_or_else(|| ParseError("ROLLBACK requires a transaction id".to_string()))?;
            let tid = tid.parse::<TxnId>().map_err(|_| ParseError(format!("invalid transaction id \"{tid}\"")))?;
            Ok(Command::Rollback { tid })
        }
        "GET" => {
            let (fields, tid) = strip_trailing_tid(&tokens);
            if fields.len() != 2 {
                return Err(ParseError("GET requires a key".to_string()));
            }
            Ok(Command::Get { key: fields[1].to_string(), tid })
        }
        "DEL" => {
            let (fields, tid) = strip_trailing_tid(&tokens);
            if fields.len() != 2 {
                return Err(ParseError("DEL requires a key".to_string()));
            }
            Ok(Command::Del { key: fields[1].to_string(), tid })
        }
        "PUT" => {
            let (fields, tid) = strip_trailing_tid(&tokens);
            if fields.len() != 3 {
                return Err(ParseError("PUT requires a key and a value".to_string()));
            }
            Ok(Command::Put { key: fields[1].to_string(), value: fields[2].to_string(), tid })
        }
        other => Err(ParseError(format!("unknown command \"{other}\""))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_begin() {
        assert_eq!(parse_line("BEGIN"), Ok(Command::Begin));
        assert_eq!(parse_line("begin"), Ok(Command::Begin));
    }

    #[test]
    fn parses_put_without_tid() {
        assert_eq!(
            parse_line("PUT k1 v1"),
            Ok(Command::Put { key: "k1".to_string(), value: "v1".to_string(), tid: None })
        );
    }

    #[test]
    fn parses_put_with_tid() {
        assert_eq!(
            parse_line("PUT k1 v1 2"),
            Ok(Command::Put { key: "k1".to_string(), value: "v1".to_string(), tid: Some(2) })
        );
    }

    #[test]
    fn put_rejects_multiword_value() {
        assert!(parse_line("PUT k1 hello world 2").is_err());
    }

    #[test]
    fn put_with_ambiguous_trailing_digit_value_is_a_parse_error() {
        // "100" is stripped as a tid candidate first (>= 3 tokens, all-digit
        // last token), leaving only "PUT key" - too few fields for PUT.
        assert!(parse_line("PUT key 100").is_err());
    }

    #[test]
    fn parses_get_with_and_without_tid() {
        assert_eq!(parse_line("GET k1"), Ok(Command::Get { key: "k1".to_string(), tid: None }));
        assert_eq!(parse_line("GET k1 3"), Ok(Command::Get { key: "k1".to_string(), tid: Some(3) }));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse_line("").is_err());
        assert!(parse_line("   ").is_err());
    }

    #[test]
    fn rejects_put_missing_value() {
        assert!(parse_line("PUT k1").is_err());
    }

    #[test]
    fn rejects_get_missing_key() {
        assert!(parse_line("GET").is_err());
    }

    #[test]
    fn rejects_unknown_verb() {
        assert!(parse_line("FROB k1").is_err());
    }

    #[test]
    fn verb_matching_is_case_insensitive() {
        assert_eq!(parse_line("get k1"), Ok(Command::Get { key: "k1".to_string(), tid: None }));
        assert_eq!(parse_line("CoMmItAlL"), Ok(Command::CommitAll));
    }
}
