/// Default column separators for table files.
pub const DEFAULT_DELIMITERS: &str = ", ;\t";

///
/// Split `line` on any run of the characters in `delimiters`. Leading and trailing
/// delimiters produce no empty tokens.
///
pub fn tokenize<'a>(line: &'a str, delimiters: &str) -> Vec<&'a str>
{
    line.split(|c: char| delimiters.contains(c))
        .filter(|token| !token.is_empty())
        .collect()
}

/// Tokenize every line of `text`, one row per line.
pub fn tokenize_lines(text: &str, delimiters: &str) -> Vec<Vec<String>>
{
    text.lines()
        .map(|line| tokenize(line.trim_end_matches('\r'), delimiters).into_iter().map(String::from).collect())
        .collect()
}

#[test]
fn check_tokenize_mixed_delimiters()
{
    let tokens = tokenize("  Mach, Alpha;\tCL  CD,", DEFAULT_DELIMITERS);
    assert_eq!(tokens, vec!["Mach", "Alpha", "CL", "CD"]);
    assert!(tokenize(" ,;\t", DEFAULT_DELIMITERS).is_empty());
}

#[test]
fn check_tokenize_lines()
{
    let rows = tokenize_lines("a b\r\n\n1,2\n", DEFAULT_DELIMITERS);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], vec!["a", "b"]);
    assert!(rows[1].is_empty());
    assert_eq!(rows[2], vec!["1", "2"]);
}
