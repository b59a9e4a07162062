//! Directive argument helpers

/// Split `source` at commas that are not nested inside quotes, parentheses,
/// brackets or braces. Each piece is trimmed; an all-blank source yields no
/// pieces.
///
/// # Examples
///
/// ```
/// use zeno_template::args::split_arguments;
///
/// assert_eq!(split_arguments("'a', fn(1, 2), [3, 4]"), vec!["'a'", "fn(1, 2)", "[3, 4]"]);
/// assert!(split_arguments("  ").is_empty());
/// ```
pub fn split_arguments(source: &str) -> Vec<String> {
	if source.trim().is_empty() {
		return Vec::new();
	}

	let mut pieces = Vec::new();
	let mut current = String::new();
	let mut depth = 0usize;
	let mut quote: Option<char> = None;
	let mut escaped = false;

	for c in source.chars() {
		if let Some(q) = quote {
			current.push(c);
			if escaped {
				escaped = false;
			} else if c == '\\' {
				escaped = true;
			} else if c == q {
				quote = None;
			}
			continue;
		}
		match c {
			'\'' | '"' | '`' => {
				quote = Some(c);
				current.push(c);
			}
			'(' | '[' | '{' => {
				depth += 1;
				current.push(c);
			}
			')' | ']' | '}' => {
				depth = depth.saturating_sub(1);
				current.push(c);
			}
			',' if depth == 0 => {
				pieces.push(current.trim().to_string());
				current.clear();
			}
			_ => current.push(c),
		}
	}
	pieces.push(current.trim().to_string());
	pieces
}

/// Strip one level of matching single or double quotes.
///
/// # Examples
///
/// ```
/// use zeno_template::args::unquote;
///
/// assert_eq!(unquote("'content'"), "content");
/// assert_eq!(unquote(" \"x\" "), "x");
/// assert_eq!(unquote("bare"), "bare");
/// ```
pub fn unquote(source: &str) -> &str {
	let trimmed = source.trim();
	let bytes = trimmed.as_bytes();
	if bytes.len() >= 2
		&& (bytes[0] == b'\'' || bytes[0] == b'"')
		&& bytes[bytes.len() - 1] == bytes[0]
	{
		&trimmed[1..trimmed.len() - 1]
	} else {
		trimmed
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("'title', 'Home'", vec!["'title'", "'Home'"])]
	#[case("'a,b'", vec!["'a,b'"])]
	#[case(r#""it\"s, ok", x"#, vec![r#""it\"s, ok""#, "x"])]
	#[case("{a: 1, b: 2}, c", vec!["{a: 1, b: 2}", "c"])]
	#[case("single", vec!["single"])]
	fn test_split_arguments(#[case] source: &str, #[case] expected: Vec<&str>) {
		assert_eq!(split_arguments(source), expected);
	}

	#[test]
	fn test_unquote_mismatched_quotes() {
		assert_eq!(unquote("'x\""), "'x\"");
		assert_eq!(unquote("'"), "'");
	}
}
