//! Named form-field extraction from HTML login pages.
//!
//! Only the value of one `<input>` element is ever needed, so no DOM is built. Two
//! interchangeable strategies exist behind [`FormFieldExtractor`]: an attribute-aware tag
//! scanner and a regular-expression matcher. [`FieldExtractorChain`] tries them in order.

// crates.io
use regex::Regex;
// self
use crate::_prelude::*;

/// Pulls the `value` of the `<input>` element whose `name` equals `field`.
pub trait FormFieldExtractor: Send + Sync {
	/// Returns the first matching value, if any.
	fn extract(&self, document: &str, field: &str) -> Option<String>;
}

/// Structural scanner: walks tags, skips comments, parses attributes, decodes entities.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkupFieldExtractor;
impl FormFieldExtractor for MarkupFieldExtractor {
	fn extract(&self, document: &str, field: &str) -> Option<String> {
		let lowered = document.to_ascii_lowercase();
		let mut pos = 0;

		while let Some(offset) = lowered[pos..].find('<') {
			let start = pos + offset;
			let tail = &lowered[start..];

			if tail.starts_with("<!--") {
				pos = start + tail.find("-->")? + 3;

				continue;
			}
			if !is_input_tag(tail) {
				pos = start + 1;

				continue;
			}

			let attrs_start = start + "<input".len();
			let attrs_end = tag_end(document, attrs_start);
			let attrs = parse_attributes(&document[attrs_start..attrs_end]);
			let named = attrs.iter().any(|(name, value)| {
				name.eq_ignore_ascii_case("name")
					&& value.as_deref().map(decode_entities).as_deref() == Some(field)
			});

			if named {
				return attrs
					.into_iter()
					.find(|(name, _)| name.eq_ignore_ascii_case("value"))
					.and_then(|(_, value)| value)
					.map(|value| decode_entities(&value));
			}

			pos = attrs_end;
		}

		None
	}
}

/// Regular-expression fallback for markup the scanner cannot walk.
#[derive(Clone, Copy, Debug, Default)]
pub struct PatternFieldExtractor;
impl FormFieldExtractor for PatternFieldExtractor {
	fn extract(&self, document: &str, field: &str) -> Option<String> {
		const VALUE: &str = r#"(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^\s"'>]+))"#;

		let field = regex::escape(field);
		let name = format!(r#"\bname\s*=\s*(?:"{field}"|'{field}'|{field}[\s/])"#);
		let trailing_name = format!(r#"\bname\s*=\s*(?:"{field}"|'{field}'|{field}[\s/>])"#);
		let value = format!(r"\bvalue\s*=\s*{VALUE}");
		let patterns = [
			format!(r"(?is)<input\s[^>]*?{name}[^>]*?{value}"),
			format!(r"(?is)<input\s[^>]*?{value}[^>]*?{trailing_name}"),
		];
		let document = Regex::new(r"(?s)<!--.*?-->").ok()?.replace_all(document, "");

		patterns.iter().find_map(|pattern| {
			let captures = Regex::new(pattern).ok()?.captures(&document)?;

			["dq", "sq", "bare"]
				.iter()
				.find_map(|group| captures.name(group))
				.map(|value| decode_entities(value.as_str()))
		})
	}
}

/// Ordered list of extractors; the first hit wins.
#[derive(Clone)]
pub struct FieldExtractorChain(Vec<Arc<dyn FormFieldExtractor>>);
impl FieldExtractorChain {
	/// Creates a chain from explicit extractors.
	pub fn new(extractors: Vec<Arc<dyn FormFieldExtractor>>) -> Self {
		Self(extractors)
	}
}
impl Default for FieldExtractorChain {
	fn default() -> Self {
		Self(vec![Arc::new(MarkupFieldExtractor), Arc::new(PatternFieldExtractor)])
	}
}
impl FormFieldExtractor for FieldExtractorChain {
	fn extract(&self, document: &str, field: &str) -> Option<String> {
		self.0.iter().find_map(|extractor| extractor.extract(document, field))
	}
}
impl Debug for FieldExtractorChain {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "FieldExtractorChain({} extractors)", self.0.len())
	}
}

fn is_input_tag(tail: &str) -> bool {
	tail.strip_prefix("<input")
		.and_then(|rest| rest.chars().next())
		.is_some_and(|c| c.is_ascii_whitespace() || c == '/' || c == '>')
}

/// Index of the `>` closing the tag that starts at `from`, ignoring quoted `>`.
fn tag_end(document: &str, from: usize) -> usize {
	let mut quote = None;

	for (idx, byte) in document.bytes().enumerate().skip(from) {
		match (quote, byte) {
			(Some(open), b) if b == open => quote = None,
			(Some(_), _) => {},
			(None, b'"' | b'\'') => quote = Some(byte),
			(None, b'>') => return idx,
			(None, _) => {},
		}
	}

	document.len()
}

fn parse_attributes(raw: &str) -> Vec<(String, Option<String>)> {
	let bytes = raw.as_bytes();
	let mut attrs = Vec::new();
	let mut i = 0;

	while i < bytes.len() {
		if bytes[i].is_ascii_whitespace() || bytes[i] == b'/' {
			i += 1;

			continue;
		}

		let name_start = i;

		while i < bytes.len()
			&& !matches!(bytes[i], b'=' | b'/' | b'>')
			&& !bytes[i].is_ascii_whitespace()
		{
			i += 1;
		}

		let name = raw[name_start..i].to_owned();

		while i < bytes.len() && bytes[i].is_ascii_whitespace() {
			i += 1;
		}

		if i >= bytes.len() || bytes[i] != b'=' {
			if name.is_empty() {
				i += 1;
			} else {
				attrs.push((name, None));
			}

			continue;
		}

		i += 1;

		while i < bytes.len() && bytes[i].is_ascii_whitespace() {
			i += 1;
		}

		let value = match bytes.get(i) {
			Some(&quote @ (b'"' | b'\'')) => {
				let value_start = i + 1;
				let value_end = raw[value_start..]
					.bytes()
					.position(|b| b == quote)
					.map_or(raw.len(), |offset| value_start + offset);

				i = (value_end + 1).min(bytes.len());

				&raw[value_start..value_end]
			},
			_ => {
				let value_start = i;

				while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
					i += 1;
				}

				&raw[value_start..i]
			},
		};

		if !name.is_empty() {
			attrs.push((name, Some(value.to_owned())));
		}
	}

	attrs
}

fn decode_entities(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	let mut rest = raw;

	while let Some(amp) = rest.find('&') {
		out.push_str(&rest[..amp]);
		rest = &rest[amp..];

		let decoded = rest
			.find(';')
			.filter(|&semi| semi <= 10)
			.and_then(|semi| decode_entity(&rest[1..semi]).map(|c| (c, semi)));

		match decoded {
			Some((c, semi)) => {
				out.push(c);
				rest = &rest[semi + 1..];
			},
			None => {
				out.push('&');
				rest = &rest[1..];
			},
		}
	}

	out.push_str(rest);

	out
}

fn decode_entity(entity: &str) -> Option<char> {
	match entity {
		"amp" => Some('&'),
		"lt" => Some('<'),
		"gt" => Some('>'),
		"quot" => Some('"'),
		"apos" => Some('\''),
		"nbsp" => Some('\u{a0}'),
		_ => {
			let code = entity.strip_prefix('#')?;
			let value = match code.strip_prefix(['x', 'X']) {
				Some(hex) => u32::from_str_radix(hex, 16).ok()?,
				None => code.parse().ok()?,
			};

			char::from_u32(value)
		},
	}
}
