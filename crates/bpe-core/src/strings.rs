//! # Text Utilities
//!
//! Free-text sanitization for fields submitted to SEFAZ and textual cleanup
//! of serialized XML before signing, merging, or transmission.
//!
//! SEFAZ rejects accented characters and most punctuation in free-text
//! fields. [`replace_special_chars`] maps the common Portuguese accents to
//! their ASCII base letters and drops everything outside a short allowed
//! set.

/// Punctuation kept by [`replace_special_chars`] besides ASCII letters,
/// digits, and the space.
pub const ALLOWED_PUNCTUATION: &str = "@#,-_.;:$%/";

const DSIG_DEFAULT_NS: &str = r#"xmlns:default="http://www.w3.org/2000/09/xmldsig#""#;
const XSI_NS: &str = r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#;

fn transliterate(c: char) -> Option<char> {
    let mapped = match c {
        'á' | 'à' | 'ã' | 'â' => 'a',
        'Á' | 'À' | 'Ã' | 'Â' => 'A',
        'é' | 'ê' => 'e',
        'É' | 'Ê' => 'E',
        'í' => 'i',
        'Í' => 'I',
        'ó' | 'ô' | 'õ' => 'o',
        'Ó' | 'Ô' | 'Õ' => 'O',
        'ú' | 'ü' => 'u',
        'Ú' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        _ => return None,
    };
    Some(mapped)
}

/// Trim, transliterate accents, replace `&` with `e`, and drop every
/// character outside ASCII letters, digits, the space, and
/// [`ALLOWED_PUNCTUATION`].
pub fn replace_special_chars(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter_map(|c| {
            if c == '&' {
                return Some('e');
            }
            if let Some(mapped) = transliterate(c) {
                return Some(mapped);
            }
            if c.is_ascii_alphanumeric() || c == ' ' || ALLOWED_PUNCTUATION.contains(c) {
                Some(c)
            } else {
                None
            }
        })
        .collect()
}

/// Trim, cut to at most `max_chars` characters, then apply
/// [`replace_special_chars`].
pub fn sanitize(input: &str, max_chars: usize) -> String {
    let truncated: String = input.trim().chars().take(max_chars).collect();
    replace_special_chars(&truncated)
}

/// Left-pad `value` with zeros to `width` characters. Longer values are
/// returned unchanged.
pub fn pad_left(value: &str, width: usize) -> String {
    format!("{value:0>width$}")
}

/// Keep only ASCII digits.
pub fn only_numbers(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Remove a leading `<?xml ... ?>` declaration, if any.
pub fn strip_declaration(xml: &str) -> &str {
    let trimmed = xml.trim_start();
    if trimmed.starts_with("<?xml") {
        if let Some(end) = trimmed.find("?>") {
            return trimmed[end + 2..].trim_start();
        }
    }
    xml
}

/// Collapse whitespace that sits entirely between two tags.
fn collapse_between_tags(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(gt) = rest.find('>') {
        out.push_str(&rest[..=gt]);
        rest = &rest[gt + 1..];
        let ws_len = rest.len() - rest.trim_start().len();
        if ws_len > 0 && rest[ws_len..].starts_with('<') {
            rest = &rest[ws_len..];
        }
    }
    out.push_str(rest);
    out
}

/// Normalize serialized XML text.
///
/// Removes the default-prefixed XML-DSig namespace declaration and its
/// prefixes, `standalone="no"`, line breaks, and tabs, then collapses
/// whitespace between tags. With `remove_declaration` the leading
/// `<?xml ... ?>` is removed too.
pub fn clear_xml_string(xml: &str, remove_declaration: bool) -> String {
    let cleaned = xml
        .replace(DSIG_DEFAULT_NS, "")
        .replace(" standalone=\"no\"", "")
        .replace("default:", "")
        .replace(":default", "")
        .replace(['\n', '\r', '\t'], "");
    let collapsed = collapse_between_tags(&cleaned);
    if remove_declaration {
        strip_declaration(&collapsed).to_string()
    } else {
        collapsed
    }
}

/// [`clear_xml_string`] (declaration kept) plus removal of the
/// XMLSchema-instance namespace declaration that some SEFAZ responses add
/// next to the portal namespace.
pub fn clear_protocoled_xml(xml: &str) -> String {
    let portal = format!(r#"xmlns="{}""#, crate::constants::PORTAL_NAMESPACE);
    clear_xml_string(xml, false).replace(&format!("{portal}{XSI_NS}"), &portal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accents_and_ampersand() {
        assert_eq!(replace_special_chars("  São João & Cia  "), "Sao Joao e Cia");
        assert_eq!(replace_special_chars("ÁÉÍÓÚ çÇ ü"), "AEIOU cC u");
    }

    #[test]
    fn disallowed_chars_dropped() {
        assert_eq!(replace_special_chars("a!b?c*d(e)"), "abcde");
        assert_eq!(replace_special_chars("R$ 10,00 - 50%"), "R$ 10,00 - 50%");
        assert_eq!(replace_special_chars("a<b>c\"d'"), "abcd");
    }

    #[test]
    fn sanitize_truncates_by_chars() {
        assert_eq!(sanitize("  ação  ", 2), "ac");
        assert_eq!(sanitize("abcdef", 3), "abc");
        assert_eq!(sanitize("", 10), "");
    }

    #[test]
    fn sanitize_result_never_longer_than_limit() {
        let long = "é".repeat(300);
        assert_eq!(sanitize(&long, 255).chars().count(), 255);
    }

    #[test]
    fn padding() {
        assert_eq!(pad_left("7", 8), "00000007");
        assert_eq!(pad_left("123456789", 8), "123456789");
        assert_eq!(pad_left("", 3), "000");
    }

    #[test]
    fn numbers_only() {
        assert_eq!(only_numbers("12.345.678/0001-95"), "12345678000195");
        assert_eq!(only_numbers("ISENTO"), "");
    }

    #[test]
    fn clear_removes_breaks_and_prefixes() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n<a>\n\t<default:b xmlns:default=\"http://www.w3.org/2000/09/xmldsig#\">x y</default:b>\r\n</a>";
        let out = clear_xml_string(xml, false);
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><a><b >x y</b></a>"
        );
    }

    #[test]
    fn clear_can_drop_declaration() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<a>  <b/>  </a>";
        assert_eq!(clear_xml_string(xml, true), "<a><b/></a>");
    }

    #[test]
    fn text_whitespace_preserved() {
        assert_eq!(clear_xml_string("<a> x </a>", false), "<a> x </a>");
    }

    #[test]
    fn protocoled_drops_xsi() {
        let xml = format!(
            "<bpeProc xmlns=\"{}\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"><x/></bpeProc>",
            crate::constants::PORTAL_NAMESPACE
        );
        assert_eq!(
            clear_protocoled_xml(&xml),
            format!(
                "<bpeProc xmlns=\"{}\"><x/></bpeProc>",
                crate::constants::PORTAL_NAMESPACE
            )
        );
    }

    #[test]
    fn strip_declaration_without_one() {
        assert_eq!(strip_declaration("<a/>"), "<a/>");
    }
}
