//! Minimal HTML scanning for the fare search pages.
//!
//! The booking site renders plain server-side markup: fare tables with
//! fixed ids and a list of calendar cells. Finding elements by tag, class
//! and attribute is all the parsers need, so this module scans the text
//! directly rather than building a DOM.
//!
//! Tag and attribute names are matched case-insensitively. Elements of the
//! same tag may nest; the matching close tag is found by depth counting.

/// Elements that never have content or a close tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

/// One element found in a document.
///
/// Borrows from the scanned text; `open_tag` is the full `<tag ...>` and
/// `inner` is everything between it and the matching close tag; `outer`
/// spans the whole element, close tag included.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    open_tag: &'a str,
    inner: &'a str,
    outer: &'a str,
}

impl<'a> Element<'a> {
    /// Value of an attribute, undecoded. `Some("")` for a bare attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        attributes(self.open_tag)
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Whether the element has `attr` at all (even empty).
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Whether the `class` attribute lists `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Raw markup between the open and close tags.
    pub fn inner_html(&self) -> &'a str {
        self.inner
    }

    /// Inner markup with one descendant element cut out.
    ///
    /// Only that element's own bytes are removed; identical markup elsewhere
    /// in the element is kept. A `child` that is not a descendant leaves the
    /// markup unchanged.
    pub fn inner_html_without(&self, child: &Element<'_>) -> String {
        let base = self.inner.as_ptr() as usize;
        let start = (child.outer.as_ptr() as usize).checked_sub(base);
        match start {
            Some(start) if start + child.outer.len() <= self.inner.len() => {
                let end = start + child.outer.len();
                format!("{}{}", &self.inner[..start], &self.inner[end..])
            }
            _ => self.inner.to_string(),
        }
    }

    /// Visible text: tags removed, entities decoded, whitespace collapsed.
    pub fn text(&self) -> String {
        text_of(self.inner)
    }

    /// All descendants with the given tag, in document order.
    pub fn find_all(&self, tag: &str) -> Vec<Element<'a>> {
        find_all(self.inner, tag)
    }

    /// First descendant with the given tag and class.
    pub fn find_by_class(&self, tag: &str, class: &str) -> Option<Element<'a>> {
        find_by_class(self.inner, tag, class)
    }

    /// Whether any descendant with the given tag has the given class.
    pub fn contains_class(&self, tag: &str, class: &str) -> bool {
        self.find_by_class(tag, class).is_some()
    }
}

/// All elements with the given tag, in document order (nested ones included).
pub fn find_all<'a>(html: &'a str, tag: &str) -> Vec<Element<'a>> {
    let lower = html.to_ascii_lowercase();
    let tag = tag.to_ascii_lowercase();
    let is_void = VOID_ELEMENTS.contains(&tag.as_str());

    let mut out = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_open(&lower, &tag, pos) {
        let Some(open_end) = tag_end(html, start) else {
            break;
        };
        let open_tag = &html[start..open_end];

        let (inner, end) = if is_void || open_tag.ends_with("/>") {
            ("", open_end)
        } else {
            match matching_close(&lower, &tag, open_end) {
                Some(close) => (
                    &html[open_end..close],
                    tag_end(html, close).unwrap_or(html.len()),
                ),
                // Unclosed element: runs to the end of the document
                None => (&html[open_end..], html.len()),
            }
        };

        out.push(Element {
            open_tag,
            inner,
            outer: &html[start..end],
        });
        pos = open_end;
    }

    out
}

/// First element with the given tag whose `attr` equals `value`.
pub fn find_by_attr<'a>(html: &'a str, tag: &str, attr: &str, value: &str) -> Option<Element<'a>> {
    find_all(html, tag)
        .into_iter()
        .find(|e| e.attr(attr) == Some(value))
}

/// First element with the given tag and class.
pub fn find_by_class<'a>(html: &'a str, tag: &str, class: &str) -> Option<Element<'a>> {
    find_all(html, tag).into_iter().find(|e| e.has_class(class))
}

/// Strip tags, decode entities and collapse whitespace.
pub fn text_of(markup: &str) -> String {
    let mut stripped = String::with_capacity(markup.len());
    let mut in_tag = false;

    for ch in markup.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                // Tags separate words ("<td>a</td><td>b</td>")
                stripped.push(' ');
            }
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }

    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode the character references the booking pages use.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];

        let decoded = after
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&after[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Find `<tag` at or after `from`, followed by whitespace, `>` or `/`.
fn find_open(lower: &str, tag: &str, from: usize) -> Option<usize> {
    find_tag_token(lower, "<", tag, from)
}

/// Find `</tag` at or after `from`.
fn find_close(lower: &str, tag: &str, from: usize) -> Option<usize> {
    find_tag_token(lower, "</", tag, from)
}

fn find_tag_token(lower: &str, prefix: &str, tag: &str, from: usize) -> Option<usize> {
    let needle = format!("{prefix}{tag}");
    let mut pos = from;

    loop {
        let idx = lower.get(pos..)?.find(&needle)? + pos;
        let next = lower.as_bytes().get(idx + needle.len());
        match next {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => return Some(idx),
            None => return None,
            _ => pos = idx + 1,
        }
    }
}

/// Index just past the `>` that closes the tag opened at `start`.
fn tag_end(html: &str, start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;

    for (i, &b) in html.as_bytes().iter().enumerate().skip(start + 1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(i + 1),
            None => {}
        }
    }

    None
}

/// Start index of the close tag matching an element whose content starts at `from`.
fn matching_close(lower: &str, tag: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut pos = from;

    loop {
        let close = find_close(lower, tag, pos)?;
        match find_open(lower, tag, pos) {
            Some(open) if open < close => {
                depth += 1;
                pos = open + 1;
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(close);
                }
                pos = close + 1;
            }
        }
    }
}

/// Iterate `(name, value)` pairs of an open tag.
fn attributes(open_tag: &str) -> impl Iterator<Item = (&str, &str)> {
    let body = open_tag
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim_end_matches('/');
    // Skip the tag name
    let body = body
        .find(|c: char| c.is_ascii_whitespace())
        .map(|i| &body[i..])
        .unwrap_or("");

    AttrIter { rest: body }
}

struct AttrIter<'a> {
    rest: &'a str,
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');
        if rest.is_empty() {
            return None;
        }

        let name_end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        let after_name = rest[name_end..].trim_start();

        let Some(value_part) = after_name.strip_prefix('=') else {
            self.rest = after_name;
            return Some((name, ""));
        };
        let value_part = value_part.trim_start();

        let (value, remaining) = match value_part.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let body = &value_part[1..];
                match body.find(q) {
                    Some(end) => (&body[..end], &body[end + 1..]),
                    None => (body, ""),
                }
            }
            _ => {
                let end = value_part
                    .find(|c: char| c.is_ascii_whitespace())
                    .unwrap_or(value_part.len());
                (&value_part[..end], &value_part[end..])
            }
        };

        self.rest = remaining;
        Some((name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div class="summary"><TABLE id="table-0"><tr><td data-fare-type="Light Fare">
            <span class="currency">$</span>95.50</td></tr></TABLE></div>
        <div class="date-row">
          <ul>
            <li class="js-cal-date-change date-change" data-new-date=""><img class="prevDay" src="prev.png"></li>
            <li class="js-cal-date-change date-change" data-new-date='20190504'>Sat, 04 May<span class="lowest-day-fare">AUD 95.50</span></li>
            <li class="js-cal-date-change date-change" data-new-date=20190505 disabled>Sun,&nbsp;05 May</li>
          </ul>
          <div class="inner"><div>nested</div></div>
        </div>
        <input type="hidden" name="__RequestVerificationToken" value="tok&amp;en" />
    "#;

    #[test]
    fn finds_elements_in_order() {
        let items = find_all(PAGE, "li");
        assert_eq!(items.len(), 3);
        assert!(items[0].contains_class("img", "prevDay"));
        assert_eq!(items[1].attr("data-new-date"), Some("20190504"));
        assert_eq!(items[2].attr("data-new-date"), Some("20190505"));
    }

    #[test]
    fn tag_match_is_case_insensitive_and_exact() {
        assert!(find_by_attr(PAGE, "table", "id", "table-0").is_some());
        // "<t" must not match "<table" or "<td"
        assert!(find_all(PAGE, "t").is_empty());
    }

    #[test]
    fn nested_same_tag_is_balanced() {
        let row = find_by_class(PAGE, "div", "date-row").unwrap();
        assert!(row.inner_html().contains("nested"));
        assert!(row.inner_html().contains("</ul>"));
        assert!(!row.inner_html().contains("__RequestVerificationToken"));
    }

    #[test]
    fn attributes() {
        let items = find_all(PAGE, "li");
        assert!(items[0].has_class("date-change"));
        assert!(items[0].has_class("js-cal-date-change"));
        assert!(!items[0].has_class("date"));
        assert_eq!(items[0].attr("data-new-date"), Some(""));
        assert!(items[2].has_attr("disabled"));
        assert!(!items[1].has_attr("disabled"));
        assert_eq!(items[1].attr("DATA-NEW-DATE"), Some("20190504"));
    }

    #[test]
    fn void_elements_have_no_content() {
        let input = find_by_attr(PAGE, "input", "name", "__RequestVerificationToken").unwrap();
        assert_eq!(input.inner_html(), "");
        assert_eq!(input.attr("value"), Some("tok&amp;en"));

        let imgs = find_all(PAGE, "img");
        assert_eq!(imgs.len(), 1);
        assert!(imgs[0].has_class("prevDay"));
    }

    #[test]
    fn text_extraction() {
        let items = find_all(PAGE, "li");
        assert_eq!(items[0].text(), "");
        assert_eq!(items[1].text(), "Sat, 04 May AUD 95.50");
        assert_eq!(items[2].text(), "Sun, 05 May");

        let fare = items[1].find_by_class("span", "lowest-day-fare").unwrap();
        assert_eq!(fare.text(), "AUD 95.50");
    }

    #[test]
    fn entity_decoding() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&#36;95&#x2E;5"), "$95.5");
        assert_eq!(decode_entities("&lt;b&gt; &quot;x&quot;"), "<b> \"x\"");
        // Unknown or unterminated references are left alone
        assert_eq!(decode_entities("AT&T; &bogus; & more"), "AT&T; &bogus; & more");
    }

    #[test]
    fn cutting_out_a_child_keeps_matching_text_elsewhere() {
        let html = r#"<li>Mon, 06 May 95<span class="fare">95</span></li>"#;
        let li = find_all(html, "li")[0];
        let span = li.find_by_class("span", "fare").unwrap();

        assert_eq!(li.inner_html_without(&span), "Mon, 06 May 95");

        let other = find_all("<span>x</span>", "span")[0];
        assert_eq!(li.inner_html_without(&other), li.inner_html());
    }

    #[test]
    fn unclosed_element_runs_to_end() {
        let html = "<ul><li>one<li>two</ul>";
        let items = find_all(html, "li");
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].text(), "two");
    }
}
