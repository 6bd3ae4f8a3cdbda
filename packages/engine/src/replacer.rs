//! # Span Replacer
//!
//! Splices rendered change markup into the first text fragment whose
//! decoded payload contains the target. When that fragment sits inside a
//! run, the run is closed before the change and reopened after it, with
//! its properties copied, so change blocks never nest inside a run:
//!
//! ```text
//! <w:r>P<w:t a>before TARGET after</w:t></w:r>
//!   ↓
//! <w:r>P<w:t a>before </w:t></w:r>CHANGE<w:r>P<w:t a> after</w:t></w:r>
//! ```
//!
//! The raw bytes of `before` and `after` are copied as-is, so character
//! references in them survive unchanged. Empty sides produce no element,
//! and a run left with nothing in it is dropped. Content outside the
//! matched run is never touched.
//!
//! With [`SpanMode::Replace`] only the deleted text inside the target is
//! spliced out; the rest of the target stays with `before` and `after`.
//! With [`SpanMode::InsertAfter`] the whole target stays in `before` and
//! the change markup lands right after it.

use crate::markup::{FragmentScanner, TextFragment};
use std::ops::Range;

const RUN_OPEN: &str = "<w:r";
const RUN_CLOSE: &str = "</w:r>";
const PROPERTIES_CLOSE: &str = "</w:rPr>";
const EMPTY_PROPERTIES: &str = "<w:rPr/>";

/// How the matched target is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanMode<'a> {
    /// The first occurrence of this text inside the target takes the
    /// change markup's place
    Replace(&'a str),
    /// The target is kept and used as an anchor
    InsertAfter,
}

/// Splice `change_markup` at the first occurrence of `target`, or `None`
/// when no single fragment contains it or the replaced text is not part
/// of it.
pub fn replace_first(
    scanner: &FragmentScanner,
    content: &str,
    target: &str,
    change_markup: &str,
    mode: SpanMode<'_>,
) -> Option<String> {
    if target.is_empty() {
        return None;
    }

    let fragment = scanner
        .fragments(content)
        .into_iter()
        .find(|f| f.text.contains(target))?;
    let start = fragment.text.find(target)?;
    let end = start + target.len();

    let (span_start, span_end) = match mode {
        SpanMode::Replace(deleted) => {
            if deleted.is_empty() {
                return None;
            }
            let offset = fragment.text[start..end].find(deleted)?;
            (start + offset, start + offset + deleted.len())
        }
        SpanMode::InsertAfter => (end, end),
    };

    let open_tag = fragment.open_tag(content);
    let close_tag = fragment.close_tag(content);
    let wrap = |payload: &str| {
        if payload.is_empty() {
            String::new()
        } else {
            format!("{open_tag}{payload}{close_tag}")
        }
    };
    let before = wrap(&content[fragment.payload.start..fragment.content_offset(span_start)]);
    let after = wrap(&content[fragment.content_offset(span_end)..fragment.payload.end]);

    let result = match enclosing_run(content, &fragment) {
        Some(run) => split_run(content, &fragment, &run, &before, change_markup, &after),
        None => {
            let element = &fragment.element;
            [
                &content[..element.start],
                before.as_str(),
                change_markup,
                after.as_str(),
                &content[element.end..],
            ]
            .concat()
        }
    };

    Some(result)
}

/// A `<w:r>` element around a text fragment
#[derive(Debug)]
struct Run {
    /// Opening tag
    open: Range<usize>,
    /// Leading `<w:rPr>` element; empty when the run has none
    properties: Range<usize>,
    /// Closing tag
    close: Range<usize>,
}

/// `<w:r>` or `<w:r ...>`, but not `<w:rPr>` and friends
fn is_run_tag(content: &str, at: usize) -> bool {
    matches!(
        content.as_bytes().get(at + RUN_OPEN.len()),
        Some(b'>' | b' ' | b'\t' | b'\r' | b'\n')
    )
}

fn enclosing_run(content: &str, fragment: &TextFragment) -> Option<Run> {
    let head = &content[..fragment.element.start];
    let open_start = head
        .rmatch_indices(RUN_OPEN)
        .map(|(at, _)| at)
        .find(|&at| is_run_tag(content, at))?;
    if head[open_start..].contains(RUN_CLOSE) {
        return None;
    }
    let open_end = open_start + head[open_start..].find('>')? + 1;
    if head[..open_end].ends_with("/>") {
        return None;
    }

    let body = &head[open_end..];
    let indent = body.len() - body.trim_start().len();
    let props_start = open_end + indent;
    let body = &body[indent..];
    let properties = if body.starts_with(EMPTY_PROPERTIES) {
        props_start..props_start + EMPTY_PROPERTIES.len()
    } else if body.starts_with("<w:rPr>") || body.starts_with("<w:rPr ") {
        // rPrChange carries a nested rPr, so take the last close
        let close = body.rfind(PROPERTIES_CLOSE)?;
        props_start..props_start + close + PROPERTIES_CLOSE.len()
    } else {
        open_end..open_end
    };

    let tail_start = fragment.element.end;
    let tail = &content[tail_start..];
    let close_offset = tail.find(RUN_CLOSE)?;
    let reopened = tail[..close_offset]
        .match_indices(RUN_OPEN)
        .any(|(at, _)| is_run_tag(content, tail_start + at));
    if reopened {
        return None;
    }
    let close_start = tail_start + close_offset;

    Some(Run {
        open: open_start..open_end,
        properties,
        close: close_start..close_start + RUN_CLOSE.len(),
    })
}

fn split_run(
    content: &str,
    fragment: &TextFragment,
    run: &Run,
    before: &str,
    change_markup: &str,
    after: &str,
) -> String {
    let leading = &content[run.properties.end..fragment.element.start];
    let trailing = &content[fragment.element.end..run.close.start];

    let mut result = String::with_capacity(content.len() + change_markup.len() + before.len() + after.len());
    if before.is_empty() && leading.trim().is_empty() {
        result.push_str(&content[..run.open.start]);
    } else {
        result.push_str(&content[..fragment.element.start]);
        result.push_str(before);
        result.push_str(RUN_CLOSE);
    }

    result.push_str(change_markup);

    if after.is_empty() && trailing.trim().is_empty() {
        result.push_str(&content[run.close.end..]);
    } else {
        result.push_str(&content[run.open.clone()]);
        result.push_str(&content[run.properties.clone()]);
        result.push_str(after);
        result.push_str(&content[fragment.element.end..]);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANGE: &str = "<CHANGE/>";

    fn replace(content: &str, target: &str) -> Option<String> {
        replace_first(&FragmentScanner::new(), content, target, CHANGE, SpanMode::Replace(target))
    }

    #[test]
    fn test_split_keeps_attributes_on_both_sides() {
        let content = r#"<w:r><w:t xml:space="preserve">Cap Amount: 6 months of fees</w:t></w:r>"#;
        let result = replace(content, "6 months").unwrap();
        assert_eq!(
            result,
            r#"<w:r><w:t xml:space="preserve">Cap Amount: </w:t></w:r><CHANGE/><w:r><w:t xml:space="preserve"> of fees</w:t></w:r>"#
        );
    }

    #[test]
    fn test_run_properties_copied_to_reopened_run() {
        let content = r#"<w:r w:rsidR="00A1"><w:rPr><w:b/></w:rPr><w:t>Cap: 6 months of fees</w:t></w:r>"#;
        let result = replace(content, "6 months").unwrap();
        assert_eq!(
            result,
            concat!(
                r#"<w:r w:rsidR="00A1"><w:rPr><w:b/></w:rPr><w:t>Cap: </w:t></w:r>"#,
                "<CHANGE/>",
                r#"<w:r w:rsidR="00A1"><w:rPr><w:b/></w:rPr><w:t> of fees</w:t></w:r>"#,
            )
        );
    }

    #[test]
    fn test_nested_property_change_copied_whole() {
        let props = r#"<w:rPr><w:b/><w:rPrChange w:id="9"><w:rPr/></w:rPrChange></w:rPr>"#;
        let content = format!("<w:r>{props}<w:t>6 months of fees</w:t></w:r>");
        let result = replace(&content, "6 months").unwrap();
        assert_eq!(result, format!("<CHANGE/><w:r>{props}<w:t> of fees</w:t></w:r>"));
    }

    #[test]
    fn test_whole_payload_match_leaves_no_empty_runs() {
        let content = "<w:p><w:r><w:rPr><w:i/></w:rPr><w:t>6 months</w:t></w:r></w:p>";
        assert_eq!(replace(content, "6 months").unwrap(), "<w:p><CHANGE/></w:p>");
    }

    #[test]
    fn test_run_siblings_stay_on_their_side() {
        let content = "<w:r><w:tab/><w:t>6 months</w:t><w:br/></w:r>";
        assert_eq!(
            replace(content, "6 months").unwrap(),
            "<w:r><w:tab/></w:r><CHANGE/><w:r><w:br/></w:r>"
        );
    }

    #[test]
    fn test_only_first_occurrence_is_replaced() {
        let content = "<w:t>6 months</w:t><w:t>then 6 months</w:t>";
        let result = replace(content, "6 months").unwrap();
        assert_eq!(result, "<CHANGE/><w:t>then 6 months</w:t>");
    }

    #[test]
    fn test_first_occurrence_within_fragment() {
        let content = "<w:t>a b a</w:t>";
        assert_eq!(replace(content, "a").unwrap(), "<CHANGE/><w:t> b a</w:t>");
    }

    #[test]
    fn test_references_outside_match_are_preserved() {
        let content = "<w:t>Smith &amp; Sons &#x2019;s fee &lt;$5&gt;</w:t>";
        let result = replace(content, "fee").unwrap();
        assert_eq!(
            result,
            "<w:t>Smith &amp; Sons &#x2019;s </w:t><CHANGE/><w:t> &lt;$5&gt;</w:t>"
        );
    }

    #[test]
    fn test_target_with_reserved_characters() {
        let content = "<w:t>pay $5 (net) & more</w:t>";
        let result = replace(content, "$5 (net)").unwrap();
        assert_eq!(result, "<w:t>pay </w:t><CHANGE/><w:t> & more</w:t>");
    }

    #[test]
    fn test_surrounding_bytes_untouched() {
        let prefix = r#"<w:body><w:p w:rsidR="1"><w:pPr/><w:r><w:t>Keep</w:t></w:r>"#;
        let suffix = "<w:r><w:t>Tail</w:t></w:r></w:p></w:body>";
        let content = format!("{prefix}<w:r><w:t>Swap</w:t></w:r>{suffix}");
        let result = replace(&content, "Swap").unwrap();
        assert_eq!(result, format!("{prefix}<CHANGE/>{suffix}"));
    }

    #[test]
    fn test_replace_keeps_rest_of_wider_target() {
        let content = "<w:t>The Supplier shall deliver within 30 days of invoice.</w:t>";
        let result = replace_first(
            &FragmentScanner::new(),
            content,
            "deliver within 30 days",
            CHANGE,
            SpanMode::Replace("30 days"),
        )
        .unwrap();
        assert_eq!(
            result,
            "<w:t>The Supplier shall deliver within </w:t><CHANGE/><w:t> of invoice.</w:t>"
        );
    }

    #[test]
    fn test_replaced_text_must_sit_inside_target() {
        let content = "<w:t>30 days after delivery within the month</w:t>";
        let result = replace_first(
            &FragmentScanner::new(),
            content,
            "delivery within",
            CHANGE,
            SpanMode::Replace("30 days"),
        );
        assert_eq!(result, None);
    }

    #[test]
    fn test_insert_after_keeps_anchor() {
        let content = "<w:t>Section 4. Fees apply.</w:t>";
        let result =
            replace_first(&FragmentScanner::new(), content, "Section 4.", CHANGE, SpanMode::InsertAfter)
                .unwrap();
        assert_eq!(result, "<w:t>Section 4.</w:t><CHANGE/><w:t> Fees apply.</w:t>");
    }

    #[test]
    fn test_split_target_is_not_replaced() {
        let content = "<w:t>Lim</w:t><w:t>itation</w:t>";
        assert_eq!(replace(content, "Limitation"), None);
    }
}
