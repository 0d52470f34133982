//! Danmaku XML document parsing
//!
//! The comment endpoint serves `<i>` with any number of `<d p="...">text</d>`
//! children next to bookkeeping elements (`chatserver`, `maxlimit`, ...).
//! Parsing yields a `CommentDocument` whose variant records how many `<d>`
//! entries the document held.

use quick_xml::events::Event;
use quick_xml::Reader;

const ROOT: &[u8] = b"i";
const ENTRY: &[u8] = b"d";

/// Parsed comment document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentDocument {
    /// No `<d>` entries
    Empty,

    /// Exactly one `<d>` entry
    Single(String),

    /// Two or more `<d>` entries, in document order
    Many(Vec<String>),
}

impl CommentDocument {
    /// Parse a danmaku document. A root other than `<i>` counts as empty.
    pub fn parse(xml: &str) -> Result<Self, quick_xml::Error> {
        let mut reader = Reader::from_str(xml);
        let mut entries = Vec::new();
        let mut depth = 0usize;
        let mut root_matches = false;
        let mut current: Option<String> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    if depth == 0 {
                        root_matches = e.name().as_ref() == ROOT;
                    } else if depth == 1 && root_matches && e.name().as_ref() == ENTRY {
                        current = Some(String::new());
                    }
                    depth += 1;
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if depth == 1 {
                        if let Some(text) = current.take() {
                            entries.push(text);
                        }
                    }
                }
                Event::Empty(e) => {
                    if depth == 1 && root_matches && e.name().as_ref() == ENTRY {
                        entries.push(String::new());
                    }
                }
                Event::Text(t) => {
                    if let Some(buf) = current.as_mut() {
                        buf.push_str(&t.unescape()?);
                    }
                }
                Event::CData(c) => {
                    if let Some(buf) = current.as_mut() {
                        buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self::from_entries(entries))
    }

    fn from_entries(mut entries: Vec<String>) -> Self {
        match entries.len() {
            0 => CommentDocument::Empty,
            1 => CommentDocument::Single(entries.remove(0)),
            _ => CommentDocument::Many(entries),
        }
    }

    /// Number of `<d>` entries in the document, blank ones included
    pub fn len(&self) -> usize {
        match self {
            CommentDocument::Empty => 0,
            CommentDocument::Single(_) => 1,
            CommentDocument::Many(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CommentDocument::Empty)
    }

    /// Entries with any text after trimming, untrimmed and in document order
    pub fn into_entries(self) -> Vec<String> {
        let entries = match self {
            CommentDocument::Empty => Vec::new(),
            CommentDocument::Single(entry) => vec![entry],
            CommentDocument::Many(entries) => entries,
        };
        entries
            .into_iter()
            .filter(|entry| !entry.trim().is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<i>
  <chatserver>chat.bilibili.com</chatserver>
  <chatid>42</chatid>
  <maxlimit>1500</maxlimit>
  <d p="12.5,1,25,16777215,1700000000,0,abc,1">前方高能</d>
  <d p="13.0,1,25,16777215,1700000001,0,def,2">  哈哈哈 </d>
  <d p="14.0,1,25,16777215,1700000002,0,ghi,3">a &amp; b</d>
</i>"#;

    #[test]
    fn test_parse_many() {
        let document = CommentDocument::parse(SAMPLE).unwrap();
        assert_eq!(document.len(), 3);
        assert_eq!(
            document.into_entries(),
            vec!["前方高能", "  哈哈哈 ", "a & b"]
        );
    }

    #[test]
    fn test_parse_single_entry_is_one_element() {
        let xml = r#"<i><chatid>1</chatid><d p="1,1,25,0,0,0,x,1">only</d></i>"#;
        let document = CommentDocument::parse(xml).unwrap();
        assert_eq!(document, CommentDocument::Single("only".to_string()));
        assert_eq!(document.into_entries(), vec!["only"]);
    }

    #[test]
    fn test_blank_entries_are_dropped() {
        let single = CommentDocument::parse(r#"<i><d p="x">   </d></i>"#).unwrap();
        assert_eq!(single.len(), 1);
        assert!(single.into_entries().is_empty());

        let many = CommentDocument::parse(r#"<i><d p="x"/><d p="y">ok</d><d p="z">
        </d></i>"#)
        .unwrap();
        assert_eq!(many.len(), 3);
        assert_eq!(many.into_entries(), vec!["ok"]);
    }

    #[test]
    fn test_empty_document() {
        let document =
            CommentDocument::parse("<i><chatserver>chat.bilibili.com</chatserver></i>").unwrap();
        assert!(document.is_empty());
        assert!(document.into_entries().is_empty());
    }

    #[test]
    fn test_foreign_root_is_empty() {
        let document = CommentDocument::parse(r#"<x><d p="1">text</d></x>"#).unwrap();
        assert!(document.is_empty());
    }

    #[test]
    fn test_malformed_document_errors() {
        assert!(CommentDocument::parse("<i><d p=\"1\">text</x></i>").is_err());
    }
}
