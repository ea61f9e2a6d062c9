use std::collections::VecDeque;

use log::{debug, trace};

use crate::{
    sax::{
        entities::EntityTable,
        error::{Error, SaxResult},
        internal::{is_namechar, is_namestart_char, is_whitespace, Terminator},
        Attribute, Characters, Comment, EndElement, Event, ProcessingInstruction, QName,
        StartElement,
    },
    stream::{CharacterSource, CharacterStream},
};

const COMMENT_END: [char; 3] = ['-', '-', '>'];
const PI_END: [char; 2] = ['?', '>'];

/// `prefix:local` collected one character at a time.
struct NameBuffer {
    prefix: String,
    local_part: String,
}

impl NameBuffer {
    fn new(first: char) -> NameBuffer {
        NameBuffer {
            prefix: String::new(),
            local_part: first.to_string(),
        }
    }

    fn push(&mut self, c: char) {
        self.local_part.push(c);
    }

    fn promote_prefix(&mut self, context: &'static str) -> SaxResult<()> {
        if !self.prefix.is_empty() {
            return Err(Error::DuplicatePrefix(context));
        }
        self.prefix = std::mem::take(&mut self.local_part);
        Ok(())
    }

    fn finish(self, context: &'static str) -> SaxResult<QName> {
        if self.local_part.is_empty() {
            return Err(Error::Malformed(format!(
                "{} '{}:' has no local part.",
                context, self.prefix
            )));
        }
        Ok(QName {
            namespace_uri: String::new(),
            local_part: self.local_part,
            prefix: self.prefix,
        })
    }
}

/// Pull reader turning a [`CharacterSource`] into [`Event`]s.
///
/// Call [`has_next`](XmlEventReader::has_next) to find out whether another
/// event is available and [`next_event`](XmlEventReader::next_event) to take
/// it. Events come out in document order. Self-closing tags produce a
/// `StartElement` immediately followed by an `EndElement` with the same name.
///
/// Every error is final: after one, the reader refuses further work with
/// [`Error::Usage`].
pub struct XmlEventReader<S: CharacterSource = CharacterStream> {
    source: S,
    events: VecDeque<Event>,
    // a probe already ran and nothing took its result yet
    has_next_called: bool,
    failed: bool,
    entities: EntityTable,
}

impl XmlEventReader<CharacterStream> {
    pub fn from_text(text: &str) -> XmlEventReader<CharacterStream> {
        XmlEventReader::new(CharacterStream::new(text))
    }
}

impl<S: CharacterSource> XmlEventReader<S> {
    pub fn new(source: S) -> XmlEventReader<S> {
        XmlEventReader::with_entities(source, EntityTable::new())
    }

    pub fn with_entities(source: S, entities: EntityTable) -> XmlEventReader<S> {
        XmlEventReader {
            source,
            events: VecDeque::with_capacity(2),
            has_next_called: false,
            failed: false,
            entities,
        }
    }

    /// Registers an entity for the rest of the document. Built-in entities
    /// can't be redefined.
    pub fn add_entity(&mut self, name: &str, replacement_text: &str) -> SaxResult<()> {
        self.entities.insert(name, replacement_text)
    }

    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn has_next(&mut self) -> SaxResult<bool> {
        if !self.events.is_empty() {
            return Ok(true);
        }
        if self.failed {
            return Err(Error::Usage("reader already failed"));
        }
        if self.has_next_called {
            return Ok(false);
        }

        match self.probe() {
            Ok(found) => Ok(found),
            Err(err) => {
                debug!("reader failed: {}", err);
                self.failed = true;
                Err(err)
            }
        }
    }

    pub fn next_event(&mut self) -> SaxResult<Event> {
        if self.events.is_empty() && !self.has_next_called && !self.has_next()? {
            self.failed = true;
            return Err(Error::Usage(
                "next_event() while there isn't one instead of checking has_next() first",
            ));
        }

        self.has_next_called = false;

        match self.events.pop_front() {
            Some(event) => Ok(event),
            None => {
                self.failed = true;
                Err(Error::Usage(
                    "next_event() while there isn't one, ignoring has_next() == false",
                ))
            }
        }
    }

    fn probe(&mut self) -> SaxResult<bool> {
        loop {
            self.has_next_called = true;

            let c = match self.read()? {
                Some(c) => c,
                None => return Ok(false),
            };

            let found = if c == '<' {
                self.handle_tag()?
            } else {
                self.handle_text(c)?
            };
            if found {
                return Ok(true);
            }

            // xml declaration was skipped, look for the next real event
            self.has_next_called = false;
        }
    }

    fn push_event(&mut self, event: Event) {
        debug!("event {:?}", event);
        self.events.push_back(event);
    }

    /// `None` at the end of the stream.
    fn read(&mut self) -> SaxResult<Option<char>> {
        let c = self.source.get();
        if self.source.eof() {
            return Ok(None);
        }
        if self.source.bad() {
            return Err(Error::StreamBad);
        }
        c.map(Some).ok_or(Error::StreamBad)
    }

    fn next_char(&mut self, context: &'static str) -> SaxResult<char> {
        self.read()?.ok_or(Error::UnexpectedEof(context))
    }

    fn push_back(&mut self) -> SaxResult<()> {
        self.source.unget();
        if self.source.bad() {
            return Err(Error::StreamBad);
        }
        Ok(())
    }

    /// First non-whitespace character, `None` at the end of the stream.
    fn skip_whitespace(&mut self) -> SaxResult<Option<char>> {
        loop {
            match self.read()? {
                Some(c) if is_whitespace(c) => {}
                other => return Ok(other),
            }
        }
    }

    fn handle_text(&mut self, first: char) -> SaxResult<bool> {
        let mut data = String::new();

        if first == '&' {
            self.resolve_entity(&mut data)?;
        } else {
            data.push(first);
        }

        loop {
            match self.read()? {
                None => break,
                Some('<') => {
                    self.push_back()?;
                    break;
                }
                Some('&') => self.resolve_entity(&mut data)?,
                Some(c) => data.push(c),
            }
        }

        let characters = Characters::new(data)?;
        self.push_event(Event::Characters(characters));
        Ok(true)
    }

    fn handle_tag(&mut self) -> SaxResult<bool> {
        let c = self.next_char("tag")?;
        trace!("tag dispatch on {:?}", c);

        match c {
            '?' => self.handle_processing_instruction(),
            '/' => self.handle_tag_end(),
            '!' => self.handle_markup_declaration(),
            c if is_namestart_char(c) => self.handle_tag_start(c),
            c => Err(Error::Malformed(format!(
                "Unknown character '{}' within element.",
                c
            ))),
        }
    }

    /// Returns false for the XML declaration, which produces no event.
    fn handle_processing_instruction(&mut self) -> SaxResult<bool> {
        let target = self.handle_processing_instruction_target()?;

        if target.eq_ignore_ascii_case("xml") {
            self.skip_xml_declaration()?;
            return Ok(false);
        }

        let mut data = String::new();
        let mut end = Terminator::new(&PI_END);
        loop {
            let c = self.next_char("processing instruction")?;
            if end.feed(c, &mut data) {
                break;
            }
        }

        self.push_event(Event::ProcessingInstruction(ProcessingInstruction {
            target,
            data,
        }));
        Ok(true)
    }

    fn handle_processing_instruction_target(&mut self) -> SaxResult<String> {
        let mut name = String::new();

        loop {
            let c = self.next_char("processing instruction target")?;
            match c {
                '?' | '>' => {
                    return Err(Error::Malformed(
                        "Processing instruction ended before its target name could be read."
                            .to_owned(),
                    ))
                }
                c if is_whitespace(c) => {
                    if name.is_empty() {
                        return Err(Error::Malformed(
                            "Processing instruction without target name.".to_owned(),
                        ));
                    }
                    return Ok(name);
                }
                c => {
                    if name.is_empty() && !c.is_ascii_alphabetic() {
                        return Err(Error::Malformed(format!(
                            "Character '{}' not supported as first character of a processing instruction target name.",
                            c
                        )));
                    }
                    name.push(c);
                }
            }
        }
    }

    // TODO: read version/encoding/standalone instead of discarding them.
    fn skip_xml_declaration(&mut self) -> SaxResult<()> {
        let mut content = String::new();
        let mut end = Terminator::new(&PI_END);
        loop {
            let c = self.next_char("XML declaration")?;
            if end.feed(c, &mut content) {
                break;
            }
        }
        debug!("skipped XML declaration {:?}", content);
        Ok(())
    }

    fn handle_markup_declaration(&mut self) -> SaxResult<bool> {
        match self.next_char("markup declaration")? {
            '-' => self.handle_comment(),
            c => Err(Error::Unimplemented(format!(
                "Markup declaration '<!{}'",
                c
            ))),
        }
    }

    fn handle_comment(&mut self) -> SaxResult<bool> {
        if self.next_char("comment")? != '-' {
            return Err(Error::Malformed("Comment malformed.".to_owned()));
        }

        let mut text = String::new();
        let mut end = Terminator::new(&COMMENT_END);
        loop {
            let c = self.next_char("comment")?;
            if end.feed(c, &mut text) {
                break;
            }
        }

        self.push_event(Event::Comment(Comment { text }));
        Ok(true)
    }

    fn handle_tag_start(&mut self, first: char) -> SaxResult<bool> {
        let mut name = NameBuffer::new(first);
        let mut attributes: Vec<Attribute> = Vec::new();

        loop {
            let c = self.next_char("start tag")?;
            match c {
                ':' => name.promote_prefix("element name")?,
                '>' => {
                    let name = name.finish("Start tag")?;
                    self.push_event(Event::StartElement(StartElement { name, attributes }));
                    return Ok(true);
                }
                '/' => {
                    if self.next_char("start tag")? != '>' {
                        return Err(Error::Malformed(
                            "Empty start + end tag end without closing '>'.".to_owned(),
                        ));
                    }
                    let name = name.finish("Start tag")?;
                    self.push_event(Event::StartElement(StartElement {
                        name: name.clone(),
                        attributes,
                    }));
                    self.push_event(Event::EndElement(EndElement { name }));
                    return Ok(true);
                }
                c if is_whitespace(c) => {
                    if name.local_part.is_empty() {
                        return Err(Error::Malformed(
                            "Start tag name is incomplete.".to_owned(),
                        ));
                    }
                    // leaves the closing `>` or `/>` for this loop
                    attributes = self.handle_attributes()?;
                }
                c if is_namechar(c) => name.push(c),
                c => {
                    return Err(Error::Malformed(format!(
                        "Character '{}' not supported in a start tag name.",
                        c
                    )))
                }
            }
        }
    }

    fn handle_attributes(&mut self) -> SaxResult<Vec<Attribute>> {
        let mut attributes = Vec::new();

        loop {
            let c = self.next_char("start tag")?;
            match c {
                '>' => {
                    self.push_back()?;
                    break;
                }
                '/' => {
                    if self.next_char("start tag")? != '>' {
                        return Err(Error::Malformed(
                            "Empty start + end tag end without closing '>'.".to_owned(),
                        ));
                    }
                    self.push_back()?;
                    self.push_back()?;
                    break;
                }
                c if is_whitespace(c) => {}
                c => {
                    let name = self.handle_attribute_name(c)?;
                    let value = self.handle_attribute_value()?;
                    attributes.push(Attribute { name, value });
                }
            }
        }

        Ok(attributes)
    }

    fn handle_attribute_name(&mut self, first: char) -> SaxResult<QName> {
        if !is_namestart_char(first) {
            return Err(Error::Malformed(format!(
                "Character '{}' not supported as first character of an attribute name.",
                first
            )));
        }

        let mut name = NameBuffer::new(first);

        loop {
            let c = self.next_char("attribute name")?;
            match c {
                ':' => name.promote_prefix("attribute name")?,
                '=' => return name.finish("Attribute name"),
                c if is_whitespace(c) => match self.skip_whitespace()? {
                    None => return Err(Error::UnexpectedEof("attribute")),
                    Some('=') => return name.finish("Attribute name"),
                    Some(_) => {
                        return Err(Error::Malformed("Attribute name is malformed.".to_owned()))
                    }
                },
                c if is_namechar(c) => name.push(c),
                c => {
                    return Err(Error::Malformed(format!(
                        "Character '{}' not supported in an attribute name.",
                        c
                    )))
                }
            }
        }
    }

    fn handle_attribute_value(&mut self) -> SaxResult<String> {
        let delimiter = match self.skip_whitespace()? {
            None => return Err(Error::UnexpectedEof("attribute value")),
            Some(c) if c == '\'' || c == '"' => c,
            Some(c) => {
                return Err(Error::Malformed(format!(
                    "Attribute value doesn't start with a delimiter like ''' or '\"', instead, '{}' was found.",
                    c
                )))
            }
        };

        let mut value = String::new();
        loop {
            let c = self.next_char("attribute value")?;
            if c == delimiter {
                return Ok(value);
            }
            if c == '&' {
                self.resolve_entity(&mut value)?;
            } else {
                value.push(c);
            }
        }
    }

    /// Called after `&`. Appends the replacement text to `out` as is.
    fn resolve_entity(&mut self, out: &mut String) -> SaxResult<()> {
        let first = self.next_char("entity")?;
        if first == ';' {
            return Err(Error::Malformed("Entity has no name.".to_owned()));
        }

        let mut name = String::from(first);
        loop {
            let c = self.next_char("entity")?;
            if c == ';' {
                break;
            }
            name.push(c);
        }

        match self.entities.get(&name) {
            Some(text) => {
                trace!("resolved &{};", name);
                out.push_str(text);
                Ok(())
            }
            None => Err(Error::UnresolvedEntity(name)),
        }
    }

    fn handle_tag_end(&mut self) -> SaxResult<bool> {
        let first = self.next_char("end tag")?;
        if !is_namestart_char(first) {
            return Err(Error::Malformed(format!(
                "Character '{}' not supported in an end tag name.",
                first
            )));
        }

        // not compared against the open start tags
        let mut name = NameBuffer::new(first);

        loop {
            let c = self.next_char("end tag")?;
            match c {
                ':' => name.promote_prefix("element name")?,
                '>' => break,
                c if is_whitespace(c) => match self.skip_whitespace()? {
                    None => return Err(Error::UnexpectedEof("end tag")),
                    Some('>') => break,
                    Some(c) => {
                        return Err(Error::Malformed(format!(
                            "Character '{}' not supported after an end tag name.",
                            c
                        )))
                    }
                },
                c if is_namechar(c) => name.push(c),
                c => {
                    return Err(Error::Malformed(format!(
                        "Character '{}' not supported in an end tag name.",
                        c
                    )))
                }
            }
        }

        let name = name.finish("End tag")?;
        self.push_event(Event::EndElement(EndElement { name }));
        Ok(true)
    }
}

impl<S: CharacterSource> Iterator for XmlEventReader<S> {
    type Item = SaxResult<Event>;

    fn next(&mut self) -> Option<SaxResult<Event>> {
        if self.failed {
            return None;
        }
        match self.has_next() {
            Ok(true) => Some(self.next_event()),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn start(name: &str, attributes: Vec<Attribute>) -> Event {
        Event::StartElement(StartElement::new(QName::local(name), attributes))
    }

    fn end(name: &str) -> Event {
        Event::EndElement(EndElement::new(QName::local(name)))
    }

    fn chars(data: &str) -> Event {
        Event::Characters(Characters::new(data.to_owned()).unwrap())
    }

    fn read_all(text: &str) -> SaxResult<Vec<Event>> {
        XmlEventReader::from_text(text).collect()
    }

    #[test]
    fn element_with_text() {
        assert_eq!(
            read_all("<a>text</a>").unwrap(),
            vec![start("a", vec![]), chars("text"), end("a")]
        );
    }

    #[test]
    fn self_closing() {
        assert_eq!(read_all("<a/>").unwrap(), vec![start("a", vec![]), end("a")]);
    }

    #[test]
    fn self_closing_after_attributes_pushes_back_twice() {
        let mut reader = XmlEventReader::from_text("<a x='1' />z");
        assert!(reader.has_next().unwrap());
        // the whole tag including `/>` was consumed
        assert_eq!(reader.source().position(), 11);
        assert_eq!(
            reader.next_event().unwrap(),
            start("a", vec![Attribute::new(QName::local("x"), "1")])
        );
        assert_eq!(reader.next_event().unwrap(), end("a"));
        assert_eq!(reader.next_event().unwrap(), chars("z"));
    }

    #[test]
    fn trailing_whitespace_in_tags() {
        assert_eq!(
            read_all("<a ></a >").unwrap(),
            vec![start("a", vec![]), end("a")]
        );
    }

    #[test]
    fn text_stops_before_tag() {
        let mut reader = XmlEventReader::from_text("ab<c/>");
        assert!(reader.has_next().unwrap());
        assert_eq!(reader.source().position(), 2);
        assert_eq!(reader.next_event().unwrap(), chars("ab"));
    }

    #[test]
    fn probe_is_idempotent() {
        let mut reader = XmlEventReader::from_text("<a>text</a>");
        assert!(reader.has_next().unwrap());
        let position = reader.source().position();
        assert!(reader.has_next().unwrap());
        assert!(reader.has_next().unwrap());
        assert_eq!(reader.source().position(), position);
    }

    #[test]
    fn probe_at_end_is_idempotent() {
        let mut reader = XmlEventReader::from_text("x");
        assert!(reader.has_next().unwrap());
        reader.next_event().unwrap();
        assert!(!reader.has_next().unwrap());
        assert!(!reader.has_next().unwrap());
        assert_eq!(reader.source().position(), 1);
    }

    #[test]
    fn next_event_without_has_next() {
        let mut reader = XmlEventReader::from_text("<a/>");
        assert_eq!(reader.next_event().unwrap(), start("a", vec![]));
        assert_eq!(reader.next_event().unwrap(), end("a"));
        assert!(matches!(reader.next_event(), Err(Error::Usage(_))));
    }

    #[test]
    fn next_event_on_empty_input() {
        let mut reader = XmlEventReader::from_text("");
        assert!(matches!(reader.next_event(), Err(Error::Usage(_))));
    }

    #[test]
    fn next_event_after_false_has_next() {
        let mut reader = XmlEventReader::from_text("");
        assert!(!reader.has_next().unwrap());
        assert!(matches!(reader.next_event(), Err(Error::Usage(_))));
    }

    #[test]
    fn failure_is_final() {
        let mut reader = XmlEventReader::from_text("&foo;<a/>");
        assert_eq!(
            reader.has_next(),
            Err(Error::UnresolvedEntity("foo".to_owned()))
        );
        assert!(matches!(reader.has_next(), Err(Error::Usage(_))));
        assert!(matches!(reader.next_event(), Err(Error::Usage(_))));
    }

    #[test]
    fn iterator_stops_after_error() {
        let mut reader = XmlEventReader::from_text("<a>&foo;</a>");
        assert_eq!(reader.next().unwrap().unwrap(), start("a", vec![]));
        assert_eq!(
            reader.next(),
            Some(Err(Error::UnresolvedEntity("foo".to_owned())))
        );
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn xml_declaration_is_skipped() {
        assert_eq!(
            read_all("<?xml version=\"1.0\"?>text").unwrap(),
            vec![chars("text")]
        );
        assert_eq!(
            read_all("<?XmL version='1.0' ?><r/>").unwrap(),
            vec![start("r", vec![]), end("r")]
        );
    }

    #[test]
    fn xml_declaration_only() {
        let mut reader = XmlEventReader::from_text("<?xml version=\"1.0\"?>");
        assert!(!reader.has_next().unwrap());
    }

    #[test]
    fn xml_prefixed_target_is_a_processing_instruction() {
        assert_eq!(
            read_all("<?xml-stylesheet href='a.xsl'?>").unwrap(),
            vec![Event::ProcessingInstruction(ProcessingInstruction::new(
                "xml-stylesheet",
                "href='a.xsl'"
            ))]
        );
    }

    #[test]
    fn empty_entity_replacement_in_text() {
        let mut reader = XmlEventReader::from_text("&nothing;");
        reader.add_entity("nothing", "").unwrap();
        assert_eq!(reader.has_next(), Err(Error::EmptyCharacters));
    }

    #[test]
    fn custom_entities_table() {
        let mut entities = EntityTable::new();
        entities.insert("copy", "\u{A9}").unwrap();
        let reader = XmlEventReader::with_entities(CharacterStream::new("&copy; 2018"), entities);
        let events: Vec<Event> = reader.collect::<SaxResult<_>>().unwrap();
        assert_eq!(events, vec![chars("\u{A9} 2018")]);
    }

    #[test]
    fn name_with_empty_local_part() {
        assert!(matches!(read_all("<a:>"), Err(Error::Malformed(_))));
    }
}
