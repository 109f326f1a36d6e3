use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SharedStringsError {
    #[error("xml parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed sharedStrings.xml: {0}")]
    Malformed(&'static str),
}

/// Parse `sharedStrings.xml` into the flat string table worksheets index into.
///
/// Rich-text runs are concatenated into their plain display string; phonetic
/// guide runs (`<rPh>`) are not part of the displayed value and are skipped.
pub(crate) fn parse_shared_strings_xml(xml: &[u8]) -> Result<Vec<String>, SharedStringsError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut items = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"si" => {
                items.push(parse_si(&mut reader)?);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(items)
}

fn parse_si(reader: &mut Reader<&[u8]>) -> Result<String, SharedStringsError> {
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_t = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_t = true,
            Event::End(e) if e.local_name().as_ref() == b"t" => in_t = false,
            Event::Start(e) if e.local_name().as_ref() == b"rPh" => {
                // Phonetic ("ruby") text is not part of the displayed string.
                reader.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Event::Text(t) if in_t => out.push_str(&t.unescape()?),
            Event::End(e) if e.local_name().as_ref() == b"si" => break,
            Event::Eof => return Err(SharedStringsError::Malformed("unexpected eof in <si>")),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}
