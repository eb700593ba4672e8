use log::warn;
use mailparse::ParsedMail;

/// Decoded text of the first `text/plain` part, searching the part tree
/// depth-first with the parent before its children. Messages without one
/// (or whose plain part won't decode) give an empty string.
pub fn first_plain_text(mail: &ParsedMail) -> String {
    match find_plain(mail) {
        Some(part) => match part.get_body() {
            Ok(text) => text,
            Err(e) => {
                warn!("Couldn't decode text/plain part: {}", e);
                String::new()
            }
        },
        None => String::new(),
    }
}

fn find_plain<'a, 'b>(part: &'b ParsedMail<'a>) -> Option<&'b ParsedMail<'a>> {
    if part
        .ctype
        .mimetype
        .eq_ignore_ascii_case("text/plain")
    {
        return Some(part);
    }
    part.subparts
        .iter()
        .find_map(|sub| find_plain(sub))
}
