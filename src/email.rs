use crate::body;
use crate::error::{Error, Result};
use mailparse::{addrparse, parse_mail, MailAddr, MailHeaderMap};

/// One fetched message, reduced to what a reply needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    /// The `From` header as written by the sender.
    pub sender: String,
    /// Bare address from `From`, if one could be parsed out of it.
    pub reply_address: Option<String>,
    pub message_id: Option<String>,
    pub body: String,
}

impl Email {
    pub fn from_rfc822(raw: &[u8]) -> Result<Email> {
        let mail = parse_mail(raw).map_err(|e| Error::Parse(e.to_string()))?;

        let subject = mail
            .headers
            .get_first_value("Subject")
            .unwrap_or_default();
        let sender = mail
            .headers
            .get_first_value("From")
            .unwrap_or_default();
        let message_id = mail
            .headers
            .get_first_value("Message-ID")
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        Ok(Email {
            reply_address: first_address(&sender),
            subject,
            sender,
            message_id,
            body: body::first_plain_text(&mail),
        })
    }
}

fn first_address(header: &str) -> Option<String> {
    let list = addrparse(header).ok()?;
    list.iter()
        .find_map(|addr| match addr {
            MailAddr::Single(info) => Some(info.addr.clone()),
            MailAddr::Group(group) => group
                .addrs
                .first()
                .map(|info| info.addr.clone()),
        })
}
