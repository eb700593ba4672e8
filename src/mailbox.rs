use crate::config::Config;
use crate::email::Email;
use crate::error::{Error, Result};
use log::{error, info};
use std::io::{Read, Write};

/// The handful of IMAP operations the responder needs from a selected folder.
pub trait UnseenStore {
    /// Sequence numbers of every message without the `\Seen` flag.
    fn search_unseen(&mut self) -> Result<Vec<u32>>;

    /// The full RFC 822 source of one message.
    fn fetch_raw(&mut self, id: u32) -> Result<Vec<u8>>;

    fn logout(&mut self) -> Result<()>;
}

/// Opens a fresh, selected mailbox session.
pub trait Connect {
    fn connect(&self) -> Result<Box<dyn UnseenStore>>;
}

pub struct ImapConnector<'a> {
    config: &'a Config,
}

impl<'a> ImapConnector<'a> {
    pub fn new(config: &'a Config) -> Self {
        ImapConnector { config }
    }
}

impl Connect for ImapConnector<'_> {
    fn connect(&self) -> Result<Box<dyn UnseenStore>> {
        Ok(Box::new(login(self.config)?))
    }
}

/// Log in over TLS and select the configured folder.
pub fn login(config: &Config) -> Result<imap::Session<impl Read + Write>> {
    info!(
        "Connecting to {}:{} as {}",
        config.imap.host, config.imap.port, config.account.address
    );
    let client = imap::ClientBuilder::new(&config.imap.host, config.imap.port)
        .connect()
        .map_err(|e| Error::Connection(format!("{}: {}", config.imap.host, e)))?;

    let mut session = client
        .login(&config.account.address, &config.account.password)
        .map_err(|(e, _client)| Error::Connection(format!("login failed: {}", e)))?;

    session
        .select(&config.imap.mailbox)
        .map_err(|e| {
            Error::Connection(format!("couldn't select {}: {}", config.imap.mailbox, e))
        })?;

    info!("Connected, {} selected", config.imap.mailbox);
    Ok(session)
}

impl<T: Read + Write> UnseenStore for imap::Session<T> {
    fn search_unseen(&mut self) -> Result<Vec<u32>> {
        let found = self
            .search("UNSEEN")
            .map_err(|e| Error::Search(e.to_string()))?;
        let mut ids: Vec<u32> = found.into_iter().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn fetch_raw(&mut self, id: u32) -> Result<Vec<u8>> {
        let fetches = self
            .fetch(id.to_string(), "RFC822")
            .map_err(|e| Error::Fetch {
                id,
                reason: e.to_string(),
            })?;
        fetches
            .iter()
            .find_map(|fetch| fetch.body())
            .map(|body| body.to_vec())
            .ok_or_else(|| Error::Fetch {
                id,
                reason: "response carried no message body".to_string(),
            })
    }

    fn logout(&mut self) -> Result<()> {
        imap::Session::logout(self).map_err(|e| Error::Connection(e.to_string()))
    }
}

/// Fetch and parse every unseen message. A failed search gives an empty batch
/// and a message that can't be fetched or parsed is left out; both are logged.
pub fn fetch_unread(store: &mut dyn UnseenStore) -> Vec<Email> {
    info!("Searching for unread emails...");
    let ids = match store.search_unseen() {
        Ok(ids) => ids,
        Err(e) => {
            error!("{}", e);
            return Vec::new();
        }
    };

    if ids.is_empty() {
        info!("No new emails to process.");
        return Vec::new();
    }

    let mut emails = Vec::with_capacity(ids.len());
    for id in ids {
        let parsed = store
            .fetch_raw(id)
            .and_then(|raw| {
                Email::from_rfc822(&raw).map_err(|e| Error::Fetch {
                    id,
                    reason: e.to_string(),
                })
            });
        match parsed {
            Ok(email) => emails.push(email),
            Err(e) => error!("{}", e),
        }
    }
    emails
}
