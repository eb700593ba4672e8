use crate::email::Email;
use crate::error::Result;
use crate::inference::{self, Generate};
use crate::mailbox::{self, Connect};
use crate::reply::{Deliver, Reply};
use crate::seen::SeenMessages;
use log::{error, info, warn};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// The poll loop: connect, fetch what's unseen, answer each message, sleep.
pub struct Responder<'a> {
    connector: &'a dyn Connect,
    generator: &'a dyn Generate,
    mailer: &'a dyn Deliver,
    poll_interval: Duration,
    seen: SeenMessages,
}

impl<'a> Responder<'a> {
    pub fn new(
        connector: &'a dyn Connect,
        generator: &'a dyn Generate,
        mailer: &'a dyn Deliver,
        poll_interval: Duration,
        dedup_capacity: usize,
    ) -> Self {
        Responder {
            connector,
            generator,
            mailer,
            poll_interval,
            seen: SeenMessages::new(dedup_capacity),
        }
    }

    /// Poll until the mailbox can't be reached (the error is returned) or a
    /// shutdown message arrives on `shutdown` while sleeping.
    pub fn run(&mut self, shutdown: &Receiver<()>) -> Result<()> {
        loop {
            match self.poll_once() {
                Ok(0) => info!(
                    "No new emails. Sleeping for {} seconds...",
                    self.poll_interval.as_secs()
                ),
                Ok(n) => info!(
                    "Processed {} email(s). Sleeping for {} seconds before checking again...",
                    n,
                    self.poll_interval.as_secs()
                ),
                Err(e) => {
                    error!("Could not connect to email server, exiting: {}", e);
                    return Err(e);
                }
            }

            match shutdown.recv_timeout(self.poll_interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    info!("Shutting down.");
                    return Ok(());
                }
            }
        }
    }

    /// One pass over the mailbox. Returns how many messages were fetched.
    /// Only a failure to open the session is an error.
    pub fn poll_once(&mut self) -> Result<usize> {
        let mut store = self.connector.connect()?;
        let emails = mailbox::fetch_unread(store.as_mut());
        if let Err(e) = store.logout() {
            warn!("Logout failed: {}", e);
        }

        for email in &emails {
            self.process(email);
        }
        Ok(emails.len())
    }

    fn process(&mut self, email: &Email) {
        info!(
            "New email received! Subject: {:?} From: {:?}",
            email.subject, email.sender
        );

        if let Some(id) = &email.message_id {
            if self.seen.contains(id) {
                info!("Already answered {}, skipping.", id);
                return;
            }
        }

        let reply = match Reply::to_message(email, String::new()) {
            Some(reply) => Reply {
                html: inference::answer(self.generator, &email.body),
                ..reply
            },
            None => {
                warn!("No address to reply to in {:?}, skipping.", email.sender);
                return;
            }
        };

        if let Err(e) = self.mailer.deliver(&reply) {
            error!("{}", e);
        }

        if let Some(id) = &email.message_id {
            self.seen.insert(id);
        }
    }
}
