use crate::config::Config;
use crate::email::Email;
use crate::error::{Error, Result};
use lettre::smtp::authentication::Credentials;
use lettre::{ClientSecurity, ClientTlsParameters, SmtpClient, Transport};
use lettre_email::EmailBuilder;
use log::info;

/// An answer on its way back to whoever asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub subject: String,
    pub html: String,
    pub to: String,
    /// Message-ID of the question, copied into the threading headers.
    pub in_reply_to: Option<String>,
}

impl Reply {
    /// `None` when the question carries no address we could answer.
    pub fn to_message(email: &Email, html: String) -> Option<Reply> {
        Some(Reply {
            subject: reply_subject(&email.subject),
            html,
            to: email.reply_address.clone()?,
            in_reply_to: email.message_id.clone(),
        })
    }

    pub fn build(&self, from: &str) -> Result<lettre_email::Email> {
        let mut builder = EmailBuilder::new()
            .from(from)
            .to(self.to.as_str())
            .subject(self.subject.as_str())
            .html(self.html.as_str());

        if let Some(id) = &self.in_reply_to {
            builder = builder
                .header(("In-Reply-To", id.as_str()))
                .header(("References", id.as_str()));
        }

        builder
            .build()
            .map_err(|e| Error::Delivery {
                to: self.to.clone(),
                reason: e.to_string(),
            })
    }
}

fn reply_subject(subject: &str) -> String {
    let trimmed = subject.trim_start();
    if trimmed
        .get(..3)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("re:"))
    {
        subject.to_string()
    } else {
        format!("Re: {}", subject)
    }
}

/// Sends one reply.
pub trait Deliver {
    fn deliver(&self, reply: &Reply) -> Result<()>;
}

/// Opens an implicit-TLS SMTP session for every reply and closes it afterwards.
pub struct SmtpMailer {
    from: String,
    password: String,
    host: String,
    port: u16,
}

impl SmtpMailer {
    pub fn new(config: &Config) -> SmtpMailer {
        SmtpMailer {
            from: config.account.address.clone(),
            password: config.account.password.clone(),
            host: config.smtp.host.clone(),
            port: config.smtp.port,
        }
    }

    fn transport(&self) -> std::result::Result<lettre::SmtpTransport, String> {
        let connector = native_tls::TlsConnector::new().map_err(|e| e.to_string())?;
        let creds = Credentials::new(self.from.clone(), self.password.clone());
        let client = SmtpClient::new(
            (self.host.as_str(), self.port),
            ClientSecurity::Wrapper(ClientTlsParameters::new(self.host.clone(), connector)),
        )
        .map_err(|e| e.to_string())?;

        Ok(client
            .credentials(creds)
            .transport())
    }
}

impl Deliver for SmtpMailer {
    fn deliver(&self, reply: &Reply) -> Result<()> {
        info!("Sending reply to {}...", reply.to);
        let delivery_error = |reason: String| Error::Delivery {
            to: reply.to.clone(),
            reason,
        };

        let email = reply.build(&self.from)?;
        let mut transport = self
            .transport()
            .map_err(delivery_error)?;
        let sent = transport.send(email.into());
        transport.close();
        sent.map_err(|e| delivery_error(e.to_string()))?;

        info!("Reply sent to {}.", reply.to);
        Ok(())
    }
}
