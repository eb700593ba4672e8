use crate::config;
use clap::Parser;

/// Answers unread mail with a locally hosted language model.
///
/// Settings come from the config file; any flag given here takes precedence.
#[derive(Parser, Debug, Default)]
#[clap(author, version)]
pub struct Args {
    /// Specify location of config file.
    #[clap(long)]
    pub config: Option<String>,

    /// Account used for both IMAP and SMTP authentication.
    #[clap(long)]
    pub username: Option<String>,

    /// Password for the account.
    #[clap(long)]
    pub password: Option<String>,

    /// hostname of IMAP server.
    #[clap(long)]
    pub imap_host: Option<String>,

    /// hostname of SMTP server.
    #[clap(long)]
    pub smtp_host: Option<String>,

    /// Folder to watch for unread mail.
    #[clap(long)]
    pub mailbox: Option<String>,

    /// Check the mailbox once and exit instead of polling.
    #[clap(long)]
    pub once: bool,
}

impl Args {
    #[rustfmt::skip]
    pub fn overwrite_config(&self, config: config::Config) -> config::Config {
        config::Config {
            account: config::Account {
                address : self.username.clone().unwrap_or(config.account.address),
                password : self.password.clone().unwrap_or(config.account.password),
            },
            imap: config::Imap {
                host : self.imap_host.clone().unwrap_or(config.imap.host),
                mailbox : self.mailbox.clone().unwrap_or(config.imap.mailbox),
                ..config.imap
            },
            smtp: config::Smtp {
                host : self.smtp_host.clone().unwrap_or(config.smtp.host),
                ..config.smtp
            },
            ..config
        }
    }
}
