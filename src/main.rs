use anyhow::Result;
use clap::Parser;
use log::info;
use mail_responder::args::Args;
use mail_responder::config;
use mail_responder::inference::InferenceClient;
use mail_responder::mailbox::ImapConnector;
use mail_responder::reply::SmtpMailer;
use mail_responder::responder::Responder;
use std::sync::mpsc;

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args = Args::parse();
    let config = config::get_config(&args.config)?;
    let config = args.overwrite_config(config);

    let connector = ImapConnector::new(&config);
    let generator = InferenceClient::new(&config.inference)?;
    let mailer = SmtpMailer::new(&config);
    let mut responder = Responder::new(
        &connector,
        &generator,
        &mailer,
        config.poll_interval(),
        config.dedup_capacity,
    );

    if args.once {
        responder.poll_once()?;
        return Ok(());
    }

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        info!("Got SIGINT, finishing up before exiting...");
        let _ = tx.send(());
    })?;

    responder.run(&rx)?;
    Ok(())
}
