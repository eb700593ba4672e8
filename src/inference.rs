use crate::config;
use crate::error::{Error, Result};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, BufReader};

pub const TRANSPORT_FALLBACK: &str = "Sorry, there was an issue generating a response.";
pub const STATUS_FALLBACK: &str = "Error: Unexpected server response.";
pub const TIMEOUT_FALLBACK: &str = "Sorry, the model took too long to respond.";
pub const UNEXPECTED_FALLBACK: &str = "An unexpected error occurred.";

/// Something that turns a prompt into an answer.
pub trait Generate {
    fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize, Debug)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// One line of the streamed generate response.
#[derive(Deserialize, Debug, Default)]
pub struct GenerateFragment {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub done: bool,
}

pub struct InferenceClient {
    http: reqwest::blocking::Client,
    url: String,
    model: String,
    timeout_secs: u64,
}

impl InferenceClient {
    pub fn new(config: &config::Inference) -> Result<InferenceClient> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("couldn't build http client: {}", e)))?;
        Ok(InferenceClient {
            http,
            url: config.generate_url(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::InferenceTimeout(self.timeout_secs)
        } else {
            Error::InferenceTransport(e.to_string())
        }
    }
}

impl Generate for InferenceClient {
    fn generate(&self, prompt: &str) -> Result<String> {
        info!("Querying {} at {}", self.model, self.url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: true,
        };
        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::InferenceStatus(status.as_u16()));
        }

        accumulate(BufReader::new(response)).map_err(|e| stream_error(e, self.timeout_secs))
    }
}

/// Classify a failure while reading the body. The blocking client hands body
/// errors back as `io::Error`s wrapping the `reqwest::Error`.
pub fn stream_error(e: io::Error, timeout_secs: u64) -> Error {
    if is_timeout(&e) {
        Error::InferenceTimeout(timeout_secs)
    } else {
        Error::InferenceTransport(e.to_string())
    }
}

fn is_timeout(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::TimedOut {
        return true;
    }
    let mut source: Option<&(dyn std::error::Error + 'static)> = e
        .get_ref()
        .map(|inner| inner as &(dyn std::error::Error + 'static));
    while let Some(err) = source {
        if let Some(reqwest_err) = err.downcast_ref::<reqwest::Error>() {
            if reqwest_err.is_timeout() {
                return true;
            }
        }
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::TimedOut {
                return true;
            }
        }
        source = err.source();
    }
    false
}

/// Concatenate the `response` text of newline-delimited JSON fragments until
/// one says `done`. Lines that aren't valid fragments are skipped. A read
/// error drops whatever was collected so far.
pub fn accumulate<R: BufRead>(reader: R) -> io::Result<String> {
    let mut answer = String::new();
    for line in reader.split(b'\n') {
        let line = line?;
        if line
            .iter()
            .all(u8::is_ascii_whitespace)
        {
            continue;
        }
        match serde_json::from_slice::<GenerateFragment>(&line) {
            Ok(fragment) => {
                if fragment.done {
                    break;
                }
                if let Some(text) = fragment.response {
                    answer.push_str(&text);
                }
            }
            Err(e) => warn!(
                "Skipping malformed chunk: {} - {}",
                String::from_utf8_lossy(&line).trim_end(),
                e
            ),
        }
    }
    Ok(answer)
}

/// Ask the model and render the reply body. Failures never escape; they turn
/// into a short apology in place of the answer.
pub fn answer(generator: &dyn Generate, prompt: &str) -> String {
    let text = match generator.generate(prompt) {
        Ok(text) => text,
        Err(e) => {
            error!("Error querying the model: {}", e);
            fallback_for(&e).to_string()
        }
    };
    render_html(prompt, &text)
}

fn fallback_for(e: &Error) -> &'static str {
    match e {
        Error::InferenceTransport(_) => TRANSPORT_FALLBACK,
        Error::InferenceStatus(_) => STATUS_FALLBACK,
        Error::InferenceTimeout(_) => TIMEOUT_FALLBACK,
        _ => UNEXPECTED_FALLBACK,
    }
}

/// The question is echoed exactly as received.
pub fn render_html(prompt: &str, answer: &str) -> String {
    format!(
        "<html>\n    <body>\n        <p><strong>Original Question:</strong><br>{}</p>\n        <p><strong>Response:</strong><br>{}</p>\n    </body>\n</html>",
        prompt, answer
    )
}
