#![allow(dead_code)]

use mail_responder::config;
use mail_responder::error::{Error, Result};
use mail_responder::inference::Generate;
use mail_responder::mailbox::{Connect, UnseenStore};
use mail_responder::reply::{Deliver, Reply};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::rc::Rc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A message as it would come off the wire.
pub fn question(from: &str, message_id: &str, body: &str) -> String {
    format!(
        "From: {}\r\nSubject: question\r\nMessage-ID: {}\r\nContent-Type: text/plain\r\n\r\n{}",
        from, message_id, body
    )
}

/// One mailbox session worth of unseen mail. Ids without a message fail to fetch.
#[derive(Default, Clone)]
pub struct Inbox {
    pub unseen: Vec<u32>,
    pub messages: HashMap<u32, String>,
}

impl Inbox {
    pub fn empty() -> Self {
        Inbox::default()
    }

    pub fn with(mut self, id: u32, raw: String) -> Self {
        self.unseen.push(id);
        self.messages.insert(id, raw);
        self
    }

    /// Listed as unseen but the fetch will fail.
    pub fn broken(mut self, id: u32) -> Self {
        self.unseen.push(id);
        self
    }
}

struct FakeSession {
    inbox: Inbox,
    fetched: Rc<RefCell<Vec<u32>>>,
}

impl UnseenStore for FakeSession {
    fn search_unseen(&mut self) -> Result<Vec<u32>> {
        Ok(self.inbox.unseen.clone())
    }

    fn fetch_raw(&mut self, id: u32) -> Result<Vec<u8>> {
        self.fetched
            .borrow_mut()
            .push(id);
        self.inbox
            .messages
            .get(&id)
            .map(|raw| raw.as_bytes().to_vec())
            .ok_or_else(|| Error::Fetch {
                id,
                reason: "NO FETCH failed".to_string(),
            })
    }

    fn logout(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Hands out the scripted inboxes in order, then refuses to connect.
#[derive(Default)]
pub struct FakeConnector {
    inboxes: RefCell<VecDeque<Inbox>>,
    pub connects: Cell<usize>,
    pub fetched: Rc<RefCell<Vec<u32>>>,
}

impl FakeConnector {
    pub fn new(inboxes: Vec<Inbox>) -> Self {
        FakeConnector {
            inboxes: RefCell::new(inboxes.into()),
            ..Default::default()
        }
    }
}

impl Connect for FakeConnector {
    fn connect(&self) -> Result<Box<dyn UnseenStore>> {
        self.connects
            .set(self.connects.get() + 1);
        let inbox = self
            .inboxes
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::Connection("authentication failed".to_string()))?;
        Ok(Box::new(FakeSession {
            inbox,
            fetched: Rc::clone(&self.fetched),
        }))
    }
}

/// Answers every prompt with "answer to <prompt>".
#[derive(Default)]
pub struct EchoModel {
    pub prompts: RefCell<Vec<String>>,
}

impl Generate for EchoModel {
    fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts
            .borrow_mut()
            .push(prompt.to_string());
        Ok(format!("answer to {}", prompt))
    }
}

/// Records every reply; delivery to `fail_for` errors out.
#[derive(Default)]
pub struct Outbox {
    pub attempted: RefCell<Vec<Reply>>,
    pub fail_for: Option<String>,
}

impl Outbox {
    pub fn recipients(&self) -> Vec<String> {
        self.attempted
            .borrow()
            .iter()
            .map(|r| r.to.clone())
            .collect()
    }
}

impl Deliver for Outbox {
    fn deliver(&self, reply: &Reply) -> Result<()> {
        self.attempted
            .borrow_mut()
            .push(reply.clone());
        if self.fail_for.as_deref() == Some(reply.to.as_str()) {
            return Err(Error::Delivery {
                to: reply.to.clone(),
                reason: "535 authentication failed".to_string(),
            });
        }
        Ok(())
    }
}

pub fn inference_config(url: &str, timeout_secs: u64) -> config::Inference {
    config::Inference {
        url: url.to_string(),
        model: "test-model".to_string(),
        api_key: None,
        timeout_secs,
    }
}

/// Serve exactly one HTTP request with `response`, after waiting `delay`.
/// The join handle yields the raw request that was received.
pub fn serve_once(response: String, delay: Duration) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        thread::sleep(delay);
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
        request
    });

    (url, handle)
}

/// Answer one request with a chunked 200 carrying `first_line`, then go
/// quiet for `stall` before hanging up.
pub fn serve_stalled(first_line: &str, stall: Duration) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    let chunk = format!("{}\n", first_line);

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        let head = "HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nTransfer-Encoding: chunked\r\n\r\n";
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(format!("{:x}\r\n{}\r\n", chunk.len(), chunk).as_bytes());
        let _ = stream.flush();
        thread::sleep(stall);
        request
    });

    (url, handle)
}

fn read_request(stream: &mut impl Read) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream
            .read(&mut chunk)
            .unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// A streamed 200 response made of the given body lines.
pub fn ndjson_response(lines: &[&str]) -> String {
    let mut response = String::from(
        "HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nConnection: close\r\n\r\n",
    );
    for line in lines {
        response.push_str(line);
        response.push('\n');
    }
    response
}
