//! Masks personal data in formatted log lines before they reach any output.

use std::io;
use std::net::Ipv4Addr;

use regex::{Captures, Regex};
use tracing_subscriber::fmt::MakeWriter;

use crate::error::Result;

const IPV4_PATTERN: &str = r"\b[0-9]{1,3}(?:[.-][0-9]{1,3}){3}\b";
const EMAIL_PATTERN: &str = r"(?i)[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?";
const TOKEN_PATTERN: &str = r"(?i)X-Plex-Token(?:=|%3D)([a-z0-9]+)";

/// Addresses routable on the internet. Private, loopback, link-local, shared
/// (100.64/10), multicast and documentation ranges stay readable.
pub fn is_public_ipv4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    let shared = a == 100 && (64..128).contains(&b);
    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_multicast()
        || ip.is_documentation()
        || shared)
}

fn mask_ip(candidate: &str) -> String {
    let separator = if candidate.contains('-') { '-' } else { '.' };
    let Ok(ip) = candidate.replace('-', ".").parse::<Ipv4Addr>() else {
        return candidate.to_string();
    };
    if !is_public_ipv4(ip) {
        return candidate.to_string();
    }
    ["***"; 4].join(&separator.to_string())
}

#[derive(Clone, Debug)]
pub struct Redactor {
    ipv4: Regex,
    email: Regex,
    token: Regex,
}

impl Redactor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            ipv4: Regex::new(IPV4_PATTERN)?,
            email: Regex::new(EMAIL_PATTERN)?,
            token: Regex::new(TOKEN_PATTERN)?,
        })
    }

    pub fn redact(&self, line: &str) -> String {
        let line = self
            .ipv4
            .replace_all(line, |caps: &Captures| mask_ip(&caps[0]))
            .into_owned();
        let line = self
            .email
            .replace_all(&line, "****************@********")
            .into_owned();
        self.token
            .replace_all(&line, |caps: &Captures| {
                caps[0].replace(&caps[1], &"*".repeat(16))
            })
            .into_owned()
    }
}

/// Wraps a [`MakeWriter`] so every line it receives is redacted first.
pub struct RedactingMakeWriter<M> {
    inner: M,
    redactor: Option<Redactor>,
}

impl<M> RedactingMakeWriter<M> {
    /// With `redactor == None` lines pass through untouched.
    pub fn new(inner: M, redactor: Option<Redactor>) -> Self {
        Self { inner, redactor }
    }
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for RedactingMakeWriter<M> {
    type Writer = RedactingWriter<'a, M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer(),
            redactor: self.redactor.as_ref(),
        }
    }
}

pub struct RedactingWriter<'a, W> {
    inner: W,
    redactor: Option<&'a Redactor>,
}

impl<W: io::Write> io::Write for RedactingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Some(redactor) = self.redactor else {
            return self.inner.write(buf);
        };
        let line = String::from_utf8_lossy(buf);
        self.inner.write_all(redactor.redact(&line).as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn redactor() -> Redactor {
        Redactor::new().unwrap()
    }

    #[test]
    fn public_ipv4_is_masked() {
        assert_eq!(
            redactor().redact("Testing 172.1.7.5"),
            "Testing ***.***.***.***"
        );
        assert_eq!(
            redactor().redact("peer 8-8-8-8 connected"),
            "peer ***-***-***-*** connected"
        );
    }

    #[test]
    fn private_and_invalid_addresses_are_kept() {
        let line = "bound 192.168.1.20, 127.0.0.1, 10.0.0.7, 100.64.3.1 and 999.1.1.1";
        assert_eq!(redactor().redact(line), line);
    }

    #[test]
    fn emails_are_masked() {
        assert_eq!(
            redactor().redact("sent to Jane.Doe@example.com today"),
            "sent to ****************@******** today"
        );
    }

    #[test]
    fn tokens_are_masked() {
        assert_eq!(
            redactor().redact("GET /library?X-Plex-Token=abc123XYZ"),
            "GET /library?X-Plex-Token=****************"
        );
        assert_eq!(
            redactor().redact("x-plex-token%3Dabc123"),
            "x-plex-token%3D****************"
        );
    }

    #[test]
    fn shared_range_is_not_public() {
        assert!(!is_public_ipv4(Ipv4Addr::new(100, 100, 0, 1)));
        assert!(is_public_ipv4(Ipv4Addr::new(100, 128, 0, 1)));
        assert!(is_public_ipv4(Ipv4Addr::new(1, 1, 1, 1)));
    }

    #[test]
    fn writer_redacts_before_forwarding() {
        let redactor = redactor();
        let mut out = Vec::new();
        {
            let mut writer = RedactingWriter {
                inner: &mut out,
                redactor: Some(&redactor),
            };
            writer.write_all(b"client 8.8.4.4 joined\n").unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "client ***.***.***.*** joined\n");
    }

    #[test]
    fn writer_without_redactor_passes_through() {
        let mut out = Vec::new();
        {
            let mut writer = RedactingWriter {
                inner: &mut out,
                redactor: None,
            };
            writer.write_all(b"client 8.8.4.4 joined\n").unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "client 8.8.4.4 joined\n");
    }
}
