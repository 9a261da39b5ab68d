//! Console command parser.
//!
//! Translates one line of user input into a [`Command`] for the main loop
//! to dispatch against the node. A line starting with `/` is a command;
//! anything else is broadcast as a message body.

/// Parsed console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/listen <port>` — start accepting inbound peers.
    Listen(u16),
    /// `/connect <host> <port>` — dial a remote node.
    Connect {
        /// Remote hostname or IP.
        host: String,
        /// Remote port.
        port: u16,
    },
    /// `/send <peer-id> <text>` — message one peer.
    Send {
        /// Target peer id (`ip:port`).
        peer_id: String,
        /// Message body.
        content: String,
    },
    /// Bare text — message every connected peer.
    Broadcast(String),
    /// `/peers` — list connected peers.
    Peers,
    /// `/disconnect <peer-id>` — drop one peer.
    Disconnect(String),
    /// `/quit` — stop everything and exit.
    Quit,
    /// `/help` — show usage.
    Help,
}

/// Parse one console line.
///
/// # Errors
///
/// Returns a user-facing message for unknown commands or bad arguments.
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Err("empty input".into());
    }
    if !line.starts_with('/') {
        return Ok(Command::Broadcast(line.to_string()));
    }

    let mut parts = line.splitn(3, ' ');
    let head = parts.next().unwrap_or_default();
    match head {
        "/listen" => {
            let port = parse_port(parts.next())?;
            Ok(Command::Listen(port))
        }
        "/connect" => {
            let host = parts
                .next()
                .ok_or("usage: /connect <host> <port>")?
                .to_string();
            let port = parse_port(parts.next())?;
            Ok(Command::Connect { host, port })
        }
        "/send" => {
            let peer_id = parts.next().ok_or("usage: /send <peer-id> <text>")?.to_string();
            let content = parts
                .next()
                .ok_or("usage: /send <peer-id> <text>")?
                .to_string();
            Ok(Command::Send { peer_id, content })
        }
        "/peers" => Ok(Command::Peers),
        "/disconnect" => {
            let peer_id = parts
                .next()
                .ok_or("usage: /disconnect <peer-id>")?
                .to_string();
            Ok(Command::Disconnect(peer_id))
        }
        "/quit" | "/exit" => Ok(Command::Quit),
        "/help" => Ok(Command::Help),
        other => Err(format!("unknown command: {other} (try /help)")),
    }
}

fn parse_port(arg: Option<&str>) -> Result<u16, String> {
    let arg = arg.ok_or("missing port argument")?;
    arg.parse::<u16>()
        .map_err(|_| format!("invalid port: {arg}"))
}

/// Usage text for `/help`.
pub const HELP_TEXT: &str = "\
Commands:
  /listen <port>            start accepting inbound peers
  /connect <host> <port>    dial a remote node
  /send <peer-id> <text>    message one peer
  /peers                    list connected peers
  /disconnect <peer-id>     drop one peer
  /quit                     stop everything and exit
  <text>                    broadcast to all connected peers";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_text_is_broadcast() {
        assert_eq!(
            parse("hello everyone").unwrap(),
            Command::Broadcast("hello everyone".into())
        );
    }

    #[test]
    fn test_listen() {
        assert_eq!(parse("/listen 7100").unwrap(), Command::Listen(7100));
        assert!(parse("/listen").is_err());
        assert!(parse("/listen notaport").is_err());
    }

    #[test]
    fn test_connect() {
        assert_eq!(
            parse("/connect 10.0.0.5 7100").unwrap(),
            Command::Connect {
                host: "10.0.0.5".into(),
                port: 7100
            }
        );
        assert!(parse("/connect 10.0.0.5").is_err());
        assert!(parse("/connect 10.0.0.5 99999").is_err());
    }

    #[test]
    fn test_send_keeps_spaces_in_content() {
        assert_eq!(
            parse("/send 10.0.0.5:7100 hi there friend").unwrap(),
            Command::Send {
                peer_id: "10.0.0.5:7100".into(),
                content: "hi there friend".into()
            }
        );
        assert!(parse("/send 10.0.0.5:7100").is_err());
    }

    #[test]
    fn test_misc_commands() {
        assert_eq!(parse("/peers").unwrap(), Command::Peers);
        assert_eq!(
            parse("/disconnect 10.0.0.5:7100").unwrap(),
            Command::Disconnect("10.0.0.5:7100".into())
        );
        assert_eq!(parse("/quit").unwrap(), Command::Quit);
        assert_eq!(parse("/exit").unwrap(), Command::Quit);
        assert_eq!(parse("/help").unwrap(), Command::Help);
    }

    #[test]
    fn test_unknown_and_empty_rejected() {
        assert!(parse("/frobnicate").is_err());
        assert!(parse("   ").is_err());
    }
}
