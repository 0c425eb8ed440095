//! Line-oriented transcript source for terminal hosts.
//!
//! Each input line is one utterance.  A handful of slash commands control
//! the session, and a leading `~` marks a provisional (interim) result, the
//! way a streaming recogniser would emit one before settling:
//!
//! ```text
//! ~ what's the          → Interim("what's the")
//! what's the weather    → Final("what's the weather")
//! /reset                → Command(Reset)
//! /history              → Command(History)
//! /quit                 → Command(Quit)
//! ```

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use super::TranscriptEvent;

/// Host-level control commands typed at the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Reset,
    History,
    Quit,
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineInput {
    Transcript(TranscriptEvent),
    Command(HostCommand),
}

/// Parse one line.  Blank lines and unknown slash commands yield `None`.
pub fn parse_line(line: &str) -> Option<LineInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(cmd) = line.strip_prefix('/') {
        return match cmd.trim() {
            "reset" => Some(LineInput::Command(HostCommand::Reset)),
            "history" => Some(LineInput::Command(HostCommand::History)),
            "quit" | "exit" => Some(LineInput::Command(HostCommand::Quit)),
            other => {
                log::warn!("transcript: unknown command /{other}");
                None
            }
        };
    }

    if let Some(partial) = line.strip_prefix('~') {
        let partial = partial.trim();
        if partial.is_empty() {
            return None;
        }
        return Some(LineInput::Transcript(TranscriptEvent::Interim(
            partial.to_string(),
        )));
    }

    Some(LineInput::Transcript(TranscriptEvent::Final(line.to_string())))
}

/// Read `reader` to the end, pushing transcript events onto `transcripts`
/// and commands onto `commands`.
///
/// Returns when the input ends, `/quit` is read, or a receiver is gone.
pub async fn read_lines<R>(
    reader: R,
    transcripts: mpsc::Sender<TranscriptEvent>,
    commands: mpsc::Sender<HostCommand>,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let sent = match parse_line(&line) {
            None => continue,
            Some(LineInput::Transcript(event)) => transcripts.send(event).await.is_ok(),
            Some(LineInput::Command(HostCommand::Quit)) => {
                let _ = commands.send(HostCommand::Quit).await;
                break;
            }
            Some(LineInput::Command(cmd)) => commands.send(cmd).await.is_ok(),
        };

        if !sent {
            log::debug!("transcript: receiver closed, stopping line reader");
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_line_is_final() {
        assert_eq!(
            parse_line("  what's the weather  "),
            Some(LineInput::Transcript(TranscriptEvent::Final(
                "what's the weather".into()
            )))
        );
    }

    #[test]
    fn tilde_marks_interim() {
        assert_eq!(
            parse_line("~ what's the"),
            Some(LineInput::Transcript(TranscriptEvent::Interim(
                "what's the".into()
            )))
        );
        assert_eq!(parse_line("~   "), None);
    }

    #[test]
    fn commands_and_blanks() {
        assert_eq!(parse_line("/reset"), Some(LineInput::Command(HostCommand::Reset)));
        assert_eq!(parse_line("/history"), Some(LineInput::Command(HostCommand::History)));
        assert_eq!(parse_line("/exit"), Some(LineInput::Command(HostCommand::Quit)));
        assert_eq!(parse_line("/bogus"), None);
        assert_eq!(parse_line("   "), None);
    }

    #[tokio::test]
    async fn reader_routes_lines_and_stops_at_quit() {
        let input: &[u8] = b"~ hel\nhello\n\n/reset\n/quit\nnever read\n";
        let (t_tx, mut t_rx) = mpsc::channel(8);
        let (c_tx, mut c_rx) = mpsc::channel(8);

        read_lines(input, t_tx, c_tx).await.unwrap();

        assert_eq!(t_rx.recv().await, Some(TranscriptEvent::Interim("hel".into())));
        assert_eq!(t_rx.recv().await, Some(TranscriptEvent::Final("hello".into())));
        assert_eq!(t_rx.recv().await, None);

        assert_eq!(c_rx.recv().await, Some(HostCommand::Reset));
        assert_eq!(c_rx.recv().await, Some(HostCommand::Quit));
        assert_eq!(c_rx.recv().await, None);
    }
}
