//! Line-oriented chat loop

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::display::{assistant_line, user_prompt};
use crate::chain::Responder;

/// Typed alone on a line, ends the chat
pub const EXIT_WORD: &str = "bye";

pub fn is_exit(line: &str) -> bool {
  line.trim().eq_ignore_ascii_case(EXIT_WORD)
}

/// Read messages from `input` until `bye` or end of input, answering each one.
/// Returns how many messages were answered.
pub async fn run<R, W>(
  responder: &dyn Responder,
  session_id: &str,
  input: R,
  output: &mut W,
) -> std::io::Result<usize>
where
  R: AsyncBufRead + Unpin,
  W: AsyncWrite + Unpin,
{
  let mut lines = input.lines();
  let mut answered = 0;

  loop {
    output.write_all(user_prompt().as_bytes()).await?;
    output.flush().await?;

    let Some(line) = lines.next_line().await? else {
      output.write_all(b"\n").await?;
      break;
    };
    if is_exit(&line) {
      break;
    }
    let message = line.trim();
    if message.is_empty() {
      continue;
    }

    match responder.respond(session_id, message).await {
      Ok(reply) => {
        output.write_all(assistant_line(&reply).as_bytes()).await?;
        answered += 1;
      }
      Err(e) => bentley::error!("Could not complete the turn: {e}"),
    }
  }

  output.flush().await?;
  Ok(answered)
}
