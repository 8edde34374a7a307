//! Interactive chat loop
//!
//! Greets the user, answers one query per line and says goodbye when the user
//! does (or input ends). Every message shown is translated to the assistant's
//! target language.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::Result;
use crate::assistant::WeatherAssistant;
use crate::models::RequestOrigin;

pub const GREETING: &str = "Hello! I am your weather assistant. \nAsk me queries related to weather. \nTo end this chat, say 'goodbye'.";
pub const PROMPT: &str = "Ask your query here";
pub const FAREWELL: &str = "Goodbye! Have a nice day!";

/// Run the chat loop over the given input and output streams
pub async fn run<R, W>(
    assistant: &WeatherAssistant,
    origin: &RequestOrigin,
    input: R,
    mut output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let greeting = localized(assistant, GREETING).await;
    let prompt = localized(assistant, PROMPT).await;
    output.write_all(format!("\n{greeting}\n").as_bytes()).await?;

    let mut lines = input.lines();
    loop {
        output.write_all(format!("{prompt}: ").as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = match reply_to(assistant, &line, origin).await {
            Ok(Some(reply)) => reply,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to answer query: {}", e);
                localized(assistant, &e.user_message()).await
            }
        };
        output.write_all(format!("{reply}\n").as_bytes()).await?;
    }

    let farewell = localized(assistant, FAREWELL).await;
    output.write_all(format!("\n{farewell}\n").as_bytes()).await?;
    output.flush().await?;
    info!("Chat session ended");
    Ok(())
}

/// Reply to one line; `None` when the user said goodbye
async fn reply_to(
    assistant: &WeatherAssistant,
    line: &str,
    origin: &RequestOrigin,
) -> Result<Option<String>> {
    let english = assistant.to_english(line).await?;
    if WeatherAssistant::is_farewell(&english) {
        return Ok(None);
    }
    let answer = assistant.answer_english(&english, origin).await?;
    assistant.localize(&answer).await.map(Some)
}

/// Translate a fixed message, falling back to English on failure
async fn localized(assistant: &WeatherAssistant, english: &str) -> String {
    match assistant.localize(english).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Could not translate chat message, using English: {}", e);
            english.to_string()
        }
    }
}
