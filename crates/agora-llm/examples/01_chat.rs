use anyhow::Result;
use agora_llm::{ChatClient, ChatRequest, Message, OpenAIClient, StreamEvent};
use futures::StreamExt;

#[tokio::main]
async fn main() -> Result<()> {
    let api_key = std::env::var("OPENAI_API_KEY")?;
    let client = OpenAIClient::new(api_key)?;

    let request = ChatRequest::new(
        "gpt-4o-mini",
        vec![
            Message::system("Du moderierst eine ruhige Diskussion. Antworte auf Deutsch."),
            Message::human("Sollte die Innenstadt autofrei werden?"),
        ],
    );

    let mut stream = client.chat_stream(request).await?;
    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::Message { content } => print!("{}", content),
            StreamEvent::Done { .. } => break,
        }
    }
    println!();

    Ok(())
}
