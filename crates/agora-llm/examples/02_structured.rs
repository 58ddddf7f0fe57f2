use anyhow::Result;
use agora_llm::{OpenAIClient, StructuredClient, StructuredRequest};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<()> {
    let api_key = std::env::var("OPENAI_API_KEY")?;
    let client = OpenAIClient::new(api_key)?;

    let schema = json!({
        "type": "object",
        "properties": {
            "stance": { "type": "string" },
            "confidence": { "type": "number" }
        },
        "required": ["stance", "confidence"],
        "additionalProperties": false
    });

    let request = StructuredRequest::new(
        "gpt-4o",
        "stance",
        schema,
        "NUTZER: Ich finde Tempo 30 in Wohngebieten richtig, aber nicht auf Hauptstraßen.",
    )
    .with_system("Summarize the participant's stance.");

    let response = client.generate_object(request).await?;
    println!("{}", serde_json::to_string_pretty(&response.value)?);

    Ok(())
}
