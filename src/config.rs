use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub chat_max_steps: u32,
    pub scan_max_steps: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub food_api_base_url: String,
    pub llm: LlmConfig,
    pub speech: SpeechConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let llm = LlmConfig {
            api_key: std::env::var("OPENAI_API_KEY")?,
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".into()),
            chat_max_steps: std::env::var("CHAT_MAX_STEPS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            scan_max_steps: std::env::var("SCAN_MAX_STEPS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(5),
            timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60),
        };
        let speech = SpeechConfig {
            api_key: std::env::var("DEEPGRAM_API_KEY")?,
            base_url: std::env::var("DEEPGRAM_BASE_URL")
                .unwrap_or_else(|_| "https://api.deepgram.com".into()),
            model: std::env::var("DEEPGRAM_MODEL").unwrap_or_else(|_| "nova-3".into()),
        };
        let food_api_base_url = std::env::var("FOOD_API_BASE_URL")
            .unwrap_or_else(|_| "https://world.openfoodfacts.org".into());
        Ok(Self {
            database_url,
            food_api_base_url,
            llm,
            speech,
        })
    }
}
