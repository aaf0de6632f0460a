pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "http://localhost:1234";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_TEMPERATURE: f64 = 1.0;
pub const DEFAULT_TOP_P: f64 = 0.95;
pub const DEFAULT_TOP_K: u32 = 64;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a website builder you return html,css,js code for a website prompt. Don't give any explanation of the code. Return code as the response.";

pub const DEFAULT_COLLECTION: &str = "embeds";
pub const DEFAULT_EXAMPLES_PATH: &str = "data.csv";
pub const DEFAULT_INGEST_BATCH_SIZE: usize = 32;

pub const DEFAULT_ARTIFACT_FILE: &str = "output.html";

pub const DEFAULT_DATASET_URL: &str =
    "https://datasets-server.huggingface.co/rows?dataset=HuggingFaceM4%2FWebSight&config=v0.2&split=train";
pub const DEFAULT_DATASET_LENGTH: u32 = 100;

pub fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}
