
pub const MB: usize = 1024 * 1024;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_UPLOAD_FOLDER: &str = "uploads";
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 16 * MB;
pub const DEFAULT_IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".webp"];
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONVERTER_WORKERS: usize = 4;
pub const DEFAULT_MARKITDOWN_BIN: &str = "markitdown";

pub const OPENAI_MODEL: &str = "gpt-4o";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const CAPTION_PROMPT: &str = "Write a detailed caption for this image.";

pub const BATCH_SEPARATOR_WIDTH: usize = 50;
pub const FALLBACK_UPLOAD_NAME: &str = "upload";
pub const FALLBACK_DOWNLOAD_NAME: &str = "download";
