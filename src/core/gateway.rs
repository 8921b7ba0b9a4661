use crate::config::AppConfig;
use crate::core::converter::{DocumentConverter, Extraction};
use crate::core::llm::LlmClient;
use crate::error::ConversionError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Markdown produced for one staged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub markdown: String,
    pub is_image: bool,
}

/// Chooses between plain and captioned extraction and runs the converter.
pub struct ConversionGateway {
    converter: Arc<dyn DocumentConverter>,
    image_extensions: Vec<String>,
    default_api_key: Option<String>,
    model: String,
    llm_base_url: String,
    llm_timeout: Duration,
}

impl std::fmt::Debug for ConversionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionGateway")
            .field("image_extensions", &self.image_extensions)
            .field("has_default_api_key", &self.default_api_key.is_some())
            .field("model", &self.model)
            .finish()
    }
}

impl ConversionGateway {
    pub fn new(config: &AppConfig, converter: Arc<dyn DocumentConverter>) -> Self {
        Self {
            converter,
            image_extensions: config.image_extensions.clone(),
            default_api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            llm_base_url: config.openai_base_url.clone(),
            llm_timeout: config.llm_timeout,
        }
    }

    /// Case-insensitive extension match against the configured image set.
    pub fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .is_some_and(|ext| self.image_extensions.contains(&ext))
    }

    /// Request override first, then the server default. Blank keys count as absent.
    pub fn resolve_api_key(&self, override_key: Option<&str>) -> Option<String> {
        override_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(String::from)
            .or_else(|| self.default_api_key.clone())
    }

    pub fn select(&self, path: &Path, override_key: Option<&str>) -> Extraction {
        if !self.is_image(path) {
            return Extraction::Plain;
        }
        match self.resolve_api_key(override_key) {
            Some(key) => Extraction::Captioned {
                model: self.model.clone(),
                client: LlmClient::new(key, self.llm_base_url.clone(), self.llm_timeout),
            },
            None => Extraction::Plain,
        }
    }

    /// Blocking; callers dispatch it off the request task when configured to.
    pub fn convert(
        &self,
        path: &Path,
        override_key: Option<&str>,
    ) -> Result<Conversion, ConversionError> {
        let extraction = self.select(path, override_key);
        tracing::info!(
            path = %path.display(),
            captioned = extraction.is_captioned(),
            "converting staged file"
        );

        let markdown = self.converter.convert(path, &extraction)?;
        tracing::info!(path = %path.display(), bytes = markdown.len(), "conversion finished");

        Ok(Conversion {
            markdown,
            is_image: self.is_image(path),
        })
    }
}

#[cfg(test)]
mod gateway_tests {
    use super::ConversionGateway;
    use crate::config::{AppConfig, Profile};
    use crate::core::converter::{DocumentConverter, Extraction};
    use crate::error::ConversionError;
    use std::path::Path;
    use std::sync::Arc;

    struct Echo;

    impl DocumentConverter for Echo {
        fn convert(&self, path: &Path, extraction: &Extraction) -> Result<String, ConversionError> {
            if path.ends_with("broken.pdf") {
                return Err(ConversionError::Failed("File conversion failed".to_string()));
            }
            Ok(match extraction {
                Extraction::Plain => "plain".to_string(),
                Extraction::Captioned { model, .. } => format!("captioned by {model}"),
            })
        }
    }

    fn gateway(default_key: Option<&str>) -> ConversionGateway {
        let mut config = AppConfig::for_profile(Profile::Test);
        config.openai_api_key = default_key.map(String::from);
        ConversionGateway::new(&config, Arc::new(Echo))
    }

    #[test]
    fn test_is_image_is_case_insensitive() {
        let gateway = gateway(None);
        assert!(gateway.is_image(Path::new("photo.png")));
        assert!(gateway.is_image(Path::new("PHOTO.JPEG")));
        assert!(gateway.is_image(Path::new("dir/anim.Gif")));
        assert!(!gateway.is_image(Path::new("report.pdf")));
        assert!(!gateway.is_image(Path::new("png")));
        assert!(!gateway.is_image(Path::new("archive.png.zip")));
    }

    #[test]
    fn test_image_with_key_is_captioned() {
        let gateway = gateway(None);
        let extraction = gateway.select(Path::new("photo.png"), Some("sk-request"));
        match extraction {
            Extraction::Captioned { model, .. } => assert_eq!(model, "gpt-4o"),
            Extraction::Plain => panic!("expected captioned extraction"),
        }

        let gateway = self::gateway(Some("sk-default"));
        assert!(gateway.select(Path::new("photo.webp"), None).is_captioned());
    }

    #[test]
    fn test_image_without_key_is_plain() {
        let gateway = gateway(None);
        assert!(!gateway.select(Path::new("photo.png"), None).is_captioned());
        assert!(!gateway.select(Path::new("photo.png"), Some("   ")).is_captioned());
    }

    #[test]
    fn test_non_image_is_always_plain() {
        let gateway = gateway(Some("sk-default"));
        assert!(!gateway.select(Path::new("report.pdf"), None).is_captioned());
        assert!(!gateway.select(Path::new("report.pdf"), Some("sk-request")).is_captioned());
    }

    #[test]
    fn test_override_key_wins() {
        let gateway = gateway(Some("sk-default"));
        assert_eq!(gateway.resolve_api_key(Some("sk-request")).as_deref(), Some("sk-request"));
        assert_eq!(gateway.resolve_api_key(Some("")).as_deref(), Some("sk-default"));
        assert_eq!(gateway.resolve_api_key(None).as_deref(), Some("sk-default"));
    }

    #[test]
    fn test_convert_reports_metadata_and_errors() {
        let gateway = gateway(Some("sk-default"));

        let done = gateway.convert(Path::new("photo.jpg"), None).unwrap();
        assert_eq!(done.markdown, "captioned by gpt-4o");
        assert!(done.is_image);

        let done = gateway.convert(Path::new("report.pdf"), None).unwrap();
        assert_eq!(done.markdown, "plain");
        assert!(!done.is_image);

        let err = gateway.convert(Path::new("broken.pdf"), None).unwrap_err();
        assert_eq!(err.to_string(), "File conversion failed");
    }
}
