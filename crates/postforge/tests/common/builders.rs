//! Builders for site configurations used across integration tests.

#![allow(dead_code)]

use std::path::Path;

use postforge::config::{Destination, GhostSettings, SecretSource, SiteConfig};

/// Builder for `SiteConfig`, starting from the serde defaults.
pub struct SiteBuilder {
    value: serde_json::Value,
    destination: Destination,
}

impl SiteBuilder {
    pub fn new(output_directory: &Path) -> Self {
        Self {
            value: serde_json::json!({
                "name": "Test Blog",
                "domain": "blog.example.com",
                "author": "Test Author",
                "destination": {"format": "markdown"},
                "output_directory": output_directory.display().to_string(),
                "images_directory": output_directory.join("images").display().to_string(),
            }),
            destination: Destination::Markdown,
        }
    }

    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn mdx(self) -> Self {
        self.destination(Destination::Mdx)
    }

    pub fn ghost(self, api_url: &str, admin_key: &str) -> Self {
        self.destination(Destination::Ghost(GhostSettings {
            api_url: SecretSource::direct(api_url),
            admin_key: SecretSource::direct(admin_key),
        }))
    }

    pub fn word_count(mut self, words: u32) -> Self {
        self.value["default_word_count"] = words.into();
        self
    }

    pub fn image_count(mut self, images: u32) -> Self {
        self.value["default_image_count"] = images.into();
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.value["default_tags"] = serde_json::json!(tags);
        self
    }

    pub fn build(self) -> SiteConfig {
        let mut site: SiteConfig =
            serde_json::from_value(self.value).expect("site builder produced invalid config");
        site.destination = self.destination;
        site
    }
}

pub const GHOST_ADMIN_KEY: &str =
    "64f1a2b3c4d5:a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90";
