//! Reply payloads and embed builders for Discord responses
//!
//! Commands describe what to send with [`Reply`]; only the platform adapter
//! turns an [`EmbedSpec`] into a serenity `CreateEmbed`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Platform-neutral reply and embed description

use serenity::builder::CreateEmbed;

use super::response::{clip, truncate_for_embed, truncate_for_message, FIELD_LIMIT};

/// Accent color for informational embeds
pub const INFO_COLOR: u32 = 0x0099ff;
/// Accent color for positive results
pub const SUCCESS_COLOR: u32 = 0x00ff00;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Card-like payload: title, fields, color, footer, images
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedSpec {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<u32>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub thumbnail: Option<String>,
    pub image: Option<String>,
}

impl EmbedSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    /// Set the thumbnail when a URL is available
    pub fn thumbnail(mut self, url: Option<String>) -> Self {
        self.thumbnail = url;
        self
    }

    /// Set the main image when a URL is available
    pub fn image(mut self, url: Option<String>) -> Self {
        self.image = url;
        self
    }

    /// Value of the named field, if present
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }

    /// Build the serenity embed, clamping text to Discord limits
    pub fn to_create_embed(&self) -> CreateEmbed {
        let mut embed = CreateEmbed::default();
        if let Some(title) = &self.title {
            embed.title(title);
        }
        if let Some(description) = &self.description {
            embed.description(truncate_for_embed(description));
        }
        if let Some(color) = self.color {
            embed.color(color);
        }
        for field in &self.fields {
            // Discord rejects empty field values
            let value = if field.value.is_empty() {
                "None"
            } else {
                clip(&field.value, FIELD_LIMIT)
            };
            embed.field(&field.name, value, field.inline);
        }
        if let Some(footer) = &self.footer {
            embed.footer(|f| f.text(footer));
        }
        if let Some(url) = &self.thumbnail {
            embed.thumbnail(url);
        }
        if let Some(url) = &self.image {
            embed.image(url);
        }
        embed
    }
}

/// Where a reply is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTarget {
    /// Plain message in the invoking channel
    Channel,
    /// Message in the invoking channel referencing the invoking message
    Quote,
    /// Direct message to the invoker
    Invoker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    Text(String),
    Embed(EmbedSpec),
}

/// One outbound message, plus reactions to add once it is posted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub target: ReplyTarget,
    pub body: ReplyBody,
    pub reactions: Vec<String>,
}

impl Reply {
    fn new(target: ReplyTarget, body: ReplyBody) -> Self {
        Self {
            target,
            body,
            reactions: Vec::new(),
        }
    }

    pub fn channel(text: impl AsRef<str>) -> Self {
        Self::new(
            ReplyTarget::Channel,
            ReplyBody::Text(truncate_for_message(text.as_ref())),
        )
    }

    pub fn quote(text: impl AsRef<str>) -> Self {
        Self::new(
            ReplyTarget::Quote,
            ReplyBody::Text(truncate_for_message(text.as_ref())),
        )
    }

    pub fn direct(text: impl AsRef<str>) -> Self {
        Self::new(
            ReplyTarget::Invoker,
            ReplyBody::Text(truncate_for_message(text.as_ref())),
        )
    }

    pub fn embed(spec: EmbedSpec) -> Self {
        Self::new(ReplyTarget::Channel, ReplyBody::Embed(spec))
    }

    pub fn quote_embed(spec: EmbedSpec) -> Self {
        Self::new(ReplyTarget::Quote, ReplyBody::Embed(spec))
    }

    pub fn with_reactions(mut self, reactions: &[&str]) -> Self {
        self.reactions = reactions.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ReplyBody::Text(text) => Some(text),
            ReplyBody::Embed(_) => None,
        }
    }

    pub fn embed_spec(&self) -> Option<&EmbedSpec> {
        match &self.body {
            ReplyBody::Embed(spec) => Some(spec),
            ReplyBody::Text(_) => None,
        }
    }
}
