use std::sync::Arc;

use image::DynamicImage;

/// A single logical message to deliver: a title, a body and zero or more
/// images in presentation order.
///
/// Images are reference counted so concurrent deliveries can share them
/// without copying pixel buffers.
#[derive(Debug, Clone, Default)]
pub struct Message {
    pub title: String,
    pub body: String,
    pub images: Vec<Arc<DynamicImage>>,
}

impl Message {
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            images: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: DynamicImage) -> Self {
        self.images.push(Arc::new(image));
        self
    }

    #[must_use]
    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }

    /// Title and body joined by a single space, with surrounding whitespace
    /// trimmed. Empty when both parts are blank.
    #[must_use]
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.body).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_joins_title_and_body() {
        let msg = Message::new("Hello", "world");
        assert_eq!(msg.text(), "Hello world");
    }

    #[test]
    fn text_has_no_double_space_for_empty_body() {
        assert_eq!(Message::new("Testing", "").text(), "Testing");
        assert_eq!(Message::new("", "Testing").text(), "Testing");
    }

    #[test]
    fn text_of_blank_message_is_empty() {
        assert!(Message::new("", "").text().is_empty());
        assert!(Message::new("  ", "\n").text().is_empty());
    }

    #[test]
    fn images_keep_insertion_order() {
        let msg = Message::default()
            .with_image(DynamicImage::new_rgb8(1, 1))
            .with_image(DynamicImage::new_rgb8(2, 2));
        assert!(msg.has_images());
        assert_eq!(msg.images[0].width(), 1);
        assert_eq!(msg.images[1].width(), 2);
    }
}
